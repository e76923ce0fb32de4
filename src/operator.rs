/*
 * Operator console logic: the top-level menu, the PIN gate in front of the
 * polling-interval adjustment and the lockout that follows too many wrong
 * PINs. Everything here is plain state; the firmware does the line I/O and
 * the waiting.
 */

use core::fmt;
use core::str::FromStr;

use embassy_time::Duration;

use crate::config::OperatorConfig;
use crate::history::Series;
use crate::lights::LightVector;

pub const MENU: &str = "MENU\r\n Please Select One Option:\r\n\
                        1. Normal Operation\r\n\
                        2. Data Observation\r\n\
                        3. Adjustment\r\n\
                        4. Quit\r\n";

pub const OBSERVATION_MENU: &str = "1. Main Road\r\n2. Pedestrians\r\n3. Quit\r\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MenuChoice {
    NormalOperation,
    DataObservation,
    Adjustment,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MenuError {
    NotANumber,
    UnknownOption(i32),
}

impl fmt::Display for MenuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MenuError::NotANumber => write!(f, "Invalid Value, Enter a Number"),
            MenuError::UnknownOption(_) => write!(f, "Invalid Option, Enter a Valid Number"),
        }
    }
}

fn option_number(s: &str) -> Result<i32, MenuError> {
    s.trim().parse().map_err(|_| MenuError::NotANumber)
}

impl FromStr for MenuChoice {
    type Err = MenuError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match option_number(s)? {
            1 => Ok(MenuChoice::NormalOperation),
            2 => Ok(MenuChoice::DataObservation),
            3 => Ok(MenuChoice::Adjustment),
            4 => Ok(MenuChoice::Quit),
            other => Err(MenuError::UnknownOption(other)),
        }
    }
}

/// Which history to show, or `None` to go back to the menu.
pub fn parse_observation(s: &str) -> Result<Option<Series>, MenuError> {
    match option_number(s)? {
        1 => Ok(Some(Series::MainRoad)),
        2 => Ok(Some(Series::Pedestrians)),
        3 => Ok(None),
        other => Err(MenuError::UnknownOption(other)),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinOutcome {
    Granted,
    /// The operator gave up; back to the menu.
    Quit,
    Rejected { remaining: u8 },
    /// Out of attempts. The caller runs the lockout; the attempts are reset.
    LockedOut,
}

impl fmt::Display for PinOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PinOutcome::Granted => write!(f, "Access Granted"),
            PinOutcome::Quit => write!(f, "Returning to Menu"),
            PinOutcome::Rejected { remaining } => write!(
                f,
                "Invalid PIN, please try again, you have {remaining} more attempts \
                 remaining before a 2 minute lock out"
            ),
            PinOutcome::LockedOut => write!(f, "Too many invalid PINs, locking out"),
        }
    }
}

pub struct PinGate {
    config: OperatorConfig,
    failures: u8,
}

impl PinGate {
    pub fn new(config: OperatorConfig) -> Self {
        Self {
            config,
            failures: 0,
        }
    }

    pub fn submit(&mut self, entry: &str) -> PinOutcome {
        let entry = entry.trim();
        if entry == self.config.pin {
            self.failures = 0;
            return PinOutcome::Granted;
        }
        if entry == "quit" {
            return PinOutcome::Quit;
        }

        self.failures += 1;
        if self.failures >= self.config.attempts {
            self.failures = 0;
            PinOutcome::LockedOut
        } else {
            PinOutcome::Rejected {
                remaining: self.config.attempts - self.failures,
            }
        }
    }

    pub fn lockout(&self) -> Lockout {
        Lockout::new(self.config.lockout)
    }
}

/// One second of a lockout: what to show and how long is left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockoutTick {
    pub remaining_secs: u64,
    pub lights: LightVector,
}

/// Counts a lockout down second by second, blinking the ambers, starting
/// dark.
#[derive(Debug, Clone)]
pub struct Lockout {
    remaining_secs: u64,
    flash: bool,
}

impl Lockout {
    pub const TICK: Duration = Duration::from_secs(1);

    pub fn new(length: Duration) -> Self {
        Self {
            remaining_secs: length.as_secs(),
            flash: false,
        }
    }
}

impl Iterator for Lockout {
    type Item = LockoutTick;

    fn next(&mut self) -> Option<LockoutTick> {
        if self.remaining_secs == 0 {
            return None;
        }

        let tick = LockoutTick {
            remaining_secs: self.remaining_secs,
            lights: LightVector::standby(self.flash),
        };
        self.flash = !self.flash;
        self.remaining_secs -= 1;
        Some(tick)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lights::Lamp;

    #[test]
    fn menu_options_parse() {
        assert_eq!("1".parse(), Ok(MenuChoice::NormalOperation));
        assert_eq!(" 2\r".parse(), Ok(MenuChoice::DataObservation));
        assert_eq!("3".parse(), Ok(MenuChoice::Adjustment));
        assert_eq!("4".parse(), Ok(MenuChoice::Quit));
        assert_eq!("9".parse::<MenuChoice>(), Err(MenuError::UnknownOption(9)));
        assert_eq!("one".parse::<MenuChoice>(), Err(MenuError::NotANumber));
    }

    #[test]
    fn observation_choice_parses() {
        assert_eq!(parse_observation("1"), Ok(Some(Series::MainRoad)));
        assert_eq!(parse_observation("2"), Ok(Some(Series::Pedestrians)));
        assert_eq!(parse_observation("3"), Ok(None));
        assert_eq!(parse_observation("0"), Err(MenuError::UnknownOption(0)));
    }

    #[test]
    fn correct_pin_is_granted() {
        let mut gate = PinGate::new(OperatorConfig::default());
        assert_eq!(gate.submit("1234\r\n"), PinOutcome::Granted);
    }

    #[test]
    fn quit_leaves_without_counting() {
        let mut gate = PinGate::new(OperatorConfig::default());
        assert_eq!(gate.submit("0000"), PinOutcome::Rejected { remaining: 3 });
        assert_eq!(gate.submit("quit"), PinOutcome::Quit);
        assert_eq!(gate.submit("0000"), PinOutcome::Rejected { remaining: 2 });
    }

    #[test]
    fn fourth_miss_locks_out_and_resets_attempts() {
        let mut gate = PinGate::new(OperatorConfig::default());
        let outcomes: Vec<PinOutcome> = (0..5).map(|_| gate.submit("4321")).collect();
        assert_eq!(
            outcomes,
            vec![
                PinOutcome::Rejected { remaining: 3 },
                PinOutcome::Rejected { remaining: 2 },
                PinOutcome::Rejected { remaining: 1 },
                PinOutcome::LockedOut,
                PinOutcome::Rejected { remaining: 3 },
            ]
        );
    }

    #[test]
    fn lockout_counts_down_two_minutes_blinking_the_ambers() {
        let gate = PinGate::new(OperatorConfig::default());
        let ticks: Vec<LockoutTick> = gate.lockout().collect();

        assert_eq!(ticks.len(), 120);
        assert_eq!(ticks[0].remaining_secs, 120);
        assert_eq!(ticks[119].remaining_secs, 1);
        assert_eq!(ticks[0].lights, LightVector::DARK);
        assert!(ticks[1].lights.is_lit(Lamp::MainAmber));
        assert!(ticks[1].lights.is_lit(Lamp::SideAmber));
        assert_eq!(ticks[2].lights, LightVector::DARK);
    }
}

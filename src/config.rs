/*
 * Tunables of the rig. The polling interval is the only value an operator can
 * change at runtime; everything else is fixed by the installation.
 */

use core::fmt;
use core::str::FromStr;

use embassy_time::Duration;

/// Window of main-road history kept for trend analysis.
pub const HISTORY_WINDOW_SECS: u8 = 20;

/// The sonar reports this distance, or more, when nothing is in range.
pub const OUT_OF_RANGE_CM: f32 = 258.0;

/// Button presses closer together than this count once.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_secs(1);

pub const FLASH_WINDOW: Duration = Duration::from_secs(3);
pub const FLASH_PERIOD: Duration = Duration::from_millis(500);

/// Added to the amber and pedestrian stages per poll that sees a vehicle close by.
pub const STAGE_EXTENSION: Duration = Duration::from_secs(3);
pub const NEAR_VEHICLE_CM: f32 = 10.0;
pub const RATE_OF_CHANGE_CM: f32 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    NotANumber,
    OutOfRange(i32),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NotANumber => write!(f, "Invalid entry, please enter a number"),
            ConfigError::OutOfRange(_) => write!(f, "Invalid polling time"),
        }
    }
}

/// Seconds between two sonar polls, always within `MIN..=MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PollingInterval(u8);

impl PollingInterval {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub const fn new(secs: u8) -> Result<Self, ConfigError> {
        if secs >= Self::MIN && secs <= Self::MAX {
            Ok(Self(secs))
        } else {
            Err(ConfigError::OutOfRange(secs as i32))
        }
    }

    pub const fn secs(self) -> u8 {
        self.0
    }

    pub const fn as_duration(self) -> Duration {
        Duration::from_secs(self.0 as u64)
    }

    /// Number of main-road samples that fit in the history window,
    /// `floor(20 / interval)`.
    pub const fn history_capacity(self) -> usize {
        (HISTORY_WINDOW_SECS / self.0) as usize
    }
}

impl Default for PollingInterval {
    fn default() -> Self {
        Self(5)
    }
}

impl FromStr for PollingInterval {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let secs: i32 = s.trim().parse().map_err(|_| ConfigError::NotANumber)?;
        match u8::try_from(secs) {
            Ok(secs) => PollingInterval::new(secs),
            Err(_) => Err(ConfigError::OutOfRange(secs)),
        }
    }
}

impl fmt::Display for PollingInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Settings of the PIN-gated adjustment menu.
#[derive(Debug, Clone, Copy)]
pub struct OperatorConfig {
    pub pin: &'static str,
    pub attempts: u8,
    pub lockout: Duration,
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            pin: "1234",
            attempts: 4,
            lockout: Duration::from_secs(120),
        }
    }
}

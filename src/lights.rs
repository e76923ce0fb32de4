/*
 * The light bank of the rig: eight lamps behind a 74HC595 shift register.
 *
 * The engine only ever deals in whole `LightVector`s. Which output of the
 * register drives which lamp is fixed by the wiring and captured once, in the
 * order of the `Lamp` enum.
 */

use embedded_hal::digital::{OutputPin, PinState};
use enum_ordinalize::Ordinalize;

// Shift order, first bit out first. The pedestrian red is wired together with
// the side-road red.
#[derive(Ordinalize, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(usize)]
pub enum Lamp {
    Spare,
    PedestrianWalk,
    SideRed,
    SideAmber,
    SideGreen,
    MainRed,
    MainAmber,
    MainGreen,
}

pub const LAMP_COUNT: usize = Lamp::VARIANT_COUNT;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LightVector([bool; LAMP_COUNT]);

impl LightVector {
    pub const DARK: LightVector = LightVector([false; LAMP_COUNT]);

    pub fn lit(lamps: &[Lamp]) -> Self {
        lamps
            .iter()
            .fold(LightVector::DARK, |lights, &lamp| lights.with(lamp, true))
    }

    pub fn with(mut self, lamp: Lamp, on: bool) -> Self {
        self.0[lamp.ordinal()] = on;
        self
    }

    pub fn is_lit(&self, lamp: Lamp) -> bool {
        self.0[lamp.ordinal()]
    }

    pub const fn bits(&self) -> [bool; LAMP_COUNT] {
        self.0
    }

    /// Both ambers, shown while the rig waits in the menu and flashed during
    /// a lockout.
    pub fn standby(on: bool) -> Self {
        LightVector::DARK
            .with(Lamp::SideAmber, on)
            .with(Lamp::MainAmber, on)
    }
}

/*
 * Bit-banged 74HC595: data is clocked in on SRCLK and only shows on the
 * outputs when RCLK is pulsed, so the whole bank changes at once.
 */
pub struct ShiftRegister<P> {
    data: P,
    shift_clock: P,
    latch: P,
}

impl<P: OutputPin> ShiftRegister<P> {
    pub fn new(data: P, shift_clock: P, latch: P) -> Self {
        Self {
            data,
            shift_clock,
            latch,
        }
    }

    pub fn write(&mut self, lights: LightVector) -> Result<(), P::Error> {
        for on in lights.bits() {
            self.data.set_state(PinState::from(on))?;
            self.shift_clock.set_low()?;
            self.shift_clock.set_high()?;
            self.shift_clock.set_low()?;
        }

        self.latch.set_high()?;
        self.latch.set_low()
    }
}

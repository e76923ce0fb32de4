/*
 * Supervisory controller for a single-intersection traffic-light rig with a
 * pedestrian crossing.
 *
 * The library is hardware independent. Everything the engine touches on the
 * board goes through the `Rig` trait, and every wait goes through the `Clock`
 * trait, so the whole cycle can run against virtual time on the host. The
 * firmware binary (feature `firmware`) provides the STM32 implementations.
 *
 * Data flow:
 *   supervisor -> stage catalog -> stage runner -> sampler -> history
 *                                              \-> rig (lights, notices)
 * Button and switch edges arrive as `InputEvent`s on a channel; only the
 * control loop turns them into a tally and an interrupt.
 */
#![cfg_attr(not(test), no_std)]

// Must come first so the other modules see the logging macros.
mod fmt;

pub mod clock;
pub mod config;
pub mod controller;
pub mod history;
pub mod inputs;
pub mod lights;
pub mod operator;
pub mod rig;
pub mod runner;
pub mod sampler;
pub mod stage;
pub mod supervisor;

#[cfg(test)]
pub(crate) mod testing;

pub use clock::{Clock, SystemClock};
pub use config::{ConfigError, PollingInterval};
pub use controller::Controller;
pub use history::History;
pub use inputs::{ControlInputs, EventChannel, InputEvent, Termination};
pub use lights::{Lamp, LightVector, ShiftRegister};
pub use rig::{Buzzer, Notice, Rig};
pub use runner::StageOutcome;
pub use sampler::Ranging;
pub use stage::{Stage, StageId, select_stage};

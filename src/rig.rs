/*
 * Everything the engine needs from the physical rig.
 *
 * The firmware implements this on the DESPI-M02 board; tests implement it
 * with a scripted fake. Console output is part of the rig because on the
 * board it goes out of the same serial port the operator types into.
 */

use core::fmt;

use embassy_time::Duration;

use crate::inputs::Termination;
use crate::lights::LightVector;
use crate::sampler::Ranging;
use crate::stage::StageId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Buzzer {
    /// Sounds while pedestrians may cross.
    Crossing,
    /// Sounds while the walk lamp flashes.
    Closing,
}

/// Something the operator console should report.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Notice {
    CycleStarted { archived_tally: u32 },
    StageStarted(StageId),
    Polled { elapsed_ms: u64, distance_cm: f32 },
    RateOfChange { previous_cm: f32, distance_cm: f32 },
    VehicleStationary { distance_cm: f32 },
    StageExtended { stage: StageId, by_secs: u64 },
    PedestrianTally(u32),
    Interrupted(Termination),
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::CycleStarted { archived_tally } => {
                write!(f, "Cycle start, {archived_tally} button presses archived")
            }
            Notice::StageStarted(stage) => write!(f, "{stage}"),
            Notice::Polled {
                elapsed_ms,
                distance_cm,
            } => write!(
                f,
                "Poll took {}.{:02} seconds to complete, nearest vehicle is {distance_cm:.2} cm",
                elapsed_ms / 1000,
                (elapsed_ms % 1000) / 10
            ),
            Notice::RateOfChange {
                previous_cm,
                distance_cm,
            } => write!(
                f,
                "Distance rate of change alert: {previous_cm:.2} cm -> {distance_cm:.2} cm"
            ),
            Notice::VehicleStationary { distance_cm } => {
                write!(f, "Vehicle hasn't moved on main road ({distance_cm:.2} cm)")
            }
            Notice::StageExtended { stage, by_secs } => write!(
                f,
                "{stage} extended by {by_secs} s, vehicle close to the line"
            ),
            Notice::PedestrianTally(presses) => {
                write!(f, "Pedestrian button has been pressed {presses} times")
            }
            Notice::Interrupted(reason) => write!(f, "{reason}"),
        }
    }
}

#[allow(async_fn_in_trait)]
pub trait Rig {
    /// Replace the whole light bank in one update.
    fn set_lights(&mut self, lights: LightVector);

    fn set_buzzer(&mut self, buzzer: Buzzer, on: bool);

    /// One sonar measurement. A missing echo is reported at or beyond
    /// `config::OUT_OF_RANGE_CM`.
    async fn range(&mut self) -> Ranging;

    async fn notify(&mut self, notice: Notice);
}

impl Notice {
    pub fn polled(elapsed: Duration, distance_cm: f32) -> Self {
        Notice::Polled {
            elapsed_ms: elapsed.as_millis(),
            distance_cm,
        }
    }
}

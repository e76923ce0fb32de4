/*
 * The stage runner: holds one stage's lights until its time is up, polling
 * the sonar on the way.
 *
 * Poll k of a stage is due at `start + k * interval + d`, where d is how long
 * the previous poll took (zero before the first). Every loop iteration first
 * looks at the inputs, so an interrupt is honored before any further poll.
 * Between polls the runner sleeps until the next poll or the end of the stage,
 * whichever is first, but any input event wakes it early.
 */

use embassy_futures::select::{Either, select};
use embassy_time::{Duration, Instant};

use crate::clock::Clock;
use crate::config::{NEAR_VEHICLE_CM, PollingInterval, RATE_OF_CHANGE_CM, STAGE_EXTENSION};
use crate::controller::Controller;
use crate::inputs::Termination;
use crate::rig::{Notice, Rig};
use crate::sampler;
use crate::stage::{Stage, StageId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StageOutcome {
    Completed,
    Aborted(Termination),
}

/// What one poll's reading means for the running stage.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Assessment {
    /// The vehicle moved away by more than the alert threshold since the
    /// previous sample.
    pub rate_of_change: bool,
    /// Same reading as last time while the main road has green.
    pub stationary: bool,
    /// Vehicle close to the line during a stage that can be held longer.
    pub extend: bool,
}

pub fn assess(stage: StageId, previous_cm: Option<f32>, distance_cm: f32) -> Assessment {
    Assessment {
        rate_of_change: previous_cm
            .is_some_and(|previous| distance_cm - previous > RATE_OF_CHANGE_CM),
        stationary: stage == StageId::MainGreen && previous_cm == Some(distance_cm),
        extend: stage.extends_for_near_vehicle() && distance_cm < NEAR_VEHICLE_CM,
    }
}

impl<R: Rig, C: Clock> Controller<'_, R, C> {
    pub async fn run_stage(
        &mut self,
        stage: &Stage,
        started: Instant,
        interval: PollingInterval,
    ) -> StageOutcome {
        self.rig.set_lights(stage.lights);

        let mut end = started + stage.duration;
        let mut polls: u32 = 0;
        let mut last_poll = Duration::from_ticks(0);

        loop {
            self.inputs.drain();
            if let Some(reason) = self.inputs.take_interrupt() {
                info!("stage {} aborted: {}", stage.id.number(), reason);
                self.rig.notify(Notice::Interrupted(reason)).await;
                return StageOutcome::Aborted(reason);
            }

            let next_poll = started + interval.as_duration() * polls + last_poll;
            if self.clock.now() >= next_poll {
                let previous_cm = self.history.last_distance();
                let sample = sampler::poll(&mut self.rig, &self.clock, self.clock.now()).await;
                self.history.record_distance(sample.distance_cm, interval);
                polls += 1;
                last_poll = sample.elapsed;

                debug!("poll {}: {} cm", polls, sample.distance_cm);
                self.rig
                    .notify(Notice::polled(sample.elapsed, sample.distance_cm))
                    .await;

                let assessment = assess(stage.id, previous_cm, sample.distance_cm);
                if let (true, Some(previous_cm)) = (assessment.rate_of_change, previous_cm) {
                    warn!("distance rate of change alert");
                    self.rig
                        .notify(Notice::RateOfChange {
                            previous_cm,
                            distance_cm: sample.distance_cm,
                        })
                        .await;
                }
                if assessment.stationary {
                    self.rig
                        .notify(Notice::VehicleStationary {
                            distance_cm: sample.distance_cm,
                        })
                        .await;
                }
                if assessment.extend {
                    end += STAGE_EXTENSION;
                    self.rig
                        .notify(Notice::StageExtended {
                            stage: stage.id,
                            by_secs: STAGE_EXTENSION.as_secs(),
                        })
                        .await;
                }
            }

            if self.clock.now() >= end {
                return StageOutcome::Completed;
            }

            let next_poll = started + interval.as_duration() * polls + last_poll;
            let wake = next_poll.min(end);
            if let Either::Second(event) =
                select(self.clock.sleep_until(wake), self.inputs.next_event()).await
            {
                self.inputs.apply(event);
            }
        }
    }
}

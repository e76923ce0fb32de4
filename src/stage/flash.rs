/*
 * The walk lamp blinks before the pedestrian stage hands over to the runner.
 *
 * This is its own little state machine: it yields one frame per flash period
 * until the flash window is used up, and the caller decides how to wait
 * between frames.
 */

use embassy_time::Duration;

use crate::config::{FLASH_PERIOD, FLASH_WINDOW};
use crate::lights::{Lamp, LightVector};

#[derive(Debug, Clone)]
pub struct PedestrianFlash {
    lights: LightVector,
    frame: u64,
}

impl PedestrianFlash {
    pub const FRAMES: u64 = FLASH_WINDOW.as_ticks() / FLASH_PERIOD.as_ticks();

    pub fn new(lights: LightVector) -> Self {
        Self { lights, frame: 0 }
    }

    pub fn period(&self) -> Duration {
        FLASH_PERIOD
    }
}

impl Iterator for PedestrianFlash {
    type Item = LightVector;

    fn next(&mut self) -> Option<LightVector> {
        if self.frame >= Self::FRAMES {
            return None;
        }

        let walk_on = self.frame % 2 == 0;
        self.frame += 1;
        Some(self.lights.with(Lamp::PedestrianWalk, walk_on))
    }
}

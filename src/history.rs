/*
 * Recent measurements kept for trend analysis.
 *
 * `main_road` holds the sonar readings of roughly the last 20 seconds, so its
 * length depends on the polling interval. `pedestrians` holds the button tally
 * of each cycle; with no heap it keeps the most recent `PEDESTRIAN_SLOTS` and
 * counts the cycles it had to let go. Both evict their oldest entry first.
 */

use core::fmt;

use heapless::{Deque, Vec};

use crate::config::{HISTORY_WINDOW_SECS, PollingInterval};

/// Enough for the shortest polling interval.
pub const MAIN_ROAD_SLOTS: usize = HISTORY_WINDOW_SECS as usize;
pub const PEDESTRIAN_SLOTS: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Series {
    MainRoad,
    Pedestrians,
}

/// One point of an observation: `value` after `elapsed_secs` of recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesPoint {
    pub elapsed_secs: u32,
    pub value: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InsufficientData;

impl fmt::Display for InsufficientData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "There is insufficient data")
    }
}

/// How many cycle tallies fell out of the pedestrian history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DroppedTallies(pub u32);

impl fmt::Display for DroppedTallies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} older cycles are no longer shown", self.0)
    }
}

#[derive(Debug)]
pub struct History {
    main_road: Deque<f32, MAIN_ROAD_SLOTS>,
    pedestrians: Deque<u32, PEDESTRIAN_SLOTS>,
    dropped_tallies: u32,
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

impl History {
    pub const fn new() -> Self {
        Self {
            main_road: Deque::new(),
            pedestrians: Deque::new(),
            dropped_tallies: 0,
        }
    }

    pub fn record_distance(&mut self, distance_cm: f32, interval: PollingInterval) {
        let capacity = interval.history_capacity();
        while !self.main_road.is_empty() && self.main_road.len() >= capacity {
            self.main_road.pop_front();
        }
        // capacity is at most MAIN_ROAD_SLOTS, so there is room now
        let _ = self.main_road.push_back(distance_cm);
    }

    /// Drop the oldest samples that no longer fit after an interval change.
    pub fn trim(&mut self, interval: PollingInterval) {
        while self.main_road.len() > interval.history_capacity() {
            self.main_road.pop_front();
        }
    }

    pub fn last_distance(&self) -> Option<f32> {
        self.main_road.back().copied()
    }

    pub fn archive_tally(&mut self, presses: u32) {
        if self.pedestrians.is_full() {
            self.pedestrians.pop_front();
            self.dropped_tallies = self.dropped_tallies.saturating_add(1);
        }
        let _ = self.pedestrians.push_back(presses);
    }

    pub fn dropped_tallies(&self) -> Option<DroppedTallies> {
        (self.dropped_tallies > 0).then_some(DroppedTallies(self.dropped_tallies))
    }

    pub fn main_road(&self) -> impl Iterator<Item = f32> + '_ {
        self.main_road.iter().copied()
    }

    pub fn pedestrians(&self) -> impl Iterator<Item = u32> + '_ {
        self.pedestrians.iter().copied()
    }

    /// Points for an observation of `series`, one per entry, spaced by the
    /// polling interval. Refused until the entries span the history window.
    pub fn observe(
        &self,
        series: Series,
        interval: PollingInterval,
    ) -> Result<Vec<SeriesPoint, PEDESTRIAN_SLOTS>, InsufficientData> {
        let values: Vec<i32, PEDESTRIAN_SLOTS> = match series {
            Series::MainRoad => self.main_road().map(|cm| cm as i32).collect(),
            Series::Pedestrians => self.pedestrians().map(|presses| presses as i32).collect(),
        };

        if values.len() * (interval.secs() as usize) < HISTORY_WINDOW_SECS as usize {
            return Err(InsufficientData);
        }

        Ok(values
            .iter()
            .zip(1u32..)
            .map(|(&value, n)| SeriesPoint {
                elapsed_secs: n * interval.secs() as u32,
                value,
            })
            .collect())
    }
}

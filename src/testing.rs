// Test doubles shared by the unit tests: virtual time and a scripted rig.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

use embassy_time::{Duration, Instant};

use crate::clock::Clock;
use crate::inputs::{EventChannel, EventSender, InputEvent};
use crate::lights::LightVector;
use crate::rig::{Buzzer, Notice, Rig};
use crate::sampler::Ranging;
use crate::stage::StageId;

/// Virtual time starting at zero. Time only moves when the code under test
/// sleeps or the test advances it; scripted input events are pushed into the
/// channel once the clock has passed their instant.
pub struct ManualClock<'ch> {
    now: Cell<Instant>,
    script: RefCell<VecDeque<(Instant, InputEvent)>>,
    events: EventSender<'ch>,
}

impl<'ch> ManualClock<'ch> {
    pub fn new(channel: &'ch EventChannel) -> Self {
        Self {
            now: Cell::new(Instant::from_ticks(0)),
            script: RefCell::new(VecDeque::new()),
            events: channel.sender(),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.advance_to(self.now.get() + by);
    }

    pub fn press_button(&self, at_ms: u64) {
        let at = Instant::from_millis(at_ms);
        self.schedule(at, InputEvent::Button { pressed: true, at });
    }

    pub fn set_switch(&self, at_ms: u64, on: bool) {
        let at = Instant::from_millis(at_ms);
        self.schedule(at, InputEvent::Switch { on, at });
    }

    pub fn cancel(&self, at_ms: u64) {
        self.schedule(Instant::from_millis(at_ms), InputEvent::Cancel);
    }

    fn schedule(&self, at: Instant, event: InputEvent) {
        let mut script = self.script.borrow_mut();
        script.push_back((at, event));
        script.make_contiguous().sort_by_key(|(at, _)| *at);
    }

    fn advance_to(&self, deadline: Instant) {
        if deadline > self.now.get() {
            self.now.set(deadline);
        }

        let mut script = self.script.borrow_mut();
        while script.front().is_some_and(|(at, _)| *at <= self.now.get()) {
            if let Some((_, event)) = script.pop_front() {
                self.events
                    .try_send(event)
                    .expect("scripted input overflowed the event queue");
            }
        }
    }
}

impl Clock for ManualClock<'_> {
    fn now(&self) -> Instant {
        self.now.get()
    }

    async fn sleep_until(&self, deadline: Instant) {
        self.advance_to(deadline);
    }
}

/// Records what the engine did to the rig. Sonar readings come from a script,
/// then repeat `fallback_cm` once the script runs out.
pub struct FakeRig {
    readings: VecDeque<f32>,
    pub fallback_cm: f32,
    pub latency: Duration,
    pub ranges: usize,
    pub lights: Vec<LightVector>,
    pub buzzers: Vec<(Buzzer, bool)>,
    pub notices: Vec<Notice>,
}

impl FakeRig {
    pub fn new() -> Self {
        FakeRig::with_readings(&[])
    }

    pub fn with_readings(readings: &[f32]) -> Self {
        Self {
            readings: readings.iter().copied().collect(),
            fallback_cm: 100.0,
            latency: Duration::from_ticks(0),
            ranges: 0,
            lights: Vec::new(),
            buzzers: Vec::new(),
            notices: Vec::new(),
        }
    }

    pub fn stages_started(&self) -> Vec<StageId> {
        self.notices
            .iter()
            .filter_map(|notice| match notice {
                Notice::StageStarted(id) => Some(*id),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, wanted: fn(&Notice) -> bool) -> usize {
        self.notices.iter().filter(|notice| wanted(notice)).count()
    }
}

impl Rig for FakeRig {
    fn set_lights(&mut self, lights: LightVector) {
        self.lights.push(lights);
    }

    fn set_buzzer(&mut self, buzzer: Buzzer, on: bool) {
        self.buzzers.push((buzzer, on));
    }

    async fn range(&mut self) -> Ranging {
        self.ranges += 1;
        Ranging {
            distance_cm: self.readings.pop_front().unwrap_or(self.fallback_cm),
            latency: self.latency,
        }
    }

    async fn notify(&mut self, notice: Notice) {
        self.notices.push(notice);
    }
}

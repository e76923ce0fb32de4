/*
 * Operator inputs: the pedestrian button, the interrupt slide switch and the
 * console cancel key.
 *
 * The edges are picked up by a task on the I/O side that does nothing but
 * stamp them and put them into a channel. The control loop owns the receiving
 * end through `ControlInputs`, and that is the only place the tally, the
 * switch level and the pending interrupt ever change. Debouncing works on the
 * stamp carried by the event, so it does not matter how late the control loop
 * gets round to draining the channel.
 */

use core::fmt;
use core::mem;

use embassy_sync::{
    blocking_mutex::raw::CriticalSectionRawMutex,
    channel::{Channel, Receiver, Sender},
};
use embassy_time::{Duration, Instant};

use crate::config::DEBOUNCE_WINDOW;

pub const EVENT_QUEUE_DEPTH: usize = 8;

pub type EventChannel = Channel<CriticalSectionRawMutex, InputEvent, EVENT_QUEUE_DEPTH>;
pub type EventSender<'ch> = Sender<'ch, CriticalSectionRawMutex, InputEvent, EVENT_QUEUE_DEPTH>;
pub type EventReceiver<'ch> =
    Receiver<'ch, CriticalSectionRawMutex, InputEvent, EVENT_QUEUE_DEPTH>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    /// The button changed level; `pressed` is its new state.
    Button { pressed: bool, at: Instant },
    /// The interrupt switch changed level.
    Switch { on: bool, at: Instant },
    /// The operator asked for normal operation to stop.
    Cancel,
}

/// Why normal operation stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Termination {
    HardwareInterrupt,
    OperatorCancel,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::HardwareInterrupt => write!(f, "Interrupt switch is active"),
            Termination::OperatorCancel => write!(f, "Normal operation cancelled"),
        }
    }
}

/// Accepts a press only if more than the window has passed since the last
/// accepted one.
#[derive(Debug, Clone)]
pub struct PressDebouncer {
    window: Duration,
    last_accepted: Option<Instant>,
}

impl PressDebouncer {
    pub const fn new(window: Duration) -> Self {
        Self {
            window,
            last_accepted: None,
        }
    }

    pub fn accept(&mut self, at: Instant) -> bool {
        let accepted = match self.last_accepted {
            Some(last) => at.saturating_duration_since(last) > self.window,
            None => true,
        };
        if accepted {
            self.last_accepted = Some(at);
        }
        accepted
    }
}

pub struct ControlInputs<'ch> {
    events: EventReceiver<'ch>,
    debouncer: PressDebouncer,
    tally: u32,
    switch_on: bool,
    latched: Option<Termination>,
}

impl<'ch> ControlInputs<'ch> {
    pub fn new(events: EventReceiver<'ch>) -> Self {
        Self {
            events,
            debouncer: PressDebouncer::new(DEBOUNCE_WINDOW),
            tally: 0,
            switch_on: false,
            latched: None,
        }
    }

    /// Apply everything the I/O side has queued so far.
    pub fn drain(&mut self) {
        while let Ok(event) = self.events.try_receive() {
            self.apply(event);
        }
    }

    /// Wait for the next event without applying it.
    pub async fn next_event(&mut self) -> InputEvent {
        self.events.receive().await
    }

    pub fn apply(&mut self, event: InputEvent) {
        match event {
            InputEvent::Button { pressed: true, at } => {
                if self.debouncer.accept(at) {
                    self.tally += 1;
                    debug!("button press accepted, tally {}", self.tally);
                }
            }
            InputEvent::Button { pressed: false, .. } => {}
            InputEvent::Switch { on, .. } => {
                if on && !self.switch_on {
                    self.latched = Some(Termination::HardwareInterrupt);
                }
                self.switch_on = on;
            }
            InputEvent::Cancel => self.latched = Some(Termination::OperatorCancel),
        }
    }

    /// The interrupt that should stop the running stage, if any. The switch
    /// keeps interrupting for as long as it stays on.
    pub fn pending_interrupt(&self) -> Option<Termination> {
        self.latched.or(if self.switch_on {
            Some(Termination::HardwareInterrupt)
        } else {
            None
        })
    }

    /// Like `pending_interrupt`, but consumes the latched edge.
    pub fn take_interrupt(&mut self) -> Option<Termination> {
        let pending = self.pending_interrupt();
        self.latched = None;
        pending
    }

    pub fn tally(&self) -> u32 {
        self.tally
    }

    /// Hand over the tally of the finished cycle and start counting from zero.
    pub fn take_tally(&mut self) -> u32 {
        mem::take(&mut self.tally)
    }
}

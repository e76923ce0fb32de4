use crate::clock::Clock;
use crate::config::PollingInterval;
use crate::history::History;
use crate::inputs::ControlInputs;
use crate::rig::Rig;

/// Owns everything the stage runner and the cycle supervisor work on: the rig,
/// the time source, the input side and the history. The runner lives in
/// `runner.rs`, the cycle loop in `supervisor.rs`.
pub struct Controller<'ch, R, C> {
    pub(crate) rig: R,
    pub(crate) clock: C,
    pub(crate) inputs: ControlInputs<'ch>,
    pub(crate) history: History,
}

impl<'ch, R: Rig, C: Clock> Controller<'ch, R, C> {
    pub fn new(rig: R, clock: C, inputs: ControlInputs<'ch>) -> Self {
        Self {
            rig,
            clock,
            inputs,
            history: History::new(),
        }
    }

    pub fn rig(&mut self) -> &mut R {
        &mut self.rig
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn inputs(&mut self) -> &mut ControlInputs<'ch> {
        &mut self.inputs
    }

    /// Takes effect from the next run; the history is cut to the new window
    /// straight away.
    pub fn polling_interval_changed(&mut self, interval: PollingInterval) {
        self.history.trim(interval);
    }
}

/*
 * The cycle supervisor: stages 1 to 6 in order, forever, until an interrupt.
 *
 * At the start of each cycle the button tally of the previous one is archived
 * and reset. The crossing buzzers are held for the duration of their stages
 * and released whichever way the stage ends. The first aborted stage ends
 * normal operation altogether.
 */

use enum_ordinalize::Ordinalize;

use crate::clock::Clock;
use crate::config::PollingInterval;
use crate::controller::Controller;
use crate::inputs::Termination;
use crate::rig::{Notice, Rig};
use crate::runner::StageOutcome;
use crate::stage::{PedestrianFlash, StageId, select_stage};

impl<R: Rig, C: Clock> Controller<'_, R, C> {
    /// Normal operation. Only returns when interrupted.
    pub async fn run(&mut self, interval: PollingInterval) -> Termination {
        info!("normal operation, polling every {} s", interval.secs());
        self.history.trim(interval);

        loop {
            if let Some(reason) = self.run_cycle(interval).await {
                info!("normal operation ended: {}", reason);
                return reason;
            }
        }
    }

    /// One pass over all six stages; `Some` if a stage was aborted.
    pub async fn run_cycle(&mut self, interval: PollingInterval) -> Option<Termination> {
        self.inputs.drain();
        let archived_tally = self.inputs.take_tally();
        self.history.archive_tally(archived_tally);
        self.rig
            .notify(Notice::CycleStarted { archived_tally })
            .await;

        for id in StageId::VARIANTS.iter().copied() {
            let stage = select_stage(id);
            self.rig.notify(Notice::StageStarted(id)).await;

            let buzzer = id.buzzer();
            if let Some(buzzer) = buzzer {
                self.rig.set_buzzer(buzzer, true);
            }

            if let Some(flash) = stage.flash() {
                self.run_flash(flash).await;
            }

            let started = self.clock.now();
            let outcome = self.run_stage(&stage, started, interval).await;

            if let Some(buzzer) = buzzer {
                self.rig.set_buzzer(buzzer, false);
            }

            if let StageOutcome::Aborted(reason) = outcome {
                return Some(reason);
            }

            if id == StageId::MainAmber {
                let presses = self.inputs.tally();
                self.rig.notify(Notice::PedestrianTally(presses)).await;
            }
        }

        None
    }

    async fn run_flash(&mut self, flash: PedestrianFlash) {
        let period = flash.period();
        for frame in flash {
            self.rig.set_lights(frame);
            let next = self.clock.now() + period;
            self.clock.sleep_until(next).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inputs::{ControlInputs, EventChannel};
    use crate::lights::Lamp;
    use crate::rig::Buzzer;
    use crate::testing::{FakeRig, ManualClock};
    use embassy_futures::block_on;
    use embassy_time::Instant;

    fn every(secs: u8) -> PollingInterval {
        PollingInterval::new(secs).unwrap()
    }

    fn fake_controller<'a>(
        clock: &'a ManualClock<'a>,
        channel: &'a EventChannel,
    ) -> Controller<'a, FakeRig, &'a ManualClock<'a>> {
        let inputs = ControlInputs::new(channel.receiver());
        Controller::new(FakeRig::new(), clock, inputs)
    }

    const ALL_STAGES: [StageId; 6] = [
        StageId::MainGreen,
        StageId::MainAmber,
        StageId::AllRed,
        StageId::SideGreen,
        StageId::PedestrianFlash,
        StageId::Clearance,
    ];

    #[test]
    fn completed_cycle_runs_every_stage_once_in_order() {
        let channel = EventChannel::new();
        let clock = ManualClock::new(&channel);
        let mut controller = fake_controller(&clock, &channel);

        let outcome = block_on(controller.run_cycle(every(5)));

        assert_eq!(outcome, None);
        assert_eq!(controller.rig.stages_started(), ALL_STAGES.to_vec());
        // 30 + 3 + 3 + 30 + 3 s of flashing + 3
        assert_eq!(clock.now(), Instant::from_secs(72));
        assert_eq!(
            controller.rig.buzzers,
            vec![
                (Buzzer::Crossing, true),
                (Buzzer::Crossing, false),
                (Buzzer::Closing, true),
                (Buzzer::Closing, false),
            ]
        );
    }

    #[test]
    fn pedestrian_stage_flashes_before_holding_its_lights() {
        let channel = EventChannel::new();
        let clock = ManualClock::new(&channel);
        let mut controller = fake_controller(&clock, &channel);

        block_on(controller.run_cycle(every(5)));

        // one set per stage, six flash frames ahead of stage 5's
        let lights = &controller.rig.lights;
        assert_eq!(lights.len(), 6 + 6);
        let walk: Vec<bool> = lights[4..10]
            .iter()
            .map(|frame| frame.is_lit(Lamp::PedestrianWalk))
            .collect();
        assert_eq!(walk, vec![true, false, true, false, true, false]);
        assert_eq!(lights[10], select_stage(StageId::PedestrianFlash).lights);
    }

    #[test]
    fn tally_is_archived_once_per_cycle_and_reset() {
        let channel = EventChannel::new();
        let clock = ManualClock::new(&channel);
        // 1.4 s is inside the debounce window of the 1 s press
        clock.press_button(1_000);
        clock.press_button(1_400);
        clock.press_button(10_000);
        clock.press_button(80_000);
        let mut controller = fake_controller(&clock, &channel);

        assert_eq!(block_on(controller.run_cycle(every(5))), None);
        assert!(controller.rig.notices.contains(&Notice::PedestrianTally(2)));
        assert_eq!(block_on(controller.run_cycle(every(5))), None);

        let archived: Vec<u32> = controller.history().pedestrians().collect();
        assert_eq!(archived, vec![0, 2]);
        assert_eq!(controller.inputs().tally(), 1);
    }

    #[test]
    fn loops_back_to_stage_one_until_cancelled() {
        let channel = EventChannel::new();
        let clock = ManualClock::new(&channel);
        clock.cancel(80_000);
        let mut controller = fake_controller(&clock, &channel);

        let reason = block_on(controller.run(every(5)));

        assert_eq!(reason, Termination::OperatorCancel);
        let mut expected = ALL_STAGES.to_vec();
        expected.push(StageId::MainGreen);
        assert_eq!(controller.rig.stages_started(), expected);
        assert_eq!(controller.history().pedestrians().count(), 2);
    }

    #[test]
    fn switch_during_stage_three_ends_operation() {
        let channel = EventChannel::new();
        let clock = ManualClock::new(&channel);
        // stage 3 runs from 33 s to 36 s
        clock.set_switch(34_000, true);
        let mut controller = fake_controller(&clock, &channel);

        let reason = block_on(controller.run(every(5)));

        assert_eq!(reason, Termination::HardwareInterrupt);
        assert_eq!(
            controller.rig.stages_started(),
            vec![StageId::MainGreen, StageId::MainAmber, StageId::AllRed]
        );
        assert!(controller.rig.buzzers.is_empty());
        assert!(
            !controller
                .rig
                .lights
                .contains(&select_stage(StageId::SideGreen).lights)
        );
        assert_eq!(
            controller.rig.notices.last(),
            Some(&Notice::Interrupted(Termination::HardwareInterrupt))
        );
    }

    #[test]
    fn buzzer_is_released_when_its_stage_aborts() {
        let channel = EventChannel::new();
        let clock = ManualClock::new(&channel);
        // inside stage 4, 36 s to 66 s
        clock.cancel(50_000);
        let mut controller = fake_controller(&clock, &channel);

        let reason = block_on(controller.run(every(5)));

        assert_eq!(reason, Termination::OperatorCancel);
        assert_eq!(
            controller.rig.buzzers,
            vec![(Buzzer::Crossing, true), (Buzzer::Crossing, false)]
        );
    }

    #[test]
    fn switch_left_on_stops_the_next_run_at_once() {
        let channel = EventChannel::new();
        let clock = ManualClock::new(&channel);
        clock.set_switch(2_000, true);
        let mut controller = fake_controller(&clock, &channel);

        let first = block_on(controller.run(every(5)));
        let polls = controller.rig.ranges;
        let second = block_on(controller.run(every(5)));

        assert_eq!(first, Termination::HardwareInterrupt);
        assert_eq!(second, Termination::HardwareInterrupt);
        assert_eq!(controller.rig.ranges, polls);
    }
}

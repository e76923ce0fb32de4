/*
 * Sonar sampling: one ranging read turned into a reading the engine can use.
 *
 * Readings are rounded to hundredths, latencies to hundredths of a second.
 * Anything at or past the sonar's range limit is recorded as 0 cm. That
 * throws the reading away rather than reporting it, and a 0 looks like a
 * vehicle right at the line to the stage runner.
 */

use embassy_time::{Duration, Instant};

use crate::clock::Clock;
use crate::config::OUT_OF_RANGE_CM;
use crate::rig::Rig;

/// A raw measurement as the rig reports it.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Ranging {
    pub distance_cm: f32,
    /// How long the sensor took to produce the measurement.
    pub latency: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollSample {
    pub distance_cm: f32,
    pub latency: Duration,
    pub taken_at: Instant,
    /// Time since the reference instant, plus the sensor latency.
    pub elapsed: Duration,
}

pub async fn poll<R: Rig, C: Clock>(rig: &mut R, clock: &C, reference: Instant) -> PollSample {
    let ranging = rig.range().await;
    let taken_at = clock.now();
    let latency = round_to_centis(ranging.latency);

    PollSample {
        distance_cm: clamp_out_of_range(round_to_hundredths(ranging.distance_cm)),
        latency,
        taken_at,
        elapsed: taken_at.saturating_duration_since(reference) + latency,
    }
}

pub fn clamp_out_of_range(distance_cm: f32) -> f32 {
    if distance_cm >= OUT_OF_RANGE_CM {
        0.0
    } else {
        distance_cm
    }
}

fn round_to_hundredths(value: f32) -> f32 {
    let scaled = value * 100.0;
    let rounded = if scaled < 0.0 {
        (scaled - 0.5) as i64
    } else {
        (scaled + 0.5) as i64
    };
    rounded as f32 / 100.0
}

fn round_to_centis(latency: Duration) -> Duration {
    Duration::from_millis((latency.as_micros() + 5_000) / 10_000 * 10)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeRig, ManualClock};
    use embassy_futures::block_on;

    #[test]
    fn range_limit_is_recorded_as_zero() {
        assert_eq!(clamp_out_of_range(258.0), 0.0);
        assert_eq!(clamp_out_of_range(400.0), 0.0);
        assert_eq!(clamp_out_of_range(257.99), 257.99);
    }

    #[test]
    fn rounds_to_two_places() {
        assert_eq!(round_to_hundredths(12.344), 12.34);
        assert_eq!(round_to_hundredths(12.346), 12.35);
        let centis = |micros| round_to_centis(Duration::from_micros(micros)).as_millis();
        assert_eq!(centis(23_700), 20);
        assert_eq!(centis(25_000), 30);
    }

    #[test]
    fn poll_reports_clamped_distance_and_elapsed_time() {
        let channel = crate::inputs::EventChannel::new();
        let clock = ManualClock::new(&channel);
        let mut rig = FakeRig::with_readings(&[257.994, 300.0]);
        rig.latency = Duration::from_millis(120);

        let reference = clock.now();
        clock.advance(Duration::from_millis(500));
        let first = block_on(poll(&mut rig, &clock, reference));
        assert_eq!(first.distance_cm, 257.99);
        assert_eq!(first.latency, Duration::from_millis(120));
        assert_eq!(first.elapsed, Duration::from_millis(620));

        let second = block_on(poll(&mut rig, &clock, clock.now()));
        assert_eq!(second.distance_cm, 0.0);
        assert_eq!(second.elapsed, Duration::from_millis(120));
        assert_eq!(rig.ranges, 2);
    }
}

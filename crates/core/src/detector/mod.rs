use serde::{Deserialize, Serialize};

use crate::{CueEngineError, Result};

/// Configuration for [`ScalarEventDetector`].
///
/// Defaults match the tuning used for the box-roll visual: events fire when
/// the signal jumps 0.65 above its moving average, smoothed over a 150 ms
/// half-life, with at least 500 ms between events.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// How far above the moving average a sample must land to fire.
    pub threshold_delta: f32,
    /// Half-life of the exponential moving average in wall-clock
    /// milliseconds, so smoothing is independent of tick rate.
    pub half_life_ms: f64,
    /// Minimum spacing between two fired events.
    pub refractory_ms: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            threshold_delta: 0.65,
            half_life_ms: 150.0,
            refractory_ms: 500.0,
        }
    }
}

impl DetectorConfig {
    pub(crate) fn validate(&self) -> Result<()> {
        if !self.threshold_delta.is_finite() || self.threshold_delta <= 0.0 {
            return Err(CueEngineError::config(format!(
                "threshold_delta must be finite and positive, got {}",
                self.threshold_delta
            )));
        }
        if !self.half_life_ms.is_finite() || self.half_life_ms <= 0.0 {
            return Err(CueEngineError::config(format!(
                "half_life_ms must be finite and positive, got {}",
                self.half_life_ms
            )));
        }
        if !self.refractory_ms.is_finite() || self.refractory_ms <= 0.0 {
            return Err(CueEngineError::config(format!(
                "refractory_ms must be finite and positive, got {}",
                self.refractory_ms
            )));
        }
        Ok(())
    }
}

/// Turns a scalar time series into single-tick event pulses.
///
/// An event fires when the instantaneous sample exceeds the moving average
/// by `threshold_delta` and the refractory period has elapsed since the
/// previous event. The fired state is instantaneous: `step` returns `true`
/// exactly on the firing tick and the detector is immediately armed again
/// (pending refractory).
#[derive(Debug)]
pub struct ScalarEventDetector {
    config: DetectorConfig,
    avg: f32,
    last_step_ms: Option<f64>,
    last_event_ms: Option<f64>,
}

impl ScalarEventDetector {
    pub fn new(config: DetectorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            avg: 0.0,
            last_step_ms: None,
            last_event_ms: None,
        })
    }

    /// Advances the detector by one tick. `now_ms` is a monotonic wall-clock
    /// reading supplied by the tick source. Non-finite samples are treated
    /// as 0 so NaN never reaches the moving average.
    pub fn step(&mut self, sample: f32, now_ms: f64) -> bool {
        let sample = if sample.is_finite() { sample } else { 0.0 };

        let elapsed = self
            .last_step_ms
            .map(|last| (now_ms - last).max(0.0))
            .unwrap_or(0.0);
        self.last_step_ms = Some(now_ms);

        let refractory_elapsed = self
            .last_event_ms
            .map(|last| now_ms - last >= self.config.refractory_ms)
            .unwrap_or(true);
        let fired = refractory_elapsed && sample > self.avg + self.config.threshold_delta;
        if fired {
            self.last_event_ms = Some(now_ms);
        }

        // Blend after the comparison so the spike itself does not raise the
        // bar it is measured against.
        let weight = 0.5f64.powf(elapsed / self.config.half_life_ms) as f32;
        self.avg = weight * self.avg + (1.0 - weight) * sample;

        fired
    }

    /// Milliseconds since the last fired event, for animation interpolation.
    /// Infinite before the first event so blends start fully settled.
    pub fn time_since_last_event_ms(&self, now_ms: f64) -> f64 {
        self.last_event_ms
            .map(|last| (now_ms - last).max(0.0))
            .unwrap_or(f64::INFINITY)
    }

    /// Current value of the moving average.
    pub fn moving_average(&self) -> f32 {
        self.avg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> ScalarEventDetector {
        ScalarEventDetector::new(DetectorConfig::default()).unwrap()
    }

    #[test]
    fn fires_on_spike_above_moving_average() {
        let mut detector = detector();
        let mut now = 0.0;
        for _ in 0..20 {
            assert!(!detector.step(0.1, now));
            now += 16.0;
        }
        assert!(detector.step(1.0, now));
        assert_eq!(detector.time_since_last_event_ms(now), 0.0);
    }

    #[test]
    fn refractory_period_separates_events() {
        let mut detector = detector();
        let mut fired_at = Vec::new();

        // A spike every 100 ms over a quiet floor; the refractory period
        // must thin these to one event per 500 ms.
        let mut now = 0.0;
        for tick in 0..400 {
            let sample = if tick % 6 == 0 { 1.0 } else { 0.0 };
            if detector.step(sample, now) {
                fired_at.push(now);
            }
            now += 16.0;
        }

        assert!(fired_at.len() > 1, "expected multiple events");
        for pair in fired_at.windows(2) {
            assert!(
                pair[1] - pair[0] >= 500.0,
                "events at {} and {} violate refractory period",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn smoothing_is_tick_rate_independent() {
        // Constant input for one half-life should move the average halfway
        // regardless of how many ticks deliver it.
        let mut coarse = detector();
        coarse.step(1.0, 0.0);
        coarse.step(1.0, 150.0);

        let mut fine = detector();
        for tick in 0..=15 {
            fine.step(1.0, tick as f64 * 10.0);
        }

        assert!((coarse.moving_average() - 0.5).abs() < 1e-3);
        assert!((fine.moving_average() - 0.5).abs() < 1e-3);
    }

    #[test]
    fn non_finite_samples_are_treated_as_zero() {
        let mut detector = detector();
        detector.step(f32::NAN, 0.0);
        detector.step(f32::INFINITY, 16.0);
        assert!(detector.moving_average().is_finite());
        assert_eq!(detector.moving_average(), 0.0);
    }

    #[test]
    fn time_since_last_event_grows_between_events() {
        let mut detector = detector();
        assert!(detector.time_since_last_event_ms(0.0).is_infinite());
        assert!(detector.step(1.0, 0.0));
        assert_eq!(detector.time_since_last_event_ms(120.0), 120.0);
    }

    #[test]
    fn rejects_invalid_configuration() {
        for config in [
            DetectorConfig {
                threshold_delta: 0.0,
                ..DetectorConfig::default()
            },
            DetectorConfig {
                half_life_ms: -1.0,
                ..DetectorConfig::default()
            },
            DetectorConfig {
                refractory_ms: f64::NAN,
                ..DetectorConfig::default()
            },
        ] {
            assert!(matches!(
                ScalarEventDetector::new(config),
                Err(CueEngineError::InvalidConfiguration(_))
            ));
        }
    }
}

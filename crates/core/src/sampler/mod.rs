use std::{f32::consts::PI, fmt, sync::Arc};

use realfft::{num_complex::Complex32, RealFftPlanner, RealToComplex};
use serde::{Deserialize, Serialize};

use crate::{CueEngineError, Result};

/// Selects which representation of the audio signal the sampler produces.
///
/// A tagged variant rather than separate analyzer types so that every
/// consumer dispatches through an exhaustive match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalyzerMode {
    /// Frequency bins from a Hann-windowed real FFT.
    Fft,
    /// Raw time-domain samples (oscilloscope style).
    Waveform,
}

/// Configuration for [`SignalSampler`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Number of values produced per tick. Must be a power of two.
    pub buffer_size: usize,
    /// Output values are scaled into `[-max_amplitude, max_amplitude]`.
    pub max_amplitude: f32,
    pub mode: AnalyzerMode,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            buffer_size: 512,
            max_amplitude: 1.0,
            mode: AnalyzerMode::Fft,
        }
    }
}

impl SamplerConfig {
    pub(crate) fn validate(&self) -> Result<()> {
        if self.buffer_size == 0 || !self.buffer_size.is_power_of_two() {
            return Err(CueEngineError::config(format!(
                "buffer_size must be a non-zero power of two, got {}",
                self.buffer_size
            )));
        }
        if !self.max_amplitude.is_finite() || self.max_amplitude <= 0.0 {
            return Err(CueEngineError::config(format!(
                "max_amplitude must be finite and positive, got {}",
                self.max_amplitude
            )));
        }
        Ok(())
    }

    /// Number of raw time-domain samples consumed per tick. FFT mode needs a
    /// 2N block to yield N frequency bins.
    pub fn raw_block_len(&self) -> usize {
        match self.mode {
            AnalyzerMode::Fft => self.buffer_size * 2,
            AnalyzerMode::Waveform => self.buffer_size,
        }
    }
}

/// Converts raw time-domain blocks into a fixed-length buffer of normalized
/// sample values, refreshed in place every tick.
///
/// All working memory (raw block, FFT plan, scratch, output buffer) is
/// allocated at construction; `process` never allocates. Silence is a valid
/// signal: an all-zero raw block simply yields an all-zero sample buffer.
pub struct SignalSampler {
    config: SamplerConfig,
    raw: Vec<f32>,
    buffer: Vec<f32>,
    fft: Option<FftResources>,
}

struct FftResources {
    plan: Arc<dyn RealToComplex<f32>>,
    input: Vec<f32>,
    spectrum: Vec<Complex32>,
    scratch: Vec<Complex32>,
}

impl SignalSampler {
    pub fn new(config: SamplerConfig) -> Result<Self> {
        config.validate()?;

        let fft = match config.mode {
            AnalyzerMode::Fft => {
                let plan = RealFftPlanner::new().plan_fft_forward(config.raw_block_len());
                let input = plan.make_input_vec();
                let spectrum = plan.make_output_vec();
                let scratch = plan.make_scratch_vec();
                Some(FftResources {
                    plan,
                    input,
                    spectrum,
                    scratch,
                })
            }
            AnalyzerMode::Waveform => None,
        };

        Ok(Self {
            raw: vec![0.0; config.raw_block_len()],
            buffer: vec![0.0; config.buffer_size],
            config,
            fft,
        })
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    pub fn max_amplitude(&self) -> f32 {
        self.config.max_amplitude
    }

    /// Mutable view of the raw block the transport writes into before each
    /// tick. Length is fixed at [`SamplerConfig::raw_block_len`].
    pub fn raw_block_mut(&mut self) -> &mut [f32] {
        &mut self.raw
    }

    /// Refills the sample buffer from the current raw block. Non-finite raw
    /// samples are substituted with 0 so NaN never reaches consumers.
    pub fn process(&mut self) {
        for value in &mut self.raw {
            if !value.is_finite() {
                *value = 0.0;
            }
        }

        let max_amplitude = self.config.max_amplitude;
        match self.config.mode {
            AnalyzerMode::Waveform => {
                for (slot, raw) in self.buffer.iter_mut().zip(&self.raw) {
                    *slot = raw.clamp(-1.0, 1.0) * max_amplitude;
                }
            }
            AnalyzerMode::Fft => {
                let fft = self
                    .fft
                    .as_mut()
                    .expect("fft resources exist in fft mode");
                let len = fft.input.len();
                for (index, (slot, raw)) in fft.input.iter_mut().zip(&self.raw).enumerate() {
                    *slot = raw * hann_value(index, len);
                }

                if let Err(err) =
                    fft.plan
                        .process_with_scratch(&mut fft.input, &mut fft.spectrum, &mut fft.scratch)
                {
                    // Buffer lengths are fixed at construction so this should
                    // be unreachable; emit silence rather than stale data.
                    tracing::error!(%err, "fft execution failed");
                    self.buffer.fill(0.0);
                    return;
                }

                let scale = 2.0 / len as f32;
                for (slot, bin) in self.buffer.iter_mut().zip(fft.spectrum.iter()) {
                    *slot = (bin.norm() * scale).min(1.0) * max_amplitude;
                }
            }
        }
    }

    /// Read-only snapshot of the most recent sample buffer. Valid until the
    /// next call to [`SignalSampler::process`].
    pub fn buffer(&self) -> &[f32] {
        &self.buffer
    }

    /// Root mean square of the current sample buffer, the scalar feed for
    /// the event detector.
    pub fn rms(&self) -> f32 {
        let sum: f32 = self.buffer.iter().map(|sample| sample * sample).sum();
        (sum / self.buffer.len() as f32).sqrt()
    }
}

impl fmt::Debug for SignalSampler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalSampler")
            .field("config", &self.config)
            .field("raw", &self.raw.len())
            .field("buffer", &self.buffer.len())
            .finish()
    }
}

fn hann_value(index: usize, len: usize) -> f32 {
    if len <= 1 {
        return 1.0;
    }

    0.5 - 0.5 * ((2.0 * PI * index as f32) / (len as f32 - 1.0)).cos()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn waveform_config(buffer_size: usize) -> SamplerConfig {
        SamplerConfig {
            buffer_size,
            max_amplitude: 1.0,
            mode: AnalyzerMode::Waveform,
        }
    }

    #[test]
    fn silence_yields_all_zero_buffer() {
        let mut sampler = SignalSampler::new(SamplerConfig::default()).unwrap();
        sampler.process();
        assert!(sampler.buffer().iter().all(|sample| *sample == 0.0));
        assert_eq!(sampler.rms(), 0.0);
    }

    #[test]
    fn waveform_mode_clamps_and_scales() {
        let mut sampler = SignalSampler::new(SamplerConfig {
            max_amplitude: 2.0,
            ..waveform_config(8)
        })
        .unwrap();

        let raw = sampler.raw_block_mut();
        raw[0] = 0.5;
        raw[1] = -3.0;
        raw[2] = 1.5;
        sampler.process();

        let buffer = sampler.buffer();
        assert!((buffer[0] - 1.0).abs() < 1e-6);
        assert!((buffer[1] + 2.0).abs() < 1e-6);
        assert!((buffer[2] - 2.0).abs() < 1e-6);
        assert_eq!(buffer[3], 0.0);
    }

    #[test]
    fn non_finite_raw_samples_become_zero() {
        let mut sampler = SignalSampler::new(waveform_config(8)).unwrap();
        let raw = sampler.raw_block_mut();
        raw[0] = f32::NAN;
        raw[1] = f32::INFINITY;
        sampler.process();

        assert!(sampler.buffer().iter().all(|sample| sample.is_finite()));
        assert_eq!(sampler.buffer()[0], 0.0);
        assert_eq!(sampler.buffer()[1], 0.0);
    }

    #[test]
    fn fft_mode_peaks_at_driven_bin() {
        let mut sampler = SignalSampler::new(SamplerConfig {
            buffer_size: 64,
            max_amplitude: 1.0,
            mode: AnalyzerMode::Fft,
        })
        .unwrap();

        // A pure tone completing 8 cycles over the 128-sample block lands in
        // frequency bin 8.
        let len = sampler.raw_block_mut().len() as f32;
        for (index, slot) in sampler.raw_block_mut().iter_mut().enumerate() {
            *slot = (2.0 * PI * 8.0 * index as f32 / len).sin();
        }
        sampler.process();

        let buffer = sampler.buffer();
        let peak = buffer
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(index, _)| index)
            .unwrap();
        assert_eq!(peak, 8);
        assert!(buffer[8] > 0.2);
    }

    #[test]
    fn rejects_non_power_of_two_buffer() {
        let err = SignalSampler::new(waveform_config(100)).unwrap_err();
        assert!(matches!(err, CueEngineError::InvalidConfiguration(_)));
    }

    #[test]
    fn rejects_non_positive_amplitude() {
        let err = SignalSampler::new(SamplerConfig {
            max_amplitude: 0.0,
            ..SamplerConfig::default()
        })
        .unwrap_err();
        assert!(matches!(err, CueEngineError::InvalidConfiguration(_)));
    }
}

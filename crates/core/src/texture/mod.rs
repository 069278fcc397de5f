use crate::{CueEngineError, Result};

/// Relative tolerance before an out-of-range sample is considered noteworthy
/// rather than ordinary floating point slop.
const AMPLITUDE_EPSILON: f32 = 1e-4;

/// Byte buffer holding the fixed-point encoding of one sample buffer,
/// laid out as one RGBA texel per sample: `[x_hi, x_lo, y_hi, y_lo]`.
///
/// Rebuilt in place every tick; the allocation happens once at construction.
#[derive(Debug, Clone)]
pub struct EncodedTexture {
    bytes: Vec<u8>,
}

impl EncodedTexture {
    pub fn new(sample_count: usize) -> Self {
        Self {
            bytes: vec![0; sample_count * 4],
        }
    }

    /// Number of samples (texels) the texture holds.
    pub fn sample_count(&self) -> usize {
        self.bytes.len() / 4
    }

    /// Raw bytes suitable for upload as an RGBA8 texture of width
    /// `sample_count` and height 1.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The four bytes for one sample.
    pub fn texel(&self, index: usize) -> [u8; 4] {
        let offset = index * 4;
        [
            self.bytes[offset],
            self.bytes[offset + 1],
            self.bytes[offset + 2],
            self.bytes[offset + 3],
        ]
    }
}

/// Packs sample values into two 16-bit fixed-point channels per texel.
///
/// Each value is mapped linearly from `[-max_amplitude, max_amplitude]` to
/// `[0, 65535]` and split into a high and low byte. The matching shader-side
/// decode is `((hi*256 + lo) / 65535 * 2 - 1) * max_amplitude`.
#[derive(Debug, Clone)]
pub struct TextureEncoder {
    max_amplitude: f32,
}

impl TextureEncoder {
    pub fn new(max_amplitude: f32) -> Result<Self> {
        if !max_amplitude.is_finite() || max_amplitude <= 0.0 {
            return Err(CueEngineError::config(format!(
                "max_amplitude must be finite and positive, got {max_amplitude}"
            )));
        }
        Ok(Self { max_amplitude })
    }

    /// Amplitude bound shared with the shader-side decode.
    pub fn max_amplitude(&self) -> f32 {
        self.max_amplitude
    }

    /// Re-encodes a sample buffer into `texture`. The x channel carries the
    /// index-normalized position across the amplitude range, the y channel
    /// the sample value. Total: out-of-range values are clamped (and counted
    /// into a single warning per call), non-finite values become 0.
    pub fn encode_into(&self, samples: &[f32], texture: &mut EncodedTexture) {
        debug_assert_eq!(samples.len(), texture.sample_count());

        let span = (samples.len().saturating_sub(1)).max(1) as f32;
        let mut clamped = 0usize;
        for (index, (sample, texel)) in
            samples.iter().zip(texture.bytes.chunks_exact_mut(4)).enumerate()
        {
            let x = (index as f32 / span * 2.0 - 1.0) * self.max_amplitude;
            let (x_hi, x_lo) = self.encode_value(x, &mut clamped);
            let (y_hi, y_lo) = self.encode_value(*sample, &mut clamped);
            texel[0] = x_hi;
            texel[1] = x_lo;
            texel[2] = y_hi;
            texel[3] = y_lo;
        }

        if clamped > 0 {
            tracing::warn!(
                clamped,
                max_amplitude = self.max_amplitude,
                "samples exceeded amplitude range and were clamped"
            );
        }
    }

    /// Checked single-value encode used by validation and tests. Unlike the
    /// per-tick path this rejects rather than clamps.
    pub fn try_encode_value(&self, value: f32) -> Result<(u8, u8)> {
        if !value.is_finite() || value.abs() > self.max_amplitude * (1.0 + AMPLITUDE_EPSILON) {
            return Err(CueEngineError::ValueOutOfRange {
                value,
                max_amplitude: self.max_amplitude,
            });
        }
        let mut clamped = 0;
        Ok(self.encode_value(value, &mut clamped))
    }

    /// Inverse of the encoding, for verification only; rendering decodes on
    /// the GPU.
    pub fn decode_value(&self, hi: u8, lo: u8) -> f32 {
        let unscaled = (hi as f32 * 256.0 + lo as f32) / 65535.0;
        (unscaled * 2.0 - 1.0) * self.max_amplitude
    }

    fn encode_value(&self, value: f32, clamped: &mut usize) -> (u8, u8) {
        let value = if value.is_finite() { value } else { 0.0 };
        if value.abs() > self.max_amplitude * (1.0 + AMPLITUDE_EPSILON) {
            *clamped += 1;
        }
        let normalized = ((value / self.max_amplitude) + 1.0) * 0.5;
        let quantized = (normalized.clamp(0.0, 1.0) * 65535.0).round() as u16;
        ((quantized >> 8) as u8, (quantized & 0xff) as u8)
    }
}

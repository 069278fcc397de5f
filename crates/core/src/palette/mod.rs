use serde::{Deserialize, Serialize};

use crate::{CueEngineError, Result};

/// A named gradient the render collaborator interpolates colors from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColorPalette {
    pub name: String,
    /// RGB stops in [0, 1], evenly spaced along the gradient.
    pub stops: Vec<[f32; 3]>,
}

impl ColorPalette {
    pub fn new(name: impl Into<String>, stops: Vec<[f32; 3]>) -> Self {
        Self {
            name: name.into(),
            stops,
        }
    }

    /// Linear interpolation across the gradient at `t` in [0, 1].
    pub fn lerp_color(&self, t: f32) -> [f32; 3] {
        if self.stops.len() == 1 {
            return self.stops[0];
        }

        let t = t.clamp(0.0, 1.0) * (self.stops.len() - 1) as f32;
        let index = (t.floor() as usize).min(self.stops.len() - 2);
        let alpha = t - index as f32;
        let from = self.stops[index];
        let to = self.stops[index + 1];
        [
            from[0] + (to[0] - from[0]) * alpha,
            from[1] + (to[1] - from[1]) * alpha,
            from[2] + (to[2] - from[2]) * alpha,
        ]
    }
}

/// The built-in rotation used when no palettes are configured.
pub fn default_palettes() -> Vec<ColorPalette> {
    vec![
        ColorPalette::new(
            "rainbow",
            vec![
                [1.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [0.0, 1.0, 0.0],
                [0.0, 1.0, 1.0],
                [0.0, 0.0, 1.0],
            ],
        ),
        ColorPalette::new(
            "sunset",
            vec![[0.98, 0.58, 0.24], [0.93, 0.28, 0.45], [0.40, 0.14, 0.56]],
        ),
        ColorPalette::new(
            "ocean",
            vec![[0.02, 0.22, 0.45], [0.05, 0.55, 0.70], [0.65, 0.93, 0.95]],
        ),
        ColorPalette::new(
            "disco",
            vec![[1.0, 0.41, 0.71], [0.54, 0.17, 0.89], [1.0, 0.84, 0.0]],
        ),
    ]
}

/// Configuration for [`PaletteCycler`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaletteConfig {
    /// Seconds each palette stays active before blending to the next.
    pub interval_seconds: f32,
    pub palettes: Vec<ColorPalette>,
}

impl Default for PaletteConfig {
    fn default() -> Self {
        Self {
            interval_seconds: 15.0,
            palettes: default_palettes(),
        }
    }
}

impl PaletteConfig {
    pub(crate) fn validate(&self) -> Result<()> {
        if self.palettes.is_empty() {
            return Err(CueEngineError::config(
                "at least one palette is required".to_string(),
            ));
        }
        if !self.interval_seconds.is_finite() || self.interval_seconds <= 0.0 {
            return Err(CueEngineError::config(format!(
                "interval_seconds must be finite and positive, got {}",
                self.interval_seconds
            )));
        }
        Ok(())
    }
}

/// Which palette is active and how far the cross-fade to the next one has
/// progressed.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PaletteState {
    pub active_index: usize,
    pub blend_to_next: f32,
}

/// Cycles through the configured palette list on a fixed interval of
/// playback time, with an optional event-driven skip.
#[derive(Debug, Clone)]
pub struct PaletteCycler {
    config: PaletteConfig,
    state: PaletteState,
    skipped: usize,
}

impl PaletteCycler {
    pub fn new(config: PaletteConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            state: PaletteState::default(),
            skipped: 0,
        })
    }

    /// Recomputes the palette state for the given elapsed playback time.
    /// A single-palette list is fine: the index stays 0 and the blend 0.
    pub fn tick(&mut self, elapsed_seconds: f32) -> PaletteState {
        let count = self.config.palettes.len();
        if count == 1 {
            self.state = PaletteState::default();
            return self.state;
        }

        let elapsed = if elapsed_seconds.is_finite() {
            elapsed_seconds.max(0.0)
        } else {
            0.0
        };
        let periods = elapsed / self.config.interval_seconds;
        self.state = PaletteState {
            active_index: (periods.floor() as usize + self.skipped) % count,
            blend_to_next: periods.fract(),
        };
        self.state
    }

    /// Event-driven bump to the next palette, applied on top of the timed
    /// rotation from the next `tick` onward.
    pub fn advance(&mut self) {
        self.skipped = (self.skipped + 1) % self.config.palettes.len();
    }

    pub fn state(&self) -> PaletteState {
        self.state
    }

    pub fn active_palette(&self) -> &ColorPalette {
        &self.config.palettes[self.state.active_index]
    }

    pub fn next_palette(&self) -> &ColorPalette {
        let next = (self.state.active_index + 1) % self.config.palettes.len();
        &self.config.palettes[next]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cycler(interval_seconds: f32) -> PaletteCycler {
        PaletteCycler::new(PaletteConfig {
            interval_seconds,
            palettes: default_palettes(),
        })
        .unwrap()
    }

    #[test]
    fn cycles_with_fractional_blend() {
        let mut cycler = cycler(15.0);
        let state = cycler.tick(37.5);
        assert_eq!(state.active_index, 2);
        assert!((state.blend_to_next - 0.5).abs() < 1e-6);
    }

    #[test]
    fn wraps_around_the_palette_list() {
        let mut cycler = cycler(15.0);
        // 4 palettes, so the fifth interval is palette 0 again.
        assert_eq!(cycler.tick(60.0).active_index, 0);
        assert_eq!(cycler.tick(75.0).active_index, 1);
    }

    #[test]
    fn single_palette_never_blends() {
        let mut cycler = PaletteCycler::new(PaletteConfig {
            interval_seconds: 15.0,
            palettes: vec![ColorPalette::new("solo", vec![[1.0, 1.0, 1.0]])],
        })
        .unwrap();

        let state = cycler.tick(1234.5);
        assert_eq!(state.active_index, 0);
        assert_eq!(state.blend_to_next, 0.0);
    }

    #[test]
    fn advance_shifts_the_timed_rotation() {
        let mut cycler = cycler(15.0);
        assert_eq!(cycler.tick(0.0).active_index, 0);
        cycler.advance();
        assert_eq!(cycler.tick(0.0).active_index, 1);
        assert_eq!(cycler.tick(15.0).active_index, 2);
    }

    #[test]
    fn lerp_color_interpolates_between_stops() {
        let palette = ColorPalette::new("two", vec![[0.0, 0.0, 0.0], [1.0, 1.0, 1.0]]);
        let mid = palette.lerp_color(0.5);
        assert!((mid[0] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn rejects_empty_palette_list() {
        let err = PaletteCycler::new(PaletteConfig {
            interval_seconds: 15.0,
            palettes: Vec::new(),
        })
        .unwrap_err();
        assert!(matches!(err, CueEngineError::InvalidConfiguration(_)));
    }

    #[test]
    fn rejects_non_positive_interval() {
        let err = PaletteCycler::new(PaletteConfig {
            interval_seconds: 0.0,
            palettes: default_palettes(),
        })
        .unwrap_err();
        assert!(matches!(err, CueEngineError::InvalidConfiguration(_)));
    }
}

use crate::{
    config::{CueSheet, EngineConfig},
    cues::{CueId, CueScheduler},
    detector::ScalarEventDetector,
    palette::{PaletteCycler, PaletteState},
    phase::{Phase, PlaybackPhaseController},
    sampler::SignalSampler,
    texture::{EncodedTexture, TextureEncoder},
    Result,
};

/// Read-only view of the externally owned playback transport.
///
/// The engine never mutates playback (no play/pause/seek) and holds no
/// global handle to the audio source; whoever drives the tick loop lends the
/// transport for the duration of each tick, which also guarantees every
/// component observes the same time snapshot.
pub trait AudioTransport {
    /// Current playback position. Monotonic while playing, may jump backward
    /// on a seek.
    fn current_time_seconds(&self) -> f32;

    fn is_ended(&self) -> bool;

    /// Copies the most recent raw time-domain samples into `dst`. A source
    /// that is not producing data yet must fill zeros; silence is a valid
    /// signal.
    fn copy_samples_into(&self, dst: &mut [f32]);
}

/// Everything one tick resolves for the render collaborator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickOutput {
    /// The playback time snapshot this tick was resolved against.
    pub current_time_seconds: f32,
    pub active_cue: CueId,
    /// True exactly on the tick a detector event fired.
    pub event_pulse: bool,
    pub palette: PaletteState,
    /// RMS of the current sample buffer, the scalar the detector consumed.
    pub rms: f32,
}

/// The audio analysis and cue-scheduling engine.
///
/// One external clock drives [`CueEngine::tick`]; internally each tick runs
/// sampler → encoder → detector → scheduler → palette in a fixed order. The
/// hot path is total and allocation-free: every fallible check happens at
/// construction, every per-tick input is sanitized.
pub struct CueEngine {
    sampler: SignalSampler,
    encoder: TextureEncoder,
    texture: EncodedTexture,
    detector: ScalarEventDetector,
    scheduler: CueScheduler,
    cycler: PaletteCycler,
    phase: PlaybackPhaseController,
    last_cue: Option<CueId>,
    last_pulse: bool,
}

impl CueEngine {
    /// Validates the configuration and cue sheet and builds the engine. This
    /// is the only place the error taxonomy surfaces; report failures before
    /// engaging playback.
    pub fn new(config: EngineConfig, sheet: CueSheet) -> Result<Self> {
        let sampler = SignalSampler::new(config.sampler.clone())?;
        let encoder = TextureEncoder::new(config.sampler.max_amplitude)?;
        let texture = EncodedTexture::new(config.sampler.buffer_size);
        let detector = ScalarEventDetector::new(config.detector)?;
        let scheduler = sheet.into_scheduler()?;
        let cycler = PaletteCycler::new(config.palette)?;

        Ok(Self {
            sampler,
            encoder,
            texture,
            detector,
            scheduler,
            cycler,
            phase: PlaybackPhaseController::new(),
            last_cue: None,
            last_pulse: false,
        })
    }

    /// Engages the session. Until this is called, ticks are no-ops.
    pub fn begin(&mut self) {
        self.phase.begin();
    }

    /// Marks the session finished. Terminal; further ticks are no-ops.
    pub fn mark_ended(&mut self) {
        self.phase.mark_ended();
    }

    pub fn phase(&self) -> Phase {
        self.phase.phase()
    }

    /// Runs one tick of the pipeline against the lent transport. `now_ms` is
    /// a monotonic wall-clock reading from the tick source, used only for
    /// detector smoothing and refractory timing.
    ///
    /// Returns `None` unless the session is engaged; once the transport
    /// reports ended, the session finishes and no further output is
    /// produced.
    pub fn tick(&mut self, transport: &dyn AudioTransport, now_ms: f64) -> Option<TickOutput> {
        self.phase.observe_ended(transport.is_ended());
        if !self.phase.is_engaged() {
            self.last_pulse = false;
            return None;
        }

        // One time snapshot shared by the scheduler and the palette cycler.
        let raw_time = transport.current_time_seconds();
        let current_time_seconds = if raw_time.is_finite() { raw_time } else { 0.0 };

        transport.copy_samples_into(self.sampler.raw_block_mut());
        self.sampler.process();
        self.encoder.encode_into(self.sampler.buffer(), &mut self.texture);

        let rms = self.sampler.rms();
        let event_pulse = self.detector.step(rms, now_ms);

        let active_cue = self.scheduler.resolve_active(current_time_seconds);
        self.scheduler.update_reveals(current_time_seconds);
        let palette = self.cycler.tick(current_time_seconds);

        if self.last_cue != Some(active_cue) {
            tracing::debug!(?active_cue, time = current_time_seconds, "active cue changed");
            self.last_cue = Some(active_cue);
        }
        self.last_pulse = event_pulse;

        Some(TickOutput {
            current_time_seconds,
            active_cue,
            event_pulse,
            palette,
            rms,
        })
    }

    /// The encoded texture from the most recent tick, for GPU upload.
    pub fn encoded_texture(&self) -> &EncodedTexture {
        &self.texture
    }

    /// Amplitude bound the shader needs for its side of the decode.
    pub fn max_amplitude(&self) -> f32 {
        self.encoder.max_amplitude()
    }

    /// Read-only snapshot of the current sample buffer.
    pub fn sample_buffer(&self) -> &[f32] {
        self.sampler.buffer()
    }

    /// Whether the named reveal gate has latched.
    pub fn is_revealed(&self, id: &str) -> bool {
        self.scheduler.is_revealed(id)
    }

    /// Clears every reveal latch, for a deliberately restarted presentation.
    pub fn reset_reveals(&mut self) {
        self.scheduler.reset_reveals();
    }

    /// True only if an event fired on the most recent tick.
    pub fn event_pulse(&self) -> bool {
        self.last_pulse
    }

    pub fn palette_state(&self) -> PaletteState {
        self.cycler.state()
    }

    /// Milliseconds since the last detector event, for animation blending.
    pub fn time_since_last_event_ms(&self, now_ms: f64) -> f64 {
        self.detector.time_since_last_event_ms(now_ms)
    }

    /// Skips the palette rotation ahead by one, e.g. keyed to a detector
    /// event.
    pub fn advance_palette(&mut self) {
        self.cycler.advance();
    }
}

impl std::fmt::Debug for CueEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CueEngine")
            .field("phase", &self.phase.phase())
            .field("last_cue", &self.last_cue)
            .finish()
    }
}

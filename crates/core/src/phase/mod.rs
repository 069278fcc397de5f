/// Lifecycle phase of one playback session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No analysis or scheduling runs.
    Idle,
    /// The tick pipeline is live and the audio clock is advancing.
    Engaged,
    /// Terminal. A new session requires a new controller, so no timer from
    /// a finished session can leak into the next one.
    Finished,
}

/// Gates when the engine's tick pipeline is allowed to do work.
///
/// Transitions are driven only by external signals: an explicit
/// [`PlaybackPhaseController::begin`] and the transport's ended flag. Every
/// transition method is idempotent; calls after `Finished` are no-ops.
#[derive(Debug)]
pub struct PlaybackPhaseController {
    phase: Phase,
}

impl Default for PlaybackPhaseController {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackPhaseController {
    pub fn new() -> Self {
        Self { phase: Phase::Idle }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_engaged(&self) -> bool {
        self.phase == Phase::Engaged
    }

    /// Idle → Engaged. No-op in any other phase.
    pub fn begin(&mut self) {
        if self.phase == Phase::Idle {
            self.phase = Phase::Engaged;
            tracing::debug!("playback phase engaged");
        }
    }

    /// Engaged → Finished. No-op in any other phase.
    pub fn mark_ended(&mut self) {
        if self.phase == Phase::Engaged {
            self.phase = Phase::Finished;
            tracing::debug!("playback phase finished");
        }
    }

    /// Applies the transport's ended flag.
    pub fn observe_ended(&mut self, ended: bool) {
        if ended {
            self.mark_ended();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walks_idle_engaged_finished() {
        let mut controller = PlaybackPhaseController::new();
        assert_eq!(controller.phase(), Phase::Idle);

        controller.begin();
        assert_eq!(controller.phase(), Phase::Engaged);

        controller.mark_ended();
        assert_eq!(controller.phase(), Phase::Finished);
    }

    #[test]
    fn finished_is_terminal_and_idempotent() {
        let mut controller = PlaybackPhaseController::new();
        controller.begin();
        controller.mark_ended();

        controller.begin();
        controller.mark_ended();
        controller.observe_ended(true);
        assert_eq!(controller.phase(), Phase::Finished);
    }

    #[test]
    fn ended_flag_is_ignored_while_idle() {
        let mut controller = PlaybackPhaseController::new();
        controller.observe_ended(true);
        assert_eq!(controller.phase(), Phase::Idle);

        controller.begin();
        controller.observe_ended(false);
        assert!(controller.is_engaged());
        controller.observe_ended(true);
        assert_eq!(controller.phase(), Phase::Finished);
    }
}

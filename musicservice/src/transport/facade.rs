use super::SessionController;
use crate::error::Result;
use crate::models::{RepeatMode, SessionActivity, ShuffleMode};
use std::fmt;
use std::sync::Arc;

/// Imperative transport commands understood by the playback service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCommand {
    Play,
    Pause,
    Stop,
    SeekTo(u64),
    SkipToNext,
    SkipToPrevious,
    FastForward,
    Rewind,
    PlayFromMediaId(String),
    SetShuffleMode(ShuffleMode),
    SetRepeatMode(RepeatMode),
}

impl TransportCommand {
    pub fn name(&self) -> &'static str {
        match self {
            TransportCommand::Play => "play",
            TransportCommand::Pause => "pause",
            TransportCommand::Stop => "stop",
            TransportCommand::SeekTo(_) => "seek_to",
            TransportCommand::SkipToNext => "skip_to_next",
            TransportCommand::SkipToPrevious => "skip_to_previous",
            TransportCommand::FastForward => "fast_forward",
            TransportCommand::Rewind => "rewind",
            TransportCommand::PlayFromMediaId(_) => "play_from_media_id",
            TransportCommand::SetShuffleMode(_) => "set_shuffle_mode",
            TransportCommand::SetRepeatMode(_) => "set_repeat_mode",
        }
    }
}

impl fmt::Display for TransportCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportCommand::SeekTo(position_ms) => write!(f, "seek_to({}ms)", position_ms),
            TransportCommand::PlayFromMediaId(id) => write!(f, "play_from_media_id({})", id),
            TransportCommand::SetShuffleMode(mode) => write!(f, "set_shuffle_mode({:?})", mode),
            TransportCommand::SetRepeatMode(mode) => write!(f, "set_repeat_mode({:?})", mode),
            other => write!(f, "{}", other.name()),
        }
    }
}

/// Proxy over the controller of one connected session
///
/// Only the connection manager creates these, one per successful bind.
pub struct TransportFacade {
    controller: Arc<dyn SessionController>,
    generation: u64,
}

impl TransportFacade {
    pub(crate) fn new(controller: Arc<dyn SessionController>, generation: u64) -> Self {
        Self {
            controller,
            generation,
        }
    }

    /// Bind attempt this facade was created for
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn execute(&self, command: &TransportCommand) -> Result<()> {
        log::debug!("Forwarding {} (session #{})", command, self.generation);
        match command {
            TransportCommand::Play => self.controller.play(),
            TransportCommand::Pause => self.controller.pause(),
            TransportCommand::Stop => self.controller.stop(),
            TransportCommand::SeekTo(position_ms) => self.controller.seek_to(*position_ms),
            TransportCommand::SkipToNext => self.controller.skip_to_next(),
            TransportCommand::SkipToPrevious => self.controller.skip_to_previous(),
            TransportCommand::FastForward => self.controller.fast_forward(),
            TransportCommand::Rewind => self.controller.rewind(),
            TransportCommand::PlayFromMediaId(id) => self.controller.play_from_media_id(id),
            TransportCommand::SetShuffleMode(mode) => self.controller.set_shuffle_mode(*mode),
            TransportCommand::SetRepeatMode(mode) => self.controller.set_repeat_mode(*mode),
        }
    }

    pub fn shuffle_mode(&self) -> ShuffleMode {
        self.controller.shuffle_mode()
    }

    pub fn repeat_mode(&self) -> RepeatMode {
        self.controller.repeat_mode()
    }

    pub fn session_activity(&self) -> Option<SessionActivity> {
        self.controller.session_activity()
    }
}


#[cfg(test)]
mod tests {
    use super::mock::MockController;
    use super::*;
    use crate::error::ServiceError;
    use mockall::predicate::eq;

    #[test]
    fn test_execute_forwards_each_command() {
        let mut controller = MockController::new();
        controller.expect_play().times(1).returning(|| Ok(()));
        controller.expect_pause().times(1).returning(|| Ok(()));
        controller
            .expect_seek_to()
            .with(eq(42_000))
            .times(1)
            .returning(|_| Ok(()));
        controller
            .expect_play_from_media_id()
            .withf(|id| id == "track:7")
            .times(1)
            .returning(|_| Ok(()));
        controller
            .expect_set_repeat_mode()
            .with(eq(RepeatMode::All))
            .times(1)
            .returning(|_| Ok(()));

        let facade = TransportFacade::new(Arc::new(controller), 1);

        assert!(facade.execute(&TransportCommand::Play).is_ok());
        assert!(facade.execute(&TransportCommand::Pause).is_ok());
        assert!(facade.execute(&TransportCommand::SeekTo(42_000)).is_ok());
        assert!(facade
            .execute(&TransportCommand::PlayFromMediaId("track:7".to_string()))
            .is_ok());
        assert!(facade
            .execute(&TransportCommand::SetRepeatMode(RepeatMode::All))
            .is_ok());
    }

    #[test]
    fn test_execute_propagates_controller_error() {
        let mut controller = MockController::new();
        controller
            .expect_skip_to_next()
            .returning(|| Err(ServiceError::remote("end of queue")));

        let facade = TransportFacade::new(Arc::new(controller), 3);

        match facade.execute(&TransportCommand::SkipToNext) {
            Err(ServiceError::Remote(msg)) => assert_eq!(msg, "end of queue"),
            other => panic!("Expected Remote error, got {:?}", other),
        }
    }

    #[test]
    fn test_modes_are_read_from_controller() {
        let mut controller = MockController::new();
        controller.expect_shuffle_mode().return_const(ShuffleMode::All);
        controller.expect_repeat_mode().return_const(RepeatMode::One);

        let facade = TransportFacade::new(Arc::new(controller), 1);

        assert_eq!(facade.shuffle_mode(), ShuffleMode::All);
        assert_eq!(facade.repeat_mode(), RepeatMode::One);
    }

    #[test]
    fn test_command_display() {
        assert_eq!(TransportCommand::SeekTo(1500).to_string(), "seek_to(1500ms)");
        assert_eq!(TransportCommand::Rewind.to_string(), "rewind");
        assert_eq!(TransportCommand::SkipToPrevious.name(), "skip_to_previous");
    }
}

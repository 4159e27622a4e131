/// Errors surfaced by the connection manager and its collaborators
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    #[error("Failed to bind to the playback service: {0}")]
    BindFailure(String),

    #[error("Connection to the playback service is suspended")]
    Suspended,

    #[error("Session event: {0}")]
    SessionEvent(String),

    #[error("Cannot run '{command}': not connected to the playback service")]
    NotConnected { command: &'static str },

    #[error("Playback service rejected the request: {0}")]
    Remote(String),

    #[error("Connection manager has shut down")]
    Shutdown,

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("No tokio runtime available: {0}")]
    NoRuntime(String),
}

impl ServiceError {
    pub fn not_connected(command: &'static str) -> Self {
        ServiceError::NotConnected { command }
    }

    pub fn remote(message: impl Into<String>) -> Self {
        ServiceError::Remote(message.into())
    }

    /// True for errors that mean "connect first", as opposed to a rejected call
    pub fn is_disconnected(&self) -> bool {
        matches!(
            self,
            ServiceError::NotConnected { .. } | ServiceError::Suspended | ServiceError::Shutdown
        )
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;

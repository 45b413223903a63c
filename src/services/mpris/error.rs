use super::types::PlayerId;

/// Errors that can occur during media operations
#[derive(thiserror::Error, Debug)]
pub enum MediaError {
    /// Player with the given ID has no live session
    #[error("Player {0} not found")]
    PlayerNotFound(PlayerId),

    /// A discovered bus name does not expose the required player interfaces
    #[error("Player {player} could not be connected: {source}")]
    ConnectionFailed {
        /// Bus name that failed to connect
        player: PlayerId,
        /// Underlying D-Bus failure
        source: zbus::Error,
    },

    /// A transport call (play/pause/next/...) failed
    #[error("Control call {operation} failed for {player}: {source}")]
    ControlFailed {
        /// Target of the failed call
        player: PlayerId,
        /// Name of the failed operation
        operation: &'static str,
        /// Underlying D-Bus failure
        source: zbus::Error,
    },

    /// Failed to initialize the media engine
    #[error("Failed to initialize media engine: {0}")]
    InitializationFailed(String),

    /// The engine loop is gone; no further calls will succeed
    #[error("Media engine is shutting down")]
    ShuttingDown,
}

impl MediaError {
    /// Stable identifier for failure acknowledgments sent to the platform.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PlayerNotFound(_) => "player_not_found",
            Self::ConnectionFailed { .. } => "connection_failed",
            Self::ControlFailed { .. } => "control_failed",
            Self::InitializationFailed(_) => "initialization_failed",
            Self::ShuttingDown => "shutting_down",
        }
    }
}

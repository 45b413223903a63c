use serde::{Deserialize, Serialize};

use crate::services::mpris::{
    error::MediaError,
    types::{AlbumArt, PlaybackStatus, PlayerId},
};

/// Full-state media report for one player.
///
/// The platform side is kept simple by always receiving the whole
/// snapshot rather than deltas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaUpdate {
    /// Bus name of the player
    pub player_id: PlayerId,

    /// Human-readable player name
    pub player_name: String,

    /// Track title
    pub track_name: String,

    /// Track artist
    pub artist: String,

    /// Track URL
    pub url: String,

    /// Resolved album artwork
    pub album_art: AlbumArt,

    /// Current playback status
    pub play_status: PlaybackStatus,
}

/// Capability re-announcement for one player.
///
/// Lighter than a media update; sent when the advertised control surface
/// changes without a paired media or status change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityUpdate {
    /// Bus name of the player
    pub player_id: PlayerId,

    /// Playback states the player can be asked to enter
    pub supported_playback_states: Vec<PlaybackStatus>,

    /// Player can skip to the next track
    pub supports_next: bool,

    /// Player accepts control calls
    pub supports_play_now: bool,
}

/// Outbound event produced for the platform collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PlatformEvent {
    /// Media or playback state changed
    Media(MediaUpdate),

    /// Advertised capabilities changed
    Capabilities(CapabilityUpdate),
}

/// Operation requested by a playlist instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaylistOp {
    /// Skip to the next track
    NextTrack,

    /// Skip to the previous track
    PreviousTrack,
}

/// Inbound instruction from the platform collaborator.
///
/// One case per instruction kind; the dispatcher matches exhaustively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "instruction", rename_all = "snake_case")]
pub enum Instruction {
    /// Track navigation on an explicit player
    Playlist {
        /// Target player bus name
        player_id: String,
        /// Requested operation
        op: PlaylistOp,
    },

    /// Explicit target playback status on an explicit player
    Media {
        /// Target player bus name
        player_id: String,
        /// Requested playback status
        target_status: PlaybackStatus,
    },

    /// Volume change, routed to the current player without id resolution
    Volume {
        /// Requested volume level (0.0 to 1.0)
        level: f64,
    },
}

/// Acknowledgment returned to the platform for every instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum InstructionAck {
    /// Instruction was routed and the transport call succeeded
    Success,

    /// Resolution or transport failed
    Failure {
        /// Stable error kind (e.g. "player_not_found")
        kind: String,
        /// Human-readable detail
        detail: String,
    },
}

impl InstructionAck {
    /// Build the acknowledgment for a routing result.
    pub fn from_result(result: &Result<(), MediaError>) -> Self {
        match result {
            Ok(()) => Self::Success,
            Err(error) => Self::Failure {
                kind: error.kind().to_string(),
                detail: error.to_string(),
            },
        }
    }
}

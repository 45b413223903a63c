use std::fmt;

use serde::{Deserialize, Serialize};

/// Bus names carrying this prefix are treated as media players.
pub const MPRIS_NAME_PREFIX: &str = "org.mpris.MediaPlayer2.";

/// Placeholder title when a player reports no usable track name.
pub const UNKNOWN_TRACK: &str = "Unknown Track";

/// Placeholder artist when a player reports no usable artist.
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// Unique identifier for a media player
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    /// Create a PlayerId from a D-Bus bus name
    pub fn from_bus_name(bus_name: &str) -> Self {
        Self(bus_name.to_string())
    }

    /// Get the D-Bus bus name
    pub fn bus_name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Current playback status of a media player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackStatus {
    /// Player is currently playing
    Playing,

    /// Player is paused
    Paused,

    /// Player is stopped
    Stopped,

    /// Player reported a status outside the MPRIS vocabulary
    Unknown,
}

impl PlaybackStatus {
    /// Map a bus-reported status string to the enum.
    ///
    /// Matching is case-insensitive; unrecognized values become `Unknown`
    /// rather than failing.
    pub fn parse(status: &str) -> Self {
        match status.to_ascii_lowercase().as_str() {
            "playing" => Self::Playing,
            "paused" => Self::Paused,
            "stopped" => Self::Stopped,
            _ => Self::Unknown,
        }
    }
}

/// Album artwork attached to a media snapshot.
///
/// Local-file references are resolved into inline bytes at update time;
/// remote references stay as URLs. Compared by content.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AlbumArt {
    /// No artwork advertised
    #[default]
    None,

    /// Raw image bytes read from a local file
    Bytes {
        /// Image data
        data: Vec<u8>,
        /// Guessed mime type
        mime: String,
    },

    /// External reference left for the consumer to fetch
    Url {
        /// Location of the artwork
        url: String,
    },
}

/// In-memory mirror of a player's current track.
///
/// Field-wise equality decides whether a change is worth re-reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaSnapshot {
    /// Track title
    pub track_name: String,

    /// First reported artist
    pub artist: String,

    /// Track URL
    pub url: String,

    /// Resolved album artwork
    pub album_art: AlbumArt,
}

impl Default for MediaSnapshot {
    fn default() -> Self {
        Self {
            track_name: UNKNOWN_TRACK.to_string(),
            artist: UNKNOWN_ARTIST.to_string(),
            url: String::new(),
            album_art: AlbumArt::None,
        }
    }
}

/// Control surface a player advertises.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlayerCapabilities {
    /// Player can skip to the next track
    pub supports_next: bool,

    /// Player accepts control calls at all
    pub supports_play_now: bool,

    /// Playback states the player can be asked to enter
    pub supported_playback_states: Vec<PlaybackStatus>,
}

impl PlayerCapabilities {
    /// Derive the capability set from the advertised can-* flags.
    pub fn from_flags(
        can_play: bool,
        can_pause: bool,
        can_go_next: bool,
        can_control: bool,
    ) -> Self {
        let mut supported_playback_states = Vec::new();
        if can_play {
            supported_playback_states.push(PlaybackStatus::Playing);
        }
        if can_pause {
            supported_playback_states.push(PlaybackStatus::Paused);
        }

        Self {
            supports_next: can_go_next,
            supports_play_now: can_control,
            supported_playback_states,
        }
    }
}

use serde::{Deserialize, Serialize};

/// Settings for the media player bridge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Patterns to ignore when discovering players.
    ///
    /// Matched with `contains()` against the D-Bus bus name, so a pattern
    /// of "playerctld" skips `org.mpris.MediaPlayer2.playerctld`.
    #[serde(default)]
    pub ignored_players: Vec<String>,

    /// Whether `file://` album-art references are read into inline bytes.
    ///
    /// When disabled, local art references are forwarded as URLs like
    /// remote ones.
    #[serde(default = "default_true")]
    pub resolve_local_art: bool,
}

fn default_true() -> bool {
    true
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            ignored_players: Vec::new(),
            resolve_local_art: true,
        }
    }
}

use std::collections::HashMap;

use async_trait::async_trait;
use tracing::instrument;
use zbus::{Connection, zvariant::OwnedValue};

use super::{
    art::ArtResolver,
    error::MediaError,
    metadata,
    proxy::{MediaPlayer2PlayerProxy, MediaPlayer2Proxy},
    types::{MediaSnapshot, PlaybackStatus, PlayerCapabilities, PlayerId},
};

/// Playback control surface of one player.
///
/// The live implementation wraps the MPRIS player proxy; tests substitute
/// a fake to exercise routing and merge logic without a bus.
#[async_trait]
pub trait PlayerTransport: Send + Sync {
    /// Start playback
    async fn play(&self) -> zbus::Result<()>;

    /// Pause playback
    async fn pause(&self) -> zbus::Result<()>;

    /// Toggle play/pause state
    async fn play_pause(&self) -> zbus::Result<()>;

    /// Stop playback
    async fn stop(&self) -> zbus::Result<()>;

    /// Skip to next track
    async fn next(&self) -> zbus::Result<()>;

    /// Skip to previous track
    async fn previous(&self) -> zbus::Result<()>;

    /// Set the player volume (0.0 to 1.0)
    async fn set_volume(&self, level: f64) -> zbus::Result<()>;
}

/// Live transport backed by the MPRIS player proxy.
pub struct MprisTransport {
    player: MediaPlayer2PlayerProxy<'static>,
}

#[async_trait]
impl PlayerTransport for MprisTransport {
    async fn play(&self) -> zbus::Result<()> {
        self.player.play().await
    }

    async fn pause(&self) -> zbus::Result<()> {
        self.player.pause().await
    }

    async fn play_pause(&self) -> zbus::Result<()> {
        self.player.play_pause().await
    }

    async fn stop(&self) -> zbus::Result<()> {
        self.player.stop().await
    }

    async fn next(&self) -> zbus::Result<()> {
        self.player.next().await
    }

    async fn previous(&self) -> zbus::Result<()> {
        self.player.previous().await
    }

    async fn set_volume(&self, level: f64) -> zbus::Result<()> {
        self.player.set_volume(level).await
    }
}

/// Raw can-* flags as last reported by the player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct CapabilityFlags {
    pub can_play: bool,
    pub can_pause: bool,
    pub can_go_next: bool,
    pub can_control: bool,
}

impl CapabilityFlags {
    fn derive(self) -> PlayerCapabilities {
        PlayerCapabilities::from_flags(
            self.can_play,
            self.can_pause,
            self.can_go_next,
            self.can_control,
        )
    }
}

/// Which externally observable parts of a session a property diff touched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionDiff {
    /// Track metadata (title, artist, url, art) changed
    pub media: bool,

    /// Playback status changed
    pub playback: bool,

    /// Derived capability set changed
    pub capabilities: bool,
}

impl SessionDiff {
    /// Whether anything observable changed at all.
    pub fn observable(self) -> bool {
        self.media || self.playback || self.capabilities
    }
}

/// Live mirror of one media player.
///
/// Created when its bus name gains an owner, seeded by one full property
/// fetch, then mutated exclusively by property-change payloads applied in
/// delivery order. Destroyed when the name loses its owner.
#[derive(Debug)]
pub struct PlayerSession<T: PlayerTransport> {
    id: PlayerId,
    display_name: String,
    snapshot: MediaSnapshot,
    status: PlaybackStatus,
    flags: CapabilityFlags,
    art: ArtResolver,
    transport: T,
}

impl PlayerSession<MprisTransport> {
    /// Open the per-player interfaces and seed the mirror with one full
    /// fetch. The seed is baseline state; no change event results from it.
    ///
    /// # Errors
    /// Returns `MediaError::ConnectionFailed` if the name does not answer
    /// on the player interface; the caller discards the session without
    /// side effects.
    #[instrument(skip(connection, art), fields(bus_name = %id.bus_name()))]
    pub async fn connect(
        connection: &Connection,
        id: PlayerId,
        art: ArtResolver,
    ) -> Result<Self, MediaError> {
        let connect_failed = |source| MediaError::ConnectionFailed {
            player: id.clone(),
            source,
        };

        let base_proxy = MediaPlayer2Proxy::builder(connection)
            .destination(id.bus_name().to_string())
            .map_err(connect_failed)?
            .build()
            .await
            .map_err(connect_failed)?;

        let player_proxy = MediaPlayer2PlayerProxy::builder(connection)
            .destination(id.bus_name().to_string())
            .map_err(connect_failed)?
            .build()
            .await
            .map_err(connect_failed)?;

        // PlaybackStatus and Metadata are the player contract; a name that
        // cannot answer these is not a usable player.
        let status_str = player_proxy
            .playback_status()
            .await
            .map_err(connect_failed)?;
        let metadata_map = player_proxy.metadata().await.map_err(connect_failed)?;

        // Identity and capability flags are read permissively.
        let display_name = base_proxy
            .identity()
            .await
            .unwrap_or_else(|_| id.bus_name().to_string());

        let flags = CapabilityFlags {
            can_play: player_proxy.can_play().await.unwrap_or(false),
            can_pause: player_proxy.can_pause().await.unwrap_or(false),
            can_go_next: player_proxy.can_go_next().await.unwrap_or(false),
            can_control: player_proxy.can_control().await.unwrap_or(false),
        };

        let snapshot = metadata::snapshot_from_metadata(&metadata_map, &art);
        let status = PlaybackStatus::parse(&status_str);

        Ok(Self::assemble(
            id,
            display_name,
            MprisTransport {
                player: player_proxy,
            },
            art,
            snapshot,
            status,
            flags,
        ))
    }
}

impl<T: PlayerTransport> PlayerSession<T> {
    pub(crate) fn assemble(
        id: PlayerId,
        display_name: String,
        transport: T,
        art: ArtResolver,
        snapshot: MediaSnapshot,
        status: PlaybackStatus,
        flags: CapabilityFlags,
    ) -> Self {
        Self {
            id,
            display_name,
            snapshot,
            status,
            flags,
            art,
            transport,
        }
    }

    /// Bus-name identifier of this player.
    pub fn id(&self) -> &PlayerId {
        &self.id
    }

    /// Human-readable player name.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Current track mirror.
    pub fn snapshot(&self) -> &MediaSnapshot {
        &self.snapshot
    }

    /// Current playback status.
    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    /// Capability set derived from the last reported flags.
    pub fn capabilities(&self) -> PlayerCapabilities {
        self.flags.derive()
    }

    /// Merge a partial property update into the mirror.
    ///
    /// Returns which observable parts changed. Unknown properties and
    /// malformed values change nothing; applying the same payload twice
    /// reports a change only the first time.
    pub fn apply_property_diff(&mut self, changed: &HashMap<String, OwnedValue>) -> SessionDiff {
        let mut diff = SessionDiff::default();

        if let Some(value) = changed.get("PlaybackStatus") {
            if let Ok(status_str) = String::try_from(value.clone()) {
                let status = PlaybackStatus::parse(&status_str);
                if status != self.status {
                    self.status = status;
                    diff.playback = true;
                }
            }
        }

        if let Some(value) = changed.get("Metadata") {
            if let Ok(map) = HashMap::<String, OwnedValue>::try_from(value.clone()) {
                let snapshot = metadata::snapshot_from_metadata(&map, &self.art);
                if snapshot != self.snapshot {
                    self.snapshot = snapshot;
                    diff.media = true;
                }
            }
        }

        let previous = self.flags;
        for (key, value) in changed {
            let Ok(flag) = bool::try_from(value.clone()) else {
                continue;
            };

            match key.as_str() {
                "CanPlay" => self.flags.can_play = flag,
                "CanPause" => self.flags.can_pause = flag,
                "CanGoNext" => self.flags.can_go_next = flag,
                "CanControl" => self.flags.can_control = flag,
                _ => {}
            }
        }
        if self.flags.derive() != previous.derive() {
            diff.capabilities = true;
        }

        diff
    }

    /// Start playback.
    ///
    /// # Errors
    /// Returns `MediaError::ControlFailed` if the bus call fails; never retried.
    pub async fn play(&self) -> Result<(), MediaError> {
        self.transport
            .play()
            .await
            .map_err(|source| self.control_failed("Play", source))
    }

    /// Pause playback.
    ///
    /// # Errors
    /// Returns `MediaError::ControlFailed` if the bus call fails; never retried.
    pub async fn pause(&self) -> Result<(), MediaError> {
        self.transport
            .pause()
            .await
            .map_err(|source| self.control_failed("Pause", source))
    }

    /// Toggle play/pause.
    ///
    /// # Errors
    /// Returns `MediaError::ControlFailed` if the bus call fails; never retried.
    pub async fn play_pause(&self) -> Result<(), MediaError> {
        self.transport
            .play_pause()
            .await
            .map_err(|source| self.control_failed("PlayPause", source))
    }

    /// Stop playback.
    ///
    /// # Errors
    /// Returns `MediaError::ControlFailed` if the bus call fails; never retried.
    pub async fn stop(&self) -> Result<(), MediaError> {
        self.transport
            .stop()
            .await
            .map_err(|source| self.control_failed("Stop", source))
    }

    /// Skip to the next track.
    ///
    /// # Errors
    /// Returns `MediaError::ControlFailed` if the bus call fails; never retried.
    pub async fn next(&self) -> Result<(), MediaError> {
        self.transport
            .next()
            .await
            .map_err(|source| self.control_failed("Next", source))
    }

    /// Skip to the previous track.
    ///
    /// # Errors
    /// Returns `MediaError::ControlFailed` if the bus call fails; never retried.
    pub async fn previous(&self) -> Result<(), MediaError> {
        self.transport
            .previous()
            .await
            .map_err(|source| self.control_failed("Previous", source))
    }

    /// Set the player volume.
    ///
    /// # Errors
    /// Returns `MediaError::ControlFailed` if the bus call fails; never retried.
    pub async fn set_volume(&self, level: f64) -> Result<(), MediaError> {
        self.transport
            .set_volume(level)
            .await
            .map_err(|source| self.control_failed("Volume", source))
    }

    fn control_failed(&self, operation: &'static str, source: zbus::Error) -> MediaError {
        MediaError::ControlFailed {
            player: self.id.clone(),
            operation,
            source,
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use super::*;

    /// Transport that records calls instead of talking to a bus.
    #[derive(Debug, Default)]
    pub struct FakeTransport {
        pub calls: Arc<Mutex<Vec<&'static str>>>,
        pub fail: bool,
    }

    impl FakeTransport {
        fn record(&self, call: &'static str) -> zbus::Result<()> {
            if self.fail {
                return Err(zbus::Error::Failure(format!("{call} refused")));
            }
            if let Ok(mut calls) = self.calls.lock() {
                calls.push(call);
            }
            Ok(())
        }
    }

    #[async_trait]
    impl PlayerTransport for FakeTransport {
        async fn play(&self) -> zbus::Result<()> {
            self.record("play")
        }

        async fn pause(&self) -> zbus::Result<()> {
            self.record("pause")
        }

        async fn play_pause(&self) -> zbus::Result<()> {
            self.record("play_pause")
        }

        async fn stop(&self) -> zbus::Result<()> {
            self.record("stop")
        }

        async fn next(&self) -> zbus::Result<()> {
            self.record("next")
        }

        async fn previous(&self) -> zbus::Result<()> {
            self.record("previous")
        }

        async fn set_volume(&self, _level: f64) -> zbus::Result<()> {
            self.record("set_volume")
        }
    }

    impl PlayerSession<FakeTransport> {
        /// Calls recorded by the fake transport, in order.
        pub fn transport_calls(&self) -> Vec<&'static str> {
            self.transport
                .calls
                .lock()
                .map(|calls| calls.clone())
                .unwrap_or_default()
        }
    }

    /// Session over a fake transport, seeded with defaults.
    pub fn fake_session(bus_name: &str) -> PlayerSession<FakeTransport> {
        fake_session_with(bus_name, FakeTransport::default())
    }

    /// Session over a specific fake transport instance.
    pub fn fake_session_with(
        bus_name: &str,
        transport: FakeTransport,
    ) -> PlayerSession<FakeTransport> {
        PlayerSession::assemble(
            PlayerId::from_bus_name(bus_name),
            bus_name.to_string(),
            transport,
            ArtResolver::new(true),
            MediaSnapshot::default(),
            PlaybackStatus::Stopped,
            CapabilityFlags {
                can_play: true,
                can_pause: true,
                can_go_next: true,
                can_control: true,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use zbus::zvariant::Value;

    use super::{test_support::fake_session, *};
    use crate::services::mpris::{
        metadata::test_support::value_map,
        types::{AlbumArt, UNKNOWN_ARTIST},
    };

    fn metadata_diff(title: &str) -> HashMap<String, OwnedValue> {
        let mut inner = HashMap::new();
        inner.insert("xesam:title", Value::from(title));
        value_map(vec![("Metadata", Value::from(inner))])
    }

    #[test]
    fn metadata_change_is_observed_once() {
        let mut session = fake_session("org.mpris.MediaPlayer2.vlc");
        let diff = metadata_diff("Song A");

        let first = session.apply_property_diff(&diff);
        assert!(first.media);
        assert!(first.observable());
        assert_eq!(session.snapshot().track_name, "Song A");
        assert_eq!(session.snapshot().artist, UNKNOWN_ARTIST);

        let second = session.apply_property_diff(&diff);
        assert!(!second.observable());
    }

    #[test]
    fn playback_status_case_change_is_not_a_change() {
        let mut session = fake_session("org.mpris.MediaPlayer2.vlc");

        let first =
            session.apply_property_diff(&value_map(vec![("PlaybackStatus", Value::from("Playing"))]));
        assert!(first.playback);
        assert_eq!(session.status(), PlaybackStatus::Playing);

        let second =
            session.apply_property_diff(&value_map(vec![("PlaybackStatus", Value::from("playing"))]));
        assert!(!second.observable());
        assert_eq!(session.status(), PlaybackStatus::Playing);
    }

    #[test]
    fn unrecognized_status_maps_to_unknown() {
        let mut session = fake_session("org.mpris.MediaPlayer2.vlc");

        let diff =
            session.apply_property_diff(&value_map(vec![("PlaybackStatus", Value::from("Buffering"))]));

        assert!(diff.playback);
        assert_eq!(session.status(), PlaybackStatus::Unknown);
    }

    #[test]
    fn unrelated_property_changes_nothing() {
        let mut session = fake_session("org.mpris.MediaPlayer2.vlc");

        let diff = session.apply_property_diff(&value_map(vec![
            ("Rate", Value::from(1.5f64)),
            ("Shuffle", Value::from(true)),
        ]));

        assert!(!diff.observable());
    }

    #[test]
    fn capability_flip_is_a_capability_change_only() {
        let mut session = fake_session("org.mpris.MediaPlayer2.vlc");

        let diff = session.apply_property_diff(&value_map(vec![("CanGoNext", Value::from(false))]));

        assert!(diff.capabilities);
        assert!(!diff.media);
        assert!(!diff.playback);
        assert!(!session.capabilities().supports_next);

        let repeat = session.apply_property_diff(&value_map(vec![("CanGoNext", Value::from(false))]));
        assert!(!repeat.observable());
    }

    #[test]
    fn malformed_playback_status_is_ignored() {
        let mut session = fake_session("org.mpris.MediaPlayer2.vlc");

        let diff = session.apply_property_diff(&value_map(vec![("PlaybackStatus", Value::from(7u32))]));

        assert!(!diff.observable());
        assert_eq!(session.status(), PlaybackStatus::Stopped);
    }

    #[test]
    fn metadata_with_art_reference_resolves_remote_url() {
        let mut session = fake_session("org.mpris.MediaPlayer2.vlc");

        let mut inner = HashMap::new();
        inner.insert("xesam:title", Value::from("Song A"));
        inner.insert("mpris:artUrl", Value::from("https://example.com/a.jpg"));
        let diff = session.apply_property_diff(&value_map(vec![("Metadata", Value::from(inner))]));

        assert!(diff.media);
        assert_eq!(
            session.snapshot().album_art,
            AlbumArt::Url { url: "https://example.com/a.jpg".to_string() }
        );
    }

    #[tokio::test]
    async fn control_calls_reach_the_transport() {
        let session = fake_session("org.mpris.MediaPlayer2.vlc");

        session.play().await.unwrap();
        session.pause().await.unwrap();
        session.play_pause().await.unwrap();
        session.next().await.unwrap();
        session.previous().await.unwrap();
        session.stop().await.unwrap();
        session.set_volume(0.7).await.unwrap();

        let transport_calls = session.transport.calls.lock().unwrap().clone();
        assert_eq!(
            transport_calls,
            vec!["play", "pause", "play_pause", "next", "previous", "stop", "set_volume"]
        );
    }

    #[tokio::test]
    async fn control_failure_surfaces_as_control_error() {
        let session = super::test_support::fake_session_with(
            "org.mpris.MediaPlayer2.vlc",
            super::test_support::FakeTransport {
                fail: true,
                ..Default::default()
            },
        );

        let error = session.play().await.unwrap_err();

        assert!(matches!(error, MediaError::ControlFailed { operation: "Play", .. }));
        assert_eq!(error.kind(), "control_failed");
    }
}

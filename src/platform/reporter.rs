use std::collections::HashMap;

use tokio::sync::mpsc;
use tracing::debug;

use super::types::{CapabilityUpdate, MediaUpdate, PlatformEvent};
use crate::services::mpris::{
    session::{PlayerSession, PlayerTransport, SessionDiff},
    types::PlayerId,
};

/// Converts session state into outbound platform events, deduplicated
/// against the last report per player.
///
/// Two identical snapshots are never both reported; only transitions go
/// out. Memory for a player is dropped when its session is removed.
pub struct StateReporter {
    events: mpsc::UnboundedSender<PlatformEvent>,
    last_media: HashMap<PlayerId, MediaUpdate>,
    last_capabilities: HashMap<PlayerId, CapabilityUpdate>,
}

impl StateReporter {
    /// Create a reporter feeding the given event sink.
    pub fn new(events: mpsc::UnboundedSender<PlatformEvent>) -> Self {
        Self {
            events,
            last_media: HashMap::new(),
            last_capabilities: HashMap::new(),
        }
    }

    /// Report whatever a property diff made observable.
    ///
    /// A diff with nothing observable emits nothing; capability-only
    /// changes emit the lighter capability re-announcement.
    pub fn report<T: PlayerTransport>(&mut self, session: &PlayerSession<T>, diff: SessionDiff) {
        if diff.media || diff.playback {
            self.report_media(session);
        }

        if diff.capabilities {
            self.report_capabilities(session);
        }
    }

    /// Emit a full-state media update unless identical to the last one.
    pub fn report_media<T: PlayerTransport>(&mut self, session: &PlayerSession<T>) {
        let snapshot = session.snapshot();
        let update = MediaUpdate {
            player_id: session.id().clone(),
            player_name: session.display_name().to_string(),
            track_name: snapshot.track_name.clone(),
            artist: snapshot.artist.clone(),
            url: snapshot.url.clone(),
            album_art: snapshot.album_art.clone(),
            play_status: session.status(),
        };

        if self.last_media.get(session.id()) == Some(&update) {
            debug!("Suppressing duplicate media update for {}", session.id());
            return;
        }

        self.last_media.insert(session.id().clone(), update.clone());
        let _ = self.events.send(PlatformEvent::Media(update));
    }

    /// Emit a capability re-announcement unless identical to the last one.
    pub fn report_capabilities<T: PlayerTransport>(&mut self, session: &PlayerSession<T>) {
        let capabilities = session.capabilities();
        let update = CapabilityUpdate {
            player_id: session.id().clone(),
            supported_playback_states: capabilities.supported_playback_states,
            supports_next: capabilities.supports_next,
            supports_play_now: capabilities.supports_play_now,
        };

        if self.last_capabilities.get(session.id()) == Some(&update) {
            debug!(
                "Suppressing duplicate capability update for {}",
                session.id()
            );
            return;
        }

        self.last_capabilities
            .insert(session.id().clone(), update.clone());
        let _ = self.events.send(PlatformEvent::Capabilities(update));
    }

    /// Drop dedup memory for a removed player.
    pub fn forget(&mut self, id: &PlayerId) {
        self.last_media.remove(id);
        self.last_capabilities.remove(id);
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::collections::HashMap;

    use zbus::zvariant::Value;

    use super::*;
    use crate::services::mpris::{
        metadata::test_support::value_map,
        session::test_support::fake_session,
        types::PlaybackStatus,
    };

    fn reporter() -> (StateReporter, mpsc::UnboundedReceiver<PlatformEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (StateReporter::new(tx), rx)
    }

    fn title_diff(title: &str) -> HashMap<String, zbus::zvariant::OwnedValue> {
        let mut inner = HashMap::new();
        inner.insert("xesam:title", Value::from(title));
        value_map(vec![("Metadata", Value::from(inner))])
    }

    #[test]
    fn observable_change_is_reported_once() {
        let (mut reporter, mut rx) = reporter();
        let mut session = fake_session("org.mpris.MediaPlayer2.vlc");

        let diff = session.apply_property_diff(&title_diff("Song A"));
        reporter.report(&session, diff);

        let event = rx.try_recv().unwrap();
        match event {
            PlatformEvent::Media(update) => {
                assert_eq!(update.track_name, "Song A");
                assert_eq!(update.play_status, PlaybackStatus::Stopped);
            }
            PlatformEvent::Capabilities(_) => panic!("expected media update"),
        }

        // Same payload again: merge reports no change, nothing emitted.
        let diff = session.apply_property_diff(&title_diff("Song A"));
        reporter.report(&session, diff);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn no_observable_change_emits_nothing() {
        let (mut reporter, mut rx) = reporter();
        let mut session = fake_session("org.mpris.MediaPlayer2.vlc");

        let diff = session.apply_property_diff(&value_map(vec![("Rate", Value::from(1.25f64))]));
        reporter.report(&session, diff);

        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn identical_snapshot_is_suppressed_even_if_forced() {
        let (mut reporter, mut rx) = reporter();
        let session = fake_session("org.mpris.MediaPlayer2.vlc");

        reporter.report_media(&session);
        assert!(rx.try_recv().is_ok());

        reporter.report_media(&session);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn capability_only_change_emits_capability_update() {
        let (mut reporter, mut rx) = reporter();
        let mut session = fake_session("org.mpris.MediaPlayer2.vlc");

        let diff = session.apply_property_diff(&value_map(vec![("CanGoNext", Value::from(false))]));
        reporter.report(&session, diff);

        match rx.try_recv().unwrap() {
            PlatformEvent::Capabilities(update) => {
                assert!(!update.supports_next);
                assert!(update.supports_play_now);
            }
            PlatformEvent::Media(_) => panic!("expected capability update"),
        }
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn forget_allows_rereport_after_reconnect() {
        let (mut reporter, mut rx) = reporter();
        let session = fake_session("org.mpris.MediaPlayer2.vlc");

        reporter.report_media(&session);
        rx.try_recv().unwrap();

        reporter.forget(session.id());

        reporter.report_media(&session);
        assert!(rx.try_recv().is_ok());
    }
}

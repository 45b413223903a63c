use std::collections::HashMap;

use super::{
    error::MediaError,
    session::{PlayerSession, PlayerTransport},
    types::{MPRIS_NAME_PREFIX, PlayerId},
};

/// What a NameOwnerChanged notification means for the player set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnershipChange {
    /// A player's bus name gained an owner
    Appeared(PlayerId),

    /// A player's bus name lost its owner
    Vanished(PlayerId),

    /// Not a player name, or an owner handoff with no appearance/loss
    Irrelevant,
}

impl OwnershipChange {
    /// Classify a raw ownership notification.
    ///
    /// Names outside the MPRIS namespace are irrelevant, as are handoffs
    /// where both owners are populated (the name stayed alive).
    pub fn classify(name: &str, old_owner: &str, new_owner: &str) -> Self {
        if !name.starts_with(MPRIS_NAME_PREFIX) {
            return Self::Irrelevant;
        }

        match (old_owner.is_empty(), new_owner.is_empty()) {
            (true, false) => Self::Appeared(PlayerId::from_bus_name(name)),
            (false, true) => Self::Vanished(PlayerId::from_bus_name(name)),
            _ => Self::Irrelevant,
        }
    }
}

/// Owns the set of live player sessions.
///
/// Invariant: a bus name is a key exactly while a live session exists for
/// it. `current` points at the most recently connected player and is
/// cleared, never re-pointed, when that player vanishes.
pub struct PlayerRegistry<T: PlayerTransport> {
    players: HashMap<PlayerId, PlayerSession<T>>,
    current: Option<PlayerId>,
    ignored_patterns: Vec<String>,
}

impl<T: PlayerTransport> PlayerRegistry<T> {
    /// Create an empty registry.
    pub fn new(ignored_patterns: Vec<String>) -> Self {
        Self {
            players: HashMap::new(),
            current: None,
            ignored_patterns,
        }
    }

    /// Whether discovery should skip this bus name per configuration.
    pub fn is_ignored(&self, bus_name: &str) -> bool {
        self.ignored_patterns
            .iter()
            .any(|pattern| bus_name.contains(pattern))
    }

    /// Insert a freshly connected session and mark it current.
    ///
    /// A session for the same bus name, if any, is replaced; two sessions
    /// for one name never coexist.
    pub fn insert(&mut self, session: PlayerSession<T>) {
        let id = session.id().clone();
        self.players.insert(id.clone(), session);
        self.current = Some(id);
    }

    /// Remove a session, clearing `current` if it pointed there.
    pub fn remove(&mut self, id: &PlayerId) -> Option<PlayerSession<T>> {
        let removed = self.players.remove(id);

        if removed.is_some() && self.current.as_ref() == Some(id) {
            self.current = None;
        }

        removed
    }

    /// Look up a session by id.
    pub fn get(&self, id: &PlayerId) -> Option<&PlayerSession<T>> {
        self.players.get(id)
    }

    /// Look up a session by id for mutation.
    pub fn get_mut(&mut self, id: &PlayerId) -> Option<&mut PlayerSession<T>> {
        self.players.get_mut(id)
    }

    /// Resolve an instruction target: explicit id if given, else current.
    ///
    /// # Errors
    /// Returns `MediaError::PlayerNotFound` when neither resolves to a
    /// live session.
    pub fn resolve(&self, id: Option<&str>) -> Result<&PlayerSession<T>, MediaError> {
        let target = match id {
            Some(explicit) => PlayerId::from_bus_name(explicit),
            None => self
                .current
                .clone()
                .ok_or_else(|| MediaError::PlayerNotFound(PlayerId::from_bus_name("<default>")))?,
        };

        self.players
            .get(&target)
            .ok_or_else(|| MediaError::PlayerNotFound(target))
    }

    /// The most recently connected player, if it is still alive.
    pub fn current(&self) -> Option<&PlayerId> {
        self.current.as_ref()
    }

    /// Bus names of all live sessions.
    pub fn player_ids(&self) -> Vec<PlayerId> {
        self.players.keys().cloned().collect()
    }

    /// Whether any session is live.
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Tear the registry down, yielding every live session.
    pub fn drain(&mut self) -> Vec<PlayerSession<T>> {
        self.current = None;
        self.players.drain().map(|(_, session)| session).collect()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::services::mpris::session::test_support::{FakeTransport, fake_session};

    const VLC: &str = "org.mpris.MediaPlayer2.vlc";
    const SPOTIFY: &str = "org.mpris.MediaPlayer2.spotify";

    fn registry() -> PlayerRegistry<FakeTransport> {
        PlayerRegistry::new(Vec::new())
    }

    #[test]
    fn classify_filters_non_player_names() {
        assert_eq!(
            OwnershipChange::classify("org.freedesktop.Notifications", "", ":1.5"),
            OwnershipChange::Irrelevant
        );
    }

    #[test]
    fn classify_detects_appearance_and_loss() {
        assert_eq!(
            OwnershipChange::classify(VLC, "", ":1.5"),
            OwnershipChange::Appeared(PlayerId::from_bus_name(VLC))
        );
        assert_eq!(
            OwnershipChange::classify(VLC, ":1.5", ""),
            OwnershipChange::Vanished(PlayerId::from_bus_name(VLC))
        );
    }

    #[test]
    fn classify_ignores_owner_handoff() {
        assert_eq!(
            OwnershipChange::classify(VLC, ":1.5", ":1.9"),
            OwnershipChange::Irrelevant
        );
        assert_eq!(OwnershipChange::classify(VLC, "", ""), OwnershipChange::Irrelevant);
    }

    #[test]
    fn insert_marks_current() {
        let mut registry = registry();

        registry.insert(fake_session(VLC));
        assert_eq!(registry.current(), Some(&PlayerId::from_bus_name(VLC)));

        registry.insert(fake_session(SPOTIFY));
        assert_eq!(registry.current(), Some(&PlayerId::from_bus_name(SPOTIFY)));
    }

    #[test]
    fn removing_current_clears_it_without_fallback() {
        let mut registry = registry();
        registry.insert(fake_session(VLC));
        registry.insert(fake_session(SPOTIFY));

        registry.remove(&PlayerId::from_bus_name(SPOTIFY));

        assert_eq!(registry.current(), None);
        assert!(registry.resolve(None).is_err());
        assert!(registry.resolve(Some(VLC)).is_ok());
    }

    #[test]
    fn removing_non_current_keeps_current() {
        let mut registry = registry();
        registry.insert(fake_session(VLC));
        registry.insert(fake_session(SPOTIFY));

        registry.remove(&PlayerId::from_bus_name(VLC));

        assert_eq!(registry.current(), Some(&PlayerId::from_bus_name(SPOTIFY)));
    }

    #[test]
    fn resolve_prefers_explicit_id() {
        let mut registry = registry();
        registry.insert(fake_session(VLC));
        registry.insert(fake_session(SPOTIFY));

        let session = registry.resolve(Some(VLC)).unwrap();
        assert_eq!(session.id().bus_name(), VLC);

        let session = registry.resolve(None).unwrap();
        assert_eq!(session.id().bus_name(), SPOTIFY);
    }

    #[test]
    fn resolve_unknown_id_fails() {
        let registry = registry();

        let error = registry.resolve(Some(VLC)).unwrap_err();
        assert!(matches!(error, MediaError::PlayerNotFound(_)));
    }

    #[test]
    fn lifecycle_tracks_ownership_events() {
        // Key set must equal the set of successfully connected live names
        // through any sequence of gains and losses.
        let mut registry = registry();
        let events = [
            (VLC, "", ":1.2"),
            (SPOTIFY, "", ":1.3"),
            (VLC, ":1.2", ""),
            (VLC, "", ":1.4"),
            (SPOTIFY, ":1.3", ""),
        ];

        for (name, old_owner, new_owner) in events {
            match OwnershipChange::classify(name, old_owner, new_owner) {
                OwnershipChange::Appeared(id) => {
                    registry.insert(fake_session(id.bus_name()));
                }
                OwnershipChange::Vanished(id) => {
                    registry.remove(&id);
                }
                OwnershipChange::Irrelevant => {}
            }
        }

        let mut ids = registry
            .player_ids()
            .iter()
            .map(|id| id.bus_name().to_string())
            .collect::<Vec<_>>();
        ids.sort();
        assert_eq!(ids, vec![VLC.to_string()]);
        assert_eq!(registry.current(), Some(&PlayerId::from_bus_name(VLC)));
    }

    #[test]
    fn ignored_patterns_match_substrings() {
        let registry: PlayerRegistry<FakeTransport> =
            PlayerRegistry::new(vec!["playerctld".to_string()]);

        assert!(registry.is_ignored("org.mpris.MediaPlayer2.playerctld"));
        assert!(!registry.is_ignored(VLC));
    }

    #[test]
    fn drain_empties_registry() {
        let mut registry = registry();
        registry.insert(fake_session(VLC));
        registry.insert(fake_session(SPOTIFY));

        let drained = registry.drain();

        assert_eq!(drained.len(), 2);
        assert!(registry.is_empty());
        assert_eq!(registry.current(), None);
    }
}

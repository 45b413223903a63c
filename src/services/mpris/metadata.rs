use std::collections::HashMap;

use zbus::zvariant::OwnedValue;

use super::{
    art::ArtResolver,
    types::{AlbumArt, MediaSnapshot, UNKNOWN_ARTIST, UNKNOWN_TRACK},
};

/// Build a snapshot from an MPRIS metadata dict (`a{sv}`).
///
/// Absent or malformed entries fall back to their sentinel defaults; a
/// partially populated player never produces an error here.
pub fn snapshot_from_metadata(
    metadata: &HashMap<String, OwnedValue>,
    art: &ArtResolver,
) -> MediaSnapshot {
    let track_name = string_entry(metadata, "xesam:title")
        .filter(|title| !title.is_empty())
        .unwrap_or_else(|| UNKNOWN_TRACK.to_string());

    let artist = first_artist(metadata)
        .filter(|artist| !artist.is_empty())
        .unwrap_or_else(|| UNKNOWN_ARTIST.to_string());

    let url = string_entry(metadata, "xesam:url").unwrap_or_default();

    let album_art = match string_entry(metadata, "mpris:artUrl") {
        Some(art_url) => art.resolve(&art_url),
        None => AlbumArt::None,
    };

    MediaSnapshot {
        track_name,
        artist,
        url,
        album_art,
    }
}

fn string_entry(metadata: &HashMap<String, OwnedValue>, key: &str) -> Option<String> {
    let value = metadata.get(key)?;
    String::try_from(value.clone()).ok()
}

/// First entry of xesam:artist. Players ship it as a string list, but a
/// few report a bare string; both are accepted.
fn first_artist(metadata: &HashMap<String, OwnedValue>) -> Option<String> {
    let value = metadata.get("xesam:artist")?;

    if let Ok(array) = <&zbus::zvariant::Array>::try_from(value) {
        return array.iter().next().and_then(|entry| {
            if let Ok(s) = entry.downcast_ref::<String>() {
                Some(s.clone())
            } else if let Ok(s) = entry.downcast_ref::<&str>() {
                Some(s.to_string())
            } else {
                None
            }
        });
    }

    String::try_from(value.clone()).ok()
}

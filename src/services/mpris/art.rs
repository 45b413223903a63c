use std::path::Path;

use tracing::debug;

use super::types::AlbumArt;

/// Resolves mpris:artUrl references into [`AlbumArt`] values.
///
/// Resolution is eager: local files are read into bytes at update time so
/// the platform never has to reach back into this host's filesystem.
/// Remote URLs are forwarded as references.
#[derive(Debug, Clone)]
pub struct ArtResolver {
    resolve_local: bool,
}

impl ArtResolver {
    /// Create a resolver. `resolve_local` controls whether `file://`
    /// references are inlined.
    pub fn new(resolve_local: bool) -> Self {
        Self { resolve_local }
    }

    /// Resolve an art reference as reported by the player.
    pub fn resolve(&self, art_url: &str) -> AlbumArt {
        if art_url.is_empty() {
            return AlbumArt::None;
        }

        if let Some(path) = art_url.strip_prefix("file://") {
            if !self.resolve_local {
                return AlbumArt::Url { url: art_url.to_string() };
            }

            return match std::fs::read(path) {
                Ok(data) => AlbumArt::Bytes {
                    data,
                    mime: mime_for_path(path).to_string(),
                },
                Err(e) => {
                    debug!("Could not read album art {art_url}: {e}");
                    AlbumArt::Url { url: art_url.to_string() }
                }
            };
        }

        AlbumArt::Url { url: art_url.to_string() }
    }
}

fn mime_for_path(path: &str) -> &'static str {
    let extension = Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        _ => "application/octet-stream",
    }
}

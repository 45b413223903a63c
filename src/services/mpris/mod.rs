/// Album-art resolution
pub mod art;
/// The single event loop driving discovery, mirroring and control
pub mod engine;
/// Media player error types
pub mod error;
/// Metadata payload parsing
pub mod metadata;
/// D-Bus proxy trait definitions
pub mod proxy;
/// Player lifecycle state machine
pub mod registry;
/// Per-player state mirror and transport
pub mod session;
/// Player types and capabilities
pub mod types;

pub use engine::MediaEngine;
pub use error::MediaError;
pub use registry::{OwnershipChange, PlayerRegistry};
pub use session::{PlayerSession, PlayerTransport, SessionDiff};
pub use types::{
    AlbumArt, MediaSnapshot, PlaybackStatus, PlayerCapabilities, PlayerId,
};

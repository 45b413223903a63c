//! desklink - Desktop media bridge for device-management platforms.
//!
//! desklink mirrors the state of every MPRIS media player on the D-Bus
//! session bus and relays it to a remote device-management platform,
//! translating the platform's playback instructions back into bus calls
//! against the right player. The main pieces:
//!
//! - Player discovery driven by bus name ownership changes
//! - Live per-player state mirrors fed by property-change notifications
//! - Deduplicated outbound reporting (full-state media and capability events)
//! - Instruction routing with per-instruction acknowledgment
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use desklink::{config::Config, platform::PlatformEvent, services::mpris::MediaEngine};
//! use tokio::sync::mpsc;
//!
//! # async fn start() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load(None)?;
//! let (events_tx, mut events_rx) = mpsc::unbounded_channel::<PlatformEvent>();
//!
//! let engine = MediaEngine::spawn(config.media, events_tx).await?;
//!
//! while let Some(event) = events_rx.recv().await {
//!     println!("{}", serde_json::to_string(&event)?);
//! }
//! # Ok(())
//! # }
//! ```

/// Configuration schema and file loading.
pub mod config;

/// Core error types and result aliases.
pub mod core;

/// Platform boundary: outbound events, inbound instructions.
pub mod platform;

/// Bus-facing services.
pub mod services;

/// Tracing initialization helpers.
pub mod tracing_config;

/// Re-exported core types for convenience.
pub use crate::core::{DesklinkError, Result};

use tokio::sync::oneshot;
use tracing::debug;

use super::types::{Instruction, InstructionAck, PlaylistOp};
use crate::services::mpris::{
    error::MediaError,
    registry::PlayerRegistry,
    session::PlayerTransport,
    types::PlaybackStatus,
};

/// Routes inbound instructions to the right session and acknowledges
/// every one exactly once.
///
/// Resolution and transport failures become failure acknowledgments;
/// nothing escapes to crash the caller.
pub struct InstructionDispatcher;

impl InstructionDispatcher {
    /// Route one instruction and send its acknowledgment.
    pub async fn dispatch<T: PlayerTransport>(
        registry: &PlayerRegistry<T>,
        instruction: Instruction,
        reply: oneshot::Sender<InstructionAck>,
    ) {
        let result = Self::route(registry, instruction).await;

        if let Err(ref error) = result {
            debug!("Instruction failed: {error}");
        }

        let _ = reply.send(InstructionAck::from_result(&result));
    }

    async fn route<T: PlayerTransport>(
        registry: &PlayerRegistry<T>,
        instruction: Instruction,
    ) -> Result<(), MediaError> {
        match instruction {
            Instruction::Playlist { player_id, op } => {
                let session = registry.resolve(Some(&player_id))?;
                match op {
                    PlaylistOp::NextTrack => session.next().await,
                    PlaylistOp::PreviousTrack => session.previous().await,
                }
            }

            Instruction::Media {
                player_id,
                target_status,
            } => {
                let session = registry.resolve(Some(&player_id))?;
                match target_status {
                    PlaybackStatus::Paused => session.pause().await,
                    PlaybackStatus::Playing => session.play().await,
                    // Other targets are a no-op, not an error.
                    PlaybackStatus::Stopped | PlaybackStatus::Unknown => Ok(()),
                }
            }

            // Volume carries no player id; it lands on the current player.
            Instruction::Volume { level } => {
                let session = registry.resolve(None)?;
                session.set_volume(level).await
            }
        }
    }
}

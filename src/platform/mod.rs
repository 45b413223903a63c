/// Inbound instruction routing
pub mod dispatcher;
/// Outbound change reporting with deduplication
pub mod reporter;
/// Boundary message shapes
pub mod types;

pub use dispatcher::InstructionDispatcher;
pub use reporter::StateReporter;
pub use types::{
    CapabilityUpdate, Instruction, InstructionAck, MediaUpdate, PlatformEvent, PlaylistOp,
};

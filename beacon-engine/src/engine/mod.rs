mod engine;
mod engine_command;
mod engine_event;
mod engine_handle;
mod engine_snapshot;
mod media_context;
mod membership;

pub use engine::*;
pub use engine_command::*;
pub use engine_event::*;
pub use engine_handle::*;
pub use engine_snapshot::*;
pub use media_context::*;
pub use membership::*;

mod candidate_buffer;
mod pending_queue;
mod registry;
mod remote_media;
mod retry;
mod sdp_fallback;
mod session;
mod state;

pub use candidate_buffer::*;
pub use pending_queue::*;
pub use registry::*;
pub use remote_media::*;
pub use retry::*;
pub use sdp_fallback::normalize_description;
pub use session::*;
pub use state::*;

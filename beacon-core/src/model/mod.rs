mod description;
mod peer;
mod room;
mod signaling;

pub use description::{IceCandidate, SdpKind, SessionDescription};
pub use peer::PeerId;
pub use room::RoomId;
pub use signaling::{ClientSignal, IceServerConfig, ServerSignal};

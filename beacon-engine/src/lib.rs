pub mod capture;
pub mod config;
pub mod engine;
pub mod error;
pub mod negotiation;
pub mod signaling;
pub mod transport;

pub use capture::*;
pub use config::*;
pub use engine::*;
pub use error::*;
pub use negotiation::*;
pub use signaling::*;
pub use transport::*;

use beacon_core::IceServerConfig;
use beacon_core::utils::{
    DEFAULT_STUN_ADDR, DEFAULT_STUN_ADDR_2, DEFAULT_STUN_ADDR_3, DEFAULT_STUN_ADDR_4,
};

/// Relay/STUN configuration handed to every peer connection.
///
/// Fixed for the lifetime of the engine; credentials are not refreshed.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub ice_servers: Vec<IceServerConfig>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            ice_servers: vec![IceServerConfig {
                urls: vec![
                    DEFAULT_STUN_ADDR.to_owned(),
                    DEFAULT_STUN_ADDR_2.to_owned(),
                    DEFAULT_STUN_ADDR_3.to_owned(),
                    DEFAULT_STUN_ADDR_4.to_owned(),
                ],
                username: None,
                credential: None,
            }],
        }
    }
}

impl TransportConfig {
    /// No ICE servers at all; host candidates only. Used for loopback tests.
    pub fn local_only() -> Self {
        Self {
            ice_servers: Vec::new(),
        }
    }
}

use crate::capture::CaptureConstraints;
use crate::negotiation::RetryPolicy;
use crate::transport::TransportConfig;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub transport: TransportConfig,
    pub retry: RetryPolicy,
    pub capture: CaptureConstraints,
    /// Capacity of the command and transport-event channels.
    pub channel_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            transport: TransportConfig::default(),
            retry: RetryPolicy::default(),
            capture: CaptureConstraints::default(),
            channel_capacity: 256,
        }
    }
}

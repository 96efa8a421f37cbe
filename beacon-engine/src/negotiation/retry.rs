use crate::error::NegotiationError;
use crate::negotiation::normalize_description;
use crate::transport::PeerTransport;
use async_trait::async_trait;
use beacon_core::SessionDescription;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Bounded retry as data: how many attempts, and how long between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    RetryAfter { next_attempt: u32, delay: Duration },
    Exhausted,
}

impl RetryPolicy {
    /// Keep trying forever with a fixed delay.
    pub fn unbounded(delay: Duration) -> Self {
        Self {
            max_attempts: u32::MAX,
            delay,
        }
    }

    /// Decide what follows a failed attempt number `attempt` (1-based).
    pub fn after_failure(&self, attempt: u32) -> RetryDecision {
        if attempt >= self.max_attempts {
            return RetryDecision::Exhausted;
        }
        RetryDecision::RetryAfter {
            next_attempt: attempt + 1,
            delay: self.delay,
        }
    }
}

/// Time source for retry back-off.
#[async_trait]
pub trait Delay: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

pub struct TokioDelay;

#[async_trait]
impl Delay for TokioDelay {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Run `op` until it succeeds or `policy` is exhausted.
///
/// `op` receives the 1-based attempt number. The last error is returned.
pub async fn with_retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    delay: &dyn Delay,
    mut op: F,
) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let mut attempt = 1;
    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) => match policy.after_failure(attempt) {
                RetryDecision::RetryAfter {
                    next_attempt,
                    delay: wait,
                } => {
                    warn!("Attempt {} failed: {}. Retrying in {:?}", attempt, e, wait);
                    delay.sleep(wait).await;
                    attempt = next_attempt;
                }
                RetryDecision::Exhausted => return Err(e),
            },
        }
    }
}

/// Commit a local description, falling back once to a narrowed payload.
///
/// Returns the description that was actually committed, which is the one that
/// must be sent to the peer.
pub async fn commit_local_description(
    transport: &dyn PeerTransport,
    desc: SessionDescription,
) -> Result<SessionDescription, NegotiationError> {
    let first_error = if desc.is_empty() {
        NegotiationError::EmptyDescription
    } else {
        match transport.set_local_description(desc.clone()).await {
            Ok(()) => return Ok(desc),
            Err(e) => NegotiationError::Transport(e),
        }
    };

    let Some(narrowed) = normalize_description(&desc.sdp) else {
        return Err(first_error);
    };
    if narrowed == desc.sdp {
        return Err(first_error);
    }

    debug!("Local description rejected ({}), retrying narrowed", first_error);
    let fallback = SessionDescription {
        kind: desc.kind,
        sdp: narrowed,
    };
    transport.set_local_description(fallback.clone()).await?;
    Ok(fallback)
}

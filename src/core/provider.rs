use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::process::ProcessError;

/// Identity of a provider's output slot in the render context and the cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderKey(String);

impl ProviderKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProviderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProviderKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ProviderKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Output of a provider, stored type-erased and recovered with a checked downcast.
///
/// Implemented for every serializable `'static` type, so providers just return
/// their own structs wrapped in [`payload`].
pub trait ProviderData: Any + Send + Sync + fmt::Debug {
    fn to_json(&self) -> Result<serde_json::Value, serde_json::Error>;
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T> ProviderData for T
where
    T: Serialize + Any + Send + Sync + fmt::Debug,
{
    fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

pub type Payload = Arc<dyn ProviderData>;

pub fn payload<T: ProviderData>(value: T) -> Payload {
    Arc::new(value)
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Process(#[from] ProcessError),

    #[error("failed to parse provider output: {0}")]
    Parse(String),

    #[error("http request failed: {0}")]
    Http(String),

    #[error("credentials unavailable: {0}")]
    Credentials(String),

    #[error("provider timed out after {0:?}")]
    Timeout(Duration),

    #[error("cancelled before completion")]
    Cancelled,

    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for ProviderError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value.to_string())
    }
}

/// Cancellation and deadline handle passed to [`Provider::provide`].
///
/// Clones share the cancel flag; cancelling one cancels all.
#[derive(Debug, Clone, Default)]
pub struct ProvideContext {
    deadline: Option<Instant>,
    cancelled: Arc<AtomicBool>,
}

impl ProvideContext {
    /// No deadline, never cancelled unless [`cancel`](Self::cancel) is called.
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// A context sharing this one's cancel flag with a deadline no later than `timeout` from now.
    pub fn child_with_timeout(&self, timeout: Duration) -> Self {
        let candidate = Instant::now() + timeout;
        let deadline = match self.deadline {
            Some(current) => current.min(candidate),
            None => candidate,
        };
        Self {
            deadline: Some(deadline),
            cancelled: Arc::clone(&self.cancelled),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline; `None` when there is no deadline.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Shorten a provider's own timeout so it never outlives the context.
    pub fn clamp(&self, timeout: Duration) -> Duration {
        match self.remaining() {
            Some(left) => timeout.min(left),
            None => timeout,
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// True once cancelled or past the deadline.
    pub fn is_done(&self) -> bool {
        self.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    pub fn check(&self) -> Result<(), ProviderError> {
        if self.is_done() {
            Err(ProviderError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// A data source fetched once per render.
pub trait Provider: Send + Sync {
    fn key(&self) -> ProviderKey;

    fn provide(&self, ctx: &ProvideContext) -> Result<Payload, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Serialize, PartialEq)]
    struct Sample {
        value: u32,
    }

    #[test]
    fn payload_downcasts_to_original_type() {
        let p = payload(Sample { value: 7 });
        let sample = p.into_any().downcast::<Sample>().unwrap();
        assert_eq!(sample.value, 7);
    }

    #[test]
    fn payload_serializes_to_json() {
        let p = payload(Sample { value: 3 });
        assert_eq!(p.to_json().unwrap(), serde_json::json!({ "value": 3 }));
    }

    #[test]
    fn context_deadline_and_cancel() {
        let ctx = ProvideContext::with_timeout(Duration::from_secs(60));
        assert!(!ctx.is_done());
        assert!(ctx.clamp(Duration::from_secs(600)) <= Duration::from_secs(60));
        assert_eq!(ctx.clamp(Duration::from_millis(500)), Duration::from_millis(500));

        let clone = ctx.clone();
        clone.cancel();
        assert!(ctx.is_cancelled());
        assert!(matches!(ctx.check(), Err(ProviderError::Cancelled)));
    }

    #[test]
    fn expired_deadline_is_done() {
        let ctx = ProvideContext::with_deadline(Instant::now());
        assert!(ctx.is_done());
        assert_eq!(ctx.remaining(), Some(Duration::ZERO));
    }

    #[test]
    fn background_has_no_deadline() {
        let ctx = ProvideContext::background();
        assert_eq!(ctx.remaining(), None);
        assert!(!ctx.is_done());
    }
}

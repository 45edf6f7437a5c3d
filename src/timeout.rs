use std::future::Future;
use std::time::{Duration, Instant};

use crate::errors::KickError;

const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// Deadline applied to single round-trip operations against the cluster.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(DEFAULT_TIMEOUT_SECS);
/// Deadline applied to operations that perform multiple round trips
/// (batch resolution, batch patch).
pub const LONGER_TIMEOUT: Duration = Duration::from_secs(3 * DEFAULT_TIMEOUT_SECS);

/// Execution context threaded through every cluster operation. Carries an
/// optional deadline; an operation that starts with a deadline already in
/// place keeps it, so an outer batch deadline governs all of its inner calls.
#[derive(Clone, Copy, Debug, Default)]
pub struct OpContext {
    deadline: Option<Instant>,
}

impl OpContext {
    pub fn new() -> Self {
        Self { deadline: None }
    }

    pub fn with_deadline_in(timeout: Duration) -> Self {
        Self {
            deadline: Some(Instant::now() + timeout),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns a context guaranteed to carry a deadline. The boolean is true
    /// when the deadline was installed here rather than inherited.
    pub fn ensure_deadline(self, timeout: Duration) -> (Self, bool) {
        match self.deadline {
            Some(_) => (self, false),
            None => (Self::with_deadline_in(timeout), true),
        }
    }

    /// Drives a cluster call under the remaining deadline budget, if any.
    pub async fn run<T, F>(&self, op: &'static str, fut: F) -> Result<T, KickError>
    where
        F: Future<Output = Result<T, kube::Error>>,
    {
        match self.deadline {
            Some(deadline) => {
                let budget = deadline.saturating_duration_since(Instant::now());
                match tokio::time::timeout(budget, fut).await {
                    Ok(res) => res.map_err(KickError::from),
                    Err(_) => Err(KickError::Timeout { op }),
                }
            }
            None => fut.await.map_err(KickError::from),
        }
    }
}

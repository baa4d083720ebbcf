use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A cancellation token that can be shared between a caller and a running computation.
///
/// Workers poll it between outer-loop iterations and stop with
/// [`SesError::Cancelled`](crate::SesError::Cancelled).
#[derive(Clone, Debug)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Fail with `Cancelled` once the optional token has been triggered.
pub(crate) fn check(token: Option<&CancellationToken>) -> Result<(), crate::SesError> {
    match token {
        Some(t) if t.is_cancelled() => Err(crate::SesError::Cancelled),
        _ => Ok(()),
    }
}

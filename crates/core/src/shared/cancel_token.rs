use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::blurring::domain::blur_error::BlurError;

/// Cooperative cancellation flag shared between a scheduler and the
/// computation it started.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Returns `Err(BlurError::Cancelled)` once the token has been cancelled.
    pub fn check(&self) -> Result<(), BlurError> {
        if self.is_cancelled() {
            Err(BlurError::Cancelled)
        } else {
            Ok(())
        }
    }
}

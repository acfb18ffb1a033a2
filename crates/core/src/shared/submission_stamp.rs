use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_STAMP: AtomicU64 = AtomicU64::new(1);

/// Monotonic submission time of a blur request.
///
/// Stamps are strictly increasing across the process, so two requests never
/// share one and later submissions always compare greater.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubmissionStamp(u64);

impl SubmissionStamp {
    pub fn next() -> Self {
        Self(NEXT_STAMP.fetch_add(1, Ordering::SeqCst))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

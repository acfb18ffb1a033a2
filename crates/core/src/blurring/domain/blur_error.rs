use thiserror::Error;

/// Reasons a blur computation produced no result.
///
/// None of these are fatal: callers treat every variant as "skip this frame".
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BlurError {
    #[error("source image is absent or has no pixels")]
    NullSource,
    #[error("failed to allocate a {bytes}-byte pixel buffer")]
    Allocation { bytes: usize },
    #[error("blur computation was cancelled")]
    Cancelled,
}

/// A configuration value outside its valid range. The previous value is kept.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsError {
    #[error("blur radius must be >= 0, got {0}")]
    InvalidRadius(i32),
    #[error("down sampling must be >= 1, got {0}")]
    InvalidDownSampling(i32),
}

pub mod blur_error;
pub mod blur_result;
pub mod blur_settings;
pub mod snapshot_provider;

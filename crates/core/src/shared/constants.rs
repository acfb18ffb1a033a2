use std::time::Duration;

/// Default blur kernel radius.
pub const DEFAULT_RADIUS: u32 = 10;

/// Default pre-blur shrink factor.
pub const DEFAULT_DOWN_SAMPLING: u32 = 8;

/// How long an idle pool worker waits for a job before retiring.
pub const WORKER_KEEP_ALIVE: Duration = Duration::from_secs(60);

pub const CONFIG_DIR_NAME: &str = "live-blur";
pub const CONFIG_FILE_NAME: &str = "settings.json";

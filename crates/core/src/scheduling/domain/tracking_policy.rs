use serde::{Deserialize, Serialize};

/// How an invoker keeps track of its in-flight asynchronous tasks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackingPolicy {
    /// Every submitted task is tracked; `cancel_async` cancels them all.
    Multi,
    /// Only the newest task is tracked; submitting cancels the previous one.
    #[default]
    Single,
}

impl std::fmt::Display for TrackingPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackingPolicy::Multi => write!(f, "multi"),
            TrackingPolicy::Single => write!(f, "single"),
        }
    }
}

impl std::str::FromStr for TrackingPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "multi" => Ok(TrackingPolicy::Multi),
            "single" => Ok(TrackingPolicy::Single),
            other => Err(format!("unknown tracking policy: {other} (expected multi or single)")),
        }
    }
}

use crate::blurring::domain::blur_settings::BlurSettings;
use crate::scheduling::domain::blur_target::BlurTarget;
use crate::shared::submission_stamp::SubmissionStamp;

/// Identity of a task inside an invoker's registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(u64);

impl From<SubmissionStamp> for TaskId {
    fn from(stamp: SubmissionStamp) -> Self {
        TaskId(stamp.get())
    }
}

/// One blur request: a settings snapshot, where the result goes, and when it
/// was submitted.
#[derive(Debug)]
pub struct BlurTask {
    settings: BlurSettings,
    target: BlurTarget,
    run_async: bool,
    stamp: SubmissionStamp,
}

impl BlurTask {
    /// Creates a task stamped with the current submission time.
    pub fn new(settings: BlurSettings, target: BlurTarget, run_async: bool) -> Self {
        Self {
            settings,
            target,
            run_async,
            stamp: SubmissionStamp::next(),
        }
    }

    pub fn id(&self) -> TaskId {
        TaskId::from(self.stamp)
    }

    pub fn settings(&self) -> &BlurSettings {
        &self.settings
    }

    pub fn is_async(&self) -> bool {
        self.run_async
    }

    pub fn stamp(&self) -> SubmissionStamp {
        self.stamp
    }

    pub fn into_parts(self) -> (BlurSettings, BlurTarget, SubmissionStamp) {
        (self.settings, self.target, self.stamp)
    }
}

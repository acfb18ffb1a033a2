use thiserror::Error;

pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// The executor could not accept a job. The job has been dropped unrun.
#[derive(Error, Debug)]
#[error("executor rejected job: {reason}")]
pub struct ExecuteError {
    pub reason: String,
}

impl ExecuteError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Runs blur jobs off the caller's thread.
///
/// This is a port: the embedding application owns the concrete executor and
/// its lifetime, and injects it into every invoker. A job is either accepted,
/// and will eventually run, or rejected with an error.
pub trait TaskExecutor: Send + Sync {
    fn execute(&self, job: Job) -> Result<(), ExecuteError>;
}

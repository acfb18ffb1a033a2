pub mod blur_target;
pub mod blur_task;
pub mod task_executor;
pub mod tracking_policy;

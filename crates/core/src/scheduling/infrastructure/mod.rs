pub mod blur_invoker;
pub mod main_thread_target;
pub mod task_registry;
pub mod ui_context;
pub mod worker_pool;

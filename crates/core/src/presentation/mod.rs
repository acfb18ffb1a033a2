pub mod guarded_surface;
pub mod live_blur_view;
pub mod render_host;
pub mod stale_result_guard;

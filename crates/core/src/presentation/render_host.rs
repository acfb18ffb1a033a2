use crate::blurring::domain::blur_result::BlurResult;

/// Rendering layer that draws accepted blur results.
///
/// Both calls arrive on the UI context and never while the guard's lock is
/// held, so implementations may call back into the view.
pub trait RenderHost: Send + Sync {
    /// Schedule a render pass.
    fn request_redraw(&self);

    /// A newly accepted buffer is about to be drawn. `down_sampling` is the
    /// factor it was computed with, for rescaling when compositing.
    fn on_accepted(&self, buffer: &BlurResult, down_sampling: u32);
}

use std::sync::Arc;

use super::guarded_surface::GuardedSurface;
use super::render_host::RenderHost;
use super::stale_result_guard::{AcceptedFrame, GuardPhase, GuardStats};
use crate::blurring::domain::blur_error::SettingsError;
use crate::blurring::domain::blur_settings::{Argb, BlurSettings};
use crate::blurring::domain::snapshot_provider::SnapshotProvider;
use crate::scheduling::domain::blur_target::{BlurSurface, BlurTarget};
use crate::scheduling::domain::task_executor::TaskExecutor;
use crate::scheduling::domain::tracking_policy::TrackingPolicy;
use crate::scheduling::infrastructure::blur_invoker::{BlurInvoker, BlurSource};
use crate::scheduling::infrastructure::ui_context::UiContext;
use crate::shared::submission_stamp::SubmissionStamp;

/// A display element that shows a continuously refreshed blur of a live
/// visual source.
///
/// Every [`invalidate`](Self::invalidate) captures the source and submits a
/// blur; results reach the rendering layer through a [`GuardedSurface`], so
/// only ever-newer results are drawn. By default buffers stay at the
/// downsampled size and are scaled while drawing.
///
/// All methods belong on the UI context.
pub struct LiveBlurView {
    invoker: BlurInvoker,
    surface: Arc<GuardedSurface>,
    background: bool,
}

impl LiveBlurView {
    pub fn new<P: SnapshotProvider + 'static>(
        provider: &Arc<P>,
        executor: Arc<dyn TaskExecutor>,
        ui: UiContext,
        policy: TrackingPolicy,
        host: Arc<dyn RenderHost>,
    ) -> Self {
        let mut invoker = BlurInvoker::new(BlurSource::live(provider), executor, ui, policy);
        invoker.keep_down_sampling_size(true);
        invoker.engine_mut().set_destroy_after_blur(false);
        Self {
            invoker,
            surface: Arc::new(GuardedSurface::new(host)),
            background: false,
        }
    }

    /// Applies every field of `settings`, including the size policy.
    pub fn apply_settings(&mut self, settings: &BlurSettings) -> Result<(), SettingsError> {
        self.set_radius(i32::try_from(settings.radius()).unwrap_or(i32::MAX))?;
        self.set_down_sampling(i32::try_from(settings.down_sampling()).unwrap_or(i32::MAX))?;
        self.set_overlay_color(settings.overlay_color());
        self.set_keep_down_sampling_size(settings.keep_down_sampling_size());
        Ok(())
    }

    /// With `false` the engine scales results back to the source size before
    /// delivery.
    pub fn set_keep_down_sampling_size(&mut self, keep: bool) {
        self.invoker.engine_mut().set_keep_down_sampling_size(keep);
    }

    pub fn set_radius(&mut self, radius: i32) -> Result<(), SettingsError> {
        self.invoker.engine_mut().set_radius(radius)
    }

    pub fn set_down_sampling(&mut self, down_sampling: i32) -> Result<(), SettingsError> {
        self.invoker.engine_mut().set_down_sampling(down_sampling)
    }

    pub fn set_overlay_color(&mut self, color: Argb) {
        self.invoker.engine_mut().set_overlay_color(color);
    }

    pub fn set_async(&mut self, run_async: bool) {
        self.invoker.run_async(run_async);
    }

    /// Release engine buffers after every synchronous blur. Off by default
    /// for a live view, which re-blurs on every invalidation.
    pub fn set_destroy_after_blur(&mut self, destroy: bool) {
        self.invoker.engine_mut().set_destroy_after_blur(destroy);
    }

    /// Bind results as a background layer instead of the element's content.
    pub fn set_background(&mut self, background: bool) {
        self.background = background;
    }

    pub fn settings(&self) -> BlurSettings {
        self.invoker.engine().settings()
    }

    pub fn down_sampling(&self) -> u32 {
        self.invoker.engine().down_sampling()
    }

    pub fn attach(&self) {
        self.surface.attach();
    }

    /// Detaches from the visible context and releases engine buffers.
    /// Results still in flight are discarded on arrival; with
    /// `cancel_in_flight` they are also cancelled.
    pub fn detach(&mut self, cancel_in_flight: bool) {
        self.surface.detach();
        self.invoker.destroy();
        if cancel_in_flight {
            self.invoker.cancel_async();
        }
    }

    /// Re-blurs after a visual change. Returns the stamp of the submitted
    /// request, or `None` when detached.
    pub fn invalidate(&mut self) -> Option<SubmissionStamp> {
        if !self.surface.request() {
            return None;
        }
        let surface: Arc<dyn BlurSurface> = self.surface.clone();
        let target = if self.background {
            BlurTarget::Background(surface)
        } else {
            BlurTarget::Display(surface)
        };
        let task = self.invoker.task(target);
        let stamp = task.stamp();
        self.invoker.invoke(task);
        Some(stamp)
    }

    /// See [`GuardedSurface::render`].
    pub fn render<F>(&self, draw: F) -> bool
    where
        F: FnOnce(&AcceptedFrame),
    {
        self.surface.render(draw)
    }

    pub fn cancel_async(&self) -> usize {
        self.invoker.cancel_async()
    }

    pub fn in_flight(&self) -> usize {
        self.invoker.in_flight()
    }

    pub fn phase(&self) -> GuardPhase {
        self.surface.phase()
    }

    pub fn stats(&self) -> GuardStats {
        self.surface.stats()
    }
}

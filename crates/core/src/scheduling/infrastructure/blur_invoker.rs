use std::borrow::Cow;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use super::main_thread_target::MainThreadTarget;
use super::task_registry::TaskRegistry;
use super::ui_context::UiContext;
use crate::blurring::domain::blur_error::BlurError;
use crate::blurring::domain::blur_result::BlurResult;
use crate::blurring::domain::blur_settings::{Argb, BlurSettings};
use crate::blurring::domain::snapshot_provider::SnapshotProvider;
use crate::blurring::infrastructure::blur_engine::{compute_blur, BlurEngine, BlurScratch};
use crate::scheduling::domain::blur_target::{BlurDelivery, BlurSurface, BlurTarget};
use crate::scheduling::domain::blur_task::{BlurTask, TaskId};
use crate::scheduling::domain::task_executor::TaskExecutor;
use crate::scheduling::domain::tracking_policy::TrackingPolicy;
use crate::shared::cancel_token::CancelToken;
use crate::shared::source_image::SourceImage;
use crate::shared::submission_stamp::SubmissionStamp;

/// What an invoker blurs.
#[derive(Clone)]
pub enum BlurSource {
    /// A standalone image. It is shared read-only and never modified.
    Image(Arc<SourceImage>),
    /// A live element, captured fresh for every request. Held weakly: once
    /// the provider is dropped, requests become no-ops.
    Live(Weak<dyn SnapshotProvider>),
}

impl BlurSource {
    pub fn image(image: SourceImage) -> Self {
        BlurSource::Image(Arc::new(image))
    }

    pub fn live<P: SnapshotProvider + 'static>(provider: &Arc<P>) -> Self {
        let weak: Weak<P> = Arc::downgrade(provider);
        BlurSource::Live(weak)
    }

    fn capture(&self) -> Option<Captured> {
        match self {
            BlurSource::Image(image) => Some(Captured::Shared(Arc::clone(image))),
            BlurSource::Live(provider) => provider
                .upgrade()
                .and_then(|p| p.capture())
                .map(Captured::Snapshot),
        }
    }
}

impl std::fmt::Debug for BlurSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BlurSource::Image(image) => write!(f, "Image({}x{})", image.width(), image.height()),
            BlurSource::Live(provider) => write!(f, "Live(alive={})", provider.strong_count() > 0),
        }
    }
}

/// Pixels taken for one request.
enum Captured {
    Shared(Arc<SourceImage>),
    Snapshot(SourceImage),
}

impl Captured {
    fn blur(
        self,
        settings: &BlurSettings,
        scratch: &mut BlurScratch,
        cancel: &CancelToken,
    ) -> Result<BlurResult, BlurError> {
        match self {
            Captured::Shared(image) => compute_blur(Cow::Borrowed(&*image), settings, scratch, cancel),
            Captured::Snapshot(image) => compute_blur(Cow::Owned(image), settings, scratch, cancel),
        }
    }
}

/// Schedules blur computations for one source and routes results to targets.
///
/// Synchronous requests run inline on the caller. Asynchronous ones go to the
/// injected executor and are tracked in a mutex-guarded [`TaskRegistry`]
/// according to the [`TrackingPolicy`]. Every delivery passes through a
/// [`MainThreadTarget`], and a task cancelled at any point before its target
/// is invoked is never delivered.
///
/// Dropping the invoker cancels everything it still tracks.
pub struct BlurInvoker {
    source: BlurSource,
    engine: BlurEngine,
    run_async: bool,
    executor: Arc<dyn TaskExecutor>,
    ui: UiContext,
    registry: Arc<Mutex<TaskRegistry>>,
}

impl BlurInvoker {
    pub fn new(
        source: BlurSource,
        executor: Arc<dyn TaskExecutor>,
        ui: UiContext,
        policy: TrackingPolicy,
    ) -> Self {
        Self {
            source,
            engine: BlurEngine::default(),
            run_async: false,
            executor,
            ui,
            registry: Arc::new(Mutex::new(TaskRegistry::new(policy))),
        }
    }

    pub fn set_source(&mut self, source: BlurSource) {
        self.source = source;
    }

    pub fn engine(&self) -> &BlurEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut BlurEngine {
        &mut self.engine
    }

    pub fn is_async(&self) -> bool {
        self.run_async
    }

    pub fn policy(&self) -> TrackingPolicy {
        lock_registry(&self.registry).policy()
    }

    // Fluent configuration. Out-of-range values are logged and ignored.

    pub fn radius(&mut self, radius: i32) -> &mut Self {
        let _ = self.engine.set_radius(radius);
        self
    }

    pub fn down_sampling(&mut self, down_sampling: i32) -> &mut Self {
        let _ = self.engine.set_down_sampling(down_sampling);
        self
    }

    pub fn overlay_color(&mut self, color: Argb) -> &mut Self {
        self.engine.set_overlay_color(color);
        self
    }

    pub fn keep_down_sampling_size(&mut self, keep: bool) -> &mut Self {
        self.engine.set_keep_down_sampling_size(keep);
        self
    }

    pub fn run_async(&mut self, run_async: bool) -> &mut Self {
        self.run_async = run_async;
        self
    }

    /// Snapshots the current settings into a new task for `target`.
    pub fn task(&self, target: BlurTarget) -> BlurTask {
        BlurTask::new(self.engine.settings(), target, self.run_async)
    }

    pub fn blur_into(&mut self, target: BlurTarget) -> &mut Self {
        let task = self.task(target);
        self.invoke(task);
        self
    }

    pub fn into_display(&mut self, surface: Arc<dyn BlurSurface>) -> &mut Self {
        self.blur_into(BlurTarget::Display(surface))
    }

    pub fn into_background(&mut self, surface: Arc<dyn BlurSurface>) -> &mut Self {
        self.blur_into(BlurTarget::Background(surface))
    }

    pub fn into_custom<F>(&mut self, deliver: F) -> &mut Self
    where
        F: FnOnce(BlurDelivery) + Send + 'static,
    {
        self.blur_into(BlurTarget::custom(deliver))
    }

    /// Executes `task`, inline or on the executor depending on its async
    /// flag. Never blocks in async mode. A source that cannot be captured
    /// makes the request a no-op.
    pub fn invoke(&mut self, task: BlurTask) {
        let Some(captured) = self.source.capture() else {
            log::debug!("Blur source unavailable, skipping request");
            return;
        };
        let id = task.id();
        let run_async = task.is_async();
        let (settings, target, stamp) = task.into_parts();
        let target = MainThreadTarget::new(target, self.ui.clone());

        if run_async {
            self.submit_async(id, captured, settings, target, stamp);
            return;
        }

        let cancel = CancelToken::new();
        let result = match captured {
            Captured::Shared(image) => self.engine.run(Cow::Borrowed(&*image), &settings, &cancel),
            Captured::Snapshot(image) => self.engine.run(Cow::Owned(image), &settings, &cancel),
        };
        if let Some(result) = result {
            target.deliver(BlurDelivery { stamp, result });
        }
    }

    fn submit_async(
        &self,
        id: TaskId,
        captured: Captured,
        settings: BlurSettings,
        target: MainThreadTarget,
        stamp: SubmissionStamp,
    ) {
        let token = CancelToken::new();
        let replaced = lock_registry(&self.registry).register(id, token.clone());
        if replaced > 0 {
            log::debug!("Task {id:?} replaced {replaced} in-flight task(s)");
        }

        let job = AsyncJob {
            id,
            token,
            captured,
            settings,
            target,
            stamp,
            registry: Arc::clone(&self.registry),
        };
        if let Err(e) = self.executor.execute(Box::new(move || job.run())) {
            log::warn!("Task {id:?} not scheduled: {e}");
            lock_registry(&self.registry).complete(id);
        }
    }

    /// Cancels every tracked asynchronous task. Their targets are never
    /// invoked. Returns how many were cancelled.
    pub fn cancel_async(&self) -> usize {
        let cancelled = lock_registry(&self.registry).cancel_all();
        if cancelled > 0 {
            log::debug!("Cancelled {cancelled} in-flight blur task(s)");
        }
        cancelled
    }

    /// Asynchronous tasks submitted but not yet delivered, failed or
    /// cancelled.
    pub fn in_flight(&self) -> usize {
        lock_registry(&self.registry).len()
    }

    /// Releases the engine's cached buffers. The invoker stays usable.
    pub fn destroy(&mut self) {
        self.engine.destroy();
    }
}

impl Drop for BlurInvoker {
    fn drop(&mut self) {
        self.cancel_async();
    }
}

struct AsyncJob {
    id: TaskId,
    token: CancelToken,
    captured: Captured,
    settings: BlurSettings,
    target: MainThreadTarget,
    stamp: SubmissionStamp,
    registry: Arc<Mutex<TaskRegistry>>,
}

impl AsyncJob {
    fn run(self) {
        let AsyncJob {
            id,
            token,
            captured,
            settings,
            target,
            stamp,
            registry,
        } = self;

        if token.is_cancelled() {
            log::debug!("Task {id:?} cancelled before start");
            return;
        }

        let mut scratch = BlurScratch::default();
        match captured.blur(&settings, &mut scratch, &token) {
            Ok(result) => {
                let gate = Arc::clone(&registry);
                // The registry is re-checked on the UI context, so a cancel
                // that lands after the computation still prevents delivery.
                let posted = target.deliver_if(BlurDelivery { stamp, result }, move || {
                    let live = lock_registry(&gate).complete(id);
                    if !live {
                        log::debug!("Discarding result of cancelled task {id:?}");
                    }
                    live
                });
                if !posted {
                    lock_registry(&registry).complete(id);
                }
            }
            Err(BlurError::Cancelled) => {
                log::debug!("Task {id:?} interrupted");
            }
            Err(e) => {
                log::debug!("Task {id:?} produced no result: {e}");
                lock_registry(&registry).complete(id);
            }
        }
    }
}

fn lock_registry(registry: &Mutex<TaskRegistry>) -> MutexGuard<'_, TaskRegistry> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::render_host::RenderHost;
use super::stale_result_guard::{
    Acceptance, AcceptedFrame, GuardPhase, GuardStats, Layer, StaleResultGuard,
};
use crate::scheduling::domain::blur_target::{BlurDelivery, BlurSurface};
use crate::shared::submission_stamp::SubmissionStamp;

/// A [`BlurSurface`] that filters deliveries through a [`StaleResultGuard`]
/// and reports to a [`RenderHost`].
///
/// The guard lock is released before the host is called.
pub struct GuardedSurface {
    guard: Mutex<StaleResultGuard>,
    host: Arc<dyn RenderHost>,
}

impl GuardedSurface {
    pub fn new(host: Arc<dyn RenderHost>) -> Self {
        Self {
            guard: Mutex::new(StaleResultGuard::new()),
            host,
        }
    }

    fn lock(&self) -> MutexGuard<'_, StaleResultGuard> {
        self.guard.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn attach(&self) {
        self.lock().attach();
    }

    pub fn detach(&self) {
        self.lock().detach();
    }

    /// See [`StaleResultGuard::request`].
    pub fn request(&self) -> bool {
        self.lock().request()
    }

    pub fn phase(&self) -> GuardPhase {
        self.lock().phase()
    }

    pub fn stats(&self) -> GuardStats {
        self.lock().stats()
    }

    pub fn last_accepted(&self) -> Option<SubmissionStamp> {
        self.lock().last_accepted()
    }

    /// Runs one render pass: promotes the newest accepted frame, reports it
    /// through `on_accepted` the first time it is drawn, hands it to `draw`
    /// and acknowledges the pass. Returns `false` if there was nothing to
    /// draw or a pass is already running.
    pub fn render<F>(&self, draw: F) -> bool
    where
        F: FnOnce(&AcceptedFrame),
    {
        let pass = self.lock().begin_render();
        let Some(pass) = pass else {
            return false;
        };
        if pass.fresh {
            self.host
                .on_accepted(pass.frame.result(), pass.frame.down_sampling());
        }
        draw(&pass.frame);

        let redraw = self.lock().finish_render();
        if redraw {
            self.host.request_redraw();
        }
        true
    }

    fn accept(&self, delivery: BlurDelivery, layer: Layer) {
        let outcome = self.lock().deliver(delivery, layer);
        if outcome == (Acceptance::Accepted { request_redraw: true }) {
            self.host.request_redraw();
        }
    }
}

impl BlurSurface for GuardedSurface {
    fn bind_content(&self, delivery: BlurDelivery) {
        self.accept(delivery, Layer::Content);
    }

    fn bind_background(&self, delivery: BlurDelivery) {
        self.accept(delivery, Layer::Background);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blurring::domain::blur_result::BlurResult;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Weak;

    #[derive(Default)]
    struct RecordingHost {
        redraws: AtomicUsize,
        accepted: Mutex<Vec<(u32, u32)>>,
        // Renders from inside request_redraw, like a host that draws eagerly.
        reenter: Mutex<Option<Weak<GuardedSurface>>>,
    }

    impl RenderHost for RecordingHost {
        fn request_redraw(&self) {
            self.redraws.fetch_add(1, Ordering::SeqCst);
            let surface = self.reenter.lock().unwrap().as_ref().and_then(Weak::upgrade);
            if let Some(surface) = surface {
                surface.render(|_| {});
            }
        }

        fn on_accepted(&self, buffer: &BlurResult, down_sampling: u32) {
            self.accepted.lock().unwrap().push((buffer.width(), down_sampling));
        }
    }

    fn delivery(width: u32) -> BlurDelivery {
        BlurDelivery {
            stamp: SubmissionStamp::next(),
            result: BlurResult::new(vec![0; (width * 4) as usize], width, 1, 4),
        }
    }

    fn surface() -> (Arc<GuardedSurface>, Arc<RecordingHost>) {
        let host = Arc::new(RecordingHost::default());
        let surface = Arc::new(GuardedSurface::new(host.clone()));
        surface.attach();
        (surface, host)
    }

    #[test]
    fn test_acceptance_requests_one_redraw() {
        let (surface, host) = surface();
        surface.bind_content(delivery(1));
        surface.bind_content(delivery(2));
        assert_eq!(host.redraws.load(Ordering::SeqCst), 1);
        assert_eq!(surface.phase(), GuardPhase::Accepted);
    }

    #[test]
    fn test_render_reports_acceptance_once() {
        let (surface, host) = surface();
        surface.bind_background(delivery(3));

        let mut layers = Vec::new();
        assert!(surface.render(|frame| layers.push(frame.layer())));
        assert!(surface.render(|frame| layers.push(frame.layer())));

        assert_eq!(layers, vec![Layer::Background, Layer::Background]);
        assert_eq!(*host.accepted.lock().unwrap(), vec![(3, 4)]);
    }

    #[test]
    fn test_result_accepted_mid_pass_schedules_next_pass() {
        let (surface, host) = surface();
        surface.bind_content(delivery(1));
        assert!(surface.render(|_| surface.bind_content(delivery(2))));

        assert_eq!(host.redraws.load(Ordering::SeqCst), 2);
        assert!(surface.render(|frame| assert_eq!(frame.result().width(), 2)));
        assert_eq!(surface.phase(), GuardPhase::Idle);
    }

    #[test]
    fn test_host_may_render_from_redraw_request() {
        let (surface, host) = surface();
        *host.reenter.lock().unwrap() = Some(Arc::downgrade(&surface));

        surface.bind_content(delivery(5));
        assert_eq!(*host.accepted.lock().unwrap(), vec![(5, 4)]);
        assert_eq!(surface.phase(), GuardPhase::Idle);
    }

    #[test]
    fn test_detached_surface_ignores_deliveries() {
        let (surface, host) = surface();
        surface.detach();
        surface.bind_content(delivery(1));
        assert!(!surface.render(|_| panic!("nothing to draw")));
        assert_eq!(host.redraws.load(Ordering::SeqCst), 0);
        assert_eq!(surface.stats().discarded, 1);
    }
}

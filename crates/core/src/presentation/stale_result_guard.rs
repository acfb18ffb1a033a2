use std::sync::Arc;

use crate::blurring::domain::blur_result::BlurResult;
use crate::scheduling::domain::blur_target::BlurDelivery;
use crate::shared::submission_stamp::SubmissionStamp;

/// Which layer of the display element a result was bound to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Layer {
    Content,
    Background,
}

/// Phase of one display target, as seen from the UI context.
///
/// Computation and delivery in between `Requested` and `Accepted` belong to
/// the scheduler and are not tracked here.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuardPhase {
    Idle,
    Requested,
    Accepted,
    Rendering,
    Detached,
}

/// Outcome of handing a delivery to the guard.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Acceptance {
    /// The result is pending for the next pass. `request_redraw` is set when
    /// the caller must schedule one; it is not while a pass is in progress.
    Accepted { request_redraw: bool },
    /// Older than the last accepted result, or the target is detached.
    Discarded,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GuardStats {
    pub accepted: u64,
    pub discarded: u64,
}

/// A result the guard has accepted for drawing.
#[derive(Debug)]
pub struct AcceptedFrame {
    stamp: SubmissionStamp,
    layer: Layer,
    result: BlurResult,
}

impl AcceptedFrame {
    pub fn stamp(&self) -> SubmissionStamp {
        self.stamp
    }

    pub fn layer(&self) -> Layer {
        self.layer
    }

    pub fn result(&self) -> &BlurResult {
        &self.result
    }

    pub fn down_sampling(&self) -> u32 {
        self.result.down_sampling()
    }
}

/// A render pass handed out by [`StaleResultGuard::begin_render`].
#[derive(Debug)]
pub struct RenderPass {
    pub frame: Arc<AcceptedFrame>,
    /// True the first time this frame is drawn.
    pub fresh: bool,
}

/// Stale-result suppression for one display target.
///
/// Accepts a delivery iff its stamp is at least the last accepted one, so
/// the accepted sequence never goes backwards regardless of completion order.
/// Accepted results wait in a pending slot until the rendering layer starts a
/// pass; a burst of acceptances between two passes collapses into the newest.
/// While a pass is in progress new results are still accepted, but they are
/// only promoted after [`finish_render`](Self::finish_render), so passes never
/// interleave.
///
/// The guard is a plain state machine. Callers own synchronisation and
/// forward its outcomes to the rendering layer.
#[derive(Debug)]
pub struct StaleResultGuard {
    phase: GuardPhase,
    last_accepted: Option<SubmissionStamp>,
    pending: Option<AcceptedFrame>,
    current: Option<Arc<AcceptedFrame>>,
    redraw_in_progress: bool,
    stats: GuardStats,
}

impl Default for StaleResultGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl StaleResultGuard {
    /// A guard for a target that is not yet attached to a visible context.
    pub fn new() -> Self {
        Self {
            phase: GuardPhase::Detached,
            last_accepted: None,
            pending: None,
            current: None,
            redraw_in_progress: false,
            stats: GuardStats::default(),
        }
    }

    pub fn phase(&self) -> GuardPhase {
        self.phase
    }

    pub fn last_accepted(&self) -> Option<SubmissionStamp> {
        self.last_accepted
    }

    pub fn stats(&self) -> GuardStats {
        self.stats
    }

    pub fn redraw_in_progress(&self) -> bool {
        self.redraw_in_progress
    }

    pub fn is_attached(&self) -> bool {
        self.phase != GuardPhase::Detached
    }

    /// The frame drawn by the latest pass, if any.
    pub fn current(&self) -> Option<Arc<AcceptedFrame>> {
        self.current.clone()
    }

    pub fn attach(&mut self) {
        if self.phase == GuardPhase::Detached {
            self.phase = GuardPhase::Idle;
        }
    }

    /// Drops pending and drawn frames. Deliveries arriving afterwards are
    /// discarded until the next [`attach`](Self::attach).
    pub fn detach(&mut self) {
        self.phase = GuardPhase::Detached;
        self.pending = None;
        self.current = None;
        self.redraw_in_progress = false;
    }

    /// Records a blur request. Returns `false` when detached, in which case
    /// the caller must not submit anything.
    pub fn request(&mut self) -> bool {
        match self.phase {
            GuardPhase::Detached => false,
            GuardPhase::Idle => {
                self.phase = GuardPhase::Requested;
                true
            }
            _ => true,
        }
    }

    pub fn deliver(&mut self, delivery: BlurDelivery, layer: Layer) -> Acceptance {
        let stale = self.last_accepted.is_some_and(|last| delivery.stamp < last);
        if !self.is_attached() || stale {
            self.stats.discarded += 1;
            log::debug!(
                "Discarding blur result {:?} (last accepted {:?})",
                delivery.stamp,
                self.last_accepted
            );
            return Acceptance::Discarded;
        }

        self.stats.accepted += 1;
        self.last_accepted = Some(delivery.stamp);
        self.pending = Some(AcceptedFrame {
            stamp: delivery.stamp,
            layer,
            result: delivery.result,
        });

        if self.phase == GuardPhase::Rendering {
            return Acceptance::Accepted { request_redraw: false };
        }
        self.phase = GuardPhase::Accepted;
        let request_redraw = !self.redraw_in_progress;
        self.redraw_in_progress = true;
        Acceptance::Accepted { request_redraw }
    }

    /// Starts a render pass, promoting the pending frame if there is one.
    /// Returns `None` while another pass is in progress, when detached, or
    /// when nothing has been accepted yet.
    pub fn begin_render(&mut self) -> Option<RenderPass> {
        if matches!(self.phase, GuardPhase::Rendering | GuardPhase::Detached) {
            return None;
        }
        let fresh = match self.pending.take() {
            Some(frame) => {
                self.current = Some(Arc::new(frame));
                true
            }
            None => false,
        };
        let frame = self.current.clone()?;
        self.phase = GuardPhase::Rendering;
        self.redraw_in_progress = true;
        Some(RenderPass { frame, fresh })
    }

    /// Acknowledges the end of a pass. Returns `true` when a result accepted
    /// during the pass is waiting and another redraw must be scheduled.
    pub fn finish_render(&mut self) -> bool {
        if self.phase != GuardPhase::Rendering {
            return false;
        }
        if self.pending.is_some() {
            self.phase = GuardPhase::Accepted;
            true
        } else {
            self.phase = GuardPhase::Idle;
            self.redraw_in_progress = false;
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delivery_at(stamp: SubmissionStamp, width: u32) -> BlurDelivery {
        BlurDelivery {
            stamp,
            result: BlurResult::new(vec![0; (width * 4) as usize], width, 1, 2),
        }
    }

    fn attached() -> StaleResultGuard {
        let mut guard = StaleResultGuard::new();
        guard.attach();
        guard
    }

    // --- Lifecycle ---

    #[test]
    fn test_starts_detached_and_request_is_noop() {
        let mut guard = StaleResultGuard::new();
        assert_eq!(guard.phase(), GuardPhase::Detached);
        assert!(!guard.request());
        assert_eq!(guard.phase(), GuardPhase::Detached);
    }

    #[test]
    fn test_request_moves_idle_to_requested() {
        let mut guard = attached();
        assert!(guard.request());
        assert_eq!(guard.phase(), GuardPhase::Requested);
        assert!(guard.request());
        assert_eq!(guard.phase(), GuardPhase::Requested);
    }

    #[test]
    fn test_delivery_after_detach_is_discarded() {
        let mut guard = attached();
        let stamp = SubmissionStamp::next();
        guard.detach();
        assert_eq!(guard.deliver(delivery_at(stamp, 1), Layer::Content), Acceptance::Discarded);
        assert!(guard.begin_render().is_none());
        assert_eq!(guard.stats().discarded, 1);
    }

    #[test]
    fn test_detach_drops_frames() {
        let mut guard = attached();
        guard.deliver(delivery_at(SubmissionStamp::next(), 1), Layer::Content);
        guard.detach();
        guard.attach();
        assert!(guard.current().is_none());
        assert!(guard.begin_render().is_none());
        assert_eq!(guard.phase(), GuardPhase::Idle);
    }

    // --- Acceptance ordering ---

    #[test]
    fn test_late_older_result_is_discarded() {
        let mut guard = attached();
        let t1 = SubmissionStamp::next();
        let t2 = SubmissionStamp::next();

        assert_eq!(
            guard.deliver(delivery_at(t2, 2), Layer::Content),
            Acceptance::Accepted { request_redraw: true }
        );
        assert_eq!(guard.deliver(delivery_at(t1, 1), Layer::Content), Acceptance::Discarded);

        let pass = guard.begin_render().unwrap();
        assert_eq!(pass.frame.stamp(), t2);
        assert_eq!(guard.last_accepted(), Some(t2));
        assert_eq!(guard.stats(), GuardStats { accepted: 1, discarded: 1 });
    }

    #[test]
    fn test_equal_stamp_is_accepted() {
        let mut guard = attached();
        let t = SubmissionStamp::next();
        guard.deliver(delivery_at(t, 1), Layer::Content);
        assert!(matches!(
            guard.deliver(delivery_at(t, 2), Layer::Background),
            Acceptance::Accepted { .. }
        ));
        let pass = guard.begin_render().unwrap();
        assert_eq!(pass.frame.layer(), Layer::Background);
        assert_eq!(pass.frame.result().width(), 2);
    }

    #[test]
    fn test_burst_between_passes_collapses_to_newest() {
        let mut guard = attached();
        let stamps: Vec<_> = (0..5).map(|_| SubmissionStamp::next()).collect();

        let mut redraws = 0;
        for &stamp in &stamps {
            if guard.deliver(delivery_at(stamp, 1), Layer::Content)
                == (Acceptance::Accepted { request_redraw: true })
            {
                redraws += 1;
            }
        }
        assert_eq!(redraws, 1);

        let pass = guard.begin_render().unwrap();
        assert!(pass.fresh);
        assert_eq!(pass.frame.stamp(), stamps[4]);
    }

    // --- Rendering ---

    #[test]
    fn test_passes_never_interleave() {
        let mut guard = attached();
        guard.deliver(delivery_at(SubmissionStamp::next(), 1), Layer::Content);
        let first = guard.begin_render().unwrap();
        assert!(guard.begin_render().is_none());

        let newer = SubmissionStamp::next();
        assert_eq!(
            guard.deliver(delivery_at(newer, 3), Layer::Content),
            Acceptance::Accepted { request_redraw: false }
        );
        assert_eq!(guard.phase(), GuardPhase::Rendering);
        assert_eq!(first.frame.result().width(), 1);

        assert!(guard.finish_render());
        assert!(guard.redraw_in_progress());
        let second = guard.begin_render().unwrap();
        assert!(second.fresh);
        assert_eq!(second.frame.stamp(), newer);
        assert!(!guard.finish_render());
        assert!(!guard.redraw_in_progress());
        assert_eq!(guard.phase(), GuardPhase::Idle);
    }

    #[test]
    fn test_redraw_without_new_result_reuses_current_frame() {
        let mut guard = attached();
        let stamp = SubmissionStamp::next();
        guard.deliver(delivery_at(stamp, 1), Layer::Content);
        guard.begin_render().unwrap();
        guard.finish_render();

        let pass = guard.begin_render().unwrap();
        assert!(!pass.fresh);
        assert_eq!(pass.frame.stamp(), stamp);
    }

    #[test]
    fn test_begin_render_before_any_result_is_none() {
        let mut guard = attached();
        assert!(guard.begin_render().is_none());
        assert_eq!(guard.phase(), GuardPhase::Idle);
        assert!(!guard.finish_render());
    }
}

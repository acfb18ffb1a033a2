use super::ui_context::UiContext;
use crate::scheduling::domain::blur_target::{BlurDelivery, BlurTarget};

/// Wraps a [`BlurTarget`] so delivery always happens on the UI context.
///
/// From the UI thread delivery is synchronous; from any other thread it is
/// posted to the UI queue.
#[derive(Debug)]
pub struct MainThreadTarget {
    target: BlurTarget,
    ui: UiContext,
}

impl MainThreadTarget {
    pub fn new(target: BlurTarget, ui: UiContext) -> Self {
        Self { target, ui }
    }

    pub fn deliver(self, delivery: BlurDelivery) -> bool {
        self.deliver_if(delivery, || true)
    }

    /// Delivers only if `admit` returns true when evaluated on the UI
    /// context, right before the target is touched. Returns `false` when the
    /// UI queue is gone and nothing will run.
    pub fn deliver_if<F>(self, delivery: BlurDelivery, admit: F) -> bool
    where
        F: FnOnce() -> bool + Send + 'static,
    {
        let target = self.target;
        self.ui.dispatch(move || {
            if admit() {
                target.deliver(delivery);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blurring::domain::blur_result::BlurResult;
    use crate::scheduling::infrastructure::ui_context::ui_context;
    use crate::shared::submission_stamp::SubmissionStamp;
    use std::thread;

    fn delivery() -> BlurDelivery {
        BlurDelivery {
            stamp: SubmissionStamp::next(),
            result: BlurResult::new(vec![0; 4], 1, 1, 1),
        }
    }

    #[test]
    fn test_worker_delivery_runs_on_ui_thread() {
        let (ui, queue) = ui_context();
        let (tx, rx) = crossbeam_channel::unbounded();
        let target = MainThreadTarget::new(
            BlurTarget::custom(move |_| tx.send(thread::current().id()).unwrap()),
            ui,
        );
        thread::spawn(move || {
            target.deliver(delivery());
        })
        .join()
        .unwrap();

        assert!(rx.try_recv().is_err());
        queue.run_pending();
        assert_eq!(rx.try_recv().unwrap(), thread::current().id());
    }

    #[test]
    fn test_rejected_admission_skips_target() {
        let (ui, _queue) = ui_context();
        let (tx, rx) = crossbeam_channel::unbounded::<()>();
        let target = MainThreadTarget::new(BlurTarget::custom(move |_| tx.send(()).unwrap()), ui);
        assert!(target.deliver_if(delivery(), || false));
        assert!(rx.try_recv().is_err());
    }
}

use std::marker::PhantomData;
use std::rc::Rc;
use std::thread::{self, ThreadId};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

pub type UiJob = Box<dyn FnOnce() + Send + 'static>;

/// Handle for posting work onto the single-threaded UI context.
///
/// Cloneable and sendable; every clone posts to the same [`UiQueue`].
#[derive(Clone, Debug)]
pub struct UiContext {
    tx: Sender<UiJob>,
    ui_thread: ThreadId,
}

/// The UI side of the context: drains posted closures on the thread that
/// created it. Not `Send`, so it cannot leave that thread.
pub struct UiQueue {
    rx: Receiver<UiJob>,
    context: UiContext,
    _not_send: PhantomData<Rc<()>>,
}

/// Makes the calling thread the UI context.
pub fn ui_context() -> (UiContext, UiQueue) {
    let (tx, rx) = crossbeam_channel::unbounded::<UiJob>();
    let context = UiContext {
        tx,
        ui_thread: thread::current().id(),
    };
    let queue = UiQueue {
        rx,
        context: context.clone(),
        _not_send: PhantomData,
    };
    (context, queue)
}

impl UiContext {
    pub fn is_ui_thread(&self) -> bool {
        thread::current().id() == self.ui_thread
    }

    /// Queues `job` for the UI thread. Returns `false` if the queue is gone,
    /// in which case the job is dropped without running.
    pub fn post<F>(&self, job: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        if self.tx.send(Box::new(job)).is_err() {
            log::debug!("UI queue closed, dropping posted job");
            return false;
        }
        true
    }

    /// Runs `job` inline when already on the UI thread, otherwise posts it.
    pub fn dispatch<F>(&self, job: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        if self.is_ui_thread() {
            job();
            true
        } else {
            self.post(job)
        }
    }
}

impl UiQueue {
    pub fn context(&self) -> UiContext {
        self.context.clone()
    }

    /// Runs every job already queued. Returns how many ran.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        while let Ok(job) = self.rx.try_recv() {
            job();
            ran += 1;
        }
        ran
    }

    /// Waits up to `timeout` for one job, then drains anything else queued.
    /// Returns how many ran.
    pub fn wait_and_run(&self, timeout: Duration) -> usize {
        match self.rx.recv_timeout(timeout) {
            Ok(job) => {
                job();
                1 + self.run_pending()
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => 0,
        }
    }

    pub fn pending(&self) -> usize {
        self.rx.len()
    }
}

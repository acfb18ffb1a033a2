use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

use crate::scheduling::domain::task_executor::{ExecuteError, Job, TaskExecutor};
use crate::shared::constants::WORKER_KEEP_ALIVE;

#[derive(Debug, Default)]
struct PoolCounters {
    /// Workers waiting for a job that no submission has claimed yet.
    idle: AtomicUsize,
    live: AtomicUsize,
    spawned: AtomicUsize,
}

/// Growable worker pool: threads are created on demand, idle ones are
/// reused, and there is no upper bound.
///
/// A worker that stays idle for the keep-alive interval retires. Workers exit
/// once every `WorkerPool` handle has been dropped and the queue is empty.
///
/// Each submission claims one idle worker or spawns a new one, so
/// concurrently submitted jobs always run in parallel.
#[derive(Clone, Debug)]
pub struct WorkerPool {
    tx: Sender<Job>,
    rx: Receiver<Job>,
    counters: Arc<PoolCounters>,
    keep_alive: Duration,
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkerPool {
    pub fn new() -> Self {
        Self::with_keep_alive(WORKER_KEEP_ALIVE)
    }

    pub fn with_keep_alive(keep_alive: Duration) -> Self {
        let (tx, rx) = crossbeam_channel::unbounded::<Job>();
        Self {
            tx,
            rx,
            counters: Arc::new(PoolCounters::default()),
            keep_alive,
        }
    }

    pub fn submit<F>(&self, job: F) -> Result<(), ExecuteError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.execute(Box::new(job))
    }

    /// Worker threads currently alive (busy or idle).
    pub fn live_workers(&self) -> usize {
        self.counters.live.load(Ordering::SeqCst)
    }

    pub fn idle_workers(&self) -> usize {
        self.counters.idle.load(Ordering::SeqCst)
    }

    fn spawn_worker(&self) -> io::Result<()> {
        let rx = self.rx.clone();
        let counters = Arc::clone(&self.counters);
        let keep_alive = self.keep_alive;
        let index = counters.spawned.fetch_add(1, Ordering::SeqCst);
        counters.live.fetch_add(1, Ordering::SeqCst);

        let spawned = thread::Builder::new()
            .name(format!("blur-worker-{index}"))
            .spawn(move || worker_loop(rx, counters, keep_alive));
        match spawned {
            Ok(_) => {
                log::debug!("Spawned blur-worker-{index}");
                Ok(())
            }
            Err(e) => {
                self.counters.live.fetch_sub(1, Ordering::SeqCst);
                Err(e)
            }
        }
    }
}

impl TaskExecutor for WorkerPool {
    /// Claims a worker before queueing, so a job is only queued when some
    /// worker will pick it up.
    fn execute(&self, job: Job) -> Result<(), ExecuteError> {
        if !take_idle_slot(&self.counters.idle) {
            let spawned = self.spawn_worker();
            ensure_worker(spawned, self.live_workers())?;
        }
        // Only fails once every receiver is gone, which `self` prevents.
        self.tx
            .send(job)
            .map_err(|_| ExecuteError::new("worker queue closed"))
    }
}

/// Tolerates a failed spawn while other workers are alive to drain the
/// queue. With none left the job would never run.
fn ensure_worker(spawned: io::Result<()>, live: usize) -> Result<(), ExecuteError> {
    match spawned {
        Ok(()) => Ok(()),
        Err(e) if live > 0 => {
            log::warn!("Failed to spawn blur worker, queueing for {live} live worker(s): {e}");
            Ok(())
        }
        Err(e) => Err(ExecuteError::new(format!("no blur worker available: {e}"))),
    }
}

fn worker_loop(rx: Receiver<Job>, counters: Arc<PoolCounters>, keep_alive: Duration) {
    loop {
        match rx.recv_timeout(keep_alive) {
            Ok(job) => {
                run_job(job);
                counters.idle.fetch_add(1, Ordering::SeqCst);
            }
            Err(RecvTimeoutError::Timeout) => {
                // Failing to take a slot means every idle slot has been
                // claimed by a pending job, which this worker must pick up.
                if take_idle_slot(&counters.idle) {
                    break;
                }
            }
            Err(RecvTimeoutError::Disconnected) => {
                take_idle_slot(&counters.idle);
                break;
            }
        }
    }
    counters.live.fetch_sub(1, Ordering::SeqCst);
    log::debug!("Blur worker retired");
}

/// Decrements `idle` if it is positive. Submitters use it to claim a waiting
/// worker; workers use it to retire.
fn take_idle_slot(idle: &AtomicUsize) -> bool {
    let mut current = idle.load(Ordering::SeqCst);
    while current > 0 {
        match idle.compare_exchange(current, current - 1, Ordering::SeqCst, Ordering::SeqCst) {
            Ok(_) => return true,
            Err(actual) => current = actual,
        }
    }
    false
}

fn run_job(job: Job) {
    if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
        log::warn!("Blur job panicked");
    }
}

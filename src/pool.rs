//! Bounded worker pool for bulk population.
//!
//! Tasks are identified by index. A fixed number of scoped OS threads pull the
//! next index from a shared counter and send `(index, result)` pairs back over
//! a channel; the caller puts them back in order. Cancellation is cooperative:
//! once the token is set no worker starts another task.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, mpsc};
use std::thread;

use tracing::trace;

/// Cancellation token shared with the workers.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Runs `work` for every index in `0..tasks` on at most `max_workers` threads.
/// The returned pairs are in completion order; indices skipped because of
/// cancellation are missing.
pub(crate) fn run_indexed<R, F>(tasks: usize, max_workers: usize, cancel: &CancelToken, work: F) -> Vec<(usize, R)>
where
    R: Send,
    F: Fn(usize) -> R + Sync,
{
    if tasks == 0 {
        return Vec::new();
    }
    let workers = max_workers.clamp(1, tasks);
    let next = AtomicUsize::new(0);
    let (tx, rx) = mpsc::channel();

    thread::scope(|scope| {
        for worker in 0..workers {
            let tx = tx.clone();
            let next = &next;
            let work = &work;
            scope.spawn(move || {
                loop {
                    if cancel.is_cancelled() {
                        trace!(worker, "worker observed cancellation");
                        break;
                    }
                    let index = next.fetch_add(1, Ordering::Relaxed);
                    if index >= tasks {
                        break;
                    }
                    // the receiver outlives the scope
                    if tx.send((index, work(index))).is_err() {
                        break;
                    }
                }
            });
        }
        drop(tx);
    });

    rx.into_iter().collect()
}

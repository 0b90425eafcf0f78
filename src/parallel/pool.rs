use crossbeam::channel::{Receiver, RecvTimeoutError, Sender, bounded};
use crossbeam::queue::SegQueue;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Upper bound on the work channel capacity; crossbeam allocates every slot up front
pub const MAX_BUFFER_SIZE: usize = 65_536;

/// Failure of a pool run
#[derive(Debug)]
pub enum PoolError<E> {
    /// The item source yielded an error; submission stopped there
    Source(E),
    /// At least one worker thread panicked
    WorkerPanicked,
}

/// What a pool run produced
#[derive(Debug)]
pub struct PoolOutcome<R> {
    /// Completed results, in completion order
    pub results: Vec<R>,
    /// Items handed to the pool
    pub submitted: usize,
    /// Queued items dropped after the wait expired
    pub discarded: usize,
    /// Whether the bounded wait expired
    pub timed_out: bool,
    pub workers: usize,
}

/// Fixed-size worker pool fed through a bounded crossbeam channel.
///
/// Each task's result goes into a lock-free `SegQueue`, so the output carries
/// no ordering guarantee. Once the source is exhausted the work channel is
/// closed and the caller waits up to `timeout` for the workers to drain it.
/// If the wait expires a cancellation flag is raised: running tasks finish
/// their current item, and every item still queued is discarded.
pub struct TaskPool {
    workers: usize,
    buffer_size: usize,
    timeout: Duration,
}

/// Shared state handed to each worker thread
struct WorkerContext<'a, T, R, F> {
    worker_id: usize,
    work_rx: Receiver<T>,
    done_tx: Sender<usize>,
    sink: &'a SegQueue<R>,
    completed: &'a AtomicUsize,
    discarded: &'a AtomicUsize,
    cancelled: &'a AtomicBool,
    task: &'a F,
}

impl TaskPool {
    pub fn new(workers: usize, timeout: Duration) -> Self {
        let workers = workers.max(1);
        Self {
            workers,
            buffer_size: workers.saturating_mul(2).min(MAX_BUFFER_SIZE),
            timeout,
        }
    }

    /// Channel capacity as a multiple of the worker count, capped at [`MAX_BUFFER_SIZE`]
    pub fn with_buffer_multiplier(mut self, multiplier: usize) -> Self {
        self.buffer_size = self
            .workers
            .saturating_mul(multiplier.max(1))
            .min(MAX_BUFFER_SIZE);
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Submit every item from `items` and wait for the workers.
    ///
    /// Items are pulled from the source on the calling thread. The first
    /// source error cancels the run; all threads are joined before this
    /// returns on every path.
    pub fn run<T, R, E, I, F>(&self, items: I, task: F) -> Result<PoolOutcome<R>, PoolError<E>>
    where
        T: Send,
        R: Send,
        I: IntoIterator<Item = Result<T, E>>,
        F: Fn(T) -> R + Sync,
    {
        let (work_tx, work_rx) = bounded::<T>(self.buffer_size);
        let (done_tx, done_rx) = bounded::<usize>(self.workers);

        let sink = SegQueue::new();
        let completed = AtomicUsize::new(0);
        let discarded = AtomicUsize::new(0);
        let cancelled = AtomicBool::new(false);

        let scoped = crossbeam::thread::scope(|s| -> Result<(usize, bool), E> {
            for worker_id in 0..self.workers {
                let ctx = WorkerContext {
                    worker_id,
                    work_rx: work_rx.clone(),
                    done_tx: done_tx.clone(),
                    sink: &sink,
                    completed: &completed,
                    discarded: &discarded,
                    cancelled: &cancelled,
                    task: &task,
                };

                s.spawn(move |_| worker_thread(ctx));
            }

            // Only the workers hold these now
            drop(work_rx);
            drop(done_tx);

            let mut submitted = 0;
            for item in items {
                match item {
                    Ok(item) => {
                        if work_tx.send(item).is_err() {
                            break; // every worker is gone
                        }
                        submitted += 1;
                    }
                    Err(e) => {
                        cancelled.store(true, Ordering::SeqCst);
                        return Err(e);
                    }
                }
            }

            // No more work
            drop(work_tx);
            tracing::debug!(submitted, workers = self.workers, "all work submitted");

            // None when the timeout is too far out for an Instant: wait unbounded
            let deadline = Instant::now().checked_add(self.timeout);
            let mut finished = 0;
            while finished < self.workers {
                let received = match deadline {
                    Some(deadline) => done_rx.recv_deadline(deadline),
                    None => done_rx
                        .recv()
                        .map_err(|_| RecvTimeoutError::Disconnected),
                };
                match received {
                    Ok(_) => finished += 1,
                    Err(RecvTimeoutError::Timeout) => {
                        cancelled.store(true, Ordering::SeqCst);
                        tracing::warn!(
                            timeout_secs = self.timeout.as_secs_f64(),
                            completed = completed.load(Ordering::SeqCst),
                            submitted,
                            "bounded wait expired, cancelling queued work"
                        );
                        return Ok((submitted, true));
                    }
                    // A worker died without reporting; the scope surfaces the panic
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }

            Ok((submitted, false))
        });

        let (submitted, timed_out) = match scoped {
            Ok(Ok(progress)) => progress,
            Ok(Err(e)) => return Err(PoolError::Source(e)),
            Err(_) => return Err(PoolError::WorkerPanicked),
        };

        let mut results = Vec::with_capacity(completed.load(Ordering::SeqCst));
        while let Some(result) = sink.pop() {
            results.push(result);
        }

        Ok(PoolOutcome {
            results,
            submitted,
            discarded: discarded.load(Ordering::SeqCst),
            timed_out,
            workers: self.workers,
        })
    }
}

fn worker_thread<T, R, F>(ctx: WorkerContext<'_, T, R, F>)
where
    F: Fn(T) -> R,
{
    let mut processed = 0usize;

    while let Ok(work_item) = ctx.work_rx.recv() {
        if ctx.cancelled.load(Ordering::SeqCst) {
            ctx.discarded.fetch_add(1, Ordering::SeqCst);
            continue;
        }

        ctx.sink.push((ctx.task)(work_item));
        ctx.completed.fetch_add(1, Ordering::SeqCst);
        processed += 1;
    }

    tracing::trace!(worker_id = ctx.worker_id, processed, "worker finished");
    let _ = ctx.done_tx.send(ctx.worker_id);
}

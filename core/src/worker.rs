//! A bounded background worker pool.
//!
//! Jobs are queued into a single mutex-guarded FIFO and picked up by a fixed
//! set of worker threads. The stop flag lives under the same lock, so a worker
//! that sees an empty queue and a raised flag can exit without racing a late
//! [`WorkerPool::execute`].
//!
//! The pool is a side facility for loading and decoding. Frame-critical work
//! never goes through it.
//!
//! # Example
//!
//! ```
//! use cobalt_core::worker::WorkerPool;
//! use std::sync::atomic::{AtomicU32, Ordering};
//! use std::sync::Arc;
//!
//! let pool = WorkerPool::new(2, 16);
//! let counter = Arc::new(AtomicU32::new(0));
//! for _ in 0..4 {
//!     let c = counter.clone();
//!     pool.execute(move || {
//!         c.fetch_add(1, Ordering::Relaxed);
//!     })
//!     .unwrap();
//! }
//! pool.wait_idle();
//! assert_eq!(counter.load(Ordering::Relaxed), 4);
//! ```

use std::collections::VecDeque;
use std::sync::Arc;
use std::thread::JoinHandle;

use parking_lot::{Condvar, Mutex};
use thiserror::Error;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Reasons a job can be rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum WorkerError {
    #[error("worker queue is full ({capacity} jobs)")]
    QueueFull { capacity: usize },
    #[error("worker pool is shutting down")]
    ShuttingDown,
}

struct Queue {
    jobs: VecDeque<Job>,
    running: usize,
    stopping: bool,
}

struct Shared {
    queue: Mutex<Queue>,
    /// Signaled when a job is queued or shutdown starts.
    work_ready: Condvar,
    /// Signaled when a worker finishes a job.
    idle: Condvar,
}

/// Fixed-size pool of worker threads with a bounded job queue.
pub struct WorkerPool {
    shared: Arc<Shared>,
    workers: Vec<JoinHandle<()>>,
    capacity: usize,
}

impl WorkerPool {
    /// Spawns `threads` workers (at least one) with room for `capacity`
    /// queued jobs (at least one).
    pub fn new(threads: usize, capacity: usize) -> Self {
        let threads = threads.max(1);
        let shared = Arc::new(Shared {
            queue: Mutex::new(Queue {
                jobs: VecDeque::new(),
                running: 0,
                stopping: false,
            }),
            work_ready: Condvar::new(),
            idle: Condvar::new(),
        });

        let workers = (0..threads)
            .filter_map(|i| {
                let shared = shared.clone();
                std::thread::Builder::new()
                    .name(format!("cobalt-worker-{i}"))
                    .spawn(move || worker_loop(&shared))
                    .map_err(|e| log::error!("Failed to spawn worker thread {i}: {e}"))
                    .ok()
            })
            .collect::<Vec<_>>();

        log::debug!("Worker pool started with {} threads", workers.len());
        Self {
            shared,
            workers,
            capacity: capacity.max(1),
        }
    }

    /// Creates a pool sized to the number of available CPU cores.
    pub fn default_threads(capacity: usize) -> Self {
        Self::new(
            std::thread::available_parallelism().map_or(1, |n| n.get()),
            capacity,
        )
    }

    /// Queues a job.
    pub fn execute<F>(&self, job: F) -> Result<(), WorkerError>
    where
        F: FnOnce() + Send + 'static,
    {
        let mut queue = self.shared.queue.lock();
        if queue.stopping {
            return Err(WorkerError::ShuttingDown);
        }
        if queue.jobs.len() >= self.capacity {
            return Err(WorkerError::QueueFull {
                capacity: self.capacity,
            });
        }
        queue.jobs.push_back(Box::new(job));
        drop(queue);
        self.shared.work_ready.notify_one();
        Ok(())
    }

    /// Discards every queued job that has not started. Returns how many were dropped.
    pub fn clear(&self) -> usize {
        let mut queue = self.shared.queue.lock();
        let dropped = queue.jobs.len();
        queue.jobs.clear();
        if queue.running == 0 {
            self.shared.idle.notify_all();
        }
        dropped
    }

    /// Number of jobs waiting to start.
    pub fn pending(&self) -> usize {
        self.shared.queue.lock().jobs.len()
    }

    /// Number of worker threads.
    pub fn threads(&self) -> usize {
        self.workers.len()
    }

    /// Blocks until the queue is empty and no job is running.
    pub fn wait_idle(&self) {
        let mut queue = self.shared.queue.lock();
        while !queue.jobs.is_empty() || queue.running > 0 {
            if self.workers.is_empty() {
                // Nobody will ever drain the queue.
                break;
            }
            self.shared.idle.wait(&mut queue);
        }
    }

    /// Stops accepting jobs, lets workers drain the queue, then joins them.
    pub fn shutdown(&mut self) {
        {
            let mut queue = self.shared.queue.lock();
            if queue.stopping && self.workers.is_empty() {
                return;
            }
            queue.stopping = true;
        }
        self.shared.work_ready.notify_all();
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                log::error!("Worker thread panicked");
            }
        }
        log::debug!("Worker pool shut down");
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(shared: &Shared) {
    loop {
        let job = {
            let mut queue = shared.queue.lock();
            loop {
                if let Some(job) = queue.jobs.pop_front() {
                    queue.running += 1;
                    break job;
                }
                if queue.stopping {
                    return;
                }
                shared.work_ready.wait(&mut queue);
            }
        };

        job();

        let mut queue = shared.queue.lock();
        queue.running -= 1;
        if queue.running == 0 && queue.jobs.is_empty() {
            shared.idle.notify_all();
        }
    }
}

// Copyright 2024
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// Bounded worker pool for per-item export work.
//
// Adapted from the writer's thread pool: a fixed set of threads drains a shared
// task queue, and every submitted task gets a promise that carries its outcome
// back to the submitter.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::thread::{self, JoinHandle};

use log::{debug, error, trace};

use crate::error::{ExportError, Result};
use crate::parallel::promise::Promise;
use crate::parallel::task_queue::TaskQueue;

/// Configuration for the worker pool
#[derive(Debug, Clone)]
pub struct WorkerPoolConfig {
    /// Number of worker threads to spawn
    pub worker_threads: usize,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        // Default to using the number of available CPUs for worker threads
        let worker_threads = match std::thread::available_parallelism() {
            Ok(num) => num.get(),
            Err(_) => 2, // Fallback if we can't determine parallelism
        };

        Self { worker_threads }
    }
}

impl WorkerPoolConfig {
    /// Creates a new configuration with custom settings
    pub fn new(worker_threads: usize) -> Self {
        Self {
            worker_threads: worker_threads.max(1), // Ensure at least one worker
        }
    }
}

/// Runs `f`, turning a panic into `ExportError::Panicked`.
pub fn run_guarded<O>(f: impl FnOnce() -> O) -> Result<O> {
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| {
        ExportError::Panicked(panic_message(&*payload))
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

type Task<T, O> = (T, Promise<Result<O>>);

/// Worker thread state
struct Worker {
    id: usize,
    handle: JoinHandle<()>,
}

/// A fixed-size pool of threads applying one handler to submitted tasks.
///
/// Each task is handled exactly once by some worker. Panics in the handler
/// are caught and reported through the task's promise, so a bad task never
/// takes a worker down. Dropping the pool closes the queue, lets the workers
/// finish what is queued and joins them.
pub struct WorkerPool<T: Send + 'static, O: Send + 'static> {
    /// Tasks waiting for a worker
    queue: Arc<TaskQueue<Task<T, O>>>,

    /// Worker threads, joined on close
    workers: Vec<Worker>,

    /// Flag to indicate if the pool has been closed
    closed: AtomicBool,
}

impl<T: Send + 'static, O: Send + 'static> WorkerPool<T, O> {
    /// Creates a new worker pool
    ///
    /// # Arguments
    /// * `config` - Number of workers to spawn
    /// * `handler` - Function applied to every submitted task
    ///
    /// # Returns
    /// A new WorkerPool with all workers started
    pub fn new<F>(config: WorkerPoolConfig, handler: F) -> Result<Self>
    where
        F: Fn(T) -> O + Send + Sync + 'static,
    {
        let queue = Arc::new(TaskQueue::new());
        let handler = Arc::new(handler);

        let mut pool = Self {
            queue,
            workers: Vec::with_capacity(config.worker_threads),
            closed: AtomicBool::new(false),
        };

        for id in 0..config.worker_threads.max(1) {
            let queue_clone = Arc::clone(&pool.queue);
            let handler_clone = Arc::clone(&handler);

            // On failure the partially built pool is dropped, joining the
            // workers already started
            let handle = thread::Builder::new()
                .name(format!("export-worker-{}", id))
                .spawn(move || Self::worker_loop(id, queue_clone, handler_clone))?;

            pool.workers.push(Worker { id, handle });
        }

        Ok(pool)
    }

    /// Worker thread main loop
    fn worker_loop<F>(id: usize, queue: Arc<TaskQueue<Task<T, O>>>, handler: Arc<F>)
    where
        F: Fn(T) -> O + Send + Sync + 'static,
    {
        debug!("Worker thread {} starting", id);

        loop {
            match queue.read_front() {
                Ok((task, promise)) => {
                    let outcome = run_guarded(|| handler(task));
                    if let Err(e) = promise.fulfill(outcome) {
                        error!("Worker {} could not deliver an outcome: {}", id, e);
                    }
                }
                Err(ExportError::QueueClosed(_)) => {
                    trace!("Worker {} found queue closed, exiting", id);
                    break;
                }
                Err(e) => {
                    error!("Worker {} encountered error, exiting: {}", id, e);
                    break;
                }
            }
        }

        debug!("Worker thread {} exiting", id);
    }

    /// Queues a task for the workers.
    ///
    /// # Returns
    /// A promise fulfilled with the handler's output, or with
    /// `ExportError::Panicked` if the handler panicked
    pub fn submit(&self, task: T) -> Result<Promise<Result<O>>> {
        if self.closed.load(Ordering::Acquire) {
            return Err(ExportError::QueueClosed(
                "Cannot submit to a closed pool".to_string(),
            ));
        }

        let promise = Promise::new();
        self.queue.push_back((task, promise.clone()))?;
        Ok(promise)
    }

    /// Number of worker threads
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Stops accepting tasks. Queued tasks are still processed.
    pub fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::Release);
        self.queue.close()
    }

    /// Closes the pool and waits for every worker to drain the queue and exit.
    pub fn join(mut self) -> Result<()> {
        self.close()?;
        self.join_workers()
    }

    fn join_workers(&mut self) -> Result<()> {
        let mut result = Ok(());

        for worker in self.workers.drain(..) {
            if let Err(e) = worker.handle.join() {
                error!("Failed to join worker {}: {:?}", worker.id, e);
                result = Err(ExportError::Other(format!(
                    "worker {} terminated abnormally",
                    worker.id
                )));
            }
        }

        result
    }
}

impl<T: Send + 'static, O: Send + 'static> Drop for WorkerPool<T, O> {
    fn drop(&mut self) {
        let _ = self.close();
        let _ = self.join_workers();
    }
}

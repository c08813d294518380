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

// Hands extracted items to the per-item handler, either inline in the calling
// thread or through a worker pool, and folds the outcomes into a tally.

use std::sync::Arc;

use log::{debug, error};

use crate::error::Result;
use crate::export::report::Tally;
use crate::parallel::{run_guarded, Promise, WorkerPool, WorkerPoolConfig};
use crate::record::{ExportItem, Record};

pub(crate) type ItemHandler<R> = Arc<dyn Fn(ExportItem<R>) -> Result<()> + Send + Sync>;

pub(crate) enum Dispatcher<R: Record> {
    Inline(ItemHandler<R>),
    Pool(WorkerPool<ExportItem<R>, Result<()>>),
}

impl<R: Record> Dispatcher<R> {
    /// Zero worker threads means inline processing.
    pub fn new(worker_threads: usize, handler: ItemHandler<R>) -> Result<Self> {
        if worker_threads == 0 {
            debug!("Processing items inline");
            return Ok(Dispatcher::Inline(handler));
        }

        let pool = WorkerPool::new(WorkerPoolConfig::new(worker_threads), move |item| {
            handler(item)
        })?;
        debug!("Processing items on {} worker threads", pool.worker_count());
        Ok(Dispatcher::Pool(pool))
    }

    /// Processes one batch and waits for all of it before returning.
    pub fn dispatch_batch(&self, items: Vec<ExportItem<R>>, tally: &mut Tally) {
        match self {
            Dispatcher::Inline(handler) => {
                for item in items {
                    let id = item.id;
                    tally.record(id, run_guarded(|| handler(item)).and_then(|r| r));
                }
            }
            Dispatcher::Pool(pool) => {
                let submitted: Vec<(u64, Result<Promise<Result<Result<()>>>>)> = items
                    .into_iter()
                    .map(|item| (item.id, pool.submit(item)))
                    .collect();

                for (id, promise) in submitted {
                    let outcome = promise
                        .and_then(|p| p.wait())
                        .and_then(|guarded| guarded)
                        .and_then(|r| r);
                    tally.record(id, outcome);
                }
            }
        }
    }

    /// Drains and joins the pool, if any.
    pub fn shutdown(self) {
        if let Dispatcher::Pool(pool) = self {
            if let Err(e) = pool.join() {
                error!("Worker pool did not shut down cleanly: {}", e);
            }
        }
    }
}

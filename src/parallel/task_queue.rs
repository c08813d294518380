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

//! A closable FIFO queue feeding the worker pool.

use crate::error::{ExportError, Result};
use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard};

/// Represents the operational state of the task queue
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TaskQueueState {
    /// Normal operation - tasks can be added and processed
    Normal,
    /// Queue is closed - no more tasks can be added
    Closed,
}

/// Inner state of the task queue, protected by a mutex
#[derive(Debug)]
struct TaskQueueInner<T> {
    /// Queue of pending tasks
    queue: VecDeque<T>,
    /// Operational state of the queue
    state: TaskQueueState,
}

/// A thread-safe queue for tasks
///
/// Producers push tasks to the back, workers block on the front. Closing the
/// queue rejects new tasks but lets workers drain the ones already queued.
#[derive(Debug)]
pub struct TaskQueue<T> {
    /// Inner state protected by mutex
    inner: Mutex<TaskQueueInner<T>>,
    /// Condition variable for signaling new tasks
    signal: Condvar,
}

impl<T> Default for TaskQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TaskQueue<T> {
    /// Create a new empty task queue
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(TaskQueueInner {
                queue: VecDeque::new(),
                state: TaskQueueState::Normal,
            }),
            signal: Condvar::new(),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, TaskQueueInner<T>>> {
        self.inner
            .lock()
            .map_err(|e| ExportError::Other(e.to_string()))
    }

    /// Add a task to the back of the queue
    pub fn push_back(&self, t: T) -> Result<()> {
        let mut inner = self.lock()?;

        // Check if queue is closed
        if inner.state == TaskQueueState::Closed {
            return Err(ExportError::QueueClosed(
                "Cannot add to a closed queue".to_string(),
            ));
        }

        inner.queue.push_back(t);
        self.signal.notify_one();

        Ok(())
    }

    /// Read a task from the front of the queue
    ///
    /// This will block until a task is available or the queue is closed.
    pub fn read_front(&self) -> Result<T> {
        let mut inner = self.lock()?;

        loop {
            if let Some(task) = inner.queue.pop_front() {
                return Ok(task);
            }

            // If closed and empty, return error
            if inner.state == TaskQueueState::Closed {
                return Err(ExportError::QueueClosed(
                    "Queue is closed and empty".to_string(),
                ));
            }

            inner = self
                .signal
                .wait(inner)
                .map_err(|e| ExportError::Other(format!("Condvar wait failed: {}", e)))?;
        }
    }

    /// Close the queue
    ///
    /// This prevents new tasks from being added, but allows existing tasks
    /// to be processed.
    pub fn close(&self) -> Result<()> {
        let mut inner = self.lock()?;
        inner.state = TaskQueueState::Closed;

        // Notify all waiters so they can check the closed state
        self.signal.notify_all();

        Ok(())
    }

    #[cfg(test)]
    /// Check if the queue is empty
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.lock()?.queue.is_empty())
    }

    #[cfg(test)]
    /// Check if the queue is done (empty and closed)
    pub fn is_done(&self) -> Result<bool> {
        let inner = self.lock()?;
        Ok(inner.queue.is_empty() && inner.state == TaskQueueState::Closed)
    }

    #[cfg(test)]
    /// Get the number of tasks in the queue
    pub fn len(&self) -> Result<usize> {
        Ok(self.lock()?.queue.len())
    }
}

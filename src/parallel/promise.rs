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

//! One-shot promise used to hand item outcomes back from workers.

use crate::error::{ExportError, Result};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};

/// State of a Promise
#[derive(Debug)]
enum PromiseState<T> {
    /// No value has been provided yet
    Waiting,
    /// A value has been provided and is ready to be consumed
    Fulfilled(T),
    /// The value was previously provided but has already been taken
    Consumed,
}

/// A one-time-use Promise that allows a value to be produced in one thread
/// and consumed in another. Clones share the same slot.
#[derive(Debug)]
pub struct Promise<T> {
    /// The current state of the promise
    state: Arc<Mutex<PromiseState<T>>>,

    /// Condition variable used to signal fulfillment
    condvar: Arc<Condvar>,
}

impl<T> Default for Promise<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Promise<T> {
    /// Create a new, unfulfilled promise
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(PromiseState::Waiting)),
            condvar: Arc::new(Condvar::new()),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, PromiseState<T>>> {
        self.state
            .lock()
            .map_err(|e| ExportError::Other(format!("Failed to lock state mutex: {}", e)))
    }

    /// Fulfill the promise with the given value
    pub fn fulfill(&self, value: T) -> Result<()> {
        let mut state = self.lock()?;

        match *state {
            PromiseState::Waiting => {
                *state = PromiseState::Fulfilled(value);
                self.condvar.notify_all();
                Ok(())
            }
            PromiseState::Fulfilled(_) => {
                Err(ExportError::Other("Promise already fulfilled".to_string()))
            }
            PromiseState::Consumed => {
                Err(ExportError::Other("Promise already consumed".to_string()))
            }
        }
    }

    /// Wait for the promise to be fulfilled and consume the value
    pub fn wait(self) -> Result<T> {
        let mut state = self.lock()?;

        while let PromiseState::Waiting = *state {
            state = self
                .condvar
                .wait(state)
                .map_err(|e| ExportError::Other(format!("Condvar wait failed: {}", e)))?;
        }

        match std::mem::replace(&mut *state, PromiseState::Consumed) {
            PromiseState::Fulfilled(value) => Ok(value),
            PromiseState::Consumed => Err(ExportError::Other(
                "Promise value already consumed".to_string(),
            )),
            PromiseState::Waiting => {
                Err(ExportError::Other("Promise in invalid state".to_string()))
            }
        }
    }

    /// Check if the promise has been fulfilled
    pub fn is_fulfilled(&self) -> Result<bool> {
        Ok(matches!(*self.lock()?, PromiseState::Fulfilled(_)))
    }
}

impl<T> Clone for Promise<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            condvar: Arc::clone(&self.condvar),
        }
    }
}

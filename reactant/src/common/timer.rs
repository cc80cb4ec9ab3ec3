/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */

use std::sync::Weak;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::{Builder, Handle, Runtime};
use tokio_util::sync::CancellationToken;
use tracing::{error, trace};

use crate::message::Mailbox;

/// Timers for timed `react`s, driven by a small dedicated tokio runtime that is
/// built on first use.
#[derive(Debug, Default)]
pub(crate) struct Timers {
    runtime: Mutex<Option<Runtime>>,
}

impl Timers {
    /// Expires the waiter registered under `generation` after `after` unless the
    /// returned token is cancelled first. `None` if no timer runtime is available.
    pub(crate) fn arm(
        &self,
        after: Duration,
        mailbox: Weak<Mailbox>,
        generation: u64,
    ) -> Option<CancellationToken> {
        let handle = self.handle()?;
        let token = CancellationToken::new();
        let cancelled = token.clone();
        handle.spawn(async move {
            tokio::select! {
                () = tokio::time::sleep(after) => {
                    if let Some(mailbox) = mailbox.upgrade() {
                        mailbox.expire(generation);
                    }
                }
                () = cancelled.cancelled() => {
                    trace!(generation, "timer cancelled");
                }
            }
        });
        Some(token)
    }

    fn handle(&self) -> Option<Handle> {
        let mut runtime = self.runtime.lock();
        if runtime.is_none() {
            match Builder::new_multi_thread()
                .worker_threads(1)
                .thread_name("reactant-timer")
                .enable_time()
                .build()
            {
                Ok(built) => *runtime = Some(built),
                Err(e) => {
                    error!("Failed to build timer runtime: {}", e);
                    return None;
                }
            }
        }
        runtime.as_ref().map(|runtime| runtime.handle().clone())
    }

    pub(crate) fn shutdown(&self) {
        if let Some(runtime) = self.runtime.lock().take() {
            runtime.shutdown_background();
        }
    }
}

impl Drop for Timers {
    fn drop(&mut self) {
        self.shutdown();
    }
}

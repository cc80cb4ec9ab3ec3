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

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::{Builder, Runtime};
use tracing::{debug, error, trace};

use crate::common::{ReactantConfig, Task};
use crate::traits::Scheduler;

/// Default scheduler: continuations run on the blocking pool of a tokio runtime.
///
/// The blocking pool grows on demand up to `scheduler.worker_threads`, which leaves
/// room for bodies parked in a blocking `receive`. The runtime is built lazily on the
/// first [`execute`](Scheduler::execute) and, with `behavior.auto_shutdown` set, torn
/// down again whenever the runtime reports quiescence.
#[derive(Debug)]
pub struct TokioScheduler {
    runtime: Mutex<Option<Runtime>>,
    max_threads: usize,
    keep_alive: Duration,
    thread_name: String,
    grace: Duration,
    auto_shutdown: bool,
    builds: AtomicU64,
}

impl TokioScheduler {
    /// Creates a scheduler sized by `config`. No thread is started yet.
    #[must_use]
    pub fn new(config: &ReactantConfig) -> Self {
        Self {
            runtime: Mutex::new(None),
            max_threads: config.scheduler.worker_threads.max(1),
            keep_alive: config.keep_alive(),
            thread_name: config.scheduler.thread_name.clone(),
            grace: config.pool_shutdown_timeout(),
            auto_shutdown: config.behavior.auto_shutdown,
            builds: AtomicU64::new(0),
        }
    }

    /// Returns `true` while a worker pool exists.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.runtime.lock().is_some()
    }

    /// How many times a worker pool has been built.
    #[must_use]
    pub fn pool_builds(&self) -> u64 {
        self.builds.load(Ordering::Acquire)
    }

    fn build(&self) -> std::io::Result<Runtime> {
        Builder::new_multi_thread()
            .worker_threads(1)
            .max_blocking_threads(self.max_threads)
            .thread_keep_alive(self.keep_alive)
            .thread_name(self.thread_name.clone())
            .enable_all()
            .build()
    }
}

impl Scheduler for TokioScheduler {
    fn execute(&self, task: Task) {
        let mut runtime = self.runtime.lock();
        if runtime.is_none() {
            match self.build() {
                Ok(built) => {
                    let builds = self.builds.fetch_add(1, Ordering::AcqRel) + 1;
                    debug!(builds, max_threads = self.max_threads, "worker pool started");
                    *runtime = Some(built);
                }
                Err(e) => {
                    error!("Failed to build worker pool, running task on a fresh thread: {}", e);
                    drop(runtime);
                    if let Err(e) = std::thread::Builder::new()
                        .name(self.thread_name.clone())
                        .spawn(task)
                    {
                        error!("Failed to spawn fallback thread: {}", e);
                    }
                    return;
                }
            }
        }
        if let Some(runtime) = runtime.as_ref() {
            drop(runtime.spawn_blocking(task));
        }
    }

    fn shutdown(&self) {
        let Some(runtime) = self.runtime.lock().take() else {
            return;
        };
        let grace = self.grace;
        debug!("worker pool shutting down");
        // A runtime cannot be dropped from one of its own threads.
        let spawned = std::thread::Builder::new()
            .name(format!("{}-shutdown", self.thread_name))
            .spawn(move || runtime.shutdown_timeout(grace));
        if let Err(e) = spawned {
            error!("Failed to spawn pool shutdown thread: {}", e);
        }
    }

    fn quiescent(&self) {
        if self.auto_shutdown {
            trace!("quiescent, releasing worker pool");
            self.shutdown();
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

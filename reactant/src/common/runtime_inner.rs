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

use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

use crate::common::registry::Registry;
use crate::common::timer::Timers;
use crate::common::ReactantConfig;
use crate::traits::Scheduler;

/// Shared state behind every clone of an [`ActorRuntime`](crate::common::ActorRuntime).
pub(crate) struct RuntimeInner {
    pub(crate) config: ReactantConfig,
    pub(crate) scheduler: Arc<dyn Scheduler>,
    pub(crate) timers: Timers,
    pub(crate) registry: Registry,
    /// Reactors that are runnable, blocked or waiting on a timer, plus running future
    /// computations.
    pub(crate) live: Mutex<usize>,
    pub(crate) idle: Condvar,
}

impl RuntimeInner {
    pub(crate) fn new(config: ReactantConfig, scheduler: Arc<dyn Scheduler>) -> Self {
        Self {
            config,
            scheduler,
            timers: Timers::default(),
            registry: Registry::default(),
            live: Mutex::new(0),
            idle: Condvar::new(),
        }
    }
}

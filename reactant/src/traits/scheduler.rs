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

use std::fmt::Debug;

use crate::common::Task;

/// Executes reactor continuations.
///
/// A scheduler receives every resumed continuation, every slice resubmission and
/// every future computation as a [`Task`]. It must run each task exactly once and
/// must never run two tasks for the same reactor concurrently; the runtime upholds
/// the latter by only ever having one task per reactor outstanding.
///
/// A body that performs a blocking `receive` occupies its thread until a message
/// arrives, so implementations should be able to grow past their steady-state size.
pub trait Scheduler: Send + Sync + Debug + 'static {
    /// Submits a task for execution.
    fn execute(&self, task: Task);

    /// Releases any resources held by the scheduler.
    ///
    /// A later [`execute`](Scheduler::execute) may bring the scheduler back up.
    fn shutdown(&self) {}

    /// Called by the runtime whenever the count of live reactors and pending future
    /// computations drops to zero. The default does nothing, which opts out of
    /// automatic shutdown.
    fn quiescent(&self) {}
}

//! Runtime-wide components shared by every reactor.
//!
//! This module provides the building blocks that sit around the reactors themselves:
//!
//! *   [`ActorRuntime`]: The runtime context owning the scheduler, timers, registry and live-work counter.
//! *   [`ReactantApp`]: The entry point that launches a runtime context from configuration.
//! *   [`ActorRef`]: The cloneable handle used to address a reactor.
//! *   [`Future`] and [`Inbox`]: Reply targets for code that is not a reactor.
//! *   [`TokioScheduler`]: The default scheduler.
//! *   [`LocalTransport`] and [`RemoteRef`]: The in-process transport and transport-backed handles.
//!
//! Internal types and submodules handle the implementation details for these components.

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

// --- Public Re-exports ---
pub use actor_ref::ActorRef;
pub use actor_runtime::ActorRuntime;
pub use app::ReactantApp;
pub use config::{ReactantConfig, CONFIG};
pub use future::{Future, FutureId, Resolved};
pub use inbox::Inbox;
pub use scheduler::TokioScheduler;
pub use transport::{LocalTransport, RemoteRef};

// --- Crate-Internal Re-exports ---
pub use types::{ActorId, ExceptionHandler, Task};
pub(crate) use types::{Body, LoopCondition, OnceBehavior, Predicate, SharedBehavior};

// --- Submodules ---

/// Defines common type aliases and identifiers.
mod types;

/// Defines the `ReactantApp` entry point.
mod app;
/// Defines the `ActorRef` handle.
mod actor_ref;
/// Defines the `ActorRuntime` context.
mod actor_runtime;
/// Defines the configuration system.
pub mod config;
/// Defines `Future`, the write-once reply cell.
mod future;
/// Defines `Inbox`, a mailbox for non-reactor code.
mod inbox;
/// Registry of live reactors and published names.
mod registry;
/// Shared state behind `ActorRuntime`.
mod runtime_inner;
/// Defines the default `TokioScheduler`.
mod scheduler;
/// Timer service for timed receives.
mod timer;
/// In-process transport and transport-backed handles.
mod transport;

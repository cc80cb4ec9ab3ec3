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

//! Defines common type aliases and small identifier types used across `reactant`.
//!
//! Closure shapes for behaviors, handler bodies and predicates live here so that the
//! engine, the matcher and the builder agree on a single spelling of each.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::actor::{Context, Flow};
use crate::message::Envelope;
use crate::traits::Message;

static NEXT_ACTOR_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identity of a reactor, unique for the lifetime of the process.
///
/// Links and the runtime registry are keyed by `ActorId` rather than by references,
/// so a link graph never forms a reference cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorId(u64);

impl ActorId {
    pub(crate) fn next() -> Self {
        Self(NEXT_ACTOR_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw numeric value of this id.
    #[inline]
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A runnable unit handed to a [`Scheduler`](crate::traits::Scheduler).
///
/// Each task is executed exactly once.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Crate-internal: predicate half of a handler case, evaluated against queued messages.
pub(crate) type Predicate = Box<dyn Fn(&dyn Message) -> bool + Send + Sync>;

/// Crate-internal: body half of a handler case, run with the matched envelope.
pub(crate) type Body<S, R> = Box<dyn FnOnce(&mut Context<'_, S>, Envelope) -> R + Send>;

/// Crate-internal: a one-shot behavior, used for `and_then` continuations.
pub(crate) type OnceBehavior<S> = Box<dyn FnOnce(&mut Context<'_, S>) -> Flow<S> + Send>;

/// Crate-internal: a re-runnable behavior, used for entry behaviors and loop bodies.
pub(crate) type SharedBehavior<S> = Arc<dyn Fn(&mut Context<'_, S>) -> Flow<S> + Send + Sync>;

/// Crate-internal: a loop guard evaluated before each iteration of `loop_while`.
pub(crate) type LoopCondition<S> = Arc<dyn Fn(&mut Context<'_, S>) -> bool + Send + Sync>;

/// Hook offered every error that escapes a handler body.
///
/// Returning `true` accepts the error: the reactor carries on at its current logical
/// continuation as if the body had completed normally. Returning `false` terminates
/// the reactor with the error as its exit reason.
pub type ExceptionHandler<S> =
    Arc<dyn Fn(&mut Context<'_, S>, &anyhow::Error) -> bool + Send + Sync>;

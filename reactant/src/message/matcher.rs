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

use std::fmt;
use std::time::Duration;

use crate::actor::{Context, Flow};
use crate::common::{Body, FutureId, Predicate, Resolved};
use crate::message::{Channel, ChannelMessage, Envelope, Exit, Timeout};
use crate::traits::{downcast_message, Message};

struct Case<S, R> {
    accepts: Predicate,
    body: Body<S, R>,
}

/// An ordered set of handler cases: the selective receive pattern.
///
/// Each case pairs an acceptance test with a body. When several cases accept the
/// same message the earliest one registered wins. `R` is what a body produces:
/// a [`Flow`] for event-based `react`, or any value for a blocking `receive`.
///
/// ```rust,ignore
/// ctx.react(|r| {
///     r.case(|ctx, Ping(n): Ping| { ctx.reply(Pong(n)); Flow::done() })
///         .on_timeout(|_| Flow::exit("idle"))
///         .within(Duration::from_secs(5))
/// })
/// ```
pub struct Receive<S, R = Flow<S>> {
    cases: Vec<Case<S, R>>,
    timeout: Option<Duration>,
}

impl<S: Send + 'static, R: 'static> Receive<S, R> {
    /// Creates an empty handler set with no timeout.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cases: Vec::new(),
            timeout: None,
        }
    }

    /// Adds a case accepting every message of type `T`.
    #[must_use]
    pub fn case<T, F>(self, body: F) -> Self
    where
        T: Message,
        F: FnOnce(&mut Context<'_, S>, T) -> R + Send + 'static,
    {
        self.case_if(|_: &T| true, body)
    }

    /// Adds a case accepting messages of type `T` for which `guard` holds.
    #[must_use]
    pub fn case_if<T, P, F>(mut self, guard: P, body: F) -> Self
    where
        T: Message,
        P: Fn(&T) -> bool + Send + Sync + 'static,
        F: FnOnce(&mut Context<'_, S>, T) -> R + Send + 'static,
    {
        let accepts: Predicate = Box::new(move |message: &dyn Message| {
            message.downcast_ref::<T>().is_some_and(&guard)
        });
        let body: Body<S, R> = Box::new(move |ctx: &mut Context<'_, S>, envelope: Envelope| {
            let (message, _) = envelope.into_parts();
            match downcast_message::<T>(message) {
                Ok(message) => body(ctx, message),
                Err(other) => unreachable!("case for {} handed {other:?}", std::any::type_name::<T>()),
            }
        });
        self.cases.push(Case { accepts, body });
        self
    }

    /// Adds a case for the synthetic [`Timeout`] message.
    #[must_use]
    pub fn on_timeout<F>(self, body: F) -> Self
    where
        F: FnOnce(&mut Context<'_, S>) -> R + Send + 'static,
    {
        self.case(move |ctx, _: Timeout| body(ctx))
    }

    /// Adds a case for [`Exit`] notifications from trapped links.
    #[must_use]
    pub fn on_exit<F>(self, body: F) -> Self
    where
        F: FnOnce(&mut Context<'_, S>, Exit) -> R + Send + 'static,
    {
        self.case(body)
    }

    /// Adds a catch-all case. It also accepts `Timeout` and `Exit`, so register it
    /// after any case meant to see those first.
    #[must_use]
    pub fn on_any<F>(mut self, body: F) -> Self
    where
        F: FnOnce(&mut Context<'_, S>, Envelope) -> R + Send + 'static,
    {
        self.cases.push(Case {
            accepts: Box::new(|_: &dyn Message| true),
            body: Box::new(body),
        });
        self
    }

    /// Adds a case for messages sent through `channel`.
    #[must_use]
    pub fn on_channel<T, F>(self, channel: &Channel<T>, body: F) -> Self
    where
        T: Message + Clone,
        F: FnOnce(&mut Context<'_, S>, T) -> R + Send + 'static,
    {
        let id = channel.id();
        self.case_if(
            move |message: &ChannelMessage<T>| message.channel == id,
            move |ctx, message: ChannelMessage<T>| body(ctx, message.payload),
        )
    }

    /// Adds a case for the value of the future forwarded under `id`.
    #[must_use]
    pub fn on_resolved<T, F>(self, id: FutureId, body: F) -> Self
    where
        T: Message + Clone,
        F: FnOnce(&mut Context<'_, S>, T) -> R + Send + 'static,
    {
        self.case_if(
            move |resolved: &Resolved<T>| resolved.id == id,
            move |ctx, resolved: Resolved<T>| body(ctx, resolved.value),
        )
    }

    /// Bounds how long the receive waits. A zero duration never suspends: it checks
    /// the queue once and otherwise takes the `Timeout` case.
    #[must_use]
    pub fn within(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The configured timeout, if any.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Number of cases.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cases.len()
    }

    /// Returns `true` when no case is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    pub(crate) fn split(self) -> (Vec<Predicate>, Vec<Body<S, R>>, Option<Duration>) {
        let (accepts, bodies) = self
            .cases
            .into_iter()
            .map(|case| (case.accepts, case.body))
            .unzip();
        (accepts, bodies, self.timeout)
    }
}

impl<S: Send + 'static> Receive<S, Flow<S>> {
    /// Adds a case whose body may fail; an `Err` is routed to the exception handler.
    #[must_use]
    pub fn try_case<T, F>(self, body: F) -> Self
    where
        T: Message,
        F: FnOnce(&mut Context<'_, S>, T) -> anyhow::Result<Flow<S>> + Send + 'static,
    {
        self.case(move |ctx, message: T| Flow::from(body(ctx, message)))
    }
}

impl<S: Send + 'static, R: 'static> Default for Receive<S, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, R> fmt::Debug for Receive<S, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Receive")
            .field("cases", &self.cases.len())
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Index of the first predicate accepting the synthetic timeout.
pub(crate) fn timeout_case(accepts: &[Predicate]) -> Option<usize> {
    accepts.iter().position(|accept| accept(&Timeout))
}

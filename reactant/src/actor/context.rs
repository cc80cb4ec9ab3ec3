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
use std::sync::Arc;
use std::time::Duration;

use acton_ern::Ern;
use tracing::trace;

use crate::actor::flow::{Frame, FlowKind, LoopFrame};
use crate::actor::supervision;
use crate::actor::{Flow, Reactor};
use crate::common::{ActorId, ActorRef, ActorRuntime, ExceptionHandler, Future};
use crate::message::{ActorError, Channel, Envelope, Receive, ReplyTo};
use crate::traits::Message;

/// The mutable half of a reactor, owned by whichever continuation runs next.
pub(crate) struct Core<S> {
    pub(crate) state: S,
    pub(crate) frames: Vec<Frame<S>>,
    pub(crate) exception_handler: Option<ExceptionHandler<S>>,
    pub(crate) sender: Option<ReplyTo>,
}

impl<S> Core<S> {
    pub(crate) fn new(state: S, exception_handler: Option<ExceptionHandler<S>>) -> Self {
        Self {
            state,
            frames: Vec::new(),
            exception_handler,
            sender: None,
        }
    }
}

/// The running reactor as seen from inside its own behaviors and handler bodies.
///
/// A `Context` gives access to the reactor's state, its identity and reply address,
/// and builds the [`Flow`] values that steer the continuation engine.
pub struct Context<'a, S> {
    pub(crate) reactor: &'a Arc<Reactor<S>>,
    pub(crate) core: &'a mut Core<S>,
}

impl<'a, S: Send + 'static> Context<'a, S> {
    pub(crate) fn new(reactor: &'a Arc<Reactor<S>>, core: &'a mut Core<S>) -> Self {
        Self { reactor, core }
    }

    /// Borrows the reactor's state.
    #[inline]
    pub fn state(&self) -> &S {
        &self.core.state
    }

    /// Mutably borrows the reactor's state.
    #[inline]
    pub fn state_mut(&mut self) -> &mut S {
        &mut self.core.state
    }

    /// This reactor's id.
    #[inline]
    pub fn id(&self) -> ActorId {
        self.reactor.id
    }

    /// This reactor's name.
    #[inline]
    pub fn name(&self) -> &Ern {
        &self.reactor.name
    }

    /// A handle to this reactor.
    pub fn self_ref(&self) -> ActorRef {
        ActorRef::from_entity(self.reactor.clone())
    }

    /// The runtime this reactor belongs to.
    pub fn runtime(&self) -> &ActorRuntime {
        &self.reactor.runtime
    }

    /// Reply address of the most recently matched message.
    pub fn sender(&self) -> Option<&ReplyTo> {
        self.core.sender.as_ref()
    }

    /// Number of messages waiting in this reactor's mailbox.
    pub fn mailbox_size(&self) -> usize {
        self.reactor.mailbox.len()
    }

    fn reply_address(&self) -> ReplyTo {
        ReplyTo::Actor(self.self_ref())
    }

    /// Sends `message` to the sender of the current message, naming this reactor as
    /// the reply address. Dropped when the current message had no sender.
    pub fn reply(&self, message: impl Message) {
        match &self.core.sender {
            Some(sender) => sender.post(Envelope::new(message, Some(self.reply_address()))),
            None => trace!(actor = %self.id(), "reply dropped, current message has no sender"),
        }
    }

    /// Sends `message` to `target` with this reactor as the reply address.
    pub fn send(&self, target: &ActorRef, message: impl Message) {
        target.send_from(message, self.reply_address());
    }

    /// Sends `message` to `target`, keeping the current message's sender as the reply
    /// address.
    pub fn forward(&self, target: &ActorRef, message: impl Message) {
        target.post(Envelope::new(message, self.core.sender.clone()));
    }

    /// Links this reactor with `other`.
    pub fn link(&self, other: &ActorRef) {
        supervision::link(&self.self_ref(), other);
    }

    /// Removes the link between this reactor and `other`.
    pub fn unlink(&self, other: &ActorRef) {
        supervision::unlink(&self.self_ref(), other);
    }

    /// Whether abnormal exits of linked peers arrive as [`Exit`](crate::prelude::Exit)
    /// messages instead of terminating this reactor.
    pub fn trap_exit(&self) -> bool {
        self.reactor.control.lock().trap_exit
    }

    /// Turns exit trapping on or off.
    pub fn set_trap_exit(&self, trap: bool) {
        self.reactor.control.lock().trap_exit = trap;
    }

    /// Installs the hook offered every error a handler body fails with.
    pub fn set_exception_handler<F>(&mut self, handler: F)
    where
        F: Fn(&mut Context<'_, S>, &anyhow::Error) -> bool + Send + Sync + 'static,
    {
        self.core.exception_handler = Some(Arc::new(handler));
    }

    /// Removes the exception handler; handler errors then terminate the reactor.
    pub fn clear_exception_handler(&mut self) {
        self.core.exception_handler = None;
    }

    /// Opens a typed channel into this reactor's mailbox.
    pub fn channel<T: Message + Clone>(&self) -> Channel<T> {
        Channel::new(&self.self_ref())
    }

    /// Suspends until a message accepted by the handler set built by `build` arrives,
    /// releasing the thread while waiting.
    pub fn react<F>(&self, build: F) -> Flow<S>
    where
        F: FnOnce(Receive<S, Flow<S>>) -> Receive<S, Flow<S>>,
    {
        Flow::from(build(Receive::new()))
    }

    /// Like [`react`](Self::react), delivering `Timeout` after `timeout` if the
    /// handler set accepts it.
    pub fn react_within<F>(&self, timeout: Duration, build: F) -> Flow<S>
    where
        F: FnOnce(Receive<S, Flow<S>>) -> Receive<S, Flow<S>>,
    {
        Flow::from(build(Receive::new()).within(timeout))
    }

    /// Runs `first`, then `next` once everything `first` started has completed.
    pub fn and_then<F, N>(&self, first: F, next: N) -> Flow<S>
    where
        F: FnOnce(&mut Context<'_, S>) -> Flow<S> + Send + 'static,
        N: FnOnce(&mut Context<'_, S>) -> Flow<S> + Send + 'static,
    {
        Flow {
            kind: FlowKind::AndThen(Box::new(first), Box::new(next)),
        }
    }

    /// Runs `body` again every time it completes, until the reactor exits.
    pub fn loop_forever<F>(&self, body: F) -> Flow<S>
    where
        F: Fn(&mut Context<'_, S>) -> Flow<S> + Send + Sync + 'static,
    {
        Flow {
            kind: FlowKind::Loop(LoopFrame {
                condition: None,
                body: Arc::new(body),
            }),
        }
    }

    /// Runs `body` repeatedly while `condition` holds, checking it before each
    /// iteration; completes normally once it fails.
    pub fn loop_while<C, F>(&self, condition: C, body: F) -> Flow<S>
    where
        C: Fn(&mut Context<'_, S>) -> bool + Send + Sync + 'static,
        F: Fn(&mut Context<'_, S>) -> Flow<S> + Send + Sync + 'static,
    {
        Flow {
            kind: FlowKind::Loop(LoopFrame {
                condition: Some(Arc::new(condition)),
                body: Arc::new(body),
            }),
        }
    }

    /// Suspends until `future` is resolved, then runs `body` with its value.
    pub fn await_future<T, F>(&self, future: &Future<T>, body: F) -> Flow<S>
    where
        T: Message + Clone,
        F: FnOnce(&mut Context<'_, S>, T) -> Flow<S> + Send + 'static,
    {
        let id = future.forward_to(&self.self_ref());
        self.react(move |r| r.on_resolved(id, body))
    }

    /// Blocks the current thread until a message accepted by the handler set built by
    /// `build` arrives, then returns what its body produced.
    ///
    /// # Errors
    ///
    /// [`ActorError::TimedOut`] when a timeout set with `within` expires and no
    /// `Timeout` case exists; [`ActorError::Interrupted`] when the reactor was told to
    /// exit while blocked.
    pub fn receive<R, F>(&mut self, build: F) -> Result<R, ActorError>
    where
        R: 'static,
        F: FnOnce(Receive<S, R>) -> Receive<S, R>,
    {
        let (accepts, mut bodies, timeout) = build(Receive::new()).split();
        let (case, envelope) = self.reactor.block_on(&accepts, timeout)?;
        self.core.sender = envelope.sender.clone();
        let body = bodies.swap_remove(case);
        Ok(body(self, envelope))
    }

    /// Blocking receive bounded by `timeout`.
    ///
    /// # Errors
    ///
    /// See [`receive`](Self::receive).
    pub fn receive_within<R, F>(&mut self, timeout: Duration, build: F) -> Result<R, ActorError>
    where
        R: 'static,
        F: FnOnce(Receive<S, R>) -> Receive<S, R>,
    {
        self.receive(move |r| build(r).within(timeout))
    }
}

impl<S> fmt::Debug for Context<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("id", &self.reactor.id)
            .field("name", &self.reactor.name.to_string())
            .field("frames", &self.core.frames.len())
            .finish_non_exhaustive()
    }
}

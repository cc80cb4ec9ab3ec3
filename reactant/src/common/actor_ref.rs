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
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;

use acton_ern::Ern;
use static_assertions::assert_impl_all;
use tracing::{instrument, trace};

use crate::actor::{Entity, Status};
use crate::common::{ActorId, ActorRuntime, Future};
use crate::message::{ActorError, Envelope, ExitReason, ReplyTo};
use crate::traits::Message;

/// A cloneable handle to a reactor.
///
/// Handles are how the outside world and other reactors address a reactor: sending
/// messages, starting and restarting it, asking for replies and waiting for it to
/// finish. Two handles are equal when they refer to the same reactor.
#[derive(Clone)]
pub struct ActorRef {
    pub(crate) entity: Arc<dyn Entity>,
}

assert_impl_all!(ActorRef: Send, Sync, Clone);

impl ActorRef {
    pub(crate) fn from_entity(entity: Arc<dyn Entity>) -> Self {
        Self { entity }
    }

    /// The reactor's id.
    #[inline]
    #[must_use]
    pub fn id(&self) -> ActorId {
        self.entity.id()
    }

    /// The reactor's name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &Ern {
        self.entity.name()
    }

    /// The runtime context the reactor belongs to.
    #[must_use]
    pub fn runtime(&self) -> &ActorRuntime {
        self.entity.runtime()
    }

    /// Starts the reactor. Only a `New` reactor is affected; calling this again is a
    /// no-op. Returns the handle for chaining.
    #[instrument(skip(self), fields(actor = %self.id()))]
    pub fn start(&self) -> Self {
        self.entity.clone().start();
        self.clone()
    }

    /// Runs a terminated reactor's entry behavior again with its state preserved.
    ///
    /// # Errors
    ///
    /// [`ActorError::InvalidState`] unless the reactor is `Terminated`.
    pub fn restart(&self) -> Result<(), ActorError> {
        self.entity.clone().restart()
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn status(&self) -> Status {
        self.entity.status()
    }

    /// Why the reactor terminated, once it has.
    #[must_use]
    pub fn exit_reason(&self) -> Option<ExitReason> {
        self.entity.exit_reason()
    }

    /// Number of messages waiting in the reactor's mailbox.
    #[must_use]
    pub fn mailbox_size(&self) -> usize {
        self.entity.mailbox().len()
    }

    /// Sends `message` with no reply address.
    pub fn send(&self, message: impl Message) {
        self.post(Envelope::new(message, None));
    }

    /// Sends `message` naming `sender` as the reply address.
    pub fn send_from(&self, message: impl Message, sender: impl Into<ReplyTo>) {
        self.post(Envelope::new(message, Some(sender.into())));
    }

    /// Enqueues a pre-built envelope.
    pub fn post(&self, envelope: Envelope) {
        trace!(to = %self.id(), message = ?envelope.message(), "enqueue");
        self.entity.mailbox().enqueue(envelope);
    }

    /// Sends `message` and returns a future for a reply of type `R`.
    pub fn ask<R: Message + Clone>(&self, message: impl Message) -> Future<R> {
        let future = Future::new();
        self.post(Envelope::new(message, Some(future.reply_to())));
        future
    }

    /// Sends `message` and waits up to `timeout` for a reply of type `R`.
    pub fn ask_within<R: Message + Clone>(
        &self,
        message: impl Message,
        timeout: Duration,
    ) -> Option<R> {
        self.ask::<R>(message).apply_within(timeout)
    }

    /// Waits for the reactor to terminate and returns its exit reason, or `None` if
    /// `timeout` passes first.
    #[must_use]
    pub fn join(&self, timeout: Duration) -> Option<ExitReason> {
        self.entity.join(Some(timeout))
    }

    /// Waits without a bound for the reactor to terminate.
    #[must_use]
    pub fn join_forever(&self) -> Option<ExitReason> {
        self.entity.join(None)
    }
}

impl PartialEq for ActorRef {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for ActorRef {}

impl Hash for ActorRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl fmt::Debug for ActorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActorRef")
            .field("id", &self.id())
            .field("name", &self.name().to_string())
            .finish()
    }
}

impl From<&ActorRef> for ActorId {
    fn from(actor: &ActorRef) -> Self {
        actor.id()
    }
}

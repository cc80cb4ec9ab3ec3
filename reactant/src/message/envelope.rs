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

use static_assertions::assert_impl_all;
use tracing::trace;

use crate::common::{ActorId, ActorRef};
use crate::traits::{Message, ReplySink};

/// A message paired with the address its replies should go to.
#[derive(Clone, Debug)]
pub struct Envelope {
    pub(crate) message: Box<dyn Message>,
    pub(crate) sender: Option<ReplyTo>,
}

assert_impl_all!(Envelope: Send, Sync, Clone);

impl Envelope {
    /// Wraps a concrete message.
    pub fn new(message: impl Message, sender: Option<ReplyTo>) -> Self {
        Self::from_boxed(Box::new(message), sender)
    }

    /// Wraps an already boxed message without boxing it a second time.
    #[must_use]
    pub fn from_boxed(message: Box<dyn Message>, sender: Option<ReplyTo>) -> Self {
        Self { message, sender }
    }

    /// Borrows the payload.
    #[inline]
    #[must_use]
    pub fn message(&self) -> &dyn Message {
        &*self.message
    }

    /// The reply address recorded when the message was sent, if any.
    #[inline]
    #[must_use]
    pub fn sender(&self) -> Option<&ReplyTo> {
        self.sender.as_ref()
    }

    /// Returns `true` if the payload is a `T`.
    #[inline]
    #[must_use]
    pub fn is<T: Message>(&self) -> bool {
        self.message().is::<T>()
    }

    /// Splits the envelope into payload and reply address.
    #[must_use]
    pub fn into_parts(self) -> (Box<dyn Message>, Option<ReplyTo>) {
        (self.message, self.sender)
    }
}

/// Where a reply goes: another reactor, or a non-actor sink such as a future or inbox.
#[derive(Clone, Debug)]
pub enum ReplyTo {
    /// A reactor's mailbox.
    Actor(ActorRef),
    /// Any other reply sink.
    Sink(Arc<dyn ReplySink>),
}

impl ReplyTo {
    /// Delivers a pre-built envelope to this address.
    pub fn post(&self, envelope: Envelope) {
        match self {
            Self::Actor(actor) => actor.post(envelope),
            Self::Sink(sink) => sink.post(envelope),
        }
    }

    /// Sends `message` to this address without a reply address of its own.
    pub fn send(&self, message: impl Message) {
        trace!(to = ?self.id(), "posting to reply address");
        self.post(Envelope::new(message, None));
    }

    /// The reactor behind this address, if it is one.
    #[must_use]
    pub fn actor(&self) -> Option<&ActorRef> {
        match self {
            Self::Actor(actor) => Some(actor),
            Self::Sink(_) => None,
        }
    }

    /// The id of the reactor behind this address, if it is one.
    #[must_use]
    pub fn id(&self) -> Option<ActorId> {
        self.actor().map(ActorRef::id)
    }
}

impl From<ActorRef> for ReplyTo {
    fn from(actor: ActorRef) -> Self {
        Self::Actor(actor)
    }
}

impl From<&ActorRef> for ReplyTo {
    fn from(actor: &ActorRef) -> Self {
        Self::Actor(actor.clone())
    }
}

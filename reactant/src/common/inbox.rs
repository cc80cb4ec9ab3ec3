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
use std::time::{Duration, Instant};

use crate::common::Predicate;
use crate::message::{Envelope, Mailbox, ReplyTo, Retrieval, Waited};
use crate::traits::{downcast_message, Message};

/// A mailbox for code that is not a reactor, such as `main` or a test.
///
/// An inbox can be named as the sender of a message so that replies land in it, and
/// offers the same selective, optionally bounded receive as a reactor's blocking
/// `receive`.
#[derive(Clone, Debug, Default)]
pub struct Inbox {
    mailbox: Arc<Mailbox>,
}

impl Inbox {
    /// Creates an empty inbox.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply address pointing at this inbox.
    #[must_use]
    pub fn reply_to(&self) -> ReplyTo {
        ReplyTo::Sink(self.mailbox.clone())
    }

    /// Puts `message` into this inbox.
    pub fn send(&self, message: impl Message) {
        self.mailbox.enqueue(Envelope::new(message, None));
    }

    /// Number of waiting messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.mailbox.len()
    }

    /// Returns `true` when no message is waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mailbox.is_empty()
    }

    /// Blocks until a `T` arrives and takes it.
    #[must_use]
    pub fn receive<T: Message>(&self) -> T {
        loop {
            if let Some(message) = self.take_matching(None, |_: &T| true) {
                return message;
            }
        }
    }

    /// Takes the first `T`, waiting up to `timeout`.
    #[must_use]
    pub fn receive_within<T: Message>(&self, timeout: Duration) -> Option<T> {
        self.take_matching(Some(Instant::now() + timeout), |_: &T| true)
    }

    /// Takes the first `T` for which `accept` holds, waiting up to `timeout`.
    pub fn receive_matching<T, P>(&self, timeout: Duration, accept: P) -> Option<T>
    where
        T: Message,
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.take_matching(Some(Instant::now() + timeout), accept)
    }

    /// Takes the oldest message of any type, waiting up to `timeout`.
    #[must_use]
    pub fn receive_any_within(&self, timeout: Duration) -> Option<Envelope> {
        let accepts = [Box::new(|_: &dyn Message| true) as Predicate];
        match self.mailbox.wait(
            &accepts,
            Some(Instant::now() + timeout),
            Retrieval::Take,
            &|| false,
        ) {
            Waited::Matched(_, envelope) => Some(envelope),
            Waited::TimedOut | Waited::Aborted => None,
        }
    }

    fn take_matching<T, P>(&self, deadline: Option<Instant>, accept: P) -> Option<T>
    where
        T: Message,
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let accepts = [Box::new(move |message: &dyn Message| {
            message.downcast_ref::<T>().is_some_and(&accept)
        }) as Predicate];
        match self
            .mailbox
            .wait(&accepts, deadline, Retrieval::Take, &|| false)
        {
            Waited::Matched(_, envelope) => downcast_message::<T>(envelope.into_parts().0).ok(),
            Waited::TimedOut | Waited::Aborted => None,
        }
    }
}

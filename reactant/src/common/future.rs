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
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use derive_new::new;
use futures::channel::oneshot;
use tracing::trace;

use crate::common::{ActorRef, Predicate};
use crate::message::{Envelope, Mailbox, ReplyTo, Retrieval, Waited};
use crate::traits::{Message, ReplySink};

static NEXT_FUTURE_ID: AtomicU64 = AtomicU64::new(1);

/// Identifies one forwarding of a future's value into a reactor's mailbox.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FutureId(u64);

impl FutureId {
    fn next() -> Self {
        Self(NEXT_FUTURE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Message carrying a future's value into a reactor, matched with
/// [`Receive::on_resolved`](crate::prelude::Receive::on_resolved).
#[derive(new, Clone, Debug)]
pub struct Resolved<T> {
    /// The forwarding this value answers.
    pub id: FutureId,
    /// The value.
    pub value: T,
}

/// A write-once cell for a value of type `T`, readable any number of times.
///
/// A future is set by the first `T` posted to its [`reply_to`](Self::reply_to)
/// address; later replies and replies of other types are dropped. Reading blocks the
/// caller until the value is available.
pub struct Future<T> {
    cell: Arc<FutureCell<T>>,
}

struct FutureCell<T> {
    slot: Mailbox,
    filled: AtomicBool,
    _value: PhantomData<fn() -> T>,
}

fn accepts<T: Message>() -> Predicate {
    Box::new(|message: &dyn Message| message.is::<T>())
}

fn value_of<T: Message + Clone>(envelope: &Envelope) -> Option<T> {
    envelope.message().downcast_ref::<T>().cloned()
}

impl<T: Message + Clone> Future<T> {
    pub(crate) fn new() -> Self {
        Self {
            cell: Arc::new(FutureCell {
                slot: Mailbox::new(),
                filled: AtomicBool::new(false),
                _value: PhantomData,
            }),
        }
    }

    /// The address that sets this future when a `T` is sent to it.
    #[must_use]
    pub fn reply_to(&self) -> ReplyTo {
        ReplyTo::Sink(self.cell.clone())
    }

    /// Returns `true` once the value is available.
    #[must_use]
    pub fn is_set(&self) -> bool {
        !self.cell.slot.is_empty()
    }

    /// Blocks until the value is available and returns a copy of it.
    #[must_use]
    pub fn apply(&self) -> T {
        loop {
            if let Some(value) = self.read(None) {
                return value;
            }
        }
    }

    /// Like [`apply`](Self::apply), giving up after `timeout`.
    #[must_use]
    pub fn apply_within(&self, timeout: Duration) -> Option<T> {
        self.read(Some(Instant::now() + timeout))
    }

    fn read(&self, deadline: Option<Instant>) -> Option<T> {
        match self
            .cell
            .slot
            .wait(&[accepts::<T>()], deadline, Retrieval::Peek, &|| false)
        {
            Waited::Matched(_, envelope) => value_of(&envelope),
            Waited::TimedOut | Waited::Aborted => None,
        }
    }

    /// Sends the value to `target` as a [`Resolved`] message once it is available.
    /// The returned id tells apart values of several outstanding futures.
    pub fn forward_to(&self, target: &ActorRef) -> FutureId {
        let id = FutureId::next();
        let target = target.clone();
        self.cell.slot.watch(
            accepts::<T>(),
            Box::new(move |envelope| {
                if let Some(value) = value_of::<T>(&envelope) {
                    target.send(Resolved::new(id, value));
                }
            }),
        );
        id
    }

    /// Waits for the value without blocking a thread. `None` only if the future is
    /// dropped unset.
    pub async fn wait_async(&self) -> Option<T> {
        let (tx, rx) = oneshot::channel();
        self.cell.slot.watch(
            accepts::<T>(),
            Box::new(move |envelope| {
                tx.send(envelope).ok();
            }),
        );
        rx.await.ok().and_then(|envelope| value_of(&envelope))
    }
}

impl<T> Clone for Future<T> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
        }
    }
}

impl<T> fmt::Debug for Future<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Future")
            .field("value_type", &std::any::type_name::<T>())
            .field("set", &self.cell.filled.load(Ordering::Acquire))
            .finish()
    }
}

impl<T> fmt::Debug for FutureCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FutureCell")
            .field("set", &self.filled.load(Ordering::Acquire))
            .finish()
    }
}

impl<T: Message> ReplySink for FutureCell<T> {
    fn post(&self, envelope: Envelope) {
        if !envelope.is::<T>() {
            trace!(message = ?envelope.message(), "reply of another type dropped");
            return;
        }
        if self.filled.swap(true, Ordering::AcqRel) {
            trace!("future already set, reply dropped");
            return;
        }
        self.slot.enqueue(envelope);
    }
}

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
use std::sync::atomic::{AtomicU64, Ordering};

use derive_new::new;

use crate::common::ActorRef;
use crate::message::ReplyTo;
use crate::traits::Message;

static NEXT_CHANNEL_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a [`Channel`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChannelId(u64);

/// A payload tagged with the channel it was sent through.
#[derive(new, Clone, Debug)]
pub struct ChannelMessage<T> {
    /// The channel the payload travelled through.
    pub channel: ChannelId,
    /// The payload.
    pub payload: T,
}

/// A typed input port that funnels into its owner's mailbox.
///
/// Sending on a channel enqueues a [`ChannelMessage`] so that the owner can select
/// messages per channel with [`Receive::on_channel`](crate::prelude::Receive::on_channel).
pub struct Channel<T> {
    id: ChannelId,
    owner: ActorRef,
    _payload: PhantomData<fn(T)>,
}

impl<T: Message + Clone> Channel<T> {
    /// Opens a fresh channel into `owner`'s mailbox.
    #[must_use]
    pub fn new(owner: &ActorRef) -> Self {
        Self {
            id: ChannelId(NEXT_CHANNEL_ID.fetch_add(1, Ordering::Relaxed)),
            owner: owner.clone(),
            _payload: PhantomData,
        }
    }

    /// This channel's identity.
    #[must_use]
    pub fn id(&self) -> ChannelId {
        self.id
    }

    /// The reactor whose mailbox receives this channel's messages.
    #[must_use]
    pub fn owner(&self) -> &ActorRef {
        &self.owner
    }

    /// Sends a payload with no reply address.
    pub fn send(&self, payload: T) {
        self.owner.send(ChannelMessage::new(self.id, payload));
    }

    /// Sends a payload naming `sender` as the reply address.
    pub fn send_from(&self, payload: T, sender: ReplyTo) {
        self.owner
            .send_from(ChannelMessage::new(self.id, payload), sender);
    }
}

impl<T> Clone for Channel<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            owner: self.owner.clone(),
            _payload: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Channel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("id", &self.id)
            .field("owner", &self.owner)
            .finish()
    }
}

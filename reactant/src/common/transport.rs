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

use tracing::trace;

use crate::common::{ActorId, ActorRuntime};
use crate::message::ActorError;
use crate::traits::{Message, Transport};

/// In-process transport: names and ids resolve against one runtime context.
#[derive(Debug, Clone)]
pub struct LocalTransport {
    runtime: ActorRuntime,
}

impl LocalTransport {
    /// Creates a transport delivering into `runtime`.
    #[must_use]
    pub fn new(runtime: ActorRuntime) -> Self {
        Self { runtime }
    }
}

impl Transport for LocalTransport {
    fn lookup(&self, name: &str) -> Option<ActorId> {
        self.runtime.lookup(name).map(|actor| actor.id())
    }

    fn deliver(
        &self,
        target: ActorId,
        message: Box<dyn Message>,
        sender: Option<ActorId>,
    ) -> Result<(), ActorError> {
        trace!(%target, "local delivery");
        self.runtime.send(target, message, sender)
    }
}

/// A handle to a reactor reached through a [`Transport`].
#[derive(Debug, Clone)]
pub struct RemoteRef {
    target: ActorId,
    transport: Arc<dyn Transport>,
}

impl RemoteRef {
    /// Wraps a known id.
    #[must_use]
    pub fn new(target: ActorId, transport: Arc<dyn Transport>) -> Self {
        Self { target, transport }
    }

    /// Resolves `name` through `transport`.
    #[must_use]
    pub fn resolve(transport: Arc<dyn Transport>, name: &str) -> Option<Self> {
        let target = transport.lookup(name)?;
        Some(Self::new(target, transport))
    }

    /// The id of the reactor behind this handle.
    #[must_use]
    pub fn id(&self) -> ActorId {
        self.target
    }

    /// Sends `message`, naming `sender` as the reply address.
    ///
    /// # Errors
    ///
    /// Whatever the transport reports for a failed delivery.
    pub fn send(&self, message: impl Message, sender: Option<ActorId>) -> Result<(), ActorError> {
        self.transport
            .deliver(self.target, Box::new(message), sender)
    }
}

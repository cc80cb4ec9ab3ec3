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

use std::fmt::Debug;

use crate::common::ActorId;
use crate::message::ActorError;
use crate::traits::Message;

/// Seam for delivering messages to reactors that may live outside this runtime.
///
/// A transport resolves names to ids and hands messages to the mailbox behind an id.
/// Local delivery is provided by [`LocalTransport`](crate::prelude::LocalTransport);
/// wire protocols implement this trait elsewhere.
pub trait Transport: Send + Sync + Debug + 'static {
    /// Resolves a registered name to the id of the reactor behind it.
    fn lookup(&self, name: &str) -> Option<ActorId>;

    /// Delivers `message` to `target`, naming `sender` as the reply address.
    ///
    /// # Errors
    ///
    /// Returns [`ActorError::UnknownActor`] when `target` cannot be reached and
    /// [`ActorError::Transport`] for delivery failures of the transport itself.
    fn deliver(
        &self,
        target: ActorId,
        message: Box<dyn Message>,
        sender: Option<ActorId>,
    ) -> Result<(), ActorError>;
}

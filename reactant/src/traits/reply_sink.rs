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

use crate::message::Envelope;

/// A destination for replies that is not itself a reactor.
///
/// Futures and inboxes implement this so they can stand in as the sender of a
/// message; a reply to such a sender is posted here instead of to an actor mailbox.
pub trait ReplySink: Send + Sync + Debug {
    /// Accepts an envelope addressed to this sink.
    fn post(&self, envelope: Envelope);
}

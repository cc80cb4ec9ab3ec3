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

pub use channel::{Channel, ChannelId, ChannelMessage};
pub use envelope::{Envelope, ReplyTo};
pub use mailbox::Mailbox;
pub(crate) use mailbox::{Lapse, Retrieval, Wake, Waited};
pub(crate) use matcher::timeout_case;
pub use matcher::Receive;
pub use message_error::ActorError;
pub use signal::{Exit, ExitReason, Timeout};

mod channel;
mod envelope;
mod mailbox;
mod matcher;
mod message_error;
mod signal;

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

use std::error::Error;
use std::fmt;

use crate::actor::Status;
use crate::common::ActorId;
use crate::message::ExitReason;

/// Errors surfaced by reactor operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActorError {
    /// A lifecycle operation was attempted from a state that does not allow it,
    /// such as restarting a reactor that has not terminated.
    InvalidState {
        /// The reactor the operation targeted.
        id: ActorId,
        /// The state it was in.
        status: Status,
    },
    /// A blocking receive was abandoned because the reactor was told to exit.
    Interrupted(ExitReason),
    /// A blocking receive expired and its handler set had no `Timeout` case.
    TimedOut,
    /// No reactor with this id is registered.
    UnknownActor(ActorId),
    /// A reactor name was rejected.
    InvalidName(String),
    /// A transport failed to deliver a message.
    Transport(String),
}

impl fmt::Display for ActorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidState { id, status } => {
                write!(f, "reactor {id} cannot do that while {status}")
            }
            Self::Interrupted(reason) => write!(f, "receive interrupted by exit ({reason})"),
            Self::TimedOut => write!(f, "receive timed out"),
            Self::UnknownActor(id) => write!(f, "no reactor registered as {id}"),
            Self::InvalidName(name) => write!(f, "invalid reactor name: {name}"),
            Self::Transport(detail) => write!(f, "transport failure: {detail}"),
        }
    }
}

impl Error for ActorError {}

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

/// Lifecycle state of a reactor.
///
/// ```text
/// New --start--> Runnable <--> Suspended | TimedSuspended | Blocked | TimedBlocked
///                   |
///                   +--> Terminated --restart--> New --> Runnable
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Status {
    /// Built but not started.
    #[default]
    New,
    /// Executing, or scheduled to execute.
    Runnable,
    /// Waiting in an event-based `react` without a timeout.
    Suspended,
    /// Waiting in an event-based `react` with a timeout.
    TimedSuspended,
    /// Holding a thread in a blocking `receive` without a timeout.
    Blocked,
    /// Holding a thread in a blocking `receive` with a timeout.
    TimedBlocked,
    /// Finished; only `restart` leaves this state.
    Terminated,
}

impl Status {
    /// Returns `true` between `start` and termination.
    #[must_use]
    pub const fn is_alive(self) -> bool {
        !matches!(self, Self::New | Self::Terminated)
    }

    /// Returns `true` while waiting for a message, whether suspended or blocked.
    #[must_use]
    pub const fn is_waiting(self) -> bool {
        matches!(
            self,
            Self::Suspended | Self::TimedSuspended | Self::Blocked | Self::TimedBlocked
        )
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::New => "new",
            Self::Runnable => "runnable",
            Self::Suspended => "suspended",
            Self::TimedSuspended => "timed-suspended",
            Self::Blocked => "blocked",
            Self::TimedBlocked => "timed-blocked",
            Self::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

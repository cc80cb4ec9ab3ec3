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

use std::any::Any;
use std::fmt;

use derive_new::new;

use crate::common::ActorId;

/// Synthetic message delivered when a timed receive expires before any real
/// message matched. It never sits in a mailbox queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timeout;

/// Notification delivered to a reactor that traps exits when a linked peer
/// terminates abnormally. The envelope's sender is the terminated peer.
#[derive(new, Clone, Debug, PartialEq, Eq)]
pub struct Exit {
    /// The peer that terminated.
    pub from: ActorId,
    /// Why it terminated.
    pub reason: ExitReason,
}

/// Why a reactor terminated.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum ExitReason {
    /// The behavior ran to completion or called `exit` with the normal reason.
    #[default]
    Normal,
    /// An application-chosen reason passed to `exit`.
    Custom(String),
    /// A handler failed and no exception handler accepted the error.
    Error(String),
    /// A handler panicked.
    Panic(String),
}

impl ExitReason {
    /// Only `Normal` exits are silent; every other reason propagates over links.
    #[inline]
    #[must_use]
    pub const fn is_normal(&self) -> bool {
        matches!(self, Self::Normal)
    }

    /// Builds the reason recorded for an unhandled handler error.
    #[must_use]
    pub fn from_error(error: &anyhow::Error) -> Self {
        Self::Error(format!("{error:#}"))
    }

    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let text = if let Some(text) = payload.downcast_ref::<&'static str>() {
            (*text).to_string()
        } else if let Some(text) = payload.downcast_ref::<String>() {
            text.clone()
        } else {
            "opaque panic payload".to_string()
        };
        Self::Panic(text)
    }
}

impl From<&str> for ExitReason {
    fn from(reason: &str) -> Self {
        if reason == "normal" {
            Self::Normal
        } else {
            Self::Custom(reason.to_string())
        }
    }
}

impl From<String> for ExitReason {
    fn from(reason: String) -> Self {
        Self::from(reason.as_str())
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::Custom(reason) => write!(f, "{reason}"),
            Self::Error(error) => write!(f, "error: {error}"),
            Self::Panic(message) => write!(f, "panic: {message}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_is_the_only_silent_reason() {
        assert!(ExitReason::Normal.is_normal());
        assert!(ExitReason::from("normal").is_normal());
        assert!(!ExitReason::from("boom").is_normal());
        assert!(!ExitReason::Panic("bad".into()).is_normal());
    }

    #[test]
    fn strings_become_custom_reasons() {
        assert_eq!(ExitReason::from("boom"), ExitReason::Custom("boom".into()));
        assert_eq!(ExitReason::from(String::from("boom")).to_string(), "boom");
    }

    #[test]
    fn errors_keep_their_context_chain() {
        let error = anyhow::anyhow!("disk full").context("while saving");
        assert_eq!(
            ExitReason::from_error(&error),
            ExitReason::Error("while saving: disk full".into())
        );
    }

    #[test]
    fn panic_payloads_are_rendered() {
        let reason = ExitReason::from_panic(Box::new("kaput"));
        assert_eq!(reason.to_string(), "panic: kaput");
        let reason = ExitReason::from_panic(Box::new(String::from("owned")));
        assert_eq!(reason, ExitReason::Panic("owned".into()));
    }
}

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

use crate::common::{LoopCondition, OnceBehavior, SharedBehavior};
use crate::message::{ExitReason, Receive};

/// What a behavior asks the engine to do next.
///
/// Behaviors and handler bodies never suspend by unwinding the stack; they return a
/// `Flow`, and the engine interprets it. Build one with the associated functions here
/// or with the combinators on [`Context`](crate::prelude::Context) that take closures.
#[must_use = "a Flow does nothing unless it is returned to the engine"]
pub struct Flow<S> {
    pub(crate) kind: FlowKind<S>,
}

pub(crate) enum FlowKind<S> {
    Done,
    React(Receive<S, Flow<S>>),
    AndThen(OnceBehavior<S>, OnceBehavior<S>),
    Loop(LoopFrame<S>),
    Continue,
    Exit(ExitReason),
    Fail(anyhow::Error),
}

/// One iteration scheme of `loop` or `loop_while`, kept on the continuation stack.
pub(crate) struct LoopFrame<S> {
    pub(crate) condition: Option<LoopCondition<S>>,
    pub(crate) body: SharedBehavior<S>,
}

impl<S> Clone for LoopFrame<S> {
    fn clone(&self) -> Self {
        Self {
            condition: self.condition.clone(),
            body: self.body.clone(),
        }
    }
}

/// Pending work recorded by `and_then` and loops.
pub(crate) enum Frame<S> {
    AndThen(OnceBehavior<S>),
    Loop(LoopFrame<S>),
}

impl<S> Flow<S> {
    /// The current behavior completed; run the next pending continuation, if any.
    pub fn done() -> Self {
        Self {
            kind: FlowKind::Done,
        }
    }

    /// Restart the innermost enclosing loop without running the rest of this
    /// iteration. Outside any loop this behaves like [`done`](Self::done).
    pub fn continue_loop() -> Self {
        Self {
            kind: FlowKind::Continue,
        }
    }

    /// Terminate the reactor with `reason`.
    pub fn exit(reason: impl Into<ExitReason>) -> Self {
        Self {
            kind: FlowKind::Exit(reason.into()),
        }
    }

    /// Fail the current handler; the error is offered to the exception handler.
    pub fn fail(error: impl Into<anyhow::Error>) -> Self {
        Self {
            kind: FlowKind::Fail(error.into()),
        }
    }

    /// Returns `true` for [`done`](Self::done).
    #[must_use]
    pub fn is_done(&self) -> bool {
        matches!(self.kind, FlowKind::Done)
    }

    fn label(&self) -> &'static str {
        match self.kind {
            FlowKind::Done => "done",
            FlowKind::React(_) => "react",
            FlowKind::AndThen(..) => "and_then",
            FlowKind::Loop(_) => "loop",
            FlowKind::Continue => "continue",
            FlowKind::Exit(_) => "exit",
            FlowKind::Fail(_) => "fail",
        }
    }
}

impl<S> From<Receive<S, Flow<S>>> for Flow<S> {
    fn from(receive: Receive<S, Flow<S>>) -> Self {
        Self {
            kind: FlowKind::React(receive),
        }
    }
}

impl<S> From<()> for Flow<S> {
    fn from((): ()) -> Self {
        Self::done()
    }
}

impl<S> From<anyhow::Result<Flow<S>>> for Flow<S> {
    fn from(result: anyhow::Result<Flow<S>>) -> Self {
        result.unwrap_or_else(Self::fail)
    }
}

impl<S> Default for Flow<S> {
    fn default() -> Self {
        Self::done()
    }
}

impl<S> fmt::Debug for Flow<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            FlowKind::Exit(reason) => f.debug_tuple("Flow::exit").field(reason).finish(),
            FlowKind::Fail(error) => f.debug_tuple("Flow::fail").field(error).finish(),
            _ => write!(f, "Flow::{}", self.label()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn results_fold_into_flows() {
        let ok: Flow<()> = Flow::from(Ok(Flow::done()));
        assert!(ok.is_done());

        let failed: Flow<()> = Flow::from(Err(anyhow::anyhow!("nope")));
        assert!(matches!(failed.kind, FlowKind::Fail(ref error) if error.to_string() == "nope"));
    }

    #[test]
    fn exit_reasons_convert() {
        let flow: Flow<()> = Flow::exit("boom");
        assert!(matches!(flow.kind, FlowKind::Exit(ExitReason::Custom(ref r)) if r == "boom"));
        assert_eq!(format!("{:?}", Flow::<()>::continue_loop()), "Flow::continue");
    }
}

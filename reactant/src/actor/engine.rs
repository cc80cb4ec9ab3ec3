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

//! The continuation engine.
//!
//! A reactor's logical thread is a sequence of [`Step`]s run by a trampoline on
//! whichever scheduler thread currently owns its [`Core`]. A `react` that finds no
//! matching message moves the core into a mailbox waiter and returns; the thread is
//! released and a later enqueue, timer or exit request schedules the next step.
//! Pending `and_then` continuations and enclosing loops live on the core's frame
//! stack rather than the native stack, so unbounded react/loop chains run in
//! constant stack space.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{error, instrument, trace};

use crate::actor::flow::{FlowKind, Frame, LoopFrame};
use crate::actor::{Context, Core, Flow, Reactor, Status};
use crate::common::{Body, OnceBehavior, Predicate};
use crate::message::{
    timeout_case, ActorError, Envelope, ExitReason, Lapse, Receive, Retrieval, Timeout, Wake,
    Waited,
};

/// The next unit of work for a reactor.
pub(crate) enum Step<S> {
    /// Run the entry behavior.
    Entry,
    /// Run a one-shot behavior.
    Run(OnceBehavior<S>),
    /// Check a loop's condition and run its body once more.
    Iterate(LoopFrame<S>),
    /// Run a matched handler body.
    Deliver(Body<S, Flow<S>>, Envelope),
    /// Pick up after an interrupted suspension.
    Resume,
}

enum Suspension<S> {
    Continue(Core<S>, Step<S>),
    Parked,
    Exiting(Core<S>, ExitReason),
}

impl<S: Send + 'static> Reactor<S> {
    /// Runs steps until the reactor suspends, terminates or spends its slice.
    #[instrument(level = "trace", skip_all, fields(actor = %self.id))]
    pub(crate) fn run(self: &Arc<Self>, mut core: Core<S>, mut step: Step<S>) {
        let budget = self.runtime.config().limits.max_steps_per_slice.max(1);
        let mut steps = 0_usize;
        loop {
            if let Some(reason) = self.requested_exit() {
                self.terminate(core, reason);
                return;
            }
            if steps == budget {
                trace!(steps, "slice spent, resubmitting");
                let this = Arc::clone(self);
                self.scheduler
                    .execute(Box::new(move || this.run(core, step)));
                return;
            }
            steps += 1;

            let flow = match self.perform(&mut core, step) {
                Ok(flow) => flow,
                Err(reason) => {
                    error!(actor = %self.name, %reason, "handler panicked");
                    self.terminate(core, reason);
                    return;
                }
            };
            // An exit requested while the step ran overrides whatever it returned.
            if let Some(reason) = self.requested_exit() {
                self.terminate(core, reason);
                return;
            }

            let next = match flow.kind {
                FlowKind::Done => Self::pop_frame(&mut core),
                FlowKind::Continue => {
                    if let Some(index) = core
                        .frames
                        .iter()
                        .rposition(|frame| matches!(frame, Frame::Loop(_)))
                    {
                        core.frames.truncate(index + 1);
                    }
                    Self::pop_frame(&mut core)
                }
                FlowKind::AndThen(first, next) => {
                    core.frames.push(Frame::AndThen(next));
                    Some(Step::Run(first))
                }
                FlowKind::Loop(frame) => Some(Step::Iterate(frame)),
                FlowKind::Exit(reason) => {
                    self.terminate(core, reason);
                    return;
                }
                FlowKind::Fail(error) => {
                    if self.offer_exception(&mut core, &error) {
                        Self::pop_frame(&mut core)
                    } else {
                        self.terminate(core, ExitReason::from_error(&error));
                        return;
                    }
                }
                FlowKind::React(receive) => match self.suspend(core, receive) {
                    Suspension::Continue(resumed, step) => {
                        core = resumed;
                        Some(step)
                    }
                    Suspension::Parked => return,
                    Suspension::Exiting(resumed, reason) => {
                        self.terminate(resumed, reason);
                        return;
                    }
                },
            };

            match next {
                Some(next) => step = next,
                None => {
                    self.terminate(core, ExitReason::Normal);
                    return;
                }
            }
        }
    }

    fn requested_exit(&self) -> Option<ExitReason> {
        if !self.exit_requested.load(Ordering::Acquire) {
            return None;
        }
        Some(self.control.lock().pending_exit.clone().unwrap_or_default())
    }

    fn pop_frame(core: &mut Core<S>) -> Option<Step<S>> {
        core.frames.pop().map(|frame| match frame {
            Frame::AndThen(next) => Step::Run(next),
            Frame::Loop(frame) => Step::Iterate(frame),
        })
    }

    /// Runs one step with panics captured as an exit reason.
    fn perform(self: &Arc<Self>, core: &mut Core<S>, step: Step<S>) -> Result<Flow<S>, ExitReason> {
        let mut ctx = Context::new(self, core);
        panic::catch_unwind(AssertUnwindSafe(move || match step {
            Step::Entry => (self.entry)(&mut ctx),
            Step::Run(behavior) => behavior(&mut ctx),
            Step::Iterate(frame) => {
                let proceed = frame
                    .condition
                    .as_ref()
                    .map_or(true, |condition| condition(&mut ctx));
                if proceed {
                    let body = Arc::clone(&frame.body);
                    ctx.core.frames.push(Frame::Loop(frame));
                    body(&mut ctx)
                } else {
                    Flow::done()
                }
            }
            Step::Deliver(body, envelope) => {
                ctx.core.sender = envelope.sender.clone();
                body(&mut ctx, envelope)
            }
            Step::Resume => Flow::done(),
        }))
        .map_err(ExitReason::from_panic)
    }

    fn offer_exception(self: &Arc<Self>, core: &mut Core<S>, error: &anyhow::Error) -> bool {
        let Some(handler) = core.exception_handler.clone() else {
            return false;
        };
        let mut ctx = Context::new(self, core);
        match panic::catch_unwind(AssertUnwindSafe(|| handler(&mut ctx, error))) {
            Ok(accepted) => {
                trace!(accepted, error = %error, "exception handler consulted");
                accepted
            }
            Err(payload) => {
                error!(reason = %ExitReason::from_panic(payload), "exception handler panicked");
                false
            }
        }
    }

    /// Scans the mailbox for `receive` and either continues with the match or parks
    /// the core in a waiter. Scan and registration happen under one mailbox lock.
    fn suspend(self: &Arc<Self>, core: Core<S>, receive: Receive<S, Flow<S>>) -> Suspension<S> {
        let (accepts, mut bodies, timeout) = receive.split();
        let mut control = self.control.lock();
        if let Some(reason) = control.pending_exit.clone() {
            return Suspension::Exiting(core, reason);
        }
        let mut mailbox = self.mailbox.lock();
        if let Some((case, envelope)) = mailbox.take_match(&accepts) {
            return Suspension::Continue(core, Step::Deliver(bodies.swap_remove(case), envelope));
        }
        if timeout == Some(Duration::ZERO) {
            if let Some(case) = timeout_case(&accepts) {
                let envelope = Envelope::new(Timeout, None);
                return Suspension::Continue(core, Step::Deliver(bodies.swap_remove(case), envelope));
            }
            trace!("zero timeout without a timeout case, waiting untimed");
        }

        let timed = timeout.filter(|timeout| !timeout.is_zero());
        control.status = if timed.is_some() {
            Status::TimedSuspended
        } else {
            Status::Suspended
        };
        let this = Arc::clone(self);
        let resume = Box::new(move |wake: Wake, idle: bool| this.resume(core, bodies, wake, idle));
        let lapse = timed.map(|_| {
            let this = Arc::clone(self);
            Box::new(move |generation: u64| this.lapse(generation)) as Lapse
        });
        let generation = mailbox.register(accepts, resume, lapse);
        trace!(generation, status = %control.status, "suspended");
        drop(mailbox);
        drop(control);

        match timed {
            Some(after) => {
                let mailbox_ref = Arc::downgrade(&self.mailbox);
                if let Some(timer) = self.runtime.timers().arm(after, mailbox_ref, generation) {
                    self.mailbox.lock().attach_timer(generation, timer);
                }
            }
            // Parked without a timer, the reactor no longer counts as live work.
            None => self.runtime.work_finished(),
        }
        Suspension::Parked
    }

    fn resume(
        self: Arc<Self>,
        core: Core<S>,
        mut bodies: Vec<Body<S, Flow<S>>>,
        wake: Wake,
        idle: bool,
    ) {
        let step = match wake {
            Wake::Matched(case, envelope) => Step::Deliver(bodies.swap_remove(case), envelope),
            Wake::Interrupted => Step::Resume,
        };
        if idle {
            self.runtime.work_started();
        }
        self.set_status(Status::Runnable);
        let scheduler = self.scheduler.clone();
        scheduler.execute(Box::new(move || self.run(core, step)));
    }

    /// A timed `react` whose timer expired without a `Timeout` case goes on waiting
    /// untimed and gives up its live-work slot.
    fn lapse(&self, generation: u64) {
        {
            let mut control = self.control.lock();
            if control.status == Status::TimedSuspended
                && self.mailbox.waiting_generation() == Some(generation)
            {
                control.status = Status::Suspended;
            }
        }
        self.runtime.work_finished();
    }

    /// Blocks the calling thread for a `receive`, returning the matched case index and
    /// envelope.
    pub(crate) fn block_on(
        self: &Arc<Self>,
        accepts: &[Predicate],
        timeout: Option<Duration>,
    ) -> Result<(usize, Envelope), ActorError> {
        {
            let mut control = self.control.lock();
            if let Some(reason) = control.pending_exit.clone() {
                return Err(ActorError::Interrupted(reason));
            }
            control.status = if timeout.is_some() {
                Status::TimedBlocked
            } else {
                Status::Blocked
            };
        }
        let deadline = timeout.map(|timeout| Instant::now() + timeout);
        let abort = || self.exit_requested.load(Ordering::Acquire);
        let waited = self.mailbox.wait(accepts, deadline, Retrieval::Take, &abort);
        self.set_status(Status::Runnable);
        match waited {
            Waited::Matched(case, envelope) => Ok((case, envelope)),
            Waited::TimedOut => timeout_case(accepts)
                .map(|case| (case, Envelope::new(Timeout, None)))
                .ok_or(ActorError::TimedOut),
            Waited::Aborted => {
                let reason = self.control.lock().pending_exit.clone().unwrap_or_default();
                Err(ActorError::Interrupted(reason))
            }
        }
    }
}

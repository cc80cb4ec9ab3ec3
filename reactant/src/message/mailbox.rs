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

use std::collections::VecDeque;
use std::fmt;
use std::time::Instant;

use parking_lot::{Condvar, Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::common::Predicate;
use crate::message::{Envelope, Timeout};
use crate::traits::{Message, ReplySink};

/// How a suspended continuation is resumed.
pub(crate) enum Wake {
    /// Case `usize` of the waiter's handler set accepted the envelope.
    Matched(usize, Envelope),
    /// The owning reactor was told to exit while suspended.
    Interrupted,
}

/// Resumes a parked continuation. The flag is `true` when the waiter was idle, that
/// is waiting without a pending timer, at the moment it was woken.
pub(crate) type Resume = Box<dyn FnOnce(Wake, bool) + Send>;

/// Called with the waiter's generation once its timer lapses unanswered and it goes
/// on waiting untimed.
pub(crate) type Lapse = Box<dyn FnOnce(u64) + Send>;

/// A suspended event-based continuation waiting for a matching message.
pub(crate) struct Waiter {
    accepts: Vec<Predicate>,
    generation: u64,
    timer: Option<CancellationToken>,
    idle: bool,
    lapse: Option<Lapse>,
    resume: Resume,
}

impl Waiter {
    fn disarm(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }
    }

    fn fire(mut self, case: usize, envelope: Envelope) {
        self.disarm();
        (self.resume)(Wake::Matched(case, envelope), self.idle);
    }

    pub(crate) fn interrupt(mut self) {
        self.disarm();
        (self.resume)(Wake::Interrupted, self.idle);
    }
}

struct Watcher {
    accepts: Predicate,
    notify: Box<dyn FnOnce(Envelope) + Send>,
}

#[derive(Default)]
struct Slots {
    queue: VecDeque<Envelope>,
    waiter: Option<Waiter>,
    watchers: Vec<Watcher>,
    generation: u64,
}

/// Outcome of a blocking wait on the mailbox.
pub(crate) enum Waited {
    Matched(usize, Envelope),
    TimedOut,
    Aborted,
}

/// Whether a blocking wait removes the matched message or leaves it queued.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Retrieval {
    Take,
    Peek,
}

/// FIFO queue of envelopes with selective, predicate-driven retrieval.
///
/// Every operation is linearizable: the queue, the single registered event waiter and
/// the blocking-receive condition all live behind one lock, so a message enqueued
/// concurrently with a scan is either found by the scan or delivered to the waiter
/// registered by it.
pub struct Mailbox {
    slots: Mutex<Slots>,
    arrived: Condvar,
}

/// Holds the mailbox lock so a scan and a waiter registration form one atomic step.
pub(crate) struct MailboxGuard<'a> {
    slots: MutexGuard<'a, Slots>,
}

fn first_accepting(accepts: &[Predicate], message: &dyn Message) -> Option<usize> {
    accepts.iter().position(|accept| accept(message))
}

/// Earliest queued message accepted by any predicate; ties at one position go to the
/// earliest predicate.
fn find(queue: &VecDeque<Envelope>, accepts: &[Predicate]) -> Option<(usize, usize)> {
    queue.iter().enumerate().find_map(|(position, envelope)| {
        first_accepting(accepts, envelope.message()).map(|case| (position, case))
    })
}

impl Mailbox {
    /// Creates an empty mailbox.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(Slots::default()),
            arrived: Condvar::new(),
        }
    }

    /// Appends an envelope.
    ///
    /// If a registered waiter accepts the message it is handed over directly and
    /// the waiter is resumed; otherwise the message joins the back of the queue.
    /// Watchers whose predicate accepts the message receive a copy either way.
    pub fn enqueue(&self, envelope: Envelope) {
        let mut slots = self.slots.lock();

        let mut watched = Vec::new();
        let mut index = 0;
        while index < slots.watchers.len() {
            if (slots.watchers[index].accepts)(envelope.message()) {
                let watcher = slots.watchers.swap_remove(index);
                watched.push((watcher, envelope.clone()));
            } else {
                index += 1;
            }
        }

        let waiting_case = slots
            .waiter
            .as_ref()
            .and_then(|waiter| first_accepting(&waiter.accepts, envelope.message()));
        let handoff = match waiting_case.and_then(|case| slots.waiter.take().map(|w| (w, case))) {
            Some((waiter, case)) => Some((waiter, case, envelope)),
            None => {
                slots.queue.push_back(envelope);
                None
            }
        };
        drop(slots);
        self.arrived.notify_all();

        for (watcher, copy) in watched {
            (watcher.notify)(copy);
        }
        if let Some((waiter, case, envelope)) = handoff {
            trace!(case, "handing message to suspended continuation");
            waiter.fire(case, envelope);
        }
    }

    /// Number of queued messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.lock().queue.len()
    }

    /// Returns `true` if no message is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.lock().queue.is_empty()
    }

    pub(crate) fn lock(&self) -> MailboxGuard<'_> {
        MailboxGuard {
            slots: self.slots.lock(),
        }
    }

    /// Removes the earliest message accepted by `accepts`, if any, in a single scan.
    pub(crate) fn scan_and_remove(&self, accepts: &[Predicate]) -> Option<(usize, Envelope)> {
        self.lock().take_match(accepts)
    }

    /// Fires the timeout of the waiter registered under `generation`.
    ///
    /// A stale generation is ignored. A live waiter without a `Timeout` case drops the
    /// timeout, becomes idle and keeps waiting; its lapse hook runs once the lock is
    /// released.
    pub(crate) fn expire(&self, generation: u64) {
        let mut slots = self.slots.lock();
        let Some(waiter) = slots
            .waiter
            .as_mut()
            .filter(|waiter| waiter.generation == generation)
        else {
            trace!(generation, "stale timeout, discarding");
            return;
        };
        let Some(case) = first_accepting(&waiter.accepts, &Timeout) else {
            waiter.timer = None;
            waiter.idle = true;
            let lapse = waiter.lapse.take();
            drop(slots);
            trace!(generation, "timeout not accepted, waiting untimed");
            if let Some(lapse) = lapse {
                lapse(generation);
            }
            return;
        };
        let Some(waiter) = slots.waiter.take() else {
            return;
        };
        drop(slots);
        trace!(generation, "delivering timeout");
        waiter.fire(case, Envelope::new(Timeout, None));
    }

    /// Generation of the registered waiter, if one is registered.
    pub(crate) fn waiting_generation(&self) -> Option<u64> {
        self.slots.lock().waiter.as_ref().map(|waiter| waiter.generation)
    }

    /// Detaches the registered waiter, disarming its timer.
    pub(crate) fn take_waiter(&self) -> Option<Waiter> {
        let mut waiter = self.slots.lock().waiter.take()?;
        waiter.disarm();
        Some(waiter)
    }

    /// Blocks the calling thread until a message accepted by `accepts` is queued, the
    /// deadline passes, or `abort` reports true. A deadline that has already passed
    /// performs exactly one scan.
    pub(crate) fn wait(
        &self,
        accepts: &[Predicate],
        deadline: Option<Instant>,
        retrieval: Retrieval,
        abort: &dyn Fn() -> bool,
    ) -> Waited {
        let mut slots = self.slots.lock();
        loop {
            if abort() {
                return Waited::Aborted;
            }
            if let Some((position, case)) = find(&slots.queue, accepts) {
                let envelope = match retrieval {
                    Retrieval::Take => slots.queue.remove(position),
                    Retrieval::Peek => slots.queue.get(position).cloned(),
                };
                if let Some(envelope) = envelope {
                    return Waited::Matched(case, envelope);
                }
            }
            match deadline {
                Some(deadline) => {
                    if Instant::now() >= deadline {
                        return Waited::TimedOut;
                    }
                    self.arrived.wait_until(&mut slots, deadline);
                }
                None => self.arrived.wait(&mut slots),
            }
        }
    }

    /// Wakes every thread blocked in [`wait`](Self::wait) so it re-checks its abort check.
    pub(crate) fn wake_all(&self) {
        let _slots = self.slots.lock();
        self.arrived.notify_all();
    }

    /// Calls `notify` with a copy of the first message accepted by `accepts`, now if
    /// one is queued, otherwise when one arrives. Nothing is removed from the queue.
    pub(crate) fn watch(&self, accepts: Predicate, notify: Box<dyn FnOnce(Envelope) + Send>) {
        let mut slots = self.slots.lock();
        let queued = slots
            .queue
            .iter()
            .find(|envelope| accepts(envelope.message()))
            .cloned();
        match queued {
            Some(envelope) => {
                drop(slots);
                notify(envelope);
            }
            None => slots.watchers.push(Watcher { accepts, notify }),
        }
    }
}

impl Default for Mailbox {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Mailbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("Mailbox");
        if let Some(slots) = self.slots.try_lock() {
            out.field("queued", &slots.queue.len())
                .field("waiting", &slots.waiter.is_some());
        }
        out.finish_non_exhaustive()
    }
}

impl ReplySink for Mailbox {
    fn post(&self, envelope: Envelope) {
        self.enqueue(envelope);
    }
}

impl MailboxGuard<'_> {
    /// Removes and returns the earliest accepted message with the index of its case.
    pub(crate) fn take_match(&mut self, accepts: &[Predicate]) -> Option<(usize, Envelope)> {
        let (position, case) = find(&self.slots.queue, accepts)?;
        self.slots.queue.remove(position).map(|envelope| (case, envelope))
    }

    /// Installs the single event waiter and returns the generation identifying it.
    ///
    /// An untimed waiter (`lapse` is `None`) is idle from the start. A timed one turns
    /// idle when its timer lapses without a `Timeout` case to take it.
    pub(crate) fn register(
        &mut self,
        accepts: Vec<Predicate>,
        resume: Resume,
        lapse: Option<Lapse>,
    ) -> u64 {
        self.slots.generation += 1;
        let generation = self.slots.generation;
        let waiter = Waiter {
            accepts,
            generation,
            timer: None,
            idle: lapse.is_none(),
            lapse,
            resume,
        };
        if let Some(mut stale) = self.slots.waiter.replace(waiter) {
            trace!("replacing a stale waiter");
            stale.disarm();
        }
        generation
    }

    /// Associates a timer with the waiter registered under `generation`.
    pub(crate) fn attach_timer(&mut self, generation: u64, timer: CancellationToken) {
        match self
            .slots
            .waiter
            .as_mut()
            .filter(|waiter| waiter.generation == generation)
        {
            Some(waiter) => waiter.timer = Some(timer),
            None => timer.cancel(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;
    use std::time::Duration;

    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct Low(u32);

    #[derive(Clone, Debug, PartialEq)]
    struct High(u32);

    fn accepts<T: Message>() -> Predicate {
        Box::new(|message: &dyn Message| message.is::<T>())
    }

    fn any() -> Predicate {
        Box::new(|_: &dyn Message| true)
    }

    fn payload<T: Message + Clone>(envelope: &Envelope) -> Option<T> {
        envelope.message().downcast_ref::<T>().cloned()
    }

    #[test]
    fn earliest_queued_message_wins() {
        let mailbox = Mailbox::new();
        mailbox.enqueue(Envelope::new(Low(1), None));
        mailbox.enqueue(Envelope::new(High(2), None));

        let (case, envelope) = mailbox
            .scan_and_remove(&[accepts::<High>(), accepts::<Low>()])
            .expect("a queued message matches");
        assert_eq!(case, 1);
        assert_eq!(payload::<Low>(&envelope), Some(Low(1)));
        assert_eq!(mailbox.len(), 1);
    }

    #[test]
    fn earliest_case_wins_for_the_same_message() {
        let mailbox = Mailbox::new();
        mailbox.enqueue(Envelope::new(High(5), None));

        let (case, _) = mailbox
            .scan_and_remove(&[any(), accepts::<High>()])
            .expect("a queued message matches");
        assert_eq!(case, 0);
    }

    #[test]
    fn selective_scan_leaves_other_messages_in_order() {
        let mailbox = Mailbox::new();
        mailbox.enqueue(Envelope::new(Low(1), None));
        mailbox.enqueue(Envelope::new(High(2), None));
        mailbox.enqueue(Envelope::new(Low(3), None));

        let (_, envelope) = mailbox
            .scan_and_remove(&[accepts::<High>()])
            .expect("high is queued");
        assert_eq!(payload::<High>(&envelope), Some(High(2)));

        let (_, first) = mailbox.scan_and_remove(&[any()]).expect("low is queued");
        let (_, second) = mailbox.scan_and_remove(&[any()]).expect("low is queued");
        assert_eq!(payload::<Low>(&first), Some(Low(1)));
        assert_eq!(payload::<Low>(&second), Some(Low(3)));
        assert!(mailbox.is_empty());
    }

    #[test]
    fn waiter_receives_a_matching_arrival_directly() {
        let mailbox = Mailbox::new();
        let (tx, rx) = mpsc::channel();
        mailbox.lock().register(
            vec![accepts::<High>()],
            Box::new(move |wake, _| {
                if let Wake::Matched(case, envelope) = wake {
                    tx.send((case, payload::<High>(&envelope))).ok();
                }
            }),
            None,
        );

        mailbox.enqueue(Envelope::new(Low(1), None));
        assert!(rx.try_recv().is_err());
        assert_eq!(mailbox.len(), 1);

        mailbox.enqueue(Envelope::new(High(9), None));
        assert_eq!(rx.try_recv().ok(), Some((0, Some(High(9)))));
        assert_eq!(mailbox.len(), 1);
    }

    #[test]
    fn expiry_delivers_timeout_only_to_a_timeout_case() {
        let mailbox = Mailbox::new();
        let (tx, rx) = mpsc::channel();
        let generation = mailbox.lock().register(
            vec![accepts::<High>()],
            Box::new(move |_, _| {
                tx.send(()).ok();
            }),
            None,
        );
        mailbox.expire(generation);
        assert!(rx.try_recv().is_err());
        assert_eq!(mailbox.waiting_generation(), Some(generation));

        let (tx, rx) = mpsc::channel();
        let generation = mailbox.lock().register(
            vec![accepts::<High>(), accepts::<Timeout>()],
            Box::new(move |wake, _| {
                if let Wake::Matched(case, envelope) = wake {
                    tx.send((case, envelope.is::<Timeout>())).ok();
                }
            }),
            None,
        );
        mailbox.expire(generation - 1);
        assert!(rx.try_recv().is_err());
        mailbox.expire(generation);
        assert_eq!(rx.try_recv().ok(), Some((1, true)));
    }

    #[test]
    fn interrupting_a_taken_waiter_resumes_it() {
        let mailbox = Mailbox::new();
        let (tx, rx) = mpsc::channel();
        mailbox.lock().register(
            vec![any()],
            Box::new(move |wake, idle| {
                tx.send((matches!(wake, Wake::Interrupted), idle)).ok();
            }),
            None,
        );
        mailbox.take_waiter().expect("a waiter is registered").interrupt();
        assert_eq!(rx.try_recv().ok(), Some((true, true)));
        assert!(mailbox.take_waiter().is_none());
    }

    #[test]
    fn unanswered_expiry_turns_a_timed_waiter_idle() {
        let mailbox = Mailbox::new();
        let (lapsed_tx, lapsed_rx) = mpsc::channel();
        let (woken_tx, woken_rx) = mpsc::channel();
        let generation = mailbox.lock().register(
            vec![accepts::<High>()],
            Box::new(move |_, idle| {
                woken_tx.send(idle).ok();
            }),
            Some(Box::new(move |generation| {
                lapsed_tx.send(generation).ok();
            })),
        );

        mailbox.expire(generation);
        assert_eq!(lapsed_rx.try_recv().ok(), Some(generation));
        mailbox.expire(generation);
        assert!(lapsed_rx.try_recv().is_err());

        mailbox.enqueue(Envelope::new(High(1), None));
        assert_eq!(woken_rx.try_recv().ok(), Some(true));
    }

    #[test]
    fn timed_waiter_woken_before_expiry_is_not_idle() {
        let mailbox = Mailbox::new();
        let (tx, rx) = mpsc::channel();
        let generation = mailbox.lock().register(
            vec![accepts::<High>()],
            Box::new(move |_, idle| {
                tx.send(idle).ok();
            }),
            Some(Box::new(|_| {})),
        );
        mailbox.enqueue(Envelope::new(High(1), None));
        assert_eq!(rx.try_recv().ok(), Some(false));
        mailbox.expire(generation);
        assert_eq!(mailbox.waiting_generation(), None);
    }

    #[test]
    fn elapsed_deadline_scans_once() {
        let mailbox = Mailbox::new();
        mailbox.enqueue(Envelope::new(Low(1), None));
        let now = Instant::now();
        let outcome = mailbox.wait(&[accepts::<High>()], Some(now), Retrieval::Take, &|| false);
        assert!(matches!(outcome, Waited::TimedOut));

        let outcome = mailbox.wait(&[accepts::<Low>()], Some(now), Retrieval::Peek, &|| false);
        assert!(matches!(outcome, Waited::Matched(0, _)));
        assert_eq!(mailbox.len(), 1);
    }

    #[test]
    fn blocking_wait_sees_a_later_arrival() {
        let mailbox = std::sync::Arc::new(Mailbox::new());
        let sender = mailbox.clone();
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            sender.enqueue(Envelope::new(High(4), None));
        });
        let deadline = Instant::now() + Duration::from_secs(5);
        let outcome = mailbox.wait(&[accepts::<High>()], Some(deadline), Retrieval::Take, &|| false);
        handle.join().expect("sender thread");
        match outcome {
            Waited::Matched(_, envelope) => assert_eq!(payload::<High>(&envelope), Some(High(4))),
            _ => panic!("expected a match"),
        }
    }

    #[test]
    fn abort_check_ends_a_blocking_wait() {
        let mailbox = Mailbox::new();
        let outcome = mailbox.wait(&[any()], None, Retrieval::Take, &|| true);
        assert!(matches!(outcome, Waited::Aborted));
    }

    #[test]
    fn watchers_see_queued_and_future_messages_without_consuming() {
        let mailbox = Mailbox::new();
        mailbox.enqueue(Envelope::new(Low(1), None));
        let (tx, rx) = mpsc::channel();
        let early = tx.clone();
        mailbox.watch(
            accepts::<Low>(),
            Box::new(move |envelope| {
                early.send(payload::<Low>(&envelope)).ok();
            }),
        );
        assert_eq!(rx.try_recv().ok(), Some(Some(Low(1))));

        mailbox.watch(
            accepts::<High>(),
            Box::new(move |envelope| {
                tx.send(payload::<Low>(&envelope)).ok();
            }),
        );
        mailbox.enqueue(Envelope::new(High(2), None));
        assert_eq!(rx.try_recv().ok(), Some(None));
        assert_eq!(mailbox.len(), 2);
    }
}

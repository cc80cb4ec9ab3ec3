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

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use acton_ern::Ern;
use parking_lot::{Condvar, Mutex};
use tracing::{debug, error, instrument, trace};

use crate::actor::engine::Step;
use crate::actor::{supervision, Core, Status};
use crate::common::{ActorId, ActorRef, ActorRuntime, SharedBehavior};
use crate::message::{ActorError, ExitReason, Mailbox};
use crate::traits::Scheduler;

/// Lifecycle bookkeeping guarded by one lock. Lock order: `control` before the mailbox.
#[derive(Debug, Default)]
pub(crate) struct Control {
    pub(crate) status: Status,
    pub(crate) trap_exit: bool,
    pub(crate) links: HashSet<ActorId>,
    pub(crate) exit_reason: Option<ExitReason>,
    pub(crate) pending_exit: Option<ExitReason>,
}

/// A reactor: mailbox, lifecycle and the parked core of a typed behavior.
pub(crate) struct Reactor<S> {
    pub(crate) id: ActorId,
    pub(crate) name: Ern,
    pub(crate) runtime: ActorRuntime,
    pub(crate) scheduler: Arc<dyn Scheduler>,
    pub(crate) mailbox: Arc<Mailbox>,
    pub(crate) control: Mutex<Control>,
    pub(crate) terminated: Condvar,
    pub(crate) exit_requested: AtomicBool,
    /// Holds the core while the reactor is `New` or `Terminated`.
    pub(crate) parked: Mutex<Option<Core<S>>>,
    pub(crate) entry: SharedBehavior<S>,
}

/// Type-erased view of a reactor used by handles, links and the registry.
pub(crate) trait Entity: Send + Sync + 'static {
    fn id(&self) -> ActorId;
    fn name(&self) -> &Ern;
    fn runtime(&self) -> &ActorRuntime;
    fn mailbox(&self) -> &Mailbox;
    fn status(&self) -> Status;
    fn exit_reason(&self) -> Option<ExitReason>;
    fn trap_exit(&self) -> bool;
    fn start(self: Arc<Self>);
    fn restart(self: Arc<Self>) -> Result<(), ActorError>;
    fn join(&self, timeout: Option<Duration>) -> Option<ExitReason>;
    fn add_link(&self, peer: ActorId);
    fn remove_link(&self, peer: ActorId);
    fn force_exit(self: Arc<Self>, reason: ExitReason);
}

impl<S: Send + 'static> Reactor<S> {
    pub(crate) fn new(
        name: Ern,
        runtime: ActorRuntime,
        scheduler: Arc<dyn Scheduler>,
        trap_exit: bool,
        core: Core<S>,
        entry: SharedBehavior<S>,
    ) -> Self {
        Self {
            id: ActorId::next(),
            name,
            runtime,
            scheduler,
            mailbox: Arc::new(Mailbox::new()),
            control: Mutex::new(Control {
                trap_exit,
                ..Control::default()
            }),
            terminated: Condvar::new(),
            exit_requested: AtomicBool::new(false),
            parked: Mutex::new(Some(core)),
            entry,
        }
    }

    pub(crate) fn set_status(&self, status: Status) {
        let mut control = self.control.lock();
        if control.status != Status::Terminated {
            control.status = status;
        }
    }

    /// Parks the core and publishes termination: the registry entry is dropped,
    /// waiters are released and the exit propagates over links.
    #[instrument(skip(self, core), fields(actor = %self.id))]
    pub(crate) fn terminate(self: &Arc<Self>, mut core: Core<S>, reason: ExitReason) {
        core.frames.clear();
        core.sender = None;
        *self.parked.lock() = Some(core);
        let links = {
            let mut control = self.control.lock();
            control.status = Status::Terminated;
            control.exit_reason = Some(reason.clone());
            control.pending_exit = None;
            self.exit_requested.store(false, Ordering::Release);
            // Deregistered before a restart can observe `Terminated` and register anew.
            self.runtime.registry().remove(self.id);
            std::mem::take(&mut control.links)
        };
        self.conclude(&reason, links, true);
    }

    fn conclude(self: &Arc<Self>, reason: &ExitReason, links: HashSet<ActorId>, was_running: bool) {
        self.terminated.notify_all();
        if reason.is_normal() {
            debug!(actor = %self.name, "terminated normally");
        } else {
            debug!(actor = %self.name, %reason, "terminated");
        }
        supervision::propagate(&ActorRef::from_entity(self.clone()), reason, links);
        if was_running {
            self.runtime.work_finished();
        }
    }
}

impl<S: Send + 'static> Entity for Reactor<S> {
    fn id(&self) -> ActorId {
        self.id
    }

    fn name(&self) -> &Ern {
        &self.name
    }

    fn runtime(&self) -> &ActorRuntime {
        &self.runtime
    }

    fn mailbox(&self) -> &Mailbox {
        &self.mailbox
    }

    fn status(&self) -> Status {
        self.control.lock().status
    }

    fn exit_reason(&self) -> Option<ExitReason> {
        self.control.lock().exit_reason.clone()
    }

    fn trap_exit(&self) -> bool {
        self.control.lock().trap_exit
    }

    fn start(self: Arc<Self>) {
        {
            let mut control = self.control.lock();
            if control.status != Status::New {
                trace!(actor = %self.id, status = %control.status, "start ignored");
                return;
            }
            control.status = Status::Runnable;
        }
        let Some(core) = self.parked.lock().take() else {
            error!(actor = %self.id, "start found no parked core");
            return;
        };
        debug!(actor = %self.name, "starting");
        self.runtime.work_started();
        let scheduler = self.scheduler.clone();
        scheduler.execute(Box::new(move || self.run(core, Step::Entry)));
    }

    fn restart(self: Arc<Self>) -> Result<(), ActorError> {
        {
            let mut control = self.control.lock();
            if control.status != Status::Terminated {
                return Err(ActorError::InvalidState {
                    id: self.id,
                    status: control.status,
                });
            }
            control.status = Status::New;
            control.exit_reason = None;
        }
        debug!(actor = %self.name, "restarting");
        self.runtime.registry().insert(self.clone());
        self.start();
        Ok(())
    }

    fn join(&self, timeout: Option<Duration>) -> Option<ExitReason> {
        let deadline = timeout.map(|timeout| Instant::now() + timeout);
        let mut control = self.control.lock();
        while control.status != Status::Terminated {
            match deadline {
                Some(deadline) => {
                    if self.terminated.wait_until(&mut control, deadline).timed_out() {
                        break;
                    }
                }
                None => self.terminated.wait(&mut control),
            }
        }
        if control.status == Status::Terminated {
            control.exit_reason.clone()
        } else {
            None
        }
    }

    fn add_link(&self, peer: ActorId) {
        self.control.lock().links.insert(peer);
    }

    fn remove_link(&self, peer: ActorId) {
        self.control.lock().links.remove(&peer);
    }

    fn force_exit(self: Arc<Self>, reason: ExitReason) {
        let unstarted_links = {
            let mut control = self.control.lock();
            match control.status {
                Status::Terminated => return,
                Status::New => {
                    control.status = Status::Terminated;
                    control.exit_reason = Some(reason.clone());
                    self.runtime.registry().remove(self.id);
                    Some(std::mem::take(&mut control.links))
                }
                _ => {
                    if control.pending_exit.is_none() {
                        control.pending_exit = Some(reason.clone());
                    }
                    self.exit_requested.store(true, Ordering::Release);
                    None
                }
            }
        };
        if let Some(links) = unstarted_links {
            self.conclude(&reason, links, false);
            return;
        }
        trace!(actor = %self.id, %reason, "exit requested");
        if let Some(waiter) = self.mailbox.take_waiter() {
            self.set_status(Status::Runnable);
            waiter.interrupt();
        }
        self.mailbox.wake_all();
    }
}

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
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

use lazy_static::lazy_static;
use tracing::{debug, error, trace};

use crate::actor::{supervision, ActorConfig, Context, Flow, ReactorBuilder};
use crate::common::registry::Registry;
use crate::common::runtime_inner::RuntimeInner;
use crate::common::timer::Timers;
use crate::common::{ActorId, ActorRef, Future, Inbox, ReactantConfig, TokioScheduler, CONFIG};
use crate::message::{ActorError, Envelope, ExitReason, ReplyTo};
use crate::traits::{Message, Scheduler};

lazy_static! {
    static ref GLOBAL_RUNTIME: ActorRuntime = ActorRuntime::with_config(CONFIG.clone());
}

/// The runtime context every reactor belongs to.
///
/// An `ActorRuntime` owns the scheduler, the timer service, the registry of live
/// reactors and the live-work counter that drives automatic shutdown. It is cheap to
/// clone; all clones share the same context.
///
/// Obtain one with [`ReactantApp::launch`](crate::prelude::ReactantApp::launch), build
/// one from an explicit [`ReactantConfig`] with [`with_config`](Self::with_config), or
/// use the lazily created [`global`](Self::global) context at the outermost layer of
/// an application.
#[derive(Clone)]
pub struct ActorRuntime(pub(crate) Arc<RuntimeInner>);

impl ActorRuntime {
    /// Creates a runtime context from the process-wide configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(CONFIG.clone())
    }

    /// Creates a runtime context backed by a [`TokioScheduler`] sized by `config`.
    #[must_use]
    pub fn with_config(config: ReactantConfig) -> Self {
        let scheduler: Arc<dyn Scheduler> = Arc::new(TokioScheduler::new(&config));
        Self::with_scheduler(config, scheduler)
    }

    /// Creates a runtime context that runs every reactor on `scheduler`.
    #[must_use]
    pub fn with_scheduler(config: ReactantConfig, scheduler: Arc<dyn Scheduler>) -> Self {
        trace!(?scheduler, "creating runtime context");
        Self(Arc::new(RuntimeInner::new(config, scheduler)))
    }

    /// The shared default context, created on first use.
    #[must_use]
    pub fn global() -> Self {
        GLOBAL_RUNTIME.clone()
    }

    /// The configuration this context was built from.
    #[must_use]
    pub fn config(&self) -> &ReactantConfig {
        &self.0.config
    }

    /// The default scheduler of this context.
    #[must_use]
    pub fn scheduler(&self) -> Arc<dyn Scheduler> {
        self.0.scheduler.clone()
    }

    /// Starts building a reactor called `name` with initial `state`.
    ///
    /// # Errors
    ///
    /// [`ActorError::InvalidName`] when `name` is not a valid ERN root.
    pub fn new_actor<S: Send + 'static>(
        &self,
        name: &str,
        state: S,
    ) -> Result<ReactorBuilder<S>, ActorError> {
        Ok(self.new_actor_with_config(ActorConfig::new(name)?, state))
    }

    /// Starts building a reactor from an explicit [`ActorConfig`].
    #[must_use]
    pub fn new_actor_with_config<S: Send + 'static>(
        &self,
        config: ActorConfig,
        state: S,
    ) -> ReactorBuilder<S> {
        ReactorBuilder::new(self.clone(), config, state)
    }

    /// Builds and starts a reactor in one call.
    ///
    /// # Errors
    ///
    /// [`ActorError::InvalidName`] when `name` is not a valid ERN root.
    pub fn spawn<S, F>(&self, name: &str, state: S, entry: F) -> Result<ActorRef, ActorError>
    where
        S: Send + 'static,
        F: Fn(&mut Context<'_, S>) -> Flow<S> + Send + Sync + 'static,
    {
        Ok(self.new_actor(name, state)?.spawn(entry))
    }

    /// Creates a mailbox for a thread that is not a reactor.
    #[must_use]
    pub fn inbox(&self) -> Inbox {
        Inbox::new()
    }

    /// Runs `computation` on the scheduler and returns a future for its result.
    ///
    /// The computation counts as live work until it finishes. If it panics the panic
    /// is logged and the future is never set.
    pub fn future<T, F>(&self, computation: F) -> Future<T>
    where
        T: Message + Clone,
        F: FnOnce() -> T + Send + 'static,
    {
        let future = Future::new();
        let reply = future.reply_to();
        let runtime = self.clone();
        self.work_started();
        self.0.scheduler.execute(Box::new(move || {
            match panic::catch_unwind(AssertUnwindSafe(computation)) {
                Ok(value) => reply.post(Envelope::new(value, None)),
                Err(payload) => {
                    error!(reason = %ExitReason::from_panic(payload), "future computation panicked");
                }
            }
            runtime.work_finished();
        }));
        future
    }

    /// Links two reactors, typically before either is started.
    pub fn link(&self, a: &ActorRef, b: &ActorRef) {
        supervision::link(a, b);
    }

    /// Removes the link between two reactors.
    pub fn unlink(&self, a: &ActorRef, b: &ActorRef) {
        supervision::unlink(a, b);
    }

    /// Delivers an already boxed message to the reactor registered as `target`.
    ///
    /// This is the inbound entry point transports use. `sender`, when it names a
    /// registered reactor, becomes the reply address.
    ///
    /// # Errors
    ///
    /// [`ActorError::UnknownActor`] when `target` is not registered.
    pub fn send(
        &self,
        target: ActorId,
        message: Box<dyn Message>,
        sender: Option<ActorId>,
    ) -> Result<(), ActorError> {
        let actor = self.find(target).ok_or(ActorError::UnknownActor(target))?;
        let reply_to = sender.and_then(|id| self.find(id)).map(ReplyTo::Actor);
        actor.post(Envelope::from_boxed(message, reply_to));
        Ok(())
    }

    /// Looks up a registered reactor by id.
    #[must_use]
    pub fn find(&self, id: ActorId) -> Option<ActorRef> {
        self.0.registry.get(id)
    }

    /// Publishes `actor` under `name`, replacing any previous holder.
    pub fn register_name(&self, name: &str, actor: &ActorRef) {
        if let Some(previous) = self.0.registry.register_name(name, actor.id()) {
            trace!(name, %previous, "name reassigned");
        }
    }

    /// Withdraws `name`.
    pub fn unregister_name(&self, name: &str) {
        self.0.registry.unregister_name(name);
    }

    /// The reactor published under `name`, if it is still registered.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<ActorRef> {
        self.0.registry.lookup(name).and_then(|id| self.find(id))
    }

    /// Number of registered reactors, including ones not yet started.
    #[must_use]
    pub fn actor_count(&self) -> usize {
        self.0.registry.len()
    }

    /// Reactors that are runnable, blocked or waiting on a timer, plus running future
    /// computations. A reactor parked in an untimed `react` is not counted.
    #[must_use]
    pub fn live_work(&self) -> usize {
        *self.0.live.lock()
    }

    /// Blocks until no work is live or `timeout` passes. Returns `true` on quiescence.
    pub fn await_quiescence(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let poll = Duration::from_millis(self.0.config.timeouts.quiescence_poll_ms.max(1));
        let mut live = self.0.live.lock();
        while *live > 0 {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            self.0.idle.wait_for(&mut live, poll.min(deadline - now));
        }
        true
    }

    /// Stops the scheduler and the timer service. Both come back on next use.
    pub fn shutdown(&self) {
        debug!(live = self.live_work(), "shutting down runtime context");
        self.0.scheduler.shutdown();
        self.0.timers.shutdown();
    }

    pub(crate) fn work_started(&self) {
        let mut live = self.0.live.lock();
        *live += 1;
        trace!(live = *live, "work started");
    }

    /// Decrements live work; at zero the scheduler is told it is quiescent while the
    /// counter lock is still held, so no start can slip in between.
    pub(crate) fn work_finished(&self) {
        let mut live = self.0.live.lock();
        *live = live.saturating_sub(1);
        trace!(live = *live, "work finished");
        if *live == 0 {
            self.0.idle.notify_all();
            self.0.scheduler.quiescent();
        }
    }

    pub(crate) fn timers(&self) -> &Timers {
        &self.0.timers
    }

    pub(crate) fn registry(&self) -> &Registry {
        &self.0.registry
    }
}

impl Default for ActorRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ActorRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActorRuntime")
            .field("actors", &self.actor_count())
            .field("live", &self.live_work())
            .field("scheduler", &self.0.scheduler)
            .finish()
    }
}

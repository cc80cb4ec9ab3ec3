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
use std::sync::Arc;

use tracing::{instrument, trace};

use crate::actor::{ActorConfig, Context, Core, Flow, Reactor};
use crate::common::{ActorRef, ActorRuntime, ExceptionHandler};
use crate::traits::Scheduler;

/// Configures a reactor before its behavior is attached.
///
/// Obtained from [`ActorRuntime::new_actor`](crate::prelude::ActorRuntime::new_actor).
/// [`behavior`](Self::behavior) finishes the build and yields a handle in the
/// `New` state; nothing runs until it is started.
pub struct ReactorBuilder<S> {
    runtime: ActorRuntime,
    config: ActorConfig,
    state: S,
    exception_handler: Option<ExceptionHandler<S>>,
}

impl<S: Send + 'static> ReactorBuilder<S> {
    pub(crate) fn new(runtime: ActorRuntime, config: ActorConfig, state: S) -> Self {
        Self {
            runtime,
            config,
            state,
            exception_handler: None,
        }
    }

    /// Sets whether linked exits arrive as messages.
    #[must_use]
    pub fn trap_exit(mut self, trap: bool) -> Self {
        self.config = self.config.with_trap_exit(trap);
        self
    }

    /// Runs the reactor on `scheduler` instead of the runtime's.
    #[must_use]
    pub fn scheduler(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
        self.config = self.config.with_scheduler(scheduler);
        self
    }

    /// Installs the initial exception handler.
    #[must_use]
    pub fn exception_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&mut Context<'_, S>, &anyhow::Error) -> bool + Send + Sync + 'static,
    {
        self.exception_handler = Some(Arc::new(handler));
        self
    }

    /// Attaches the entry behavior and registers the reactor. The behavior runs on
    /// `start` and again on every `restart`.
    #[instrument(skip_all, fields(name = %self.config.name()))]
    pub fn behavior<F>(self, entry: F) -> ActorRef
    where
        F: Fn(&mut Context<'_, S>) -> Flow<S> + Send + Sync + 'static,
    {
        let scheduler = self
            .config
            .scheduler()
            .cloned()
            .unwrap_or_else(|| self.runtime.scheduler());
        let reactor = Arc::new(Reactor::new(
            self.config.name().clone(),
            self.runtime.clone(),
            scheduler,
            self.config.trap_exit(),
            Core::new(self.state, self.exception_handler),
            Arc::new(entry),
        ));
        trace!(id = %reactor.id, "reactor built");
        self.runtime.registry().insert(reactor.clone());
        ActorRef::from_entity(reactor)
    }

    /// Attaches the entry behavior and starts the reactor.
    pub fn spawn<F>(self, entry: F) -> ActorRef
    where
        F: Fn(&mut Context<'_, S>) -> Flow<S> + Send + Sync + 'static,
    {
        self.behavior(entry).start()
    }
}

impl<S> fmt::Debug for ReactorBuilder<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReactorBuilder")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

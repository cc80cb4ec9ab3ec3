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

use std::sync::Arc;

use acton_ern::Ern;

use crate::common::CONFIG;
use crate::message::ActorError;
use crate::traits::Scheduler;

/// Per-reactor settings applied when the reactor is built.
#[derive(Debug, Clone)]
pub struct ActorConfig {
    name: Ern,
    trap_exit: bool,
    scheduler: Option<Arc<dyn Scheduler>>,
}

impl ActorConfig {
    /// Creates a configuration for a reactor called `name`.
    ///
    /// # Errors
    ///
    /// [`ActorError::InvalidName`] when `name` is not a valid ERN root.
    pub fn new(name: impl Into<String>) -> Result<Self, ActorError> {
        let name = name.into();
        let ern = Ern::with_root(name.clone())
            .map_err(|error| ActorError::InvalidName(format!("{name}: {error:?}")))?;
        Ok(Self {
            name: ern,
            trap_exit: false,
            scheduler: None,
        })
    }

    /// Sets whether linked exits arrive as messages.
    #[must_use]
    pub fn with_trap_exit(mut self, trap: bool) -> Self {
        self.trap_exit = trap;
        self
    }

    /// Runs this reactor on `scheduler` instead of the runtime's.
    #[must_use]
    pub fn with_scheduler(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    /// The reactor's name.
    #[must_use]
    pub fn name(&self) -> &Ern {
        &self.name
    }

    pub(crate) fn trap_exit(&self) -> bool {
        self.trap_exit
    }

    pub(crate) fn scheduler(&self) -> Option<&Arc<dyn Scheduler>> {
        self.scheduler.as_ref()
    }
}

impl Default for ActorConfig {
    fn default() -> Self {
        match Self::new(CONFIG.defaults.actor_name.clone()) {
            Ok(config) => config,
            Err(_) => Self {
                name: Ern::default(),
                trap_exit: false,
                scheduler: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_become_ern_roots() {
        let config = ActorConfig::new("counter").expect("valid name");
        assert!(config.name().to_string().contains("counter"));
        assert!(!config.trap_exit());
        assert!(config.with_trap_exit(true).trap_exit());
    }
}

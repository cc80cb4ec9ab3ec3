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

use std::time::Duration;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

/// Configuration for the reactant runtime.
///
/// Loaded from TOML in XDG-compliant directories; every field has a default, so a
/// file only needs the values it overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReactantConfig {
    /// Worker pool configuration
    pub scheduler: SchedulerConfig,
    /// Timeout configuration
    pub timeouts: TimeoutConfig,
    /// Limits configuration
    pub limits: LimitsConfig,
    /// Behavioral switches
    pub behavior: BehaviorConfig,
    /// Default values
    pub defaults: DefaultsConfig,
}

/// Worker pool configuration for the default scheduler
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Upper bound on pool threads, counting threads parked in blocking receives
    pub worker_threads: usize,
    /// How long an idle pool thread lingers, in milliseconds
    pub keep_alive_ms: u64,
    /// Name given to pool threads
    pub thread_name: String,
}

/// Timeout-related configuration values
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Grace period granted to running tasks when the pool is torn down, in milliseconds
    pub pool_shutdown_ms: u64,
    /// Poll interval used while waiting for quiescence, in milliseconds
    pub quiescence_poll_ms: u64,
}

/// Limits configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Consecutive engine steps a reactor may take before yielding its thread
    pub max_steps_per_slice: usize,
}

/// Behavioral configuration switches
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Tear the worker pool down whenever no reactor or future computation is live
    pub auto_shutdown: bool,
}

/// Default configuration values
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    /// Name used for reactors built without one
    pub actor_name: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            worker_threads: 256,
            keep_alive_ms: 10_000,
            thread_name: "reactant-worker".to_string(),
        }
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            pool_shutdown_ms: 1_000,
            quiescence_poll_ms: 10,
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_steps_per_slice: 64,
        }
    }
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            auto_shutdown: true,
        }
    }
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            actor_name: "reactor".to_string(),
        }
    }
}

impl ReactantConfig {
    /// Grace period for pool teardown as a `Duration`
    #[must_use]
    pub const fn pool_shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.timeouts.pool_shutdown_ms)
    }

    /// Idle lifetime of pool threads as a `Duration`
    #[must_use]
    pub const fn keep_alive(&self) -> Duration {
        Duration::from_millis(self.scheduler.keep_alive_ms)
    }

    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns the TOML deserialization error for malformed input.
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Load configuration from XDG-compliant locations
    ///
    /// Looks for `reactant/config.toml` under `$XDG_CONFIG_HOME` and the XDG config
    /// dirs. A missing file yields the defaults; an unreadable or malformed file is
    /// logged and also yields the defaults.
    #[must_use]
    pub fn load() -> Self {
        use tracing::{error, info};

        let xdg_dirs = match xdg::BaseDirectories::with_prefix("reactant") {
            Ok(dirs) => dirs,
            Err(e) => {
                error!("Failed to initialize XDG directories: {}", e);
                return Self::default();
            }
        };

        let Some(path) = xdg_dirs.find_config_file("config.toml") else {
            info!("No configuration file found, using defaults");
            return Self::default();
        };

        info!("Loading configuration from: {}", path.display());
        match std::fs::read_to_string(&path) {
            Ok(config_str) => match Self::from_toml_str(&config_str) {
                Ok(config) => config,
                Err(e) => {
                    error!("Failed to parse configuration file {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                error!("Failed to read configuration file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }
}

lazy_static! {
    /// Process-wide configuration loaded from XDG-compliant locations
    pub static ref CONFIG: ReactantConfig = ReactantConfig::load();
}

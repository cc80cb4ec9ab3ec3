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

use tracing::trace;

use crate::common::{ActorRuntime, ReactantConfig};

/// Entry point for bootstrapping a runtime context.
///
/// ```rust,ignore
/// use reactant::prelude::*;
///
/// let runtime = ReactantApp::launch();
/// let echo = runtime.spawn("echo", (), |ctx| {
///     ctx.loop_forever(|ctx| ctx.react(|r| r.case(|ctx, text: String| {
///         ctx.reply(text);
///         Flow::done()
///     })))
/// })?;
/// let inbox = runtime.inbox();
/// echo.send_from("hello".to_string(), inbox.reply_to());
/// assert_eq!(inbox.receive::<String>(), "hello");
/// ```
#[derive(Default, Debug, Clone)]
pub struct ReactantApp;

impl ReactantApp {
    /// Loads the XDG configuration and creates a runtime context from it.
    #[must_use]
    pub fn launch() -> ActorRuntime {
        trace!("Starting reactant runtime initialization");
        let config = ReactantConfig::load();
        trace!("Configuration loaded: {:?}", config);
        ActorRuntime::with_config(config)
    }

    /// Creates a runtime context from an explicit configuration.
    #[must_use]
    pub fn launch_with_config(config: ReactantConfig) -> ActorRuntime {
        trace!("Starting reactant runtime initialization with explicit configuration");
        ActorRuntime::with_config(config)
    }
}

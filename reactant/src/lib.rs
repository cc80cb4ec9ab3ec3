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

#![forbid(unsafe_code)]
#![forbid(missing_docs)]

//! # Reactant
//!
//! An actor runtime in which many lightweight reactors share a bounded pool of
//! worker threads. A reactor owns private state and a mailbox, and reacts to messages
//! through selective receive: an ordered set of typed cases, the earliest accepting
//! one winning.
//!
//! ## Key Concepts
//!
//! - **Reactors (`ActorRef`)**: Handles to running actors. Send messages, start and
//!   restart them, ask for replies, join them.
//! - **Behaviors (`Flow`, `Context`)**: A behavior returns a `Flow` describing what
//!   comes next. `react` suspends without holding a thread; `receive` blocks it.
//!   `loop_forever`, `loop_while` and `and_then` compose behaviors on a
//!   continuation stack owned by the reactor.
//! - **Selective receive (`Receive`)**: Ordered handler cases with optional guards
//!   and a timeout delivered as the `Timeout` message.
//! - **Supervision**: Links propagate abnormal exits; reactors that trap exits get
//!   an `Exit` message instead and may restart the failed peer.
//! - **Futures (`Future`)**: Write-once reply cells built on the same mailbox
//!   machinery, usable from plain threads and from inside reactors.
//! - **Runtime (`ActorRuntime`)**: Owns the scheduler, the timers and the live-work
//!   counter; the default scheduler releases its threads once everything is done.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use reactant::prelude::*;
//!
//! #[reactant_message]
//! struct Ping(u32);
//!
//! #[reactant_message]
//! struct Pong(u32);
//!
//! let runtime = ReactantApp::launch();
//! let ponger = runtime.spawn("ponger", 0_u32, |ctx| {
//!     ctx.loop_forever(|ctx| {
//!         ctx.react(|r| {
//!             r.case(|ctx, Ping(n): Ping| {
//!                 *ctx.state_mut() += 1;
//!                 ctx.reply(Pong(n));
//!                 Flow::done()
//!             })
//!         })
//!     })
//! })?;
//! let pong: Option<Pong> = ponger.ask_within(Ping(7), Duration::from_secs(1));
//! ```

/// Runtime context, handles, futures and the default scheduler.
pub(crate) mod common;

/// Reactors, their lifecycle and the continuation engine.
pub(crate) mod actor;

/// Mailboxes, envelopes, handler sets and built-in messages.
pub(crate) mod message;

/// Core traits: messages, reply sinks, schedulers and transports.
pub(crate) mod traits;

/// A prelude module for conveniently importing the most commonly used items.
///
/// # Re-exports
///
/// ## Macros (from `reactant-macro`)
/// *   [`reactant_macro::reactant_message`]: Attribute macro for defining messages.
/// *   [`reactant_macro::reactant_state`]: Attribute macro for defining reactor state.
///
/// ## External Crates
/// *   [`acton_ern::*`](https://docs.rs/acton-ern): Resource names used for reactors.
///
/// ## Core Types
/// *   [`crate::actor::Context`]: The running reactor as seen by its behaviors.
/// *   [`crate::actor::Flow`]: What a behavior asks the engine to do next.
/// *   [`crate::actor::ReactorBuilder`]: Configures a reactor before it is started.
/// *   [`crate::common::ActorRef`]: Handle for interacting with a reactor.
/// *   [`crate::common::ActorRuntime`]: The runtime context reactors belong to.
/// *   [`crate::common::Future`]: Write-once reply cell.
/// *   [`crate::common::Inbox`]: Mailbox for threads that are not reactors.
/// *   [`crate::message::Receive`]: Ordered selective-receive handler set.
/// *   [`crate::message::Exit`] and [`crate::message::Timeout`]: Built-in messages.
/// *   [`crate::traits::Message`]: Marker trait for everything a mailbox can hold.
/// *   [`crate::traits::Scheduler`]: The seam for plugging in another executor.
/// *   [`crate::traits::Transport`]: The seam for delivering across processes.
pub mod prelude {
    // Macros from reactant-macro
    pub use reactant_macro::*;

    // External crate re-exports
    pub use acton_ern::*;

    // Core types
    pub use crate::actor::{ActorConfig, Context, Flow, ReactorBuilder, Status};
    pub use crate::common::config::{
        BehaviorConfig, DefaultsConfig, LimitsConfig, SchedulerConfig, TimeoutConfig,
    };
    pub use crate::common::{
        ActorId, ActorRef, ActorRuntime, ExceptionHandler, Future, FutureId, Inbox,
        LocalTransport, ReactantApp, ReactantConfig, RemoteRef, Resolved, Task, TokioScheduler,
        CONFIG,
    };
    pub use crate::message::{
        ActorError, Channel, ChannelId, ChannelMessage, Envelope, Exit, ExitReason, Mailbox,
        Receive, ReplyTo, Timeout,
    };
    pub use crate::traits::{Message, ReplySink, Scheduler, Transport};
}

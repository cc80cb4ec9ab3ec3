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

//! Links between reactors and exit propagation.
//!
//! A link is a symmetric pair of id entries, one in each reactor's control block.
//! When a reactor terminates abnormally every linked peer either receives an
//! [`Exit`] message (if it traps exits) or is itself told to exit with the same
//! reason. A normal termination only drops the links.

use std::collections::HashSet;

use tracing::{debug, trace};

use crate::actor::Status;
use crate::common::{ActorId, ActorRef};
use crate::message::{Envelope, Exit, ExitReason, ReplyTo};

pub(crate) fn link(a: &ActorRef, b: &ActorRef) {
    if a.id() == b.id() {
        trace!(actor = %a.id(), "ignoring self-link");
        return;
    }
    a.entity.add_link(b.id());
    b.entity.add_link(a.id());
    trace!(a = %a.id(), b = %b.id(), "linked");
    settle(a, b);
    settle(b, a);
}

pub(crate) fn unlink(a: &ActorRef, b: &ActorRef) {
    a.entity.remove_link(b.id());
    b.entity.remove_link(a.id());
    trace!(a = %a.id(), b = %b.id(), "unlinked");
}

/// Applies the exit rule at once when `dead` had already terminated before the link
/// to `live` was made.
fn settle(dead: &ActorRef, live: &ActorRef) {
    if dead.status() != Status::Terminated {
        return;
    }
    unlink(dead, live);
    if let Some(reason) = dead.exit_reason() {
        notify(dead, live, &reason);
    }
}

/// Delivers the consequences of `origin` terminating with `reason` to its `peers`.
pub(crate) fn propagate(origin: &ActorRef, reason: &ExitReason, peers: HashSet<ActorId>) {
    let registry = origin.runtime().registry();
    for peer_id in peers {
        let Some(peer) = registry.get(peer_id) else {
            trace!(peer = %peer_id, "linked peer already gone");
            continue;
        };
        peer.entity.remove_link(origin.id());
        notify(origin, &peer, reason);
    }
}

fn notify(origin: &ActorRef, peer: &ActorRef, reason: &ExitReason) {
    if reason.is_normal() {
        return;
    }
    if peer.entity.trap_exit() {
        debug!(from = %origin.id(), to = %peer.id(), %reason, "delivering exit notification");
        peer.post(Envelope::new(
            Exit::new(origin.id(), reason.clone()),
            Some(ReplyTo::Actor(origin.clone())),
        ));
    } else {
        debug!(from = %origin.id(), to = %peer.id(), %reason, "propagating exit");
        peer.entity.clone().force_exit(reason.clone());
    }
}

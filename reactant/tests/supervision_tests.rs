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
use std::thread;
use std::time::Duration;

use reactant::prelude::*;

use crate::setup::messages::{Crash, Ping, Pong, Stop};
use crate::setup::{eventually, initialize_tracing, WAIT};

mod setup;

fn runtime() -> ActorRuntime {
    ActorRuntime::with_config(ReactantConfig::default())
}

/// A worker that exits with the reason carried by `Crash`, and answers pings with a
/// running count kept in its state.
fn spawn_worker(runtime: &ActorRuntime, name: &str) -> anyhow::Result<ActorRef> {
    Ok(runtime.spawn(name, 0_u32, |ctx| {
        ctx.loop_forever(|ctx| {
            ctx.react(|r| {
                r.case(|ctx, Ping(_): Ping| {
                    *ctx.state_mut() += 1;
                    ctx.reply(Pong(*ctx.state()));
                    Flow::done()
                })
                .case(|_, Crash(why): Crash| Flow::exit(why))
                .case(|_, _: Stop| Flow::exit("normal"))
            })
        })
    })?)
}

/// A reactor that waits for `Stop` without trapping exits.
fn spawn_bystander(runtime: &ActorRuntime, name: &str) -> anyhow::Result<ActorRef> {
    Ok(runtime.spawn(name, (), |ctx| {
        ctx.react(|r| r.case(|_, _: Stop| Flow::done()))
    })?)
}

/// An abnormal exit takes non-trapping linked peers down with the same reason.
#[test]
fn test_abnormal_exit_propagates() -> anyhow::Result<()> {
    initialize_tracing();
    let runtime = runtime();
    let worker = spawn_worker(&runtime, "worker")?;
    let buddy = spawn_bystander(&runtime, "buddy")?;
    runtime.link(&worker, &buddy);

    worker.send(Crash("boom".to_string()));
    assert_eq!(worker.join(WAIT), Some(ExitReason::Custom("boom".to_string())));
    assert_eq!(buddy.join(WAIT), Some(ExitReason::Custom("boom".to_string())));
    Ok(())
}

/// Exits propagate transitively along a chain of links.
#[test]
fn test_exit_propagates_along_chain() -> anyhow::Result<()> {
    initialize_tracing();
    let runtime = runtime();
    let first = spawn_worker(&runtime, "first")?;
    let second = spawn_bystander(&runtime, "second")?;
    let third = spawn_bystander(&runtime, "third")?;
    runtime.link(&first, &second);
    runtime.link(&second, &third);

    first.send(Crash("cascade".to_string()));
    let reason = Some(ExitReason::Custom("cascade".to_string()));
    assert_eq!(third.join(WAIT), reason);
    assert_eq!(second.join(WAIT), reason);
    Ok(())
}

/// A normal exit only dissolves the link.
#[test]
fn test_normal_exit_does_not_propagate() -> anyhow::Result<()> {
    initialize_tracing();
    let runtime = runtime();
    let worker = spawn_worker(&runtime, "worker")?;
    let buddy = spawn_bystander(&runtime, "buddy")?;
    runtime.link(&worker, &buddy);

    worker.send(Stop);
    assert_eq!(worker.join(WAIT), Some(ExitReason::Normal));
    thread::sleep(Duration::from_millis(30));
    assert!(buddy.status().is_alive());

    buddy.send(Stop);
    assert_eq!(buddy.join(WAIT), Some(ExitReason::Normal));
    Ok(())
}

/// Unlinked reactors are unaffected by each other's exits.
#[test]
fn test_unlink_stops_propagation() -> anyhow::Result<()> {
    initialize_tracing();
    let runtime = runtime();
    let worker = spawn_worker(&runtime, "worker")?;
    let buddy = spawn_bystander(&runtime, "buddy")?;
    runtime.link(&worker, &buddy);
    runtime.unlink(&buddy, &worker);

    worker.send(Crash("lonely".to_string()));
    assert_eq!(worker.join(WAIT), Some(ExitReason::Custom("lonely".to_string())));
    thread::sleep(Duration::from_millis(30));
    assert!(buddy.status().is_alive());

    buddy.send(Stop);
    assert_eq!(buddy.join(WAIT), Some(ExitReason::Normal));
    Ok(())
}

/// A supervisor that traps exits is told about the failure and can restart the
/// failed peer, which resumes with the state it had.
#[test]
fn test_trapping_supervisor_restarts_worker() -> anyhow::Result<()> {
    initialize_tracing();
    let runtime = runtime();
    let collector = runtime.inbox();
    let report = collector.reply_to();

    let worker = spawn_worker(&runtime, "worker")?;
    let supervisor = runtime
        .new_actor("supervisor", ())?
        .trap_exit(true)
        .spawn(move |ctx| {
            let report = report.clone();
            ctx.loop_forever(move |ctx| {
                let report = report.clone();
                ctx.react(move |r| {
                    r.on_exit(move |ctx, exit| {
                        report.send(exit);
                        if let Some(peer) = ctx.sender().and_then(ReplyTo::actor) {
                            if let Err(error) = peer.restart() {
                                return Flow::fail(error);
                            }
                        }
                        Flow::done()
                    })
                    .case(|_, _: Stop| Flow::exit("normal"))
                })
            })
        });
    runtime.link(&supervisor, &worker);

    assert_eq!(worker.ask_within::<Pong>(Ping(0), WAIT), Some(Pong(1)));
    worker.send(Crash("boom".to_string()));

    let exit = collector.receive_within::<Exit>(WAIT).expect("exit notification");
    assert_eq!(exit.from, worker.id());
    assert_eq!(exit.reason, ExitReason::Custom("boom".to_string()));
    assert!(supervisor.status().is_alive());

    assert_eq!(worker.ask_within::<Pong>(Ping(0), WAIT), Some(Pong(2)));
    assert!(worker.status().is_alive());

    worker.send(Stop);
    supervisor.send(Stop);
    assert_eq!(worker.join(WAIT), Some(ExitReason::Normal));
    assert_eq!(supervisor.join(WAIT), Some(ExitReason::Normal));
    Ok(())
}

/// Exit trapping can be switched on from inside the behavior.
#[test]
fn test_trap_exit_set_at_runtime() -> anyhow::Result<()> {
    initialize_tracing();
    let runtime = runtime();
    let watcher = runtime.spawn("watcher", (), |ctx| {
        ctx.set_trap_exit(true);
        ctx.react(|r| {
            r.on_exit(|ctx, exit| {
                assert!(ctx.trap_exit());
                Flow::exit(format!("saw {}", exit.reason))
            })
        })
    })?;
    assert!(eventually(WAIT, || watcher.status() == Status::Suspended));
    let worker = spawn_worker(&runtime, "worker")?;
    runtime.link(&watcher, &worker);

    worker.send(Crash("oops".to_string()));
    assert_eq!(watcher.join(WAIT), Some(ExitReason::Custom("saw oops".to_string())));
    Ok(())
}

/// A reactor blocked in `receive` is interrupted by a linked exit and terminates
/// with the propagated reason.
#[test]
fn test_blocked_reactor_is_interrupted() -> anyhow::Result<()> {
    initialize_tracing();
    let runtime = runtime();
    let blocked = runtime.spawn("blocked", (), |ctx| {
        match ctx.receive(|r| r.case(|_, _: Stop| ())) {
            Ok(()) => Flow::done(),
            Err(error) => Flow::fail(error),
        }
    })?;
    assert!(eventually(WAIT, || blocked.status() == Status::Blocked));
    let worker = spawn_worker(&runtime, "worker")?;
    runtime.link(&blocked, &worker);

    worker.send(Crash("wake up".to_string()));
    assert_eq!(blocked.join(WAIT), Some(ExitReason::Custom("wake up".to_string())));
    Ok(())
}

/// Linking to a reactor that already terminated abnormally applies the exit at once.
#[test]
fn test_link_to_terminated_reactor() -> anyhow::Result<()> {
    initialize_tracing();
    let runtime = runtime();
    let worker = spawn_worker(&runtime, "worker")?;
    worker.send(Crash("gone".to_string()));
    assert_eq!(worker.join(WAIT), Some(ExitReason::Custom("gone".to_string())));

    let late = spawn_bystander(&runtime, "late")?;
    runtime.link(&late, &worker);
    assert_eq!(late.join(WAIT), Some(ExitReason::Custom("gone".to_string())));
    Ok(())
}

/// Reactors linked before they start are still covered, and one that never started
/// is terminated without running.
#[test]
fn test_links_between_unstarted_reactors() -> anyhow::Result<()> {
    initialize_tracing();
    let runtime = runtime();
    let worker = runtime.new_actor("worker", ())?.behavior(|ctx| {
        ctx.react(|r| r.case(|_, Crash(why): Crash| Flow::exit(why)))
    });
    let dormant = runtime
        .new_actor("dormant", ())?
        .behavior(|_| Flow::exit("should never run"));
    runtime.link(&worker, &dormant);

    worker.start();
    worker.send(Crash("early".to_string()));
    assert_eq!(worker.join(WAIT), Some(ExitReason::Custom("early".to_string())));
    assert_eq!(dormant.join(WAIT), Some(ExitReason::Custom("early".to_string())));
    assert!(runtime.await_quiescence(WAIT));
    assert_eq!(runtime.live_work(), 0);
    Ok(())
}

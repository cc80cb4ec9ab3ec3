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

use crate::setup::messages::{Crash, Log, Ping, Pong, Report, Stop, Tally, Urgent};
use crate::setup::{eventually, initialize_tracing, WAIT};

mod setup;

fn runtime() -> ActorRuntime {
    ActorRuntime::with_config(ReactantConfig::default())
}

/// `loop_while` checks its condition before each iteration, and `and_then` runs its
/// continuation once the loop is over.
#[test]
fn test_loop_while_then_continuation() -> anyhow::Result<()> {
    initialize_tracing();
    let runtime = runtime();
    let collector = runtime.inbox();
    let report = collector.reply_to();

    let summer = runtime
        .new_actor("summer", Vec::<u32>::new())?
        .behavior(move |ctx| {
            let report = report.clone();
            ctx.and_then(
                |ctx| {
                    ctx.loop_while(
                        |ctx| ctx.state().len() < 3,
                        |ctx| {
                            ctx.react(|r| {
                                r.case(|ctx, Ping(n): Ping| {
                                    ctx.state_mut().push(n);
                                    Flow::done()
                                })
                            })
                        },
                    )
                },
                move |ctx| {
                    report.send(Tally(ctx.state().clone()));
                    Flow::done()
                },
            )
        });
    for n in 1..=4 {
        summer.send(Ping(n));
    }
    summer.start();

    assert_eq!(collector.receive_within::<Tally>(WAIT), Some(Tally(vec![1, 2, 3])));
    assert_eq!(summer.join(WAIT), Some(ExitReason::Normal));
    // The fourth ping was never asked for.
    assert_eq!(summer.mailbox_size(), 1);
    Ok(())
}

/// `continue_loop` skips the rest of the iteration, including pending `and_then`
/// continuations inside it.
#[test]
fn test_continue_skips_rest_of_iteration() -> anyhow::Result<()> {
    initialize_tracing();
    let runtime = runtime();
    let collector = runtime.inbox();
    let report = collector.reply_to();

    let evens = runtime.spawn("evens", 0_u32, move |ctx| {
        let report = report.clone();
        ctx.loop_forever(move |ctx| {
            let report = report.clone();
            ctx.and_then(
                |ctx| {
                    ctx.react(|r| {
                        r.case(|ctx, Ping(n): Ping| {
                            if n % 2 == 1 {
                                Flow::continue_loop()
                            } else {
                                *ctx.state_mut() = n;
                                Flow::done()
                            }
                        })
                        .case(|_, _: Stop| Flow::exit("normal"))
                    })
                },
                move |ctx| {
                    report.send(Pong(*ctx.state()));
                    Flow::done()
                },
            )
        })
    })?;
    for n in 1..=4 {
        evens.send(Ping(n));
    }
    evens.send(Stop);

    assert_eq!(evens.join(WAIT), Some(ExitReason::Normal));
    assert_eq!(collector.receive_within::<Pong>(WAIT), Some(Pong(2)));
    assert_eq!(collector.receive_within::<Pong>(WAIT), Some(Pong(4)));
    assert!(collector.is_empty());
    Ok(())
}

/// A zero timeout checks the mailbox once: urgent messages are served first, and
/// only when none is queued does the reactor fall back to ordinary ones.
#[test]
fn test_zero_timeout_gives_priority_to_urgent_messages() -> anyhow::Result<()> {
    initialize_tracing();
    let runtime = runtime();
    let collector = runtime.inbox();
    let report = collector.reply_to();

    let prioritizer = runtime
        .new_actor("prioritizer", Vec::<u32>::new())?
        .behavior(move |ctx| {
            let report = report.clone();
            ctx.and_then(
                |ctx| {
                    ctx.loop_while(
                        |ctx| ctx.state().len() < 4,
                        |ctx| {
                            ctx.react_within(Duration::ZERO, |r| {
                                r.case(|ctx, Urgent(n): Urgent| {
                                    ctx.state_mut().push(n);
                                    Flow::done()
                                })
                                .on_timeout(|ctx| {
                                    ctx.react(|r| {
                                        r.case(|ctx, Ping(n): Ping| {
                                            ctx.state_mut().push(n);
                                            Flow::done()
                                        })
                                    })
                                })
                            })
                        },
                    )
                },
                move |ctx| {
                    report.send(Tally(ctx.state().clone()));
                    Flow::done()
                },
            )
        });
    prioritizer.send(Ping(1));
    prioritizer.send(Ping(2));
    prioritizer.send(Urgent(10));
    prioritizer.send(Ping(3));
    prioritizer.send(Urgent(20));
    prioritizer.start();

    assert_eq!(
        collector.receive_within::<Tally>(WAIT),
        Some(Tally(vec![10, 20, 1, 2]))
    );
    assert_eq!(prioritizer.join(WAIT), Some(ExitReason::Normal));
    Ok(())
}

/// A zero timeout without a `Timeout` case degrades to an untimed wait.
#[test]
fn test_zero_timeout_without_timeout_case_waits() -> anyhow::Result<()> {
    initialize_tracing();
    let runtime = runtime();
    let waiter = runtime.spawn("waiter", (), |ctx| {
        ctx.react_within(Duration::ZERO, |r| {
            r.case(|ctx, Ping(n): Ping| {
                ctx.reply(Pong(n));
                Flow::done()
            })
        })
    })?;

    assert!(eventually(WAIT, || waiter.status() == Status::Suspended));
    assert_eq!(waiter.ask_within::<Pong>(Ping(6), WAIT), Some(Pong(6)));
    assert_eq!(waiter.join(WAIT), Some(ExitReason::Normal));
    Ok(())
}

/// When nothing arrives in time the `Timeout` case runs.
#[test]
fn test_react_within_delivers_timeout() -> anyhow::Result<()> {
    initialize_tracing();
    let runtime = runtime();
    let collector = runtime.inbox();
    let report = collector.reply_to();

    let sleeper = runtime.spawn("sleeper", (), move |ctx| {
        let report = report.clone();
        ctx.react_within(Duration::from_millis(30), move |r| {
            r.case(|_, _: Ping| Flow::exit("pinged"))
                .on_timeout(move |_| {
                    report.send(Timeout);
                    Flow::done()
                })
        })
    })?;

    assert_eq!(collector.receive_within::<Timeout>(WAIT), Some(Timeout));
    assert_eq!(sleeper.join(WAIT), Some(ExitReason::Normal));
    Ok(())
}

/// A message that arrives before the deadline wins, and the timer is dropped.
#[test]
fn test_message_beats_timer() -> anyhow::Result<()> {
    initialize_tracing();
    let runtime = runtime();
    let quick = runtime.spawn("quick", (), |ctx| {
        ctx.react_within(Duration::from_secs(30), |r| {
            r.case(|ctx, Ping(n): Ping| {
                ctx.reply(Pong(n));
                Flow::done()
            })
            .on_timeout(|_| Flow::exit("timed out"))
        })
    })?;

    assert_eq!(quick.ask_within::<Pong>(Ping(3), WAIT), Some(Pong(3)));
    assert_eq!(quick.join(WAIT), Some(ExitReason::Normal));
    Ok(())
}

/// A timer firing for a handler set without a `Timeout` case is ignored and the
/// reactor keeps waiting for real messages, now without a deadline.
#[test]
fn test_unhandled_timeout_keeps_waiting() -> anyhow::Result<()> {
    initialize_tracing();
    let runtime = runtime();
    let patient = runtime.spawn("patient", (), |ctx| {
        ctx.react_within(Duration::from_millis(150), |r| {
            r.case(|ctx, Ping(n): Ping| {
                ctx.reply(Pong(n));
                Flow::done()
            })
        })
    })?;

    assert!(eventually(WAIT, || patient.status() == Status::TimedSuspended));
    assert!(eventually(WAIT, || patient.status() == Status::Suspended));
    thread::sleep(Duration::from_millis(20));
    assert_eq!(patient.status(), Status::Suspended);
    assert_eq!(patient.ask_within::<Pong>(Ping(5), WAIT), Some(Pong(5)));
    assert_eq!(patient.join(WAIT), Some(ExitReason::Normal));
    Ok(())
}

/// An exception handler that accepts an error lets the reactor carry on where it was.
#[test]
fn test_exception_handler_accepts_errors() -> anyhow::Result<()> {
    initialize_tracing();
    let runtime = runtime();
    let resilient = runtime
        .new_actor("resilient", Vec::<String>::new())?
        .exception_handler(|ctx, error| {
            ctx.state_mut().push(error.to_string());
            true
        })
        .spawn(|ctx| {
            ctx.loop_forever(|ctx| {
                ctx.react(|r| {
                    r.try_case(|_, Crash(why): Crash| Err(anyhow::anyhow!(why)))
                        .case(|ctx, _: Report| {
                            ctx.reply(Log(ctx.state().clone()));
                            Flow::done()
                        })
                        .case(|_, _: Stop| Flow::exit("normal"))
                })
            })
        });

    resilient.send(Crash("first".to_string()));
    resilient.send(Crash("second".to_string()));
    assert_eq!(
        resilient.ask_within::<Log>(Report, WAIT),
        Some(Log(vec!["first".to_string(), "second".to_string()]))
    );
    assert!(resilient.status().is_alive());

    resilient.send(Stop);
    assert_eq!(resilient.join(WAIT), Some(ExitReason::Normal));
    Ok(())
}

/// A handler installed from inside the behavior works the same way, and clearing it
/// makes the next error fatal.
#[test]
fn test_exception_handler_set_and_cleared_at_runtime() -> anyhow::Result<()> {
    initialize_tracing();
    let runtime = runtime();
    let moody = runtime.spawn("moody", (), |ctx| {
        ctx.set_exception_handler(|_, _| true);
        ctx.loop_forever(|ctx| {
            ctx.react(|r| {
                r.case(|_, Crash(why): Crash| Flow::fail(anyhow::anyhow!(why)))
                    .case(|ctx, _: Stop| {
                        ctx.clear_exception_handler();
                        Flow::done()
                    })
            })
        })
    })?;

    moody.send(Crash("shrugged off".to_string()));
    moody.send(Stop);
    moody.send(Crash("fatal".to_string()));
    assert_eq!(
        moody.join(WAIT),
        Some(ExitReason::Error("fatal".to_string()))
    );
    Ok(())
}

/// Without an accepting handler an error terminates the reactor with that error.
#[test]
fn test_unhandled_error_terminates() -> anyhow::Result<()> {
    initialize_tracing();
    let runtime = runtime();
    let strict = runtime
        .new_actor("strict", ())?
        .exception_handler(|_, _| false)
        .spawn(|ctx| {
            ctx.react(|r| r.try_case(|_, Crash(why): Crash| Err(anyhow::anyhow!(why))))
        });
    let bare = runtime.spawn("bare", (), |ctx| {
        ctx.react(|r| r.case(|_, Crash(why): Crash| Flow::fail(anyhow::anyhow!(why))))
    })?;

    strict.send(Crash("kaboom".to_string()));
    bare.send(Crash("splat".to_string()));
    assert_eq!(strict.join(WAIT), Some(ExitReason::Error("kaboom".to_string())));
    assert_eq!(bare.join(WAIT), Some(ExitReason::Error("splat".to_string())));
    Ok(())
}

/// A panicking handler terminates only its own reactor.
#[test]
fn test_panic_becomes_exit_reason() -> anyhow::Result<()> {
    initialize_tracing();
    let runtime = runtime();
    let fragile = runtime.spawn("fragile", (), |ctx| {
        ctx.react(|r| r.case(|_, _: Crash| panic!("handler exploded")))
    })?;
    let bystander = runtime.spawn("bystander", (), |ctx| {
        ctx.react(|r| {
            r.case(|ctx, Ping(n): Ping| {
                ctx.reply(Pong(n));
                Flow::done()
            })
        })
    })?;

    fragile.send(Crash(String::new()));
    assert_eq!(
        fragile.join(WAIT),
        Some(ExitReason::Panic("handler exploded".to_string()))
    );
    assert_eq!(bystander.ask_within::<Pong>(Ping(1), WAIT), Some(Pong(1)));
    Ok(())
}

/// A blocking receive returns whatever the matched body produced.
#[test]
fn test_blocking_receive_returns_body_value() -> anyhow::Result<()> {
    initialize_tracing();
    let runtime = runtime();
    let doubler = runtime.spawn("doubler", (), |ctx| {
        match ctx.receive(|r| r.case(|_, Ping(n): Ping| n * 2)) {
            Ok(doubled) => {
                ctx.reply(Pong(doubled));
                Flow::done()
            }
            Err(error) => Flow::fail(error),
        }
    })?;

    assert_eq!(doubler.ask_within::<Pong>(Ping(21), WAIT), Some(Pong(42)));
    assert_eq!(doubler.join(WAIT), Some(ExitReason::Normal));
    Ok(())
}

/// A bounded blocking receive fails with `TimedOut` unless a `Timeout` case exists.
#[test]
fn test_blocking_receive_timeouts() -> anyhow::Result<()> {
    initialize_tracing();
    let runtime = runtime();
    let impatient = runtime.spawn("impatient", (), |ctx| {
        match ctx.receive_within(Duration::from_millis(20), |r| r.case(|_, _: Ping| ())) {
            Ok(()) => Flow::done(),
            Err(ActorError::TimedOut) => Flow::exit("gave up"),
            Err(error) => Flow::fail(error),
        }
    })?;
    let fallback = runtime.spawn("fallback", (), |ctx| {
        let got = ctx.receive_within(Duration::from_millis(20), |r| {
            r.case(|_, Ping(n): Ping| n).on_timeout(|_| 99)
        });
        match got {
            Ok(n) => Flow::exit(format!("got {n}")),
            Err(error) => Flow::fail(error),
        }
    })?;

    assert_eq!(impatient.join(WAIT), Some(ExitReason::Custom("gave up".to_string())));
    assert_eq!(fallback.join(WAIT), Some(ExitReason::Custom("got 99".to_string())));
    Ok(())
}

/// Long react/loop chains run in constant stack space and yield between slices.
#[test]
fn test_long_loop_does_not_grow_the_stack() -> anyhow::Result<()> {
    initialize_tracing();
    const MESSAGES: u32 = 10_000;
    let runtime = runtime();
    let counter = runtime.new_actor("counter", 0_u32)?.behavior(|ctx| {
        ctx.loop_forever(|ctx| {
            ctx.react(|r| {
                r.case(|ctx, _: Ping| {
                    *ctx.state_mut() += 1;
                    Flow::done()
                })
                .case(|ctx, _: Report| {
                    ctx.reply(Pong(*ctx.state()));
                    Flow::exit("normal")
                })
            })
        })
    });
    for n in 0..MESSAGES {
        counter.send(Ping(n));
    }
    counter.start();

    assert_eq!(counter.ask_within::<Pong>(Report, WAIT), Some(Pong(MESSAGES)));
    assert_eq!(counter.join(WAIT), Some(ExitReason::Normal));
    Ok(())
}

/// `forward` keeps the original sender; `send` names the sending reactor.
#[test]
fn test_forward_and_send_reply_addresses() -> anyhow::Result<()> {
    initialize_tracing();
    let runtime = runtime();
    let collector = runtime.inbox();
    let report = collector.reply_to();

    let echo = runtime.spawn("echo", (), |ctx| {
        ctx.loop_forever(|ctx| {
            ctx.react(|r| {
                r.case(|ctx, Ping(n): Ping| {
                    ctx.reply(Pong(n));
                    Flow::done()
                })
                .case(|_, _: Stop| Flow::exit("normal"))
            })
        })
    })?;
    let relay = runtime.spawn("relay", echo.clone(), |ctx| {
        ctx.react(|r| {
            r.case(|ctx, ping: Ping| {
                let target = ctx.state().clone();
                ctx.forward(&target, ping);
                Flow::done()
            })
        })
    })?;
    assert_eq!(relay.ask_within::<Pong>(Ping(8), WAIT), Some(Pong(8)));

    let caller = runtime.spawn("caller", echo.clone(), move |ctx| {
        let report = report.clone();
        let echo = ctx.state().clone();
        ctx.send(&echo, Ping(5));
        ctx.react(move |r| {
            r.case(move |ctx, Pong(n): Pong| {
                let replier = ctx.sender().and_then(ReplyTo::id);
                if replier == Some(ctx.state().id()) {
                    report.send(Pong(n));
                }
                Flow::done()
            })
        })
    })?;
    assert_eq!(collector.receive_within::<Pong>(WAIT), Some(Pong(5)));
    assert_eq!(caller.join(WAIT), Some(ExitReason::Normal));

    echo.send(Stop);
    assert_eq!(echo.join(WAIT), Some(ExitReason::Normal));
    Ok(())
}

/// The catch-all case sees every message, whatever its type.
#[test]
fn test_catch_all_case() -> anyhow::Result<()> {
    initialize_tracing();
    let runtime = runtime();
    let collector = runtime.inbox();
    let report = collector.reply_to();

    let sink = runtime.new_actor("sink", Vec::<String>::new())?.behavior(move |ctx| {
        let report = report.clone();
        ctx.and_then(
            |ctx| {
                ctx.loop_while(
                    |ctx| ctx.state().len() < 3,
                    |ctx| {
                        ctx.react(|r| {
                            r.on_any(|ctx, envelope| {
                                ctx.state_mut().push(format!("{:?}", envelope.message()));
                                Flow::done()
                            })
                        })
                    },
                )
            },
            move |ctx| {
                report.send(Log(ctx.state().clone()));
                Flow::done()
            },
        )
    });
    sink.send(Ping(1));
    sink.send("text");
    sink.send(Urgent(2));
    sink.start();

    assert_eq!(
        collector.receive_within::<Log>(WAIT),
        Some(Log(vec![
            "Ping(1)".to_string(),
            "\"text\"".to_string(),
            "Urgent(2)".to_string()
        ]))
    );
    Ok(())
}

//! End-to-end tests for the invocation lifecycle.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use proptest::prelude::*;
use serde_json::json;
use tokio::sync::Notify;

use stratum_core::{Error, Flow};
use stratum_engine::{Engine, EngineConfig, Middleware, Phase};
use stratum_test::{
    continuing, failing, record, recording, responding, sleeping_handler, CallLog, CountingPlugin,
    PluginEvent, TestContext,
};

/// An engine whose handler echoes the event and counts its calls.
fn counted_echo(config: EngineConfig) -> (Engine, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let engine = Engine::with_config(
        move |event, _, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            async move { Ok(event) }
        },
        config,
    );
    (engine, calls)
}

/// An on-error middleware that records the error message it saw.
fn error_recorder(name: &'static str, log: &CallLog) -> Middleware {
    let log = log.clone();
    Middleware::new(name).on_error(move |request| {
        let seen = request
            .error
            .as_ref()
            .map_or_else(|| "<none>".to_string(), ToString::to_string);
        log.record(format!("{name}: {seen}"));
        Box::pin(async { Ok(Flow::Continue) })
    })
}

// ---------------------------------------------------------------------------
// Ordering
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_onion_ordering_on_success() {
    let log = CallLog::new();
    let (engine, _) = counted_echo(EngineConfig::default());
    engine
        .use_middlewares([recording("m1", &log), recording("m2", &log), recording("m3", &log)])
        .unwrap();

    engine.invoke(json!({}), TestContext::new().build()).await.unwrap();

    assert_eq!(
        log.entries(),
        vec!["m1.before", "m2.before", "m3.before", "m3.after", "m2.after", "m1.after"]
    );
}

#[tokio::test]
async fn test_after_hooks_run_in_reverse_registration_order() {
    let log = CallLog::new();
    let (engine, _) = counted_echo(EngineConfig::default());
    engine.after(record(&log, "m1")).after(record(&log, "m2"));

    engine.invoke(json!({}), TestContext::new().build()).await.unwrap();

    assert_eq!(log.entries(), vec!["m2", "m1"]);
}

#[tokio::test]
async fn test_on_error_hooks_run_in_reverse_registration_order() {
    let log = CallLog::new();
    let engine = Engine::new(|_, _, _| async { Err(Error::handler("boom")) });
    engine
        .use_middlewares([recording("m1", &log), recording("m2", &log)])
        .unwrap();

    let err = engine.invoke(json!({}), TestContext::new().build()).await.unwrap_err();

    assert_eq!(err.to_string(), "boom");
    assert_eq!(
        log.entries(),
        vec!["m1.before", "m2.before", "m2.on_error", "m1.on_error"]
    );
}

proptest! {
    #[test]
    fn prop_ordering_holds_for_any_registration_count(count in 1usize..8, fail in any::<bool>()) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        let log = CallLog::new();
        let engine = if fail {
            Engine::new(|_, _, _| async { Err(Error::handler("boom")) })
        } else {
            Engine::new(|event, _, _| async move { Ok(event) })
        };
        let names: Vec<String> = (0..count).map(|i| format!("m{i}")).collect();
        for name in &names {
            engine.use_middleware(recording(name, &log)).unwrap();
        }

        let _ = runtime.block_on(engine.invoke(json!({}), TestContext::new().build()));

        let mut expected: Vec<String> = names.iter().map(|n| format!("{n}.before")).collect();
        let tail = if fail { "on_error" } else { "after" };
        expected.extend(names.iter().rev().map(|n| format!("{n}.{tail}")));
        prop_assert_eq!(log.entries(), expected);
    }
}

// ---------------------------------------------------------------------------
// Short-circuit
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_before_short_circuit_skips_rest_handler_and_after() {
    let log = CallLog::new();
    let plugin = CountingPlugin::new();
    let (engine, handler_calls) = counted_echo(EngineConfig::default().plugin(plugin.clone()));

    engine
        .use_middleware(Middleware::new("b1").before(responding(json!("short"))))
        .unwrap()
        .use_middleware(
            Middleware::new("b2")
                .before(record(&log, "b2.before"))
                .after(record(&log, "b2.after")),
        )
        .unwrap();

    let response = engine.invoke(json!({}), TestContext::new().build()).await.unwrap();

    assert_eq!(response, json!("short"));
    assert_eq!(log.count("b2.before"), 0);
    assert_eq!(log.count("b2.after"), 0);
    assert_eq!(handler_calls.load(Ordering::SeqCst), 0);

    assert_eq!(plugin.middleware_names(), vec!["b1.before"]);
    assert_eq!(plugin.count(|e| *e == PluginEvent::BeforeHandler), 0);
}

#[tokio::test]
async fn test_after_short_circuit_stops_after_chain() {
    let log = CallLog::new();
    let (engine, _) = counted_echo(EngineConfig::default());

    engine
        .use_middleware(Middleware::new("outer").after(record(&log, "outer.after")))
        .unwrap()
        .use_middleware(Middleware::new("inner").after(responding(json!("replaced"))))
        .unwrap();

    let response = engine.invoke(json!("original"), TestContext::new().build()).await.unwrap();

    assert_eq!(response, json!("replaced"));
    assert!(!log.contains("outer.after"));
}

#[tokio::test]
async fn test_falsy_response_still_short_circuits() {
    let (engine, handler_calls) = counted_echo(EngineConfig::default());
    engine.before(responding(json!(false)));

    let response = engine.invoke(json!({}), TestContext::new().build()).await.unwrap();

    assert_eq!(response, json!(false));
    assert_eq!(handler_calls.load(Ordering::SeqCst), 0);
}

// ---------------------------------------------------------------------------
// Error routing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_error_in_before_routes_to_on_error_without_handler() {
    let log = CallLog::new();
    let (engine, handler_calls) = counted_echo(EngineConfig::default());
    engine
        .use_middleware(error_recorder("catch", &log))
        .unwrap()
        .use_middleware(Middleware::new("fail").before(failing("before failed")))
        .unwrap();

    let err = engine.invoke(json!({}), TestContext::new().build()).await.unwrap_err();

    assert_eq!(err.to_string(), "before failed");
    assert_eq!(log.entries(), vec!["catch: before failed"]);
    assert_eq!(handler_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_error_in_handler_routes_to_on_error() {
    let log = CallLog::new();
    let engine = Engine::new(|_, _, _| async { Err(Error::handler("handler failed")) });
    engine
        .use_middleware(error_recorder("catch", &log))
        .unwrap()
        .after(record(&log, "after"));

    let err = engine.invoke(json!({}), TestContext::new().build()).await.unwrap_err();

    assert_eq!(err.to_string(), "handler failed");
    assert_eq!(log.entries(), vec!["catch: handler failed"]);
}

#[tokio::test]
async fn test_error_in_after_discards_response_and_routes_to_on_error() {
    let log = CallLog::new();
    let (engine, _) = counted_echo(EngineConfig::default());

    let seen = log.clone();
    engine
        .use_middleware(Middleware::new("catch").on_error(move |request| {
            seen.record(format!("response: {:?}", request.response));
            Box::pin(async { Ok(Flow::Continue) })
        }))
        .unwrap()
        .use_middleware(Middleware::new("fail").after(failing("after failed")))
        .unwrap();

    let err = engine.invoke(json!("value"), TestContext::new().build()).await.unwrap_err();

    assert_eq!(err.to_string(), "after failed");
    assert_eq!(log.entries(), vec!["response: None"]);
}

// ---------------------------------------------------------------------------
// Recovery
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_first_on_error_response_recovers_and_stops_chain() {
    let log = CallLog::new();
    let engine = Engine::new(|_, _, _| async { Err(Error::handler("boom")) });
    engine
        .use_middleware(Middleware::new("second").on_error(record(&log, "second")))
        .unwrap()
        .use_middleware(Middleware::new("first").on_error(responding(json!({"statusCode": 500}))))
        .unwrap();

    let response = engine.invoke(json!({}), TestContext::new().build()).await.unwrap();

    assert_eq!(response, json!({"statusCode": 500}));
    assert!(!log.contains("second"));
}

#[tokio::test]
async fn test_non_responding_on_error_lets_next_run() {
    let log = CallLog::new();
    let engine = Engine::new(|_, _, _| async { Err(Error::handler("boom")) });
    engine
        .use_middleware(Middleware::new("second").on_error(responding(json!("recovered"))))
        .unwrap()
        .use_middleware(Middleware::new("first").on_error(record(&log, "first")))
        .unwrap();

    let response = engine.invoke(json!({}), TestContext::new().build()).await.unwrap();

    assert_eq!(response, json!("recovered"));
    assert!(log.contains("first"));
}

#[tokio::test]
async fn test_secondary_failure_aborts_chain_and_keeps_cause() {
    let log = CallLog::new();
    let engine = Engine::new(|_, _, _| async { Err(Error::handler("original")) });
    engine
        .use_middleware(Middleware::new("never").on_error(record(&log, "never")))
        .unwrap()
        .use_middleware(Middleware::new("broken").on_error(failing("secondary")))
        .unwrap();

    let err = engine.invoke(json!({}), TestContext::new().build()).await.unwrap_err();

    assert_eq!(err.to_string(), "secondary");
    assert!(matches!(err, Error::Secondary { .. }));
    assert_eq!(err.original_error().map(ToString::to_string).as_deref(), Some("original"));
    assert!(std::error::Error::source(&err).is_some());
    assert!(!log.contains("never"));
}

// ---------------------------------------------------------------------------
// Plugin
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_plugin_sees_full_lifecycle_in_order() {
    let plugin = CountingPlugin::new();
    let (engine, _) = counted_echo(EngineConfig::default().plugin(plugin.clone()));
    engine
        .use_middleware(Middleware::new("m").before(continuing()).after(continuing()))
        .unwrap();

    engine.invoke(json!({}), TestContext::new().build()).await.unwrap();

    assert_eq!(
        plugin.events(),
        vec![
            PluginEvent::BeforePrefetch,
            PluginEvent::RequestStart,
            PluginEvent::BeforeMiddleware("m.before".into()),
            PluginEvent::AfterMiddleware("m.before".into()),
            PluginEvent::BeforeHandler,
            PluginEvent::AfterHandler,
            PluginEvent::BeforeMiddleware("m.after".into()),
            PluginEvent::AfterMiddleware("m.after".into()),
            PluginEvent::RequestEnd {
                has_response: true,
                has_error: false,
            },
        ]
    );
}

#[tokio::test]
async fn test_request_end_fires_once_on_every_path() {
    let cases: Vec<(&str, Engine, CountingPlugin)> = {
        let mut cases = Vec::new();
        for case in ["success", "recovered", "unrecovered", "secondary"] {
            let plugin = CountingPlugin::new();
            let config = EngineConfig::default().plugin(plugin.clone());
            let engine = if case == "success" {
                Engine::with_config(|event, _, _| async move { Ok(event) }, config)
            } else {
                Engine::with_config(|_, _, _| async { Err(Error::handler("boom")) }, config)
            };
            match case {
                "recovered" => {
                    engine.on_error(responding(json!("ok")));
                }
                "secondary" => {
                    engine.on_error(failing("again"));
                }
                _ => {}
            }
            cases.push((case, engine, plugin));
        }
        cases
    };

    for (case, engine, plugin) in cases {
        let result = engine.invoke(json!({}), TestContext::new().build()).await;
        assert_eq!(
            result.is_ok(),
            matches!(case, "success" | "recovered"),
            "{case}"
        );
        assert_eq!(plugin.request_ends(), 1, "{case}");
    }
}

#[tokio::test]
async fn test_request_end_sees_the_failure() {
    let plugin = CountingPlugin::new();
    let engine = Engine::with_config(
        |_, _, _| async { Err(Error::handler("boom")) },
        EngineConfig::default().plugin(plugin.clone()),
    );

    let _ = engine.invoke(json!({}), TestContext::new().build()).await;

    assert_eq!(
        plugin.events().last(),
        Some(&PluginEvent::RequestEnd {
            has_response: false,
            has_error: true,
        })
    );
    assert_eq!(plugin.count(|e| *e == PluginEvent::AfterHandler), 0);
}

#[tokio::test]
async fn test_request_end_sees_failure_when_on_error_clears_the_error() {
    let plugin = CountingPlugin::new();
    let engine = Engine::with_config(
        |_, _, _| async { Err(Error::handler("boom")) },
        EngineConfig::default().plugin(plugin.clone()),
    );
    engine.on_error(|request| {
        Box::pin(async move {
            request.error = None;
            Ok(Flow::Continue)
        })
    });

    let err = engine
        .invoke(json!({}), TestContext::new().build())
        .await
        .unwrap_err();

    assert!(err.to_string().contains("cleared"));
    assert_eq!(
        plugin.events().last(),
        Some(&PluginEvent::RequestEnd {
            has_response: false,
            has_error: true,
        })
    );
}

#[tokio::test]
async fn test_request_end_sees_response_when_after_clears_it() {
    let plugin = CountingPlugin::new();
    let (engine, _) = counted_echo(EngineConfig::default().plugin(plugin.clone()));
    engine.after(|request| {
        Box::pin(async move {
            request.response = None;
            Ok(Flow::Continue)
        })
    });

    let response = engine
        .invoke(json!({"n": 1}), TestContext::new().build())
        .await
        .unwrap();

    assert_eq!(response, serde_json::Value::Null);
    assert_eq!(
        plugin.events().last(),
        Some(&PluginEvent::RequestEnd {
            has_response: true,
            has_error: false,
        })
    );
}

// ---------------------------------------------------------------------------
// Deadline guard
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn test_deadline_guard_fires_before_remaining_time() {
    let engine = Engine::new(sleeping_handler(Duration::from_secs(10), json!("late")));
    let context = TestContext::new().remaining_millis(1_000).build();

    let started = tokio::time::Instant::now();
    let err = engine.invoke(json!({}), context).await.unwrap_err();
    let elapsed = started.elapsed();

    assert!(err.is_timeout());
    assert_eq!(err.to_string(), "Timeout");
    assert!(elapsed >= Duration::from_millis(995), "{elapsed:?}");
    assert!(elapsed < Duration::from_millis(1_000), "{elapsed:?}");
}

#[tokio::test(start_paused = true)]
async fn test_custom_timeout_response_resolves() {
    let plugin = CountingPlugin::new();
    let engine = Engine::with_config(
        sleeping_handler(Duration::from_secs(10), json!("late")),
        EngineConfig::default()
            .timeout_early_in_millis(100)
            .timeout_early_response(|| Ok(json!({"statusCode": 504})))
            .plugin(plugin.clone()),
    );

    let response = engine
        .invoke(json!({}), TestContext::new().remaining_millis(1_000).build())
        .await
        .unwrap();

    assert_eq!(response, json!({"statusCode": 504}));
    assert_eq!(plugin.count(|e| *e == PluginEvent::AfterHandler), 1);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_is_recoverable_through_on_error() {
    let log = CallLog::new();
    let engine = Engine::new(sleeping_handler(Duration::from_secs(10), json!("late")));
    engine
        .use_middleware(error_recorder("record", &log))
        .unwrap()
        .on_error(|request| {
            let timed_out = request.error.as_ref().is_some_and(Error::is_timeout);
            Box::pin(async move {
                Ok(if timed_out {
                    Flow::Respond(json!({"statusCode": 408}))
                } else {
                    Flow::Continue
                })
            })
        });

    let response = engine
        .invoke(json!({}), TestContext::new().remaining_millis(200).build())
        .await
        .unwrap();

    assert_eq!(response, json!({"statusCode": 408}));
    assert!(log.entries().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_failing_timeout_response_enters_error_path() {
    let log = CallLog::new();
    let engine = Engine::with_config(
        sleeping_handler(Duration::from_secs(10), json!("late")),
        EngineConfig::default().timeout_early_response(|| Err(Error::handler("custom timeout"))),
    );
    engine.use_middleware(error_recorder("record", &log)).unwrap();

    let err = engine
        .invoke(json!({}), TestContext::new().remaining_millis(50).build())
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "custom timeout");
    assert_eq!(log.entries(), vec!["record: custom timeout"]);
}

#[tokio::test(start_paused = true)]
async fn test_fast_handler_beats_deadline() {
    let engine = Engine::new(sleeping_handler(Duration::from_millis(10), json!("fast")));

    let response = engine
        .invoke(json!({}), TestContext::new().remaining_millis(1_000).build())
        .await
        .unwrap();

    assert_eq!(response, json!("fast"));
}

#[tokio::test(start_paused = true)]
async fn test_disabled_guard_never_races() {
    let engine = Engine::with_config(
        sleeping_handler(Duration::from_millis(2_000), json!("slow")),
        EngineConfig::default().timeout_early_in_millis(0),
    );

    let response = engine
        .invoke(json!({}), TestContext::new().remaining_millis(1_000).build())
        .await
        .unwrap();

    assert_eq!(response, json!("slow"));
}

#[tokio::test(start_paused = true)]
async fn test_handler_observes_abort_signal() {
    let aborted = Arc::new(Notify::new());
    let observed = aborted.clone();
    let engine = Engine::new(move |_, _, signal| {
        let observed = observed.clone();
        async move {
            tokio::spawn(async move {
                signal.aborted().await;
                observed.notify_one();
            });
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok(json!("late"))
        }
    });

    let result = engine
        .invoke(json!({}), TestContext::new().remaining_millis(100).build())
        .await;

    assert!(result.unwrap_err().is_timeout());
    tokio::time::timeout(Duration::from_secs(1), aborted.notified())
        .await
        .unwrap();
}

// ---------------------------------------------------------------------------
// Mutation visibility
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_before_mutation_reaches_handler_and_after_mutation_reaches_caller() {
    let engine = Engine::new(|event, _, _| async move { Ok(json!({ "saw": event["user"] })) });
    engine
        .before(|request| {
            request.event["user"] = json!("alice");
            Box::pin(async { Ok(Flow::Continue) })
        })
        .after(|request| {
            Box::pin(async move {
                if let Some(response) = request.response.as_mut() {
                    response["decorated"] = json!(true);
                }
                Ok(Flow::Continue)
            })
        });

    let response = engine.invoke(json!({}), TestContext::new().build()).await.unwrap();

    assert_eq!(response, json!({ "saw": "alice", "decorated": true }));
}

#[tokio::test]
async fn test_context_mutation_reaches_handler() {
    let engine = Engine::new(|_, context, _| async move {
        Ok(context.metadata.get("tenant").cloned().unwrap_or_default())
    });
    engine.before(|request| {
        request.context.metadata.insert("tenant".into(), json!("acme"));
        Box::pin(async { Ok(Flow::Continue) })
    });

    let response = engine.invoke(json!({}), TestContext::new().build()).await.unwrap();

    assert_eq!(response, json!("acme"));
}

// ---------------------------------------------------------------------------
// Snapshot isolation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_registration_during_invocation_only_affects_later_invocations() {
    let started = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let log = CallLog::new();

    let (started_tx, release_rx) = (started.clone(), release.clone());
    let engine = Engine::new(move |event, _, _| {
        let started = started_tx.clone();
        let release = release_rx.clone();
        async move {
            started.notify_one();
            release.notified().await;
            Ok(event)
        }
    });

    let in_flight = {
        let engine = engine.clone();
        tokio::spawn(async move { engine.invoke(json!({}), TestContext::new().build()).await })
    };

    started.notified().await;
    engine.after(record(&log, "late"));
    assert_eq!(engine.hook_count(Phase::After), 1);
    release.notify_one();

    in_flight.await.unwrap().unwrap();
    assert!(!log.contains("late"));

    release.notify_one();
    engine.invoke(json!({}), TestContext::new().build()).await.unwrap();
    assert_eq!(log.count("late"), 1);
}

#[tokio::test]
async fn test_concurrent_invocations_are_independent() {
    let engine = Engine::new(|event, _, _| async move { Ok(event) });
    engine.before(|request| {
        let n = request.event["n"].as_i64().unwrap_or_default();
        request.internal.insert("n", json!(n));
        request.event["double"] = json!(n * 2);
        Box::pin(async { Ok(Flow::Continue) })
    });

    let handles: Vec<_> = (0..16)
        .map(|n| {
            let engine = engine.clone();
            tokio::spawn(async move { engine.invoke(json!({ "n": n }), TestContext::new().build()).await })
        })
        .collect();

    for (n, handle) in handles.into_iter().enumerate() {
        let response = handle.await.unwrap().unwrap();
        assert_eq!(response["double"], json!(n * 2));
    }
}

use std::time::Duration;

use geo_runtime::Bootstrap;
use geo_runtime_client::RuntimeApiClient;
use geo_runtime_handlers::builtin_registry;
use geo_runtime_testsupport::*;
use serde_json::json;

const FUNCTION: &str = "lidar-dem";

#[tokio::test(flavor = "multi_thread")]
async fn serves_invocations_until_emulator_stops() -> anyhow::Result<()> {
    let emulator = spawn_emulator(FUNCTION, 5_000).await?;
    let invoker = InvokeClient::new(emulator.base_url());

    let mut transport = RuntimeApiClient::new(&emulator.runtime_api());
    let runtime = tokio::spawn(async move {
        Bootstrap::new(builtin_registry())
            .run(
                "handler.entry_point:lambda_handler",
                &mut transport,
                std::future::pending::<()>(),
            )
            .await
    });

    let pong = invoker.invoke(FUNCTION, &json!({"op": "ping"})).await?;
    assert!(pong.is_success(), "unexpected outcome: {pong:?}");
    assert_eq!(pong.body, json!({"result": "pong"}));

    let failed = invoker.invoke(FUNCTION, &json!({"op": "bad"})).await?;
    assert_eq!(failed.function_error.as_deref(), Some("Unhandled"));
    assert_eq!(failed.body["error"], "ValueError");
    assert_eq!(failed.body["message"], "unsupported operation: bad");

    // A failed invocation does not stop the loop.
    let echo = invoker
        .invoke(FUNCTION, &json!({"op": "echo", "tile": 7}))
        .await?;
    assert!(echo.is_success());
    assert_eq!(echo.body["result"]["tile"], 7);

    let status = invoker.status().await?;
    assert_eq!(status["function_name"], FUNCTION);
    assert_eq!(status["pending"], 0);

    emulator.stop().await?;
    let summary = tokio::time::timeout(Duration::from_secs(5), runtime).await???;
    assert_eq!(summary.served, 3);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.failed, 1);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn geo_handlers_run_behind_the_runtime_api() -> anyhow::Result<()> {
    let emulator = spawn_emulator(FUNCTION, 5_000).await?;
    let invoker = InvokeClient::new(emulator.base_url());

    let mut transport = RuntimeApiClient::new(&emulator.runtime_api());
    let runtime = tokio::spawn(async move {
        geo_runtime::run(
            "geo.partition:square_split",
            builtin_registry(),
            &mut transport,
            std::future::pending::<()>(),
        )
        .await
    });

    let split = invoker
        .invoke(
            FUNCTION,
            &json!({"bounds": {"x_min": 0.0, "y_min": 0.0, "x_max": 10.0, "y_max": 20.0}}),
        )
        .await?;
    assert!(split.is_success(), "unexpected outcome: {split:?}");
    assert_eq!(split.body["bounds"].as_array().map(Vec::len), Some(4));

    let inverted = invoker
        .invoke(
            FUNCTION,
            &json!({"bounds": {"x_min": 5.0, "y_min": 0.0, "x_max": 1.0, "y_max": 1.0}}),
        )
        .await?;
    assert_eq!(inverted.body["error"], "ValueError");

    emulator.stop().await?;
    let summary = tokio::time::timeout(Duration::from_secs(5), runtime).await???;
    assert_eq!(summary.served, 2);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn timed_out_invocation_does_not_reach_a_later_runtime() -> anyhow::Result<()> {
    let emulator = spawn_emulator(FUNCTION, 200).await?;
    let invoker = InvokeClient::new(emulator.base_url());

    let timed_out = invoker.invoke(FUNCTION, &json!({"op": "ping"})).await?;
    assert_eq!(timed_out.body["error"], "TaskTimedOut");
    assert!(emulator.state.queue.is_empty());

    let mut transport = RuntimeApiClient::new(&emulator.runtime_api());
    let runtime = tokio::spawn(async move {
        Bootstrap::new(builtin_registry())
            .run(
                "handler.entry_point:lambda_handler",
                &mut transport,
                std::future::pending::<()>(),
            )
            .await
    });

    let pong = invoker.invoke(FUNCTION, &json!({"op": "ping"})).await?;
    assert!(pong.is_success(), "unexpected outcome: {pong:?}");
    assert!(!runtime.is_finished());

    emulator.stop().await?;
    let summary = tokio::time::timeout(Duration::from_secs(5), runtime).await???;
    assert_eq!(summary.served, 1);
    Ok(())
}

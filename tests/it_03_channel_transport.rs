use geo_runtime::Bootstrap;
use geo_runtime_dispatcher::{channel, ChannelMessage};
use geo_runtime_handlers::builtin_registry;
use geo_runtime_metrics::RuntimeMetrics;
use geo_runtime_models::InvocationResponse;
use geo_runtime_testsupport::request;
use serde_json::json;

#[tokio::test]
async fn pipelines_served_in_process_with_metrics() -> anyhow::Result<()> {
    let (mut transport, mut client) = channel(4);
    let metrics = RuntimeMetrics::new()?;
    let bootstrap = Bootstrap::new(builtin_registry()).with_metrics(metrics.clone());

    let runtime = tokio::spawn(async move {
        bootstrap
            .run("geo.pipelines.dsm_pipeline", &mut transport, std::future::pending::<()>())
            .await
    });

    let response = client
        .invoke(request(
            "req-1",
            json!({"filename": "s3://raw/tile.laz", "output": "/tmp/tile_dsm.tif"}),
            5_000,
        ))
        .await?;
    let InvocationResponse::Success(pipeline) = response else {
        panic!("expected success, got {response:?}");
    };
    assert_eq!(pipeline["pipeline"][0]["type"], "readers.las");
    assert_eq!(pipeline["pipeline"][5]["filename"], "/tmp/tile_dsm.tif");

    let response = client
        .invoke(request("req-2", json!({"filename": "a.laz"}), 5_000))
        .await?;
    assert_eq!(response.error_type(), Some("ValueError"));

    client.close();
    let summary = runtime.await??;
    assert_eq!(summary.served, 2);
    assert_eq!(metrics.invocations(), 2);
    assert_eq!(metrics.cold_starts(), 1);
    assert_eq!(metrics.errors("ValueError"), 1);
    Ok(())
}

#[tokio::test]
async fn init_error_reaches_channel_client() -> anyhow::Result<()> {
    let (mut transport, mut client) = channel(1);

    let err = geo_runtime::run(
        "geo.partition:square_split_v2",
        builtin_registry(),
        &mut transport,
        std::future::pending::<()>(),
    )
    .await
    .unwrap_err();
    assert_eq!(err.error_type(), "Runtime.HandlerNotFound");

    match client.recv().await {
        Some(ChannelMessage::InitError(shape)) => {
            assert_eq!(shape.error, "Runtime.HandlerNotFound");
        }
        other => panic!("expected init error, got {other:?}"),
    }
    Ok(())
}

//! Handler modules shipped with the runtime image.
//!
//! [`builtin_registry`] registers every module under its dotted path so
//! identifiers like `geo.partition:square_split` resolve through the loader.

use geo_runtime_loader::HandlerRegistry;

pub mod entry_point;
pub mod partition;
pub mod pipelines;
pub mod storage;

pub fn builtin_registry() -> HandlerRegistry {
    HandlerRegistry::new()
        .module(entry_point::MODULE, entry_point::module)
        .module(partition::MODULE, partition::module)
        .module(pipelines::MODULE, pipelines::module)
        .module(storage::MODULE, storage::module)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_runtime_loader::Loader;
    use geo_runtime_models::InvocationContext;
    use serde_json::json;

    #[test]
    fn every_builtin_module_is_registered() {
        let registry = builtin_registry();
        let paths: Vec<_> = registry.module_paths().collect();
        for path in ["handler.entry_point", "geo.partition", "geo.pipelines", "geo.storage"] {
            assert!(paths.contains(&path), "missing {path}");
        }
    }

    #[tokio::test]
    async fn builtin_identifiers_resolve_and_run() {
        let loader = Loader::new(builtin_registry());
        let ctx = InvocationContext::new("req-1", i64::MAX);

        let entry = loader.resolve_str("handler.entry_point:lambda_handler").unwrap();
        assert_eq!(
            entry.call(json!({"op": "ping"}), &ctx).await.unwrap(),
            json!({"result": "pong"})
        );

        let storage = loader.resolve_str("geo.storage.split_s3_path").unwrap();
        assert_eq!(
            storage
                .call(json!({"path": "s3://dem/out/tile.tif"}), &ctx)
                .await
                .unwrap(),
            json!({"bucket": "dem", "key": "out/tile.tif"})
        );

        for id in ["geo.partition:square_split", "geo.pipelines:dem_pipeline", "geo.pipelines:dsm_pipeline"] {
            assert!(loader.resolve_str(id).is_ok(), "{id} should resolve");
        }
    }
}

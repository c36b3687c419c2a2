use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use geo_runtime_loader::{handler_fn, HandlerError, HandlerRegistry, Loader, Module};
use geo_runtime_models::{HandlerId, InvocationContext, ResolutionError};
use serde_json::json;

fn counting_registry(inits: Arc<AtomicUsize>) -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();
    registry.register("handler.entry_point", move || {
        inits.fetch_add(1, Ordering::SeqCst);
        Ok(Module::new()
            .function(
                "lambda_handler",
                handler_fn(|event, _ctx| Ok(json!({"seen": event}))),
            )
            .function("other", handler_fn(|_event, _ctx| Ok(json!(null)))))
    });
    registry.register("broken.module", || {
        Err(HandlerError::new("ImportError", "libpdal.so not found"))
    });
    registry
}

#[tokio::test]
async fn resolves_and_calls_registered_handler() {
    let loader = Loader::new(counting_registry(Arc::new(AtomicUsize::new(0))));
    let handler = loader
        .resolve_str("handler.entry_point:lambda_handler")
        .unwrap();

    assert_eq!(handler.id().to_string(), "handler.entry_point:lambda_handler");
    let ctx = InvocationContext::new("req-1", i64::MAX);
    let out = handler.call(json!({"op": "ping"}), &ctx).await.unwrap();
    assert_eq!(out, json!({"seen": {"op": "ping"}}));
}

#[test]
fn resolving_twice_is_reference_equal_and_initializes_once() {
    let inits = Arc::new(AtomicUsize::new(0));
    let loader = Loader::new(counting_registry(inits.clone()));

    let first = loader.resolve_str("handler.entry_point:lambda_handler").unwrap();
    let second = loader.resolve_str("handler.entry_point:lambda_handler").unwrap();
    assert!(first.ptr_eq(&second));

    // A second function from the same module reuses the initialized module.
    let other = loader
        .resolve(&HandlerId::new("handler.entry_point", "other"))
        .unwrap();
    assert!(!other.ptr_eq(&first));

    assert_eq!(inits.load(Ordering::SeqCst), 1);
    assert_eq!(loader.initialized_modules(), 1);
}

#[test]
fn missing_module_is_a_resolution_error() {
    let loader = Loader::new(counting_registry(Arc::new(AtomicUsize::new(0))));
    let err = loader.resolve_str("no.such.module:lambda_handler").unwrap_err();
    assert_eq!(
        err,
        ResolutionError::ModuleNotFound {
            module: "no.such.module".to_string()
        }
    );
    assert_eq!(loader.initialized_modules(), 0);
}

#[test]
fn missing_function_is_a_resolution_error() {
    let loader = Loader::new(counting_registry(Arc::new(AtomicUsize::new(0))));
    let err = loader.resolve_str("handler.entry_point:absent").unwrap_err();
    assert!(matches!(
        err,
        ResolutionError::FunctionNotFound { ref function, .. } if function == "absent"
    ));
}

#[test]
fn failing_module_init_is_reported() {
    let loader = Loader::new(counting_registry(Arc::new(AtomicUsize::new(0))));
    let err = loader.resolve_str("broken.module:main").unwrap_err();
    match err {
        ResolutionError::ModuleInitFailed { module, message } => {
            assert_eq!(module, "broken.module");
            assert!(message.contains("libpdal.so"));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn malformed_identifier_is_rejected_before_lookup() {
    let loader = Loader::new(counting_registry(Arc::new(AtomicUsize::new(0))));
    let err = loader.resolve_str("not-a-handler").unwrap_err();
    assert!(matches!(err, ResolutionError::InvalidIdentifier { .. }));
}

#[test]
fn registry_lists_modules_in_order() {
    let registry = counting_registry(Arc::new(AtomicUsize::new(0)));
    let paths: Vec<_> = registry.module_paths().collect();
    assert_eq!(paths, vec!["broken.module", "handler.entry_point"]);
    assert!(registry.contains("handler.entry_point"));
}

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use geo_runtime_models::{HandlerId, InvocationContext, ResolutionError};
use serde_json::Value;
use tracing::{debug, info};

use crate::handler::{Handler, HandlerError};
use crate::registry::{HandlerRegistry, Module};

/// A resolved handler entry point, shared read-only for the process lifetime.
#[derive(Clone)]
pub struct HandlerRef {
    id: HandlerId,
    handler: Arc<dyn Handler>,
}

impl HandlerRef {
    pub fn id(&self) -> &HandlerId {
        &self.id
    }

    pub async fn call(&self, event: Value, context: &InvocationContext) -> Result<Value, HandlerError> {
        self.handler.call(event, context).await
    }

    /// True when both references point at the same handler instance.
    pub fn ptr_eq(&self, other: &HandlerRef) -> bool {
        Arc::ptr_eq(&self.handler, &other.handler)
    }
}

impl fmt::Debug for HandlerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRef").field("id", &self.id).finish()
    }
}

/// Resolves handler identifiers against a [`HandlerRegistry`].
///
/// Each module is initialized at most once; later resolutions of the same
/// identifier return the cached reference.
pub struct Loader {
    registry: HandlerRegistry,
    modules: Mutex<HashMap<String, Arc<Module>>>,
    resolved: Mutex<HashMap<HandlerId, HandlerRef>>,
}

impl Loader {
    pub fn new(registry: HandlerRegistry) -> Self {
        Self {
            registry,
            modules: Mutex::new(HashMap::new()),
            resolved: Mutex::new(HashMap::new()),
        }
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    pub fn resolve_str(&self, identifier: &str) -> Result<HandlerRef, ResolutionError> {
        let id: HandlerId = identifier.parse()?;
        self.resolve(&id)
    }

    pub fn resolve(&self, id: &HandlerId) -> Result<HandlerRef, ResolutionError> {
        let mut resolved = self.resolved.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = resolved.get(id) {
            debug!(handler = %id, "Handler already resolved");
            return Ok(existing.clone());
        }

        let module = self.load_module(&id.module)?;
        let handler = module
            .get(&id.function)
            .ok_or_else(|| ResolutionError::FunctionNotFound {
                module: id.module.clone(),
                function: id.function.clone(),
            })?;

        let handler_ref = HandlerRef {
            id: id.clone(),
            handler,
        };
        resolved.insert(id.clone(), handler_ref.clone());
        info!(handler = %id, "Handler resolved");
        Ok(handler_ref)
    }

    /// Number of modules initialized so far.
    pub fn initialized_modules(&self) -> usize {
        self.modules
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn load_module(&self, path: &str) -> Result<Arc<Module>, ResolutionError> {
        let mut modules = self.modules.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(module) = modules.get(path) {
            return Ok(module.clone());
        }

        let init = self
            .registry
            .initializer(path)
            .ok_or_else(|| ResolutionError::ModuleNotFound {
                module: path.to_string(),
            })?;

        let module = init().map_err(|e| ResolutionError::ModuleInitFailed {
            module: path.to_string(),
            message: e.to_string(),
        })?;
        info!(
            module = %path,
            functions = ?module.function_names().collect::<Vec<_>>(),
            "Handler module initialized"
        );

        let module = Arc::new(module);
        modules.insert(path.to_string(), module.clone());
        Ok(module)
    }
}

impl fmt::Debug for Loader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Loader")
            .field("registry", &self.registry)
            .field("initialized_modules", &self.initialized_modules())
            .finish()
    }
}

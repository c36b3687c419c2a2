use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::warn;

use crate::handler::{Handler, HandlerError};

/// The exported functions of an initialized handler module.
#[derive(Default, Clone)]
pub struct Module {
    functions: BTreeMap<String, Arc<dyn Handler>>,
}

impl Module {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn function(mut self, name: impl Into<String>, handler: impl Handler + 'static) -> Self {
        self.functions.insert(name.into(), Arc::new(handler));
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Handler>> {
        self.functions.get(name).cloned()
    }

    pub fn function_names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("functions", &self.functions.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Runs once per process when a module is first resolved.
pub type ModuleInit = Box<dyn Fn() -> Result<Module, HandlerError> + Send + Sync>;

/// Named registry of handler modules available to the loader.
#[derive(Default)]
pub struct HandlerRegistry {
    modules: BTreeMap<String, ModuleInit>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a module initializer under `path`.
    pub fn register<F>(&mut self, path: impl Into<String>, init: F) -> &mut Self
    where
        F: Fn() -> Result<Module, HandlerError> + Send + Sync + 'static,
    {
        let path = path.into();
        if self.modules.insert(path.clone(), Box::new(init)).is_some() {
            warn!(module = %path, "Replacing previously registered handler module");
        }
        self
    }

    /// Registers a module whose initialization cannot fail.
    pub fn module<F>(mut self, path: impl Into<String>, build: F) -> Self
    where
        F: Fn() -> Module + Send + Sync + 'static,
    {
        self.register(path, move || Ok(build()));
        self
    }

    pub fn contains(&self, path: &str) -> bool {
        self.modules.contains_key(path)
    }

    pub fn module_paths(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    pub(crate) fn initializer(&self, path: &str) -> Option<&ModuleInit> {
        self.modules.get(path)
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("modules", &self.modules.keys().collect::<Vec<_>>())
            .finish()
    }
}

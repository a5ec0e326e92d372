//! Explicit model registry.
//!
//! Maps model names to shared models. Owned by the application's
//! composition root and passed to whatever needs lookup by name — there is
//! no process-wide registry, so tests and embedders cannot collide.

use std::collections::HashMap;
use std::rc::Rc;

use formodel_core::{Error, Model, RegistryError, Result};

/// A name → model map with unique names.
#[derive(Debug, Default)]
pub struct ModelRegistry {
    models: HashMap<String, Rc<Model>>,
}

impl ModelRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            models: HashMap::new(),
        }
    }

    /// Register a model under its own name.
    ///
    /// Fails when the name is already taken; names are unique per registry.
    pub fn register(&mut self, model: Rc<Model>) -> Result<()> {
        let name = model.name().to_string();
        if self.models.contains_key(&name) {
            return Err(Error::Registry(RegistryError { name }));
        }
        self.models.insert(name, model);
        Ok(())
    }

    /// Look up a model by name.
    pub fn get(&self, name: &str) -> Option<&Rc<Model>> {
        self.models.get(name)
    }

    /// Whether a model name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.models.contains_key(name)
    }

    /// Registered model names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.models.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered models.
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Whether no models are registered.
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![allow(missing_debug_implementations, clippy::pattern_type_mismatch)] // module callbacks are not debug printable

use crate::schema::SchemaError;

use indexmap::IndexMap;
use std::rc::Rc;

pub mod modules;

pub use modules::*;


/// Errors raised by [`Registry::register`] and module registration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegistryError {
    #[error("{registry} registration failed: the name '{name}' is invalid (empty or whitespace-only names are not allowed)")]
    InvalidName { name: String, registry: String },

    #[error("Invalid module was attempted to be registered!")]
    InvalidModule { position: usize },

    #[error("{module_type} module {module} is missing *{field}*")]
    MissingField {
        module_type: &'static str,
        module: String,
        field: &'static str,
    },

    #[error("Transform module {module} is missing a *transform* or *calcTransform* method.")]
    MissingTransform { module: String },

    #[error("module {module}: {source}")]
    Schema {
        module: String,
        #[source]
        source: SchemaError,
    },
}

/// Validates that a name is not empty or whitespace-only.
pub fn validate_name(name: &str, registry_name: &str) -> Result<(), RegistryError> {
    if name.trim().is_empty() {
        Err(RegistryError::InvalidName {
            name: name.into(),
            registry: registry_name.into(),
        })
    } else {
        Ok(())
    }
}

/// Name-keyed store of registered items.
///
/// Items keep their registration order. Registering an existing name
/// replaces the stored item in place and returns the previous one.
#[derive(Clone)]
pub struct Registry<T> {
    inner: IndexMap<Rc<str>, Rc<T>>,
    name: Rc<str>,
}

impl<T> Registry<T> {
    pub fn new(registry_name: impl Into<Rc<str>>) -> Self {
        Self {
            inner: IndexMap::new(),
            name: registry_name.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn register(
        &mut self,
        name: impl Into<Rc<str>>,
        item: Rc<T>,
    ) -> Result<Option<Rc<T>>, RegistryError> {
        let name = name.into();
        validate_name(&name, &self.name)?;
        Ok(self.inner.insert(name, item))
    }

    pub fn get(&self, name: &str) -> Option<Rc<T>> {
        self.inner.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.contains_key(name)
    }

    pub fn list_names(&self) -> Vec<Rc<str>> {
        self.inner.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Entries in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&Rc<str>, &Rc<T>)> + '_ {
        self.inner.iter()
    }
}

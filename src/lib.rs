// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

// Use README.md as crate documentation.
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/README.md"))]

pub mod builtin;
pub mod coerce;
pub mod path;
pub mod plots;
pub mod registry;
pub mod schema;
mod session;
pub mod validate;
mod value;

pub use coerce::{CoerceError, Coercer};
pub use path::{nested_property, NestedProperty, PathError, PropPath, Segment};
pub use plots::FullFigure;
pub use registry::{Module, ModuleDef, ModuleType, RegistryError};
pub use schema::{Attribute, Composite, Node, SchemaError, ValType};
pub use session::{Config, Session};
pub use validate::{Container, Diagnostic, DiagnosticCode};
pub use value::{Map, Value};

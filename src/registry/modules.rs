// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Registrable modules: trace types, transforms and components.
//!
//! A [`ModuleDef`] is the loose, user-assembled description of a module.
//! [`ModuleRegistry::register`] validates a whole batch of definitions,
//! parses their attribute declarations and only then stores them, so a
//! failing batch leaves the registry untouched.

use super::{validate_name, Registry, RegistryError};
use crate::coerce::Coercer;
use crate::schema::{split_counter, Composite, Node, SchemaError};
use crate::value::Value;

use indexmap::IndexMap;
use serde::Deserialize;
use std::rc::Rc;

/// Defaulting routine of a trace or transform module.
pub type SupplyDefaultsFn = Rc<dyn Fn(&mut Coercer<'_>, &DefaultsContext<'_>) -> anyhow::Result<()>>;

/// Layout defaulting routine of a base plot, trace or component module.
pub type LayoutDefaultsFn = Rc<dyn Fn(&mut Coercer<'_>, &LayoutContext<'_>) -> anyhow::Result<()>>;

/// Value-time transform: maps one full trace to the traces that replace it.
pub type TransformFn =
    Rc<dyn Fn(&Value, &Value, &TransformContext<'_>) -> anyhow::Result<Vec<Value>>>;

/// Calc-time transform: rewrites a full trace in place.
pub type CalcTransformFn =
    Rc<dyn Fn(&mut Value, &Value, &TransformContext<'_>) -> anyhow::Result<()>>;

pub struct DefaultsContext<'a> {
    /// Position of the trace in the data argument.
    pub index: usize,
    pub default_color: &'a str,
    /// Raw layout argument.
    pub layout: &'a Value,
    /// Layout defaults resolved before any trace was defaulted.
    pub full_layout: &'a Value,
    /// For transforms, the full trace the transform belongs to.
    pub full_trace: &'a Value,
}

pub struct LayoutContext<'a> {
    pub full_data: &'a [Value],
    pub modules: &'a ModuleRegistry,
}

pub struct TransformContext<'a> {
    /// Attributes of the trace being transformed.
    pub schema: &'a Composite,
    pub full_layout: &'a Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleType {
    Trace,
    Transform,
    Component,
}

impl ModuleType {
    pub fn parse(s: &str) -> Option<ModuleType> {
        match s {
            "trace" => Some(ModuleType::Trace),
            "transform" => Some(ModuleType::Transform),
            "component" => Some(ModuleType::Component),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleType::Trace => "trace",
            ModuleType::Transform => "transform",
            ModuleType::Component => "component",
        }
    }
}

/// Description of a base plot (subplot) module, carried by trace modules.
#[derive(Clone, Default)]
pub struct BasePlotDef {
    pub name: Rc<str>,
    /// Trace attributes referencing subplots, doubling as layout keys
    /// (`xaxis`, `yaxis`).
    pub attr: Vec<Rc<str>>,
    /// Subplot id roots matching `attr` position by position (`x`, `y`).
    pub id_root: Vec<Rc<str>>,
    /// Trace-level attributes (the subplot references).
    pub attributes: Option<serde_json::Value>,
    /// Attributes of one subplot object in the layout.
    pub layout_attributes: Option<serde_json::Value>,
    pub supply_layout_defaults: Option<LayoutDefaultsFn>,
}

/// A module definition awaiting registration.
#[derive(Clone, Default)]
pub struct ModuleDef {
    pub module_type: Option<Rc<str>>,
    pub name: Option<Rc<str>>,
    pub categories: Option<Vec<Rc<str>>>,
    pub base_plot_module: Option<Rc<BasePlotDef>>,
    pub attributes: Option<serde_json::Value>,
    pub layout_attributes: Option<serde_json::Value>,
    /// Component contributions to other schemas:
    /// `{ "traces": {type: attrs}, "subplots": {attr: attrs}, "layout": attrs }`.
    pub schema: Option<serde_json::Value>,
    pub supply_defaults: Option<SupplyDefaultsFn>,
    pub supply_layout_defaults: Option<LayoutDefaultsFn>,
    pub transform: Option<TransformFn>,
    pub calc_transform: Option<CalcTransformFn>,
    pub meta: Option<Value>,
}

impl ModuleDef {
    pub fn trace(name: &str, categories: &[&str], base_plot_module: Rc<BasePlotDef>) -> Self {
        Self {
            module_type: Some("trace".into()),
            name: Some(name.into()),
            categories: Some(categories.iter().map(|c| Rc::from(*c)).collect()),
            base_plot_module: Some(base_plot_module),
            ..Self::default()
        }
    }

    pub fn transform(name: &str) -> Self {
        Self {
            module_type: Some("transform".into()),
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn component(name: &str) -> Self {
        Self {
            module_type: Some("component".into()),
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_attributes(mut self, attributes: serde_json::Value) -> Self {
        self.attributes = Some(attributes);
        self
    }

    pub fn with_layout_attributes(mut self, attributes: serde_json::Value) -> Self {
        self.layout_attributes = Some(attributes);
        self
    }

    pub fn with_schema(mut self, schema: serde_json::Value) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn with_meta(mut self, meta: Value) -> Self {
        self.meta = Some(meta);
        self
    }

    pub fn with_supply_defaults<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Coercer<'_>, &DefaultsContext<'_>) -> anyhow::Result<()> + 'static,
    {
        self.supply_defaults = Some(Rc::new(f));
        self
    }

    pub fn with_supply_layout_defaults<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Coercer<'_>, &LayoutContext<'_>) -> anyhow::Result<()> + 'static,
    {
        self.supply_layout_defaults = Some(Rc::new(f));
        self
    }

    pub fn with_transform<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value, &Value, &TransformContext<'_>) -> anyhow::Result<Vec<Value>> + 'static,
    {
        self.transform = Some(Rc::new(f));
        self
    }

    pub fn with_calc_transform<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Value, &Value, &TransformContext<'_>) -> anyhow::Result<()> + 'static,
    {
        self.calc_transform = Some(Rc::new(f));
        self
    }
}

/// One definition or a batch. A `None` entry in a batch is an invalid
/// module and fails the whole call.
pub enum Registration {
    One(ModuleDef),
    Batch(Vec<Option<ModuleDef>>),
}

impl From<ModuleDef> for Registration {
    fn from(def: ModuleDef) -> Self {
        Registration::One(def)
    }
}

impl From<Vec<ModuleDef>> for Registration {
    fn from(defs: Vec<ModuleDef>) -> Self {
        Registration::Batch(defs.into_iter().map(Some).collect())
    }
}

impl From<Vec<Option<ModuleDef>>> for Registration {
    fn from(defs: Vec<Option<ModuleDef>>) -> Self {
        Registration::Batch(defs)
    }
}

pub struct BasePlotModule {
    pub name: Rc<str>,
    pub attr: Vec<Rc<str>>,
    pub id_root: Vec<Rc<str>>,
    pub attributes: Rc<Composite>,
    pub layout_attributes: Rc<Composite>,
    pub supply_layout_defaults: Option<LayoutDefaultsFn>,
}

impl BasePlotModule {
    /// Layout key of the subplot object a subplot id refers to
    /// (`x2` -> `xaxis2`).
    pub fn layout_key(&self, id: &str) -> Option<String> {
        let (root, counter) = split_counter(id)?;
        let pos = self.id_root.iter().position(|r| &**r == root)?;
        let attr = self.attr.get(pos)?;
        Some(match counter {
            Some(n) => format!("{attr}{n}"),
            None => attr.to_string(),
        })
    }
}

pub struct TraceModule {
    pub name: Rc<str>,
    pub categories: Vec<Rc<str>>,
    pub base_plot_module: Rc<BasePlotModule>,
    pub attributes: Rc<Composite>,
    pub layout_attributes: Option<Rc<Composite>>,
    pub supply_defaults: Option<SupplyDefaultsFn>,
    pub supply_layout_defaults: Option<LayoutDefaultsFn>,
    pub meta: Value,
}

impl TraceModule {
    pub fn is(&self, category: &str) -> bool {
        self.categories.iter().any(|c| &**c == category)
    }
}

pub struct TransformModule {
    pub name: Rc<str>,
    pub attributes: Rc<Composite>,
    pub supply_defaults: Option<SupplyDefaultsFn>,
    pub transform: Option<TransformFn>,
    pub calc_transform: Option<CalcTransformFn>,
}

pub struct ComponentModule {
    pub name: Rc<str>,
    pub layout_attributes: Option<Rc<Composite>>,
    pub supply_layout_defaults: Option<LayoutDefaultsFn>,
    /// Attributes merged into the trace types they are keyed by.
    pub trace_attributes: IndexMap<Rc<str>, Rc<Composite>>,
    /// Attributes merged into the subplot objects they are keyed by.
    pub subplot_attributes: IndexMap<Rc<str>, Rc<Composite>>,
    /// Attributes merged into the base layout.
    pub base_layout_attributes: Option<Rc<Composite>>,
}

impl ComponentModule {
    /// Whether the component's layout container is an array of items
    /// (`annotations`).
    pub fn is_layout_array_container(&self) -> bool {
        self.layout_attributes
            .as_ref()
            .is_some_and(|c| c.is_linked_to_array())
    }
}

#[derive(Clone)]
pub enum Module {
    Trace(Rc<TraceModule>),
    Transform(Rc<TransformModule>),
    Component(Rc<ComponentModule>),
}

impl Module {
    pub fn name(&self) -> &str {
        match self {
            Module::Trace(m) => &m.name,
            Module::Transform(m) => &m.name,
            Module::Component(m) => &m.name,
        }
    }

    pub fn module_type(&self) -> ModuleType {
        match self {
            Module::Trace(_) => ModuleType::Trace,
            Module::Transform(_) => ModuleType::Transform,
            Module::Component(_) => ModuleType::Component,
        }
    }
}

#[derive(Deserialize, Default)]
struct RawComponentSchema {
    #[serde(default)]
    traces: IndexMap<String, serde_json::Value>,
    #[serde(default)]
    subplots: IndexMap<String, serde_json::Value>,
    layout: Option<serde_json::Value>,
}

enum Pending {
    Trace {
        module: Rc<TraceModule>,
    },
    Transform {
        module: Rc<TransformModule>,
        has_attributes: bool,
    },
    Component(Rc<ComponentModule>),
}

/// Registered trace types, transforms, components and the base plot
/// modules pulled in by trace types.
pub struct ModuleRegistry {
    traces: Registry<TraceModule>,
    transforms: Registry<TransformModule>,
    components: Registry<ComponentModule>,
    subplots: Registry<BasePlotModule>,
    default_trace_type: Rc<str>,
    logging: u8,
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self {
            traces: Registry::new("trace"),
            transforms: Registry::new("transform"),
            components: Registry::new("component"),
            subplots: Registry::new("subplot"),
            default_trace_type: "scatter".into(),
            logging: 1,
        }
    }

    pub fn set_default_trace_type(&mut self, trace_type: &str) {
        self.default_trace_type = trace_type.into();
    }

    pub fn default_trace_type(&self) -> &str {
        &self.default_trace_type
    }

    /// 0 silences registration messages, 1 keeps warnings, 2 adds details.
    pub fn set_logging(&mut self, level: u8) {
        self.logging = level;
    }

    /// Registers one module or a batch.
    ///
    /// Every definition is validated before anything is stored; one bad
    /// entry fails the whole call. Re-registering a name replaces the
    /// previous module.
    pub fn register(&mut self, registration: impl Into<Registration>) -> Result<(), RegistryError> {
        let defs = match registration.into() {
            Registration::One(def) => vec![Some(def)],
            Registration::Batch(defs) => defs,
        };

        // Base plots first seen in this batch, shared by every trace using them.
        let mut base_plots = IndexMap::new();
        let mut pending = Vec::with_capacity(defs.len());
        for (position, def) in defs.into_iter().enumerate() {
            let def = def.ok_or(RegistryError::InvalidModule { position })?;
            pending.push(self.prepare(def, position, &mut base_plots)?);
        }

        for p in pending {
            self.commit(p)?;
        }
        Ok(())
    }

    fn prepare(
        &self,
        def: ModuleDef,
        position: usize,
        base_plots: &mut IndexMap<Rc<str>, Rc<BasePlotModule>>,
    ) -> Result<Pending, RegistryError> {
        let module_type = def
            .module_type
            .as_deref()
            .and_then(ModuleType::parse)
            .ok_or(RegistryError::InvalidModule { position })?;
        let type_name = module_type.as_str();

        let name = def.name.clone().ok_or_else(|| RegistryError::MissingField {
            module_type: type_name,
            module: format!("#{position}"),
            field: "name",
        })?;
        validate_name(&name, type_name)?;
        let missing = |field| RegistryError::MissingField {
            module_type: type_name,
            module: name.to_string(),
            field,
        };

        match module_type {
            ModuleType::Trace => {
                let categories = def.categories.ok_or_else(|| missing("categories"))?;
                let bpm = def
                    .base_plot_module
                    .ok_or_else(|| missing("basePlotModule"))?;
                validate_name(&bpm.name, "subplot")?;
                let base_plot_module = match self.subplots.get(&bpm.name) {
                    Some(existing) => existing,
                    None => match base_plots.get(&bpm.name) {
                        Some(parsed) => parsed.clone(),
                        None => {
                            let parsed = Rc::new(parse_base_plot(&bpm)?);
                            base_plots.insert(bpm.name.clone(), parsed.clone());
                            parsed
                        }
                    },
                };

                Ok(Pending::Trace {
                    module: Rc::new(TraceModule {
                        attributes: parse_container(def.attributes.as_ref(), &name)?,
                        layout_attributes: parse_optional(def.layout_attributes.as_ref(), &name)?,
                        name,
                        categories,
                        base_plot_module,
                        supply_defaults: def.supply_defaults,
                        supply_layout_defaults: def.supply_layout_defaults,
                        meta: def.meta.unwrap_or(Value::Undefined),
                    }),
                })
            }
            ModuleType::Transform => {
                if def.transform.is_none() && def.calc_transform.is_none() {
                    return Err(RegistryError::MissingTransform {
                        module: name.to_string(),
                    });
                }
                let has_attributes = def.attributes.as_ref().is_some_and(|a| a.is_object());
                Ok(Pending::Transform {
                    module: Rc::new(TransformModule {
                        attributes: parse_container(def.attributes.as_ref(), &name)?,
                        name,
                        supply_defaults: def.supply_defaults,
                        transform: def.transform,
                        calc_transform: def.calc_transform,
                    }),
                    has_attributes,
                })
            }
            ModuleType::Component => {
                let raw = match &def.schema {
                    Some(json) => RawComponentSchema::deserialize(json).map_err(|e| {
                        RegistryError::Schema {
                            module: name.to_string(),
                            source: SchemaError::Json(e.to_string()),
                        }
                    })?,
                    None => RawComponentSchema::default(),
                };
                let parse_keyed = |entries: &IndexMap<String, serde_json::Value>| {
                    entries
                        .iter()
                        .map(|(k, v)| {
                            let attrs = parse_container(Some(v), &name)?;
                            Ok::<_, RegistryError>((Rc::from(k.as_str()), attrs))
                        })
                        .collect::<Result<IndexMap<Rc<str>, Rc<Composite>>, RegistryError>>()
                };

                Ok(Pending::Component(Rc::new(ComponentModule {
                    layout_attributes: parse_optional(def.layout_attributes.as_ref(), &name)?,
                    supply_layout_defaults: def.supply_layout_defaults,
                    trace_attributes: parse_keyed(&raw.traces)?,
                    subplot_attributes: parse_keyed(&raw.subplots)?,
                    base_layout_attributes: parse_optional(raw.layout.as_ref(), &name)?,
                    name,
                })))
            }
        }
    }

    fn commit(&mut self, pending: Pending) -> Result<(), RegistryError> {
        match pending {
            Pending::Trace { module } => {
                let bpm = &module.base_plot_module;
                if !self.subplots.contains(&bpm.name) {
                    if self.logging > 1 {
                        tracing::debug!("registering base plot module {}", bpm.name);
                    }
                    self.subplots.register(bpm.name.clone(), bpm.clone())?;
                }
                let name = module.name.clone();
                if self.traces.register(name.clone(), module)?.is_some() && self.logging > 1 {
                    tracing::debug!("Type {name} already registered; replacing it");
                }
            }
            Pending::Transform {
                module,
                has_attributes,
            } => {
                let prefix = format!("Transform module {}", module.name);
                if module.transform.is_some() && module.calc_transform.is_some() && self.logging > 1 {
                    tracing::info!(
                        "{prefix} has both a *transform* and *calcTransform* methods. \
                         Please note that all *transform* methods are executed \
                         before all *calcTransform* methods."
                    );
                }
                if self.logging > 0 {
                    if !has_attributes {
                        tracing::warn!("{prefix} registered without an *attributes* object.");
                    }
                    if module.supply_defaults.is_none() {
                        tracing::warn!("{prefix} registered without a *supplyDefaults* method.");
                    }
                }
                let name = module.name.clone();
                if self.transforms.register(name.clone(), module)?.is_some() && self.logging > 1 {
                    tracing::debug!("{prefix} already registered; replacing it");
                }
            }
            Pending::Component(module) => {
                let name = module.name.clone();
                if self.components.register(name.clone(), module)?.is_some() && self.logging > 1 {
                    tracing::debug!("Component {name} already registered; replacing it");
                }
            }
        }
        Ok(())
    }

    pub fn lookup(&self, module_type: ModuleType, name: &str) -> Option<Module> {
        match module_type {
            ModuleType::Trace => self.traces.get(name).map(Module::Trace),
            ModuleType::Transform => self.transforms.get(name).map(Module::Transform),
            ModuleType::Component => self.components.get(name).map(Module::Component),
        }
    }

    pub fn trace(&self, name: &str) -> Option<Rc<TraceModule>> {
        self.traces.get(name)
    }

    pub fn transform(&self, name: &str) -> Option<Rc<TransformModule>> {
        self.transforms.get(name)
    }

    pub fn component(&self, name: &str) -> Option<Rc<ComponentModule>> {
        self.components.get(name)
    }

    pub fn base_plot(&self, name: &str) -> Option<Rc<BasePlotModule>> {
        self.subplots.get(name)
    }

    /// Whether `trace_type` belongs to `category`. Unknown types answer for
    /// the default trace type.
    pub fn trace_is(&self, trace_type: &str, category: &str) -> bool {
        let module = match self.traces.get(trace_type) {
            Some(m) => Some(m),
            None => {
                if !trace_type.is_empty() && self.logging > 1 {
                    tracing::debug!("Unrecognized trace type {trace_type}.");
                }
                self.traces.get(&self.default_trace_type)
            }
        };
        module.is_some_and(|m| m.is(category))
    }

    /// Registered trace types in registration order.
    pub fn all_trace_types(&self) -> Vec<Rc<str>> {
        self.traces.list_names()
    }

    pub fn transform_names(&self) -> Vec<Rc<str>> {
        self.transforms.list_names()
    }

    pub fn component_names(&self) -> Vec<Rc<str>> {
        self.components.list_names()
    }

    pub fn traces(&self) -> impl Iterator<Item = &Rc<TraceModule>> + '_ {
        self.traces.iter().map(|(_, m)| m)
    }

    pub fn transforms(&self) -> impl Iterator<Item = &Rc<TransformModule>> + '_ {
        self.transforms.iter().map(|(_, m)| m)
    }

    pub fn components(&self) -> impl Iterator<Item = &Rc<ComponentModule>> + '_ {
        self.components.iter().map(|(_, m)| m)
    }

    pub fn base_plots(&self) -> impl Iterator<Item = &Rc<BasePlotModule>> + '_ {
        self.subplots.iter().map(|(_, m)| m)
    }
}

fn parse_optional(
    json: Option<&serde_json::Value>,
    module: &Rc<str>,
) -> Result<Option<Rc<Composite>>, RegistryError> {
    json.map(|j| parse_container(Some(j), module)).transpose()
}

/// Parses a module's attribute container; a missing one is empty.
fn parse_container(
    json: Option<&serde_json::Value>,
    module: &Rc<str>,
) -> Result<Rc<Composite>, RegistryError> {
    let Some(json) = json else {
        return Ok(Rc::new(Composite::new()));
    };
    let schema_error = |source| RegistryError::Schema {
        module: module.to_string(),
        source,
    };
    match Node::from_serde_json_value(json).map_err(schema_error)? {
        Node::Composite(c) => Ok(c),
        Node::Attribute(_) => Err(schema_error(SchemaError::InvalidOption {
            path: String::new(),
            option: "attributes",
            reason: "module attributes must be a container".to_string(),
        })),
    }
}

fn parse_base_plot(def: &BasePlotDef) -> Result<BasePlotModule, RegistryError> {
    if def.attr.len() != def.id_root.len() {
        return Err(RegistryError::MissingField {
            module_type: "subplot",
            module: def.name.to_string(),
            field: "idRoot for every attr",
        });
    }

    let mut layout_attributes = parse_container(def.layout_attributes.as_ref(), &def.name)?;
    // Subplot objects repeat with counters (`xaxis2`).
    Rc::make_mut(&mut layout_attributes).is_subplot_obj = true;

    Ok(BasePlotModule {
        name: def.name.clone(),
        attr: def.attr.clone(),
        id_root: def.id_root.clone(),
        attributes: parse_container(def.attributes.as_ref(), &def.name)?,
        layout_attributes,
        supply_layout_defaults: def.supply_layout_defaults.clone(),
    })
}

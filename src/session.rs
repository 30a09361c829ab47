// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::builtin;
use crate::plots::{self, FullFigure};
use crate::registry::{ModuleRegistry, ModuleType, Module, Registration, RegistryError, TransformModule};
use crate::schema::{crawl, describe};
use crate::schema::{Attribute, Composite, Node, SchemaError, ValType};
use crate::validate::{self, Diagnostic};
use crate::value::{Map, Value};

use anyhow::{bail, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::rc::Rc;

#[cfg(test)]
mod tests;

/// Session settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct Config {
    /// 0 is silent, 1 logs warnings, 2 also logs every diagnostic and
    /// registration detail.
    pub logging: u8,
    pub default_trace_type: String,
    /// Trace colors handed out by trace position.
    pub color_palette: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: 1,
            default_trace_type: "scatter".to_string(),
            color_palette: [
                "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2",
                "#7f7f7f", "#bcbd22", "#17becf",
            ]
            .iter()
            .map(|c| c.to_string())
            .collect(),
        }
    }
}

impl Config {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        if config.logging > 2 {
            bail!("logging must be 0, 1 or 2, got {}", config.logging);
        }
        Ok(config)
    }

    /// Color of the trace at `index`.
    pub fn default_color(&self, index: usize) -> &str {
        match self.color_palette.len() {
            0 => "#444",
            n => &self.color_palette[index % n],
        }
    }
}

/// Registered modules plus the base attribute trees, threaded through every
/// defaulting and validation call.
pub struct Session {
    config: Config,
    modules: ModuleRegistry,
    base_trace: Rc<Composite>,
    base_layout: Rc<Composite>,
}

impl Session {
    /// A session with the stock modules registered.
    pub fn new() -> Result<Self> {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Result<Self> {
        let mut session = Self::empty_with_config(config)?;
        builtin::register_all(&mut session)?;
        Ok(session)
    }

    /// A session without any registered module.
    pub fn empty() -> Result<Self> {
        Self::empty_with_config(Config::default())
    }

    fn empty_with_config(config: Config) -> Result<Self> {
        let mut modules = ModuleRegistry::new();
        modules.set_logging(config.logging);
        modules.set_default_trace_type(&config.default_trace_type);
        Ok(Self {
            base_trace: parse_base(&builtin::base_trace_attributes(), "trace")?,
            base_layout: parse_base(&builtin::base_layout_attributes(), "layout")?,
            config,
            modules,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn set_logging(&mut self, level: u8) {
        self.config.logging = level;
        self.modules.set_logging(level);
    }

    pub fn set_default_trace_type(&mut self, trace_type: &str) {
        self.config.default_trace_type = trace_type.to_string();
        self.modules.set_default_trace_type(trace_type);
    }

    pub fn set_color_palette(&mut self, palette: Vec<String>) {
        self.config.color_palette = palette;
    }

    pub fn register(&mut self, registration: impl Into<Registration>) -> Result<(), RegistryError> {
        self.modules.register(registration)
    }

    pub fn lookup(&self, module_type: ModuleType, name: &str) -> Option<Module> {
        self.modules.lookup(module_type, name)
    }

    pub fn modules(&self) -> &ModuleRegistry {
        &self.modules
    }

    pub fn trace_is(&self, trace_type: &str, category: &str) -> bool {
        self.modules.trace_is(trace_type, category)
    }

    /// Complete attribute tree of a trace type: base trace attributes, the
    /// module's own, its subplot references and component contributions.
    /// Unknown types get the default trace type's tree.
    pub fn trace_attributes(&self, trace_type: &str) -> Composite {
        let mut attrs = (*self.base_trace).clone();
        attrs.insert(
            "type",
            enumerated(
                self.modules.all_trace_types().into_iter().map(Value::from).collect(),
                Value::from(self.config.default_trace_type.as_str()),
                "calc+clearAxisTypes",
            ),
        );

        let module = self
            .modules
            .trace(trace_type)
            .or_else(|| self.modules.trace(self.modules.default_trace_type()));
        if let Some(module) = module {
            attrs.merge(&module.attributes);
            attrs.merge(&module.base_plot_module.attributes);
            for component in self.modules.components() {
                if let Some(extra) = component.trace_attributes.get(&module.name) {
                    attrs.merge(extra);
                }
            }
        }
        attrs
    }

    /// Attribute tree of one `transforms[i]` item of the given type.
    pub fn transform_attributes(&self, module: &TransformModule) -> Composite {
        let mut attrs = transform_base(vec![Value::from(module.name.clone())]);
        attrs.merge(&module.attributes);
        attrs
    }

    /// Attribute tree of a transform item whose type is not registered.
    pub(crate) fn unknown_transform_attributes(&self) -> Composite {
        transform_base(
            self.modules
                .transform_names()
                .into_iter()
                .map(Value::from)
                .collect(),
        )
    }

    /// Base layout attributes with component contributions, without any
    /// subplot or component container.
    pub fn base_layout_attributes(&self) -> Composite {
        let mut attrs = (*self.base_layout).clone();
        for component in self.modules.components() {
            if let Some(extra) = &component.base_layout_attributes {
                attrs.merge(extra);
            }
        }
        attrs
    }

    /// Complete layout attribute tree for a set of full traces: base layout,
    /// every subplot object, every component container and the layout
    /// attributes of the trace types present.
    pub fn layout_attributes(&self, full_data: &[Value]) -> Composite {
        let mut attrs = self.base_layout_attributes();

        for bpm in self.modules.base_plots() {
            for key in &bpm.attr {
                let mut subplot = (*bpm.layout_attributes).clone();
                for component in self.modules.components() {
                    if let Some(extra) = component.subplot_attributes.get(key) {
                        subplot.merge(extra);
                    }
                }
                attrs.insert(key.clone(), Node::Composite(Rc::new(subplot)));
            }
        }

        for component in self.modules.components() {
            if let Some(layout_attrs) = &component.layout_attributes {
                attrs.insert(component.name.clone(), Node::Composite(layout_attrs.clone()));
            }
        }

        let mut seen: Vec<&str> = vec![];
        for trace in full_data {
            let Value::String(trace_type) = &trace["type"] else {
                continue;
            };
            if seen.contains(&&**trace_type) {
                continue;
            }
            seen.push(trace_type);
            if let Some(extra) = self
                .modules
                .trace(trace_type)
                .and_then(|m| m.layout_attributes.clone())
            {
                attrs.merge(&extra);
            }
        }
        attrs
    }

    /// Builds the full figure: every attribute of every trace and of the
    /// layout resolved against the registered modules.
    pub fn supply_defaults(&self, data: &[Value], layout: &Value) -> Result<FullFigure> {
        plots::supply_defaults(self, data, layout)
    }

    /// Runs the value transforms of every trace, then the calc transforms.
    pub fn apply_transforms(&self, figure: &FullFigure) -> Result<Vec<Value>> {
        plots::apply_transforms(self, figure)
    }

    /// Lints a data/layout pair. `Ok(None)` means no problem was found.
    pub fn validate(&self, data: &Value, layout: &Value) -> Result<Option<Vec<Diagnostic>>> {
        validate::validate(self, data, layout)
    }

    /// Describes everything registered: the attributes of every trace type
    /// and transform, the layout attributes, and the value type and edit
    /// type catalogs under `defs`.
    pub fn schema(&self) -> Result<Value> {
        let mut traces = Map::new();
        for module in self.modules.traces() {
            let name = &module.name;
            let mut attrs = self.trace_attributes(name);
            if self.trace_is(name, "noOpacity") {
                attrs.children.shift_remove("opacity");
            }
            if !self.trace_is(name, "showLegend") {
                attrs.children.shift_remove("showlegend");
                attrs.children.shift_remove("legendgroup");
            }
            if self.trace_is(name, "noHover") {
                attrs.children.shift_remove("hoverinfo");
            }

            let mut attributes = describe::format_attributes(&attrs)?;
            attributes.insert("type", Value::from(name.clone()))?;

            let mut trace = Map::new();
            let meta = match &module.meta {
                Value::Undefined => Value::new_object(),
                meta => meta.clone(),
            };
            trace.insert("meta".into(), meta);
            let categories: Vec<Value> = module.categories.iter().cloned().map(Value::from).collect();
            trace.insert("categories".into(), Value::from(categories));
            trace.insert("type".into(), Value::from(name.clone()));
            trace.insert("attributes".into(), attributes);
            if let Some(layout_attrs) = &module.layout_attributes {
                trace.insert("layoutAttributes".into(), describe::format_attributes(layout_attrs)?);
            }
            traces.insert(name.clone(), Value::from(trace));
        }

        let mut transforms = Map::new();
        for module in self.modules.transforms() {
            let mut transform = Map::new();
            transform.insert(
                "attributes".into(),
                describe::format_attributes(&self.transform_attributes(module))?,
            );
            transforms.insert(module.name.clone(), Value::from(transform));
        }

        let mut layout = Map::new();
        layout.insert(
            "layoutAttributes".into(),
            describe::format_attributes(&self.layout_attributes(&[]))?,
        );

        let mut schema = Map::new();
        schema.insert("defs".into(), describe::definitions());
        schema.insert("traces".into(), Value::from(traces));
        schema.insert("layout".into(), Value::from(layout));
        schema.insert("transforms".into(), Value::from(transforms));
        Ok(Value::from(schema))
    }

    /// Edit type of every attribute of a trace type.
    pub fn trace_edit_types(&self, trace_type: &str) -> IndexMap<String, Rc<str>> {
        crawl::edit_types(&self.trace_attributes(trace_type))
    }

    /// Attribute strings of the arrays a full trace carries.
    pub fn find_array_attributes(&self, trace: &Value) -> Vec<String> {
        let trace_type = match &trace["type"] {
            Value::String(t) => t.to_string(),
            _ => self.config.default_trace_type.clone(),
        };
        crawl::find_array_attributes(trace, &self.trace_attributes(&trace_type))
    }
}

fn parse_base(json: &serde_json::Value, which: &str) -> Result<Rc<Composite>> {
    match Node::from_serde_json_value(json)? {
        Node::Composite(c) => Ok(c),
        Node::Attribute(_) => Err(SchemaError::NotAnObject {
            path: which.to_string(),
        }
        .into()),
    }
}

pub(crate) fn enumerated(values: Vec<Value>, dflt: Value, edit_type: &str) -> Node {
    Node::Attribute(Rc::new(Attribute {
        val_type: ValType::Enumerated {
            values,
            coerce_number: false,
        },
        dflt,
        array_ok: false,
        edit_type: Some(edit_type.into()),
        implied_edits: IndexMap::new(),
        description: None,
    }))
}

fn transform_base(types: Vec<Value>) -> Composite {
    let mut attrs = Composite::new();
    attrs.insert("type", enumerated(types, Value::Undefined, "calc"));
    attrs.insert(
        "enabled",
        Node::Attribute(Rc::new(Attribute {
            val_type: ValType::Boolean,
            dflt: Value::from(true),
            array_ok: false,
            edit_type: Some("calc".into()),
            implied_edits: IndexMap::new(),
            description: None,
        })),
    );
    attrs
}

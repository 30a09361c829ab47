// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Building the full figure.
//!
//! Global layout defaults come first since trace defaults may consult
//! them. Every trace is then defaulted by its module, and finally the
//! subplot, trace-type and component modules fill in the layout pieces that
//! depend on the data.

use crate::coerce::Coercer;
use crate::path::PropPath;
use crate::registry::{DefaultsContext, LayoutContext, TransformContext};
use crate::schema::{split_counter, Node};
use crate::session::Session;
use crate::value::{Map, Value};

use anyhow::Result;
use std::rc::Rc;


/// Fully defaulted data and layout.
#[derive(Debug, Clone, PartialEq)]
pub struct FullFigure {
    pub data: Vec<Value>,
    pub layout: Value,
}

#[tracing::instrument(level = "debug", skip_all, fields(traces = data.len()))]
pub fn supply_defaults(session: &Session, data: &[Value], layout: &Value) -> Result<FullFigure> {
    let layout = &clean_layout(layout);
    let mut full_layout = Value::new_object();
    supply_layout_global_defaults(session, layout, &mut full_layout)?;

    let mut full_data = Vec::with_capacity(data.len());
    for (index, trace) in data.iter().enumerate() {
        full_data.push(supply_trace_defaults(session, trace, index, layout, &full_layout)?);
    }

    supply_layout_module_defaults(session, layout, &mut full_layout, &full_data)?;

    Ok(FullFigure {
        data: full_data,
        layout: full_layout,
    })
}

fn supply_layout_global_defaults(session: &Session, layout_in: &Value, layout_out: &mut Value) -> Result<()> {
    let schema = Node::Composite(Rc::new(session.base_layout_attributes()));
    let mut c = Coercer::new(layout_in, layout_out, &schema);

    let font = c.coerce_font("font", &Value::Undefined)?;
    c.coerce("title.text")?;
    c.coerce_font("title.font", &scaled_font(&font, 1.4))?;

    let sized = layout_in["width"].is_truthy() && layout_in["height"].is_truthy();
    c.coerce_with_default("autosize", if sized { Value::from(false) } else { Value::from("initial") })?;
    c.coerce("width")?;
    c.coerce("height")?;

    for side in ["l", "r", "t", "b", "pad", "autoexpand"] {
        c.coerce(&format!("margin.{side}"))?;
    }

    c.coerce("paper_bgcolor")?;
    c.coerce("plot_bgcolor")?;
    c.coerce("separators")?;
    c.coerce("hidesources")?;
    Ok(())
}

/// Expands the shorthand `title: "..."` of the layout and of every axis
/// into `title: {text: "..."}`. Numbers are accepted as titles too.
pub fn clean_layout(layout: &Value) -> Value {
    let mut cleaned = layout.clone();
    if let Value::Object(fields) = &mut cleaned {
        let fields = Rc::make_mut(fields);
        clean_title(fields);
        for (key, container) in fields.iter_mut() {
            let is_axis = split_counter(key).is_some_and(|(base, _)| base == "xaxis" || base == "yaxis");
            if let (true, Value::Object(axis)) = (is_axis, container) {
                if needs_cleaning(axis) {
                    clean_title(Rc::make_mut(axis));
                }
            }
        }
    }
    cleaned
}

fn needs_cleaning(container: &Map) -> bool {
    matches!(container.get("title"), Some(Value::String(_) | Value::Number(_)))
}

fn clean_title(container: &mut Map) {
    if let Some(title) = container.get_mut("title") {
        if matches!(title, Value::String(_) | Value::Number(_)) {
            let mut text = Map::new();
            text.insert("text".into(), title.clone());
            *title = Value::from(text);
        }
    }
}

/// Font defaults derived from `font` with the size scaled by `factor`.
pub fn scaled_font(font: &Value, factor: f64) -> Value {
    let mut scaled = Map::new();
    scaled.insert("family".into(), font["family"].clone());
    if let Value::Number(size) = &font["size"] {
        scaled.insert("size".into(), Value::from((size * factor).round()));
    }
    scaled.insert("color".into(), font["color"].clone());
    Value::from(scaled)
}

fn trace_type_of(session: &Session, trace_in: &Value) -> Result<Rc<str>> {
    let attrs = Node::Composite(Rc::new(session.trace_attributes(&session.config().default_trace_type)));
    let mut scratch = Value::new_object();
    match crate::coerce::coerce(trace_in, &mut scratch, &attrs, "type", &Value::Undefined)? {
        Value::String(t) => Ok(t),
        _ => Ok(session.config().default_trace_type.as_str().into()),
    }
}

fn supply_trace_defaults(
    session: &Session,
    trace_in: &Value,
    index: usize,
    layout_in: &Value,
    full_layout: &Value,
) -> Result<Value> {
    let mut trace_out = Value::new_object();
    trace_out.insert("index", Value::from(index))?;
    if !trace_in.is_object() {
        return Ok(trace_out);
    }

    let trace_type = trace_type_of(session, trace_in)?;
    let schema = Node::Composite(Rc::new(session.trace_attributes(&trace_type)));
    let modules = session.modules();
    let module = modules.trace(&trace_type);

    let mut c = Coercer::new(trace_in, &mut trace_out, &schema);
    let visible = c.coerce("visible")?;
    c.coerce("type")?;
    c.coerce("uid")?;

    if visible.is_truthy() {
        if let Some(supply) = module.as_ref().and_then(|m| m.supply_defaults.clone()) {
            let ctx = DefaultsContext {
                index,
                default_color: session.config().default_color(index),
                layout: layout_in,
                full_layout,
                full_trace: &Value::Undefined,
            };
            supply(&mut c, &ctx)?;
        }
    }

    // The module may have found required data missing.
    if c.output()["visible"].is_truthy() {
        c.coerce_with_default("name", format!("trace {index}"))?;
        c.coerce("hoverinfo")?;
        if !modules.trace_is(&trace_type, "noOpacity") {
            c.coerce("opacity")?;
        }
        if let Some(module) = &module {
            for attr in &module.base_plot_module.attr {
                if module.base_plot_module.attributes.contains_key(attr) {
                    c.coerce(attr)?;
                }
            }
        }
        if modules.trace_is(&trace_type, "showLegend") {
            c.coerce("showlegend")?;
            c.coerce("legendgroup")?;
        }
        drop(c);
        supply_transform_defaults(session, trace_in, &mut trace_out, index, layout_in, full_layout)?;
    }

    Ok(trace_out)
}

fn supply_transform_defaults(
    session: &Session,
    trace_in: &Value,
    trace_out: &mut Value,
    index: usize,
    layout_in: &Value,
    full_layout: &Value,
) -> Result<()> {
    let Value::Array(items) = &trace_in["transforms"] else {
        return Ok(());
    };

    let mut out = Vec::with_capacity(items.len());
    for (i, item_in) in items.iter().enumerate() {
        let mut item_out = Value::new_object();
        let module = match &item_in["type"] {
            Value::String(t) => session.modules().transform(t),
            _ => None,
        };

        match module {
            Some(module) if item_in.is_object() => {
                let schema = Node::Composite(Rc::new(session.transform_attributes(&module)));
                let ctx = DefaultsContext {
                    index,
                    default_color: session.config().default_color(index),
                    layout: layout_in,
                    full_layout,
                    full_trace: &*trace_out,
                };
                let mut c = Coercer::new(item_in, &mut item_out, &schema);
                c.coerce("type")?;
                if c.coerce("enabled")?.is_truthy() {
                    if let Some(supply) = &module.supply_defaults {
                        supply(&mut c, &ctx)?;
                    }
                }
            }
            Some(_) => (),
            None => {
                if item_in.is_object() && session.config().logging > 0 {
                    tracing::warn!("Unrecognized transform type {}.", item_in["type"].to_inline_string());
                }
            }
        }

        item_out.insert("_index", Value::from(i))?;
        out.push(item_out);
    }

    trace_out.insert("transforms", Value::from(out))?;
    Ok(())
}

fn supply_layout_module_defaults(
    session: &Session,
    layout_in: &Value,
    layout_out: &mut Value,
    full_data: &[Value],
) -> Result<()> {
    let schema = Node::Composite(Rc::new(session.layout_attributes(full_data)));
    let modules = session.modules();
    let ctx = LayoutContext {
        full_data,
        modules,
    };
    let mut c = Coercer::new(layout_in, layout_out, &schema);

    for bpm in modules.base_plots() {
        if let Some(supply) = &bpm.supply_layout_defaults {
            supply(&mut c, &ctx)?;
        }
    }

    for module in modules.traces() {
        let present = full_data
            .iter()
            .any(|t| matches!(&t["type"], Value::String(s) if *s == module.name));
        if let (true, Some(supply)) = (present, &module.supply_layout_defaults) {
            supply(&mut c, &ctx)?;
        }
    }

    let legend_items = full_data
        .iter()
        .filter(|t| t["visible"].is_truthy() && t["showlegend"] == Value::Bool(true))
        .count();
    c.coerce_with_default("showlegend", legend_items > 1)?;

    for component in modules.components() {
        if let Some(supply) = &component.supply_layout_defaults {
            supply(&mut c, &ctx)?;
        }
    }
    Ok(())
}

/// Defaults every item of the array container at `container`.
///
/// Object items are handed to `item_defaults` with their attribute prefix
/// (`annotations[2]`); any other item is marked not visible. Each output
/// item records the input position it came from under `_index`. The output
/// container is always written, empty when the input holds no array.
/// Returns the number of input items.
pub fn array_container_defaults<F>(c: &mut Coercer<'_>, container: &str, mut item_defaults: F) -> Result<usize>
where
    F: FnMut(&mut Coercer<'_>, &str) -> Result<()>,
{
    let path = PropPath::parse(container)?;
    c.set(container, Value::new_array())?;
    let items = match path.get(c.input()) {
        Value::Array(items) => items.clone(),
        _ => return Ok(0),
    };

    for (i, item) in items.iter().enumerate() {
        let prefix = format!("{container}[{i}]");
        if item.is_object() {
            item_defaults(c, &prefix)?;
        } else {
            c.set(&format!("{prefix}.visible"), false)?;
        }
        c.set(&format!("{prefix}._index"), i)?;
    }
    Ok(items.len())
}

/// Applies the transforms of a full figure: every value transform of every
/// trace first, then every calc transform.
#[tracing::instrument(level = "debug", skip_all)]
pub fn apply_transforms(session: &Session, figure: &FullFigure) -> Result<Vec<Value>> {
    let mut traces = vec![];
    for trace in &figure.data {
        let mut expanded = vec![trace.clone()];
        if trace["visible"].is_truthy() {
            let schema = session.trace_attributes(&trace["type"].to_inline_string());
            let ctx = TransformContext {
                schema: &schema,
                full_layout: &figure.layout,
            };
            for opts in enabled_transforms(trace) {
                let Some(transform) = transform_module(session, &opts).and_then(|m| m.transform.clone()) else {
                    continue;
                };
                let mut next = vec![];
                for t in &expanded {
                    next.extend(transform(t, &opts, &ctx)?);
                }
                expanded = next;
            }
        }
        traces.extend(expanded);
    }

    for trace in &mut traces {
        if !trace["visible"].is_truthy() {
            continue;
        }
        let schema = session.trace_attributes(&trace["type"].to_inline_string());
        let ctx = TransformContext {
            schema: &schema,
            full_layout: &figure.layout,
        };
        for opts in enabled_transforms(trace) {
            if let Some(calc) = transform_module(session, &opts).and_then(|m| m.calc_transform.clone()) {
                calc(trace, &opts, &ctx)?;
            }
        }
    }

    Ok(traces)
}

fn enabled_transforms(trace: &Value) -> Vec<Value> {
    match &trace["transforms"] {
        Value::Array(items) => items
            .iter()
            .filter(|t| t["enabled"].is_truthy())
            .cloned()
            .collect(),
        _ => vec![],
    }
}

fn transform_module(session: &Session, opts: &Value) -> Option<Rc<crate::registry::TransformModule>> {
    match &opts["type"] {
        Value::String(t) => session.modules().transform(t),
        _ => None,
    }
}

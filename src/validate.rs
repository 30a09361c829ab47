// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![allow(clippy::pattern_type_mismatch)]

//! Linting of raw figure input.
//!
//! The input is defaulted once with [`Session::supply_defaults`] and then
//! replayed key by key against the resulting full figure. Every key the user
//! wrote is classified: unknown to the schema, ignored by the defaults,
//! rejected by its declaration, or shaped wrong for its container.

use crate::coerce::{is_valid, DefaultGrammar};
use crate::path::{PropPath, Segment};
use crate::plots::clean_layout;
use crate::schema::{Attribute, Composite, Node, ValType};
use crate::session::{self, Session};
use crate::value::Value;

use anyhow::Result;
use core::fmt;
use serde::Serialize;
use std::rc::Rc;


#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticCode {
    /// A container should be an object.
    Object,
    /// A container should be an array.
    Array,
    /// The key is not declared anywhere.
    Schema,
    /// The key is declared but the defaults never read it.
    Unused,
    /// A trace or array item was defaulted to not visible.
    Invisible,
    /// The value is not acceptable for its declaration.
    Value,
}

impl DiagnosticCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticCode::Object => "object",
            DiagnosticCode::Array => "array",
            DiagnosticCode::Schema => "schema",
            DiagnosticCode::Unused => "unused",
            DiagnosticCode::Invisible => "invisible",
            DiagnosticCode::Value => "value",
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Container {
    Data,
    Layout,
}

/// One finding of [`validate`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub container: Container,
    /// Trace position for findings inside a trace.
    pub trace: Option<usize>,
    pub path: Vec<Segment>,
    /// `path` as an attribute string (`xaxis.range[1]`).
    pub astr: String,
    pub msg: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Base {
    /// The data argument itself, or one of its traces.
    Data(Option<usize>),
    Layout,
}

impl Base {
    fn container(self) -> Container {
        match self {
            Base::Data(_) => Container::Data,
            Base::Layout => Container::Layout,
        }
    }

    fn trace(self) -> Option<usize> {
        match self {
            Base::Data(trace) => trace,
            Base::Layout => None,
        }
    }

    fn prefix(self) -> String {
        match self {
            Base::Data(Some(i)) => format!("In data trace {i}, "),
            Base::Data(None) => "In data, ".to_string(),
            Base::Layout => "In layout, ".to_string(),
        }
    }
}

fn message(code: DiagnosticCode, base: Base, astr: &str, value: &Value) -> String {
    let prefix = base.prefix();
    match code {
        DiagnosticCode::Object => match base {
            Base::Layout if astr.is_empty() => {
                "The layout argument must be linked to an object container".to_string()
            }
            Base::Data(Some(i)) if astr.is_empty() => {
                format!("Trace {i} in the data argument must be linked to an object container")
            }
            _ => format!("{prefix}key {astr} must be linked to an object container"),
        },
        DiagnosticCode::Array => match base {
            Base::Data(None) => "The data argument must be linked to an array container".to_string(),
            _ => format!("{prefix}key {astr} must be linked to an array container"),
        },
        DiagnosticCode::Schema => format!("{prefix}key {astr} is not part of the schema"),
        DiagnosticCode::Unused => {
            let target = if value.is_object() { "container" } else { "key" };
            format!("{prefix}{target} {astr} did not get coerced")
        }
        DiagnosticCode::Invisible => match base {
            Base::Data(Some(i)) if astr.is_empty() => format!("Trace {i} got defaulted to be not visible"),
            _ => format!("{prefix}item {astr} got defaulted to be not visible"),
        },
        DiagnosticCode::Value => format!(
            "{prefix}key {astr} is set to an invalid value ({})",
            value.to_inline_string()
        ),
    }
}

/// Lints `data` and `layout`. Returns `Ok(None)` when nothing was found.
///
/// An `Undefined` argument counts as omitted: no data and an empty layout.
#[tracing::instrument(level = "debug", skip_all)]
pub fn validate(session: &Session, data: &Value, layout: &Value) -> Result<Option<Vec<Diagnostic>>> {
    let mut linter = Linter {
        session,
        logging: session.config().logging,
        diagnostics: vec![],
    };

    let data_in: Vec<Value> = match data {
        Value::Undefined => vec![],
        Value::Array(traces) => traces.to_vec(),
        _ => {
            linter.push(DiagnosticCode::Array, Base::Data(None), vec![], &Value::Undefined);
            vec![]
        }
    };
    let layout_in = match layout {
        Value::Undefined => Value::new_object(),
        // Title shorthands are replayed in their expanded form.
        Value::Object(_) => clean_layout(layout),
        _ => {
            linter.push(DiagnosticCode::Object, Base::Layout, vec![], &Value::Undefined);
            Value::new_object()
        }
    };

    let full = session.supply_defaults(&data_in, &layout_in)?;

    for (i, trace_in) in data_in.iter().enumerate() {
        let base = Base::Data(Some(i));
        if !trace_in.is_object() {
            linter.push(DiagnosticCode::Object, base, vec![], trace_in);
            continue;
        }

        let trace_out = full.data.get(i).unwrap_or(&Value::Undefined);
        let trace_type = match &trace_out["type"] {
            Value::String(t) => t.clone(),
            _ => Rc::from(session.config().default_trace_type.as_str()),
        };
        let mut schema = session.trace_attributes(&trace_type);
        schema.insert(
            "type",
            session::enumerated(vec![Value::from(trace_type)], Value::Undefined, "calc"),
        );

        if trace_out["visible"] == Value::Bool(false) && trace_in["visible"] != Value::Bool(false) {
            linter.push(DiagnosticCode::Invisible, base, vec![], &Value::Undefined);
        }

        linter.crawl(trace_in, trace_out, &schema, base, &[]);
    }

    let layout_schema = session.layout_attributes(&full.data);
    linter.crawl(&layout_in, &full.layout, &layout_schema, Base::Layout, &[]);

    if linter.diagnostics.is_empty() {
        Ok(None)
    } else {
        Ok(Some(linter.diagnostics))
    }
}

struct Linter<'a> {
    session: &'a Session,
    logging: u8,
    diagnostics: Vec<Diagnostic>,
}

fn child(path: &[Segment], segment: impl Into<Segment>) -> Vec<Segment> {
    let mut p = path.to_vec();
    p.push(segment.into());
    p
}

impl Linter<'_> {
    fn push(&mut self, code: DiagnosticCode, base: Base, path: Vec<Segment>, value: &Value) {
        let astr = PropPath::from_segments(path.clone()).to_string();
        let msg = message(code, base, &astr, value);
        if self.logging > 1 {
            tracing::info!("{msg}");
        }
        self.diagnostics.push(Diagnostic {
            code,
            container: base.container(),
            trace: base.trace(),
            path,
            astr,
            msg,
        });
    }

    fn crawl(&mut self, obj_in: &Value, obj_out: &Value, schema: &Composite, base: Base, path: &[Segment]) {
        let Value::Object(fields) = obj_in else {
            return;
        };

        for (key, val_in) in fields.iter() {
            let key: &str = key;
            let p = child(path, key);
            let val_out = &obj_out[key];

            if path.is_empty() && matches!(base, Base::Data(Some(_))) && key == "transforms" {
                self.crawl_transforms(val_in, val_out, base, p);
                continue;
            }

            match schema.get(key) {
                None => self.push(DiagnosticCode::Schema, base, p, val_in),
                Some(Node::Composite(c)) => self.check_composite(val_in, val_out, c, base, p),
                Some(Node::Attribute(a)) => self.check_attribute(val_in, val_out, a, base, p),
            }
        }
    }

    fn check_composite(&mut self, val_in: &Value, val_out: &Value, schema: &Composite, base: Base, p: Vec<Segment>) {
        match (val_in, val_out) {
            (Value::Object(_), Value::Object(_)) => self.crawl(val_in, val_out, schema, base, &p),
            (Value::Array(items), _) if schema.is_linked_to_array() => {
                self.check_linked_array(items, val_out, schema, base, &p)
            }
            (_, Value::Object(_)) => self.push(DiagnosticCode::Object, base, p, val_in),
            (v, Value::Array(_)) if !v.is_array() => self.push(DiagnosticCode::Array, base, p, val_in),
            (_, Value::Undefined) => self.push(DiagnosticCode::Unused, base, p, val_in),
            // A container never holds a plain value.
            _ => self.push(DiagnosticCode::Value, base, p, val_in),
        }
    }

    fn check_attribute(&mut self, val_in: &Value, val_out: &Value, attr: &Attribute, base: Base, p: Vec<Segment>) {
        let is_info_array = matches!(attr.val_type, ValType::InfoArray { .. });
        let is_colorscale = matches!(attr.val_type, ValType::Colorscale);

        match (val_in, val_out) {
            (Value::Object(_), Value::Object(_)) if !matches!(attr.val_type, ValType::Any) => {
                // Nothing is declared below a leaf.
                self.crawl(val_in, val_out, &Composite::new(), base, &p)
            }
            (Value::Array(_), _) if is_info_array => self.check_info_array(val_in, val_out, attr, base, &p),
            (v, Value::Object(_)) if !v.is_object() => self.push(DiagnosticCode::Object, base, p, val_in),
            (v, Value::Array(_)) if !v.is_array() && !is_colorscale => {
                self.push(DiagnosticCode::Array, base, p, val_in)
            }
            // Without a default an invalid value leaves nothing behind either.
            (_, Value::Undefined) if !attr.dflt.is_undefined() || is_valid(val_in, attr, &DefaultGrammar) => {
                self.push(DiagnosticCode::Unused, base, p, val_in)
            }
            _ if !is_valid(val_in, attr, &DefaultGrammar) => self.push(DiagnosticCode::Value, base, p, val_in),
            _ => (),
        }
    }

    fn check_info_array(&mut self, val_in: &Value, val_out: &Value, attr: &Attribute, base: Base, p: &[Segment]) {
        let ValType::InfoArray {
            items,
            free_length,
            dimensions,
        } = &attr.val_type
        else {
            return;
        };
        let in_len = val_in.array_len();
        let out_len = val_out.array_len();
        if in_len > out_len {
            self.push(DiagnosticCode::Unused, base, child(p, out_len), &val_in[out_len]);
        }

        let len = items.len().map_or(out_len, |n| n.min(out_len));
        for n in 0..len {
            let part_in = &val_in[n];
            if *dimensions == 2 {
                let Value::Array(row_in) = part_in else {
                    self.push(DiagnosticCode::Array, base, child(p, n), part_in);
                    continue;
                };
                let row_out_len = val_out[n].array_len();
                if row_in.len() > row_out_len {
                    let at = child(&child(p, n), row_out_len);
                    self.push(DiagnosticCode::Unused, base, at, &part_in[row_out_len]);
                }
                let len2 = items.row_len(n).map_or(row_out_len, |m| m.min(row_out_len));
                for m in 0..len2 {
                    self.check_info_item(&part_in[m], items.get2(n, m), *free_length, base, child(&child(p, n), m));
                }
            } else {
                self.check_info_item(part_in, items.get(n), *free_length, base, child(p, n));
            }
        }
    }

    fn check_info_item(
        &mut self,
        part_in: &Value,
        item: Option<&Rc<Attribute>>,
        free_length: bool,
        base: Base,
        p: Vec<Segment>,
    ) {
        // Slots past the end of a free-length input are simply not given.
        if free_length && part_in.is_undefined() {
            return;
        }
        if let Some(item) = item {
            if !is_valid(part_in, item, &DefaultGrammar) {
                self.push(DiagnosticCode::Value, base, p, part_in);
            }
        }
    }

    fn check_linked_array(&mut self, items_in: &[Value], val_out: &Value, schema: &Composite, base: Base, p: &[Segment]) {
        let mut matched = vec![];
        if let Value::Array(items_out) = val_out {
            for (j, item_out) in items_out.iter().enumerate() {
                let index = match &item_out["_index"] {
                    Value::Number(n) if *n >= 0.0 => *n as usize,
                    _ => j,
                };
                let item_in = items_in.get(index).unwrap_or(&Value::Undefined);
                if !(item_in.is_object() && item_out.is_object()) {
                    continue;
                }
                matched.push(index);
                let at = child(p, index);
                if item_in["visible"] != Value::Bool(false) && item_out["visible"] == Value::Bool(false) {
                    self.push(DiagnosticCode::Invisible, base, at, item_in);
                } else {
                    self.crawl(item_in, item_out, schema, base, &at);
                }
            }
        }

        for (j, item_in) in items_in.iter().enumerate() {
            if !item_in.is_object() {
                self.push(DiagnosticCode::Object, base, child(p, j), item_in);
            } else if !matched.contains(&j) {
                self.push(DiagnosticCode::Unused, base, child(p, j), item_in);
            }
        }
    }

    /// Transform items are checked against the module their `type` names.
    fn crawl_transforms(&mut self, val_in: &Value, val_out: &Value, base: Base, p: Vec<Segment>) {
        let (Value::Array(items_in), Value::Array(_)) = (val_in, val_out) else {
            let code = match val_in {
                Value::Array(_) => DiagnosticCode::Unused,
                _ if val_out.is_array() => DiagnosticCode::Array,
                _ => DiagnosticCode::Unused,
            };
            self.push(code, base, p, val_in);
            return;
        };

        for (j, item_in) in items_in.iter().enumerate() {
            let at = child(&p, j);
            if !item_in.is_object() {
                self.push(DiagnosticCode::Object, base, at, item_in);
                continue;
            }
            let module = match &item_in["type"] {
                Value::String(t) => self.session.modules().transform(t),
                _ => None,
            };
            match module {
                Some(module) => {
                    let schema = self.session.transform_attributes(&module);
                    self.crawl(item_in, &val_out[j], &schema, base, &at);
                }
                None => {
                    let schema = self.session.unknown_transform_attributes();
                    let type_in = &item_in["type"];
                    let type_ok = schema
                        .get("type")
                        .and_then(Node::as_attribute)
                        .is_some_and(|a| is_valid(type_in, a, &DefaultGrammar));
                    if !type_ok {
                        self.push(DiagnosticCode::Value, base, child(&at, "type"), type_in);
                    }
                }
            }
        }
    }
}

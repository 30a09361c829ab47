// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![allow(clippy::pattern_type_mismatch)]

//! Coercion of raw user input against attribute declarations.
//!
//! Coercion never fails because of what a user wrote. A missing or invalid
//! value silently resolves to the declared (or caller supplied) default and
//! the validator is what reports the discrepancy afterwards. The only errors
//! returned here are caller mistakes: a malformed attribute string or one
//! that does not name an attribute of the schema.

use crate::path::{PathError, PropPath, Segment};
use crate::schema::{Attribute, InfoItems, Node, ValType};
use crate::value::{Map, Value};

use std::collections::BTreeSet;
use std::rc::Rc;

pub mod grammar;

pub use grammar::{DefaultGrammar, Grammar};


static DEFAULT_GRAMMAR: DefaultGrammar = DefaultGrammar;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoerceError {
    #[error(transparent)]
    Path(#[from] PathError),
    #[error("`{0}` is not declared in the schema")]
    NotInSchema(String),
    #[error("`{0}` is a container, not an attribute")]
    NotAnAttribute(String),
}

/// Resolves `attr` from `input` into `output` and returns the stored value.
///
/// `dflt` overrides the declared default unless it is `Undefined`. Each
/// call stands alone; use a [`Coercer`] to coerce several attributes of the
/// same container so implied edits are honored across calls.
pub fn coerce(
    input: &Value,
    output: &mut Value,
    schema: &Node,
    attr: &str,
    dflt: &Value,
) -> Result<Value, CoerceError> {
    Coercer::new(input, output, schema).coerce_with_default(attr, dflt.clone())
}

/// Whether `value` is acceptable for `attr` as written, without falling
/// back to any default.
pub fn is_valid(value: &Value, attr: &Attribute, grammar: &dyn Grammar) -> bool {
    if attr.array_ok && value.is_array() {
        return true;
    }
    match &attr.val_type {
        ValType::InfoArray {
            items,
            free_length,
            dimensions,
        } => info_array_is_valid(value, items, *free_length, *dimensions, grammar),
        _ => accept(value, attr, &attr.dflt, grammar).is_some(),
    }
}

/// Coerces attributes of one input/output container pair.
///
/// Paths forced by an implied edit are remembered: coercing such a path
/// later keeps the implied value instead of re-reading the input.
pub struct Coercer<'a> {
    input: &'a Value,
    output: &'a mut Value,
    schema: &'a Node,
    grammar: &'a dyn Grammar,
    implied: BTreeSet<PropPath>,
}

impl<'a> Coercer<'a> {
    pub fn new(input: &'a Value, output: &'a mut Value, schema: &'a Node) -> Self {
        Self {
            input,
            output,
            schema,
            grammar: &DEFAULT_GRAMMAR,
            implied: BTreeSet::new(),
        }
    }

    pub fn with_grammar(mut self, grammar: &'a dyn Grammar) -> Self {
        self.grammar = grammar;
        self
    }

    pub fn input(&self) -> &Value {
        self.input
    }

    pub fn output(&self) -> &Value {
        &*self.output
    }

    pub fn schema(&self) -> &Node {
        self.schema
    }

    pub fn grammar(&self) -> &dyn Grammar {
        self.grammar
    }

    /// Coerces `attr` using its declared default.
    pub fn coerce(&mut self, attr: &str) -> Result<Value, CoerceError> {
        self.coerce_with_default(attr, Value::Undefined)
    }

    pub fn coerce_with_default(
        &mut self,
        attr: &str,
        dflt: impl Into<Value>,
    ) -> Result<Value, CoerceError> {
        let path = PropPath::parse(attr)?;
        let attribute = self.attribute(&path, attr)?;

        if self.implied.contains(&path) {
            return Ok(path.get(&*self.output).clone());
        }

        let dflt = match dflt.into() {
            Value::Undefined => attribute.dflt.clone(),
            dflt => dflt,
        };

        let accepted = accept(path.get(self.input), &attribute, &dflt, self.grammar);
        let resolved = accepted.clone().unwrap_or(dflt);
        path.set(self.output, resolved.clone())?;

        if accepted.is_some() {
            self.apply_implied_edits(&path, &attribute)?;
        }
        Ok(resolved)
    }

    /// Coerces `attr` but reports `Undefined` unless the input held a
    /// truthy value for it.
    pub fn coerce2(&mut self, attr: &str) -> Result<Value, CoerceError> {
        let given = PropPath::parse(attr)?.get(self.input).is_truthy();
        let resolved = self.coerce(attr)?;
        Ok(if given { resolved } else { Value::Undefined })
    }

    /// Coerces `family`, `size` and `color` below `prefix`, taking defaults
    /// from the matching keys of `dflt`.
    pub fn coerce_font(&mut self, prefix: &str, dflt: &Value) -> Result<Value, CoerceError> {
        let mut font = Map::new();
        for key in ["family", "size", "color"] {
            let v = self.coerce_with_default(&format!("{prefix}.{key}"), dflt[key].clone())?;
            if !v.is_undefined() {
                font.insert(key.into(), v);
            }
        }
        Ok(Value::from(font))
    }

    /// Writes `value` into the output without consulting the input.
    pub fn set(&mut self, attr: &str, value: impl Into<Value>) -> Result<(), CoerceError> {
        Ok(PropPath::parse(attr)?.set(self.output, value.into())?)
    }

    /// Whether `attr` currently holds a value forced by an implied edit.
    pub fn is_implied(&self, attr: &str) -> bool {
        PropPath::parse(attr).is_ok_and(|p| self.implied.contains(&p))
    }

    fn attribute(&self, path: &PropPath, attr: &str) -> Result<Rc<Attribute>, CoerceError> {
        match self.schema.resolve(path) {
            Some(Node::Attribute(a)) => Ok(a),
            Some(Node::Composite(_)) => Err(CoerceError::NotAnAttribute(attr.to_string())),
            None => Err(CoerceError::NotInSchema(attr.to_string())),
        }
    }

    fn apply_implied_edits(&mut self, path: &PropPath, attr: &Attribute) -> Result<(), CoerceError> {
        for (relative, value) in &attr.implied_edits {
            // A null implied value only records that the target may change.
            if value.is_nullish() {
                continue;
            }
            let target = implied_target(path, relative)?;
            target.set(self.output, value.clone())?;
            self.implied.insert(target);
        }
        Ok(())
    }
}

/// Resolves an implied-edit key relative to the container of `path`. Each
/// leading `^` ascends one container.
fn implied_target(path: &PropPath, relative: &str) -> Result<PropPath, PathError> {
    let mut container = path.parent().segments().to_vec();
    let mut relative = relative;
    while let Some(rest) = relative.strip_prefix('^') {
        while matches!(container.last(), Some(Segment::Index(_))) {
            container.pop();
        }
        container.pop();
        relative = rest;
    }
    Ok(PropPath::from_segments(container).join(&PropPath::parse(relative)?))
}

/// Numbers, and strings holding a decimal literal.
pub(crate) fn to_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) if n.is_finite() => Some(*n),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty()
                || !s
                    .bytes()
                    .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'-' | b'+' | b'e' | b'E'))
            {
                return None;
            }
            s.parse::<f64>().ok().filter(|n| n.is_finite())
        }
        _ => None,
    }
}

fn in_bounds(n: f64, min: Option<f64>, max: Option<f64>) -> bool {
    min.is_none_or(|min| n >= min) && max.is_none_or(|max| n <= max)
}

/// Validates `value` against `attr` and returns the form to store, `None`
/// when the value is absent or invalid.
fn accept(value: &Value, attr: &Attribute, dflt: &Value, grammar: &dyn Grammar) -> Option<Value> {
    if value.is_undefined() {
        return None;
    }
    // Array contents of arrayOk attributes are checked per point downstream.
    if attr.array_ok && value.is_array() {
        return Some(value.clone());
    }

    match &attr.val_type {
        ValType::Boolean => matches!(value, Value::Bool(_)).then(|| value.clone()),
        ValType::Number { min, max } => to_number(value)
            .filter(|n| in_bounds(*n, *min, *max))
            .map(Value::from),
        ValType::Integer { min, max } => to_number(value)
            .filter(|n| n.fract() == 0.0 && in_bounds(*n, *min, *max))
            .map(Value::from),
        ValType::String { no_blank, strict } => {
            let s: Rc<str> = match value {
                Value::String(s) => s.clone(),
                Value::Number(_) | Value::Bool(_) if !strict => value.to_inline_string().into(),
                _ => return None,
            };
            (!(*no_blank && s.is_empty())).then_some(Value::String(s))
        }
        ValType::Color => grammar.is_color(value).then(|| value.clone()),
        ValType::Colorscale => grammar.is_colorscale(value).then(|| value.clone()),
        ValType::Enumerated {
            values,
            coerce_number,
        } => {
            let candidate = if *coerce_number {
                Value::from(to_number(value)?)
            } else {
                value.clone()
            };
            values.contains(&candidate).then_some(candidate)
        }
        ValType::Flaglist { flags, extras } => canonical_flaglist(value, flags, extras),
        ValType::DataArray => value.is_array().then(|| value.clone()),
        ValType::InfoArray {
            items, dimensions, ..
        } => coerce_info_array(value, items, *dimensions, dflt, grammar),
        ValType::Any => Some(value.clone()),
        ValType::SubplotId => grammar.is_subplot_id(value, dflt).then(|| value.clone()),
        ValType::Angle => match value {
            Value::String(s) if &**s == "auto" => Some(value.clone()),
            _ => to_number(value).map(|n| Value::from(grammar.angle(n))),
        },
    }
}

/// Rejects the whole value on any unknown token. Valid combinations are
/// deduplicated and reordered to the declared flag order.
fn canonical_flaglist(value: &Value, flags: &[Rc<str>], extras: &[Rc<str>]) -> Option<Value> {
    let Value::String(s) = value else {
        return None;
    };
    if extras.iter().any(|e| e == s) {
        return Some(value.clone());
    }

    let tokens: Vec<&str> = s.split('+').collect();
    if !tokens.iter().all(|t| flags.iter().any(|f| &**f == *t)) {
        return None;
    }
    let canonical: Vec<&str> = flags
        .iter()
        .map(|f| &**f)
        .filter(|f| tokens.contains(f))
        .collect();
    Some(Value::from(canonical.join("+")))
}

fn coerce_part(value: &Value, item: &Attribute, dflt: &Value, grammar: &dyn Grammar) -> Value {
    let dflt = if dflt.is_undefined() { &item.dflt } else { dflt };
    match accept(value, item, dflt, grammar).unwrap_or_else(|| dflt.clone()) {
        // Holes serialize as null.
        Value::Undefined => Value::Null,
        v => v,
    }
}

fn coerce_info_array(
    value: &Value,
    items: &InfoItems,
    dimensions: u8,
    dflt: &Value,
    grammar: &dyn Grammar,
) -> Option<Value> {
    let Value::Array(input) = value else {
        return None;
    };

    let out: Vec<Value> = if dimensions == 2 {
        let rows = match items {
            InfoItems::Matrix(rows) => rows.len(),
            _ => input.len(),
        };
        (0..rows)
            .map(|i| {
                let row = match &value[i] {
                    row @ Value::Array(_) => row,
                    _ => &Value::Undefined,
                };
                let cols = match items {
                    InfoItems::Shared(_) => row.array_len(),
                    InfoItems::Slots(slots) => slots.len(),
                    InfoItems::Matrix(rows) => rows.get(i).map_or(0, Vec::len),
                };
                let row_out: Vec<Value> = (0..cols)
                    .map(|j| match items.get2(i, j) {
                        Some(item) => coerce_part(&row[j], item, &dflt[i][j], grammar),
                        None => Value::Null,
                    })
                    .collect();
                Value::from(row_out)
            })
            .collect()
    } else {
        let len = match items {
            InfoItems::Slots(slots) => slots.len(),
            _ => input.len(),
        };
        (0..len)
            .map(|i| match items.get(i) {
                Some(item) => coerce_part(&value[i], item, &dflt[i], grammar),
                None => Value::Null,
            })
            .collect()
    };

    Some(Value::from(out))
}

fn info_array_is_valid(
    value: &Value,
    items: &InfoItems,
    free_length: bool,
    dimensions: u8,
    grammar: &dyn Grammar,
) -> bool {
    let Value::Array(rows) = value else {
        return false;
    };
    let length_ok = |actual: usize, declared: Option<usize>| match declared {
        Some(n) => actual <= n && (free_length || actual == n),
        None => true,
    };

    let declared_rows = match items {
        InfoItems::Shared(_) => None,
        InfoItems::Slots(slots) if dimensions == 1 => Some(slots.len()),
        InfoItems::Slots(_) => None,
        InfoItems::Matrix(rows) => Some(rows.len()),
    };
    if !length_ok(rows.len(), declared_rows) {
        return false;
    }

    rows.iter().enumerate().all(|(i, row)| {
        if dimensions == 2 {
            let Value::Array(cols) = row else {
                return false;
            };
            length_ok(cols.len(), items.row_len(i))
                && cols.iter().enumerate().all(|(j, v)| {
                    items
                        .get2(i, j)
                        .is_some_and(|item| is_valid(v, item, grammar))
                })
        } else {
            items.get(i).is_some_and(|item| is_valid(row, item, grammar))
        }
    })
}

// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The `filter` transform: keeps the points of a trace whose target values
//! pass a comparison, interval or set test.

use crate::coerce::{to_number, Coercer};
use crate::path::PropPath;
use crate::registry::{DefaultsContext, ModuleDef, TransformContext};
use crate::schema::crawl::find_array_attributes;
use crate::value::Value;

use anyhow::Result;
use core::cmp::Ordering;
use serde_json::json;

pub const COMPARISON_OPS: [&str; 6] = ["=", "!=", "<", ">=", ">", "<="];
pub const INTERVAL_OPS: [&str; 8] = ["[]", "()", "[)", "(]", "][", ")(", "](", ")["];
pub const SET_OPS: [&str; 2] = ["{}", "}{"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Ne,
    Lt,
    Ge,
    Gt,
    Le,
    /// `[]`
    InClosed,
    /// `()`
    InOpen,
    /// `[)`
    InClosedOpen,
    /// `(]`
    InOpenClosed,
    /// `][`
    OutClosed,
    /// `)(`
    OutOpen,
    /// `](`
    OutClosedOpen,
    /// `)[`
    OutOpenClosed,
    /// `{}`
    In,
    /// `}{`
    NotIn,
}

impl FilterOp {
    pub fn parse(op: &str) -> Option<FilterOp> {
        Some(match op {
            "=" => FilterOp::Eq,
            "!=" => FilterOp::Ne,
            "<" => FilterOp::Lt,
            ">=" => FilterOp::Ge,
            ">" => FilterOp::Gt,
            "<=" => FilterOp::Le,
            "[]" => FilterOp::InClosed,
            "()" => FilterOp::InOpen,
            "[)" => FilterOp::InClosedOpen,
            "(]" => FilterOp::InOpenClosed,
            "][" => FilterOp::OutClosed,
            ")(" => FilterOp::OutOpen,
            "](" => FilterOp::OutClosedOpen,
            ")[" => FilterOp::OutOpenClosed,
            "{}" => FilterOp::In,
            "}{" => FilterOp::NotIn,
            _ => return None,
        })
    }

    /// Whether `v` passes against the filter `value`.
    ///
    /// Comparison operations use the first item of an array value, interval
    /// operations use a scalar value as both bounds and set operations treat
    /// a scalar as a one element set.
    pub fn passes(&self, v: &Value, value: &Value) -> bool {
        let scalar = match value {
            Value::Array(items) => items.first().unwrap_or(&Value::Undefined),
            _ => value,
        };
        let (lo, hi) = match value {
            Value::Array(_) => (&value[0], &value[1]),
            _ => (value, value),
        };

        match self {
            FilterOp::Eq => equals(v, scalar),
            FilterOp::Ne => !equals(v, scalar),
            FilterOp::Lt => compare(v, scalar) == Some(Ordering::Less),
            FilterOp::Le => matches!(compare(v, scalar), Some(Ordering::Less | Ordering::Equal)),
            FilterOp::Gt => compare(v, scalar) == Some(Ordering::Greater),
            FilterOp::Ge => matches!(compare(v, scalar), Some(Ordering::Greater | Ordering::Equal)),
            FilterOp::InClosed => at_least(compare(v, lo)) && at_most(compare(v, hi)),
            FilterOp::InOpen => above(compare(v, lo)) && below(compare(v, hi)),
            FilterOp::InClosedOpen => at_least(compare(v, lo)) && below(compare(v, hi)),
            FilterOp::InOpenClosed => above(compare(v, lo)) && at_most(compare(v, hi)),
            FilterOp::OutClosed => at_most(compare(v, lo)) || at_least(compare(v, hi)),
            FilterOp::OutOpen => below(compare(v, lo)) || above(compare(v, hi)),
            FilterOp::OutClosedOpen => at_most(compare(v, lo)) || above(compare(v, hi)),
            FilterOp::OutOpenClosed => below(compare(v, lo)) || at_least(compare(v, hi)),
            FilterOp::In | FilterOp::NotIn => {
                let found = match value {
                    Value::Array(set) => set.iter().any(|s| equals(v, s)),
                    _ => equals(v, value),
                };
                found == (*self == FilterOp::In)
            }
        }
    }
}

fn below(o: Option<Ordering>) -> bool {
    o == Some(Ordering::Less)
}

fn above(o: Option<Ordering>) -> bool {
    o == Some(Ordering::Greater)
}

fn at_most(o: Option<Ordering>) -> bool {
    matches!(o, Some(Ordering::Less | Ordering::Equal))
}

fn at_least(o: Option<Ordering>) -> bool {
    matches!(o, Some(Ordering::Greater | Ordering::Equal))
}

/// Numeric when both sides read as numbers, lexicographic between strings.
fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (to_number(a), to_number(b)) {
        (Some(x), Some(y)) => x.partial_cmp(&y),
        _ => match (a, b) {
            (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
            _ => None,
        },
    }
}

fn equals(a: &Value, b: &Value) -> bool {
    match compare(a, b) {
        Some(o) => o == Ordering::Equal,
        None => a == b,
    }
}

pub(super) fn module() -> ModuleDef {
    let operations: Vec<&str> = COMPARISON_OPS
        .iter()
        .chain(INTERVAL_OPS.iter())
        .chain(SET_OPS.iter())
        .copied()
        .collect();

    ModuleDef::transform("filter")
        .with_attributes(json!({
            "target": {
                "valType": "string",
                "strict": true,
                "noBlank": true,
                "arrayOk": true,
                "dflt": "x",
                "editType": "calc",
                "description": "Sets the filter target by which the filter is applied."
            },
            "operation": {
                "valType": "enumerated",
                "values": operations,
                "dflt": "=",
                "editType": "calc"
            },
            "value": { "valType": "any", "dflt": 0, "editType": "calc" },
            "preservegaps": { "valType": "boolean", "dflt": false, "editType": "calc" },
            "editType": "calc"
        }))
        .with_supply_defaults(supply_defaults)
        .with_calc_transform(calc_transform)
}

fn supply_defaults(c: &mut Coercer<'_>, _ctx: &DefaultsContext<'_>) -> Result<()> {
    let target = c.coerce("target")?;
    if target.is_array() && target.array_len() == 0 {
        c.set("enabled", false)?;
        return Ok(());
    }
    c.coerce("preservegaps")?;
    c.coerce("operation")?;
    c.coerce("value")?;
    Ok(())
}

fn calc_transform(trace: &mut Value, opts: &Value, ctx: &TransformContext<'_>) -> Result<()> {
    let target = match &opts["target"] {
        Value::String(attr) => PropPath::parse(attr)?.get(trace).clone(),
        target => target.clone(),
    };
    let Value::Array(target) = target else {
        return Ok(());
    };
    let Some(op) = opts["operation"].as_string().ok().and_then(|o| FilterOp::parse(o)) else {
        return Ok(());
    };

    let mut len = target.len();
    if let Value::Number(n) = &trace["_length"] {
        len = len.min(*n as usize);
    }
    let preserve_gaps = opts["preservegaps"].is_truthy();
    let keep: Vec<bool> = (0..len).map(|i| op.passes(&target[i], &opts["value"])).collect();

    for attr in find_array_attributes(trace, ctx.schema) {
        let path = PropPath::parse(&attr)?;
        let Value::Array(original) = path.get(trace).clone() else {
            continue;
        };
        let filtered: Vec<Value> = (0..len)
            .filter_map(|i| match (keep[i], preserve_gaps) {
                (true, _) => Some(original.get(i).cloned().unwrap_or(Value::Null)),
                (false, true) => Some(Value::Null),
                (false, false) => None,
            })
            .collect();
        path.set(trace, Value::from(filtered))?;
    }

    let kept = if preserve_gaps {
        len
    } else {
        keep.iter().filter(|k| **k).count()
    };
    trace.insert("_length", Value::from(kept))?;
    Ok(())
}

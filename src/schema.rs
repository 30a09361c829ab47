// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![allow(clippy::pattern_type_mismatch)]

//! Attribute schema.
//!
//! Every configurable key of a trace, transform, component or layout is
//! declared by an attribute node. Declarations use the familiar JSON shape:
//!
//! ```json
//! {
//!   "mode": {
//!     "valType": "flaglist",
//!     "flags": ["lines", "markers", "text"],
//!     "extras": ["none"],
//!     "editType": "calc"
//!   },
//!   "line": {
//!     "width": { "valType": "number", "min": 0, "dflt": 2, "editType": "style" },
//!     "editType": "plot"
//!   },
//!   "buttons": {
//!     "_isLinkedToArray": "button",
//!     "label": { "valType": "string" }
//!   }
//! }
//! ```
//!
//! A declaration carrying `valType` is a leaf [`Attribute`]. Anything else is
//! a [`Composite`] whose keys are child declarations, except for a closed set
//! of reserved markers (`_isLinkedToArray`, `_isSubplotObj`, `_deprecated`,
//! `_arrayAttrRegexps`) and meta keys (`editType`, `description`, `role`,
//! `impliedEdits`).
//!
//! Declarations are validated while parsing. An `enumerated` attribute
//! without `values`, an unknown `valType` and similar mistakes raise a
//! [`SchemaError`] instead of surfacing later during coercion.

use crate::path::{PropPath, Segment};
use crate::value::Value;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use std::rc::Rc;

pub mod crawl;
pub mod describe;
pub mod error;

pub use error::SchemaError;


pub const IS_LINKED_TO_ARRAY: &str = "_isLinkedToArray";
pub const IS_SUBPLOT_OBJ: &str = "_isSubplotObj";
pub const DEPRECATED: &str = "_deprecated";
pub const ARRAY_ATTR_REGEXPS: &str = "_arrayAttrRegexps";

/// Marker keys that are never attributes.
pub const UNDERSCORE_ATTRS: [&str; 4] = [IS_SUBPLOT_OBJ, IS_LINKED_TO_ARRAY, ARRAY_ATTR_REGEXPS, DEPRECATED];

/// Keys of a composite declaration that describe the composite itself.
pub const META_KEYS: [&str; 4] = ["editType", "description", "role", "impliedEdits"];

/// Edit type flags of trace attributes. `none` stands alone.
pub const TRACE_EDIT_FLAGS: [&str; 5] = ["calc", "clearAxisTypes", "plot", "style", "colorbars"];

/// Edit type flags of layout attributes. `none` stands alone.
pub const LAYOUT_EDIT_FLAGS: [&str; 10] = [
    "calc",
    "plot",
    "legend",
    "ticks",
    "axrange",
    "layoutstyle",
    "modebar",
    "arraydraw",
    "colorbars",
    "margins",
];

/// A node of the schema tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Attribute(Rc<Attribute>),
    Composite(Rc<Composite>),
}

/// A leaf declaration: one configurable key.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub val_type: ValType,
    /// `Undefined` when the declaration has no default.
    pub dflt: Value,
    pub array_ok: bool,
    pub edit_type: Option<Rc<str>>,
    /// Sibling paths, relative to the attribute's container, forced to the
    /// given value when this attribute is explicitly set.
    pub implied_edits: IndexMap<Rc<str>, Value>,
    pub description: Option<Rc<str>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ValType {
    Boolean,
    Number {
        min: Option<f64>,
        max: Option<f64>,
    },
    Integer {
        min: Option<f64>,
        max: Option<f64>,
    },
    String {
        no_blank: bool,
        strict: bool,
    },
    Color,
    Colorscale,
    Enumerated {
        values: Vec<Value>,
        coerce_number: bool,
    },
    Flaglist {
        flags: Vec<Rc<str>>,
        extras: Vec<Rc<str>>,
    },
    DataArray,
    InfoArray {
        items: InfoItems,
        free_length: bool,
        dimensions: u8,
    },
    Any,
    SubplotId,
    Angle,
}

impl ValType {
    pub fn name(&self) -> &'static str {
        match self {
            ValType::Boolean => "boolean",
            ValType::Number { .. } => "number",
            ValType::Integer { .. } => "integer",
            ValType::String { .. } => "string",
            ValType::Color => "color",
            ValType::Colorscale => "colorscale",
            ValType::Enumerated { .. } => "enumerated",
            ValType::Flaglist { .. } => "flaglist",
            ValType::DataArray => "data_array",
            ValType::InfoArray { .. } => "info_array",
            ValType::Any => "any",
            ValType::SubplotId => "subplotid",
            ValType::Angle => "angle",
        }
    }
}

/// Per-position item declarations of an `info_array`.
#[derive(Debug, Clone, PartialEq)]
pub enum InfoItems {
    /// Every element follows the same declaration.
    Shared(Rc<Attribute>),
    /// One declaration per position.
    Slots(Vec<Rc<Attribute>>),
    /// One declaration per row and column of a 2-dimensional array.
    Matrix(Vec<Vec<Rc<Attribute>>>),
}

impl InfoItems {
    /// Declaration of element `index` of a 1-dimensional array.
    pub fn get(&self, index: usize) -> Option<&Rc<Attribute>> {
        match self {
            InfoItems::Shared(item) => Some(item),
            InfoItems::Slots(items) => items.get(index),
            InfoItems::Matrix(_) => None,
        }
    }

    /// Declaration of element `[row][col]` of a 2-dimensional array.
    pub fn get2(&self, row: usize, col: usize) -> Option<&Rc<Attribute>> {
        match self {
            InfoItems::Shared(item) => Some(item),
            InfoItems::Slots(items) => items.get(col),
            InfoItems::Matrix(rows) => rows.get(row).and_then(|r| r.get(col)),
        }
    }

    /// Number of declared positions, `None` when every position is allowed.
    pub fn len(&self) -> Option<usize> {
        match self {
            InfoItems::Shared(_) => None,
            InfoItems::Slots(items) => Some(items.len()),
            InfoItems::Matrix(rows) => Some(rows.len()),
        }
    }

    /// Number of declared columns in `row`, `None` when unconstrained.
    pub fn row_len(&self, row: usize) -> Option<usize> {
        match self {
            InfoItems::Shared(_) => None,
            InfoItems::Slots(items) => Some(items.len()),
            InfoItems::Matrix(rows) => Some(rows.get(row).map_or(0, Vec::len)),
        }
    }
}

/// A container declaration.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Composite {
    pub children: IndexMap<Rc<str>, Node>,
    /// Attributes that are still accepted but no longer documented.
    pub deprecated: IndexMap<Rc<str>, Node>,
    /// Item name when the container repeats as an array of objects.
    pub linked_to_array: Option<Rc<str>>,
    /// Set on containers such as `xaxis` that may repeat as `xaxis2`, ...
    pub is_subplot_obj: bool,
    pub edit_type: Option<Rc<str>>,
    pub description: Option<Rc<str>>,
}

impl Composite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_linked_to_array(&self) -> bool {
        self.linked_to_array.is_some()
    }

    /// Looks up the declaration for `key`, falling back to deprecated
    /// attributes and then to subplot counters (`xaxis2` -> `xaxis`).
    pub fn get(&self, key: &str) -> Option<&Node> {
        if let Some(node) = self.children.get(key) {
            return Some(node);
        }
        if let Some(node) = self.deprecated.get(key) {
            return Some(node);
        }
        match split_counter(key) {
            Some((base, Some(_))) => match self.children.get(base) {
                Some(node @ Node::Composite(c)) if c.is_subplot_obj => Some(node),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn insert(&mut self, key: impl Into<Rc<str>>, node: Node) {
        self.children.insert(key.into(), node);
    }

    /// Deep merge of `other` into `self`. Nested composites merge key by
    /// key, everything else is replaced.
    pub fn merge(&mut self, other: &Composite) {
        merge_children(&mut self.children, &other.children);
        merge_children(&mut self.deprecated, &other.deprecated);
        if other.linked_to_array.is_some() {
            self.linked_to_array = other.linked_to_array.clone();
        }
        self.is_subplot_obj |= other.is_subplot_obj;
        if other.edit_type.is_some() {
            self.edit_type = other.edit_type.clone();
        }
        if other.description.is_some() {
            self.description = other.description.clone();
        }
    }
}

fn merge_children(into: &mut IndexMap<Rc<str>, Node>, from: &IndexMap<Rc<str>, Node>) {
    for (key, node) in from {
        match (into.get_mut(key), node) {
            (Some(Node::Composite(existing)), Node::Composite(new)) => {
                Rc::make_mut(existing).merge(new);
            }
            _ => {
                into.insert(key.clone(), node.clone());
            }
        }
    }
}

/// Splits a key of the form `<letters><counter>` where the counter, if
/// present, is an integer of at least 2 (`xaxis2`, `scene10`).
pub fn split_counter(key: &str) -> Option<(&str, Option<u32>)> {
    let digits_at = key
        .find(|c: char| c.is_ascii_digit())
        .unwrap_or(key.len());
    let (base, digits) = key.split_at(digits_at);
    if base.is_empty() || !base.bytes().all(|b| b.is_ascii_lowercase()) {
        return None;
    }
    if digits.is_empty() {
        return Some((base, None));
    }
    if !digits.bytes().all(|b| b.is_ascii_digit()) || digits.starts_with('0') {
        return None;
    }
    match digits.parse::<u32>() {
        Ok(n) if n >= 2 => Some((base, Some(n))),
        _ => None,
    }
}

impl Node {
    pub fn from_serde_json_value(json: &serde_json::Value) -> Result<Node, SchemaError> {
        parse_node(json, "")
    }

    pub fn from_json_str(s: &str) -> Result<Node, SchemaError> {
        let json: serde_json::Value =
            serde_json::from_str(s).map_err(|e| SchemaError::Json(e.to_string()))?;
        Self::from_serde_json_value(&json)
    }

    pub fn as_attribute(&self) -> Option<&Rc<Attribute>> {
        match self {
            Node::Attribute(a) => Some(a),
            Node::Composite(_) => None,
        }
    }

    pub fn as_composite(&self) -> Option<&Rc<Composite>> {
        match self {
            Node::Composite(c) => Some(c),
            Node::Attribute(_) => None,
        }
    }

    /// Whether this node is a leaf value declaration.
    pub fn is_val_object(&self) -> bool {
        matches!(self, Node::Attribute(_))
    }

    pub fn edit_type(&self) -> Option<&Rc<str>> {
        match self {
            Node::Attribute(a) => a.edit_type.as_ref(),
            Node::Composite(c) => c.edit_type.as_ref(),
        }
    }

    /// Finds the declaration governing `path`.
    ///
    /// An index following an array-linked container is skipped (every item
    /// shares the container's template). An index following an `info_array`
    /// selects the declaration for that position.
    pub fn resolve(&self, path: &PropPath) -> Option<Node> {
        let segments = path.segments();
        let mut node = self.clone();
        let mut idx = 0;

        // The root itself may be an array-linked template.
        if let (Node::Composite(c), Some(Segment::Index(_))) = (&node, segments.first()) {
            if c.is_linked_to_array() {
                idx += 1;
            }
        }

        while idx < segments.len() {
            let next = match (&node, &segments[idx]) {
                (Node::Composite(c), Segment::Key(k)) => {
                    let child = c.get(k)?.clone();
                    idx += 1;
                    if let (Node::Composite(cc), Some(Segment::Index(_))) =
                        (&child, segments.get(idx))
                    {
                        if cc.is_linked_to_array() {
                            idx += 1;
                        }
                    }
                    child
                }
                (Node::Attribute(a), Segment::Index(row)) => {
                    let ValType::InfoArray {
                        items, dimensions, ..
                    } = &a.val_type
                    else {
                        return None;
                    };
                    idx += 1;
                    let item = if *dimensions == 2 {
                        match segments.get(idx) {
                            None => return Some(node.clone()),
                            Some(Segment::Index(col)) => {
                                idx += 1;
                                items.get2(*row, *col)?
                            }
                            Some(Segment::Key(_)) => return None,
                        }
                    } else {
                        items.get(*row)?
                    };
                    Node::Attribute(item.clone())
                }
                _ => return None,
            };
            node = next;
        }

        Some(node)
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let v: serde_json::Value = Deserialize::deserialize(deserializer)?;
        Node::from_serde_json_value(&v).map_err(|e| serde::de::Error::custom(format!("{e}")))
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAttribute {
    val_type: String,
    dflt: Option<Value>,
    values: Option<Vec<Value>>,
    flags: Option<Vec<Rc<str>>>,
    extras: Option<Vec<Rc<str>>>,
    #[serde(default)]
    array_ok: bool,
    edit_type: Option<String>,
    implied_edits: Option<IndexMap<Rc<str>, Value>>,
    min: Option<f64>,
    max: Option<f64>,
    #[serde(default)]
    no_blank: bool,
    #[serde(default)]
    strict: bool,
    #[serde(default)]
    coerce_number: bool,
    items: Option<serde_json::Value>,
    #[serde(default)]
    free_length: bool,
    dimensions: Option<u64>,
    description: Option<Rc<str>>,
}

fn child_path(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

fn parse_node(json: &serde_json::Value, path: &str) -> Result<Node, SchemaError> {
    let Some(obj) = json.as_object() else {
        return Err(SchemaError::NotAnObject {
            path: path.to_string(),
        });
    };
    if obj.contains_key("valType") {
        Ok(Node::Attribute(Rc::new(parse_attribute(json, path)?)))
    } else {
        Ok(Node::Composite(Rc::new(parse_composite(obj, path)?)))
    }
}

fn parse_edit_type(edit_type: &str, path: &str) -> Result<Rc<str>, SchemaError> {
    if edit_type
        .split('+')
        .all(|flag| flag == "none" || TRACE_EDIT_FLAGS.contains(&flag) || LAYOUT_EDIT_FLAGS.contains(&flag))
    {
        Ok(edit_type.into())
    } else {
        Err(SchemaError::UnknownEditType {
            path: path.to_string(),
            edit_type: edit_type.to_string(),
        })
    }
}

fn parse_attribute(json: &serde_json::Value, path: &str) -> Result<Attribute, SchemaError> {
    let raw = RawAttribute::deserialize(json)
        .map_err(|e| SchemaError::Json(format!("attribute `{path}`: {e}")))?;

    let missing = |val_type: &'static str, option: &'static str| SchemaError::MissingOption {
        path: path.to_string(),
        val_type,
        option,
    };

    if let (Some(min), Some(max)) = (raw.min, raw.max) {
        if min > max {
            return Err(SchemaError::InvalidBounds {
                path: path.to_string(),
                min,
                max,
            });
        }
    }

    let val_type = match raw.val_type.as_str() {
        "boolean" => ValType::Boolean,
        "number" => ValType::Number {
            min: raw.min,
            max: raw.max,
        },
        "integer" => ValType::Integer {
            min: raw.min,
            max: raw.max,
        },
        "string" => ValType::String {
            no_blank: raw.no_blank,
            strict: raw.strict,
        },
        "color" => ValType::Color,
        "colorscale" => ValType::Colorscale,
        "enumerated" => ValType::Enumerated {
            values: raw.values.ok_or_else(|| missing("enumerated", "values"))?,
            coerce_number: raw.coerce_number,
        },
        "flaglist" => {
            let flags = raw.flags.ok_or_else(|| missing("flaglist", "flags"))?;
            if flags.iter().any(|f| f.is_empty() || f.contains('+')) {
                return Err(SchemaError::InvalidOption {
                    path: path.to_string(),
                    option: "flags",
                    reason: "flags must be non-empty and may not contain `+`".to_string(),
                });
            }
            ValType::Flaglist {
                flags,
                extras: raw.extras.unwrap_or_default(),
            }
        }
        "data_array" => ValType::DataArray,
        "info_array" => {
            let items = raw
                .items
                .as_ref()
                .ok_or_else(|| missing("info_array", "items"))?;
            let dimensions = match raw.dimensions {
                None | Some(1) => 1,
                Some(2) => 2,
                Some(dimensions) => {
                    return Err(SchemaError::InvalidDimensions {
                        path: path.to_string(),
                        dimensions,
                    })
                }
            };
            ValType::InfoArray {
                items: parse_items(items, dimensions, path)?,
                free_length: raw.free_length,
                dimensions,
            }
        }
        "any" => ValType::Any,
        "subplotid" => ValType::SubplotId,
        "angle" => ValType::Angle,
        other => {
            return Err(SchemaError::UnknownValType {
                path: path.to_string(),
                val_type: other.to_string(),
            })
        }
    };

    let edit_type = match raw.edit_type {
        Some(e) => Some(parse_edit_type(&e, path)?),
        None => None,
    };

    Ok(Attribute {
        val_type,
        dflt: raw.dflt.unwrap_or(Value::Undefined),
        array_ok: raw.array_ok,
        edit_type,
        implied_edits: raw.implied_edits.unwrap_or_default(),
        description: raw.description,
    })
}

fn parse_item(json: &serde_json::Value, path: &str) -> Result<Rc<Attribute>, SchemaError> {
    match parse_node(json, path)? {
        Node::Attribute(a) => Ok(a),
        Node::Composite(_) => Err(SchemaError::InvalidOption {
            path: path.to_string(),
            option: "items",
            reason: "every item must declare a valType".to_string(),
        }),
    }
}

fn parse_items(
    json: &serde_json::Value,
    dimensions: u8,
    path: &str,
) -> Result<InfoItems, SchemaError> {
    let Some(items) = json.as_array() else {
        return Ok(InfoItems::Shared(parse_item(json, &format!("{path}[]"))?));
    };

    if dimensions == 2 && !items.is_empty() && items.iter().all(|row| row.is_array()) {
        let mut rows = vec![];
        for (r, row) in items.iter().enumerate() {
            let mut cols = vec![];
            for (c, item) in row.as_array().into_iter().flatten().enumerate() {
                cols.push(parse_item(item, &format!("{path}[{r}][{c}]"))?);
            }
            rows.push(cols);
        }
        return Ok(InfoItems::Matrix(rows));
    }

    let mut slots = vec![];
    for (i, item) in items.iter().enumerate() {
        slots.push(parse_item(item, &format!("{path}[{i}]"))?);
    }
    Ok(InfoItems::Slots(slots))
}

fn parse_composite(
    obj: &serde_json::Map<String, serde_json::Value>,
    path: &str,
) -> Result<Composite, SchemaError> {
    let mut composite = Composite::new();

    for (key, child) in obj {
        match key.as_str() {
            IS_LINKED_TO_ARRAY => match child.as_str() {
                Some(item) => composite.linked_to_array = Some(item.into()),
                None => {
                    return Err(SchemaError::InvalidMarker {
                        path: path.to_string(),
                        marker: IS_LINKED_TO_ARRAY,
                        expected: "a string",
                    })
                }
            },
            IS_SUBPLOT_OBJ => match child.as_bool() {
                Some(b) => composite.is_subplot_obj = b,
                None => {
                    return Err(SchemaError::InvalidMarker {
                        path: path.to_string(),
                        marker: IS_SUBPLOT_OBJ,
                        expected: "a boolean",
                    })
                }
            },
            DEPRECATED => {
                let Some(deprecated) = child.as_object() else {
                    return Err(SchemaError::InvalidMarker {
                        path: path.to_string(),
                        marker: DEPRECATED,
                        expected: "an object",
                    });
                };
                for (k, v) in deprecated {
                    let node = parse_node(v, &child_path(path, k))?;
                    composite.deprecated.insert(k.as_str().into(), node);
                }
            }
            ARRAY_ATTR_REGEXPS => {
                if !child.is_array() {
                    return Err(SchemaError::InvalidMarker {
                        path: path.to_string(),
                        marker: ARRAY_ATTR_REGEXPS,
                        expected: "an array",
                    });
                }
            }
            "editType" => match child.as_str() {
                Some(e) => composite.edit_type = Some(parse_edit_type(e, path)?),
                None => {
                    return Err(SchemaError::InvalidOption {
                        path: path.to_string(),
                        option: "editType",
                        reason: "must be a string".to_string(),
                    })
                }
            },
            "description" => composite.description = child.as_str().map(Rc::from),
            "role" | "impliedEdits" => (),
            _ => {
                let node = parse_node(child, &child_path(path, key))?;
                composite.children.insert(key.as_str().into(), node);
            }
        }
    }

    Ok(composite)
}

// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![allow(clippy::pattern_type_mismatch)]

//! Writing declarations back out.
//!
//! [`Node`], [`Attribute`] and [`Composite`] serialize to the JSON shape
//! they are parsed from, so a parsed tree can be printed and parsed again.
//! [`format_attributes`] produces the documented form returned by
//! [`Session::schema`](crate::Session::schema): every container gets
//! `role: "object"`, array-linked containers are wrapped as
//! `{items: {<item>: ...}}` and every array attribute gains a `<name>src`
//! companion.

use super::{
    Attribute, Composite, InfoItems, Node, ValType, DEPRECATED, IS_LINKED_TO_ARRAY, IS_SUBPLOT_OBJ,
    LAYOUT_EDIT_FLAGS, META_KEYS, TRACE_EDIT_FLAGS, UNDERSCORE_ATTRS,
};
use crate::value::{Map, Value};

use anyhow::Result;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::json;

impl Serialize for Node {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Node::Attribute(a) => a.serialize(serializer),
            Node::Composite(c) => c.serialize(serializer),
        }
    }
}

impl Serialize for Attribute {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("valType", self.val_type.name())?;

        match &self.val_type {
            ValType::Number { min, max } | ValType::Integer { min, max } => {
                if let Some(min) = min {
                    map.serialize_entry("min", &Value::from(*min))?;
                }
                if let Some(max) = max {
                    map.serialize_entry("max", &Value::from(*max))?;
                }
            }
            ValType::String { no_blank, strict } => {
                if *no_blank {
                    map.serialize_entry("noBlank", &true)?;
                }
                if *strict {
                    map.serialize_entry("strict", &true)?;
                }
            }
            ValType::Enumerated {
                values,
                coerce_number,
            } => {
                map.serialize_entry("values", values)?;
                if *coerce_number {
                    map.serialize_entry("coerceNumber", &true)?;
                }
            }
            ValType::Flaglist { flags, extras } => {
                map.serialize_entry("flags", flags)?;
                if !extras.is_empty() {
                    map.serialize_entry("extras", extras)?;
                }
            }
            ValType::InfoArray {
                items,
                free_length,
                dimensions,
            } => {
                map.serialize_entry("items", items)?;
                if *free_length {
                    map.serialize_entry("freeLength", &true)?;
                }
                if *dimensions == 2 {
                    map.serialize_entry("dimensions", &2)?;
                }
            }
            ValType::Boolean
            | ValType::Color
            | ValType::Colorscale
            | ValType::DataArray
            | ValType::Any
            | ValType::SubplotId
            | ValType::Angle => (),
        }

        if !self.dflt.is_undefined() {
            map.serialize_entry("dflt", &self.dflt)?;
        }
        if self.array_ok {
            map.serialize_entry("arrayOk", &true)?;
        }
        if let Some(edit_type) = &self.edit_type {
            map.serialize_entry("editType", edit_type)?;
        }
        if !self.implied_edits.is_empty() {
            map.serialize_entry("impliedEdits", &self.implied_edits)?;
        }
        if let Some(description) = &self.description {
            map.serialize_entry("description", description)?;
        }
        map.end()
    }
}

impl Serialize for InfoItems {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            InfoItems::Shared(item) => item.serialize(serializer),
            InfoItems::Slots(items) => items.serialize(serializer),
            InfoItems::Matrix(rows) => rows.serialize(serializer),
        }
    }
}

impl Serialize for Composite {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        for (key, node) in &self.children {
            map.serialize_entry(&**key, node)?;
        }
        if let Some(item) = &self.linked_to_array {
            map.serialize_entry(IS_LINKED_TO_ARRAY, item)?;
        }
        if self.is_subplot_obj {
            map.serialize_entry(IS_SUBPLOT_OBJ, &true)?;
        }
        if !self.deprecated.is_empty() {
            map.serialize_entry(DEPRECATED, &self.deprecated)?;
        }
        if let Some(edit_type) = &self.edit_type {
            map.serialize_entry("editType", edit_type)?;
        }
        if let Some(description) = &self.description {
            map.serialize_entry("description", description)?;
        }
        map.end()
    }
}

fn to_value<T: Serialize>(node: &T) -> Result<Value> {
    Ok(Value::from(serde_json::to_value(node)?))
}

/// Documented form of an attribute tree.
pub fn format_attributes(attrs: &Composite) -> Result<Value> {
    Ok(Value::from(format_children(attrs)?))
}

fn format_children(attrs: &Composite) -> Result<Map> {
    let mut out = Map::new();
    for (key, node) in &attrs.children {
        match node {
            Node::Attribute(attr) => {
                out.insert(key.clone(), to_value(&**attr)?);
                if attr.array_ok || matches!(attr.val_type, ValType::DataArray) {
                    out.insert(format!("{key}src").into(), src_attribute(key));
                }
            }
            Node::Composite(c) => {
                out.insert(key.clone(), format_container(c)?);
            }
        }
    }
    Ok(out)
}

fn format_container(c: &Composite) -> Result<Value> {
    let mut container = format_children(c)?;
    if c.is_subplot_obj {
        container.insert(IS_SUBPLOT_OBJ.into(), Value::from(true));
    }
    if !c.deprecated.is_empty() {
        container.insert(DEPRECATED.into(), to_value(&c.deprecated)?);
    }
    if let Some(edit_type) = &c.edit_type {
        container.insert("editType".into(), Value::from(edit_type.clone()));
    }
    if let Some(description) = &c.description {
        container.insert("description".into(), Value::from(description.clone()));
    }
    container.insert("role".into(), Value::from("object"));

    let Some(item) = &c.linked_to_array else {
        return Ok(Value::from(container));
    };
    let mut items = Map::new();
    items.insert(item.clone(), Value::from(container));
    let mut wrapper = Map::new();
    wrapper.insert("items".into(), Value::from(items));
    wrapper.insert("role".into(), Value::from("object"));
    Ok(Value::from(wrapper))
}

fn src_attribute(key: &str) -> Value {
    Value::from(json!({
        "valType": "string",
        "description": format!("Sets the source reference for `{key}`."),
        "editType": "none"
    }))
}

/// The `defs` section of a schema description: the value types with their
/// options, the reserved keys and the edit type catalogs.
pub fn definitions() -> Value {
    let meta_keys: Vec<&str> = UNDERSCORE_ATTRS.iter().chain(META_KEYS.iter()).copied().collect();
    Value::from(json!({
        "valObjects": val_objects(),
        "metaKeys": meta_keys,
        "editType": {
            "traces": edit_type_flaglist(&TRACE_EDIT_FLAGS),
            "layout": edit_type_flaglist(&LAYOUT_EDIT_FLAGS)
        },
        "impliedEdits": {
            "description": "Attributes that must change together with the attribute declaring them. \
                Keys are paths relative to the declaring container, each leading `^` ascends one \
                container. A null value leaves the target alone but records that it may change."
        }
    }))
}

fn edit_type_flaglist(flags: &[&str]) -> serde_json::Value {
    json!({
        "valType": "flaglist",
        "extras": ["none"],
        "flags": flags
    })
}

fn val_objects() -> serde_json::Value {
    json!({
        "data_array": {
            "description": "An array of data. Anything else is ignored.",
            "requiredOpts": [],
            "otherOpts": ["dflt"]
        },
        "enumerated": {
            "description": "One of the values listed in `values`.",
            "requiredOpts": ["values"],
            "otherOpts": ["dflt", "coerceNumber", "arrayOk"]
        },
        "boolean": {
            "description": "A boolean (true/false) value.",
            "requiredOpts": [],
            "otherOpts": ["dflt"]
        },
        "number": {
            "description": "A number, or a string holding one. Values outside `min`/`max` fall back to `dflt`.",
            "requiredOpts": [],
            "otherOpts": ["dflt", "min", "max", "arrayOk"]
        },
        "integer": {
            "description": "An integer, or a string holding one. Values outside `min`/`max` fall back to `dflt`.",
            "requiredOpts": [],
            "otherOpts": ["dflt", "min", "max", "arrayOk"]
        },
        "string": {
            "description": "A string. Numbers and booleans are converted unless `strict` is set.",
            "requiredOpts": [],
            "otherOpts": ["dflt", "noBlank", "strict", "arrayOk"]
        },
        "color": {
            "description": "A color: hex, rgb(a), hsl(a), hsv(a) or a named CSS color.",
            "requiredOpts": [],
            "otherOpts": ["dflt", "arrayOk"]
        },
        "colorscale": {
            "description": "A colorscale name, or an array of [level, color] pairs with levels rising from 0 to 1.",
            "requiredOpts": [],
            "otherOpts": ["dflt"]
        },
        "angle": {
            "description": "A number of degrees, wrapped into the -180 to 180 range, or `auto`.",
            "requiredOpts": [],
            "otherOpts": ["dflt", "arrayOk"]
        },
        "subplotid": {
            "description": "A subplot id: the default id, optionally followed by a counter of 2 or more (`x`, `x2`).",
            "requiredOpts": [],
            "otherOpts": ["dflt"]
        },
        "flaglist": {
            "description": "Flags from `flags` joined with `+` in any order, or a single value from `extras`.",
            "requiredOpts": ["flags"],
            "otherOpts": ["dflt", "extras", "arrayOk"]
        },
        "any": {
            "description": "Any type.",
            "requiredOpts": [],
            "otherOpts": ["dflt", "arrayOk"]
        },
        "info_array": {
            "description": "An array whose positions follow the declarations in `items`.",
            "requiredOpts": ["items"],
            "otherOpts": ["dflt", "freeLength", "dimensions"]
        }
    })
}

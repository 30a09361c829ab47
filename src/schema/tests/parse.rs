// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![allow(clippy::unwrap_used, clippy::panic)] // schema tests unwrap/panic to assert outcomes

use crate::schema::*;
use crate::value::Value;
use serde_json::json;

fn parse(j: serde_json::Value) -> Result<Node, SchemaError> {
    Node::from_serde_json_value(&j)
}

#[test]
fn leaf_and_composite() {
    let node = parse(json!({
        "width": { "valType": "number", "min": 0, "dflt": 2, "editType": "style" },
        "color": { "valType": "color", "arrayOk": true },
        "editType": "plot",
        "description": "line settings",
        "role": "object"
    }))
    .unwrap();

    let Node::Composite(c) = node else {
        panic!("expected composite");
    };
    assert_eq!(c.children.len(), 2);
    assert_eq!(c.edit_type.as_deref(), Some("plot"));
    assert_eq!(c.description.as_deref(), Some("line settings"));

    let width = c.get("width").unwrap().as_attribute().unwrap();
    assert_eq!(
        width.val_type,
        ValType::Number {
            min: Some(0.0),
            max: None
        }
    );
    assert_eq!(width.dflt, Value::from(2.0));
    assert!(!width.array_ok);

    let color = c.get("color").unwrap().as_attribute().unwrap();
    assert!(color.array_ok);
    assert_eq!(color.dflt, Value::Undefined);
}

#[test]
fn markers_are_not_children() {
    let node = parse(json!({
        "_isLinkedToArray": "button",
        "_arrayAttrRegexps": ["^buttons$"],
        "label": { "valType": "string" },
        "_deprecated": {
            "title": { "valType": "string" }
        },
        "impliedEdits": { "autorange": false }
    }))
    .unwrap();

    let c = node.as_composite().unwrap();
    let keys: Vec<&str> = c.children.keys().map(|k| k.as_ref()).collect();
    assert_eq!(keys, vec!["label"]);
    assert_eq!(c.linked_to_array.as_deref(), Some("button"));
    assert!(c.get("title").is_some());
    assert!(c.contains_key("label"));
    assert!(!c.contains_key("_deprecated"));
}

#[test]
fn flaglist_and_enumerated_options() {
    let node = parse(json!({
        "mode": {
            "valType": "flaglist",
            "flags": ["lines", "markers"],
            "extras": ["none"]
        },
        "visible": {
            "valType": "enumerated",
            "values": [true, false, "legendonly"],
            "dflt": true
        }
    }))
    .unwrap();
    let c = node.as_composite().unwrap();

    match &c.get("mode").unwrap().as_attribute().unwrap().val_type {
        ValType::Flaglist { flags, extras } => {
            assert_eq!(flags.len(), 2);
            assert_eq!(extras[0].as_ref(), "none");
        }
        other => panic!("unexpected {other:?}"),
    }
    match &c.get("visible").unwrap().as_attribute().unwrap().val_type {
        ValType::Enumerated { values, .. } => assert_eq!(values[1], Value::from(false)),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn info_array_items() {
    let node = parse(json!({
        "range": {
            "valType": "info_array",
            "items": [{ "valType": "any" }, { "valType": "any" }],
            "impliedEdits": { "autorange": false }
        },
        "domain": {
            "valType": "info_array",
            "freeLength": true,
            "items": { "valType": "number", "min": 0, "max": 1 }
        },
        "grid": {
            "valType": "info_array",
            "dimensions": 2,
            "items": [[{ "valType": "number" }, { "valType": "string" }]]
        }
    }))
    .unwrap();
    let c = node.as_composite().unwrap();

    let range = c.get("range").unwrap().as_attribute().unwrap();
    assert_eq!(range.implied_edits.get("autorange"), Some(&Value::from(false)));
    match &range.val_type {
        ValType::InfoArray { items, dimensions, free_length } => {
            assert_eq!(items.len(), Some(2));
            assert_eq!(*dimensions, 1);
            assert!(!free_length);
        }
        other => panic!("unexpected {other:?}"),
    }

    match &c.get("domain").unwrap().as_attribute().unwrap().val_type {
        ValType::InfoArray { items, free_length, .. } => {
            assert!(*free_length);
            assert!(matches!(items, InfoItems::Shared(_)));
        }
        other => panic!("unexpected {other:?}"),
    }

    match &c.get("grid").unwrap().as_attribute().unwrap().val_type {
        ValType::InfoArray { items, dimensions, .. } => {
            assert_eq!(*dimensions, 2);
            assert_eq!(items.get2(0, 1).unwrap().val_type.name(), "string");
            assert!(items.get2(1, 0).is_none());
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn definition_errors() {
    let cases = [
        (
            json!({"a": {"valType": "enumerated"}}),
            SchemaError::MissingOption {
                path: "a".to_string(),
                val_type: "enumerated",
                option: "values",
            },
        ),
        (
            json!({"m": {"b": {"valType": "flaglist"}}}),
            SchemaError::MissingOption {
                path: "m.b".to_string(),
                val_type: "flaglist",
                option: "flags",
            },
        ),
        (
            json!({"r": {"valType": "info_array"}}),
            SchemaError::MissingOption {
                path: "r".to_string(),
                val_type: "info_array",
                option: "items",
            },
        ),
        (
            json!({"a": {"valType": "datetime"}}),
            SchemaError::UnknownValType {
                path: "a".to_string(),
                val_type: "datetime".to_string(),
            },
        ),
        (
            json!({"a": {"valType": "number", "min": 3, "max": 1}}),
            SchemaError::InvalidBounds {
                path: "a".to_string(),
                min: 3.0,
                max: 1.0,
            },
        ),
        (
            json!({"a": {"valType": "info_array", "items": {"valType": "any"}, "dimensions": 3}}),
            SchemaError::InvalidDimensions {
                path: "a".to_string(),
                dimensions: 3,
            },
        ),
        (
            json!({"a": {"valType": "any", "editType": "repaint"}}),
            SchemaError::UnknownEditType {
                path: "a".to_string(),
                edit_type: "repaint".to_string(),
            },
        ),
        (
            json!({"a": 5}),
            SchemaError::NotAnObject {
                path: "a".to_string(),
            },
        ),
        (
            json!({"items": {"_isLinkedToArray": true}}),
            SchemaError::InvalidMarker {
                path: "items".to_string(),
                marker: IS_LINKED_TO_ARRAY,
                expected: "a string",
            },
        ),
    ];

    for (json, expected) in cases {
        assert_eq!(parse(json).unwrap_err(), expected);
    }
}

#[test]
fn combined_edit_types_are_accepted() {
    let node = parse(json!({
        "type": { "valType": "enumerated", "values": [], "editType": "calc+clearAxisTypes" }
    }))
    .unwrap();
    let attr = node.as_composite().unwrap().get("type").unwrap().clone();
    assert_eq!(attr.edit_type().map(|e| e.as_ref()), Some("calc+clearAxisTypes"));
}

#[test]
fn deserialize_through_serde() {
    let node: Node = serde_json::from_str(r#"{"a": {"valType": "boolean", "dflt": false}}"#).unwrap();
    assert!(node.as_composite().unwrap().contains_key("a"));

    let err = serde_json::from_str::<Node>(r#"{"a": {"valType": "enumerated"}}"#).unwrap_err();
    assert!(err.to_string().contains("requires `values`"));

    assert!(matches!(
        Node::from_json_str("{"),
        Err(SchemaError::Json(_))
    ));
}

#[test]
fn counters() {
    assert_eq!(split_counter("xaxis"), Some(("xaxis", None)));
    assert_eq!(split_counter("xaxis2"), Some(("xaxis", Some(2))));
    assert_eq!(split_counter("scene10"), Some(("scene", Some(10))));
    assert_eq!(split_counter("xaxis1"), None);
    assert_eq!(split_counter("xaxis01"), None);
    assert_eq!(split_counter("x2y"), None);
    assert_eq!(split_counter("xAxis"), None);
}

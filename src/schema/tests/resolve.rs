// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![allow(clippy::unwrap_used)] // schema tests unwrap to assert outcomes

use crate::path::PropPath;
use crate::schema::*;
use serde_json::json;

fn layout_schema() -> Node {
    Node::from_serde_json_value(&json!({
        "title": { "valType": "string" },
        "xaxis": {
            "_isSubplotObj": true,
            "range": {
                "valType": "info_array",
                "items": [{ "valType": "number" }, { "valType": "string" }]
            },
            "rangeselector": {
                "buttons": {
                    "_isLinkedToArray": "button",
                    "label": { "valType": "string" },
                    "count": { "valType": "number", "min": 0 }
                }
            }
        },
        "legend": {
            "font": { "size": { "valType": "number" } },
            "_deprecated": { "traceorder": { "valType": "string" } }
        },
        "grid": {
            "valType": "info_array",
            "dimensions": 2,
            "items": { "valType": "integer" }
        }
    }))
    .unwrap()
}

fn resolve(schema: &Node, path: &str) -> Option<&'static str> {
    schema
        .resolve(&PropPath::parse(path).unwrap())
        .map(|node| match node {
            Node::Attribute(a) => a.val_type.name(),
            Node::Composite(_) => "composite",
        })
}

#[test]
fn keys_descend_into_composites() {
    let schema = layout_schema();
    assert_eq!(resolve(&schema, "title"), Some("string"));
    assert_eq!(resolve(&schema, "legend.font.size"), Some("number"));
    assert_eq!(resolve(&schema, "legend.font"), Some("composite"));
    assert_eq!(resolve(&schema, "legend.traceorder"), Some("string"));
    assert_eq!(resolve(&schema, "legend.nope"), None);
    assert_eq!(resolve(&schema, "title.text"), None);
}

#[test]
fn subplot_counters_share_declaration() {
    let schema = layout_schema();
    assert_eq!(resolve(&schema, "xaxis2.range"), Some("info_array"));
    assert_eq!(resolve(&schema, "xaxis11.range[0]"), Some("number"));
    assert_eq!(resolve(&schema, "legend2.font"), None);
}

#[test]
fn indices_after_linked_arrays_are_skipped() {
    let schema = layout_schema();
    assert_eq!(
        resolve(&schema, "xaxis.rangeselector.buttons[3].count"),
        Some("number")
    );
    assert_eq!(
        resolve(&schema, "xaxis.rangeselector.buttons"),
        Some("composite")
    );
    assert_eq!(resolve(&schema, "xaxis.rangeselector[0]"), None);

    let buttons = schema
        .resolve(&PropPath::parse("xaxis.rangeselector.buttons").unwrap())
        .unwrap();
    assert_eq!(
        buttons
            .resolve(&PropPath::parse("[2].label").unwrap())
            .map(|n| n.is_val_object()),
        Some(true)
    );
}

#[test]
fn info_array_positions() {
    let schema = layout_schema();
    assert_eq!(resolve(&schema, "xaxis.range[1]"), Some("string"));
    assert_eq!(resolve(&schema, "xaxis.range[2]"), None);
    assert_eq!(resolve(&schema, "grid[4][7]"), Some("integer"));
    assert_eq!(resolve(&schema, "grid[4]"), Some("info_array"));
    assert_eq!(resolve(&schema, "title[0]"), None);
}

#[test]
fn merge_is_deep() {
    let mut base = layout_schema().as_composite().unwrap().as_ref().clone();
    let extra = Node::from_serde_json_value(&json!({
        "legend": { "bgcolor": { "valType": "color" } },
        "title": { "valType": "any" }
    }))
    .unwrap();
    base.merge(extra.as_composite().unwrap());

    let merged = Node::Composite(std::rc::Rc::new(base));
    assert_eq!(resolve(&merged, "legend.font.size"), Some("number"));
    assert_eq!(resolve(&merged, "legend.bgcolor"), Some("color"));
    assert_eq!(resolve(&merged, "title"), Some("any"));
}

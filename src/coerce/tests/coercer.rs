// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![allow(clippy::unwrap_used, clippy::panic)] // coercion tests unwrap/panic to assert outcomes

use crate::coerce::*;
use crate::path::PathError;
use crate::schema::Node;
use crate::value::Value;
use serde_json::json;

fn axis_schema() -> Node {
    Node::from_serde_json_value(&json!({
        "xaxis": {
            "_isSubplotObj": true,
            "range": {
                "valType": "info_array",
                "items": [
                    { "valType": "any", "impliedEdits": { "^autorange": false } },
                    { "valType": "any", "impliedEdits": { "^autorange": false } }
                ],
                "impliedEdits": { "autorange": false }
            },
            "autorange": {
                "valType": "enumerated",
                "values": [true, false, "reversed"],
                "dflt": true,
                "impliedEdits": { "range[0]": null, "range[1]": null }
            },
            "title": {
                "text": { "valType": "string" },
                "font": {
                    "family": { "valType": "string", "noBlank": true },
                    "size": { "valType": "number", "min": 1 },
                    "color": { "valType": "color" }
                }
            }
        },
        "width": { "valType": "number", "min": 10, "dflt": 700 }
    }))
    .unwrap()
}

#[test]
fn coercing_twice_gives_the_same_output() {
    let schema = axis_schema();
    let input = Value::from(json!({
        "xaxis": { "range": [0, "x"], "autorange": "sideways", "title": { "text": 3 } },
        "width": "5"
    }));

    for attr in ["xaxis.range", "xaxis.autorange", "xaxis.title.text", "xaxis.title.font.size", "width"] {
        let mut first = Value::new_object();
        let a = coerce(&input, &mut first, &schema, attr, &Value::Undefined).unwrap();
        let mut second = Value::new_object();
        let b = coerce(&input, &mut second, &schema, attr, &Value::Undefined).unwrap();
        assert_eq!(a, b, "{attr}");
        assert_eq!(first, second, "{attr}");

        // A second pass over an already coerced output changes nothing.
        let again = coerce(&input, &mut first, &schema, attr, &Value::Undefined).unwrap();
        assert_eq!(again, a, "{attr}");
        assert_eq!(first, second, "{attr}");
    }
}

#[test]
fn implied_edit_overrides_later_coercion() {
    let schema = axis_schema();
    let input = Value::from(json!({ "xaxis": { "range": [0, 5], "autorange": true } }));
    let mut output = Value::new_object();

    let mut c = Coercer::new(&input, &mut output, &schema);
    assert_eq!(c.coerce("xaxis.range").unwrap(), Value::from(json!([0, 5])));
    assert!(c.is_implied("xaxis.autorange"));
    assert_eq!(c.coerce("xaxis.autorange").unwrap(), Value::from(false));
    assert_eq!(c.output()["xaxis"]["autorange"], Value::from(false));
}

#[test]
fn implied_edit_applies_when_target_was_coerced_first() {
    let schema = axis_schema();
    let input = Value::from(json!({ "xaxis": { "range": [0, 5] } }));
    let mut output = Value::new_object();

    let mut c = Coercer::new(&input, &mut output, &schema);
    assert_eq!(c.coerce("xaxis.autorange").unwrap(), Value::from(true));
    c.coerce("xaxis.range").unwrap();
    assert_eq!(output["xaxis"]["autorange"], Value::from(false));
}

#[test]
fn invalid_or_missing_values_imply_nothing() {
    let schema = axis_schema();
    let input = Value::from(json!({ "xaxis": { "autorange": "sideways" } }));
    let mut output = Value::new_object();

    let mut c = Coercer::new(&input, &mut output, &schema);
    assert_eq!(c.coerce("xaxis.range").unwrap(), Value::Undefined);
    assert!(!c.is_implied("xaxis.autorange"));
    assert_eq!(c.coerce("xaxis.autorange").unwrap(), Value::from(true));
}

#[test]
fn null_implied_values_are_skipped() {
    let schema = axis_schema();
    let input = Value::from(json!({ "xaxis": { "autorange": false } }));
    let mut output = Value::new_object();

    let mut c = Coercer::new(&input, &mut output, &schema);
    c.coerce("xaxis.autorange").unwrap();
    assert!(!c.is_implied("xaxis.range[0]"));
    assert_eq!(output["xaxis"]["range"], Value::Undefined);
}

#[test]
fn subplot_counters_coerce_against_the_base_declaration() {
    let schema = axis_schema();
    let input = Value::from(json!({ "xaxis3": { "range": [1, 2] } }));
    let mut output = Value::new_object();

    let mut c = Coercer::new(&input, &mut output, &schema);
    c.coerce("xaxis3.range").unwrap();
    c.coerce("xaxis3.autorange").unwrap();
    assert_eq!(
        output,
        Value::from(json!({ "xaxis3": { "range": [1, 2], "autorange": false } }))
    );
}

#[test]
fn caller_default_overrides_declared_default() {
    let schema = axis_schema();
    let input = Value::from(json!({ "width": 5 }));
    let mut output = Value::new_object();

    let v = coerce(&input, &mut output, &schema, "width", &Value::from(450.0)).unwrap();
    assert_eq!(v, Value::from(450.0));
    let v = coerce(&input, &mut output, &schema, "width", &Value::Undefined).unwrap();
    assert_eq!(v, Value::from(700.0));
}

#[test]
fn coerce2_reports_only_given_values() {
    let schema = axis_schema();
    let input = Value::from(json!({ "xaxis": { "title": { "text": "t" } } }));
    let mut output = Value::new_object();

    let mut c = Coercer::new(&input, &mut output, &schema);
    assert_eq!(c.coerce2("xaxis.title.text").unwrap(), Value::from("t"));
    assert_eq!(c.coerce2("width").unwrap(), Value::Undefined);
    assert_eq!(output["width"], Value::from(700.0));
}

#[test]
fn fonts_fall_back_per_key() {
    let schema = axis_schema();
    let input = Value::from(json!({ "xaxis": { "title": { "font": { "size": 0, "color": "red" } } } }));
    let mut output = Value::new_object();
    let dflt = Value::from(json!({ "family": "Arial", "size": 12, "color": "#444" }));

    let mut c = Coercer::new(&input, &mut output, &schema);
    let font = c.coerce_font("xaxis.title.font", &dflt).unwrap();
    assert_eq!(
        font,
        Value::from(json!({ "family": "Arial", "size": 12, "color": "red" }))
    );
    assert_eq!(output["xaxis"]["title"]["font"], font);
}

#[test]
fn caller_errors() {
    let schema = axis_schema();
    let input = Value::new_object();
    let mut output = Value::new_object();
    let mut c = Coercer::new(&input, &mut output, &schema);

    assert_eq!(
        c.coerce("height"),
        Err(CoerceError::NotInSchema("height".to_string()))
    );
    assert_eq!(
        c.coerce("xaxis.title"),
        Err(CoerceError::NotAnAttribute("xaxis.title".to_string()))
    );
    assert!(matches!(
        c.coerce("xaxis..range"),
        Err(CoerceError::Path(PathError::InvalidPath { .. }))
    ));
}

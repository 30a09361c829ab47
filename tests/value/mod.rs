// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg(test)]

use anyhow::Result;
use figschema::*;

#[test]
fn serialize_number() -> Result<()> {
    // Check that integer values are serialized without fractional part
    assert_eq!(serde_json::to_string_pretty(&Value::from(1.0))?, "1");
    assert_eq!(serde_json::to_string_pretty(&Value::from(-1.0))?, "-1");

    // Ensure that fractional parts are also serialized.
    assert_eq!(serde_json::to_string_pretty(&Value::from(1.1))?, "1.1");
    assert_eq!(serde_json::to_string_pretty(&Value::from(-1.1))?, "-1.1");

    Ok(())
}

#[test]
fn serialize_string() -> Result<()> {
    assert_eq!(
        Value::String("Hello, World\n".into()).to_json_str()?,
        "\"Hello, World\\n\""
    );
    Ok(())
}

#[test]
fn object_keys_keep_their_order() -> Result<()> {
    let v = Value::from_json_str(r#"{ "y": [1], "x": [2], "mode": "lines" }"#)?;
    let keys: Vec<&str> = v.as_object()?.keys().map(|k| &**k).collect();
    assert_eq!(keys, vec!["y", "x", "mode"]);

    assert_eq!(v.to_string(), r#"{"y":[1],"x":[2],"mode":"lines"}"#);
    Ok(())
}

#[test]
fn constructors() -> Result<()> {
    assert_eq!(Value::new_object(), Value::from_json_str("{}")?);
    assert_eq!(Value::new_array(), Value::from_json_str("[]")?);
    assert_eq!(Value::from(serde_json::json!([1, "a", null])), Value::from_json_str(r#"[1, "a", null]"#)?);
    Ok(())
}

#[test]
fn index_missing_values() -> Result<()> {
    let v = Value::from_json_str(r#"{ "marker": { "size": [4, 8] } }"#)?;

    assert_eq!(v["marker"]["size"][1], Value::from(8.0));
    assert_eq!(v["marker"]["size"][2], Value::Undefined);
    assert_eq!(v["line"]["width"], Value::Undefined);
    assert_eq!(v[0], Value::Undefined);
    Ok(())
}

#[test]
fn inline_strings() {
    assert_eq!(Value::from("a big number").to_inline_string(), "a big number");
    assert_eq!(Value::from(-1.0).to_inline_string(), "-1");
    assert_eq!(Value::from(vec![Value::from(0.5), Value::Null]).to_inline_string(), "[0.5,null]");
    assert_eq!(Value::Undefined.to_inline_string(), "undefined");
}

#[test]
fn truthiness() {
    assert!(Value::from("legendonly").is_truthy());
    assert!(Value::new_array().is_truthy());
    assert!(!Value::from("").is_truthy());
    assert!(!Value::from(0.0).is_truthy());
    assert!(!Value::Null.is_truthy());
    assert!(!Value::Undefined.is_truthy());
}

#[test]
fn nested_property_round_trip() -> Result<()> {
    let mut figure = Value::new_object();

    {
        let mut np = nested_property(&mut figure, "xaxis.range[1]")?;
        assert_eq!(np.get(), &Value::Undefined);
        np.set(Value::from(5.0))?;
        assert_eq!(np.astr(), "xaxis.range[1]");
    }
    assert_eq!(figure["xaxis"]["range"].array_len(), 2);
    assert_eq!(figure["xaxis"]["range"][1], Value::from(5.0));

    nested_property(&mut figure, "xaxis.title.text")?.set(Value::from("Time"))?;
    assert_eq!(figure["xaxis"]["title"]["text"], Value::from("Time"));

    // Null deletes the key but keeps its parent.
    nested_property(&mut figure, "xaxis.title.text")?.set(Value::Null)?;
    assert_eq!(figure["xaxis"]["title"], Value::new_object());
    Ok(())
}

#[test]
fn nested_property_errors() -> Result<()> {
    let mut figure = Value::from_json_str(r#"{ "title": "plain" }"#)?;

    assert!(matches!(
        nested_property(&mut figure, "title.text")?.set(Value::from("x")),
        Err(PathError::NotAContainer { .. })
    ));
    assert!(nested_property(&mut figure, "a[x]").is_err());
    assert!(nested_property(&mut figure, "").is_err());

    let path: PropPath = "annotations[2].font.size".parse()?;
    assert_eq!(
        path.segments(),
        &[
            Segment::from("annotations"),
            Segment::Index(2),
            Segment::from("font"),
            Segment::from("size"),
        ]
    );
    assert_eq!(path.to_string(), "annotations[2].font.size");
    Ok(())
}

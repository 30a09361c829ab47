// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![allow(clippy::unwrap_used, clippy::panic)] // session tests unwrap/panic to assert outcomes

use super::*;

use serde_json::json;

#[test]
fn config_from_json() {
    let config = Config::from_json_str(r##"{ "logging": 0, "colorPalette": ["#000", "#fff"] }"##).unwrap();

    assert_eq!(config.logging, 0);
    assert_eq!(config.default_trace_type, "scatter");
    assert_eq!(config.default_color(0), "#000");
    assert_eq!(config.default_color(3), "#fff");
}

#[test]
fn config_rejects_bad_input() {
    assert!(Config::from_json_str(r#"{ "logging": 3 }"#).is_err());
    assert!(Config::from_json_str(r#"{ "verbose": true }"#).is_err());
}

#[test]
fn empty_palette_falls_back_to_grey() {
    let mut session = Session::new().unwrap();
    session.set_color_palette(vec![]);
    assert_eq!(session.config().default_color(4), "#444");
}

#[test]
fn stock_modules_are_registered() {
    let session = Session::new().unwrap();

    assert_eq!(session.modules().all_trace_types(), vec![Rc::<str>::from("scatter")]);
    assert!(session.lookup(ModuleType::Transform, "filter").is_some());
    assert!(session.lookup(ModuleType::Component, "annotations").is_some());
    assert!(session.lookup(ModuleType::Component, "rangeselector").is_some());
    assert!(session.modules().base_plot("cartesian").is_some());
    assert!(session.trace_is("scatter", "showLegend"));
    assert!(!session.trace_is("scatter", "noOpacity"));
}

#[test]
fn empty_session_knows_no_modules() {
    let session = Session::empty().unwrap();

    assert!(session.modules().all_trace_types().is_empty());
    assert!(!session.trace_is("scatter", "showLegend"));
    // Only the base attributes remain.
    let attrs = session.trace_attributes("scatter");
    assert!(attrs.contains_key("visible"));
    assert!(!attrs.contains_key("x"));
}

#[test]
fn trace_attributes_merge_all_sources() {
    let session = Session::new().unwrap();
    let attrs = session.trace_attributes("scatter");

    for key in ["visible", "name", "x", "marker", "xaxis", "yaxis"] {
        assert!(attrs.contains_key(key), "missing {key}");
    }
    let Some(Node::Attribute(type_attr)) = attrs.get("type") else {
        panic!("type must be an attribute");
    };
    assert_eq!(type_attr.dflt, Value::from("scatter"));

    // Unknown types get the default type's tree.
    assert_eq!(session.trace_attributes("bar"), attrs);
}

#[test]
fn layout_attributes_depend_on_traces() {
    let session = Session::new().unwrap();

    let without = session.layout_attributes(&[]);
    assert!(without.contains_key("xaxis"));
    assert!(without.contains_key("xaxis3"));
    assert!(without.contains_key("annotations"));
    assert!(!without.contains_key("scattermode"));

    let full = session
        .supply_defaults(&[Value::from(json!({ "y": [1] }))], &Value::new_object())
        .unwrap();
    let with = session.layout_attributes(&full.data);
    assert!(with.contains_key("scattermode"));

    let Some(Node::Composite(xaxis)) = with.get("xaxis") else {
        panic!("xaxis must be a container");
    };
    assert!(xaxis.is_subplot_obj);
    assert!(xaxis.contains_key("rangeselector"));
}

#[test]
fn edit_types_and_array_attributes() {
    let session = Session::new().unwrap();

    let edit_types = session.trace_edit_types("scatter");
    assert_eq!(edit_types.get("x").map(|e| &**e), Some("calc+clearAxisTypes"));
    assert_eq!(edit_types.get("line.color").map(|e| &**e), Some("style"));

    let trace = Value::from(json!({
        "type": "scatter",
        "x": [1, 2],
        "y": [3, 4],
        "text": "same for all",
        "marker": { "size": [5, 6] }
    }));
    assert_eq!(session.find_array_attributes(&trace), vec!["x", "y", "marker.size"]);
}

#[test]
fn registering_through_the_session() {
    let mut session = Session::new().unwrap();
    session.set_logging(0);

    let err = session
        .register(crate::registry::ModuleDef::transform("noop"))
        .unwrap_err();
    assert_eq!(
        err,
        RegistryError::MissingTransform {
            module: "noop".to_string()
        }
    );
    assert!(session.lookup(ModuleType::Transform, "noop").is_none());
}

#[test]
fn schema_describes_registered_modules() {
    let session = Session::new().unwrap();
    let schema = session.schema().unwrap();

    let keys: Vec<&str> = schema.as_object().unwrap().keys().map(|k| &**k).collect();
    assert_eq!(keys, vec!["defs", "traces", "layout", "transforms"]);
    assert!(schema["defs"]["valObjects"]["flaglist"].is_object());

    let scatter = &schema["traces"]["scatter"];
    assert_eq!(scatter["type"], Value::from("scatter"));
    assert_eq!(scatter["categories"][4], Value::from("showLegend"));
    assert!(scatter["meta"]["description"].is_truthy());
    let attributes = &scatter["attributes"];
    assert_eq!(attributes["type"], Value::from("scatter"));
    assert_eq!(attributes["mode"]["valType"], Value::from("flaglist"));
    assert_eq!(attributes["marker"]["role"], Value::from("object"));
    assert_eq!(attributes["xsrc"]["valType"], Value::from("string"));
    assert_eq!(attributes["xaxis"]["valType"], Value::from("subplotid"));
    assert!(attributes["showlegend"].is_object());
    assert_eq!(scatter["layoutAttributes"]["scattermode"]["dflt"], Value::from("overlay"));

    let layout = &schema["layout"]["layoutAttributes"];
    assert_eq!(layout["title"]["role"], Value::from("object"));
    assert_eq!(layout["xaxis"]["_isSubplotObj"], Value::from(true));
    assert!(layout["xaxis"]["rangeselector"].is_object());
    assert!(layout["yaxis"]["rangeselector"].is_undefined());
    assert_eq!(layout["xaxis"]["tickangle"]["dflt"], Value::from("auto"));
    assert!(layout["annotations"]["items"]["annotation"]["text"].is_object());
    assert!(layout["scattermode"].is_undefined());

    let filter = &schema["transforms"]["filter"]["attributes"];
    assert_eq!(filter["type"]["values"], Value::from(json!(["filter"])));
    assert_eq!(filter["enabled"]["dflt"], Value::from(true));
    assert_eq!(filter["operation"]["dflt"], Value::from("="));
    assert_eq!(filter["target"]["arrayOk"], Value::from(true));
    assert_eq!(filter["targetsrc"]["editType"], Value::from("none"));
}

#[test]
fn schema_drops_attributes_by_category() {
    let mut session = Session::new().unwrap();
    session.set_logging(0);
    let pie = crate::registry::ModuleDef::trace(
        "pie",
        &["noOpacity", "noHover"],
        Rc::new(crate::registry::BasePlotDef {
            name: "pie".into(),
            ..crate::registry::BasePlotDef::default()
        }),
    )
    .with_attributes(json!({ "values": { "valType": "data_array", "editType": "calc" } }));
    session.register(pie).unwrap();

    let schema = session.schema().unwrap();
    let attributes = &schema["traces"]["pie"]["attributes"];
    assert!(attributes["values"].is_object());
    assert!(attributes["valuessrc"].is_object());
    for dropped in ["opacity", "showlegend", "legendgroup", "hoverinfo"] {
        assert!(attributes[dropped].is_undefined(), "{dropped}");
    }
    assert!(schema["traces"]["pie"]["layoutAttributes"].is_undefined());
    assert!(schema["traces"]["scatter"]["attributes"]["opacity"].is_object());
}

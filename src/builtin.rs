// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Stock modules and the base attribute trees every session starts from.

use crate::session::Session;

use anyhow::Result;
use serde_json::json;

mod annotations;
mod cartesian;
mod filter;
mod rangeselector;
mod scatter;

pub use filter::{FilterOp, COMPARISON_OPS, INTERVAL_OPS, SET_OPS};

/// Registers the scatter trace (and with it the cartesian base plot), the
/// filter transform and the annotations and range selector components.
pub fn register_all(session: &mut Session) -> Result<()> {
    session.register(vec![
        scatter::module(),
        filter::module(),
        annotations::module(),
        rangeselector::module(),
    ])?;
    Ok(())
}

fn font_attributes(edit_type: &str) -> serde_json::Value {
    json!({
        "family": { "valType": "string", "noBlank": true, "strict": true, "editType": edit_type },
        "size": { "valType": "number", "min": 1, "editType": edit_type },
        "color": { "valType": "color", "editType": edit_type },
        "editType": edit_type
    })
}

/// Attributes shared by every trace type.
pub fn base_trace_attributes() -> serde_json::Value {
    json!({
        "visible": {
            "valType": "enumerated",
            "values": [true, false, "legendonly"],
            "dflt": true,
            "editType": "calc",
            "description": "Determines whether or not this trace is visible."
        },
        "showlegend": { "valType": "boolean", "dflt": true, "editType": "style" },
        "legendgroup": { "valType": "string", "dflt": "", "editType": "style" },
        "opacity": { "valType": "number", "min": 0, "max": 1, "dflt": 1, "editType": "style" },
        "name": { "valType": "string", "editType": "style" },
        "uid": { "valType": "string", "editType": "plot" },
        "ids": { "valType": "data_array", "editType": "calc" },
        "customdata": { "valType": "data_array", "editType": "calc" },
        "meta": { "valType": "any", "editType": "plot" },
        "hoverinfo": {
            "valType": "flaglist",
            "flags": ["x", "y", "z", "text", "name"],
            "extras": ["all", "none", "skip"],
            "arrayOk": true,
            "dflt": "all",
            "editType": "none"
        },
        "stream": {
            "token": { "valType": "string", "noBlank": true, "strict": true, "editType": "calc" },
            "maxpoints": { "valType": "number", "min": 0, "max": 10000, "dflt": 500, "editType": "calc" },
            "editType": "calc"
        },
        "uirevision": { "valType": "any", "editType": "none" },
        "editType": "calc"
    })
}

/// Layout attributes present regardless of the traces and modules.
pub fn base_layout_attributes() -> serde_json::Value {
    let mut font = font_attributes("calc");
    font["family"]["dflt"] = json!("\"Open Sans\", verdana, arial, sans-serif");
    font["size"]["dflt"] = json!(12);
    font["color"]["dflt"] = json!("#444");

    json!({
        "font": font,
        "title": {
            "text": { "valType": "string", "editType": "layoutstyle" },
            "font": font_attributes("layoutstyle"),
            "editType": "layoutstyle"
        },
        "autosize": {
            "valType": "enumerated",
            "values": [true, false, "initial"],
            "dflt": false,
            "editType": "none"
        },
        "width": { "valType": "number", "min": 10, "dflt": 700, "editType": "plot" },
        "height": { "valType": "number", "min": 10, "dflt": 450, "editType": "plot" },
        "margin": {
            "l": { "valType": "number", "min": 0, "dflt": 80, "editType": "plot" },
            "r": { "valType": "number", "min": 0, "dflt": 80, "editType": "plot" },
            "t": { "valType": "number", "min": 0, "dflt": 100, "editType": "plot" },
            "b": { "valType": "number", "min": 0, "dflt": 80, "editType": "plot" },
            "pad": { "valType": "number", "min": 0, "dflt": 0, "editType": "plot" },
            "autoexpand": { "valType": "boolean", "dflt": true, "editType": "plot" },
            "editType": "plot"
        },
        "paper_bgcolor": { "valType": "color", "dflt": "#fff", "editType": "plot" },
        "plot_bgcolor": { "valType": "color", "dflt": "#fff", "editType": "layoutstyle" },
        "separators": { "valType": "string", "editType": "plot" },
        "hidesources": { "valType": "boolean", "dflt": false, "editType": "plot" },
        "showlegend": { "valType": "boolean", "editType": "legend" },
        "datarevision": { "valType": "any", "editType": "calc" },
        "uirevision": { "valType": "any", "editType": "none" },
        "editType": "calc"
    })
}

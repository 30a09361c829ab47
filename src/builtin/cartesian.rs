// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The cartesian base plot: `xaxis`/`yaxis` subplot references on traces and
//! the matching axis objects in the layout.

use crate::coerce::Coercer;
use crate::registry::{BasePlotDef, LayoutContext};
use crate::schema::split_counter;
use crate::value::Value;

use anyhow::Result;
use serde_json::json;
use std::rc::Rc;

pub(super) const NAME: &str = "cartesian";

pub(super) fn base_plot() -> Rc<BasePlotDef> {
    Rc::new(BasePlotDef {
        name: NAME.into(),
        attr: vec!["xaxis".into(), "yaxis".into()],
        id_root: vec!["x".into(), "y".into()],
        attributes: Some(json!({
            "xaxis": { "valType": "subplotid", "dflt": "x", "editType": "calc+clearAxisTypes" },
            "yaxis": { "valType": "subplotid", "dflt": "y", "editType": "calc+clearAxisTypes" }
        })),
        layout_attributes: Some(axis_attributes()),
        supply_layout_defaults: Some(Rc::new(supply_layout_defaults)),
    })
}

fn axis_attributes() -> serde_json::Value {
    json!({
        "visible": { "valType": "boolean", "dflt": true, "editType": "plot" },
        "type": {
            "valType": "enumerated",
            "values": ["-", "linear", "log", "date", "category"],
            "dflt": "-",
            "editType": "calc"
        },
        "autorange": {
            "valType": "enumerated",
            "values": [true, false, "reversed"],
            "dflt": true,
            "editType": "axrange",
            "impliedEdits": { "range[0]": null, "range[1]": null }
        },
        "range": {
            "valType": "info_array",
            "items": [
                { "valType": "any", "editType": "axrange", "impliedEdits": { "^autorange": false } },
                { "valType": "any", "editType": "axrange", "impliedEdits": { "^autorange": false } }
            ],
            "editType": "axrange",
            "impliedEdits": { "autorange": false }
        },
        "fixedrange": { "valType": "boolean", "dflt": false, "editType": "calc" },
        "title": {
            "text": { "valType": "string", "editType": "ticks" },
            "font": super::font_attributes("ticks"),
            "editType": "ticks"
        },
        "showgrid": { "valType": "boolean", "dflt": true, "editType": "ticks" },
        "gridcolor": { "valType": "color", "dflt": "#eee", "editType": "ticks" },
        "zeroline": { "valType": "boolean", "dflt": true, "editType": "ticks" },
        "showticklabels": { "valType": "boolean", "dflt": true, "editType": "ticks" },
        "tickformat": { "valType": "string", "dflt": "", "editType": "ticks" },
        "tickangle": { "valType": "angle", "dflt": "auto", "editType": "ticks" },
        "editType": "calc"
    })
}

/// Layout keys of the axes to default: those referenced by visible traces
/// followed by any other axis present in the input, without repeats.
fn axis_keys(c: &Coercer<'_>, ctx: &LayoutContext<'_>) -> Vec<String> {
    let mut keys: Vec<String> = vec![];
    let Some(bpm) = ctx.modules.base_plot(NAME) else {
        return keys;
    };

    for trace in ctx.full_data {
        if !trace["visible"].is_truthy() {
            continue;
        }
        for attr in &bpm.attr {
            if let Value::String(id) = &trace[&**attr] {
                if let Some(key) = bpm.layout_key(id) {
                    if !keys.contains(&key) {
                        keys.push(key);
                    }
                }
            }
        }
    }

    if let Value::Object(layout) = c.input() {
        for key in layout.keys() {
            let is_axis = split_counter(key)
                .is_some_and(|(base, _)| bpm.attr.iter().any(|a| &**a == base));
            if is_axis && !keys.iter().any(|k| k.as_str() == &**key) {
                keys.push(key.to_string());
            }
        }
    }
    keys
}

fn supply_layout_defaults(c: &mut Coercer<'_>, ctx: &LayoutContext<'_>) -> Result<()> {
    let font = c.output()["font"].clone();
    for key in axis_keys(c, ctx) {
        axis_defaults(c, &key, &font)?;
    }
    Ok(())
}

fn axis_defaults(c: &mut Coercer<'_>, axis: &str, font: &Value) -> Result<()> {
    let attr = |name: &str| format!("{axis}.{name}");

    if !c.coerce(&attr("visible"))?.is_truthy() {
        return Ok(());
    }

    if c.coerce(&attr("type"))? == Value::from("-") {
        c.set(&attr("type"), "linear")?;
    }
    c.coerce(&attr("range"))?;
    c.coerce(&attr("autorange"))?;
    c.coerce(&attr("fixedrange"))?;

    c.coerce(&attr("title.text"))?;
    c.coerce_font(&attr("title.font"), font)?;

    if c.coerce(&attr("showgrid"))?.is_truthy() {
        c.coerce(&attr("gridcolor"))?;
    }
    c.coerce(&attr("zeroline"))?;
    if c.coerce(&attr("showticklabels"))?.is_truthy() {
        c.coerce(&attr("tickformat"))?;
        c.coerce(&attr("tickangle"))?;
    }
    Ok(())
}

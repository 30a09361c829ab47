// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Range selector buttons, contributed to every x axis.

use crate::coerce::Coercer;
use crate::plots::array_container_defaults;
use crate::registry::{LayoutContext, ModuleDef};
use crate::schema::split_counter;
use crate::value::Value;

use anyhow::Result;
use serde_json::json;

pub(super) fn module() -> ModuleDef {
    ModuleDef::component("rangeselector").with_schema(json!({
        "subplots": {
            "xaxis": {
                "rangeselector": {
                    "visible": { "valType": "boolean", "editType": "plot" },
                    "buttons": {
                        "_isLinkedToArray": "button",
                        "visible": { "valType": "boolean", "dflt": true, "editType": "plot" },
                        "step": {
                            "valType": "enumerated",
                            "values": ["month", "year", "day", "hour", "minute", "second", "all"],
                            "dflt": "month",
                            "editType": "plot"
                        },
                        "stepmode": {
                            "valType": "enumerated",
                            "values": ["backward", "todate"],
                            "dflt": "backward",
                            "editType": "plot"
                        },
                        "count": { "valType": "number", "min": 0, "dflt": 1, "editType": "plot" },
                        "label": { "valType": "string", "editType": "plot" },
                        "editType": "plot"
                    },
                    "x": { "valType": "number", "min": -2, "max": 3, "editType": "plot" },
                    "y": { "valType": "number", "min": -2, "max": 3, "editType": "plot" },
                    "bgcolor": { "valType": "color", "dflt": "#eee", "editType": "plot" },
                    "editType": "plot"
                }
            }
        }
    }))
    .with_supply_layout_defaults(supply_layout_defaults)
}

fn supply_layout_defaults(c: &mut Coercer<'_>, _ctx: &LayoutContext<'_>) -> Result<()> {
    let Value::Object(layout) = c.output() else {
        return Ok(());
    };
    let axes: Vec<String> = layout
        .iter()
        .filter(|(key, axis)| {
            axis.is_object() && split_counter(key).is_some_and(|(base, _)| base == "xaxis")
        })
        .map(|(key, _)| key.to_string())
        .collect();

    for axis in axes {
        if c.output()[axis.as_str()]["visible"] == Value::Bool(false) {
            continue;
        }
        rangeselector_defaults(c, &format!("{axis}.rangeselector"))?;
    }
    Ok(())
}

fn rangeselector_defaults(c: &mut Coercer<'_>, prefix: &str) -> Result<()> {
    let buttons = array_container_defaults(c, &format!("{prefix}.buttons"), |c, button| {
        if !c.coerce(&format!("{button}.visible"))?.is_truthy() {
            return Ok(());
        }
        if c.coerce(&format!("{button}.step"))? != Value::from("all") {
            c.coerce(&format!("{button}.stepmode"))?;
            c.coerce(&format!("{button}.count"))?;
        }
        c.coerce(&format!("{button}.label"))?;
        Ok(())
    })?;

    if c.coerce_with_default(&format!("{prefix}.visible"), buttons > 0)?.is_truthy() {
        c.coerce(&format!("{prefix}.x"))?;
        c.coerce(&format!("{prefix}.y"))?;
        c.coerce(&format!("{prefix}.bgcolor"))?;
    }
    Ok(())
}

// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::coerce::Coercer;
use crate::plots::array_container_defaults;
use crate::registry::{LayoutContext, ModuleDef};
use crate::value::Value;

use anyhow::Result;
use serde_json::json;

pub(super) fn module() -> ModuleDef {
    ModuleDef::component("annotations")
        .with_layout_attributes(json!({
            "_isLinkedToArray": "annotation",
            "visible": { "valType": "boolean", "dflt": true, "editType": "calc+arraydraw" },
            "text": { "valType": "string", "editType": "calc+arraydraw" },
            "textangle": { "valType": "angle", "dflt": 0, "editType": "calc+arraydraw" },
            "font": super::font_attributes("calc+arraydraw"),
            "opacity": { "valType": "number", "min": 0, "max": 1, "dflt": 1, "editType": "arraydraw" },
            "align": {
                "valType": "enumerated",
                "values": ["left", "center", "right"],
                "dflt": "center",
                "editType": "arraydraw"
            },
            "bgcolor": { "valType": "color", "dflt": "rgba(0,0,0,0)", "editType": "arraydraw" },
            "bordercolor": { "valType": "color", "dflt": "rgba(0,0,0,0)", "editType": "arraydraw" },
            "borderwidth": { "valType": "number", "min": 0, "dflt": 1, "editType": "calc+arraydraw" },
            "showarrow": { "valType": "boolean", "dflt": true, "editType": "calc+arraydraw" },
            "arrowcolor": { "valType": "color", "editType": "arraydraw" },
            "arrowhead": { "valType": "integer", "min": 0, "max": 8, "dflt": 1, "editType": "arraydraw" },
            "arrowwidth": { "valType": "number", "min": 0.1, "editType": "calc+arraydraw" },
            "ax": { "valType": "any", "editType": "calc+arraydraw" },
            "ay": { "valType": "any", "editType": "calc+arraydraw" },
            "xref": { "valType": "string", "noBlank": true, "dflt": "x", "editType": "calc" },
            "x": { "valType": "any", "editType": "calc+arraydraw" },
            "xanchor": {
                "valType": "enumerated",
                "values": ["auto", "left", "center", "right"],
                "dflt": "auto",
                "editType": "calc+arraydraw"
            },
            "yref": { "valType": "string", "noBlank": true, "dflt": "y", "editType": "calc" },
            "y": { "valType": "any", "editType": "calc+arraydraw" },
            "yanchor": {
                "valType": "enumerated",
                "values": ["auto", "top", "middle", "bottom"],
                "dflt": "auto",
                "editType": "calc+arraydraw"
            },
            "editType": "calc"
        }))
        .with_supply_layout_defaults(supply_layout_defaults)
}

fn supply_layout_defaults(c: &mut Coercer<'_>, _ctx: &LayoutContext<'_>) -> Result<()> {
    let font = c.output()["font"].clone();
    array_container_defaults(c, "annotations", |c, item| annotation_defaults(c, item, &font))?;
    Ok(())
}

fn annotation_defaults(c: &mut Coercer<'_>, item: &str, font: &Value) -> Result<()> {
    let attr = |name: &str| format!("{item}.{name}");

    if !c.coerce(&attr("visible"))?.is_truthy() {
        return Ok(());
    }

    let show_arrow = c.coerce(&attr("showarrow"))?.is_truthy();
    c.coerce_with_default(&attr("text"), if show_arrow { " " } else { "new text" })?;
    c.coerce(&attr("textangle"))?;
    c.coerce_font(&attr("font"), font)?;
    c.coerce(&attr("opacity"))?;
    c.coerce(&attr("align"))?;
    c.coerce(&attr("bgcolor"))?;
    c.coerce(&attr("bordercolor"))?;
    c.coerce(&attr("borderwidth"))?;

    if show_arrow {
        c.coerce_with_default(&attr("arrowcolor"), font["color"].clone())?;
        c.coerce(&attr("arrowhead"))?;
        c.coerce(&attr("arrowwidth"))?;
        c.coerce_with_default(&attr("ax"), -10.0)?;
        c.coerce_with_default(&attr("ay"), -30.0)?;
    }

    for axis in ["x", "y"] {
        c.coerce(&attr(&format!("{axis}ref")))?;
        c.coerce_with_default(&attr(axis), 0.5)?;
        c.coerce(&attr(&format!("{axis}anchor")))?;
    }
    Ok(())
}

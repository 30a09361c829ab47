// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use super::cartesian;
use crate::coerce::Coercer;
use crate::registry::{DefaultsContext, LayoutContext, ModuleDef};
use crate::value::Value;

use anyhow::Result;
use serde_json::json;

/// Below this many points the default mode also draws markers.
const PTS_LINESONLY: usize = 20;

const CATEGORIES: [&str; 7] = [
    "cartesian",
    "svg",
    "symbols",
    "errorBarsOK",
    "showLegend",
    "scatter-like",
    "zoomScale",
];

pub(super) fn module() -> ModuleDef {
    ModuleDef::trace("scatter", &CATEGORIES, cartesian::base_plot())
        .with_attributes(attributes())
        .with_layout_attributes(json!({
            "scattermode": {
                "valType": "enumerated",
                "values": ["group", "overlay"],
                "dflt": "overlay",
                "editType": "calc"
            },
            "scattergap": { "valType": "number", "min": 0, "max": 1, "editType": "calc" }
        }))
        .with_meta(Value::from(json!({
            "description": "The scatter trace type encompasses line charts, scatter charts, text charts, and bubble charts."
        })))
        .with_supply_defaults(supply_defaults)
        .with_supply_layout_defaults(supply_layout_defaults)
}

fn attributes() -> serde_json::Value {
    json!({
        "x": { "valType": "data_array", "editType": "calc+clearAxisTypes" },
        "x0": { "valType": "any", "dflt": 0, "editType": "calc+clearAxisTypes" },
        "dx": { "valType": "number", "dflt": 1, "editType": "calc" },
        "y": { "valType": "data_array", "editType": "calc+clearAxisTypes" },
        "y0": { "valType": "any", "dflt": 0, "editType": "calc+clearAxisTypes" },
        "dy": { "valType": "number", "dflt": 1, "editType": "calc" },
        "text": { "valType": "string", "dflt": "", "arrayOk": true, "editType": "calc" },
        "hovertext": { "valType": "string", "dflt": "", "arrayOk": true, "editType": "style" },
        "mode": {
            "valType": "flaglist",
            "flags": ["lines", "markers", "text"],
            "extras": ["none"],
            "editType": "calc",
            "description": "Determines the drawing mode for this scatter trace."
        },
        "line": {
            "color": { "valType": "color", "editType": "style" },
            "width": { "valType": "number", "min": 0, "dflt": 2, "editType": "style" },
            "shape": {
                "valType": "enumerated",
                "values": ["linear", "spline", "hv", "vh", "hvh", "vhv"],
                "dflt": "linear",
                "editType": "plot"
            },
            "smoothing": { "valType": "number", "min": 0, "max": 1.3, "dflt": 1, "editType": "plot" },
            "dash": {
                "valType": "enumerated",
                "values": ["solid", "dot", "dash", "longdash", "dashdot", "longdashdot"],
                "dflt": "solid",
                "editType": "style"
            },
            "editType": "plot"
        },
        "connectgaps": { "valType": "boolean", "dflt": false, "editType": "calc" },
        "fill": {
            "valType": "enumerated",
            "values": ["none", "tozeroy", "tozerox", "tonexty", "tonextx", "toself", "tonext"],
            "dflt": "none",
            "editType": "calc"
        },
        "fillcolor": { "valType": "color", "editType": "style" },
        "marker": {
            "symbol": {
                "valType": "enumerated",
                "values": ["circle", "square", "diamond", "cross", "x", "triangle-up", "triangle-down"],
                "dflt": "circle",
                "arrayOk": true,
                "editType": "style"
            },
            "opacity": { "valType": "number", "min": 0, "max": 1, "arrayOk": true, "editType": "style" },
            "size": { "valType": "number", "min": 0, "dflt": 6, "arrayOk": true, "editType": "calc" },
            "color": { "valType": "color", "arrayOk": true, "editType": "style" },
            "colorscale": { "valType": "colorscale", "editType": "calc" },
            "line": {
                "color": { "valType": "color", "arrayOk": true, "editType": "style" },
                "width": { "valType": "number", "min": 0, "arrayOk": true, "editType": "style" },
                "editType": "calc"
            },
            "editType": "calc"
        },
        "textposition": {
            "valType": "enumerated",
            "values": [
                "top left", "top center", "top right",
                "middle left", "middle center", "middle right",
                "bottom left", "bottom center", "bottom right"
            ],
            "dflt": "middle center",
            "arrayOk": true,
            "editType": "calc"
        },
        "textfont": super::font_attributes("calc"),
        "editType": "calc"
    })
}

fn has_flag(mode: &Value, flag: &str) -> bool {
    matches!(mode, Value::String(m) if m.split('+').any(|f| f == flag))
}

/// Resolves the coordinate arrays and returns the number of points, zero
/// when neither `x` nor `y` was given.
fn xy_defaults(c: &mut Coercer<'_>) -> Result<usize> {
    let x = c.coerce("x")?;
    let y = c.coerce("y")?;

    let len = match (x.is_array(), y.is_array()) {
        (true, true) => x.array_len().min(y.array_len()),
        (true, false) => {
            c.coerce("y0")?;
            c.coerce("dy")?;
            x.array_len()
        }
        (false, true) => {
            c.coerce("x0")?;
            c.coerce("dx")?;
            y.array_len()
        }
        (false, false) => return Ok(0),
    };
    c.set("_length", len)?;
    Ok(len)
}

/// `#rrggbb` with an alpha channel, other colors unchanged.
fn with_alpha(color: &str, alpha: f64) -> String {
    let hex = color.strip_prefix('#').filter(|h| h.len() == 6);
    match hex.map(|h| u32::from_str_radix(h, 16)) {
        Some(Ok(rgb)) => format!(
            "rgba({},{},{},{alpha})",
            (rgb >> 16) & 0xff,
            (rgb >> 8) & 0xff,
            rgb & 0xff
        ),
        _ => color.to_string(),
    }
}

fn supply_defaults(c: &mut Coercer<'_>, ctx: &DefaultsContext<'_>) -> Result<()> {
    let len = xy_defaults(c)?;
    if len == 0 {
        c.set("visible", false)?;
        return Ok(());
    }

    c.coerce("text")?;
    c.coerce("hovertext")?;
    let dflt_mode = if len < PTS_LINESONLY {
        "lines+markers"
    } else {
        "lines"
    };
    let mode = c.coerce_with_default("mode", dflt_mode)?;

    let mut line_color = Value::Undefined;
    if has_flag(&mode, "lines") {
        line_color = c.coerce_with_default("line.color", ctx.default_color)?;
        c.coerce("line.width")?;
        c.coerce("line.dash")?;
        if c.coerce("line.shape")? == Value::from("spline") {
            c.coerce("line.smoothing")?;
        }
        c.coerce("connectgaps")?;
    }

    let mut marker_color = Value::Undefined;
    if has_flag(&mode, "markers") {
        let dflt = match &line_color {
            Value::String(_) => line_color.clone(),
            _ => Value::from(ctx.default_color),
        };
        marker_color = c.coerce_with_default("marker.color", dflt)?;
        c.coerce("marker.symbol")?;
        c.coerce("marker.opacity")?;
        c.coerce("marker.size")?;
        c.coerce("marker.colorscale")?;
        c.coerce("marker.line.color")?;
        c.coerce("marker.line.width")?;
    }

    if has_flag(&mode, "text") {
        c.coerce("textposition")?;
        c.coerce_font("textfont", &ctx.full_layout["font"])?;
    }

    if c.coerce("fill")? != Value::from("none") {
        let base = match (&line_color, &marker_color) {
            (Value::String(s), _) | (_, Value::String(s)) => s.to_string(),
            _ => ctx.default_color.to_string(),
        };
        c.coerce_with_default("fillcolor", with_alpha(&base, 0.5))?;
    }
    Ok(())
}

fn supply_layout_defaults(c: &mut Coercer<'_>, _ctx: &LayoutContext<'_>) -> Result<()> {
    c.coerce("scattermode")?;
    c.coerce("scattergap")?;
    Ok(())
}

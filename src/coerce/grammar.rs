// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Grammars for the domain-specific value types: colors, colorscales,
//! subplot ids and angles.

use crate::schema::split_counter;
use crate::value::Value;

use lazy_static::lazy_static;
use regex::Regex;

/// Validators for the value types whose syntax is owned by the drawing
/// layer rather than the schema engine.
pub trait Grammar {
    fn is_color(&self, value: &Value) -> bool;

    fn is_colorscale_name(&self, name: &str) -> bool;

    /// A named scale, or an array of `[level, color]` pairs with levels
    /// starting at 0, ending at 1 and never decreasing.
    fn is_colorscale(&self, value: &Value) -> bool {
        match value {
            Value::String(name) => self.is_colorscale_name(name),
            Value::Array(levels) => {
                if levels.len() < 2 {
                    return false;
                }
                let mut prev = 0.0;
                for (i, level) in levels.iter().enumerate() {
                    let (Value::Number(at), color) = (&level[0], &level[1]) else {
                        return false;
                    };
                    if level.array_len() != 2 || !self.is_color(color) || *at < prev {
                        return false;
                    }
                    let required = match i {
                        0 => Some(0.0),
                        i if i + 1 == levels.len() => Some(1.0),
                        _ => None,
                    };
                    if required.is_some_and(|r| r != *at) {
                        return false;
                    }
                    prev = *at;
                }
                true
            }
            _ => false,
        }
    }

    /// `dflt` itself, or `dflt` followed by a counter of at least 2.
    fn is_subplot_id(&self, value: &Value, dflt: &Value) -> bool {
        let (Value::String(id), Value::String(dflt)) = (value, dflt) else {
            return false;
        };
        match split_counter(id) {
            Some((base, _)) => base == &**dflt,
            None => false,
        }
    }

    /// Normalizes an angle in degrees into [-180, 180].
    fn angle(&self, degrees: f64) -> f64 {
        if degrees.abs() > 180.0 {
            degrees - (degrees / 360.0).round() * 360.0
        } else {
            degrees
        }
    }
}

/// CSS color syntax and the stock colorscale names.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultGrammar;

lazy_static! {
    static ref HEX_COLOR: Regex =
        Regex::new(r"^#?(?:[0-9a-fA-F]{3,4}|[0-9a-fA-F]{6}|[0-9a-fA-F]{8})$")
            .expect("hex color pattern is valid");
    static ref FUNC_COLOR: Regex = Regex::new(
        r"^(rgb|rgba|hsl|hsla|hsv|hsva)\(\s*([-+]?(?:\d*\.\d+|\d+)%?)\s*[,\s]\s*([-+]?(?:\d*\.\d+|\d+)%?)\s*[,\s]\s*([-+]?(?:\d*\.\d+|\d+)%?)(?:\s*[,\s/]\s*([-+]?(?:\d*\.\d+|\d+)%?))?\s*\)$"
    )
    .expect("functional color pattern is valid");
}

pub const COLORSCALE_NAMES: [&str; 18] = [
    "Greys", "YlGnBu", "Greens", "YlOrRd", "Bluered", "RdBu", "Reds", "Blues", "Picnic", "Rainbow",
    "Portland", "Jet", "Hot", "Blackbody", "Earth", "Electric", "Viridis", "Cividis",
];

const NAMED_COLORS: [&str; 148] = [
    "aliceblue", "antiquewhite", "aqua", "aquamarine", "azure", "beige", "bisque", "black",
    "blanchedalmond", "blue", "blueviolet", "brown", "burlywood", "cadetblue", "chartreuse",
    "chocolate", "coral", "cornflowerblue", "cornsilk", "crimson", "cyan", "darkblue", "darkcyan",
    "darkgoldenrod", "darkgray", "darkgreen", "darkgrey", "darkkhaki", "darkmagenta",
    "darkolivegreen", "darkorange", "darkorchid", "darkred", "darksalmon", "darkseagreen",
    "darkslateblue", "darkslategray", "darkslategrey", "darkturquoise", "darkviolet", "deeppink",
    "deepskyblue", "dimgray", "dimgrey", "dodgerblue", "firebrick", "floralwhite", "forestgreen",
    "fuchsia", "gainsboro", "ghostwhite", "gold", "goldenrod", "gray", "green", "greenyellow",
    "grey", "honeydew", "hotpink", "indianred", "indigo", "ivory", "khaki", "lavender",
    "lavenderblush", "lawngreen", "lemonchiffon", "lightblue", "lightcoral", "lightcyan",
    "lightgoldenrodyellow", "lightgray", "lightgreen", "lightgrey", "lightpink", "lightsalmon",
    "lightseagreen", "lightskyblue", "lightslategray", "lightslategrey", "lightsteelblue",
    "lightyellow", "lime", "limegreen", "linen", "magenta", "maroon", "mediumaquamarine",
    "mediumblue", "mediumorchid", "mediumpurple", "mediumseagreen", "mediumslateblue",
    "mediumspringgreen", "mediumturquoise", "mediumvioletred", "midnightblue", "mintcream",
    "mistyrose", "moccasin", "navajowhite", "navy", "oldlace", "olive", "olivedrab", "orange",
    "orangered", "orchid", "palegoldenrod", "palegreen", "paleturquoise", "palevioletred",
    "papayawhip", "peachpuff", "peru", "pink", "plum", "powderblue", "purple", "rebeccapurple",
    "red", "rosybrown", "royalblue", "saddlebrown", "salmon", "sandybrown", "seagreen", "seashell",
    "sienna", "silver", "skyblue", "slateblue", "slategray", "slategrey", "snow", "springgreen",
    "steelblue", "tan", "teal", "thistle", "tomato", "turquoise", "violet", "wheat", "white",
    "whitesmoke", "yellow", "yellowgreen",
];

impl Grammar for DefaultGrammar {
    fn is_color(&self, value: &Value) -> bool {
        let Value::String(s) = value else {
            return false;
        };
        let s = s.trim().to_ascii_lowercase();
        if s == "transparent" || NAMED_COLORS.contains(&s.as_str()) || HEX_COLOR.is_match(&s) {
            return true;
        }
        match FUNC_COLOR.captures(&s) {
            // The alpha forms take four components, the plain ones three
            // (a fourth is tolerated as alpha).
            Some(caps) => !caps[1].ends_with('a') || caps.get(5).is_some(),
            None => false,
        }
    }

    fn is_colorscale_name(&self, name: &str) -> bool {
        COLORSCALE_NAMES.contains(&name)
    }
}

//! Colour names
//!
//! Two tables: the CSS named colours the validator accepts as-is, and the
//! conversational names the normalizer rewrites into a canonical code.

use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};

/// CSS named colours plus the colour keywords
const CSS_NAMED: &[&str] = &[
    "aliceblue", "antiquewhite", "aqua", "aquamarine", "azure", "beige", "bisque", "black",
    "blanchedalmond", "blue", "blueviolet", "brown", "burlywood", "cadetblue", "chartreuse",
    "chocolate", "coral", "cornflowerblue", "cornsilk", "crimson", "cyan", "darkblue",
    "darkcyan", "darkgoldenrod", "darkgray", "darkgreen", "darkgrey", "darkkhaki",
    "darkmagenta", "darkolivegreen", "darkorange", "darkorchid", "darkred", "darksalmon",
    "darkseagreen", "darkslateblue", "darkslategray", "darkslategrey", "darkturquoise",
    "darkviolet", "deeppink", "deepskyblue", "dimgray", "dimgrey", "dodgerblue", "firebrick",
    "floralwhite", "forestgreen", "fuchsia", "gainsboro", "ghostwhite", "gold", "goldenrod",
    "gray", "green", "greenyellow", "grey", "honeydew", "hotpink", "indianred", "indigo",
    "ivory", "khaki", "lavender", "lavenderblush", "lawngreen", "lemonchiffon", "lightblue",
    "lightcoral", "lightcyan", "lightgoldenrodyellow", "lightgray", "lightgreen", "lightgrey",
    "lightpink", "lightsalmon", "lightseagreen", "lightskyblue", "lightslategray",
    "lightslategrey", "lightsteelblue", "lightyellow", "lime", "limegreen", "linen", "magenta",
    "maroon", "mediumaquamarine", "mediumblue", "mediumorchid", "mediumpurple",
    "mediumseagreen", "mediumslateblue", "mediumspringgreen", "mediumturquoise",
    "mediumvioletred", "midnightblue", "mintcream", "mistyrose", "moccasin", "navajowhite",
    "navy", "oldlace", "olive", "olivedrab", "orange", "orangered", "orchid", "palegoldenrod",
    "palegreen", "paleturquoise", "palevioletred", "papayawhip", "peachpuff", "peru", "pink",
    "plum", "powderblue", "purple", "rebeccapurple", "red", "rosybrown", "royalblue",
    "saddlebrown", "salmon", "sandybrown", "seagreen", "seashell", "sienna", "silver",
    "skyblue", "slateblue", "slategray", "slategrey", "snow", "springgreen", "steelblue", "tan",
    "teal", "thistle", "tomato", "turquoise", "violet", "wheat", "white", "whitesmoke",
    "yellow", "yellowgreen", "transparent", "currentcolor",
];

/// Conversational names and the code they stand for
const FRIENDLY: &[(&str, &str)] = &[
    ("baby blue", "#89cff0"),
    ("blood red", "#8a0303"),
    ("burgundy", "#800020"),
    ("charcoal", "#36454f"),
    ("cream", "#fffdd0"),
    ("dark blue", "darkblue"),
    ("dark gray", "darkgray"),
    ("dark green", "darkgreen"),
    ("dark grey", "darkgray"),
    ("dark red", "darkred"),
    ("forest green", "forestgreen"),
    ("hot pink", "hotpink"),
    ("light blue", "lightblue"),
    ("light gray", "lightgray"),
    ("light green", "lightgreen"),
    ("light grey", "lightgray"),
    ("light pink", "lightpink"),
    ("mint", "#98ff98"),
    ("mustard", "#ffdb58"),
    ("navy blue", "navy"),
    ("neon green", "#39ff14"),
    ("off white", "#faf9f6"),
    ("off-white", "#faf9f6"),
    ("peach", "#ffe5b4"),
    ("rose", "#ff007f"),
    ("royal blue", "royalblue"),
    ("sand", "#c2b280"),
    ("sky blue", "skyblue"),
    ("slate", "slategray"),
];

static NAMED_SET: Lazy<HashSet<&'static str>> = Lazy::new(|| CSS_NAMED.iter().copied().collect());

static FRIENDLY_MAP: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| FRIENDLY.iter().copied().collect());

/// Whether `name` is a CSS named colour (case-insensitive)
#[must_use]
pub fn is_named_color(name: &str) -> bool {
    NAMED_SET.contains(name.trim().to_ascii_lowercase().as_str())
}

/// Canonical code for a colour name, if the value is a name at all
///
/// Conversational names map through the table; CSS names are lower-cased;
/// anything else (hex, functions, typos) yields `None`.
#[must_use]
pub fn canonical_color(value: &str) -> Option<String> {
    let folded = value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_lowercase();
    if let Some(code) = FRIENDLY_MAP.get(folded.as_str()) {
        return Some((*code).to_string());
    }
    NAMED_SET.contains(folded.as_str()).then_some(folded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_colors_are_case_insensitive() {
        assert!(is_named_color("Red"));
        assert!(is_named_color("currentColor"));
        assert!(!is_named_color("reddish"));
    }

    #[test]
    fn friendly_names_map_to_codes() {
        assert_eq!(canonical_color("Navy   Blue").as_deref(), Some("navy"));
        assert_eq!(canonical_color("charcoal").as_deref(), Some("#36454f"));
        assert_eq!(canonical_color("BLUE").as_deref(), Some("blue"));
        assert_eq!(canonical_color("#FFF"), None);
    }
}

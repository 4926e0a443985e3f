//! Value kinds and their acceptance rules

use crate::colors::is_named_color;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// CSS-wide keywords every property accepts as a whole value
const GLOBAL_KEYWORDS: &[&str] = &["inherit", "initial", "unset"];

const BORDER_STYLES: &[&str] = &[
    "none", "hidden", "dotted", "dashed", "solid", "double", "groove", "ridge", "inset", "outset",
];

const TIMING_FUNCTIONS: &[&str] = &[
    "ease",
    "linear",
    "ease-in",
    "ease-out",
    "ease-in-out",
    "step-start",
    "step-end",
];

const TRANSFORM_FUNCTIONS: &[&str] = &[
    "matrix", "matrix3d", "perspective", "rotate", "rotate3d", "rotatex", "rotatey", "rotatez",
    "scale", "scale3d", "scalex", "scaley", "scalez", "skew", "skewx", "skewy", "translate",
    "translate3d", "translatex", "translatey", "translatez",
];

static LENGTH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^-?(?:\d+\.?\d*|\.\d+)(?:px|em|rem|%|vh|vw|vmin|vmax|pt|pc|cm|mm|in|ex|ch)$")
        .expect("static regex")
});

static ZERO: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?0*\.?0+$").expect("static regex"));

static NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?(?:\d+\.?\d*|\.\d+)$").expect("static regex"));

static LENGTH_FUNCTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:calc|clamp|min|max)\(.+\)$").expect("static regex"));

static HEX_COLOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{4}|[0-9a-fA-F]{6}|[0-9a-fA-F]{8})$")
        .expect("static regex")
});

static COLOR_FUNCTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:rgba?|hsla?)\(\s*[-+0-9.%deg]+(?:\s*[,\s/]\s*[-+0-9.%deg]+){2,3}\s*\)$")
        .expect("static regex")
});

static TIME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:\d+\.?\d*|\.\d+)m?s$").expect("static regex"));

static FUNCTION_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z][A-Za-z0-9-]*)\(([^()]*)\)$").expect("static regex"));

static FAMILY_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^(?:"[^"]+"|'[^']+'|[A-Za-z][A-Za-z0-9 -]*)$"#).expect("static regex")
});

static PROPERTY_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?[a-z][a-z-]*$").expect("static regex"));

/// Shapes of multi-token values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompositeKind {
    /// 1-4 space-separated lengths (padding, margin, border-radius)
    BoxEdges,
    /// Width, style and colour in any order (border, outline)
    Border,
    /// Comma-separated shadow layers
    Shadow,
    /// Space-separated transform functions
    Transform,
    /// Comma-separated transition layers
    Transition,
    /// Comma-separated font family names
    FontFamily,
}

/// How a property's value is checked (and, for sizes, normalized)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "rule", rename_all = "kebab-case")]
pub enum ValueKind {
    /// Hex, `rgb()`/`rgba()`/`hsl()`/`hsla()` or a named colour
    Color,
    /// A single length, `auto`, or a `calc`/`clamp`/`min`/`max` wrapper
    Length,
    /// One of a fixed set of keywords
    Enumerated(&'static [&'static str]),
    /// A number within an inclusive range
    Numeric { min: f64, max: f64, integer: bool },
    /// A structured multi-token value
    Composite(CompositeKind),
}

impl ValueKind {
    /// Whether bare integers get a default length unit
    #[inline]
    #[must_use]
    pub fn is_size(&self) -> bool {
        matches!(
            self,
            Self::Length | Self::Composite(CompositeKind::BoxEdges)
        )
    }

    /// Check a normalized value
    ///
    /// # Errors
    /// Returns a short human-readable reason on rejection.
    pub fn check(&self, value: &str) -> Result<(), String> {
        let value = value.trim();
        if value.is_empty() {
            return Err("empty value".to_string());
        }
        if is_global_keyword(value) {
            return Ok(());
        }
        let accepted = match self {
            Self::Color => is_color(value),
            Self::Length => is_length(value),
            Self::Enumerated(options) => options.iter().any(|o| o.eq_ignore_ascii_case(value)),
            Self::Numeric { min, max, integer } => value
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .is_some_and(|n| n >= *min && n <= *max && (!integer || n.fract() == 0.0)),
            Self::Composite(kind) => kind.accepts(value),
        };
        if accepted {
            Ok(())
        } else {
            Err(self.expectation())
        }
    }

    fn expectation(&self) -> String {
        match self {
            Self::Color => "expected a hex, rgb(), hsl() or named colour".to_string(),
            Self::Length => "expected a length, auto or calc()".to_string(),
            Self::Enumerated(options) => format!("expected one of: {}", options.join(", ")),
            Self::Numeric { min, max, integer } => {
                let what = if *integer { "an integer" } else { "a number" };
                format!("expected {what} between {min} and {max}")
            }
            Self::Composite(kind) => match kind {
                CompositeKind::BoxEdges => "expected 1-4 lengths".to_string(),
                CompositeKind::Border => "expected width, style and colour".to_string(),
                CompositeKind::Shadow => "expected offset lengths and optional colour".to_string(),
                CompositeKind::Transform => "expected transform functions".to_string(),
                CompositeKind::Transition => "expected property, duration and timing".to_string(),
                CompositeKind::FontFamily => "expected comma-separated font names".to_string(),
            },
        }
    }
}

impl CompositeKind {
    fn accepts(self, value: &str) -> bool {
        match self {
            Self::BoxEdges => {
                let tokens = split_tokens(value);
                (1..=4).contains(&tokens.len())
                    && tokens
                        .iter()
                        .all(|t| is_length(t) || NUMBER.is_match(t))
            }
            Self::Border => {
                let tokens = split_tokens(value);
                (1..=3).contains(&tokens.len())
                    && tokens.iter().all(|t| {
                        is_length(t)
                            || ["thin", "medium", "thick"].contains(&t.to_ascii_lowercase().as_str())
                            || BORDER_STYLES.contains(&t.to_ascii_lowercase().as_str())
                            || is_color(t)
                    })
            }
            Self::Shadow => {
                value.eq_ignore_ascii_case("none")
                    || split_top_level(value, ',').iter().all(|layer| {
                        let tokens = split_tokens(layer);
                        let lengths = tokens.iter().filter(|t| is_length(t)).count();
                        let colors = tokens.iter().filter(|t| is_color(t)).count();
                        let insets = tokens
                            .iter()
                            .filter(|t| t.eq_ignore_ascii_case("inset"))
                            .count();
                        (2..=4).contains(&lengths)
                            && colors <= 1
                            && insets <= 1
                            && lengths + colors + insets == tokens.len()
                    })
            }
            Self::Transform => {
                value.eq_ignore_ascii_case("none")
                    || split_tokens(value).iter().all(|t| {
                        FUNCTION_TOKEN.captures(t).is_some_and(|c| {
                            TRANSFORM_FUNCTIONS.contains(&c[1].to_ascii_lowercase().as_str())
                                && !c[2].trim().is_empty()
                        })
                    })
            }
            Self::Transition => {
                value.eq_ignore_ascii_case("none")
                    || split_top_level(value, ',').iter().all(|layer| {
                        let tokens = split_tokens(layer);
                        !tokens.is_empty()
                            && tokens.iter().all(|t| {
                                TIME.is_match(t)
                                    || TIMING_FUNCTIONS
                                        .contains(&t.to_ascii_lowercase().as_str())
                                    || FUNCTION_TOKEN.captures(t).is_some_and(|c| {
                                        matches!(
                                            c[1].to_ascii_lowercase().as_str(),
                                            "cubic-bezier" | "steps"
                                        )
                                    })
                                    || PROPERTY_NAME.is_match(t)
                            })
                    })
            }
            Self::FontFamily => split_top_level(value, ',')
                .iter()
                .all(|family| FAMILY_NAME.is_match(family.trim())),
        }
    }
}

/// Whether the whole value is a CSS-wide keyword
#[must_use]
pub fn is_global_keyword(value: &str) -> bool {
    GLOBAL_KEYWORDS
        .iter()
        .any(|k| k.eq_ignore_ascii_case(value.trim()))
}

/// Colour check: hex, colour functions or named colours
#[must_use]
pub fn is_color(value: &str) -> bool {
    let value = value.trim();
    HEX_COLOR.is_match(value) || COLOR_FUNCTION.is_match(value) || is_named_color(value)
}

/// Single length check: `<number><unit>`, zero, `auto` or a math wrapper
#[must_use]
pub fn is_length(value: &str) -> bool {
    let value = value.trim();
    value.eq_ignore_ascii_case("auto")
        || LENGTH.is_match(value)
        || ZERO.is_match(value)
        || LENGTH_FUNCTION.is_match(value)
}

/// Split on whitespace outside parentheses
fn split_tokens(value: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut depth = 0usize;
    let mut start: Option<usize> = None;
    for (i, c) in value.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            c if c.is_whitespace() && depth == 0 => {
                if let Some(s) = start.take() {
                    tokens.push(&value[s..i]);
                }
                continue;
            }
            _ => {}
        }
        start.get_or_insert(i);
    }
    if let Some(s) = start {
        tokens.push(&value[s..]);
    }
    tokens
}

/// Split on `sep` outside parentheses, trimming each part
fn split_top_level(value: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in value.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            c if c == sep && depth == 0 => {
                parts.push(value[start..i].trim());
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(value[start..].trim());
    parts
}

//! The property allow-list

use crate::error::SchemaError;
use crate::kind::{CompositeKind, ValueKind};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde::Serialize;

/// Property family, used for grouping in listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Layout,
    BoxModel,
    Typography,
    Color,
    Border,
    FlexGrid,
    Effects,
    Interaction,
}

/// One allow-listed property
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PropertySpec {
    /// Canonical hyphenated name
    pub name: &'static str,
    /// Property family
    pub category: Category,
    /// Value rule
    pub kind: ValueKind,
}

const fn prop(name: &'static str, category: Category, kind: ValueKind) -> PropertySpec {
    PropertySpec {
        name,
        category,
        kind,
    }
}

const DISPLAY: &[&str] = &[
    "block", "inline", "inline-block", "flex", "inline-flex", "grid", "inline-grid", "none",
    "contents", "table", "list-item",
];
const POSITION: &[&str] = &["static", "relative", "absolute", "fixed", "sticky"];
const OVERFLOW: &[&str] = &["visible", "hidden", "scroll", "auto", "clip"];
const VISIBILITY: &[&str] = &["visible", "hidden", "collapse"];
const FLOAT: &[&str] = &["left", "right", "none", "inline-start", "inline-end"];
const BOX_SIZING: &[&str] = &["content-box", "border-box"];
const FONT_WEIGHT: &[&str] = &[
    "normal", "bold", "bolder", "lighter", "100", "200", "300", "400", "500", "600", "700", "800",
    "900",
];
const FONT_STYLE: &[&str] = &["normal", "italic", "oblique"];
const TEXT_ALIGN: &[&str] = &["left", "right", "center", "justify", "start", "end"];
const TEXT_DECORATION: &[&str] = &["none", "underline", "overline", "line-through"];
const TEXT_TRANSFORM: &[&str] = &["none", "capitalize", "uppercase", "lowercase"];
const WHITE_SPACE: &[&str] = &["normal", "nowrap", "pre", "pre-wrap", "pre-line", "break-spaces"];
const BORDER_STYLE: &[&str] = &[
    "none", "hidden", "dotted", "dashed", "solid", "double", "groove", "ridge", "inset", "outset",
];
const FLEX_DIRECTION: &[&str] = &["row", "row-reverse", "column", "column-reverse"];
const FLEX_WRAP: &[&str] = &["nowrap", "wrap", "wrap-reverse"];
const JUSTIFY_CONTENT: &[&str] = &[
    "flex-start", "flex-end", "center", "space-between", "space-around", "space-evenly", "start",
    "end", "stretch", "normal",
];
const ALIGN: &[&str] = &[
    "flex-start", "flex-end", "center", "baseline", "stretch", "start", "end", "normal",
    "space-between", "space-around",
];
const ALIGN_SELF: &[&str] = &[
    "auto", "flex-start", "flex-end", "center", "baseline", "stretch", "start", "end",
];
const CURSOR: &[&str] = &[
    "auto", "default", "pointer", "text", "move", "not-allowed", "wait", "help", "crosshair",
    "grab", "grabbing", "none",
];
const POINTER_EVENTS: &[&str] = &["auto", "none"];
const USER_SELECT: &[&str] = &["auto", "none", "text", "all"];

const ANY_INT: ValueKind = ValueKind::Numeric {
    min: -1_000_000.0,
    max: 1_000_000.0,
    integer: true,
};
const NON_NEGATIVE: ValueKind = ValueKind::Numeric {
    min: 0.0,
    max: 1_000.0,
    integer: false,
};

const PROPERTIES: &[PropertySpec] = &[
    // layout
    prop("display", Category::Layout, ValueKind::Enumerated(DISPLAY)),
    prop("position", Category::Layout, ValueKind::Enumerated(POSITION)),
    prop("top", Category::Layout, ValueKind::Length),
    prop("right", Category::Layout, ValueKind::Length),
    prop("bottom", Category::Layout, ValueKind::Length),
    prop("left", Category::Layout, ValueKind::Length),
    prop("z-index", Category::Layout, ANY_INT),
    prop("overflow", Category::Layout, ValueKind::Enumerated(OVERFLOW)),
    prop("visibility", Category::Layout, ValueKind::Enumerated(VISIBILITY)),
    prop("float", Category::Layout, ValueKind::Enumerated(FLOAT)),
    // box model
    prop("width", Category::BoxModel, ValueKind::Length),
    prop("height", Category::BoxModel, ValueKind::Length),
    prop("min-width", Category::BoxModel, ValueKind::Length),
    prop("max-width", Category::BoxModel, ValueKind::Length),
    prop("min-height", Category::BoxModel, ValueKind::Length),
    prop("max-height", Category::BoxModel, ValueKind::Length),
    prop("margin", Category::BoxModel, ValueKind::Composite(CompositeKind::BoxEdges)),
    prop("margin-top", Category::BoxModel, ValueKind::Length),
    prop("margin-right", Category::BoxModel, ValueKind::Length),
    prop("margin-bottom", Category::BoxModel, ValueKind::Length),
    prop("margin-left", Category::BoxModel, ValueKind::Length),
    prop("padding", Category::BoxModel, ValueKind::Composite(CompositeKind::BoxEdges)),
    prop("padding-top", Category::BoxModel, ValueKind::Length),
    prop("padding-right", Category::BoxModel, ValueKind::Length),
    prop("padding-bottom", Category::BoxModel, ValueKind::Length),
    prop("padding-left", Category::BoxModel, ValueKind::Length),
    prop("box-sizing", Category::BoxModel, ValueKind::Enumerated(BOX_SIZING)),
    // typography
    prop("color", Category::Typography, ValueKind::Color),
    prop("font-size", Category::Typography, ValueKind::Length),
    prop("font-weight", Category::Typography, ValueKind::Enumerated(FONT_WEIGHT)),
    prop("font-family", Category::Typography, ValueKind::Composite(CompositeKind::FontFamily)),
    prop("font-style", Category::Typography, ValueKind::Enumerated(FONT_STYLE)),
    prop("line-height", Category::Typography, ValueKind::Numeric { min: 0.0, max: 10.0, integer: false }),
    prop("letter-spacing", Category::Typography, ValueKind::Length),
    prop("word-spacing", Category::Typography, ValueKind::Length),
    prop("text-align", Category::Typography, ValueKind::Enumerated(TEXT_ALIGN)),
    prop("text-decoration", Category::Typography, ValueKind::Enumerated(TEXT_DECORATION)),
    prop("text-transform", Category::Typography, ValueKind::Enumerated(TEXT_TRANSFORM)),
    prop("white-space", Category::Typography, ValueKind::Enumerated(WHITE_SPACE)),
    // colour and background
    prop("background-color", Category::Color, ValueKind::Color),
    prop("background", Category::Color, ValueKind::Color),
    prop("opacity", Category::Color, ValueKind::Numeric { min: 0.0, max: 1.0, integer: false }),
    // border
    prop("border", Category::Border, ValueKind::Composite(CompositeKind::Border)),
    prop("border-width", Category::Border, ValueKind::Length),
    prop("border-style", Category::Border, ValueKind::Enumerated(BORDER_STYLE)),
    prop("border-color", Category::Border, ValueKind::Color),
    prop("border-radius", Category::Border, ValueKind::Composite(CompositeKind::BoxEdges)),
    prop("outline", Category::Border, ValueKind::Composite(CompositeKind::Border)),
    // flex and grid
    prop("flex-direction", Category::FlexGrid, ValueKind::Enumerated(FLEX_DIRECTION)),
    prop("flex-wrap", Category::FlexGrid, ValueKind::Enumerated(FLEX_WRAP)),
    prop("justify-content", Category::FlexGrid, ValueKind::Enumerated(JUSTIFY_CONTENT)),
    prop("align-items", Category::FlexGrid, ValueKind::Enumerated(ALIGN)),
    prop("align-content", Category::FlexGrid, ValueKind::Enumerated(ALIGN)),
    prop("align-self", Category::FlexGrid, ValueKind::Enumerated(ALIGN_SELF)),
    prop("flex-grow", Category::FlexGrid, NON_NEGATIVE),
    prop("flex-shrink", Category::FlexGrid, NON_NEGATIVE),
    prop("flex-basis", Category::FlexGrid, ValueKind::Length),
    prop("order", Category::FlexGrid, ANY_INT),
    prop("gap", Category::FlexGrid, ValueKind::Length),
    prop("row-gap", Category::FlexGrid, ValueKind::Length),
    prop("column-gap", Category::FlexGrid, ValueKind::Length),
    // transform, transition and effects
    prop("transform", Category::Effects, ValueKind::Composite(CompositeKind::Transform)),
    prop("transition", Category::Effects, ValueKind::Composite(CompositeKind::Transition)),
    prop("box-shadow", Category::Effects, ValueKind::Composite(CompositeKind::Shadow)),
    // interaction
    prop("cursor", Category::Interaction, ValueKind::Enumerated(CURSOR)),
    prop("pointer-events", Category::Interaction, ValueKind::Enumerated(POINTER_EVENTS)),
    prop("user-select", Category::Interaction, ValueKind::Enumerated(USER_SELECT)),
];

/// The process-wide schema instance
pub static SCHEMA: Lazy<MutationSchema> = Lazy::new(|| MutationSchema::new(PROPERTIES));

/// Allow-list with lookups by hyphenated, camel-case and compact spelling
#[derive(Debug, Clone)]
pub struct MutationSchema {
    by_name: IndexMap<&'static str, PropertySpec>,
    by_compact: IndexMap<String, &'static str>,
}

impl MutationSchema {
    fn new(entries: &'static [PropertySpec]) -> Self {
        let by_name = entries.iter().map(|p| (p.name, *p)).collect();
        let by_compact = entries
            .iter()
            .map(|p| (compact_name(p.name), p.name))
            .collect();
        Self {
            by_name,
            by_compact,
        }
    }

    /// Look a property up under any accepted spelling
    ///
    /// Tries the name as given (lower-cased), then its hyphenated form
    /// (`marginTop` -> `margin-top`), then the compact form with all
    /// separators removed (`margintop`).
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&PropertySpec> {
        let trimmed = name.trim();
        let lowered = trimmed.to_ascii_lowercase();
        if let Some(spec) = self.by_name.get(lowered.as_str()) {
            return Some(spec);
        }
        let hyphenated = kebab_case(trimmed);
        if let Some(spec) = self.by_name.get(hyphenated.as_str()) {
            return Some(spec);
        }
        self.by_compact
            .get(&compact_name(trimmed))
            .and_then(|canonical| self.by_name.get(canonical))
    }

    /// Look a property up, failing for names off the list
    ///
    /// # Errors
    /// Returns [`SchemaError::UnknownProperty`] with the name as given.
    pub fn require(&self, name: &str) -> Result<&PropertySpec, SchemaError> {
        self.lookup(name)
            .ok_or_else(|| SchemaError::UnknownProperty(name.to_string()))
    }

    /// Whether the name is recognized under any spelling
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// All entries in table order
    pub fn iter(&self) -> impl Iterator<Item = &PropertySpec> {
        self.by_name.values()
    }

    /// Number of allow-listed properties
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// Whether the schema is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

/// `marginTop` / `margin_top` -> `margin-top`
#[must_use]
pub fn kebab_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in name.trim().chars().enumerate() {
        if c.is_ascii_uppercase() {
            if i > 0 && !out.ends_with('-') {
                out.push('-');
            }
            out.push(c.to_ascii_lowercase());
        } else if c == '_' {
            out.push('-');
        } else {
            out.push(c);
        }
    }
    out
}

/// Lower-case name with `-` and `_` removed
#[must_use]
pub fn compact_name(name: &str) -> String {
    name.trim()
        .chars()
        .filter(|c| *c != '-' && *c != '_')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_has_expected_breadth() {
        assert!(SCHEMA.len() >= 60);
        for category in [
            Category::Layout,
            Category::BoxModel,
            Category::Typography,
            Category::Color,
            Category::Border,
            Category::FlexGrid,
            Category::Effects,
            Category::Interaction,
        ] {
            assert!(SCHEMA.iter().any(|p| p.category == category), "{category:?}");
        }
    }

    #[test]
    fn lookup_accepts_all_spellings() {
        assert_eq!(SCHEMA.lookup("margin-top").map(|p| p.name), Some("margin-top"));
        assert_eq!(SCHEMA.lookup("marginTop").map(|p| p.name), Some("margin-top"));
        assert_eq!(SCHEMA.lookup("margin_top").map(|p| p.name), Some("margin-top"));
        assert_eq!(SCHEMA.lookup("MarginTop").map(|p| p.name), Some("margin-top"));
        assert_eq!(SCHEMA.lookup("margintop").map(|p| p.name), Some("margin-top"));
        assert_eq!(SCHEMA.lookup("backgroundColor").map(|p| p.name), Some("background-color"));
        assert!(SCHEMA.lookup("bogusProp").is_none());
    }

    #[test]
    fn require_reports_original_spelling() {
        assert_eq!(
            SCHEMA.require("bogusProp").unwrap_err().to_string(),
            "Invalid CSS property: bogusProp"
        );
    }

    #[test]
    fn case_conversions() {
        assert_eq!(kebab_case("zIndex"), "z-index");
        assert_eq!(kebab_case("border-radius"), "border-radius");
        assert_eq!(compact_name("Border-Radius"), "borderradius");
    }
}

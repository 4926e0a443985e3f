//! Own-style text parsing and serialization
//!
//! Serialization is canonical (`name: value;` joined by a single space) and
//! `parse_style_text(serialize_declarations(d)) == d` for every map this
//! module produces, so a captured style string can be restored verbatim.

use indexmap::IndexMap;

/// Parse a `style` attribute into ordered declarations
///
/// Names are lower-cased, values trimmed. Declarations with an empty name or
/// value are dropped; a later duplicate replaces the earlier value in place.
#[must_use]
pub fn parse_style_text(text: &str) -> IndexMap<String, String> {
    let mut declarations = IndexMap::new();
    for chunk in split_top_level(text, ';') {
        let Some((name, value)) = chunk.split_once(':') else {
            continue;
        };
        let name = name.trim().to_ascii_lowercase();
        let value = value.trim();
        if name.is_empty() || value.is_empty() {
            continue;
        }
        declarations.insert(name, value.to_string());
    }
    declarations
}

/// Serialize declarations into canonical style text
#[must_use]
pub fn serialize_declarations(declarations: &IndexMap<String, String>) -> String {
    declarations
        .iter()
        .map(|(name, value)| format!("{name}: {value};"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whether a value can live inside a declaration without breaking the text
pub(crate) fn is_storable_value(value: &str) -> bool {
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    for c in value.chars() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            (None, ';' | '{' | '}') => return false,
            _ => {}
        }
    }
    depth == 0 && quote.is_none()
}

/// Split on `sep` outside parentheses and quotes
fn split_top_level(text: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => depth = depth.saturating_sub(1),
            (None, c) if c == sep && depth == 0 => {
                parts.push(&text[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parse_basic_declarations() {
        let decls = parse_style_text("color:red;  Width : 100px ;;");
        assert_eq!(decls.len(), 2);
        assert_eq!(decls["color"], "red");
        assert_eq!(decls["width"], "100px");
    }

    #[test]
    fn parse_keeps_semicolons_inside_functions() {
        let decls = parse_style_text("background: url(\"a;b.png\"); color: blue");
        assert_eq!(decls["background"], "url(\"a;b.png\")");
        assert_eq!(decls["color"], "blue");
    }

    #[test]
    fn serialize_is_canonical() {
        let decls = parse_style_text("color:red;width:1px");
        assert_eq!(serialize_declarations(&decls), "color: red; width: 1px;");
    }

    #[test]
    fn storable_values() {
        assert!(is_storable_value("rgb(1, 2, 3)"));
        assert!(!is_storable_value("red; display: none"));
        assert!(!is_storable_value("calc(1px"));
    }

    proptest! {
        #[test]
        fn prop_serialization_is_a_fixed_point(
            entries in proptest::collection::vec(("[a-z][a-z-]{0,12}", "[a-z0-9#%(). ,]{1,16}"), 0..8)
        ) {
            let text: String = entries
                .iter()
                .map(|(n, v)| format!("{n}:{v};"))
                .collect();
            let once = serialize_declarations(&parse_style_text(&text));
            let twice = serialize_declarations(&parse_style_text(&once));
            prop_assert_eq!(once, twice);
        }
    }
}

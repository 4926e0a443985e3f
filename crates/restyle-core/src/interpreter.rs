//! Boundary to the natural-language interpreter
//!
//! The interpreter turns a command plus a description of the targets into a
//! JSON mutation request. Responses are untrusted text: they may arrive in
//! a fenced code block, with prose around them, or not as JSON at all.

use crate::error::RestyleError;
use crate::resolver::SelectorPath;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use restyle_dom::{LiveTree, NodeHandle};
use restyle_schema::colors::canonical_color;
use restyle_schema::kind::is_color;
use restyle_schema::{RawStyles, Styles};
use serde::{Deserialize, Serialize};

/// What the interpreter is told about one target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetDescription {
    pub selector: SelectorPath,
    pub tag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub classes: Vec<String>,
    /// Current own style text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
}

impl TargetDescription {
    /// Describe a live element
    pub fn describe<T: LiveTree + ?Sized>(tree: &T, node: NodeHandle, selector: SelectorPath) -> Self {
        Self {
            selector,
            tag: tree.tag_name(node).unwrap_or("*").to_string(),
            id: tree.element_id(node).map(str::to_string),
            classes: tree.class_list(node).to_vec(),
            style: tree.style_text(node).ok().flatten(),
        }
    }
}

/// Input to one interpreter call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterpretRequest {
    pub command: String,
    pub targets: Vec<TargetDescription>,
}

/// Natural-language interpreter
#[async_trait]
pub trait Interpreter: Send + Sync {
    /// Raw response text for `request`
    async fn interpret(&self, request: &InterpretRequest) -> Result<String, RestyleError>;
}

/// Interpreter that replays one fixed response
#[derive(Debug, Clone)]
pub struct StaticInterpreter {
    response: String,
}

impl StaticInterpreter {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
        }
    }
}

#[async_trait]
impl Interpreter for StaticInterpreter {
    async fn interpret(&self, request: &InterpretRequest) -> Result<String, RestyleError> {
        tracing::debug!(command = %request.command, targets = request.targets.len(), "static interpreter");
        Ok(self.response.clone())
    }
}

/// Structured mutation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationRequest {
    #[serde(default = "default_action")]
    pub action: String,
    #[serde(default)]
    pub styles: RawStyles,
    #[serde(default)]
    pub explanation: String,
}

fn default_action() -> String {
    "modify".to_string()
}

impl MutationRequest {
    /// `modify` request carrying string styles
    #[must_use]
    pub fn from_styles(styles: &Styles, explanation: impl Into<String>) -> Self {
        Self {
            action: default_action(),
            styles: styles
                .iter()
                .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
                .collect(),
            explanation: explanation.into(),
        }
    }
}

static FENCED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```[A-Za-z]*\s*(.*?)```").expect("static regex"));

/// Parse an interpreter response into a [`MutationRequest`]
///
/// Falls back to keyword extraction when the text is not JSON.
///
/// # Errors
/// Returns [`RestyleError::Serialization`] only when neither JSON parsing
/// nor keyword extraction yields anything.
pub fn parse_mutation_request(text: &str) -> Result<MutationRequest, RestyleError> {
    let body = strip_fences(text);
    let parsed = serde_json::from_str::<MutationRequest>(body).or_else(|err| {
        match (body.find('{'), body.rfind('}')) {
            (Some(start), Some(end)) if start < end => {
                serde_json::from_str::<MutationRequest>(&body[start..=end]).map_err(|_| err)
            }
            _ => Err(err),
        }
    });
    match parsed {
        Ok(request) => Ok(request),
        Err(err) => {
            let styles = extract_styles_from_text(text);
            if styles.is_empty() {
                Err(RestyleError::Serialization(format!(
                    "could not parse interpreter response: {err}"
                )))
            } else {
                tracing::debug!(count = styles.len(), "recovered styles from unstructured response");
                Ok(MutationRequest::from_styles(
                    &styles,
                    "Recovered from an unstructured response",
                ))
            }
        }
    }
}

/// Content of the first fenced block, or the trimmed text
#[must_use]
pub fn strip_fences(text: &str) -> &str {
    FENCED
        .captures(text)
        .and_then(|c| c.get(1))
        .map_or(text, |m| m.as_str())
        .trim()
}

const VALUE: &str = r#"["']?\s*(?:[:=]|\bto\b|\bof\b|\bis\b)?\s*["']?(#[0-9a-fA-F]{3,8}\b|rgba?\([^)]*\)|hsla?\([^)]*\)|[a-zA-Z]+(?:\s[a-zA-Z]+)?)"#;
const SIZE: &str = r#"["']?\s*(?:[:=]|\bto\b|\bof\b|\bis\b)?\s*["']?(\d+(?:\.\d+)?(?:px|em|rem|%|pt|vh|vw)?)"#;

static BACKGROUND: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i)\bbackground(?:[-\s]?colou?r)?{VALUE}")).expect("static regex")
});
static COLOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i)\b(?:text[-\s]?)?colou?r{VALUE}")).expect("static regex")
});
static FONT_SIZE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i)\b(?:font[-\s]?size|text\s+size){SIZE}")).expect("static regex")
});
static PADDING: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"(?i)\bpadding{SIZE}")).expect("static regex"));
static BORDER_RADIUS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i)\b(?:border[-\s]?radius|corner\s+radius|rounded\s+corners?){SIZE}"))
        .expect("static regex")
});

/// Keyword extraction over free text
///
/// Recognizes colour, background, font size, padding and border radius,
/// e.g. `"background: navy, font size 18px"`. Colour words that are not
/// colours are dropped.
#[must_use]
pub fn extract_styles_from_text(text: &str) -> Styles {
    let mut styles = Styles::new();
    let mut remaining = text.to_string();

    if let Some((value, span)) = capture(&BACKGROUND, &remaining).and_then(|(v, s)| color_value(&v).map(|c| (c, s))) {
        styles.insert("background-color".to_string(), value);
        remaining.replace_range(span, " ");
    }
    if let Some(value) = capture(&COLOR, &remaining).and_then(|(v, _)| color_value(&v)) {
        styles.insert("color".to_string(), value);
    }
    for (regex, property) in [
        (&*FONT_SIZE, "font-size"),
        (&*PADDING, "padding"),
        (&*BORDER_RADIUS, "border-radius"),
    ] {
        if let Some((value, _)) = capture(regex, text) {
            styles.insert(property.to_string(), value);
        }
    }
    styles
}

fn capture(regex: &Regex, text: &str) -> Option<(String, std::ops::Range<usize>)> {
    let caps = regex.captures(text)?;
    let whole = caps.get(0)?;
    Some((caps.get(1)?.as_str().trim().to_string(), whole.range()))
}

/// Accept a captured colour phrase, trying two words then one
fn color_value(phrase: &str) -> Option<String> {
    let known = |p: &str| is_color(p) || canonical_color(p).is_some();
    if known(phrase) {
        return Some(phrase.to_string());
    }
    let first = phrase.split_whitespace().next()?;
    known(first).then(|| first.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn parses_plain_json_with_defaults() {
        let request = parse_mutation_request(r#"{"styles": {"color": "blue"}}"#).unwrap();
        assert_eq!(request.action, "modify");
        assert_eq!(request.explanation, "");
        assert_eq!(request.styles["color"], json!("blue"));

        let request = parse_mutation_request("{}").unwrap();
        assert!(request.styles.is_empty());
    }

    #[test]
    fn strips_code_fences_and_prose() {
        let fenced = "Here you go:\n```json\n{\"action\": \"modify\", \"styles\": {\"width\": 100}}\n```\nEnjoy!";
        let request = parse_mutation_request(fenced).unwrap();
        assert_eq!(request.styles["width"], json!(100));

        let prose = "Sure! {\"styles\": {\"opacity\": 0.5}, \"explanation\": \"fade\"} Done.";
        let request = parse_mutation_request(prose).unwrap();
        assert_eq!(request.explanation, "fade");
    }

    #[test]
    fn falls_back_to_keywords() {
        let request =
            parse_mutation_request("Set the background to navy and font size 18px with padding: 8px")
                .unwrap();
        assert_eq!(request.styles["background-color"], json!("navy"));
        assert_eq!(request.styles["font-size"], json!("18px"));
        assert_eq!(request.styles["padding"], json!("8px"));
        assert!(!request.styles.contains_key("color"));
    }

    #[test]
    fn unparseable_without_keywords_is_a_serialization_error() {
        let err = parse_mutation_request("I am not sure what you mean.").unwrap_err();
        assert!(matches!(err, RestyleError::Serialization(_)));
    }

    #[test]
    fn keyword_extraction() {
        let styles = extract_styles_from_text("make the text color light blue, rounded corners 12px");
        assert_eq!(styles["color"], "light blue");
        assert_eq!(styles["border-radius"], "12px");

        let styles = extract_styles_from_text("color: #FF0000 please");
        assert_eq!(styles["color"], "#FF0000");

        let styles = extract_styles_from_text("change the colour to banana");
        assert!(styles.is_empty());
    }

    #[tokio::test]
    async fn static_interpreter_replays() {
        let interpreter = StaticInterpreter::new("{\"styles\":{}}");
        let request = InterpretRequest {
            command: "x".into(),
            targets: Vec::new(),
        };
        assert_eq!(interpreter.interpret(&request).await.unwrap(), "{\"styles\":{}}");
    }
}

//! Recovery dispatch
//!
//! [`ErrorHandler::handle`] classifies an error, logs it, and runs the
//! recovery strategy for its class, bounded per (class, operation):
//!
//! | class | strategy |
//! |---|---|
//! | target not found | alternate selectors: id only, first class, last class, bare tag |
//! | invalid selector | collapse doubled punctuation and dangling combinators |
//! | validation | re-derive styles from the command text |
//! | network, generative, timeout | wait out a growing delay, then allow a retry |
//! | serialization | clean up the payload and parse it again |
//! | permission | never recovered |

use crate::alerts::{ErrorLog, ErrorRecord, PatternAlert};
use crate::classifier::ErrorClassifier;
use crate::config::{AlertSettings, RecoverySettings};
use crate::error::{ErrorType, RestyleError};
use crate::interpreter::{extract_styles_from_text, parse_mutation_request, MutationRequest};
use indexmap::IndexSet;
use once_cell::sync::Lazy;
use regex::Regex;
use restyle_dom::{LiveTree, NodeHandle};
use restyle_schema::{StyleNormalizer, StyleValidator, Styles};
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;

/// Where the error happened
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ErrorContext {
    /// Operation name, e.g. `interpret`, `apply`
    pub operation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
    /// User's command text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    /// Raw payload that failed to decode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
}

impl ErrorContext {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            ..Self::default()
        }
    }

    /// With selector
    #[inline]
    #[must_use]
    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = Some(selector.into());
        self
    }

    /// With command text
    #[inline]
    #[must_use]
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    /// With undecodable payload
    #[inline]
    #[must_use]
    pub fn with_payload(mut self, payload: impl Into<String>) -> Self {
        self.payload = Some(payload.into());
        self
    }
}

/// What a successful recovery produced
#[derive(Debug, Clone, PartialEq)]
pub enum Recovery {
    /// A selector that resolves again
    Selector {
        selector: String,
        matches: Vec<NodeHandle>,
    },
    /// Styles re-derived from the command text (already validated)
    Styles(Styles),
    /// A decodable request recovered from a malformed payload
    Request(MutationRequest),
    /// The wait that was observed before a retry is worthwhile
    RetryAfter(Duration),
}

/// Outcome of handling one error
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorResolution {
    /// Whether a recovery strategy succeeded
    pub success: bool,
    pub user_message: String,
    pub technical_message: String,
    pub error_type: ErrorType,
    /// Whether trying the whole operation again may help
    pub can_retry: bool,
    pub suggestions: Vec<String>,
    pub recovery: Option<Recovery>,
    /// Pattern alerts this error raised
    pub alerts: Vec<PatternAlert>,
}

/// Classifies errors and dispatches bounded recovery
#[derive(Debug)]
pub struct ErrorHandler {
    classifier: ErrorClassifier,
    settings: RecoverySettings,
    attempts: HashMap<(ErrorType, String), u32>,
    log: ErrorLog,
}

impl Default for ErrorHandler {
    fn default() -> Self {
        Self::new(RecoverySettings::default(), AlertSettings::default())
    }
}

impl ErrorHandler {
    #[must_use]
    pub fn new(settings: RecoverySettings, alerts: AlertSettings) -> Self {
        Self {
            classifier: ErrorClassifier::with_default_rules(),
            settings,
            attempts: HashMap::new(),
            log: ErrorLog::new(alerts),
        }
    }

    /// With a custom classifier
    #[must_use]
    pub fn with_classifier(mut self, classifier: ErrorClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// The classifier, for adding rules
    pub fn classifier_mut(&mut self) -> &mut ErrorClassifier {
        &mut self.classifier
    }

    /// Error log and raised alerts
    #[must_use]
    pub fn log(&self) -> &ErrorLog {
        &self.log
    }

    /// Recovery attempts made so far for (class, operation)
    #[must_use]
    pub fn attempts(&self, error_type: ErrorType, operation: &str) -> u32 {
        self.attempts
            .get(&(error_type, operation.to_string()))
            .copied()
            .unwrap_or(0)
    }

    /// Reset every recovery budget of `operation` after it succeeded
    pub fn succeeded(&mut self, operation: &str) {
        self.attempts.retain(|(_, op), _| op != operation);
    }

    /// Classify, log and try to recover from `error`
    pub async fn handle<T: LiveTree + ?Sized>(
        &mut self,
        error: &RestyleError,
        context: &ErrorContext,
        tree: &T,
    ) -> ErrorResolution {
        let classification = self.classifier.classify(error);
        let error_type = classification.error_type;
        let technical_message = error.to_string();
        let alerts = self.log.record(ErrorRecord::new(
            error_type,
            technical_message.clone(),
            context.operation.clone(),
        ));

        let key = (error_type, context.operation.clone());
        let used = self.attempts.get(&key).copied().unwrap_or(0);
        let mut recovery = None;
        if !error_type.is_non_recoverable() && used < self.settings.max_attempts {
            let attempt = used + 1;
            self.attempts.insert(key.clone(), attempt);
            recovery = self.recover(error_type, error, context, tree, attempt).await;
            // a wait only defers the retry; the budget is refunded by `succeeded`
            if recovery.as_ref().is_some_and(|r| !matches!(r, Recovery::RetryAfter(_))) {
                self.attempts.remove(&key);
            }
        }

        let success = recovery.is_some();
        let remaining = self.settings.max_attempts.saturating_sub(self.attempts.get(&key).copied().unwrap_or(0));
        let can_retry = !error_type.is_non_recoverable()
            && (success || (error_type.is_transient() && remaining > 0));

        let user_message = match &recovery {
            Some(Recovery::Selector { selector, .. }) => {
                format!("Found the element again using `{selector}`.")
            }
            Some(Recovery::Styles(styles)) => format!(
                "Interpreted your request as {}.",
                styles
                    .iter()
                    .map(|(k, v)| format!("{k}: {v}"))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            Some(Recovery::Request(_)) => "Recovered the style assistant's reply.".to_string(),
            Some(Recovery::RetryAfter(_)) | None => classification.user_message,
        };

        if success {
            tracing::info!(%error_type, operation = %context.operation, "recovered from error");
        } else {
            tracing::warn!(
                %error_type,
                operation = %context.operation,
                error = %technical_message,
                "error not recovered"
            );
        }

        ErrorResolution {
            success,
            user_message,
            technical_message,
            error_type,
            can_retry,
            suggestions: suggestions(error_type, context),
            recovery,
            alerts,
        }
    }

    async fn recover<T: LiveTree + ?Sized>(
        &self,
        error_type: ErrorType,
        error: &RestyleError,
        context: &ErrorContext,
        tree: &T,
        attempt: u32,
    ) -> Option<Recovery> {
        match error_type {
            ErrorType::TargetNotFound => {
                let selector = failing_selector(error, context)?;
                selector_variants(&selector).into_iter().find_map(|variant| {
                    match tree.query_all(&variant) {
                        Ok(matches) if matches.len() == 1 => Some(Recovery::Selector {
                            selector: variant,
                            matches,
                        }),
                        _ => None,
                    }
                })
            }
            ErrorType::InvalidSelector => {
                let selector = failing_selector(error, context)?;
                let repaired = collapse_selector(&selector);
                if repaired.is_empty() || repaired == selector {
                    return None;
                }
                match tree.query_all(&repaired) {
                    Ok(matches) if !matches.is_empty() => Some(Recovery::Selector {
                        selector: repaired,
                        matches,
                    }),
                    _ => None,
                }
            }
            ErrorType::ValidationError => {
                let command = context.command.as_deref()?;
                let derived = derive_styles_from_text(command);
                let report = StyleValidator.validate(&StyleNormalizer.normalize_strings(&derived));
                (!report.valid.is_empty()).then_some(Recovery::Styles(report.valid))
            }
            ErrorType::NetworkError | ErrorType::GenerativeServiceError | ErrorType::TimeoutError => {
                let delay = self.settings.delay_for(attempt);
                tracing::debug!(%error_type, attempt, delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX), "waiting before retry");
                tokio::time::sleep(delay).await;
                Some(Recovery::RetryAfter(delay))
            }
            ErrorType::SerializationError => {
                let payload = context.payload.as_deref()?;
                let cleaned = clean_payload(payload);
                parse_mutation_request(&cleaned)
                    .ok()
                    .filter(|request| !request.styles.is_empty())
                    .map(Recovery::Request)
            }
            ErrorType::PermissionError | ErrorType::ExecutionError | ErrorType::Unknown => None,
        }
    }
}

fn failing_selector(error: &RestyleError, context: &ErrorContext) -> Option<String> {
    match error {
        RestyleError::TargetNotFound { selector } | RestyleError::InvalidSelector { selector, .. }
            if !selector.is_empty() =>
        {
            Some(selector.clone())
        }
        _ => context.selector.clone(),
    }
}

static ID_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#(-?[A-Za-z_][\w-]*)").expect("static regex"));
static CLASS_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.(-?[A-Za-z_][\w-]*)").expect("static regex"));
static TAG_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z][\w-]*)").expect("static regex"));

/// Simpler selectors for the last compound of `selector`, most specific first
#[must_use]
pub fn selector_variants(selector: &str) -> Vec<String> {
    let last = selector
        .rsplit(|c: char| c.is_whitespace() || c == '>')
        .find(|part| !part.trim().is_empty())
        .unwrap_or(selector)
        .trim();

    let mut variants = IndexSet::new();
    if let Some(id) = ID_TOKEN.captures(last).and_then(|c| c.get(1)) {
        variants.insert(format!("#{}", id.as_str()));
    }
    let classes: Vec<&str> = CLASS_TOKEN
        .captures_iter(last)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect();
    if let Some(first) = classes.first() {
        variants.insert(format!(".{first}"));
    }
    if let Some(last_class) = classes.last() {
        variants.insert(format!(".{last_class}"));
    }
    if let Some(tag) = TAG_TOKEN.captures(last).and_then(|c| c.get(1)) {
        variants.insert(tag.as_str().to_ascii_lowercase());
    }
    variants.shift_remove(selector.trim());
    variants.into_iter().collect()
}

static DOUBLED_DOT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.{2,}").expect("static regex"));
static DOUBLED_HASH: Lazy<Regex> = Lazy::new(|| Regex::new(r"#{2,}").expect("static regex"));
static DOUBLED_CHILD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r">(?:\s*>)+").expect("static regex"));
static SPACES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static regex"));
static DANGLING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\s>+~,]+|[\s>+~,]+$").expect("static regex"));

/// Collapse doubled punctuation and strip dangling combinators
#[must_use]
pub fn collapse_selector(selector: &str) -> String {
    let s = DOUBLED_DOT.replace_all(selector, ".");
    let s = DOUBLED_HASH.replace_all(&s, "#");
    let s = DOUBLED_CHILD.replace_all(&s, ">");
    let s = SPACES.replace_all(&s, " ");
    DANGLING.replace_all(&s, "").trim().to_string()
}

static KEYWORDS: Lazy<Vec<(Regex, &'static str, &'static str)>> = Lazy::new(|| {
    [
        (r"\bbold\b", "font-weight", "bold"),
        (r"\bitalic\b", "font-style", "italic"),
        (r"\bunderline[ds]?\b", "text-decoration", "underline"),
        (r"\bcent(?:er|re)(?:ed)?\b", "text-align", "center"),
        (r"\b(?:hide|hidden|invisible)\b", "display", "none"),
        (r"\buppercase\b|\ball caps\b", "text-transform", "uppercase"),
        (r"\brounded\b", "border-radius", "8px"),
        (r"\b(?:bigger|larger)\b", "font-size", "1.25em"),
        (r"\bsmaller\b", "font-size", "0.875em"),
        (r"\bshadow\b", "box-shadow", "0 2px 8px rgba(0, 0, 0, 0.15)"),
    ]
    .into_iter()
    .map(|(pattern, property, value)| {
        (
            Regex::new(&format!("(?i){pattern}")).expect("static regex"),
            property,
            value,
        )
    })
    .collect()
});

static MAKE_IT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:make|turn|paint)\s+(?:it|this|them|that|the\s+\w+)\s+([a-z]+(?:\s[a-z]+)?)")
        .expect("static regex")
});

/// Styles implied by free text: explicit keyword extraction, bare colour
/// phrases (`make it navy blue`) and a small word table (`bold`, `centered`)
#[must_use]
pub fn derive_styles_from_text(text: &str) -> Styles {
    let mut styles = extract_styles_from_text(text);
    if !styles.contains_key("color") {
        if let Some(phrase) = MAKE_IT.captures(text).and_then(|c| c.get(1)) {
            let phrase = phrase.as_str();
            let first = phrase.split_whitespace().next().unwrap_or(phrase);
            for candidate in [phrase, first] {
                if restyle_schema::colors::canonical_color(candidate).is_some()
                    || restyle_schema::kind::is_color(candidate)
                {
                    styles.insert("color".to_string(), candidate.to_string());
                    break;
                }
            }
        }
    }
    for (regex, property, value) in KEYWORDS.iter() {
        if regex.is_match(text) && !styles.contains_key(*property) {
            styles.insert((*property).to_string(), (*value).to_string());
        }
    }
    styles
}

static TRAILING_COMMA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r",(\s*[}\]])").expect("static regex"));

/// Strip fences, straighten smart quotes, drop trailing commas
#[must_use]
pub fn clean_payload(payload: &str) -> String {
    let body = crate::interpreter::strip_fences(payload);
    let straightened: String = body
        .chars()
        .map(|c| match c {
            '\u{201c}' | '\u{201d}' | '\u{201e}' => '"',
            '\u{2018}' | '\u{2019}' => '\'',
            other => other,
        })
        .collect();
    TRAILING_COMMA.replace_all(&straightened, "$1").into_owned()
}

fn suggestions(error_type: ErrorType, context: &ErrorContext) -> Vec<String> {
    let mut out: Vec<String> = match error_type {
        ErrorType::TargetNotFound => vec![
            "Select the element again; the page may have changed".into(),
            "Try selecting its parent element".into(),
        ],
        ErrorType::InvalidSelector => vec![
            "Click the element to select it instead of typing a selector".into(),
        ],
        ErrorType::ValidationError => vec![
            "Use standard CSS values such as `16px`, `#ff0000` or `bold`".into(),
            "Describe one change at a time".into(),
        ],
        ErrorType::NetworkError => vec![
            "Check your internet connection".into(),
            "Try again in a few seconds".into(),
        ],
        ErrorType::PermissionError => vec![
            "This page blocks style changes; try a different element or page".into(),
        ],
        ErrorType::ExecutionError => vec![
            "Reload the page and try again".into(),
            "Try a simpler change".into(),
        ],
        ErrorType::GenerativeServiceError => vec![
            "The style assistant is busy; try again shortly".into(),
            "Rephrase the request more concretely".into(),
        ],
        ErrorType::TimeoutError => vec![
            "Try again; the request took too long".into(),
            "Try a shorter request".into(),
        ],
        ErrorType::SerializationError => vec!["Rephrase the request".into()],
        ErrorType::Unknown => vec![
            "Try again".into(),
            "Reload the page if the problem persists".into(),
        ],
    };
    if let (ErrorType::TargetNotFound, Some(selector)) = (error_type, &context.selector) {
        out.push(format!("Nothing on the page matches `{selector}` right now"));
    }
    if let (ErrorType::ValidationError, Some(command)) = (error_type, &context.command) {
        out.push(format!("Try rephrasing \"{command}\" with an explicit value"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use restyle_dom::MemoryTree;

    fn tree() -> (MemoryTree, NodeHandle) {
        let mut tree = MemoryTree::new();
        let body = tree.append_element(tree.document(), "body");
        let button = tree.append_element(body, "button");
        tree.add_class(button, "btn");
        tree.add_class(button, "primary");
        tree.set_id(button, "buy");
        (tree, button)
    }

    #[test]
    fn selector_variants_from_most_specific() {
        assert_eq!(
            selector_variants("main > button#buy.btn.primary"),
            vec!["#buy", ".btn", ".primary", "button"]
        );
        assert_eq!(selector_variants(".card"), Vec::<String>::new());
    }

    #[test]
    fn collapse_fixes_common_typos() {
        assert_eq!(collapse_selector("div..card"), "div.card");
        assert_eq!(collapse_selector("##hero"), "#hero");
        assert_eq!(collapse_selector("ul >> li"), "ul > li");
        assert_eq!(collapse_selector("  .nav   a >"), ".nav a");
    }

    #[test]
    fn derive_styles_covers_keywords_and_colours() {
        let styles = derive_styles_from_text("make it navy blue and bold, centered");
        assert_eq!(styles["color"], "navy blue");
        assert_eq!(styles["font-weight"], "bold");
        assert_eq!(styles["text-align"], "center");
        assert!(derive_styles_from_text("do something nice").is_empty());
    }

    #[test]
    fn clean_payload_repairs_json() {
        let cleaned = clean_payload("```json\n{\u{201c}styles\u{201d}: {\"color\": \"red\",},}\n```");
        assert_eq!(cleaned, "{\"styles\": {\"color\": \"red\"}}");
    }

    #[tokio::test]
    async fn stale_selector_recovers_with_variant() {
        let (tree, button) = tree();
        let mut handler = ErrorHandler::default();
        let error = RestyleError::target_not_found("section > button#gone.btn.primary");
        let resolution = handler
            .handle(&error, &ErrorContext::new("apply"), &tree)
            .await;
        assert!(resolution.success);
        assert_eq!(
            resolution.recovery,
            Some(Recovery::Selector {
                selector: ".btn".into(),
                matches: vec![button]
            })
        );
        assert_eq!(handler.attempts(ErrorType::TargetNotFound, "apply"), 0);
    }

    #[tokio::test]
    async fn recovery_attempts_are_capped() {
        let (tree, _) = tree();
        let mut handler = ErrorHandler::default();
        let error = RestyleError::target_not_found("#nowhere");
        for expected in 1..=3 {
            let resolution = handler.handle(&error, &ErrorContext::new("apply"), &tree).await;
            assert!(!resolution.success);
            assert_eq!(handler.attempts(ErrorType::TargetNotFound, "apply"), expected);
        }
        let resolution = handler.handle(&error, &ErrorContext::new("apply"), &tree).await;
        assert!(!resolution.success);
        assert_eq!(handler.attempts(ErrorType::TargetNotFound, "apply"), 3);
        // other operations keep their own budget
        handler.handle(&error, &ErrorContext::new("undo"), &tree).await;
        assert_eq!(handler.attempts(ErrorType::TargetNotFound, "undo"), 1);
    }

    #[tokio::test]
    async fn permission_errors_are_never_recovered() {
        let (tree, _) = tree();
        let mut handler = ErrorHandler::default();
        let resolution = handler
            .handle(&RestyleError::Permission("blocked by page".into()), &ErrorContext::new("apply"), &tree)
            .await;
        assert!(!resolution.success);
        assert!(!resolution.can_retry);
        assert_eq!(resolution.error_type, ErrorType::PermissionError);
        assert_eq!(handler.attempts(ErrorType::PermissionError, "apply"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_errors_wait_then_allow_retry() {
        let (tree, _) = tree();
        let mut handler = ErrorHandler::default();
        let started = tokio::time::Instant::now();
        let resolution = handler
            .handle(&RestyleError::Network("connection reset".into()), &ErrorContext::new("interpret"), &tree)
            .await;
        assert!(resolution.success);
        assert!(resolution.can_retry);
        assert_eq!(resolution.recovery, Some(Recovery::RetryAfter(Duration::from_secs(1))));
        assert!(started.elapsed() >= Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn transient_waits_spend_the_budget_until_the_operation_succeeds() {
        let (tree, _) = tree();
        let mut handler = ErrorHandler::default();
        let error = RestyleError::Network("connection reset".into());
        let context = ErrorContext::new("interpret");
        for expected in 1..=3 {
            let resolution = handler.handle(&error, &context, &tree).await;
            assert!(resolution.can_retry);
            assert_eq!(handler.attempts(ErrorType::NetworkError, "interpret"), expected);
        }
        let exhausted = handler.handle(&error, &context, &tree).await;
        assert!(!exhausted.success);
        assert!(!exhausted.can_retry);
        assert_eq!(exhausted.recovery, None);

        handler.succeeded("interpret");
        assert_eq!(handler.attempts(ErrorType::NetworkError, "interpret"), 0);
        assert!(handler.handle(&error, &context, &tree).await.can_retry);
    }

    #[tokio::test]
    async fn selectors_mentioning_other_failures_still_get_selector_recovery() {
        let mut tree = MemoryTree::new();
        let body = tree.append_element(tree.document(), "body");
        let aside = tree.append_element(body, "aside");
        let notice = tree.append_element(aside, "div");
        tree.set_id(notice, "timeout-notice");
        let mut handler = ErrorHandler::default();

        let resolution = handler
            .handle(
                &RestyleError::target_not_found("section > div#timeout-notice"),
                &ErrorContext::new("apply"),
                &tree,
            )
            .await;
        assert_eq!(resolution.error_type, ErrorType::TargetNotFound);
        assert_eq!(
            resolution.recovery,
            Some(Recovery::Selector {
                selector: "#timeout-notice".into(),
                matches: vec![notice]
            })
        );

        let resolution = handler
            .handle(
                &RestyleError::target_not_found("#permission-panel"),
                &ErrorContext::new("apply"),
                &tree,
            )
            .await;
        assert_eq!(resolution.error_type, ErrorType::TargetNotFound);
        assert_eq!(handler.attempts(ErrorType::TargetNotFound, "apply"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn crossing_the_burst_threshold_raises_an_alert() {
        let (tree, _) = tree();
        let mut handler = ErrorHandler::default();
        let context = ErrorContext::new("apply");
        for i in 0..4 {
            let error = RestyleError::Execution(format!("write {i} rejected"));
            assert!(handler.handle(&error, &context, &tree).await.alerts.is_empty());
        }
        let resolution = handler
            .handle(&RestyleError::Execution("write 4 rejected".into()), &context, &tree)
            .await;
        assert_eq!(resolution.alerts, vec![PatternAlert::Burst { distinct: 5 }]);
        assert_eq!(handler.log().alerts().count(), 1);
        assert_eq!(handler.log().len(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_failure_raises_an_alert_once() {
        let (tree, _) = tree();
        let mut handler = ErrorHandler::default();
        let error = RestyleError::Permission("blocked by page".into());
        let context = ErrorContext::new("apply");
        let mut raised = Vec::new();
        for _ in 0..4 {
            raised.push(handler.handle(&error, &context, &tree).await.alerts);
        }
        assert!(raised[0].is_empty() && raised[1].is_empty() && raised[3].is_empty());
        assert_eq!(
            raised[2],
            vec![PatternAlert::Repeated {
                message: "permission denied: blocked by page".into(),
                count: 3
            }]
        );
    }

    #[tokio::test]
    async fn validation_recovery_uses_command_text() {
        let (tree, _) = tree();
        let mut handler = ErrorHandler::default();
        let context = ErrorContext::new("validate").with_command("make it bold and rounded");
        let resolution = handler
            .handle(&RestyleError::Validation("no valid styles".into()), &context, &tree)
            .await;
        let Some(Recovery::Styles(styles)) = resolution.recovery else {
            panic!("expected styles, got {:?}", resolution.recovery);
        };
        assert_eq!(styles["font-weight"], "bold");
        assert_eq!(styles["border-radius"], "8px");
        assert!(resolution.suggestions.iter().any(|s| s.contains("make it bold")));
    }

    #[tokio::test]
    async fn serialization_recovery_cleans_payload() {
        let (tree, _) = tree();
        let mut handler = ErrorHandler::default();
        let context = ErrorContext::new("parse").with_payload("{'styles': {\u{201c}color\u{201d}: \u{201c}red\u{201d},},}");
        let resolution = handler
            .handle(&RestyleError::Serialization("bad".into()), &context, &tree)
            .await;
        // single-quoted keys stay invalid JSON; keyword fallback still finds the colour
        let Some(Recovery::Request(request)) = resolution.recovery else {
            panic!("expected request, got {:?}", resolution.recovery);
        };
        assert_eq!(request.styles["color"], serde_json::json!("red"));
    }

    #[tokio::test]
    async fn invalid_selector_collapses() {
        let (tree, button) = tree();
        let mut handler = ErrorHandler::default();
        let error = RestyleError::InvalidSelector {
            selector: "button..btn".into(),
            reason: "unexpected '.'".into(),
        };
        let resolution = handler.handle(&error, &ErrorContext::new("select"), &tree).await;
        assert_eq!(
            resolution.recovery,
            Some(Recovery::Selector {
                selector: "button.btn".into(),
                matches: vec![button]
            })
        );
    }
}

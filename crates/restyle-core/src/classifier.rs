//! Error classification
//!
//! A typed [`RestyleError`] variant already names its taxonomy member, and
//! its payload may quote selectors, values or command text, so it is never
//! re-read by the rules. Opaque errors ([`RestyleError::Other`]) go through
//! an ordered rule table mapping message text to a taxonomy member and a
//! user-facing message; the first matching rule wins and an unrecognized
//! message is [`ErrorType::Unknown`].

use crate::error::{ErrorType, RestyleError};
use regex::Regex;

/// One classification rule
#[derive(Debug, Clone)]
pub struct ClassificationRule {
    pattern: Regex,
    error_type: ErrorType,
    user_message: String,
}

impl ClassificationRule {
    /// Build a rule from a case-insensitive pattern
    ///
    /// # Errors
    /// Returns the regex error for an invalid pattern.
    pub fn new(
        pattern: &str,
        error_type: ErrorType,
        user_message: impl Into<String>,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(&format!("(?i){pattern}"))?,
            error_type,
            user_message: user_message.into(),
        })
    }

    #[must_use]
    pub fn error_type(&self) -> ErrorType {
        self.error_type
    }

    fn matches(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }
}

/// Classified error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub error_type: ErrorType,
    pub user_message: String,
    /// Whether a rule matched (as opposed to the variant fallback)
    pub matched_rule: bool,
}

const DEFAULT_RULES: &[(&str, ErrorType, &str)] = &[
    (
        r"permission|forbidden|not allowed|denied|\b40[13]\b|unauthori[sz]ed",
        ErrorType::PermissionError,
        "This page doesn't allow that change.",
    ),
    (
        r"timed? ?out|timeout|deadline exceeded",
        ErrorType::TimeoutError,
        "That took too long. Please try again.",
    ),
    (
        r"invalid selector|not a valid selector|unsupported pseudo|unexpected .* in selector",
        ErrorType::InvalidSelector,
        "I couldn't work out which element you meant.",
    ),
    (
        r"target not found|element not found|no (?:such )?element|could not find|cannot find|no longer on the page",
        ErrorType::TargetNotFound,
        "I couldn't find that element on the page anymore.",
    ),
    (
        r"generative|rate limit|\b429\b|model (?:is )?overloaded|completion failed|content policy",
        ErrorType::GenerativeServiceError,
        "The style assistant is having trouble right now.",
    ),
    (
        r"network|failed to fetch|connection|econn\w*|dns|offline|\b50[234]\b",
        ErrorType::NetworkError,
        "I couldn't reach the style assistant. Check your connection.",
    ),
    (
        r"json|parse error|unexpected token|unexpected end|serializ|deserializ|expected value",
        ErrorType::SerializationError,
        "I couldn't understand the style assistant's reply.",
    ),
    (
        r"validation|invalid css|invalid value",
        ErrorType::ValidationError,
        "Some of the requested style values aren't valid.",
    ),
    (
        r"execution failed|detached|is not an element|mutation failed",
        ErrorType::ExecutionError,
        "The change couldn't be applied to the page.",
    ),
];

/// Ordered rule table
#[derive(Debug, Clone)]
pub struct ErrorClassifier {
    rules: Vec<ClassificationRule>,
}

impl Default for ErrorClassifier {
    fn default() -> Self {
        Self::with_default_rules()
    }
}

impl ErrorClassifier {
    /// Classifier with no rules (variant fallback only)
    #[must_use]
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Classifier with the built-in rule table
    #[must_use]
    pub fn with_default_rules() -> Self {
        let rules = DEFAULT_RULES
            .iter()
            .filter_map(|(pattern, error_type, message)| {
                ClassificationRule::new(pattern, *error_type, *message).ok()
            })
            .collect();
        Self { rules }
    }

    /// Append a rule after the existing ones
    pub fn push_rule(&mut self, rule: ClassificationRule) {
        self.rules.push(rule);
    }

    /// Insert a rule ahead of every existing one
    pub fn prepend_rule(&mut self, rule: ClassificationRule) {
        self.rules.insert(0, rule);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Classify an error
    ///
    /// Typed variants keep their own kind and take the message of the first
    /// rule for that kind; only opaque messages are matched against rules.
    #[must_use]
    pub fn classify(&self, error: &RestyleError) -> Classification {
        let RestyleError::Other(text) = error else {
            let error_type = error.kind();
            return Classification {
                error_type,
                user_message: self.message_for(error_type),
                matched_rule: false,
            };
        };
        match self.rules.iter().find(|rule| rule.matches(text)) {
            Some(rule) => Classification {
                error_type: rule.error_type,
                user_message: rule.user_message.clone(),
                matched_rule: true,
            },
            None => Classification {
                error_type: ErrorType::Unknown,
                user_message: self.message_for(ErrorType::Unknown),
                matched_rule: false,
            },
        }
    }

    fn message_for(&self, error_type: ErrorType) -> String {
        self.rules
            .iter()
            .find(|rule| rule.error_type == error_type)
            .map_or_else(
                || error_type.default_user_message().to_string(),
                |rule| rule.user_message.clone(),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_compiles_completely() {
        assert_eq!(ErrorClassifier::default().len(), DEFAULT_RULES.len());
    }

    #[test]
    fn variants_classify_to_their_own_type() {
        let classifier = ErrorClassifier::default();
        let cases = [
            (RestyleError::target_not_found("#hero"), ErrorType::TargetNotFound),
            (
                RestyleError::InvalidSelector {
                    selector: "div..x".into(),
                    reason: "unexpected '.'".into(),
                },
                ErrorType::InvalidSelector,
            ),
            (RestyleError::Validation("bad".into()), ErrorType::ValidationError),
            (RestyleError::Network("reset".into()), ErrorType::NetworkError),
            (RestyleError::Permission("no".into()), ErrorType::PermissionError),
            (RestyleError::Execution("boom".into()), ErrorType::ExecutionError),
            (RestyleError::Generative("busy".into()), ErrorType::GenerativeServiceError),
            (RestyleError::timeout("interpret", 10), ErrorType::TimeoutError),
            (RestyleError::Serialization("bad".into()), ErrorType::SerializationError),
        ];
        for (error, expected) in cases {
            assert_eq!(classifier.classify(&error).error_type, expected, "{error}");
        }
    }

    #[test]
    fn message_patterns_classify_opaque_errors() {
        let classifier = ErrorClassifier::default();
        let classify = |msg: &str| classifier.classify(&RestyleError::Other(msg.into())).error_type;
        assert_eq!(classify("Failed to fetch"), ErrorType::NetworkError);
        assert_eq!(classify("HTTP 429 Too Many Requests"), ErrorType::GenerativeServiceError);
        assert_eq!(classify("Unexpected token < in JSON"), ErrorType::SerializationError);
        assert_eq!(classify("403 Forbidden"), ErrorType::PermissionError);
        assert_eq!(classify("completely novel failure"), ErrorType::Unknown);
    }

    #[test]
    fn first_match_wins_and_rules_are_additive() {
        let mut classifier = ErrorClassifier::default();
        let err = RestyleError::Other("connection timed out".into());
        assert_eq!(classifier.classify(&err).error_type, ErrorType::TimeoutError);

        classifier.prepend_rule(
            ClassificationRule::new("connection", ErrorType::NetworkError, "Offline").unwrap(),
        );
        let classification = classifier.classify(&err);
        assert_eq!(classification.error_type, ErrorType::NetworkError);
        assert_eq!(classification.user_message, "Offline");

        // typed errors of the same kind pick up the new wording
        let typed = classifier.classify(&RestyleError::Network("reset".into()));
        assert_eq!(typed.user_message, "Offline");
        assert!(!typed.matched_rule);
    }

    #[test]
    fn quoted_selectors_and_values_do_not_reclassify() {
        let classifier = ErrorClassifier::default();
        let cases = [
            (
                RestyleError::target_not_found("section > div#timeout-notice"),
                ErrorType::TargetNotFound,
            ),
            (RestyleError::target_not_found("#permission-panel"), ErrorType::TargetNotFound),
            (
                RestyleError::Validation("Invalid value for display: 'connection-box'".into()),
                ErrorType::ValidationError,
            ),
            (
                RestyleError::InvalidSelector {
                    selector: "div.json-viewer..x".into(),
                    reason: "unexpected '.'".into(),
                },
                ErrorType::InvalidSelector,
            ),
            (RestyleError::Network("connection timed out".into()), ErrorType::NetworkError),
        ];
        for (error, expected) in cases {
            assert_eq!(classifier.classify(&error).error_type, expected, "{error}");
        }
    }

    #[test]
    fn fallback_uses_variant_default() {
        let classification = ErrorClassifier::empty().classify(&RestyleError::Execution("x".into()));
        assert_eq!(classification.error_type, ErrorType::ExecutionError);
        assert!(!classification.matched_rule);
    }
}

//! Partial validation against the schema

use crate::error::SchemaError;
use crate::table::SCHEMA;
use crate::{RawStyles, Styles};
use crate::normalize::StyleNormalizer;
use serde::Serialize;

/// Outcome of validating one property map
///
/// `valid` holds every accepted entry keyed by its canonical name, `errors`
/// one message per rejected entry. `is_valid` is true only when nothing was
/// rejected; callers proceed with `valid` either way.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// Accepted entries
    pub valid: Styles,
    /// Rejection messages, in input order
    pub errors: Vec<String>,
    /// Whether every entry was accepted
    pub is_valid: bool,
}

impl ValidationReport {
    /// Whether nothing at all was accepted
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.valid.is_empty()
    }
}

/// Partitions property maps into accepted and rejected entries
#[derive(Debug, Clone, Copy, Default)]
pub struct StyleValidator;

impl StyleValidator {
    /// Validate a normalized property map
    #[must_use]
    pub fn validate(&self, styles: &Styles) -> ValidationReport {
        let mut report = ValidationReport::default();
        for (property, value) in styles {
            match self.check(property, value) {
                Ok(canonical) => {
                    report.valid.insert(canonical.to_string(), value.trim().to_string());
                }
                Err(err) => {
                    tracing::debug!(%property, %value, error = %err, "rejected style entry");
                    report.errors.push(err.to_string());
                }
            }
        }
        report.is_valid = report.errors.is_empty();
        report
    }

    /// Normalize then validate a raw interpreter map
    #[must_use]
    pub fn normalize_and_validate(&self, raw: &RawStyles) -> ValidationReport {
        self.validate(&StyleNormalizer.normalize(raw))
    }

    /// Check one entry, returning its canonical property name
    ///
    /// # Errors
    /// Returns [`SchemaError`] for unknown properties or rejected values.
    pub fn check(&self, property: &str, value: &str) -> Result<&'static str, SchemaError> {
        let spec = SCHEMA.require(property)?;
        spec.kind
            .check(value)
            .map(|()| spec.name)
            .map_err(|reason| SchemaError::invalid_value(property, value, reason))
    }
}

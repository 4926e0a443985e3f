//! Schema errors

/// Errors raised by schema lookups and value checks
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    /// Property is not on the allow-list under any spelling
    #[error("Invalid CSS property: {0}")]
    UnknownProperty(String),

    /// Value does not satisfy the property's value kind
    #[error("Invalid value for {property}: '{value}' ({reason})")]
    InvalidValue {
        property: String,
        value: String,
        reason: String,
    },
}

impl SchemaError {
    /// Create invalid value error
    pub fn invalid_value(
        property: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            property: property.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }
}

//! Restyle Schema - the mutation allow-list
//!
//! A fixed table of recognized style properties, each tagged with a
//! [`ValueKind`], plus the two passes every mutation request goes through
//! before it may touch the live tree:
//!
//! 1. [`StyleNormalizer`] - colour names to canonical codes, bare integers
//!    on size properties to `px` lengths.
//! 2. [`StyleValidator`] - partitions the map into accepted (keyed by the
//!    canonical property name) and rejected entries. Validation is partial:
//!    rejected entries never block the accepted ones.
//!
//! ```rust
//! use restyle_schema::{RawStyles, StyleNormalizer, StyleValidator};
//!
//! let raw: RawStyles = serde_json::from_str(r#"{"marginTop": 10, "bogus": "x"}"#).unwrap();
//! let report = StyleValidator.validate(&StyleNormalizer.normalize(&raw));
//!
//! assert_eq!(report.valid["margin-top"], "10px");
//! assert!(!report.is_valid);
//! ```

#![warn(unreachable_pub)]

pub mod colors;
pub mod error;
pub mod kind;
pub mod normalize;
pub mod table;
pub mod validate;

pub use error::SchemaError;
pub use kind::{CompositeKind, ValueKind};
pub use normalize::StyleNormalizer;
pub use table::{compact_name, kebab_case, Category, MutationSchema, PropertySpec, SCHEMA};
pub use validate::{StyleValidator, ValidationReport};

use indexmap::IndexMap;

/// Property map as received from the interpreter (values of any JSON type)
pub type RawStyles = IndexMap<String, serde_json::Value>;

/// Property map with string values
pub type Styles = IndexMap<String, String>;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

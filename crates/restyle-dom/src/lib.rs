//! Restyle DOM - live document tree abstraction
//!
//! The mutation core never talks to a concrete renderer. Everything it needs
//! from the host document is expressed by the [`LiveTree`] trait:
//! - Selector queries (`#id`, `.class`, `tag`, `:nth-child(k)`, combinators)
//! - Structural facts (tag, id, classes, parent, sibling index)
//! - The own style layer (serialized text and per-property access)
//! - Effective (computed) values
//! - Selection indicators
//!
//! [`MemoryTree`] is an arena-backed implementation used by the CLI and the
//! test-suite. It can detach nodes (stale handles) and can be told to ignore
//! specific writes the way a rendering engine silently drops values it does
//! not support.
//!
//! # Example
//!
//! ```rust
//! use restyle_dom::{LiveTree, MemoryTree};
//!
//! let mut tree = MemoryTree::new();
//! let body = tree.append_element(tree.document(), "body");
//! let hero = tree.append_element(body, "div");
//! tree.set_id(hero, "hero");
//!
//! assert_eq!(tree.query_all("#hero").unwrap(), vec![hero]);
//! ```

#![warn(unreachable_pub)]

pub mod error;
pub mod fixture;
pub mod memory;
pub mod selector;
pub mod style;
pub mod tree;

pub use error::{DomError, FixtureError, SelectorError};
pub use fixture::DocumentSpec;
pub use memory::MemoryTree;
pub use selector::{is_simple_identifier, Selector};
pub use style::{parse_style_text, serialize_declarations};
pub use tree::{LiveTree, NodeHandle, NodeKind};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! The `LiveTree` seam between the mutation core and a host document

use crate::error::{DomError, SelectorError};
use serde::{Deserialize, Serialize};

/// Opaque handle to a node of a live tree
///
/// Handles stay valid for the lifetime of the tree that issued them, but the
/// node they point at can be detached; callers must re-check connectivity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeHandle(pub usize);

impl std::fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Kind of node behind a handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// The document root
    Document,
    /// An element (the only kind that carries style)
    Element,
    /// A text node
    Text,
}

/// A live, mutable document tree
///
/// Style property names are the hyphenated CSS names (`margin-top`).
pub trait LiveTree {
    /// All elements matching `selector`, distinct and in document order
    ///
    /// # Errors
    /// Returns [`SelectorError`] when the selector cannot be parsed.
    fn query_all(&self, selector: &str) -> Result<Vec<NodeHandle>, SelectorError>;

    /// Kind of the node, `None` for unknown handles
    fn node_kind(&self, node: NodeHandle) -> Option<NodeKind>;

    /// Whether the node is still reachable from the document root
    fn is_connected(&self, node: NodeHandle) -> bool;

    /// Lower-case tag name of an element
    fn tag_name(&self, node: NodeHandle) -> Option<&str>;

    /// Identifier attribute of an element
    fn element_id(&self, node: NodeHandle) -> Option<&str>;

    /// Class tokens of an element, in attribute order
    fn class_list(&self, node: NodeHandle) -> &[String];

    /// Parent element (not the document node)
    fn parent_element(&self, node: NodeHandle) -> Option<NodeHandle>;

    /// 1-based position among the parent's element children
    fn element_index(&self, node: NodeHandle) -> Option<usize>;

    /// Serialized own style layer, `None` when there is no style attribute
    ///
    /// # Errors
    /// Fails for unknown handles and non-element nodes.
    fn style_text(&self, node: NodeHandle) -> Result<Option<String>, DomError>;

    /// Replace the whole own style layer; `None` removes the attribute
    ///
    /// # Errors
    /// Fails for unknown, non-element or detached nodes.
    fn set_style_text(&mut self, node: NodeHandle, text: Option<&str>) -> Result<(), DomError>;

    /// Own-style value of a single property
    ///
    /// # Errors
    /// Fails for unknown handles and non-element nodes.
    fn own_property(&self, node: NodeHandle, property: &str) -> Result<Option<String>, DomError>;

    /// Write a single own-style property
    ///
    /// The engine may silently ignore the value; re-read to confirm.
    ///
    /// # Errors
    /// Fails for unknown, non-element or detached nodes.
    fn set_own_property(
        &mut self,
        node: NodeHandle,
        property: &str,
        value: &str,
    ) -> Result<(), DomError>;

    /// Remove a single own-style property
    ///
    /// # Errors
    /// Fails for unknown, non-element or detached nodes.
    fn remove_own_property(&mut self, node: NodeHandle, property: &str) -> Result<(), DomError>;

    /// Effective value of a property (empty string when nothing applies)
    ///
    /// # Errors
    /// Fails for unknown, non-element or detached nodes.
    fn computed_property(&self, node: NodeHandle, property: &str) -> Result<String, DomError>;

    /// Show or hide the selection indicator of an element
    ///
    /// # Errors
    /// Fails for unknown handles and non-element nodes.
    fn set_indicator(&mut self, node: NodeHandle, visible: bool) -> Result<(), DomError>;

    /// Whether the selection indicator is currently shown
    fn has_indicator(&self, node: NodeHandle) -> bool;

    /// Whether the handle names an element
    fn is_element(&self, node: NodeHandle) -> bool {
        matches!(self.node_kind(node), Some(NodeKind::Element))
    }
}

//! JSON document fixtures
//!
//! ```json
//! { "tag": "html", "children": [
//!     { "tag": "body", "children": [
//!         { "tag": "h1", "id": "title", "classes": ["hero"], "style": "color: red" }
//!     ] }
//! ] }
//! ```

use crate::error::FixtureError;
use crate::memory::MemoryTree;
use crate::tree::{LiveTree, NodeHandle};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Declarative description of an element subtree
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentSpec {
    /// Tag name
    pub tag: String,
    /// Identifier attribute
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Class tokens
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub classes: Vec<String>,
    /// Inline style attribute text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    /// Stylesheet-provided values
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub computed: IndexMap<String, String>,
    /// Text content appended before the children
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Child elements
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DocumentSpec>,
}

impl DocumentSpec {
    /// Element with the given tag and nothing else
    #[must_use]
    pub fn element(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    /// With identifier
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// With class tokens
    #[must_use]
    pub fn with_classes(mut self, classes: &[&str]) -> Self {
        self.classes = classes.iter().map(ToString::to_string).collect();
        self
    }

    /// With inline style text
    #[must_use]
    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }

    /// With a stylesheet value
    #[must_use]
    pub fn with_computed(mut self, property: &str, value: &str) -> Self {
        self.computed.insert(property.to_string(), value.to_string());
        self
    }

    /// With a child element
    #[must_use]
    pub fn with_child(mut self, child: DocumentSpec) -> Self {
        self.children.push(child);
        self
    }
}

impl MemoryTree {
    /// Build a tree whose single root element is described by `spec`
    ///
    /// # Errors
    /// Returns [`FixtureError::EmptyTag`] if any element lacks a tag.
    pub fn from_spec(spec: &DocumentSpec) -> Result<Self, FixtureError> {
        let mut tree = Self::new();
        let document = tree.document();
        tree.build(document, spec, 0)?;
        Ok(tree)
    }

    /// Build a tree from a JSON fixture
    ///
    /// # Errors
    /// Returns [`FixtureError`] for malformed JSON or empty tags.
    pub fn from_json(json: &str) -> Result<Self, FixtureError> {
        let spec: DocumentSpec = serde_json::from_str(json)?;
        Self::from_spec(&spec)
    }

    fn build(
        &mut self,
        parent: NodeHandle,
        spec: &DocumentSpec,
        depth: usize,
    ) -> Result<NodeHandle, FixtureError> {
        if spec.tag.trim().is_empty() {
            return Err(FixtureError::EmptyTag { depth });
        }
        let node = self.append_element(parent, spec.tag.trim());
        if let Some(id) = spec.id.as_deref().filter(|id| !id.is_empty()) {
            self.set_id(node, id);
        }
        for class in &spec.classes {
            self.add_class(node, class);
        }
        for (property, value) in &spec.computed {
            self.set_cascaded(node, property, value);
        }
        if let Some(style) = &spec.style {
            // the node was just attached, so the write cannot fail
            let _ = self.set_style_text(node, Some(style));
        }
        if let Some(text) = &spec.text {
            self.append_text(node, text);
        }
        for child in &spec.children {
            self.build(node, child, depth + 1)?;
        }
        Ok(node)
    }
}

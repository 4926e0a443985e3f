//! Arena-backed in-memory live tree

use crate::error::{DomError, SelectorError};
use crate::selector::{Combinator, Compound, Pseudo, Selector, Step};
use crate::style::{is_storable_value, parse_style_text, serialize_declarations};
use crate::tree::{LiveTree, NodeHandle, NodeKind};
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};

/// Properties whose effective value flows from the parent element
const INHERITED: &[&str] = &[
    "color",
    "cursor",
    "font-family",
    "font-size",
    "font-style",
    "font-weight",
    "letter-spacing",
    "line-height",
    "text-align",
    "text-transform",
    "visibility",
    "white-space",
    "word-spacing",
];

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeHandle>,
    children: Vec<NodeHandle>,
    data: NodeData,
}

#[derive(Debug, Clone)]
enum NodeData {
    Document,
    Element(ElementData),
    Text(String),
}

#[derive(Debug, Clone, Default)]
struct ElementData {
    tag: String,
    id: Option<String>,
    classes: Vec<String>,
    /// `None` when the element has no style attribute at all
    style: Option<IndexMap<String, String>>,
    /// Values contributed by stylesheets
    cascaded: IndexMap<String, String>,
}

/// Writes the simulated rendering engine drops without reporting an error
#[derive(Debug, Clone, Default)]
struct EngineRules {
    ignored_properties: HashSet<String>,
    ignored_values: HashSet<(String, String)>,
}

impl EngineRules {
    fn accepts(&self, property: &str, value: &str) -> bool {
        is_storable_value(value)
            && !self.ignored_properties.contains(property)
            && !self
                .ignored_values
                .contains(&(property.to_string(), value.to_string()))
    }
}

/// In-memory document tree
///
/// Node 0 is always the document node. Handles are never reused; a detached
/// node keeps its data but is no longer reachable from the document.
#[derive(Debug, Clone)]
pub struct MemoryTree {
    nodes: Vec<Node>,
    id_index: HashMap<String, Vec<NodeHandle>>,
    indicators: HashSet<NodeHandle>,
    engine: EngineRules,
}

impl MemoryTree {
    /// Create a tree holding only the document node
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                data: NodeData::Document,
            }],
            id_index: HashMap::new(),
            indicators: HashSet::new(),
            engine: EngineRules::default(),
        }
    }

    /// Handle of the document node
    #[inline]
    #[must_use]
    pub fn document(&self) -> NodeHandle {
        NodeHandle(0)
    }

    /// Append a new element under `parent`
    pub fn append_element(&mut self, parent: NodeHandle, tag: &str) -> NodeHandle {
        let data = NodeData::Element(ElementData {
            tag: tag.to_ascii_lowercase(),
            ..ElementData::default()
        });
        self.push_node(Some(parent), data)
    }

    /// Append a text node under `parent`
    pub fn append_text(&mut self, parent: NodeHandle, text: &str) -> NodeHandle {
        self.push_node(Some(parent), NodeData::Text(text.to_string()))
    }

    /// Set (or replace) the identifier of an element
    pub fn set_id(&mut self, node: NodeHandle, id: &str) {
        let Some(element) = self.element_data_mut(node) else {
            return;
        };
        let previous = element.id.replace(id.to_string());
        if let Some(previous) = previous {
            if let Some(entries) = self.id_index.get_mut(&previous) {
                entries.retain(|h| *h != node);
            }
        }
        self.id_index.entry(id.to_string()).or_default().push(node);
    }

    /// Append a class token to an element
    pub fn add_class(&mut self, node: NodeHandle, class: &str) {
        if let Some(element) = self.element_data_mut(node) {
            if !element.classes.iter().any(|c| c == class) {
                element.classes.push(class.to_string());
            }
        }
    }

    /// Set a stylesheet-provided value for an element
    pub fn set_cascaded(&mut self, node: NodeHandle, property: &str, value: &str) {
        if let Some(element) = self.element_data_mut(node) {
            element
                .cascaded
                .insert(property.to_ascii_lowercase(), value.to_string());
        }
    }

    /// Detach a node (and its subtree) from the document
    pub fn detach(&mut self, node: NodeHandle) {
        let Some(parent) = self.nodes.get(node.0).and_then(|n| n.parent) else {
            return;
        };
        self.nodes[parent.0].children.retain(|c| *c != node);
        self.nodes[node.0].parent = None;
        self.indicators.remove(&node);
    }

    /// Make the engine silently drop every write to `property`
    pub fn ignore_property(&mut self, property: &str) {
        self.engine
            .ignored_properties
            .insert(property.to_ascii_lowercase());
    }

    /// Make the engine silently drop one specific property value
    pub fn ignore_value(&mut self, property: &str, value: &str) {
        self.engine
            .ignored_values
            .insert((property.to_ascii_lowercase(), value.to_string()));
    }

    /// Text content of a text node
    #[must_use]
    pub fn text(&self, node: NodeHandle) -> Option<&str> {
        match &self.nodes.get(node.0)?.data {
            NodeData::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Total number of nodes ever created (including detached ones)
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether only the document node exists
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    fn push_node(&mut self, parent: Option<NodeHandle>, data: NodeData) -> NodeHandle {
        let handle = NodeHandle(self.nodes.len());
        self.nodes.push(Node {
            parent,
            children: Vec::new(),
            data,
        });
        if let Some(parent) = parent {
            self.nodes[parent.0].children.push(handle);
        }
        handle
    }

    fn element_data(&self, node: NodeHandle) -> Result<&ElementData, DomError> {
        match &self.nodes.get(node.0).ok_or(DomError::UnknownNode(node))?.data {
            NodeData::Element(element) => Ok(element),
            _ => Err(DomError::NotAnElement(node)),
        }
    }

    fn element_data_mut(&mut self, node: NodeHandle) -> Option<&mut ElementData> {
        match &mut self.nodes.get_mut(node.0)?.data {
            NodeData::Element(element) => Some(element),
            _ => None,
        }
    }

    fn writable_element(&mut self, node: NodeHandle) -> Result<&mut ElementData, DomError> {
        self.element_data(node)?;
        if !self.is_connected(node) {
            return Err(DomError::Detached(node));
        }
        self.element_data_mut(node)
            .ok_or(DomError::NotAnElement(node))
    }

    fn element_children(&self, node: NodeHandle) -> impl Iterator<Item = NodeHandle> + '_ {
        self.nodes[node.0]
            .children
            .iter()
            .copied()
            .filter(|c| self.is_element(*c))
    }

    fn collect_elements(&self, node: NodeHandle, out: &mut Vec<NodeHandle>) {
        for child in &self.nodes[node.0].children {
            if self.is_element(*child) {
                out.push(*child);
            }
            self.collect_elements(*child, out);
        }
    }

    fn matches_chain(&self, node: NodeHandle, chain: &[Step]) -> bool {
        let Some((last, rest)) = chain.split_last() else {
            return false;
        };
        if !self.matches_compound(node, &last.compound) {
            return false;
        }
        if rest.is_empty() {
            return true;
        }
        match last.combinator {
            Some(Combinator::Child) => self
                .parent_element(node)
                .is_some_and(|parent| self.matches_chain(parent, rest)),
            Some(Combinator::Descendant) => {
                let mut cursor = self.parent_element(node);
                while let Some(ancestor) = cursor {
                    if self.matches_chain(ancestor, rest) {
                        return true;
                    }
                    cursor = self.parent_element(ancestor);
                }
                false
            }
            None => false,
        }
    }

    fn matches_compound(&self, node: NodeHandle, compound: &Compound) -> bool {
        let Ok(element) = self.element_data(node) else {
            return false;
        };
        if compound.tag.as_ref().is_some_and(|tag| *tag != element.tag) {
            return false;
        }
        if compound
            .id
            .as_ref()
            .is_some_and(|id| element.id.as_ref() != Some(id))
        {
            return false;
        }
        if !compound
            .classes
            .iter()
            .all(|class| element.classes.contains(class))
        {
            return false;
        }
        compound.pseudos.iter().all(|pseudo| {
            let index = self.element_index(node);
            match pseudo {
                Pseudo::NthChild(k) => index == Some(*k),
                Pseudo::FirstChild => index == Some(1),
                Pseudo::LastChild => self.nodes[node.0].parent.is_some_and(|parent| {
                    self.element_children(parent).last() == Some(node)
                }),
            }
        })
    }
}

impl Default for MemoryTree {
    fn default() -> Self {
        Self::new()
    }
}

impl LiveTree for MemoryTree {
    fn query_all(&self, selector: &str) -> Result<Vec<NodeHandle>, SelectorError> {
        let parsed = Selector::parse(selector)?;

        if let Some(id) = parsed.id_only() {
            let mut hits: Vec<NodeHandle> = self
                .id_index
                .get(id)
                .map(|entries| {
                    entries
                        .iter()
                        .copied()
                        .filter(|h| self.is_connected(*h))
                        .collect()
                })
                .unwrap_or_default();
            hits.sort();
            return Ok(hits);
        }

        let mut candidates = Vec::new();
        self.collect_elements(self.document(), &mut candidates);
        Ok(candidates
            .into_iter()
            .filter(|candidate| {
                parsed
                    .groups
                    .iter()
                    .any(|chain| self.matches_chain(*candidate, chain))
            })
            .collect())
    }

    fn node_kind(&self, node: NodeHandle) -> Option<NodeKind> {
        self.nodes.get(node.0).map(|n| match n.data {
            NodeData::Document => NodeKind::Document,
            NodeData::Element(_) => NodeKind::Element,
            NodeData::Text(_) => NodeKind::Text,
        })
    }

    fn is_connected(&self, node: NodeHandle) -> bool {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if current == self.document() {
                return true;
            }
            cursor = self.nodes.get(current.0).and_then(|n| n.parent);
        }
        false
    }

    fn tag_name(&self, node: NodeHandle) -> Option<&str> {
        self.element_data(node).ok().map(|e| e.tag.as_str())
    }

    fn element_id(&self, node: NodeHandle) -> Option<&str> {
        self.element_data(node).ok().and_then(|e| e.id.as_deref())
    }

    fn class_list(&self, node: NodeHandle) -> &[String] {
        self.element_data(node)
            .map(|e| e.classes.as_slice())
            .unwrap_or(&[])
    }

    fn parent_element(&self, node: NodeHandle) -> Option<NodeHandle> {
        let parent = self.nodes.get(node.0)?.parent?;
        self.is_element(parent).then_some(parent)
    }

    fn element_index(&self, node: NodeHandle) -> Option<usize> {
        let parent = self.nodes.get(node.0)?.parent?;
        self.element_children(parent)
            .position(|c| c == node)
            .map(|i| i + 1)
    }

    fn style_text(&self, node: NodeHandle) -> Result<Option<String>, DomError> {
        Ok(self
            .element_data(node)?
            .style
            .as_ref()
            .map(serialize_declarations))
    }

    fn set_style_text(&mut self, node: NodeHandle, text: Option<&str>) -> Result<(), DomError> {
        let element = self.writable_element(node)?;
        element.style = text.map(parse_style_text);
        Ok(())
    }

    fn own_property(&self, node: NodeHandle, property: &str) -> Result<Option<String>, DomError> {
        Ok(self
            .element_data(node)?
            .style
            .as_ref()
            .and_then(|style| style.get(&property.to_ascii_lowercase()).cloned()))
    }

    fn set_own_property(
        &mut self,
        node: NodeHandle,
        property: &str,
        value: &str,
    ) -> Result<(), DomError> {
        let property = property.to_ascii_lowercase();
        let value = value.trim();
        if value.is_empty() {
            return self.remove_own_property(node, &property);
        }
        let accepted = self.engine.accepts(&property, value);
        let element = self.writable_element(node)?;
        if !accepted {
            tracing::trace!(%node, %property, value, "engine ignored style write");
            return Ok(());
        }
        element
            .style
            .get_or_insert_with(IndexMap::new)
            .insert(property, value.to_string());
        Ok(())
    }

    fn remove_own_property(&mut self, node: NodeHandle, property: &str) -> Result<(), DomError> {
        let element = self.writable_element(node)?;
        if let Some(style) = element.style.as_mut() {
            style.shift_remove(&property.to_ascii_lowercase());
        }
        Ok(())
    }

    fn computed_property(&self, node: NodeHandle, property: &str) -> Result<String, DomError> {
        let property = property.to_ascii_lowercase();
        let element = self.element_data(node)?;
        if !self.is_connected(node) {
            return Err(DomError::Detached(node));
        }
        if let Some(value) = element.style.as_ref().and_then(|s| s.get(&property)) {
            return Ok(value.clone());
        }
        if let Some(value) = element.cascaded.get(&property) {
            return Ok(value.clone());
        }
        if INHERITED.contains(&property.as_str()) {
            if let Some(parent) = self.parent_element(node) {
                return self.computed_property(parent, &property);
            }
        }
        Ok(String::new())
    }

    fn set_indicator(&mut self, node: NodeHandle, visible: bool) -> Result<(), DomError> {
        self.element_data(node)?;
        if visible {
            self.indicators.insert(node);
        } else {
            self.indicators.remove(&node);
        }
        Ok(())
    }

    fn has_indicator(&self, node: NodeHandle) -> bool {
        self.indicators.contains(&node)
    }
}

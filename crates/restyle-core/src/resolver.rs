//! Target resolution
//!
//! A [`TargetResolver`] owns the set of selected elements and keeps their
//! selection indicators in sync. It also turns element handles into
//! [`SelectorPath`]s that re-resolve to the same element, and selector paths
//! back into handles.
//!
//! At most one resolver is active at a time; [`ResolverRegistry`] enforces
//! that by tearing the previous one down on activation.

use indexmap::IndexSet;
use restyle_dom::{is_simple_identifier, DomError, LiveTree, NodeHandle};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Longest class token considered for a class-based selector
pub const MAX_CLASS_TOKEN_LEN: usize = 30;

/// Selector string that re-resolves to a previously selected element
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectorPath(String);

impl SelectorPath {
    /// Wrap a selector string
    pub fn new(selector: impl Into<String>) -> Self {
        Self(selector.into())
    }

    /// Selector text
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SelectorPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SelectorPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Unique resolver identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolverId(Ulid);

impl ResolverId {
    /// Generate new resolver ID
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for ResolverId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ResolverId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "resolver-{}", self.0)
    }
}

/// Selection set plus selector generation and resolution
#[derive(Debug, Clone)]
pub struct TargetResolver {
    id: ResolverId,
    selection: IndexSet<NodeHandle>,
    indicated: IndexSet<NodeHandle>,
}

impl Default for TargetResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl TargetResolver {
    /// Resolver with a fresh identity and an empty selection
    #[must_use]
    pub fn new() -> Self {
        Self::with_id(ResolverId::new())
    }

    /// Resolver with a given identity
    #[must_use]
    pub fn with_id(id: ResolverId) -> Self {
        Self {
            id,
            selection: IndexSet::new(),
            indicated: IndexSet::new(),
        }
    }

    /// Identity
    #[inline]
    #[must_use]
    pub fn id(&self) -> ResolverId {
        self.id
    }

    /// Selected elements, in selection order
    #[must_use]
    pub fn selection(&self) -> Vec<NodeHandle> {
        self.selection.iter().copied().collect()
    }

    /// Whether `node` is selected
    #[must_use]
    pub fn contains(&self, node: NodeHandle) -> bool {
        self.selection.contains(&node)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.selection.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.selection.is_empty()
    }

    /// Add an element to the selection
    ///
    /// Returns `true` if it was not already selected.
    ///
    /// # Errors
    /// Fails for non-element or detached nodes.
    pub fn add<T: LiveTree + ?Sized>(
        &mut self,
        tree: &mut T,
        node: NodeHandle,
    ) -> Result<bool, DomError> {
        if tree.node_kind(node).is_none() {
            return Err(DomError::UnknownNode(node));
        }
        if !tree.is_element(node) {
            return Err(DomError::NotAnElement(node));
        }
        if !tree.is_connected(node) {
            return Err(DomError::Detached(node));
        }
        let inserted = self.selection.insert(node);
        if inserted {
            tracing::debug!(resolver = %self.id, %node, "element selected");
        }
        self.sync_indicators(tree);
        Ok(inserted)
    }

    /// Remove an element from the selection
    pub fn remove<T: LiveTree + ?Sized>(&mut self, tree: &mut T, node: NodeHandle) -> bool {
        let removed = self.selection.shift_remove(&node);
        if removed {
            tracing::debug!(resolver = %self.id, %node, "element deselected");
        }
        self.sync_indicators(tree);
        removed
    }

    /// Flip membership; returns whether `node` is now selected
    ///
    /// # Errors
    /// Fails when adding a non-element or detached node.
    pub fn toggle<T: LiveTree + ?Sized>(
        &mut self,
        tree: &mut T,
        node: NodeHandle,
    ) -> Result<bool, DomError> {
        if self.contains(node) {
            self.remove(tree, node);
            Ok(false)
        } else {
            self.add(tree, node).map(|_| true)
        }
    }

    /// Empty the selection
    pub fn clear<T: LiveTree + ?Sized>(&mut self, tree: &mut T) {
        if !self.selection.is_empty() {
            tracing::debug!(resolver = %self.id, count = self.selection.len(), "selection cleared");
        }
        self.selection.clear();
        self.sync_indicators(tree);
    }

    /// Make indicators mirror the selection exactly
    ///
    /// Idempotent: a second call with the same selection changes nothing.
    pub fn sync_indicators<T: LiveTree + ?Sized>(&mut self, tree: &mut T) {
        for node in &self.indicated {
            if !self.selection.contains(node) {
                // detached or unknown nodes have nothing left to hide
                let _ = tree.set_indicator(*node, false);
            }
        }
        for node in &self.selection {
            if !tree.has_indicator(*node) {
                let _ = tree.set_indicator(*node, true);
            }
        }
        self.indicated.clone_from(&self.selection);
    }

    /// Resolve selector paths to the distinct union of their matches
    ///
    /// Unparseable or unmatched paths contribute nothing; they are logged,
    /// never raised.
    pub fn resolve<T, S>(&self, tree: &T, paths: &[S]) -> Vec<NodeHandle>
    where
        T: LiveTree + ?Sized,
        S: AsRef<str>,
    {
        let mut found = IndexSet::new();
        for path in paths {
            let path = path.as_ref();
            match tree.query_all(path) {
                Ok(matches) if matches.is_empty() => {
                    tracing::debug!(selector = path, "selector matched nothing");
                }
                Ok(matches) => found.extend(matches),
                Err(err) => {
                    tracing::debug!(selector = path, error = %err, "selector could not be resolved");
                }
            }
        }
        found.into_iter().collect()
    }

    /// Selector that re-resolves to exactly `node`
    ///
    /// Preference: unique `#id`, then up to two simple class tokens, then a
    /// `:nth-child` path under the parent's selector. Exotic identifiers and
    /// class tokens (colons, slashes, brackets, leading digits) are skipped.
    #[must_use]
    pub fn generate_selector<T: LiveTree + ?Sized>(&self, tree: &T, node: NodeHandle) -> SelectorPath {
        if let Some(id) = tree.element_id(node).filter(|id| is_simple_identifier(id)) {
            let candidate = format!("#{id}");
            if resolves_uniquely(tree, &candidate, node) {
                return SelectorPath(candidate);
            }
        }

        let classes: Vec<&str> = tree
            .class_list(node)
            .iter()
            .map(String::as_str)
            .filter(|class| class.len() <= MAX_CLASS_TOKEN_LEN && is_simple_identifier(class))
            .take(2)
            .collect();
        for count in 1..=classes.len() {
            let candidate = format!(".{}", classes[..count].join("."));
            if resolves_uniquely(tree, &candidate, node) {
                return SelectorPath(candidate);
            }
        }

        let tag = tree.tag_name(node).unwrap_or("*");
        match (tree.parent_element(node), tree.element_index(node)) {
            (Some(parent), Some(index)) => SelectorPath(format!(
                "{} > :nth-child({index})",
                self.generate_selector(tree, parent)
            )),
            (_, index) => {
                if resolves_uniquely(tree, tag, node) {
                    return SelectorPath(tag.to_string());
                }
                let Some(index) = index else {
                    tracing::debug!(%node, tag, "no unique selector for element");
                    return SelectorPath(tag.to_string());
                };
                let positional = format!("{tag}:nth-child({index})");
                if !resolves_uniquely(tree, &positional, node) {
                    tracing::debug!(%node, selector = %positional, "no unique selector for element");
                }
                SelectorPath(positional)
            }
        }
    }

    /// Best-effort compound selector (`tag#id.class`) from a node's own facts
    ///
    /// Used for nodes that are no longer connected, where uniqueness can no
    /// longer be checked.
    #[must_use]
    pub fn describe_selector<T: LiveTree + ?Sized>(&self, tree: &T, node: NodeHandle) -> SelectorPath {
        let mut selector = tree.tag_name(node).unwrap_or("*").to_string();
        if let Some(id) = tree.element_id(node).filter(|id| is_simple_identifier(id)) {
            selector.push('#');
            selector.push_str(id);
        }
        for class in tree
            .class_list(node)
            .iter()
            .filter(|c| c.len() <= MAX_CLASS_TOKEN_LEN && is_simple_identifier(c))
        {
            selector.push('.');
            selector.push_str(class);
        }
        SelectorPath(selector)
    }
}

fn resolves_uniquely<T: LiveTree + ?Sized>(tree: &T, selector: &str, node: NodeHandle) -> bool {
    matches!(tree.query_all(selector).as_deref(), Ok([only]) if *only == node)
}

/// Result of activating a resolver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// No resolver was active
    Installed,
    /// The previous resolver was torn down
    Replaced { previous: ResolverId },
    /// The same resolver was already active; nothing changed
    AlreadyActive,
}

/// Holds the single active resolver
#[derive(Debug, Default)]
pub struct ResolverRegistry {
    active: Option<TargetResolver>,
}

impl ResolverRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `resolver` the active one
    ///
    /// A different previously active resolver has its selection and
    /// indicators cleared before it is dropped.
    pub fn activate<T: LiveTree + ?Sized>(
        &mut self,
        tree: &mut T,
        resolver: TargetResolver,
    ) -> Activation {
        if self.active.as_ref().is_some_and(|r| r.id == resolver.id) {
            return Activation::AlreadyActive;
        }
        let activation = match self.active.take() {
            Some(mut previous) => {
                previous.clear(tree);
                tracing::debug!(previous = %previous.id, next = %resolver.id, "resolver replaced");
                Activation::Replaced {
                    previous: previous.id,
                }
            }
            None => {
                tracing::debug!(resolver = %resolver.id, "resolver installed");
                Activation::Installed
            }
        };
        self.active = Some(resolver);
        activation
    }

    /// Tear down the active resolver
    pub fn deactivate<T: LiveTree + ?Sized>(&mut self, tree: &mut T) -> Option<ResolverId> {
        let mut resolver = self.active.take()?;
        resolver.clear(tree);
        Some(resolver.id)
    }

    #[must_use]
    pub fn active(&self) -> Option<&TargetResolver> {
        self.active.as_ref()
    }

    pub fn active_mut(&mut self) -> Option<&mut TargetResolver> {
        self.active.as_mut()
    }

    /// The active resolver, installing a fresh one if none is active
    pub fn ensure_active<T: LiveTree + ?Sized>(&mut self, tree: &mut T) -> &mut TargetResolver {
        if self.active.is_none() {
            self.activate(tree, TargetResolver::new());
        }
        self.active.get_or_insert_with(TargetResolver::new)
    }
}

//! Mutation application with verify-after-write

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use restyle_dom::{parse_style_text, DomError, LiveTree, NodeHandle};
use restyle_schema::{kebab_case, Styles, SCHEMA};
use serde::{Deserialize, Serialize};

/// Reason recorded when the engine silently drops a write
pub const REJECTED_BY_ENGINE: &str = "value rejected by rendering engine";

/// A property that took effect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedProperty {
    pub previous: String,
    pub new: String,
}

/// A property that did not take effect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedProperty {
    pub attempted: String,
    pub reason: String,
}

/// Per-property outcome of one apply
///
/// Every input property lands in exactly one of the two maps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyBreakdown {
    pub applied: IndexMap<String, AppliedProperty>,
    pub failed: IndexMap<String, FailedProperty>,
}

impl ApplyBreakdown {
    fn all_failed(styles: &Styles, reason: &str) -> Self {
        Self {
            applied: IndexMap::new(),
            failed: styles
                .iter()
                .map(|(property, value)| {
                    (
                        property.clone(),
                        FailedProperty {
                            attempted: value.clone(),
                            reason: reason.to_string(),
                        },
                    )
                })
                .collect(),
        }
    }

    /// Whether at least one property took effect
    #[inline]
    #[must_use]
    pub fn has_applied(&self) -> bool {
        !self.applied.is_empty()
    }

    /// Whether every property took effect
    #[inline]
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Pre-mutation state of a target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// Literal own style text, `None` when the element had no style attribute
    pub style_text: Option<String>,
    /// Computed value of every schema property that could be read
    pub computed: IndexMap<String, String>,
    pub captured_at: DateTime<Utc>,
}

/// Writes validated styles to a live tree and reports what stuck
#[derive(Debug, Clone, Copy, Default)]
pub struct MutationApplier;

impl MutationApplier {
    /// Snapshot the target before mutating it
    #[must_use]
    pub fn capture_state<T: LiveTree + ?Sized>(&self, tree: &T, target: NodeHandle) -> StateSnapshot {
        let computed = SCHEMA
            .iter()
            .filter_map(|spec| {
                tree.computed_property(target, spec.name)
                    .ok()
                    .map(|value| (spec.name.to_string(), value))
            })
            .collect();
        StateSnapshot {
            style_text: tree.style_text(target).ok().flatten(),
            computed,
            captured_at: Utc::now(),
        }
    }

    /// Write each property and verify it by reading it back
    ///
    /// A write counts as applied when the re-read value is non-empty and
    /// either equals the written value or differs from what was there
    /// before (the engine may reformat a value it accepted).
    pub fn apply<T: LiveTree + ?Sized>(
        &self,
        tree: &mut T,
        target: NodeHandle,
        styles: &Styles,
    ) -> ApplyBreakdown {
        if !tree.is_element(target) {
            return ApplyBreakdown::all_failed(styles, "target is not an element");
        }
        if !tree.is_connected(target) {
            return ApplyBreakdown::all_failed(styles, "target is detached from the document");
        }

        let mut breakdown = ApplyBreakdown::default();
        for (property, value) in styles {
            match self.apply_one(tree, target, property, value) {
                Ok(Some(applied)) => {
                    breakdown.applied.insert(property.clone(), applied);
                }
                Ok(None) => {
                    tracing::debug!(%target, %property, %value, "write ignored by engine");
                    breakdown.failed.insert(
                        property.clone(),
                        FailedProperty {
                            attempted: value.clone(),
                            reason: REJECTED_BY_ENGINE.to_string(),
                        },
                    );
                }
                Err(err) => {
                    tracing::debug!(%target, %property, error = %err, "write failed");
                    breakdown.failed.insert(
                        property.clone(),
                        FailedProperty {
                            attempted: value.clone(),
                            reason: err.to_string(),
                        },
                    );
                }
            }
        }

        tracing::info!(
            %target,
            applied = breakdown.applied.len(),
            failed = breakdown.failed.len(),
            "styles applied"
        );
        breakdown
    }

    fn apply_one<T: LiveTree + ?Sized>(
        &self,
        tree: &mut T,
        target: NodeHandle,
        property: &str,
        value: &str,
    ) -> Result<Option<AppliedProperty>, DomError> {
        let property = kebab_case(property);
        let property = property.as_str();
        let before = tree.own_property(target, property)?;
        let previous = match before.as_deref() {
            Some(own) if !own.is_empty() => own.to_string(),
            _ => tree.computed_property(target, property).unwrap_or_default(),
        };

        tree.set_own_property(target, property, value)?;

        let now = tree.own_property(target, property)?;
        Ok(now
            .filter(|now| !now.is_empty() && (now == value || before.as_deref() != Some(now.as_str())))
            .map(|new| AppliedProperty { previous, new }))
    }

    /// Put a target back into a captured state
    ///
    /// Restores the literal style text; if the tree refuses that, puts back
    /// each applied property's own declaration from the snapshot, removing
    /// the ones the element did not declare itself.
    ///
    /// # Errors
    /// Returns [`DomError`] when neither path can write to the target.
    pub fn restore<T: LiveTree + ?Sized>(
        &self,
        tree: &mut T,
        target: NodeHandle,
        snapshot: &StateSnapshot,
        breakdown: &ApplyBreakdown,
    ) -> Result<(), DomError> {
        match tree.set_style_text(target, snapshot.style_text.as_deref()) {
            Ok(()) => Ok(()),
            Err(err) => {
                tracing::debug!(%target, error = %err, "literal restore failed, reconstructing");
                let own = snapshot
                    .style_text
                    .as_deref()
                    .map(parse_style_text)
                    .unwrap_or_default();
                for property in breakdown.applied.keys() {
                    let property = kebab_case(property);
                    match own.get(property.as_str()) {
                        Some(previous) => tree.set_own_property(target, &property, previous)?,
                        None => tree.remove_own_property(target, &property)?,
                    }
                }
                Ok(())
            }
        }
    }
}

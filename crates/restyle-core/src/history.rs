//! Bounded, reversible change history

use crate::applier::{ApplyBreakdown, MutationApplier, StateSnapshot};
use crate::interpreter::MutationRequest;
use crate::resolver::SelectorPath;
use chrono::{DateTime, Utc};
use restyle_dom::LiveTree;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt::Write as _;
use ulid::Ulid;

/// Default number of retained entries
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// Unique change identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChangeId(Ulid);

impl ChangeId {
    /// Generate new change ID
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for ChangeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ChangeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "change-{}", self.0)
    }
}

/// One applied mutation, with everything needed to revert it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedChange {
    pub id: ChangeId,
    pub target: SelectorPath,
    pub command: String,
    pub request: MutationRequest,
    pub previous_state: StateSnapshot,
    pub breakdown: ApplyBreakdown,
    pub timestamp: DateTime<Utc>,
}

impl AppliedChange {
    #[must_use]
    pub fn new(
        target: SelectorPath,
        command: impl Into<String>,
        request: MutationRequest,
        previous_state: StateSnapshot,
        breakdown: ApplyBreakdown,
    ) -> Self {
        Self {
            id: ChangeId::new(),
            target,
            command: command.into(),
            request,
            previous_state,
            breakdown,
            timestamp: Utc::now(),
        }
    }
}

/// Result of an undo
#[derive(Debug, Clone, PartialEq)]
pub struct UndoOutcome {
    pub success: bool,
    pub message: String,
    /// The reverted entry, on success
    pub change: Option<AppliedChange>,
}

impl UndoOutcome {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            change: None,
        }
    }
}

/// Ordered change history, newest last, FIFO-evicted past capacity
#[derive(Debug, Clone)]
pub struct HistoryManager {
    entries: VecDeque<AppliedChange>,
    capacity: usize,
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl HistoryManager {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Append a change; returns the evicted oldest entry, if any
    pub fn record(&mut self, change: AppliedChange) -> Option<AppliedChange> {
        tracing::debug!(id = %change.id, target = %change.target, "change recorded");
        self.entries.push_back(change);
        if self.entries.len() > self.capacity {
            self.entries.pop_front()
        } else {
            None
        }
    }

    /// Entries, oldest first
    pub fn list(&self) -> impl Iterator<Item = &AppliedChange> {
        self.entries.iter()
    }

    /// Newest entry
    #[must_use]
    pub fn latest(&self) -> Option<&AppliedChange> {
        self.entries.back()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Revert the newest change
    ///
    /// The entry is removed only once its target has been restored; an undo
    /// that cannot resolve the target leaves history untouched.
    pub fn undo<T: LiveTree + ?Sized>(&mut self, tree: &mut T) -> UndoOutcome {
        let Some(latest) = self.entries.back() else {
            return UndoOutcome::failure("Nothing to undo");
        };

        let target = match tree.query_all(latest.target.as_str()) {
            Ok(matches) => matches.first().copied(),
            Err(err) => {
                tracing::warn!(target = %latest.target, error = %err, "undo selector unusable");
                None
            }
        };
        let Some(target) = target else {
            return UndoOutcome::failure(format!(
                "Cannot undo: {} is no longer on the page",
                latest.target
            ));
        };

        if let Err(err) =
            MutationApplier.restore(tree, target, &latest.previous_state, &latest.breakdown)
        {
            tracing::warn!(target = %latest.target, error = %err, "undo failed");
            return UndoOutcome::failure(format!("Cannot undo: {err}"));
        }

        let change = self.entries.pop_back();
        let (count, selector) = change
            .as_ref()
            .map(|c| (c.breakdown.applied.len(), c.target.to_string()))
            .unwrap_or_default();
        tracing::info!(target = %selector, properties = count, "change reverted");
        UndoOutcome {
            success: true,
            message: format!(
                "Reverted {count} {} on {selector}",
                if count == 1 { "property" } else { "properties" }
            ),
            change,
        }
    }

    /// Human-readable changelog, oldest first
    #[must_use]
    pub fn export_changelog(&self) -> String {
        let mut out = format!("Style change history ({} entries)\n", self.entries.len());
        for (index, change) in self.entries.iter().enumerate() {
            let _ = writeln!(
                out,
                "\n[{}] {}  {}  \"{}\"",
                index + 1,
                change.timestamp.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
                change.target,
                change.command
            );
            for (property, applied) in &change.breakdown.applied {
                let previous = if applied.previous.is_empty() {
                    "(none)"
                } else {
                    applied.previous.as_str()
                };
                let _ = writeln!(out, "    {property}: {previous} -> {}", applied.new);
            }
            for (property, failed) in &change.breakdown.failed {
                let _ = writeln!(
                    out,
                    "    {property}: {} not applied ({})",
                    failed.attempted, failed.reason
                );
            }
        }
        out
    }
}

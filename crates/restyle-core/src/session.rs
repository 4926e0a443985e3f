//! The command pipeline
//!
//! A [`StyleSession`] owns the live tree and every collaborator, and runs a
//! natural-language command end to end: selection, interpretation (with
//! retry), parsing, validation, application, history and notification.
//! Every failure is routed through the [`ErrorHandler`] so the caller always
//! gets a user message and suggestions, and no target is ever left with an
//! applied but unrecorded change.

use crate::applier::MutationApplier;
use crate::config::RestyleConfig;
use crate::error::{ErrorType, RestyleError};
use crate::events::{Notifier, OperationEvent};
use crate::history::{AppliedChange, HistoryManager, UndoOutcome};
use crate::interpreter::{
    parse_mutation_request, InterpretRequest, Interpreter, MutationRequest, TargetDescription,
};
use crate::recovery::{ErrorContext, ErrorHandler, ErrorResolution, Recovery};
use crate::resolver::{Activation, ResolverRegistry, SelectorPath, TargetResolver};
use crate::retry::{OperationType, RetryOrchestrator};
use restyle_dom::{LiveTree, NodeHandle};
use restyle_schema::{StyleValidator, Styles};
use serde_json::json;
use std::time::Duration;

const MUTATION: &str = "style-mutation";
const UNDO: &str = "undo";

/// Result of one command
#[derive(Debug, Clone, PartialEq)]
pub struct CommandOutcome {
    pub success: bool,
    /// User-facing summary
    pub message: String,
    /// Changes recorded by this command
    pub changes: Vec<AppliedChange>,
    /// Change reverted by an `undo` command
    pub reverted: Option<AppliedChange>,
    /// Rejected properties and targets that could not be updated
    pub diagnostics: Vec<String>,
    pub suggestions: Vec<String>,
    /// Failure class, when the command failed
    pub error_type: Option<ErrorType>,
    pub can_retry: bool,
    /// Wait already observed before a retry is worthwhile
    pub retry_after: Option<Duration>,
}

impl CommandOutcome {
    fn failure(message: impl Into<String>, suggestions: Vec<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            changes: Vec::new(),
            reverted: None,
            diagnostics: Vec::new(),
            suggestions,
            error_type: None,
            can_retry: false,
            retry_after: None,
        }
    }

    fn from_resolution(resolution: ErrorResolution, diagnostics: Vec<String>) -> Self {
        Self {
            success: false,
            message: resolution.user_message,
            changes: Vec::new(),
            reverted: None,
            diagnostics,
            suggestions: resolution.suggestions,
            error_type: Some(resolution.error_type),
            can_retry: resolution.can_retry,
            retry_after: match resolution.recovery {
                Some(Recovery::RetryAfter(delay)) => Some(delay),
                _ => None,
            },
        }
    }

    fn from_undo(outcome: UndoOutcome) -> Self {
        Self {
            success: outcome.success,
            message: outcome.message,
            changes: Vec::new(),
            reverted: outcome.change,
            diagnostics: Vec::new(),
            suggestions: Vec::new(),
            error_type: None,
            can_retry: false,
            retry_after: None,
        }
    }
}

/// One editing session over a live tree
pub struct StyleSession<T: LiveTree, I: Interpreter> {
    tree: T,
    interpreter: I,
    registry: ResolverRegistry,
    history: HistoryManager,
    retry: RetryOrchestrator,
    errors: ErrorHandler,
    notifier: Notifier,
}

impl<T: LiveTree, I: Interpreter> std::fmt::Debug for StyleSession<T, I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StyleSession")
            .field("registry", &self.registry)
            .field("history", &self.history.len())
            .finish_non_exhaustive()
    }
}

impl<T: LiveTree, I: Interpreter> StyleSession<T, I> {
    /// New session with a fresh active resolver
    pub fn new(mut tree: T, interpreter: I, config: &RestyleConfig) -> Self {
        let mut registry = ResolverRegistry::new();
        registry.activate(&mut tree, TargetResolver::new());
        Self {
            tree,
            interpreter,
            registry,
            history: HistoryManager::new(config.history_capacity),
            retry: RetryOrchestrator::new(&config.retry),
            errors: ErrorHandler::new(config.recovery.clone(), config.alerts.clone()),
            notifier: Notifier::default(),
        }
    }

    /// With a pre-built retry orchestrator
    #[must_use]
    pub fn with_retry(mut self, retry: RetryOrchestrator) -> Self {
        self.retry = retry;
        self
    }

    /// With a pre-built error handler
    #[must_use]
    pub fn with_error_handler(mut self, errors: ErrorHandler) -> Self {
        self.errors = errors;
        self
    }

    pub fn tree(&self) -> &T {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut T {
        &mut self.tree
    }

    /// Consume the session, returning the tree
    pub fn into_tree(self) -> T {
        self.tree
    }

    pub fn interpreter(&self) -> &I {
        &self.interpreter
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    pub fn error_handler(&self) -> &ErrorHandler {
        &self.errors
    }

    pub fn retry(&self) -> &RetryOrchestrator {
        &self.retry
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn registry(&self) -> &ResolverRegistry {
        &self.registry
    }

    /// Make `resolver` the active resolver
    pub fn activate(&mut self, resolver: TargetResolver) -> Activation {
        self.registry.activate(&mut self.tree, resolver)
    }

    /// Currently selected elements
    pub fn selection(&self) -> Vec<NodeHandle> {
        self.registry
            .active()
            .map(TargetResolver::selection)
            .unwrap_or_default()
    }

    /// Add an element to the selection
    ///
    /// # Errors
    /// Returns [`RestyleError::Execution`] for non-element or detached nodes.
    pub fn select(&mut self, node: NodeHandle) -> Result<bool, RestyleError> {
        let resolver = self.registry.ensure_active(&mut self.tree);
        Ok(resolver.add(&mut self.tree, node)?)
    }

    /// Flip an element's membership in the selection
    ///
    /// # Errors
    /// Returns [`RestyleError::Execution`] when adding an invalid node.
    pub fn toggle(&mut self, node: NodeHandle) -> Result<bool, RestyleError> {
        let resolver = self.registry.ensure_active(&mut self.tree);
        Ok(resolver.toggle(&mut self.tree, node)?)
    }

    /// Remove an element from the selection
    pub fn deselect(&mut self, node: NodeHandle) -> bool {
        match self.registry.active_mut() {
            Some(resolver) => resolver.remove(&mut self.tree, node),
            None => false,
        }
    }

    /// Empty the selection
    pub fn clear_selection(&mut self) {
        if let Some(resolver) = self.registry.active_mut() {
            resolver.clear(&mut self.tree);
        }
    }

    /// Resolve selector paths and select every match
    ///
    /// Returns the handles that matched.
    pub fn select_paths<S: AsRef<str>>(&mut self, paths: &[S]) -> Vec<NodeHandle> {
        let resolver = self.registry.ensure_active(&mut self.tree);
        let found = resolver.resolve(&self.tree, paths);
        for node in &found {
            if let Err(err) = resolver.add(&mut self.tree, *node) {
                tracing::debug!(%node, error = %err, "resolved node not selectable");
            }
        }
        found
    }

    /// Revert the newest recorded change
    pub fn undo(&mut self) -> UndoOutcome {
        self.notifier
            .publish(OperationEvent::started(UNDO, "Undo the last change"));
        let outcome = self.history.undo(&mut self.tree);
        let event = if outcome.success {
            let mut event = OperationEvent::succeeded(UNDO, &outcome.message);
            if let Some(change) = &outcome.change {
                event = event.with_target(change.target.as_str());
            }
            event
        } else {
            OperationEvent::failed(UNDO, "Undo the last change", outcome.message.clone())
        };
        self.notifier.publish(event);
        outcome
    }

    /// Human-readable changelog of recorded changes
    pub fn history_changelog(&self) -> String {
        self.history.export_changelog()
    }

    /// Run one command end to end
    ///
    /// The selection is cleared once a mutation command completes, whether
    /// it succeeded or not.
    pub async fn process_command(&mut self, command: &str) -> CommandOutcome {
        let command = command.trim();
        if command.eq_ignore_ascii_case("undo") {
            return CommandOutcome::from_undo(self.undo());
        }
        if command.is_empty() {
            return CommandOutcome::failure(
                "Describe the change you'd like to make.",
                vec!["For example: \"make the heading navy blue\"".into()],
            );
        }
        let outcome = self.mutate(command).await;
        self.clear_selection();
        outcome
    }

    async fn mutate(&mut self, command: &str) -> CommandOutcome {
        let (targets, paths) = self.fresh_selectors();
        if targets.is_empty() {
            return CommandOutcome::failure(
                "Select an element first.",
                vec!["Click an element on the page, then describe the change".into()],
            );
        }
        let summary = paths
            .iter()
            .map(SelectorPath::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        tracing::info!(command, targets = %summary, "processing command");
        self.notifier
            .publish(OperationEvent::started(MUTATION, command).with_target(summary.clone()));

        let request = InterpretRequest {
            command: command.to_string(),
            targets: targets
                .iter()
                .zip(&paths)
                .map(|(node, path)| TargetDescription::describe(&self.tree, *node, path.clone()))
                .collect(),
        };
        let interpreter = &self.interpreter;
        let request = &request;
        let outcome = self
            .retry
            .execute_with_retry(OperationType::Network, "interpret", |_| {
                interpreter.interpret(request)
            })
            .await;
        let raw = match outcome.result {
            Ok(raw) => {
                self.errors.succeeded("interpret");
                raw
            }
            Err(error) => {
                let context = ErrorContext::new("interpret")
                    .with_command(command)
                    .with_selector(summary.clone());
                let resolution = self.errors.handle(&error, &context, &self.tree).await;
                return self.fail(command, &summary, resolution, Vec::new());
            }
        };

        let mutation = match parse_mutation_request(&raw) {
            Ok(mutation) => mutation,
            Err(error) => {
                let context = ErrorContext::new("parse")
                    .with_command(command)
                    .with_payload(raw.clone());
                let resolution = self.errors.handle(&error, &context, &self.tree).await;
                match &resolution.recovery {
                    Some(Recovery::Request(recovered)) => recovered.clone(),
                    _ => return self.fail(command, &summary, resolution, Vec::new()),
                }
            }
        };

        let (styles, mut diagnostics) = match self.validated_styles(command, &mutation).await {
            Ok(valid) => valid,
            Err((resolution, diagnostics)) => {
                return self.fail(command, &summary, resolution, diagnostics)
            }
        };

        let mut changes = Vec::new();
        let mut suggestions = Vec::new();
        for (node, path) in targets.into_iter().zip(paths) {
            let (node, path) = if self.tree.is_connected(node) {
                (node, path)
            } else {
                match self.relocate(command, &path).await {
                    Ok(found) => found,
                    Err(resolution) => {
                        diagnostics.push(format!("{path}: {}", resolution.user_message));
                        suggestions.extend(resolution.suggestions);
                        continue;
                    }
                }
            };

            let snapshot = MutationApplier.capture_state(&self.tree, node);
            let breakdown = MutationApplier.apply(&mut self.tree, node, &styles);
            for (property, failed) in &breakdown.failed {
                diagnostics.push(format!("{path}: {property} was not applied ({})", failed.reason));
            }
            if breakdown.has_applied() {
                let change = AppliedChange::new(path, command, mutation.clone(), snapshot, breakdown);
                self.history.record(change.clone());
                changes.push(change);
            }
        }

        if changes.is_empty() {
            let error = RestyleError::Execution("no property took effect on any target".into());
            let context = ErrorContext::new("apply").with_command(command);
            let mut resolution = self.errors.handle(&error, &context, &self.tree).await;
            resolution.suggestions.extend(suggestions);
            return self.fail(command, &summary, resolution, diagnostics);
        }

        self.errors.succeeded("apply");
        let applied: usize = changes.iter().map(|c| c.breakdown.applied.len()).sum();
        self.notifier.publish(
            OperationEvent::succeeded(MUTATION, command)
                .with_target(summary)
                .with_result(json!({
                    "changes": changes.len(),
                    "properties": applied,
                    "diagnostics": diagnostics.len(),
                })),
        );
        let message = if mutation.explanation.trim().is_empty() {
            format!(
                "Updated {applied} {} on {} {}.",
                if applied == 1 { "property" } else { "properties" },
                changes.len(),
                if changes.len() == 1 { "element" } else { "elements" }
            )
        } else {
            mutation.explanation.trim().to_string()
        };
        CommandOutcome {
            success: true,
            message,
            changes,
            reverted: None,
            diagnostics,
            suggestions,
            error_type: None,
            can_retry: false,
            retry_after: None,
        }
    }

    fn fresh_selectors(&self) -> (Vec<NodeHandle>, Vec<SelectorPath>) {
        let Some(resolver) = self.registry.active() else {
            return (Vec::new(), Vec::new());
        };
        let targets = resolver.selection();
        let paths = targets
            .iter()
            .map(|node| {
                if self.tree.is_connected(*node) {
                    resolver.generate_selector(&self.tree, *node)
                } else {
                    resolver.describe_selector(&self.tree, *node)
                }
            })
            .collect();
        (targets, paths)
    }

    async fn validated_styles(
        &mut self,
        command: &str,
        mutation: &MutationRequest,
    ) -> Result<(Styles, Vec<String>), (ErrorResolution, Vec<String>)> {
        let report = StyleValidator.normalize_and_validate(&mutation.styles);
        if !report.valid.is_empty() {
            return Ok((report.valid, report.errors));
        }
        let detail = if report.errors.is_empty() {
            "no style properties in request".to_string()
        } else {
            report.errors.join("; ")
        };
        let error = RestyleError::Validation(detail);
        let context = ErrorContext::new("validate").with_command(command);
        let resolution = self.errors.handle(&error, &context, &self.tree).await;
        match &resolution.recovery {
            Some(Recovery::Styles(derived)) => Ok((derived.clone(), report.errors)),
            _ => Err((resolution, report.errors)),
        }
    }

    async fn relocate(
        &mut self,
        command: &str,
        path: &SelectorPath,
    ) -> Result<(NodeHandle, SelectorPath), ErrorResolution> {
        let error = RestyleError::target_not_found(path.as_str());
        let context = ErrorContext::new("apply")
            .with_selector(path.as_str())
            .with_command(command);
        let resolution = self.errors.handle(&error, &context, &self.tree).await;
        match &resolution.recovery {
            Some(Recovery::Selector { selector, matches }) if !matches.is_empty() => {
                Ok((matches[0], SelectorPath::new(selector.clone())))
            }
            _ => Err(resolution),
        }
    }

    fn fail(
        &self,
        command: &str,
        summary: &str,
        resolution: ErrorResolution,
        diagnostics: Vec<String>,
    ) -> CommandOutcome {
        self.notifier.publish(
            OperationEvent::failed(MUTATION, command, resolution.technical_message.clone())
                .with_target(summary),
        );
        CommandOutcome::from_resolution(resolution, diagnostics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventPhase;
    use crate::interpreter::StaticInterpreter;
    use pretty_assertions::assert_eq;
    use restyle_dom::MemoryTree;

    fn session(response: &str) -> (StyleSession<MemoryTree, StaticInterpreter>, NodeHandle) {
        let mut tree = MemoryTree::new();
        let body = tree.append_element(tree.document(), "body");
        let hero = tree.append_element(body, "h1");
        tree.set_id(hero, "hero");
        tree.set_style_text(hero, Some("color: red;")).unwrap();
        let session = StyleSession::new(tree, StaticInterpreter::new(response), &RestyleConfig::default());
        (session, hero)
    }

    #[tokio::test]
    async fn requires_a_selection() {
        let (mut session, _) = session("{}");
        let outcome = session.process_command("make it blue").await;
        assert!(!outcome.success);
        assert_eq!(outcome.message, "Select an element first.");
        assert!(!outcome.suggestions.is_empty());
    }

    #[tokio::test]
    async fn applies_records_and_clears_selection() {
        let (mut session, hero) = session(r#"{"styles": {"color": "blue"}, "explanation": "Made it blue"}"#);
        let mut events = session.notifier().subscribe();
        assert!(session.select(hero).unwrap());

        let outcome = session.process_command("make it blue").await;
        assert!(outcome.success, "{outcome:?}");
        assert_eq!(outcome.message, "Made it blue");
        assert_eq!(outcome.changes.len(), 1);
        assert_eq!(outcome.changes[0].target.as_str(), "#hero");
        assert_eq!(session.tree().own_property(hero, "color").unwrap().as_deref(), Some("blue"));
        assert_eq!(session.history().len(), 1);
        assert!(session.selection().is_empty());
        assert!(!session.tree().has_indicator(hero));

        assert_eq!(events.recv().await.unwrap().phase, EventPhase::Started);
        assert_eq!(events.recv().await.unwrap().phase, EventPhase::Succeeded);
    }

    #[tokio::test]
    async fn undo_command_bypasses_interpretation() {
        let (mut session, hero) = session(r#"{"styles": {"color": "blue"}}"#);
        session.select(hero).unwrap();
        session.process_command("make it blue").await;

        let outcome = session.process_command("  UNDO ").await;
        assert!(outcome.success);
        assert!(outcome.reverted.is_some());
        assert_eq!(session.tree().style_text(hero).unwrap().as_deref(), Some("color: red;"));
    }

    #[tokio::test]
    async fn empty_validation_falls_back_to_command_text() {
        let (mut session, hero) = session(r#"{"styles": {"sparkle": "max"}}"#);
        session.select(hero).unwrap();
        let outcome = session.process_command("make it bold").await;
        assert!(outcome.success, "{outcome:?}");
        assert_eq!(session.tree().own_property(hero, "font-weight").unwrap().as_deref(), Some("bold"));
        assert_eq!(outcome.diagnostics, vec!["Invalid CSS property: sparkle".to_string()]);
    }

    #[tokio::test]
    async fn nothing_valid_fails_with_diagnostics() {
        let (mut session, hero) = session(r#"{"styles": {"sparkle": "max"}}"#);
        session.select(hero).unwrap();
        let outcome = session.process_command("do something nice").await;
        assert!(!outcome.success);
        assert_eq!(outcome.error_type, Some(ErrorType::ValidationError));
        assert_eq!(outcome.diagnostics.len(), 1);
        assert_eq!(session.history().len(), 0);
        assert!(session.selection().is_empty());
        assert!(!session.tree().has_indicator(hero));
    }

    #[tokio::test]
    async fn engine_rejections_become_diagnostics() {
        let (mut session, hero) = session(r#"{"styles": {"color": "blue", "cursor": "pointer"}}"#);
        session.tree_mut().ignore_property("cursor");
        session.select(hero).unwrap();
        let outcome = session.process_command("blue pointer").await;
        assert!(outcome.success);
        assert_eq!(outcome.diagnostics.len(), 1);
        assert!(outcome.diagnostics[0].contains("cursor was not applied"));
    }
}

//! Restyle Core - live style mutation
//!
//! Turns a natural-language command about selected page elements into a
//! verified, reversible style mutation:
//! - Tracks the selection and produces stable selectors for it
//! - Parses and validates interpreter responses against the schema
//! - Applies properties with verify-after-write
//! - Records every change with enough state to undo it exactly
//! - Retries transient failures with adaptive backoff
//! - Classifies failures and attempts bounded recovery
//!
//! # Example
//!
//! ```rust,ignore
//! use restyle_core::{RestyleConfig, StaticInterpreter, StyleSession};
//! use restyle_dom::MemoryTree;
//!
//! # async fn example() {
//! let mut tree = MemoryTree::new();
//! let body = tree.append_element(tree.document(), "body");
//! let hero = tree.append_element(body, "h1");
//!
//! let interpreter = StaticInterpreter::new(r#"{"styles": {"color": "navy"}}"#);
//! let mut session = StyleSession::new(tree, interpreter, &RestyleConfig::default());
//! session.select(hero).unwrap();
//!
//! let outcome = session.process_command("make the heading navy").await;
//! assert!(outcome.success);
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod alerts;
pub mod applier;
pub mod classifier;
pub mod config;
pub mod error;
pub mod events;
pub mod history;
pub mod interpreter;
pub mod recovery;
pub mod resolver;
pub mod retry;
pub mod session;

pub use alerts::{ErrorLog, ErrorRecord, PatternAlert};
pub use applier::{
    AppliedProperty, ApplyBreakdown, FailedProperty, MutationApplier, StateSnapshot,
    REJECTED_BY_ENGINE,
};
pub use classifier::{Classification, ClassificationRule, ErrorClassifier};
pub use config::{
    AlertSettings, PolicyOverride, PolicyOverrides, RecoverySettings, RestyleConfig,
    RetrySettings,
};
pub use error::{ConfigError, ErrorType, RestyleError};
pub use events::{EventPhase, Notifier, OperationEvent};
pub use history::{AppliedChange, ChangeId, HistoryManager, UndoOutcome};
pub use interpreter::{
    parse_mutation_request, InterpretRequest, Interpreter, MutationRequest, StaticInterpreter,
    TargetDescription,
};
pub use recovery::{ErrorContext, ErrorHandler, ErrorResolution, Recovery};
pub use resolver::{Activation, ResolverId, ResolverRegistry, SelectorPath, TargetResolver};
pub use retry::{
    EnvironmentEstimate, ErrorRateLevel, LatencyLevel, OperationType, RetryContext,
    RetryOrchestrator, RetryOutcome, RetryPolicy, RetryState,
};
pub use session::{CommandOutcome, StyleSession};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for driving a session
    pub use crate::{
        CommandOutcome, ErrorType, Interpreter, OperationEvent, RestyleConfig, RestyleError,
        SelectorPath, StaticInterpreter, StyleSession,
    };
    pub use restyle_dom::{LiveTree, MemoryTree, NodeHandle};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

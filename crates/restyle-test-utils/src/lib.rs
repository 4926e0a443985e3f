//! Testing utilities for the restyle workspace
//!
//! Shared fixtures: a small sample page, a scripted interpreter and a
//! flaky operation for retry tests.

#![allow(missing_docs)]

use async_trait::async_trait;
use restyle_core::{InterpretRequest, Interpreter, RestyleConfig, RestyleError, StyleSession};
use restyle_dom::{LiveTree, MemoryTree, NodeHandle};
use restyle_schema::Styles;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

/// Handles to the interesting elements of the sample page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageHandles {
    pub body: NodeHandle,
    /// `h1#hero.title` with own style `color: red;`
    pub hero: NodeHandle,
    /// The three `li.item` entries of the nav list
    pub items: Vec<NodeHandle>,
    /// `button.btn.btn-primary` in the first card
    pub primary_button: NodeHandle,
    /// `button.btn` in the second card
    pub secondary_button: NodeHandle,
}

/// Build the sample page
///
/// ```text
/// body                         (color: black; font-size: 16px)
///   header#site-header
///     h1#hero.title            "Welcome"  style="color: red;"
///     nav > ul > li.item x3
///   main
///     section.card > p, button.btn.btn-primary
///     section.card > p, button.btn
/// ```
#[must_use]
pub fn sample_page() -> (MemoryTree, PageHandles) {
    let mut tree = MemoryTree::new();
    let body = tree.append_element(tree.document(), "body");
    tree.set_cascaded(body, "color", "black");
    tree.set_cascaded(body, "font-size", "16px");

    let header = tree.append_element(body, "header");
    tree.set_id(header, "site-header");
    let hero = tree.append_element(header, "h1");
    tree.set_id(hero, "hero");
    tree.add_class(hero, "title");
    tree.append_text(hero, "Welcome");
    tree.set_style_text(hero, Some("color: red;"))
        .expect("hero is an attached element");

    let nav = tree.append_element(header, "nav");
    let list = tree.append_element(nav, "ul");
    let items = (1..=3)
        .map(|i| {
            let item = tree.append_element(list, "li");
            tree.add_class(item, "item");
            tree.append_text(item, &format!("Item {i}"));
            item
        })
        .collect();

    let main = tree.append_element(body, "main");
    let mut buttons = Vec::new();
    for primary in [true, false] {
        let card = tree.append_element(main, "section");
        tree.add_class(card, "card");
        let text = tree.append_element(card, "p");
        tree.append_text(text, "Card body");
        let button = tree.append_element(card, "button");
        tree.add_class(button, "btn");
        if primary {
            tree.add_class(button, "btn-primary");
        }
        buttons.push(button);
    }

    let handles = PageHandles {
        body,
        hero,
        items,
        primary_button: buttons[0],
        secondary_button: buttons[1],
    };
    (tree, handles)
}

/// Interpreter that replays a queue of responses
///
/// Once the queue is drained every further call fails with a
/// [`RestyleError::Other`].
#[derive(Debug, Default)]
pub struct ScriptedInterpreter {
    script: Mutex<VecDeque<Result<String, RestyleError>>>,
    requests: Mutex<Vec<InterpretRequest>>,
}

impl ScriptedInterpreter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful response
    #[must_use]
    pub fn respond(self, response: impl Into<String>) -> Self {
        self.push(Ok(response.into()));
        self
    }

    /// Queue a failure
    #[must_use]
    pub fn fail(self, error: RestyleError) -> Self {
        self.push(Err(error));
        self
    }

    /// Queue the same failure `times` times
    #[must_use]
    pub fn fail_times(self, error: &RestyleError, times: usize) -> Self {
        for _ in 0..times {
            self.push(Err(error.clone()));
        }
        self
    }

    fn push(&self, entry: Result<String, RestyleError>) {
        self.script.lock().expect("script lock").push_back(entry);
    }

    /// Requests seen so far
    pub fn requests(&self) -> Vec<InterpretRequest> {
        self.requests.lock().expect("request lock").clone()
    }

    /// Number of interpret calls so far
    pub fn calls(&self) -> usize {
        self.requests.lock().expect("request lock").len()
    }

    /// Entries not yet consumed
    pub fn remaining(&self) -> usize {
        self.script.lock().expect("script lock").len()
    }
}

#[async_trait]
impl Interpreter for ScriptedInterpreter {
    async fn interpret(&self, request: &InterpretRequest) -> Result<String, RestyleError> {
        self.requests.lock().expect("request lock").push(request.clone());
        self.script
            .lock()
            .expect("script lock")
            .pop_front()
            .unwrap_or_else(|| Err(RestyleError::Other("interpreter script exhausted".into())))
    }
}

/// Operation that fails a fixed number of times before succeeding
#[derive(Debug)]
pub struct FlakyOperation {
    failures: u32,
    error: RestyleError,
    calls: AtomicU32,
}

impl FlakyOperation {
    #[must_use]
    pub fn new(failures: u32, error: RestyleError) -> Self {
        Self {
            failures,
            error,
            calls: AtomicU32::new(0),
        }
    }

    /// Fails forever
    #[must_use]
    pub fn always(error: RestyleError) -> Self {
        Self::new(u32::MAX, error)
    }

    /// One invocation; returns the 1-based call number on success
    ///
    /// # Errors
    /// Returns the configured error for the first `failures` calls.
    pub fn call(&self) -> Result<u32, RestyleError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call <= self.failures {
            Err(self.error.clone())
        } else {
            Ok(call)
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

/// Style map from literal pairs
#[must_use]
pub fn styles(pairs: &[(&str, &str)]) -> Styles {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

/// Session over the sample page with default configuration
#[must_use]
pub fn sample_session<I: Interpreter>(interpreter: I) -> (StyleSession<MemoryTree, I>, PageHandles) {
    let (tree, handles) = sample_page();
    (
        StyleSession::new(tree, interpreter, &RestyleConfig::default()),
        handles,
    )
}

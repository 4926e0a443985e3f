//! Bounded error log with pattern alerts
//!
//! Two patterns are watched: the same message repeating within a window,
//! and a burst of distinct messages within a shorter window. Alerts are
//! observability only and never change control flow.

use crate::config::AlertSettings;
use crate::error::ErrorType;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{HashSet, VecDeque};
use std::time::Duration;
use tokio::time::Instant;

/// One logged error
#[derive(Debug, Clone, Serialize)]
pub struct ErrorRecord {
    pub timestamp: DateTime<Utc>,
    pub error_type: ErrorType,
    pub message: String,
    /// Operation that raised it
    pub operation: String,
    #[serde(skip)]
    at: Instant,
}

impl ErrorRecord {
    #[must_use]
    pub fn new(error_type: ErrorType, message: impl Into<String>, operation: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            error_type,
            message: message.into(),
            operation: operation.into(),
            at: Instant::now(),
        }
    }
}

/// Detected error pattern
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "pattern", rename_all = "snake_case")]
pub enum PatternAlert {
    /// Same message seen `count` times within the repeat window
    Repeated { message: String, count: usize },
    /// `distinct` different messages within the burst window
    Burst { distinct: usize },
}

/// Bounded log of recent errors
#[derive(Debug, Clone)]
pub struct ErrorLog {
    records: VecDeque<ErrorRecord>,
    alerts: VecDeque<PatternAlert>,
    settings: AlertSettings,
}

impl Default for ErrorLog {
    fn default() -> Self {
        Self::new(AlertSettings::default())
    }
}

impl ErrorLog {
    #[must_use]
    pub fn new(settings: AlertSettings) -> Self {
        Self {
            records: VecDeque::new(),
            alerts: VecDeque::new(),
            settings,
        }
    }

    /// Append a record and return any alert it triggers
    ///
    /// Each alert fires once, when its threshold is first reached.
    pub fn record(&mut self, record: ErrorRecord) -> Vec<PatternAlert> {
        let now = record.at;
        let message = record.message.clone();
        self.records.push_back(record);
        while self.records.len() > self.settings.log_capacity.max(1) {
            self.records.pop_front();
        }

        let mut raised = Vec::new();
        let repeat_window = Duration::from_secs(self.settings.repeat_window_secs);
        let repeats = self
            .within(now, repeat_window)
            .filter(|r| r.message == message)
            .count();
        if repeats == self.settings.repeat_threshold {
            raised.push(PatternAlert::Repeated {
                message,
                count: repeats,
            });
        }

        let burst_window = Duration::from_secs(self.settings.burst_window_secs);
        let distinct = self
            .within(now, burst_window)
            .map(|r| r.message.as_str())
            .collect::<HashSet<&str>>()
            .len();
        let newest_is_new = self
            .within(now, burst_window)
            .filter(|r| self.records.back().is_some_and(|last| last.message == r.message))
            .count()
            == 1;
        if distinct == self.settings.burst_threshold && newest_is_new {
            raised.push(PatternAlert::Burst { distinct });
        }

        for alert in &raised {
            match alert {
                PatternAlert::Repeated { message, count } => {
                    tracing::warn!(%message, count, "error pattern: repeated failure");
                }
                PatternAlert::Burst { distinct } => {
                    tracing::warn!(distinct, "error pattern: burst of distinct failures");
                }
            }
            self.alerts.push_back(alert.clone());
            while self.alerts.len() > self.settings.log_capacity.max(1) {
                self.alerts.pop_front();
            }
        }
        raised
    }

    fn within(&self, now: Instant, window: Duration) -> impl Iterator<Item = &ErrorRecord> {
        self.records
            .iter()
            .filter(move |r| now.saturating_duration_since(r.at) <= window)
    }

    /// Logged records, oldest first
    pub fn records(&self) -> impl Iterator<Item = &ErrorRecord> {
        self.records.iter()
    }

    /// Alerts raised so far, oldest first
    pub fn alerts(&self) -> impl Iterator<Item = &PatternAlert> {
        self.alerts.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

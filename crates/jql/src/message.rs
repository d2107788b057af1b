//! Validation message accumulation.
//!
//! Validation of user-supplied values never fails with an error; instead it
//! collects messages into a [`MessageSet`] and lets the caller decide whether
//! to abort.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Severity of a validation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageLevel {
    /// The query cannot be executed as written.
    Error,
    /// The query can run but may not do what the user expects.
    Warning,
}

impl fmt::Display for MessageLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageLevel::Error => write!(f, "error"),
            MessageLevel::Warning => write!(f, "warning"),
        }
    }
}

/// An insertion-ordered, de-duplicated set of errors and warnings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageSet {
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl MessageSet {
    /// Creates an empty message set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a message set holding a single error.
    pub fn with_error(message: impl Into<String>) -> Self {
        let mut set = Self::new();
        set.add_error(message);
        set
    }

    /// Adds an error message, ignoring duplicates.
    pub fn add_error(&mut self, message: impl Into<String>) {
        push_unique(&mut self.errors, message.into());
    }

    /// Adds a warning message, ignoring duplicates.
    pub fn add_warning(&mut self, message: impl Into<String>) {
        push_unique(&mut self.warnings, message.into());
    }

    /// Adds a message at the given level.
    pub fn add(&mut self, level: MessageLevel, message: impl Into<String>) {
        match level {
            MessageLevel::Error => self.add_error(message),
            MessageLevel::Warning => self.add_warning(message),
        }
    }

    /// Merges all messages of `other` into this set.
    pub fn add_message_set(&mut self, other: &MessageSet) {
        for error in &other.errors {
            push_unique(&mut self.errors, error.clone());
        }
        for warning in &other.warnings {
            push_unique(&mut self.warnings, warning.clone());
        }
    }

    /// Returns the error messages in insertion order.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Returns the warning messages in insertion order.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Returns `true` if any error was recorded.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Returns `true` if any warning was recorded.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Returns `true` if no messages were recorded.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }
}

fn push_unique(messages: &mut Vec<String>, message: String) {
    if !messages.contains(&message) {
        messages.push(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deduplicates_in_order() {
        let mut set = MessageSet::new();
        set.add_error("b");
        set.add_error("a");
        set.add_error("b");
        set.add(MessageLevel::Warning, "w");
        assert_eq!(set.errors(), &["b".to_string(), "a".to_string()]);
        assert_eq!(set.warnings(), &["w".to_string()]);
        assert!(set.has_errors());
        assert!(set.has_warnings());
    }

    #[test]
    fn test_merge() {
        let mut left = MessageSet::with_error("x");
        let mut right = MessageSet::with_error("x");
        right.add_warning("careful");
        left.add_message_set(&right);
        assert_eq!(left.errors().len(), 1);
        assert_eq!(left.warnings().len(), 1);
        assert!(!left.is_empty());
        assert!(MessageSet::new().is_empty());
    }
}

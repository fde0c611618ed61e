//! Warnings and errors raised while reconciling and comparing documents.
//!
//! Data problems never surface as Rust errors. They are collected as
//! [`Finding`]s so a test case always runs to completion and the caller
//! decides how to present them.
use std::fmt;

use serde::Serialize;

/// How serious a finding is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// A mismatch or missing required structure. Fails the run.
    Error,
    /// Missing optional data, extra data, unmatched objects.
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => f.write_str("Error"),
            Self::Warning => f.write_str("Warning"),
        }
    }
}

/// One human-readable observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub severity: Severity,
    pub message: String,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.severity, self.message)
    }
}

/// Ordered accumulator of findings for one test case.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Findings {
    items: Vec<Finding>,
}

impl Findings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.push(Severity::Warning, message.into());
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(Severity::Error, message.into());
    }

    fn push(&mut self, severity: Severity, message: String) {
        self.items.push(Finding { severity, message });
    }

    /// Appends every finding of `other`, preserving order.
    pub fn extend(&mut self, other: Findings) {
        self.items.extend(other.items);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Finding> {
        self.items.iter()
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Finding> {
        self.items
            .iter()
            .filter(|f| f.severity == Severity::Warning)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Finding> {
        self.items.iter().filter(|f| f.severity == Severity::Error)
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings().count()
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

impl IntoIterator for Findings {
    type Item = Finding;
    type IntoIter = std::vec::IntoIter<Finding>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Warnings and errors keep insertion order and partition cleanly.
    #[test]
    fn test_partition() {
        let mut f = Findings::new();
        f.warn("w1");
        f.error("e1");
        f.warn("w2");
        assert_eq!(f.len(), 3);
        assert_eq!(f.warning_count(), 2);
        assert_eq!(f.error_count(), 1);
        assert!(f.has_errors());
        let warnings: Vec<&str> = f.warnings().map(|w| w.message.as_str()).collect();
        assert_eq!(warnings, vec!["w1", "w2"]);
    }

    /// Display prefixes the severity.
    #[test]
    fn test_display() {
        let finding = Finding {
            severity: Severity::Error,
            message: "boom".to_owned(),
        };
        assert_eq!(finding.to_string(), "[Error] boom");
    }

    /// Extending preserves both sequences in order.
    #[test]
    fn test_extend() {
        let mut a = Findings::new();
        a.warn("a");
        let mut b = Findings::new();
        b.error("b");
        a.extend(b);
        let all: Vec<&str> = a.iter().map(|f| f.message.as_str()).collect();
        assert_eq!(all, vec!["a", "b"]);
        assert!(!a.is_empty());
    }
}

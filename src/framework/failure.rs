//! Failure records: immutable descriptions of one failed check.

use std::fmt;
use std::panic::Location;
use std::path::Path;

/// Description text used by every failed assertion.
pub const ASSERTION_FAILED: &str = "Assertion failed";
/// Description text used by explicit, message-only failures.
pub const CASE_FAILED: &str = "Case failed";
/// Description text used when an error escapes a case body.
pub const UNHANDLED_ERROR: &str = "Unhandled error";

/// Where a failing check was invoked from.
///
/// `scope` is the qualified case name rather than a function name; the
/// harness hands every body an explicit context, so the case is the most
/// precise enclosing scope available without walking stacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    file: Option<String>,
    scope: String,
    line: Option<u32>,
}

impl SourceLocation {
    /// Build a location from a `#[track_caller]` capture.
    #[must_use]
    pub fn from_caller(scope: impl Into<String>, caller: &Location<'_>) -> Self {
        let basename = Path::new(caller.file())
            .file_name()
            .map_or_else(|| caller.file().to_string(), |f| f.to_string_lossy().into_owned());
        Self {
            file: Some(basename),
            scope: scope.into(),
            line: Some(caller.line()),
        }
    }

    /// Degraded location carrying only the enclosing scope. Used when the
    /// failure surfaced outside any attributable call site (e.g. a panic
    /// caught at the case boundary).
    #[must_use]
    pub fn scope_only(scope: impl Into<String>) -> Self {
        Self {
            file: None,
            scope: scope.into(),
            line: None,
        }
    }

    /// Source file basename, when a call site was captured.
    #[must_use]
    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    /// Qualified case name the check ran under.
    #[must_use]
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Line number, when a call site was captured.
    #[must_use]
    pub const fn line(&self) -> Option<u32> {
        self.line
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.file, self.line) {
            (Some(file), Some(line)) => write!(f, "{file}!{} Line {line}", self.scope),
            (Some(file), None) => write!(f, "{file}!{}", self.scope),
            _ => write!(f, "{}", self.scope),
        }
    }
}

/// One failed check. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureRecord {
    description: String,
    expression: Option<String>,
    message: Option<String>,
    location: Option<SourceLocation>,
}

impl FailureRecord {
    /// Build a record; prefer the purpose-specific constructors below.
    #[must_use]
    pub fn new(
        description: impl Into<String>,
        expression: Option<String>,
        message: Option<String>,
        location: Option<SourceLocation>,
    ) -> Self {
        Self {
            description: description.into(),
            expression,
            message,
            location,
        }
    }

    /// Record for a failed assertion or expectation.
    #[must_use]
    pub fn assertion(expression: impl Into<String>, message: impl Into<String>, location: SourceLocation) -> Self {
        Self::new(
            ASSERTION_FAILED,
            Some(expression.into()),
            Some(message.into()),
            Some(location),
        )
    }

    /// Record for an explicit, message-only failure.
    #[must_use]
    pub fn explicit(message: impl Into<String>, location: SourceLocation) -> Self {
        Self::new(CASE_FAILED, None, Some(message.into()), Some(location))
    }

    /// Record for an error that escaped the case body.
    #[must_use]
    pub fn unhandled(message: impl Into<String>, location: Option<SourceLocation>) -> Self {
        Self::new(UNHANDLED_ERROR, None, Some(message.into()), location)
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn expression(&self) -> Option<&str> {
        self.expression.as_deref()
    }

    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    #[must_use]
    pub const fn location(&self) -> Option<&SourceLocation> {
        self.location.as_ref()
    }
}

impl fmt::Display for FailureRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at ", self.description)?;
        match &self.location {
            Some(location) => write!(f, "{location}")?,
            None => write!(f, "<unknown location>")?,
        }

        if self.expression.is_some() || self.message.is_some() {
            write!(f, "\n\t")?;
            if let Some(expression) = &self.expression {
                write!(f, "\"{expression}\"")?;
                if self.message.is_some() {
                    write!(f, " ")?;
                }
            }
            if let Some(message) = &self.message {
                write!(f, "{message}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn here() -> &'static Location<'static> {
        Location::caller()
    }

    #[test]
    fn caller_location_uses_basename_and_line() {
        let caller = here();
        let loc = SourceLocation::from_caller("Suite::Case", caller);
        assert_eq!(loc.file(), Some("failure.rs"));
        assert_eq!(loc.scope(), "Suite::Case");
        assert_eq!(loc.line(), Some(caller.line()));
        let rendered = loc.to_string();
        assert!(rendered.starts_with("failure.rs!Suite::Case Line "), "{rendered}");
    }

    #[test]
    fn scope_only_location_renders_bare_scope() {
        let loc = SourceLocation::scope_only("Suite::Case");
        assert_eq!(loc.to_string(), "Suite::Case");
    }

    #[test]
    fn assertion_record_renders_expression_and_message() {
        let loc = SourceLocation::from_caller("S::C", Location::caller());
        let record = FailureRecord::assertion("a == b", "values differ", loc);
        let rendered = record.to_string();
        assert!(rendered.starts_with("Assertion failed at failure.rs!S::C Line "));
        assert!(rendered.contains("\n\t\"a == b\" values differ"), "{rendered}");
    }

    #[test]
    fn explicit_record_omits_expression_segment() {
        let loc = SourceLocation::from_caller("S::C", Location::caller());
        let record = FailureRecord::explicit("bad trace", loc);
        let rendered = record.to_string();
        assert!(rendered.contains("\n\tbad trace"), "{rendered}");
        assert!(!rendered.contains('"'), "{rendered}");
    }

    #[test]
    fn unhandled_record_tolerates_missing_location() {
        let record = FailureRecord::unhandled("boom", None);
        let rendered = record.to_string();
        assert!(rendered.starts_with("Unhandled error at <unknown location>"), "{rendered}");
    }
}

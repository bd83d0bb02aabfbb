//! Glob patterns for case filters and artifact-file matching.
//!
//! Case names have no path semantics, so `*` crosses `::` freely; the same
//! translation serves file patterns, where the original artifacts are always
//! matched by full path string.

use regex::Regex;

use crate::core::errors::{HarnessError, Result};

/// The filter token selecting every registered case.
pub const MATCH_ALL: &str = "*";

/// A compiled shell-style glob: `*` matches any run of characters, `?`
/// matches exactly one. Anchored at both ends.
#[derive(Debug, Clone)]
pub struct GlobPattern {
    original: String,
    compiled: Regex,
}

impl GlobPattern {
    /// Compile a glob pattern.
    pub fn compile(pattern: &str) -> Result<Self> {
        let compiled = glob_to_regex(pattern)?;
        Ok(Self {
            original: pattern.to_string(),
            compiled,
        })
    }

    /// Original pattern text.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.original
    }

    /// Whether `text` matches the whole pattern.
    #[must_use]
    pub fn matches(&self, text: &str) -> bool {
        self.compiled.is_match(text)
    }
}

/// Filter over qualified `Suite::Case` names, with a fast path for `"*"`.
#[derive(Debug, Clone)]
pub struct CaseFilter {
    glob: Option<GlobPattern>,
    original: String,
}

impl CaseFilter {
    /// Compile a case filter. `"*"` selects the full view without compiling.
    pub fn compile(pattern: &str) -> Result<Self> {
        let glob = if pattern == MATCH_ALL {
            None
        } else {
            Some(GlobPattern::compile(pattern)?)
        };
        Ok(Self {
            glob,
            original: pattern.to_string(),
        })
    }

    /// Original pattern text.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.original
    }

    /// Whether this filter is the match-everything token.
    #[must_use]
    pub const fn is_match_all(&self) -> bool {
        self.glob.is_none()
    }

    /// Whether a qualified case name is selected.
    #[must_use]
    pub fn matches(&self, full_name: &str) -> bool {
        self.glob.as_ref().is_none_or(|glob| glob.matches(full_name))
    }
}

fn glob_to_regex(pattern: &str) -> Result<Regex> {
    let mut regex_str = String::with_capacity(pattern.len() * 2);
    regex_str.push('^');

    for c in pattern.chars() {
        match c {
            '*' => regex_str.push_str(".*"),
            '?' => regex_str.push('.'),
            '.' | '+' | '(' | ')' | '{' | '}' | '[' | ']' | '^' | '$' | '|' | '\\' => {
                regex_str.push('\\');
                regex_str.push(c);
            }
            _ => regex_str.push(c),
        }
    }

    regex_str.push('$');

    Regex::new(&regex_str).map_err(|err| HarnessError::InvalidFilter {
        pattern: pattern.to_string(),
        details: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn match_all_selects_everything() {
        let filter = CaseFilter::compile("*").expect("compile");
        assert!(filter.is_match_all());
        assert!(filter.matches("Profile::MinimalProfile"));
        assert!(filter.matches(""));
    }

    #[test]
    fn exact_name_matches_only_itself() {
        let filter = CaseFilter::compile("SuiteA::CaseX").expect("compile");
        assert!(filter.matches("SuiteA::CaseX"));
        assert!(!filter.matches("SuiteA::CaseXY"));
        assert!(!filter.matches("SuiteB::CaseX"));
    }

    #[test]
    fn star_crosses_the_suite_separator() {
        let filter = CaseFilter::compile("Suite*X").expect("compile");
        assert!(filter.matches("SuiteA::CaseX"));
    }

    #[test]
    fn suite_prefix_selects_all_its_cases() {
        let filter = CaseFilter::compile("CommandLine::*").expect("compile");
        assert!(filter.matches("CommandLine::Help"));
        assert!(filter.matches("CommandLine::NoArgs"));
        assert!(!filter.matches("Profile::Help"));
    }

    #[test]
    fn question_mark_matches_one_character() {
        let filter = CaseFilter::compile("S::Case?").expect("compile");
        assert!(filter.matches("S::Case1"));
        assert!(!filter.matches("S::Case"));
        assert!(!filter.matches("S::Case12"));
    }

    #[test]
    fn regex_metacharacters_are_literal() {
        let filter = CaseFilter::compile("S::Case(1)").expect("compile");
        assert!(filter.matches("S::Case(1)"));
        assert!(!filter.matches("S::Case1"));

        let dotted = GlobPattern::compile("out/test.etl").expect("compile");
        assert!(dotted.matches("out/test.etl"));
        assert!(!dotted.matches("out/testXetl"));
    }

    #[test]
    fn file_patterns_match_full_paths() {
        let glob = GlobPattern::compile("*.etl").expect("compile");
        assert!(glob.matches("/tmp/outdir/test.etl"));
        assert!(!glob.matches("/tmp/outdir/test.dmp"));
    }
}

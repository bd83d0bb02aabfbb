//! Comparison operators: the closed algebra used by counter predicates.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the six comparison operators. The observed value is always the
/// left operand, the expected reference the right one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    /// `observed == expected`
    Eq,
    /// `observed != expected`
    Ne,
    /// `observed > expected`
    Gt,
    /// `observed < expected`
    Lt,
    /// `observed >= expected`
    Ge,
    /// `observed <= expected`
    Le,
}

impl CompareOp {
    /// Every operator, in a fixed order.
    pub const ALL: [Self; 6] = [Self::Eq, Self::Ne, Self::Gt, Self::Lt, Self::Ge, Self::Le];

    /// Apply the comparison.
    #[must_use]
    pub fn apply(self, left: u64, right: u64) -> bool {
        match self {
            Self::Eq => left == right,
            Self::Ne => left != right,
            Self::Gt => left > right,
            Self::Lt => left < right,
            Self::Ge => left >= right,
            Self::Le => left <= right,
        }
    }

    /// Symbol used in explanations.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Ge => ">=",
            Self::Le => "<=",
        }
    }

    /// Logical complement over totally ordered operands. An involution:
    /// `op.inverse().inverse() == op`.
    #[must_use]
    pub const fn inverse(self) -> Self {
        match self {
            Self::Eq => Self::Ne,
            Self::Ne => Self::Eq,
            Self::Gt => Self::Le,
            Self::Lt => Self::Ge,
            Self::Ge => Self::Lt,
            Self::Le => Self::Gt,
        }
    }

    /// Whether equal operands satisfy the comparison. Drives the
    /// absence-as-zero rule: a missing counter entry may only stand in for a
    /// stored zero when the comparison admits equality.
    #[must_use]
    pub const fn has_equality(self) -> bool {
        matches!(self, Self::Eq | Self::Ge | Self::Le)
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_truth_table() {
        assert!(CompareOp::Eq.apply(3, 3));
        assert!(!CompareOp::Eq.apply(3, 4));
        assert!(CompareOp::Ne.apply(3, 4));
        assert!(!CompareOp::Ne.apply(3, 3));
        assert!(CompareOp::Gt.apply(4, 3));
        assert!(!CompareOp::Gt.apply(3, 3));
        assert!(CompareOp::Lt.apply(2, 3));
        assert!(!CompareOp::Lt.apply(3, 3));
        assert!(CompareOp::Ge.apply(3, 3));
        assert!(!CompareOp::Ge.apply(2, 3));
        assert!(CompareOp::Le.apply(3, 3));
        assert!(!CompareOp::Le.apply(4, 3));
    }

    #[test]
    fn inverse_is_an_involution() {
        for op in CompareOp::ALL {
            assert_eq!(op.inverse().inverse(), op, "{op}");
        }
    }

    #[test]
    fn inverse_is_the_logical_complement() {
        for op in CompareOp::ALL {
            for left in 0..4u64 {
                for right in 0..4u64 {
                    assert_ne!(
                        op.apply(left, right),
                        op.inverse().apply(left, right),
                        "{op} on ({left}, {right})"
                    );
                }
            }
        }
    }

    #[test]
    fn equality_membership() {
        assert!(CompareOp::Eq.has_equality());
        assert!(CompareOp::Ge.has_equality());
        assert!(CompareOp::Le.has_equality());
        assert!(!CompareOp::Ne.has_equality());
        assert!(!CompareOp::Gt.has_equality());
        assert!(!CompareOp::Lt.has_equality());
    }

    #[test]
    fn symbols_are_distinct() {
        let symbols: std::collections::HashSet<&str> =
            CompareOp::ALL.iter().map(|op| op.symbol()).collect();
        assert_eq!(symbols.len(), CompareOp::ALL.len());
    }
}

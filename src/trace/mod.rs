//! Trace-content verification: snapshots, operators, predicates, expectations.

pub mod expectation;
pub mod ids;
pub mod operator;
pub mod predicate;
pub mod snapshot;

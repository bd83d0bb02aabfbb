//! Test orchestration: suites, cases, fixtures, assertions, and the runner.

pub mod case;
pub mod failure;
pub mod filter;
pub mod fixture;
pub mod runner;
pub mod suite;

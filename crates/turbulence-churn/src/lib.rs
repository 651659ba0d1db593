//! Churn from version-control history.
//!
//! Reads per-commit, per-file line counts (`git log --numstat` or an
//! in-process libgit2 walk), keeps the rows for source files that still
//! exist, and sums them into one churn figure per file.

pub mod churn;
pub mod history;
pub mod mining;

pub use churn::{aggregate_churn, record_churn};
pub use history::{changes_in_history, GitLog, HistorySource, NumstatRow};
pub use mining::Git2History;

#[cfg(test)]
mod test_support;

//! Complexity scores from an external analyzer.
//!
//! Discovers the project's source files, runs the analyzer (flog by default)
//! on each one in isolation, and reads the score from the `total` line of its
//! report. Files the analyzer cannot parse are skipped, not fatal.

pub mod discovery;
pub mod report;
pub mod scanner;

pub use discovery::discover_source_files;
pub use report::parse_average;
pub use scanner::{scan, Analyzer, CommandAnalyzer, FileOutcome, ScanSummary, SkippedFile};

//! Core types, configuration, and error handling for Turbulence.
//!
//! This crate provides the shared foundation used by all other Turbulence crates:
//! - [`TurbulenceError`]: unified error type using `thiserror`
//! - [`TurbulenceConfig`]: configuration loaded from `.turbulence.toml`
//! - [`MetricsMap`]: the per-file `{churn, complexity}` result
//! - [`ProgressReporter`]: progress and skip notifications from the engine

mod config;
mod error;
mod progress;
mod types;

pub use config::{ComplexityConfig, HistoryBackend, HistoryConfig, TurbulenceConfig};
pub use error::TurbulenceError;
pub use progress::{Phase, ProgressReporter, Silent};
pub use types::{
    ChangeRecord, ChurnEntry, ComplexityEntry, FileMetrics, MetricsMap, OutputFormat,
};

/// A convenience `Result` type for Turbulence operations.
///
/// # Examples
///
/// ```
/// use turbulence_core::{Result, TurbulenceConfig};
///
/// fn load(raw: &str) -> Result<TurbulenceConfig> {
///     TurbulenceConfig::from_toml(raw)
/// }
///
/// assert!(load("").is_ok());
/// assert!(load("[history]\nbackend = \"svn\"").is_err());
/// ```
pub type Result<T> = std::result::Result<T, TurbulenceError>;

/// Project directories searched (recursively) for source files.
pub const SOURCE_DIRS: [&str; 4] = ["app/models", "app/controllers", "app/helpers", "lib"];

/// Extension (without the dot) of the source files that are measured.
pub const SOURCE_EXTENSION: &str = "rb";

/// Whether a project-relative path names a measured source file by extension.
///
/// # Examples
///
/// ```
/// use turbulence_core::is_source_path;
///
/// assert!(is_source_path("app/models/user.rb"));
/// assert!(!is_source_path("app/models/user.rb.orig"));
/// assert!(!is_source_path("Gemfile"));
/// ```
pub fn is_source_path(path: &str) -> bool {
    path.strip_suffix(SOURCE_EXTENSION)
        .is_some_and(|stem| stem.ends_with('.'))
}

use std::path::PathBuf;

/// Errors that can occur while computing churn and complexity metrics.
///
/// Only [`TurbulenceError::SourceParse`] is recoverable: the complexity scan
/// skips the offending file and keeps going. Every other variant aborts the
/// run. Library crates use this type directly; the binary renders it through
/// `miette` at the boundary.
///
/// # Examples
///
/// ```
/// use turbulence_core::TurbulenceError;
///
/// let err = TurbulenceError::Git("git log exited with status 128".into());
/// assert!(err.to_string().contains("status 128"));
/// assert!(!err.is_recoverable());
/// ```
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum TurbulenceError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// The history query could not be run or exited unsuccessfully.
    #[error("git error: {0}")]
    #[diagnostic(help("run turbulence from inside a git repository, or pass --path to one"))]
    Git(String),

    /// The complexity analyzer failed for a reason other than unparsable source.
    #[error("complexity analyzer error: {0}")]
    #[diagnostic(help("check that the analyzer is installed, or set [complexity] command in .turbulence.toml"))]
    Analyzer(String),

    /// A source file could not be parsed by the complexity analyzer.
    #[error("failed to parse {path}: {message}")]
    SourceParse {
        /// Project-relative path of the file.
        path: String,
        /// Analyzer diagnostic, trimmed to one line.
        message: String,
    },

    /// The analyzer report had no usable total line.
    #[error("unreadable complexity report for {path}: {message}")]
    Report {
        /// Project-relative path of the analyzed file.
        path: String,
        /// What was wrong with the report.
        message: String,
    },

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A required file or directory was not found.
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),
}

impl TurbulenceError {
    /// Whether the scan may skip the affected file and continue.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, TurbulenceError::SourceParse { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: TurbulenceError = io_err.into();
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn config_error_displays_message() {
        let err = TurbulenceError::Config("bad value".into());
        assert_eq!(err.to_string(), "configuration error: bad value");
    }

    #[test]
    fn file_not_found_shows_path() {
        let err = TurbulenceError::FileNotFound(PathBuf::from("/tmp/missing"));
        assert!(err.to_string().contains("/tmp/missing"));
    }

    #[test]
    fn only_source_parse_is_recoverable() {
        let parse = TurbulenceError::SourceParse {
            path: "lib/broken.rb".into(),
            message: "unexpected end-of-input".into(),
        };
        assert!(parse.is_recoverable());
        assert_eq!(
            parse.to_string(),
            "failed to parse lib/broken.rb: unexpected end-of-input"
        );

        let report = TurbulenceError::Report {
            path: "lib/a.rb".into(),
            message: "no total line".into(),
        };
        assert!(!report.is_recoverable());
        assert!(!TurbulenceError::Analyzer("flog: not found".into()).is_recoverable());
    }
}

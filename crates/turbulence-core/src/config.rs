use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::TurbulenceError;
use crate::Result;

/// Top-level configuration loaded from `.turbulence.toml`.
///
/// Every field has a default, so an empty file (or no file) is valid. The
/// measured source directories are fixed and cannot be configured here.
///
/// # Examples
///
/// ```
/// use turbulence_core::{HistoryBackend, TurbulenceConfig};
///
/// let config = TurbulenceConfig::default();
/// assert_eq!(config.history.backend, HistoryBackend::GitCli);
/// assert_eq!(config.complexity.command, "flog");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TurbulenceConfig {
    /// How the change history is read.
    #[serde(default)]
    pub history: HistoryConfig,
    /// Which complexity analyzer is run.
    #[serde(default)]
    pub complexity: ComplexityConfig,
}

impl TurbulenceConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`TurbulenceError::Io`] if the file cannot be read, or
    /// [`TurbulenceError::Toml`] if the content is not valid TOML.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use turbulence_core::TurbulenceConfig;
    /// use std::path::Path;
    ///
    /// let config = TurbulenceConfig::from_file(Path::new(".turbulence.toml")).unwrap();
    /// ```
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`TurbulenceError::Toml`] if parsing fails, or
    /// [`TurbulenceError::Config`] if a value is unusable.
    ///
    /// # Examples
    ///
    /// ```
    /// use turbulence_core::{HistoryBackend, TurbulenceConfig};
    ///
    /// let toml = r#"
    /// [history]
    /// backend = "libgit2"
    /// "#;
    /// let config = TurbulenceConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.history.backend, HistoryBackend::Libgit2);
    /// ```
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.history.git.trim().is_empty() {
            return Err(TurbulenceError::Config(
                "[history] git must name a program".into(),
            ));
        }
        if self.complexity.command.trim().is_empty() {
            return Err(TurbulenceError::Config(
                "[complexity] command must name a program".into(),
            ));
        }
        Ok(())
    }
}

/// Where the change history comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HistoryBackend {
    /// Run `git log --numstat` and parse its output.
    #[default]
    GitCli,
    /// Walk the repository in-process with libgit2.
    Libgit2,
}

/// History query configuration.
///
/// # Examples
///
/// ```
/// use turbulence_core::HistoryConfig;
///
/// let config = HistoryConfig::default();
/// assert_eq!(config.git, "git");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// History backend (default: `"git-cli"`).
    #[serde(default)]
    pub backend: HistoryBackend,
    /// Git program used by the CLI backend (default: `"git"`).
    #[serde(default = "default_git")]
    pub git: String,
}

fn default_git() -> String {
    "git".into()
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            backend: HistoryBackend::default(),
            git: default_git(),
        }
    }
}

/// Complexity analyzer configuration.
///
/// The analyzer is run once per file as `command [args...] <file>` from the
/// project root, and must print a report containing a `total` line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplexityConfig {
    /// Analyzer program (default: `"flog"`).
    #[serde(default = "default_command")]
    pub command: String,
    /// Extra arguments placed before the file path.
    #[serde(default)]
    pub args: Vec<String>,
}

fn default_command() -> String {
    "flog".into()
}

impl Default for ComplexityConfig {
    fn default() -> Self {
        Self {
            command: default_command(),
            args: Vec::new(),
        }
    }
}

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One file's share of one commit in the history query.
///
/// # Examples
///
/// ```
/// use turbulence_core::ChangeRecord;
///
/// let record = ChangeRecord::new("lib/parser.rb", 12 + 4);
/// assert_eq!(record.lines_changed, 16);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRecord {
    /// File path relative to the project root.
    pub path: String,
    /// Lines added plus lines deleted in this commit.
    pub lines_changed: u64,
}

impl ChangeRecord {
    pub fn new(path: impl Into<String>, lines_changed: u64) -> Self {
        Self {
            path: path.into(),
            lines_changed,
        }
    }
}

/// Aggregated churn for a single file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChurnEntry {
    /// File path relative to the project root.
    pub path: String,
    /// Sum of the file's change sizes, oldest entry excluded.
    pub churn: u64,
}

/// Complexity score reported for a single file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplexityEntry {
    /// File path relative to the project root.
    pub path: String,
    /// Score captured from the analyzer's total line.
    pub complexity: f64,
}

/// The metrics recorded for one file.
///
/// Either field may be absent: a file can have history but fail analysis, or
/// pass analysis without qualifying history.
///
/// # Examples
///
/// ```
/// use turbulence_core::FileMetrics;
///
/// let m = FileMetrics { churn: Some(8), complexity: None };
/// assert!(!m.is_complete());
/// assert_eq!(serde_json::to_string(&m).unwrap(), r#"{"churn":8}"#);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FileMetrics {
    /// Lines added + deleted over the file's history.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub churn: Option<u64>,
    /// Complexity score from the analyzer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complexity: Option<f64>,
}

impl FileMetrics {
    /// Whether both churn and complexity are present.
    pub fn is_complete(&self) -> bool {
        self.churn.is_some() && self.complexity.is_some()
    }
}

/// Per-file metrics keyed by project-relative path.
///
/// Entries are created on first write from either the churn or the complexity
/// pass. Keys are kept sorted so that serializing an unchanged project twice
/// produces identical bytes; callers should still not rely on any particular
/// order.
///
/// Serializes as a plain `{path: {churn, complexity}}` object.
///
/// # Examples
///
/// ```
/// use turbulence_core::MetricsMap;
///
/// let mut metrics = MetricsMap::new();
/// metrics.entry("lib/a.rb").churn = Some(8);
/// metrics.entry("lib/a.rb").complexity = Some(12.5);
/// metrics.entry("lib/b.rb").complexity = Some(3.0);
///
/// assert_eq!(metrics.len(), 2);
/// assert!(metrics.get("lib/a.rb").unwrap().is_complete());
/// assert_eq!(
///     serde_json::to_string(&metrics).unwrap(),
///     r#"{"lib/a.rb":{"churn":8,"complexity":12.5},"lib/b.rb":{"complexity":3.0}}"#
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricsMap {
    entries: BTreeMap<String, FileMetrics>,
}

impl MetricsMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the entry for `path`, creating an empty one if absent.
    pub fn entry(&mut self, path: &str) -> &mut FileMetrics {
        self.entries.entry(path.to_string()).or_default()
    }

    pub fn get(&self, path: &str) -> Option<&FileMetrics> {
        self.entries.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FileMetrics)> {
        self.entries.iter().map(|(path, m)| (path.as_str(), m))
    }

    /// Number of entries that have a churn value.
    pub fn churn_count(&self) -> usize {
        self.entries.values().filter(|m| m.churn.is_some()).count()
    }

    /// Number of entries that have a complexity value.
    pub fn complexity_count(&self) -> usize {
        self.entries.values().filter(|m| m.complexity.is_some()).count()
    }
}

/// Output format for the CLI.
///
/// Implements [`FromStr`] so it can be used directly with `clap` argument parsing.
///
/// # Examples
///
/// ```
/// use turbulence_core::OutputFormat;
///
/// let fmt: OutputFormat = "json".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Json);
///
/// let fmt: OutputFormat = "md".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Markdown);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable ranked table.
    #[default]
    Text,
    /// The metrics map as JSON.
    Json,
    /// Markdown-formatted table.
    Markdown,
    /// Scatter-plot series grouped by directory, as JSON.
    Plot,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
            OutputFormat::Plot => write!(f, "plot"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "plot" => Ok(OutputFormat::Plot),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}

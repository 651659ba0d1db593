use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use turbulence_churn::{aggregate_churn, changes_in_history, record_churn};
use turbulence_churn::{Git2History, GitLog, HistorySource};
use turbulence_complexity::{discover_source_files, scan, Analyzer, CommandAnalyzer};
use turbulence_complexity::{ScanSummary, SkippedFile};
use turbulence_core::{
    ComplexityConfig, HistoryBackend, HistoryConfig, MetricsMap, ProgressReporter,
    Result, TurbulenceConfig,
};

/// Churn and complexity metrics computed for one project.
///
/// Construction does all the work: source files are discovered, the churn
/// pass runs, then the complexity pass. Both passes write into the same
/// [`MetricsMap`], each touching only its own field, so their order does not
/// affect the result. Nothing here changes the process working directory;
/// external commands are started with `root` as their directory.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use turbulence_core::{Silent, TurbulenceConfig};
/// use turbulence_engine::Turbulence;
///
/// let run = Turbulence::from_config(Path::new("."), &TurbulenceConfig::default(), &Silent).unwrap();
/// for (path, m) in run.metrics().iter() {
///     println!("{path}: churn={:?} complexity={:?}", m.churn, m.complexity);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Turbulence {
    root: PathBuf,
    source_files: Vec<String>,
    metrics: MetricsMap,
    skipped: Vec<SkippedFile>,
}

impl Turbulence {
    /// Compute metrics for the project at `root`.
    ///
    /// # Errors
    ///
    /// Returns [`TurbulenceError::FileNotFound`](turbulence_core::TurbulenceError::FileNotFound) if `root` is not a directory,
    /// or the first fatal error from the history query or the analyzer.
    /// Per-file parse failures are not errors; see [`Turbulence::skipped`].
    pub fn compute(
        root: &Path,
        history: &dyn HistorySource,
        analyzer: &dyn Analyzer,
        progress: &dyn ProgressReporter,
    ) -> Result<Self> {
        let source_files = discover_source_files(root)?;
        let mut metrics = MetricsMap::new();

        compute_churn(history, root, &source_files, &mut metrics, progress)?;
        let summary = compute_complexity(analyzer, root, &source_files, &mut metrics, progress)?;

        Ok(Self {
            root: root.to_path_buf(),
            source_files,
            metrics,
            skipped: summary.skipped,
        })
    }

    /// Compute metrics using the history backend and analyzer named in `config`.
    ///
    /// # Errors
    ///
    /// See [`Turbulence::compute`].
    pub fn from_config(
        root: &Path,
        config: &TurbulenceConfig,
        progress: &dyn ProgressReporter,
    ) -> Result<Self> {
        let history = history_source_for(&config.history);
        let analyzer = analyzer_for(&config.complexity);
        Self::compute(root, history.as_ref(), analyzer.as_ref(), progress)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Source files found under the fixed project directories.
    pub fn source_files(&self) -> &[String] {
        &self.source_files
    }

    pub fn metrics(&self) -> &MetricsMap {
        &self.metrics
    }

    /// Files that got no complexity because the analyzer could not parse them.
    pub fn skipped(&self) -> &[SkippedFile] {
        &self.skipped
    }

    pub fn into_metrics(self) -> MetricsMap {
        self.metrics
    }
}

/// Run the churn pass: history → change records → churn per source file.
///
/// Returns the number of files that received churn.
///
/// # Errors
///
/// Returns the history source's error; churn has no recoverable failures.
pub fn compute_churn(
    history: &dyn HistorySource,
    root: &Path,
    source_files: &[String],
    metrics: &mut MetricsMap,
    progress: &dyn ProgressReporter,
) -> Result<usize> {
    let changes = changes_in_history(history, root)?;
    let entries = aggregate_churn(&changes);
    let sources: BTreeSet<String> = source_files.iter().cloned().collect();
    Ok(record_churn(&entries, &sources, metrics, progress))
}

/// Run the complexity pass over every source file.
///
/// # Errors
///
/// See [`turbulence_complexity::scan`].
pub fn compute_complexity(
    analyzer: &dyn Analyzer,
    root: &Path,
    source_files: &[String],
    metrics: &mut MetricsMap,
    progress: &dyn ProgressReporter,
) -> Result<ScanSummary> {
    scan(analyzer, root, source_files, metrics, progress)
}

/// Build the history source selected by `config`.
pub fn history_source_for(config: &HistoryConfig) -> Box<dyn HistorySource> {
    match config.backend {
        HistoryBackend::GitCli => Box::new(GitLog::new(config.git.clone())),
        HistoryBackend::Libgit2 => Box::new(Git2History),
    }
}

/// Build the analyzer described by `config`.
pub fn analyzer_for(config: &ComplexityConfig) -> Box<dyn Analyzer> {
    Box::new(CommandAnalyzer::from_config(config))
}

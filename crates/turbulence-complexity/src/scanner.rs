//! Per-file complexity scanning.
//!
//! Every discovered source file is analyzed on its own. A file the analyzer
//! cannot parse becomes a [`SkippedFile`]; any other analyzer failure aborts
//! the scan.

use std::path::Path;
use std::process::Command;

use turbulence_core::{
    ComplexityConfig, ComplexityEntry, MetricsMap, Phase, ProgressReporter, Result,
    TurbulenceError,
};

use crate::report::parse_average;

/// Substrings in analyzer stderr that mean the source itself did not parse.
const PARSE_FAILURE_MARKERS: [&str; 5] = [
    "SyntaxError",
    "ParseError",
    "syntax error",
    "parse error",
    "failed to parse",
];

/// A structural-complexity analyzer that reports on one file at a time.
pub trait Analyzer {
    /// Short name shown in verbose output.
    fn name(&self) -> &str;

    /// Analyze `file` (relative to `root`) in isolation and return the report
    /// text.
    ///
    /// # Errors
    ///
    /// Returns [`TurbulenceError::SourceParse`] if the file is not valid
    /// source; the scan skips it. Any other error is fatal.
    fn report(&self, root: &Path, file: &str) -> Result<String>;
}

/// Analyzer run as an external command, `flog <file>` by default.
///
/// The command runs with `root` as its working directory. A zero exit status
/// means stdout is the report. A non-zero exit whose stderr mentions a syntax
/// or parse error is reported as [`TurbulenceError::SourceParse`].
///
/// # Examples
///
/// ```
/// use turbulence_complexity::scanner::{Analyzer, CommandAnalyzer};
///
/// let flog = CommandAnalyzer::default();
/// assert_eq!(flog.name(), "flog");
///
/// let bundled = CommandAnalyzer::new("bundle", ["exec", "flog"]);
/// assert_eq!(bundled.name(), "bundle");
/// ```
#[derive(Debug, Clone)]
pub struct CommandAnalyzer {
    command: String,
    args: Vec<String>,
}

impl CommandAnalyzer {
    pub fn new<I, S>(command: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            command: command.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_config(config: &ComplexityConfig) -> Self {
        Self::new(config.command.clone(), config.args.iter().cloned())
    }
}

impl Default for CommandAnalyzer {
    fn default() -> Self {
        Self::from_config(&ComplexityConfig::default())
    }
}

impl Analyzer for CommandAnalyzer {
    fn name(&self) -> &str {
        &self.command
    }

    fn report(&self, root: &Path, file: &str) -> Result<String> {
        let output = Command::new(&self.command)
            .args(&self.args)
            .arg(file)
            .current_dir(root)
            .output()
            .map_err(|e| TurbulenceError::Analyzer(format!("failed to run {}: {e}", self.command)))?;

        if output.status.success() {
            return Ok(String::from_utf8_lossy(&output.stdout).into_owned());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        if looks_like_parse_failure(&stderr) {
            return Err(TurbulenceError::SourceParse {
                path: file.to_string(),
                message: first_diagnostic_line(&stderr),
            });
        }

        Err(TurbulenceError::Analyzer(format!(
            "{} exited with {} on {file}: {}",
            self.command,
            output.status,
            first_diagnostic_line(&stderr)
        )))
    }
}

/// Whether analyzer stderr describes unparsable source.
///
/// # Examples
///
/// ```
/// use turbulence_complexity::scanner::looks_like_parse_failure;
///
/// assert!(looks_like_parse_failure("lib/a.rb:3 :: parse error on value \"end\""));
/// assert!(!looks_like_parse_failure("flog: command not found"));
/// ```
pub fn looks_like_parse_failure(stderr: &str) -> bool {
    PARSE_FAILURE_MARKERS
        .iter()
        .any(|marker| stderr.contains(marker))
}

fn first_diagnostic_line(stderr: &str) -> String {
    let line = stderr
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("no diagnostic output");
    truncate(line, 160)
}

fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

/// A file the analyzer could not parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    /// Project-relative path.
    pub path: String,
    /// One-line diagnostic.
    pub reason: String,
}

/// Result of analyzing one file.
#[derive(Debug, Clone, PartialEq)]
pub enum FileOutcome {
    /// The report had a total line.
    Scored(ComplexityEntry),
    /// The file did not parse and gets no complexity.
    Skipped(SkippedFile),
}

/// Analyze a single file and read its score.
///
/// # Errors
///
/// Returns the analyzer's error if it is not a source parse failure, or
/// [`TurbulenceError::Report`] if the report has no usable total line.
pub fn analyze_file(
    analyzer: &dyn Analyzer,
    root: &Path,
    file: &str,
) -> Result<FileOutcome> {
    match analyzer.report(root, file) {
        Ok(report) => match parse_average(&report) {
            Some(complexity) => Ok(FileOutcome::Scored(ComplexityEntry {
                path: file.to_string(),
                complexity,
            })),
            None => Err(TurbulenceError::Report {
                path: file.to_string(),
                message: format!("no total line in {} output", analyzer.name()),
            }),
        },
        Err(e) if e.is_recoverable() => {
            let reason = match e {
                TurbulenceError::SourceParse { message, .. } => message,
                other => other.to_string(),
            };
            Ok(FileOutcome::Skipped(SkippedFile {
                path: file.to_string(),
                reason,
            }))
        }
        Err(e) => Err(e),
    }
}

/// Totals from a complexity scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanSummary {
    /// Files that received a complexity value.
    pub scored: usize,
    /// Files skipped because they did not parse, in scan order.
    pub skipped: Vec<SkippedFile>,
}

/// Analyze every file in `files` and write complexity into `metrics`.
///
/// `progress` advances once per file, and is told about each skipped file.
/// Skipped files get no metrics entry from this pass.
///
/// # Errors
///
/// Stops at the first fatal error from [`analyze_file`]; `metrics` then holds
/// whatever was written before it.
pub fn scan(
    analyzer: &dyn Analyzer,
    root: &Path,
    files: &[String],
    metrics: &mut MetricsMap,
    progress: &dyn ProgressReporter,
) -> Result<ScanSummary> {
    let mut summary = ScanSummary::default();
    progress.begin(Phase::Complexity, files.len());

    for file in files {
        match analyze_file(analyzer, root, file)? {
            FileOutcome::Scored(entry) => {
                metrics.entry(&entry.path).complexity = Some(entry.complexity);
                summary.scored += 1;
            }
            FileOutcome::Skipped(skipped) => {
                progress.skipped(&skipped.path, &skipped.reason);
                summary.skipped.push(skipped);
            }
        }
        progress.advance();
    }

    progress.finish(Phase::Complexity);
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use turbulence_core::Silent;

    enum Canned {
        Report(&'static str),
        Unparsable,
        Crash,
    }

    struct FakeAnalyzer(HashMap<&'static str, Canned>);

    impl Analyzer for FakeAnalyzer {
        fn name(&self) -> &str {
            "fake"
        }

        fn report(&self, _root: &Path, file: &str) -> Result<String> {
            match self.0.get(file) {
                Some(Canned::Report(text)) => Ok(text.to_string()),
                Some(Canned::Unparsable) => Err(TurbulenceError::SourceParse {
                    path: file.to_string(),
                    message: "unexpected keyword_end".into(),
                }),
                Some(Canned::Crash) | None => {
                    Err(TurbulenceError::Analyzer(format!("crashed on {file}")))
                }
            }
        }
    }

    fn files(paths: &[&str]) -> Vec<String> {
        paths.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn scores_come_from_total_line() {
        let analyzer = FakeAnalyzer(HashMap::from([(
            "lib/c.rb",
            Canned::Report("   12.5: flog total\n    6.2: flog/method average\n"),
        )]));
        let mut metrics = MetricsMap::new();

        let summary = scan(
            &analyzer,
            Path::new("."),
            &files(&["lib/c.rb"]),
            &mut metrics,
            &Silent,
        )
        .unwrap();

        assert_eq!(summary.scored, 1);
        assert_eq!(metrics.get("lib/c.rb").unwrap().complexity, Some(12.5));
    }

    #[test]
    fn parse_failures_are_skipped_not_fatal() {
        let analyzer = FakeAnalyzer(HashMap::from([
            ("lib/d.rb", Canned::Unparsable),
            ("lib/e.rb", Canned::Report("   2.0: flog total\n")),
        ]));
        let mut metrics = MetricsMap::new();

        let summary = scan(
            &analyzer,
            Path::new("."),
            &files(&["lib/d.rb", "lib/e.rb"]),
            &mut metrics,
            &Silent,
        )
        .unwrap();

        assert_eq!(summary.scored, 1);
        assert_eq!(
            summary.skipped,
            vec![SkippedFile {
                path: "lib/d.rb".into(),
                reason: "unexpected keyword_end".into(),
            }]
        );
        assert!(!metrics.contains("lib/d.rb"));
        assert_eq!(metrics.get("lib/e.rb").unwrap().complexity, Some(2.0));
    }

    #[test]
    fn skipped_file_keeps_existing_churn() {
        let analyzer = FakeAnalyzer(HashMap::from([("lib/d.rb", Canned::Unparsable)]));
        let mut metrics = MetricsMap::new();
        metrics.entry("lib/d.rb").churn = Some(9);

        scan(
            &analyzer,
            Path::new("."),
            &files(&["lib/d.rb"]),
            &mut metrics,
            &Silent,
        )
        .unwrap();

        let m = metrics.get("lib/d.rb").unwrap();
        assert_eq!(m.churn, Some(9));
        assert_eq!(m.complexity, None);
    }

    #[test]
    fn other_analyzer_failures_abort() {
        let analyzer = FakeAnalyzer(HashMap::from([
            ("lib/a.rb", Canned::Report("   1.0: flog total\n")),
            ("lib/b.rb", Canned::Crash),
        ]));
        let mut metrics = MetricsMap::new();

        let err = scan(
            &analyzer,
            Path::new("."),
            &files(&["lib/a.rb", "lib/b.rb"]),
            &mut metrics,
            &Silent,
        )
        .unwrap_err();

        assert!(matches!(err, TurbulenceError::Analyzer(_)));
    }

    #[test]
    fn report_without_total_is_fatal() {
        let analyzer = FakeAnalyzer(HashMap::from([("lib/a.rb", Canned::Report("no score\n"))]));
        let err = analyze_file(&analyzer, Path::new("."), "lib/a.rb").unwrap_err();
        assert!(matches!(err, TurbulenceError::Report { .. }));
    }

    #[test]
    fn progress_sees_every_file_and_each_skip() {
        #[derive(Default)]
        struct Recorder {
            ticks: RefCell<usize>,
            skipped: RefCell<Vec<String>>,
        }
        impl ProgressReporter for Recorder {
            fn advance(&self) {
                *self.ticks.borrow_mut() += 1;
            }
            fn skipped(&self, path: &str, _reason: &str) {
                self.skipped.borrow_mut().push(path.to_string());
            }
        }

        let analyzer = FakeAnalyzer(HashMap::from([
            ("a.rb", Canned::Report("   1.0: flog total\n")),
            ("b.rb", Canned::Unparsable),
            ("c.rb", Canned::Report("   3.0: flog total\n")),
        ]));
        let recorder = Recorder::default();
        scan(
            &analyzer,
            Path::new("."),
            &files(&["a.rb", "b.rb", "c.rb"]),
            &mut MetricsMap::new(),
            &recorder,
        )
        .unwrap();

        assert_eq!(*recorder.ticks.borrow(), 3);
        assert_eq!(*recorder.skipped.borrow(), vec!["b.rb".to_string()]);
    }

    #[test]
    fn parse_failure_markers() {
        assert!(looks_like_parse_failure(
            "lib/x.rb:4: syntax error, unexpected end-of-input"
        ));
        assert!(looks_like_parse_failure(
            "RubyParser::SyntaxError: lib/x.rb:4 :: parse error"
        ));
        assert!(looks_like_parse_failure("Racc::ParseError"));
        assert!(!looks_like_parse_failure("Errno::ENOENT: No such file"));
    }

    #[test]
    fn long_diagnostics_are_truncated() {
        let long = "x".repeat(500);
        let line = first_diagnostic_line(&format!("\n\n{long}\nsecond"));
        assert_eq!(line.chars().count(), 163);
        assert!(line.ends_with("..."));
        assert_eq!(first_diagnostic_line(""), "no diagnostic output");
    }

    #[cfg(unix)]
    mod command {
        use super::*;

        fn sh(script: &str) -> CommandAnalyzer {
            CommandAnalyzer::new("sh", ["-c", script, "sh"])
        }

        #[test]
        fn successful_run_returns_stdout() {
            let dir = tempfile::tempdir().unwrap();
            let analyzer = sh("echo \"   12.5: flog total\"");
            let report = analyzer.report(dir.path(), "lib/c.rb").unwrap();
            assert_eq!(parse_average(&report), Some(12.5));
        }

        #[test]
        fn file_path_is_passed_last_and_resolved_from_root() {
            let dir = tempfile::tempdir().unwrap();
            std::fs::create_dir_all(dir.path().join("lib")).unwrap();
            std::fs::write(dir.path().join("lib/c.rb"), "   7.0: flog total\n").unwrap();

            let analyzer = sh("cat \"$1\"");
            let report = analyzer.report(dir.path(), "lib/c.rb").unwrap();
            assert_eq!(parse_average(&report), Some(7.0));
        }

        #[test]
        fn syntax_error_exit_is_source_parse() {
            let dir = tempfile::tempdir().unwrap();
            let analyzer = sh("echo 'lib/d.rb:3: syntax error, unexpected end' >&2; exit 1");
            let err = analyzer.report(dir.path(), "lib/d.rb").unwrap_err();
            match err {
                TurbulenceError::SourceParse { path, message } => {
                    assert_eq!(path, "lib/d.rb");
                    assert!(message.contains("syntax error"));
                }
                other => panic!("expected SourceParse, got {other:?}"),
            }
        }

        #[test]
        fn other_failed_exit_is_analyzer_error() {
            let dir = tempfile::tempdir().unwrap();
            let analyzer = sh("echo 'LoadError: cannot load such file' >&2; exit 2");
            let err = analyzer.report(dir.path(), "lib/d.rb").unwrap_err();
            assert!(matches!(err, TurbulenceError::Analyzer(_)));
            assert!(err.to_string().contains("LoadError"));
        }

        #[test]
        fn missing_program_is_analyzer_error() {
            let dir = tempfile::tempdir().unwrap();
            let analyzer = CommandAnalyzer::new("no-such-analyzer-binary", Vec::<String>::new());
            let err = analyzer.report(dir.path(), "lib/a.rb").unwrap_err();
            assert!(matches!(err, TurbulenceError::Analyzer(_)));
        }
    }
}

//! History change extraction.
//!
//! A [`HistorySource`] produces raw numstat rows for the whole history; the
//! functions here turn them into [`ChangeRecord`]s for source files that are
//! still on disk.

use std::path::Path;
use std::process::Command;

use turbulence_core::{is_source_path, ChangeRecord, Result, TurbulenceError};

/// One `added<TAB>deleted<TAB>path` row from the history query.
///
/// # Examples
///
/// ```
/// use turbulence_churn::history::NumstatRow;
///
/// let row = NumstatRow {
///     added: 10,
///     deleted: 3,
///     path: "lib/parser.rb".into(),
/// };
/// assert_eq!(row.lines_changed(), 13);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumstatRow {
    /// Lines added (0 for binary markers).
    pub added: u64,
    /// Lines deleted (0 for binary markers).
    pub deleted: u64,
    /// Path as printed by the history query, relative to the repository root.
    pub path: String,
}

impl NumstatRow {
    pub fn lines_changed(&self) -> u64 {
        self.added.saturating_add(self.deleted)
    }
}

/// Something that can list every (commit, file) change in a repository.
///
/// Rows are returned newest commit first, covering all branches.
pub trait HistorySource {
    /// Short name shown in verbose output.
    fn name(&self) -> &'static str;

    /// Read the full history of the repository containing `root`.
    ///
    /// # Errors
    ///
    /// Returns [`TurbulenceError::Git`] if the history cannot be read. This is
    /// fatal for the run.
    fn numstat(&self, root: &Path) -> Result<Vec<NumstatRow>>;
}

/// History source that shells out to `git log`.
///
/// Runs `git log --all -M -C --numstat --format=%n` with `root` as the
/// working directory and buffers the whole output.
///
/// # Examples
///
/// ```
/// use turbulence_churn::history::{GitLog, HistorySource};
///
/// let git = GitLog::default();
/// assert_eq!(git.name(), "git-cli");
/// ```
#[derive(Debug, Clone)]
pub struct GitLog {
    program: String,
}

impl GitLog {
    /// Arguments passed to the git program.
    pub const ARGS: [&'static str; 6] = ["log", "--all", "-M", "-C", "--numstat", "--format=%n"];

    /// Use `program` instead of `git` from `PATH`.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for GitLog {
    fn default() -> Self {
        Self::new("git")
    }
}

impl HistorySource for GitLog {
    fn name(&self) -> &'static str {
        "git-cli"
    }

    fn numstat(&self, root: &Path) -> Result<Vec<NumstatRow>> {
        let output = Command::new(&self.program)
            .args(Self::ARGS)
            .current_dir(root)
            .output()
            .map_err(|e| TurbulenceError::Git(format!("failed to run {}: {e}", self.program)))?;

        if !output.status.success() {
            return Err(TurbulenceError::Git(format!(
                "git log exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(parse_numstat(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// Parse `git log --numstat` output into rows.
///
/// Blank lines (commit separators) are skipped, as are lines without a path
/// column. Count columns that are not numbers, such as the `-` printed for
/// binary files, are read leniently by [`lenient_count`].
///
/// # Examples
///
/// ```
/// use turbulence_churn::history::parse_numstat;
///
/// let raw = "\n\n3\t1\tlib/a.rb\n-\t-\tlib/logo.png\n\n\n2\t0\tlib/a.rb\n";
/// let rows = parse_numstat(raw);
/// assert_eq!(rows.len(), 3);
/// assert_eq!(rows[0].lines_changed(), 4);
/// assert_eq!(rows[1].lines_changed(), 0);
/// ```
pub fn parse_numstat(output: &str) -> Vec<NumstatRow> {
    output
        .lines()
        .filter(|line| !line.is_empty())
        .filter_map(|line| {
            let mut fields = line.splitn(3, '\t');
            let added = fields.next()?;
            let deleted = fields.next()?;
            let path = fields.next()?;
            Some(NumstatRow {
                added: lenient_count(added),
                deleted: lenient_count(deleted),
                path: path.to_string(),
            })
        })
        .collect()
}

/// Read a count column: its leading digits, or 0 if there are none.
///
/// Digit runs too long for `u64` saturate at `u64::MAX`.
///
/// # Examples
///
/// ```
/// use turbulence_churn::history::lenient_count;
///
/// assert_eq!(lenient_count("42"), 42);
/// assert_eq!(lenient_count(" 7"), 7);
/// assert_eq!(lenient_count("12abc"), 12);
/// assert_eq!(lenient_count("-"), 0);
/// assert_eq!(lenient_count(""), 0);
/// ```
pub fn lenient_count(field: &str) -> u64 {
    let field = field.trim_start();
    let digits = field.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return 0;
    }
    field[..digits].parse().unwrap_or(u64::MAX)
}

/// Keep rows for source files that still exist under `root`.
///
/// Rows for deleted files, and rename rows whose path is the `old => new`
/// form, do not match a file on disk and are dropped. Order is preserved.
pub fn extract_changes(rows: Vec<NumstatRow>, root: &Path) -> Vec<ChangeRecord> {
    rows.into_iter()
        .filter(|row| is_source_path(&row.path) && root.join(&row.path).is_file())
        .map(|row| {
            let lines_changed = row.lines_changed();
            ChangeRecord::new(row.path, lines_changed)
        })
        .collect()
}

/// Run `source` against `root` and return the qualifying change records.
///
/// # Errors
///
/// Propagates the history source's error; see [`HistorySource::numstat`].
pub fn changes_in_history(
    source: &dyn HistorySource,
    root: &Path,
) -> Result<Vec<ChangeRecord>> {
    let rows = source.numstat(root)?;
    Ok(extract_changes(rows, root))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const SAMPLE_LOG: &str = "\n\n5\t2\tapp/models/user.rb\n1\t1\tREADME.md\n\n\n\
                              -\t-\tapp/assets/logo.png\n0\t4\tlib/gone.rb\n\n\n\
                              10\t0\tapp/models/user.rb\n";

    #[test]
    fn parse_skips_blank_lines() {
        let rows = parse_numstat(SAMPLE_LOG);
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0].path, "app/models/user.rb");
        assert_eq!(rows[0].added, 5);
        assert_eq!(rows[0].deleted, 2);
    }

    #[test]
    fn binary_markers_count_as_zero() {
        let rows = parse_numstat("-\t-\tlib/data.rb\n");
        assert_eq!(
            rows,
            vec![NumstatRow {
                added: 0,
                deleted: 0,
                path: "lib/data.rb".into(),
            }]
        );
    }

    #[test]
    fn rows_without_path_are_dropped() {
        let rows = parse_numstat("3\t4\n\t\tlib/x.rb\nnot a numstat line\n");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].path, "lib/x.rb");
        assert_eq!(rows[0].lines_changed(), 0);
    }

    #[test]
    fn path_may_contain_tabs() {
        let rows = parse_numstat("1\t1\tlib/odd\tname.rb\n");
        assert_eq!(rows[0].path, "lib/odd\tname.rb");
    }

    #[test]
    fn oversized_counts_saturate() {
        assert_eq!(lenient_count("99999999999999999999999"), u64::MAX);
        assert_eq!(lenient_count("18446744073709551615"), u64::MAX);
        assert_eq!(lenient_count("99999999999999999999999\t"), u64::MAX);

        let rows = parse_numstat("99999999999999999999999\t5\tlib/huge.rb\n");
        assert_eq!(rows[0].lines_changed(), u64::MAX);
    }

    #[test]
    fn extract_keeps_existing_source_files_only() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("app/models")).unwrap();
        fs::write(root.join("app/models/user.rb"), "class User; end").unwrap();
        fs::write(root.join("README.md"), "# readme").unwrap();

        let changes = extract_changes(parse_numstat(SAMPLE_LOG), root);
        assert_eq!(
            changes,
            vec![
                ChangeRecord::new("app/models/user.rb", 7),
                ChangeRecord::new("app/models/user.rb", 10),
            ]
        );
    }

    #[test]
    fn rename_rows_are_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("lib")).unwrap();
        fs::write(root.join("lib/new.rb"), "").unwrap();

        let rows = parse_numstat("2\t2\tlib/{old.rb => new.rb}\n1\t0\tlib/new.rb\n");
        let changes = extract_changes(rows, root);
        assert_eq!(changes, vec![ChangeRecord::new("lib/new.rb", 1)]);
    }

    #[test]
    fn missing_git_program_is_a_git_error() {
        let dir = tempfile::tempdir().unwrap();
        let git = GitLog::new("definitely-not-a-real-git-binary");
        let err = git.numstat(dir.path()).unwrap_err();
        assert!(matches!(err, TurbulenceError::Git(_)));
        assert!(err.to_string().contains("definitely-not-a-real-git-binary"));
    }
}

//! In-process history mining via git2.
//!
//! Produces the same rows as `git log --all -M -C --numstat` without
//! requiring a `git` binary: every commit reachable from any ref is diffed
//! against its first parent with rename and copy detection on.

use std::path::Path;

use git2::{Diff, DiffFindOptions, DiffOptions, Patch, Repository, Sort};
use turbulence_core::{Result, TurbulenceError};

use crate::history::{HistorySource, NumstatRow};

/// History source backed by libgit2.
///
/// Merge commits contribute no rows, as with `git log --numstat`. Binary
/// files produce rows with zero counts. Renamed files are reported under
/// their new path.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use turbulence_churn::history::HistorySource;
/// use turbulence_churn::mining::Git2History;
///
/// let rows = Git2History.numstat(Path::new(".")).unwrap();
/// for row in rows.iter().take(5) {
///     println!("{}\t{}\t{}", row.added, row.deleted, row.path);
/// }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Git2History;

impl HistorySource for Git2History {
    fn name(&self) -> &'static str {
        "libgit2"
    }

    fn numstat(&self, root: &Path) -> Result<Vec<NumstatRow>> {
        let repo = Repository::discover(root)
            .map_err(|e| TurbulenceError::Git(format!("failed to open repository: {e}")))?;

        let mut revwalk = repo
            .revwalk()
            .map_err(|e| TurbulenceError::Git(format!("failed to create revwalk: {e}")))?;

        revwalk.set_sorting(Sort::TIME).ok();

        // Equivalent of --all: every ref, plus a possibly detached HEAD
        revwalk
            .push_glob("*")
            .map_err(|e| TurbulenceError::Git(format!("failed to push refs: {e}")))?;
        if repo.head().is_ok() {
            revwalk
                .push_head()
                .map_err(|e| TurbulenceError::Git(format!("failed to push HEAD: {e}")))?;
        }

        let mut rows = Vec::new();
        for oid_result in revwalk {
            let oid = oid_result.map_err(|e| TurbulenceError::Git(format!("revwalk error: {e}")))?;

            let commit = repo
                .find_commit(oid)
                .map_err(|e| TurbulenceError::Git(format!("failed to find commit: {e}")))?;

            if commit.parent_count() > 1 {
                continue;
            }

            let diff = diff_against_parent(&repo, &commit)?;
            rows.extend(numstat_rows(&diff)?);
        }

        Ok(rows)
    }
}

fn diff_against_parent<'r>(
    repo: &'r Repository,
    commit: &git2::Commit,
) -> Result<Diff<'r>> {
    let commit_tree = commit
        .tree()
        .map_err(|e| TurbulenceError::Git(format!("failed to get commit tree: {e}")))?;

    let parent_tree = if commit.parent_count() > 0 {
        let parent = commit
            .parent(0)
            .map_err(|e| TurbulenceError::Git(format!("failed to get parent: {e}")))?;
        Some(
            parent
                .tree()
                .map_err(|e| TurbulenceError::Git(format!("failed to get parent tree: {e}")))?,
        )
    } else {
        None
    };

    let mut diff_opts = DiffOptions::new();
    let mut diff = repo
        .diff_tree_to_tree(
            parent_tree.as_ref(),
            Some(&commit_tree),
            Some(&mut diff_opts),
        )
        .map_err(|e| TurbulenceError::Git(format!("failed to compute diff: {e}")))?;

    let mut find_opts = DiffFindOptions::new();
    find_opts.renames(true).copies(true);
    diff.find_similar(Some(&mut find_opts))
        .map_err(|e| TurbulenceError::Git(format!("failed to find renames: {e}")))?;

    Ok(diff)
}

fn numstat_rows(diff: &Diff<'_>) -> Result<Vec<NumstatRow>> {
    let mut rows = Vec::with_capacity(diff.deltas().len());

    for (idx, delta) in diff.deltas().enumerate() {
        let Some(path) = delta.new_file().path().or_else(|| delta.old_file().path()) else {
            continue;
        };
        let path = path.to_string_lossy().replace('\\', "/");

        let (added, deleted) = match Patch::from_diff(diff, idx)
            .map_err(|e| TurbulenceError::Git(format!("failed to build patch: {e}")))?
        {
            Some(patch) => {
                let (_, added, deleted) = patch
                    .line_stats()
                    .map_err(|e| TurbulenceError::Git(format!("failed to count lines: {e}")))?;
                (added as u64, deleted as u64)
            }
            None => (0, 0),
        };

        rows.push(NumstatRow {
            added,
            deleted,
            path,
        });
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestRepo;

    #[test]
    fn rows_are_newest_first_with_line_counts() {
        let repo = TestRepo::new();
        repo.commit("lib/a.rb", "a\nb\nc\n", 1_000);
        repo.commit("lib/a.rb", "a\nB\nc\n", 2_000);
        repo.commit("lib/a.rb", "a\nB\nc\nd\ne\nf\ng\n", 3_000);

        let rows = Git2History.numstat(repo.path()).unwrap();
        let counts: Vec<u64> = rows
            .iter()
            .filter(|r| r.path == "lib/a.rb")
            .map(NumstatRow::lines_changed)
            .collect();
        assert_eq!(counts, vec![4, 2, 3]);
    }

    #[test]
    fn deleted_file_is_reported_under_old_path() {
        let repo = TestRepo::new();
        repo.commit("lib/gone.rb", "x\ny\n", 1_000);
        repo.remove("lib/gone.rb", 2_000);

        let rows = Git2History.numstat(repo.path()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].path, "lib/gone.rb");
        assert_eq!((rows[0].added, rows[0].deleted), (0, 2));
    }

    #[test]
    fn binary_content_counts_zero_lines() {
        let repo = TestRepo::new();
        repo.commit_bytes("lib/blob.rb", b"\x00\x01\x02binary\x00", 1_000);

        let rows = Git2History.numstat(repo.path()).unwrap();
        let total: u64 = rows
            .iter()
            .filter(|r| r.path == "lib/blob.rb")
            .map(NumstatRow::lines_changed)
            .sum();
        assert_eq!(total, 0);
    }

    #[test]
    fn empty_repository_has_no_rows() {
        let repo = TestRepo::new();
        let rows = Git2History.numstat(repo.path()).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn non_repository_is_a_git_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Git2History.numstat(dir.path()).unwrap_err();
        assert!(matches!(err, TurbulenceError::Git(_)));
    }
}

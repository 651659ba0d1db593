//! Per-file churn aggregation.
//!
//! Groups change records by file and sums each file's change sizes, leaving
//! out the last (oldest) one. The oldest change is usually the import or
//! creation of the file, and counting it would let one-off bulk additions
//! outweigh the file's real edit history.

use std::collections::{BTreeSet, HashMap};

use turbulence_core::{ChangeRecord, ChurnEntry, MetricsMap, Phase, ProgressReporter};

/// Aggregate change records into one churn entry per file.
///
/// `changes` must be in history order, newest first. For each file the last
/// record in that order is dropped before summing, so a file with a single
/// recorded change gets a churn of `0`. Entries come back in order of each
/// file's first appearance.
///
/// # Examples
///
/// ```
/// use turbulence_core::ChangeRecord;
/// use turbulence_churn::churn::aggregate_churn;
///
/// let changes = vec![
///     ChangeRecord::new("lib/a.rb", 3),
///     ChangeRecord::new("lib/b.rb", 7),
///     ChangeRecord::new("lib/a.rb", 5),
///     ChangeRecord::new("lib/a.rb", 2),
/// ];
/// let churn = aggregate_churn(&changes);
/// assert_eq!(churn[0].path, "lib/a.rb");
/// assert_eq!(churn[0].churn, 8);
/// assert_eq!(churn[1].churn, 0);
/// ```
pub fn aggregate_churn(changes: &[ChangeRecord]) -> Vec<ChurnEntry> {
    let mut order: Vec<&str> = Vec::new();
    let mut by_file: HashMap<&str, Vec<u64>> = HashMap::new();

    for change in changes {
        by_file
            .entry(change.path.as_str())
            .or_insert_with(|| {
                order.push(change.path.as_str());
                Vec::new()
            })
            .push(change.lines_changed);
    }

    order
        .into_iter()
        .map(|path| {
            let mut sizes = by_file.remove(path).unwrap_or_default();
            sizes.pop();
            ChurnEntry {
                path: path.to_string(),
                churn: sizes.into_iter().fold(0u64, u64::saturating_add),
            }
        })
        .collect()
}

/// Write churn into `metrics` for files in the discovered source set.
///
/// Entries for files outside `source_files` are discarded. Returns the number
/// of files written; `progress` advances once per written file.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeSet;
/// use turbulence_core::{ChurnEntry, MetricsMap, Silent};
/// use turbulence_churn::churn::record_churn;
///
/// let entries = vec![
///     ChurnEntry { path: "lib/a.rb".into(), churn: 8 },
///     ChurnEntry { path: "script/tool.rb".into(), churn: 40 },
/// ];
/// let sources: BTreeSet<String> = ["lib/a.rb".to_string()].into();
/// let mut metrics = MetricsMap::new();
///
/// assert_eq!(record_churn(&entries, &sources, &mut metrics, &Silent), 1);
/// assert_eq!(metrics.get("lib/a.rb").unwrap().churn, Some(8));
/// assert!(!metrics.contains("script/tool.rb"));
/// ```
pub fn record_churn(
    entries: &[ChurnEntry],
    source_files: &BTreeSet<String>,
    metrics: &mut MetricsMap,
    progress: &dyn ProgressReporter,
) -> usize {
    let selected: Vec<&ChurnEntry> = entries
        .iter()
        .filter(|e| source_files.contains(&e.path))
        .collect();

    progress.begin(Phase::Churn, selected.len());
    for entry in &selected {
        metrics.entry(&entry.path).churn = Some(entry.churn);
        progress.advance();
    }
    progress.finish(Phase::Churn);

    selected.len()
}

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt::Write;

use serde::Serialize;
use turbulence_core::{FileMetrics, MetricsMap, OutputFormat, Result};

/// One point in a churn/complexity scatter plot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScatterPoint {
    /// Churn.
    pub x: u64,
    /// Complexity.
    pub y: f64,
    pub file_path: String,
}

/// Points for every file in one directory.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScatterSeries {
    /// Parent directory of the files, e.g. `app/models`.
    pub name: String,
    pub data: Vec<ScatterPoint>,
}

/// Render `metrics` in `format`.
///
/// `limit` caps the number of rows in the text and Markdown tables; JSON and
/// plot output always contain every file.
///
/// # Errors
///
/// Returns [`TurbulenceError::Serialization`](turbulence_core::TurbulenceError::Serialization) if JSON encoding fails.
///
/// # Examples
///
/// ```
/// use turbulence_core::{MetricsMap, OutputFormat};
/// use turbulence_engine::output::render;
///
/// let mut metrics = MetricsMap::new();
/// metrics.entry("lib/a.rb").churn = Some(8);
/// let json = render(&metrics, OutputFormat::Json, None).unwrap();
/// assert!(json.contains("\"lib/a.rb\""));
/// ```
pub fn render(
    metrics: &MetricsMap,
    format: OutputFormat,
    limit: Option<usize>,
) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(format_text(metrics, limit)),
        OutputFormat::Markdown => Ok(format_markdown(metrics, limit)),
        OutputFormat::Json => format_json(metrics),
        OutputFormat::Plot => format_plot(metrics),
    }
}

/// Pretty-printed `{path: {churn, complexity}}` JSON.
pub fn format_json(metrics: &MetricsMap) -> Result<String> {
    let mut json = serde_json::to_string_pretty(metrics)?;
    json.push('\n');
    Ok(json)
}

/// Pretty-printed scatter series, see [`scatter_series`].
pub fn format_plot(metrics: &MetricsMap) -> Result<String> {
    let mut json = serde_json::to_string_pretty(&scatter_series(metrics))?;
    json.push('\n');
    Ok(json)
}

/// Group files that have both metrics into one series per parent directory.
///
/// Files missing either value cannot be placed on the plot and are left out.
/// Series are sorted by directory name; points keep path order.
///
/// # Examples
///
/// ```
/// use turbulence_core::MetricsMap;
/// use turbulence_engine::output::scatter_series;
///
/// let mut metrics = MetricsMap::new();
/// *metrics.entry("app/models/user.rb") = turbulence_core::FileMetrics {
///     churn: Some(8),
///     complexity: Some(12.5),
/// };
/// metrics.entry("lib/only_churn.rb").churn = Some(3);
///
/// let series = scatter_series(&metrics);
/// assert_eq!(series.len(), 1);
/// assert_eq!(series[0].name, "app/models");
/// assert_eq!(series[0].data[0].x, 8);
/// ```
pub fn scatter_series(metrics: &MetricsMap) -> Vec<ScatterSeries> {
    let mut by_dir: BTreeMap<String, Vec<ScatterPoint>> = BTreeMap::new();

    for (path, m) in metrics.iter() {
        let (Some(churn), Some(complexity)) = (m.churn, m.complexity) else {
            continue;
        };
        let dir = match path.rfind('/') {
            Some(idx) => &path[..idx],
            None => ".",
        };
        by_dir.entry(dir.to_string()).or_default().push(ScatterPoint {
            x: churn,
            y: complexity,
            file_path: path.to_string(),
        });
    }

    by_dir
        .into_iter()
        .map(|(name, data)| ScatterSeries { name, data })
        .collect()
}

/// Files ordered by churn × complexity, highest first.
///
/// Files missing either value follow all complete ones, ordered by whichever
/// value they have. Ties break on path.
pub fn ranked(metrics: &MetricsMap) -> Vec<(&str, &FileMetrics)> {
    let mut rows: Vec<(&str, &FileMetrics)> = metrics.iter().collect();
    rows.sort_by(|(pa, a), (pb, b)| {
        b.is_complete()
            .cmp(&a.is_complete())
            .then_with(|| {
                turbulence(b)
                    .partial_cmp(&turbulence(a))
                    .unwrap_or(Ordering::Equal)
            })
            .then_with(|| pa.cmp(pb))
    });
    rows
}

fn turbulence(m: &FileMetrics) -> f64 {
    match (m.churn, m.complexity) {
        (Some(churn), Some(complexity)) => churn as f64 * complexity,
        (Some(churn), None) => churn as f64,
        (None, Some(complexity)) => complexity,
        (None, None) => 0.0,
    }
}

fn churn_cell(m: &FileMetrics) -> String {
    m.churn.map_or_else(|| "-".into(), |c| c.to_string())
}

fn complexity_cell(m: &FileMetrics) -> String {
    m.complexity
        .map_or_else(|| "-".into(), |c| format!("{c:.1}"))
}

fn summary_line(metrics: &MetricsMap) -> String {
    format!(
        "{} files ({} with churn, {} with complexity)",
        metrics.len(),
        metrics.churn_count(),
        metrics.complexity_count()
    )
}

/// Plain-text ranked table.
///
/// # Examples
///
/// ```
/// use turbulence_core::MetricsMap;
/// use turbulence_engine::output::format_text;
///
/// assert!(format_text(&MetricsMap::new(), None).contains("No source files"));
/// ```
pub fn format_text(metrics: &MetricsMap, limit: Option<usize>) -> String {
    let mut out = String::new();
    if metrics.is_empty() {
        out.push_str("No source files with churn or complexity found.\n");
        return out;
    }

    let rows = ranked(metrics);
    let shown = limit.unwrap_or(rows.len()).min(rows.len());
    let _ = writeln!(out, "Churn vs. complexity: {}", summary_line(metrics));
    let _ = writeln!(out, "{:-<72}", "");
    for (i, (path, m)) in rows.iter().take(shown).enumerate() {
        let _ = writeln!(
            out,
            "{:>3}. {:<44} churn={:<6} complexity={}",
            i + 1,
            path,
            churn_cell(m),
            complexity_cell(m),
        );
    }
    if shown < rows.len() {
        let _ = writeln!(out, "     ... {} more", rows.len() - shown);
    }
    out
}

/// GitHub-flavored Markdown ranked table.
pub fn format_markdown(metrics: &MetricsMap, limit: Option<usize>) -> String {
    let mut out = String::from("# Churn vs. Complexity\n\n");
    let _ = writeln!(out, "**{}**\n", summary_line(metrics));
    if metrics.is_empty() {
        out.push_str("No source files with churn or complexity found.\n");
        return out;
    }

    let rows = ranked(metrics);
    let shown = limit.unwrap_or(rows.len()).min(rows.len());
    out.push_str("| Rank | File | Churn | Complexity |\n");
    out.push_str("|------|------|-------|------------|\n");
    for (i, (path, m)) in rows.iter().take(shown).enumerate() {
        let _ = writeln!(
            out,
            "| {} | `{}` | {} | {} |",
            i + 1,
            path,
            churn_cell(m),
            complexity_cell(m),
        );
    }
    if shown < rows.len() {
        let _ = writeln!(out, "\n_{} more files not shown._", rows.len() - shown);
    }
    out
}

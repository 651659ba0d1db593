use std::path::Path;

use glob::MatchOptions;
use turbulence_core::{Result, TurbulenceError, SOURCE_DIRS, SOURCE_EXTENSION};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: true,
};

/// Find the source files measured under `root`.
///
/// Searches `app/models`, `app/controllers`, `app/helpers` and `lib`
/// recursively for `*.rb` files. Dot-files are skipped, as are directories
/// whose names happen to end in `.rb`.
/// Returned paths are relative to `root`, `/`-separated, grouped by source
/// directory in the order above and sorted within each.
///
/// # Errors
///
/// Returns [`TurbulenceError::FileNotFound`] if `root` is not a directory.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use turbulence_complexity::discovery::discover_source_files;
///
/// for file in discover_source_files(Path::new(".")).unwrap() {
///     println!("{file}");
/// }
/// ```
pub fn discover_source_files(root: &Path) -> Result<Vec<String>> {
    if !root.is_dir() {
        return Err(TurbulenceError::FileNotFound(root.to_path_buf()));
    }

    let escaped_root = glob::Pattern::escape(&root.to_string_lossy());
    let mut files = Vec::new();

    for dir in SOURCE_DIRS {
        let pattern = format!("{escaped_root}/{dir}/**/*.{SOURCE_EXTENSION}");
        let entries = glob::glob_with(&pattern, MATCH_OPTIONS)
            .map_err(|e| TurbulenceError::Config(format!("bad source pattern {pattern}: {e}")))?;

        let mut found = Vec::new();
        for entry in entries {
            let path = match entry {
                Ok(p) => p,
                Err(_) => continue,
            };
            if !path.is_file() {
                continue;
            }

            let Ok(relative) = path.strip_prefix(root) else {
                continue;
            };
            let relative = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");

            if !files.contains(&relative) && !found.contains(&relative) {
                found.push(relative);
            }
        }

        found.sort();
        files.extend(found);
    }

    Ok(files)
}

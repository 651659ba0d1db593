use once_cell::sync::Lazy;
use regex::Regex;

// Leading whitespace, the score, then anything up to a trailing "total".
static TOTAL_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]+([^:\r\n]+).*total\r?$").expect("total-line pattern is valid")
});

/// Read the score from an analyzer report.
///
/// The score is the first field of the first line that starts with
/// whitespace and ends with the word `total`, e.g. `   12.5: flog total`.
/// Returns `None` if there is no such line, or its first field is not a
/// finite, non-negative number.
///
/// # Examples
///
/// ```
/// use turbulence_complexity::report::parse_average;
///
/// let report = "   12.5: flog total\n    4.2: flog/method average\n";
/// assert_eq!(parse_average(report), Some(12.5));
/// assert_eq!(parse_average("nothing to see"), None);
/// ```
pub fn parse_average(report: &str) -> Option<f64> {
    let captures = TOTAL_LINE.captures(report)?;
    let score: f64 = captures.get(1)?.as_str().trim().parse().ok()?;
    (score.is_finite() && score >= 0.0).then_some(score)
}

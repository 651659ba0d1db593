use std::fmt;

/// A stage of a metrics run, as announced to a [`ProgressReporter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Summing history records into per-file churn.
    Churn,
    /// Running the complexity analyzer over every source file.
    Complexity,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Churn => write!(f, "churn"),
            Phase::Complexity => write!(f, "complexity"),
        }
    }
}

/// Receives progress notifications while metrics are computed.
///
/// The engine calls [`advance`](ProgressReporter::advance) once per file it
/// records a metric for, and [`skipped`](ProgressReporter::skipped) once per
/// file the analyzer could not parse. All methods default to no-ops.
///
/// # Examples
///
/// ```
/// use std::cell::Cell;
/// use turbulence_core::{Phase, ProgressReporter};
///
/// #[derive(Default)]
/// struct Dots(Cell<usize>);
///
/// impl ProgressReporter for Dots {
///     fn advance(&self) {
///         self.0.set(self.0.get() + 1);
///     }
/// }
///
/// let dots = Dots::default();
/// dots.begin(Phase::Churn, 2);
/// dots.advance();
/// dots.advance();
/// assert_eq!(dots.0.get(), 2);
/// ```
pub trait ProgressReporter {
    /// A phase is starting with `total` units of work.
    fn begin(&self, _phase: Phase, _total: usize) {}

    /// One unit of work in the current phase is done.
    fn advance(&self) {}

    /// `path` was skipped; `reason` is a one-line diagnostic.
    fn skipped(&self, _path: &str, _reason: &str) {}

    /// The phase has ended.
    fn finish(&self, _phase: Phase) {}
}

/// A reporter that ignores every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct Silent;

impl ProgressReporter for Silent {}

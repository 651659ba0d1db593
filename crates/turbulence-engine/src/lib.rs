//! Churn × complexity metrics for a project.
//!
//! [`Turbulence`] runs the churn pass and the complexity pass over one
//! project root and owns the resulting [`MetricsMap`](turbulence_core::MetricsMap).
//! [`output`] renders it for people or for a scatter-plot renderer.

pub mod engine;
pub mod output;

pub use engine::{analyzer_for, history_source_for, Turbulence};
pub use output::render;

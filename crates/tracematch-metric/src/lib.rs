//! Similarity metrics between a reference and an evaluated signal segment.
//!
//! Pure math library with zero I/O. Every metric is a variant of the closed
//! [`Metric`] enum carrying an immutable configuration, and scores a pair of
//! equally long segments into a [`MetricResult`](tracematch_signal::MetricResult)
//! whose per-sample curve lies in `[0, 1]` (1 = perfect match). Degenerate
//! denominators resolve to documented fallbacks instead of NaN.

mod area;
mod assignment;
mod correlation;
mod corridor;
mod error;
mod euclidean;
mod iso;
mod magnitude;
mod metric;
mod ospa;
mod phase;
mod registry;
mod slope;
mod stats;
mod warp;
mod window;

pub use area::AreaValidationConfig;
pub use corridor::{CorridorConfig, IsoCorridorConfig};
pub use error::MetricError;
pub use iso::{IsoConfig, IsoSmallConfig};
pub use magnitude::MagnitudeConfig;
pub use metric::Metric;
pub use ospa::OspaConfig;
pub use phase::{PhaseAlignment, PhaseConfig, ShiftDirection, align};
pub use registry::MetricRegistry;
pub use slope::SlopeConfig;
pub use warp::{Dtw, WarpStep, WarpingPath};
pub use window::WarpingWindow;

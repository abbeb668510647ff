//! Optimal sub-pattern assignment distance between sample point sets.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use tracematch_signal::{MetricResult, SignalData, samples_in};

use crate::assignment::{CostMatrix, solve};
use crate::error::{MetricError, non_negative, positive};
use crate::stats::redistribute;

/// Configuration for the OSPA metric.
///
/// Samples become points `(value / amplitude * size_y, t)`, so with the
/// default `size_y = 1` a full-amplitude deviation weighs as much as one second
/// of delay.
///
/// # Defaults
///
/// | Parameter         | Default |
/// |-------------------|---------|
/// | `cutoff`          | 0.5     |
/// | `size_y`          | 1.0     |
/// | `interval_time`   | 1.0 s   |
/// | `interval_extent` | 0.2 s   |
/// | `p`               | 1.0     |
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OspaConfig {
    pub(crate) cutoff: f64,
    pub(crate) size_y: f64,
    pub(crate) interval_time: f64,
    pub(crate) interval_extent: f64,
    pub(crate) p: f64,
}

impl Default for OspaConfig {
    fn default() -> Self {
        Self {
            cutoff: 0.5,
            size_y: 1.0,
            interval_time: 1.0,
            interval_extent: 0.2,
            p: 1.0,
        }
    }
}

impl OspaConfig {
    /// Create a configuration with the given distance cutoff.
    ///
    /// # Errors
    ///
    /// Returns [`MetricError::InvalidParameter`] unless `cutoff` is finite and positive.
    pub fn new(cutoff: f64) -> Result<Self, MetricError> {
        Ok(Self {
            cutoff: positive("cutoff", cutoff)?,
            ..Self::default()
        })
    }

    /// Set the value-axis scale.
    ///
    /// # Errors
    ///
    /// Returns [`MetricError::InvalidParameter`] unless `size_y` is finite and positive.
    pub fn with_size_y(mut self, size_y: f64) -> Result<Self, MetricError> {
        self.size_y = positive("size_y", size_y)?;
        Ok(self)
    }

    /// Set the length of each evaluated interval in seconds.
    ///
    /// # Errors
    ///
    /// Returns [`MetricError::InvalidParameter`] unless `interval_time` is finite and positive.
    pub fn with_interval_time(mut self, interval_time: f64) -> Result<Self, MetricError> {
        self.interval_time = positive("interval_time", interval_time)?;
        Ok(self)
    }

    /// Set how far the reference window reaches past each interval, in seconds.
    ///
    /// # Errors
    ///
    /// Returns [`MetricError::InvalidParameter`] for a negative or non-finite extent.
    pub fn with_interval_extent(mut self, interval_extent: f64) -> Result<Self, MetricError> {
        self.interval_extent = non_negative("interval_extent", interval_extent)?;
        Ok(self)
    }

    /// Set the distance exponent.
    ///
    /// # Errors
    ///
    /// Returns [`MetricError::InvalidParameter`] unless `p` is finite and positive.
    pub fn with_p(mut self, p: f64) -> Result<Self, MetricError> {
        self.p = positive("p", p)?;
        Ok(self)
    }

    /// Return the distance cutoff.
    #[must_use]
    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    /// Return the value-axis scale.
    #[must_use]
    pub fn size_y(&self) -> f64 {
        self.size_y
    }

    /// Return the interval length in seconds.
    #[must_use]
    pub fn interval_time(&self) -> f64 {
        self.interval_time
    }

    /// Return the reference window extent in seconds.
    #[must_use]
    pub fn interval_extent(&self) -> f64 {
        self.interval_extent
    }

    /// Return the distance exponent.
    #[must_use]
    pub fn p(&self) -> f64 {
        self.p
    }
}

#[derive(Debug, Clone, Copy)]
struct Point {
    y: f64,
    t: f64,
}

impl Point {
    fn distance(&self, other: &Point) -> f64 {
        (self.y - other.y).hypot(self.t - other.t)
    }
}

/// Score of one evaluated interval against its reference window.
struct IntervalScore {
    distance: f64,
    curve: Vec<f64>,
}

fn score_interval(config: &OspaConfig, evaluated: &[Point], reference: &[Point]) -> IntervalScore {
    let cutoff_p = config.cutoff.powf(config.p);
    let matrix = CostMatrix::from_fn(evaluated.len(), reference.len(), |i, j| {
        evaluated[i].distance(&reference[j]).min(config.cutoff).powf(config.p)
    });

    // Unmatched evaluated points (window smaller than interval) pay the cutoff.
    let mut costs = vec![cutoff_p; evaluated.len()];
    for (row, col) in solve(&matrix) {
        costs[row] = matrix.get(row, col);
    }

    let m = evaluated.len() as f64;
    let distance = (costs.iter().sum::<f64>() / m).powf(1.0 / config.p);
    let normalized = (1.0 - distance / config.cutoff).clamp(0.0, 1.0);
    let weights: Vec<f64> = costs.iter().map(|c| 1.0 - c / cutoff_p).collect();

    IntervalScore {
        distance,
        curve: redistribute(&weights, normalized),
    }
}

/// Split the evaluated samples into consecutive intervals and score each
/// against the reference samples within `interval_extent` of it.
///
/// Intervals tumble: they do not overlap, each sample belongs to exactly one
/// interval, and its score comes from that interval's assignment alone. Only
/// the reference window slides past the interval edges by `interval_extent`.
#[instrument(level = "debug", skip_all, fields(len = reference.len()))]
pub(crate) fn ospa(config: &OspaConfig, reference: &SignalData, evaluated: &SignalData) -> MetricResult {
    let amplitude = reference.amplitude();
    let scale = if amplitude == 0.0 {
        1.0
    } else {
        config.size_y / amplitude
    };

    let time = reference.timestamps();
    let to_points = |values: &[f64]| -> Vec<Point> {
        values
            .iter()
            .zip(time)
            .map(|(v, &t)| Point { y: v * scale, t })
            .collect()
    };
    let ref_points = to_points(reference.values());
    let eval_points = to_points(evaluated.values());

    let n = ref_points.len();
    let step = reference.sample_time_step();
    let (interval, extent) = if step > 0.0 {
        (
            samples_in(config.interval_time, step).max(1),
            samples_in(config.interval_extent, step),
        )
    } else {
        (n.max(1), 0)
    };

    let mut scores = Vec::with_capacity(n);
    let mut distances = Vec::with_capacity(n);
    for start in (0..n).step_by(interval) {
        let end = (start + interval).min(n);
        let window = start.saturating_sub(extent)..(end + extent).min(n);
        let part = score_interval(config, &eval_points[start..end], &ref_points[window]);
        distances.extend(std::iter::repeat_n(part.distance, end - start));
        scores.extend(part.curve);
    }

    debug!(interval, extent, mean = scores.iter().sum::<f64>() / n.max(1) as f64, "ospa scored");

    MetricResult::new(reference.clone(), evaluated.clone(), reference.with_values(scores))
        .with_result_metadata("ospa_distance", reference.with_values(distances))
}

//! Tolerance-band metrics around the reference signal.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use tracematch_signal::{MetricResult, SignalData};

use crate::error::{MetricError, non_negative};

/// Configuration for the time-tolerant corridor metric.
///
/// Widths are fractions of the reference amplitude; delays are seconds.
///
/// | Parameter     | Meaning |
/// |---------------|---------|
/// | `inner`       | Vertical distance scored as a perfect match |
/// | `outer`       | Vertical distance scored as a full miss |
/// | `delay_inner` | Time offset tolerated without penalty |
/// | `delay_outer` | Time offset at which a match no longer counts |
/// | `regression`  | Exponent on each normalized distance component (default 2) |
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorridorConfig {
    pub(crate) inner: f64,
    pub(crate) outer: f64,
    pub(crate) delay_inner: f64,
    pub(crate) delay_outer: f64,
    pub(crate) regression: f64,
}

impl CorridorConfig {
    /// Create a corridor configuration.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`MetricError::InvalidParameter`] | Any width or delay is negative or not finite |
    /// | [`MetricError::InvalidParameter`] | `outer < inner` or `delay_outer < delay_inner` |
    pub fn new(inner: f64, outer: f64, delay_inner: f64, delay_outer: f64) -> Result<Self, MetricError> {
        let inner = non_negative("inner", inner)?;
        let outer = non_negative("outer", outer)?;
        let delay_inner = non_negative("delay_inner", delay_inner)?;
        let delay_outer = non_negative("delay_outer", delay_outer)?;
        if outer < inner {
            return Err(MetricError::InvalidParameter {
                name: "outer",
                value: outer,
                reason: "must not be smaller than inner",
            });
        }
        if delay_outer < delay_inner {
            return Err(MetricError::InvalidParameter {
                name: "delay_outer",
                value: delay_outer,
                reason: "must not be smaller than delay_inner",
            });
        }
        Ok(Self {
            inner,
            outer,
            delay_inner,
            delay_outer,
            regression: 2.0,
        })
    }

    /// Set the exponent applied to each distance component.
    ///
    /// # Errors
    ///
    /// Returns [`MetricError::InvalidParameter`] unless `regression` is finite and positive.
    pub fn with_regression(mut self, regression: f64) -> Result<Self, MetricError> {
        self.regression = crate::error::positive("regression", regression)?;
        Ok(self)
    }

    /// Return the inner width.
    #[must_use]
    pub fn inner(&self) -> f64 {
        self.inner
    }

    /// Return the outer width.
    #[must_use]
    pub fn outer(&self) -> f64 {
        self.outer
    }

    /// Return the tolerated delay.
    #[must_use]
    pub fn delay_inner(&self) -> f64 {
        self.delay_inner
    }

    /// Return the maximum delay.
    #[must_use]
    pub fn delay_outer(&self) -> f64 {
        self.delay_outer
    }

    /// Return the distance exponent.
    #[must_use]
    pub fn regression(&self) -> f64 {
        self.regression
    }
}

/// Normalized position of `x` between `inner` and `outer`, clipped to `[0, 1]`.
fn ramp(x: f64, inner: f64, outer: f64) -> f64 {
    if outer > inner {
        ((x - inner) / (outer - inner)).clamp(0.0, 1.0)
    } else if x > inner {
        1.0
    } else {
        0.0
    }
}

/// Score every evaluated sample by its distance to the nearest reference
/// sample inside the delay window.
///
/// Vertical and horizontal distances are each normalized into `[0, 1]`,
/// raised to `regression`, and combined as `sqrt(v^r + h^r)`. The sample
/// score is `1 - min(distance)`, floored at 0. The delay window is closed, so
/// with `delay_outer == 0` the time-aligned reference sample is still scored.
pub(crate) fn corridor(config: &CorridorConfig, reference: &SignalData, evaluated: &SignalData) -> MetricResult {
    let amplitude = match reference.amplitude() {
        a if a == 0.0 => 1.0,
        a => a,
    };
    let rt = reference.timestamps();
    let rv = reference.values();
    let et = evaluated.timestamps();
    let ev = evaluated.values();

    let scores: Vec<f64> = if config.inner == 0.0 {
        rv.iter()
            .zip(ev)
            .map(|(r, e)| if r == e { 1.0 } else { 0.0 })
            .collect()
    } else {
        let inner = amplitude * config.inner;
        let outer = amplitude * config.outer;
        et.iter()
            .zip(ev)
            .map(|(&t, &value)| {
                let lo = rt.partition_point(|&x| x < t - config.delay_outer);
                let hi = rt.partition_point(|&x| x <= t + config.delay_outer);
                let nearest = (lo..hi)
                    .map(|j| {
                        let v = ramp((rv[j] - value).abs(), inner, outer);
                        let h = ramp((rt[j] - t).abs(), config.delay_inner, config.delay_outer);
                        (v.powf(config.regression) + h.powf(config.regression)).sqrt()
                    })
                    .fold(f64::INFINITY, f64::min);
                (1.0 - nearest).max(0.0)
            })
            .collect()
    };

    debug!(samples = scores.len(), "corridor scored");
    MetricResult::new(reference.clone(), evaluated.clone(), reference.with_values(scores))
}

/// Configuration for the ISO 18571 corridor score.
///
/// # Defaults
///
/// | Parameter    | Default |
/// |--------------|---------|
/// | `inner`      | 0.05    |
/// | `outer`      | 0.5     |
/// | `regression` | 2.0     |
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IsoCorridorConfig {
    pub(crate) inner: f64,
    pub(crate) outer: f64,
    pub(crate) regression: f64,
}

impl Default for IsoCorridorConfig {
    fn default() -> Self {
        Self {
            inner: 0.05,
            outer: 0.5,
            regression: 2.0,
        }
    }
}

impl IsoCorridorConfig {
    /// Create a configuration with the given inner and outer widths.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`MetricError::InvalidParameter`] | A width is negative or not finite |
    /// | [`MetricError::InvalidParameter`] | `outer < inner` |
    pub fn new(inner: f64, outer: f64) -> Result<Self, MetricError> {
        let inner = non_negative("inner", inner)?;
        let outer = non_negative("outer", outer)?;
        if outer < inner {
            return Err(MetricError::InvalidParameter {
                name: "outer",
                value: outer,
                reason: "must not be smaller than inner",
            });
        }
        Ok(Self {
            inner,
            outer,
            ..Self::default()
        })
    }

    /// Set the interpolation exponent between the inner and outer band.
    ///
    /// # Errors
    ///
    /// Returns [`MetricError::InvalidParameter`] for a negative or non-finite exponent.
    pub fn with_regression(mut self, regression: f64) -> Result<Self, MetricError> {
        self.regression = non_negative("regression", regression)?;
        Ok(self)
    }

    /// Return the inner width.
    #[must_use]
    pub fn inner(&self) -> f64 {
        self.inner
    }

    /// Return the outer width.
    #[must_use]
    pub fn outer(&self) -> f64 {
        self.outer
    }

    /// Return the interpolation exponent.
    #[must_use]
    pub fn regression(&self) -> f64 {
        self.regression
    }

    fn sample_score(&self, inner: f64, outer: f64, a: f64, b: f64) -> f64 {
        if inner == 0.0 {
            return if a == b { 1.0 } else { 0.0 };
        }
        let diff = (a - b).abs();
        if diff < inner {
            1.0
        } else if diff > outer {
            0.0
        } else {
            ((outer - diff) / (outer - inner)).powf(self.regression)
        }
    }
}

/// Sample-wise corridor score without time tolerance.
///
/// Emits the four band boundaries as input metadata.
pub(crate) fn iso_corridor(
    config: &IsoCorridorConfig,
    reference: &SignalData,
    evaluated: &SignalData,
) -> MetricResult {
    let amplitude = reference.amplitude();
    if amplitude == 0.0 {
        warn!("reference amplitude is 0, corridor collapses to exact matching");
    }
    let inner = amplitude * config.inner;
    let outer = amplitude * config.outer;

    let scores = reference
        .values()
        .iter()
        .zip(evaluated.values())
        .map(|(&a, &b)| config.sample_score(inner, outer, a, b))
        .collect();

    let offset = |delta: f64| {
        reference.with_values(reference.values().iter().map(|v| v + delta).collect())
    };

    MetricResult::new(reference.clone(), evaluated.clone(), reference.with_values(scores))
        .with_input_metadata("outer_corridor_top", offset(outer))
        .with_input_metadata("inner_corridor_top", offset(inner))
        .with_input_metadata("outer_corridor_bottom", offset(-outer))
        .with_input_metadata("inner_corridor_bottom", offset(-inner))
}

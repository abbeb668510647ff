//! Weighted ISO 18571 composites.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use tracematch_signal::{MetricResult, SignalData};

use crate::corridor::{IsoCorridorConfig, iso_corridor};
use crate::magnitude::{self, MagnitudeConfig};
use crate::phase::{PhaseConfig, align};
use crate::slope::{self, SlopeConfig};

const CORRIDOR_WEIGHT: f64 = 0.4;
const MAGNITUDE_WEIGHT: f64 = 0.2;
const PHASE_WEIGHT: f64 = 0.2;
const SLOPE_WEIGHT: f64 = 0.2;

/// Sub-metric configurations of the full ISO score.
///
/// When the magnitude and slope alignment equal `phase`, the shift search
/// runs once and is shared by all three.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct IsoConfig {
    /// Corridor sub-score.
    pub corridor: IsoCorridorConfig,
    /// Phase sub-score.
    pub phase: PhaseConfig,
    /// Magnitude sub-score.
    pub magnitude: MagnitudeConfig,
    /// Slope sub-score.
    pub slope: SlopeConfig,
}

/// `0.4 corridor + 0.2 magnitude + 0.2 phase + 0.2 slope`.
///
/// Sub-score curves are kept as result metadata under `corridor`,
/// `magnitude`, `phase`, and `slope`; the sub-metrics' input metadata is merged.
#[instrument(level = "debug", skip_all, fields(len = reference.len()))]
pub(crate) fn iso(config: &IsoConfig, reference: &SignalData, evaluated: &SignalData) -> MetricResult {
    let corridor = iso_corridor(&config.corridor, reference, evaluated);

    let phase = align(&config.phase, reference, evaluated);
    let magnitude_alignment = if config.magnitude.alignment == config.phase {
        None
    } else {
        Some(align(&config.magnitude.alignment, reference, evaluated))
    };
    let slope_alignment = if config.slope.alignment == config.phase {
        None
    } else {
        Some(align(&config.slope.alignment, reference, evaluated))
    };

    let magnitude = magnitude::score_aligned(
        &config.magnitude,
        magnitude_alignment.as_ref().unwrap_or(&phase),
    );
    let slope = slope::score_aligned(&config.slope, slope_alignment.as_ref().unwrap_or(&phase));

    let scores: Vec<f64> = corridor
        .result
        .values()
        .iter()
        .map(|c| {
            CORRIDOR_WEIGHT * c
                + MAGNITUDE_WEIGHT * magnitude.score
                + PHASE_WEIGHT * phase.score
                + SLOPE_WEIGHT * slope.score
        })
        .collect();

    debug!(
        corridor = corridor.score_mean(),
        magnitude = magnitude.score,
        phase = phase.score,
        slope = slope.score,
        "iso sub-scores"
    );

    let mut result = MetricResult::new(reference.clone(), evaluated.clone(), reference.with_values(scores))
        .with_result_metadata("corridor", corridor.result.clone())
        .with_result_metadata("magnitude", reference.filled(magnitude.score))
        .with_result_metadata("phase", reference.filled(phase.score))
        .with_result_metadata("slope", reference.filled(slope.score))
        .with_input_metadata("ref_warped", magnitude.reference_warped)
        .with_input_metadata("eval_warped", magnitude.evaluated_warped)
        .with_input_metadata("reference_slope", slope.reference_slope)
        .with_input_metadata("evaluated_slope", slope.evaluated_slope);
    result.input_metadata.extend(corridor.input_metadata);
    phase.annotate(result)
}

/// Configuration of the reduced ISO score used for quick screening.
///
/// # Defaults
///
/// | Parameter  | Default |
/// |------------|---------|
/// | `corridor` | [`IsoCorridorConfig::default`] |
/// | `phase`    | allowed shift 0.3 |
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IsoSmallConfig {
    /// Corridor sub-score.
    pub corridor: IsoCorridorConfig,
    /// Phase sub-score.
    pub phase: PhaseConfig,
}

impl Default for IsoSmallConfig {
    fn default() -> Self {
        Self {
            corridor: IsoCorridorConfig::default(),
            phase: PhaseConfig {
                allowed_time_shift: 0.3,
                ..PhaseConfig::default()
            },
        }
    }
}

impl IsoSmallConfig {
    /// Use `phase` as the shift tolerance.
    #[must_use]
    pub fn with_phase(mut self, phase: PhaseConfig) -> Self {
        self.phase = phase;
        self
    }
}

/// `0.5 corridor + 0.5 phase`.
pub(crate) fn iso_small(config: &IsoSmallConfig, reference: &SignalData, evaluated: &SignalData) -> MetricResult {
    let corridor = iso_corridor(&config.corridor, reference, evaluated);
    let phase = align(&config.phase, reference, evaluated);

    let scores = corridor
        .result
        .values()
        .iter()
        .map(|c| 0.5 * c + 0.5 * phase.score)
        .collect();

    let mut result = MetricResult::new(reference.clone(), evaluated.clone(), reference.with_values(scores))
        .with_result_metadata("corridor", corridor.result.clone())
        .with_result_metadata("phase", reference.filled(phase.score));
    result.input_metadata.extend(corridor.input_metadata);
    phase.annotate(result)
}

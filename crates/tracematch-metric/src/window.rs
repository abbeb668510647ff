//! Warping window for banded dynamic time warping.

use std::ops::Range;

use serde::{Deserialize, Serialize};

/// Band restricting which cells of the DTW cost matrix may be visited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarpingWindow {
    /// Every cell is reachable.
    #[default]
    Unconstrained,

    /// Sakoe-Chiba band: cell `(i, j)` is valid only if `|i - j| <= radius`.
    SakoeChiba(usize),
}

impl WarpingWindow {
    /// Sakoe-Chiba band whose radius is `floor(fraction * len)`.
    #[must_use]
    pub fn from_fraction(fraction: f64, len: usize) -> Self {
        Self::SakoeChiba((fraction.max(0.0) * len as f64).floor() as usize)
    }

    /// Widen a banded window so the final cell of an `n x m` matrix is reachable.
    #[must_use]
    pub(crate) fn covering(self, n: usize, m: usize) -> Self {
        match self {
            Self::Unconstrained => self,
            Self::SakoeChiba(r) => Self::SakoeChiba(r.max(n.abs_diff(m))),
        }
    }

    /// Valid column range for `row` in a matrix with `n_cols` columns.
    #[must_use]
    pub fn column_range(&self, row: usize, n_cols: usize) -> Range<usize> {
        match self {
            Self::Unconstrained => 0..n_cols,
            Self::SakoeChiba(r) => {
                let start = row.saturating_sub(*r).min(n_cols);
                let end = (row + r + 1).min(n_cols);
                start..end
            }
        }
    }

    /// Widest column range any row can have.
    #[must_use]
    pub fn band_width(&self, n_cols: usize) -> usize {
        match self {
            Self::Unconstrained => n_cols,
            Self::SakoeChiba(r) => (2 * r + 1).min(n_cols),
        }
    }
}

//! Banded dynamic time warping with full path traceback.

use tracing::instrument;

use tracematch_signal::SignalData;

use crate::window::WarpingWindow;

/// One aligned index pair of a warping path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WarpStep {
    /// Index into the reference series.
    pub reference: usize,
    /// Index into the evaluated series.
    pub evaluated: usize,
}

/// Monotone sequence of index pairs from `(0, 0)` to `(n - 1, m - 1)`.
#[derive(Debug, Clone, PartialEq)]
pub struct WarpingPath {
    steps: Vec<WarpStep>,
    cost: f64,
}

impl WarpingPath {
    /// Return the aligned index pairs.
    #[must_use]
    pub fn steps(&self) -> &[WarpStep] {
        &self.steps
    }

    /// Accumulated squared-difference cost along the path.
    #[must_use]
    pub fn cost(&self) -> f64 {
        self.cost
    }

    /// Return the number of steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Return true if the path has no steps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Resample both signals along the path.
    ///
    /// Each step yields one sample per output, timestamped at the midpoint of
    /// the two matched timestamps. Both outputs share that time axis.
    #[must_use]
    pub fn apply(&self, reference: &SignalData, evaluated: &SignalData) -> (SignalData, SignalData) {
        let (rt, rv) = (reference.timestamps(), reference.values());
        let (et, ev) = (evaluated.timestamps(), evaluated.values());

        let timestamps: Vec<f64> = self
            .steps
            .iter()
            .map(|s| (rt[s.reference] + et[s.evaluated]) / 2.0)
            .collect();
        let ref_values = self.steps.iter().map(|s| rv[s.reference]).collect();
        let eval_values = self.steps.iter().map(|s| ev[s.evaluated]).collect();

        (
            SignalData::from_parts(timestamps.clone(), ref_values),
            SignalData::from_parts(timestamps, eval_values),
        )
    }
}

/// Dynamic time warping under a [`WarpingWindow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dtw {
    window: WarpingWindow,
}

impl Dtw {
    /// Create a DTW aligner with the given window.
    #[must_use]
    pub fn new(window: WarpingWindow) -> Self {
        Self { window }
    }

    /// Return the warping window.
    #[must_use]
    pub fn window(&self) -> WarpingWindow {
        self.window
    }

    /// Compute the optimal warping path between `a` and `b`.
    ///
    /// Local cost is the squared difference; predecessors are diagonal, above
    /// and left, preferring the diagonal on ties. The band is widened if
    /// needed so that `(n - 1, m - 1)` is reachable. Empty inputs yield an
    /// empty path.
    #[must_use]
    #[instrument(level = "trace", skip(a, b), fields(n = a.len(), m = b.len()))]
    pub fn align(&self, a: &[f64], b: &[f64]) -> WarpingPath {
        let n = a.len();
        let m = b.len();
        if n == 0 || m == 0 {
            return WarpingPath {
                steps: Vec::new(),
                cost: 0.0,
            };
        }

        let window = self.window.covering(n, m);
        let bw = window.band_width(m);

        let mut cost = vec![f64::INFINITY; n * bw];
        // 0 = diagonal, 1 = above, 2 = left
        let mut dirs = vec![0u8; n * bw];

        for i in 0..n {
            let cols = window.column_range(i, m);
            let prev_cols = if i > 0 {
                window.column_range(i - 1, m)
            } else {
                0..0
            };

            for j in cols.clone() {
                let c = (a[i] - b[j]).powi(2);
                let local = j - cols.start;
                let idx = i * bw + local;

                if i == 0 && j == 0 {
                    cost[idx] = c;
                    continue;
                }

                let diag = if j > 0 && prev_cols.contains(&(j - 1)) {
                    cost[(i - 1) * bw + (j - 1 - prev_cols.start)]
                } else {
                    f64::INFINITY
                };
                let above = if prev_cols.contains(&j) {
                    cost[(i - 1) * bw + (j - prev_cols.start)]
                } else {
                    f64::INFINITY
                };
                let left = if j > cols.start {
                    cost[idx - 1]
                } else {
                    f64::INFINITY
                };

                let (best, dir) = if diag <= above && diag <= left {
                    (diag, 0u8)
                } else if above <= left {
                    (above, 1u8)
                } else {
                    (left, 2u8)
                };
                cost[idx] = c + best;
                dirs[idx] = dir;
            }
        }

        let mut steps = Vec::with_capacity(n + m);
        let (mut i, mut j) = (n - 1, m - 1);
        loop {
            steps.push(WarpStep {
                reference: i,
                evaluated: j,
            });
            if i == 0 && j == 0 {
                break;
            }
            let idx = i * bw + (j - window.column_range(i, m).start);
            match dirs[idx] {
                0 if i > 0 && j > 0 => {
                    i -= 1;
                    j -= 1;
                }
                1 | 0 if i > 0 => i -= 1,
                _ => j -= 1,
            }
        }
        steps.reverse();

        let last = (n - 1) * bw + (m - 1 - window.column_range(n - 1, m).start);
        WarpingPath {
            steps,
            cost: cost[last],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_series_warp_diagonally() {
        let a = [0.0, 1.0, 2.0, 1.0, 0.0];
        let path = Dtw::new(WarpingWindow::SakoeChiba(1)).align(&a, &a);
        assert_eq!(path.len(), 5);
        assert!(path.steps().iter().all(|s| s.reference == s.evaluated));
        assert_eq!(path.cost(), 0.0);
    }

    #[test]
    fn path_endpoints_are_fixed() {
        let a = [0.0, 0.0, 1.0, 2.0, 1.0, 0.0];
        let b = [0.0, 1.0, 2.0, 1.0, 0.0, 0.0];
        let path = Dtw::new(WarpingWindow::Unconstrained).align(&a, &b);
        let first = path.steps()[0];
        let last = *path.steps().last().unwrap();
        assert_eq!((first.reference, first.evaluated), (0, 0));
        assert_eq!((last.reference, last.evaluated), (5, 5));
        assert_eq!(path.cost(), 0.0);
    }

    #[test]
    fn path_is_monotone() {
        let a = [3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0, 6.0];
        let b = [2.0, 7.0, 1.0, 8.0, 2.0, 8.0, 1.0, 8.0];
        let path = Dtw::new(WarpingWindow::SakoeChiba(2)).align(&a, &b);
        for w in path.steps().windows(2) {
            let di = w[1].reference - w[0].reference;
            let dj = w[1].evaluated - w[0].evaluated;
            assert!(di <= 1 && dj <= 1 && di + dj >= 1);
            assert!(w[1].reference.abs_diff(w[1].evaluated) <= 2);
        }
    }

    #[test]
    fn zero_radius_is_lockstep() {
        let a = [1.0, 5.0, 2.0];
        let b = [2.0, 1.0, 5.0];
        let path = Dtw::new(WarpingWindow::SakoeChiba(0)).align(&a, &b);
        assert_eq!(path.len(), 3);
        assert!((path.cost() - (1.0 + 16.0 + 9.0)).abs() < 1e-12);
    }

    #[test]
    fn apply_uses_midpoint_timestamps() {
        let r = SignalData::uniform(1.0, vec![0.0, 1.0, 1.0]).unwrap();
        let e = SignalData::uniform(1.0, vec![0.0, 0.0, 1.0]).unwrap();
        let path = Dtw::new(WarpingWindow::Unconstrained).align(r.values(), e.values());
        let (rw, ew) = path.apply(&r, &e);
        assert_eq!(rw.len(), path.len());
        assert_eq!(rw.timestamps(), ew.timestamps());
        for (x, y) in rw.values().iter().zip(ew.values()) {
            assert_eq!(x, y);
        }
    }
}

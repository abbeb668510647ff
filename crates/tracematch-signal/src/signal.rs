//! Immutable (timestamp, value) sample container.

use std::ops::{Add, Mul, Range};

use serde::{Deserialize, Serialize};

use crate::error::SignalError;

/// Parallel timestamp and value arrays.
///
/// Every operation returns a new instance; nothing mutates in place. Signals
/// built through [`SignalData::new`] are guaranteed to have matching lengths,
/// finite samples, and strictly increasing timestamps. Derived signals (warped
/// or shifted copies produced inside metrics) are built with
/// [`SignalData::from_parts`] and only guarantee matching lengths.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalData {
    timestamps: Vec<f64>,
    values: Vec<f64>,
}

impl SignalData {
    /// Create a validated signal.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`SignalError::LengthMismatch`] | `timestamps.len() != values.len()` |
    /// | [`SignalError::NonFiniteSample`] | Any timestamp or value is NaN or infinite |
    /// | [`SignalError::NonIncreasingTimestamp`] | `timestamps[i] <= timestamps[i - 1]` for some `i` |
    pub fn new(timestamps: Vec<f64>, values: Vec<f64>) -> Result<Self, SignalError> {
        if timestamps.len() != values.len() {
            return Err(SignalError::LengthMismatch {
                timestamps: timestamps.len(),
                values: values.len(),
            });
        }
        if let Some(index) = timestamps
            .iter()
            .zip(&values)
            .position(|(t, v)| !t.is_finite() || !v.is_finite())
        {
            return Err(SignalError::NonFiniteSample { index });
        }
        if let Some(index) = timestamps.windows(2).position(|w| w[1] <= w[0]) {
            return Err(SignalError::NonIncreasingTimestamp { index: index + 1 });
        }
        Ok(Self { timestamps, values })
    }

    /// Build a signal from arrays derived from already validated signals.
    ///
    /// # Panics
    ///
    /// Panics if the two arrays differ in length.
    #[must_use]
    pub fn from_parts(timestamps: Vec<f64>, values: Vec<f64>) -> Self {
        assert_eq!(
            timestamps.len(),
            values.len(),
            "derived signal must have one value per timestamp"
        );
        Self { timestamps, values }
    }

    /// Build a uniformly sampled signal starting at `t = 0`.
    ///
    /// # Errors
    ///
    /// Returns [`SignalError::NonFiniteSample`] or
    /// [`SignalError::NonIncreasingTimestamp`] (for a non-positive `step`).
    pub fn uniform(step: f64, values: Vec<f64>) -> Result<Self, SignalError> {
        let timestamps = (0..values.len()).map(|i| i as f64 * step).collect();
        Self::new(timestamps, values)
    }

    /// Create a signal with no samples.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Return the timestamps.
    #[must_use]
    pub fn timestamps(&self) -> &[f64] {
        &self.timestamps
    }

    /// Return the values.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Consume and return `(timestamps, values)`.
    #[must_use]
    pub fn into_parts(self) -> (Vec<f64>, Vec<f64>) {
        (self.timestamps, self.values)
    }

    /// Return the number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Return true if the signal has no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Return the first timestamp, if any.
    #[must_use]
    pub fn first_timestamp(&self) -> Option<f64> {
        self.timestamps.first().copied()
    }

    /// Return the last timestamp, if any.
    #[must_use]
    pub fn last_timestamp(&self) -> Option<f64> {
        self.timestamps.last().copied()
    }

    /// Sample interval `t[1] - t[0]`, or `0.0` for signals shorter than two samples.
    #[must_use]
    pub fn sample_time_step(&self) -> f64 {
        match self.timestamps.as_slice() {
            [t0, t1, ..] => t1 - t0,
            _ => 0.0,
        }
    }

    /// Maximum absolute value. Zero for an empty signal.
    #[must_use]
    pub fn amplitude(&self) -> f64 {
        self.values.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()))
    }

    /// Smallest value, or `None` for an empty signal.
    #[must_use]
    pub fn min(&self) -> Option<f64> {
        self.values.iter().copied().reduce(f64::min)
    }

    /// Largest value, or `None` for an empty signal.
    #[must_use]
    pub fn max(&self) -> Option<f64> {
        self.values.iter().copied().reduce(f64::max)
    }

    /// Arithmetic mean of the values. Zero for an empty signal.
    #[must_use]
    pub fn mean(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        self.values.iter().sum::<f64>() / self.values.len() as f64
    }

    /// Translate every timestamp by `offset`.
    #[must_use]
    pub fn shift(&self, offset: f64) -> Self {
        Self {
            timestamps: self.timestamps.iter().map(|t| t + offset).collect(),
            values: self.values.clone(),
        }
    }

    /// Multiply every value by `factor`.
    #[must_use]
    pub fn scale(&self, factor: f64) -> Self {
        Self {
            timestamps: self.timestamps.clone(),
            values: self.values.iter().map(|v| v * factor).collect(),
        }
    }

    /// Copy the samples in `range`, clamped to the signal bounds.
    #[must_use]
    pub fn slice(&self, range: Range<usize>) -> Self {
        let end = range.end.min(self.len());
        let start = range.start.min(end);
        Self {
            timestamps: self.timestamps[start..end].to_vec(),
            values: self.values[start..end].to_vec(),
        }
    }

    /// Same time grid carrying `values` instead.
    ///
    /// # Panics
    ///
    /// Panics if `values.len() != self.len()`.
    #[must_use]
    pub fn with_values(&self, values: Vec<f64>) -> Self {
        Self::from_parts(self.timestamps.clone(), values)
    }

    /// Same time grid with every value set to `value`.
    #[must_use]
    pub fn filled(&self, value: f64) -> Self {
        Self {
            timestamps: self.timestamps.clone(),
            values: vec![value; self.len()],
        }
    }
}

/// Elementwise value sum on the left operand's time grid.
///
/// Values beyond the shorter operand are dropped.
impl Add for &SignalData {
    type Output = SignalData;

    fn add(self, rhs: Self) -> SignalData {
        let n = self.len().min(rhs.len());
        SignalData {
            timestamps: self.timestamps[..n].to_vec(),
            values: self.values[..n]
                .iter()
                .zip(&rhs.values[..n])
                .map(|(a, b)| a + b)
                .collect(),
        }
    }
}

impl Mul<f64> for &SignalData {
    type Output = SignalData;

    fn mul(self, rhs: f64) -> SignalData {
        self.scale(rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_length_mismatch() {
        let result = SignalData::new(vec![0.0, 1.0], vec![1.0]);
        assert!(matches!(
            result,
            Err(SignalError::LengthMismatch { timestamps: 2, values: 1 })
        ));
    }

    #[test]
    fn rejects_nan_value() {
        let result = SignalData::new(vec![0.0, 1.0, 2.0], vec![1.0, f64::NAN, 3.0]);
        assert!(matches!(result, Err(SignalError::NonFiniteSample { index: 1 })));
    }

    #[test]
    fn rejects_repeated_timestamp() {
        let result = SignalData::new(vec![0.0, 1.0, 1.0], vec![1.0, 2.0, 3.0]);
        assert!(matches!(
            result,
            Err(SignalError::NonIncreasingTimestamp { index: 2 })
        ));
    }

    #[test]
    fn uniform_grid() {
        let s = SignalData::uniform(0.5, vec![1.0, 2.0, 3.0]).unwrap();
        assert_eq!(s.timestamps(), &[0.0, 0.5, 1.0]);
        assert!((s.sample_time_step() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn amplitude_is_max_abs() {
        let s = SignalData::uniform(1.0, vec![1.0, -7.5, 3.0]).unwrap();
        assert!((s.amplitude() - 7.5).abs() < 1e-12);
        assert_eq!(SignalData::empty().amplitude(), 0.0);
    }

    #[test]
    fn shift_round_trip() {
        let s = SignalData::uniform(0.1, vec![3.0, 1.0, 4.0, 1.0, 5.0]).unwrap();
        let back = s.shift(2.75).shift(-2.75);
        assert_eq!(back.values(), s.values());
        for (a, b) in back.timestamps().iter().zip(s.timestamps()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn operations_do_not_mutate() {
        let s = SignalData::uniform(1.0, vec![1.0, 2.0]).unwrap();
        let _ = s.scale(3.0);
        let _ = s.shift(5.0);
        assert_eq!(s.values(), &[1.0, 2.0]);
        assert_eq!(s.timestamps(), &[0.0, 1.0]);
    }

    #[test]
    fn slice_clamps_to_bounds() {
        let s = SignalData::uniform(1.0, vec![1.0, 2.0, 3.0]).unwrap();
        assert_eq!(s.slice(1..10).values(), &[2.0, 3.0]);
        assert!(s.slice(5..10).is_empty());
    }

    #[test]
    fn add_and_mul() {
        let a = SignalData::uniform(1.0, vec![1.0, 2.0]).unwrap();
        let b = SignalData::uniform(1.0, vec![0.5, 0.5]).unwrap();
        let sum = &a + &b;
        assert_eq!(sum.values(), &[1.5, 2.5]);
        let scaled = &a * 0.5;
        assert_eq!(scaled.values(), &[0.5, 1.0]);
    }

    #[test]
    fn step_of_short_signal_is_zero() {
        let s = SignalData::uniform(1.0, vec![4.0]).unwrap();
        assert_eq!(s.sample_time_step(), 0.0);
    }
}

//! CSV measurement reader with full input validation.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use tracematch_compare::{Channel, ChannelId, InMemorySource, Measurement};
use tracematch_signal::SignalData;

use crate::IoError;
use crate::domain::LoadedMeasurement;

/// Relative tolerance on the interval between consecutive timestamps.
const SAMPLING_RTOL: f64 = 1e-6;

/// Reads a measurement from a CSV file.
///
/// Expected CSV format:
/// - Header row required: `time,<channel>,<channel>,...`
/// - One row per sample, time in seconds, uniformly spaced
/// - All rows must have the same number of columns
///
/// Timestamps are re-based so that the first sample is at `t = 0`.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record |
/// | [`IoError::NoChannels`] | Header has no column after `time` |
/// | [`IoError::DuplicateChannel`] | Two columns share a name |
/// | [`IoError::InconsistentRowLength`] | Row has different column count than header |
/// | [`IoError::NonFiniteValue`] | Cell is NaN, Inf, or unparseable float |
/// | [`IoError::TooFewRows`] | Fewer than 2 data rows |
/// | [`IoError::NonUniformSampling`] | Time column is not evenly spaced and increasing |
pub struct MeasurementReader {
    path: PathBuf,
    name: Option<String>,
}

impl MeasurementReader {
    /// Create a new reader for the given CSV file path.
    ///
    /// The measurement is named after the file stem unless
    /// [`with_name`](Self::with_name) overrides it.
    #[must_use]
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            name: None,
        }
    }

    /// Override the measurement name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    fn measurement_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| {
            self.path
                .file_stem()
                .map_or_else(|| "measurement".to_owned(), |s| s.to_string_lossy().into_owned())
        })
    }

    fn csv_error(&self, e: csv::Error) -> IoError {
        IoError::CsvParse {
            path: self.path.clone(),
            offset: e.position().map_or(0, |p| p.byte()),
            source: e,
        }
    }

    /// Read and validate the CSV file, returning a [`LoadedMeasurement`].
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read(&self) -> Result<LoadedMeasurement, IoError> {
        let file = std::fs::File::open(&self.path).map_err(|e| IoError::FileNotFound {
            path: self.path.clone(),
            source: e,
        })?;

        // flexible(true) lets InconsistentRowLength fire instead of a CsvParse error
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(file);

        let header = rdr.headers().map_err(|e| self.csv_error(e))?.clone();
        let expected_cols = header.len();
        let names: Vec<String> = header.iter().skip(1).map(str::to_owned).collect();
        if names.is_empty() {
            return Err(IoError::NoChannels {
                path: self.path.clone(),
            });
        }
        let mut seen = HashSet::new();
        if let Some(name) = names.iter().find(|n| !seen.insert(n.as_str())) {
            return Err(IoError::DuplicateChannel {
                path: self.path.clone(),
                name: name.clone(),
            });
        }
        debug!(channels = names.len(), "read CSV header");

        let mut times = Vec::new();
        let mut columns: Vec<Vec<f64>> = vec![Vec::new(); names.len()];
        for (row_index, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| self.csv_error(e))?;
            if record.len() != expected_cols {
                return Err(IoError::InconsistentRowLength {
                    path: self.path.clone(),
                    row_index,
                    expected: expected_cols,
                    got: record.len(),
                });
            }
            for (col_index, raw) in record.iter().enumerate() {
                let value = raw
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| IoError::NonFiniteValue {
                        path: self.path.clone(),
                        row_index,
                        column: header.get(col_index).unwrap_or("").to_owned(),
                        raw: raw.to_owned(),
                    })?;
                match col_index {
                    0 => times.push(value),
                    c => columns[c - 1].push(value),
                }
            }
        }

        let step = self.validate_sampling(&times)?;
        let t0 = times[0];
        let timestamps: Vec<f64> = times.iter().map(|t| t - t0).collect();

        let measurement_name = self.measurement_name();
        let mut source = InMemorySource::new();
        let channels = names
            .into_iter()
            .zip(columns)
            .map(|(name, values)| {
                let id = ChannelId::new(format!("{measurement_name}::{name}"));
                source.insert(id.clone(), SignalData::from_parts(timestamps.clone(), values));
                Channel::new(id, name)
            })
            .collect::<Vec<_>>();

        let measurement = Measurement::new(
            measurement_name,
            timestamps.len() as f64 * step,
            1.0 / step,
            channels,
        );
        info!(
            measurement = measurement.name(),
            channels = measurement.channels().len(),
            samples = timestamps.len(),
            sample_rate = measurement.sample_rate(),
            "measurement loaded"
        );
        Ok(LoadedMeasurement {
            measurement,
            source,
        })
    }

    /// Return the common sample interval of `times`.
    fn validate_sampling(&self, times: &[f64]) -> Result<f64, IoError> {
        let [t0, t1, ..] = times else {
            return Err(IoError::TooFewRows {
                path: self.path.clone(),
                rows: times.len(),
            });
        };
        let step = t1 - t0;
        for (i, w) in times.windows(2).enumerate() {
            let got = w[1] - w[0];
            if got <= 0.0 || (got - step).abs() > SAMPLING_RTOL * step.abs() {
                return Err(IoError::NonUniformSampling {
                    path: self.path.clone(),
                    row_index: i + 1,
                    expected: step,
                    got,
                });
            }
        }
        Ok(step)
    }
}

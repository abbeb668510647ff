//! Measurements, channels, and the channel data source seam.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use tracematch_signal::SignalData;

use crate::error::SourceError;

/// Opaque key used to fetch a channel's samples from a [`ChannelSource`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChannelId(String);

impl ChannelId {
    /// Wrap an identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Return the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One named time series of a measurement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    /// Data source key.
    pub id: ChannelId,
    /// Display name, unique within its measurement.
    pub name: String,
}

impl Channel {
    /// Create a channel.
    #[must_use]
    pub fn new(id: ChannelId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Named collection of channels recorded at one fixed sample rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    name: String,
    length: f64,
    sample_rate: f64,
    channels: Vec<Channel>,
}

impl Measurement {
    /// Create a measurement lasting `length` seconds sampled at `sample_rate` Hz.
    #[must_use]
    pub fn new(name: impl Into<String>, length: f64, sample_rate: f64, channels: Vec<Channel>) -> Self {
        Self {
            name: name.into(),
            length,
            sample_rate,
            channels,
        }
    }

    /// Return the measurement name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Total duration in seconds.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.length
    }

    /// Sample rate in Hz.
    #[must_use]
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Return the channels in recording order.
    #[must_use]
    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    /// Find a channel by display name.
    #[must_use]
    pub fn channel_by_name(&self, name: &str) -> Option<&Channel> {
        self.channels.iter().find(|c| c.name == name)
    }
}

/// Loads channel samples by identifier.
///
/// Implementations are shared by reference across worker threads and must
/// not rely on interior mutability for correctness.
pub trait ChannelSource: Sync {
    /// Return the samples of channel `id`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Missing`] if the channel is unknown.
    fn load(&self, id: &ChannelId) -> Result<SignalData, SourceError>;
}

/// [`ChannelSource`] backed by a hash map.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    channels: HashMap<ChannelId, SignalData>,
}

impl InMemorySource {
    /// Create an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `data` under `id`, replacing any previous entry.
    pub fn insert(&mut self, id: ChannelId, data: SignalData) {
        self.channels.insert(id, data);
    }

    /// Merge every channel of `other` into this source.
    pub fn extend(&mut self, other: InMemorySource) {
        self.channels.extend(other.channels);
    }

    /// Return the number of stored channels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Return true if no channels are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

impl ChannelSource for InMemorySource {
    fn load(&self, id: &ChannelId) -> Result<SignalData, SourceError> {
        self.channels
            .get(id)
            .cloned()
            .ok_or_else(|| SourceError::Missing { id: id.to_string() })
    }
}

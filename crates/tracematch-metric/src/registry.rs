//! Fixed catalog of preconfigured metrics.

use crate::area::AreaValidationConfig;
use crate::corridor::{CorridorConfig, IsoCorridorConfig};
use crate::iso::{IsoConfig, IsoSmallConfig};
use crate::magnitude::MagnitudeConfig;
use crate::metric::Metric;
use crate::ospa::OspaConfig;
use crate::phase::PhaseConfig;
use crate::slope::SlopeConfig;

/// Name to metric lookup table in display order.
#[derive(Debug, Clone)]
pub struct MetricRegistry {
    entries: Vec<(&'static str, Metric)>,
}

fn corridor(inner: f64, outer: f64, delay_inner: f64, delay_outer: f64) -> Metric {
    Metric::Corridor(CorridorConfig {
        inner,
        outer,
        delay_inner,
        delay_outer,
        regression: 2.0,
    })
}

fn phase(allowed_time_shift: f64) -> PhaseConfig {
    PhaseConfig {
        allowed_time_shift,
        ..PhaseConfig::default()
    }
}

impl Default for MetricRegistry {
    fn default() -> Self {
        Self {
            entries: vec![
                ("ISO", Metric::Iso(IsoConfig::default())),
                ("ISO_PHASE (0.2)", Metric::IsoPhase(phase(0.2))),
                ("ISO_PHASE (0.6)", Metric::IsoPhase(phase(0.6))),
                ("ISO_CORRIDOR", Metric::IsoCorridor(IsoCorridorConfig::default())),
                ("ISO_MAGNITUDE", Metric::IsoMagnitude(MagnitudeConfig::default())),
                ("ISO_SLOPE", Metric::IsoSlope(SlopeConfig::default())),
                ("Euclidean Distance", Metric::EuclideanDistance),
                ("Pearson Correlation", Metric::PearsonCorrelation),
                ("ISO_SMALL", Metric::IsoSmall(IsoSmallConfig::default())),
                ("OSPAMetric", Metric::Ospa(OspaConfig::default())),
                (
                    "OSPAMetric (No Cutoff)",
                    Metric::Ospa(OspaConfig {
                        cutoff: 1.0,
                        ..OspaConfig::default()
                    }),
                ),
                ("CORRIDOR", corridor(0.05, 0.5, 0.1, 2.0)),
                ("CORRIDOR ShiftTol", corridor(0.02, 0.4, 0.07, 3.5)),
                ("CROSS_CORRELATION (0.2)", Metric::CrossCorrelation(phase(0.2))),
                ("AVM", Metric::AreaValidation(AreaValidationConfig::default())),
            ],
        }
    }
}

impl MetricRegistry {
    /// Look up a metric by its catalog name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Metric> {
        self.entries
            .iter()
            .find(|(entry, _)| *entry == name)
            .map(|(_, metric)| *metric)
    }

    /// Catalog names in display order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(name, _)| *name)
    }

    /// Iterate over `(name, metric)` pairs in display order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, Metric)> + '_ {
        self.entries.iter().copied()
    }

    /// Return the number of catalog entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Return true if the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_unique() {
        let registry = MetricRegistry::default();
        let mut names: Vec<_> = registry.names().collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), registry.len());
    }

    #[test]
    fn lookup_returns_configured_metric() {
        let registry = MetricRegistry::default();
        match registry.get("ISO_PHASE (0.6)") {
            Some(Metric::IsoPhase(c)) => assert_eq!(c.allowed_time_shift(), 0.6),
            other => panic!("unexpected {other:?}"),
        }
        match registry.get("OSPAMetric (No Cutoff)") {
            Some(Metric::Ospa(c)) => assert_eq!(c.cutoff(), 1.0),
            other => panic!("unexpected {other:?}"),
        }
        assert!(registry.get("nope").is_none());
    }

    #[test]
    fn first_entry_is_iso() {
        assert_eq!(MetricRegistry::default().names().next(), Some("ISO"));
    }
}

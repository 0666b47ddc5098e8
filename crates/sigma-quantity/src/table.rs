//! Measurements and the tables that bind them to variables.

use std::collections::BTreeMap;

use log::warn;
use sigma_core::{Bindings, SymbolId};

use crate::error::{QuantityError, Result};

/// A point value with its standard deviation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Measurement {
    /// Best estimate.
    pub value: f64,
    /// Standard deviation, never negative.
    pub deviation: f64,
}

impl Measurement {
    /// A value known without uncertainty.
    #[must_use]
    pub const fn exact(value: f64) -> Self {
        Self {
            value,
            deviation: 0.0,
        }
    }

    /// Reduces repeated samples and a systematic deviation to one measurement.
    ///
    /// With three or more samples the value is their mean and the statistical
    /// deviation their sample standard deviation. With fewer, the first
    /// sample is taken as is and the statistical part is zero. The two parts
    /// are combined in quadrature.
    ///
    /// # Errors
    ///
    /// Fails on an empty slice, a non-finite sample, or a systematic deviation
    /// that is negative or not finite.
    pub fn from_samples(samples: &[f64], systematic: f64) -> Result<Self> {
        if samples.is_empty() {
            return Err(QuantityError::EmptySamples);
        }
        if let Some((index, &value)) = samples.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(QuantityError::InvalidSample { index, value });
        }
        if !systematic.is_finite() || systematic < 0.0 {
            return Err(QuantityError::InvalidSystematic(systematic));
        }

        let (value, statistical) = if samples.len() >= 3 {
            let n = samples.len() as f64;
            let mean = samples.iter().sum::<f64>() / n;
            let squares: f64 = samples.iter().map(|x| (x - mean) * (x - mean)).sum();
            (mean, (squares / (n - 1.0)).sqrt())
        } else {
            (samples[0], 0.0)
        };

        Ok(Self {
            value,
            deviation: statistical.hypot(systematic),
        })
    }
}

/// Variables and their measurements, iterated in symbol order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeasurementTable {
    entries: BTreeMap<SymbolId, Measurement>,
}

impl MeasurementTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a variable, returning the measurement it replaced.
    pub fn insert(&mut self, symbol: SymbolId, measurement: Measurement) -> Option<Measurement> {
        self.entries.insert(symbol, measurement)
    }

    /// Looks up a variable.
    #[must_use]
    pub fn get(&self, symbol: SymbolId) -> Option<Measurement> {
        self.entries.get(&symbol).copied()
    }

    /// Returns true if the variable is bound.
    #[must_use]
    pub fn contains(&self, symbol: SymbolId) -> bool {
        self.entries.contains_key(&symbol)
    }

    /// Number of bound variables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no variable is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(variable, measurement)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (SymbolId, Measurement)> + '_ {
        self.entries.iter().map(|(&id, &m)| (id, m))
    }

    /// Union of two tables. Entries of `other` win on shared variables.
    #[must_use]
    pub fn merged(&self, other: &Self) -> Self {
        let mut entries = self.entries.clone();
        for (id, measurement) in other.iter() {
            if let Some(previous) = entries.insert(id, measurement) {
                if previous != measurement {
                    warn!("measurement of {id:?} replaced: {previous:?} -> {measurement:?}");
                }
            }
        }
        Self { entries }
    }
}

impl FromIterator<(SymbolId, Measurement)> for MeasurementTable {
    fn from_iter<I: IntoIterator<Item = (SymbolId, Measurement)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl Bindings for MeasurementTable {
    fn value_of(&self, symbol: SymbolId) -> Option<f64> {
        self.entries.get(&symbol).map(|m| m.value)
    }
}

//! Core Syracuse (Collatz) flight computation library implemented in Rust.

pub mod chart;
pub mod metrics;

use serde::Serialize;
use thiserror::Error;

pub use chart::{chart_title, ChartError, ChartRenderer};
pub use metrics::{altitude_flight_time, flight_time, max_altitude, Metrics};

/// Starting value used when none is supplied.
pub const DEFAULT_SOURCE: u64 = 15;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyrError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("sequence overflowed u64 at step {step} (value {value})")]
    Overflow { step: usize, value: u64 },
}

/// A complete Syracuse flight, from the source down to 1.
///
/// Only [`syracuse_sequence`] builds one, so a `Sequence` is never empty, starts
/// at its source and ends at 1.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Sequence {
    values: Vec<u64>,
}

impl Sequence {
    pub fn source(&self) -> u64 {
        self.values[0]
    }

    pub fn values(&self) -> &[u64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Never true for a generated sequence.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, u64> {
        self.values.iter()
    }

    pub fn metrics(&self) -> Metrics {
        Metrics::of(self)
    }
}

impl AsRef<[u64]> for Sequence {
    fn as_ref(&self) -> &[u64] {
        &self.values
    }
}

impl<'a> IntoIterator for &'a Sequence {
    type Item = &'a u64;
    type IntoIter = std::slice::Iter<'a, u64>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

/// Check a raw signed starting value, as read from the command line.
///
/// `i128` covers every `u64` source as well as the negative values that must be
/// rejected.
pub fn validate_source(raw: i128) -> Result<u64, SyrError> {
    if raw <= 0 {
        return Err(SyrError::InvalidInput(format!(
            "source must be a positive integer, got {raw}"
        )));
    }
    u64::try_from(raw).map_err(|_| {
        SyrError::InvalidInput(format!("source {raw} exceeds the u64 range"))
    })
}

/// Apply one Syracuse step: halve even values, `3n + 1` odd ones.
///
/// Returns `None` when `3n + 1` does not fit in a `u64`.
pub fn next_value(n: u64) -> Option<u64> {
    if n % 2 == 0 {
        Some(n / 2)
    } else {
        n.checked_mul(3)?.checked_add(1)
    }
}

/// Generate the Syracuse sequence starting at `source` and ending at 1.
pub fn syracuse_sequence(source: u64) -> Result<Sequence, SyrError> {
    if source == 0 {
        return Err(SyrError::InvalidInput(
            "source must be a positive integer, got 0".into(),
        ));
    }

    let mut values = vec![source];
    let mut n = source;
    while n != 1 {
        n = next_value(n).ok_or(SyrError::Overflow {
            step: values.len(),
            value: n,
        })?;
        values.push(n);
    }

    Ok(Sequence { values })
}

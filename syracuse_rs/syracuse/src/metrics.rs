use serde::Serialize;

use super::Sequence;

/// Scalar statistics of a single flight.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Metrics {
    pub source: u64,
    pub flight_time: usize,
    pub altitude_flight_time: usize,
    pub max_altitude: u64,
}

impl Metrics {
    pub fn of(sequence: &Sequence) -> Self {
        let values = sequence.values();
        Self {
            source: sequence.source(),
            flight_time: flight_time(values),
            altitude_flight_time: altitude_flight_time(values),
            // non-empty, so the fallback is never taken
            max_altitude: max_altitude(values).unwrap_or(sequence.source()),
        }
    }
}

/// Number of values in the flight, source and final 1 included.
pub fn flight_time(values: &[u64]) -> usize {
    values.len()
}

/// Length of the leading run of values that stay at or above the source.
///
/// Counting stops at the first value strictly below `values[0]`; values that
/// climb back above the source afterwards are not counted. Returns 0 for an
/// empty slice.
pub fn altitude_flight_time(values: &[u64]) -> usize {
    let Some(&source) = values.first() else {
        return 0;
    };
    values.iter().take_while(|&&v| v >= source).count()
}

/// Highest value reached, or `None` for an empty slice.
pub fn max_altitude(values: &[u64]) -> Option<u64> {
    values.iter().copied().max()
}

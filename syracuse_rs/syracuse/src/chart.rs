//! Rendering seam between the pure computation and chart side effects.
//!
//! Renderers plot a flight as value against 0-based index, with axes labelled
//! [`X_LABEL`] and [`Y_LABEL`] and a title from [`chart_title`].

use std::io;

use thiserror::Error;

use super::Sequence;

pub const X_LABEL: &str = "x";
pub const Y_LABEL: &str = "y";

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("chart I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("plotting error: {0}")]
    Backend(String),
    #[error("plotting backend panicked")]
    Panicked,
}

/// Anything that can display a flight.
pub trait ChartRenderer {
    fn display(&self, sequence: &Sequence, title: &str) -> Result<(), ChartError>;
}

impl<R: ChartRenderer + ?Sized> ChartRenderer for &R {
    fn display(&self, sequence: &Sequence, title: &str) -> Result<(), ChartError> {
        (**self).display(sequence, title)
    }
}

impl<R: ChartRenderer + ?Sized> ChartRenderer for Box<R> {
    fn display(&self, sequence: &Sequence, title: &str) -> Result<(), ChartError> {
        (**self).display(sequence, title)
    }
}

pub fn chart_title(source: u64) -> String {
    format!("Syracuse (n = {source})")
}

/// `(index, value)` pairs in plotting order.
pub fn indexed_points(sequence: &Sequence) -> Vec<(usize, u64)> {
    sequence.iter().copied().enumerate().collect()
}

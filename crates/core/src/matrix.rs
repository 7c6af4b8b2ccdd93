//! Rectangular 2D grid of raw activation values.
//!
//! Detector heatmaps arrive at arbitrary resolutions and in an
//! unconstrained value range. [`Matrix`] is the validated in-memory form:
//! at least one row, every row the same non-zero length. Inputs that
//! violate the shape are rejected at construction rather than repaired.

use serde::Serialize;

/// A rectangular, non-empty 2D grid of `f64` cells, row-major.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Matrix {
    rows: Vec<Vec<f64>>,
}

impl Matrix {
    /// Build a matrix from rows, enforcing the rectangular invariant.
    ///
    /// Returns `None` when the input is empty, has zero-width rows, or is
    /// jagged.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Option<Self> {
        let width = rows.first()?.len();
        if width == 0 {
            return None;
        }
        if rows.iter().any(|row| row.len() != width) {
            return None;
        }
        Some(Self { rows })
    }

    /// Wrap a flat 1D array into a single-row matrix.
    ///
    /// Upstream modules occasionally emit a flat vector where a grid is
    /// expected; the single-row interpretation is the documented contract
    /// for that shape.
    pub fn from_flat(cells: Vec<f64>) -> Option<Self> {
        if cells.is_empty() {
            return None;
        }
        Some(Self { rows: vec![cells] })
    }

    /// Number of rows. Always at least 1.
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns. Always at least 1.
    pub fn width(&self) -> usize {
        self.rows[0].len()
    }

    /// Cell value at `(row, col)`. Panics on out-of-range indices, like
    /// slice indexing.
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.rows[row][col]
    }

    /// Borrow the underlying rows.
    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// Iterate over all cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = f64> + '_ {
        self.rows.iter().flat_map(|row| row.iter().copied())
    }

    /// Arithmetic mean over all cells.
    ///
    /// Well-defined for every `Matrix`: the constructor guarantees at
    /// least one cell.
    pub fn mean(&self) -> f64 {
        let count = self.height() * self.width();
        self.cells().sum::<f64>() / count as f64
    }

    /// Apply `f` to every cell, preserving the shape.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Matrix {
        Matrix {
            rows: self
                .rows
                .iter()
                .map(|row| row.iter().map(|&v| f(v)).collect())
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Heatmap compositing, display normalization, and colorization.
//!
//! Source heatmaps arrive at whatever resolution their model emits. The
//! compositor treats every map on a normalized [0,1]×[0,1] coordinate
//! domain, resamples each onto a common output grid with nearest-neighbor
//! lookup, and blends by element-wise arithmetic mean. The blue→red
//! colorization formula is a frozen contract: downstream visual-regression
//! fixtures depend on exact channel values.

use serde::{Deserialize, Serialize};

use crate::matrix::Matrix;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Default output grid height of the combined heatmap.
pub const DEFAULT_GRID_ROWS: usize = 256;

/// Default output grid width of the combined heatmap.
pub const DEFAULT_GRID_COLS: usize = 256;

/// Lower bound on the min/max range during display normalization, guarding
/// the constant-map case.
pub const NORM_EPSILON: f64 = 1e-8;

/// Fixed green channel of the blue→red gradient.
pub const GRADIENT_GREEN: u8 = 20;

// ---------------------------------------------------------------------------
// Output grid
// ---------------------------------------------------------------------------

/// Resolution of the composited output grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSize {
    pub rows: usize,
    pub cols: usize,
}

impl Default for GridSize {
    fn default() -> Self {
        Self {
            rows: DEFAULT_GRID_ROWS,
            cols: DEFAULT_GRID_COLS,
        }
    }
}

// ---------------------------------------------------------------------------
// Compositing
// ---------------------------------------------------------------------------

/// Resample a source map onto `grid` by nearest-neighbor lookup.
///
/// Output cell `(x, y)` reads source cell
/// `(floor(x * srcCols / outCols), floor(y * srcRows / outRows))` — no
/// interpolation. Returns `None` for a degenerate grid.
pub fn resample(source: &Matrix, grid: GridSize) -> Option<Matrix> {
    if grid.rows == 0 || grid.cols == 0 {
        return None;
    }

    let src_rows = source.height();
    let src_cols = source.width();
    let mut rows = Vec::with_capacity(grid.rows);
    for y in 0..grid.rows {
        let sy = y * src_rows / grid.rows;
        let mut row = Vec::with_capacity(grid.cols);
        for x in 0..grid.cols {
            let sx = x * src_cols / grid.cols;
            row.push(source.get(sy, sx));
        }
        rows.push(row);
    }
    Matrix::from_rows(rows)
}

/// Blend any number of source maps into one combined map on `grid`.
///
/// Each source is resampled onto the grid, then cells are averaged across
/// the sources. An absent map contributes nothing. With no sources at all
/// the result is `None`; callers handle absence rather than receiving a
/// fake all-zero map.
pub fn composite(sources: &[&Matrix], grid: GridSize) -> Option<Matrix> {
    if sources.is_empty() {
        return None;
    }

    let mut resampled = Vec::with_capacity(sources.len());
    for source in sources {
        resampled.push(resample(source, grid)?);
    }

    let count = resampled.len() as f64;
    let mut rows = Vec::with_capacity(grid.rows);
    for y in 0..grid.rows {
        let mut row = Vec::with_capacity(grid.cols);
        for x in 0..grid.cols {
            let sum: f64 = resampled.iter().map(|m| m.get(y, x)).sum();
            row.push(sum / count);
        }
        rows.push(row);
    }
    Matrix::from_rows(rows)
}

// ---------------------------------------------------------------------------
// Display normalization
// ---------------------------------------------------------------------------

/// Rescale a map to `[0,1]` by per-map min/max.
///
/// `norm = (v - min) / range` with `range = max(max - min, epsilon)`, so a
/// constant map normalizes to all zeros instead of dividing by zero.
pub fn normalize_for_display(map: &Matrix) -> Matrix {
    let min = map.cells().fold(f64::INFINITY, f64::min);
    let max = map.cells().fold(f64::NEG_INFINITY, f64::max);
    let range = (max - min).max(NORM_EPSILON);
    map.map(|v| (v - min) / range)
}

// ---------------------------------------------------------------------------
// Colorization
// ---------------------------------------------------------------------------

/// Map a normalized value to the blue→red gradient.
///
/// Frozen contract: `R = round(v*255)`, `G = 20`, `B = round((1-v)*255)`.
/// Value 0 is pure blue, value 1 pure red.
pub fn colorize(value: f64) -> [u8; 3] {
    let r = (value * 255.0).round() as u8;
    let b = ((1.0 - value) * 255.0).round() as u8;
    [r, GRADIENT_GREEN, b]
}

/// Colorize a raw map for rendering: display normalization followed by the
/// gradient, returned as a row-major RGB raster.
pub fn render(map: &Matrix) -> Vec<[u8; 3]> {
    normalize_for_display(map).cells().map(colorize).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

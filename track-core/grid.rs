use crate::error::{TrackError, TrackResult};

/// Integer (row, column) position in a grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pixel {
    pub row: usize,
    pub col: usize,
}

impl Pixel {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// Dense row-major grid of corner-strength values, one per source pixel
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseGrid {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

/// `rows * cols`, rejecting empty and overflowing shapes
fn cell_count(rows: usize, cols: usize) -> TrackResult<usize> {
    match rows.checked_mul(cols) {
        Some(n) if n > 0 => Ok(n),
        _ => Err(TrackError::InvalidGridDimensions { rows, cols }),
    }
}

impl ResponseGrid {
    /// Wrap a row-major buffer, validating its shape
    pub fn new(rows: usize, cols: usize, data: Vec<f32>) -> TrackResult<Self> {
        let expected_len = cell_count(rows, cols)?;
        if data.len() != expected_len {
            return Err(TrackError::GridDataMismatch {
                expected_len,
                actual_len: data.len(),
            });
        }
        Ok(Self { rows, cols, data })
    }

    /// Grid filled with a single value
    pub fn filled(rows: usize, cols: usize, value: f32) -> TrackResult<Self> {
        let len = cell_count(rows, cols)?;
        Self::new(rows, cols, vec![value; len])
    }

    /// Build from nested rows; every row must have the same length
    pub fn from_rows(rows: Vec<Vec<f32>>) -> TrackResult<Self> {
        let n_rows = rows.len();
        let n_cols = rows.first().map_or(0, Vec::len);
        if n_rows == 0 || n_cols == 0 {
            return Err(TrackError::InvalidGridDimensions {
                rows: n_rows,
                cols: n_cols,
            });
        }

        let mut data = Vec::with_capacity(n_rows * n_cols);
        for (row, values) in rows.into_iter().enumerate() {
            if values.len() != n_cols {
                return Err(TrackError::RaggedRows {
                    row,
                    expected: n_cols,
                    actual: values.len(),
                });
            }
            data.extend(values);
        }
        Self::new(n_rows, n_cols, data)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// (rows, cols)
    pub fn dimensions(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn get(&self, pixel: Pixel) -> Option<f32> {
        if pixel.row < self.rows && pixel.col < self.cols {
            Some(self.data[pixel.row * self.cols + pixel.col])
        } else {
            None
        }
    }

    pub fn set(&mut self, pixel: Pixel, value: f32) -> TrackResult<()> {
        if pixel.row >= self.rows || pixel.col >= self.cols {
            return Err(TrackError::PixelOutOfBounds {
                row: pixel.row,
                col: pixel.col,
                rows: self.rows,
                cols: self.cols,
            });
        }
        self.data[pixel.row * self.cols + pixel.col] = value;
        Ok(())
    }

    /// Borrow one row of responses
    pub fn row(&self, row: usize) -> &[f32] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    /// Cells strictly above `min_response`, in row-major order
    pub fn cells_above(&self, min_response: f32) -> impl Iterator<Item = (Pixel, f32)> + '_ {
        let cols = self.cols;
        self.data
            .iter()
            .enumerate()
            .filter(move |&(_, &v)| v > min_response)
            .map(move |(i, &v)| (Pixel::new(i / cols, i % cols), v))
    }

    /// Linearly rescale so the smallest value maps to `lo` and the largest to `hi`.
    ///
    /// A constant grid maps every cell to `lo`.
    pub fn normalize_min_max(&self, lo: f32, hi: f32) -> ResponseGrid {
        let (min, max) = self
            .data
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(mn, mx), &v| (mn.min(v), mx.max(v)));
        let range = max - min;
        let scale = if range > f32::EPSILON { (hi - lo) / range } else { 0.0 };
        let data = self.data.iter().map(|&v| (v - min) * scale + lo).collect();
        ResponseGrid {
            rows: self.rows,
            cols: self.cols,
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overflowing_dimensions_rejected() {
        assert!(matches!(
            ResponseGrid::new(usize::MAX, 2, vec![]),
            Err(TrackError::InvalidGridDimensions { cols: 2, .. })
        ));
        assert!(matches!(
            ResponseGrid::filled(usize::MAX, usize::MAX, 0.0),
            Err(TrackError::InvalidGridDimensions { .. })
        ));
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        assert!(matches!(
            ResponseGrid::new(0, 3, vec![]),
            Err(TrackError::InvalidGridDimensions { rows: 0, cols: 3 })
        ));
        assert!(matches!(
            ResponseGrid::new(3, 0, vec![]),
            Err(TrackError::InvalidGridDimensions { .. })
        ));
    }

    #[test]
    fn test_data_length_mismatch() {
        let result = ResponseGrid::new(2, 2, vec![0.0; 3]);
        assert!(matches!(
            result,
            Err(TrackError::GridDataMismatch { expected_len: 4, actual_len: 3 })
        ));
    }

    #[test]
    fn test_ragged_rows() {
        let result = ResponseGrid::from_rows(vec![vec![1.0, 2.0], vec![3.0]]);
        assert!(matches!(
            result,
            Err(TrackError::RaggedRows { row: 1, expected: 2, actual: 1 })
        ));
    }

    #[test]
    fn test_cells_above_row_major() {
        let grid = ResponseGrid::from_rows(vec![
            vec![0.0, 5.0, 0.0],
            vec![7.0, 0.0, 9.0],
        ])
        .unwrap();
        let cells: Vec<_> = grid.cells_above(1.0).collect();
        assert_eq!(
            cells,
            vec![
                (Pixel::new(0, 1), 5.0),
                (Pixel::new(1, 0), 7.0),
                (Pixel::new(1, 2), 9.0),
            ]
        );
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let grid = ResponseGrid::filled(2, 2, 100.0).unwrap();
        assert_eq!(grid.cells_above(100.0).count(), 0);
    }

    #[test]
    fn test_get_and_set() {
        let mut grid = ResponseGrid::filled(3, 4, 0.0).unwrap();
        grid.set(Pixel::new(2, 3), 42.0).unwrap();
        assert_eq!(grid.get(Pixel::new(2, 3)), Some(42.0));
        assert_eq!(grid.get(Pixel::new(3, 0)), None);
        assert!(grid.set(Pixel::new(0, 4), 1.0).is_err());
        assert_eq!(grid.row(2), &[0.0, 0.0, 0.0, 42.0]);
    }

    #[test]
    fn test_normalize_min_max() {
        let grid = ResponseGrid::new(1, 3, vec![-2.0, 0.0, 2.0]).unwrap();
        let norm = grid.normalize_min_max(0.0, 255.0);
        assert_eq!(norm.as_slice(), &[0.0, 127.5, 255.0]);
    }

    #[test]
    fn test_normalize_constant_grid() {
        let grid = ResponseGrid::filled(2, 2, 3.0).unwrap();
        let norm = grid.normalize_min_max(0.0, 255.0);
        assert!(norm.as_slice().iter().all(|&v| v == 0.0));
    }
}

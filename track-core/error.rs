use thiserror::Error;

/// Coarse classification of a [`TrackError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed geometry or misaligned inputs
    InvalidInput,
    /// Unknown or incompatible option values
    InvalidConfiguration,
    /// Resource setup failed (thread pool)
    Runtime,
}

#[derive(Error, Debug)]
pub enum TrackError {
    #[error("Invalid grid dimensions: {rows}x{cols} (must be > 0 and addressable)")]
    InvalidGridDimensions { rows: usize, cols: usize },

    #[error("Grid data length mismatch: expected {expected_len}, got {actual_len}")]
    GridDataMismatch { expected_len: usize, actual_len: usize },

    #[error("Pixel ({row}, {col}) outside {rows}x{cols} grid")]
    PixelOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Row {row} has {actual} entries, expected {expected}")]
    RaggedRows { row: usize, expected: usize, actual: usize },

    #[error("Descriptor width must be > 0 when descriptors are present")]
    ZeroDescriptorWidth,

    #[error("Descriptor data length {len} is not a multiple of width {width}")]
    DescriptorDataMismatch { len: usize, width: usize },

    #[error("Source descriptors have width {source_width}, reference descriptors have width {reference_width}")]
    DescriptorWidthMismatch { source_width: usize, reference_width: usize },

    #[error("{keypoints} keypoints but {descriptors} descriptors")]
    DescriptorCountMismatch { keypoints: usize, descriptors: usize },

    #[error("Invalid {option}: {value}")]
    InvalidOption { option: &'static str, value: String },

    #[error("Incompatible {option} '{value}': {reason}")]
    IncompatibleOptions {
        option: &'static str,
        value: String,
        reason: String,
    },

    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl TrackError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TrackError::InvalidGridDimensions { .. }
            | TrackError::GridDataMismatch { .. }
            | TrackError::PixelOutOfBounds { .. }
            | TrackError::RaggedRows { .. }
            | TrackError::ZeroDescriptorWidth
            | TrackError::DescriptorDataMismatch { .. }
            | TrackError::DescriptorWidthMismatch { .. }
            | TrackError::DescriptorCountMismatch { .. } => ErrorKind::InvalidInput,
            TrackError::InvalidOption { .. } | TrackError::IncompatibleOptions { .. } => {
                ErrorKind::InvalidConfiguration
            }
            TrackError::ThreadPool(_) => ErrorKind::Runtime,
        }
    }

    pub fn invalid_option(option: &'static str, value: impl ToString) -> Self {
        TrackError::InvalidOption {
            option,
            value: value.to_string(),
        }
    }
}

pub type TrackResult<T> = Result<T, TrackError>;

use crate::error::{TrackError, TrackResult};
use crate::keypoint::Keypoint;

/// How descriptor elements are encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// Bit-packed bytes compared with Hamming distance
    Binary,
    /// `f32` components compared with Euclidean distance
    Float,
}

impl std::fmt::Display for Encoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Encoding::Binary => write!(f, "binary"),
            Encoding::Float => write!(f, "floating-point"),
        }
    }
}

/// Borrowed row-major view: `len()` rows of `width` elements each
#[derive(Debug, Clone, Copy)]
pub struct DescriptorRows<'a, T> {
    data: &'a [T],
    width: usize,
}

impl<'a, T> DescriptorRows<'a, T> {
    pub fn new(data: &'a [T], width: usize) -> Self {
        Self { data, width }
    }

    pub fn len(&self) -> usize {
        if self.width == 0 { 0 } else { self.data.len() / self.width }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn row(&self, idx: usize) -> &'a [T] {
        &self.data[idx * self.width..(idx + 1) * self.width]
    }

    pub fn iter(self) -> impl ExactSizeIterator<Item = &'a [T]> + 'a {
        let len = self.len();
        let DescriptorRows { data, width } = self;
        (0..len).map(move |i| &data[i * width..(i + 1) * width])
    }
}

fn pack<T: Copy>(rows: &[Vec<T>]) -> TrackResult<(Vec<T>, usize)> {
    let width = rows.first().map_or(0, Vec::len);
    if !rows.is_empty() && width == 0 {
        return Err(TrackError::ZeroDescriptorWidth);
    }
    let mut data = Vec::with_capacity(rows.len() * width);
    for (row, values) in rows.iter().enumerate() {
        if values.len() != width {
            return Err(TrackError::RaggedRows {
                row,
                expected: width,
                actual: values.len(),
            });
        }
        data.extend_from_slice(values);
    }
    Ok((data, width))
}

fn check_shape(len: usize, width: usize) -> TrackResult<()> {
    if width == 0 {
        return if len == 0 { Ok(()) } else { Err(TrackError::ZeroDescriptorWidth) };
    }
    if len % width != 0 {
        return Err(TrackError::DescriptorDataMismatch { len, width });
    }
    Ok(())
}

/// Bit-packed descriptors, `bytes_per_row` bytes each
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BinaryDescriptors {
    data: Vec<u8>,
    bytes_per_row: usize,
}

impl BinaryDescriptors {
    pub fn new(data: Vec<u8>, bytes_per_row: usize) -> TrackResult<Self> {
        check_shape(data.len(), bytes_per_row)?;
        Ok(Self { data, bytes_per_row })
    }

    pub fn from_rows(rows: &[Vec<u8>]) -> TrackResult<Self> {
        let (data, bytes_per_row) = pack(rows)?;
        Ok(Self { data, bytes_per_row })
    }

    /// From fixed-size descriptors such as 256-bit ORB/BRIEF codes
    pub fn from_arrays<const N: usize>(rows: &[[u8; N]]) -> Self {
        Self {
            data: rows.iter().flatten().copied().collect(),
            bytes_per_row: N,
        }
    }

    pub fn rows(&self) -> DescriptorRows<'_, u8> {
        DescriptorRows::new(&self.data, self.bytes_per_row)
    }

    pub fn len(&self) -> usize {
        self.rows().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn bytes_per_row(&self) -> usize {
        self.bytes_per_row
    }

    pub fn bits_per_row(&self) -> usize {
        self.bytes_per_row * 8
    }
}

/// Floating-point descriptors with `dim` components each
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FloatDescriptors {
    data: Vec<f32>,
    dim: usize,
}

impl FloatDescriptors {
    pub fn new(data: Vec<f32>, dim: usize) -> TrackResult<Self> {
        check_shape(data.len(), dim)?;
        Ok(Self { data, dim })
    }

    pub fn from_rows(rows: &[Vec<f32>]) -> TrackResult<Self> {
        let (data, dim) = pack(rows)?;
        Ok(Self { data, dim })
    }

    pub fn rows(&self) -> DescriptorRows<'_, f32> {
        DescriptorRows::new(&self.data, self.dim)
    }

    pub fn len(&self) -> usize {
        self.rows().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dim(&self) -> usize {
        self.dim
    }
}

/// Descriptors of one image, index-aligned with its keypoints
#[derive(Debug, Clone, PartialEq)]
pub enum Descriptors {
    Binary(BinaryDescriptors),
    Float(FloatDescriptors),
}

impl Descriptors {
    pub fn encoding(&self) -> Encoding {
        match self {
            Descriptors::Binary(_) => Encoding::Binary,
            Descriptors::Float(_) => Encoding::Float,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Descriptors::Binary(d) => d.len(),
            Descriptors::Float(d) => d.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Elements per row (bytes for binary, components for float)
    pub fn width(&self) -> usize {
        match self {
            Descriptors::Binary(d) => d.bytes_per_row(),
            Descriptors::Float(d) => d.dim(),
        }
    }
}

impl From<BinaryDescriptors> for Descriptors {
    fn from(d: BinaryDescriptors) -> Self {
        Descriptors::Binary(d)
    }
}

impl From<FloatDescriptors> for Descriptors {
    fn from(d: FloatDescriptors) -> Self {
        Descriptors::Float(d)
    }
}

/// Keypoints of one image with their descriptors
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSet {
    keypoints: Vec<Keypoint>,
    descriptors: Descriptors,
}

impl FeatureSet {
    pub fn new(keypoints: Vec<Keypoint>, descriptors: impl Into<Descriptors>) -> TrackResult<Self> {
        let descriptors = descriptors.into();
        if keypoints.len() != descriptors.len() {
            return Err(TrackError::DescriptorCountMismatch {
                keypoints: keypoints.len(),
                descriptors: descriptors.len(),
            });
        }
        Ok(Self { keypoints, descriptors })
    }

    pub fn keypoints(&self) -> &[Keypoint] {
        &self.keypoints
    }

    pub fn descriptors(&self) -> &Descriptors {
        &self.descriptors
    }

    pub fn len(&self) -> usize {
        self.keypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keypoints.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_from_arrays() {
        let d = BinaryDescriptors::from_arrays(&[[0xFFu8; 32], [0x00u8; 32]]);
        assert_eq!(d.len(), 2);
        assert_eq!(d.bytes_per_row(), 32);
        assert_eq!(d.bits_per_row(), 256);
        assert_eq!(d.rows().row(0), &[0xFFu8; 32]);
    }

    #[test]
    fn test_data_not_multiple_of_width() {
        let result = FloatDescriptors::new(vec![0.0; 5], 2);
        assert!(matches!(
            result,
            Err(TrackError::DescriptorDataMismatch { len: 5, width: 2 })
        ));
    }

    #[test]
    fn test_zero_width_with_data() {
        assert!(matches!(
            BinaryDescriptors::new(vec![1, 2], 0),
            Err(TrackError::ZeroDescriptorWidth)
        ));
        assert!(BinaryDescriptors::new(vec![], 0).unwrap().is_empty());
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let result = FloatDescriptors::from_rows(&[vec![1.0, 2.0], vec![3.0]]);
        assert!(matches!(result, Err(TrackError::RaggedRows { row: 1, .. })));
    }

    #[test]
    fn test_rows_iter() {
        let d = FloatDescriptors::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        let rows: Vec<&[f32]> = d.rows().iter().collect();
        assert_eq!(rows, vec![&[1.0, 2.0][..], &[3.0, 4.0][..]]);
    }

    #[test]
    fn test_empty_descriptors() {
        let d = FloatDescriptors::from_rows(&[]).unwrap();
        assert!(d.is_empty());
        assert_eq!(d.rows().iter().count(), 0);
    }

    #[test]
    fn test_feature_set_count_mismatch() {
        let kps = vec![Keypoint::new(0.0, 0.0, 6.0, 1.0)];
        let desc = BinaryDescriptors::from_arrays(&[[0u8; 4], [1u8; 4]]);
        let result = FeatureSet::new(kps, desc);
        assert!(matches!(
            result,
            Err(TrackError::DescriptorCountMismatch { keypoints: 1, descriptors: 2 })
        ));
    }

    #[test]
    fn test_feature_set_aligned() {
        let kps = vec![Keypoint::new(0.0, 0.0, 6.0, 1.0); 2];
        let desc = BinaryDescriptors::from_arrays(&[[0u8; 4], [1u8; 4]]);
        let set = FeatureSet::new(kps, desc).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.descriptors().encoding(), Encoding::Binary);
    }
}

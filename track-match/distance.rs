//! Descriptor distances.

/// Number of differing bits between two equally long byte strings
#[inline]
pub fn hamming(a: &[u8], b: &[u8]) -> u32 {
    debug_assert_eq!(a.len(), b.len());
    let mut a_words = a.chunks_exact(8);
    let mut b_words = b.chunks_exact(8);
    let mut bits = 0u32;

    for (x, y) in (&mut a_words).zip(&mut b_words) {
        let x = u64::from_le_bytes([x[0], x[1], x[2], x[3], x[4], x[5], x[6], x[7]]);
        let y = u64::from_le_bytes([y[0], y[1], y[2], y[3], y[4], y[5], y[6], y[7]]);
        bits += (x ^ y).count_ones();
    }
    for (x, y) in a_words.remainder().iter().zip(b_words.remainder()) {
        bits += (x ^ y).count_ones();
    }
    bits
}

/// Straight-line (L2) distance
#[inline]
pub fn euclidean(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum::<f32>()
        .sqrt()
}

/// Distance over one descriptor element type
pub trait Metric: Send + Sync + 'static {
    type Elem: Copy + Send + Sync;

    fn distance(a: &[Self::Elem], b: &[Self::Elem]) -> f32;
}

/// Hamming distance on bit-packed codes
#[derive(Debug, Clone, Copy, Default)]
pub struct Hamming;

impl Metric for Hamming {
    type Elem = u8;

    #[inline]
    fn distance(a: &[u8], b: &[u8]) -> f32 {
        hamming(a, b) as f32
    }
}

/// Euclidean distance on float vectors
#[derive(Debug, Clone, Copy, Default)]
pub struct Euclidean;

impl Metric for Euclidean {
    type Elem = f32;

    #[inline]
    fn distance(a: &[f32], b: &[f32]) -> f32 {
        euclidean(a, b)
    }
}

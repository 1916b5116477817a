use std::f32::consts::PI;

use crate::grid::Pixel;

/// Point of interest with a circular support region of diameter `size`
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub response: f32,
}

impl Keypoint {
    pub fn new(x: f32, y: f32, size: f32, response: f32) -> Self {
        Self { x, y, size, response }
    }

    /// Keypoint centred on a grid cell (x = column, y = row)
    pub fn at_pixel(pixel: Pixel, size: f32, response: f32) -> Self {
        Self::new(pixel.col as f32, pixel.row as f32, size, response)
    }

    pub fn distance(&self, other: &Keypoint) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Intersection-over-union of the two support discs, in `[0, 1]`.
    ///
    /// When one disc lies entirely inside the other the ratio of their areas
    /// is returned. Symmetric in its arguments.
    pub fn overlap(&self, other: &Keypoint) -> f32 {
        let a = self.size * 0.5;
        let b = other.size * 0.5;
        let a_2 = a * a;
        let b_2 = b * b;
        let c = self.distance(other);

        if a.min(b) + c <= a.max(b) {
            let big = a_2.max(b_2);
            return if big > 0.0 { a_2.min(b_2) / big } else { 0.0 };
        }

        if c >= a + b {
            return 0.0;
        }

        let c_2 = c * c;
        // Law of cosines at each centre; clamp guards acos against rounding.
        let cos_alpha = ((b_2 + c_2 - a_2) / (2.0 * b * c)).clamp(-1.0, 1.0);
        let cos_beta = ((a_2 + c_2 - b_2) / (2.0 * a * c)).clamp(-1.0, 1.0);
        let alpha = cos_alpha.acos();
        let beta = cos_beta.acos();

        let segment_a = a_2 * beta;
        let segment_b = b_2 * alpha;
        let triangle_a = a_2 * beta.sin() * cos_beta;
        let triangle_b = b_2 * alpha.sin() * cos_alpha;
        let intersection = segment_a + segment_b - triangle_a - triangle_b;
        let union = (a_2 + b_2) * PI - intersection;

        intersection / union
    }
}

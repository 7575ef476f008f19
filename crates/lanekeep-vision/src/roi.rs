//! Trapezoidal region of interest in front of the vehicle.

use lanekeep_core::{FrameShape, GrayImage};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::params::LaneDetectorParams;

/// Four corners of the trapezoid: bottom-left, bottom-right, top-right,
/// top-left. Kept in floating point so the shape is exactly symmetric about
/// `x = width / 2`; pixels are snapped only when rasterising.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegionPolygon {
    pub corners: [Point2<f32>; 4],
}

impl RegionPolygon {
    /// Build the trapezoid for a frame of the given shape.
    pub fn trapezoid(shape: FrameShape, params: &LaneDetectorParams) -> Self {
        let w = shape.width as f32;
        let h = shape.height as f32;
        let b = params.bottom_width;
        let t = params.top_width;
        let top_y = h * (1.0 - params.trapezoid_height);
        Self {
            corners: [
                Point2::new(w * (1.0 - b) / 2.0, h),
                Point2::new(w * (1.0 + b) / 2.0, h),
                Point2::new(w * (1.0 + t) / 2.0, top_y),
                Point2::new(w * (1.0 - t) / 2.0, top_y),
            ],
        }
    }

    /// Horizontal extent `[x_min, x_max]` of the polygon on row `y`.
    fn span_at(&self, y: f32) -> Option<(f32, f32)> {
        let mut lo = f32::INFINITY;
        let mut hi = f32::NEG_INFINITY;
        for k in 0..4 {
            let p0 = self.corners[k];
            let p1 = self.corners[(k + 1) % 4];
            let (y_min, y_max) = (p0.y.min(p1.y), p0.y.max(p1.y));
            if y < y_min || y > y_max || p0.y == p1.y {
                continue;
            }
            let x = p0.x + (y - p0.y) * (p1.x - p0.x) / (p1.y - p0.y);
            lo = lo.min(x);
            hi = hi.max(x);
        }
        (lo <= hi).then_some((lo, hi))
    }

    /// Rasterise into a 0 / 255 mask of `width × height` (edges inclusive).
    pub fn rasterize(&self, width: usize, height: usize) -> GrayImage {
        let mut mask = GrayImage::new(width, height);
        if width == 0 || height == 0 {
            return mask;
        }
        let y_min = self.corners.iter().map(|p| p.y).fold(f32::INFINITY, f32::min);
        let y_max = self
            .corners
            .iter()
            .map(|p| p.y)
            .fold(f32::NEG_INFINITY, f32::max);
        let row_lo = y_min.ceil().max(0.0) as usize;
        let row_hi = y_max.floor().min((height - 1) as f32);
        if row_hi < 0.0 {
            return mask;
        }
        for y in row_lo..=row_hi as usize {
            let Some((x0, x1)) = self.span_at(y as f32) else {
                continue;
            };
            let x_lo = x0.round().max(0.0) as usize;
            let x_hi = x1.round().min((width - 1) as f32);
            if x_hi < 0.0 {
                continue;
            }
            for x in x_lo..=x_hi as usize {
                mask.set(x, y, 255);
            }
        }
        mask
    }

    /// Zero every pixel of `image` outside the polygon.
    pub fn apply(&self, image: &GrayImage) -> GrayImage {
        let mask = self.rasterize(image.width, image.height);
        GrayImage {
            width: image.width,
            height: image.height,
            data: image
                .data
                .iter()
                .zip(&mask.data)
                .map(|(&v, &m)| v & m)
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn default_trapezoid_corners() {
        let poly =
            RegionPolygon::trapezoid(FrameShape::new(640, 480), &LaneDetectorParams::default());
        let expected = [(0.0, 480.0), (640.0, 480.0), (448.0, 240.0), (192.0, 240.0)];
        for (p, (x, y)) in poly.corners.iter().zip(expected) {
            assert_abs_diff_eq!(p.x, x, epsilon = 1e-3);
            assert_abs_diff_eq!(p.y, y, epsilon = 1e-3);
        }
    }

    #[test]
    fn mask_keeps_inside_and_drops_outside() {
        let shape = FrameShape::new(100, 80);
        let poly = RegionPolygon::trapezoid(shape, &LaneDetectorParams::default());
        let mask = poly.rasterize(shape.width, shape.height);
        // top edge at y = 40 spans x in [30, 70]
        assert_eq!(mask.get(50, 40), 255);
        assert_eq!(mask.get(25, 40), 0);
        assert_eq!(mask.get(50, 39), 0);
        assert_eq!(mask.get(1, 79), 255);
        assert_eq!(mask.get(99, 79), 255);
        assert_eq!(mask.get(5, 45), 0);
    }

    #[test]
    fn apply_zeroes_outside_pixels() {
        let shape = FrameShape::new(40, 40);
        let poly = RegionPolygon::trapezoid(shape, &LaneDetectorParams::default());
        let full = GrayImage {
            width: 40,
            height: 40,
            data: vec![255; 1600],
        };
        let masked = poly.apply(&full);
        assert_eq!(masked, poly.rasterize(40, 40));
        assert_eq!(masked.get(0, 0), 0);
    }
}

//! Edge extraction: intensity, Gaussian blur, fixed threshold, Canny.
//!
//! All stages run on owned `GrayImage` buffers. Convolutions mirror the
//! border without repeating the edge sample (`gfedcb|abcdefgh|gfedcba`), and
//! the Canny stage uses 3×3 Sobel derivatives with the L1 magnitude
//! `|gx| + |gy|`, four-direction non-maximum suppression and 8-connected
//! hysteresis.

use lanekeep_core::{FrameView, GrayImage};

use crate::params::LaneDetectorParams;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Run the whole extractor on a frame: gray -> blur -> threshold -> Canny.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(frame, params), fields(width = frame.width, height = frame.height))
)]
pub fn extract_edges(frame: &FrameView<'_>, params: &LaneDetectorParams) -> GrayImage {
    let gray = frame.to_gray();
    let blurred = gaussian_blur(&gray, params.blur_kernel);
    let binary = threshold_binary(&blurred, params.threshold_value);
    canny(&binary, params.canny_min, params.canny_max)
}

/// Normalised 1D Gaussian taps for an odd kernel size.
///
/// Sizes up to 7 use the fixed binomial-like tables common to camera
/// pipelines; larger sizes sample a Gaussian whose sigma is derived from the
/// size as `0.3 * ((k - 1) / 2 - 1) + 0.8`.
pub fn gaussian_kernel(ksize: usize) -> Vec<f32> {
    match ksize {
        0 | 1 => vec![1.0],
        3 => vec![0.25, 0.5, 0.25],
        5 => vec![0.0625, 0.25, 0.375, 0.25, 0.0625],
        7 => vec![
            0.03125, 0.109375, 0.21875, 0.28125, 0.21875, 0.109375, 0.03125,
        ],
        _ => {
            let sigma = 0.3 * ((ksize as f32 - 1.0) * 0.5 - 1.0) + 0.8;
            let half = (ksize / 2) as f32;
            let taps: Vec<f32> = (0..ksize)
                .map(|i| {
                    let d = i as f32 - half;
                    (-(d * d) / (2.0 * sigma * sigma)).exp()
                })
                .collect();
            let sum: f32 = taps.iter().sum();
            taps.into_iter().map(|t| t / sum).collect()
        }
    }
}

/// Mirror an out-of-range index back into `0..n` without repeating the edge.
#[inline]
fn reflect_101(i: isize, n: usize) -> usize {
    if n == 1 {
        return 0;
    }
    let n = n as isize;
    let period = 2 * (n - 1);
    let mut i = i.rem_euclid(period);
    if i >= n {
        i = period - i;
    }
    i as usize
}

/// Separable Gaussian blur with a `ksize × ksize` kernel.
pub fn gaussian_blur(src: &GrayImage, ksize: usize) -> GrayImage {
    let (w, h) = (src.width, src.height);
    if w == 0 || h == 0 || ksize <= 1 {
        return src.clone();
    }
    let kernel = gaussian_kernel(ksize);
    let half = (kernel.len() / 2) as isize;

    // horizontal
    let mut tmp = vec![0f32; w * h];
    for y in 0..h {
        let row = &src.data[y * w..(y + 1) * w];
        for x in 0..w {
            let mut acc = 0.0;
            for (k, &tap) in kernel.iter().enumerate() {
                let xx = reflect_101(x as isize + k as isize - half, w);
                acc += tap * row[xx] as f32;
            }
            tmp[y * w + x] = acc;
        }
    }

    // vertical
    let mut out = GrayImage::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0.0;
            for (k, &tap) in kernel.iter().enumerate() {
                let yy = reflect_101(y as isize + k as isize - half, h);
                acc += tap * tmp[yy * w + x];
            }
            out.data[y * w + x] = acc.round().clamp(0.0, 255.0) as u8;
        }
    }
    out
}

/// Binary threshold: `v > cutoff` maps to 255, everything else to 0.
pub fn threshold_binary(src: &GrayImage, cutoff: u8) -> GrayImage {
    GrayImage {
        width: src.width,
        height: src.height,
        data: src
            .data
            .iter()
            .map(|&v| if v > cutoff { 255 } else { 0 })
            .collect(),
    }
}

const TAN_22_5_DEG: f32 = 0.414_213_56;

/// Canny edge detector. Returns a 0 / 255 edge map of the same size.
///
/// Pixels with magnitude above `high` seed edges; pixels above `low` join an
/// edge when 8-connected to a seed. The outermost 1-pixel frame is never
/// marked.
pub fn canny(src: &GrayImage, low: f32, high: f32) -> GrayImage {
    let (w, h) = (src.width, src.height);
    let mut out = GrayImage::new(w, h);
    if w < 3 || h < 3 {
        return out;
    }
    let (low, high) = if low > high { (high, low) } else { (low, high) };

    let mut gx = vec![0f32; w * h];
    let mut gy = vec![0f32; w * h];
    let mut mag = vec![0f32; w * h];
    for y in 0..h {
        let ym = reflect_101(y as isize - 1, h);
        let yp = reflect_101(y as isize + 1, h);
        for x in 0..w {
            let xm = reflect_101(x as isize - 1, w);
            let xp = reflect_101(x as isize + 1, w);
            let p = |xx: usize, yy: usize| src.data[yy * w + xx] as f32;
            let dx = (p(xp, ym) + 2.0 * p(xp, y) + p(xp, yp))
                - (p(xm, ym) + 2.0 * p(xm, y) + p(xm, yp));
            let dy = (p(xm, yp) + 2.0 * p(x, yp) + p(xp, yp))
                - (p(xm, ym) + 2.0 * p(x, ym) + p(xp, ym));
            let i = y * w + x;
            gx[i] = dx;
            gy[i] = dy;
            mag[i] = dx.abs() + dy.abs();
        }
    }

    // 0 = suppressed, 1 = weak candidate, 2 = strong seed
    let mut class = vec![0u8; w * h];
    let mut stack = Vec::new();
    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let i = y * w + x;
            let m = mag[i];
            if m <= low {
                continue;
            }
            let (ax, ay) = (gx[i].abs(), gy[i].abs());
            // Neighbours along the gradient; ties keep the earlier pixel so a
            // flat ridge yields a single-pixel edge.
            let (before, after) = if ay <= ax * TAN_22_5_DEG {
                (mag[i - 1], mag[i + 1])
            } else if ax <= ay * TAN_22_5_DEG {
                (mag[i - w], mag[i + w])
            } else if (gx[i] > 0.0) == (gy[i] > 0.0) {
                (mag[i - w - 1], mag[i + w + 1])
            } else {
                (mag[i - w + 1], mag[i + w - 1])
            };
            if m > before && m >= after {
                if m > high {
                    class[i] = 2;
                    stack.push(i);
                } else {
                    class[i] = 1;
                }
            }
        }
    }

    while let Some(i) = stack.pop() {
        out.data[i] = 255;
        let (x, y) = (i % w, i / w);
        for ny in y.saturating_sub(1)..=(y + 1).min(h - 1) {
            for nx in x.saturating_sub(1)..=(x + 1).min(w - 1) {
                let j = ny * w + nx;
                if class[j] == 1 {
                    class[j] = 2;
                    stack.push(j);
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn vertical_step(w: usize, h: usize, at: usize) -> GrayImage {
        let mut img = GrayImage::new(w, h);
        for y in 0..h {
            for x in at..w {
                img.set(x, y, 255);
            }
        }
        img
    }

    #[test]
    fn kernels_are_normalised() {
        for k in [1, 3, 5, 7, 9, 15] {
            let taps = gaussian_kernel(k);
            assert_eq!(taps.len(), k);
            assert_abs_diff_eq!(taps.iter().sum::<f32>(), 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn reflect_mirrors_without_repeating_edge() {
        assert_eq!(reflect_101(-1, 5), 1);
        assert_eq!(reflect_101(-2, 5), 2);
        assert_eq!(reflect_101(5, 5), 3);
        assert_eq!(reflect_101(6, 5), 2);
        assert_eq!(reflect_101(3, 5), 3);
    }

    #[test]
    fn blur_preserves_flat_image() {
        let img = GrayImage {
            width: 8,
            height: 6,
            data: vec![90; 48],
        };
        assert_eq!(gaussian_blur(&img, 7), img);
    }

    #[test]
    fn threshold_is_strict() {
        let img = GrayImage {
            width: 3,
            height: 1,
            data: vec![145, 146, 10],
        };
        assert_eq!(threshold_binary(&img, 145).data, vec![0, 255, 0]);
    }

    #[test]
    fn canny_marks_a_thin_vertical_edge() {
        let img = vertical_step(20, 12, 10);
        let edges = canny(&img, 50.0, 150.0);
        for y in 1..11 {
            let cols: Vec<usize> = (0..20).filter(|&x| edges.get(x, y) == 255).collect();
            assert_eq!(cols.len(), 1, "row {y}: {cols:?}");
            assert!(cols[0] == 9 || cols[0] == 10);
        }
        assert_eq!(edges.get(10, 0), 0);
        assert_eq!(edges.get(10, 11), 0);
    }

    #[test]
    fn canny_ignores_flat_regions() {
        let img = GrayImage {
            width: 10,
            height: 10,
            data: vec![255; 100],
        };
        assert_eq!(canny(&img, 50.0, 150.0).count_nonzero(), 0);
    }
}

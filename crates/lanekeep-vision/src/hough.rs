//! Progressive probabilistic Hough transform.
//!
//! Edge pixels are visited in random order. Each one votes into a
//! `(rho, theta)` accumulator; once a cell reaches the vote threshold the
//! corridor through the pixel is walked in both directions, bridging up to
//! `max_line_gap` missing pixels. Pixels on the walked corridor are removed
//! from further consideration, and if the resulting segment is long enough its
//! votes are withdrawn and the segment is emitted.
//!
//! The visiting order comes from a seeded RNG, so a given frame always yields
//! the same segments.

use lanekeep_core::{GrayImage, RawSegment};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::params::HoughParams;

#[cfg(feature = "tracing")]
use tracing::instrument;

const SHIFT: i32 = 16;

struct Accumulator {
    num_angle: usize,
    num_rho: usize,
    /// `(cos, sin)` per angle bin, pre-divided by the rho resolution.
    trig: Vec<(f32, f32)>,
    votes: Vec<i32>,
}

impl Accumulator {
    fn new(width: usize, height: usize, params: &HoughParams) -> Self {
        let num_angle = ((std::f32::consts::PI / params.theta).round() as usize).max(1);
        let num_rho = ((((width + height) * 2 + 1) as f32 / params.rho).round() as usize).max(1);
        let irho = 1.0 / params.rho;
        let trig = (0..num_angle)
            .map(|n| {
                let a = n as f32 * params.theta;
                (a.cos() * irho, a.sin() * irho)
            })
            .collect();
        Self {
            num_angle,
            num_rho,
            trig,
            votes: vec![0; num_angle * num_rho],
        }
    }

    #[inline]
    fn rho_bin(&self, n: usize, x: i32, y: i32) -> usize {
        let (c, s) = self.trig[n];
        let r = (x as f32 * c + y as f32 * s).round() as i64 + (self.num_rho as i64 - 1) / 2;
        r.clamp(0, self.num_rho as i64 - 1) as usize
    }

    /// Add one vote per angle; returns the best `(votes, angle_bin)`.
    fn vote(&mut self, x: i32, y: i32) -> (i32, usize) {
        let mut best = (0, 0);
        for n in 0..self.num_angle {
            let idx = n * self.num_rho + self.rho_bin(n, x, y);
            self.votes[idx] += 1;
            if self.votes[idx] > best.0 {
                best = (self.votes[idx], n);
            }
        }
        best
    }

    fn withdraw(&mut self, x: i32, y: i32) {
        for n in 0..self.num_angle {
            let idx = n * self.num_rho + self.rho_bin(n, x, y);
            self.votes[idx] -= 1;
        }
    }
}

/// Fixed-point stepping along the line direction of one accumulator bin.
#[derive(Clone, Copy)]
struct Walker {
    x0: i32,
    y0: i32,
    dx: i32,
    dy: i32,
    /// Steps one whole pixel along x when true, along y otherwise.
    along_x: bool,
}

impl Walker {
    fn new(px: i32, py: i32, cos: f32, sin: f32) -> Self {
        let a = -sin;
        let b = cos;
        let one = (1i64 << SHIFT) as f32;
        if a.abs() > b.abs() {
            Self {
                x0: px,
                y0: (py << SHIFT) + (1 << (SHIFT - 1)),
                dx: if a > 0.0 { 1 } else { -1 },
                dy: (b * one / a.abs()).round() as i32,
                along_x: true,
            }
        } else {
            Self {
                x0: (px << SHIFT) + (1 << (SHIFT - 1)),
                y0: py,
                dx: (a * one / b.abs()).round() as i32,
                dy: if b > 0.0 { 1 } else { -1 },
                along_x: false,
            }
        }
    }

    #[inline]
    fn pixel(&self, x: i32, y: i32) -> (i32, i32) {
        if self.along_x {
            (x, y >> SHIFT)
        } else {
            (x >> SHIFT, y)
        }
    }

    /// Step vector for direction `k` (0 forward, 1 backward).
    #[inline]
    fn step(&self, k: usize) -> (i32, i32) {
        if k == 0 {
            (self.dx, self.dy)
        } else {
            (-self.dx, -self.dy)
        }
    }
}

/// Detect line segments in a binary edge map (non-zero = edge).
///
/// Never fails; an image without qualifying segments yields an empty vector.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(edges, params), fields(width = edges.width, height = edges.height))
)]
pub fn detect_segments(edges: &GrayImage, params: &HoughParams) -> Vec<RawSegment> {
    let (w, h) = (edges.width, edges.height);
    if w == 0 || h == 0 || params.rho <= 0.0 || params.theta <= 0.0 {
        return Vec::new();
    }
    let (wi, hi) = (w as i32, h as i32);

    let mut mask: Vec<bool> = edges.data.iter().map(|&v| v != 0).collect();
    let mut points: Vec<(i32, i32)> = mask
        .iter()
        .enumerate()
        .filter(|(_, &on)| on)
        .map(|(i, _)| ((i % w) as i32, (i / w) as i32))
        .collect();

    let mut acc = Accumulator::new(w, h, params);
    let mut rng = StdRng::seed_from_u64(params.seed);
    let threshold = params.threshold as i32;
    let min_len = params.min_line_length as i32;
    let max_gap = params.max_line_gap as i32;
    let mut segments = Vec::new();

    while !points.is_empty() {
        let pick = rng.gen_range(0..points.len());
        let (px, py) = points.swap_remove(pick);

        if !mask[py as usize * w + px as usize] {
            continue;
        }

        let (best_votes, best_n) = acc.vote(px, py);
        if best_votes < threshold {
            continue;
        }

        let (cos, sin) = acc.trig[best_n];
        let walker = Walker::new(px, py, cos, sin);

        let mut line_end = [(px, py); 2];
        for (k, end) in line_end.iter_mut().enumerate() {
            let (dx, dy) = walker.step(k);
            let (mut x, mut y) = (walker.x0, walker.y0);
            let mut gap = 0;
            loop {
                let (jx, iy) = walker.pixel(x, y);
                if jx < 0 || jx >= wi || iy < 0 || iy >= hi {
                    break;
                }
                if mask[iy as usize * w + jx as usize] {
                    gap = 0;
                    *end = (jx, iy);
                } else {
                    gap += 1;
                    if gap > max_gap {
                        break;
                    }
                }
                x += dx;
                y += dy;
            }
        }

        let good = (line_end[1].0 - line_end[0].0).abs() >= min_len
            || (line_end[1].1 - line_end[0].1).abs() >= min_len;

        for (k, &end) in line_end.iter().enumerate() {
            let (dx, dy) = walker.step(k);
            let (mut x, mut y) = (walker.x0, walker.y0);
            loop {
                let (jx, iy) = walker.pixel(x, y);
                if jx < 0 || jx >= wi || iy < 0 || iy >= hi {
                    break;
                }
                let idx = iy as usize * w + jx as usize;
                if mask[idx] {
                    if good {
                        acc.withdraw(jx, iy);
                    }
                    mask[idx] = false;
                }
                if (jx, iy) == end {
                    break;
                }
                x += dx;
                y += dy;
            }
        }

        if good {
            segments.push(RawSegment::new(
                line_end[0].0,
                line_end[0].1,
                line_end[1].0,
                line_end[1].1,
            ));
        }
    }

    log::debug!("hough: {} segments", segments.len());
    segments
}

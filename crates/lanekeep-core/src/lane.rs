use serde::{Deserialize, Serialize};

/// Width and height of the frames a detector works on, in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameShape {
    pub width: usize,
    pub height: usize,
}

impl FrameShape {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// Horizontal reference used to split left from right (`width / 2`).
    #[inline]
    pub fn center_x(&self) -> i32 {
        (self.width / 2) as i32
    }
}

/// Which lane boundary a camera looks at in dual-camera rigs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraSide {
    Left,
    Right,
}

/// Camera configuration the fitter dispatches on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraMode {
    /// One forward camera sees both boundaries.
    #[default]
    Single,
    /// One camera per boundary; only the given side is evaluated.
    Dual(CameraSide),
}

/// Raw segment from the line transform, integer pixel endpoints.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSegment {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl RawSegment {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Line through both endpoints, `None` for vertical segments.
    pub fn fit(&self) -> Option<LaneFit> {
        if self.x1 == self.x2 {
            return None;
        }
        let slope = (self.y2 - self.y1) as f64 / (self.x2 - self.x1) as f64;
        let intercept = self.y1 as f64 - slope * self.x1 as f64;
        Some(LaneFit { slope, intercept })
    }

    #[inline]
    pub fn mid_x(&self) -> f64 {
        (self.x1 + self.x2) as f64 / 2.0
    }

    pub fn length(&self) -> f64 {
        let dx = (self.x2 - self.x1) as f64;
        let dy = (self.y2 - self.y1) as f64;
        dx.hypot(dy)
    }
}

/// `y = slope * x + intercept` in image coordinates (y grows downwards).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LaneFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LaneFit {
    /// Component-wise mean with equal weight per fit.
    pub fn mean(fits: &[LaneFit]) -> Option<LaneFit> {
        if fits.is_empty() {
            return None;
        }
        let n = fits.len() as f64;
        let (s, i) = fits
            .iter()
            .fold((0.0, 0.0), |(s, i), f| (s + f.slope, i + f.intercept));
        Some(LaneFit {
            slope: s / n,
            intercept: i / n,
        })
    }

    /// x at row `y`; the frame centre when the slope is exactly zero.
    pub fn x_at(&self, y: i32, shape: FrameShape) -> i32 {
        if self.slope == 0.0 {
            return shape.center_x();
        }
        ((y as f64 - self.intercept) / self.slope) as i32
    }

    /// Span the fit from the bottom row up to a quarter of the frame height.
    pub fn to_line(&self, shape: FrameShape) -> LaneLine {
        let y1 = shape.height as i32;
        let y2 = y1 / 4;
        LaneLine {
            x1: self.x_at(y1, shape),
            y1,
            x2: self.x_at(y2, shape),
            y2,
        }
    }
}

/// Lane boundary as two pixel endpoints; `(x1, y1)` sits on the bottom row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaneLine {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl LaneLine {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    #[inline]
    pub fn to_array(&self) -> [i32; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }

    #[inline]
    pub fn mid_x(&self) -> f64 {
        (self.x1 + self.x2) as f64 / 2.0
    }

    /// Side the line lies on relative to the frame centre.
    pub fn side_in(&self, shape: FrameShape) -> CameraSide {
        if self.mid_x() < shape.center_x() as f64 {
            CameraSide::Left
        } else {
            CameraSide::Right
        }
    }

    /// Coordinate-wise mean, truncated toward zero.
    pub fn mean<'a>(lines: impl IntoIterator<Item = &'a LaneLine>) -> Option<LaneLine> {
        let mut sum = [0.0f64; 4];
        let mut n = 0usize;
        for line in lines {
            for (acc, v) in sum.iter_mut().zip(line.to_array()) {
                *acc += v as f64;
            }
            n += 1;
        }
        if n == 0 {
            return None;
        }
        let m = sum.map(|s| (s / n as f64) as i32);
        Some(LaneLine::new(m[0], m[1], m[2], m[3]))
    }
}

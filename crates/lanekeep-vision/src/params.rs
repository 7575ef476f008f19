use serde::{Deserialize, Serialize};

/// Errors raised by [`LaneDetectorParams::validate`].
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ParamsError {
    #[error("blur_kernel must be odd and >= 1 (got {0})")]
    InvalidBlurKernel(usize),
    #[error("canny thresholds must satisfy 0 <= canny_min <= canny_max (got {min} / {max})")]
    InvalidCannyThresholds { min: f32, max: f32 },
    #[error("{name} must lie in (0, 1] (got {value})")]
    FractionOutOfRange { name: &'static str, value: f32 },
    #[error("min_line_length must be positive")]
    ZeroMinLineLength,
}

/// Tunable parameters of the lane detector.
///
/// Serialises to the flat key/value mapping the tuning tools persist; every
/// key is optional on input and falls back to its default.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LaneDetectorParams {
    /// Side of the square Gaussian blur kernel. Must be odd.
    pub blur_kernel: usize,

    /// Binarisation cutoff: samples above it become 255, the rest 0.
    pub threshold_value: u8,

    /// Canny hysteresis thresholds.
    pub canny_min: f32,
    pub canny_max: f32,

    /// Width of the region-of-interest trapezoid at its top and bottom edge,
    /// as a fraction of the frame width.
    pub top_width: f32,
    pub bottom_width: f32,

    /// Height of the trapezoid as a fraction of the frame height, measured
    /// from the bottom row.
    pub trapezoid_height: f32,

    /// Shortest segment (in pixels, along x or y) the Hough stage keeps.
    pub min_line_length: u32,

    /// Largest run of missing pixels bridged inside one segment.
    pub max_line_gap: u32,
}

impl Default for LaneDetectorParams {
    fn default() -> Self {
        Self {
            blur_kernel: 7,
            threshold_value: 145,
            canny_min: 50.0,
            canny_max: 150.0,
            top_width: 0.4,
            bottom_width: 1.0,
            trapezoid_height: 0.5,
            min_line_length: 50,
            max_line_gap: 4,
        }
    }
}

impl LaneDetectorParams {
    /// Reject configurations the pipeline cannot run with.
    ///
    /// Meant for configuration-load time; the detector itself never fails.
    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.blur_kernel % 2 == 0 {
            return Err(ParamsError::InvalidBlurKernel(self.blur_kernel));
        }
        if !(self.canny_min >= 0.0 && self.canny_min <= self.canny_max) {
            return Err(ParamsError::InvalidCannyThresholds {
                min: self.canny_min,
                max: self.canny_max,
            });
        }
        for (name, value) in [
            ("top_width", self.top_width),
            ("bottom_width", self.bottom_width),
            ("trapezoid_height", self.trapezoid_height),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(ParamsError::FractionOutOfRange { name, value });
            }
        }
        if self.min_line_length == 0 {
            return Err(ParamsError::ZeroMinLineLength);
        }
        Ok(())
    }

    /// Segment-detector settings; resolution and vote threshold are fixed.
    pub fn hough(&self) -> HoughParams {
        HoughParams {
            min_line_length: self.min_line_length,
            max_line_gap: self.max_line_gap,
            ..HoughParams::default()
        }
    }
}

/// Settings for the progressive probabilistic Hough transform.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct HoughParams {
    /// Distance resolution of the accumulator, pixels.
    pub rho: f32,
    /// Angle resolution of the accumulator, radians.
    pub theta: f32,
    /// Votes a cell needs before a segment is traced from it.
    pub threshold: u32,
    pub min_line_length: u32,
    pub max_line_gap: u32,
    /// Seed of the point visiting order.
    pub seed: u64,
}

impl Default for HoughParams {
    fn default() -> Self {
        Self {
            rho: 2.0,
            theta: std::f32::consts::PI / 180.0,
            threshold: 50,
            min_line_length: 50,
            max_line_gap: 4,
            seed: 0x5eed_1a4e,
        }
    }
}

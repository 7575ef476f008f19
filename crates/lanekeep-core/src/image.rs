use serde::{Deserialize, Serialize};

use crate::FrameShape;

/// Errors raised when wrapping a raw pixel buffer.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum FrameError {
    #[error("invalid frame dimensions (width={width}, height={height})")]
    InvalidDimensions { width: usize, height: usize },

    #[error("invalid frame buffer length (expected {expected} bytes, got {got})")]
    InvalidBufferLength { expected: usize, got: usize },
}

/// Byte order of the samples in a [`FrameView`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelLayout {
    Gray,
    /// Interleaved blue, green, red (camera drivers commonly deliver this).
    Bgr,
    Rgb,
}

impl PixelLayout {
    #[inline]
    pub fn channels(self) -> usize {
        match self {
            PixelLayout::Gray => 1,
            PixelLayout::Bgr | PixelLayout::Rgb => 3,
        }
    }
}

/// Borrowed camera frame, row-major, `channels` interleaved bytes per pixel.
#[derive(Clone, Copy, Debug)]
pub struct FrameView<'a> {
    pub width: usize,
    pub height: usize,
    pub layout: PixelLayout,
    pub data: &'a [u8],
}

impl<'a> FrameView<'a> {
    /// Wrap a raw buffer, checking that its length matches the dimensions.
    pub fn new(
        width: usize,
        height: usize,
        layout: PixelLayout,
        data: &'a [u8],
    ) -> Result<Self, FrameError> {
        if width == 0 || height == 0 {
            return Err(FrameError::InvalidDimensions { width, height });
        }
        let expected = width
            .checked_mul(height)
            .and_then(|n| n.checked_mul(layout.channels()))
            .ok_or(FrameError::InvalidDimensions { width, height })?;
        if data.len() != expected {
            return Err(FrameError::InvalidBufferLength {
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            layout,
            data,
        })
    }

    #[inline]
    pub fn shape(&self) -> FrameShape {
        FrameShape::new(self.width, self.height)
    }

    /// Convert to single-channel intensity with the BT.601 luma weights.
    pub fn to_gray(&self) -> GrayImage {
        let n = self.width * self.height;
        let data = match self.layout {
            PixelLayout::Gray => self.data[..n].to_vec(),
            PixelLayout::Bgr => self
                .data
                .chunks_exact(3)
                .take(n)
                .map(|px| luma(px[2], px[1], px[0]))
                .collect(),
            PixelLayout::Rgb => self
                .data
                .chunks_exact(3)
                .take(n)
                .map(|px| luma(px[0], px[1], px[2]))
                .collect(),
        };
        GrayImage {
            width: self.width,
            height: self.height,
            data,
        }
    }
}

impl<'a> From<GrayImageView<'a>> for FrameView<'a> {
    fn from(view: GrayImageView<'a>) -> Self {
        Self {
            width: view.width,
            height: view.height,
            layout: PixelLayout::Gray,
            data: view.data,
        }
    }
}

#[inline]
fn luma(r: u8, g: u8, b: u8) -> u8 {
    let y = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
    y.round().clamp(0.0, 255.0) as u8
}

#[derive(Clone, Copy, Debug)]
pub struct GrayImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u8], // row-major, len = w*h
}

impl GrayImageView<'_> {
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }

    #[inline]
    pub fn row(&self, y: usize) -> &[u8] {
        let start = y * self.width;
        &self.data[start..start + self.width]
    }
}

/// Owned single-channel image. Edge maps use 0 / 255 samples.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrayImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl GrayImage {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0; width * height],
        }
    }

    #[inline]
    pub fn view(&self) -> GrayImageView<'_> {
        GrayImageView {
            width: self.width,
            height: self.height,
            data: &self.data,
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, v: u8) {
        self.data[y * self.width + x] = v;
    }

    #[inline]
    pub fn shape(&self) -> FrameShape {
        FrameShape::new(self.width, self.height)
    }

    /// Number of non-zero samples.
    pub fn count_nonzero(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0).count()
    }
}

//! Core types and utilities for the lanekeep lane-following pipeline.
//!
//! This crate is intentionally small. It holds the borrowed frame views fed
//! into the detector, the owned grayscale buffers the pipeline stages pass
//! between each other, and the lane geometry types shared by the vision and
//! steering crates. It does *not* depend on any concrete image decoder.

mod image;
mod lane;
mod logger;

pub use image::{FrameError, FrameView, GrayImage, GrayImageView, PixelLayout};
pub use lane::{CameraMode, CameraSide, FrameShape, LaneFit, LaneLine, RawSegment};

#[cfg(feature = "tracing")]
pub use logger::{init_tracing, TraceFormat};

pub use logger::{init_with_level, level_for_verbosity, short_target};

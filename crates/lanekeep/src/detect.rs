use crate::control::FrameSource;
use lanekeep_core::{FrameError, FrameView, LaneLine, PixelLayout};
use lanekeep_vision::{LaneDetectionDebug, LaneDetector};
use log::debug;
use std::path::{Path, PathBuf};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Errors produced by the image-based helpers.
#[derive(thiserror::Error, Debug)]
pub enum DetectError {
    #[error("failed to decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: ::image::ImageError,
    },

    #[error(transparent)]
    Frame(#[from] FrameError),
}

/// Borrow an `image::RgbImage` as a pipeline frame.
pub fn rgb_frame(img: &::image::RgbImage) -> Result<FrameView<'_>, FrameError> {
    FrameView::new(
        img.width() as usize,
        img.height() as usize,
        PixelLayout::Rgb,
        img.as_raw(),
    )
}

/// Borrow an `image::GrayImage` as a pipeline frame.
pub fn gray_frame(img: &::image::GrayImage) -> Result<FrameView<'_>, FrameError> {
    FrameView::new(
        img.width() as usize,
        img.height() as usize,
        PixelLayout::Gray,
        img.as_raw(),
    )
}

/// Decode an image file of any format `image` supports into RGB.
pub fn load_rgb(path: impl AsRef<Path>) -> Result<::image::RgbImage, DetectError> {
    let path = path.as_ref();
    let img = ::image::open(path).map_err(|source| DetectError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(img.to_rgb8())
}

/// Run the detector on a decoded RGB image.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(detector, img), fields(width = img.width(), height = img.height()))
)]
pub fn detect_lanes_rgb(
    detector: &mut LaneDetector,
    img: &::image::RgbImage,
) -> Result<LaneDetectionDebug, DetectError> {
    let frame = rgb_frame(img)?;
    Ok(detector.detect_lanes_debug(&frame))
}

/// Decode `path` and run the detector on it.
pub fn detect_lanes_in_file(
    detector: &mut LaneDetector,
    path: impl AsRef<Path>,
) -> Result<Vec<LaneLine>, DetectError> {
    let img = load_rgb(path)?;
    Ok(detect_lanes_rgb(detector, &img)?.lines)
}

/// Expand directories into their regular files, sorted by name; plain
/// paths are kept as given, in order.
pub fn collect_image_paths(inputs: &[PathBuf]) -> std::io::Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for input in inputs {
        if !input.is_dir() {
            paths.push(input.clone());
            continue;
        }
        let mut files = Vec::new();
        for entry in std::fs::read_dir(input)? {
            let path = entry?.path();
            if path.is_file() {
                files.push(path);
            }
        }
        files.sort();
        paths.extend(files);
    }
    Ok(paths)
}

/// Frame source reading a fixed list of image files in order.
///
/// Stands in for a live camera on hosts without one. Each call decodes the
/// next file and lends it out until the following call.
#[derive(Debug)]
pub struct ImageSequence {
    paths: std::vec::IntoIter<PathBuf>,
    current: Option<::image::RgbImage>,
}

impl ImageSequence {
    pub fn new(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            paths: paths.into_iter().collect::<Vec<_>>().into_iter(),
            current: None,
        }
    }

    /// Frames from files and directories, see [`collect_image_paths`].
    pub fn from_inputs(inputs: &[PathBuf]) -> std::io::Result<Self> {
        Ok(Self::new(collect_image_paths(inputs)?))
    }

    /// Files not yet handed out.
    pub fn remaining(&self) -> usize {
        self.paths.len()
    }
}

impl FrameSource for ImageSequence {
    type Error = DetectError;

    fn next_frame(&mut self) -> Result<Option<FrameView<'_>>, DetectError> {
        let Some(path) = self.paths.next() else {
            return Ok(None);
        };
        debug!("reading frame {}", path.display());
        let img = self.current.insert(load_rgb(&path)?);
        Ok(Some(rgb_frame(img)?))
    }
}

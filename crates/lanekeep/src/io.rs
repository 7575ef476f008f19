//! JSON configuration and report helpers.

use lanekeep_core::{CameraMode, CameraSide, FrameShape, LaneLine};
use lanekeep_vision::{LaneDetectorParams, ParamsError};
use log::{info, warn};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

#[derive(thiserror::Error, Debug)]
pub enum ConfigIoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("invalid parameters in {}: {source}", path.display())]
    Params {
        path: PathBuf,
        #[source]
        source: ParamsError,
    },
}

pub const SINGLE_CAMERA_CONFIG: &str = "single_camera_config.json";
pub const DUAL_CAMERA_CONFIG: &str = "dual_camera_config.json";

/// Conventional config file name for a camera mode, relative to the working
/// directory. Both dual-camera detectors share one file.
pub fn default_config_path(mode: CameraMode) -> PathBuf {
    match mode {
        CameraMode::Single => PathBuf::from(SINGLE_CAMERA_CONFIG),
        CameraMode::Dual(_) => PathBuf::from(DUAL_CAMERA_CONFIG),
    }
}

/// Load any JSON document from disk.
pub fn load_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, ConfigIoError> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// Write a value to disk as pretty JSON.
pub fn write_json<T: Serialize + ?Sized>(
    path: impl AsRef<Path>,
    value: &T,
) -> Result<(), ConfigIoError> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)?;
    Ok(())
}

/// Load detector parameters from a flat JSON object and validate them.
///
/// Keys missing from the file keep their defaults.
pub fn load_params(path: impl AsRef<Path>) -> Result<LaneDetectorParams, ConfigIoError> {
    let path = path.as_ref();
    let params: LaneDetectorParams = load_json(path)?;
    params.validate().map_err(|source| ConfigIoError::Params {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(params)
}

/// Like [`load_params`], but a missing file yields the defaults.
///
/// Unreadable or invalid files are still errors.
pub fn load_params_or_default(path: impl AsRef<Path>) -> Result<LaneDetectorParams, ConfigIoError> {
    let path = path.as_ref();
    if !path.exists() {
        warn!("{} not found, using default parameters", path.display());
        return Ok(LaneDetectorParams::default());
    }
    let params = load_params(path)?;
    info!("loaded parameters from {}", path.display());
    Ok(params)
}

/// Persist parameters as the flat JSON mapping [`load_params`] reads.
pub fn write_params(
    path: impl AsRef<Path>,
    params: &LaneDetectorParams,
) -> Result<(), ConfigIoError> {
    write_json(path, params)
}

/// Lane line labelled with the side of the frame it lies on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedLine {
    pub side: CameraSide,
    #[serde(flatten)]
    pub line: LaneLine,
}

/// Tag each line by comparing its midpoint with `width / 2`.
pub fn tag_lines(lines: &[LaneLine], shape: FrameShape) -> Vec<TaggedLine> {
    lines
        .iter()
        .map(|&line| TaggedLine {
            side: line.side_in(shape),
            line,
        })
        .collect()
}

/// Per-image entry of a detection report.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FrameReport {
    pub path: String,
    pub width: usize,
    pub height: usize,
    pub segments: usize,
    pub lines: Vec<TaggedLine>,
}

/// Detection report written by `lanekeep detect`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DetectReport {
    pub mode: CameraMode,
    pub params: LaneDetectorParams,
    pub frames: Vec<FrameReport>,
}

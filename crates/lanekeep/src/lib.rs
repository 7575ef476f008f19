//! High-level facade crate for the `lanekeep-*` workspace.
//!
//! This crate provides:
//! - re-exports of the frame/geometry types, the lane detector and the
//!   steering law
//! - JSON config loading and report types ([`io`])
//! - a frame-by-frame control loop over pluggable camera, decision and motor
//!   seams ([`control`])
//! - (feature `image`) helpers that decode image files into frames ([`detect`])
//!
//! ## Quickstart
//!
//! ```no_run
//! use lanekeep::detect::detect_lanes_in_file;
//! use lanekeep::{io, map_offset_to_command, CameraMode, LaneDetector};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let params = io::load_params_or_default(io::default_config_path(CameraMode::Single))?;
//! let mut detector = LaneDetector::new(params);
//!
//! let lines = detect_lanes_in_file(&mut detector, "frame_0001.png")?;
//! println!("detected {} lane lines", lines.len());
//!
//! let command = map_offset_to_command(-120.0, 200.0);
//! println!("{:?} at {}%", command.direction, command.duty_cycle);
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `lanekeep::core`: frames, grayscale buffers, lane geometry, logger.
//! - `lanekeep::vision`: the lane detector and its pipeline stages.
//! - `lanekeep::steer`: offset-to-command mapping and the actuator seam.
//! - `lanekeep::control`: [`LaneKeeper`](control::LaneKeeper) and
//!   [`DualLaneMonitor`](control::DualLaneMonitor).

pub use lanekeep_core as core;
pub use lanekeep_steer as steer;
pub use lanekeep_vision as vision;

pub use lanekeep_core::{CameraMode, CameraSide, FrameShape, FrameView, LaneLine, PixelLayout};
pub use lanekeep_steer::{
    map_offset_to_command, Actuator, MotorGuard, SteerDirection, SteeringCommand, SteeringParams,
    SteeringParamsError,
};
pub use lanekeep_vision::{LaneDetector, LaneDetectorParams};

pub mod control;
pub mod io;

#[cfg(feature = "image")]
pub mod detect;

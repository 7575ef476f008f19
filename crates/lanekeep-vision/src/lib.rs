//! Classical lane-line detector built on top of `lanekeep-core`.
//!
//! ## Quickstart
//!
//! ```
//! use lanekeep_core::{FrameView, PixelLayout};
//! use lanekeep_vision::{LaneDetector, LaneDetectorParams};
//!
//! let pixels = vec![0u8; 320 * 240 * 3];
//! let frame = FrameView::new(320, 240, PixelLayout::Bgr, &pixels).unwrap();
//!
//! let mut detector = LaneDetector::new(LaneDetectorParams::default());
//! let lines = detector.detect_lanes(&frame);
//! println!("detected {} lane lines", lines.len());
//! ```
//!
//! Per frame:
//! 1. Convert to intensity, Gaussian-blur, binarise with a fixed cutoff.
//! 2. Run Canny on the binary image.
//! 3. Keep only edges inside a trapezoid in front of the vehicle.
//! 4. Extract segments with a progressive probabilistic Hough transform.
//! 5. Split segments into left/right by slope, average each cluster into one
//!    slope/intercept and extend it from the bottom row to a quarter height.
//! 6. When a side has no segments, substitute the mean of its last 5 lines.

mod detector;
mod edges;
mod fit;
mod history;
mod hough;
mod params;
mod roi;

pub use detector::{LaneDetectionDebug, LaneDetector};
pub use edges::{canny, extract_edges, gaussian_blur, gaussian_kernel, threshold_binary};
pub use fit::{classify_segments, fit_lane_lines, SideClusters};
pub use history::{LaneHistory, LineHistory, HISTORY_CAPACITY};
pub use hough::detect_segments;
pub use params::{HoughParams, LaneDetectorParams, ParamsError};
pub use roi::RegionPolygon;

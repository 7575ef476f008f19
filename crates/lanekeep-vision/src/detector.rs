use lanekeep_core::{CameraMode, FrameShape, FrameView, GrayImage, LaneLine, RawSegment};
use log::{debug, warn};
use serde::Serialize;

use crate::edges::extract_edges;
use crate::fit::fit_lane_lines;
use crate::history::LaneHistory;
use crate::hough::detect_segments;
use crate::params::LaneDetectorParams;
use crate::roi::RegionPolygon;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Intermediate products of one detection, for reports and overlays.
#[derive(Clone, Debug, Serialize)]
pub struct LaneDetectionDebug {
    pub shape: FrameShape,
    pub region: RegionPolygon,
    pub edge_pixels: usize,
    pub masked_edge_pixels: usize,
    pub segments: Vec<RawSegment>,
    pub lines: Vec<LaneLine>,
}

/// Per-camera lane detector.
///
/// Holds the only cross-frame state of the pipeline: the frame shape, fixed
/// by the first frame, and the per-side line history. Use one instance per
/// camera; detection takes `&mut self`, so calls on an instance are
/// serialised by construction.
#[derive(Clone, Debug)]
pub struct LaneDetector {
    params: LaneDetectorParams,
    mode: CameraMode,
    shape: Option<FrameShape>,
    history: LaneHistory,
}

impl LaneDetector {
    /// Single-camera detector.
    pub fn new(params: LaneDetectorParams) -> Self {
        Self {
            params,
            mode: CameraMode::Single,
            shape: None,
            history: LaneHistory::default(),
        }
    }

    pub fn with_mode(mut self, mode: CameraMode) -> Self {
        self.mode = mode;
        self
    }

    /// Active configuration, suitable for persisting.
    #[inline]
    pub fn parameters(&self) -> &LaneDetectorParams {
        &self.params
    }

    #[inline]
    pub fn mode(&self) -> CameraMode {
        self.mode
    }

    /// Frame shape recorded from the first frame, if any was seen.
    #[inline]
    pub fn shape(&self) -> Option<FrameShape> {
        self.shape
    }

    #[inline]
    pub fn history(&self) -> &LaneHistory {
        &self.history
    }

    /// Forget the line history; the recorded frame shape is kept.
    pub fn reset(&mut self) {
        self.history.clear();
    }

    fn record_shape(&mut self, seen: FrameShape) -> FrameShape {
        match self.shape {
            Some(shape) => {
                if shape != seen {
                    warn!(
                        "frame is {}x{} but detector is locked to {}x{}",
                        seen.width, seen.height, shape.width, shape.height
                    );
                }
                shape
            }
            None => {
                debug!("locking frame shape to {}x{}", seen.width, seen.height);
                self.shape = Some(seen);
                seen
            }
        }
    }

    /// Zero everything outside the trapezoid in front of the vehicle.
    pub fn region_of_interest(&mut self, edges: &GrayImage) -> (RegionPolygon, GrayImage) {
        let shape = self.record_shape(edges.shape());
        self.mask_region(shape, edges)
    }

    fn mask_region(&self, shape: FrameShape, edges: &GrayImage) -> (RegionPolygon, GrayImage) {
        let region = RegionPolygon::trapezoid(shape, &self.params);
        let masked = region.apply(edges);
        (region, masked)
    }

    /// Run the full pipeline on one frame.
    ///
    /// Returns 0, 1 or 2 lines. In single-camera mode a left line, when
    /// present, always comes first. An empty result is a normal outcome.
    pub fn detect_lanes(&mut self, frame: &FrameView<'_>) -> Vec<LaneLine> {
        self.detect_lanes_debug(frame).lines
    }

    /// Same as [`detect_lanes`](Self::detect_lanes), keeping the
    /// intermediate products.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, frame), fields(width = frame.width, height = frame.height))
    )]
    pub fn detect_lanes_debug(&mut self, frame: &FrameView<'_>) -> LaneDetectionDebug {
        let shape = self.record_shape(frame.shape());
        let edges = extract_edges(frame, &self.params);
        let (region, masked) = self.mask_region(shape, &edges);
        let segments = detect_segments(&masked, &self.params.hough());
        let lines = fit_lane_lines(&segments, self.mode, shape, &mut self.history);

        let edge_pixels = edges.count_nonzero();
        let masked_edge_pixels = masked.count_nonzero();
        debug!(
            "{} edge pixels, {} in region, {} segments -> {} lines",
            edge_pixels,
            masked_edge_pixels,
            segments.len(),
            lines.len()
        );

        LaneDetectionDebug {
            shape,
            region,
            edge_pixels,
            masked_edge_pixels,
            segments,
            lines,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lanekeep_core::{CameraSide, PixelLayout};

    #[test]
    fn blank_frame_yields_nothing() {
        let data = vec![0u8; 64 * 48 * 3];
        let frame = FrameView::new(64, 48, PixelLayout::Bgr, &data).unwrap();
        let mut detector = LaneDetector::new(LaneDetectorParams::default());
        assert!(detector.detect_lanes(&frame).is_empty());
        assert_eq!(detector.shape(), Some(FrameShape::new(64, 48)));
    }

    #[test]
    fn shape_is_locked_by_first_frame() {
        let mut detector = LaneDetector::new(LaneDetectorParams::default())
            .with_mode(CameraMode::Dual(CameraSide::Left));
        let small = vec![0u8; 32 * 24];
        let large = vec![0u8; 64 * 48];
        let frame = FrameView::new(32, 24, PixelLayout::Gray, &small).unwrap();
        detector.detect_lanes(&frame);
        let frame = FrameView::new(64, 48, PixelLayout::Gray, &large).unwrap();
        let debug = detector.detect_lanes_debug(&frame);
        assert_eq!(debug.shape, FrameShape::new(32, 24));
        assert_eq!(detector.shape(), Some(FrameShape::new(32, 24)));
    }

    #[test]
    fn region_of_interest_locks_shape_and_masks() {
        let mut detector = LaneDetector::new(LaneDetectorParams::default());
        let edges = GrayImage {
            width: 100,
            height: 80,
            data: vec![255; 100 * 80],
        };
        let (region, masked) = detector.region_of_interest(&edges);
        assert_eq!(detector.shape(), Some(FrameShape::new(100, 80)));
        assert_eq!(region, RegionPolygon::trapezoid(FrameShape::new(100, 80), &detector.params));
        // top edge of the default trapezoid sits at y = 40, spanning x in [30, 70]
        assert_eq!(masked.get(50, 60), 255);
        assert_eq!(masked.get(50, 20), 0);
        assert_eq!(masked.get(5, 45), 0);
        assert_eq!(masked.count_nonzero(), region.rasterize(100, 80).count_nonzero());
    }

    #[test]
    fn parameters_read_back() {
        let params = LaneDetectorParams {
            threshold_value: 99,
            ..LaneDetectorParams::default()
        };
        let detector = LaneDetector::new(params.clone());
        assert_eq!(detector.parameters(), &params);
        assert_eq!(detector.mode(), CameraMode::Single);
    }
}

//! Segment classification and per-side lane fitting.

use lanekeep_core::{CameraMode, CameraSide, FrameShape, LaneFit, LaneLine, RawSegment};

use crate::history::LaneHistory;

/// Segment fits grouped by the side they were assigned to.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SideClusters {
    pub left: Vec<LaneFit>,
    pub right: Vec<LaneFit>,
}

impl SideClusters {
    pub fn side(&self, side: CameraSide) -> &[LaneFit] {
        match side {
            CameraSide::Left => &self.left,
            CameraSide::Right => &self.right,
        }
    }
}

/// Split segments into left- and right-leaning clusters.
///
/// The positional test (midpoint on the matching half of the frame) runs
/// first, then every remaining segment falls back to its slope sign, so in
/// effect every `slope < 0` segment ends up left and every `slope > 0`
/// segment right. Vertical and horizontal segments are dropped.
pub fn classify_segments(segments: &[RawSegment], shape: FrameShape) -> SideClusters {
    let reference_x = shape.center_x() as f64;
    let mut clusters = SideClusters::default();
    for seg in segments {
        let Some(fit) = seg.fit() else {
            continue;
        };
        let mid_x = seg.mid_x();
        if fit.slope < 0.0 && mid_x < reference_x {
            clusters.left.push(fit);
        } else if fit.slope > 0.0 && mid_x > reference_x {
            clusters.right.push(fit);
        } else if fit.slope < 0.0 {
            clusters.left.push(fit);
        } else if fit.slope > 0.0 {
            clusters.right.push(fit);
        }
    }
    clusters
}

/// Current-frame line for `side`, else the history mean, else nothing.
///
/// A current fit is recorded in the history before it is returned.
fn resolve_side(
    side: CameraSide,
    clusters: &SideClusters,
    shape: FrameShape,
    history: &mut LaneHistory,
) -> Option<LaneLine> {
    match LaneFit::mean(clusters.side(side)) {
        Some(fit) => {
            let line = fit.to_line(shape);
            history.side_mut(side).push(line);
            Some(line)
        }
        None => history.side(side).mean_or_absent(),
    }
}

/// Fit lane lines for the given camera mode.
///
/// Single-camera results are ordered left then right, each present only when
/// a current fit or history exists; dual-camera results hold at most the
/// configured side.
pub fn fit_lane_lines(
    segments: &[RawSegment],
    mode: CameraMode,
    shape: FrameShape,
    history: &mut LaneHistory,
) -> Vec<LaneLine> {
    let clusters = classify_segments(segments, shape);
    log::debug!(
        "classified {} segments: {} left, {} right",
        segments.len(),
        clusters.left.len(),
        clusters.right.len()
    );
    match mode {
        CameraMode::Single => [CameraSide::Left, CameraSide::Right]
            .into_iter()
            .filter_map(|side| resolve_side(side, &clusters, shape, history))
            .collect(),
        CameraMode::Dual(side) => resolve_side(side, &clusters, shape, history)
            .into_iter()
            .collect(),
    }
}

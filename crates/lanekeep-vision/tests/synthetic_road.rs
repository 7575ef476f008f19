use lanekeep_core::{CameraMode, CameraSide, FrameShape, FrameView, LaneLine, PixelLayout};
use lanekeep_vision::{LaneDetector, LaneDetectorParams, RegionPolygon, HISTORY_CAPACITY};

const W: usize = 320;
const H: usize = 240;

/// BGR frame with painted strokes of the given brightness on dark asphalt.
fn road_frame(strokes: &[((f32, f32), (f32, f32))], paint: u8) -> Vec<u8> {
    let mut data = vec![20u8; W * H * 3];
    for y in 0..H {
        for x in 0..W {
            let p = (x as f32, y as f32);
            if strokes.iter().any(|&(a, b)| dist_to_segment(p, a, b) <= 3.5) {
                let i = (y * W + x) * 3;
                data[i..i + 3].fill(paint);
            }
        }
    }
    data
}

fn dist_to_segment(p: (f32, f32), a: (f32, f32), b: (f32, f32)) -> f32 {
    let (vx, vy) = (b.0 - a.0, b.1 - a.1);
    let t = (((p.0 - a.0) * vx + (p.1 - a.1) * vy) / (vx * vx + vy * vy)).clamp(0.0, 1.0);
    let (cx, cy) = (a.0 + t * vx, a.1 + t * vy);
    ((p.0 - cx).powi(2) + (p.1 - cy).powi(2)).sqrt()
}

const LEFT: ((f32, f32), (f32, f32)) = ((40.0, 239.0), (140.0, 125.0));
const RIGHT: ((f32, f32), (f32, f32)) = ((280.0, 239.0), (180.0, 125.0));

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn frame(data: &[u8]) -> FrameView<'_> {
    FrameView::new(W, H, PixelLayout::Bgr, data).expect("valid frame")
}

fn assert_near(actual: i32, expected: i32, tol: i32, what: &str) {
    assert!(
        (actual - expected).abs() <= tol,
        "{what}: expected {expected} ± {tol}, got {actual}"
    );
}

#[test]
fn finds_both_boundaries_in_single_camera_mode() {
    init_logging();
    let data = road_frame(&[LEFT, RIGHT], 255);
    let mut detector = LaneDetector::new(LaneDetectorParams::default());
    let lines = detector.detect_lanes(&frame(&data));

    assert_eq!(lines.len(), 2, "{lines:?}");
    let (left, right) = (lines[0], lines[1]);
    assert_eq!((left.y1, left.y2), (240, 60));
    assert_near(left.x1, 39, 12, "left bottom x");
    assert_near(left.x2, 197, 20, "left top x");
    assert_near(right.x1, 281, 12, "right bottom x");
    assert_near(right.x2, 123, 20, "right top x");

    let shape = FrameShape::new(W, H);
    assert_eq!(left.side_in(shape), CameraSide::Left);
    assert_eq!(right.side_in(shape), CameraSide::Right);
}

#[test]
fn dual_camera_mode_reports_only_its_side() {
    let data = road_frame(&[LEFT, RIGHT], 255);
    let mut detector = LaneDetector::new(LaneDetectorParams::default())
        .with_mode(CameraMode::Dual(CameraSide::Right));
    let lines = detector.detect_lanes(&frame(&data));
    assert_eq!(lines.len(), 1, "{lines:?}");
    assert_near(lines[0].x1, 281, 12, "right bottom x");
    assert!(detector.history().side(CameraSide::Left).is_empty());
}

#[test]
fn dim_markings_fall_below_the_threshold() {
    let data = road_frame(&[LEFT, RIGHT], 120);
    let mut detector = LaneDetector::new(LaneDetectorParams::default());
    let debug = detector.detect_lanes_debug(&frame(&data));
    assert_eq!(debug.edge_pixels, 0);
    assert!(debug.lines.is_empty());
}

#[test]
fn markings_outside_the_region_are_ignored() {
    // A stroke in the top-left corner lies entirely outside the trapezoid.
    let data = road_frame(&[((10.0, 110.0), (110.0, 10.0))], 255);
    let mut detector = LaneDetector::new(LaneDetectorParams::default());
    let debug = detector.detect_lanes_debug(&frame(&data));
    assert!(debug.edge_pixels > 0);
    assert_eq!(debug.masked_edge_pixels, 0);
    assert!(debug.segments.is_empty());
    assert!(debug.lines.is_empty());
}

#[test]
fn history_mean_covers_a_dropout() {
    init_logging();
    let mut detector = LaneDetector::new(LaneDetectorParams::default());
    let mut seen = Vec::new();
    for shift in [0.0f32, 6.0, 12.0] {
        let stroke = ((LEFT.0 .0 + shift, LEFT.0 .1), (LEFT.1 .0 + shift, LEFT.1 .1));
        let data = road_frame(&[stroke], 255);
        let lines = detector.detect_lanes(&frame(&data));
        assert_eq!(lines.len(), 1, "{lines:?}");
        seen.push(lines[0]);
    }

    let blank = road_frame(&[], 255);
    let lines = detector.detect_lanes(&frame(&blank));
    let expected = LaneLine::mean(&seen).expect("three lines");
    assert_eq!(lines, vec![expected]);
    // a dropout does not feed the history
    assert_eq!(detector.history().side(CameraSide::Left).len(), 3);
}

#[test]
fn dual_camera_dropout_uses_side_history() {
    init_logging();
    let mut detector = LaneDetector::new(LaneDetectorParams::default())
        .with_mode(CameraMode::Dual(CameraSide::Right));
    let mut seen = Vec::new();
    for shift in [0.0f32, -8.0] {
        let stroke = ((RIGHT.0 .0 + shift, RIGHT.0 .1), (RIGHT.1 .0 + shift, RIGHT.1 .1));
        let lines = detector.detect_lanes(&frame(&road_frame(&[stroke], 255)));
        assert_eq!(lines.len(), 1, "{lines:?}");
        seen.push(lines[0]);
    }

    let lines = detector.detect_lanes(&frame(&road_frame(&[], 255)));
    assert_eq!(lines, vec![LaneLine::mean(&seen).expect("two lines")]);
    assert_eq!(detector.history().side(CameraSide::Right).len(), 2);
    assert!(detector.history().side(CameraSide::Left).is_empty());
}

#[test]
fn history_never_exceeds_capacity() {
    let data = road_frame(&[LEFT, RIGHT], 255);
    let mut detector = LaneDetector::new(LaneDetectorParams::default());
    for _ in 0..HISTORY_CAPACITY + 3 {
        detector.detect_lanes(&frame(&data));
    }
    assert_eq!(
        detector.history().side(CameraSide::Left).len(),
        HISTORY_CAPACITY
    );
    detector.reset();
    assert!(detector.history().side(CameraSide::Right).is_empty());
    assert!(detector.detect_lanes(&frame(&road_frame(&[], 255))).is_empty());
}

#[test]
fn empty_frames_never_error() {
    let blank = road_frame(&[], 255);
    for mode in [
        CameraMode::Single,
        CameraMode::Dual(CameraSide::Left),
        CameraMode::Dual(CameraSide::Right),
    ] {
        let mut detector = LaneDetector::new(LaneDetectorParams::default()).with_mode(mode);
        assert!(detector.detect_lanes(&frame(&blank)).is_empty());
    }
}

#[test]
fn trapezoid_is_symmetric_about_the_centerline() {
    for (w, h) in [(320usize, 240usize), (641, 479), (1280, 720), (7, 5)] {
        for (t, b) in [(0.4f32, 1.0f32), (0.6, 0.6), (0.25, 0.8)] {
            let params = LaneDetectorParams {
                top_width: t,
                bottom_width: b,
                trapezoid_height: 0.55,
                ..LaneDetectorParams::default()
            };
            let poly = RegionPolygon::trapezoid(FrameShape::new(w, h), &params);
            let c = poly.corners;
            let cx = w as f32 / 2.0;
            let tol = 1e-3 * w as f32;
            assert!(((c[0].x + c[1].x) / 2.0 - cx).abs() <= tol);
            assert!(((c[2].x + c[3].x) / 2.0 - cx).abs() <= tol);
            assert_eq!(c[0].y, c[1].y);
            assert_eq!(c[2].y, c[3].y);
        }
    }
}

//! Frame-by-frame lane keeping: detect, estimate an offset, steer.
//!
//! Camera, decision function and motor driver are external; they plug in
//! through [`FrameSource`], [`OffsetEstimator`] and
//! [`Actuator`](lanekeep_steer::Actuator). The motor is held by a
//! [`MotorGuard`] for the whole run, so it is stopped when the source is
//! exhausted, when it fails, and when the loop unwinds.

use lanekeep_core::{CameraMode, CameraSide, FrameShape, FrameView, LaneLine};
use lanekeep_steer::{Actuator, MotorGuard, SteeringCommand, SteeringParams};
use lanekeep_vision::{LaneDetector, LaneDetectorParams};
use log::{debug, info};
use serde::Serialize;

/// Supplies frames one at a time.
///
/// The returned view may borrow from the source and is only valid until the
/// next call. `Ok(None)` ends the run.
pub trait FrameSource {
    type Error;

    fn next_frame(&mut self) -> Result<Option<FrameView<'_>>, Self::Error>;
}

/// Turns the detected lines of a frame into a signed lateral offset in
/// pixels. Negative means the vehicle sits left of the lane centre.
pub trait OffsetEstimator {
    fn offset(&mut self, lines: &[LaneLine], shape: FrameShape) -> f32;
}

impl<F> OffsetEstimator for F
where
    F: FnMut(&[LaneLine], FrameShape) -> f32,
{
    fn offset(&mut self, lines: &[LaneLine], shape: FrameShape) -> f32 {
        self(lines, shape)
    }
}

/// What happened on one single-camera frame.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FrameOutcome {
    pub index: usize,
    pub shape: FrameShape,
    pub lines: Vec<LaneLine>,
    pub offset: f32,
    pub command: SteeringCommand,
}

/// What happened on one frame pair of a dual-camera rig.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DualFrameOutcome {
    pub index: usize,
    pub left: Vec<LaneLine>,
    pub right: Vec<LaneLine>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub frames: usize,
    /// Frames whose command energised the motor.
    pub steered: usize,
}

/// Single-camera lane keeper.
#[derive(Debug)]
pub struct LaneKeeper<E> {
    detector: LaneDetector,
    estimator: E,
    steering: SteeringParams,
}

impl<E: OffsetEstimator> LaneKeeper<E> {
    pub fn new(detector: LaneDetector, estimator: E, steering: SteeringParams) -> Self {
        Self {
            detector,
            estimator,
            steering,
        }
    }

    #[inline]
    pub fn detector(&self) -> &LaneDetector {
        &self.detector
    }

    #[inline]
    pub fn detector_mut(&mut self) -> &mut LaneDetector {
        &mut self.detector
    }

    #[inline]
    pub fn steering(&self) -> &SteeringParams {
        &self.steering
    }

    /// Detect, estimate and map one frame without touching any actuator.
    ///
    /// A detector configured for one side of a dual rig never steers.
    pub fn process(&mut self, index: usize, frame: &FrameView<'_>) -> FrameOutcome {
        let lines = self.detector.detect_lanes(frame);
        let shape = self.detector.shape().unwrap_or_else(|| frame.shape());
        let offset = self.estimator.offset(&lines, shape);
        let command = match self.detector.mode() {
            CameraMode::Single => self.steering.command_for(offset),
            CameraMode::Dual(_) => SteeringCommand::STOP,
        };
        debug!(
            "frame {index}: {} lines, offset {offset:.1} -> {:?} {}%",
            lines.len(),
            command.direction,
            command.duty_cycle
        );
        FrameOutcome {
            index,
            shape,
            lines,
            offset,
            command,
        }
    }

    /// Drive `actuator` from `source` until the source is exhausted.
    ///
    /// At most one command is issued per frame. `on_frame` sees every
    /// outcome after its command was applied. A source error ends the run
    /// with the motor stopped.
    pub fn run<S, A>(
        &mut self,
        source: &mut S,
        actuator: A,
        mut on_frame: impl FnMut(&FrameOutcome),
    ) -> Result<RunSummary, S::Error>
    where
        S: FrameSource,
        A: Actuator,
    {
        let mut motor = MotorGuard::new(actuator);
        let mut summary = RunSummary::default();
        while let Some(frame) = source.next_frame()? {
            let outcome = self.process(summary.frames, &frame);
            motor.apply(outcome.command);
            summary.frames += 1;
            if !outcome.command.is_stop() {
                summary.steered += 1;
            }
            on_frame(&outcome);
        }
        info!(
            "run finished after {} frames, {} steered",
            summary.frames, summary.steered
        );
        Ok(summary)
    }
}

/// Two detectors, one per lane boundary.
///
/// Each camera only evaluates its own side. Both share one parameter set.
/// Steering from a dual rig is not defined, so runs keep the motor stopped.
#[derive(Clone, Debug)]
pub struct DualLaneMonitor {
    left: LaneDetector,
    right: LaneDetector,
}

impl DualLaneMonitor {
    pub fn new(params: LaneDetectorParams) -> Self {
        Self {
            left: LaneDetector::new(params.clone()).with_mode(CameraMode::Dual(CameraSide::Left)),
            right: LaneDetector::new(params).with_mode(CameraMode::Dual(CameraSide::Right)),
        }
    }

    pub fn detector(&self, side: CameraSide) -> &LaneDetector {
        match side {
            CameraSide::Left => &self.left,
            CameraSide::Right => &self.right,
        }
    }

    pub fn process(
        &mut self,
        index: usize,
        left: &FrameView<'_>,
        right: &FrameView<'_>,
    ) -> DualFrameOutcome {
        DualFrameOutcome {
            index,
            left: self.left.detect_lanes(left),
            right: self.right.detect_lanes(right),
        }
    }

    /// Process frame pairs until either source is exhausted.
    pub fn run<L, R, A>(
        &mut self,
        left: &mut L,
        right: &mut R,
        actuator: A,
        mut on_frame: impl FnMut(&DualFrameOutcome),
    ) -> Result<RunSummary, L::Error>
    where
        L: FrameSource,
        R: FrameSource<Error = L::Error>,
        A: Actuator,
    {
        let _motor = MotorGuard::new(actuator);
        let mut summary = RunSummary::default();
        loop {
            let Some(left_frame) = left.next_frame()? else {
                break;
            };
            let Some(right_frame) = right.next_frame()? else {
                break;
            };
            let outcome = self.process(summary.frames, &left_frame, &right_frame);
            summary.frames += 1;
            on_frame(&outcome);
        }
        info!("dual-camera run finished after {} frame pairs", summary.frames);
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lanekeep_core::PixelLayout;
    use lanekeep_steer::{ActuatorEvent, RecordingActuator, SteerDirection};

    struct BlankFrames {
        buf: Vec<u8>,
        left: usize,
        fail_at: Option<usize>,
    }

    impl BlankFrames {
        fn new(count: usize) -> Self {
            Self {
                buf: vec![0; 64 * 48 * 3],
                left: count,
                fail_at: None,
            }
        }
    }

    impl FrameSource for BlankFrames {
        type Error = &'static str;

        fn next_frame(&mut self) -> Result<Option<FrameView<'_>>, &'static str> {
            if self.fail_at == Some(self.left) {
                return Err("camera unplugged");
            }
            if self.left == 0 {
                return Ok(None);
            }
            self.left -= 1;
            FrameView::new(64, 48, PixelLayout::Bgr, &self.buf)
                .map(Some)
                .map_err(|_| "bad frame")
        }
    }

    fn keeper(offset: f32) -> LaneKeeper<impl OffsetEstimator> {
        LaneKeeper::new(
            LaneDetector::new(LaneDetectorParams::default()),
            move |_: &[LaneLine], _: FrameShape| offset,
            SteeringParams::default(),
        )
    }

    #[test]
    fn detector_can_move_to_a_camera_thread() {
        fn assert_send<T: Send>() {}
        assert_send::<LaneDetector>();
        assert_send::<DualLaneMonitor>();
    }

    #[test]
    fn run_issues_one_command_per_frame_and_stops() {
        let mut act = RecordingActuator::new();
        let mut seen = Vec::new();
        let summary = keeper(120.0)
            .run(&mut BlankFrames::new(3), &mut act, |o| seen.push(o.command))
            .unwrap();
        assert_eq!(
            summary,
            RunSummary {
                frames: 3,
                steered: 3
            }
        );
        let drive = ActuatorEvent::Drive {
            direction: SteerDirection::Left,
            duty_cycle: 60,
        };
        assert_eq!(
            act.events,
            vec![
                ActuatorEvent::Stop,
                drive,
                drive,
                drive,
                ActuatorEvent::Stop
            ]
        );
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn offsets_inside_deadband_keep_the_motor_stopped() {
        let mut act = RecordingActuator::new();
        let summary = keeper(-30.0)
            .run(&mut BlankFrames::new(2), &mut act, |_| {})
            .unwrap();
        assert_eq!(summary.steered, 0);
        assert!(act.events.iter().all(|e| *e == ActuatorEvent::Stop));
    }

    #[test]
    fn source_failure_leaves_the_motor_stopped() {
        let mut act = RecordingActuator::new();
        let mut source = BlankFrames::new(4);
        source.fail_at = Some(2);
        let err = keeper(-150.0).run(&mut source, &mut act, |_| {}).unwrap_err();
        assert_eq!(err, "camera unplugged");
        assert_eq!(act.events.len(), 4);
        assert_eq!(act.events.last(), Some(&ActuatorEvent::Stop));
    }

    #[test]
    fn estimator_sees_locked_shape() {
        let mut shapes = Vec::new();
        let mut keeper = LaneKeeper::new(
            LaneDetector::new(LaneDetectorParams::default()),
            |lines: &[LaneLine], shape: FrameShape| {
                shapes.push((lines.len(), shape));
                0.0
            },
            SteeringParams::default(),
        );
        let data = vec![0u8; 64 * 48 * 3];
        let frame = FrameView::new(64, 48, PixelLayout::Bgr, &data).unwrap();
        let outcome = keeper.process(0, &frame);
        assert!(outcome.command.is_stop());
        drop(keeper);
        assert_eq!(shapes, vec![(0, FrameShape::new(64, 48))]);
    }

    #[test]
    fn dual_side_detector_never_steers() {
        let mut keeper = LaneKeeper::new(
            LaneDetector::new(LaneDetectorParams::default())
                .with_mode(CameraMode::Dual(CameraSide::Left)),
            |_: &[LaneLine], _: FrameShape| 180.0,
            SteeringParams::default(),
        );
        let data = vec![0u8; 64 * 48 * 3];
        let frame = FrameView::new(64, 48, PixelLayout::Bgr, &data).unwrap();
        assert_eq!(keeper.process(0, &frame).command, SteeringCommand::STOP);
    }

    #[test]
    fn dual_monitor_processes_pairs_without_steering() {
        let mut monitor = DualLaneMonitor::new(LaneDetectorParams::default());
        let mut act = RecordingActuator::new();
        let mut outcomes = Vec::new();
        let summary = monitor
            .run(
                &mut BlankFrames::new(3),
                &mut BlankFrames::new(2),
                &mut act,
                |o| outcomes.push(o.clone()),
            )
            .unwrap();
        assert_eq!(summary.frames, 2);
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(|o| o.left.is_empty() && o.right.is_empty()));
        assert_eq!(act.events, vec![ActuatorEvent::Stop, ActuatorEvent::Stop]);
        assert_eq!(
            monitor.detector(CameraSide::Right).mode(),
            CameraMode::Dual(CameraSide::Right)
        );
    }
}

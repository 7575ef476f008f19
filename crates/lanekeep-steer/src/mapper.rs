use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Rotational sense of the steering motor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SteerDirection {
    Left,
    Right,
    Stop,
}

impl SteerDirection {
    pub fn opposite(self) -> Self {
        match self {
            SteerDirection::Left => SteerDirection::Right,
            SteerDirection::Right => SteerDirection::Left,
            SteerDirection::Stop => SteerDirection::Stop,
        }
    }
}

/// One actuation: direction plus PWM duty cycle in percent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SteeringCommand {
    pub direction: SteerDirection,
    pub duty_cycle: u8,
}

impl SteeringCommand {
    pub const STOP: SteeringCommand = SteeringCommand {
        direction: SteerDirection::Stop,
        duty_cycle: 0,
    };

    #[inline]
    pub fn is_stop(&self) -> bool {
        self.direction == SteerDirection::Stop
    }
}

/// Errors raised by [`SteeringParams::validate`].
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SteeringParamsError {
    #[error("max_offset must be finite and positive (got {0})")]
    InvalidMaxOffset(f32),
    #[error("deadband must be finite and >= 0 (got {0})")]
    InvalidDeadband(f32),
    #[error("duty cycles must satisfy duty_floor <= duty_ceiling <= 100 (got {floor} / {ceiling})")]
    InvalidDutyRange { floor: u8, ceiling: u8 },
}

/// Gains and limits of the proportional steering law.
///
/// [`command_for`](Self::command_for) accepts any values, but only
/// parameters passing [`validate`](Self::validate) keep every non-stop duty
/// cycle inside `[duty_floor, duty_ceiling]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SteeringParams {
    /// Offsets are clamped to `[-max_offset, max_offset]` before mapping.
    pub max_offset: f32,
    /// Offsets with `|offset| <= deadband` stop the motor.
    pub deadband: f32,
    /// Duty cycle at zero offset; rises linearly toward 100 at `max_offset`.
    pub duty_floor: u8,
    /// Hard cap on the duty cycle. Must not be below `duty_floor`.
    ///
    /// Defaults to 60, well below the 100 the linear ramp would reach. The
    /// deployed controller has always run with this cap.
    pub duty_ceiling: u8,
}

impl Default for SteeringParams {
    fn default() -> Self {
        Self {
            max_offset: 200.0,
            deadband: 50.0,
            duty_floor: 50,
            duty_ceiling: 60,
        }
    }
}

impl SteeringParams {
    /// Default law with a different normalisation range.
    pub fn with_max_offset(max_offset: f32) -> Self {
        Self {
            max_offset,
            ..Self::default()
        }
    }

    /// Check the invariants [`command_for`](Self::command_for) relies on.
    pub fn validate(&self) -> Result<(), SteeringParamsError> {
        if !(self.max_offset.is_finite() && self.max_offset > 0.0) {
            return Err(SteeringParamsError::InvalidMaxOffset(self.max_offset));
        }
        if !(self.deadband.is_finite() && self.deadband >= 0.0) {
            return Err(SteeringParamsError::InvalidDeadband(self.deadband));
        }
        if self.duty_floor > self.duty_ceiling || self.duty_ceiling > 100 {
            return Err(SteeringParamsError::InvalidDutyRange {
                floor: self.duty_floor,
                ceiling: self.duty_ceiling,
            });
        }
        Ok(())
    }

    /// Map a signed lateral offset onto a motor command.
    ///
    /// A negative offset (vehicle left of the lane centre) turns right and a
    /// positive one turns left. Never fails: out-of-range offsets are
    /// clamped, and a non-positive `max_offset` or a NaN offset yields a stop.
    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip(self), ret))]
    pub fn command_for(&self, offset: f32) -> SteeringCommand {
        let max = self.max_offset;
        if !(max > 0.0) || offset.is_nan() {
            return SteeringCommand::STOP;
        }
        let offset = offset.max(-max).min(max);

        let floor = self.duty_floor.min(100) as f32;
        let ramp = ((100.0 - floor) * offset.abs() / max).floor();
        let duty_cycle = (floor + ramp).min(self.duty_ceiling.min(100) as f32) as u8;

        if offset < -self.deadband {
            SteeringCommand {
                direction: SteerDirection::Right,
                duty_cycle,
            }
        } else if offset > self.deadband {
            SteeringCommand {
                direction: SteerDirection::Left,
                duty_cycle,
            }
        } else {
            SteeringCommand::STOP
        }
    }
}

/// Default steering law with offsets normalised by `max_offset`.
pub fn map_offset_to_command(offset: f32, max_offset: f32) -> SteeringCommand {
    SteeringParams::with_max_offset(max_offset).command_for(offset)
}

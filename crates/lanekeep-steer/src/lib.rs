//! Proportional steering for a lane-keeping vehicle.
//!
//! A signed lateral offset in pixels becomes a [`SteeringCommand`]: a
//! direction and a PWM duty cycle. Hardware sits behind the [`Actuator`]
//! trait; wrap it in a [`MotorGuard`] so it is stopped on every exit path.
//!
//! ```
//! use lanekeep_steer::{map_offset_to_command, SteerDirection, SteeringParams};
//!
//! let cmd = map_offset_to_command(-150.0, 200.0);
//! assert_eq!(cmd, SteeringParams::default().command_for(-150.0));
//! assert_eq!(cmd.direction, SteerDirection::Right);
//! assert_eq!(cmd.duty_cycle, 60);
//! ```

mod actuator;
mod mapper;

pub use actuator::{Actuator, ActuatorEvent, MotorGuard, RecordingActuator};
pub use mapper::{
    map_offset_to_command, SteerDirection, SteeringCommand, SteeringParams, SteeringParamsError,
};

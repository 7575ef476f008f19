//! Motor actuation seam.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::mapper::{SteerDirection, SteeringCommand};

/// Anything that can turn the steering motor.
///
/// Hardware drivers implement this. Failures on the wire are the driver's
/// concern, so both methods are infallible.
pub trait Actuator {
    /// Energise the motor in `direction` at `duty_cycle` percent.
    ///
    /// Never called with [`SteerDirection::Stop`].
    fn drive(&mut self, direction: SteerDirection, duty_cycle: u8);

    /// De-energise the motor.
    fn stop(&mut self);

    /// Apply one mapped command.
    fn apply(&mut self, command: SteeringCommand) {
        match command.direction {
            SteerDirection::Stop => self.stop(),
            direction => self.drive(direction, command.duty_cycle),
        }
    }
}

impl<A: Actuator + ?Sized> Actuator for &mut A {
    fn drive(&mut self, direction: SteerDirection, duty_cycle: u8) {
        (**self).drive(direction, duty_cycle)
    }

    fn stop(&mut self) {
        (**self).stop()
    }
}

impl<A: Actuator + ?Sized> Actuator for Box<A> {
    fn drive(&mut self, direction: SteerDirection, duty_cycle: u8) {
        (**self).drive(direction, duty_cycle)
    }

    fn stop(&mut self) {
        (**self).stop()
    }
}

/// Stops the wrapped actuator on construction and again when dropped, so
/// the motor never stays energised past the owning scope (including unwinds).
pub struct MotorGuard<A: Actuator> {
    actuator: A,
}

impl<A: Actuator> MotorGuard<A> {
    pub fn new(mut actuator: A) -> Self {
        actuator.stop();
        Self { actuator }
    }

    #[inline]
    pub fn apply(&mut self, command: SteeringCommand) {
        self.actuator.apply(command);
    }

    #[inline]
    pub fn get_ref(&self) -> &A {
        &self.actuator
    }
}

impl<A: Actuator> Drop for MotorGuard<A> {
    fn drop(&mut self) {
        debug!("motor guard released, stopping actuator");
        self.actuator.stop();
    }
}

/// One call observed by a [`RecordingActuator`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum ActuatorEvent {
    Drive {
        direction: SteerDirection,
        duty_cycle: u8,
    },
    Stop,
}

/// In-memory actuator for dry runs and tests.
#[derive(Clone, Debug, Default)]
pub struct RecordingActuator {
    pub events: Vec<ActuatorEvent>,
}

impl RecordingActuator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last command applied, reading a trailing stop as [`SteeringCommand::STOP`].
    pub fn last_command(&self) -> Option<SteeringCommand> {
        self.events.last().map(|event| match *event {
            ActuatorEvent::Drive {
                direction,
                duty_cycle,
            } => SteeringCommand {
                direction,
                duty_cycle,
            },
            ActuatorEvent::Stop => SteeringCommand::STOP,
        })
    }
}

impl Actuator for RecordingActuator {
    fn drive(&mut self, direction: SteerDirection, duty_cycle: u8) {
        self.events.push(ActuatorEvent::Drive {
            direction,
            duty_cycle,
        });
    }

    fn stop(&mut self) {
        self.events.push(ActuatorEvent::Stop);
    }
}

///
/// The direction a motor is driven in, as set on the driver's direction pin.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Reverse,
    Coast,
}

///
/// A duty cycle command split into what a PWM motor driver actually needs:
/// a direction and an unsigned pulse width percentage.
///
/// # Fields:
/// - `direction`: The drive direction
/// - `percent`: The pulse width, always within [0, 100]
///
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotorCommand {
    pub direction: Direction,
    pub percent: f64,
}

impl MotorCommand {
    /// Full-scale duty, in percent.
    pub const MAX_DUTY: f64 = 100.;

    ///
    /// Converts a signed, unbounded duty cycle into a driver command, saturating at full scale.
    /// Controllers produce unbounded output, so this is where actuator limits are enforced.
    ///
    /// # Parameters:
    /// - `duty`: The signed duty cycle in percent, positive drives forward
    ///
    /// # Returns:
    /// - The clamped command. Zero or NaN duty coasts the motor
    ///
    pub fn from_duty(duty: f64) -> MotorCommand {
        if duty > 0. {
            MotorCommand { direction: Direction::Forward, percent: duty.min(Self::MAX_DUTY) }
        } else if duty < 0. {
            MotorCommand { direction: Direction::Reverse, percent: (-duty).min(Self::MAX_DUTY) }
        } else {
            MotorCommand::coast()
        }
    }

    pub fn coast() -> MotorCommand {
        MotorCommand { direction: Direction::Coast, percent: 0. }
    }

    ///
    /// # Returns:
    /// - The command as a signed duty within [-100, 100]
    ///
    pub fn signed_duty(&self) -> f64 {
        match self.direction {
            Direction::Forward => self.percent,
            Direction::Reverse => -self.percent,
            Direction::Coast => 0.,
        }
    }
}

//!
//! Simulated hardware, and a complete simulated robot wired the way the real one is
//!

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use crate::channel::{Flag, Queue, Share};
use crate::config::RobotConfig;
use crate::control::clock::{Clock, ManualClock};
use crate::control::AngleController;
use crate::hardware::encoder::{EncoderSettings, EncoderTracker};
use crate::hardware::error::GeometryError;
use crate::hardware::motor::MotorCommand;
use crate::hardware::{ActuatorPort, PenPort, PenState, SensorPort, TouchPort, TouchSample, LEG_COUNT};
use crate::input::{PanelMapping, TouchCalibration};
use crate::kinematics::Platform;
use crate::task::{BrainLoop, JointLoop, Scheduler, TouchLoop};

#[derive(Debug, Default)]
struct Plant {
    ticks: f64,
    zero: i64,
    duty: f64,
}

///
/// A geared DC motor with an encoder. The joint turns at a speed proportional to the
/// commanded duty, with no inertia, and the encoder counter wraps like the hardware.
///
/// # Fields:
/// - `plant`: The joint state, shared with the sensor and motor handles
/// - `settings`: The encoder the joint is fitted with
/// - `full_speed`: The joint speed at 100% duty, in degrees per second
///
#[derive(Debug, Clone)]
pub struct SimJoint {
    plant: Rc<RefCell<Plant>>,
    settings: EncoderSettings,
    full_speed: f64,
}

impl SimJoint {
    pub fn new(settings: EncoderSettings, full_speed: f64) -> SimJoint {
        SimJoint { plant: Rc::new(RefCell::new(Plant::default())), settings, full_speed }
    }

    /// Encoder ticks per degree of joint travel.
    fn ticks_per_degree(&self) -> f64 {
        self.settings.gear_ratio * self.settings.counts_per_rev / 180.
    }

    pub fn sensor(&self) -> SimSensor {
        SimSensor { plant: Rc::clone(&self.plant), modulus: i64::from(self.settings.modulus.max(1)) }
    }

    pub fn motor(&self) -> SimMotor {
        SimMotor { plant: Rc::clone(&self.plant) }
    }

    /// Lets the joint turn under the last commanded duty for `dt`.
    pub fn advance(&self, dt: Duration) {
        let mut plant = self.plant.borrow_mut();
        let speed = plant.duty / MotorCommand::MAX_DUTY * self.full_speed * self.ticks_per_degree();
        plant.ticks += speed * dt.as_secs_f64();
    }

    /// The true joint angle, in degrees from where it started.
    pub fn angle(&self) -> f64 {
        self.plant.borrow().ticks / self.ticks_per_degree()
    }

    /// Moves the joint by hand, in degrees.
    pub fn turn_by(&self, degrees: f64) {
        let ticks_per_degree = self.ticks_per_degree();
        self.plant.borrow_mut().ticks += degrees * ticks_per_degree;
    }

    /// The last duty the driver applied, already clamped.
    pub fn duty(&self) -> f64 {
        self.plant.borrow().duty
    }
}

/// The counter side of a `SimJoint`.
#[derive(Debug)]
pub struct SimSensor {
    plant: Rc<RefCell<Plant>>,
    modulus: i64,
}

impl SensorPort for SimSensor {
    fn counter(&mut self) -> u32 {
        let plant = self.plant.borrow();
        let count = (plant.ticks.round() as i64 - plant.zero).rem_euclid(self.modulus);
        count as u32
    }

    fn reset(&mut self) {
        let mut plant = self.plant.borrow_mut();
        plant.zero = plant.ticks.round() as i64;
    }
}

/// The driver side of a `SimJoint`. Duty is clamped the way the motor driver clamps it.
#[derive(Debug)]
pub struct SimMotor {
    plant: Rc<RefCell<Plant>>,
}

impl ActuatorPort for SimMotor {
    fn set_duty(&mut self, duty: f64) {
        self.plant.borrow_mut().duty = MotorCommand::from_duty(duty).signed_duty();
    }
}

///
/// A pen solenoid which remembers what it was told.
///
#[derive(Debug, Clone, Default)]
pub struct SimPen {
    state: Rc<Cell<Option<PenState>>>,
    commands: Rc<Cell<u64>>,
    downs: Rc<Cell<u64>>,
}

impl SimPen {
    pub fn new() -> SimPen {
        SimPen::default()
    }

    /// The last command, `None` before the first.
    pub fn state(&self) -> Option<PenState> {
        self.state.get()
    }

    pub fn commands(&self) -> u64 {
        self.commands.get()
    }

    /// How many ticks the pen was commanded down.
    pub fn downs(&self) -> u64 {
        self.downs.get()
    }
}

impl PenPort for SimPen {
    fn set_pen(&mut self, state: PenState) {
        self.state.set(Some(state));
        self.commands.set(self.commands.get() + 1);
        if state == PenState::Down {
            self.downs.set(self.downs.get() + 1);
        }
    }
}

///
/// A touch panel playing back a script of samples, one per scan. Once the script runs
/// out the panel reads no contact.
///
#[derive(Debug, Clone, Default)]
pub struct SimTouch {
    samples: Rc<RefCell<VecDeque<TouchSample>>>,
}

impl SimTouch {
    pub fn new() -> SimTouch {
        SimTouch::default()
    }

    pub fn push(&self, sample: TouchSample) {
        self.samples.borrow_mut().push_back(sample);
    }

    ///
    /// Queues a touch at a robot frame position, working back through the panel
    /// mapping and calibration to the raw reading which produces it.
    ///
    /// # Returns:
    /// - false if the calibration cannot be inverted, nothing is queued
    ///
    pub fn press_at(&self, x: f64, y: f64, mapping: &PanelMapping, calibration: &TouchCalibration) -> bool {
        let (panel_x, panel_y) = mapping.invert(x, y);

        match calibration.invert(panel_x, panel_y) {
            Some((adc_x, adc_y)) => {
                self.push(TouchSample { adc_x, adc_y, contact: true });
                true
            }
            None => false,
        }
    }

    pub fn remaining(&self) -> usize {
        self.samples.borrow().len()
    }
}

impl TouchPort for SimTouch {
    fn scan(&mut self) -> TouchSample {
        self.samples.borrow_mut().pop_front().unwrap_or(TouchSample { adc_x: 0., adc_y: 0., contact: false })
    }
}

///
/// Computes a list of points on a circle, starting on the positive x side and
/// running counter-clockwise.
///
/// # Parameters:
/// - `num_samples`: The number of samples to make on the circle
/// - `center`: The center coordinates of the circle
/// - `radius`: The radius of the circle
///
pub fn circle_samples(num_samples: usize, center: (f64, f64), radius: f64) -> Vec<(f64, f64)> {
    let (cx, cy) = center;

    (0..num_samples)
        .map(|i| {
            let angle = std::f64::consts::TAU * (i as f64) / (num_samples as f64);
            (cx + radius * angle.cos(), cy + radius * angle.sin())
        })
        .collect()
}

///
/// The whole robot in simulation: touch panel, brain and three joints on the scheduler,
/// all reading the same clock. With a `ManualClock`, `tick` moves time forward; with any
/// other clock the caller steps the joints by however much time really passed.
///
/// # Fields:
/// - `scheduler`: Owns the tasks
/// - `clock`: The time every task sees
/// - `joints`: The simulated joints, in leg order
/// - `pen`: The simulated pen
/// - `touch`: The simulated touch panel, push samples here
/// - `ready`: The global ready flag
/// - `requests`: The position requests waiting for the brain
/// - `setpoints`: The joint setpoints published by the brain
/// - `positions`: The joint angles measured by each joint task
///
pub struct SimRobot<C: Clock + Clone + 'static = ManualClock> {
    scheduler: Scheduler,
    clock: C,
    pub joints: [SimJoint; LEG_COUNT],
    pub pen: SimPen,
    pub touch: SimTouch,
    pub ready: Flag,
    pub requests: Queue<(f64, f64)>,
    pub setpoints: [Share<f64>; LEG_COUNT],
    pub positions: [Share<f64>; LEG_COUNT],
}

impl SimRobot<ManualClock> {
    /// Wires up a simulated robot on a manual clock starting at zero.
    pub fn new(config: &RobotConfig, calibration: TouchCalibration, full_speed: f64) -> Result<SimRobot, GeometryError> {
        SimRobot::with_clock(config, calibration, full_speed, ManualClock::new())
    }

    ///
    /// Moves the clock on by `dt`, then steps the robot.
    ///
    /// # Returns:
    /// - The number of tasks stepped
    ///
    pub fn tick(&mut self, dt: Duration) -> usize {
        self.clock.advance(dt);
        self.step(dt)
    }
}

impl<C: Clock + Clone + 'static> SimRobot<C> {
    ///
    /// Wires up a simulated robot from a configuration.
    ///
    /// # Parameters:
    /// - `config`: The robot configuration
    /// - `calibration`: The touch calibration the touch task applies
    /// - `full_speed`: Each joint's speed at full duty, in degrees per second
    /// - `clock`: The time source of the scheduler and every joint controller
    ///
    /// # Returns:
    /// - The robot, every task still in its init state
    /// - A `GeometryError` if the configured legs are invalid
    ///
    pub fn with_clock(
        config: &RobotConfig,
        calibration: TouchCalibration,
        full_speed: f64,
        clock: C,
    ) -> Result<SimRobot<C>, GeometryError> {
        let geometry = config.geometry()?;
        let ready = Flag::new(true);
        let requests = Queue::new(config.request_capacity, false);
        let setpoints: [Share<f64>; LEG_COUNT] = Default::default();
        let positions: [Share<f64>; LEG_COUNT] = Default::default();
        let joints: [SimJoint; LEG_COUNT] = std::array::from_fn(|_| SimJoint::new(config.encoder, full_speed));
        let pen = SimPen::new();
        let touch = SimTouch::new();
        let schedule = config.schedule;

        let mut scheduler = Scheduler::new();

        scheduler.add(
            Box::new(TouchLoop::new(touch.clone(), calibration, config.panel.mapping, requests.clone(), ready.clone())),
            schedule.touch_period(),
            schedule.touch_priority,
        );

        scheduler.add(
            Box::new(BrainLoop::new(
                Platform::new(geometry),
                config.platform_theta,
                requests.clone(),
                setpoints.clone(),
                pen.clone(),
                ready.clone(),
            )),
            schedule.brain_period(),
            schedule.brain_priority,
        );

        for (index, joint) in joints.iter().enumerate() {
            let task = JointLoop::new(
                format!("joint {}", index + 1),
                EncoderTracker::new(joint.sensor(), config.encoder),
                AngleController::new(config.controllers[index], config.initial_setpoint, clock.clone()),
                joint.motor(),
                setpoints[index].clone(),
                positions[index].clone(),
                ready.clone(),
            );
            scheduler.add(Box::new(task), schedule.joint_period(), schedule.joint_priority);
        }

        Ok(SimRobot { scheduler, clock, joints, pen, touch, ready, requests, setpoints, positions })
    }

    ///
    /// Lets the joints move for `dt`, then runs every task which has fallen due by
    /// the clock. The clock itself is not touched.
    ///
    /// # Returns:
    /// - The number of tasks stepped
    ///
    pub fn step(&mut self, dt: Duration) -> usize {
        for joint in &self.joints {
            joint.advance(dt);
        }
        self.scheduler.run_due(self.clock.now())
    }

    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    pub fn run_counts(&self) -> Vec<(String, u64)> {
        self.scheduler.run_counts()
    }

    ///
    /// # Returns:
    /// - How far each joint's true angle is from its setpoint, the short way round,
    /// `None` for a joint with no setpoint yet
    ///
    pub fn tracking_errors(&self) -> [Option<f64>; LEG_COUNT] {
        std::array::from_fn(|leg| {
            self.setpoints[leg]
                .get()
                .map(|setpoint| crate::hardware::math::circular_distance(setpoint, self.joints[leg].angle()))
        })
    }
}

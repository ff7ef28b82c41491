use crate::channel::{Flag, Queue, Share};
use crate::hardware::{PenPort, PenState, LEG_COUNT};
use crate::kinematics::Platform;

use super::{Task, TaskState};

///
/// Turns requested platform positions into joint setpoints, and lifts the pen
/// whenever there is nothing to draw.
///
/// # Fields:
/// - `platform`: The kinematic state of the robot
/// - `theta`: The platform orientation held for every request, in degrees
/// - `requests`: The (x, y) position requests, in inches
/// - `setpoints`: One joint angle setpoint per leg
/// - `pen`: The pen solenoid
/// - `ready`: The global ready flag
/// - `state`: The current lifecycle state
///
pub struct BrainLoop<P: PenPort> {
    platform: Platform,
    theta: f64,
    requests: Queue<(f64, f64)>,
    setpoints: [Share<f64>; LEG_COUNT],
    pen: P,
    ready: Flag,
    state: TaskState,
}

impl<P: PenPort> BrainLoop<P> {
    pub fn new(
        platform: Platform,
        theta: f64,
        requests: Queue<(f64, f64)>,
        setpoints: [Share<f64>; LEG_COUNT],
        pen: P,
        ready: Flag,
    ) -> BrainLoop<P> {
        BrainLoop { platform, theta, requests, setpoints, pen, ready, state: TaskState::Init }
    }

    fn init(&mut self) {
        self.requests.clear();
        for setpoint in &self.setpoints {
            setpoint.clear();
        }

        self.pen.set_pen(PenState::Up);
        self.state = TaskState::Draw;
        tracing::info!("Brain initialised, drawing");
    }

    ///
    /// Consumes at most one request. An unreachable request is dropped and the
    /// joints keep their previous setpoints.
    ///
    fn draw(&mut self) {
        let Some((x, y)) = self.requests.get() else {
            self.pen.set_pen(PenState::Up);
            return;
        };

        match self.platform.update_joints(x, y, self.theta) {
            Ok(angles) => {
                for (setpoint, angle) in self.setpoints.iter().zip(angles) {
                    setpoint.put(angle);
                }
                self.pen.set_pen(PenState::Down);
            }
            Err(err) => {
                tracing::debug!("Holding joints, request dropped: {}", err);
                self.pen.set_pen(PenState::Up);
            }
        }
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    pub fn platform(&self) -> &Platform {
        &self.platform
    }
}

impl<P: PenPort> Task for BrainLoop<P> {
    fn name(&self) -> &str {
        "brain"
    }

    fn step(&mut self) -> TaskState {
        let ready = self.ready.get();

        match self.state {
            TaskState::Init => self.init(),
            TaskState::Draw | TaskState::Stopped if !ready => {
                if self.state == TaskState::Draw {
                    tracing::info!("Ready flag dropped, pen lifted");
                }
                self.pen.set_pen(PenState::Up);
                self.state = TaskState::Stopped;
            }
            TaskState::Draw => self.draw(),
            TaskState::Stopped => {
                tracing::info!("Ready flag raised, brain resumed");
                self.state = TaskState::Draw;
                self.draw();
            }
        }

        self.state
    }
}

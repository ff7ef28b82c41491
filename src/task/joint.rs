use crate::channel::{Flag, Share};
use crate::control::clock::Clock;
use crate::control::AngleController;
use crate::hardware::encoder::EncoderTracker;
use crate::hardware::{ActuatorPort, SensorPort};

use super::{Task, TaskState};

///
/// Closes the loop on one joint: setpoint in, encoder measured, duty out.
///
/// # Fields:
/// - `name`: The task name, used in logs
/// - `encoder`: The joint's encoder tracker, owning its counter
/// - `controller`: The joint's angle controller
/// - `actuator`: The joint's motor driver
/// - `setpoint`: The joint angle target, written by the brain
/// - `position`: The measured joint angle, written by this task every tick
/// - `ready`: The global ready flag
/// - `state`: The current lifecycle state
///
pub struct JointLoop<S: SensorPort, A: ActuatorPort, C: Clock> {
    name: String,
    encoder: EncoderTracker<S>,
    controller: AngleController<C>,
    actuator: A,
    setpoint: Share<f64>,
    position: Share<f64>,
    ready: Flag,
    state: TaskState,
}

impl<S: SensorPort, A: ActuatorPort, C: Clock> JointLoop<S, A, C> {
    pub fn new(
        name: impl Into<String>,
        encoder: EncoderTracker<S>,
        controller: AngleController<C>,
        actuator: A,
        setpoint: Share<f64>,
        position: Share<f64>,
        ready: Flag,
    ) -> JointLoop<S, A, C> {
        JointLoop {
            name: name.into(),
            encoder,
            controller,
            actuator,
            setpoint,
            position,
            ready,
            state: TaskState::Init,
        }
    }

    fn init(&mut self) {
        self.encoder.zero();
        self.controller.reset();
        self.position.clear();
        self.state = TaskState::Draw;
        tracing::info!(task = %self.name, "Joint initialised, drawing");
    }

    fn draw(&mut self) {
        // an empty channel holds the last setpoint
        if let Some(setpoint) = self.setpoint.get() {
            if setpoint != self.controller.setpoint() {
                self.controller.change_setpoint(setpoint);
            }
        }

        self.encoder.update();
        let angle = self.encoder.read();
        let duty = self.controller.update(angle);

        self.actuator.set_duty(duty);
        self.position.put(angle);

        tracing::trace!(task = %self.name, angle, duty, "Joint tick");
    }

    fn stop(&mut self) {
        self.actuator.set_duty(0.);
        self.state = TaskState::Stopped;
        tracing::info!(task = %self.name, "Ready flag dropped, joint stopped");
    }

    fn resume(&mut self) {
        // keep the integral but do not integrate across the stopped time
        let setpoint = self.controller.setpoint();
        self.controller.change_setpoint(setpoint);
        self.state = TaskState::Draw;
        tracing::info!(task = %self.name, "Ready flag raised, joint resumed");
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    pub fn controller(&self) -> &AngleController<C> {
        &self.controller
    }

    pub fn encoder(&self) -> &EncoderTracker<S> {
        &self.encoder
    }
}

impl<S: SensorPort, A: ActuatorPort, C: Clock> Task for JointLoop<S, A, C> {
    fn name(&self) -> &str {
        &self.name
    }

    fn step(&mut self) -> TaskState {
        match self.state {
            TaskState::Init => self.init(),
            TaskState::Draw if !self.ready.get() => self.stop(),
            TaskState::Draw => self.draw(),
            TaskState::Stopped if self.ready.get() => {
                self.resume();
                self.draw();
            }
            TaskState::Stopped => {}
        }

        self.state
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use crate::control::clock::ManualClock;
    use crate::control::ControllerParams;
    use crate::hardware::encoder::EncoderSettings;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;
    use std::time::Duration;

    #[derive(Clone, Default)]
    struct FakeCounter {
        value: Rc<Cell<u32>>,
    }

    impl SensorPort for FakeCounter {
        fn counter(&mut self) -> u32 {
            self.value.get()
        }

        fn reset(&mut self) {
            self.value.set(0);
        }
    }

    #[derive(Clone, Default)]
    struct RecordingMotor {
        duties: Rc<RefCell<Vec<f64>>>,
    }

    impl ActuatorPort for RecordingMotor {
        fn set_duty(&mut self, duty: f64) {
            self.duties.borrow_mut().push(duty);
        }
    }

    struct Rig {
        joint: JointLoop<FakeCounter, RecordingMotor, ManualClock>,
        counter: FakeCounter,
        motor: RecordingMotor,
        setpoint: Share<f64>,
        position: Share<f64>,
        ready: Flag,
        clock: ManualClock,
    }

    fn rig(kp: f64, ki: f64) -> Rig {
        let counter = FakeCounter::default();
        let motor = RecordingMotor::default();
        let clock = ManualClock::new();
        let setpoint = Share::new();
        let position = Share::new();
        let ready = Flag::new(true);

        let joint = JointLoop::new(
            "joint 1",
            EncoderTracker::new(counter.clone(), EncoderSettings::default()),
            AngleController::new(ControllerParams { kp, ki }, 0., clock.clone()),
            motor.clone(),
            setpoint.clone(),
            position.clone(),
            ready.clone(),
        );

        Rig { joint, counter, motor, setpoint, position, ready, clock }
    }

    #[test]
    fn init_zeroes_then_draws() {
        let mut rig = rig(1., 0.);
        rig.counter.value.set(1234);

        assert_eq!(rig.joint.step(), TaskState::Draw);
        assert_eq!(rig.counter.value.get(), 0);
        assert!(rig.motor.duties.borrow().is_empty());
        assert_eq!(rig.joint.encoder().position(), 0);
    }

    #[test]
    fn drives_towards_setpoint() {
        let mut rig = rig(2., 0.);
        rig.joint.step();

        rig.setpoint.put(10.);
        rig.joint.step();
        assert_eq!(rig.motor.duties.borrow().last().copied(), Some(20.));
        assert_eq!(rig.position.get(), Some(0.));
        assert_eq!(rig.joint.controller().setpoint(), 10.);
    }

    #[test]
    fn empty_setpoint_holds_last() {
        let mut rig = rig(1., 0.);
        rig.joint.step();
        rig.setpoint.put(5.);
        rig.joint.step();

        rig.setpoint.clear();
        rig.joint.step();
        assert_eq!(rig.joint.controller().setpoint(), 5.);
        assert_eq!(rig.motor.duties.borrow().last().copied(), Some(5.));
    }

    #[test]
    fn unchanged_setpoint_keeps_timing() {
        let mut rig = rig(0., 1.);
        rig.joint.step();
        rig.setpoint.put(10.);

        rig.joint.step();
        rig.clock.advance(Duration::from_secs(1));
        rig.joint.step();
        // the same setpoint read again must not restart the integration interval
        assert_abs_diff_eq!(rig.joint.controller().integral(), 10., epsilon = 1e-12);
        rig.clock.advance(Duration::from_secs(1));
        rig.joint.step();
        assert_abs_diff_eq!(rig.joint.controller().integral(), 20., epsilon = 1e-12);
    }

    #[test]
    fn measured_angle_is_published() {
        let mut rig = rig(1., 0.);
        rig.joint.step();

        // 131 * 16 / 180 ticks per degree, so 2096 ticks is 180 degrees
        rig.counter.value.set(2096);
        rig.joint.step();
        assert_abs_diff_eq!(rig.position.get().unwrap(), 180., epsilon = 1e-9);
    }

    #[test]
    fn ready_drop_commands_zero_once() {
        let mut rig = rig(1., 0.);
        rig.joint.step();
        rig.setpoint.put(45.);
        rig.joint.step();

        rig.ready.set(false);
        assert_eq!(rig.joint.step(), TaskState::Stopped);
        assert_eq!(rig.joint.step(), TaskState::Stopped);
        assert_eq!(*rig.motor.duties.borrow(), vec![45., 0.]);
    }

    #[test]
    fn ready_raise_resumes_without_init() {
        let mut rig = rig(1., 0.);
        rig.joint.step();
        rig.setpoint.put(30.);
        rig.joint.step();
        rig.counter.value.set(100);

        rig.ready.set(false);
        rig.joint.step();
        rig.ready.set(true);
        assert_eq!(rig.joint.step(), TaskState::Draw);
        // counter was not zeroed by a second init
        assert_eq!(rig.joint.encoder().position(), 100);
        assert_eq!(rig.motor.duties.borrow().len(), 3);
    }
}

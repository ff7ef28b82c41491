use crate::channel::{Flag, Queue};
use crate::hardware::TouchPort;
use crate::input::{PanelMapping, TouchCalibration};

use super::{Task, TaskState};

///
/// Polls the touch panel and queues every touch as a position request for the brain.
///
/// # Fields:
/// - `panel`: The touch panel
/// - `calibration`: Raw readings to panel millimetres
/// - `mapping`: Panel millimetres to robot inches
/// - `requests`: The queue the brain reads from
/// - `ready`: The global ready flag
/// - `state`: The current lifecycle state
///
pub struct TouchLoop<T: TouchPort> {
    panel: T,
    calibration: TouchCalibration,
    mapping: PanelMapping,
    requests: Queue<(f64, f64)>,
    ready: Flag,
    state: TaskState,
}

impl<T: TouchPort> TouchLoop<T> {
    pub fn new(
        panel: T,
        calibration: TouchCalibration,
        mapping: PanelMapping,
        requests: Queue<(f64, f64)>,
        ready: Flag,
    ) -> TouchLoop<T> {
        TouchLoop { panel, calibration, mapping, requests, ready, state: TaskState::Init }
    }

    fn draw(&mut self) {
        let sample = self.panel.scan();
        if !sample.contact {
            return;
        }

        let (panel_x, panel_y) = self.calibration.apply(sample.adc_x, sample.adc_y);
        let (x, y) = self.mapping.apply(panel_x, panel_y);

        if let Err(err) = self.requests.put((x, y)) {
            tracing::warn!("Dropped touch at x:{:.3} y:{:.3}: {}", x, y, err);
        } else {
            tracing::trace!(x, y, "Touch queued");
        }
    }

    pub fn state(&self) -> TaskState {
        self.state
    }
}

impl<T: TouchPort> Task for TouchLoop<T> {
    fn name(&self) -> &str {
        "touch"
    }

    fn step(&mut self) -> TaskState {
        let ready = self.ready.get();

        self.state = match self.state {
            TaskState::Init => {
                tracing::info!("Touch panel polling");
                TaskState::Draw
            }
            _ if !ready => TaskState::Stopped,
            _ => {
                self.draw();
                TaskState::Draw
            }
        };

        self.state
    }
}

//!
//! Cooperative tasks run by the scheduler, one step per tick
//!

pub mod brain;
pub mod joint;
pub mod scheduler;
pub mod touch;

pub use brain::BrainLoop;
pub use joint::JointLoop;
pub use scheduler::Scheduler;
pub use touch::TouchLoop;

///
/// The lifecycle state of a task.
///
/// - `Init`: Clearing channels and zeroing hardware, runs once
/// - `Draw`: The steady state loop
/// - `Stopped`: The ready flag is down, no hardware is commanded. Returns to `Draw`
/// when the flag is raised again
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Init,
    Draw,
    Stopped,
}

///
/// A unit of cooperative work. `step` must do a bounded amount of work and return,
/// it is never preempted.
///
pub trait Task {
    fn name(&self) -> &str;

    ///
    /// Runs one tick of the task.
    ///
    /// # Returns:
    /// - The state the task is in after this tick
    ///
    fn step(&mut self) -> TaskState;
}

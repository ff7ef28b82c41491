use std::time::Duration;

use super::Task;

///
/// A task with its timing.
///
/// # Fields:
/// - `task`: The task itself
/// - `period`: How often the task should run
/// - `priority`: Higher priorities run first when several tasks are due together
/// - `release`: When the task is next due
/// - `runs`: How many times the task has been stepped
///
struct Entry {
    task: Box<dyn Task>,
    period: Duration,
    priority: u8,
    release: Duration,
    runs: u64,
}

///
/// A cooperative, non-preemptive, fixed period scheduler. It does not keep time
/// itself; the caller passes the current time to `run_due`.
///
#[derive(Default)]
pub struct Scheduler {
    entries: Vec<Entry>,
}

impl Scheduler {
    pub fn new() -> Scheduler {
        Scheduler::default()
    }

    ///
    /// Adds a task. It is due immediately.
    ///
    /// # Parameters:
    /// - `task`: The task to run
    /// - `period`: How often it should run
    /// - `priority`: Higher runs first among tasks due at the same time
    ///
    pub fn add(&mut self, task: Box<dyn Task>, period: Duration, priority: u8) {
        tracing::debug!(task = task.name(), ?period, priority, "Task scheduled");
        self.entries.push(Entry { task, period, priority, release: Duration::ZERO, runs: 0 });
    }

    ///
    /// Steps every task whose release time has come, highest priority first, and in
    /// the order they were added within a priority. Each task's release moves on by one
    /// period; a task more than a period late is re-anchored to `now` rather than run
    /// again to catch up.
    ///
    /// # Parameters:
    /// - `now`: The current time, from the same origin on every call
    ///
    /// # Returns:
    /// - The number of tasks stepped
    ///
    pub fn run_due(&mut self, now: Duration) -> usize {
        let mut due: Vec<usize> = (0..self.entries.len())
            .filter(|&i| self.entries[i].release <= now)
            .collect();
        // stable, so insertion order holds within a priority
        due.sort_by(|&a, &b| self.entries[b].priority.cmp(&self.entries[a].priority));

        for &index in &due {
            let entry = &mut self.entries[index];
            let state = entry.task.step();
            entry.runs += 1;

            entry.release += entry.period;
            if entry.release <= now {
                entry.release = now + entry.period;
            }

            tracing::trace!(task = entry.task.name(), ?state, "Task stepped");
        }

        due.len()
    }

    ///
    /// # Returns:
    /// - The earliest time any task is due, `None` if there are no tasks
    ///
    pub fn next_release(&self) -> Option<Duration> {
        self.entries.iter().map(|entry| entry.release).min()
    }

    ///
    /// # Returns:
    /// - Each task's name and how many times it has run, in the order added
    ///
    pub fn run_counts(&self) -> Vec<(String, u64)> {
        self.entries.iter().map(|entry| (entry.task.name().to_string(), entry.runs)).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskState;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct LoggingTask {
        name: String,
        log: Rc<RefCell<Vec<String>>>,
    }

    impl Task for LoggingTask {
        fn name(&self) -> &str {
            &self.name
        }

        fn step(&mut self) -> TaskState {
            self.log.borrow_mut().push(self.name.clone());
            TaskState::Draw
        }
    }

    fn logging_task(name: &str, log: &Rc<RefCell<Vec<String>>>) -> Box<dyn Task> {
        Box::new(LoggingTask { name: name.to_string(), log: Rc::clone(log) })
    }

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    #[test]
    fn higher_priority_runs_first() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut scheduler = Scheduler::new();
        scheduler.add(logging_task("joint 1", &log), ms(50), 2);
        scheduler.add(logging_task("brain", &log), ms(50), 3);
        scheduler.add(logging_task("joint 2", &log), ms(50), 2);
        scheduler.add(logging_task("touch", &log), ms(50), 4);

        assert_eq!(scheduler.run_due(ms(0)), 4);
        assert_eq!(*log.borrow(), vec!["touch", "brain", "joint 1", "joint 2"]);
    }

    #[test]
    fn tasks_run_once_per_period() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut scheduler = Scheduler::new();
        scheduler.add(logging_task("fast", &log), ms(10), 1);
        scheduler.add(logging_task("slow", &log), ms(30), 1);

        for now in (0..=60).step_by(5) {
            scheduler.run_due(ms(now));
        }

        assert_eq!(scheduler.run_counts(), vec![("fast".to_string(), 7), ("slow".to_string(), 3)]);
    }

    #[test]
    fn late_task_is_reanchored() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut scheduler = Scheduler::new();
        scheduler.add(logging_task("joint", &log), ms(50), 1);

        scheduler.run_due(ms(0));
        // stalled for four periods: one catch up run, not four
        assert_eq!(scheduler.run_due(ms(200)), 1);
        assert_eq!(scheduler.run_due(ms(200)), 0);
        assert_eq!(scheduler.next_release(), Some(ms(250)));
    }

    #[test]
    fn slightly_late_task_keeps_its_phase() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut scheduler = Scheduler::new();
        scheduler.add(logging_task("joint", &log), ms(50), 1);

        scheduler.run_due(ms(0));
        scheduler.run_due(ms(70));
        assert_eq!(scheduler.next_release(), Some(ms(100)));
    }

    #[test]
    fn empty_scheduler_does_nothing() {
        let mut scheduler = Scheduler::new();
        assert!(scheduler.is_empty());
        assert_eq!(scheduler.run_due(ms(100)), 0);
        assert_eq!(scheduler.next_release(), None);
    }
}

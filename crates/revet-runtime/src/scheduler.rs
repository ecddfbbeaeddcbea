/// Lifecycle of one run.
///
/// `AwaitingScheduled` re-evaluates its pending count every pump: tasks
/// registered from inside another task's completion callback are awaited
/// too, so a scheduled task scheduling further work cannot slip past
/// finalization.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    Running,
    AwaitingScheduled,
    Finalized,
}

#[derive(Clone, Debug)]
pub(crate) enum TaskStatus {
    Pending,
    Settled,
    Failed(String),
}

/// The aggregator's view of every scheduled task. Owned by the worker;
/// script code only ever touches it through the capability hooks.
#[derive(Debug, Default)]
pub(crate) struct TaskBoard {
    tasks: Vec<TaskStatus>,
}

impl TaskBoard {
    /// Register a task; returns its index for the completion hooks.
    pub(crate) fn register(&mut self) -> usize {
        self.tasks.push(TaskStatus::Pending);
        self.tasks.len() - 1
    }

    pub(crate) fn settle(&mut self, idx: usize) {
        if let Some(slot) = self.tasks.get_mut(idx) {
            // First signal wins; a duplicate completion is a no-op.
            if matches!(slot, TaskStatus::Pending) {
                *slot = TaskStatus::Settled;
            }
        }
    }

    pub(crate) fn fail(&mut self, idx: usize, reason: String) {
        if let Some(slot) = self.tasks.get_mut(idx) {
            if matches!(slot, TaskStatus::Pending) {
                *slot = TaskStatus::Failed(reason);
            }
        }
    }

    pub(crate) fn pending(&self) -> usize {
        self.tasks
            .iter()
            .filter(|t| matches!(t, TaskStatus::Pending))
            .count()
    }

    pub(crate) fn first_failure(&self) -> Option<&str> {
        self.tasks.iter().find_map(|t| match t {
            TaskStatus::Failed(reason) => Some(reason.as_str()),
            _ => None,
        })
    }

    /// Monotone counter used for stall detection in the await loop: if a
    /// pump neither settles nor fails nor registers anything, nothing ever
    /// will, and the remaining pending tasks can only hang.
    pub(crate) fn progress_marker(&self) -> (usize, usize) {
        let done = self
            .tasks
            .iter()
            .filter(|t| !matches!(t, TaskStatus::Pending))
            .count();
        (self.tasks.len(), done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_count_is_reevaluated_as_tasks_register_late() {
        let mut board = TaskBoard::default();
        let a = board.register();
        assert_eq!(board.pending(), 1);
        board.settle(a);
        assert_eq!(board.pending(), 0);
        // A completion callback registering more work re-raises the count.
        let b = board.register();
        assert_eq!(board.pending(), 1);
        board.settle(b);
        assert_eq!(board.pending(), 0);
    }

    #[test]
    fn duplicate_signals_do_not_overwrite_outcome() {
        let mut board = TaskBoard::default();
        let a = board.register();
        board.fail(a, "boom".to_string());
        board.settle(a);
        assert_eq!(board.first_failure(), Some("boom"));
    }

    #[test]
    fn progress_marker_moves_only_on_real_progress() {
        let mut board = TaskBoard::default();
        let a = board.register();
        let before = board.progress_marker();
        assert_eq!(board.progress_marker(), before);
        board.settle(a);
        assert_ne!(board.progress_marker(), before);
    }

    #[test]
    fn out_of_range_signal_is_ignored() {
        let mut board = TaskBoard::default();
        board.settle(3);
        board.fail(7, "noise".to_string());
        assert_eq!(board.pending(), 0);
        assert!(board.first_failure().is_none());
    }
}

use std::time::Duration;

/// Handle to a scheduled continuation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

#[derive(Debug)]
struct Pending<T> {
    id: TaskId,
    due: Duration,
    task: T,
}

/// "Delay then run" over a virtual clock advanced by ticks.
///
/// Nothing runs on its own: the owner calls [`Scheduler::advance`] and runs
/// the continuations it hands back. Tasks due at the same instant come back
/// in scheduling order.
#[derive(Debug)]
pub struct Scheduler<T> {
    now: Duration,
    next_id: u64,
    pending: Vec<Pending<T>>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_id: 0,
            pending: Vec::new(),
        }
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn schedule(&mut self, delay: Duration, task: T) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.pending.push(Pending {
            id,
            due: self.now + delay,
            task,
        });
        id
    }

    /// Returns false when the task already ran or was cancelled
    pub fn cancel(&mut self, id: TaskId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.id != id);
        self.pending.len() != before
    }

    /// Drop every pending continuation; returns how many were dropped
    pub fn cancel_all(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        dropped
    }

    /// Remove and return pending tasks matching `pred` without waiting for them
    pub fn take_matching(&mut self, pred: impl Fn(&T) -> bool) -> Vec<T> {
        let (mut taken, kept): (Vec<_>, Vec<_>) =
            self.pending.drain(..).partition(|p| pred(&p.task));
        self.pending = kept;
        taken.sort_by_key(|p| (p.due, p.id));
        taken.into_iter().map(|p| p.task).collect()
    }

    /// Move the clock forward and return every task now due, in due order
    pub fn advance(&mut self, dt: Duration) -> Vec<T> {
        self.now += dt;
        let now = self.now;
        let (mut due, waiting): (Vec<_>, Vec<_>) =
            self.pending.drain(..).partition(|p| p.due <= now);
        self.pending = waiting;
        due.sort_by_key(|p| (p.due, p.id));
        due.into_iter().map(|p| p.task).collect()
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_fires_after_delay() {
        let mut s = Scheduler::new();
        s.schedule(Duration::from_millis(100), "next");
        assert!(s.advance(Duration::from_millis(99)).is_empty());
        assert_eq!(s.advance(Duration::from_millis(1)), vec!["next"]);
        assert!(s.is_idle());
    }

    #[test]
    fn test_due_order_then_schedule_order() {
        let mut s = Scheduler::new();
        s.schedule(Duration::from_millis(50), "b");
        s.schedule(Duration::from_millis(10), "a");
        s.schedule(Duration::from_millis(50), "c");
        assert_eq!(s.advance(Duration::from_secs(1)), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_cancel() {
        let mut s = Scheduler::new();
        let id = s.schedule(Duration::from_millis(10), 1);
        assert!(s.cancel(id));
        assert!(!s.cancel(id));
        assert!(s.advance(Duration::from_secs(1)).is_empty());
    }

    #[test]
    fn test_cancel_all() {
        let mut s = Scheduler::new();
        s.schedule(Duration::from_millis(10), 1);
        s.schedule(Duration::from_millis(20), 2);
        assert_eq!(s.cancel_all(), 2);
        assert_eq!(s.cancel_all(), 0);
        assert!(s.advance(Duration::from_secs(1)).is_empty());
    }

    #[test]
    fn test_take_matching_leaves_rest() {
        let mut s = Scheduler::new();
        s.schedule(Duration::from_millis(10), 1);
        s.schedule(Duration::from_millis(20), 2);
        s.schedule(Duration::from_millis(5), 4);
        assert_eq!(s.take_matching(|t| t % 2 == 0), vec![4, 2]);
        assert_eq!(s.pending_len(), 1);
        assert_eq!(s.advance(Duration::from_secs(1)), vec![1]);
    }

    #[test]
    fn test_delay_is_relative_to_current_time() {
        let mut s = Scheduler::new();
        s.advance(Duration::from_millis(500));
        s.schedule(Duration::from_millis(100), ());
        assert!(s.advance(Duration::from_millis(50)).is_empty());
        assert_eq!(s.advance(Duration::from_millis(50)).len(), 1);
        assert_eq!(s.now(), Duration::from_millis(600));
    }
}

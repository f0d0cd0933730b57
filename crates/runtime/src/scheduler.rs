use foundation::time::Time;

use crate::timer_queue::{TimerId, TimerQueue};

/// Single-threaded timer scheduler on an explicit timebase.
///
/// The scheduler never reads a clock. Callers advance it with
/// [`Scheduler::run_until`] (or the pull-style [`Scheduler::poll_until`]),
/// and every delay is measured from the scheduler's current `now`. While a
/// timer fires, `now` equals that timer's deadline, so a handler that
/// re-arms itself keeps a steady cadence regardless of how late the driver
/// woke up.
#[derive(Debug)]
pub struct Scheduler<T> {
    now: Time,
    timers: TimerQueue<T>,
}

impl<T> Scheduler<T> {
    pub fn new(now: Time) -> Self {
        Self {
            now,
            timers: TimerQueue::new(),
        }
    }

    pub fn now(&self) -> Time {
        self.now
    }

    pub fn pending(&self) -> usize {
        self.timers.len()
    }

    pub fn is_idle(&self) -> bool {
        self.timers.is_empty()
    }

    pub fn schedule_after(&mut self, delay_ms: u64, task: T) -> TimerId {
        let due = self.now.saturating_add_ms(delay_ms);
        self.timers.schedule(due, task)
    }

    pub fn cancel(&mut self, id: TimerId) -> bool {
        self.timers.cancel(id)
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.timers.contains(id)
    }

    pub fn next_deadline(&self) -> Option<Time> {
        self.timers.next_due()
    }

    /// Pops the next task due at or before `until`, moving `now` to its
    /// deadline. Returns `None` once nothing else is due.
    pub fn poll_until(&mut self, until: Time) -> Option<T> {
        let (_id, due, task) = self.timers.pop_due(until)?;
        if due > self.now {
            self.now = due;
        }
        Some(task)
    }

    /// Fires every task due at or before `until` in deadline order, then
    /// settles `now` at `until`. Returns how many tasks ran.
    ///
    /// Tasks scheduled by `handler` that fall inside the window run in the
    /// same call.
    pub fn run_until(&mut self, until: Time, mut handler: impl FnMut(&mut Self, T)) -> usize {
        let mut ran = 0usize;
        while let Some(task) = self.poll_until(until) {
            handler(self, task);
            ran += 1;
        }
        self.settle(until);
        ran
    }

    /// Moves `now` forward without firing anything. Never moves backwards.
    pub fn settle(&mut self, until: Time) {
        if until > self.now {
            self.now = until;
        }
    }

    /// Teardown: cancels every pending timer.
    pub fn clear(&mut self) -> usize {
        self.timers.clear()
    }
}

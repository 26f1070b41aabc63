//! Delayed and periodic continuations on the host tick thread
//!
//! Tasks are plain data; whoever owns the scheduler pops due tasks and
//! dispatches them. Nothing here blocks. Cancellation removes the entry, so a
//! cancelled task is never returned from [`TickScheduler::next_due`], even
//! when it became due in the same tick as the task that cancelled it.

use std::collections::BTreeSet;

use rustc_hash::FxHashMap;

/// Handle to a scheduled task, retained by its owner for cancellation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskHandle(u64);

/// Scheduling interface consumed by the orchestration code
pub trait Scheduler<T> {
    /// Run `task` once after `delay_secs`
    fn run_after(&mut self, delay_secs: f32, task: T) -> TaskHandle;
    /// Run `task` every `interval_secs`, first after one interval
    fn run_periodic(&mut self, interval_secs: f32, task: T) -> TaskHandle;
    /// Cancel a task; returns false if it already ran or was cancelled
    fn cancel(&mut self, handle: TaskHandle) -> bool;
    /// Whether the task is still pending
    fn is_active(&self, handle: TaskHandle) -> bool;
    /// Scheduler clock in seconds
    fn now_secs(&self) -> f64;
}

#[derive(Debug)]
struct ScheduledTask<T> {
    task: T,
    due_tick: u64,
    period_ticks: Option<u64>,
}

/// Deterministic fixed-rate scheduler driven by the host tick
#[derive(Debug)]
pub struct TickScheduler<T> {
    tick: u64,
    tick_rate: u32,
    next_id: u64,
    tasks: FxHashMap<u64, ScheduledTask<T>>,
    /// (due_tick, id): due order, ties broken by scheduling order
    queue: BTreeSet<(u64, u64)>,
}

impl<T: Clone> TickScheduler<T> {
    pub fn new(tick_rate: u32) -> Self {
        Self {
            tick: 0,
            tick_rate: tick_rate.max(1),
            next_id: 0,
            tasks: FxHashMap::default(),
            queue: BTreeSet::new(),
        }
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn tick_rate(&self) -> u32 {
        self.tick_rate
    }

    /// Convert seconds to whole ticks, rounding to the nearest tick
    pub fn secs_to_ticks(&self, secs: f32) -> u64 {
        if !secs.is_finite() || secs <= 0.0 {
            return 0;
        }
        (secs as f64 * self.tick_rate as f64).round() as u64
    }

    /// Move the clock forward by one tick
    pub fn advance(&mut self) {
        self.tick += 1;
    }

    /// Pop the next task due at or before the current tick
    ///
    /// Periodic tasks are re-armed before being returned.
    pub fn next_due(&mut self) -> Option<(TaskHandle, T)> {
        let &(due_tick, id) = self.queue.first()?;
        if due_tick > self.tick {
            return None;
        }
        self.queue.remove(&(due_tick, id));

        let period = self.tasks.get(&id)?.period_ticks;
        match period {
            Some(period) => {
                let entry = self.tasks.get_mut(&id)?;
                entry.due_tick = due_tick + period;
                self.queue.insert((entry.due_tick, id));
                Some((TaskHandle(id), entry.task.clone()))
            }
            None => {
                let entry = self.tasks.remove(&id)?;
                Some((TaskHandle(id), entry.task))
            }
        }
    }

    /// Number of pending tasks
    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    fn insert(&mut self, due_tick: u64, period_ticks: Option<u64>, task: T) -> TaskHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.tasks.insert(
            id,
            ScheduledTask {
                task,
                due_tick,
                period_ticks,
            },
        );
        self.queue.insert((due_tick, id));
        TaskHandle(id)
    }
}

impl<T: Clone> Scheduler<T> for TickScheduler<T> {
    fn run_after(&mut self, delay_secs: f32, task: T) -> TaskHandle {
        let due = self.tick + self.secs_to_ticks(delay_secs);
        self.insert(due, None, task)
    }

    fn run_periodic(&mut self, interval_secs: f32, task: T) -> TaskHandle {
        let period = self.secs_to_ticks(interval_secs).max(1);
        let due = self.tick + period;
        self.insert(due, Some(period), task)
    }

    fn cancel(&mut self, handle: TaskHandle) -> bool {
        match self.tasks.remove(&handle.0) {
            Some(entry) => {
                self.queue.remove(&(entry.due_tick, handle.0));
                true
            }
            None => false,
        }
    }

    fn is_active(&self, handle: TaskHandle) -> bool {
        self.tasks.contains_key(&handle.0)
    }

    fn now_secs(&self) -> f64 {
        self.tick as f64 / self.tick_rate as f64
    }
}

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use crate::{
    storage::chunk_storage::DayTotals,
    utils::percentage::{activity_percentage, Percentage},
};

/// Interval that was closed at a chunk boundary and still has to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingChunk {
    pub task_name: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub active: Duration,
}

/// Read-only copy handed to whatever displays the session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub is_running: bool,
    pub current_task: String,
    pub worked_today: Duration,
    pub active_today: Duration,
    pub time_by_task: HashMap<String, Duration>,
    pub last_tick_active: Duration,
    pub activity_interval: Duration,
}

impl SessionSnapshot {
    /// Text shown above the clock.
    pub fn task_label(&self) -> &str {
        match (self.is_running, self.current_task.is_empty()) {
            (false, _) => "Not Tracking",
            (true, true) => "Unassigned Task",
            (true, false) => &self.current_task,
        }
    }

    pub fn average_activity(&self) -> Percentage {
        activity_percentage(self.active_today, self.worked_today)
    }

    pub fn current_activity(&self) -> Percentage {
        activity_percentage(self.last_tick_active, self.activity_interval)
    }
}

/// All mutable state of a tracking session. Every transition takes the current instant
/// explicitly, which keeps this type free of clocks and I/O.
///
/// Totals are recomputed from the `*_before_run` baselines and the run start on every tick, so
/// they never accumulate rounding drift and never count an interval twice.
#[derive(Debug, Clone)]
pub struct SessionState {
    is_running: bool,
    current_task: String,

    run_start: DateTime<Utc>,
    task_run_start: DateTime<Utc>,
    chunk_start: DateTime<Utc>,
    active_during_chunk: Duration,

    last_tick_start: DateTime<Utc>,
    last_tick_active: Duration,

    worked_today: Duration,
    active_today: Duration,
    time_by_task: HashMap<String, Duration>,

    worked_before_run: Duration,
    time_by_task_before_run: HashMap<String, Duration>,
}

impl SessionState {
    /// Seeds the session from what today's file already holds.
    pub fn new(totals: DayTotals, now: DateTime<Utc>) -> Self {
        Self {
            is_running: false,
            current_task: String::new(),
            run_start: now,
            task_run_start: now,
            chunk_start: now,
            active_during_chunk: Duration::zero(),
            last_tick_start: now,
            last_tick_active: Duration::zero(),
            worked_today: totals.worked,
            active_today: totals.active,
            worked_before_run: totals.worked,
            time_by_task_before_run: totals.by_task.clone(),
            time_by_task: totals.by_task,
        }
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }

    /// Starts a run. Returns false if a run is already in progress.
    pub fn start(&mut self, task: String, now: DateTime<Utc>) -> bool {
        if self.is_running {
            return false;
        }
        self.is_running = true;
        self.current_task = task;
        self.run_start = now;
        self.task_run_start = now;
        self.chunk_start = now;
        self.last_tick_start = now;
        self.active_during_chunk = Duration::zero();
        true
    }

    /// Closes the chunk of the outgoing task and continues the run with `task`. The overall run
    /// start is kept.
    pub fn switch_task(&mut self, task: String, now: DateTime<Utc>) -> Option<PendingChunk> {
        if !self.is_running || task == self.current_task {
            return None;
        }
        self.recompute_totals(now);
        let pending = self.cut_chunk(now);

        // The outgoing task's time so far becomes its baseline, otherwise coming back to it
        // later would drop this stint.
        let outgoing = self.task_total(&self.current_task);
        self.time_by_task_before_run
            .insert(self.current_task.clone(), outgoing);

        self.current_task = task;
        self.task_run_start = now;
        pending
    }

    /// Ends the run. The returned chunk covers everything since the last boundary.
    pub fn stop(&mut self, now: DateTime<Utc>) -> Option<PendingChunk> {
        if !self.is_running {
            return None;
        }
        self.recompute_totals(now);
        let pending = self.cut_chunk(now);

        self.is_running = false;
        self.worked_before_run = self.worked_today;
        self.time_by_task_before_run = self.time_by_task.clone();
        self.current_task.clear();
        self.last_tick_active = Duration::zero();
        self.last_tick_start = now;
        pending
    }

    /// Applies one activity sample. `idle` is the probe result, `None` when unknown.
    ///
    /// Scoring is binary per tick: the tick counts as fully active unless the user was idle for
    /// at least the whole tick. An unknown idle time counts as inactive.
    pub fn record_tick(&mut self, idle: Option<Duration>, now: DateTime<Utc>) {
        if !self.is_running {
            self.last_tick_start = now;
            return;
        }

        let elapsed = (now - self.last_tick_start).max(Duration::zero());
        let active = match idle {
            Some(idle) if idle < elapsed => elapsed,
            _ => Duration::zero(),
        };

        self.last_tick_active = active;
        self.active_today += active;
        self.active_during_chunk += active;
        self.recompute_totals(now);
        self.last_tick_start = now;
    }

    /// Flush boundary. Returns the chunk to persist, if any time passed since the last one.
    pub fn flush(&mut self, now: DateTime<Utc>) -> Option<PendingChunk> {
        if !self.is_running {
            return None;
        }
        self.cut_chunk(now)
    }

    pub fn snapshot(&self, activity_interval: Duration) -> SessionSnapshot {
        SessionSnapshot {
            is_running: self.is_running,
            current_task: self.current_task.clone(),
            worked_today: self.worked_today,
            active_today: self.active_today.min(self.worked_today).max(Duration::zero()),
            time_by_task: self.time_by_task.clone(),
            last_tick_active: self.last_tick_active,
            activity_interval,
        }
    }

    fn task_total(&self, task: &str) -> Duration {
        self.time_by_task
            .get(task)
            .copied()
            .unwrap_or_else(Duration::zero)
    }

    fn recompute_totals(&mut self, now: DateTime<Utc>) {
        self.worked_today = self.worked_before_run + (now - self.run_start);
        let before = self
            .time_by_task_before_run
            .get(&self.current_task)
            .copied()
            .unwrap_or_else(Duration::zero);
        self.time_by_task
            .insert(self.current_task.clone(), before + (now - self.task_run_start));
    }

    /// Closes `[chunk_start, now)`. An empty interval yields nothing and leaves the boundary
    /// where it was.
    fn cut_chunk(&mut self, now: DateTime<Utc>) -> Option<PendingChunk> {
        if now == self.chunk_start {
            return None;
        }
        let pending = PendingChunk {
            task_name: self.current_task.clone(),
            start: self.chunk_start,
            end: now,
            active: self.active_during_chunk,
        };
        self.chunk_start = now;
        self.active_during_chunk = Duration::zero();
        Some(pending)
    }
}

//! Cooperative periodic tasks polled from a single loop.

use log::debug;

/// A task that becomes due `interval_ms` after it last ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodicTask {
    name: &'static str,
    pub interval_ms: u64,
    last_run_ms: u64,
}

impl PeriodicTask {
    pub fn new(name: &'static str, interval_ms: u64) -> Self {
        Self {
            name,
            interval_ms,
            last_run_ms: 0,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_due(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.last_run_ms) >= self.interval_ms
    }

    pub fn mark_run(&mut self, now_ms: u64) {
        self.last_run_ms = now_ms;
    }

    /// Marks the task as run and returns true when due.
    pub fn poll(&mut self, now_ms: u64) -> bool {
        if self.is_due(now_ms) {
            debug!(
                "{} due at {now_ms} ms ({} ms since last run)",
                self.name,
                now_ms.saturating_sub(self.last_run_ms)
            );
            self.mark_run(now_ms);
            true
        } else {
            false
        }
    }

    pub fn last_run_ms(&self) -> u64 {
        self.last_run_ms
    }
}

/// Which tasks fire on a given tick, in execution order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DueTasks {
    pub threshold_sync: bool,
    pub sense_and_report: bool,
}

#[derive(Debug, Clone)]
pub struct Scheduler {
    pub threshold_sync: PeriodicTask,
    pub sense_and_report: PeriodicTask,
}

impl Scheduler {
    pub fn new(threshold_sync_interval_ms: u64, report_interval_ms: u64) -> Self {
        Self {
            threshold_sync: PeriodicTask::new("threshold-sync", threshold_sync_interval_ms),
            sense_and_report: PeriodicTask::new("sense-and-report", report_interval_ms),
        }
    }

    /// Both tasks are checked against the same `now`, sync first.
    pub fn poll(&mut self, now_ms: u64) -> DueTasks {
        DueTasks {
            threshold_sync: self.threshold_sync.poll(now_ms),
            sense_and_report: self.sense_and_report.poll(now_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn task_is_due_after_interval() {
        let mut task = PeriodicTask::new("t", 10_000);

        assert!(!task.poll(9_999));
        assert!(task.poll(10_000));
        assert_eq!(task.last_run_ms(), 10_000);
        assert!(!task.poll(19_999));
        assert!(task.poll(20_050));
    }

    #[test]
    fn clock_going_backwards_never_fires_spuriously() {
        let mut task = PeriodicTask::new("t", 1_000);
        task.mark_run(5_000);

        assert!(!task.is_due(4_000));
    }

    #[test]
    fn scheduler_tasks_are_named() {
        let scheduler = Scheduler::new(10_000, 10_000);

        assert_eq!(scheduler.threshold_sync.name(), "threshold-sync");
        assert_eq!(scheduler.sense_and_report.name(), "sense-and-report");
    }

    #[test]
    fn tasks_are_tracked_independently() {
        let mut scheduler = Scheduler::new(10_000, 4_000);

        assert_eq!(
            scheduler.poll(4_000),
            DueTasks {
                threshold_sync: false,
                sense_and_report: true,
            }
        );
        assert_eq!(
            scheduler.poll(10_000),
            DueTasks {
                threshold_sync: true,
                sense_and_report: true,
            }
        );
        assert_eq!(scheduler.poll(12_000), DueTasks::default());
    }

    fn count_firings(interval: u64, quantum: u64, ticks: u64) -> (u64, u64) {
        let mut task = PeriodicTask::new("t", interval);
        let mut fired = 0u64;
        let mut now = 0u64;

        for tick in 0..ticks {
            now = tick * quantum;
            if task.poll(now) {
                fired += 1;
            }
        }

        (fired, now)
    }

    proptest! {
        #[test]
        fn firings_follow_quantized_interval(
            interval in 200u64..20_000,
            quantum in 10u64..200,
            ticks in 1u64..2_000,
        ) {
            let (fired, elapsed) = count_firings(interval, quantum, ticks);
            // A firing lands on the first tick at or past the deadline.
            let period = interval.div_ceil(quantum) * quantum;

            prop_assert_eq!(fired, elapsed / period);
        }

        #[test]
        fn fires_floor_elapsed_over_interval(
            interval_quanta in 1u64..200,
            ticks in 1u64..5_000,
        ) {
            let interval = interval_quanta * 100;
            let (fired, elapsed) = count_firings(interval, 100, ticks);
            let ideal = elapsed / interval;

            prop_assert!(fired.abs_diff(ideal) <= 1);
        }
    }
}

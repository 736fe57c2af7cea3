//! UpdateScheduler: turns many change notifications into one flush per tick.
//!
//! # States
//!
//! ```text
//!            schedule()                 begin_flush()
//!   Idle ────────────────▶ Pending ─────────────────────▶ Idle (flush runs)
//!                           │  ▲
//!                           └──┘ schedule() is a no-op
//! ```
//!
//! The flag is cleared *before* the flush runs.  A notification raised while
//! the outputs are being updated therefore schedules a fresh flush for the
//! following tick instead of being lost.

use tracing::trace;

/// Per-surface flush scheduler.
#[derive(Debug, Default)]
pub struct UpdateScheduler {
    pending: bool,
    notifications: u64,
    flushes: u64,
}

impl UpdateScheduler {
    /// Creates an idle scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that the buffer changed.
    ///
    /// The first call after a flush arranges one flush on the next tick;
    /// further calls before that tick only bump the notification counter.
    pub fn schedule(&mut self) {
        self.notifications += 1;
        if self.pending {
            return;
        }
        self.pending = true;
        trace!(notifications = self.notifications, "flush scheduled for next tick");
    }

    /// Returns `true` while a flush is waiting for the next tick.
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Called by the tick: returns `true` if a flush must run now.
    ///
    /// Clears the pending flag before returning so notifications raised by
    /// the flush itself schedule another one.
    pub fn begin_flush(&mut self) -> bool {
        if !self.pending {
            return false;
        }
        self.pending = false;
        self.flushes += 1;
        true
    }

    /// Total notifications received.
    pub fn notifications(&self) -> u64 {
        self.notifications
    }

    /// Total flushes started.
    pub fn flushes(&self) -> u64 {
        self.flushes
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_scheduler_is_idle() {
        let scheduler = UpdateScheduler::new();
        assert!(!scheduler.is_pending());
        assert_eq!(scheduler.notifications(), 0);
        assert_eq!(scheduler.flushes(), 0);
    }

    #[test]
    fn test_begin_flush_when_idle_returns_false() {
        let mut scheduler = UpdateScheduler::new();
        assert!(!scheduler.begin_flush());
        assert_eq!(scheduler.flushes(), 0);
    }

    #[test]
    fn test_many_schedules_before_tick_yield_one_flush() {
        // Arrange
        let mut scheduler = UpdateScheduler::new();

        // Act
        for _ in 0..25 {
            scheduler.schedule();
        }
        let first = scheduler.begin_flush();
        let second = scheduler.begin_flush();

        // Assert
        assert!(first, "the tick after notifications must flush");
        assert!(!second, "no second flush without new notifications");
        assert_eq!(scheduler.notifications(), 25);
        assert_eq!(scheduler.flushes(), 1);
    }

    #[test]
    fn test_flag_is_cleared_before_flush_runs() {
        let mut scheduler = UpdateScheduler::new();
        scheduler.schedule();

        assert!(scheduler.begin_flush());
        assert!(!scheduler.is_pending(), "flag must be clear while the flush runs");
    }

    #[test]
    fn test_notification_during_flush_schedules_a_separate_flush() {
        // Arrange: a flush has begun
        let mut scheduler = UpdateScheduler::new();
        scheduler.schedule();
        assert!(scheduler.begin_flush());

        // Act: the flush itself triggers a change
        scheduler.schedule();

        // Assert
        assert!(scheduler.is_pending());
        assert!(scheduler.begin_flush());
        assert_eq!(scheduler.flushes(), 2);
    }
}

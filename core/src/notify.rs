//! On-screen notifications raised by front-end operations
//!
//! The front-end drains the queue once per frame and draws what is active.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Severity of a notification, used for its on-screen color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyLevel {
    Info,
    Warn,
    Error,
}

/// A short message shown for a fixed duration.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub message: String,
    pub level: NotifyLevel,
    pub duration: Duration,
}

impl Notification {
    pub fn new(message: impl Into<String>, level: NotifyLevel, duration: Duration) -> Self {
        Self {
            message: message.into(),
            level,
            duration,
        }
    }

    pub fn state_saved() -> Self {
        Self::new("Saved State", NotifyLevel::Warn, Duration::from_millis(1000))
    }

    pub fn state_save_failed() -> Self {
        Self::new(
            "Error while saving state",
            NotifyLevel::Error,
            Duration::from_millis(5000),
        )
    }

    pub fn state_loaded() -> Self {
        Self::new("Loaded State", NotifyLevel::Info, Duration::from_millis(1000))
    }

    pub fn state_load_failed() -> Self {
        Self::new(
            "Error while loading state",
            NotifyLevel::Error,
            Duration::from_millis(5000),
        )
    }
}

/// Notifications with the time they were raised.
#[derive(Debug, Default)]
pub struct NotificationQueue {
    entries: VecDeque<(Notification, Instant)>,
}

impl NotificationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, notification: Notification, now: Instant) {
        self.entries.push_back((notification, now));
    }

    /// Drop expired notifications and return the ones still on screen.
    pub fn active(&mut self, now: Instant) -> impl Iterator<Item = &Notification> {
        self.entries
            .retain(|(n, raised)| now.saturating_duration_since(*raised) < n.duration);
        self.entries.iter().map(|(n, _)| n)
    }

    /// Most recent notification, if any.
    pub fn last(&self) -> Option<&Notification> {
        self.entries.back().map(|(n, _)| n)
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

    #[test]
    fn test_notifications_expire() {
        let mut queue = NotificationQueue::new();
        let start = Instant::now();
        queue.push(Notification::state_saved(), start);
        queue.push(Notification::state_load_failed(), start);

        assert_eq!(queue.active(start).count(), 2);

        let later = start + Duration::from_millis(1500);
        let remaining: Vec<_> = queue.active(later).cloned().collect();
        assert_eq!(remaining, vec![Notification::state_load_failed()]);

        assert_eq!(queue.active(start + Duration::from_secs(6)).count(), 0);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_levels_and_durations() {
        assert_eq!(Notification::state_saved().level, NotifyLevel::Warn);
        assert_eq!(Notification::state_loaded().level, NotifyLevel::Info);
        assert_eq!(
            Notification::state_save_failed().duration,
            Duration::from_secs(5)
        );
    }
}

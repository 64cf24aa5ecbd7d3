use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of entries the console log keeps.
pub const DEFAULT_LOG_CAPACITY: usize = 50;

/// Severity color of a log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogColor {
    Red,
    Blue,
    Gray,
    Green,
}

impl LogColor {
    /// Dashboard stylesheet class for this color.
    pub fn css_class(self) -> &'static str {
        match self {
            LogColor::Red => "text-red-400",
            LogColor::Blue => "text-blue-400",
            LogColor::Gray => "text-gray-400",
            LogColor::Green => "text-green-400",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: u64,
    pub timestamp: DateTime<Utc>,
    pub agent: String,
    pub message: String,
    pub color: LogColor,
}

/// Fixed-capacity, append-only log that drops its oldest entries first.
#[derive(Debug, Clone)]
pub struct RollingLog {
    entries: VecDeque<LogEntry>,
    capacity: usize,
}

impl RollingLog {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, entry: LogEntry) {
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&LogEntry> {
        self.entries.back()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Entries oldest first.
    pub fn to_vec(&self) -> Vec<LogEntry> {
        self.entries.iter().cloned().collect()
    }
}

impl Default for RollingLog {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: u64) -> LogEntry {
        LogEntry {
            id,
            timestamp: Utc::now(),
            agent: "System".into(),
            message: format!("entry {id}"),
            color: LogColor::Gray,
        }
    }

    #[test]
    fn test_log_never_exceeds_capacity() {
        let mut log = RollingLog::new(50);
        for id in 0..60 {
            log.push(entry(id));
            assert!(log.len() <= 50);
        }
        let ids: Vec<u64> = log.iter().map(|e| e.id).collect();
        assert_eq!(ids, (10..60).collect::<Vec<_>>());
        assert_eq!(log.latest().unwrap().id, 59);
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let mut log = RollingLog::new(0);
        log.push(entry(1));
        log.push(entry(2));
        assert_eq!(log.capacity(), 1);
        assert_eq!(log.to_vec()[0].id, 2);
    }

    #[test]
    fn test_css_classes() {
        assert_eq!(LogColor::Red.css_class(), "text-red-400");
        assert_eq!(LogColor::Green.css_class(), "text-green-400");
    }
}

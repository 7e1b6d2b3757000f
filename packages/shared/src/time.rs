//! Time-related utilities with clock abstraction for testability.

use chrono::{Local, NaiveTime};

/// Clock trait for dependency injection and testing
pub trait Clock: Send + Sync {
    /// Current wall-clock time of day (server local time)
    fn now(&self) -> NaiveTime;
}

/// System clock implementation (uses actual local time)
#[derive(Debug, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveTime {
        Local::now().time()
    }
}

/// Fixed clock implementation for testing (returns a fixed time)
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    fixed_time: NaiveTime,
}

impl FixedClock {
    /// Create a new fixed clock with the given time of day
    pub fn new(fixed_time: NaiveTime) -> Self {
        Self { fixed_time }
    }

    /// Create a fixed clock from hour, minute and second.
    ///
    /// Returns `None` when the components do not form a valid time.
    pub fn from_hms(hour: u32, min: u32, sec: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, min, sec).map(Self::new)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveTime {
        self.fixed_time
    }
}

/// Format a time of day as `HH:MM:SS`
pub fn format_hms(time: NaiveTime) -> String {
    time.format("%H:%M:%S").to_string()
}

/// Format a time of day as the bracketed wire timestamp `[HH:MM:SS]`
pub fn bracketed_timestamp(time: NaiveTime) -> String {
    format!("[{}]", format_hms(time))
}

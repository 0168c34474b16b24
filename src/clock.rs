// src/clock.rs
//
// Monotonic and wall-clock readers, split out as a trait seam (teacher's
// resource_monitor.rs reads the kernel surfaces directly; this crate mirrors
// that but keeps time behind a trait so Reporter/Termination tests can
// inject a fixed clock instead of racing real wall-clock seconds).

use std::time::Instant;

use chrono::{Datelike, Local, Timelike};

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "June", "July", "Aug", "Sept", "Oct", "Nov", "Dec",
];

const WEEKDAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// A decomposed wall-clock reading, formatted the way the report/shutdown
/// lines need it (12-hour, non-zero-padded, with the source's exact month
/// spellings for June/July/Sept).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WallClockReading {
    pub weekday: &'static str,
    pub month: &'static str,
    pub day: u32,
    pub year: i32,
    pub hour12: u32,
    pub minute: u32,
    pub second: u32,
    pub am_pm: &'static str,
}

impl std::fmt::Display for WallClockReading {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}, {} {}, {} {}:{}:{} {}",
            self.weekday,
            self.month,
            self.day,
            self.year,
            self.hour12,
            self.minute,
            self.second,
            self.am_pm
        )
    }
}

pub trait Clock: Send + Sync {
    /// Seconds since an arbitrary, monotonic epoch. Only differences between
    /// two readings are meaningful.
    fn monotonic_seconds(&self) -> u64;

    /// The current wall-clock time, decomposed for display.
    fn wall_clock_now(&self) -> WallClockReading;
}

pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        SystemClock {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn monotonic_seconds(&self) -> u64 {
        self.start.elapsed().as_secs()
    }

    fn wall_clock_now(&self) -> WallClockReading {
        let now = Local::now();
        let hour24 = now.hour();
        let (hour12, am_pm) = to_12_hour(hour24);
        WallClockReading {
            weekday: WEEKDAYS[now.weekday().num_days_from_sunday() as usize],
            month: MONTHS[(now.month0()) as usize],
            day: now.day(),
            year: now.year(),
            hour12,
            minute: now.minute(),
            second: now.second(),
            am_pm,
        }
    }
}

fn to_12_hour(hour24: u32) -> (u32, &'static str) {
    let am_pm = if hour24 < 12 { "AM" } else { "PM" };
    let hour12 = match hour24 % 12 {
        0 => 12,
        h => h,
    };
    (hour12, am_pm)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn midnight_displays_as_twelve_am() {
        assert_eq!(to_12_hour(0), (12, "AM"));
    }

    #[test]
    fn noon_displays_as_twelve_pm() {
        assert_eq!(to_12_hour(12), (12, "PM"));
    }

    #[test]
    fn afternoon_hour_converts() {
        assert_eq!(to_12_hour(13), (1, "PM"));
    }

    #[test]
    fn month_spellings_match_source() {
        assert_eq!(MONTHS[5], "June");
        assert_eq!(MONTHS[6], "July");
        assert_eq!(MONTHS[8], "Sept");
    }

    #[test]
    fn monotonic_seconds_is_nondecreasing() {
        let clock = SystemClock::new();
        let a = clock.monotonic_seconds();
        let b = clock.monotonic_seconds();
        assert!(b >= a);
    }
}

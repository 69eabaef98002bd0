//! Working-time calendars.
//!
//! A calendar combines weekly working hours with vacation intervals. The
//! scheduling core only ever asks two questions: is an interval working time,
//! and how many working seconds does it contain.

use chrono::{Datelike, Duration, NaiveDateTime, NaiveTime, Timelike};

/// A half-open time interval `[start, end)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Interval {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Interval {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    pub fn from_slot(start: NaiveDateTime, granularity: i64) -> Self {
        Self {
            start,
            end: start + Duration::seconds(granularity),
        }
    }

    #[inline]
    pub fn seconds(&self) -> i64 {
        (self.end - self.start).num_seconds().max(0)
    }

    #[inline]
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Seconds shared by both intervals.
    pub fn overlap_seconds(&self, other: &Interval) -> i64 {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        if end > start {
            (end - start).num_seconds()
        } else {
            0
        }
    }
}

/// Weekly working hours as seconds-from-midnight ranges, Monday first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkingHours {
    days: [Vec<(u32, u32)>; 7],
}

const HOUR: u32 = 3600;

impl Default for WorkingHours {
    /// Monday to Friday, 9:00-12:00 and 13:00-18:00.
    fn default() -> Self {
        let workday = vec![(9 * HOUR, 12 * HOUR), (13 * HOUR, 18 * HOUR)];
        Self {
            days: [
                workday.clone(),
                workday.clone(),
                workday.clone(),
                workday.clone(),
                workday,
                Vec::new(),
                Vec::new(),
            ],
        }
    }
}

impl WorkingHours {
    /// Working hours with no working time at all.
    pub fn none() -> Self {
        Self {
            days: Default::default(),
        }
    }

    /// Every second of every day is working time.
    pub fn around_the_clock() -> Self {
        let full = vec![(0, 24 * HOUR)];
        Self {
            days: std::array::from_fn(|_| full.clone()),
        }
    }

    /// Replace the working ranges of one weekday (0 = Monday).
    pub fn set_day(&mut self, weekday: usize, ranges: Vec<(u32, u32)>) -> &mut Self {
        if let Some(day) = self.days.get_mut(weekday) {
            *day = ranges;
        }
        self
    }

    pub fn day(&self, weekday: usize) -> &[(u32, u32)] {
        self.days.get(weekday).map(|d| d.as_slice()).unwrap_or(&[])
    }

    /// Working seconds contained in an interval.
    pub fn working_seconds(&self, iv: &Interval) -> i64 {
        if iv.end <= iv.start {
            return 0;
        }
        let mut total = 0;
        let mut day = iv.start.date();
        let last = (iv.end - Duration::seconds(1)).date();
        while day <= last {
            let midnight = day.and_time(NaiveTime::MIN);
            let weekday = day.weekday().num_days_from_monday() as usize;
            for &(from, to) in &self.days[weekday] {
                let range = Interval::new(
                    midnight + Duration::seconds(from as i64),
                    midnight + Duration::seconds(to as i64),
                );
                total += range.overlap_seconds(iv);
            }
            match day.succ_opt() {
                Some(next) => day = next,
                None => break,
            }
        }
        total
    }

    /// Whether a date falls into a working range of its weekday.
    pub fn is_on_shift(&self, date: NaiveDateTime) -> bool {
        let weekday = date.weekday().num_days_from_monday() as usize;
        let secs = date.num_seconds_from_midnight();
        self.days[weekday]
            .iter()
            .any(|&(from, to)| secs >= from && secs < to)
    }
}

/// Working hours plus vacations.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Calendar {
    /// `None` falls back to the enclosing calendar's working hours.
    pub working_hours: Option<WorkingHours>,
    pub vacations: Vec<Interval>,
}

impl Calendar {
    pub fn new(working_hours: WorkingHours) -> Self {
        Self {
            working_hours: Some(working_hours),
            vacations: Vec::new(),
        }
    }

    pub fn add_vacation(&mut self, vacation: Interval) {
        self.vacations.push(vacation);
    }

    pub fn on_vacation(&self, iv: &Interval) -> bool {
        self.vacations.iter().any(|v| v.overlaps(iv))
    }

    /// Working seconds in `iv`, using `fallback` hours if none are set here.
    /// Any overlap with a vacation makes the whole interval non-working.
    pub fn working_seconds(&self, iv: &Interval, fallback: &WorkingHours) -> i64 {
        if self.on_vacation(iv) {
            return 0;
        }
        self.working_hours
            .as_ref()
            .unwrap_or(fallback)
            .working_seconds(iv)
    }

    pub fn is_working_time(&self, iv: &Interval, fallback: &WorkingHours) -> bool {
        self.working_seconds(iv, fallback) > 0
    }
}

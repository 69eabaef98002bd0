//! Discrete timeline over the project window.
//!
//! The scoreboard maps absolute dates onto fixed-size slots of `granularity`
//! seconds counted from the project start. Index `size()` denotes the project
//! end itself, so valid indices lie in `[0, size()]`.

use chrono::{Duration, NaiveDateTime};

use crate::error::ScheduleError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Scoreboard {
    start: NaiveDateTime,
    end: NaiveDateTime,
    granularity: i64,
    size: usize,
}

impl Scoreboard {
    pub fn new(
        start: NaiveDateTime,
        end: NaiveDateTime,
        granularity: i64,
    ) -> Result<Self, ScheduleError> {
        if granularity <= 0 {
            return Err(ScheduleError::Configuration(format!(
                "schedule granularity must be positive, got {}",
                granularity
            )));
        }
        if end <= start {
            return Err(ScheduleError::Configuration(format!(
                "project end {} must be after project start {}",
                end, start
            )));
        }
        let size = ((end - start).num_seconds() / granularity) as usize;
        Ok(Self {
            start,
            end,
            granularity,
            size,
        })
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn granularity(&self) -> i64 {
        self.granularity
    }

    #[inline]
    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    #[inline]
    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    /// Whether a slot starting at `date` lies inside the `[start, end)` window.
    #[inline]
    pub fn contains_slot(&self, date: NaiveDateTime) -> bool {
        date >= self.start && date < self.end
    }

    /// Convert a date to its slot index. Dates outside the project fail.
    pub fn to_index(&self, date: NaiveDateTime) -> Result<usize, ScheduleError> {
        if date < self.start || date > self.end {
            return Err(ScheduleError::OutOfRange {
                date,
                start: self.start,
                end: self.end,
            });
        }
        Ok(self.offset(date))
    }

    /// Convert a date to its slot index, forcing it into the project window.
    pub fn to_index_clamped(&self, date: NaiveDateTime) -> usize {
        if date < self.start {
            0
        } else if date > self.end {
            self.size
        } else {
            self.offset(date)
        }
    }

    pub fn to_date(&self, idx: usize) -> Result<NaiveDateTime, ScheduleError> {
        if idx > self.size {
            return Err(ScheduleError::Configuration(format!(
                "scoreboard index {} out of range (size {})",
                idx, self.size
            )));
        }
        Ok(self.start + Duration::seconds(idx as i64 * self.granularity))
    }

    /// Truncate a date onto the slot grid. Works outside the project window.
    pub fn align(&self, date: NaiveDateTime) -> NaiveDateTime {
        let secs = (date - self.start).num_seconds();
        self.start + Duration::seconds(secs.div_euclid(self.granularity) * self.granularity)
    }

    /// Round a date up onto the slot grid.
    pub fn align_up(&self, date: NaiveDateTime) -> NaiveDateTime {
        let aligned = self.align(date);
        if aligned < date {
            aligned + Duration::seconds(self.granularity)
        } else {
            aligned
        }
    }

    fn offset(&self, date: NaiveDateTime) -> usize {
        ((date - self.start).num_seconds() / self.granularity).min(self.size as i64) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(year: i32, month: u32, day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn january() -> Scoreboard {
        Scoreboard::new(d(2024, 1, 1), d(2024, 2, 1), 86400).unwrap()
    }

    #[test]
    fn test_size_truncates() {
        assert_eq!(january().size(), 31);

        let hourly = Scoreboard::new(
            d(2024, 1, 1),
            d(2024, 1, 1) + Duration::minutes(150),
            3600,
        )
        .unwrap();
        assert_eq!(hourly.size(), 2);
    }

    #[test]
    fn test_round_trip() {
        let sb = january();
        let idx = sb.to_index(d(2024, 1, 15)).unwrap();
        assert_eq!(idx, 14);
        assert_eq!(sb.to_date(idx).unwrap(), d(2024, 1, 15));
        assert_eq!(sb.to_index(d(2024, 2, 1)).unwrap(), 31);
    }

    #[test]
    fn test_out_of_range_fails() {
        let sb = january();
        assert!(matches!(
            sb.to_index(d(2023, 12, 31)),
            Err(ScheduleError::OutOfRange { .. })
        ));
        assert!(sb.to_index(d(2024, 2, 2)).is_err());
        assert!(sb.to_date(32).is_err());
    }

    #[test]
    fn test_clamped() {
        let sb = january();
        assert_eq!(sb.to_index_clamped(d(2023, 6, 1)), 0);
        assert_eq!(sb.to_index_clamped(d(2025, 1, 1)), 31);
        assert_eq!(sb.to_index_clamped(d(2024, 1, 3)), 2);
    }

    #[test]
    fn test_align_and_contains() {
        let sb = january();
        let noon = d(2024, 1, 10) + Duration::hours(12);
        assert_eq!(sb.align(noon), d(2024, 1, 10));
        assert_eq!(sb.align(d(2023, 12, 31) + Duration::hours(1)), d(2023, 12, 31));
        assert_eq!(sb.align_up(noon), d(2024, 1, 11));
        assert_eq!(sb.align_up(d(2024, 1, 10)), d(2024, 1, 10));
        assert!(sb.contains_slot(d(2024, 1, 31)));
        assert!(!sb.contains_slot(d(2024, 2, 1)));
    }

    #[test]
    fn test_invalid_configuration() {
        assert!(Scoreboard::new(d(2024, 1, 1), d(2024, 1, 1), 3600).is_err());
        assert!(Scoreboard::new(d(2024, 1, 1), d(2024, 2, 1), 0).is_err());
    }
}

use crate::error::{ScheduleError, ScheduleResult};
use chrono::{NaiveDate, TimeDelta};
use std::fmt;

/// An inclusive run of calendar days, `start..=end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> ScheduleResult<Self> {
        if start > end {
            return Err(ScheduleError::start_after_end(start, end));
        }
        Ok(Self { start, end })
    }

    pub fn single(day: NaiveDate) -> Self {
        Self {
            start: day,
            end: day,
        }
    }

    /// Range of `days` days beginning on `start`.
    ///
    /// Returns `None` for `days < 1` or when the last day falls outside the
    /// representable calendar.
    pub fn with_duration(start: NaiveDate, days: i64) -> Option<Self> {
        if days < 1 {
            return None;
        }
        let end = start.checked_add_signed(TimeDelta::try_days(days - 1)?)?;
        Some(Self { start, end })
    }

    pub(crate) fn spanning(start: NaiveDate, end: NaiveDate) -> Self {
        debug_assert!(start <= end, "spanning called with {start} > {end}");
        Self { start, end }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of days covered, always at least 1.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }

    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// True when the two ranges touch end-to-start without sharing a day.
    pub fn abuts(&self, other: &DateRange) -> bool {
        self.end.succ_opt() == Some(other.start) || other.end.succ_opt() == Some(self.start)
    }

    /// First day after the range, `None` at the end of the calendar.
    pub fn following_day(&self) -> Option<NaiveDate> {
        self.end.succ_opt()
    }

    pub fn iter_days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |day| *day <= end)
    }

    /// Human-readable form used by table rows, e.g. `01 Aug 2025 - 04 Aug 2025`.
    pub fn format_range(&self) -> String {
        if self.start == self.end {
            self.start.format("%d %b %Y").to_string()
        } else {
            format!(
                "{} - {}",
                self.start.format("%d %b %Y"),
                self.end.format("%d %b %Y")
            )
        }
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

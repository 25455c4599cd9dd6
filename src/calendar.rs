use crate::interval::DateRange;
use chrono::NaiveDate;

/// Day-availability view used while placing study items.
///
/// A day is unavailable when it falls inside a break window.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StudyCalendar {
    breaks: Vec<DateRange>,
}

/// Returned when a break window collides with one already on the calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakOverlap {
    pub existing: DateRange,
    pub requested: DateRange,
}

impl StudyCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_breaks<I>(windows: I) -> Result<Self, BreakOverlap>
    where
        I: IntoIterator<Item = DateRange>,
    {
        let mut calendar = Self::new();
        for window in windows {
            calendar.add_break(window)?;
        }
        Ok(calendar)
    }

    /// Add a break window; breaks are kept sorted and must never overlap.
    pub fn add_break(&mut self, window: DateRange) -> Result<(), BreakOverlap> {
        if let Some(existing) = self.breaks.iter().find(|b| b.overlaps(&window)) {
            return Err(BreakOverlap {
                existing: *existing,
                requested: window,
            });
        }
        let idx = self.breaks.partition_point(|b| b.start() < window.start());
        self.breaks.insert(idx, window);
        Ok(())
    }

    pub fn breaks(&self) -> &[DateRange] {
        &self.breaks
    }

    /// Break window covering `date`, if any.
    pub fn break_containing(&self, date: NaiveDate) -> Option<DateRange> {
        let idx = self.breaks.partition_point(|b| b.end() < date);
        self.breaks
            .get(idx)
            .copied()
            .filter(|window| window.contains(date))
    }

    pub fn is_break(&self, date: NaiveDate) -> bool {
        self.break_containing(date).is_some()
    }

    /// Check if a date is free for a study day
    pub fn is_available(&self, date: NaiveDate) -> bool {
        !self.is_break(date)
    }

    /// First available day on or after `from`, `None` past the end of the calendar.
    fn first_available(&self, from: NaiveDate) -> Option<NaiveDate> {
        let mut current = from;
        while let Some(window) = self.break_containing(current) {
            current = window.following_day()?;
        }
        Some(current)
    }

    /// Find the next available date after a given date
    pub fn next_available(&self, from: NaiveDate) -> Option<NaiveDate> {
        self.first_available(from.succ_opt()?)
    }

    /// Count available days in a date range
    pub fn count_available_days(&self, range: DateRange) -> i64 {
        range.iter_days().filter(|day| self.is_available(*day)).count() as i64
    }

    /// Consume `days` available days starting at `from` (inclusive).
    ///
    /// Returns the maximal contiguous runs that were consumed, in order. A new
    /// run starts whenever a break interrupts the walk. Returns `None` when the
    /// calendar ends before `days` free days were found.
    pub fn take_days(&self, from: NaiveDate, days: i64) -> Option<Vec<DateRange>> {
        let mut runs = Vec::new();
        let mut remaining = days;
        let mut cursor = from;

        while remaining > 0 {
            let start = self.first_available(cursor)?;
            // Free days run up to the next break or the end of the calendar.
            let free_until = self
                .breaks
                .get(self.breaks.partition_point(|b| b.end() < start))
                .and_then(|window| window.start().pred_opt())
                .unwrap_or(NaiveDate::MAX);
            let free = DateRange::spanning(start, free_until).days();
            let taken = free.min(remaining);
            let run = DateRange::with_duration(start, taken)?;
            runs.push(run);
            remaining -= taken;
            if remaining > 0 {
                cursor = run.following_day()?;
            }
        }
        Some(runs)
    }
}

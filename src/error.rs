use crate::interval::DateRange;
use crate::item::ItemId;
use chrono::NaiveDate;
use std::fmt;

/// Why a caller-supplied range or duration was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeViolation {
    StartAfterEnd {
        start: NaiveDate,
        end: NaiveDate,
    },
    NonPositiveDuration {
        id: ItemId,
        duration_days: i64,
    },
    DurationTooLong {
        id: ItemId,
        duration_days: i64,
        max_days: i64,
    },
    /// The calendar runs out of dates before the item fits.
    BeyondCalendar {
        id: ItemId,
    },
    OverlappingBreaks {
        existing: DateRange,
        requested: DateRange,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    InvalidRange(RangeViolation),
    NotFound(ItemId),
    InvalidId(ItemId),
}

impl ScheduleError {
    pub fn is_invalid_range(&self) -> bool {
        matches!(self, ScheduleError::InvalidRange(_))
    }

    pub(crate) fn start_after_end(start: NaiveDate, end: NaiveDate) -> Self {
        ScheduleError::InvalidRange(RangeViolation::StartAfterEnd { start, end })
    }
}

impl fmt::Display for RangeViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeViolation::StartAfterEnd { start, end } => {
                write!(f, "start date {start} must be on or before end date {end}")
            }
            RangeViolation::NonPositiveDuration { id, duration_days } => write!(
                f,
                "item {id} has duration {duration_days} (must be at least 1 day)"
            ),
            RangeViolation::DurationTooLong {
                id,
                duration_days,
                max_days,
            } => write!(
                f,
                "item {id} has duration {duration_days} (must be at most {max_days} days)"
            ),
            RangeViolation::BeyondCalendar { id } => {
                write!(f, "item {id} does not fit before the last representable date")
            }
            RangeViolation::OverlappingBreaks {
                existing,
                requested,
            } => write!(f, "break {requested} overlaps existing break {existing}"),
        }
    }
}

impl fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleError::InvalidRange(violation) => write!(f, "invalid range: {violation}"),
            ScheduleError::NotFound(id) => write!(f, "item {id} not found"),
            ScheduleError::InvalidId(id) => {
                write!(f, "item id {id} is repeated or does not name a logical item")
            }
        }
    }
}

impl std::error::Error for ScheduleError {}

impl From<RangeViolation> for ScheduleError {
    fn from(value: RangeViolation) -> Self {
        ScheduleError::InvalidRange(value)
    }
}

pub type ScheduleResult<T> = Result<T, ScheduleError>;

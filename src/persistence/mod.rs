use crate::error::ScheduleError;
use crate::interval::DateRange;
use crate::item::{ItemId, ItemKind, PlanItem, split_part_label};
use crate::record::ItemRecord;
use crate::Schedule;
use serde_json::Error as SerdeJsonError;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::io;

#[derive(Debug)]
pub enum PersistenceError {
    Serialization(SerdeJsonError),
    Io(io::Error),
    #[cfg(feature = "sqlite")]
    Sqlite(rusqlite::Error),
    Csv(csv::Error),
    Schedule(ScheduleError),
    InvalidData(String),
}

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistenceError::Serialization(err) => write!(f, "serialization error: {err}"),
            PersistenceError::Io(err) => write!(f, "io error: {err}"),
            #[cfg(feature = "sqlite")]
            PersistenceError::Sqlite(err) => write!(f, "sqlite error: {err}"),
            PersistenceError::Csv(err) => write!(f, "csv error: {err}"),
            PersistenceError::Schedule(err) => write!(f, "stored schedule rejected: {err}"),
            PersistenceError::InvalidData(msg) => write!(f, "invalid data: {msg}"),
        }
    }
}

impl std::error::Error for PersistenceError {}

impl From<SerdeJsonError> for PersistenceError {
    fn from(value: SerdeJsonError) -> Self {
        Self::Serialization(value)
    }
}

impl From<io::Error> for PersistenceError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for PersistenceError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

impl From<csv::Error> for PersistenceError {
    fn from(value: csv::Error) -> Self {
        Self::Csv(value)
    }
}

impl From<ScheduleError> for PersistenceError {
    fn from(value: ScheduleError) -> Self {
        Self::Schedule(value)
    }
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

pub trait ScheduleStore {
    fn save_schedule(&self, schedule: &Schedule) -> PersistenceResult<()>;
    fn load_schedule(&self) -> PersistenceResult<Option<Schedule>>;
}

pub fn validate_records(records: &[ItemRecord]) -> PersistenceResult<()> {
    let mut seen_ids = HashSet::with_capacity(records.len());
    for record in records {
        if !seen_ids.insert(record.id) {
            return Err(PersistenceError::InvalidData(format!(
                "duplicate item id {}",
                record.id
            )));
        }
        if record.start > record.end {
            return Err(PersistenceError::InvalidData(format!(
                "item {} starts {} after it ends {}",
                record.id, record.start, record.end
            )));
        }
        if !record.origin_id.is_origin() || record.id.origin() != record.origin_id {
            return Err(PersistenceError::InvalidData(format!(
                "item {} has mismatched origin id {}",
                record.id, record.origin_id
            )));
        }
    }
    Ok(())
}

/// Rebuild the plan behind a list of stored records.
///
/// Records are walked in chronological order, which reproduces the study
/// priority order. Each stored study part becomes one plan segment with the
/// part suffix stripped from its label; a part flagged `pinned` keeps its
/// start as the segment's floor. The rebuild folds touching segments back
/// into one.
pub fn plan_from_records(records: &[ItemRecord]) -> PersistenceResult<Vec<PlanItem>> {
    validate_records(records)?;

    let mut sorted: Vec<&ItemRecord> = records.iter().collect();
    sorted.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.id.cmp(&b.id)));

    let mut kinds: HashMap<ItemId, ItemKind> = HashMap::new();
    let mut plan = Vec::with_capacity(sorted.len());
    for record in sorted {
        let origin = record.origin_id;
        match kinds.insert(origin, record.kind) {
            Some(kind) if kind != record.kind => {
                return Err(PersistenceError::InvalidData(format!(
                    "item {origin} mixes study and break parts"
                )));
            }
            Some(ItemKind::Break) => {
                return Err(PersistenceError::InvalidData(format!(
                    "break {origin} is stored in more than one part"
                )));
            }
            _ => {}
        }

        let (label, _) = split_part_label(&record.label);
        let window = DateRange::new(record.start, record.end)?;
        let item = match record.kind {
            ItemKind::Break => PlanItem::break_window(origin, label, window),
            ItemKind::Study if record.pinned => PlanItem::pinned_study(origin, label, window),
            ItemKind::Study => PlanItem::study(origin, label, window.days()),
        };
        plan.push(item.with_note(record.note.clone()));
    }
    Ok(plan)
}

pub mod file;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use file::{
    JsonDocumentStore, load_schedule_from_csv, load_schedule_from_json, save_schedule_to_csv,
    save_schedule_to_json,
};

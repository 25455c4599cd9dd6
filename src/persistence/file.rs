use super::{PersistenceError, PersistenceResult, ScheduleStore};
use crate::Schedule;
use crate::item::{ItemId, ItemKind};
use crate::record::ItemRecord;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs::{self, File};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Key of the planner section inside the shared data document.
pub const SHEET_KEY: &str = "dsa_sheet";

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetSnapshot {
    base_date: NaiveDate,
    items: Vec<ItemRecord>,
}

impl SheetSnapshot {
    fn from_schedule(schedule: &Schedule) -> Self {
        Self {
            base_date: schedule.base_date(),
            items: schedule.to_records(),
        }
    }

    fn into_schedule(self) -> PersistenceResult<Schedule> {
        let plan = super::plan_from_records(&self.items)?;
        Ok(Schedule::rebuild(plan, self.base_date)?)
    }
}

fn read_document(path: &Path) -> PersistenceResult<Option<Map<String, Value>>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    match serde_json::from_slice::<Value>(&bytes)? {
        Value::Object(map) => Ok(Some(map)),
        other => Err(PersistenceError::InvalidData(format!(
            "data document must be a JSON object, found {}",
            json_type_name(&other)
        ))),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Write the planner section of the JSON document at `path`.
///
/// Other top-level keys already in the document are kept as they are.
pub fn save_schedule_to_json<P: AsRef<Path>>(
    schedule: &Schedule,
    path: P,
) -> PersistenceResult<()> {
    let path = path.as_ref();
    let mut document = read_document(path)?.unwrap_or_default();
    let snapshot = serde_json::to_value(SheetSnapshot::from_schedule(schedule))?;
    document.insert(SHEET_KEY.to_string(), snapshot);
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, &Value::Object(document))?;
    debug!(path = %path.display(), items = schedule.len(), "saved schedule to json");
    Ok(())
}

/// Load the planner section of the JSON document at `path`.
///
/// Returns `Ok(None)` when the file or the section does not exist yet.
pub fn load_schedule_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<Option<Schedule>> {
    let path = path.as_ref();
    let Some(mut document) = read_document(path)? else {
        debug!(path = %path.display(), "no data document yet");
        return Ok(None);
    };
    let Some(section) = document.remove(SHEET_KEY) else {
        return Ok(None);
    };
    if !section.is_object() {
        warn!(path = %path.display(), "planner section has a legacy shape");
        return Err(PersistenceError::InvalidData(format!(
            "'{SHEET_KEY}' must be an object with baseDate and items, found {}",
            json_type_name(&section)
        )));
    }
    let snapshot: SheetSnapshot = serde_json::from_value(section)?;
    let schedule = snapshot.into_schedule()?;
    debug!(path = %path.display(), items = schedule.len(), "loaded schedule from json");
    Ok(Some(schedule))
}

/// [`ScheduleStore`] backed by the planner section of a JSON data document.
#[derive(Debug, Clone)]
pub struct JsonDocumentStore {
    path: PathBuf,
}

impl JsonDocumentStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ScheduleStore for JsonDocumentStore {
    fn save_schedule(&self, schedule: &Schedule) -> PersistenceResult<()> {
        save_schedule_to_json(schedule, &self.path)
    }

    fn load_schedule(&self) -> PersistenceResult<Option<Schedule>> {
        load_schedule_from_json(&self.path)
    }
}

#[derive(Default, Serialize, Deserialize)]
struct ItemCsvRecord {
    sequence: String,
    id: String,
    origin_id: String,
    kind: String,
    label: String,
    note: String,
    start: String,
    end: String,
    duration_days: String,
    pinned: String,
    #[serde(default)]
    base_date: String,
}

impl ItemCsvRecord {
    fn metadata_row(schedule: &Schedule) -> Self {
        Self {
            label: "__metadata__".to_string(),
            base_date: format_date(schedule.base_date()),
            ..Self::default()
        }
    }

    fn is_metadata_row(&self) -> bool {
        !self.base_date.trim().is_empty()
    }

    fn from_record(sequence: usize, record: &ItemRecord) -> Self {
        Self {
            sequence: sequence.to_string(),
            id: record.id.to_string(),
            origin_id: record.origin_id.to_string(),
            kind: record.kind.to_string(),
            label: record.label.clone(),
            note: record.note.clone(),
            start: format_date(record.start),
            end: format_date(record.end),
            duration_days: ((record.end - record.start).num_days() + 1).to_string(),
            pinned: record.pinned.to_string(),
            base_date: String::new(),
        }
    }

    fn into_record(self) -> PersistenceResult<ItemRecord> {
        Ok(ItemRecord {
            id: parse_id(&self.id)?,
            kind: self
                .kind
                .parse::<ItemKind>()
                .map_err(PersistenceError::InvalidData)?,
            label: self.label,
            note: self.note,
            origin_id: parse_id(&self.origin_id)?,
            start: parse_date(&self.start)?,
            end: parse_date(&self.end)?,
            pinned: parse_bool(&self.pinned)?,
        })
    }
}

pub fn save_schedule_to_csv<P: AsRef<Path>>(schedule: &Schedule, path: P) -> PersistenceResult<()> {
    let path = path.as_ref();
    let file = File::create(path)?;
    let mut writer = csv::Writer::from_writer(file);
    writer.serialize(ItemCsvRecord::metadata_row(schedule))?;
    for (item, record) in schedule.items().iter().zip(schedule.to_records()) {
        writer.serialize(ItemCsvRecord::from_record(item.sequence, &record))?;
    }
    writer.flush()?;
    debug!(path = %path.display(), items = schedule.len(), "exported schedule to csv");
    Ok(())
}

/// Load a schedule exported by [`save_schedule_to_csv`].
///
/// Without a metadata row the base date falls back to
/// [`Schedule::default_base_date`] with `today`.
pub fn load_schedule_from_csv<P: AsRef<Path>>(
    path: P,
    today: NaiveDate,
) -> PersistenceResult<Schedule> {
    let file = File::open(path)?;
    let mut reader = csv::Reader::from_reader(file);
    let mut records = Vec::new();
    let mut base_date: Option<NaiveDate> = None;
    for row in reader.deserialize::<ItemCsvRecord>() {
        let row = row?;
        if row.is_metadata_row() {
            if base_date.is_some() {
                return Err(PersistenceError::InvalidData(
                    "CSV file contained multiple metadata rows".into(),
                ));
            }
            base_date = Some(parse_date(&row.base_date)?);
            continue;
        }
        records.push(row.into_record()?);
    }

    let plan = super::plan_from_records(&records)?;
    let base_date = base_date.unwrap_or_else(|| Schedule::default_base_date(&plan, today));
    Ok(Schedule::rebuild(plan, base_date)?)
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn parse_date(input: &str) -> PersistenceResult<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|e| PersistenceError::InvalidData(format!("invalid date '{input}': {e}")))
}

fn parse_id(input: &str) -> PersistenceResult<ItemId> {
    input
        .parse::<ItemId>()
        .map_err(|e| PersistenceError::InvalidData(e.to_string()))
}

fn parse_bool(input: &str) -> PersistenceResult<bool> {
    match input.trim().to_ascii_lowercase().as_str() {
        "" | "false" => Ok(false),
        "true" => Ok(true),
        other => Err(PersistenceError::InvalidData(format!(
            "invalid boolean '{other}'"
        ))),
    }
}

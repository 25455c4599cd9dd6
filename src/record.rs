use crate::item::{ItemId, ItemKind, WorkItem};
use chrono::NaiveDate;
use polars::prelude::PlSmallStr;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Storage shape of one scheduled item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRecord {
    pub id: ItemId,
    pub kind: ItemKind,
    pub label: String,
    #[serde(default)]
    pub note: String,
    pub origin_id: ItemId,
    pub start: NaiveDate,
    pub end: NaiveDate,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub pinned: bool,
}

impl From<&WorkItem> for ItemRecord {
    fn from(item: &WorkItem) -> Self {
        Self {
            id: item.id,
            kind: item.kind,
            label: item.label.clone(),
            note: item.note.clone(),
            origin_id: item.origin_id,
            start: item.start,
            end: item.end,
            pinned: item.pinned,
        }
    }
}

/// One table row as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRow {
    pub sequence: usize,
    pub kind: ItemKind,
    pub label: String,
    pub duration_days: i64,
    pub formatted_range: String,
    pub note: String,
    pub id: ItemId,
}

impl From<&WorkItem> for ItemRow {
    fn from(item: &WorkItem) -> Self {
        Self {
            sequence: item.sequence,
            kind: item.kind,
            label: item.label.clone(),
            duration_days: item.duration_days(),
            formatted_range: item.formatted_range(),
            note: item.note.clone(),
            id: item.id,
        }
    }
}

/// Column layout of [`items_to_dataframe`].
pub const ROW_COLUMNS: [&str; 9] = [
    "sequence",
    "id",
    "kind",
    "label",
    "duration_days",
    "range",
    "start",
    "end",
    "note",
];

pub fn items_to_dataframe(items: &[WorkItem]) -> PolarsResult<DataFrame> {
    let mut columns: Vec<Column> = Vec::with_capacity(ROW_COLUMNS.len());

    let sequence: Vec<i64> = items.iter().map(|i| i.sequence as i64).collect();
    columns.push(Series::new(PlSmallStr::from_static("sequence"), sequence).into_column());

    let ids: Vec<String> = items.iter().map(|i| i.id.to_string()).collect();
    columns.push(Series::new(PlSmallStr::from_static("id"), ids).into_column());

    let kinds: Vec<&str> = items.iter().map(|i| i.kind.as_str()).collect();
    columns.push(Series::new(PlSmallStr::from_static("kind"), kinds).into_column());

    let labels: Vec<&str> = items.iter().map(|i| i.label.as_str()).collect();
    columns.push(Series::new(PlSmallStr::from_static("label"), labels).into_column());

    let durations: Vec<i64> = items.iter().map(WorkItem::duration_days).collect();
    columns.push(Series::new(PlSmallStr::from_static("duration_days"), durations).into_column());

    let ranges: Vec<String> = items.iter().map(WorkItem::formatted_range).collect();
    columns.push(Series::new(PlSmallStr::from_static("range"), ranges).into_column());

    columns.push(series_from_dates("start", items.iter().map(|i| i.start))?.into_column());
    columns.push(series_from_dates("end", items.iter().map(|i| i.end))?.into_column());

    let notes: Vec<&str> = items.iter().map(|i| i.note.as_str()).collect();
    columns.push(Series::new(PlSmallStr::from_static("note"), notes).into_column());

    DataFrame::new(columns)
}

fn series_from_dates<I>(name: &'static str, dates: I) -> PolarsResult<Series>
where
    I: Iterator<Item = NaiveDate>,
{
    let data: Vec<i32> = dates.map(date_to_i32).collect();
    Series::new(PlSmallStr::from_static(name), data).cast(&DataType::Date)
}

pub fn date_to_i32(date: NaiveDate) -> i32 {
    (date - unix_epoch()).num_days() as i32
}

pub fn date_from_i32(days: i32) -> NaiveDate {
    unix_epoch() + chrono::Duration::days(days as i64)
}

fn unix_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default()
}

use crate::interval::DateRange;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a scheduled item.
///
/// `origin` names the logical item; `part` is the 1-based part ordinal. The
/// first part shares its id with the logical item, later parts render as
/// `"<origin>-<part>"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ItemId {
    origin: u32,
    part: u32,
}

impl ItemId {
    pub fn new(origin: u32) -> Self {
        Self { origin, part: 1 }
    }

    pub(crate) fn with_part(self, part: u32) -> Self {
        Self {
            origin: self.origin,
            part,
        }
    }

    /// Id of the logical item this id belongs to.
    pub fn origin(self) -> Self {
        Self::new(self.origin)
    }

    pub fn number(self) -> u32 {
        self.origin
    }

    pub fn part(self) -> u32 {
        self.part
    }

    pub fn is_origin(self) -> bool {
        self.part == 1
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.part == 1 {
            write!(f, "{}", self.origin)
        } else {
            write!(f, "{}-{}", self.origin, self.part)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseItemIdError(String);

impl fmt::Display for ParseItemIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid item id '{}'", self.0)
    }
}

impl std::error::Error for ParseItemIdError {}

impl FromStr for ItemId {
    type Err = ParseItemIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let invalid = || ParseItemIdError(trimmed.to_string());
        let (origin, part) = match trimmed.split_once('-') {
            Some((origin, part)) => (origin, part.parse::<u32>().map_err(|_| invalid())?),
            None => (trimmed, 1),
        };
        let origin = origin.parse::<u32>().map_err(|_| invalid())?;
        if part == 0 {
            return Err(invalid());
        }
        Ok(Self { origin, part })
    }
}

impl TryFrom<String> for ItemId {
    type Error = ParseItemIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ItemId> for String {
    fn from(value: ItemId) -> Self {
        value.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Study,
    Break,
}

impl ItemKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ItemKind::Study => "study",
            ItemKind::Break => "break",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "study" => Ok(ItemKind::Study),
            "break" => Ok(ItemKind::Break),
            other => Err(format!("unknown item kind '{other}'")),
        }
    }
}

/// How a plan entry gets its days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Study laid out on the next free days, in priority order.
    Flowing { days: i64 },
    /// Study laid out in priority order but never before `start`.
    Pinned { start: NaiveDate, days: i64 },
    /// Break occupying exactly this window.
    Fixed(DateRange),
}

/// One entry of the plan supplied to [`Schedule::rebuild`](crate::Schedule::rebuild).
///
/// A study may be listed as several segments sharing an id and label; its
/// duration is the sum of the segments. A study inserted into the middle of
/// another one leaves the displaced study as two segments around it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanItem {
    pub id: ItemId,
    pub label: String,
    pub note: String,
    pub placement: Placement,
}

impl PlanItem {
    pub fn study(id: ItemId, label: impl Into<String>, days: i64) -> Self {
        Self {
            id,
            label: label.into(),
            note: String::new(),
            placement: Placement::Flowing { days },
        }
    }

    pub fn pinned_study(id: ItemId, label: impl Into<String>, window: DateRange) -> Self {
        Self {
            id,
            label: label.into(),
            note: String::new(),
            placement: Placement::Pinned {
                start: window.start(),
                days: window.days(),
            },
        }
    }

    pub fn break_window(id: ItemId, label: impl Into<String>, window: DateRange) -> Self {
        Self {
            id,
            label: label.into(),
            note: String::new(),
            placement: Placement::Fixed(window),
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }

    pub fn kind(&self) -> ItemKind {
        match self.placement {
            Placement::Fixed(_) => ItemKind::Break,
            Placement::Flowing { .. } | Placement::Pinned { .. } => ItemKind::Study,
        }
    }

    pub fn duration_days(&self) -> i64 {
        match self.placement {
            Placement::Flowing { days } | Placement::Pinned { days, .. } => days,
            Placement::Fixed(window) => window.days(),
        }
    }

    pub fn is_pinned(&self) -> bool {
        matches!(self.placement, Placement::Pinned { .. })
    }

    /// The same study segment without its start floor. Breaks are unchanged.
    pub fn unpinned(&self) -> Self {
        let mut item = self.clone();
        if let Placement::Pinned { days, .. } = item.placement {
            item.placement = Placement::Flowing { days };
        }
        item
    }

    pub(crate) fn with_days(&self, days: i64) -> Self {
        let mut item = self.clone();
        item.placement = match item.placement {
            Placement::Flowing { .. } => Placement::Flowing { days },
            Placement::Pinned { start, .. } => Placement::Pinned { start, days },
            fixed @ Placement::Fixed(_) => fixed,
        };
        item
    }

    /// Cut a study segment after `head_days` days. The tail always flows.
    pub(crate) fn split_study(&self, head_days: i64) -> Option<(Self, Self)> {
        let total = match self.placement {
            Placement::Flowing { days } | Placement::Pinned { days, .. } => days,
            Placement::Fixed(_) => return None,
        };
        if head_days < 1 || head_days >= total {
            return None;
        }
        let tail = self.unpinned().with_days(total - head_days);
        Some((self.with_days(head_days), tail))
    }
}

/// One placed run of days: a whole item, or one part of a split study.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkItem {
    pub id: ItemId,
    pub origin_id: ItemId,
    pub kind: ItemKind,
    pub label: String,
    pub note: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub sequence: usize,
    #[serde(default)]
    pub pinned: bool,
}

impl WorkItem {
    pub fn range(&self) -> DateRange {
        DateRange::spanning(self.start, self.end)
    }

    pub fn duration_days(&self) -> i64 {
        self.range().days()
    }

    pub fn formatted_range(&self) -> String {
        self.range().format_range()
    }
}

pub(crate) fn part_label(base: &str, part: usize, total: usize) -> String {
    format!("{base} (part {part} of {total})")
}

/// Split a display label into its base text and `(part, total)` suffix.
pub fn split_part_label(label: &str) -> (&str, Option<(u32, u32)>) {
    let Some(body) = label.strip_suffix(')') else {
        return (label, None);
    };
    let Some(idx) = body.rfind(" (part ") else {
        return (label, None);
    };
    let suffix = &body[idx + " (part ".len()..];
    let parsed = suffix
        .split_once(" of ")
        .and_then(|(k, n)| Some((k.parse::<u32>().ok()?, n.parse::<u32>().ok()?)));
    match parsed {
        Some((k, n)) if k >= 1 && k <= n => (&label[..idx], Some((k, n))),
        _ => (label, None),
    }
}

use crate::calculations::{PlacementPass, coalesce_segments};
use crate::error::{RangeViolation, ScheduleError, ScheduleResult};
use crate::interval::DateRange;
use crate::item::{ItemId, ItemKind, Placement, PlanItem, WorkItem};
use crate::record::{self, ItemRecord, ItemRow};
use crate::validation;
use chrono::NaiveDate;
use polars::prelude::{DataFrame, PolarsResult};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSummary {
    pub item_count: usize,
    pub study_count: usize,
    pub break_count: usize,
    pub split_count: usize,
    pub study_days: i64,
    pub first_day: Option<NaiveDate>,
    pub last_day: Option<NaiveDate>,
}

impl ScheduleSummary {
    pub fn to_cli_summary(&self) -> String {
        let mut parts = Vec::new();
        parts.push(format!("items={}", self.item_count));
        parts.push(format!("studies={}", self.study_count));
        parts.push(format!("breaks={}", self.break_count));
        if self.split_count > 0 {
            parts.push(format!("split={}", self.split_count));
        }
        parts.push(format!("study_days={}", self.study_days));
        if let (Some(first), Some(last)) = (self.first_day, self.last_day) {
            parts.push(format!("span={first}..{last}"));
        }
        parts.join(", ")
    }
}

/// Immutable snapshot of a laid-out study plan.
///
/// `plan` keeps the logical items with studies in priority order; `items`
/// is the placement derived from it, sorted by start date. Every mutating
/// operation returns a new `Schedule` produced by a full rebuild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    base_date: NaiveDate,
    plan: Vec<PlanItem>,
    items: Vec<WorkItem>,
}

impl Schedule {
    pub fn empty(base_date: NaiveDate) -> Self {
        Self {
            base_date,
            plan: Vec::new(),
            items: Vec::new(),
        }
    }

    /// Lay out `plan` from scratch starting at `base_date`.
    ///
    /// Adjacent flowing segments of one study are folded together first, so
    /// the stored plan is the same whichever way the segments were listed.
    pub fn rebuild(plan: Vec<PlanItem>, base_date: NaiveDate) -> ScheduleResult<Self> {
        validation::validate_plan(&plan)?;
        let plan = coalesce_segments(plan);
        let items = PlacementPass::new(&plan).execute(base_date)?;
        Ok(Self {
            base_date,
            plan,
            items,
        })
    }

    /// Earliest break start in `plan`, or `today` when there are no breaks.
    pub fn default_base_date(plan: &[PlanItem], today: NaiveDate) -> NaiveDate {
        plan.iter()
            .filter_map(|item| match item.placement {
                Placement::Fixed(window) => Some(window.start()),
                _ => None,
            })
            .min()
            .unwrap_or(today)
    }

    pub fn rebuild_from_today(plan: Vec<PlanItem>, today: NaiveDate) -> ScheduleResult<Self> {
        let base_date = Self::default_base_date(&plan, today);
        Self::rebuild(plan, base_date)
    }

    pub fn base_date(&self) -> NaiveDate {
        self.base_date
    }

    pub fn items(&self) -> &[WorkItem] {
        &self.items
    }

    pub fn plan(&self) -> &[PlanItem] {
        &self.plan
    }

    pub fn to_plan(&self) -> Vec<PlanItem> {
        self.plan.clone()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn find(&self, id: ItemId) -> Option<&WorkItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Every part of the logical item owning `id`, in chronological order.
    pub fn parts_of(&self, id: ItemId) -> Vec<&WorkItem> {
        let origin = id.origin();
        self.items
            .iter()
            .filter(|item| item.origin_id == origin)
            .collect()
    }

    fn resolve_origin(&self, id: ItemId) -> ScheduleResult<ItemId> {
        self.items
            .iter()
            .find(|item| item.id == id || item.origin_id == id)
            .map(|item| item.origin_id)
            .ok_or(ScheduleError::NotFound(id))
    }

    fn next_id(&self) -> ScheduleResult<ItemId> {
        let max = self
            .plan
            .iter()
            .map(|item| item.id.number())
            .max()
            .unwrap_or(0);
        max.checked_add(1)
            .map(ItemId::new)
            .ok_or(ScheduleError::InvalidId(ItemId::new(max)))
    }

    fn rebuild_with(&self, plan: Vec<PlanItem>) -> ScheduleResult<Self> {
        Self::rebuild(plan, self.base_date)
    }

    /// The plan with every start floor dropped, so the timeline packs again.
    fn unpinned_plan(&self) -> Vec<PlanItem> {
        self.plan.iter().map(PlanItem::unpinned).collect()
    }

    /// Add a study of `duration_days` days at the end of the priority order.
    pub fn append_study(
        &self,
        label: impl Into<String>,
        duration_days: i64,
        note: impl Into<String>,
    ) -> ScheduleResult<Self> {
        let item = PlanItem::study(self.next_id()?, label, duration_days).with_note(note);
        let mut plan = self.to_plan();
        plan.push(item);
        self.rebuild_with(plan)
    }

    /// Insert a study occupying the literal window `start..=end`.
    ///
    /// The new study enters the priority order at `start`. Study days already
    /// placed before `start` stay in front of it, and a study running across
    /// `start` is cut into two segments around it. Everything after it
    /// re-flows, so studies overlapping the window are displaced. A window
    /// starting before the base date moves the base date back to `start`.
    pub fn insert_study(
        &self,
        label: impl Into<String>,
        start: NaiveDate,
        end: NaiveDate,
        note: impl Into<String>,
    ) -> ScheduleResult<Self> {
        let window = DateRange::new(start, end)?;
        let item = PlanItem::pinned_study(self.next_id()?, label, window).with_note(note);
        validation::validate_plan_item(&item)?;

        let placed = PlacementPass::new(&self.plan).segment_runs(self.base_date)?;
        let mut plan = Vec::with_capacity(self.plan.len() + 2);
        let mut pending = Some(item);
        for (existing, runs) in self.plan.iter().zip(&placed) {
            if pending.is_some() && existing.kind() == ItemKind::Study {
                let before = days_before(runs, start);
                if let Some((head, tail)) = existing.split_study(before) {
                    plan.push(head);
                    plan.extend(pending.take());
                    plan.push(tail);
                    continue;
                }
                if before == 0 {
                    plan.extend(pending.take());
                }
            }
            plan.push(existing.clone());
        }
        plan.extend(pending);
        Self::rebuild(plan, self.base_date.min(start))
    }

    /// Add an immovable break on `start..=end`.
    pub fn insert_break(
        &self,
        label: impl Into<String>,
        start: NaiveDate,
        end: NaiveDate,
        note: impl Into<String>,
    ) -> ScheduleResult<Self> {
        let window = DateRange::new(start, end)?;
        for existing in &self.plan {
            if let Placement::Fixed(existing) = existing.placement {
                if existing.overlaps(&window) {
                    return Err(RangeViolation::OverlappingBreaks {
                        existing,
                        requested: window,
                    }
                    .into());
                }
            }
        }
        let item = PlanItem::break_window(self.next_id()?, label, window).with_note(note);
        let mut plan = self.to_plan();
        plan.push(item);
        self.rebuild_with(plan)
    }

    /// Remove the logical item owning `id` (all of its parts).
    ///
    /// Start floors are dropped so later studies close the gap.
    pub fn delete_item(&self, id: ItemId) -> ScheduleResult<Self> {
        let origin = self.resolve_origin(id)?;
        let plan = self
            .unpinned_plan()
            .into_iter()
            .filter(|item| item.id != origin)
            .collect();
        self.rebuild_with(plan)
    }

    pub fn set_note(&self, id: ItemId, note: impl Into<String>) -> ScheduleResult<Self> {
        let origin = self.resolve_origin(id)?;
        let note = note.into();
        let mut plan = self.to_plan();
        for item in plan.iter_mut().filter(|item| item.id == origin) {
            item.note = note.clone();
        }
        self.rebuild_with(plan)
    }

    /// Re-flow the whole plan from a different first day, dropping start floors.
    pub fn with_base_date(&self, base_date: NaiveDate) -> ScheduleResult<Self> {
        Self::rebuild(self.unpinned_plan(), base_date)
    }

    pub fn summary(&self) -> ScheduleSummary {
        let mut parts_per_item: HashMap<ItemId, usize> = HashMap::new();
        for item in &self.items {
            *parts_per_item.entry(item.origin_id).or_default() += 1;
        }
        let mut counted = HashSet::with_capacity(self.plan.len());
        let mut study_count = 0;
        let mut break_count = 0;
        let mut split_count = 0;
        let mut study_days = 0;
        for item in &self.plan {
            if item.kind() == ItemKind::Break {
                break_count += 1;
                continue;
            }
            study_days += item.duration_days();
            if !counted.insert(item.id) {
                continue;
            }
            study_count += 1;
            if parts_per_item.get(&item.id).copied().unwrap_or(0) > 1 {
                split_count += 1;
            }
        }

        ScheduleSummary {
            item_count: self.items.len(),
            study_count,
            break_count,
            split_count,
            study_days,
            first_day: self.items.first().map(|item| item.start),
            last_day: self.items.last().map(|item| item.end),
        }
    }

    pub fn rows(&self) -> Vec<ItemRow> {
        self.items.iter().map(ItemRow::from).collect()
    }

    pub fn to_records(&self) -> Vec<ItemRecord> {
        self.items.iter().map(ItemRecord::from).collect()
    }

    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        record::items_to_dataframe(&self.items)
    }
}

/// Study days in `runs` that fall strictly before `day`.
fn days_before(runs: &[DateRange], day: NaiveDate) -> i64 {
    runs.iter()
        .filter(|run| run.start() < day)
        .map(|run| {
            if run.end() < day {
                run.days()
            } else {
                (day - run.start()).num_days()
            }
        })
        .sum()
}

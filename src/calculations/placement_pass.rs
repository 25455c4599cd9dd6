use crate::calendar::StudyCalendar;
use crate::error::{RangeViolation, ScheduleResult};
use crate::interval::DateRange;
use crate::item::{ItemId, ItemKind, PlanItem, Placement, WorkItem, part_label};
use crate::validation;
use chrono::NaiveDate;
use std::collections::HashMap;

/// Lays a plan out on the calendar.
///
/// Breaks are registered first, then study segments consume free days from
/// `base_date` in plan order. A pinned segment never starts before its
/// floor. Runs of the same study are merged where they touch.
pub struct PlacementPass<'a> {
    plan: &'a [PlanItem],
}

/// A placed run together with whether it opens a pinned segment.
struct Run {
    range: DateRange,
    pinned: bool,
}

impl<'a> PlacementPass<'a> {
    pub fn new(plan: &'a [PlanItem]) -> Self {
        Self { plan }
    }

    /// Runs taken by each plan entry, indexed like the plan.
    pub fn segment_runs(&self, base_date: NaiveDate) -> ScheduleResult<Vec<Vec<DateRange>>> {
        validation::validate_plan(self.plan)?;

        let mut calendar = StudyCalendar::new();
        let mut runs: Vec<Vec<DateRange>> = vec![Vec::new(); self.plan.len()];

        let mut breaks: Vec<(usize, DateRange)> = self
            .plan
            .iter()
            .enumerate()
            .filter_map(|(idx, item)| match item.placement {
                Placement::Fixed(window) => Some((idx, window)),
                _ => None,
            })
            .collect();
        breaks.sort_by_key(|(idx, window)| (window.start(), *idx));
        for (idx, window) in breaks {
            calendar.add_break(window).map_err(|overlap| {
                RangeViolation::OverlappingBreaks {
                    existing: overlap.existing,
                    requested: overlap.requested,
                }
            })?;
            runs[idx].push(window);
        }

        // `None` once a run has reached the last representable date.
        let mut cursor = Some(base_date);
        for (idx, item) in self.plan.iter().enumerate() {
            let (from, days) = match item.placement {
                Placement::Fixed(_) => continue,
                Placement::Flowing { days } => (cursor, days),
                Placement::Pinned { start, days } => (cursor.map(|c| c.max(start)), days),
            };
            let taken = from
                .and_then(|from| calendar.take_days(from, days))
                .ok_or(RangeViolation::BeyondCalendar { id: item.id })?;
            if let Some(last) = taken.last() {
                cursor = last.following_day();
            }
            runs[idx] = taken;
        }
        Ok(runs)
    }

    pub fn execute(&self, base_date: NaiveDate) -> ScheduleResult<Vec<WorkItem>> {
        let segment_runs = self.segment_runs(base_date)?;

        let mut order: Vec<&PlanItem> = Vec::new();
        let mut merged: HashMap<ItemId, Vec<Run>> = HashMap::with_capacity(self.plan.len());
        for (item, ranges) in self.plan.iter().zip(segment_runs) {
            let runs = merged.entry(item.id).or_insert_with(|| {
                order.push(item);
                Vec::new()
            });
            for (k, range) in ranges.into_iter().enumerate() {
                match runs.last_mut() {
                    Some(last) if last.range.end() < range.start() && last.range.abuts(&range) => {
                        last.range = DateRange::spanning(last.range.start(), range.end());
                    }
                    _ => runs.push(Run {
                        range,
                        pinned: k == 0 && item.is_pinned(),
                    }),
                }
            }
        }

        let mut items = Vec::new();
        for item in order {
            let runs = merged.remove(&item.id).unwrap_or_default();
            let total = runs.len();
            for (k, run) in runs.into_iter().enumerate() {
                let label = if total > 1 {
                    part_label(&item.label, k + 1, total)
                } else {
                    item.label.clone()
                };
                items.push(WorkItem {
                    id: item.id.with_part(k as u32 + 1),
                    origin_id: item.id,
                    kind: item.kind(),
                    label,
                    note: item.note.clone(),
                    start: run.range.start(),
                    end: run.range.end(),
                    sequence: 0,
                    pinned: run.pinned,
                });
            }
        }

        items.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.id.cmp(&b.id)));
        for (position, item) in items.iter_mut().enumerate() {
            item.sequence = position + 1;
        }

        assert_consistent(self.plan, &items);
        Ok(items)
    }
}

/// Fold each flowing study segment into the previous segment of the same
/// study when no other study sits between them.
pub fn coalesce_segments(plan: Vec<PlanItem>) -> Vec<PlanItem> {
    let mut out: Vec<PlanItem> = Vec::with_capacity(plan.len());
    let mut last_study: Option<usize> = None;
    for item in plan {
        if let (Placement::Flowing { days }, Some(idx)) = (item.placement, last_study) {
            let prev = &mut out[idx];
            if prev.id == item.id && prev.label == item.label {
                *prev = prev.with_days(prev.duration_days() + days);
                continue;
            }
        }
        if item.kind() == ItemKind::Study {
            last_study = Some(out.len());
        }
        out.push(item);
    }
    out
}

/// Panics when the placed items break the schedule invariants.
fn assert_consistent(plan: &[PlanItem], items: &[WorkItem]) {
    for pair in items.windows(2) {
        assert!(
            pair[0].end < pair[1].start,
            "placement produced overlapping items {} ({}..{}) and {} ({}..{})",
            pair[0].id,
            pair[0].start,
            pair[0].end,
            pair[1].id,
            pair[1].start,
            pair[1].end
        );
    }

    let mut placed_days: HashMap<_, i64> = HashMap::with_capacity(plan.len());
    for item in items {
        *placed_days.entry(item.origin_id).or_default() += item.duration_days();
    }
    let mut planned_days: HashMap<_, i64> = HashMap::with_capacity(plan.len());
    for item in plan {
        *planned_days.entry(item.id).or_default() += item.duration_days();
    }
    for (id, expected) in planned_days {
        let placed = placed_days.get(&id).copied().unwrap_or(0);
        assert_eq!(
            placed, expected,
            "item {id} placed {placed} days, expected {expected}"
        );
    }
    for item in plan {
        if let Placement::Fixed(window) = item.placement {
            assert!(
                items
                    .iter()
                    .any(|w| w.origin_id == item.id && w.range() == window),
                "break {} moved from {}",
                item.id,
                window
            );
        }
    }
}

use crate::error::{RangeViolation, ScheduleError, ScheduleResult};
use crate::item::{ItemId, ItemKind, PlanItem, Placement};
use std::collections::HashMap;

/// Longest study accepted, summed over its segments (roughly 100 years).
pub const MAX_STUDY_DAYS: i64 = 36_525;

fn check_duration(id: ItemId, days: i64) -> ScheduleResult<()> {
    if days < 1 {
        return Err(RangeViolation::NonPositiveDuration {
            id,
            duration_days: days,
        }
        .into());
    }
    if days > MAX_STUDY_DAYS {
        return Err(RangeViolation::DurationTooLong {
            id,
            duration_days: days,
            max_days: MAX_STUDY_DAYS,
        }
        .into());
    }
    Ok(())
}

pub fn validate_plan_item(item: &PlanItem) -> ScheduleResult<()> {
    match item.placement {
        Placement::Flowing { days } | Placement::Pinned { days, .. } => {
            check_duration(item.id, days)
        }
        Placement::Fixed(_) => Ok(()),
    }
}

/// Ids must name logical items. Only study segments with the same label may
/// share an id.
pub fn validate_plan(plan: &[PlanItem]) -> ScheduleResult<()> {
    let mut seen: HashMap<ItemId, (&PlanItem, i64)> = HashMap::with_capacity(plan.len());
    for item in plan {
        if !item.id.is_origin() {
            return Err(ScheduleError::InvalidId(item.id));
        }
        validate_plan_item(item)?;
        match seen.get_mut(&item.id) {
            Some((first, total)) => {
                if first.kind() == ItemKind::Break
                    || item.kind() == ItemKind::Break
                    || first.label != item.label
                {
                    return Err(ScheduleError::InvalidId(item.id));
                }
                *total += item.duration_days();
                check_duration(item.id, *total)?;
            }
            None => {
                seen.insert(item.id, (item, item.duration_days()));
            }
        }
    }
    Ok(())
}

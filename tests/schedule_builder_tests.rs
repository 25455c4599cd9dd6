use chrono::NaiveDate;
use study_planner::{
    DateRange, ItemId, ItemKind, PlanItem, RangeViolation, Schedule, ScheduleError, WorkItem,
    plan_from_records,
};
use std::collections::HashMap;

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn id(raw: &str) -> ItemId {
    raw.parse().unwrap()
}

fn span(item: &WorkItem) -> (NaiveDate, NaiveDate) {
    (item.start, item.end)
}

fn by_label<'a>(schedule: &'a Schedule, label: &str) -> &'a WorkItem {
    schedule
        .items()
        .iter()
        .find(|item| item.label == label)
        .unwrap_or_else(|| panic!("no item labelled {label}"))
}

fn arrays_with_cat1() -> Schedule {
    Schedule::empty(d(2025, 8, 1))
        .append_study("Arrays", 9, "")
        .unwrap()
        .insert_break("CAT-1", d(2025, 8, 5), d(2025, 8, 7), "")
        .unwrap()
}

fn recursion_then_sorting() -> Schedule {
    Schedule::empty(d(2025, 8, 1))
        .append_study("Recursion", 6, "")
        .unwrap()
        .append_study("Sorting", 2, "")
        .unwrap()
}

fn assert_no_overlap(schedule: &Schedule) {
    for pair in schedule.items().windows(2) {
        assert!(
            pair[0].end < pair[1].start,
            "{} and {} overlap",
            pair[0].id,
            pair[1].id
        );
    }
}

fn assert_durations_conserved(schedule: &Schedule) {
    let mut placed: HashMap<ItemId, i64> = HashMap::new();
    for item in schedule.items() {
        *placed.entry(item.origin_id).or_default() += item.duration_days();
    }
    let mut planned: HashMap<ItemId, i64> = HashMap::new();
    for item in schedule.plan() {
        *planned.entry(item.id).or_default() += item.duration_days();
    }
    assert_eq!(placed, planned);
}

#[test]
fn flowing_studies_pack_from_base_date() {
    let plan = vec![
        PlanItem::study(ItemId::new(1), "LinkedList", 9),
        PlanItem::study(ItemId::new(2), "Recursion", 6),
    ];
    let schedule = Schedule::rebuild(plan, d(2025, 7, 23)).unwrap();

    assert_eq!(schedule.len(), 2);
    let linked = by_label(&schedule, "LinkedList");
    let recursion = by_label(&schedule, "Recursion");
    assert_eq!(span(linked), (d(2025, 7, 23), d(2025, 7, 31)));
    assert_eq!(span(recursion), (d(2025, 8, 1), d(2025, 8, 6)));
    assert_eq!((linked.sequence, recursion.sequence), (1, 2));
}

#[test]
fn inserted_break_splits_running_study() {
    let schedule = arrays_with_cat1();

    let first = schedule.find(id("1")).unwrap();
    let second = schedule.find(id("1-2")).unwrap();
    let cat1 = by_label(&schedule, "CAT-1");

    assert_eq!(first.label, "Arrays (part 1 of 2)");
    assert_eq!(span(first), (d(2025, 8, 1), d(2025, 8, 4)));
    assert_eq!(first.duration_days(), 4);
    assert_eq!(second.label, "Arrays (part 2 of 2)");
    assert_eq!(span(second), (d(2025, 8, 8), d(2025, 8, 12)));
    assert_eq!(second.duration_days(), 5);
    assert_eq!(cat1.kind, ItemKind::Break);
    assert_eq!(span(cat1), (d(2025, 8, 5), d(2025, 8, 7)));

    let sequences: Vec<usize> = schedule.items().iter().map(|i| i.sequence).collect();
    assert_eq!(sequences, vec![1, 2, 3]);
}

#[test]
fn deleting_break_merges_parts_again() {
    let schedule = arrays_with_cat1();
    let cat1 = by_label(&schedule, "CAT-1").id;

    let merged = schedule.delete_item(cat1).unwrap();

    assert_eq!(merged.len(), 1);
    let arrays = &merged.items()[0];
    assert_eq!(arrays.label, "Arrays");
    assert_eq!(arrays.id, ItemId::new(1));
    assert_eq!(span(arrays), (d(2025, 8, 1), d(2025, 8, 9)));
}

#[test]
fn inserted_study_takes_its_window_and_ripples_later_items() {
    let before = recursion_then_sorting();
    let sorting_before = by_label(&before, "Sorting").clone();

    let after = before
        .insert_study("Heaps", d(2025, 8, 3), d(2025, 8, 5), "")
        .unwrap();

    let heaps = by_label(&after, "Heaps");
    assert_eq!(span(heaps), (d(2025, 8, 3), d(2025, 8, 5)));
    assert!(heaps.pinned);

    let recursion = after.parts_of(id("1"));
    assert_eq!(recursion.len(), 2);
    assert_eq!(span(recursion[0]), (d(2025, 8, 1), d(2025, 8, 2)));
    assert_eq!(span(recursion[1]), (d(2025, 8, 6), d(2025, 8, 9)));
    assert_eq!(recursion[1].label, "Recursion (part 2 of 2)");

    let sorting = by_label(&after, "Sorting");
    assert_eq!(
        (sorting.start - sorting_before.start).num_days(),
        heaps.duration_days()
    );
    assert_eq!(span(sorting), (d(2025, 8, 10), d(2025, 8, 11)));
}

#[test]
fn window_inside_a_pinned_study_gets_its_exact_days() {
    let schedule = Schedule::empty(d(2025, 8, 1))
        .append_study("Recursion", 6, "")
        .unwrap()
        .insert_study("Heaps", d(2025, 8, 3), d(2025, 8, 5), "")
        .unwrap()
        .insert_study("Tries", d(2025, 8, 4), d(2025, 8, 5), "")
        .unwrap();

    assert_eq!(span(by_label(&schedule, "Tries")), (d(2025, 8, 4), d(2025, 8, 5)));
    let heaps = schedule.parts_of(ItemId::new(2));
    assert_eq!(heaps.len(), 2);
    assert_eq!(span(heaps[0]), (d(2025, 8, 3), d(2025, 8, 3)));
    assert_eq!(span(heaps[1]), (d(2025, 8, 6), d(2025, 8, 7)));
    assert_eq!(heaps[1].label, "Heaps (part 2 of 2)");
    let recursion = schedule.parts_of(ItemId::new(1));
    assert_eq!(span(recursion[0]), (d(2025, 8, 1), d(2025, 8, 2)));
    assert_eq!(span(recursion[1]), (d(2025, 8, 8), d(2025, 8, 11)));
    assert_no_overlap(&schedule);
    assert_durations_conserved(&schedule);

    let restored = Schedule::rebuild(
        plan_from_records(&schedule.to_records()).unwrap(),
        schedule.base_date(),
    )
    .unwrap();
    assert_eq!(restored.items(), schedule.items());
}

#[test]
fn window_starting_after_a_study_ends_leaves_it_whole() {
    let schedule = recursion_then_sorting()
        .insert_study("Heaps", d(2025, 8, 7), d(2025, 8, 8), "")
        .unwrap();

    let recursion = schedule.parts_of(ItemId::new(1));
    assert_eq!(recursion.len(), 1);
    assert_eq!(recursion[0].label, "Recursion");
    assert_eq!(span(recursion[0]), (d(2025, 8, 1), d(2025, 8, 6)));
    assert_eq!(span(by_label(&schedule, "Heaps")), (d(2025, 8, 7), d(2025, 8, 8)));
    assert_eq!(span(by_label(&schedule, "Sorting")), (d(2025, 8, 9), d(2025, 8, 10)));
}

#[test]
fn window_ending_before_a_study_starts_leaves_it_whole() {
    let schedule = Schedule::empty(d(2025, 8, 1))
        .append_study("Arrays", 3, "")
        .unwrap()
        .insert_study("Warmup", d(2025, 7, 30), d(2025, 7, 31), "")
        .unwrap();

    assert_eq!(schedule.base_date(), d(2025, 7, 30));
    assert_eq!(span(by_label(&schedule, "Warmup")), (d(2025, 7, 30), d(2025, 7, 31)));
    let arrays = schedule.parts_of(ItemId::new(1));
    assert_eq!(arrays.len(), 1);
    assert_eq!(span(arrays[0]), (d(2025, 8, 1), d(2025, 8, 3)));
}

#[test]
fn deleting_an_earlier_study_pulls_inserted_window_forward() {
    let schedule = Schedule::empty(d(2025, 8, 1))
        .append_study("Arrays", 5, "")
        .unwrap()
        .insert_study("Heaps", d(2025, 8, 6), d(2025, 8, 8), "")
        .unwrap()
        .append_study("Sorting", 2, "")
        .unwrap();
    assert_eq!(span(by_label(&schedule, "Sorting")), (d(2025, 8, 9), d(2025, 8, 10)));

    let remaining = schedule.delete_item(ItemId::new(1)).unwrap();

    let heaps = by_label(&remaining, "Heaps");
    assert_eq!(span(heaps), (d(2025, 8, 1), d(2025, 8, 3)));
    assert!(!heaps.pinned);
    assert_eq!(span(by_label(&remaining, "Sorting")), (d(2025, 8, 4), d(2025, 8, 5)));
}

#[test]
fn moving_base_date_keeps_inserted_study_in_priority_order() {
    let schedule = Schedule::empty(d(2025, 8, 1))
        .append_study("Arrays", 3, "")
        .unwrap()
        .insert_study("Heaps", d(2025, 8, 10), d(2025, 8, 11), "")
        .unwrap();
    assert_eq!(span(by_label(&schedule, "Heaps")), (d(2025, 8, 10), d(2025, 8, 11)));

    let later = schedule.with_base_date(d(2025, 8, 20)).unwrap();
    assert_eq!(span(by_label(&later, "Arrays")), (d(2025, 8, 20), d(2025, 8, 22)));
    assert_eq!(span(by_label(&later, "Heaps")), (d(2025, 8, 23), d(2025, 8, 24)));

    let same = schedule.with_base_date(d(2025, 8, 1)).unwrap();
    assert_eq!(span(by_label(&same, "Heaps")), (d(2025, 8, 4), d(2025, 8, 5)));
}

#[test]
fn unbounded_durations_are_rejected_without_panicking() {
    let schedule = Schedule::empty(d(2025, 8, 1));

    let err = schedule.append_study("Forever", i64::MAX / 2, "").unwrap_err();
    assert!(matches!(
        err,
        ScheduleError::InvalidRange(RangeViolation::DurationTooLong { .. })
    ));

    let err = schedule
        .insert_study("Forever", NaiveDate::MIN, NaiveDate::MAX, "")
        .unwrap_err();
    assert!(err.is_invalid_range());

    let end = schedule
        .append_study("Stacks", 2, "")
        .unwrap()
        .insert_break("Horizon", NaiveDate::MAX.pred_opt().unwrap(), NaiveDate::MAX, "")
        .unwrap();
    let err = end.with_base_date(NaiveDate::MAX).unwrap_err();
    assert!(matches!(
        err,
        ScheduleError::InvalidRange(RangeViolation::BeyondCalendar { .. })
    ));
}

#[test]
fn fresh_ids_run_out_at_u32_max() {
    let schedule = Schedule::rebuild(
        vec![PlanItem::study(ItemId::new(u32::MAX), "Last", 1)],
        d(2025, 8, 1),
    )
    .unwrap();
    let err = schedule
        .insert_study("Heaps", d(2025, 8, 3), d(2025, 8, 4), "")
        .unwrap_err();
    assert_eq!(err, ScheduleError::InvalidId(ItemId::new(u32::MAX)));
}

#[test]
fn deleting_unknown_id_is_not_found_and_leaves_schedule_alone() {
    let schedule = arrays_with_cat1();
    let snapshot = schedule.clone();

    let err = schedule.delete_item(ItemId::new(42)).unwrap_err();

    assert_eq!(err, ScheduleError::NotFound(ItemId::new(42)));
    assert_eq!(schedule, snapshot);
}

#[test]
fn deleting_by_part_id_removes_every_part() {
    let schedule = arrays_with_cat1();
    let remaining = schedule.delete_item(id("1-2")).unwrap();

    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining.items()[0].label, "CAT-1");
}

#[test]
fn overlapping_break_is_rejected() {
    let schedule = arrays_with_cat1();
    let err = schedule
        .insert_break("Trip", d(2025, 8, 7), d(2025, 8, 9), "")
        .unwrap_err();

    match err {
        ScheduleError::InvalidRange(RangeViolation::OverlappingBreaks { existing, requested }) => {
            assert_eq!(existing, DateRange::new(d(2025, 8, 5), d(2025, 8, 7)).unwrap());
            assert_eq!(requested.start(), d(2025, 8, 7));
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn invalid_ranges_and_durations_are_rejected() {
    let schedule = Schedule::empty(d(2025, 8, 1));

    let reversed = schedule
        .insert_break("Exam", d(2025, 8, 9), d(2025, 8, 5), "")
        .unwrap_err();
    assert!(reversed.is_invalid_range());

    let reversed = schedule
        .insert_study("Graphs", d(2025, 8, 9), d(2025, 8, 5), "")
        .unwrap_err();
    assert!(reversed.is_invalid_range());

    let empty = schedule.append_study("Tries", 0, "").unwrap_err();
    assert!(matches!(
        empty,
        ScheduleError::InvalidRange(RangeViolation::NonPositiveDuration { duration_days: 0, .. })
    ));
}

#[test]
fn duplicate_plan_ids_are_rejected() {
    let plan = vec![
        PlanItem::study(ItemId::new(1), "Arrays", 2),
        PlanItem::study(ItemId::new(1), "Strings", 2),
    ];
    let err = Schedule::rebuild(plan, d(2025, 8, 1)).unwrap_err();
    assert_eq!(err, ScheduleError::InvalidId(ItemId::new(1)));
}

#[test]
fn break_before_base_date_is_still_emitted() {
    let schedule = Schedule::empty(d(2025, 8, 10))
        .insert_break("Trip", d(2025, 8, 1), d(2025, 8, 3), "")
        .unwrap()
        .append_study("Stacks", 2, "")
        .unwrap();

    let trip = by_label(&schedule, "Trip");
    assert_eq!(span(trip), (d(2025, 8, 1), d(2025, 8, 3)));
    assert_eq!(trip.sequence, 1);
    assert_eq!(span(by_label(&schedule, "Stacks")), (d(2025, 8, 10), d(2025, 8, 11)));
}

#[test]
fn breaks_never_move_across_operations() {
    let schedule = arrays_with_cat1()
        .append_study("Strings", 4, "")
        .unwrap()
        .insert_study("Heaps", d(2025, 8, 2), d(2025, 8, 3), "")
        .unwrap()
        .insert_break("Gravitas", d(2025, 8, 14), d(2025, 8, 15), "")
        .unwrap()
        .delete_item(ItemId::new(3))
        .unwrap();

    assert_eq!(span(by_label(&schedule, "CAT-1")), (d(2025, 8, 5), d(2025, 8, 7)));
    assert_eq!(span(by_label(&schedule, "Gravitas")), (d(2025, 8, 14), d(2025, 8, 15)));
    assert_no_overlap(&schedule);
    assert_durations_conserved(&schedule);
}

#[test]
fn rebuild_is_idempotent() {
    let schedule = recursion_then_sorting()
        .insert_break("CAT-1", d(2025, 8, 4), d(2025, 8, 4), "")
        .unwrap()
        .insert_study("Heaps", d(2025, 8, 6), d(2025, 8, 7), "")
        .unwrap();

    let again = Schedule::rebuild(schedule.to_plan(), schedule.base_date()).unwrap();
    assert_eq!(again, schedule);

    let from_records = plan_from_records(&schedule.to_records()).unwrap();
    let restored = Schedule::rebuild(from_records, schedule.base_date()).unwrap();
    assert_eq!(restored.items(), schedule.items());
}

#[test]
fn flowing_studies_keep_priority_order() {
    let schedule = Schedule::empty(d(2025, 8, 1))
        .append_study("Arrays", 3, "")
        .unwrap()
        .append_study("Strings", 2, "")
        .unwrap()
        .append_study("Hashing", 4, "")
        .unwrap()
        .insert_break("CAT-1", d(2025, 8, 3), d(2025, 8, 6), "")
        .unwrap();

    let mut first_parts: Vec<&WorkItem> = schedule
        .items()
        .iter()
        .filter(|item| item.kind == ItemKind::Study && item.id.is_origin())
        .collect();
    first_parts.sort_by_key(|item| item.start);
    let labels: Vec<&str> = first_parts
        .iter()
        .map(|item| item.label.split(" (part").next().unwrap_or_default())
        .collect();
    assert_eq!(labels, vec!["Arrays", "Strings", "Hashing"]);
    assert_no_overlap(&schedule);
    assert_durations_conserved(&schedule);
}

#[test]
fn moving_base_date_reflows_studies_only() {
    let schedule = arrays_with_cat1();
    let moved = schedule.with_base_date(d(2025, 8, 8)).unwrap();

    assert_eq!(moved.base_date(), d(2025, 8, 8));
    assert_eq!(moved.len(), 2);
    assert_eq!(span(by_label(&moved, "CAT-1")), (d(2025, 8, 5), d(2025, 8, 7)));
    assert_eq!(span(by_label(&moved, "Arrays")), (d(2025, 8, 8), d(2025, 8, 16)));
}

#[test]
fn rows_carry_formatted_ranges() {
    let schedule = arrays_with_cat1();
    let rows = schedule.rows();

    assert_eq!(rows[0].formatted_range, "01 Aug 2025 - 04 Aug 2025");
    assert_eq!(rows[1].label, "CAT-1");
    assert_eq!(rows[1].duration_days, 3);
    assert_eq!(rows[2].sequence, 3);
}

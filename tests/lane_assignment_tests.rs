use chrono::{NaiveDateTime, TimeDelta};
use proptest::prelude::*;
use std::collections::BTreeSet;
use rotation_tool::lanes::MAX_ENTRIES;
use rotation_tool::{
    LaneError, RotationBoard, ScheduleEntry, TimeCycle, assign_lanes, peak_overlap,
};

fn at(minutes: i64) -> NaiveDateTime {
    TimeCycle::default().base() + TimeDelta::minutes(minutes)
}

fn entry(resource: &str, start: i64, end: i64) -> ScheduleEntry {
    ScheduleEntry::new(resource, at(start), at(end), format!("{start}-{end}"), "#ADD8E6")
}

fn lanes_by_source(entries: &[ScheduleEntry]) -> Vec<usize> {
    let assignment = assign_lanes(entries).unwrap();
    (0..entries.len())
        .map(|idx| assignment.lane_of(idx).unwrap())
        .collect()
}

#[test]
fn empty_input_needs_no_lanes() {
    let assignment = assign_lanes(&[]).unwrap();
    assert!(assignment.entries.is_empty());
    assert_eq!(assignment.lane_count, 0);
    assert_eq!(peak_overlap(&[]), 0);
}

#[test]
fn sample_rotations_take_two_lanes() {
    let board = RotationBoard::with_sample_entries(Default::default());
    let assignment = assign_lanes(board.entries()).unwrap();
    assert_eq!(assignment.lane_count, 2);

    let resources: Vec<(&str, &str)> = assignment
        .entries
        .iter()
        .map(|a| (a.entry.label.as_str(), a.entry.resource.as_str()))
        .collect();
    assert_eq!(resources, vec![("LAX", "#1"), ("EWR", "#2")]);
}

#[test]
fn mutually_overlapping_entries_get_distinct_lanes() {
    let entries = vec![entry("A", 0, 100), entry("B", 10, 90), entry("C", 20, 80)];
    assert_eq!(lanes_by_source(&entries), vec![1, 2, 3]);
    assert_eq!(peak_overlap(&entries), 3);
}

#[test]
fn morning_overlap_needs_three_lanes() {
    let entries = vec![entry("A", 540, 660), entry("B", 600, 720), entry("C", 630, 780)];
    let assignment = assign_lanes(&entries).unwrap();
    assert_eq!(assignment.lane_count, 3);
    assert_eq!(peak_overlap(&entries), 3);
}

#[test]
fn start_tie_processes_earlier_end_first() {
    let entries = vec![entry("B", 600, 720), entry("A", 600, 660)];
    let assignment = assign_lanes(&entries).unwrap();
    let labelled: Vec<(usize, &str)> = assignment
        .entries
        .iter()
        .map(|a| (a.source_index, a.entry.resource.as_str()))
        .collect();
    assert_eq!(labelled, vec![(1, "#1"), (0, "#2")]);
}

#[test]
fn touching_entries_share_a_lane() {
    let entries = vec![entry("A", 0, 120), entry("B", 120, 240), entry("C", 240, 300)];
    let assignment = assign_lanes(&entries).unwrap();
    assert_eq!(assignment.lane_count, 1);
    assert!(assignment.entries.iter().all(|a| a.entry.resource == "#1"));
}

#[test]
fn output_follows_start_order_and_keeps_source_index() {
    let entries = vec![entry("late", 300, 400), entry("early", 0, 100), entry("mid", 150, 350)];
    let assignment = assign_lanes(&entries).unwrap();

    let order: Vec<usize> = assignment.entries.iter().map(|a| a.source_index).collect();
    assert_eq!(order, vec![1, 2, 0]);
    assert_eq!(assignment.lane_of(1), Some(1));
    assert_eq!(assignment.lane_of(2), Some(1));
    assert_eq!(assignment.lane_of(0), Some(2));
}

#[test]
fn equal_starts_order_by_end_then_input() {
    let entries = vec![entry("long", 0, 300), entry("short", 0, 60), entry("twin", 0, 60)];
    let order: Vec<usize> = assign_lanes(&entries)
        .unwrap()
        .entries
        .iter()
        .map(|a| a.source_index)
        .collect();
    assert_eq!(order, vec![1, 2, 0]);
}

#[test]
fn first_free_lane_wins_over_later_ones() {
    // Lane 1 stays busy until 600; lanes 2 and 3 free up early.
    let entries = vec![
        entry("A", 0, 600),
        entry("B", 10, 30),
        entry("C", 20, 40),
        entry("D", 50, 70),
        entry("E", 700, 800),
    ];
    assert_eq!(lanes_by_source(&entries), vec![1, 2, 3, 2, 1]);
}

#[test]
fn only_resource_is_rewritten() {
    let entries = vec![entry("Spare", 0, 100), entry("#7", 50, 150)];
    let assignment = assign_lanes(&entries).unwrap();
    for assigned in &assignment.entries {
        let original = &entries[assigned.source_index];
        assert_eq!(assigned.entry.start, original.start);
        assert_eq!(assigned.entry.end, original.end);
        assert_eq!(assigned.entry.label, original.label);
        assert_eq!(assigned.entry.color, original.color);
        assert_eq!(assigned.entry.resource, format!("#{}", assigned.lane));
    }
}

#[test]
fn zero_length_entry_counts_toward_peak() {
    let entries = vec![entry("point", 60, 60)];
    assert_eq!(peak_overlap(&entries), 1);
    assert_eq!(assign_lanes(&entries).unwrap().lane_count, 1);
}

#[test]
fn zero_length_entry_at_boundary_reuses_lane() {
    let entries = vec![entry("A", 0, 60), entry("point", 60, 60), entry("B", 60, 120)];
    assert_eq!(lanes_by_source(&entries), vec![1, 1, 1]);
    assert_eq!(peak_overlap(&entries), 1);
}

#[test]
fn zero_length_entry_inside_another_needs_second_lane() {
    let entries = vec![entry("A", 0, 120), entry("point", 60, 60)];
    assert_eq!(lanes_by_source(&entries), vec![1, 2]);
    assert_eq!(peak_overlap(&entries), 2);
}

#[test]
fn inverted_entry_is_clamped_for_bookkeeping_only() {
    let entries = vec![entry("inverted", 200, 100), entry("B", 200, 300)];
    let assignment = assign_lanes(&entries).unwrap();
    assert_eq!(assignment.clamped, vec![0]);
    assert_eq!(assignment.lane_count, 1);

    let kept = assignment
        .entries
        .iter()
        .find(|a| a.source_index == 0)
        .unwrap();
    assert_eq!(kept.entry.end, at(100));
}

#[test]
fn assignment_is_deterministic() {
    let entries = vec![
        entry("A", 0, 90),
        entry("B", 30, 60),
        entry("C", 30, 60),
        entry("D", 60, 200),
    ];
    assert_eq!(assign_lanes(&entries).unwrap(), assign_lanes(&entries).unwrap());
}

#[test]
fn oversized_input_is_rejected() {
    let entries = vec![entry("A", 0, 10); MAX_ENTRIES + 1];
    assert_eq!(
        assign_lanes(&entries),
        Err(LaneError::TooManyEntries {
            count: MAX_ENTRIES + 1,
            limit: MAX_ENTRIES,
        })
    );
}

fn arb_entries() -> impl Strategy<Value = Vec<ScheduleEntry>> {
    prop::collection::vec((0i64..2_000, 0i64..600), 0..40).prop_map(|spans| {
        spans
            .into_iter()
            .enumerate()
            .map(|(idx, (start, len))| entry(&format!("R{idx}"), start, start + len))
            .collect()
    })
}

proptest! {
    #[test]
    fn lanes_never_hold_overlapping_entries(entries in arb_entries()) {
        let assignment = assign_lanes(&entries).unwrap();
        prop_assert_eq!(assignment.entries.len(), entries.len());

        let mut sources: Vec<usize> = assignment.entries.iter().map(|a| a.source_index).collect();
        sources.sort_unstable();
        prop_assert_eq!(sources, (0..entries.len()).collect::<Vec<_>>());

        for (i, a) in assignment.entries.iter().enumerate() {
            prop_assert!(a.lane >= 1 && a.lane <= assignment.lane_count);
            for b in &assignment.entries[i + 1..] {
                if a.lane == b.lane {
                    prop_assert!(!a.entry.overlaps(&b.entry));
                }
            }
        }

        let used: BTreeSet<usize> = assignment.entries.iter().map(|a| a.lane).collect();
        prop_assert_eq!(used, (1..=assignment.lane_count).collect::<BTreeSet<_>>());
    }

    #[test]
    fn lane_count_matches_peak_overlap(entries in arb_entries()) {
        let assignment = assign_lanes(&entries).unwrap();
        prop_assert_eq!(assignment.lane_count, peak_overlap(&entries));
    }
}

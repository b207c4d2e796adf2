//! Run-level invariants checked over synthetic datasets: record counts,
//! traceability, idempotence, and digest determinism.

use dedup_engine::{
    FieldValue, MergeConfig, MergeEngine, Record, MERGE_METADATA_FIELD, WAS_MERGED_FIELD,
};

fn engine() -> MergeEngine {
    MergeEngine::new(
        MergeConfig::builder("Action Request Number")
            .build()
            .expect("default config builds"),
    )
}

/// Builds `total` records spread over `keys` duplicate groups, with field
/// values that vary per record so most groups carry real conflicts.
fn synthetic_records(total: usize, keys: usize) -> Vec<Record> {
    (0..total)
        .map(|i| {
            let key = format!("REQ-{:03}", i % keys);
            let stage = match i % 3 {
                0 => "Open",
                1 => "In Progress",
                _ => "Closed",
            };
            Record::from(vec![
                ("Action Request Number", FieldValue::from(key)),
                ("Workflow Stage", FieldValue::from(stage)),
                (
                    "Completion Date",
                    FieldValue::from(format!("2023-{:02}-{:02}", 1 + i % 12, 1 + i % 28)),
                ),
                ("Comments", FieldValue::from(format!("note {i}"))),
                ("Days Open", FieldValue::Int(i as i64)),
                (
                    "Root Cause",
                    FieldValue::from(vec![format!("cause-{}", i % 5)]),
                ),
            ])
        })
        .collect()
}

fn strip_reserved(record: &Record) -> Record {
    let mut bare = Record::new();
    for (name, value) in record.iter() {
        if name != WAS_MERGED_FIELD && name != MERGE_METADATA_FIELD {
            bare.insert(name, value.clone());
        }
    }
    bare
}

#[test]
fn record_counts_always_reconcile() {
    for (total, keys) in [(1, 1), (7, 3), (40, 8), (100, 100)] {
        let records = synthetic_records(total, keys);
        let outcome = engine().run(records).unwrap();

        let expected = keys.min(total);
        assert_eq!(outcome.records.len(), expected);
        assert_eq!(outcome.report.input_records, total);
        assert_eq!(outcome.report.output_records, expected);

        let group_sizes: usize = outcome.report.groups.iter().map(|g| g.group_size).sum();
        assert_eq!(group_sizes, total);
    }
}

#[test]
fn every_source_value_is_traceable() {
    let records = synthetic_records(24, 6);
    let outcome = engine().run(records.clone()).unwrap();

    for source in &records {
        let key = source
            .get("Action Request Number")
            .and_then(FieldValue::as_str)
            .unwrap()
            .to_string();
        let merged = outcome
            .records
            .iter()
            .find(|r| r.get("Action Request Number").and_then(FieldValue::as_str) == Some(&key))
            .expect("every key survives");
        let audit = outcome
            .report
            .groups
            .iter()
            .find(|g| g.key.as_deref() == Some(&key))
            .expect("every key is audited");

        for (field, value) in source.iter() {
            let copied = merged.get(field) == Some(value);
            let decided = audit
                .decisions
                .iter()
                .any(|d| d.field == *field && d.values_considered.contains(value));
            assert!(
                copied || decided,
                "value for '{field}' in group '{key}' is neither copied nor decided"
            );
        }
    }
}

#[test]
fn merging_already_merged_output_changes_nothing() {
    let records = synthetic_records(30, 5);
    let first = engine().run(records).unwrap();

    // Reserved fields are rejected on input, so re-run the bare payloads.
    let bare: Vec<Record> = first.records.iter().map(strip_reserved).collect();
    let second = engine().run(bare.clone()).unwrap();

    assert_eq!(second.records.len(), bare.len());
    assert_eq!(second.report.duplicate_groups, 0);
    for (rerun, original) in second.records.iter().zip(&bare) {
        assert_eq!(
            rerun.get(WAS_MERGED_FIELD).and_then(FieldValue::as_bool),
            Some(false)
        );
        assert_eq!(&strip_reserved(rerun), original);
    }
}

#[test]
fn repeated_runs_share_a_digest() {
    let records = synthetic_records(50, 10);
    let first = engine().run(records.clone()).unwrap();
    let second = engine().run(records).unwrap();

    assert_ne!(first.report.run_id, second.report.run_id);
    assert_eq!(first.report.output_digest, second.report.output_digest);
}

#[test]
fn parallel_run_matches_sequential() {
    let records = synthetic_records(60, 12);
    let sequential = engine().run(records.clone()).unwrap();

    for workers in [1, 2, 4] {
        let parallel = engine().run_parallel(records.clone(), workers).unwrap();
        assert_eq!(parallel.report.output_digest, sequential.report.output_digest);
        assert_eq!(parallel.records.len(), sequential.records.len());
        for (p, s) in parallel.records.iter().zip(&sequential.records) {
            assert_eq!(strip_reserved(p), strip_reserved(s));
        }
    }
}

#[test]
fn output_order_follows_first_appearance() {
    let records = vec![
        Record::from(vec![("Action Request Number", "B")]),
        Record::from(vec![("Action Request Number", "A")]),
        Record::from(vec![("Action Request Number", "B")]),
        Record::from(vec![("Action Request Number", "C")]),
    ];
    let outcome = engine().run(records).unwrap();

    let keys: Vec<&str> = outcome
        .records
        .iter()
        .map(|r| {
            r.get("Action Request Number")
                .and_then(FieldValue::as_str)
                .unwrap()
        })
        .collect();
    assert_eq!(keys, ["B", "A", "C"]);
}

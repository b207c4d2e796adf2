//! The merge engine: orchestration of the full pipeline.
//!
//! `run` is the single-threaded reference path: check, group, merge,
//! assess, validate, report. `run_parallel` fans the per-group merge out
//! over a small bounded thread pool and reassembles drafts into
//! first-seen group order, so both paths produce identical output for
//! the same input. The engine never returns a partial result: any
//! structural or integrity failure aborts the whole run.

use std::sync::Arc;
use std::thread;

use crossbeam_channel::bounded;
use tracing::info;

use crate::assess::assess;
use crate::config::MergeConfig;
use crate::decision::{IntegrityStatus, MergeMetadata, RunId, ValidationSummary};
use crate::error::{MergeError, MergeResult};
use crate::executor::{merge_group, MergedDraft};
use crate::group::{group, DuplicateGroup};
use crate::record::{Record, MERGE_METADATA_FIELD, WAS_MERGED_FIELD};
use crate::report::{output_digest, GroupAudit, MergeReport};
use crate::validate::{check_group_integrity, post_merge_check, pre_merge_check};
use crate::value::FieldValue;

/// Queued jobs in the parallel path.
const QUEUE_CAPACITY: usize = 1024;

/// The result of a successful engine run.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    /// Merged records in first-seen group order, reserved fields attached.
    pub records: Vec<Record>,

    /// The run report.
    pub report: MergeReport,
}

/// The merge engine.
///
/// Holds an immutable configuration; one engine can serve any number of
/// runs.
///
/// # Examples
///
/// ```
/// use dedup_engine::{MergeConfig, MergeEngine, Record};
///
/// let engine = MergeEngine::new(MergeConfig::builder("id").build().unwrap());
/// let records = vec![
///     Record::from(vec![("id", "a"), ("Status", "Open")]),
///     Record::from(vec![("id", "a"), ("Status", "Closed")]),
/// ];
///
/// let outcome = engine.run(records).unwrap();
/// assert_eq!(outcome.records.len(), 1);
/// assert_eq!(outcome.report.duplicate_groups, 1);
/// ```
#[derive(Debug, Clone)]
pub struct MergeEngine {
    config: MergeConfig,
}

impl MergeEngine {
    /// Creates an engine from a built configuration.
    #[must_use]
    pub fn new(config: MergeConfig) -> Self {
        Self { config }
    }

    /// The engine's configuration.
    #[must_use]
    pub fn config(&self) -> &MergeConfig {
        &self.config
    }

    /// Runs the full pipeline single-threaded.
    ///
    /// # Errors
    ///
    /// Returns a structural error for unusable input and an integrity
    /// error if the merged output fails validation. In both cases no
    /// output is returned.
    pub fn run(&self, records: Vec<Record>) -> MergeResult<MergeOutcome> {
        pre_merge_check(&records, self.config.key_field())?;
        let input_count = records.len();
        let groups = group(records, self.config.key_field());

        let drafts: Vec<MergedDraft> = groups
            .iter()
            .map(|g| merge_group(g, &self.config))
            .collect();

        self.finalize(input_count, &groups, drafts)
    }

    /// Runs the pipeline with per-group merging on `workers` threads.
    ///
    /// Output payloads are identical to [`Self::run`]: drafts are
    /// reassembled into first-seen group order before validation and
    /// reporting.
    ///
    /// # Errors
    ///
    /// Same error contract as [`Self::run`], plus an internal error if a
    /// worker thread cannot be spawned or dies before replying.
    pub fn run_parallel(&self, records: Vec<Record>, workers: usize) -> MergeResult<MergeOutcome> {
        pre_merge_check(&records, self.config.key_field())?;
        let input_count = records.len();
        let groups = Arc::new(group(records, self.config.key_field()));

        let workers = workers.max(1);
        let (job_tx, job_rx) = bounded::<usize>(QUEUE_CAPACITY.max(groups.len()));
        let (result_tx, result_rx) = bounded::<(usize, MergedDraft)>(QUEUE_CAPACITY.max(groups.len()));

        let mut handles = Vec::with_capacity(workers);
        for idx in 0..workers {
            let job_rx = job_rx.clone();
            let result_tx = result_tx.clone();
            let groups = Arc::clone(&groups);
            let config = self.config.clone();
            let handle = thread::Builder::new()
                .name(format!("dedup-merge-{idx}"))
                .spawn(move || {
                    while let Ok(index) = job_rx.recv() {
                        let draft = merge_group(&groups[index], &config);
                        if result_tx.send((index, draft)).is_err() {
                            break;
                        }
                    }
                })
                .map_err(|e| MergeError::internal(format!("spawning merge worker: {e}")))?;
            handles.push(handle);
        }
        drop(job_rx);
        drop(result_tx);

        for index in 0..groups.len() {
            if job_tx.send(index).is_err() {
                break;
            }
        }
        // Closing the channel lets workers drain the queue and exit.
        drop(job_tx);

        let mut slots: Vec<Option<MergedDraft>> = vec![None; groups.len()];
        for _ in 0..groups.len() {
            let (index, draft) = result_rx
                .recv()
                .map_err(|_| MergeError::internal("merge worker exited before replying"))?;
            slots[index] = Some(draft);
        }
        for handle in handles {
            let _ = handle.join();
        }

        let drafts: Vec<MergedDraft> = slots
            .into_iter()
            .map(|slot| slot.ok_or_else(|| MergeError::internal("missing draft for group")))
            .collect::<MergeResult<_>>()?;

        self.finalize(input_count, &groups, drafts)
    }

    /// Assesses, validates, and assembles the final records and report.
    fn finalize(
        &self,
        input_count: usize,
        groups: &[DuplicateGroup],
        drafts: Vec<MergedDraft>,
    ) -> MergeResult<MergeOutcome> {
        let mut outputs = Vec::with_capacity(drafts.len());
        let mut audits = Vec::with_capacity(drafts.len());

        for (group, draft) in groups.iter().zip(drafts) {
            let verdict = assess(group.key_label(), &draft.decisions, self.config.thresholds());
            check_group_integrity(group, &draft)?;

            // Assembled only after the group passed its integrity check,
            // and never mutated afterwards.
            let metadata = MergeMetadata {
                was_merged: draft.was_merged,
                merged_at: chrono::Utc::now(),
                original_record_count: group.len(),
                complexity: verdict.complexity,
                differing_fields: draft.differing_fields,
                decisions: draft.decisions,
                validation: ValidationSummary {
                    integrity: IntegrityStatus::Verified,
                    risk: verdict.risk,
                    warnings: verdict.warnings.clone(),
                },
            };

            audits.push(GroupAudit {
                key: group.key.clone(),
                group_size: group.len(),
                was_merged: metadata.was_merged,
                complexity: metadata.complexity,
                risk: metadata.validation.risk,
                warnings: verdict.warnings,
                decisions: metadata.decisions.clone(),
            });

            let mut record = draft.record;
            let metadata_value = serde_json::to_value(&metadata)
                .map_err(|e| MergeError::internal(format!("serializing merge metadata: {e}")))?;
            record.insert(WAS_MERGED_FIELD, FieldValue::Bool(metadata.was_merged));
            record.insert(MERGE_METADATA_FIELD, FieldValue::Structured(metadata_value));
            outputs.push(record);
        }

        post_merge_check(input_count, groups, outputs.len())?;

        // The digest covers the merged payloads only: reserved fields
        // carry run-unique IDs and timestamps and would defeat the
        // determinism check.
        let bare: Vec<Record> = outputs
            .iter()
            .map(|record| {
                record
                    .iter()
                    .filter(|(name, _)| *name != WAS_MERGED_FIELD && *name != MERGE_METADATA_FIELD)
                    .map(|(name, value)| (name.to_string(), value.clone()))
                    .collect()
            })
            .collect();
        let digest = output_digest(&bare)?;

        let duplicate_groups = groups.iter().filter(|g| g.len() > 1).count();
        let report = MergeReport {
            run_id: RunId::new(),
            merged_at: chrono::Utc::now(),
            input_records: input_count,
            output_records: outputs.len(),
            duplicate_groups,
            groups: audits,
            output_digest: digest,
        };

        info!(
            run = %report.run_id,
            input = report.input_records,
            output = report.output_records,
            duplicates = report.duplicate_groups,
            decisions = report.decision_count(),
            "merge run complete"
        );

        Ok(MergeOutcome {
            records: outputs,
            report,
        })
    }
}

use serde::Serialize;
use tracing::{debug, info, warn};

use super::LogicalCollection;
use crate::core::client::database::DatabaseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    ListIndexes,
    CreateIndex,
    DropIndex,
}

/// Result of a single catalog operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum OperationOutcome {
    Success,
    /// Expected failure that leaves the collection in an acceptable state, e.g. the index
    /// already exists under other options, or the legacy index was dropped concurrently.
    Conflict(String),
    Failed(String),
}

impl OperationOutcome {
    /// Classify `result`; errors for which `recoverable` holds become [`OperationOutcome::Conflict`].
    pub fn from_result<T>(result: Result<T, DatabaseError>, recoverable: impl Fn(&DatabaseError) -> bool) -> Self {
        match result {
            Ok(_) => Self::Success,
            Err(err) if recoverable(&err) => Self::Conflict(err.to_string()),
            Err(err) => Self::Failed(err.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationRecord {
    pub collection: LogicalCollection,
    pub collection_name: String,
    pub index: Option<String>,
    pub kind: OperationKind,
    pub outcome: OperationOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnchangedIndex {
    pub collection: LogicalCollection,
    pub index: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub created: usize,
    pub dropped: usize,
    pub unchanged: usize,
    pub conflicts: usize,
    pub failures: usize,
}

/// Everything a reconciliation run attempted, in execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub operations: Vec<OperationRecord>,
    pub unchanged: Vec<UnchangedIndex>,
}

impl ReconcileReport {
    pub(crate) fn record(
        &mut self,
        collection: LogicalCollection,
        collection_name: &str,
        index: Option<&str>,
        kind: OperationKind,
        outcome: OperationOutcome,
    ) {
        match &outcome {
            OperationOutcome::Success => {
                debug!(collection_name = %collection_name, index = ?index, operation = ?kind, "Index operation applied")
            }
            OperationOutcome::Conflict(reason) => {
                debug!(collection_name = %collection_name, index = ?index, operation = ?kind, reason = %reason, "Index operation skipped")
            }
            OperationOutcome::Failed(reason) => {
                warn!(collection_name = %collection_name, index = ?index, operation = ?kind, reason = %reason, "Index operation failed")
            }
        }
        self.operations.push(OperationRecord {
            collection,
            collection_name: collection_name.to_string(),
            index: index.map(str::to_string),
            kind,
            outcome,
        });
    }

    pub(crate) fn record_unchanged(&mut self, collection: LogicalCollection, index: &str) {
        self.unchanged.push(UnchangedIndex { collection, index: index.to_string() });
    }

    fn successful(&self, kind: OperationKind) -> impl Iterator<Item = &OperationRecord> {
        self.operations.iter().filter(move |op| op.kind == kind && op.outcome.is_success())
    }

    /// Names of the indexes created during the run, as (collection, index).
    pub fn created(&self) -> Vec<(LogicalCollection, &str)> {
        self.successful(OperationKind::CreateIndex).filter_map(|op| Some((op.collection, op.index.as_deref()?))).collect()
    }

    /// Names of the legacy indexes dropped during the run, as (collection, index).
    pub fn dropped(&self) -> Vec<(LogicalCollection, &str)> {
        self.successful(OperationKind::DropIndex).filter_map(|op| Some((op.collection, op.index.as_deref()?))).collect()
    }

    pub fn conflicts(&self) -> impl Iterator<Item = &OperationRecord> {
        self.operations.iter().filter(|op| matches!(op.outcome, OperationOutcome::Conflict(_)))
    }

    pub fn failures(&self) -> impl Iterator<Item = &OperationRecord> {
        self.operations.iter().filter(|op| matches!(op.outcome, OperationOutcome::Failed(_)))
    }

    /// No operation failed unexpectedly. Conflicts do not count against a run.
    pub fn is_clean(&self) -> bool {
        self.failures().next().is_none()
    }

    pub fn summary(&self) -> ReportSummary {
        ReportSummary {
            created: self.created().len(),
            dropped: self.dropped().len(),
            unchanged: self.unchanged.len(),
            conflicts: self.conflicts().count(),
            failures: self.failures().count(),
        }
    }

    pub(crate) fn log_summary(&self) {
        let summary = self.summary();
        info!(
            created = summary.created,
            dropped = summary.dropped,
            unchanged = summary.unchanged,
            conflicts = summary.conflicts,
            failures = summary.failures,
            "Index reconciliation finished"
        );
    }
}

//! Index reconciliation.
//!
//! Each (collection, index name) pair is in one of three states, see [`IndexState`].
//! Reconciliation moves legacy indexes to `Absent` and absent canonical indexes to
//! `CanonicalPresent`. A canonical index is never dropped.
//!
//! Reconciliation runs in two phases:
//! 1. legacy cleanup on [`LEGACY_CLEANUP_COLLECTIONS`]
//! 2. convergence on every [`LogicalCollection`]
//!
//! Phase 1 finishes before phase 2 starts, so a canonical index is never created while a
//! legacy index still holds the same keys under its default name.

use std::collections::HashSet;

use serde::Serialize;
use strum::IntoEnumIterator;
use tracing::{info, info_span, Instrument};

use super::report::{OperationKind, OperationOutcome, ReconcileReport};
use super::{IndexSpec, LogicalCollection, LEGACY_CLEANUP_COLLECTIONS, LEGACY_INDEX_NAMES};
use crate::core::client::database::{DatabaseError, IndexCatalog};
use crate::types::params::database::CollectionNames;
use crate::MedauthResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexState {
    Absent,
    LegacyPresent,
    CanonicalPresent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    Create,
    Drop,
    Noop,
}

impl IndexState {
    fn of_canonical(name: &str, existing: &HashSet<String>) -> Self {
        if existing.contains(name) {
            Self::CanonicalPresent
        } else {
            Self::Absent
        }
    }

    fn of_legacy(name: &str, existing: &HashSet<String>) -> Self {
        if existing.contains(name) {
            Self::LegacyPresent
        } else {
            Self::Absent
        }
    }

    /// Transition the reconciler applies from this state.
    ///
    /// `Absent` only leads to a creation for canonical indexes; an absent legacy name is
    /// left alone.
    pub fn transition(self, canonical: bool) -> Transition {
        match self {
            Self::LegacyPresent => Transition::Drop,
            Self::Absent if canonical => Transition::Create,
            Self::Absent | Self::CanonicalPresent => Transition::Noop,
        }
    }
}

/// What reconciliation would do to one index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedChange {
    pub collection: LogicalCollection,
    pub collection_name: String,
    pub index: String,
    pub state: IndexState,
    pub transition: Transition,
}

/// Converge the index catalog of every managed collection to [`super::CANONICAL_INDEXES`].
///
/// Never fails: every list, drop or create failure is recorded in the returned report
/// and reconciliation moves on to the next operation.
pub async fn reconcile<C>(catalog: &C, names: &CollectionNames) -> ReconcileReport
where
    C: IndexCatalog + ?Sized,
{
    let mut report = ReconcileReport::default();

    for &collection in LEGACY_CLEANUP_COLLECTIONS {
        let span = info_span!("legacy_cleanup", collection = %collection);
        cleanup_legacy(catalog, collection, names.name_of(collection), &mut report).instrument(span).await;
    }

    for collection in LogicalCollection::iter() {
        let span = info_span!("converge", collection = %collection);
        converge(catalog, collection, names.name_of(collection), &mut report).instrument(span).await;
    }

    report.log_summary();
    report
}

/// Read-only counterpart of [`reconcile`]: reports the state of every canonical index and
/// of every legacy index still present, with the transition reconcile would apply.
pub async fn plan<C>(catalog: &C, names: &CollectionNames) -> MedauthResult<Vec<PlannedChange>>
where
    C: IndexCatalog + ?Sized,
{
    let mut changes = Vec::new();

    for collection in LogicalCollection::iter() {
        let collection_name = names.name_of(collection);
        let existing = match catalog.list_index_names(collection_name).await {
            Ok(existing) => existing.into_iter().collect::<HashSet<_>>(),
            Err(DatabaseError::NamespaceNotFound(_)) => HashSet::new(),
            Err(err) => return Err(err.into()),
        };

        if LEGACY_CLEANUP_COLLECTIONS.contains(&collection) {
            for &legacy in LEGACY_INDEX_NAMES {
                let state = IndexState::of_legacy(legacy, &existing);
                if state == IndexState::LegacyPresent {
                    changes.push(PlannedChange {
                        collection,
                        collection_name: collection_name.to_string(),
                        index: legacy.to_string(),
                        state,
                        transition: state.transition(false),
                    });
                }
            }
        }

        for spec in IndexSpec::for_collection(collection) {
            let state = IndexState::of_canonical(spec.name, &existing);
            changes.push(PlannedChange {
                collection,
                collection_name: collection_name.to_string(),
                index: spec.name.to_string(),
                state,
                transition: state.transition(true),
            });
        }
    }

    Ok(changes)
}

/// Fresh index names of a collection. A missing collection has no indexes.
async fn list_existing<C>(
    catalog: &C,
    collection: LogicalCollection,
    collection_name: &str,
    report: &mut ReconcileReport,
) -> Option<HashSet<String>>
where
    C: IndexCatalog + ?Sized,
{
    let result = match catalog.list_index_names(collection_name).await {
        Err(DatabaseError::NamespaceNotFound(_)) => Ok(Vec::new()),
        other => other,
    };
    match result {
        Ok(names) => {
            report.record(collection, collection_name, None, OperationKind::ListIndexes, OperationOutcome::Success);
            Some(names.into_iter().collect())
        }
        Err(err) => {
            report.record(
                collection,
                collection_name,
                None,
                OperationKind::ListIndexes,
                OperationOutcome::Failed(err.to_string()),
            );
            None
        }
    }
}

async fn cleanup_legacy<C>(
    catalog: &C,
    collection: LogicalCollection,
    collection_name: &str,
    report: &mut ReconcileReport,
) where
    C: IndexCatalog + ?Sized,
{
    // Cleanup is best effort: without a listing there is nothing to drop.
    let Some(existing) = list_existing(catalog, collection, collection_name, report).await else {
        return;
    };

    for &legacy in LEGACY_INDEX_NAMES {
        if IndexState::of_legacy(legacy, &existing).transition(false) != Transition::Drop {
            continue;
        }
        let outcome =
            OperationOutcome::from_result(catalog.drop_index(collection_name, legacy).await, DatabaseError::is_missing_target);
        if outcome.is_success() {
            info!(index = %legacy, collection_name = %collection_name, "Dropped legacy index");
        }
        report.record(collection, collection_name, Some(legacy), OperationKind::DropIndex, outcome);
    }
}

async fn converge<C>(catalog: &C, collection: LogicalCollection, collection_name: &str, report: &mut ReconcileReport)
where
    C: IndexCatalog + ?Sized,
{
    // A failed listing is treated as "no indexes": every create is attempted and
    // existing indexes surface as conflicts.
    let existing = list_existing(catalog, collection, collection_name, report).await.unwrap_or_default();

    for spec in IndexSpec::for_collection(collection) {
        match IndexState::of_canonical(spec.name, &existing).transition(true) {
            Transition::Create => {
                let outcome = OperationOutcome::from_result(
                    catalog.create_index(collection_name, spec).await,
                    DatabaseError::is_index_conflict,
                );
                if outcome.is_success() {
                    info!(index = %spec.name, collection_name = %collection_name, "Created index");
                }
                report.record(collection, collection_name, Some(spec.name), OperationKind::CreateIndex, outcome);
            }
            Transition::Noop | Transition::Drop => report.record_unchanged(collection, spec.name),
        }
    }
}

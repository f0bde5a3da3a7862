use assert_matches::assert_matches;
use rstest::*;
use tracing_test::traced_test;

use crate::core::client::database::{DatabaseError, MockIndexCatalog};
use crate::schema::{
    plan, reconcile, IndexState, LogicalCollection, OperationKind, OperationOutcome, Transition, CANONICAL_INDEXES,
};
use crate::tests::common::{collection_names, CatalogCall, InMemoryCatalog};
use crate::types::params::database::CollectionNames;
use crate::MedauthError;

fn canonical_names_of(collection: &str) -> Vec<&'static str> {
    CANONICAL_INDEXES
        .iter()
        .filter(|spec| spec.collection.to_string() == collection)
        .map(|spec| spec.name)
        .collect()
}

/// Legacy `email_1` present, canonical index absent:
/// afterwards `email_1` is gone and `patients_email_unique_idx` exists.
#[rstest]
#[tokio::test]
async fn legacy_index_is_replaced_by_canonical(collection_names: CollectionNames) {
    let catalog = InMemoryCatalog::new().with_collection("patients", &["email_1"]);

    let report = reconcile(&catalog, &collection_names).await;

    assert!(!catalog.has_index("patients", "email_1"));
    assert!(catalog.has_index("patients", "patients_email_unique_idx"));
    assert_eq!(report.dropped(), vec![(LogicalCollection::Patients, "email_1")]);
    assert!(report.is_clean());
}

#[rstest]
#[tokio::test]
async fn empty_database_receives_every_canonical_index(collection_names: CollectionNames) {
    let catalog = InMemoryCatalog::new();

    let report = reconcile(&catalog, &collection_names).await;

    let summary = report.summary();
    assert_eq!(summary.created, CANONICAL_INDEXES.len());
    assert_eq!(summary.dropped, 0);
    assert_eq!(summary.failures, 0);
    for collection in ["patients", "doctors", "otp_codes", "user_sessions", "pending_users"] {
        for name in canonical_names_of(collection) {
            assert!(catalog.has_index(collection, name), "{collection}.{name} missing");
        }
    }
}

#[rstest]
#[tokio::test]
async fn reconcile_twice_is_stable(collection_names: CollectionNames) {
    let catalog = InMemoryCatalog::new()
        .with_collection("patients", &["email_1", "username_1", "mobile_1"])
        .with_collection("doctors", &["user_type_1", "doctors_email_unique_idx"]);

    let first = reconcile(&catalog, &collection_names).await;
    let after_first = catalog.snapshot();
    let second = reconcile(&catalog, &collection_names).await;

    assert!(first.is_clean());
    assert_eq!(catalog.snapshot(), after_first);
    assert_eq!(second.summary().created, 0);
    assert_eq!(second.summary().dropped, 0);
    assert_eq!(second.summary().unchanged, CANONICAL_INDEXES.len());
    assert!(second.is_clean());
}

/// Another process created the indexes between the listing and the creates.
#[rstest]
#[tokio::test]
async fn duplicate_name_conflicts_are_absorbed(collection_names: CollectionNames) {
    let catalog = InMemoryCatalog::new();
    reconcile(&catalog, &collection_names).await;
    let converged = catalog.snapshot();

    let racing = InMemoryCatalog::new().with_stale_listing().with_conflicting_creates();
    reconcile(&racing, &collection_names).await;
    let report = reconcile(&racing, &collection_names).await;

    assert_eq!(racing.snapshot(), converged);
    assert_eq!(report.conflicts().count(), CANONICAL_INDEXES.len());
    assert!(report.is_clean());
    assert_matches!(
        report.conflicts().next().map(|op| &op.outcome),
        Some(OperationOutcome::Conflict(reason)) if reason.contains("same name")
    );
}

#[rstest]
#[tokio::test]
async fn legacy_cleanup_finishes_before_any_create(collection_names: CollectionNames) {
    let catalog = InMemoryCatalog::new()
        .with_collection("patients", &["email_1", "user_id_1"])
        .with_collection("doctors", &["email_1", "patient_id_1"]);

    reconcile(&catalog, &collection_names).await;

    let calls = catalog.calls();
    let last_drop = calls.iter().rposition(|call| matches!(call, CatalogCall::Drop(..))).expect("legacy drops");
    let first_create = calls.iter().position(|call| matches!(call, CatalogCall::Create(..))).expect("creates");
    assert!(last_drop < first_create, "{calls:?}");

    let drops: Vec<_> = calls.iter().filter(|call| matches!(call, CatalogCall::Drop(..))).collect();
    assert_eq!(drops.len(), 4);
}

#[rstest]
#[tokio::test]
async fn legacy_names_outside_cleanup_collections_are_kept(collection_names: CollectionNames) {
    let catalog = InMemoryCatalog::new().with_collection("pending_users", &["email_1"]);

    reconcile(&catalog, &collection_names).await;

    assert!(catalog.has_index("pending_users", "email_1"));
    assert!(catalog.has_index("pending_users", "pending_email_idx"));
}

#[rstest]
#[tokio::test]
async fn configured_collection_names_are_used() {
    let names = CollectionNames { patients: "clinic_patients".to_string(), ..CollectionNames::default() };
    let catalog = InMemoryCatalog::new().with_collection("clinic_patients", &["email_1"]);

    reconcile(&catalog, &names).await;

    assert!(!catalog.has_index("clinic_patients", "email_1"));
    assert!(catalog.has_index("clinic_patients", "patients_email_unique_idx"));
    assert!(catalog.indexes("patients").is_empty());
}

/// A failed listing skips cleanup but convergence still attempts every create.
#[rstest]
#[tokio::test]
async fn failed_listing_skips_cleanup_but_not_creates(collection_names: CollectionNames) {
    let catalog = InMemoryCatalog::new().with_collection("patients", &["email_1"]).with_failing_list("patients");

    let report = reconcile(&catalog, &collection_names).await;

    assert!(catalog.has_index("patients", "email_1"));
    for name in canonical_names_of("patients") {
        assert!(catalog.has_index("patients", name));
    }
    let failed_lists: Vec<_> = report
        .failures()
        .filter(|op| op.kind == OperationKind::ListIndexes && op.collection == LogicalCollection::Patients)
        .collect();
    assert_eq!(failed_lists.len(), 2);
    assert!(!report.is_clean());
}

#[rstest]
#[tokio::test]
async fn unreachable_catalog_never_aborts_reconciliation(collection_names: CollectionNames) {
    let mut catalog = MockIndexCatalog::new();
    catalog
        .expect_list_index_names()
        .times(7)
        .returning(|_| Err(DatabaseError::Connection("server selection timeout".to_string())));
    catalog.expect_drop_index().never();
    catalog
        .expect_create_index()
        .times(CANONICAL_INDEXES.len())
        .returning(|_, _| Err(DatabaseError::Connection("server selection timeout".to_string())));

    let report = reconcile(&catalog, &collection_names).await;

    let summary = report.summary();
    assert_eq!(summary.failures, 7 + CANONICAL_INDEXES.len());
    assert_eq!(summary.created, 0);
    assert_eq!(summary.conflicts, 0);
}

/// The legacy index disappears between listing and drop.
#[rstest]
#[tokio::test]
async fn concurrently_dropped_legacy_index_is_a_conflict(collection_names: CollectionNames) {
    let mut catalog = MockIndexCatalog::new();
    catalog.expect_list_index_names().returning(|collection| {
        if collection == "patients" {
            Ok(vec!["_id_".to_string(), "email_1".to_string()])
        } else {
            Ok(vec!["_id_".to_string()])
        }
    });
    catalog
        .expect_drop_index()
        .withf(|collection, name| collection == "patients" && name == "email_1")
        .times(1)
        .returning(|_, name| Err(DatabaseError::IndexNotFound(format!("index not found with name [{name}]"))));
    catalog.expect_create_index().returning(|_, _| Ok(()));

    let report = reconcile(&catalog, &collection_names).await;

    let conflict = report.conflicts().next().expect("drop conflict");
    assert_eq!(conflict.kind, OperationKind::DropIndex);
    assert_eq!(conflict.index.as_deref(), Some("email_1"));
    assert!(report.is_clean());
    assert!(report.dropped().is_empty());
}

#[rstest]
#[tokio::test]
async fn plan_reports_transitions_without_mutating(collection_names: CollectionNames) {
    let catalog = InMemoryCatalog::new().with_collection("patients", &["email_1", "patients_email_unique_idx"]);
    let before = catalog.snapshot();

    let changes = plan(&catalog, &collection_names).await.expect("plan");

    assert_eq!(catalog.snapshot(), before);
    assert!(catalog.calls().iter().all(|call| matches!(call, CatalogCall::List(_))));

    let find = |index: &str| changes.iter().find(|change| change.index == index).expect("planned index");
    assert_eq!(find("email_1").state, IndexState::LegacyPresent);
    assert_eq!(find("email_1").transition, Transition::Drop);
    assert_eq!(find("patients_email_unique_idx").transition, Transition::Noop);
    assert_eq!(find("otp_expires_idx").state, IndexState::Absent);
    assert_eq!(find("otp_expires_idx").transition, Transition::Create);

    let creates = changes.iter().filter(|change| change.transition == Transition::Create).count();
    assert_eq!(creates, CANONICAL_INDEXES.len() - 1);
}

#[rstest]
#[tokio::test]
async fn plan_matches_what_reconcile_does(collection_names: CollectionNames) {
    let catalog = InMemoryCatalog::new().with_collection("doctors", &["username_1", "doctors_user_type_idx"]);

    let changes = plan(&catalog, &collection_names).await.expect("plan");
    let report = reconcile(&catalog, &collection_names).await;

    let planned_creates = changes.iter().filter(|change| change.transition == Transition::Create).count();
    let planned_drops = changes.iter().filter(|change| change.transition == Transition::Drop).count();
    assert_eq!(report.summary().created, planned_creates);
    assert_eq!(report.summary().dropped, planned_drops);
}

#[rstest]
#[tokio::test]
async fn plan_fails_on_unreadable_catalog(collection_names: CollectionNames) {
    let mut catalog = MockIndexCatalog::new();
    catalog.expect_list_index_names().returning(|_| Err(DatabaseError::Connection("connection refused".to_string())));

    let result = plan(&catalog, &collection_names).await;

    assert_matches!(result, Err(MedauthError::DatabaseError(DatabaseError::Connection(_))));
}

#[rstest]
#[traced_test]
#[tokio::test]
async fn reconcile_logs_changes_and_summary(collection_names: CollectionNames) {
    let catalog = InMemoryCatalog::new().with_collection("doctors", &["email_1"]);

    reconcile(&catalog, &collection_names).await;

    assert!(logs_contain("Dropped legacy index"));
    assert!(logs_contain("Created index"));
    assert!(logs_contain("Index reconciliation finished"));
}

#[rstest]
#[traced_test]
#[tokio::test]
async fn failures_are_logged_as_warnings(collection_names: CollectionNames) {
    let catalog = InMemoryCatalog::new().with_failing_list("otp_codes");

    reconcile(&catalog, &collection_names).await;

    assert!(logs_contain("WARN"));
    assert!(logs_contain("Index operation failed"));
}

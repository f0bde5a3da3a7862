//! Declarative index schema of the MedAuth collections.
//!
//! The canonical indexes carry explicit names (`<collection>_<field>_..._idx`). Earlier
//! deployments let the driver derive names from the key pattern (`email_1`), and those
//! indexes occupy the same keys; they are listed in [`LEGACY_INDEX_NAMES`] and removed
//! before the canonical ones are created.

mod catalog;
pub mod reconciler;
pub mod report;

pub use catalog::{CANONICAL_INDEXES, LEGACY_CLEANUP_COLLECTIONS, LEGACY_INDEX_NAMES};
pub use reconciler::{plan, reconcile, IndexState, PlannedChange, Transition};
pub use report::{OperationKind, OperationOutcome, OperationRecord, ReconcileReport, ReportSummary};

use mongodb::bson::Document;
use mongodb::options::IndexOptions;
use mongodb::IndexModel;
use serde::Serialize;
use std::time::Duration;
use strum_macros::{Display, EnumIter};

/// The collections whose indexes this crate manages.
///
/// Physical names are configurable, see [`crate::types::params::database::CollectionNames`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LogicalCollection {
    Patients,
    Doctors,
    OtpCodes,
    UserSessions,
    PendingUsers,
}

/// Keys of an index: a single ascending field, or an ordered list of (field, direction).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPattern {
    Field(&'static str),
    Compound(&'static [(&'static str, i32)]),
}

impl KeyPattern {
    pub fn to_document(&self) -> Document {
        let mut keys = Document::new();
        match self {
            KeyPattern::Field(field) => {
                keys.insert(*field, 1);
            }
            KeyPattern::Compound(fields) => {
                for (field, direction) in fields.iter() {
                    keys.insert(*field, *direction);
                }
            }
        }
        keys
    }
}

/// A named index the reconciler keeps present on a collection.
///
/// Two specs with the same `name` on the same collection are the same index; the
/// reconciler never redefines an index in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexSpec {
    pub collection: LogicalCollection,
    pub name: &'static str,
    pub keys: KeyPattern,
    pub unique: bool,
    pub expire_after_seconds: Option<u64>,
}

impl IndexSpec {
    pub const fn new(collection: LogicalCollection, name: &'static str, keys: KeyPattern) -> Self {
        Self { collection, name, keys, unique: false, expire_after_seconds: None }
    }

    pub const fn field(collection: LogicalCollection, name: &'static str, field: &'static str) -> Self {
        Self::new(collection, name, KeyPattern::Field(field))
    }

    pub const fn unique(self) -> Self {
        Self { unique: true, ..self }
    }

    /// TTL index: documents expire `seconds` after the date stored in the indexed field.
    pub const fn expire_after(self, seconds: u64) -> Self {
        Self { expire_after_seconds: Some(seconds), ..self }
    }

    pub fn is_compound(&self) -> bool {
        matches!(self.keys, KeyPattern::Compound(fields) if fields.len() > 1)
    }

    pub fn options(&self) -> IndexOptions {
        let mut options = IndexOptions::default();
        options.name = Some(self.name.to_string());
        if self.unique {
            options.unique = Some(true);
        }
        options.expire_after = self.expire_after_seconds.map(Duration::from_secs);
        options
    }

    pub fn to_index_model(&self) -> IndexModel {
        IndexModel::builder().keys(self.keys.to_document()).options(self.options()).build()
    }

    /// Canonical specs targeting `collection`, in declaration order.
    pub fn for_collection(collection: LogicalCollection) -> impl Iterator<Item = &'static IndexSpec> {
        CANONICAL_INDEXES.iter().filter(move |spec| spec.collection == collection)
    }
}

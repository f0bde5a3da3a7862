//! Canonical and legacy index declarations.
//!
//! Indexes:
//! - patients: unique `email`, `username`, `user_id`; `user_type`
//! - doctors: unique `email`, `username`, `user_id`; `user_type`, `specialization`
//! - otp_codes: TTL on `expires_at`
//! - user_sessions: unique `session_id`; `user_id`; TTL on `expires_at`; `{ user_id: 1, is_active: 1 }`
//! - pending_users: `email`, `username`; TTL on `expires_at`

use super::{IndexSpec, KeyPattern, LogicalCollection};
use super::LogicalCollection::{Doctors, OtpCodes, Patients, PendingUsers, UserSessions};

pub const CANONICAL_INDEXES: &[IndexSpec] = &[
    IndexSpec::field(Patients, "patients_email_unique_idx", "email").unique(),
    IndexSpec::field(Patients, "patients_username_unique_idx", "username").unique(),
    IndexSpec::field(Patients, "patients_user_id_unique_idx", "user_id").unique(),
    IndexSpec::field(Patients, "patients_user_type_idx", "user_type"),
    IndexSpec::field(Doctors, "doctors_email_unique_idx", "email").unique(),
    IndexSpec::field(Doctors, "doctors_username_unique_idx", "username").unique(),
    IndexSpec::field(Doctors, "doctors_user_id_unique_idx", "user_id").unique(),
    IndexSpec::field(Doctors, "doctors_user_type_idx", "user_type"),
    IndexSpec::field(Doctors, "doctors_specialization_idx", "specialization"),
    // Expiry happens at the date stored in `expires_at`
    IndexSpec::field(OtpCodes, "otp_expires_idx", "expires_at").expire_after(0),
    IndexSpec::field(UserSessions, "session_id_unique_idx", "session_id").unique(),
    IndexSpec::field(UserSessions, "session_user_id_idx", "user_id"),
    IndexSpec::field(UserSessions, "session_expires_idx", "expires_at").expire_after(0),
    IndexSpec::new(UserSessions, "user_active_sessions_idx", KeyPattern::Compound(&[("user_id", 1), ("is_active", 1)])),
    IndexSpec::field(PendingUsers, "pending_email_idx", "email"),
    IndexSpec::field(PendingUsers, "pending_username_idx", "username"),
    IndexSpec::field(PendingUsers, "pending_expires_idx", "expires_at").expire_after(0),
];

/// Driver-default names (`<field>_1`) created before indexes were named explicitly.
pub const LEGACY_INDEX_NAMES: &[&str] = &["email_1", "username_1", "user_id_1", "user_type_1", "patient_id_1", "mobile_1"];

/// Collections that were indexed under the legacy naming.
pub const LEGACY_CLEANUP_COLLECTIONS: &[LogicalCollection] = &[Patients, Doctors];

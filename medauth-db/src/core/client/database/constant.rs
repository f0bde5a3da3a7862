//! MongoDB server error codes the index catalog distinguishes.
//!
//! See <https://www.mongodb.com/docs/manual/reference/error-codes/>.

pub const NAMESPACE_NOT_FOUND: i32 = 26;
pub const INDEX_NOT_FOUND: i32 = 27;
pub const INDEX_ALREADY_EXISTS: i32 = 68;
pub const INDEX_OPTIONS_CONFLICT: i32 = 85;
pub const INDEX_KEY_SPECS_CONFLICT: i32 = 86;
pub const DUPLICATE_KEY: i32 = 11000;

/// Codes returned by `createIndexes` when an index with the same name or keys already
/// exists, or when existing documents violate a unique constraint.
pub const INDEX_CONFLICT_CODES: &[i32] =
    &[INDEX_ALREADY_EXISTS, INDEX_OPTIONS_CONFLICT, INDEX_KEY_SPECS_CONFLICT, DUPLICATE_KEY];

//! Driver error mapping for Store A
//!
//! Adapters never let `sqlx::Error` escape; every call site funnels
//! through [`map_error`], which folds driver failures into the shared
//! store taxonomy. Duplicate-key and foreign-key violations come back as
//! `Validation`, a missing row as `NotFound`, everything else as
//! `Unavailable` with the driver error kept as `source`.

use core_kernel::StoreError;

/// Store label used in `Unavailable` errors and logs
pub const STORE_NAME: &str = "mysql";

// MySQL server error codes
const ER_DUP_ENTRY: &str = "1062";
const ER_NO_REFERENCED_ROW: &str = "1452";

pub(crate) fn map_error(entity: &'static str, error: sqlx::Error) -> StoreError {
    match error {
        sqlx::Error::RowNotFound => StoreError::not_found(entity),
        sqlx::Error::Database(db) => {
            let code = db.code().map(|c| c.into_owned());
            match code.as_deref() {
                Some(ER_DUP_ENTRY) => {
                    StoreError::validation(format!("duplicate {entity}: {}", db.message()))
                }
                Some(ER_NO_REFERENCED_ROW) => StoreError::validation(format!(
                    "unknown reference for {entity}: {}",
                    db.message()
                )),
                _ => StoreError::unavailable_from(STORE_NAME, sqlx::Error::Database(db)),
            }
        }
        other => StoreError::unavailable_from(STORE_NAME, other),
    }
}

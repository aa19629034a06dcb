use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::db_types::{StaffRole, StaffUser};

#[derive(Debug, Clone, Error)]
pub enum StaffStoreError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("A staff account for {0} already exists")]
    EmailExists(String),
}

impl From<sqlx::Error> for StaffStoreError {
    fn from(e: sqlx::Error) -> Self {
        StaffStoreError::DatabaseError(e.to_string())
    }
}

/// Staff accounts are managed elsewhere. ListPull only needs to look them up so that status changes can be attributed.
#[allow(async_fn_in_trait)]
pub trait StaffManagement {
    async fn fetch_staff_user(&self, id: i64) -> Result<Option<StaffUser>, StaffStoreError>;

    /// Creates a staff account. New accounts must change their password on first login.
    async fn create_staff_user(
        &self,
        email: &str,
        password_hash: &str,
        role: StaffRole,
        now: DateTime<Utc>,
    ) -> Result<StaffUser, StaffStoreError>;
}

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use crate::{
    db_types::{StaffRole, StaffUser},
    traits::StaffStoreError,
};

pub async fn fetch_staff_user(id: i64, conn: &mut SqliteConnection) -> Result<Option<StaffUser>, sqlx::Error> {
    let user = sqlx::query_as("SELECT * FROM staff_users WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(user)
}

pub async fn insert_staff_user(
    email: &str,
    password_hash: &str,
    role: StaffRole,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<StaffUser, StaffStoreError> {
    let result = sqlx::query_as(
        r#"
            INSERT INTO staff_users (email, password_hash, role, must_change_password, created_at)
            VALUES ($1, $2, $3, 1, $4)
            RETURNING *;
        "#,
    )
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .bind(now)
    .fetch_one(conn)
    .await;
    match result {
        Ok(user) => Ok(user),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            Err(StaffStoreError::EmailExists(email.to_string()))
        },
        Err(e) => Err(e.into()),
    }
}

use deadpool_postgres::Pool;
use tokio_postgres::error::SqlState;
use tokio_postgres::Row;

use crate::error::ApiError;
use crate::models::user::User;

fn user_from_row(row: &Row) -> Result<User, tokio_postgres::Error> {
    Ok(User {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        name: row.try_get("name")?,
        created_at: row.try_get("created_at")?,
    })
}

pub struct UserRepository;

impl UserRepository {
    /// Inserts a new user. The unique index on `email` backs the duplicate
    /// check even when two signups race the handler-level pre-check.
    pub async fn insert(pool: &Pool, user: &User) -> Result<(), ApiError> {
        let client = pool.get().await?;
        client
            .execute(
                "INSERT INTO users (id, email, password_hash, name, created_at) \
                 VALUES ($1, $2, $3, $4, $5)",
                &[
                    &user.id,
                    &user.email,
                    &user.password_hash,
                    &user.name,
                    &user.created_at,
                ],
            )
            .await
            .map_err(|e| {
                if e.code() == Some(&SqlState::UNIQUE_VIOLATION) {
                    ApiError::DuplicateEmail
                } else {
                    e.into()
                }
            })?;
        Ok(())
    }

    pub async fn find_by_email(pool: &Pool, email: &str) -> Result<Option<User>, ApiError> {
        let client = pool.get().await?;
        let row = client
            .query_opt(
                "SELECT id, email, password_hash, name, created_at FROM users WHERE email = $1",
                &[&email],
            )
            .await?;

        row.as_ref().map(user_from_row).transpose().map_err(Into::into)
    }
}

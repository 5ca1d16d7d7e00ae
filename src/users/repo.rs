use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use super::repo_types::{NewUser, User};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("email already registered")]
    DuplicateEmail,

    #[error("purchase power would overflow")]
    BalanceOverflow,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Persistence port for user records.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Inserts a new user with zero purchase power. Fails with
    /// [`StoreError::DuplicateEmail`] when the email is taken.
    async fn create(&self, new_user: NewUser) -> Result<User, StoreError>;

    /// Atomically adds `amount` to the user's purchase power and returns the
    /// updated record, or `None` if no such user exists. A sum that is not a
    /// finite number fails with [`StoreError::BalanceOverflow`] and leaves the
    /// balance untouched.
    async fn add_purchase_power(&self, id: Uuid, amount: f64) -> Result<Option<User>, StoreError>;
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, phone, dob, monthly_salary, password_hash,
                   purchase_power, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, phone, dob, monthly_salary, password_hash,
                   purchase_power, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn create(&self, new_user: NewUser) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, name, phone, dob, monthly_salary, password_hash, purchase_power)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 0)
            RETURNING id, email, name, phone, dob, monthly_salary, password_hash,
                      purchase_power, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new_user.email)
        .bind(&new_user.name)
        .bind(&new_user.phone)
        .bind(new_user.dob)
        .bind(new_user.monthly_salary)
        .bind(&new_user.password_hash)
        .fetch_one(&self.db)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                StoreError::DuplicateEmail
            }
            other => StoreError::Database(other),
        })?;
        Ok(user)
    }

    async fn add_purchase_power(&self, id: Uuid, amount: f64) -> Result<Option<User>, StoreError> {
        // Single statement, so concurrent borrows serialize on the row lock.
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
               SET purchase_power = purchase_power + $1
             WHERE id = $2
            RETURNING id, email, name, phone, dob, monthly_salary, password_hash,
                      purchase_power, created_at
            "#,
        )
        .bind(amount)
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| match e {
            // float8 overflow raises numeric_value_out_of_range
            sqlx::Error::Database(ref db_err) if db_err.code().as_deref() == Some("22003") => {
                StoreError::BalanceOverflow
            }
            other => StoreError::Database(other),
        })?;
        Ok(user)
    }
}

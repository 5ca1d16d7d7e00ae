use serde::Serialize;
use sqlx::FromRow;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,                   // store-assigned identifier
    pub email: String,              // unique, normalized login key
    pub name: String,
    pub phone: String,
    pub dob: Date,
    pub monthly_salary: f64,
    pub password_hash: String,      // Argon2 PHC string, never serialized
    pub purchase_power: f64,        // starts at 0, only grows via borrow
    pub created_at: OffsetDateTime,
}

/// Fields required to create a user; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub phone: String,
    pub dob: Date,
    pub monthly_salary: f64,
    pub password_hash: String,
}

/// The only serialized view of a user. Built field by field from [`User`]
/// so nothing sensitive leaks by default.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub phone: String,
    #[serde(serialize_with = "super::dob::serialize")]
    pub dob: Date,
    pub monthly_salary: f64,
    pub purchase_power: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<&User> for PublicUser {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            email: u.email.clone(),
            name: u.name.clone(),
            phone: u.phone.clone(),
            dob: u.dob,
            monthly_salary: u.monthly_salary,
            purchase_power: u.purchase_power,
            created_at: u.created_at,
        }
    }
}

use serde::{Deserialize, Serialize};
use time::Date;

use crate::users::PublicUser;

/// Request body for signup.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub phone: String,
    pub email: String,
    pub name: String,
    #[serde(deserialize_with = "crate::users::dob::deserialize")]
    pub dob: Date,
    pub monthly_salary: f64,
    pub password: String,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response returned after a successful login.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: PublicUser,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

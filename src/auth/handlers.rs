use axum::{
    extract::{rejection::JsonRejection, FromRef, State},
    routing::{get, post},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use time::OffsetDateTime;
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, MessageResponse, SignupRequest},
        extractors::AuthUser,
        jwt::JwtKeys,
        password::{hash_password, meets_policy, verify_password, MIN_PASSWORD_CHARS},
    },
    error::AppError,
    lending::eligibility::is_eligible,
    state::AppState,
    users::{normalize_email, NewUser, PublicUser},
};

fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
}

pub fn user_routes() -> Router<AppState> {
    Router::new().route("/user", get(get_user))
}

fn validate_signup(payload: &SignupRequest) -> Result<(), AppError> {
    if !is_valid_email(&payload.email) {
        return Err(AppError::InvalidInput("Invalid email".into()));
    }
    if payload.name.trim().is_empty() {
        return Err(AppError::InvalidInput("Name is required".into()));
    }
    if payload.phone.trim().is_empty() {
        return Err(AppError::InvalidInput("Phone is required".into()));
    }
    if !meets_policy(&payload.password) {
        return Err(AppError::InvalidInput(format!(
            "Password must be at least {MIN_PASSWORD_CHARS} characters"
        )));
    }
    if !payload.monthly_salary.is_finite() || payload.monthly_salary < 0.0 {
        return Err(AppError::InvalidInput(
            "monthlySalary must be a non-negative number".into(),
        ));
    }
    Ok(())
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let Json(mut payload) = payload?;
    payload.email = normalize_email(&payload.email);

    if let Err(e) = validate_signup(&payload) {
        warn!(email = %payload.email, error = %e, "signup rejected");
        return Err(e);
    }

    let today = OffsetDateTime::now_utc().date();
    if !is_eligible(&state.config.lending, payload.dob, payload.monthly_salary, today) {
        warn!(email = %payload.email, "applicant does not meet the criteria");
        return Err(AppError::IneligibleApplicant);
    }

    // Ensure email is not taken
    if state.users.find_by_email(&payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(AppError::DuplicateEmail);
    }

    let password_hash = hash_password(&payload.password)?;

    let user = state
        .users
        .create(NewUser {
            email: payload.email,
            name: payload.name.trim().to_string(),
            phone: payload.phone.trim().to_string(),
            dob: payload.dob,
            monthly_salary: payload.monthly_salary,
            password_hash,
        })
        .await?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(Json(MessageResponse {
        message: "User created successfully".into(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, AppError> {
    let Json(mut payload) = payload?;
    payload.email = normalize_email(&payload.email);

    let user = match state.users.find_by_email(&payload.email).await? {
        Some(u) => u,
        None => {
            warn!(email = %payload.email, "login unknown email");
            return Err(AppError::UnknownEmail);
        }
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(email = %payload.email, user_id = %user.id, "login invalid password");
        return Err(AppError::PasswordMismatch);
    }

    let keys = JwtKeys::from_ref(&state);
    let token = match keys.sign(&user) {
        Ok(t) => t,
        Err(e) => {
            error!(error = %e, "jwt sign failed");
            return Err(AppError::Internal(e));
        }
    };

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(Json(AuthResponse {
        token,
        user: PublicUser::from(&user),
    }))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<PublicUser>, AppError> {
    let user = state.users.find_by_id(user_id).await?.ok_or_else(|| {
        warn!(%user_id, "user not found");
        AppError::NotFound("User not found".into())
    })?;

    Ok(Json(PublicUser::from(&user)))
}

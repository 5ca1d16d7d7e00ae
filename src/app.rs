use std::net::SocketAddr;

use axum::{routing::get, Json, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use crate::{auth, lending};

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/test", get(|| async { Json("test ok") }))
        .merge(auth::router())
        .merge(lending::router())
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        let latency_ms = latency.as_millis() as u64;
                        if status.is_server_error() {
                            tracing::error!(%status, latency_ms, "response");
                        } else {
                            tracing::info!(%status, latency_ms, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router, host: &str, port: u16) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        extract::FromRef,
        http::{header, Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use time::{Date, Month, OffsetDateTime};
    use tower::ServiceExt;

    async fn call(
        app: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(t) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {t}"));
        }
        let req = match body {
            Some(b) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(b.to_string()))
                .unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };

        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, value)
    }

    fn years_ago(years: i32) -> String {
        let today = OffsetDateTime::now_utc().date();
        Date::from_calendar_date(today.year() - years, Month::January, 1)
            .unwrap()
            .to_string()
    }

    fn signup_body(email: &str, dob: &str, salary: f64) -> Value {
        json!({
            "phone": "+15550100",
            "email": email,
            "name": "Ada Lovelace",
            "dob": dob,
            "monthlySalary": salary,
            "password": "s3cret-password",
        })
    }

    async fn signup_and_login(app: &Router, email: &str) -> (String, Value) {
        let (status, _) = call(
            app,
            Method::POST,
            "/signup",
            None,
            Some(signup_body(email, &years_ago(30), 40_000.0)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = call(
            app,
            Method::POST,
            "/login",
            None,
            Some(json!({ "email": email, "password": "s3cret-password" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        (body["token"].as_str().unwrap().to_string(), body["user"].clone())
    }

    #[tokio::test]
    async fn test_endpoint_answers() {
        let app = build_app(AppState::fake());
        let (status, body) = call(&app, Method::GET, "/test", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!("test ok"));
    }

    #[tokio::test]
    async fn signup_creates_user_with_zero_balance_and_hashed_password() {
        let state = AppState::fake();
        let app = build_app(state.clone());

        let (status, body) = call(
            &app,
            Method::POST,
            "/signup",
            None,
            Some(signup_body("Ada@Example.com ", &years_ago(30), 40_000.0)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "User created successfully");

        let user = state
            .users
            .find_by_email("ada@example.com")
            .await
            .unwrap()
            .expect("user stored");
        assert_eq!(user.purchase_power, 0.0);
        assert_ne!(user.password_hash, "s3cret-password");
        assert!(user.password_hash.starts_with("$argon2"));
    }

    #[tokio::test]
    async fn ineligible_signups_create_nobody() {
        let state = AppState::fake();
        let app = build_app(state.clone());

        for (email, dob, salary) in [
            ("young@example.com", years_ago(10), 90_000.0),
            ("poor@example.com", years_ago(40), 24_999.0),
        ] {
            let (status, body) = call(
                &app,
                Method::POST,
                "/signup",
                None,
                Some(signup_body(email, &dob, salary)),
            )
            .await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["code"], "ineligible_applicant");
            assert_eq!(body["message"], "User does not meet the criteria");
            assert!(state.users.find_by_email(email).await.unwrap().is_none());
        }
    }

    #[tokio::test]
    async fn duplicate_signup_is_conflict() {
        let app = build_app(AppState::fake());
        let body = signup_body("dup@example.com", &years_ago(30), 40_000.0);
        let (first, _) = call(&app, Method::POST, "/signup", None, Some(body.clone())).await;
        assert_eq!(first, StatusCode::OK);
        let (second, resp) = call(&app, Method::POST, "/signup", None, Some(body)).await;
        assert_eq!(second, StatusCode::CONFLICT);
        assert_eq!(resp["code"], "duplicate_email");
    }

    #[tokio::test]
    async fn malformed_signup_is_invalid_input() {
        let app = build_app(AppState::fake());
        let (status, body) = call(
            &app,
            Method::POST,
            "/signup",
            None,
            Some(json!({ "email": "x@example.com" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "invalid_input");

        let (status, body) = call(
            &app,
            Method::POST,
            "/signup",
            None,
            Some(signup_body("x@example.com", "not-a-date", 40_000.0)),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "invalid_input");
    }

    #[tokio::test]
    async fn login_token_carries_stored_identity_and_hides_password() {
        let state = AppState::fake();
        let app = build_app(state.clone());
        let (token, user) = signup_and_login(&app, "grace@example.com").await;

        let stored = state
            .users
            .find_by_email("grace@example.com")
            .await
            .unwrap()
            .unwrap();
        let keys = auth::jwt::JwtKeys::from_ref(&state);
        let claims = keys.verify(&token).expect("token verifies");
        assert_eq!(claims.id, stored.id);
        assert_eq!(claims.email, stored.email);

        let user = user.as_object().unwrap();
        assert_eq!(user["email"], "grace@example.com");
        assert!(!user.contains_key("password"));
        assert!(!user.contains_key("passwordHash"));
    }

    #[tokio::test]
    async fn login_failures_are_distinguishable() {
        let app = build_app(AppState::fake());
        signup_and_login(&app, "known@example.com").await;

        let (status, unknown) = call(
            &app,
            Method::POST,
            "/login",
            None,
            Some(json!({ "email": "nobody@example.com", "password": "whatever1" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(unknown["code"], "unknown_email");

        let (status, mismatch) = call(
            &app,
            Method::POST,
            "/login",
            None,
            Some(json!({ "email": "known@example.com", "password": "wrong-password" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(mismatch["code"], "password_mismatch");
        assert_ne!(unknown["code"], mismatch["code"]);
    }

    #[tokio::test]
    async fn profile_requires_a_valid_token() {
        let app = build_app(AppState::fake());

        let (status, body) = call(&app, Method::GET, "/user", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Token is missing");

        let (status, body) = call(&app, Method::GET, "/user", Some("garbage"), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], "Invalid token");
    }

    fn unsaved_user(email: &str) -> crate::users::User {
        crate::users::User {
            id: uuid::Uuid::new_v4(),
            email: email.into(),
            name: "Ghost".into(),
            phone: "+15550199".into(),
            dob: Date::from_calendar_date(1980, Month::May, 5).unwrap(),
            monthly_salary: 50_000.0,
            password_hash: "unused".into(),
            purchase_power: 0.0,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[tokio::test]
    async fn expired_token_is_forbidden() {
        let state = AppState::fake();
        let app = build_app(state.clone());
        signup_and_login(&app, "late@example.com").await;
        let stored = state
            .users
            .find_by_email("late@example.com")
            .await
            .unwrap()
            .unwrap();

        let keys = auth::jwt::JwtKeys::from_ref(&state);
        let issued =
            OffsetDateTime::now_utc() - time::Duration::hours(1) - time::Duration::seconds(5);
        let expired = keys.sign_at(&stored, issued).unwrap();

        let (status, body) = call(&app, Method::GET, "/user", Some(&expired), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "forbidden");

        let (status, _) = call(
            &app,
            Method::POST,
            "/borrow",
            Some(&expired),
            Some(json!({ "amount": 100 })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn valid_token_for_missing_user_is_not_found() {
        let state = AppState::fake();
        let app = build_app(state.clone());
        let keys = auth::jwt::JwtKeys::from_ref(&state);
        let token = keys.sign(&unsaved_user("ghost@example.com")).unwrap();

        let (status, body) = call(&app, Method::GET, "/user", Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "not_found");

        let (status, body) = call(
            &app,
            Method::POST,
            "/borrow",
            Some(&token),
            Some(json!({ "amount": 100 })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "not_found");
    }

    #[tokio::test]
    async fn bearer_scheme_is_case_insensitive() {
        let app = build_app(AppState::fake());
        let (token, _) = signup_and_login(&app, "caps@example.com").await;

        let req = Request::builder()
            .method(Method::GET)
            .uri("/user")
            .header(header::AUTHORIZATION, format!("BEARER {token}"))
            .body(Body::empty())
            .unwrap();
        let res = app.clone().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn profile_never_includes_password() {
        let app = build_app(AppState::fake());
        let (token, _) = signup_and_login(&app, "profile@example.com").await;

        let (status, body) = call(&app, Method::GET, "/user", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["email"], "profile@example.com");
        assert_eq!(body["name"], "Ada Lovelace");
        assert_eq!(body["purchasePower"], 0.0);
        let obj = body.as_object().unwrap();
        assert!(!obj.contains_key("password"));
        assert!(!obj.contains_key("passwordHash"));
        assert!(!body.to_string().contains("argon2"));
    }

    #[tokio::test]
    async fn borrow_updates_balance_and_quotes_repayment() {
        let app = build_app(AppState::fake());
        let (token, _) = signup_and_login(&app, "borrower@example.com").await;

        let (status, body) = call(
            &app,
            Method::POST,
            "/borrow",
            Some(&token),
            Some(json!({ "amount": 12000 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["purchasePower"].as_f64().unwrap(), 12_000.0);
        let repayment = body["monthlyRepayment"].as_f64().unwrap();
        assert!((repayment - 1080.0).abs() < 1e-9, "got {repayment}");

        let (_, profile) = call(&app, Method::GET, "/user", Some(&token), None).await;
        assert_eq!(profile["purchasePower"].as_f64().unwrap(), 12_000.0);
    }

    #[tokio::test]
    async fn borrow_rejects_bad_amounts() {
        let app = build_app(AppState::fake());
        let (token, _) = signup_and_login(&app, "careful@example.com").await;

        for amount in [json!(0), json!(-50), json!("100"), Value::Null] {
            let (status, body) = call(
                &app,
                Method::POST,
                "/borrow",
                Some(&token),
                Some(json!({ "amount": amount })),
            )
            .await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "amount {amount}");
            assert_eq!(body["code"], "invalid_input");
        }

        let (status, _) = call(
            &app,
            Method::POST,
            "/borrow",
            None,
            Some(json!({ "amount": 10 })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn borrow_never_reports_non_finite_numbers() {
        let state = AppState::fake();
        let app = build_app(state.clone());
        let (token, _) = signup_and_login(&app, "whale@example.com").await;

        let (status, body) = call(
            &app,
            Method::POST,
            "/borrow",
            Some(&token),
            Some(json!({ "amount": 1.7e308 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "invalid_input");

        // Largest accepted amount; a second one would overflow the balance.
        let largest = lending::services::max_amount(&state.config.lending);
        let (status, body) = call(
            &app,
            Method::POST,
            "/borrow",
            Some(&token),
            Some(json!({ "amount": largest })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert!(body["monthlyRepayment"].as_f64().unwrap().is_finite());

        let (status, body) = call(
            &app,
            Method::POST,
            "/borrow",
            Some(&token),
            Some(json!({ "amount": largest })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "invalid_input");

        let (_, profile) = call(&app, Method::GET, "/user", Some(&token), None).await;
        let balance = profile["purchasePower"].as_f64().expect("balance is a number");
        assert_eq!(balance, largest);
    }

    #[tokio::test]
    async fn concurrent_borrows_are_both_applied() {
        let app = build_app(AppState::fake());
        let (token, _) = signup_and_login(&app, "twice@example.com").await;

        let borrow = |app: Router, token: String| async move {
            call(
                &app,
                Method::POST,
                "/borrow",
                Some(&token),
                Some(json!({ "amount": 1000 })),
            )
            .await
        };
        let (a, b) = tokio::join!(
            tokio::spawn(borrow(app.clone(), token.clone())),
            tokio::spawn(borrow(app.clone(), token.clone())),
        );
        assert_eq!(a.unwrap().0, StatusCode::OK);
        assert_eq!(b.unwrap().0, StatusCode::OK);

        let (_, profile) = call(&app, Method::GET, "/user", Some(&token), None).await;
        assert_eq!(profile["purchasePower"].as_f64().unwrap(), 2000.0);
    }
}

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

/// Thresholds and loan terms applied by signup and borrow.
#[derive(Debug, Clone, Deserialize)]
pub struct LendingConfig {
    pub min_age: i32,
    pub min_monthly_salary: f64,
    pub annual_interest_rate: f64,
    pub repayment_months: u32,
}

impl Default for LendingConfig {
    fn default() -> Self {
        Self {
            min_age: 20,
            min_monthly_salary: 25_000.0,
            annual_interest_rate: 0.08,
            repayment_months: 12,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// PostgreSQL connection string; `None` selects the in-memory user store.
    pub database_url: Option<String>,
    pub host: String,
    pub port: u16,
    pub jwt: JwtConfig,
    pub lending: LendingConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty());

        let secret = std::env::var("JWT_SECRET")
            .or_else(|_| std::env::var("ACCESS_TOKEN"))
            .map_err(|_| anyhow::anyhow!("JWT_SECRET must be set"))?;
        anyhow::ensure!(!secret.is_empty(), "JWT_SECRET must not be empty");

        let jwt = JwtConfig {
            secret,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "lendwise".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "lendwise-users".into()),
            ttl_minutes: env_or("JWT_TTL_MINUTES", 60),
        };

        let defaults = LendingConfig::default();
        let lending = LendingConfig {
            min_age: env_or("MIN_APPLICANT_AGE", defaults.min_age),
            min_monthly_salary: env_or("MIN_MONTHLY_SALARY", defaults.min_monthly_salary),
            annual_interest_rate: env_or("ANNUAL_INTEREST_RATE", defaults.annual_interest_rate),
            repayment_months: env_or("REPAYMENT_MONTHS", defaults.repayment_months),
        };
        anyhow::ensure!(lending.repayment_months > 0, "REPAYMENT_MONTHS must be positive");

        Ok(Self {
            database_url,
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env_or("APP_PORT", 8080),
            jwt,
            lending,
        })
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

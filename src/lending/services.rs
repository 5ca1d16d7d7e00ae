use crate::{config::LendingConfig, error::AppError};

/// Flat interest spread evenly over the repayment period; not amortized.
pub fn monthly_repayment(amount: f64, terms: &LendingConfig) -> f64 {
    amount / f64::from(terms.repayment_months) * (1.0 + terms.annual_interest_rate)
}

/// Largest amount whose repayment quote is still a finite number.
pub fn max_amount(terms: &LendingConfig) -> f64 {
    let factor = 1.0 + terms.annual_interest_rate;
    if factor > 1.0 {
        f64::MAX / factor
    } else {
        f64::MAX
    }
}

pub fn validate_amount(amount: f64, terms: &LendingConfig) -> Result<f64, AppError> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(AppError::InvalidInput(
            "amount must be a positive number".into(),
        ));
    }
    if amount > max_amount(terms) {
        return Err(AppError::InvalidInput("amount is too large".into()));
    }
    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repayment_for_twelve_thousand() {
        let r = monthly_repayment(12_000.0, &LendingConfig::default());
        assert!((r - 1080.0).abs() < 1e-9, "got {r}");
    }

    #[test]
    fn repayment_follows_configured_terms() {
        let terms = LendingConfig {
            annual_interest_rate: 0.10,
            repayment_months: 6,
            ..LendingConfig::default()
        };
        let r = monthly_repayment(600.0, &terms);
        assert!((r - 110.0).abs() < 1e-9, "got {r}");
    }

    #[test]
    fn amount_must_be_positive_and_finite() {
        let terms = LendingConfig::default();
        assert_eq!(validate_amount(0.01, &terms).unwrap(), 0.01);
        for bad in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(validate_amount(bad, &terms), Err(AppError::InvalidInput(_))));
        }
    }

    #[test]
    fn amount_whose_quote_would_overflow_is_rejected() {
        let terms = LendingConfig::default();
        assert!(matches!(validate_amount(1.7e308, &terms), Err(AppError::InvalidInput(_))));

        let largest = max_amount(&terms);
        assert!(validate_amount(largest, &terms).is_ok());
        assert!(monthly_repayment(largest, &terms).is_finite());
    }
}

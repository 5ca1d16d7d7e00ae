use time::Date;

use crate::config::LendingConfig;

/// Whole calendar years completed between `dob` and `today`.
///
/// A birthday on Feb 29 completes its year on Mar 1 in non-leap years.
/// Birth dates in the future yield a negative age.
pub fn age_on(dob: Date, today: Date) -> i32 {
    let mut age = today.year() - dob.year();
    if (today.month() as u8, today.day()) < (dob.month() as u8, dob.day()) {
        age -= 1;
    }
    age
}

/// Signup gate: old enough and earning enough.
pub fn is_eligible(policy: &LendingConfig, dob: Date, monthly_salary: f64, today: Date) -> bool {
    age_on(dob, today) >= policy.min_age && monthly_salary >= policy.min_monthly_salary
}

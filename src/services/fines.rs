//! Overdue fine arithmetic.
//!
//! Every screen that shows or stores a fine goes through [`calculate_fine`],
//! so the live figure on a dashboard and the amount frozen at return time can
//! never drift apart. All instants are compared in UTC.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Rate applied when neither the loan nor the caller supplies one.
pub fn default_daily_rate() -> Decimal {
    Decimal::from(10)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FineCalculation {
    pub total_fine: Decimal,
    pub days_overdue: i64,
    pub daily_rate: Decimal,
    pub is_overdue: bool,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FineInputError {
    #[error("`{0}` is neither a YYYY-MM-DD date nor an RFC 3339 timestamp")]
    UnparseableInstant(String),
}

/// `as_of` defaults to now, `daily_rate` to [`default_daily_rate`].
pub fn calculate_fine(
    due_date: DateTime<Utc>,
    as_of: Option<DateTime<Utc>>,
    daily_rate: Option<Decimal>,
) -> FineCalculation {
    let as_of = as_of.unwrap_or_else(Utc::now);
    let daily_rate = daily_rate.unwrap_or_else(default_daily_rate);

    let elapsed_ms = (as_of - due_date).num_milliseconds();
    let days_overdue = elapsed_ms.div_euclid(MILLIS_PER_DAY).max(0);

    FineCalculation {
        total_fine: Decimal::from(days_overdue) * daily_rate,
        days_overdue,
        daily_rate,
        is_overdue: days_overdue > 0,
    }
}

/// Same as [`calculate_fine`] but for string inputs, e.g. `"2024-01-01"`.
pub fn calculate_fine_from_str(
    due_date: &str,
    as_of: Option<&str>,
    daily_rate: Option<Decimal>,
) -> Result<FineCalculation, FineInputError> {
    let due_date = parse_instant(due_date)?;
    let as_of = as_of.map(parse_instant).transpose()?;
    Ok(calculate_fine(due_date, as_of, daily_rate))
}

/// Whole days until `due_date`, rounded up. Negative once the loan is overdue.
pub fn days_remaining(due_date: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let remaining_ms = (due_date - now).num_milliseconds();
    -((-remaining_ms).div_euclid(MILLIS_PER_DAY))
}

/// Date-only input is UTC midnight; timestamps keep their offset and are normalised to UTC.
pub fn parse_instant(input: &str) -> Result<DateTime<Utc>, FineInputError> {
    let input = input.trim();
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(DateTime::<Utc>::from_naive_utc_and_offset(midnight, Utc));
        }
    }
    DateTime::parse_from_rfc3339(input)
        .map(|instant| instant.with_timezone(&Utc))
        .map_err(|_| FineInputError::UnparseableInstant(input.to_string()))
}

/// Default due date for a loan issued at `issued_at`.
pub fn due_date_from(issued_at: DateTime<Utc>, loan_days: i64) -> DateTime<Utc> {
    issued_at + Duration::days(loan_days)
}

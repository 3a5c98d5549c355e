//! Common helpers shared by the calculators.
//!
//! Money rounding, input checks and the month-counting rules used for
//! proportional vacation and 13th salary ("avos").

use chrono::{Datelike, Months, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{EngineError, EngineResult};

/// Minimum days worked in a month for it to count as a full month.
pub const MIN_DAYS_FOR_MONTH: i64 = 15;

/// Rounds a monetary amount to cents, half away from zero.
///
/// # Examples
///
/// ```
/// use folha_engine::calculation::round_money;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// assert_eq!(round_money(Decimal::from_str("123.454").unwrap()), Decimal::from_str("123.45").unwrap());
/// assert_eq!(round_money(Decimal::from_str("123.455").unwrap()), Decimal::from_str("123.46").unwrap());
/// ```
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Largest monetary input accepted (one trillion).
///
/// Keeps every product the calculators form (salary × days, revenue × 12,
/// balance × rate) far inside `Decimal`'s range.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0xD4A5_1000, 0xE8, 0, false, 0);

/// Fails with a validation error unless `0 <= value <= MAX_AMOUNT`.
///
/// # Examples
///
/// ```
/// use folha_engine::calculation::{ensure_amount, MAX_AMOUNT};
/// use rust_decimal::Decimal;
///
/// assert!(ensure_amount("rpa", Decimal::ZERO).is_ok());
/// assert!(ensure_amount("rpa", MAX_AMOUNT).is_ok());
/// assert!(ensure_amount("rpa", Decimal::NEGATIVE_ONE).is_err());
/// assert!(ensure_amount("rpa", MAX_AMOUNT + Decimal::ONE).is_err());
/// ```
pub fn ensure_amount(field: &str, value: Decimal) -> EngineResult<()> {
    if value < Decimal::ZERO {
        return Err(EngineError::validation(
            field,
            format!("must not be negative, got {}", value),
        ));
    }
    if value > MAX_AMOUNT {
        return Err(EngineError::validation(
            field,
            format!("must not exceed {}, got {}", MAX_AMOUNT, value),
        ));
    }
    Ok(())
}

/// Formats a rate fraction as a percentage label ("0.075" -> "7.5%").
pub fn percent_label(rate: Decimal) -> String {
    format!("{}%", (rate * Decimal::ONE_HUNDRED).normalize())
}

/// Returns the last day of the month containing `date`.
pub fn last_day_of_month(date: NaiveDate) -> NaiveDate {
    let first = first_day_of_month(date);
    first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(NaiveDate::MAX)
}

/// Returns the first day of the month containing `date`.
pub fn first_day_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Counts calendar months worked between `from` and `to` (inclusive).
///
/// Work starts at the later of `admission` and `from`. Each calendar month
/// in the range counts when at least [`MIN_DAYS_FOR_MONTH`] days of it were
/// worked. Returns zero when the range is empty.
///
/// # Examples
///
/// ```
/// use folha_engine::calculation::calendar_months_worked;
/// use chrono::NaiveDate;
///
/// let d = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).unwrap();
///
/// // Admitted on the 17th: March has only 15 days worked and still counts.
/// assert_eq!(calendar_months_worked(d(2025, 3, 17), d(2025, 1, 1), d(2025, 12, 31)), 10);
/// // Admitted on the 18th: March has 14 days and does not count.
/// assert_eq!(calendar_months_worked(d(2025, 3, 18), d(2025, 1, 1), d(2025, 12, 31)), 9);
/// ```
pub fn calendar_months_worked(admission: NaiveDate, from: NaiveDate, to: NaiveDate) -> u32 {
    let start = admission.max(from);
    if to < start {
        return 0;
    }

    let mut months = 0;
    let mut month_start = first_day_of_month(start);
    while month_start <= to {
        let worked_from = start.max(month_start);
        let worked_to = to.min(last_day_of_month(month_start));
        let days = (worked_to - worked_from).num_days() + 1;
        if days >= MIN_DAYS_FOR_MONTH {
            months += 1;
        }
        month_start = match month_start.checked_add_months(Months::new(1)) {
            Some(next) => next,
            None => break,
        };
    }
    months
}

/// Counts months of an acquisition period from `period_start` through `end`
/// (inclusive), counting a trailing fraction of at least
/// [`MIN_DAYS_FOR_MONTH`] days as a month. Capped at 12.
pub fn acquisition_months(period_start: NaiveDate, end: NaiveDate) -> u32 {
    if end < period_start {
        return 0;
    }
    let Some(end_exclusive) = end.succ_opt() else {
        return 12;
    };

    let mut whole = 0u32;
    while whole < 12 {
        match period_start.checked_add_months(Months::new(whole + 1)) {
            Some(next) if next <= end_exclusive => whole += 1,
            _ => break,
        }
    }

    if whole >= 12 {
        return 12;
    }

    let remainder_start = period_start
        .checked_add_months(Months::new(whole))
        .unwrap_or(period_start);
    let remainder_days = (end_exclusive - remainder_start).num_days();
    if remainder_days >= MIN_DAYS_FOR_MONTH {
        whole + 1
    } else {
        whole
    }
}

/// Start of the acquisition period containing `date`: the most recent
/// anniversary of `admission` on or before `date`.
pub fn acquisition_period_start(admission: NaiveDate, date: NaiveDate) -> NaiveDate {
    let mut start = admission;
    let mut years = 1;
    while let Some(next) = admission.checked_add_months(Months::new(12 * years)) {
        if next > date {
            break;
        }
        start = next;
        years += 1;
    }
    start
}

//! Expiry arithmetic.
//!
//! Operators enter "days until expiry"; the backend stores an absolute
//! `YYYY-MM-DD` date. All functions take `today` explicitly so callers decide
//! which clock (local, UTC, fixed in tests) applies.

use core::fmt;

use chrono::{Days, NaiveDate};

/// Wire format of expiry dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Date that lies `days` whole days after `today`.
///
/// Fractional days are floored and negative (or NaN) input counts as zero.
#[must_use]
pub fn expiry_from_days(days: f64, today: NaiveDate) -> NaiveDate {
    let whole = if days.is_finite() { days.floor().max(0.0) } else { 0.0 };
    // u32::MAX days is far beyond chrono's range anyway
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let whole = whole.min(f64::from(u32::MAX)) as u64;
    today.checked_add_days(Days::new(whole)).unwrap_or(NaiveDate::MAX)
}

/// Whole days from `today` until `expiry`, floored at zero.
#[must_use]
pub fn remaining_days(expiry: NaiveDate, today: NaiveDate) -> i64 {
    (expiry - today).num_days().max(0)
}

/// Parse a stored expiry date.
///
/// Accepts a bare `YYYY-MM-DD` as well as a full timestamp whose first ten
/// characters are the date.
#[must_use]
pub fn parse_expiry_date(s: &str) -> Option<NaiveDate> {
    let trimmed = s.trim();
    let date_part = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, DATE_FORMAT).ok()
}

/// Expiry as entered on a form: nothing, a number of days, or a raw string.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ExpiryInput {
    /// No expiry.
    #[default]
    None,
    /// Days from today.
    Days(f64),
    /// A string passed through to the backend unchanged.
    Date(String),
}

impl ExpiryInput {
    /// Prefill form input from a stored expiry date.
    ///
    /// A parseable date becomes the remaining number of days; anything else
    /// is kept verbatim so the operator sees what the backend holds.
    #[must_use]
    pub fn from_stored(stored: Option<&str>, today: NaiveDate) -> Self {
        match stored {
            None => Self::None,
            Some(s) if s.trim().is_empty() => Self::None,
            Some(s) => match parse_expiry_date(s) {
                #[allow(clippy::cast_precision_loss)]
                Some(date) => Self::Days(remaining_days(date, today) as f64),
                None => Self::Date(s.to_owned()),
            },
        }
    }

    /// Backend representation: `YYYY-MM-DD` for a day count, the raw string
    /// for a date, `None` when empty.
    #[must_use]
    pub fn to_wire(&self, today: NaiveDate) -> Option<String> {
        match self {
            Self::None => None,
            Self::Days(days) => Some(
                expiry_from_days(*days, today)
                    .format(DATE_FORMAT)
                    .to_string(),
            ),
            Self::Date(s) if s.trim().is_empty() => None,
            Self::Date(s) => Some(s.clone()),
        }
    }

    /// Resolve to a concrete date, if one can be determined.
    #[must_use]
    pub fn to_date(&self, today: NaiveDate) -> Option<NaiveDate> {
        match self {
            Self::None => None,
            Self::Days(days) => Some(expiry_from_days(*days, today)),
            Self::Date(s) => parse_expiry_date(s),
        }
    }
}

impl fmt::Display for ExpiryInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("never"),
            Self::Days(days) => write!(f, "{days} days"),
            Self::Date(s) => f.write_str(s),
        }
    }
}

impl std::str::FromStr for ExpiryInput {
    type Err = std::convert::Infallible;

    /// Numbers are days, blank is no expiry, anything else is a date string.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim();
        if value.is_empty() {
            return Ok(Self::None);
        }
        Ok(value
            .parse::<f64>()
            .map_or_else(|_| Self::Date(value.to_owned()), Self::Days))
    }
}

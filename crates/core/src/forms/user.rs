//! Panel client (end user) form.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::{TextRule, ValidationErrors};
use crate::types::{ExpiryInput, Traffic, TrafficError};

const EMAIL: TextRule = TextRule {
    field: "email",
    label: "Username/Email",
    required: true,
    min: 1,
    max: 100,
};

/// Smallest quota a client can be given, in GB.
pub const MIN_TOTAL_GB: Decimal = Decimal::from_parts(1, 0, 0, false, 1);

/// Largest quota a client can be given, in GB (just under 107 TB).
pub const MAX_TOTAL_GB: Decimal = Decimal::from_parts(10_995_116, 0, 0, false, 2);

/// Values of the client form.
#[derive(Debug, Clone, PartialEq)]
pub struct UserForm {
    /// Client identifier on the panel (3x-ui calls it email).
    pub email: String,
    pub total_gb: Decimal,
    pub expiry: ExpiryInput,
}

impl UserForm {
    /// Validate the form.
    ///
    /// # Errors
    ///
    /// Returns the field errors when a rule fails.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.email.chars().count() > EMAIL.max {
            errors.add(EMAIL.field, "Maximum 100 characters");
        } else {
            EMAIL.check(&self.email, &mut errors);
        }

        if self.total_gb < MIN_TOTAL_GB {
            errors.add("totalGb", "Minimum traffic is 0.1 GB");
        } else if self.total_gb > MAX_TOTAL_GB {
            errors.add("totalGb", "Maximum traffic is ~107 TB");
        }

        match &self.expiry {
            ExpiryInput::Days(days) if !days.is_finite() => {
                errors.add("expiryDatetime", "Expiry must be a number of days");
            }
            ExpiryInput::Date(s)
                if !s.trim().is_empty() && crate::types::parse_expiry_date(s).is_none() =>
            {
                errors.add("expiryDatetime", "Expiry must be a date (YYYY-MM-DD)");
            }
            _ => {}
        }

        errors.into_result()
    }

    /// Quota in bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the amount cannot be represented.
    pub fn total(&self) -> Result<Traffic, TrafficError> {
        Traffic::from_gb(self.total_gb)
    }

    /// Expiry as unix milliseconds at UTC midnight, `0` meaning never.
    #[must_use]
    pub fn expiry_time_ms(&self, today: NaiveDate) -> i64 {
        self.expiry
            .to_date(today)
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map_or(0, |dt| dt.and_utc().timestamp_millis())
    }
}

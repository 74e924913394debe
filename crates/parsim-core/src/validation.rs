use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Total digits allowed in a price, fraction included.
pub const PRICE_MAX_DIGITS: u32 = 10;
/// Digits allowed after the decimal point in a price.
pub const PRICE_DECIMAL_PLACES: u32 = 2;

pub const RATING_MIN: i32 = 1;
pub const RATING_MAX: i32 = 5;

pub const PHONE_NUMBER_MAX_LEN: usize = 15;
pub const EMAIL_MAX_LEN: usize = 254;

/// Field name -> error messages, collected while checking a submitted form.
///
/// A form is valid when no field has collected a message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for a single error on a single field.
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn merge(&mut self, other: FieldErrors) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }

    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    /// Non-blank string. Returns whether the value was present.
    pub fn required(&mut self, field: &str, value: &str) -> bool {
        if value.trim().is_empty() {
            self.add(field, "This field is required.");
            false
        } else {
            true
        }
    }

    /// Length limit in characters, not bytes.
    pub fn max_length(&mut self, field: &str, value: &str, max: usize) {
        let len = value.chars().count();
        if len > max {
            self.add(
                field,
                format!("Ensure this value has at most {max} characters (it has {len})."),
            );
        }
    }

    pub fn required_max_length(&mut self, field: &str, value: &str, max: usize) {
        if self.required(field, value) {
            self.max_length(field, value, max);
        }
    }

    pub fn optional_max_length(&mut self, field: &str, value: Option<&str>, max: usize) {
        if let Some(value) = value {
            self.max_length(field, value, max);
        }
    }

    pub fn rating(&mut self, field: &str, value: i32) {
        if !(RATING_MIN..=RATING_MAX).contains(&value) {
            self.add(
                field,
                format!("Select a valid choice. {value} is not one of the available choices."),
            );
        }
    }

    /// Non-negative decimal with at most 10 digits, 2 of them after the point.
    pub fn price(&mut self, field: &str, value: &Decimal) {
        if value.is_sign_negative() && !value.is_zero() {
            self.add(field, "Ensure this value is greater than or equal to 0.");
            return;
        }

        let (digits, decimals) = digit_counts(value);
        let whole_digits = digits.saturating_sub(decimals);
        let max_whole_digits = PRICE_MAX_DIGITS - PRICE_DECIMAL_PLACES;

        if digits > PRICE_MAX_DIGITS {
            self.add(
                field,
                format!("Ensure that there are no more than {PRICE_MAX_DIGITS} digits in total."),
            );
        }
        if decimals > PRICE_DECIMAL_PLACES {
            self.add(
                field,
                format!("Ensure that there are no more than {PRICE_DECIMAL_PLACES} decimal places."),
            );
        }
        if whole_digits > max_whole_digits {
            self.add(
                field,
                format!(
                    "Ensure that there are no more than {max_whole_digits} digits before the decimal point."
                ),
            );
        }
    }

    pub fn email(&mut self, field: &str, value: &str) {
        if value.is_empty() {
            return;
        }
        self.max_length(field, value, EMAIL_MAX_LEN);
        if !is_valid_email(value) {
            self.add(field, "Enter a valid email address.");
        }
    }

    pub fn phone_number(&mut self, field: &str, value: &str) {
        if !self.required(field, value) {
            return;
        }
        self.max_length(field, value, PHONE_NUMBER_MAX_LEN);
        if !value
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '+' | '-' | '(' | ')'))
        {
            self.add(field, "Enter a valid phone number.");
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

impl std::error::Error for FieldErrors {}

/// Significant digits and fraction digits of `value`, ignoring trailing zeros.
fn digit_counts(value: &Decimal) -> (u32, u32) {
    let normalized = value.normalize();
    let mantissa = normalized.mantissa().unsigned_abs();
    let mut digits = 1;
    let mut rest = mantissa / 10;
    while rest > 0 {
        digits += 1;
        rest /= 10;
    }
    let decimals = normalized.scale();
    // 0.05 has one significant digit but still needs a leading zero slot.
    (digits.max(decimals), decimals)
}

/// Store every price with exactly two fraction digits.
pub fn normalize_price(value: Decimal) -> Decimal {
    let mut value = value.round_dp(PRICE_DECIMAL_PLACES);
    value.rescale(PRICE_DECIMAL_PLACES);
    value
}

/// One `@`, no whitespace, and a dotted domain. Dotless hosts such as
/// `user@localhost` are rejected, as Django's `EmailValidator` does.
fn is_valid_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !value.chars().any(char::is_whitespace)
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

use thiserror::Error;

/// Money is represented as integer cents to avoid floating-point precision issues.
/// For USD, 1 dollar = 100 cents, so $50.00 = 5000 cents.
pub type Cents = i64;

/// Format cents as a US-dollar display string with thousands separators.
/// Example: 123456 -> "$1,234.56", -500 -> "-$5.00"
pub fn format_currency(cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs_cents = cents.unsigned_abs();
    let units = (abs_cents / 100).to_string();
    let remainder = abs_cents % 100;

    let mut grouped = String::with_capacity(units.len() + units.len() / 3);
    for (i, digit) in units.chars().enumerate() {
        if i > 0 && (units.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    format!("{}${}.{:02}", sign, grouped, remainder)
}

/// Parse a display string produced by [`format_currency`] back into cents.
/// Also accepts plain decimals without the dollar sign or separators.
pub fn parse_currency(input: &str) -> Result<Cents, ParseCentsError> {
    let input = input.trim();
    let (negative, rest) = match input.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, input),
    };
    let rest = rest.strip_prefix('$').unwrap_or(rest);

    let digits: String = rest.chars().filter(|c| *c != ',').collect();
    signed(negative, parse_magnitude(&digits)?)
}

/// Parse a decimal string into cents.
/// Example: "50.00" -> 5000, "12.5" -> 1250, "100" -> 10000
pub fn parse_cents(input: &str) -> Result<Cents, ParseCentsError> {
    let input = input.trim();
    match input.strip_prefix('-') {
        Some(rest) => signed(true, parse_magnitude(rest)?),
        None => signed(false, parse_magnitude(input)?),
    }
}

/// Unsigned cents of a decimal string, so the magnitude of `i64::MIN` fits.
fn parse_magnitude(input: &str) -> Result<u64, ParseCentsError> {
    let parts: Vec<&str> = input.split('.').collect();
    match parts.len() {
        1 => parse_units(parts[0])?
            .checked_mul(100)
            .ok_or(ParseCentsError::Overflow),
        2 => {
            let units = if parts[0].is_empty() {
                0
            } else {
                parse_units(parts[0])?
            };

            // Pad or truncate the fraction to 2 digits
            let decimal_str = parts[1];
            if !decimal_str.chars().all(|c| c.is_ascii_digit()) {
                return Err(ParseCentsError::InvalidFormat);
            }
            let decimal_cents = match decimal_str.len() {
                0 => 0,
                1 => parse_units(decimal_str)? * 10,
                _ => parse_units(&decimal_str[..2])?,
            };

            units
                .checked_mul(100)
                .and_then(|c| c.checked_add(decimal_cents))
                .ok_or(ParseCentsError::Overflow)
        }
        _ => Err(ParseCentsError::InvalidFormat),
    }
}

fn signed(negative: bool, magnitude: u64) -> Result<Cents, ParseCentsError> {
    let cents = if negative {
        0i64.checked_sub_unsigned(magnitude)
    } else {
        Cents::try_from(magnitude).ok()
    };
    cents.ok_or(ParseCentsError::Overflow)
}

fn parse_units(digits: &str) -> Result<u64, ParseCentsError> {
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(ParseCentsError::InvalidFormat);
    }
    digits.parse().map_err(|_| ParseCentsError::Overflow)
}

/// Convert a major-unit amount (e.g. dollars from a form) to cents, rounding
/// half away from zero. Returns `None` for NaN, infinities and out-of-range values.
pub fn cents_from_major(amount: f64) -> Option<Cents> {
    if !amount.is_finite() {
        return None;
    }
    let cents = (amount * 100.0).round();
    if cents.abs() >= i64::MAX as f64 {
        return None;
    }
    Some(cents as Cents)
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseCentsError {
    #[error("invalid money format")]
    InvalidFormat,

    #[error("amount out of range")]
    Overflow,
}

//! Amounts, direction markers and the number conventions statements print them in.
//!
//! Parsing is locale-aware (each layout pins one [`NumberFormat`]); rendering is
//! always canonical: two decimals, `.` as decimal separator, no grouping.

use rust_decimal::Decimal;

/// Which way money moved according to the source document's own marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Payment or refund: reduces the amount owed.
    Credit,
    /// Purchase or fee: increases the amount owed.
    Debit,
}

/// An unsigned amount together with the direction it was printed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignedAmount {
    pub magnitude: Decimal,
    pub direction: Direction,
}

impl SignedAmount {
    pub fn new(magnitude: Decimal, direction: Direction) -> Self {
        Self {
            magnitude: magnitude.abs(),
            direction,
        }
    }

    /// For layouts that print a plain sign: negative numbers are debits.
    pub fn from_signed(value: Decimal) -> Self {
        let direction = if value.is_sign_negative() && !value.is_zero() {
            Direction::Debit
        } else {
            Direction::Credit
        };
        Self::new(value, direction)
    }

    /// The value under [`SIGN_CONVENTION`].
    pub fn signed(&self) -> Decimal {
        SIGN_CONVENTION.apply(*self)
    }
}

/// How a [`Direction`] maps onto the sign of a stored amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignConvention {
    CreditPositive,
    DebitPositive,
}

impl SignConvention {
    pub fn apply(self, amount: SignedAmount) -> Decimal {
        let positive = matches!(
            (self, amount.direction),
            (SignConvention::CreditPositive, Direction::Credit)
                | (SignConvention::DebitPositive, Direction::Debit)
        );
        if positive || amount.magnitude.is_zero() {
            amount.magnitude
        } else {
            -amount.magnitude
        }
    }
}

/// The one convention used for transactions, balances and the balance check.
pub const SIGN_CONVENTION: SignConvention = SignConvention::CreditPositive;

/// Decimal and thousands separators of a statement provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberFormat {
    pub decimal_separator: char,
    pub thousands_separator: char,
}

impl NumberFormat {
    /// `1.234,56`
    pub const DUTCH: Self = Self {
        decimal_separator: ',',
        thousands_separator: '.',
    };

    /// `1,234.56`
    pub const ENGLISH: Self = Self {
        decimal_separator: '.',
        thousands_separator: ',',
    };

    /// Parse a numeric token such as `€ 1.234,56` or `-1,234.56`.
    ///
    /// Currency symbols and spaces are ignored and a leading sign is honoured.
    /// Returns `None` for anything else, including a second decimal separator.
    pub fn parse(&self, token: &str) -> Option<Decimal> {
        let cleaned: String = token
            .chars()
            .filter(|c| !c.is_whitespace() && !matches!(c, '€' | '$' | '£'))
            .collect();

        let (negative, digits) = match cleaned.chars().next()? {
            '-' | '−' => (true, &cleaned[cleaned.chars().next()?.len_utf8()..]),
            '+' => (false, &cleaned[1..]),
            _ => (false, cleaned.as_str()),
        };

        let (integer, fraction) = match digits.split_once(self.decimal_separator) {
            Some((integer, fraction)) => (integer, Some(fraction)),
            None => (digits, None),
        };

        let mut normalized = self.integer_digits(integer)?;
        match fraction {
            Some(fraction) => {
                if fraction.is_empty() || !fraction.chars().all(|c| c.is_ascii_digit()) {
                    return None;
                }
                if normalized.is_empty() {
                    normalized.push('0');
                }
                normalized.push('.');
                normalized.push_str(fraction);
            }
            None if normalized.is_empty() => return None,
            None => {}
        }

        let value: Decimal = normalized.parse().ok()?;
        Some(if negative { -value } else { value })
    }

    /// Digits before the decimal separator. Grouped input must use groups of
    /// exactly three digits after a leading group of one to three.
    fn integer_digits(&self, integer: &str) -> Option<String> {
        let groups: Vec<&str> = integer.split(self.thousands_separator).collect();
        if groups.iter().any(|g| !g.chars().all(|c| c.is_ascii_digit())) {
            return None;
        }
        if let [first, rest @ ..] = groups.as_slice() {
            if !rest.is_empty() && (!(1..=3).contains(&first.len()) || rest.iter().any(|g| g.len() != 3)) {
                return None;
            }
        }
        Some(groups.concat())
    }
}

/// Tolerance of the balance check: anything below half a cent is rounding.
pub fn within_tolerance(delta: Decimal) -> bool {
    delta.abs() < Decimal::new(5, 3)
}

/// Canonical amount text: exactly two decimals, `.` separator, no `-0.00`.
pub fn render_amount(value: Decimal) -> String {
    let mut rounded = value.round_dp(2);
    if rounded.is_zero() {
        rounded.set_sign_positive(true);
    }
    rounded.rescale(2);
    rounded.to_string()
}

/// Canonical exchange-rate text: the rate without trailing zeros.
pub fn render_rate(value: Decimal) -> String {
    value.normalize().to_string()
}

/// `serialize_with` helpers that keep JSON output on the canonical text forms.
pub mod serde_text {
    use rust_decimal::Decimal;
    use serde::Serializer;

    use super::{render_amount, render_rate};

    pub fn amount<S: Serializer>(value: &Decimal, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&render_amount(*value))
    }

    pub fn amount_opt<S: Serializer>(value: &Option<Decimal>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => s.serialize_str(&render_amount(*v)),
            None => s.serialize_none(),
        }
    }

    pub fn rate_opt<S: Serializer>(value: &Option<Decimal>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => s.serialize_str(&render_rate(*v)),
            None => s.serialize_none(),
        }
    }
}

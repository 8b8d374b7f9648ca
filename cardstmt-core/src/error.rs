use rust_decimal::Decimal;
use std::fmt;
use thiserror::Error;

/// Position of a reconstructed line: page number and 1-based line on that page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LineRef {
    pub page: u32,
    pub line: u32,
}

impl LineRef {
    pub fn new(page: u32, line: u32) -> Self {
        Self { page, line }
    }
}

impl fmt::Display for LineRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "page {}, line {}", self.page, self.line)
    }
}

/// Why a document could not be turned into a [`Statement`](crate::Statement).
///
/// Every variant aborts the parse of that document; no partial statement is
/// ever returned alongside one of these.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    /// A line that should match a structural pattern does not.
    #[error("unrecognized layout at {at}: {reason}")]
    UnrecognizedLayout { at: LineRef, reason: String },

    /// A numeric token is not valid under the layout's number convention.
    #[error("cannot parse amount {token:?} at {at}")]
    AmountParse { at: LineRef, token: String },

    /// A required section (period header, account summary) is absent.
    #[error("missing section: {section}")]
    MissingSection { section: String },

    /// Opening balance plus transactions does not give the stated closing balance.
    #[error(
        "balance mismatch for {}: stated closing {stated}, computed {computed} (delta {delta})",
        scope_label(.card_identifier)
    )]
    BalanceMismatch {
        card_identifier: Option<String>,
        stated: Decimal,
        computed: Decimal,
        delta: Decimal,
    },

    /// A transaction received a second foreign-currency detail line.
    #[error("second foreign-currency detail at {at} for the transaction starting at {started_at}")]
    DuplicateCurrencyDetail { at: LineRef, started_at: LineRef },
}

impl ParseError {
    pub fn layout(at: LineRef, reason: impl Into<String>) -> Self {
        Self::UnrecognizedLayout {
            at,
            reason: reason.into(),
        }
    }

    pub fn amount(at: LineRef, token: impl Into<String>) -> Self {
        Self::AmountParse {
            at,
            token: token.into(),
        }
    }

    pub fn missing(section: impl Into<String>) -> Self {
        Self::MissingSection {
            section: section.into(),
        }
    }
}

fn scope_label(card_identifier: &Option<String>) -> String {
    match card_identifier {
        Some(card) => format!("card {card}"),
        None => "account".to_string(),
    }
}

pub type Result<T> = std::result::Result<T, ParseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balance_mismatch_names_the_card() {
        let err = ParseError::BalanceMismatch {
            card_identifier: Some("1234".to_string()),
            stated: Decimal::new(6550, 2),
            computed: Decimal::new(13450, 2),
            delta: Decimal::new(6900, 2),
        };
        let msg = err.to_string();
        assert!(msg.contains("card 1234"), "{msg}");
        assert!(msg.contains("delta 69.00"), "{msg}");
    }

    #[test]
    fn test_account_scope_label() {
        let err = ParseError::BalanceMismatch {
            card_identifier: None,
            stated: Decimal::ZERO,
            computed: Decimal::ONE,
            delta: Decimal::ONE,
        };
        assert!(err.to_string().starts_with("balance mismatch for account"));
    }

    #[test]
    fn test_line_ref_display() {
        let err = ParseError::amount(LineRef::new(2, 14), "12,3x");
        assert_eq!(err.to_string(), "cannot parse amount \"12,3x\" at page 2, line 14");
    }
}

//! Transaction builder: folds classified lines into transactions, plus the
//! header fields and summary entries found along the way.

use cardstmt_core::{LineRef, ParseError, Result, SignedAmount, Transaction};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::debug;

use crate::classify::{
    ClassifiedLine, CurrencyDetail, ForeignAmount, HeaderField, LineKind, SummaryKey,
    TransactionStart,
};

/// A header field and where it was read.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderEntry {
    pub at: LineRef,
    pub field: HeaderField,
}

/// A balance or total, scoped to the card section it appeared in.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryEntry {
    pub at: LineRef,
    pub card_identifier: Option<String>,
    pub key: SummaryKey,
    pub amount: SignedAmount,
}

/// Everything the builder hands to the assembler.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub transactions: Vec<Transaction>,
    pub header: Vec<HeaderEntry>,
    pub summaries: Vec<SummaryEntry>,
}

#[derive(Debug)]
struct OpenTransaction {
    started_at: LineRef,
    date: NaiveDate,
    card_identifier: Option<String>,
    description: Vec<String>,
    amount: SignedAmount,
    foreign: Option<ForeignAmount>,
    exchange_rate: Option<Decimal>,
    detail_at: Option<LineRef>,
}

impl OpenTransaction {
    fn new(at: LineRef, start: &TransactionStart, card_identifier: Option<String>) -> Self {
        Self {
            started_at: at,
            date: start.date,
            card_identifier,
            description: vec![start.description.clone()],
            amount: start.amount,
            foreign: start.foreign.clone(),
            exchange_rate: None,
            detail_at: None,
        }
    }

    fn attach_detail(&mut self, at: LineRef, detail: &CurrencyDetail) -> Result<()> {
        if self.detail_at.is_some() {
            return Err(ParseError::DuplicateCurrencyDetail {
                at,
                started_at: self.started_at,
            });
        }

        if let (Some(foreign), Some(currency)) = (&self.foreign, &detail.currency) {
            if foreign.currency != *currency {
                return Err(ParseError::layout(
                    at,
                    format!("exchange rate for {currency} on a {} transaction", foreign.currency),
                ));
            }
        }
        if let (Some(foreign), Some(amount)) = (&self.foreign, detail.amount) {
            if foreign.amount != amount {
                return Err(ParseError::layout(
                    at,
                    format!("foreign amount {amount} differs from {} on the transaction row", foreign.amount),
                ));
            }
        }
        if self.foreign.is_none() {
            if let (Some(currency), Some(amount)) = (&detail.currency, detail.amount) {
                self.foreign = Some(ForeignAmount {
                    amount,
                    currency: currency.clone(),
                });
            }
        }

        self.exchange_rate = Some(detail.rate);
        self.detail_at = Some(at);
        Ok(())
    }

    fn finish(self) -> Result<Transaction> {
        let description = self.description.join("\n");
        if description.trim().is_empty() {
            return Err(ParseError::layout(self.started_at, "transaction without description"));
        }

        let direction = self.amount.direction;
        let (foreign_amount, foreign_currency) = match self.foreign {
            Some(f) => (
                Some(SignedAmount::new(f.amount, direction).signed()),
                Some(f.currency),
            ),
            None => (None, None),
        };

        Ok(Transaction {
            date: self.date,
            card_identifier: self.card_identifier,
            description,
            amount: self.amount.signed(),
            foreign_amount,
            foreign_currency,
            exchange_rate: self.exchange_rate,
        })
    }
}

#[derive(Debug, Default)]
enum Accumulator {
    #[default]
    Idle,
    Open(OpenTransaction),
}

/// Idle/open accumulator over the classified lines of one document.
#[derive(Debug, Default)]
pub struct TransactionBuilder {
    accumulator: Accumulator,
    current_card: Option<String>,
    out: Extraction,
}

impl TransactionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, line: &ClassifiedLine) -> Result<()> {
        let at = line.at();
        match &line.kind {
            LineKind::TransactionStart(start) => {
                self.flush()?;
                self.accumulator =
                    Accumulator::Open(OpenTransaction::new(at, start, self.current_card.clone()));
            }
            LineKind::Continuation(text) => match &mut self.accumulator {
                Accumulator::Open(open) => open.description.push(text.clone()),
                Accumulator::Idle => {
                    return Err(ParseError::layout(at, "continuation text outside a transaction"));
                }
            },
            LineKind::ForeignCurrencyDetail(detail) => match &mut self.accumulator {
                Accumulator::Open(open) => open.attach_detail(at, detail)?,
                Accumulator::Idle => {
                    return Err(ParseError::layout(
                        at,
                        "foreign-currency detail without a preceding transaction",
                    ));
                }
            },
            LineKind::Header(fields) => {
                self.flush()?;
                for field in fields {
                    if let HeaderField::CardSection(card) = field {
                        debug!(at = %at, card = %card, "card section");
                        self.current_card = Some(card.clone());
                    }
                    self.out.header.push(HeaderEntry {
                        at,
                        field: field.clone(),
                    });
                }
            }
            LineKind::AccountSummary(entries) => {
                self.flush()?;
                for (key, amount) in entries {
                    self.out.summaries.push(SummaryEntry {
                        at,
                        card_identifier: self.current_card.clone(),
                        key: *key,
                        amount: *amount,
                    });
                }
            }
            LineKind::Noise => self.flush()?,
            LineKind::Footer => {}
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if let Accumulator::Open(open) = std::mem::take(&mut self.accumulator) {
            let tx = open.finish()?;
            self.out.transactions.push(tx);
        }
        Ok(())
    }

    pub fn finish(mut self) -> Result<Extraction> {
        self.flush()?;
        Ok(self.out)
    }
}

pub fn build_transactions(lines: &[ClassifiedLine]) -> Result<Extraction> {
    let mut builder = TransactionBuilder::new();
    for line in lines {
        builder.push(line)?;
    }
    builder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lines::RawLine;
    use cardstmt_core::Direction;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn line(n: u32, kind: LineKind) -> ClassifiedLine {
        ClassifiedLine {
            line: RawLine {
                page: 1,
                line: n,
                top: n as f32 * 12.0,
                text: String::new(),
            },
            kind,
        }
    }

    fn start(description: &str, amount: &str, direction: Direction) -> LineKind {
        LineKind::TransactionStart(TransactionStart {
            date: NaiveDate::from_ymd_opt(2025, 6, 10).unwrap(),
            description: description.to_string(),
            amount: SignedAmount::new(d(amount), direction),
            foreign: None,
        })
    }

    fn detail(amount: Option<&str>, currency: &str, rate: &str) -> LineKind {
        LineKind::ForeignCurrencyDetail(CurrencyDetail {
            amount: amount.map(d),
            currency: Some(currency.to_string()),
            rate: d(rate),
        })
    }

    #[test]
    fn test_continuations_fold_in_order() {
        let lines = vec![
            line(1, start("Hotel Booking", "120.00", Direction::Debit)),
            line(2, LineKind::Continuation("Grand Hotel Central".to_string())),
            line(3, LineKind::Footer),
            line(4, LineKind::Continuation("Room 204".to_string())),
            line(5, detail(Some("130.43"), "USD", "0.92")),
        ];
        let out = build_transactions(&lines).unwrap();
        assert_eq!(out.transactions.len(), 1);
        let tx = &out.transactions[0];
        assert_eq!(tx.description, "Hotel Booking\nGrand Hotel Central\nRoom 204");
        assert_eq!(tx.amount, d("-120.00"));
        assert_eq!(tx.foreign_amount, Some(d("-130.43")));
        assert_eq!(tx.foreign_currency.as_deref(), Some("USD"));
        assert_eq!(tx.exchange_rate, Some(d("0.92")));
    }

    #[test]
    fn test_second_detail_is_rejected() {
        let lines = vec![
            line(1, start("Hotel Booking", "120.00", Direction::Debit)),
            line(2, detail(Some("130.43"), "USD", "0.92")),
            line(3, detail(Some("130.43"), "USD", "0.92")),
        ];
        assert_eq!(
            build_transactions(&lines).unwrap_err(),
            ParseError::DuplicateCurrencyDetail {
                at: LineRef::new(1, 3),
                started_at: LineRef::new(1, 1),
            }
        );
    }

    #[test]
    fn test_rate_only_detail_keeps_row_foreign_amount() {
        let lines = vec![
            line(
                1,
                LineKind::TransactionStart(TransactionStart {
                    date: NaiveDate::from_ymd_opt(2025, 5, 29).unwrap(),
                    description: "AMAZON.COM".to_string(),
                    amount: SignedAmount::new(d("44.16"), Direction::Debit),
                    foreign: Some(ForeignAmount {
                        amount: d("48.00"),
                        currency: "USD".to_string(),
                    }),
                }),
            ),
            line(
                2,
                LineKind::ForeignCurrencyDetail(CurrencyDetail {
                    amount: None,
                    currency: Some("GBP".to_string()),
                    rate: d("1.1"),
                }),
            ),
        ];
        assert!(matches!(
            build_transactions(&lines).unwrap_err(),
            ParseError::UnrecognizedLayout { at, .. } if at == LineRef::new(1, 2)
        ));
    }

    #[test]
    fn test_detail_without_transaction() {
        let lines = vec![
            line(1, start("Coffee", "3.00", Direction::Debit)),
            line(2, LineKind::Header(Vec::new())),
            line(3, detail(Some("3.30"), "USD", "0.91")),
        ];
        assert!(matches!(
            build_transactions(&lines).unwrap_err(),
            ParseError::UnrecognizedLayout { .. }
        ));
    }

    #[test]
    fn test_empty_description_is_rejected() {
        let lines = vec![line(7, start("  ", "3.00", Direction::Credit))];
        assert!(matches!(
            build_transactions(&lines).unwrap_err(),
            ParseError::UnrecognizedLayout { at, .. } if at == LineRef::new(1, 7)
        ));
    }

    #[test]
    fn test_summaries_are_scoped_to_card_sections() {
        let opening = SignedAmount::from_signed(d("100.00"));
        let lines = vec![
            line(1, LineKind::AccountSummary(vec![(SummaryKey::OpeningBalance, opening)])),
            line(2, LineKind::Header(vec![HeaderField::CardSection("1234".to_string())])),
            line(3, LineKind::AccountSummary(vec![(SummaryKey::OpeningBalance, opening)])),
            line(4, start("Coffee", "3.00", Direction::Debit)),
        ];
        let out = build_transactions(&lines).unwrap();
        assert_eq!(out.summaries[0].card_identifier, None);
        assert_eq!(out.summaries[1].card_identifier.as_deref(), Some("1234"));
        assert_eq!(out.transactions[0].card_identifier.as_deref(), Some("1234"));
        assert_eq!(out.header.len(), 1);
    }

    #[test]
    fn test_noise_closes_the_transaction() {
        let lines = vec![
            line(1, start("Coffee", "3.00", Direction::Debit)),
            line(2, LineKind::Noise),
            line(3, LineKind::Continuation("Thank you".to_string())),
        ];
        assert!(matches!(
            build_transactions(&lines).unwrap_err(),
            ParseError::UnrecognizedLayout { at, .. } if at == LineRef::new(1, 3)
        ));
    }

    #[test]
    fn test_no_transactions_is_fine() {
        let out = build_transactions(&[line(1, LineKind::Noise)]).unwrap();
        assert!(out.transactions.is_empty());
    }
}

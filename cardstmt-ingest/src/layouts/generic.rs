//! Plain ISO-dated statements with English number formatting.
//!
//!   Statement Period: 2025-06-01 – 2025-06-30
//!   Card ****1234 - J. Smith
//!   Opening balance        100.00
//!   2025-06-10  Hotel Booking               -120.00
//!               Grand Hotel Central
//!               -130.43 USD @ 0.9200
//!   Closing balance        -20.00
//!
//! Amounts carry their own sign (negative = debit). Every card has its own
//! balance block.

use std::sync::LazyLock;

use cardstmt_core::{NumberFormat, ParseError, Period, Result, SignedAmount, SummaryScope};
use regex::Regex;

use super::Layout;
use crate::classify::{
    ClassifyContext, CurrencyDetail, HeaderField, LineKind, SummaryKey, TransactionStart,
};
use crate::dates::parse_iso;
use crate::lines::RawLine;

static TITLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:credit\s+card\s+|account\s+)?statement(?:\s+of\s+account)?\s*$")
        .expect("valid statement title regex")
});

static PERIOD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)^\s*(?:statement\s+)?period:?\s*",
        r"(?P<start>\d{4}-\d{2}-\d{2})\s*(?:–|—|-|to)\s*",
        r"(?P<end>\d{4}-\d{2}-\d{2})\s*$"
    ))
    .expect("valid period regex")
});

static CARD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)^\s*card\s+(?:no\.?\s+|number\s+)?(?:[*x•]+\s*)?(?P<card>\d{4})",
        r"(?:\s*[-–:]\s*(?P<holder>.+?))?\s*$"
    ))
    .expect("valid card section regex")
});

static SUMMARY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)^\s*(?P<label>opening\s+balance|previous\s+balance|closing\s+balance|new\s+balance",
        r"|total\s+debits|total\s+credits):?\s+(?P<amount>\S+)\s*$"
    ))
    .expect("valid summary regex")
});

static TRANSACTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^\s*(?P<date>\d{4}-\d{2}-\d{2})\s+",
        r"(?P<desc>.+?)\s+",
        r"(?P<amount>[-+−]?[\d.,]*\d[\d.,]*\S*?)",
        r"(?:\s+(?P<cur>[A-Z]{3}))?\s*$"
    ))
    .expect("valid transaction regex")
});

/// Start of a transaction row, used to report rows the full pattern rejects.
static DATED_ROW_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d{4}-\d{2}-\d{2}\s").expect("valid dated row regex"));

static DETAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^\s*(?P<amount>[-+−]?[\d.,]*\d[\d.,]*)\s+(?P<cur>[A-Z]{3})\s*",
        r"(?:@|[xX]|[Rr]ate:?)\s*",
        r"(?P<rate>[\d.,]*\d[\d.,]*\S*)\s*$"
    ))
    .expect("valid currency detail regex")
});

static FOOTER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:page\s+\d+\s+of\s+\d+|continued\s+on\s+next\s+page|end\s+of\s+statement)\s*$")
        .expect("valid footer regex")
});

fn summary_key(label: &str) -> SummaryKey {
    let label = label.to_lowercase();
    if label.starts_with("opening") || label.starts_with("previous") {
        SummaryKey::OpeningBalance
    } else if label.starts_with("closing") || label.starts_with("new") {
        SummaryKey::ClosingBalance
    } else if label.ends_with("debits") {
        SummaryKey::TotalDebits
    } else {
        SummaryKey::TotalCredits
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GenericLayout;

impl Layout for GenericLayout {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn number_format(&self) -> NumberFormat {
        NumberFormat::ENGLISH
    }

    fn summary_scope(&self) -> SummaryScope {
        SummaryScope::PerCard
    }

    fn classify_structural(&self, line: &RawLine, _ctx: &mut ClassifyContext) -> Result<Option<LineKind>> {
        let text = line.text.as_str();
        let at = line.at();

        if FOOTER_RE.is_match(text) {
            return Ok(Some(LineKind::Footer));
        }

        if TITLE_RE.is_match(text) {
            return Ok(Some(LineKind::Header(Vec::new())));
        }

        if let Some(caps) = PERIOD_RE.captures(text) {
            let (Some(start), Some(end)) = (parse_iso(&caps["start"]), parse_iso(&caps["end"])) else {
                return Err(ParseError::layout(at, "invalid date in statement period"));
            };
            if end < start {
                return Err(ParseError::layout(at, "statement period ends before it starts"));
            }
            return Ok(Some(LineKind::Header(vec![HeaderField::Period(Period::new(start, end))])));
        }

        if let Some(caps) = CARD_RE.captures(text) {
            let mut fields = vec![HeaderField::CardSection(caps["card"].to_string())];
            if let Some(holder) = caps.name("holder") {
                fields.push(HeaderField::CardHolder(holder.as_str().to_string()));
            }
            return Ok(Some(LineKind::Header(fields)));
        }

        if let Some(caps) = SUMMARY_RE.captures(text) {
            let value = self.parse_amount(at, &caps["amount"])?;
            return Ok(Some(LineKind::AccountSummary(vec![(
                summary_key(&caps["label"]),
                SignedAmount::from_signed(value),
            )])));
        }

        if let Some(caps) = DETAIL_RE.captures(text) {
            let amount = self.parse_amount(at, &caps["amount"])?;
            let rate = self.parse_amount(at, &caps["rate"])?;
            return Ok(Some(LineKind::ForeignCurrencyDetail(CurrencyDetail {
                amount: Some(amount.abs()),
                currency: Some(caps["cur"].to_string()),
                rate,
            })));
        }

        if let Some(caps) = TRANSACTION_RE.captures(text) {
            let date = parse_iso(&caps["date"])
                .ok_or_else(|| ParseError::layout(at, format!("invalid date {:?}", &caps["date"])))?;
            let value = self.parse_amount(at, &caps["amount"])?;
            return Ok(Some(LineKind::TransactionStart(TransactionStart {
                date,
                description: caps["desc"].trim().to_string(),
                amount: SignedAmount::from_signed(value),
                foreign: None,
            })));
        }

        if DATED_ROW_RE.is_match(text) {
            return Err(ParseError::layout(at, "dated row without a trailing amount"));
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{classify_lines, ClassifiedLine, LineTag};
    use crate::lines::group_into_lines;
    use cardstmt_core::{Direction, LineRef, TextFragment};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn classify(text: &str) -> Result<Vec<ClassifiedLine>> {
        let lines = group_into_lines(&TextFragment::from_page_text(text), 3.0);
        classify_lines(&lines, &GenericLayout)
    }

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn tags(classified: &[ClassifiedLine]) -> Vec<LineTag> {
        classified.iter().map(|c| c.tag()).collect()
    }

    #[test]
    fn test_period_variants() {
        for text in [
            "Period: 2025-06-01–2025-06-30",
            "Statement Period: 2025-06-01 - 2025-06-30",
            "period 2025-06-01 to 2025-06-30",
        ] {
            let classified = classify(text).unwrap();
            assert_eq!(
                classified[0].kind,
                LineKind::Header(vec![HeaderField::Period(Period::new(
                    NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
                    NaiveDate::from_ymd_opt(2025, 6, 30).unwrap(),
                ))]),
                "{text}"
            );
        }
    }

    #[test]
    fn test_card_line_with_holder() {
        let classified = classify("Card no. ****1234 - J. Smith").unwrap();
        assert_eq!(
            classified[0].kind,
            LineKind::Header(vec![
                HeaderField::CardSection("1234".to_string()),
                HeaderField::CardHolder("J. Smith".to_string()),
            ])
        );
    }

    #[test]
    fn test_transaction_rows_and_continuations() {
        let text = "2025-06-10  Hotel Booking   -1,120.00 EUR\n\
                    Grand Hotel Central\n\
                    Room 204\n\
                    -130.43 USD @ 0.9200\n\
                    after the detail\n";
        let classified = classify(text).unwrap();
        assert_eq!(
            tags(&classified),
            vec![
                LineTag::TransactionStart,
                LineTag::Continuation,
                LineTag::Continuation,
                LineTag::ForeignCurrencyDetail,
                LineTag::Noise,
            ]
        );
        let LineKind::TransactionStart(start) = &classified[0].kind else {
            panic!("expected a transaction row");
        };
        assert_eq!(start.description, "Hotel Booking");
        assert_eq!(start.amount, SignedAmount::new(d("1120.00"), Direction::Debit));
        assert_eq!(classified[2].kind, LineKind::Continuation("Room 204".to_string()));
        assert_eq!(
            classified[3].kind,
            LineKind::ForeignCurrencyDetail(CurrencyDetail {
                amount: Some(d("130.43")),
                currency: Some("USD".to_string()),
                rate: d("0.9200"),
            })
        );
    }

    #[test]
    fn test_footer_does_not_break_continuation() {
        let text = "2025-06-10 Hotel Booking -120.00\nPage 1 of 2\x0cContinued text\n";
        let classified = classify(text).unwrap();
        assert_eq!(
            tags(&classified),
            vec![LineTag::TransactionStart, LineTag::Footer, LineTag::Continuation]
        );
    }

    #[test]
    fn test_summary_lines() {
        let classified = classify("Previous balance: 1,100.00\nNew balance -20.00\n").unwrap();
        assert_eq!(
            classified[0].kind,
            LineKind::AccountSummary(vec![(
                SummaryKey::OpeningBalance,
                SignedAmount::from_signed(d("1100.00"))
            )])
        );
        assert_eq!(
            classified[1].kind,
            LineKind::AccountSummary(vec![(
                SummaryKey::ClosingBalance,
                SignedAmount::new(d("20.00"), Direction::Debit)
            )])
        );
    }

    #[test]
    fn test_dated_row_without_amount_is_rejected() {
        let text = "2025-06-03 Coffee Shop -20.00\n2025-06-04 Bakery n/a\n";
        let err = classify(text).unwrap_err();
        assert!(matches!(err, ParseError::UnrecognizedLayout { at, .. } if at == LineRef::new(1, 2)));
    }

    #[test]
    fn test_unparseable_amount_on_transaction_row() {
        let err = classify("Period: 2025-06-01 - 2025-06-30\n2025-06-03 Coffee Shop 12.3.4\n").unwrap_err();
        assert_eq!(err, ParseError::amount(LineRef::new(1, 2), "12.3.4"));
    }
}

//! ICS credit-card statements (icscards.nl), Dutch.
//!
//! Expected text after `pdftotext -layout`:
//!   Datum          ICS-klantnummer     Volgnummer     Blad
//!   12 jun 2025    12345678901         6              1 van 2
//!   Vorig openstaand saldo   Totaal ontvangen betalingen   Totaal nieuwe uitgaven   Nieuw openstaand saldo
//!   € 150,00 Af              € 150,00 Bij                  € 67,61 Af               € 67,61 Af
//!   Uw Card met als laatste vier cijfers 1234
//!   J. JANSEN
//!   28 mei   29 mei   AMAZON.COM   SEATTLE   US   48,00  USD   44,16   Af
//!                     Wisselkoers USD   1,08696
//!
//! Amounts carry a trailing `Bij` (credit) or `Af` (debit) marker. One
//! account summary covers every card on the statement.

use std::sync::LazyLock;

use cardstmt_core::{
    Direction, LineRef, NumberFormat, ParseError, Period, Result, SignedAmount, StatementInfo,
    SummaryScope,
};
use regex::Regex;

use super::{split_cells, Layout};
use crate::classify::{
    ClassifyContext, CurrencyDetail, ForeignAmount, HeaderField, LineKind, SummaryKey,
    TransactionStart,
};
use crate::dates::{month_bounds, parse_day_month, parse_day_month_year};
use crate::lines::RawLine;

static TRANSACTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^\s*(?P<tdate>\d{1,2}\s+[A-Za-z]{3,4})\.?\s+",
        r"(?P<bdate>\d{1,2}\s+[A-Za-z]{3,4})\.?\s+",
        r"(?P<rest>.+?)\s+",
        r"(?P<amount>(?:€\s?)?[\d.,]*\d[\d.,]*\S*)\s+",
        r"(?P<dir>Bij|Af)\s*$"
    ))
    .expect("valid ics transaction regex")
});

/// Transaction and booking date at the start of a row.
static ROW_DATES_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*\d{1,2}\s+[A-Za-z]{3,4}\.?\s+\d{1,2}\s+[A-Za-z]{3,4}\.?\s")
        .expect("valid ics row dates regex")
});

static FOREIGN_TAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<desc>.*?)\s+(?P<amount>[\d.,]*\d[\d.,]*)\s+(?P<cur>[A-Z]{3})$")
        .expect("valid ics foreign amount regex")
});

static RATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*Wisselkoers\s+(?:(?P<cur>[A-Z]{3})\s+)?(?P<rate>\S+)\s*$")
        .expect("valid ics exchange rate regex")
});

static CARD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*uw\s+card\s+met\s+als\s+laatste\s+vier\s+cijfers\s+(?P<card>\d{4})\b")
        .expect("valid ics card section regex")
});

static BOILERPLATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)^\s*blad\s+\d+\s+van\s+\d+\s*$",
        r"|^\s*datum\s+(?:transactie|datum)\b",
        r"|^\s*transactie\s+boeking\b",
        r"|omschrijving.*bedrag"
    ))
    .expect("valid ics boilerplate regex")
});

static BALANCE_VALUE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<amount>.*?)\s*(?P<dir>Bij|Af)$").expect("valid ics balance regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InfoLabel {
    Date,
    CustomerNumber,
    SerialNumber,
    Page,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Label {
    Info(InfoLabel),
    Balance(SummaryKey),
}

fn label(cell: &str) -> Option<Label> {
    let label = match cell.trim().to_lowercase().as_str() {
        "datum" => Label::Info(InfoLabel::Date),
        "ics-klantnummer" => Label::Info(InfoLabel::CustomerNumber),
        "volgnummer" => Label::Info(InfoLabel::SerialNumber),
        "blad" => Label::Info(InfoLabel::Page),
        "vorig openstaand saldo" | "vorig tegoed" => Label::Balance(SummaryKey::OpeningBalance),
        "totaal ontvangen betalingen" => Label::Balance(SummaryKey::TotalCredits),
        "totaal nieuwe uitgaven" => Label::Balance(SummaryKey::TotalDebits),
        "nieuw openstaand saldo" | "nieuw tegoed" => Label::Balance(SummaryKey::ClosingBalance),
        _ => return None,
    };
    Some(label)
}

/// A row made only of info-box labels of one kind.
fn is_label_row(cells: &[&str]) -> bool {
    if cells.len() < 2 {
        return false;
    }
    let Some(labels) = cells.iter().map(|c| label(c)).collect::<Option<Vec<_>>>() else {
        return false;
    };
    labels.iter().all(|l| matches!(l, Label::Info(_)))
        || labels.iter().all(|l| matches!(l, Label::Balance(_)))
}

fn direction(marker: &str) -> Direction {
    if marker == "Bij" {
        Direction::Credit
    } else {
        Direction::Debit
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct IcsLayout;

impl IcsLayout {
    fn value_row(&self, line: &RawLine, labels: Vec<String>) -> Result<LineKind> {
        let at = line.at();
        let cells = split_cells(&line.text);
        if cells.len() != labels.len() {
            return Err(ParseError::layout(
                at,
                format!(
                    "expected {} values under {:?}, found {}",
                    labels.len(),
                    labels,
                    cells.len()
                ),
            ));
        }

        let mut fields = Vec::new();
        let mut balances = Vec::new();
        for (name, value) in labels.iter().zip(cells) {
            match label(name) {
                Some(Label::Info(InfoLabel::Date)) => {
                    let date = parse_day_month_year(value).ok_or_else(|| {
                        ParseError::layout(at, format!("invalid statement date {value:?}"))
                    })?;
                    fields.push(HeaderField::IssuedOn(date));
                }
                Some(Label::Info(InfoLabel::CustomerNumber)) => {
                    fields.push(HeaderField::CustomerNumber(value.trim().to_string()));
                }
                Some(Label::Info(InfoLabel::SerialNumber)) => {
                    let serial = value.trim().parse().map_err(|_| {
                        ParseError::layout(at, format!("serial number {value:?} is not an integer"))
                    })?;
                    fields.push(HeaderField::SerialNumber(serial));
                }
                Some(Label::Info(InfoLabel::Page)) => {}
                Some(Label::Balance(key)) => balances.push((key, self.balance(at, value)?)),
                None => return Err(ParseError::layout(at, format!("unknown label {name:?}"))),
            }
        }

        if balances.is_empty() {
            Ok(LineKind::Header(fields))
        } else {
            Ok(LineKind::AccountSummary(balances))
        }
    }

    fn balance(&self, at: LineRef, value: &str) -> Result<SignedAmount> {
        let caps = BALANCE_VALUE_RE.captures(value.trim()).ok_or_else(|| {
            ParseError::layout(at, format!("expected Bij or Af after balance {value:?}"))
        })?;
        let magnitude = self.parse_amount(at, &caps["amount"])?;
        Ok(SignedAmount::new(magnitude, direction(&caps["dir"])))
    }

    fn transaction(&self, line: &RawLine, ctx: &ClassifyContext) -> Result<Option<LineKind>> {
        let at = line.at();
        let Some(caps) = TRANSACTION_RE.captures(&line.text) else {
            if ROW_DATES_RE.is_match(&line.text) {
                return Err(ParseError::layout(at, "dated row without an amount and Bij/Af marker"));
            }
            return Ok(None);
        };
        let year_hint = ctx.year_hint.ok_or_else(|| {
            ParseError::layout(at, "transaction row before the statement date (Datum)")
        })?;

        let booking = &caps["bdate"];
        let date = parse_day_month(booking, year_hint)
            .ok_or_else(|| ParseError::layout(at, format!("invalid booking date {booking:?}")))?;
        let transaction_date = &caps["tdate"];
        if parse_day_month(transaction_date, year_hint).is_none() {
            return Err(ParseError::layout(
                at,
                format!("invalid transaction date {transaction_date:?}"),
            ));
        }

        let magnitude = self.parse_amount(at, &caps["amount"])?;
        let amount = SignedAmount::new(magnitude, direction(&caps["dir"]));

        let rest = caps["rest"].trim();
        let (description, foreign) = match FOREIGN_TAIL_RE.captures(rest) {
            Some(tail) => {
                let foreign = ForeignAmount {
                    amount: self.parse_amount(at, &tail["amount"])?.abs(),
                    currency: tail["cur"].to_string(),
                };
                (tail["desc"].to_string(), Some(foreign))
            }
            None => (rest.to_string(), None),
        };

        Ok(Some(LineKind::TransactionStart(TransactionStart {
            date,
            description: split_cells(&description).join(" "),
            amount,
            foreign,
        })))
    }
}

impl Layout for IcsLayout {
    fn name(&self) -> &'static str {
        "ics"
    }

    fn number_format(&self) -> NumberFormat {
        NumberFormat::DUTCH
    }

    fn summary_scope(&self) -> SummaryScope {
        SummaryScope::Account
    }

    // Rows never wrap; a line under a transaction is either its rate or stray text.
    fn wraps_descriptions(&self) -> bool {
        false
    }

    fn classify_structural(&self, line: &RawLine, ctx: &mut ClassifyContext) -> Result<Option<LineKind>> {
        if let Some(labels) = ctx.pending_labels.take() {
            return self.value_row(line, labels).map(Some);
        }

        let cells = split_cells(&line.text);
        if is_label_row(&cells) {
            ctx.pending_labels = Some(cells.iter().map(|c| c.to_string()).collect());
            return Ok(Some(LineKind::Header(Vec::new())));
        }

        if BOILERPLATE_RE.is_match(&line.text) {
            return Ok(Some(LineKind::Footer));
        }

        if let Some(caps) = CARD_RE.captures(&line.text) {
            return Ok(Some(LineKind::Header(vec![HeaderField::CardSection(
                caps["card"].to_string(),
            )])));
        }

        if let Some(caps) = RATE_RE.captures(&line.text) {
            let rate = self.parse_amount(line.at(), &caps["rate"])?;
            return Ok(Some(LineKind::ForeignCurrencyDetail(CurrencyDetail {
                amount: None,
                currency: caps.name("cur").map(|m| m.as_str().to_string()),
                rate,
            })));
        }

        if let Some(kind) = self.transaction(line, ctx)? {
            return Ok(Some(kind));
        }

        if ctx.awaiting_card_holder {
            return Ok(Some(LineKind::Header(vec![HeaderField::CardHolder(
                line.text.trim().to_string(),
            )])));
        }

        Ok(None)
    }

    fn derive_period(&self, info: &StatementInfo) -> Option<Period> {
        let (start, end) = month_bounds(info.issued_on?)?;
        Some(Period::new(start, end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{classify_lines, LineTag};
    use crate::lines::group_into_lines;
    use cardstmt_core::TextFragment;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn classify(text: &str) -> Result<Vec<crate::classify::ClassifiedLine>> {
        let lines = group_into_lines(&TextFragment::from_page_text(text), 3.0);
        classify_lines(&lines, &IcsLayout)
    }

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    const INFO: &str = "Datum          ICS-klantnummer     Volgnummer     Blad\n\
                        12 jun 2025    12345678901         6              1 van 2\n";

    #[test]
    fn test_info_box_values_pair_with_labels() {
        let classified = classify(INFO).unwrap();
        assert_eq!(classified[0].kind, LineKind::Header(Vec::new()));
        assert_eq!(
            classified[1].kind,
            LineKind::Header(vec![
                HeaderField::IssuedOn(NaiveDate::from_ymd_opt(2025, 6, 12).unwrap()),
                HeaderField::CustomerNumber("12345678901".to_string()),
                HeaderField::SerialNumber(6),
            ])
        );
    }

    #[test]
    fn test_balance_row_uses_direction_markers() {
        let text = "Vorig tegoed    Totaal ontvangen betalingen    Totaal nieuwe uitgaven    Nieuw openstaand saldo\n\
                    € 10,00 Bij     € 150,00 Bij                   € 1.227,61 Af             € 1.067,61 Af\n";
        let classified = classify(text).unwrap();
        let LineKind::AccountSummary(entries) = &classified[1].kind else {
            panic!("expected a summary row, got {:?}", classified[1].kind);
        };
        assert_eq!(
            entries[0],
            (SummaryKey::OpeningBalance, SignedAmount::new(d("10.00"), Direction::Credit))
        );
        assert_eq!(entries[2].0, SummaryKey::TotalDebits);
        assert_eq!(entries[3].1.signed(), d("-1067.61"));
    }

    #[test]
    fn test_value_row_must_fill_every_label() {
        let text = "Datum    ICS-klantnummer    Volgnummer    Blad\n12 jun 2025    12345678901\n";
        let err = classify(text).unwrap_err();
        assert!(matches!(err, ParseError::UnrecognizedLayout { at, .. } if at == LineRef::new(1, 2)));
    }

    #[test]
    fn test_transaction_row_with_foreign_amount() {
        let text = format!(
            "{INFO}28 mei   29 mei   AMAZON.COM     SEATTLE     US     48,00  USD     44,16   Af\n\
             \x20                 Wisselkoers USD      1,08696\n"
        );
        let classified = classify(&text).unwrap();
        let LineKind::TransactionStart(start) = &classified[2].kind else {
            panic!("expected a transaction row, got {:?}", classified[2].kind);
        };
        assert_eq!(start.date, NaiveDate::from_ymd_opt(2025, 5, 29).unwrap());
        assert_eq!(start.description, "AMAZON.COM SEATTLE US");
        assert_eq!(start.amount.signed(), d("-44.16"));
        assert_eq!(
            start.foreign,
            Some(ForeignAmount {
                amount: d("48.00"),
                currency: "USD".to_string()
            })
        );
        assert_eq!(
            classified[3].kind,
            LineKind::ForeignCurrencyDetail(CurrencyDetail {
                amount: None,
                currency: Some("USD".to_string()),
                rate: d("1.08696"),
            })
        );
    }

    #[test]
    fn test_card_section_and_holder() {
        let text = format!("{INFO}Uw Card met als laatste vier cijfers 1234\nJ. JANSEN\nSome legal text\n");
        let classified = classify(&text).unwrap();
        assert_eq!(
            classified[2].kind,
            LineKind::Header(vec![HeaderField::CardSection("1234".to_string())])
        );
        assert_eq!(
            classified[3].kind,
            LineKind::Header(vec![HeaderField::CardHolder("J. JANSEN".to_string())])
        );
        assert_eq!(classified[4].tag(), LineTag::Noise);
    }

    #[test]
    fn test_column_titles_and_page_markers_are_boilerplate() {
        let text = "Datum        Datum      Omschrijving        Bedrag in         Bedrag in\n\
                    transactie   boeking                        vreemde valuta    euro's\n\
                    Blad 2 van 3\n";
        let classified = classify(text).unwrap();
        assert!(classified.iter().all(|c| c.tag() == LineTag::Footer));
    }

    #[test]
    fn test_bad_amount_is_a_parse_error() {
        let text = format!("{INFO}22 mei   23 mei   ALBERT HEIJN   AMSTERDAM   NL   23,4x   Af\n");
        let err = classify(&text).unwrap_err();
        assert_eq!(err, ParseError::amount(LineRef::new(1, 3), "23,4x"));
    }

    #[test]
    fn test_transactions_need_the_issue_date() {
        let err = classify("Rekeningoverzicht\n22 mei   23 mei   ALBERT HEIJN   23,45   Af\n").unwrap_err();
        assert!(matches!(err, ParseError::UnrecognizedLayout { at, .. } if at == LineRef::new(1, 2)));
    }

    #[test]
    fn test_dated_row_without_amount_is_rejected() {
        let text = format!("{INFO}22 mei   23 mei   ALBERT HEIJN   AMSTERDAM   NL\n");
        let err = classify(&text).unwrap_err();
        assert!(matches!(err, ParseError::UnrecognizedLayout { at, .. } if at == LineRef::new(1, 3)));
    }

    #[test]
    fn test_period_is_issue_month() {
        let info = StatementInfo {
            issued_on: NaiveDate::from_ymd_opt(2025, 2, 12),
            ..Default::default()
        };
        let period = IcsLayout.derive_period(&info).unwrap();
        assert_eq!(period.start, NaiveDate::from_ymd_opt(2025, 2, 1).unwrap());
        assert_eq!(period.end, NaiveDate::from_ymd_opt(2025, 2, 28).unwrap());
    }
}

//! Line classifier: one tag per reconstructed line, decided from the line's own
//! text and the state left behind by the lines before it.

use std::fmt;

use cardstmt_core::{LineRef, Period, Result, SignedAmount};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::trace;

use crate::layouts::Layout;
use crate::lines::RawLine;

/// The classification taxonomy without payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineTag {
    Header,
    AccountSummary,
    TransactionStart,
    Continuation,
    ForeignCurrencyDetail,
    Footer,
    Noise,
}

impl LineTag {
    /// Footer lines leave the classifier and builder state untouched, so a
    /// transaction interrupted by page boilerplate carries on afterwards.
    pub fn is_transparent(self) -> bool {
        matches!(self, LineTag::Footer)
    }
}

impl fmt::Display for LineTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LineTag::Header => "header",
            LineTag::AccountSummary => "account-summary",
            LineTag::TransactionStart => "transaction-start",
            LineTag::Continuation => "continuation",
            LineTag::ForeignCurrencyDetail => "foreign-currency-detail",
            LineTag::Footer => "footer",
            LineTag::Noise => "noise",
        };
        f.write_str(s)
    }
}

/// A value read from a header line.
#[derive(Debug, Clone, PartialEq)]
pub enum HeaderField {
    Period(Period),
    IssuedOn(NaiveDate),
    CustomerNumber(String),
    SerialNumber(u32),
    /// Start of the section of one card; carries the card identifier.
    CardSection(String),
    CardHolder(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SummaryKey {
    OpeningBalance,
    ClosingBalance,
    TotalDebits,
    TotalCredits,
}

impl fmt::Display for SummaryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SummaryKey::OpeningBalance => "opening balance",
            SummaryKey::ClosingBalance => "closing balance",
            SummaryKey::TotalDebits => "total debits",
            SummaryKey::TotalCredits => "total credits",
        };
        f.write_str(s)
    }
}

/// Original-currency amount as printed, without sign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignAmount {
    pub amount: Decimal,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransactionStart {
    pub date: NaiveDate,
    pub description: String,
    pub amount: SignedAmount,
    /// Some layouts print the original-currency amount on the transaction row itself.
    pub foreign: Option<ForeignAmount>,
}

/// Payload of a foreign-currency detail line. Layouts that only print the
/// rate leave `amount` (and possibly `currency`) empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyDetail {
    pub amount: Option<Decimal>,
    pub currency: Option<String>,
    pub rate: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LineKind {
    Header(Vec<HeaderField>),
    AccountSummary(Vec<(SummaryKey, SignedAmount)>),
    TransactionStart(TransactionStart),
    Continuation(String),
    ForeignCurrencyDetail(CurrencyDetail),
    Footer,
    Noise,
}

impl LineKind {
    pub fn tag(&self) -> LineTag {
        match self {
            LineKind::Header(_) => LineTag::Header,
            LineKind::AccountSummary(_) => LineTag::AccountSummary,
            LineKind::TransactionStart(_) => LineTag::TransactionStart,
            LineKind::Continuation(_) => LineTag::Continuation,
            LineKind::ForeignCurrencyDetail(_) => LineTag::ForeignCurrencyDetail,
            LineKind::Footer => LineTag::Footer,
            LineKind::Noise => LineTag::Noise,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedLine {
    pub line: RawLine,
    pub kind: LineKind,
}

impl ClassifiedLine {
    pub fn at(&self) -> LineRef {
        self.line.at()
    }

    pub fn tag(&self) -> LineTag {
        self.kind.tag()
    }
}

/// State carried from one line to the next.
#[derive(Debug, Clone, Default)]
pub struct ClassifyContext {
    /// Tag of the last line that was not a footer; `None` after noise.
    pub previous: Option<LineTag>,
    /// Issue date, used to put a year on day-month dates.
    pub year_hint: Option<NaiveDate>,
    /// Column labels waiting for the value row underneath them.
    pub pending_labels: Option<Vec<String>>,
    /// A card section was opened without naming its holder.
    pub awaiting_card_holder: bool,
    /// At least one transaction row has been seen.
    pub in_transactions: bool,
}

impl ClassifyContext {
    pub fn observe(&mut self, kind: &LineKind) {
        let tag = kind.tag();
        if tag.is_transparent() {
            return;
        }
        // blank or stray text ends any description, but a card holder may
        // still follow a blank line
        if tag == LineTag::Noise {
            self.previous = None;
            return;
        }

        self.previous = Some(tag);
        self.awaiting_card_holder = false;

        match kind {
            LineKind::Header(fields) => {
                for field in fields {
                    match field {
                        HeaderField::IssuedOn(date) => self.year_hint = Some(*date),
                        HeaderField::CardSection(_) => self.awaiting_card_holder = true,
                        HeaderField::CardHolder(_) => self.awaiting_card_holder = false,
                        _ => {}
                    }
                }
            }
            LineKind::TransactionStart(_) => self.in_transactions = true,
            _ => {}
        }
    }

    pub fn follows_transaction_text(&self) -> bool {
        matches!(
            self.previous,
            Some(LineTag::TransactionStart | LineTag::Continuation)
        )
    }
}

/// Classify every line of one document, in order.
pub fn classify_lines(lines: &[RawLine], layout: &dyn Layout) -> Result<Vec<ClassifiedLine>> {
    let mut ctx = ClassifyContext::default();
    let mut out = Vec::with_capacity(lines.len());

    for line in lines {
        let kind = if line.is_blank() {
            LineKind::Noise
        } else {
            match layout.classify_structural(line, &mut ctx)? {
                Some(kind) => kind,
                None => layout.classify_unmatched(line, &ctx),
            }
        };

        trace!(at = %line.at(), tag = %kind.tag(), text = %line.text.trim(), "classified line");
        ctx.observe(&kind);
        out.push(ClassifiedLine {
            line: line.clone(),
            kind,
        });
    }

    Ok(out)
}

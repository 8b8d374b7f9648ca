//! Statement layouts: one module per provider, each pinning its number format,
//! sign markers, date forms and line patterns.

use std::fmt;
use std::str::FromStr;

use cardstmt_core::{LineRef, NumberFormat, ParseError, Period, Result, StatementInfo, SummaryScope};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::classify::{ClassifyContext, LineKind};
use crate::lines::RawLine;

pub mod generic;
pub mod ics;

pub use generic::GenericLayout;
pub use ics::IcsLayout;

pub trait Layout: Sync {
    fn name(&self) -> &'static str;

    fn number_format(&self) -> NumberFormat;

    fn summary_scope(&self) -> SummaryScope;

    /// Whether description text may wrap onto lines below the transaction row.
    fn wraps_descriptions(&self) -> bool {
        true
    }

    /// Match the line against the layout's structural patterns.
    ///
    /// `Ok(None)` means no pattern applies; an error means the line claims a
    /// structure (a transaction row, a value row) it does not deliver.
    fn classify_structural(&self, line: &RawLine, ctx: &mut ClassifyContext) -> Result<Option<LineKind>>;

    /// Tag for a line no structural pattern matched.
    fn classify_unmatched(&self, line: &RawLine, ctx: &ClassifyContext) -> LineKind {
        let text = line.text.trim();
        if self.wraps_descriptions() && ctx.follows_transaction_text() {
            return LineKind::Continuation(text.to_string());
        }
        if ctx.in_transactions {
            warn!(at = %line.at(), text, "skipping unrecognized line");
        } else {
            debug!(at = %line.at(), text, "skipping preamble line");
        }
        LineKind::Noise
    }

    /// Period for documents that print no explicit period.
    fn derive_period(&self, _info: &StatementInfo) -> Option<Period> {
        None
    }

    /// Parse a numeric token under this layout's number format.
    fn parse_amount(&self, at: LineRef, token: &str) -> Result<Decimal> {
        self.number_format()
            .parse(token)
            .ok_or_else(|| ParseError::amount(at, token.trim()))
    }
}

/// Layout selector, as named on the command line and in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutKind {
    #[default]
    Ics,
    Generic,
}

static ICS: IcsLayout = IcsLayout;
static GENERIC: GenericLayout = GenericLayout;

impl LayoutKind {
    pub const ALL: [LayoutKind; 2] = [LayoutKind::Ics, LayoutKind::Generic];

    pub fn layout(self) -> &'static dyn Layout {
        match self {
            LayoutKind::Ics => &ICS,
            LayoutKind::Generic => &GENERIC,
        }
    }
}

impl fmt::Display for LayoutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.layout().name())
    }
}

impl FromStr for LayoutKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        LayoutKind::ALL
            .into_iter()
            .find(|kind| kind.layout().name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown layout {s:?} (expected ics or generic)"))
    }
}

/// Split a line into cells on runs of two or more spaces.
pub fn split_cells(text: &str) -> Vec<&str> {
    let mut cells = Vec::new();
    let mut rest = text.trim();
    while !rest.is_empty() {
        match rest.find("  ") {
            Some(gap) => {
                cells.push(&rest[..gap]);
                rest = rest[gap..].trim_start();
            }
            None => {
                cells.push(rest);
                break;
            }
        }
    }
    cells
}

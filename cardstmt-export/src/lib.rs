//! cardstmt-export: renders a [`Statement`] as CSV, TSV or JSON.
//!
//! Output is deterministic: the same statement always renders to the same
//! bytes. Amounts are always `-1234.50`, dates always `2025-06-03`, whatever
//! the source document printed.

use std::fmt;
use std::str::FromStr;

use cardstmt_core::money::{render_amount, render_rate};
use cardstmt_core::{Statement, Transaction};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub mod delimited;
pub mod json;

/// Column names, in output order.
pub const FIELD_NAMES: [&str; 7] = [
    "date",
    "card_identifier",
    "description",
    "amount",
    "foreign_amount",
    "foreign_currency",
    "exchange_rate",
];

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("writing delimited output: {0}")]
    Csv(#[from] csv::Error),
    #[error("writing JSON output: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ExportError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Csv,
    #[default]
    Tsv,
    Json,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 3] = [OutputFormat::Csv, OutputFormat::Tsv, OutputFormat::Json];

    /// Lowercase file extension.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Tsv => "tsv",
            OutputFormat::Json => "json",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        OutputFormat::ALL
            .into_iter()
            .find(|format| format.extension().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown output format {s:?} (expected csv, tsv or json)"))
    }
}

/// One transaction as text fields, in [`FIELD_NAMES`] order. Absent values are empty.
pub fn transaction_fields(tx: &Transaction) -> [String; 7] {
    [
        tx.date.to_string(),
        tx.card_identifier.clone().unwrap_or_default(),
        tx.description.clone(),
        render_amount(tx.amount),
        tx.foreign_amount.map(render_amount).unwrap_or_default(),
        tx.foreign_currency.clone().unwrap_or_default(),
        tx.exchange_rate.map(render_rate).unwrap_or_default(),
    ]
}

pub fn render(statement: &Statement, format: OutputFormat) -> Result<Vec<u8>> {
    let bytes = match format {
        OutputFormat::Csv => delimited::render(statement, b',')?,
        OutputFormat::Tsv => delimited::render(statement, b'\t')?,
        OutputFormat::Json => json::render(statement)?,
    };
    debug!(%format, bytes = bytes.len(), transactions = statement.transactions.len(), "rendered statement");
    Ok(bytes)
}

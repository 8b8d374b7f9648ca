//! cardstmt-ingest: turns positioned page text into a validated [`Statement`].
//!
//! The pipeline is strictly forward: fragments are grouped into lines, lines
//! are classified under one [`Layout`], the builder folds them into
//! transactions and the assembler checks the result against the stated
//! balances. Nothing here does I/O.

pub mod assembler;
pub mod builder;
pub mod classify;
pub mod dates;
pub mod layouts;
pub mod lines;

use cardstmt_core::{Result, Statement, TextFragment};
use tracing::debug;

pub use assembler::assemble;
pub use builder::{build_transactions, Extraction, HeaderEntry, SummaryEntry, TransactionBuilder};
pub use classify::{classify_lines, ClassifiedLine, HeaderField, LineKind, LineTag, SummaryKey};
pub use layouts::{Layout, LayoutKind};
pub use lines::{group_into_lines, RawLine};

/// Default vertical tolerance for fragments that belong to one line.
pub const DEFAULT_LINE_TOLERANCE: f32 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParseOptions {
    pub line_tolerance: f32,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            line_tolerance: DEFAULT_LINE_TOLERANCE,
        }
    }
}

/// Reconstruct and classify the lines of one document without building it.
pub fn classify_fragments(
    fragments: &[TextFragment],
    layout: LayoutKind,
    options: &ParseOptions,
) -> Result<Vec<ClassifiedLine>> {
    let lines = group_into_lines(fragments, options.line_tolerance);
    classify_lines(&lines, layout.layout())
}

/// Parse one document.
pub fn parse_statement(
    fragments: &[TextFragment],
    layout: LayoutKind,
    options: &ParseOptions,
) -> Result<Statement> {
    let classified = classify_fragments(fragments, layout, options)?;
    let extraction = build_transactions(&classified)?;
    debug!(
        layout = %layout,
        lines = classified.len(),
        transactions = extraction.transactions.len(),
        "built transactions"
    );
    assemble(extraction, layout.layout())
}

/// Parse already extracted page text (form-feed separated pages).
pub fn parse_text(text: &str, layout: LayoutKind, options: &ParseOptions) -> Result<Statement> {
    parse_statement(&TextFragment::from_page_text(text), layout, options)
}

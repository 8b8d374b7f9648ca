//! CSV and TSV: a header row, then one record per transaction. The two differ
//! only in the delimiter.

use cardstmt_core::Statement;
use csv::{QuoteStyle, Terminator, WriterBuilder};

use crate::{transaction_fields, Result, FIELD_NAMES};

pub fn render(statement: &Statement, delimiter: u8) -> Result<Vec<u8>> {
    let mut writer = WriterBuilder::new()
        .delimiter(delimiter)
        .quote_style(QuoteStyle::Necessary)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(FIELD_NAMES)?;
    for tx in &statement.transactions {
        writer.write_record(transaction_fields(tx))?;
    }

    writer.into_inner().map_err(|e| e.into_error().into())
}

use cardstmt_core::Statement;
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};

use crate::Result;

/// The whole statement as one JSON document, indented by four spaces.
pub fn render(statement: &Statement) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(b"    "));
    statement.serialize(&mut serializer)?;
    out.push(b'\n');
    Ok(out)
}

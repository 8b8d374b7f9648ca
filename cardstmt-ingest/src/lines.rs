//! Line reconstruction: fragments that share a vertical position become one line.

use cardstmt_core::{LineRef, TextFragment};

/// Gap inserted between fragments joined onto one line, read back as a column break.
pub const COLUMN_GAP: &str = "  ";

#[derive(Debug, Clone, PartialEq)]
pub struct RawLine {
    pub page: u32,
    /// 1-based position on the page.
    pub line: u32,
    pub top: f32,
    pub text: String,
}

impl RawLine {
    pub fn at(&self) -> LineRef {
        LineRef::new(self.page, self.line)
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Group fragments into lines.
///
/// A fragment starts a new line when it is on another page or sits at least
/// `tolerance` below the top of the current line's first fragment.
pub fn group_into_lines(fragments: &[TextFragment], tolerance: f32) -> Vec<RawLine> {
    let mut lines: Vec<RawLine> = Vec::new();

    for fragment in fragments {
        let starts_new = match lines.last() {
            None => true,
            Some(current) => current.page != fragment.page || fragment.top >= current.top + tolerance,
        };

        if starts_new {
            let line = match lines.last() {
                Some(prev) if prev.page == fragment.page => prev.line + 1,
                _ => 1,
            };
            lines.push(RawLine {
                page: fragment.page,
                line,
                top: fragment.top,
                text: fragment.text.clone(),
            });
            continue;
        }

        if let Some(current) = lines.last_mut() {
            if fragment.text.is_empty() {
                continue;
            }
            if current.text.is_empty() {
                current.text = fragment.text.clone();
            } else {
                current.text.push_str(COLUMN_GAP);
                current.text.push_str(&fragment.text);
            }
        }
    }

    lines
}

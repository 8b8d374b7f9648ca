/// Vertical distance assigned between two consecutive lines of plain text.
pub const TEXT_LINE_PITCH: f32 = 12.0;

/// A piece of page text as handed over by the text extractor.
///
/// Fragments of one page arrive ordered top to bottom; `top` grows downwards.
#[derive(Debug, Clone, PartialEq)]
pub struct TextFragment {
    pub page: u32,
    pub top: f32,
    pub text: String,
}

impl TextFragment {
    pub fn new(page: u32, top: f32, text: impl Into<String>) -> Self {
        Self {
            page,
            top,
            text: text.into(),
        }
    }

    /// Turn layout-preserving plain text (pages separated by form feeds) into
    /// fragments, one per text line, positioned by line index.
    ///
    /// Blank lines are kept so that line references match the text file.
    pub fn from_page_text(text: &str) -> Vec<TextFragment> {
        let mut pages: Vec<&str> = text.split('\x0c').collect();
        // pdftotext terminates every page, including the last, with a form feed
        if pages.len() > 1 && pages.last().is_some_and(|p| p.trim().is_empty()) {
            pages.pop();
        }

        let mut out = Vec::new();
        for (page_index, page) in pages.iter().enumerate() {
            let page_no = page_index as u32 + 1;
            for (line_index, line) in page.lines().enumerate() {
                out.push(TextFragment::new(
                    page_no,
                    line_index as f32 * TEXT_LINE_PITCH,
                    line.trim_end(),
                ));
            }
        }
        out
    }
}

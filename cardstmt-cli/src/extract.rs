use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;
use std::process::Command;

/// Page text of one document, pages separated by form feeds.
///
/// PDFs go through `pdftotext -layout`; `.txt` files are taken as already
/// extracted.
pub fn extract_text(path: &Path) -> Result<String> {
    let text = if is_pdf(path) {
        run_pdftotext(path)?
    } else {
        fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?
    };

    if text.trim().is_empty() {
        bail!(
            "{} has no text layer; it looks scanned/image-only",
            path.display()
        );
    }
    Ok(text)
}

pub fn is_pdf(path: &Path) -> bool {
    has_extension(path, "pdf")
}

pub fn is_supported(path: &Path) -> bool {
    has_extension(path, "pdf") || has_extension(path, "txt")
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

fn run_pdftotext(path: &Path) -> Result<String> {
    if which::which("pdftotext").is_err() {
        bail!(
            "pdftotext is not installed. Install poppler, then retry.\n\nmacOS (brew):  brew install poppler\nUbuntu (apt):  apt install poppler-utils"
        );
    }

    let output = Command::new("pdftotext")
        .arg("-layout")
        .arg(path)
        .arg("-")
        .output()
        .context("running pdftotext")?;

    if !output.status.success() {
        bail!(
            "pdftotext failed on {} ({}): {}",
            path.display(),
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_extensions() {
        assert!(is_supported(Path::new("ics-2025-06.PDF")));
        assert!(is_supported(Path::new("ics-2025-06.txt")));
        assert!(!is_supported(Path::new("ics-2025-06.tsv")));
        assert!(!is_supported(Path::new("README")));
        assert!(is_pdf(Path::new("a.Pdf")));
    }

    #[test]
    fn test_blank_text_file_is_rejected() {
        let dir = std::env::temp_dir().join(format!("cardstmt-extract-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("blank.txt");
        fs::write(&path, "\n  \n\x0c\n").unwrap();

        let err = extract_text(&path).unwrap_err();
        assert!(err.to_string().contains("scanned/image-only"));

        fs::remove_dir_all(&dir).unwrap();
    }
}

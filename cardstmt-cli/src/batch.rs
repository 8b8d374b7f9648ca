use anyhow::{bail, Context, Result};
use cardstmt_core::Statement;
use cardstmt_export::{render, OutputFormat};
use cardstmt_ingest::{parse_text, LayoutKind, ParseOptions};
use chrono::Datelike;
use regex::Regex;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::extract::{extract_text, is_supported};
use crate::print::format_statement;

/// `-2025-06` / `_2025-06` anywhere in a file name.
static NAME_MONTH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-_](\d{4})-(\d{2})").expect("valid file name regex"));

#[derive(Debug, Clone)]
pub struct ConvertOptions {
    pub format: OutputFormat,
    pub layout: LayoutKind,
    pub parse: ParseOptions,
    pub destination_dir: Option<PathBuf>,
    pub overwrite: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Written(PathBuf),
    /// Output already existed and `overwrite` was off.
    Skipped(PathBuf),
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub written: usize,
    pub skipped: usize,
    pub failed: Vec<(PathBuf, anyhow::Error)>,
}

impl BatchReport {
    fn record(&mut self, path: PathBuf, result: Result<Outcome>) {
        match result {
            Ok(Outcome::Written(_)) => self.written += 1,
            Ok(Outcome::Skipped(_)) => self.skipped += 1,
            Err(e) => self.failed.push((path, e)),
        }
    }
}

/// Year and month of the `yyyy-mm` token in a file name.
pub fn filename_month(path: &Path) -> Option<(i32, u32)> {
    let name = path.file_name()?.to_str()?;
    let caps = NAME_MONTH_RE.captures(name)?;
    let year = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    (1..=12).contains(&month).then_some((year, month))
}

/// Output path for `source`: same stem, the format's extension, in
/// `destination_dir` when given. The extension follows the case of the
/// source extension.
pub fn destination_path(source: &Path, format: OutputFormat, destination_dir: Option<&Path>) -> Result<PathBuf> {
    let stem = source
        .file_stem()
        .with_context(|| format!("{} has no file name", source.display()))?;

    let uppercase = source
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.chars().any(|c| c.is_ascii_uppercase()));
    let ext = if uppercase {
        format.extension().to_ascii_uppercase()
    } else {
        format.extension().to_string()
    };

    let dir = match destination_dir {
        Some(dir) => {
            if !dir.is_dir() {
                bail!("destination directory {} does not exist", dir.display());
            }
            dir.to_path_buf()
        }
        None => source.parent().map(Path::to_path_buf).unwrap_or_default(),
    };

    let mut out = dir.join(stem);
    out.set_extension(ext);
    Ok(out)
}

/// Every convertible document in `dir` that follows the `yyyy-mm` naming
/// convention, sorted by path.
pub fn collect_documents(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut docs = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("read {}", dir.display()))? {
        let path = entry.with_context(|| format!("read {}", dir.display()))?.path();
        if path.is_file() && is_supported(&path) && filename_month(&path).is_some() {
            docs.push(path);
        }
    }
    docs.sort();
    Ok(docs)
}

/// Extract and parse one document.
pub fn parse_document(path: &Path, layout: LayoutKind, options: &ParseOptions) -> Result<Statement> {
    let text = extract_text(path)?;
    let statement = parse_text(&text, layout, options).with_context(|| format!("parsing {}", path.display()))?;
    check_filename_month(path, &statement);
    Ok(statement)
}

fn check_filename_month(path: &Path, statement: &Statement) {
    let Some((year, month)) = filename_month(path) else {
        return;
    };
    let issued = statement.info.issued_on.unwrap_or(statement.period.end);
    if (issued.year(), issued.month()) != (year, month) {
        warn!(
            file = %path.display(),
            issued = %issued,
            "file name says {year}-{month:02} but the statement is from {}-{:02}",
            issued.year(),
            issued.month()
        );
    }
}

/// Parse, render and write one document. Nothing is written unless every
/// step before the write succeeded.
pub fn convert_file(path: &Path, opts: &ConvertOptions) -> Result<Outcome> {
    let statement = parse_document(path, opts.layout, &opts.parse)?;
    let dest = destination_path(path, opts.format, opts.destination_dir.as_deref())?;

    if dest.exists() && !opts.overwrite {
        info!(file = %path.display(), dest = %dest.display(), "output exists, skipping");
        return Ok(Outcome::Skipped(dest));
    }

    let bytes = render(&statement, opts.format).with_context(|| format!("rendering {}", path.display()))?;
    fs::write(&dest, bytes).with_context(|| format!("write {}", dest.display()))?;
    info!(
        file = %path.display(),
        dest = %dest.display(),
        transactions = statement.transactions.len(),
        "converted"
    );
    Ok(Outcome::Written(dest))
}

/// Parse each document and write it to `out` as a readable table. A failing
/// document is logged and collected; the others are still printed.
pub fn print_all(paths: &[PathBuf], opts: &ConvertOptions, out: &mut impl Write) -> Result<BatchReport> {
    let mut report = BatchReport::default();
    for path in paths {
        match parse_document(path, opts.layout, &opts.parse) {
            Ok(statement) => {
                write!(out, "# {}\n\n{}", path.display(), format_statement(&statement))
                    .context("write to stdout")?;
                report.written += 1;
            }
            Err(e) => {
                error!(file = %path.display(), "{e:#}");
                report.failed.push((path.clone(), e));
            }
        }
    }
    Ok(report)
}

/// Convert documents concurrently. A failing document never stops the others.
pub async fn convert_all(paths: Vec<PathBuf>, opts: ConvertOptions) -> BatchReport {
    let opts = Arc::new(opts);
    let mut set = JoinSet::new();
    for path in paths {
        let opts = Arc::clone(&opts);
        set.spawn_blocking(move || {
            let result = convert_file(&path, &opts);
            (path, result)
        });
    }

    let mut report = BatchReport::default();
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((path, result)) => {
                if let Err(e) = &result {
                    error!(file = %path.display(), "{e:#}");
                }
                report.record(path, result);
            }
            Err(e) => {
                error!("conversion task failed: {e}");
                report.failed.push((PathBuf::new(), anyhow::Error::new(e)));
            }
        }
    }
    report.failed.sort_by(|a, b| a.0.cmp(&b.0));

    info!(
        converted = report.written,
        skipped = report.skipped,
        failed = report.failed.len(),
        "batch finished"
    );
    report
}

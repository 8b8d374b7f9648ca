use cardstmt_core::money::{render_amount, render_rate};
use cardstmt_core::{AccountSummary, Statement, Transaction};
use cardstmt_ingest::ClassifiedLine;
use std::fmt::Write as _;

fn scope(card: Option<&str>) -> String {
    match card {
        Some(card) => format!("card {card}"),
        None => "account".to_string(),
    }
}

fn foreign(tx: &Transaction) -> String {
    match (tx.foreign_amount, tx.foreign_currency.as_deref()) {
        (Some(amount), Some(cur)) => {
            let mut s = format!("{} {cur}", render_amount(amount));
            if let Some(rate) = tx.exchange_rate {
                let _ = write!(s, " @ {}", render_rate(rate));
            }
            s
        }
        _ => String::new(),
    }
}

fn summary_line(s: &AccountSummary) -> String {
    let mut line = format!(
        "{:<12} opening {:>12}  closing {:>12}",
        scope(s.card_identifier.as_deref()),
        render_amount(s.opening_balance),
        render_amount(s.closing_balance)
    );
    if let Some(debits) = s.total_debits {
        let _ = write!(line, "  debits {:>10}", render_amount(debits));
    }
    if let Some(credits) = s.total_credits {
        let _ = write!(line, "  credits {:>10}", render_amount(credits));
    }
    line
}

/// Human-readable view of a parsed statement.
pub fn format_statement(statement: &Statement) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Layout: {}   Period: {} .. {}",
        statement.layout, statement.period.start, statement.period.end
    );
    if let Some(issued) = statement.info.issued_on {
        let _ = writeln!(out, "Issued: {issued}");
    }
    if let Some(customer) = &statement.info.customer_number {
        let _ = writeln!(out, "Customer: {customer}");
    }
    for holder in &statement.card_holders {
        let _ = writeln!(out, "Card {}: {}", holder.card_identifier, holder.name);
    }

    out.push('\n');
    for summary in &statement.account_summaries {
        let _ = writeln!(out, "{}", summary_line(summary));
    }

    out.push('\n');
    for tx in &statement.transactions {
        let mut lines = tx.description.lines();
        let _ = writeln!(
            out,
            "{}  {:<6} {:<40} {:>12}  {}",
            tx.date,
            tx.card_identifier.as_deref().unwrap_or("-"),
            lines.next().unwrap_or_default(),
            render_amount(tx.amount),
            foreign(tx)
        );
        for rest in lines {
            let _ = writeln!(out, "{:20}{rest}", "");
        }
    }
    let _ = writeln!(
        out,
        "\n{} transactions, debits {}, credits {}",
        statement.transactions.len(),
        render_amount(statement.total_debits()),
        render_amount(statement.total_credits())
    );
    out
}

/// One row per classified line: position, tag, text.
pub fn format_lines(lines: &[ClassifiedLine]) -> String {
    let mut out = String::new();
    for classified in lines {
        let at = classified.at();
        let _ = writeln!(
            out,
            "p{:<3} l{:<4} {:<24} {}",
            at.page,
            at.line,
            classified.tag().to_string(),
            classified.line.text
        );
    }
    out
}

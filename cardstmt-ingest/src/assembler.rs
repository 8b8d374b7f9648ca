//! Statement assembler: resolves the period and balances, then checks that the
//! transactions account for the difference between opening and closing.

use std::collections::BTreeSet;

use cardstmt_core::money::within_tolerance;
use cardstmt_core::{
    AccountSummary, CardHolder, Direction, LineRef, ParseError, Period, Result, SignedAmount,
    Statement, StatementInfo, SummaryScope, Transaction,
};
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::builder::{Extraction, HeaderEntry, SummaryEntry};
use crate::classify::{HeaderField, SummaryKey};
use crate::layouts::Layout;

/// Keep the first value of a header field; a later, different value is a layout error.
fn set_once<T: PartialEq + std::fmt::Debug>(
    slot: &mut Option<T>,
    value: T,
    at: LineRef,
    what: &str,
) -> Result<()> {
    match slot {
        Some(existing) if *existing != value => Err(ParseError::layout(
            at,
            format!("conflicting {what}: {existing:?} and {value:?}"),
        )),
        Some(_) => Ok(()),
        None => {
            *slot = Some(value);
            Ok(())
        }
    }
}

struct Header {
    period: Option<Period>,
    info: StatementInfo,
    card_holders: Vec<CardHolder>,
}

fn resolve_header(entries: &[HeaderEntry]) -> Result<Header> {
    let mut period = None;
    let mut info = StatementInfo::default();
    let mut card_holders: Vec<CardHolder> = Vec::new();
    let mut last_card: Option<&str> = None;

    for entry in entries {
        match &entry.field {
            HeaderField::Period(p) => set_once(&mut period, *p, entry.at, "statement periods")?,
            HeaderField::IssuedOn(date) => set_once(&mut info.issued_on, *date, entry.at, "issue dates")?,
            HeaderField::CustomerNumber(n) => {
                set_once(&mut info.customer_number, n.clone(), entry.at, "customer numbers")?
            }
            HeaderField::SerialNumber(n) => set_once(&mut info.serial_number, *n, entry.at, "serial numbers")?,
            HeaderField::CardSection(card) => last_card = Some(card.as_str()),
            HeaderField::CardHolder(name) => {
                let Some(card) = last_card else {
                    return Err(ParseError::layout(entry.at, "card holder outside a card section"));
                };
                if !card_holders.iter().any(|h| h.card_identifier == card) {
                    card_holders.push(CardHolder {
                        card_identifier: card.to_string(),
                        name: name.clone(),
                    });
                }
            }
        }
    }

    Ok(Header {
        period,
        info,
        card_holders,
    })
}

#[derive(Default)]
struct PendingSummary {
    opening: Option<SignedAmount>,
    closing: Option<SignedAmount>,
    debits: Option<SignedAmount>,
    credits: Option<SignedAmount>,
}

impl PendingSummary {
    fn slot(&mut self, key: SummaryKey) -> &mut Option<SignedAmount> {
        match key {
            SummaryKey::OpeningBalance => &mut self.opening,
            SummaryKey::ClosingBalance => &mut self.closing,
            SummaryKey::TotalDebits => &mut self.debits,
            SummaryKey::TotalCredits => &mut self.credits,
        }
    }
}

fn scope_name(card_identifier: Option<&str>) -> String {
    match card_identifier {
        Some(card) => format!("card {card}"),
        None => "the account".to_string(),
    }
}

/// Group summary entries by scope, keeping the order scopes first appear in.
fn resolve_summaries(entries: &[SummaryEntry], scope: SummaryScope) -> Result<Vec<AccountSummary>> {
    let mut scopes: Vec<(Option<String>, PendingSummary)> = Vec::new();

    for entry in entries {
        let card = match scope {
            SummaryScope::Account => None,
            SummaryScope::PerCard => entry.card_identifier.clone(),
        };
        let index = match scopes.iter().position(|(c, _)| *c == card) {
            Some(i) => i,
            None => {
                scopes.push((card, PendingSummary::default()));
                scopes.len() - 1
            }
        };
        let (card, pending) = &mut scopes[index];
        let what = format!("{} for {}", entry.key, scope_name(card.as_deref()));
        // compare by signed value so `0,00 Af` and `0,00 Bij` agree
        let slot = pending.slot(entry.key);
        match slot {
            Some(existing) if existing.signed() != entry.amount.signed() => {
                return Err(ParseError::layout(
                    entry.at,
                    format!("conflicting {what}: {} and {}", existing.signed(), entry.amount.signed()),
                ));
            }
            Some(_) => {}
            None => *slot = Some(entry.amount),
        }
    }

    scopes
        .into_iter()
        .map(|(card, pending)| {
            let opening = pending
                .opening
                .ok_or_else(|| ParseError::missing(format!("opening balance for {}", scope_name(card.as_deref()))))?;
            let closing = pending
                .closing
                .ok_or_else(|| ParseError::missing(format!("closing balance for {}", scope_name(card.as_deref()))))?;
            Ok(AccountSummary {
                card_identifier: card,
                opening_balance: opening.signed(),
                closing_balance: closing.signed(),
                total_debits: pending
                    .debits
                    .map(|a| SignedAmount::new(a.magnitude, Direction::Debit).signed()),
                total_credits: pending
                    .credits
                    .map(|a| SignedAmount::new(a.magnitude, Direction::Credit).signed()),
            })
        })
        .collect()
}

/// Every card that has transactions needs a summary covering it.
fn check_coverage(summaries: &[AccountSummary], transactions: &[Transaction]) -> Result<()> {
    if summaries.is_empty() {
        return Err(ParseError::missing("account summary"));
    }
    let cards: BTreeSet<Option<&str>> = transactions
        .iter()
        .map(|t| t.card_identifier.as_deref())
        .collect();
    for card in cards {
        let covered = summaries
            .iter()
            .any(|s| s.card_identifier.is_none() || s.card_identifier.as_deref() == card);
        if !covered {
            return Err(ParseError::missing(format!(
                "account summary for {}",
                scope_name(card)
            )));
        }
    }
    Ok(())
}

fn reconcile(summary: &AccountSummary, transactions: &[Transaction]) -> Result<()> {
    let computed = summary.computed_closing(transactions);
    let delta = computed - summary.closing_balance;
    if !within_tolerance(delta) {
        return Err(ParseError::BalanceMismatch {
            card_identifier: summary.card_identifier.clone(),
            stated: summary.closing_balance,
            computed,
            delta,
        });
    }
    debug!(
        scope = %scope_name(summary.card_identifier.as_deref()),
        opening = %summary.opening_balance,
        closing = %summary.closing_balance,
        "balance reconciles"
    );
    Ok(())
}

/// Stated totals that disagree with the transactions are only reported.
fn check_totals(summary: &AccountSummary, transactions: &[Transaction]) {
    let covered = || transactions.iter().filter(|t| summary.covers(t));
    let debits: Decimal = covered().filter(|t| t.is_debit()).map(|t| t.amount).sum();
    let credits: Decimal = covered().filter(|t| t.is_credit()).map(|t| t.amount).sum();
    let scope = scope_name(summary.card_identifier.as_deref());

    if let Some(stated) = summary.total_debits {
        if !within_tolerance(stated.abs() - debits.abs()) {
            warn!(%scope, stated = %stated, computed = %debits, "total debits do not match the transactions");
        }
    }
    if let Some(stated) = summary.total_credits {
        if !within_tolerance(stated.abs() - credits.abs()) {
            warn!(%scope, stated = %stated, computed = %credits, "total credits do not match the transactions");
        }
    }
}

/// Turn the builder's output into a validated [`Statement`].
pub fn assemble(extraction: Extraction, layout: &dyn Layout) -> Result<Statement> {
    let Extraction {
        transactions,
        header,
        summaries,
    } = extraction;

    let header = resolve_header(&header)?;
    let period = match header.period {
        Some(period) => period,
        None => layout
            .derive_period(&header.info)
            .ok_or_else(|| ParseError::missing("statement period"))?,
    };

    let account_summaries = resolve_summaries(&summaries, layout.summary_scope())?;
    check_coverage(&account_summaries, &transactions)?;
    for summary in &account_summaries {
        reconcile(summary, &transactions)?;
        check_totals(summary, &transactions);
    }

    Ok(Statement {
        layout: layout.name().to_string(),
        period,
        info: header.info,
        card_holders: header.card_holders,
        account_summaries,
        transactions,
    })
}

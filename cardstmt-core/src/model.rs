use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::money::serde_text;

/// Inclusive date range a statement covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Period {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Period {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// One posted charge or credit.
///
/// `amount` is signed with [`crate::SIGN_CONVENTION`]: credits positive,
/// debits negative. The foreign-currency fields are only present when the
/// statement printed them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    pub date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_identifier: Option<String>,
    pub description: String,
    #[serde(serialize_with = "serde_text::amount")]
    pub amount: Decimal,
    #[serde(
        serialize_with = "serde_text::amount_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub foreign_amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub foreign_currency: Option<String>,
    #[serde(
        serialize_with = "serde_text::rate_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub exchange_rate: Option<Decimal>,
}

impl Transaction {
    pub fn is_credit(&self) -> bool {
        self.amount > Decimal::ZERO
    }

    pub fn is_debit(&self) -> bool {
        self.amount < Decimal::ZERO
    }
}

/// Balances stated by the document for one card, or for the whole account
/// when `card_identifier` is `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_identifier: Option<String>,
    #[serde(serialize_with = "serde_text::amount")]
    pub opening_balance: Decimal,
    #[serde(serialize_with = "serde_text::amount")]
    pub closing_balance: Decimal,
    #[serde(
        serialize_with = "serde_text::amount_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub total_debits: Option<Decimal>,
    #[serde(
        serialize_with = "serde_text::amount_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub total_credits: Option<Decimal>,
}

impl AccountSummary {
    /// An account-level summary covers every transaction; a card summary only
    /// the transactions of that card.
    pub fn covers(&self, tx: &Transaction) -> bool {
        self.card_identifier.is_none() || self.card_identifier == tx.card_identifier
    }

    /// `opening_balance + sum(amount)` over the covered transactions.
    pub fn computed_closing<'a>(&self, transactions: impl IntoIterator<Item = &'a Transaction>) -> Decimal {
        transactions
            .into_iter()
            .filter(|tx| self.covers(tx))
            .fold(self.opening_balance, |acc, tx| acc + tx.amount)
    }
}

/// Document metadata some layouts print in an info box.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatementInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issued_on: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardHolder {
    pub card_identifier: String,
    pub name: String,
}

/// Whether a layout states one balance block for the account or one per card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryScope {
    Account,
    PerCard,
}

/// One parsed document. Built once by the assembler, never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statement {
    pub layout: String,
    pub period: Period,
    #[serde(flatten)]
    pub info: StatementInfo,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub card_holders: Vec<CardHolder>,
    pub account_summaries: Vec<AccountSummary>,
    pub transactions: Vec<Transaction>,
}

impl Statement {
    pub fn summary_for(&self, card_identifier: Option<&str>) -> Option<&AccountSummary> {
        self.account_summaries
            .iter()
            .find(|s| s.card_identifier.as_deref() == card_identifier)
    }

    pub fn card_holder(&self, card_identifier: &str) -> Option<&str> {
        self.card_holders
            .iter()
            .find(|h| h.card_identifier == card_identifier)
            .map(|h| h.name.as_str())
    }

    pub fn total_debits(&self) -> Decimal {
        self.transactions
            .iter()
            .filter(|t| t.is_debit())
            .map(|t| t.amount)
            .sum()
    }

    pub fn total_credits(&self) -> Decimal {
        self.transactions
            .iter()
            .filter(|t| t.is_credit())
            .map(|t| t.amount)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn date(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn tx(card: Option<&str>, amount: &str) -> Transaction {
        Transaction {
            date: date(2025, 6, 3),
            card_identifier: card.map(str::to_string),
            description: "Coffee Shop".to_string(),
            amount: d(amount),
            foreign_amount: None,
            foreign_currency: None,
            exchange_rate: None,
        }
    }

    #[test]
    fn test_card_summary_only_counts_its_card() {
        let summary = AccountSummary {
            card_identifier: Some("1234".to_string()),
            opening_balance: d("100.00"),
            closing_balance: d("80.00"),
            total_debits: None,
            total_credits: None,
        };
        let txs = vec![tx(Some("1234"), "-20.00"), tx(Some("9876"), "-5.00")];
        assert_eq!(summary.computed_closing(&txs), d("80.00"));
    }

    #[test]
    fn test_account_summary_counts_everything() {
        let summary = AccountSummary {
            card_identifier: None,
            opening_balance: d("-10.00"),
            closing_balance: d("-35.00"),
            total_debits: None,
            total_credits: None,
        };
        let txs = vec![tx(Some("1234"), "-20.00"), tx(Some("9876"), "-5.00")];
        assert_eq!(summary.computed_closing(&txs), d("-35.00"));
    }

    #[test]
    fn test_statement_json_shape() {
        let statement = Statement {
            layout: "generic".to_string(),
            period: Period::new(date(2025, 6, 1), date(2025, 6, 30)),
            info: StatementInfo {
                serial_number: Some(7),
                ..Default::default()
            },
            card_holders: Vec::new(),
            account_summaries: vec![AccountSummary {
                card_identifier: None,
                opening_balance: d("100"),
                closing_balance: d("80"),
                total_debits: None,
                total_credits: None,
            }],
            transactions: vec![Transaction {
                foreign_amount: Some(d("-21.7")),
                foreign_currency: Some("USD".to_string()),
                exchange_rate: Some(d("1.08500")),
                ..tx(None, "-20")
            }],
        };

        let value = serde_json::to_value(&statement).unwrap();
        assert_eq!(value["period"]["start"], "2025-06-01");
        assert_eq!(value["serial_number"], 7);
        assert!(value.get("issued_on").is_none());
        assert!(value.get("card_holders").is_none());
        assert_eq!(value["account_summaries"][0]["opening_balance"], "100.00");
        assert!(value["account_summaries"][0].get("total_debits").is_none());

        let t = &value["transactions"][0];
        assert_eq!(t["amount"], "-20.00");
        assert_eq!(t["foreign_amount"], "-21.70");
        assert_eq!(t["exchange_rate"], "1.085");
        assert!(t.get("card_identifier").is_none());
    }

    #[test]
    fn test_totals_split_by_sign() {
        let statement = Statement {
            layout: "ics".to_string(),
            period: Period::new(date(2025, 6, 1), date(2025, 6, 30)),
            info: StatementInfo::default(),
            card_holders: vec![CardHolder {
                card_identifier: "1234".to_string(),
                name: "J. JANSEN".to_string(),
            }],
            account_summaries: Vec::new(),
            transactions: vec![tx(None, "-20.00"), tx(None, "54.50"), tx(None, "-1.25")],
        };
        assert_eq!(statement.total_debits(), d("-21.25"));
        assert_eq!(statement.total_credits(), d("54.50"));
        assert_eq!(statement.card_holder("1234"), Some("J. JANSEN"));
        assert!(statement.period.contains(date(2025, 6, 30)));
    }
}

//! cardstmt-core: statement model, money conventions and parse errors shared by
//! the ingest and export crates.

pub mod error;
pub mod model;
pub mod money;
pub mod text;

pub use error::{LineRef, ParseError, Result};
pub use model::{AccountSummary, CardHolder, Period, Statement, StatementInfo, SummaryScope, Transaction};
pub use money::{Direction, NumberFormat, SignConvention, SignedAmount, SIGN_CONVENTION};
pub use text::{TextFragment, TEXT_LINE_PITCH};

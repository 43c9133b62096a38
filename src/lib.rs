//! Cursor context detection for [Ledger-cli](https://www.ledger-cli.org/) input files,
//! for editors that want to know what the cursor is on without parsing the whole journal.
//!
//! Every line is classified on its own, from its text alone:
//!
//! * Blank lines
//!
//! * Line comments (starting with ``;`` at any indentation, or ``# % | *`` in column 0)
//!
//! * Transaction headers with format:
//!
//!   ```ignore
//!   DATE[=EDATE] [*|!] [[=EDATE]] PAYEE [; NOTE]
//!   ```
//!
//! * Transaction postings with format (minimum two spaces or one tab between
//!   ``ACCOUNT`` and ``AMOUNT``):
//!
//!   ```ignore
//!     [*|!] ACCOUNT  [AMOUNT] [; NOTE [[=EDATE]]]
//!   ```
//!
//! Anything else (prices, directives, ...) is ``Other`` and carries no fields.
//!
//! Effective dates can be inserted and removed as pure line-text
//! transformations, and reports can be requested from the external `ledger`
//! binary.

mod classify;
mod effective_date;
mod engine;
mod host;
mod locate;
mod model;
mod parser;
mod session;
mod syntax;

pub use classify::{classify_line, line_at, lines};
pub use effective_date::{with_effective_date_inserted, with_effective_date_removed};
pub use engine::{EngineError, LedgerEngine, Report};
pub use host::{insert_effective_date, remove_effective_date, run_report, run_report_at, Host};
pub use locate::{context_at, field_of_kind, fields, locate_field};
pub use model::*;
pub use session::{ConfigError, EditingSession};
pub use syntax::LineSyntax;

/// Line and field under byte `offset` of `document`, with the default comment syntax.
///
/// # Examples
///
/// ```rust
/// use ledger_context::{context, FieldKind, LineKind};
///
/// let context = context("2024-01-15 * Grocery Store  ; weekly", 5).unwrap();
/// assert_eq!(context.line.kind, LineKind::TransactionHeader);
/// let field = context.field.unwrap();
/// assert_eq!(field.kind, FieldKind::Date);
/// assert_eq!(field.text, "2024-01-15");
/// ```
pub fn context(document: &str, offset: usize) -> Option<CursorContext> {
    context_at(document, offset, &LineSyntax::default())
}

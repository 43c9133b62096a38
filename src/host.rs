//! Editing commands expressed against callbacks supplied by the editor.
//!
//! Each command returns the new text of the line instead of editing a buffer;
//! applying it is up to the editor.

use crate::effective_date::{with_effective_date_inserted, with_effective_date_removed};
use crate::engine::{EngineError, LedgerEngine, Report};
use crate::locate;
use crate::model::*;
use crate::session::EditingSession;

/// Interaction the editor provides.
pub trait Host {
    /// Asks the user for a line of text. `None` means the prompt was cancelled.
    fn prompt_for_string(&mut self, prompt: &str, initial: Option<&str>) -> Option<String>;

    fn show_message(&mut self, message: &str);
}

fn accepts_effective_date(host: &mut impl Host, line: &LedgerLine) -> bool {
    match line.kind {
        LineKind::TransactionHeader | LineKind::Posting => true,
        _ => {
            host.show_message("Not on a transaction or posting line");
            false
        }
    }
}

/// Prompts for an effective date and returns `line` with it set.
///
/// The prompt starts from the current effective date, or from the
/// transaction date on a header.
pub fn insert_effective_date<H: Host>(
    host: &mut H,
    session: &EditingSession,
    line: &LedgerLine,
) -> Option<String> {
    if !accepts_effective_date(host, line) {
        return None;
    }

    let fields = locate::fields(line, &session.syntax);
    let initial = fields
        .iter()
        .find(|field| field.kind == FieldKind::EffectiveDate)
        .or_else(|| fields.iter().find(|field| field.kind == FieldKind::Date))
        .map(|field| field.text.as_str());

    let input = host.prompt_for_string("Effective date: ", initial)?;
    let date = match session.complete_date(&input) {
        Some(date) => date,
        None => {
            host.show_message(&format!("Invalid date: {}", input.trim()));
            return None;
        }
    };

    Some(with_effective_date_inserted(
        line,
        &session.format_date(date),
        &session.syntax,
    ))
}

/// Returns `line` without its effective date, or `None` when it has none.
pub fn remove_effective_date<H: Host>(
    host: &mut H,
    session: &EditingSession,
    line: &LedgerLine,
) -> Option<String> {
    if !accepts_effective_date(host, line) {
        return None;
    }

    if locate::field_of_kind(line, FieldKind::EffectiveDate, &session.syntax).is_none() {
        host.show_message("No effective date on this line");
        return None;
    }

    Some(with_effective_date_removed(line, &session.syntax))
}

/// Runs `report` and shows the engine's output, or its error, as is.
pub fn run_report<H: Host>(
    host: &mut H,
    engine: &LedgerEngine,
    report: Report,
    account: Option<&str>,
) -> Result<String, EngineError> {
    match engine.run(report, account) {
        Ok(output) => {
            host.show_message(&output);
            Ok(output)
        }
        Err(error) => {
            host.show_message(&error.user_message());
            Err(error)
        }
    }
}

/// Runs `report` for the account of the posting under the cursor, or for the
/// whole journal when the cursor is not on a posting.
pub fn run_report_at<H: Host>(
    host: &mut H,
    session: &EditingSession,
    report: Report,
    context: &CursorContext,
) -> Result<String, EngineError> {
    let account = locate::field_of_kind(&context.line, FieldKind::Account, &session.syntax);
    run_report(
        host,
        &session.engine,
        report,
        account.as_ref().map(|field| field.text.as_str()),
    )
}

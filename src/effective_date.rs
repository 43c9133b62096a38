//! Insertion and removal of effective dates as pure line-text transformations.
//!
//! A transaction header carries its effective date as `DATE=EDATE`, a posting
//! as a `[=EDATE]` annotation inside its trailing comment.

use crate::locate;
use crate::model::*;
use crate::parser::is_white_char;
use crate::syntax::LineSyntax;

fn existing(line: &LedgerLine, syntax: &LineSyntax) -> Option<FieldSpan> {
    locate::field_of_kind(line, FieldKind::EffectiveDate, syntax)
}

/// `span` made relative to the start of `line`.
fn local(line: &LedgerLine, span: Span) -> std::ops::Range<usize> {
    span.start - line.start_offset..span.end - line.start_offset
}

/// Returns the text of `line` with its effective date set to `date`.
///
/// An existing effective date is replaced in place. Lines that are neither a
/// transaction header nor a posting are returned unchanged.
pub fn with_effective_date_inserted(line: &LedgerLine, date: &str, syntax: &LineSyntax) -> String {
    let mut text = line.raw_text.clone();

    if let Some(field) = existing(line, syntax) {
        text.replace_range(local(line, field.span), date);
        return text;
    }

    match line.kind {
        LineKind::TransactionHeader => {
            if let Some(field) = locate::field_of_kind(line, FieldKind::Date, syntax) {
                text.insert_str(local(line, field.span).end, &format!("={}", date));
            }
        }
        LineKind::Posting => {
            let content_end = text.trim_end_matches(is_white_char).len();
            let fields = locate::fields(line, syntax);
            let account_end = fields
                .iter()
                .find(|field| field.kind == FieldKind::Account)
                .map_or(0, |field| local(line, field.span).end);
            let has_lead = syntax.find_comment_lead(&text[account_end..]).is_some();
            let has_text = fields.iter().any(|field| field.kind == FieldKind::CommentText);
            let annotation = match (has_lead, has_text) {
                (true, true) => format!(" [={}]", date),
                // A bare lead takes the annotation right against it.
                (true, false) => format!("[={}]", date),
                (false, _) => {
                    let lead = syntax.comment_leads.first().copied().unwrap_or(';');
                    format!("  {} [={}]", lead, date)
                }
            };
            text.insert_str(content_end, &annotation);
        }
        _ => {}
    }

    text
}

/// Returns the text of `line` without its effective date, delimiters included.
pub fn with_effective_date_removed(line: &LedgerLine, syntax: &LineSyntax) -> String {
    let mut text = line.raw_text.clone();
    if let Some(field) = existing(line, syntax) {
        text.replace_range(local(line, field.extent), "");
    }
    text
}

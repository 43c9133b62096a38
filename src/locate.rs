use tracing::{debug, trace};

use crate::classify;
use crate::model::*;
use crate::parser::{self, is_white_char};
use crate::syntax::LineSyntax;

fn skip_white(text: &str, pos: usize) -> usize {
    text.len() - text[pos..].trim_start_matches(is_white_char).len()
}

/// `text[start..end]` without surrounding whitespace, or `None` when nothing is left.
fn trimmed(text: &str, start: usize, end: usize) -> Option<Span> {
    let piece = &text[start..end];
    let leading = piece.len() - piece.trim_start_matches(is_white_char).len();
    let piece = piece.trim_matches(is_white_char);
    if piece.is_empty() {
        None
    } else {
        Some(Span::new(start + leading, start + leading + piece.len()))
    }
}

fn field(kind: FieldKind, text: &str, span: Span) -> FieldSpan {
    FieldSpan::new(kind, &text[span.start..span.end], span)
}

/// Byte index just past the comment lead at `lead`.
fn after_lead(text: &str, lead: usize) -> usize {
    lead + text[lead..].chars().next().map_or(0, char::len_utf8)
}

/// Date span and end of a `[=DATE]` annotation opening at `open`.
fn date_annotation_at(text: &str, open: usize) -> Option<(Span, usize)> {
    let (rest, date) = parser::date_annotation(&text[open..]).ok()?;
    let start = skip_white(text, open + 2);
    Some((Span::new(start, start + date.len()), text.len() - rest.len()))
}

fn header_fields(text: &str, syntax: &LineSyntax) -> Vec<FieldSpan> {
    let mut fields = Vec::new();
    let date = match parser::date_token(text) {
        Ok((_, date)) => date,
        Err(_) => return fields,
    };
    let mut pos = date.len();
    fields.push(field(FieldKind::Date, text, Span::new(0, pos)));

    if let Ok((_, edate)) = parser::effective_date_suffix(&text[pos..]) {
        let value = Span::new(pos + 1, pos + 1 + edate.len());
        fields.push(
            field(FieldKind::EffectiveDate, text, value).with_extent(Span::new(pos, value.end)),
        );
        pos = value.end;
    }

    let end = syntax
        .find_comment_lead(&text[pos..])
        .map_or(text.len(), |lead| pos + lead);

    pos = skip_white(text, pos);
    if parser::status_marker(&text[pos..end]).is_ok() {
        pos = skip_white(text, pos + 1);
    }

    if text[pos..end].starts_with("[=") {
        match date_annotation_at(&text[..end], pos) {
            Some((value, close)) => {
                let extent_start = text[..pos].trim_end_matches(is_white_char).len();
                fields.push(
                    field(FieldKind::EffectiveDate, text, value)
                        .with_extent(Span::new(extent_start, close)),
                );
                pos = skip_white(text, close);
            }
            None => debug!("malformed effective date annotation read as payee"),
        }
    }

    if let Some(payee) = trimmed(text, pos, end) {
        fields.push(field(FieldKind::Payee, text, payee));
    }

    if end < text.len() {
        if let Some(comment) = trimmed(text, after_lead(text, end), text.len()) {
            fields.push(field(FieldKind::CommentText, text, comment));
        }
    }

    fields
}

fn posting_fields(text: &str, syntax: &LineSyntax) -> Vec<FieldSpan> {
    let mut fields = Vec::new();
    let content = text.trim_start_matches(is_white_char);
    let account = classify::posting_account_start(content);
    let start = text.len() - account.len();
    let pos = start + parser::account_len(account, syntax);
    fields.push(field(FieldKind::Account, text, Span::new(start, pos)));

    let lead = syntax.find_comment_lead(&text[pos..]).map(|lead| pos + lead);
    if let Some(amount) = trimmed(text, pos, lead.unwrap_or(text.len())) {
        fields.push(field(FieldKind::Amount, text, amount));
    }

    if let Some(lead) = lead {
        fields.extend(inline_comment_fields(text, lead));
    }

    fields
}

/// Comment after a posting's comment lead, with an embedded `[=DATE]`
/// taking precedence over the comment text around it.
fn inline_comment_fields(text: &str, lead: usize) -> Vec<FieldSpan> {
    let body_start = after_lead(text, lead);
    let whole_comment = || {
        trimmed(text, body_start, text.len())
            .map(|span| field(FieldKind::CommentText, text, span))
            .into_iter()
            .collect::<Vec<_>>()
    };

    // The first well-formed annotation wins; a stray `[=` before it is comment text.
    let found = text[body_start..].match_indices("[=").find_map(|(open, _)| {
        let open = body_start + open;
        date_annotation_at(text, open).map(|(value, close)| (open, value, close))
    });
    let (open, value, close) = match found {
        Some(found) => found,
        None => {
            if text[body_start..].contains("[=") {
                debug!("malformed effective date annotation read as comment");
            }
            return whole_comment();
        }
    };

    let before = trimmed(text, body_start, open);
    let after = trimmed(text, close, text.len());
    let extent = match (before, after) {
        // Right against the lead: the lead was there before the annotation.
        (None, None) if open == body_start => Span::new(open, close),
        // Only the annotation: it goes together with its comment lead.
        (None, None) => Span::new(text[..lead].trim_end_matches(is_white_char).len(), close),
        (Some(_), _) => Span::new(text[..open].trim_end_matches(is_white_char).len(), close),
        (None, Some(_)) => Span::new(open, skip_white(text, close)),
    };

    let mut fields = Vec::new();
    if let Some(before) = before {
        fields.push(field(FieldKind::CommentText, text, before));
    }
    fields.push(field(FieldKind::EffectiveDate, text, value).with_extent(extent));
    if let Some(after) = after {
        fields.push(field(FieldKind::CommentText, text, after));
    }
    fields
}

fn line_comment_fields(text: &str) -> Vec<FieldSpan> {
    let lead = text.len() - text.trim_start_matches(is_white_char).len();
    trimmed(text, after_lead(text, lead), text.len())
        .map(|span| field(FieldKind::CommentText, text, span))
        .into_iter()
        .collect()
}

/// Every field on `line`, left to right, with document offsets.
/// No two spans overlap.
pub fn fields(line: &LedgerLine, syntax: &LineSyntax) -> Vec<FieldSpan> {
    let text = line.raw_text.as_str();
    let fields = match line.kind {
        LineKind::TransactionHeader => header_fields(text, syntax),
        LineKind::Posting => posting_fields(text, syntax),
        LineKind::Comment => line_comment_fields(text),
        LineKind::Blank | LineKind::Other => Vec::new(),
    };
    fields
        .into_iter()
        .map(|field| field.shifted(line.start_offset))
        .collect()
}

/// First field of the given kind on `line`.
pub fn field_of_kind(
    line: &LedgerLine,
    kind: FieldKind,
    syntax: &LineSyntax,
) -> Option<FieldSpan> {
    fields(line, syntax).into_iter().find(|field| field.kind == kind)
}

/// The field under document offset `offset`.
///
/// An offset on a delimiter right after a field resolves to that field. The
/// line's first offset resolves to its first field; the line's end offset
/// resolves to nothing.
pub fn locate_field(
    line: &LedgerLine,
    offset: usize,
    syntax: &LineSyntax,
) -> Option<FieldSpan> {
    if offset < line.start_offset || offset >= line.end_offset {
        return None;
    }

    let mut fields = fields(line, syntax);
    if offset == line.start_offset {
        return fields.into_iter().next();
    }

    let index = fields
        .iter()
        .position(|field| field.span.contains(offset))
        .or_else(|| fields.iter().position(|field| field.span.end == offset))?;
    Some(fields.swap_remove(index))
}

/// Line and field under `offset` in `document`; `None` past the end of the document.
pub fn context_at(document: &str, offset: usize, syntax: &LineSyntax) -> Option<CursorContext> {
    let line = classify::line_at(document, offset, syntax)?;
    let field = locate_field(&line, offset, syntax);
    trace!(
        offset,
        line = ?line.kind,
        field = ?field.as_ref().map(|field| field.kind),
        "cursor context"
    );
    Some(CursorContext { line, field })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds_and_texts(text: &str) -> Vec<(FieldKind, String)> {
        fields(&LedgerLine::parse(text), &LineSyntax::default())
            .into_iter()
            .map(|field| (field.kind, field.text))
            .collect()
    }

    fn locate(text: &str, offset: usize) -> Option<FieldSpan> {
        locate_field(&LedgerLine::parse(text), offset, &LineSyntax::default())
    }

    #[test]
    fn header_fields_test() {
        assert_eq!(
            kinds_and_texts("2024-01-15 * Grocery Store  ; weekly"),
            vec![
                (FieldKind::Date, "2024-01-15".to_string()),
                (FieldKind::Payee, "Grocery Store".to_string()),
                (FieldKind::CommentText, "weekly".to_string()),
            ]
        );
        assert_eq!(
            kinds_and_texts("2018-10-01=2018-10-14 ! (123) Marek Ogarek"),
            vec![
                (FieldKind::Date, "2018-10-01".to_string()),
                (FieldKind::EffectiveDate, "2018-10-14".to_string()),
                (FieldKind::Payee, "(123) Marek Ogarek".to_string()),
            ]
        );
        assert_eq!(
            kinds_and_texts("2018-10-01 * [= 2018-10-14 ] Shop"),
            vec![
                (FieldKind::Date, "2018-10-01".to_string()),
                (FieldKind::EffectiveDate, "2018-10-14".to_string()),
                (FieldKind::Payee, "Shop".to_string()),
            ]
        );
        assert_eq!(
            kinds_and_texts("2018-10-01"),
            vec![(FieldKind::Date, "2018-10-01".to_string())]
        );
    }

    #[test]
    fn header_spans_test() {
        let line = LedgerLine::parse("2018-10-01=2018-10-14 * Shop");
        let spans = fields(&line, &LineSyntax::default());
        assert_eq!(spans[0].span, Span::new(0, 10));
        assert_eq!(spans[1].span, Span::new(11, 21));
        assert_eq!(spans[1].extent, Span::new(10, 21));
        assert_eq!(spans[2].span, Span::new(24, 28));

        let line = LedgerLine::parse("2018-10-01 * [=2018-10-14] Shop");
        let spans = fields(&line, &LineSyntax::default());
        assert_eq!(spans[1].span, Span::new(15, 25));
        assert_eq!(spans[1].extent, Span::new(12, 26));
    }

    #[test]
    fn header_unterminated_annotation_test() {
        assert_eq!(
            kinds_and_texts("2018-10-01 * [=2018-10-14 Shop"),
            vec![
                (FieldKind::Date, "2018-10-01".to_string()),
                (FieldKind::Payee, "[=2018-10-14 Shop".to_string()),
            ]
        );
    }

    #[test]
    fn posting_fields_test() {
        assert_eq!(
            kinds_and_texts("    Assets:Checking    $-42.50"),
            vec![
                (FieldKind::Account, "Assets:Checking".to_string()),
                (FieldKind::Amount, "$-42.50".to_string()),
            ]
        );
        assert_eq!(
            kinds_and_texts(" ! TEST:ABC 123  $1.20 = $2.40 ;comment"),
            vec![
                (FieldKind::Account, "TEST:ABC 123".to_string()),
                (FieldKind::Amount, "$1.20 = $2.40".to_string()),
                (FieldKind::CommentText, "comment".to_string()),
            ]
        );
        assert_eq!(
            kinds_and_texts("\tExpenses:Food\t10 EUR"),
            vec![
                (FieldKind::Account, "Expenses:Food".to_string()),
                (FieldKind::Amount, "10 EUR".to_string()),
            ]
        );
        assert_eq!(
            kinds_and_texts("  Equity ;note"),
            vec![
                (FieldKind::Account, "Equity".to_string()),
                (FieldKind::CommentText, "note".to_string()),
            ]
        );
    }

    #[test]
    fn posting_annotation_test() {
        let text = "    Assets:Checking    $-42.50  ; [=2024-01-20]";
        assert_eq!(
            kinds_and_texts(text),
            vec![
                (FieldKind::Account, "Assets:Checking".to_string()),
                (FieldKind::Amount, "$-42.50".to_string()),
                (FieldKind::EffectiveDate, "2024-01-20".to_string()),
            ]
        );
        let annotation = field_of_kind(
            &LedgerLine::parse(text),
            FieldKind::EffectiveDate,
            &LineSyntax::default(),
        )
        .unwrap();
        assert_eq!(annotation.span, Span::new(36, 46));
        assert_eq!(annotation.extent, Span::new(30, 47));

        assert_eq!(
            kinds_and_texts("  Assets  $1 ; paid [=2024-01-20] late"),
            vec![
                (FieldKind::Account, "Assets".to_string()),
                (FieldKind::Amount, "$1".to_string()),
                (FieldKind::CommentText, "paid".to_string()),
                (FieldKind::EffectiveDate, "2024-01-20".to_string()),
                (FieldKind::CommentText, "late".to_string()),
            ]
        );
    }

    #[test]
    fn posting_unterminated_annotation_test() {
        assert_eq!(
            kinds_and_texts("  Assets  $1 ; [=2024-01-20"),
            vec![
                (FieldKind::Account, "Assets".to_string()),
                (FieldKind::Amount, "$1".to_string()),
                (FieldKind::CommentText, "[=2024-01-20".to_string()),
            ]
        );
    }

    #[test]
    fn posting_malformed_annotation_before_date_test() {
        assert_eq!(
            kinds_and_texts("  Assets  $1 ; see [=later [=2024-01-20]"),
            vec![
                (FieldKind::Account, "Assets".to_string()),
                (FieldKind::Amount, "$1".to_string()),
                (FieldKind::CommentText, "see [=later".to_string()),
                (FieldKind::EffectiveDate, "2024-01-20".to_string()),
            ]
        );
        assert_eq!(
            kinds_and_texts("  Assets  $1 ; [=] [=2024-01-20]"),
            vec![
                (FieldKind::Account, "Assets".to_string()),
                (FieldKind::Amount, "$1".to_string()),
                (FieldKind::CommentText, "[=]".to_string()),
                (FieldKind::EffectiveDate, "2024-01-20".to_string()),
            ]
        );
        assert_eq!(
            kinds_and_texts("  Assets  $1 ; see [=TODO]"),
            vec![
                (FieldKind::Account, "Assets".to_string()),
                (FieldKind::Amount, "$1".to_string()),
                (FieldKind::CommentText, "see [=TODO]".to_string()),
            ]
        );
    }

    #[test]
    fn posting_annotation_against_lead_test() {
        let line = LedgerLine::parse("  Assets  $1  ;[=2024-01-20]");
        let annotation =
            field_of_kind(&line, FieldKind::EffectiveDate, &LineSyntax::default()).unwrap();
        assert_eq!(annotation.span, Span::new(17, 27));
        assert_eq!(annotation.extent, Span::new(15, 28));
    }

    #[test]
    fn header_malformed_annotation_test() {
        assert_eq!(
            kinds_and_texts("2018-10-01 * [=TODO] Shop"),
            vec![
                (FieldKind::Date, "2018-10-01".to_string()),
                (FieldKind::Payee, "[=TODO] Shop".to_string()),
            ]
        );
        assert_eq!(
            kinds_and_texts("2018-10-01 [=] Shop"),
            vec![
                (FieldKind::Date, "2018-10-01".to_string()),
                (FieldKind::Payee, "[=] Shop".to_string()),
            ]
        );
    }

    #[test]
    fn comment_and_other_fields_test() {
        assert_eq!(
            kinds_and_texts(";  Comment Line 1 "),
            vec![(FieldKind::CommentText, "Comment Line 1".to_string())]
        );
        assert!(kinds_and_texts(";").is_empty());
        assert!(kinds_and_texts("P 2017-11-12 12:00:00 mBH 5.00 PLN").is_empty());
        assert!(kinds_and_texts("   ").is_empty());
    }

    #[test]
    fn locate_inside_fields_test() {
        let header = "2024-01-15 * Grocery Store  ; weekly";
        assert_eq!(locate(header, 5).map(|f| f.text), Some("2024-01-15".to_string()));
        assert_eq!(locate(header, 15).map(|f| f.kind), Some(FieldKind::Payee));
        assert_eq!(locate(header, 32).map(|f| f.kind), Some(FieldKind::CommentText));

        let posting = "    Assets:Checking    $-42.50";
        let amount = locate(posting, 25).unwrap();
        assert_eq!(amount.kind, FieldKind::Amount);
        assert_eq!(amount.text, "$-42.50");
        assert_eq!(amount.span, Span::new(23, 30));
    }

    #[test]
    fn locate_delimiters_resolve_left_test() {
        let header = "2024-01-15=2024-01-20 * Grocery Store  ; weekly";
        assert_eq!(locate(header, 10).map(|f| f.kind), Some(FieldKind::Date));
        assert_eq!(locate(header, 21).map(|f| f.kind), Some(FieldKind::EffectiveDate));
        assert_eq!(locate(header, 22), None);
        assert_eq!(locate(header, 37).map(|f| f.kind), Some(FieldKind::Payee));
        assert_eq!(locate(header, 39), None);

        let posting = "    Assets:Checking    $-42.50  ; [=2024-01-20]";
        assert_eq!(locate(posting, 19).map(|f| f.kind), Some(FieldKind::Account));
        assert_eq!(locate(posting, 20), None);
        assert_eq!(locate(posting, 34), None);
        assert_eq!(locate(posting, 46).map(|f| f.kind), Some(FieldKind::EffectiveDate));
    }

    #[test]
    fn locate_boundaries_test() {
        let posting = "    Assets:Checking    $-42.50";
        assert_eq!(locate(posting, 0).map(|f| f.kind), Some(FieldKind::Account));
        assert_eq!(locate(posting, posting.len()), None);
        assert_eq!(locate(posting, posting.len() + 5), None);

        assert_eq!(locate("; note", 0).map(|f| f.text), Some("note".to_string()));
        assert_eq!(locate("   ", 0), None);
        assert_eq!(locate("include x.ledger", 3), None);
    }

    #[test]
    fn locate_uses_document_offsets_test() {
        let syntax = LineSyntax::default();
        let line = LedgerLine::new("  Assets  $1", 100, &syntax);
        assert_eq!(locate_field(&line, 5, &syntax), None);
        let field = locate_field(&line, 103, &syntax).unwrap();
        assert_eq!(field.kind, FieldKind::Account);
        assert_eq!(field.span, Span::new(102, 108));
    }

    #[test]
    fn context_at_test() {
        let syntax = LineSyntax::default();
        let document = concat!(
            "; budget\n",
            "2024-01-15 * Grocery Store\n",
            "    Expenses:Food  $42.50\n",
            "    Assets:Checking\n",
        );
        let context = context_at(document, 14, &syntax).unwrap();
        assert_eq!(context.line.kind, LineKind::TransactionHeader);
        assert_eq!(context.field.map(|f| f.kind), Some(FieldKind::Date));

        let offset = document.find("$42").unwrap() + 1;
        let context = context_at(document, offset, &syntax).unwrap();
        assert_eq!(context.line.kind, LineKind::Posting);
        let field = context.field.unwrap();
        assert_eq!(field.text, "$42.50");
        assert_eq!(&document[field.span.start..field.span.end], "$42.50");

        let context = context_at(document, document.len(), &syntax).unwrap();
        assert_eq!(context.line.kind, LineKind::Blank);
        assert_eq!(context.field, None);

        assert_eq!(context_at(document, document.len() + 1, &syntax), None);
    }
}

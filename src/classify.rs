use crate::model::*;
use crate::parser;
use crate::syntax::LineSyntax;

/// True when a header date is followed by something a header may continue with.
fn is_header_date_end(rest: &str, syntax: &LineSyntax) -> bool {
    match rest.chars().next() {
        None => true,
        Some(c) => parser::is_white_char(c) || syntax.is_comment_lead(c),
    }
}

/// Length of the date (and `=DATE` suffix) that opens a transaction header.
pub(crate) fn header_date_len(text: &str, syntax: &LineSyntax) -> Option<usize> {
    let (rest, _) = parser::date_token(text).ok()?;
    let rest = match parser::effective_date_suffix(rest) {
        Ok((rest, _)) => rest,
        Err(_) => rest,
    };
    if is_header_date_end(rest, syntax) {
        Some(text.len() - rest.len())
    } else {
        None
    }
}

/// Decides what kind of line `text` is, from the line alone.
///
/// `text` must not contain the line terminator; a trailing `\r` is ignored.
pub fn classify_line(text: &str, syntax: &LineSyntax) -> LineKind {
    let text = text.strip_suffix('\r').unwrap_or(text);
    let content = text.trim_start_matches(parser::is_white_char);

    let first = match content.chars().next() {
        Some(c) if !content.trim().is_empty() => c,
        _ => return LineKind::Blank,
    };
    let indented = content.len() < text.len();

    let top_level = !indented && syntax.is_top_level_comment_lead(first);
    if syntax.is_comment_lead(first) || top_level {
        return LineKind::Comment;
    }

    if !indented {
        return match header_date_len(text, syntax) {
            Some(_) => LineKind::TransactionHeader,
            None => LineKind::Other,
        };
    }

    let account = posting_account_start(content);
    if parser::account_len(account, syntax) > 0 {
        LineKind::Posting
    } else {
        LineKind::Other
    }
}

/// Skips a posting's `*`/`!` marker and the whitespace after it.
pub(crate) fn posting_account_start(content: &str) -> &str {
    match parser::status_marker(content) {
        Ok((rest, _)) if rest.starts_with(parser::is_white_char) => {
            rest.trim_start_matches(parser::is_white_char)
        }
        _ => content,
    }
}

impl LedgerLine {
    /// Classifies `text` as a line starting at `start_offset` of its document.
    pub fn new(text: &str, start_offset: usize, syntax: &LineSyntax) -> Self {
        let text = text.strip_suffix('\r').unwrap_or(text);
        Self {
            kind: classify_line(text, syntax),
            raw_text: text.to_string(),
            start_offset,
            end_offset: start_offset + text.len(),
        }
    }

    /// A standalone line with the default comment syntax.
    pub fn parse(text: &str) -> Self {
        Self::new(text, 0, &LineSyntax::default())
    }
}

/// All lines of `document`, in order.
pub fn lines<'a>(
    document: &'a str,
    syntax: &'a LineSyntax,
) -> impl Iterator<Item = LedgerLine> + 'a {
    let mut start = 0;
    document.split('\n').map(move |text| {
        let line = LedgerLine::new(text, start, syntax);
        start += text.len() + 1;
        line
    })
}

/// The line containing byte `offset`. An offset on a line terminator belongs
/// to the line it ends.
pub fn line_at(document: &str, offset: usize, syntax: &LineSyntax) -> Option<LedgerLine> {
    if offset > document.len() {
        return None;
    }
    let bytes = document.as_bytes();
    let start = bytes[..offset]
        .iter()
        .rposition(|&b| b == b'\n')
        .map_or(0, |pos| pos + 1);
    let end = bytes[offset..]
        .iter()
        .position(|&b| b == b'\n')
        .map_or(document.len(), |pos| offset + pos);
    Some(LedgerLine::new(&document[start..end], start, syntax))
}

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::fmt;

use crate::parser;

/// Half-open byte range `[start, end)` into a document.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub const fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }

    /// True when `other` lies entirely within this span.
    pub const fn encloses(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    pub const fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub(crate) const fn shift(self, by: usize) -> Span {
        Span::new(self.start + by, self.end + by)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum LineKind {
    TransactionHeader,
    Posting,
    Comment,
    Blank,
    Other,
}

///
/// One line of a ledger document, without its line terminator.
///
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct LedgerLine {
    pub kind: LineKind,
    pub raw_text: String,
    pub start_offset: usize,
    pub end_offset: usize,
}

impl LedgerLine {
    pub const fn span(&self) -> Span {
        Span::new(self.start_offset, self.end_offset)
    }

    pub fn len(&self) -> usize {
        self.raw_text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw_text.is_empty()
    }

    /// Cleared/pending marker of a transaction header or posting.
    pub fn status(&self) -> Option<TransactionStatus> {
        let text = match self.kind {
            LineKind::TransactionHeader => {
                let (rest, _) = parser::date_token(&self.raw_text).ok()?;
                let rest = parser::effective_date_suffix(rest)
                    .map(|(rest, _)| rest)
                    .unwrap_or(rest);
                rest.trim_start_matches(parser::is_white_char)
            }
            LineKind::Posting => self.raw_text.trim_start_matches(parser::is_white_char),
            _ => return None,
        };
        parser::status_marker(text).ok().map(|(_, status)| status)
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum FieldKind {
    Date,
    EffectiveDate,
    Payee,
    Account,
    Amount,
    CommentText,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            FieldKind::Date => "date",
            FieldKind::EffectiveDate => "effective date",
            FieldKind::Payee => "payee",
            FieldKind::Account => "account",
            FieldKind::Amount => "amount",
            FieldKind::CommentText => "comment",
        };
        f.write_str(name)
    }
}

///
/// A located field within a line.
///
/// `span` covers the field's value. `extent` additionally covers the
/// structural punctuation that belongs to the field (the `=` or `[= ]` of an
/// effective date and the whitespace that goes away with it); for every
/// other field it equals `span`.
///
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct FieldSpan {
    pub kind: FieldKind,
    pub text: String,
    pub span: Span,
    pub extent: Span,
}

impl FieldSpan {
    pub(crate) fn new(kind: FieldKind, text: &str, span: Span) -> Self {
        Self {
            kind,
            text: text.to_string(),
            span,
            extent: span,
        }
    }

    pub(crate) fn with_extent(mut self, extent: Span) -> Self {
        self.extent = extent;
        self
    }

    pub(crate) fn shifted(mut self, by: usize) -> Self {
        self.span = self.span.shift(by);
        self.extent = self.extent.shift(by);
        self
    }

    /// Calendar date of a `Date` or `EffectiveDate` field.
    pub fn date(&self) -> Option<NaiveDate> {
        match self.kind {
            FieldKind::Date | FieldKind::EffectiveDate => parser::parse_date(&self.text),
            _ => None,
        }
    }

    /// Leading amount of an `Amount` field.
    pub fn amount(&self) -> Option<Amount> {
        match self.kind {
            FieldKind::Amount => parser::amount(&self.text).ok().map(|(_, amount)| amount),
            _ => None,
        }
    }
}

///
/// What the cursor is on. A snapshot, recomputed for every query.
///
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct CursorContext {
    pub line: LedgerLine,
    pub field: Option<FieldSpan>,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TransactionStatus {
    Pending,
    Cleared,
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TransactionStatus::Pending => write!(f, "!"),
            TransactionStatus::Cleared => write!(f, "*"),
        }
    }
}

#[derive(PartialEq, Eq, Clone)]
pub struct Amount {
    pub quantity: Decimal,
    pub commodity: Commodity,
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.commodity.position {
            CommodityPosition::Left => write!(f, "{}{}", self.commodity.name, self.quantity),
            CommodityPosition::Right => write!(f, "{} {}", self.quantity, self.commodity.name),
        }
    }
}

impl fmt::Debug for Amount {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        fmt::Display::fmt(self, f)
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Commodity {
    pub name: String,
    pub position: CommodityPosition,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum CommodityPosition {
    Left,
    Right,
}

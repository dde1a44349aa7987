//! This module extracts the tables of an HTML page as rows of cell texts.

use html5ever::{
    tendril::StrTendril,
    tokenizer::{
        states::RawKind, BufferQueue, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer,
        TokenizerOpts,
    },
};

static TAG_TABLE: &str = "table";
static TAG_ROW: &str = "tr";
static TAG_CELL: &str = "td";

/// The text fragments of one table row in document order.
pub type Row = Vec<String>;

/// The rows of one table in document order.
pub type Table = Vec<Row>;

/// A single markup event in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkupEvent<'a> {
    StartTag(&'a str),
    EndTag(&'a str),
    Text(&'a str),
}

/// Tracks table, row and cell nesting across markup events and collects the cell texts.
///
/// Only the outermost table starts a new table. Unbalanced markup is never an error.
#[derive(Debug, Default)]
pub struct TableExtractor {
    tables: Vec<Table>,
    in_table: bool,
    in_row: bool,
    in_cell: bool,
}

impl TableExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&mut self, event: MarkupEvent) {
        match event {
            MarkupEvent::StartTag(tag) => self.start_tag(tag),
            MarkupEvent::EndTag(tag) => self.end_tag(tag),
            MarkupEvent::Text(text) => self.text(text),
        }
    }

    fn start_tag(&mut self, tag: &str) {
        if tag == TAG_TABLE && !self.in_table {
            self.tables.push(Table::new());
            self.in_table = true;
        } else if tag == TAG_ROW && self.in_table {
            if let Some(table) = self.tables.last_mut() {
                table.push(Row::new());
            }
            self.in_row = true;
        } else if tag == TAG_CELL && self.in_row {
            self.in_cell = true;
        }
    }

    fn end_tag(&mut self, tag: &str) {
        if tag == TAG_TABLE {
            self.in_table = false;
        } else if tag == TAG_ROW {
            self.in_row = false;
        } else if tag == TAG_CELL {
            self.in_cell = false;
        }
    }

    fn text(&mut self, text: &str) {
        if !self.in_cell {
            return;
        }
        // a cell left open across a new table has no current row
        if let Some(row) = self.tables.last_mut().and_then(|table| table.last_mut()) {
            row.push(text.to_string());
        }
    }

    pub fn finish(self) -> Vec<Table> {
        self.tables
    }
}

/// Feeds the raw token stream of a page to a [`TableExtractor`].
///
/// Consecutive character tokens are joined, so entities like `&amp;` do not split a cell.
/// Script and style contents are raw text and never produce tags.
#[derive(Debug, Default)]
struct TableSink {
    extractor: TableExtractor,
    text: String,
}

impl TableSink {
    fn flush_text(&mut self) {
        if !self.text.is_empty() {
            let text = std::mem::take(&mut self.text);
            self.extractor.handle(MarkupEvent::Text(&text));
        }
    }
}

impl TokenSink for TableSink {
    type Handle = ();

    fn process_token(&mut self, token: Token, _line_number: u64) -> TokenSinkResult<()> {
        match token {
            Token::CharacterTokens(text) => self.text.push_str(&text),
            Token::NullCharacterToken => {}
            Token::TagToken(tag) => {
                self.flush_text();
                match tag.kind {
                    TagKind::StartTag => {
                        self.extractor.handle(MarkupEvent::StartTag(&tag.name));
                        match &*tag.name {
                            "script" if !tag.self_closing => {
                                return TokenSinkResult::RawData(RawKind::ScriptData)
                            }
                            "style" if !tag.self_closing => {
                                return TokenSinkResult::RawData(RawKind::Rawtext)
                            }
                            _ => {}
                        }
                    }
                    TagKind::EndTag => self.extractor.handle(MarkupEvent::EndTag(&tag.name)),
                }
            }
            _ => self.flush_text(),
        }
        TokenSinkResult::Continue
    }

    fn end(&mut self) {
        self.flush_text();
    }
}

/// Extract all top level tables of an HTML page.
///
/// The markup is tokenized but never repaired, so the tables are exactly as the tags nest.
pub fn extract(html: &str) -> Vec<Table> {
    let mut input = BufferQueue::new();
    input.push_back(StrTendril::from_slice(html));
    let mut tokenizer = Tokenizer::new(TableSink::default(), TokenizerOpts::default());
    let _ = tokenizer.feed(&mut input);
    tokenizer.end();
    tokenizer.sink.extractor.finish()
}

/// Drop the whitespace-only fragments of a row.
///
/// The kept fragments are yielded trimmed, so line breaks of the markup never reach a title.
pub fn normalize<S: AsRef<str>>(row: &[S]) -> impl Iterator<Item = &str> + '_ {
    row.iter()
        .map(|cell| cell.as_ref().trim())
        .filter(|cell| !cell.is_empty())
}

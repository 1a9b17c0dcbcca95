//! Text format of the persisted history:
//!
//! ```text
//! # action-history
//!
//! (history-item "filters-gaussian-blur" 3)
//! (history-item "image-flatten" 0)
//!
//! # end of action-history
//! ```
//!
//! Reading is best-effort: a malformed record is skipped and parsing resumes at
//! the next top-level list.

use std::fmt::Write as _;
use std::iter::Peekable;
use std::str::Chars;

pub(crate) const RECORD_SYMBOL: &str = "history-item";
const FILE_HEADER: &str = "# action-history";
const FILE_FOOTER: &str = "# end of action-history";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRecord {
    pub action_name: String,
    pub delta: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Open,
    Close,
    Symbol(String),
    Str(String),
    Int(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexError {
    UnterminatedString,
    BadNumber,
}

struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
        }
    }

    fn skip_blank(&mut self) {
        while let Some(&c) = self.chars.peek() {
            if c.is_whitespace() {
                self.chars.next();
            } else if c == '#' {
                for c in self.chars.by_ref() {
                    if c == '\n' {
                        break;
                    }
                }
            } else {
                break;
            }
        }
    }

    fn next_token(&mut self) -> Option<Result<Token, LexError>> {
        self.skip_blank();
        let c = *self.chars.peek()?;
        let token = match c {
            '(' => {
                self.chars.next();
                Ok(Token::Open)
            }
            ')' => {
                self.chars.next();
                Ok(Token::Close)
            }
            '"' => {
                self.chars.next();
                self.string()
            }
            c if c == '-' || c.is_ascii_digit() => self.number_or_symbol(),
            _ => Ok(Token::Symbol(self.word())),
        };
        Some(token)
    }

    fn word(&mut self) -> String {
        let mut word = String::new();
        while let Some(&c) = self.chars.peek() {
            if c.is_whitespace() || c == '(' || c == ')' || c == '"' {
                break;
            }
            word.push(c);
            self.chars.next();
        }
        word
    }

    fn number_or_symbol(&mut self) -> Result<Token, LexError> {
        let word = self.word();
        let negative_number = word
            .strip_prefix('-')
            .is_some_and(|rest| rest.starts_with(|c: char| c.is_ascii_digit()));
        if word.starts_with('-') && word.len() > 1 && !negative_number {
            return Ok(Token::Symbol(word));
        }
        word.parse::<i64>()
            .map(Token::Int)
            .map_err(|_| LexError::BadNumber)
    }

    fn string(&mut self) -> Result<Token, LexError> {
        let mut value = String::new();
        loop {
            match self.chars.next() {
                None => return Err(LexError::UnterminatedString),
                Some('"') => return Ok(Token::Str(value)),
                Some('\\') => match self.chars.next() {
                    None => return Err(LexError::UnterminatedString),
                    Some('n') => value.push('\n'),
                    Some('r') => value.push('\r'),
                    Some('t') => value.push('\t'),
                    Some('b') => value.push('\u{8}'),
                    Some('f') => value.push('\u{c}'),
                    Some(d @ '0'..='7') => value.push(self.octal_escape(d)),
                    Some(other) => value.push(other),
                },
                Some(c) => value.push(c),
            }
        }
    }

    fn octal_escape(&mut self, first: char) -> char {
        let mut code = first.to_digit(8).unwrap_or(0);
        for _ in 0..2 {
            match self.chars.peek().and_then(|c| c.to_digit(8)) {
                Some(digit) => {
                    code = code * 8 + digit;
                    self.chars.next();
                }
                None => break,
            }
        }
        // Octal escapes encode a single byte.
        char::from_u32(code.min(0o377)).unwrap_or(char::REPLACEMENT_CHARACTER)
    }
}

/// Parses every well-formed `history-item` record in file order.
pub fn parse_records(input: &str) -> Vec<HistoryRecord> {
    let mut lexer = Lexer::new(input);
    let mut records = Vec::new();

    while let Some(token) = lexer.next_token() {
        match token {
            Ok(Token::Open) => match parse_list(&mut lexer) {
                ListOutcome::Record(record) => records.push(record),
                ListOutcome::Skipped => {}
                ListOutcome::Eof => break,
            },
            Ok(other) => {
                tracing::debug!(token = ?other, "ignoring stray token in action history");
            }
            Err(LexError::UnterminatedString) => {
                tracing::debug!("unterminated string in action history; stopping");
                break;
            }
            Err(LexError::BadNumber) => {
                tracing::debug!("ignoring malformed number in action history");
            }
        }
    }

    records
}

enum ListOutcome {
    Record(HistoryRecord),
    Skipped,
    Eof,
}

/// Reads one list whose `(` was already consumed.
fn parse_list(lexer: &mut Lexer<'_>) -> ListOutcome {
    let mut fields = Vec::with_capacity(3);
    loop {
        match lexer.next_token() {
            None | Some(Err(LexError::UnterminatedString)) => return ListOutcome::Eof,
            Some(Ok(Token::Close)) => break,
            Some(Ok(Token::Open)) => {
                if !skip_list(lexer) {
                    return ListOutcome::Eof;
                }
                fields.push(None);
            }
            Some(Ok(token)) => fields.push(Some(token)),
            Some(Err(LexError::BadNumber)) => fields.push(None),
        }
    }

    match fields.as_slice() {
        [Some(Token::Symbol(symbol)), Some(Token::Str(name)), Some(Token::Int(delta))]
            if symbol == RECORD_SYMBOL =>
        {
            ListOutcome::Record(HistoryRecord {
                action_name: name.clone(),
                delta: *delta,
            })
        }
        _ => {
            tracing::debug!(fields = fields.len(), "skipping malformed action history record");
            ListOutcome::Skipped
        }
    }
}

/// Consumes tokens up to the `)` matching an already consumed `(`.
/// Returns `false` when input ends first.
fn skip_list(lexer: &mut Lexer<'_>) -> bool {
    let mut depth = 1usize;
    while let Some(token) = lexer.next_token() {
        match token {
            Ok(Token::Open) => depth += 1,
            Ok(Token::Close) => {
                depth -= 1;
                if depth == 0 {
                    return true;
                }
            }
            Err(LexError::UnterminatedString) => return false,
            _ => {}
        }
    }
    false
}

/// Renders records with the file header and end marker.
pub fn write_records<'a, I>(records: I) -> String
where
    I: IntoIterator<Item = (&'a str, u32)>,
{
    let mut out = String::new();
    out.push_str(FILE_HEADER);
    out.push_str("\n\n");
    for (name, delta) in records {
        out.push('(');
        out.push_str(RECORD_SYMBOL);
        out.push_str(" \"");
        escape_into(&mut out, name);
        let _ = writeln!(out, "\" {delta})");
    }
    out.push('\n');
    out.push_str(FILE_FOOTER);
    out.push('\n');
    out
}

fn escape_into(out: &mut String, value: &str) {
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            c if (c as u32) < 0x20 || c == '\u{7f}' => {
                let _ = write!(out, "\\{:03o}", c as u32);
            }
            c => out.push(c),
        }
    }
}

//! Line-oriented lexer for header text.
//!
//! Turns a byte stream into [`LogicalLine`]s: continuation lines joined,
//! comments stripped out of the code and attached to the statement they
//! document.
//
//  Comment attachment (informal):
//
//      /* doc */          ─┐ leading comment of the next code line
//      // more doc        ─┘
//      int32_t a; // x    ─  inline comment of this line
//      float b; /* opens  ─┐ inline comment of `float b;`, the code
//         closes */ int c; ─┘ after `*/` becomes the next logical line
//
//  A blank line after a comment block turns that block into a standalone
//  comment line with no code.

use std::collections::VecDeque;
use std::io::BufRead;
use std::path::PathBuf;

use crate::error::HeaderError;
use crate::model::{LogicalLine, join_comments};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexState {
    Code,
    InBlockComment,
    InString,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedLine {
    pub code: String,
    /// Raw comment text, not yet tidied.
    pub comment: String,
    /// State at the end of the line.
    pub state: LexState,
}

/// Splits one joined physical line into code and comment.
pub fn process_line(raw: &str, state: LexState, line: usize) -> Result<ProcessedLine, HeaderError> {
    let mut code = String::new();
    let mut comment = String::new();
    let mut state = state;
    let mut chars = raw.char_indices().peekable();

    while let Some((idx, c)) = chars.next() {
        match state {
            LexState::InBlockComment => {
                if c == '*' && chars.peek().is_some_and(|(_, n)| *n == '/') {
                    chars.next();
                    state = LexState::Code;
                    code.push(' ');
                } else {
                    comment.push(c);
                }
            }
            LexState::InString => {
                code.push(c);
                match c {
                    '\\' => {
                        if let Some((_, escaped)) = chars.next() {
                            code.push(escaped);
                        }
                    }
                    '"' => state = LexState::Code,
                    _ => {}
                }
            }
            LexState::Code => match c {
                '/' if chars.peek().is_some_and(|(_, n)| *n == '*') => {
                    chars.next();
                    if !comment.is_empty() {
                        comment.push('\n');
                    }
                    state = LexState::InBlockComment;
                }
                '/' if chars.peek().is_some_and(|(_, n)| *n == '/') => {
                    let rest = raw[idx..].trim_start_matches('/');
                    if !comment.is_empty() {
                        comment.push('\n');
                    }
                    comment.push_str(rest);
                    break;
                }
                '"' => {
                    code.push(c);
                    state = LexState::InString;
                }
                '\'' => {
                    // Character literal: copied verbatim so '"' cannot open a string.
                    code.push(c);
                    while let Some((_, lc)) = chars.next() {
                        code.push(lc);
                        if lc == '\\' {
                            if let Some((_, escaped)) = chars.next() {
                                code.push(escaped);
                            }
                        } else if lc == '\'' {
                            break;
                        }
                    }
                }
                _ => code.push(c),
            },
        }
    }

    if state == LexState::InString {
        return Err(HeaderError::MalformedString {
            line,
            text: raw.trim().to_string(),
        });
    }

    Ok(ProcessedLine {
        code: code.trim().to_string(),
        comment,
        state,
    })
}

/// Trims each line, drops a leading `*` and empty lines.
pub fn tidy_comment(raw: &str) -> String {
    raw.lines()
        .map(|l| {
            let l = l.trim();
            l.strip_prefix('*').map_or(l, str::trim_start)
        })
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Iterator of logical lines over any buffered reader.
pub struct LogicalLines<R> {
    reader: R,
    source: PathBuf,
    physical: usize,
    /// Code that followed the `*/` of a multi-line comment.
    lookahead: VecDeque<(String, usize)>,
    pending: String,
    pending_line: usize,
    finished: bool,
}

impl<R: BufRead> LogicalLines<R> {
    pub fn new(reader: R, source: impl Into<PathBuf>) -> Self {
        Self {
            reader,
            source: source.into(),
            physical: 0,
            lookahead: VecDeque::new(),
            pending: String::new(),
            pending_line: 0,
            finished: false,
        }
    }

    /// Number of physical lines consumed so far.
    pub fn physical_lines(&self) -> usize {
        self.physical
    }

    fn read_raw(&mut self) -> Result<Option<String>, HeaderError> {
        let mut buf = String::new();
        let read = self
            .reader
            .read_line(&mut buf)
            .map_err(|source| HeaderError::Io {
                path: self.source.clone(),
                source,
            })?;
        if read == 0 {
            return Ok(None);
        }
        self.physical += 1;
        Ok(Some(buf))
    }

    /// Next physical line with continuations joined, plus its first line
    /// number.
    fn read_physical(&mut self) -> Result<Option<(String, usize)>, HeaderError> {
        let Some(first) = self.read_raw()? else {
            return Ok(None);
        };
        let start = self.physical;
        let mut joined = String::new();
        let mut current = first;
        loop {
            let body = current.trim_end_matches(['\n', '\r']);
            match body.strip_suffix('\\') {
                Some(head) => {
                    joined.push_str(head);
                    match self.read_raw()? {
                        Some(next) => current = next,
                        None => {
                            return Err(HeaderError::UnexpectedEnd {
                                line: self.physical,
                                construct: "line continuation".into(),
                            });
                        }
                    }
                }
                None => {
                    joined.push_str(body);
                    return Ok(Some((joined, start)));
                }
            }
        }
    }

    /// Collects comment text up to the closing `*/`; code after it goes to
    /// the lookahead buffer.
    fn read_block_tail(&mut self, comment: &mut String, opened: usize) -> Result<(), HeaderError> {
        loop {
            let Some((raw, line)) = self.read_physical()? else {
                return Err(HeaderError::UnexpectedEnd {
                    line: opened,
                    construct: "block comment".into(),
                });
            };
            comment.push('\n');
            match raw.split_once("*/") {
                Some((inside, tail)) => {
                    comment.push_str(inside);
                    if !tail.trim().is_empty() {
                        self.lookahead.push_back((tail.to_string(), line));
                    }
                    return Ok(());
                }
                None => comment.push_str(&raw),
            }
        }
    }

    fn take_pending(&mut self) -> LogicalLine {
        LogicalLine {
            code: String::new(),
            leading_comment: std::mem::take(&mut self.pending),
            inline_comment: String::new(),
            line_number: self.pending_line,
        }
    }

    pub fn next_line(&mut self) -> Result<Option<LogicalLine>, HeaderError> {
        loop {
            let next = match self.lookahead.pop_front() {
                Some(buffered) => Some(buffered),
                None => self.read_physical()?,
            };
            let Some((raw, line)) = next else {
                if self.pending.is_empty() {
                    return Ok(None);
                }
                return Ok(Some(self.take_pending()));
            };

            if raw.trim().is_empty() {
                if !self.pending.is_empty() {
                    return Ok(Some(self.take_pending()));
                }
                continue;
            }

            let processed = process_line(&raw, LexState::Code, line)?;
            let mut comment = processed.comment;
            if processed.state == LexState::InBlockComment {
                self.read_block_tail(&mut comment, line)?;
            }
            let comment = tidy_comment(&comment);

            if processed.code.is_empty() {
                if !comment.is_empty() {
                    if self.pending.is_empty() {
                        self.pending_line = line;
                    }
                    self.pending = join_comments(&[&self.pending, &comment]);
                }
                continue;
            }

            return Ok(Some(LogicalLine {
                code: processed.code,
                leading_comment: std::mem::take(&mut self.pending),
                inline_comment: comment,
                line_number: line,
            }));
        }
    }
}

impl<R: BufRead> Iterator for LogicalLines<R> {
    type Item = Result<LogicalLine, HeaderError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.next_line() {
            Ok(Some(line)) => Some(Ok(line)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

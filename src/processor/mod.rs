//! The functional core: one parse run over a header and everything it
//! includes.
//!
//! [`ParseContext`] owns the state shared across files (symbols, types,
//! diagnostics, the backend). [`HeaderParser`] walks the logical lines of a
//! single file and dispatches each one to the first recogniser that accepts it.
pub mod directives;
pub mod env;
pub mod expr;
pub mod layout;
pub mod lexer;
pub mod struct_parser;
pub mod tokens;
pub mod types;

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::error::{Diagnostics, HeaderError, Warning};
use crate::model::LogicalLine;
use crate::runtime::Endianness;
use crate::source::SearchPath;
use crate::writer::Backend;

use env::Environment;
use lexer::LogicalLines;
use types::TypeRegistry;

/// Everything a finished run leaves behind besides the generated output.
#[derive(Debug)]
pub struct ParseOutcome {
    pub env: Environment,
    pub types: TypeRegistry,
    pub diagnostics: Diagnostics,
}

pub struct ParseContext<'a> {
    env: Environment,
    types: TypeRegistry,
    diagnostics: Diagnostics,
    search: SearchPath,
    endianness: Endianness,
    backend: Box<dyn Backend + 'a>,
    included: HashSet<PathBuf>,
}

impl<'a> ParseContext<'a> {
    pub fn new(backend: Box<dyn Backend + 'a>, search: SearchPath, endianness: Endianness) -> Self {
        Self {
            env: Environment::new(),
            types: TypeRegistry::new(),
            diagnostics: Diagnostics::default(),
            search,
            endianness,
            backend,
            included: HashSet::new(),
        }
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    /// Parses a file unless it was already parsed during this run.
    pub fn parse_file(&mut self, path: &Path) -> Result<(), HeaderError> {
        let io_err = |source| HeaderError::Io {
            path: path.to_path_buf(),
            source,
        };
        let canonical = path.canonicalize().map_err(io_err)?;
        if !self.included.insert(canonical.clone()) {
            log::debug!("{} already parsed, skipping", path.display());
            return Ok(());
        }
        log::info!("parsing {}", path.display());

        let file = File::open(&canonical).map_err(io_err)?;
        let dir = canonical.parent().map(Path::to_path_buf);
        self.parse_reader(BufReader::new(file), &path.display().to_string(), dir.as_deref())
    }

    /// Parses header text from any reader. `dir` is where quoted includes
    /// are looked up first.
    pub fn parse_reader<R: BufRead>(
        &mut self,
        reader: R,
        name: &str,
        dir: Option<&Path>,
    ) -> Result<(), HeaderError> {
        HeaderParser::new(self, reader, name, dir)
            .run()
            .map_err(|e| e.in_file(name))
    }

    pub fn parse_str(&mut self, src: &str) -> Result<(), HeaderError> {
        self.parse_reader(src.as_bytes(), "<string>", None)
    }

    /// Flushes the backend and hands back the collected state.
    pub fn finish(mut self) -> Result<ParseOutcome, HeaderError> {
        self.backend.finish()?;
        Ok(ParseOutcome {
            env: self.env,
            types: self.types,
            diagnostics: self.diagnostics,
        })
    }
}

/// Walks the logical lines of one file.
pub(crate) struct HeaderParser<'c, 'a, R> {
    ctx: &'c mut ParseContext<'a>,
    lines: LogicalLines<R>,
    file: String,
    dir: Option<PathBuf>,
    /// The line being worked on; its `code` shrinks as it is consumed.
    current: Option<LogicalLine>,
}

impl<'c, 'a, R: BufRead> HeaderParser<'c, 'a, R> {
    fn new(ctx: &'c mut ParseContext<'a>, reader: R, name: &str, dir: Option<&Path>) -> Self {
        Self {
            ctx,
            lines: LogicalLines::new(reader, name),
            file: name.to_string(),
            dir: dir.map(Path::to_path_buf),
            current: None,
        }
    }

    fn run(mut self) -> Result<(), HeaderError> {
        while let Some(line) = self.advance()? {
            if line.code.is_empty() {
                self.ctx.backend.comment(&line.leading_comment)?;
                continue;
            }
            self.dispatch()?;
        }
        Ok(())
    }

    fn dispatch(&mut self) -> Result<(), HeaderError> {
        let recognised = self.include()?
            || self.define()?
            || self.macro_def()?
            || self.structure()?
            || self.typedef()?;
        // Unconsumed code is reported by the next advance().
        if !recognised {
            log::debug!("{}: nothing matches line {}", self.file, self.line_number());
        }
        Ok(())
    }

    /// Moves to the next logical line, reporting leftover code first.
    fn advance(&mut self) -> Result<Option<LogicalLine>, HeaderError> {
        if let Some(done) = self.current.take() {
            let rest = done.code.trim();
            if !rest.is_empty() {
                self.warn(Warning::SkippedLine {
                    line: done.line_number,
                    text: rest.to_string(),
                });
            }
        }
        let next = self.lines.next_line()?;
        self.current = next.clone();
        Ok(next)
    }

    /// Remaining code of the current line.
    fn code(&self) -> &str {
        self.current.as_ref().map_or("", |l| l.code.as_str())
    }

    fn line_number(&self) -> usize {
        self.current
            .as_ref()
            .map_or(self.lines.physical_lines(), |l| l.line_number)
    }

    /// Drops the first `len` bytes of the current code.
    fn consume(&mut self, len: usize) {
        if let Some(line) = self.current.as_mut() {
            line.code = line.code[len..].trim_start().to_string();
        }
    }

    fn consume_all(&mut self) {
        if let Some(line) = self.current.as_mut() {
            line.code.clear();
        }
    }

    fn warn(&mut self, warning: Warning) {
        self.ctx.diagnostics.warn(&self.file, warning);
    }
}

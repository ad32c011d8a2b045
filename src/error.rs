//! Error and warning types shared by every stage of a parse run.
//!
//! Fatal problems are [`HeaderError`]s and abort the run. Recoverable ones are
//! [`Warning`]s, collected in [`Diagnostics`] and logged.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HeaderError {
    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write generated output")]
    Emit(#[from] io::Error),

    #[error("line {line}: {message} (was \"{text}\")")]
    Parse {
        line: usize,
        text: String,
        message: String,
    },

    #[error("line {line}: malformed string literal in \"{text}\"")]
    MalformedString { line: usize, text: String },

    #[error("line {line}: failed to evaluate array dimension '{expr}': {reason}")]
    BadDimension {
        line: usize,
        expr: String,
        reason: String,
    },

    #[error("line {line}: unresolved type '{type_name}'")]
    UnresolvedType { line: usize, type_name: String },

    #[error("line {line}: end of file reached inside {construct}")]
    UnexpectedEnd { line: usize, construct: String },

    #[error("line {line}: unsupported {what}")]
    UnsupportedType { line: usize, what: String },

    #[error("line {line}: '{name}' is already defined")]
    DuplicateDefinition { line: usize, name: String },

    #[error("in {file}")]
    InFile {
        file: String,
        #[source]
        source: Box<HeaderError>,
    },
}

impl HeaderError {
    /// The error without any file context wrapped around it.
    pub fn root(&self) -> &HeaderError {
        match self {
            HeaderError::InFile { source, .. } => source.root(),
            other => other,
        }
    }

    pub(crate) fn in_file(self, file: &str) -> HeaderError {
        HeaderError::InFile {
            file: file.to_string(),
            source: Box::new(self),
        }
    }

    pub(crate) fn parse(line: usize, text: &str, message: impl Into<String>) -> HeaderError {
        HeaderError::Parse {
            line,
            text: text.to_string(),
            message: message.into(),
        }
    }

    /// Source line of the root error, where one is known.
    pub fn line(&self) -> Option<usize> {
        match self.root() {
            HeaderError::Parse { line, .. }
            | HeaderError::MalformedString { line, .. }
            | HeaderError::BadDimension { line, .. }
            | HeaderError::UnresolvedType { line, .. }
            | HeaderError::UnexpectedEnd { line, .. }
            | HeaderError::UnsupportedType { line, .. }
            | HeaderError::DuplicateDefinition { line, .. } => Some(*line),
            _ => None,
        }
    }
}

/// Recoverable problems. The parse run logs them and carries on.
#[derive(Debug, Clone, PartialEq)]
pub enum Warning {
    SkippedLine { line: usize, text: String },
    UnresolvedInclude { line: usize, name: String },
    ConstantEvaluation {
        line: usize,
        name: String,
        reason: String,
    },
    Redefinition { line: usize, name: String },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::SkippedLine { line, text } => write!(f, "skipped \"{text}\", line {line}"),
            Warning::UnresolvedInclude { line, name } => {
                write!(f, "could not find included file {name}, line {line}")
            }
            Warning::ConstantEvaluation { line, name, reason } => {
                write!(f, "unable to evaluate '{name}' on line {line}: {reason}")
            }
            Warning::Redefinition { line, name } => {
                write!(f, "'{name}' redefined on line {line}")
            }
        }
    }
}

/// The diagnostics channel: separate from the generated-code sink.
#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: Vec<(String, Warning)>,
}

impl Diagnostics {
    pub fn warn(&mut self, file: &str, warning: Warning) {
        log::warn!("{file}: {warning}");
        self.entries.push((file.to_string(), warning));
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Warning> {
        self.entries.iter().map(|(_, w)| w)
    }

    /// Warnings together with the file they were raised in.
    pub fn entries(&self) -> &[(String, Warning)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

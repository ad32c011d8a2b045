//! Runtime support for generated struct types.
//!
//! Code emitted by the [`crate::writer`] backends depends on this module: the
//! byte-order aware [`codec`], the [`PackedStruct`] contract and the
//! diff-and-apply [`Update`] trait. [`record`] holds a dynamic counterpart that
//! runs a compiled layout without generating code.

pub mod codec;
pub mod record;

use std::fmt::Debug;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use codec::{Packer, Unpacker};
pub use record::{Record, RecordError, Value};

/// Byte order of serialised data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Endianness {
    Little,
    Big,
    #[default]
    Network,
    Native,
}

impl Endianness {
    pub fn is_little(self) -> bool {
        match self {
            Endianness::Little => true,
            Endianness::Big | Endianness::Network => false,
            Endianness::Native => cfg!(target_endian = "little"),
        }
    }

    /// Prefix character of a `struct`-module style format string.
    pub fn prefix(self) -> char {
        match self {
            Endianness::Little => '<',
            Endianness::Big => '>',
            Endianness::Network => '!',
            Endianness::Native => '=',
        }
    }

    /// Path of the variant as it appears in generated code.
    pub fn rust_path(self) -> &'static str {
        match self {
            Endianness::Little => "Endianness::Little",
            Endianness::Big => "Endianness::Big",
            Endianness::Network => "Endianness::Network",
            Endianness::Native => "Endianness::Native",
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum CodecError {
    #[error("buffer too short: need {needed} bytes at offset {offset}, have {available}")]
    Truncated {
        needed: usize,
        offset: usize,
        available: usize,
    },
}

/// Contract every generated struct type honours.
pub trait PackedStruct {
    fn packed_size(&self) -> usize;

    fn serialize(&self) -> Vec<u8>;

    fn deserialize_from(&mut self, buf: &[u8], offset: usize) -> Result<(), CodecError>;

    fn deserialize(&mut self, buf: &[u8]) -> Result<(), CodecError> {
        self.deserialize_from(buf, 0)
    }
}

/// One applied modification, as reported by [`Update`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub path: String,
    pub from: String,
    pub to: String,
}

impl Change {
    fn record(path: &str, from: &impl Debug, to: &impl Debug, changes: &mut Vec<Change>) {
        let change = Change {
            path: path.to_string(),
            from: format!("{from:?}"),
            to: format!("{to:?}"),
        };
        log::debug!("updating {} from {} to {}", change.path, change.from, change.to);
        changes.push(change);
    }
}

/// Per-field outcome of a diff-and-apply pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateReport {
    pub fields: Vec<(String, bool)>,
    pub changes: Vec<Change>,
}

impl UpdateReport {
    pub fn updated(&self) -> bool {
        self.fields.iter().any(|(_, updated)| *updated)
    }

    pub fn field(&self, name: &str) -> Option<bool> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, updated)| *updated)
    }
}

/// Copies `other` into `self` only where the values differ.
///
/// Returns whether anything changed and appends a [`Change`] for every
/// modified leaf.
pub trait Update {
    fn update(&mut self, other: &Self, path: &str, changes: &mut Vec<Change>) -> bool;
}

macro_rules! scalar_update {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Update for $ty {
                fn update(&mut self, other: &Self, path: &str, changes: &mut Vec<Change>) -> bool {
                    if self == other {
                        return false;
                    }
                    Change::record(path, self, other, changes);
                    *self = *other;
                    true
                }
            }
        )*
    };
}

scalar_update!(bool, i8, u8, i16, u16, i32, u32, i64, u64, f32, f64);

impl<T: Update, const N: usize> Update for [T; N] {
    fn update(&mut self, other: &Self, path: &str, changes: &mut Vec<Change>) -> bool {
        let mut updated = false;
        for (idx, (mine, theirs)) in self.iter_mut().zip(other.iter()).enumerate() {
            updated |= mine.update(theirs, &format!("{path}[{idx}]"), changes);
        }
        updated
    }
}

/// `path.name`, or just `name` at the top level.
pub fn field_path(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{path}.{name}")
    }
}

/// Fixed-length text buffers are compared and replaced as a whole.
pub fn update_text<const N: usize>(
    mine: &mut [u8; N],
    theirs: &[u8; N],
    path: &str,
    changes: &mut Vec<Change>,
) -> bool {
    if mine == theirs {
        return false;
    }
    Change::record(path, &text_lossy(mine), &text_lossy(theirs), changes);
    *mine = *theirs;
    true
}

/// Text of a NUL-padded buffer.
pub fn text_lossy(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|b| *b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

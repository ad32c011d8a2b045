//! Data handed between the stages of a parse run.
//!
//! Lexer → [`LogicalLine`], struct parser → [`StructDescriptor`], layout
//! compiler → [`LayoutPlan`]. Descriptors are immutable once built. Member
//! offsets follow declaration order.

use std::fmt;

use serde::Serialize;

use crate::processor::types::Primitive;
use crate::runtime::Endianness;

/// One statement's worth of header text after continuation joining and
/// comment stripping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogicalLine {
    pub code: String,
    pub leading_comment: String,
    pub inline_comment: String,
    pub line_number: usize,
}

impl LogicalLine {
    /// Leading and inline comment joined, leading first.
    pub fn full_comment(&self) -> String {
        join_comments(&[&self.leading_comment, &self.inline_comment])
    }
}

pub(crate) fn join_comments(parts: &[&str]) -> String {
    parts
        .iter()
        .filter(|p| !p.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub type_name: String,
    /// Empty for a scalar, one entry per bracket group otherwise.
    pub dimensions: Vec<usize>,
    pub comment: String,
    pub line: usize,
}

impl FieldDescriptor {
    /// Number of elements, or `None` when the product overflows.
    pub fn element_count(&self) -> Option<usize> {
        self.dimensions
            .iter()
            .try_fold(1usize, |acc, len| acc.checked_mul(*len))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructDescriptor {
    pub name: String,
    pub tag: Option<String>,
    pub doc_comment: String,
    pub fields: Vec<FieldDescriptor>,
    pub trailing_comment: String,
    pub line_number: usize,
}

/// One entry of a flat format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FormatUnit {
    Scalar(Primitive),
    /// Fixed-length byte buffer holding a whole `char` array.
    Text(usize),
}

impl FormatUnit {
    pub fn size(&self) -> usize {
        match self {
            FormatUnit::Scalar(p) => p.size(),
            FormatUnit::Text(len) => *len,
        }
    }
}

impl fmt::Display for FormatUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatUnit::Scalar(p) => write!(f, "{}", p.code()),
            FormatUnit::Text(len) => write!(f, "{len}s"),
        }
    }
}

/// `count` consecutive copies of one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FormatRun {
    pub unit: FormatUnit,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NestedContribution {
    pub type_name: String,
    pub count: usize,
    pub packed_size: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum MemberKind {
    Primitive {
        primitive: Primitive,
        /// Dimensions that repeat the element; for text this excludes the
        /// collapsed buffer length.
        shape: Vec<usize>,
        text_len: Option<usize>,
    },
    Nested {
        type_name: String,
        shape: Vec<usize>,
        element_size: usize,
    },
}

impl MemberKind {
    pub fn shape(&self) -> &[usize] {
        match self {
            MemberKind::Primitive { shape, .. } | MemberKind::Nested { shape, .. } => shape,
        }
    }

    /// Number of repeated elements.
    pub fn count(&self) -> usize {
        self.shape().iter().product()
    }

    /// Byte size of one repeated element.
    pub fn element_size(&self) -> usize {
        match self {
            MemberKind::Primitive {
                text_len: Some(len),
                ..
            } => *len,
            MemberKind::Primitive { primitive, .. } => primitive.size(),
            MemberKind::Nested { element_size, .. } => *element_size,
        }
    }
}

/// Placement of one field inside the packed struct.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberLayout {
    pub name: String,
    pub offset: usize,
    pub size: usize,
    pub dimensions: Vec<usize>,
    pub kind: MemberKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutPlan {
    pub endianness: Endianness,
    pub flat_format: Vec<FormatRun>,
    pub nested: Vec<NestedContribution>,
    pub members: Vec<MemberLayout>,
    pub packed_size: usize,
}

impl LayoutPlan {
    pub fn flat_size(&self) -> usize {
        self.flat_format.iter().map(|run| run.unit.size() * run.count).sum()
    }

    pub fn has_nested(&self) -> bool {
        !self.nested.is_empty()
    }

    /// Format codes without the byte-order prefix, e.g. `iff`.
    pub fn format_codes(&self) -> String {
        self.flat_format
            .iter()
            .flat_map(|run| std::iter::repeat_n(run.unit, run.count))
            .map(|u| u.to_string())
            .collect()
    }

    /// Format string with the byte-order prefix, e.g. `<iff`.
    pub fn format_string(&self) -> String {
        format!("{}{}", self.endianness.prefix(), self.format_codes())
    }
}

/// A struct that made it through the layout compiler.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledStruct {
    pub descriptor: StructDescriptor,
    pub layout: LayoutPlan,
}

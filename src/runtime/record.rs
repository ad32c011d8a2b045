//! A dynamic instance of a compiled struct.
//!
//! [`Record`] carries the layout it was built from, so it can pack, unpack
//! and diff itself without generated code. Its field set is frozen at
//! construction: [`Record::set`] rejects unknown names and values whose shape
//! differs from the field's.

use std::fmt;

use indexmap::IndexMap;
use thiserror::Error;

use super::codec::{Packer, Unpacker};
use super::{Change, CodecError, Endianness, UpdateReport, field_path, text_lossy};
use crate::model::{LayoutPlan, MemberKind};
use crate::processor::types::{Primitive, TypeRegistry};

#[derive(Debug, Error, PartialEq)]
pub enum RecordError {
    #[error("unknown struct type '{0}'")]
    UnknownType(String),
    #[error("'{type_name}' has no field '{field}'")]
    UnknownField { type_name: String, field: String },
    #[error("value for '{path}' does not match the field's shape")]
    ShapeMismatch { path: String },
    #[error("text for '{path}' is {len} bytes but the field holds {capacity}")]
    TextTooLong {
        path: String,
        len: usize,
        capacity: usize,
    },
    #[error("{value} does not fit '{path}' ({primitive:?})")]
    OutOfRange {
        path: String,
        value: String,
        primitive: Primitive,
    },
    #[error(transparent)]
    Codec(#[from] CodecError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    /// Fixed-length, NUL-padded.
    Text(Vec<u8>),
    Array(Vec<Value>),
    Record(Record),
}

impl Value {
    pub fn text(s: &str) -> Value {
        Value::Text(s.as_bytes().to_vec())
    }

    fn flatten<'v>(&'v self, out: &mut Vec<&'v Value>) {
        match self {
            Value::Array(items) => items.iter().for_each(|v| v.flatten(out)),
            leaf => out.push(leaf),
        }
    }

    fn flatten_mut<'v>(&'v mut self, out: &mut Vec<&'v mut Value>) {
        match self {
            Value::Array(items) => items.iter_mut().for_each(|v| v.flatten_mut(out)),
            leaf => out.push(leaf),
        }
    }
}

/// Leaves print the way the generated `Update` impls print them.
struct LeafDebug<'v>(&'v Value);

impl fmt::Debug for LeafDebug<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Value::Bool(v) => write!(f, "{v:?}"),
            Value::Int(v) => write!(f, "{v:?}"),
            Value::UInt(v) => write!(f, "{v:?}"),
            Value::Float(v) => write!(f, "{v:?}"),
            Value::Text(bytes) => write!(f, "{:?}", text_lossy(bytes)),
            other => write!(f, "{other:?}"),
        }
    }
}

/// A leaf value narrowed to its primitive's width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    Bool(bool),
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F32(f32),
    F64(f64),
}

impl Scalar {
    /// Checks that `value` fits `primitive`.
    pub fn narrow(primitive: Primitive, value: &Value, path: &str) -> Result<Scalar, RecordError> {
        let out_of_range = || RecordError::OutOfRange {
            path: path.to_string(),
            value: format!("{:?}", LeafDebug(value)),
            primitive,
        };
        let scalar = match (primitive, value) {
            (Primitive::Bool, Value::Bool(v)) => Scalar::Bool(*v),
            (Primitive::I8, Value::Int(v)) => Scalar::I8(i8::try_from(*v).map_err(|_| out_of_range())?),
            (Primitive::I16, Value::Int(v)) => {
                Scalar::I16(i16::try_from(*v).map_err(|_| out_of_range())?)
            }
            (Primitive::I32, Value::Int(v)) => {
                Scalar::I32(i32::try_from(*v).map_err(|_| out_of_range())?)
            }
            (Primitive::I64, Value::Int(v)) => Scalar::I64(*v),
            (Primitive::U8, Value::UInt(v)) => Scalar::U8(u8::try_from(*v).map_err(|_| out_of_range())?),
            (Primitive::U16, Value::UInt(v)) => {
                Scalar::U16(u16::try_from(*v).map_err(|_| out_of_range())?)
            }
            (Primitive::U32, Value::UInt(v)) => {
                Scalar::U32(u32::try_from(*v).map_err(|_| out_of_range())?)
            }
            (Primitive::U64, Value::UInt(v)) => Scalar::U64(*v),
            (Primitive::F32, Value::Float(v)) => Scalar::F32(*v as f32),
            (Primitive::F64, Value::Float(v)) => Scalar::F64(*v),
            _ => {
                return Err(RecordError::ShapeMismatch {
                    path: path.to_string(),
                });
            }
        };
        Ok(scalar)
    }

    pub fn into_value(self) -> Value {
        match self {
            Scalar::Bool(v) => Value::Bool(v),
            Scalar::I8(v) => Value::Int(v.into()),
            Scalar::I16(v) => Value::Int(v.into()),
            Scalar::I32(v) => Value::Int(v.into()),
            Scalar::I64(v) => Value::Int(v),
            Scalar::U8(v) => Value::UInt(v.into()),
            Scalar::U16(v) => Value::UInt(v.into()),
            Scalar::U32(v) => Value::UInt(v.into()),
            Scalar::U64(v) => Value::UInt(v),
            Scalar::F32(v) => Value::Float(v.into()),
            Scalar::F64(v) => Value::Float(v),
        }
    }
}

fn default_leaf(primitive: Primitive, text_len: Option<usize>) -> Value {
    if let Some(len) = text_len {
        return Value::Text(vec![0; len]);
    }
    match primitive {
        Primitive::Bool => Value::Bool(false),
        Primitive::I8 | Primitive::I16 | Primitive::I32 | Primitive::I64 => Value::Int(0),
        Primitive::F32 | Primitive::F64 => Value::Float(0.0),
        _ => Value::UInt(0),
    }
}

/// Repeats `make` over `shape`, outermost dimension first.
fn shaped<F>(shape: &[usize], make: &mut F) -> Result<Value, RecordError>
where
    F: FnMut() -> Result<Value, RecordError>,
{
    match shape.split_first() {
        None => make(),
        Some((len, inner)) => (0..*len)
            .map(|_| shaped(inner, make))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
    }
}

/// Paths of the elements of `shape` in row-major order.
pub(crate) fn element_paths(base: &str, shape: &[usize]) -> Vec<String> {
    shape.iter().fold(vec![base.to_string()], |paths, len| {
        paths
            .iter()
            .flat_map(|p| (0..*len).map(move |i| format!("{p}[{i}]")))
            .collect()
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    type_name: String,
    endianness: Endianness,
    layout: LayoutPlan,
    values: IndexMap<String, Value>,
}

impl Record {
    /// A zero-initialised instance of the struct registered as `type_name`.
    pub fn new(types: &TypeRegistry, type_name: &str, endianness: Endianness) -> Result<Self, RecordError> {
        let compiled = types
            .get_struct(type_name)
            .ok_or_else(|| RecordError::UnknownType(type_name.to_string()))?;

        let mut values = IndexMap::new();
        for member in &compiled.layout.members {
            let value = match &member.kind {
                MemberKind::Primitive {
                    primitive,
                    shape,
                    text_len,
                } => shaped(shape, &mut || Ok(default_leaf(*primitive, *text_len)))?,
                MemberKind::Nested { type_name, shape, .. } => shaped(shape, &mut || {
                    Record::new(types, type_name, endianness).map(Value::Record)
                })?,
            };
            values.insert(member.name.clone(), value);
        }

        Ok(Self {
            type_name: compiled.descriptor.name.clone(),
            endianness,
            layout: compiled.layout.clone(),
            values,
        })
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    /// Changes the byte order of this record and every nested one.
    pub fn set_endianness(&mut self, endianness: Endianness) {
        self.endianness = endianness;
        for value in self.values.values_mut() {
            let mut leaves = Vec::new();
            value.flatten_mut(&mut leaves);
            for leaf in leaves {
                if let Value::Record(inner) = leaf {
                    inner.set_endianness(endianness);
                }
            }
        }
    }

    pub fn packed_size(&self) -> usize {
        self.layout.packed_size
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Replaces a field's value. Text shorter than the buffer is NUL-padded.
    pub fn set(&mut self, field: &str, value: Value) -> Result<(), RecordError> {
        let member = self
            .layout
            .members
            .iter()
            .find(|m| m.name == field)
            .ok_or_else(|| RecordError::UnknownField {
                type_name: self.type_name.clone(),
                field: field.to_string(),
            })?;
        let current = self.values.get(field).ok_or_else(|| RecordError::UnknownField {
            type_name: self.type_name.clone(),
            field: field.to_string(),
        })?;
        let primitive = match &member.kind {
            MemberKind::Primitive { primitive, .. } => Some(*primitive),
            MemberKind::Nested { .. } => None,
        };
        let conformed = conform(current, value, primitive, field)?;
        self.values.insert(field.to_string(), conformed);
        Ok(())
    }

    /// Packs every field in declaration order.
    pub fn serialize(&self) -> Result<Vec<u8>, RecordError> {
        let mut packer = Packer::new(self.endianness, self.layout.packed_size);
        for member in &self.layout.members {
            let Some(value) = self.values.get(&member.name) else {
                continue;
            };
            let mut leaves = Vec::new();
            value.flatten(&mut leaves);
            for leaf in leaves {
                match (&member.kind, leaf) {
                    (
                        MemberKind::Primitive {
                            text_len: Some(len), ..
                        },
                        Value::Text(bytes),
                    ) => packer.put_text(bytes, *len),
                    (MemberKind::Primitive { primitive, .. }, leaf) => {
                        put_scalar(&mut packer, Scalar::narrow(*primitive, leaf, &member.name)?)
                    }
                    (MemberKind::Nested { .. }, Value::Record(inner)) => {
                        packer.put_bytes(&inner.serialize()?)
                    }
                    _ => {
                        return Err(RecordError::ShapeMismatch {
                            path: member.name.clone(),
                        });
                    }
                }
            }
        }
        Ok(packer.finish())
    }

    pub fn deserialize(&mut self, buf: &[u8]) -> Result<(), RecordError> {
        self.deserialize_from(buf, 0)
    }

    pub fn deserialize_from(&mut self, buf: &[u8], offset: usize) -> Result<(), RecordError> {
        let mut unpacker = Unpacker::new(buf, offset, self.endianness, self.layout.packed_size)?;
        let order = self.layout.members.clone();
        for member in order {
            let Some(value) = self.values.get_mut(&member.name) else {
                continue;
            };
            let mut leaves = Vec::new();
            value.flatten_mut(&mut leaves);
            for leaf in leaves {
                match (&member.kind, leaf) {
                    (MemberKind::Primitive { .. }, Value::Text(bytes)) => unpacker.get_text(bytes)?,
                    (MemberKind::Primitive { primitive, .. }, leaf) => {
                        *leaf = get_scalar(&mut unpacker, *primitive)?.into_value();
                    }
                    (MemberKind::Nested { element_size, .. }, Value::Record(inner)) => {
                        inner.deserialize_from(buf, unpacker.position())?;
                        unpacker.skip(*element_size);
                    }
                    _ => {
                        return Err(RecordError::ShapeMismatch {
                            path: member.name.clone(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Copies every differing leaf of `other` into `self`.
    pub fn update_from(&mut self, other: &Record) -> Result<UpdateReport, RecordError> {
        if other.type_name != self.type_name {
            return Err(RecordError::ShapeMismatch {
                path: other.type_name.clone(),
            });
        }
        let mut report = UpdateReport::default();
        for (name, mine) in self.values.iter_mut() {
            let updated = match other.values.get(name) {
                Some(theirs) => update_value(mine, theirs, name, &mut report.changes),
                None => false,
            };
            report.fields.push((name.clone(), updated));
        }
        Ok(report)
    }

    /// Every leaf with its path, in byte order of the packed image.
    pub fn leaves(&self) -> Vec<(String, &Value)> {
        let mut out = Vec::new();
        self.collect_leaves("", &mut out);
        out
    }

    fn collect_leaves<'v>(&'v self, prefix: &str, out: &mut Vec<(String, &'v Value)>) {
        for member in &self.layout.members {
            let Some(value) = self.values.get(&member.name) else {
                continue;
            };
            let mut flat = Vec::new();
            value.flatten(&mut flat);
            let base = field_path(prefix, &member.name);
            for (path, leaf) in element_paths(&base, member.kind.shape()).into_iter().zip(flat) {
                match leaf {
                    Value::Record(inner) => inner.collect_leaves(&path, out),
                    leaf => out.push((path, leaf)),
                }
            }
        }
    }
}

fn put_scalar(packer: &mut Packer, scalar: Scalar) {
    match scalar {
        Scalar::Bool(v) => packer.put_bool(v),
        Scalar::I8(v) => packer.put_i8(v),
        Scalar::U8(v) => packer.put_u8(v),
        Scalar::I16(v) => packer.put_i16(v),
        Scalar::U16(v) => packer.put_u16(v),
        Scalar::I32(v) => packer.put_i32(v),
        Scalar::U32(v) => packer.put_u32(v),
        Scalar::I64(v) => packer.put_i64(v),
        Scalar::U64(v) => packer.put_u64(v),
        Scalar::F32(v) => packer.put_f32(v),
        Scalar::F64(v) => packer.put_f64(v),
    }
}

fn get_scalar(unpacker: &mut Unpacker<'_>, primitive: Primitive) -> Result<Scalar, CodecError> {
    let scalar = match primitive {
        Primitive::Bool => Scalar::Bool(unpacker.get_bool()?),
        Primitive::I8 => Scalar::I8(unpacker.get_i8()?),
        Primitive::Char | Primitive::U8 => Scalar::U8(unpacker.get_u8()?),
        Primitive::I16 => Scalar::I16(unpacker.get_i16()?),
        Primitive::U16 => Scalar::U16(unpacker.get_u16()?),
        Primitive::I32 => Scalar::I32(unpacker.get_i32()?),
        Primitive::U32 => Scalar::U32(unpacker.get_u32()?),
        Primitive::I64 => Scalar::I64(unpacker.get_i64()?),
        Primitive::U64 => Scalar::U64(unpacker.get_u64()?),
        Primitive::F32 => Scalar::F32(unpacker.get_f32()?),
        Primitive::F64 => Scalar::F64(unpacker.get_f64()?),
    };
    Ok(scalar)
}

/// Checks `new` against the shape of `current` and pads text.
fn conform(current: &Value, new: Value, primitive: Option<Primitive>, path: &str) -> Result<Value, RecordError> {
    let mismatch = || RecordError::ShapeMismatch {
        path: path.to_string(),
    };
    match (current, new) {
        (Value::Array(cur), Value::Array(items)) => {
            if cur.len() != items.len() {
                return Err(mismatch());
            }
            cur.iter()
                .zip(items)
                .enumerate()
                .map(|(i, (c, n))| conform(c, n, primitive, &format!("{path}[{i}]")))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array)
        }
        (Value::Text(cur), Value::Text(mut bytes)) => {
            if bytes.len() > cur.len() {
                return Err(RecordError::TextTooLong {
                    path: path.to_string(),
                    len: bytes.len(),
                    capacity: cur.len(),
                });
            }
            bytes.resize(cur.len(), 0);
            Ok(Value::Text(bytes))
        }
        (Value::Record(cur), Value::Record(rec)) if cur.type_name == rec.type_name => {
            Ok(Value::Record(rec))
        }
        (Value::Array(_) | Value::Text(_) | Value::Record(_), _) => Err(mismatch()),
        (_, leaf) => {
            let primitive = primitive.ok_or_else(mismatch)?;
            Scalar::narrow(primitive, &leaf, path)?;
            Ok(leaf)
        }
    }
}

fn update_value(mine: &mut Value, theirs: &Value, path: &str, changes: &mut Vec<Change>) -> bool {
    match (mine, theirs) {
        (Value::Array(a), Value::Array(b)) => {
            let mut updated = false;
            for (idx, (m, t)) in a.iter_mut().zip(b).enumerate() {
                updated |= update_value(m, t, &format!("{path}[{idx}]"), changes);
            }
            updated
        }
        (Value::Record(a), Value::Record(b)) => {
            let mut updated = false;
            for (name, m) in a.values.iter_mut() {
                if let Some(t) = b.values.get(name) {
                    updated |= update_value(m, t, &field_path(path, name), changes);
                }
            }
            updated
        }
        (mine, theirs) => {
            if mine == theirs {
                return false;
            }
            Change::record(path, &LeafDebug(mine), &LeafDebug(theirs), changes);
            *mine = theirs.clone();
            true
        }
    }
}

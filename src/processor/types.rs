//! Known type names: primitives, their aliases and compiled structs.

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::HeaderError;
use crate::model::CompiledStruct;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Primitive {
    Bool,
    Char,
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
}

/// What a freshly constructed field holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DefaultKind {
    Bool,
    Int,
    Float,
    Text,
}

impl Primitive {
    pub fn code(self) -> char {
        match self {
            Primitive::Bool => '?',
            Primitive::Char => 's',
            Primitive::I8 => 'b',
            Primitive::U8 => 'B',
            Primitive::I16 => 'h',
            Primitive::U16 => 'H',
            Primitive::I32 => 'i',
            Primitive::U32 => 'I',
            Primitive::I64 => 'q',
            Primitive::U64 => 'Q',
            Primitive::F32 => 'f',
            Primitive::F64 => 'd',
        }
    }

    pub fn size(self) -> usize {
        match self {
            Primitive::Bool | Primitive::Char | Primitive::I8 | Primitive::U8 => 1,
            Primitive::I16 | Primitive::U16 => 2,
            Primitive::I32 | Primitive::U32 | Primitive::F32 => 4,
            Primitive::I64 | Primitive::U64 | Primitive::F64 => 8,
        }
    }

    pub fn default_kind(self) -> DefaultKind {
        match self {
            Primitive::Bool => DefaultKind::Bool,
            Primitive::Char => DefaultKind::Text,
            Primitive::F32 | Primitive::F64 => DefaultKind::Float,
            _ => DefaultKind::Int,
        }
    }

    /// Rust spelling used by generated code.
    pub fn rust_type(self) -> &'static str {
        match self {
            Primitive::Bool => "bool",
            Primitive::Char | Primitive::U8 => "u8",
            Primitive::I8 => "i8",
            Primitive::I16 => "i16",
            Primitive::U16 => "u16",
            Primitive::I32 => "i32",
            Primitive::U32 => "u32",
            Primitive::I64 => "i64",
            Primitive::U64 => "u64",
            Primitive::F32 => "f32",
            Primitive::F64 => "f64",
        }
    }
}

const BUILTINS: &[(&str, Primitive)] = &[
    ("bool", Primitive::Bool),
    ("bool_t", Primitive::Bool),
    ("char", Primitive::Char),
    ("char_t", Primitive::Char),
    ("int8_t", Primitive::I8),
    ("uint8_t", Primitive::U8),
    ("int16_t", Primitive::I16),
    ("uint16_t", Primitive::U16),
    ("int32_t", Primitive::I32),
    ("uint32_t", Primitive::U32),
    ("int64_t", Primitive::I64),
    ("uint64_t", Primitive::U64),
    ("INT8", Primitive::I8),
    ("UINT8", Primitive::U8),
    ("INT16", Primitive::I16),
    ("UINT16", Primitive::U16),
    ("INT32", Primitive::I32),
    ("UINT32", Primitive::U32),
    ("INT64", Primitive::I64),
    ("UINT64", Primitive::U64),
    ("int", Primitive::I32),
    ("float", Primitive::F32),
    ("double", Primitive::F64),
    ("float32_t", Primitive::F32),
    ("float64_t", Primitive::F64),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TypeEntry {
    Primitive(Primitive),
    /// Name of a compiled struct.
    Aggregate(String),
}

#[derive(Debug, Clone)]
pub struct TypeRegistry {
    names: IndexMap<String, TypeEntry>,
    structs: IndexMap<String, CompiledStruct>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    pub fn new() -> Self {
        let names = BUILTINS
            .iter()
            .map(|(name, p)| (name.to_string(), TypeEntry::Primitive(*p)))
            .collect();
        Self {
            names,
            structs: IndexMap::new(),
        }
    }

    pub fn resolve(&self, name: &str) -> Option<&TypeEntry> {
        self.names.get(name)
    }

    pub fn primitive(&self, name: &str) -> Option<Primitive> {
        match self.resolve(name) {
            Some(TypeEntry::Primitive(p)) => Some(*p),
            _ => None,
        }
    }

    /// Compiled struct reachable under `name`, following aliases.
    pub fn get_struct(&self, name: &str) -> Option<&CompiledStruct> {
        match self.resolve(name) {
            Some(TypeEntry::Aggregate(target)) => self.structs.get(target),
            _ => None,
        }
    }

    /// Compiled structs in declaration order.
    pub fn structs(&self) -> impl Iterator<Item = &CompiledStruct> {
        self.structs.values()
    }

    /// Registers `alias` as another name for `target`'s entry.
    ///
    /// Re-aliasing to the same entry is accepted; anything else already
    /// holding the name is a duplicate.
    pub fn alias(&mut self, alias: &str, target: &str, line: usize) -> Result<TypeEntry, HeaderError> {
        let entry = self
            .resolve(target)
            .cloned()
            .ok_or_else(|| HeaderError::UnresolvedType {
                line,
                type_name: target.to_string(),
            })?;
        match self.names.get(alias) {
            Some(existing) if *existing == entry => {}
            Some(_) => {
                return Err(HeaderError::DuplicateDefinition {
                    line,
                    name: alias.to_string(),
                });
            }
            None => {
                self.names.insert(alias.to_string(), entry.clone());
            }
        }
        Ok(entry)
    }

    pub fn declare_struct(&mut self, compiled: CompiledStruct) -> Result<(), HeaderError> {
        let name = compiled.descriptor.name.clone();
        if self.names.contains_key(&name) {
            return Err(HeaderError::DuplicateDefinition {
                line: compiled.descriptor.line_number,
                name,
            });
        }
        self.names
            .insert(name.clone(), TypeEntry::Aggregate(name.clone()));
        self.structs.insert(name, compiled);
        Ok(())
    }
}

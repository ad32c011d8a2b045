//! Turns a [`StructDescriptor`] into a packed [`LayoutPlan`].
//!
//! Fields are placed in declaration order with no padding, so the size does
//! not depend on the byte order. The primitive fields also make up the flat
//! format; nested structs contribute their own packed size.

use crate::error::HeaderError;
use crate::model::{
    FieldDescriptor, FormatRun, FormatUnit, LayoutPlan, MemberKind, MemberLayout,
    NestedContribution, StructDescriptor,
};
use crate::processor::types::{Primitive, TypeRegistry};
use crate::runtime::Endianness;

fn too_large(field: &FieldDescriptor) -> HeaderError {
    let expr = field.dimensions.iter().map(|d| format!("[{d}]")).collect::<String>();
    HeaderError::BadDimension {
        line: field.line,
        expr: format!("{}{expr}", field.name),
        reason: "array size overflows the address space".into(),
    }
}

fn checked_count(shape: &[usize]) -> Option<usize> {
    shape.iter().try_fold(1usize, |acc, len| acc.checked_mul(*len))
}

pub fn compile(
    desc: &StructDescriptor,
    types: &TypeRegistry,
    endianness: Endianness,
) -> Result<LayoutPlan, HeaderError> {
    let mut flat_format = Vec::new();
    let mut nested = Vec::new();
    let mut members = Vec::with_capacity(desc.fields.len());
    let mut offset = 0usize;

    for field in &desc.fields {
        let (size, kind) = if let Some(primitive) = types.primitive(&field.type_name) {
            let (shape, unit, text_len) = match (primitive, field.dimensions.split_last()) {
                (Primitive::Char, Some((len, outer))) => {
                    (outer.to_vec(), FormatUnit::Text(*len), Some(*len))
                }
                (Primitive::Char, None) => (Vec::new(), FormatUnit::Text(1), Some(1)),
                _ => (field.dimensions.clone(), FormatUnit::Scalar(primitive), None),
            };
            let count = checked_count(&shape).ok_or_else(|| too_large(field))?;
            let size = count
                .checked_mul(unit.size())
                .ok_or_else(|| too_large(field))?;
            if count > 0 {
                flat_format.push(FormatRun { unit, count });
            }
            let kind = MemberKind::Primitive {
                primitive,
                shape,
                text_len,
            };
            (size, kind)
        } else if let Some(inner) = types.get_struct(&field.type_name) {
            let count = field.element_count().ok_or_else(|| too_large(field))?;
            let element_size = inner.layout.packed_size;
            let size = count
                .checked_mul(element_size)
                .ok_or_else(|| too_large(field))?;
            nested.push(NestedContribution {
                type_name: inner.descriptor.name.clone(),
                count,
                packed_size: element_size,
            });
            let kind = MemberKind::Nested {
                type_name: inner.descriptor.name.clone(),
                shape: field.dimensions.clone(),
                element_size,
            };
            (size, kind)
        } else {
            return Err(HeaderError::UnresolvedType {
                line: field.line,
                type_name: field.type_name.clone(),
            });
        };

        members.push(MemberLayout {
            name: field.name.clone(),
            offset,
            size,
            dimensions: field.dimensions.clone(),
            kind,
        });
        offset = offset.checked_add(size).ok_or_else(|| too_large(field))?;
    }

    let plan = LayoutPlan {
        endianness,
        flat_format,
        nested,
        members,
        packed_size: offset,
    };
    log::debug!(
        "layout of {}: {} primitive runs, {} nested ({} bytes)",
        desc.name,
        plan.flat_format.len(),
        plan.nested.len(),
        plan.packed_size
    );
    Ok(plan)
}

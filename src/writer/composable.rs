//! Structs that carry their byte order and pack field by field.
//!
//! Serialisation walks the fields in declaration order with a
//! [`Packer`](crate::runtime::Packer); nested structs contribute their own
//! serialised bytes. Changing the byte order of an instance changes the bytes
//! it produces but never its size.

use std::io::{self, Write};

use crate::model::{LayoutPlan, MemberKind, StructDescriptor};
use crate::processor::types::TypeRegistry;
use crate::writer::{
    FieldView, Flavor, field_views, index_exprs, rust_ident, write_allow, write_loops,
    write_struct_decl, write_update_impl,
};

pub struct Composable;

/// Name of the byte-order field, kept clear of the C field names.
fn byte_order_ident(fields: &[FieldView<'_>]) -> String {
    let mut ident = String::from("byte_order");
    while fields.iter().any(|f| f.ident == ident) {
        ident.push('_');
    }
    ident
}

fn pack_line(field: &FieldView<'_>, suffix: &str) -> String {
    let place = format!("self.{}{suffix}", field.ident);
    match &field.member.kind {
        MemberKind::Primitive {
            text_len: Some(len), ..
        } => format!("packer.put_text(&{place}, {len});"),
        MemberKind::Primitive { primitive, .. } => {
            format!("packer.put_{}({place});", primitive.rust_type())
        }
        MemberKind::Nested { .. } => format!("packer.put_bytes(&{place}.serialize());"),
    }
}

fn unpack_lines(field: &FieldView<'_>, suffix: &str) -> Vec<String> {
    let place = format!("self.{}{suffix}", field.ident);
    match &field.member.kind {
        MemberKind::Primitive { text_len: Some(_), .. } => {
            vec![format!("unpacker.get_text(&mut {place})?;")]
        }
        MemberKind::Primitive { primitive, .. } => {
            vec![format!("{place} = unpacker.get_{}()?;", primitive.rust_type())]
        }
        MemberKind::Nested { type_name, .. } => vec![
            format!("{place}.deserialize_from(buf, unpacker.position())?;"),
            format!("unpacker.skip({}::PACKED_SIZE);", rust_ident(type_name)),
        ],
    }
}

impl Flavor for Composable {
    fn emit_struct(
        &self,
        out: &mut dyn Write,
        descriptor: &StructDescriptor,
        layout: &LayoutPlan,
        _types: &TypeRegistry,
    ) -> io::Result<()> {
        let name = rust_ident(&descriptor.name);
        let fields = field_views(descriptor, layout);
        let order = byte_order_ident(&fields);
        write_struct_decl(
            out,
            descriptor,
            &fields,
            Some((order.as_str(), "Endianness", layout.endianness.rust_path())),
        )?;

        write_allow(out)?;
        writeln!(out, "impl {name} {{")?;
        writeln!(out, "    pub const PACKED_SIZE: usize = {};", layout.packed_size)?;
        writeln!(out, "    pub const FORMAT: &'static str = {:?};\n", layout.format_string())?;
        writeln!(out, "    /// Sets the byte order here and in every nested struct.")?;
        writeln!(out, "    pub fn set_byte_order(&mut self, byte_order: Endianness) {{")?;
        writeln!(out, "        self.{order} = byte_order;")?;
        for field in &fields {
            if let MemberKind::Nested { shape, .. } = &field.member.kind {
                let (suffix, _) = index_exprs(shape);
                let body = [format!("self.{}{suffix}.set_byte_order(byte_order);", field.ident)];
                write_loops(out, 8, shape, &body)?;
            }
        }
        writeln!(out, "    }}")?;
        writeln!(out, "}}\n")?;

        write_allow(out)?;
        writeln!(out, "impl PackedStruct for {name} {{")?;
        writeln!(out, "    fn packed_size(&self) -> usize {{")?;
        writeln!(out, "        Self::PACKED_SIZE")?;
        writeln!(out, "    }}\n")?;

        writeln!(out, "    fn serialize(&self) -> Vec<u8> {{")?;
        writeln!(out, "        let mut packer = Packer::new(self.{order}, Self::PACKED_SIZE);")?;
        for field in &fields {
            let shape = field.member.kind.shape();
            let (suffix, _) = index_exprs(shape);
            write_loops(out, 8, shape, &[pack_line(field, &suffix)])?;
        }
        writeln!(out, "        packer.finish()")?;
        writeln!(out, "    }}\n")?;

        writeln!(
            out,
            "    fn deserialize_from(&mut self, buf: &[u8], offset: usize) -> Result<(), CodecError> {{"
        )?;
        writeln!(
            out,
            "        let mut unpacker = Unpacker::new(buf, offset, self.{order}, Self::PACKED_SIZE)?;"
        )?;
        for field in &fields {
            let shape = field.member.kind.shape();
            let (suffix, _) = index_exprs(shape);
            write_loops(out, 8, shape, &unpack_lines(field, &suffix))?;
        }
        writeln!(out, "        Ok(())")?;
        writeln!(out, "    }}")?;
        writeln!(out, "}}\n")?;

        write_update_impl(out, descriptor, &fields)
    }
}

// Auto-generated by h2layout - DO NOT EDIT

#[allow(unused_imports)]
use h2layout::runtime::codec::*;
#[allow(unused_imports)]
use h2layout::runtime::{Change, CodecError, Endianness, PackedStruct, Update, UpdateReport, field_path, update_text};

// Fixture for the integration tests.

#[allow(non_upper_case_globals, non_camel_case_types, non_snake_case, dead_code, unused_mut, unused_variables, clippy::needless_range_loop)]
pub const N: i64 = 3;

#[allow(non_upper_case_globals, non_camel_case_types, non_snake_case, dead_code, unused_mut, unused_variables, clippy::needless_range_loop)]
pub const NAME_LEN: i64 = 8;

#[allow(unused_macros)]
macro_rules! SCALE {
    ($arg:expr) => {
        (($arg) * 2)
    };
}

/// A 2-D position.
#[allow(non_upper_case_globals, non_camel_case_types, non_snake_case, dead_code, unused_mut, unused_variables, clippy::needless_range_loop)]
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    /// east
    pub x: i16,
    /// north
    pub y: i16,
    pub byte_order: Endianness,
}

#[allow(non_upper_case_globals, non_camel_case_types, non_snake_case, dead_code, unused_mut, unused_variables, clippy::needless_range_loop)]
impl Default for Point {
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
            byte_order: Endianness::Little,
        }
    }
}

#[allow(non_upper_case_globals, non_camel_case_types, non_snake_case, dead_code, unused_mut, unused_variables, clippy::needless_range_loop)]
impl Point {
    pub const PACKED_SIZE: usize = 4;
    pub const FORMAT: &'static str = "<hh";

    /// Sets the byte order here and in every nested struct.
    pub fn set_byte_order(&mut self, byte_order: Endianness) {
        self.byte_order = byte_order;
    }
}

#[allow(non_upper_case_globals, non_camel_case_types, non_snake_case, dead_code, unused_mut, unused_variables, clippy::needless_range_loop)]
impl PackedStruct for Point {
    fn packed_size(&self) -> usize {
        Self::PACKED_SIZE
    }

    fn serialize(&self) -> Vec<u8> {
        let mut packer = Packer::new(self.byte_order, Self::PACKED_SIZE);
        packer.put_i16(self.x);
        packer.put_i16(self.y);
        packer.finish()
    }

    fn deserialize_from(&mut self, buf: &[u8], offset: usize) -> Result<(), CodecError> {
        let mut unpacker = Unpacker::new(buf, offset, self.byte_order, Self::PACKED_SIZE)?;
        self.x = unpacker.get_i16()?;
        self.y = unpacker.get_i16()?;
        Ok(())
    }
}

#[allow(non_upper_case_globals, non_camel_case_types, non_snake_case, dead_code, unused_mut, unused_variables, clippy::needless_range_loop)]
impl Update for Point {
    fn update(&mut self, other: &Self, path: &str, changes: &mut Vec<Change>) -> bool {
        let mut updated = false;
        updated |= self.x.update(&other.x, &field_path(path, "x"), changes);
        updated |= self.y.update(&other.y, &field_path(path, "y"), changes);
        updated
    }
}

#[allow(non_upper_case_globals, non_camel_case_types, non_snake_case, dead_code, unused_mut, unused_variables, clippy::needless_range_loop)]
impl Point {
    /// Copies differing fields from `other`, reporting each one.
    pub fn update_fields(&mut self, other: &Self) -> UpdateReport {
        let mut log = Vec::new();
        let changes = &mut log;
        let path = "";
        let fields = vec![
            ("x".to_string(), self.x.update(&other.x, &field_path(path, "x"), changes)),
            ("y".to_string(), self.y.update(&other.y, &field_path(path, "y"), changes)),
        ];
        UpdateReport { fields, changes: log }
    }
}

/// Two floats after an int.
#[allow(non_upper_case_globals, non_camel_case_types, non_snake_case, dead_code, unused_mut, unused_variables, clippy::needless_range_loop)]
#[derive(Debug, Clone, PartialEq)]
pub struct S {
    pub a: i32,
    pub b: [f32; 2],
    pub byte_order: Endianness,
}

#[allow(non_upper_case_globals, non_camel_case_types, non_snake_case, dead_code, unused_mut, unused_variables, clippy::needless_range_loop)]
impl Default for S {
    fn default() -> Self {
        Self {
            a: 0,
            b: [0.0; 2],
            byte_order: Endianness::Little,
        }
    }
}

#[allow(non_upper_case_globals, non_camel_case_types, non_snake_case, dead_code, unused_mut, unused_variables, clippy::needless_range_loop)]
impl S {
    pub const PACKED_SIZE: usize = 12;
    pub const FORMAT: &'static str = "<iff";

    /// Sets the byte order here and in every nested struct.
    pub fn set_byte_order(&mut self, byte_order: Endianness) {
        self.byte_order = byte_order;
    }
}

#[allow(non_upper_case_globals, non_camel_case_types, non_snake_case, dead_code, unused_mut, unused_variables, clippy::needless_range_loop)]
impl PackedStruct for S {
    fn packed_size(&self) -> usize {
        Self::PACKED_SIZE
    }

    fn serialize(&self) -> Vec<u8> {
        let mut packer = Packer::new(self.byte_order, Self::PACKED_SIZE);
        packer.put_i32(self.a);
        for i0 in 0..2 {
            packer.put_f32(self.b[i0]);
        }
        packer.finish()
    }

    fn deserialize_from(&mut self, buf: &[u8], offset: usize) -> Result<(), CodecError> {
        let mut unpacker = Unpacker::new(buf, offset, self.byte_order, Self::PACKED_SIZE)?;
        self.a = unpacker.get_i32()?;
        for i0 in 0..2 {
            self.b[i0] = unpacker.get_f32()?;
        }
        Ok(())
    }
}

#[allow(non_upper_case_globals, non_camel_case_types, non_snake_case, dead_code, unused_mut, unused_variables, clippy::needless_range_loop)]
impl Update for S {
    fn update(&mut self, other: &Self, path: &str, changes: &mut Vec<Change>) -> bool {
        let mut updated = false;
        updated |= self.a.update(&other.a, &field_path(path, "a"), changes);
        updated |= self.b.update(&other.b, &field_path(path, "b"), changes);
        updated
    }
}

#[allow(non_upper_case_globals, non_camel_case_types, non_snake_case, dead_code, unused_mut, unused_variables, clippy::needless_range_loop)]
impl S {
    /// Copies differing fields from `other`, reporting each one.
    pub fn update_fields(&mut self, other: &Self) -> UpdateReport {
        let mut log = Vec::new();
        let changes = &mut log;
        let path = "";
        let fields = vec![
            ("a".to_string(), self.a.update(&other.a, &field_path(path, "a"), changes)),
            ("b".to_string(), self.b.update(&other.b, &field_path(path, "b"), changes)),
        ];
        UpdateReport { fields, changes: log }
    }
}

#[allow(non_upper_case_globals, non_camel_case_types, non_snake_case, dead_code, unused_mut, unused_variables, clippy::needless_range_loop)]
#[derive(Debug, Clone, PartialEq)]
pub struct Creature {
    /// waypoints
    pub path: [Point; 3],
    pub id: u32,
    pub name: [u8; 8],
    pub stats: [u8; 6],
    pub active: bool,
    pub byte_order: Endianness,
}

#[allow(non_upper_case_globals, non_camel_case_types, non_snake_case, dead_code, unused_mut, unused_variables, clippy::needless_range_loop)]
impl Default for Creature {
    fn default() -> Self {
        Self {
            path: std::array::from_fn(|_| Point::default()),
            id: 0,
            name: [0; 8],
            stats: [0; 6],
            active: false,
            byte_order: Endianness::Little,
        }
    }
}

#[allow(non_upper_case_globals, non_camel_case_types, non_snake_case, dead_code, unused_mut, unused_variables, clippy::needless_range_loop)]
impl Creature {
    pub const PACKED_SIZE: usize = 31;
    pub const FORMAT: &'static str = "<I8sBBBBBB?";

    /// Sets the byte order here and in every nested struct.
    pub fn set_byte_order(&mut self, byte_order: Endianness) {
        self.byte_order = byte_order;
        for i0 in 0..3 {
            self.path[i0].set_byte_order(byte_order);
        }
    }
}

#[allow(non_upper_case_globals, non_camel_case_types, non_snake_case, dead_code, unused_mut, unused_variables, clippy::needless_range_loop)]
impl PackedStruct for Creature {
    fn packed_size(&self) -> usize {
        Self::PACKED_SIZE
    }

    fn serialize(&self) -> Vec<u8> {
        let mut packer = Packer::new(self.byte_order, Self::PACKED_SIZE);
        for i0 in 0..3 {
            packer.put_bytes(&self.path[i0].serialize());
        }
        packer.put_u32(self.id);
        packer.put_text(&self.name, 8);
        for i0 in 0..6 {
            packer.put_u8(self.stats[i0]);
        }
        packer.put_bool(self.active);
        packer.finish()
    }

    fn deserialize_from(&mut self, buf: &[u8], offset: usize) -> Result<(), CodecError> {
        let mut unpacker = Unpacker::new(buf, offset, self.byte_order, Self::PACKED_SIZE)?;
        for i0 in 0..3 {
            self.path[i0].deserialize_from(buf, unpacker.position())?;
            unpacker.skip(Point::PACKED_SIZE);
        }
        self.id = unpacker.get_u32()?;
        unpacker.get_text(&mut self.name)?;
        for i0 in 0..6 {
            self.stats[i0] = unpacker.get_u8()?;
        }
        self.active = unpacker.get_bool()?;
        Ok(())
    }
}

#[allow(non_upper_case_globals, non_camel_case_types, non_snake_case, dead_code, unused_mut, unused_variables, clippy::needless_range_loop)]
impl Update for Creature {
    fn update(&mut self, other: &Self, path: &str, changes: &mut Vec<Change>) -> bool {
        let mut updated = false;
        updated |= self.path.update(&other.path, &field_path(path, "path"), changes);
        updated |= self.id.update(&other.id, &field_path(path, "id"), changes);
        updated |= update_text(&mut self.name, &other.name, &field_path(path, "name"), changes);
        updated |= self.stats.update(&other.stats, &field_path(path, "stats"), changes);
        updated |= self.active.update(&other.active, &field_path(path, "active"), changes);
        updated
    }
}

#[allow(non_upper_case_globals, non_camel_case_types, non_snake_case, dead_code, unused_mut, unused_variables, clippy::needless_range_loop)]
impl Creature {
    /// Copies differing fields from `other`, reporting each one.
    pub fn update_fields(&mut self, other: &Self) -> UpdateReport {
        let mut log = Vec::new();
        let changes = &mut log;
        let path = "";
        let fields = vec![
            ("path".to_string(), self.path.update(&other.path, &field_path(path, "path"), changes)),
            ("id".to_string(), self.id.update(&other.id, &field_path(path, "id"), changes)),
            ("name".to_string(), update_text(&mut self.name, &other.name, &field_path(path, "name"), changes)),
            ("stats".to_string(), self.stats.update(&other.stats, &field_path(path, "stats"), changes)),
            ("active".to_string(), self.active.update(&other.active, &field_path(path, "active"), changes)),
        ];
        UpdateReport { fields, changes: log }
    }
}

#[allow(non_upper_case_globals, non_camel_case_types, non_snake_case, dead_code, unused_mut, unused_variables, clippy::needless_range_loop)]
pub type creature = Creature;

#[allow(non_upper_case_globals, non_camel_case_types, non_snake_case, dead_code, unused_mut, unused_variables, clippy::needless_range_loop)]
pub type level_t = u16;


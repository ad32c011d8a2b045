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
}

#[allow(non_upper_case_globals, non_camel_case_types, non_snake_case, dead_code, unused_mut, unused_variables, clippy::needless_range_loop)]
impl Default for Point {
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
        }
    }
}

#[allow(non_upper_case_globals, non_camel_case_types, non_snake_case, dead_code, unused_mut, unused_variables, clippy::needless_range_loop)]
impl Point {
    pub const ENDIANNESS: Endianness = Endianness::Little;
    pub const PACKED_SIZE: usize = 4;
    pub const FORMAT: &'static str = "<hh";
    pub const OFFSET_x: usize = 0;
    pub const OFFSET_y: usize = 2;

    /// Every leaf as `(path, offset, format)`.
    pub const LAYOUT: &'static [(&'static str, usize, &'static str)] = &[
        ("x", 0, "h"),
        ("y", 2, "h"),
    ];

    /// Writes every field at its offset. `buf` holds `PACKED_SIZE` bytes.
    pub fn write_into(&self, buf: &mut [u8]) {
        let at = Self::OFFSET_x;
        buf[at..at + 2].copy_from_slice(&encode_i16(self.x, Self::ENDIANNESS));
        let at = Self::OFFSET_y;
        buf[at..at + 2].copy_from_slice(&encode_i16(self.y, Self::ENDIANNESS));
    }

    pub fn read_from(&mut self, buf: &[u8]) {
        let at = Self::OFFSET_x;
        self.x = decode_i16(read_array(buf, at), Self::ENDIANNESS);
        let at = Self::OFFSET_y;
        self.y = decode_i16(read_array(buf, at), Self::ENDIANNESS);
    }
}

#[allow(non_upper_case_globals, non_camel_case_types, non_snake_case, dead_code, unused_mut, unused_variables, clippy::needless_range_loop)]
impl PackedStruct for Point {
    fn packed_size(&self) -> usize {
        Self::PACKED_SIZE
    }

    fn serialize(&self) -> Vec<u8> {
        let mut buf = vec![0u8; Self::PACKED_SIZE];
        self.write_into(&mut buf);
        buf
    }

    fn deserialize_from(&mut self, buf: &[u8], offset: usize) -> Result<(), CodecError> {
        check_len(buf, offset, Self::PACKED_SIZE)?;
        self.read_from(&buf[offset..offset + Self::PACKED_SIZE]);
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
}

#[allow(non_upper_case_globals, non_camel_case_types, non_snake_case, dead_code, unused_mut, unused_variables, clippy::needless_range_loop)]
impl Default for S {
    fn default() -> Self {
        Self {
            a: 0,
            b: [0.0; 2],
        }
    }
}

#[allow(non_upper_case_globals, non_camel_case_types, non_snake_case, dead_code, unused_mut, unused_variables, clippy::needless_range_loop)]
impl S {
    pub const ENDIANNESS: Endianness = Endianness::Little;
    pub const PACKED_SIZE: usize = 12;
    pub const FORMAT: &'static str = "<iff";
    pub const OFFSET_a: usize = 0;
    pub const OFFSET_b: usize = 4;

    /// Every leaf as `(path, offset, format)`.
    pub const LAYOUT: &'static [(&'static str, usize, &'static str)] = &[
        ("a", 0, "i"),
        ("b[0]", 4, "f"),
        ("b[1]", 8, "f"),
    ];

    /// Writes every field at its offset. `buf` holds `PACKED_SIZE` bytes.
    pub fn write_into(&self, buf: &mut [u8]) {
        let at = Self::OFFSET_a;
        buf[at..at + 4].copy_from_slice(&encode_i32(self.a, Self::ENDIANNESS));
        for i0 in 0..2 {
            let at = Self::OFFSET_b + i0 * 4;
            buf[at..at + 4].copy_from_slice(&encode_f32(self.b[i0], Self::ENDIANNESS));
        }
    }

    pub fn read_from(&mut self, buf: &[u8]) {
        let at = Self::OFFSET_a;
        self.a = decode_i32(read_array(buf, at), Self::ENDIANNESS);
        for i0 in 0..2 {
            let at = Self::OFFSET_b + i0 * 4;
            self.b[i0] = decode_f32(read_array(buf, at), Self::ENDIANNESS);
        }
    }
}

#[allow(non_upper_case_globals, non_camel_case_types, non_snake_case, dead_code, unused_mut, unused_variables, clippy::needless_range_loop)]
impl PackedStruct for S {
    fn packed_size(&self) -> usize {
        Self::PACKED_SIZE
    }

    fn serialize(&self) -> Vec<u8> {
        let mut buf = vec![0u8; Self::PACKED_SIZE];
        self.write_into(&mut buf);
        buf
    }

    fn deserialize_from(&mut self, buf: &[u8], offset: usize) -> Result<(), CodecError> {
        check_len(buf, offset, Self::PACKED_SIZE)?;
        self.read_from(&buf[offset..offset + Self::PACKED_SIZE]);
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
        }
    }
}

#[allow(non_upper_case_globals, non_camel_case_types, non_snake_case, dead_code, unused_mut, unused_variables, clippy::needless_range_loop)]
impl Creature {
    pub const ENDIANNESS: Endianness = Endianness::Little;
    pub const PACKED_SIZE: usize = 31;
    pub const FORMAT: &'static str = "<I8sBBBBBB?";
    pub const OFFSET_path: usize = 0;
    pub const OFFSET_id: usize = 12;
    pub const OFFSET_name: usize = 16;
    pub const OFFSET_stats: usize = 24;
    pub const OFFSET_active: usize = 30;

    /// Every leaf as `(path, offset, format)`.
    pub const LAYOUT: &'static [(&'static str, usize, &'static str)] = &[
        ("path[0].x", 0, "h"),
        ("path[0].y", 2, "h"),
        ("path[1].x", 4, "h"),
        ("path[1].y", 6, "h"),
        ("path[2].x", 8, "h"),
        ("path[2].y", 10, "h"),
        ("id", 12, "I"),
        ("name", 16, "8s"),
        ("stats[0]", 24, "B"),
        ("stats[1]", 25, "B"),
        ("stats[2]", 26, "B"),
        ("stats[3]", 27, "B"),
        ("stats[4]", 28, "B"),
        ("stats[5]", 29, "B"),
        ("active", 30, "?"),
    ];

    /// Writes every field at its offset. `buf` holds `PACKED_SIZE` bytes.
    pub fn write_into(&self, buf: &mut [u8]) {
        for i0 in 0..3 {
            let at = Self::OFFSET_path + i0 * 4;
            self.path[i0].write_into(&mut buf[at..at + Point::PACKED_SIZE]);
        }
        let at = Self::OFFSET_id;
        buf[at..at + 4].copy_from_slice(&encode_u32(self.id, Self::ENDIANNESS));
        let at = Self::OFFSET_name;
        buf[at..at + 8].copy_from_slice(&self.name);
        for i0 in 0..6 {
            let at = Self::OFFSET_stats + i0 * 1;
            buf[at..at + 1].copy_from_slice(&encode_u8(self.stats[i0], Self::ENDIANNESS));
        }
        let at = Self::OFFSET_active;
        buf[at..at + 1].copy_from_slice(&encode_bool(self.active, Self::ENDIANNESS));
    }

    pub fn read_from(&mut self, buf: &[u8]) {
        for i0 in 0..3 {
            let at = Self::OFFSET_path + i0 * 4;
            self.path[i0].read_from(&buf[at..at + Point::PACKED_SIZE]);
        }
        let at = Self::OFFSET_id;
        self.id = decode_u32(read_array(buf, at), Self::ENDIANNESS);
        let at = Self::OFFSET_name;
        self.name = read_array(buf, at);
        for i0 in 0..6 {
            let at = Self::OFFSET_stats + i0 * 1;
            self.stats[i0] = decode_u8(read_array(buf, at), Self::ENDIANNESS);
        }
        let at = Self::OFFSET_active;
        self.active = decode_bool(read_array(buf, at), Self::ENDIANNESS);
    }
}

#[allow(non_upper_case_globals, non_camel_case_types, non_snake_case, dead_code, unused_mut, unused_variables, clippy::needless_range_loop)]
impl PackedStruct for Creature {
    fn packed_size(&self) -> usize {
        Self::PACKED_SIZE
    }

    fn serialize(&self) -> Vec<u8> {
        let mut buf = vec![0u8; Self::PACKED_SIZE];
        self.write_into(&mut buf);
        buf
    }

    fn deserialize_from(&mut self, buf: &[u8], offset: usize) -> Result<(), CodecError> {
        check_len(buf, offset, Self::PACKED_SIZE)?;
        self.read_from(&buf[offset..offset + Self::PACKED_SIZE]);
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


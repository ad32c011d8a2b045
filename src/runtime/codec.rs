//! Fixed-width primitive encoding with an explicit byte order.

use super::{CodecError, Endianness};

macro_rules! numeric_codec {
    ($($ty:ty => $encode:ident, $decode:ident, $put:ident, $get:ident, $width:expr;)*) => {
        $(
            pub fn $encode(value: $ty, endianness: Endianness) -> [u8; $width] {
                if endianness.is_little() {
                    value.to_le_bytes()
                } else {
                    value.to_be_bytes()
                }
            }

            pub fn $decode(bytes: [u8; $width], endianness: Endianness) -> $ty {
                if endianness.is_little() {
                    <$ty>::from_le_bytes(bytes)
                } else {
                    <$ty>::from_be_bytes(bytes)
                }
            }
        )*

        impl Packer {
            $(
                pub fn $put(&mut self, value: $ty) {
                    self.buf.extend_from_slice(&$encode(value, self.endianness));
                }
            )*
        }

        impl<'a> Unpacker<'a> {
            $(
                pub fn $get(&mut self) -> Result<$ty, CodecError> {
                    let bytes = self.take::<$width>()?;
                    Ok($decode(bytes, self.endianness))
                }
            )*
        }
    };
}

numeric_codec! {
    i8 => encode_i8, decode_i8, put_i8, get_i8, 1;
    u8 => encode_u8, decode_u8, put_u8, get_u8, 1;
    i16 => encode_i16, decode_i16, put_i16, get_i16, 2;
    u16 => encode_u16, decode_u16, put_u16, get_u16, 2;
    i32 => encode_i32, decode_i32, put_i32, get_i32, 4;
    u32 => encode_u32, decode_u32, put_u32, get_u32, 4;
    i64 => encode_i64, decode_i64, put_i64, get_i64, 8;
    u64 => encode_u64, decode_u64, put_u64, get_u64, 8;
    f32 => encode_f32, decode_f32, put_f32, get_f32, 4;
    f64 => encode_f64, decode_f64, put_f64, get_f64, 8;
}

pub fn encode_bool(value: bool, _endianness: Endianness) -> [u8; 1] {
    [value as u8]
}

pub fn decode_bool(bytes: [u8; 1], _endianness: Endianness) -> bool {
    bytes[0] != 0
}

/// Copies `N` bytes starting at `at`. Callers check the length beforehand.
pub fn read_array<const N: usize>(buf: &[u8], at: usize) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&buf[at..at + N]);
    out
}

/// Fails with [`CodecError::Truncated`] unless `buf` holds `needed` bytes from
/// `offset` on.
pub fn check_len(buf: &[u8], offset: usize, needed: usize) -> Result<(), CodecError> {
    if offset.checked_add(needed).is_none_or(|end| end > buf.len()) {
        return Err(CodecError::Truncated {
            needed,
            offset,
            available: buf.len().saturating_sub(offset),
        });
    }
    Ok(())
}

/// Appends encoded fields in declaration order.
#[derive(Debug)]
pub struct Packer {
    buf: Vec<u8>,
    endianness: Endianness,
}

impl Packer {
    pub fn new(endianness: Endianness, capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
            endianness,
        }
    }

    pub fn put_bool(&mut self, value: bool) {
        self.buf.push(value as u8);
    }

    /// Writes a fixed-length text buffer, truncating or NUL-padding to `len`.
    pub fn put_text(&mut self, text: &[u8], len: usize) {
        let used = text.len().min(len);
        self.buf.extend_from_slice(&text[..used]);
        self.buf.resize(self.buf.len() + (len - used), 0);
    }

    /// Appends bytes produced elsewhere, e.g. a nested struct.
    pub fn put_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}

/// Reads encoded fields from a borrowed buffer.
#[derive(Debug)]
pub struct Unpacker<'a> {
    buf: &'a [u8],
    offset: usize,
    endianness: Endianness,
}

impl<'a> Unpacker<'a> {
    /// Checks up front that `needed` bytes are available from `offset`.
    pub fn new(
        buf: &'a [u8],
        offset: usize,
        endianness: Endianness,
        needed: usize,
    ) -> Result<Self, CodecError> {
        check_len(buf, offset, needed)?;
        Ok(Self {
            buf,
            offset,
            endianness,
        })
    }

    pub fn position(&self) -> usize {
        self.offset
    }

    pub fn skip(&mut self, len: usize) {
        self.offset += len;
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N], CodecError> {
        check_len(self.buf, self.offset, N)?;
        let bytes = read_array::<N>(self.buf, self.offset);
        self.offset += N;
        Ok(bytes)
    }

    pub fn get_bool(&mut self) -> Result<bool, CodecError> {
        let [byte] = self.take::<1>()?;
        Ok(byte != 0)
    }

    pub fn get_text(&mut self, out: &mut [u8]) -> Result<(), CodecError> {
        check_len(self.buf, self.offset, out.len())?;
        out.copy_from_slice(&self.buf[self.offset..self.offset + out.len()]);
        self.offset += out.len();
        Ok(())
    }
}

//! Canonical serialization.
//!
//! This module defines `Encode`/`Decode`, the traits behind every on-disk and
//! on-wire structure in Ember: little-endian fixed-width integers,
//! [`CompactInt`]-prefixed variable-length fields, and fields encoded in
//! declaration order (see `ember-codec-derive`). Two equal values always
//! produce byte-identical encodings, and `decode` rejects trailing input.

mod compact_int;
mod error;
pub mod sha256d;

use std::convert::TryFrom;
use std::io::{self, Read, Write};

use byteorder::{BigEndian, LittleEndian, ReadBytesExt, WriteBytesExt};
use chrono::{DateTime, TimeZone, Utc};

pub use compact_int::CompactInt;
pub use error::CodecError;

pub trait Encode {
    fn encode<W: Write>(&self, target: W) -> Result<(), io::Error>;

    fn encode_to_vec(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.encode(&mut out).expect("writing to a Vec never fails");
        out
    }
}

pub trait Decode {
    fn decode<R: Read>(reader: R) -> Result<Self, CodecError>
    where
        Self: Sized;
}

/// Decode a value, then require that no bytes remain in `bytes`.
pub fn decode_exact<T: Decode>(bytes: &[u8]) -> Result<T, CodecError> {
    let mut cursor = io::Cursor::new(bytes);
    let value = T::decode(&mut cursor)?;
    if (cursor.position() as usize) != bytes.len() {
        return Err(CodecError::TrailingBytes);
    }
    Ok(value)
}

/// Fixed 3-byte magic + 1-byte version header prepended to every persisted
/// (store-side) struct, per spec.md §4.1/§6.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistedHeader {
    pub magic: [u8; 3],
    pub version: u8,
}

impl PersistedHeader {
    pub const fn new(magic: [u8; 3], version: u8) -> Self {
        PersistedHeader { magic, version }
    }
}

impl Encode for PersistedHeader {
    fn encode<W: Write>(&self, mut target: W) -> Result<(), io::Error> {
        target.write_all(&self.magic)?;
        target.write_all(&[self.version])
    }
}

impl Decode for PersistedHeader {
    fn decode<R: Read>(mut reader: R) -> Result<Self, CodecError> {
        let mut magic = [0u8; 3];
        reader.read_exact(&mut magic)?;
        let version = reader.read_u8()?;
        Ok(PersistedHeader { magic, version })
    }
}

/// Encode `value` prefixed with `header`, requiring an exact `header` match
/// on the way back out. Used for every `STATE`/`INDEX`/`UTXO` value.
pub fn encode_persisted<T: Encode>(header: PersistedHeader, value: &T) -> Vec<u8> {
    let mut out = Vec::new();
    header.encode(&mut out).expect("Vec write cannot fail");
    value.encode(&mut out).expect("Vec write cannot fail");
    out
}

pub fn decode_persisted<T: Decode>(
    expect: PersistedHeader,
    bytes: &[u8],
) -> Result<T, CodecError> {
    let mut cursor = io::Cursor::new(bytes);
    let header = PersistedHeader::decode(&mut cursor)?;
    if header != expect {
        return Err(CodecError::VersionMismatch);
    }
    let value = T::decode(&mut cursor)?;
    if (cursor.position() as usize) != bytes.len() {
        return Err(CodecError::TrailingBytes);
    }
    Ok(value)
}

// ---- primitive impls -------------------------------------------------

impl Encode for bool {
    fn encode<W: Write>(&self, mut target: W) -> Result<(), io::Error> {
        target.write_all(&[*self as u8])
    }
}

impl Decode for bool {
    fn decode<R: Read>(mut reader: R) -> Result<Self, CodecError> {
        match reader.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err(CodecError::FieldOutOfRange),
        }
    }
}

impl Encode for u8 {
    fn encode<W: Write>(&self, mut target: W) -> Result<(), io::Error> {
        target.write_all(&[*self])
    }
}

impl Decode for u8 {
    fn decode<R: Read>(mut reader: R) -> Result<Self, CodecError> {
        Ok(reader.read_u8()?)
    }
}

macro_rules! int_codec {
    ($t:ty, $write:ident, $read:ident) => {
        impl Encode for $t {
            fn encode<W: Write>(&self, mut target: W) -> Result<(), io::Error> {
                target.$write::<LittleEndian>(*self)
            }
        }
        impl Decode for $t {
            fn decode<R: Read>(mut reader: R) -> Result<Self, CodecError> {
                Ok(reader.$read::<LittleEndian>()?)
            }
        }
    };
}

int_codec!(u16, write_u16, read_u16);
int_codec!(u32, write_u32, read_u32);
int_codec!(u64, write_u64, read_u64);
int_codec!(i32, write_i32, read_i32);
int_codec!(i64, write_i64, read_i64);

impl Encode for DateTime<Utc> {
    fn encode<W: Write>(&self, mut target: W) -> Result<(), io::Error> {
        let seconds = u64::try_from(self.timestamp()).unwrap_or(0);
        target.write_u64::<LittleEndian>(seconds)
    }
}

impl Decode for DateTime<Utc> {
    fn decode<R: Read>(mut reader: R) -> Result<Self, CodecError> {
        let seconds = reader.read_u64::<LittleEndian>()?;
        let secs = i64::try_from(seconds).map_err(|_| CodecError::FieldOutOfRange)?;
        Utc.timestamp_opt(secs, 0)
            .single()
            .ok_or(CodecError::FieldOutOfRange)
    }
}

impl Encode for [u8; 20] {
    fn encode<W: Write>(&self, mut target: W) -> Result<(), io::Error> {
        target.write_all(self)
    }
}

impl Decode for [u8; 20] {
    fn decode<R: Read>(mut reader: R) -> Result<Self, CodecError> {
        let mut buf = [0u8; 20];
        reader.read_exact(&mut buf)?;
        Ok(buf)
    }
}

impl Encode for [u8; 32] {
    fn encode<W: Write>(&self, mut target: W) -> Result<(), io::Error> {
        target.write_all(self)
    }
}

impl Decode for [u8; 32] {
    fn decode<R: Read>(mut reader: R) -> Result<Self, CodecError> {
        let mut buf = [0u8; 32];
        reader.read_exact(&mut buf)?;
        Ok(buf)
    }
}

impl Encode for primitive_types::U256 {
    fn encode<W: Write>(&self, mut target: W) -> Result<(), io::Error> {
        let mut bytes = [0u8; 32];
        self.to_little_endian(&mut bytes);
        target.write_all(&bytes)
    }
}

impl Decode for primitive_types::U256 {
    fn decode<R: Read>(mut reader: R) -> Result<Self, CodecError> {
        let mut bytes = [0u8; 32];
        reader.read_exact(&mut bytes)?;
        Ok(primitive_types::U256::from_little_endian(&bytes))
    }
}

/// Big-endian fixed-width integer, for keys that must sort lexicographically
/// by value (store `HEIGHT/<be_u32>` keys).
pub struct BigEndianU32(pub u32);

impl Encode for BigEndianU32 {
    fn encode<W: Write>(&self, mut target: W) -> Result<(), io::Error> {
        target.write_u32::<BigEndian>(self.0)
    }
}

impl Decode for BigEndianU32 {
    fn decode<R: Read>(mut reader: R) -> Result<Self, CodecError> {
        Ok(BigEndianU32(reader.read_u32::<BigEndian>()?))
    }
}

impl<T: Encode> Encode for Vec<T> {
    fn encode<W: Write>(&self, mut target: W) -> Result<(), io::Error> {
        CompactInt::from(self.len()).encode(&mut target)?;
        for item in self.iter() {
            item.encode(&mut target)?;
        }
        Ok(())
    }
}

impl<T: Decode> Decode for Vec<T> {
    fn decode<R: Read>(mut reader: R) -> Result<Self, CodecError> {
        let len = CompactInt::decode(&mut reader)?.value() as usize;
        let mut out = Vec::with_capacity(len.min(1 << 20));
        for _ in 0..len {
            out.push(T::decode(&mut reader)?);
        }
        Ok(out)
    }
}

impl<T: Encode> Encode for std::sync::Arc<T> {
    fn encode<W: Write>(&self, target: W) -> Result<(), io::Error> {
        self.as_ref().encode(target)
    }
}

impl<T: Decode> Decode for std::sync::Arc<T> {
    fn decode<R: Read>(reader: R) -> Result<Self, CodecError> {
        Ok(std::sync::Arc::new(T::decode(reader)?))
    }
}

impl Encode for String {
    fn encode<W: Write>(&self, mut target: W) -> Result<(), io::Error> {
        self.as_bytes().to_vec().encode(&mut target)
    }
}

impl Decode for String {
    fn decode<R: Read>(reader: R) -> Result<Self, CodecError> {
        let bytes = Vec::<u8>::decode(reader)?;
        String::from_utf8(bytes).map_err(|_| CodecError::FieldOutOfRange)
    }
}

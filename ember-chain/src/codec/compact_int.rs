use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use super::{CodecError, Decode, Encode};

/// A length prefix using Bitcoin's compact-varint scheme: values below
/// `0xFD` encode as a single byte; `0xFD` introduces a `u16`; `0xFE` a
/// `u32`; `0xFF` a `u64`. See spec.md §4.1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompactInt(u64);

impl CompactInt {
    pub fn new(value: u64) -> CompactInt {
        CompactInt(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    /// Size in bytes of the encoding of `value` as a length prefix.
    pub fn size(value: usize) -> usize {
        if value < 0xFD {
            1
        } else if value <= u16::MAX as usize {
            3
        } else if value <= u32::MAX as usize {
            5
        } else {
            9
        }
    }
}

impl From<usize> for CompactInt {
    fn from(value: usize) -> Self {
        CompactInt(value as u64)
    }
}

impl Encode for CompactInt {
    fn encode<W: std::io::Write>(&self, mut target: W) -> Result<(), std::io::Error> {
        if self.0 < 0xFD {
            target.write_all(&[self.0 as u8])
        } else if self.0 <= u16::MAX as u64 {
            target.write_all(&[0xFD])?;
            target.write_u16::<LittleEndian>(self.0 as u16)
        } else if self.0 <= u32::MAX as u64 {
            target.write_all(&[0xFE])?;
            target.write_u32::<LittleEndian>(self.0 as u32)
        } else {
            target.write_all(&[0xFF])?;
            target.write_u64::<LittleEndian>(self.0)
        }
    }
}

impl Decode for CompactInt {
    fn decode<R: std::io::Read>(mut target: R) -> Result<CompactInt, CodecError> {
        let first = target.read_u8()?;
        let value = match first {
            0xFD => {
                let v = target.read_u16::<LittleEndian>()? as u64;
                if v < 0xFD {
                    return Err(CodecError::FieldOutOfRange);
                }
                v
            }
            0xFE => {
                let v = target.read_u32::<LittleEndian>()? as u64;
                if v <= u16::MAX as u64 {
                    return Err(CodecError::FieldOutOfRange);
                }
                v
            }
            0xFF => {
                let v = target.read_u64::<LittleEndian>()?;
                if v <= u32::MAX as u64 {
                    return Err(CodecError::FieldOutOfRange);
                }
                v
            }
            n => n as u64,
        };
        Ok(CompactInt(value))
    }
}

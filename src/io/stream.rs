use byteorder::{BigEndian, ByteOrder, LittleEndian};
use serde::Deserialize;

use super::device::StreamDevice;
use crate::errors::{Result, RigError};

/// Byte order applied to every multi-byte scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endianness {
    Little,
    Big,
}

impl Endianness {
    #[cfg(target_endian = "little")]
    pub const NATIVE: Self = Self::Little;
    #[cfg(target_endian = "big")]
    pub const NATIVE: Self = Self::Big;
}

impl Default for Endianness {
    fn default() -> Self {
        Self::NATIVE
    }
}

/// Encodes `s` as Latin-1, one byte per character.
///
/// Characters outside U+0000..=U+00FF become `?`, so the byte count always
/// equals the character count.
#[must_use]
pub fn latin1_bytes(s: &str) -> Vec<u8> {
    s.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}

/// Decodes Latin-1 bytes.
#[must_use]
pub fn latin1_string(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Generates a read/write pair for one fixed-width scalar.
macro_rules! scalar_io {
    ($($ty:ty, $len:literal, $read:ident, $write:ident;)*) => {
        $(
            #[doc = concat!("Reads a `", stringify!($ty), "` in the configured byte order.")]
            pub fn $read(&mut self) -> Result<$ty> {
                let mut buf = [0u8; $len];
                self.device.read(&mut buf)?;
                Ok(match self.endianness {
                    Endianness::Little => LittleEndian::$read(&buf),
                    Endianness::Big => BigEndian::$read(&buf),
                })
            }

            #[doc = concat!("Writes a `", stringify!($ty), "` in the configured byte order.")]
            pub fn $write(&mut self, value: $ty) -> Result<()> {
                let mut buf = [0u8; $len];
                match self.endianness {
                    Endianness::Little => LittleEndian::$write(&mut buf, value),
                    Endianness::Big => BigEndian::$write(&mut buf, value),
                }
                self.device.write(&buf)
            }
        )*
    };
}

/// Seekable, endianness-aware binary stream over any [`StreamDevice`].
///
/// Besides scalar and string I/O the stream keeps a LIFO stack of positions.
/// [`push`](Self::push) records the current offset, [`pop`](Self::pop) seeks
/// back to it. [`begin_sized_block`](Self::begin_sized_block) and
/// [`end_sized_block`](Self::end_sized_block) build the two-phase length
/// field protocol on top of it:
///
/// 1. record the offset and write a provisional `0`,
/// 2. write the payload,
/// 3. seek back and write the payload length,
/// 4. seek forward to the end of the payload.
///
/// Blocks may nest.
#[derive(Debug)]
pub struct BinaryStream<D: StreamDevice> {
    device: D,
    positions: Vec<u64>,
    endianness: Endianness,
}

impl<D: StreamDevice> BinaryStream<D> {
    /// Wraps `device` using the native byte order.
    pub fn new(device: D) -> Self {
        Self {
            device,
            positions: Vec::new(),
            endianness: Endianness::NATIVE,
        }
    }

    #[must_use]
    pub fn with_endianness(mut self, endianness: Endianness) -> Self {
        self.endianness = endianness;
        self
    }

    pub fn set_endianness(&mut self, endianness: Endianness) {
        self.endianness = endianness;
    }

    #[inline]
    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    #[inline]
    pub fn device(&self) -> &D {
        &self.device
    }

    /// Flushes and hands the device back.
    pub fn finish(mut self) -> Result<D> {
        self.device.flush()?;
        Ok(self.device)
    }

    // ========================================================================
    // Positioning
    // ========================================================================

    #[inline]
    pub fn pos(&self) -> u64 {
        self.device.position()
    }

    #[inline]
    pub fn size(&self) -> u64 {
        self.device.size()
    }

    #[inline]
    pub fn at_end(&self) -> bool {
        self.device.at_end()
    }

    pub fn seek(&mut self, position: u64) -> Result<()> {
        self.device.seek(position)
    }

    /// Moves `offset` bytes relative to the current position.
    ///
    /// Moving before the start clamps to 0 and returns
    /// [`RigError::SeekBeforeStart`].
    pub fn skip(&mut self, offset: i64) -> Result<()> {
        let position = self.pos();
        match position.checked_add_signed(offset) {
            Some(target) => self.device.seek(target),
            None => {
                self.device.seek(0)?;
                Err(RigError::SeekBeforeStart { position, offset })
            }
        }
    }

    /// Moves `amount` bytes back. Clamps to 0 like [`skip`](Self::skip).
    pub fn rewind(&mut self, amount: u64) -> Result<()> {
        match i64::try_from(amount) {
            Ok(amount) => self.skip(-amount),
            Err(_) => {
                let position = self.pos();
                self.device.seek(0)?;
                Err(RigError::SeekBeforeStart {
                    position,
                    offset: i64::MIN,
                })
            }
        }
    }

    /// Records the current position.
    pub fn push(&mut self) {
        self.positions.push(self.pos());
    }

    /// Seeks back to the most recently pushed position and returns it.
    pub fn pop(&mut self) -> Result<u64> {
        let position = self.positions.pop().ok_or(RigError::EmptyPositionStack)?;
        self.seek(position)?;
        Ok(position)
    }

    // ========================================================================
    // Scalars
    // ========================================================================

    pub fn read_u8(&mut self) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.device.read(&mut buf)?;
        Ok(buf[0])
    }

    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.device.write(&[value])
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    pub fn write_i8(&mut self, value: i8) -> Result<()> {
        self.write_u8(value as u8)
    }

    scalar_io! {
        u16, 2, read_u16, write_u16;
        i16, 2, read_i16, write_i16;
        u32, 4, read_u32, write_u32;
        i32, 4, read_i32, write_i32;
        u64, 8, read_u64, write_u64;
        i64, 8, read_i64, write_i64;
        f32, 4, read_f32, write_f32;
    }

    /// Writes a 3-component float vector.
    pub fn write_f32x3(&mut self, v: [f32; 3]) -> Result<()> {
        for c in v {
            self.write_f32(c)?;
        }
        Ok(())
    }

    // ========================================================================
    // Raw bytes and strings
    // ========================================================================

    pub fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.device.write(data)
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.device.read(&mut buf)?;
        Ok(buf)
    }

    /// Writes Latin-1 bytes followed by a `0` terminator.
    pub fn write_zstring(&mut self, s: &str) -> Result<()> {
        let mut bytes = latin1_bytes(s);
        bytes.push(0);
        self.device.write(&bytes)
    }

    /// Reads up to `max_len` bytes looking for a `0` terminator.
    ///
    /// Hitting `max_len` returns what was read so far; hitting the end of the
    /// stream first is an [`RigError::UnterminatedString`].
    pub fn read_zstring(&mut self, max_len: usize) -> Result<String> {
        let start = self.pos();
        let mut bytes = Vec::new();
        while bytes.len() < max_len {
            if self.at_end() {
                return Err(RigError::UnterminatedString(start));
            }
            match self.read_u8()? {
                0 => return Ok(latin1_string(&bytes)),
                b => bytes.push(b),
            }
        }
        Ok(latin1_string(&bytes))
    }

    /// Writes an `i32` character count followed by the Latin-1 bytes, unterminated.
    pub fn write_sized_string(&mut self, s: &str) -> Result<()> {
        let bytes = latin1_bytes(s);
        self.write_i32(bytes.len() as i32)?;
        self.device.write(&bytes)
    }

    pub fn read_sized_string(&mut self) -> Result<String> {
        let len = self.read_i32()?.max(0) as usize;
        let bytes = self.read_bytes(len)?;
        Ok(latin1_string(&bytes))
    }

    // ========================================================================
    // Length-prefixed blocks
    // ========================================================================

    /// Reserves an `i32` length field at the current position.
    pub fn begin_sized_block(&mut self) -> Result<()> {
        self.push();
        self.write_i32(0)
    }

    /// Patches the innermost reserved length field with the number of bytes
    /// written after it, then returns to the end of the payload.
    pub fn end_sized_block(&mut self) -> Result<u32> {
        let end = self.pos();
        let field = self.pop()?;
        let len = end - field - 4;
        self.write_u32(len as u32)?;
        self.seek(end)?;
        Ok(len as u32)
    }
}

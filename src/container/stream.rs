//! Byte streams for writing and reading container data.

use std::io::Write;

use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};

use super::varint;
use crate::util::{Error, Result};

/// Output stream that tracks its position.
pub struct OStream<W: Write> {
    writer: W,
    pos: u64,
}

impl<W: Write> OStream<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, pos: 0 }
    }

    /// Get the current write position.
    #[inline]
    pub fn pos(&self) -> u64 {
        self.pos
    }

    /// Write bytes and advance position.
    pub fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.writer.write_all(data)?;
        self.pos += data.len() as u64;
        Ok(())
    }

    /// Write `data` zero-padded (or cut) to exactly `len` bytes.
    pub fn write_fixed(&mut self, data: &[u8], len: usize) -> Result<()> {
        let n = data.len().min(len);
        self.write_bytes(&data[..n])?;
        for _ in n..len {
            self.write_u8(0)?;
        }
        Ok(())
    }

    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.writer.write_u8(value)?;
        self.pos += 1;
        Ok(())
    }

    pub fn write_i8(&mut self, value: i8) -> Result<()> {
        self.writer.write_i8(value)?;
        self.pos += 1;
        Ok(())
    }

    /// Write an i16 value (little-endian).
    pub fn write_i16(&mut self, value: i16) -> Result<()> {
        self.writer.write_i16::<LittleEndian>(value)?;
        self.pos += 2;
        Ok(())
    }

    /// Write an f32 value (little-endian).
    pub fn write_f32(&mut self, value: f32) -> Result<()> {
        self.writer.write_f32::<LittleEndian>(value)?;
        self.pos += 4;
        Ok(())
    }

    /// Write an unsigned VL integer.
    pub fn write_u_vl(&mut self, value: u32) -> Result<()> {
        self.pos += varint::write_u32_vl(&mut self.writer, value)? as u64;
        Ok(())
    }

    /// Write a count or index as an unsigned VL integer.
    pub fn write_len_vl(&mut self, value: usize) -> Result<()> {
        let value = u32::try_from(value).map_err(|_| Error::OutOfRange {
            field: "count",
            value: value as f64,
        })?;
        self.write_u_vl(value)
    }

    /// Write a zig-zag signed VL integer.
    pub fn write_s_vl(&mut self, value: i32) -> Result<()> {
        self.pos += varint::write_i32_vl(&mut self.writer, value)? as u64;
        Ok(())
    }

    /// Write a VL byte length followed by UTF-8 bytes.
    pub fn write_string_vl(&mut self, s: &str) -> Result<()> {
        self.write_len_vl(s.len())?;
        self.write_bytes(s.as_bytes())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Input stream over an in-memory buffer.
pub struct IStream<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> IStream<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    #[inline]
    pub fn pos(&self) -> u64 {
        self.pos as u64
    }

    #[inline]
    pub fn is_eof(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Borrow the next `len` bytes and advance.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or(Error::UnexpectedEof(self.data.len() as u64))?;
        let out = &self.data[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(LittleEndian::read_i16(self.read_bytes(2)?))
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(LittleEndian::read_f32(self.read_bytes(4)?))
    }

    pub fn read_u_vl(&mut self) -> Result<u32> {
        let (value, n) = varint::read_u32_vl(&self.data[self.pos..], self.pos as u64)?;
        self.pos += n;
        Ok(value)
    }

    /// Read an unsigned VL integer used as a count or index.
    pub fn read_len_vl(&mut self) -> Result<usize> {
        Ok(self.read_u_vl()? as usize)
    }

    pub fn read_s_vl(&mut self) -> Result<i32> {
        let (value, n) = varint::read_i32_vl(&self.data[self.pos..], self.pos as u64)?;
        self.pos += n;
        Ok(value)
    }

    pub fn read_string_vl(&mut self) -> Result<String> {
        let len = self.read_len_vl()?;
        let bytes = self.read_bytes(len)?;
        Ok(String::from_utf8(bytes.to_vec())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_padding() -> Result<()> {
        let mut s = OStream::new(Vec::new());
        s.write_fixed(b"ABC", 8)?;
        assert_eq!(s.pos(), 8);
        assert_eq!(s.into_inner(), b"ABC\0\0\0\0\0");

        let mut s = OStream::new(Vec::new());
        s.write_fixed(b"TOO_LONG_MAGIC", 4)?;
        assert_eq!(s.into_inner(), b"TOO_");
        Ok(())
    }

    #[test]
    fn test_write_read_mixed() -> Result<()> {
        let mut s = OStream::new(Vec::new());
        s.write_u_vl(300)?;
        s.write_s_vl(-200)?;
        s.write_i16(-1)?;
        s.write_i8(-127)?;
        s.write_f32(1.5)?;
        s.write_string_vl("héllo")?;
        let pos = s.pos();
        let buf = s.into_inner();
        assert_eq!(pos, buf.len() as u64);

        let mut r = IStream::new(&buf);
        assert_eq!(r.read_u_vl()?, 300);
        assert_eq!(r.read_s_vl()?, -200);
        assert_eq!(r.read_i16()?, -1);
        assert_eq!(r.read_i8()?, -127);
        assert_eq!(r.read_f32()?, 1.5);
        assert_eq!(r.read_string_vl()?, "héllo");
        assert!(r.is_eof());
        Ok(())
    }

    #[test]
    fn test_clip_depth_sentinel_bytes() -> Result<()> {
        let mut s = OStream::new(Vec::new());
        s.write_i16(-1)?;
        assert_eq!(s.into_inner(), [0xFF, 0xFF]);
        Ok(())
    }

    #[test]
    fn test_read_past_end() {
        let buf = [0x01u8];
        let mut r = IStream::new(&buf);
        assert!(r.read_u8().is_ok());
        assert!(matches!(r.read_u8(), Err(Error::UnexpectedEof(1))));
        assert!(matches!(r.read_u_vl(), Err(Error::UnexpectedEof(1))));
    }
}

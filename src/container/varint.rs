//! Variable-length integer codec.
//!
//! 7 value bits per byte, least significant group first. Bit 7 is set on
//! every byte except the last. Signed values are zig-zag folded first so
//! small magnitudes of either sign stay short.

use std::io::{self, Write};

use super::format::{MAX_VARINT32_BYTES, MAX_VARINT64_BYTES};
use crate::util::{Error, Result};

/// Zig-zag fold: 0, -1, 1, -2, ... -> 0, 1, 2, 3, ...
#[inline]
pub const fn zigzag_encode(value: i32) -> u32 {
    ((value << 1) ^ (value >> 31)) as u32
}

/// Inverse of [`zigzag_encode`].
#[inline]
pub const fn zigzag_decode(value: u32) -> i32 {
    ((value >> 1) as i32) ^ -((value & 1) as i32)
}

/// Write an unsigned VL integer, returning the number of bytes written.
pub fn write_u64_vl<W: Write + ?Sized>(w: &mut W, mut value: u64) -> io::Result<usize> {
    let mut tmp = [0u8; MAX_VARINT64_BYTES];
    let mut n = 0;
    while value >= 0x80 {
        tmp[n] = (value as u8) | 0x80;
        value >>= 7;
        n += 1;
    }
    tmp[n] = value as u8;
    n += 1;
    w.write_all(&tmp[..n])?;
    Ok(n)
}

#[inline]
pub fn write_u32_vl<W: Write + ?Sized>(w: &mut W, value: u32) -> io::Result<usize> {
    write_u64_vl(w, value as u64)
}

#[inline]
pub fn write_i32_vl<W: Write + ?Sized>(w: &mut W, value: i32) -> io::Result<usize> {
    write_u32_vl(w, zigzag_encode(value))
}

/// Number of bytes `value` takes as an unsigned VL integer.
pub fn u64_vl_len(value: u64) -> usize {
    let bits = 64 - value.leading_zeros() as usize;
    bits.div_ceil(7).max(1)
}

/// Decode an unsigned VL integer of at most `max_bytes`.
///
/// Returns the value and the number of bytes consumed. `pos` is only used
/// for error reporting.
pub fn read_vl(data: &[u8], pos: u64, max_bytes: usize) -> Result<(u64, usize)> {
    let mut value = 0u64;
    for i in 0..max_bytes {
        let Some(&byte) = data.get(i) else {
            return Err(Error::UnexpectedEof(pos + i as u64));
        };
        value |= ((byte & 0x7F) as u64) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }
    Err(Error::VarIntOverflow(pos))
}

/// Decode an unsigned 32-bit VL integer.
pub fn read_u32_vl(data: &[u8], pos: u64) -> Result<(u32, usize)> {
    let (value, n) = read_vl(data, pos, MAX_VARINT32_BYTES)?;
    let value = u32::try_from(value).map_err(|_| Error::VarIntOverflow(pos))?;
    Ok((value, n))
}

/// Decode a signed 32-bit VL integer.
pub fn read_i32_vl(data: &[u8], pos: u64) -> Result<(i32, usize)> {
    let (value, n) = read_u32_vl(data, pos)?;
    Ok((zigzag_decode(value), n))
}

/// Decode an unsigned 64-bit VL integer.
pub fn read_u64_vl(data: &[u8], pos: u64) -> Result<(u64, usize)> {
    read_vl(data, pos, MAX_VARINT64_BYTES)
}

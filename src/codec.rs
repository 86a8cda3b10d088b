// codec.rs
//
// Fixed-width integer access for object file images. Every multi-byte field
// in the format goes through here so byte order is decided in one place.

use crate::error::{ElfError, Result};

/// Byte order of multi-byte fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endian {
    Little,
    Big,
}

impl Endian {
    /// Byte order of the machine running this code.
    pub fn native() -> Self {
        if cfg!(target_endian = "big") { Endian::Big } else { Endian::Little }
    }
}

/// Borrow `N` bytes at `offset`, failing if any of them lie past the end.
fn take<const N: usize>(data: &[u8], offset: usize) -> Result<[u8; N]> {
    let end = offset.checked_add(N).ok_or(ElfError::OutOfRange {
        offset,
        len: N,
        size: data.len(),
    })?;
    data.get(offset..end)
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or(ElfError::OutOfRange { offset, len: N, size: data.len() })
}

/// Borrow `len` bytes at `offset` as a slice.
pub fn slice(data: &[u8], offset: usize, len: usize) -> Result<&[u8]> {
    offset
        .checked_add(len)
        .and_then(|end| data.get(offset..end))
        .ok_or(ElfError::OutOfRange { offset, len, size: data.len() })
}

pub fn read_u8(data: &[u8], offset: usize) -> Result<u8> {
    Ok(take::<1>(data, offset)?[0])
}

pub fn read_u16(data: &[u8], offset: usize, endian: Endian) -> Result<u16> {
    let bytes = take(data, offset)?;
    Ok(match endian {
        Endian::Little => u16::from_le_bytes(bytes),
        Endian::Big => u16::from_be_bytes(bytes),
    })
}

pub fn read_u32(data: &[u8], offset: usize, endian: Endian) -> Result<u32> {
    let bytes = take(data, offset)?;
    Ok(match endian {
        Endian::Little => u32::from_le_bytes(bytes),
        Endian::Big => u32::from_be_bytes(bytes),
    })
}

pub fn read_u64(data: &[u8], offset: usize, endian: Endian) -> Result<u64> {
    let bytes = take(data, offset)?;
    Ok(match endian {
        Endian::Little => u64::from_le_bytes(bytes),
        Endian::Big => u64::from_be_bytes(bytes),
    })
}

pub fn read_i8(data: &[u8], offset: usize) -> Result<i8> {
    Ok(read_u8(data, offset)? as i8)
}

pub fn read_i16(data: &[u8], offset: usize, endian: Endian) -> Result<i16> {
    Ok(read_u16(data, offset, endian)? as i16)
}

pub fn read_i32(data: &[u8], offset: usize, endian: Endian) -> Result<i32> {
    Ok(read_u32(data, offset, endian)? as i32)
}

pub fn read_i64(data: &[u8], offset: usize, endian: Endian) -> Result<i64> {
    Ok(read_u64(data, offset, endian)? as i64)
}

/// Bytes of padding that bring `len` up to a multiple of `align`.
pub fn pad_len(len: usize, align: usize) -> usize {
    if align <= 1 { 0 } else { (align - len % align) % align }
}

/// Round `value` up to a multiple of `align`, or `None` when the result does
/// not fit. Alignments of 0 and 1 mean "no constraint".
pub fn align_up(value: u64, align: u64) -> Option<u64> {
    if align <= 1 {
        return Some(value);
    }
    value.checked_next_multiple_of(align)
}

// ============================================================================
// Reader
// ============================================================================

/// Cursor over a byte image that decodes fields in sequence.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
    endian: Endian,
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8], pos: usize, endian: Endian) -> Self {
        Self { data, pos, endian }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn endian(&self) -> Endian {
        self.endian
    }

    pub fn u8(&mut self) -> Result<u8> {
        let value = read_u8(self.data, self.pos)?;
        self.pos += 1;
        Ok(value)
    }

    pub fn u16(&mut self) -> Result<u16> {
        let value = read_u16(self.data, self.pos, self.endian)?;
        self.pos += 2;
        Ok(value)
    }

    pub fn u32(&mut self) -> Result<u32> {
        let value = read_u32(self.data, self.pos, self.endian)?;
        self.pos += 4;
        Ok(value)
    }

    pub fn u64(&mut self) -> Result<u64> {
        let value = read_u64(self.data, self.pos, self.endian)?;
        self.pos += 8;
        Ok(value)
    }

    pub fn i32(&mut self) -> Result<i32> {
        Ok(self.u32()? as i32)
    }

    pub fn i64(&mut self) -> Result<i64> {
        Ok(self.u64()? as i64)
    }

    pub fn bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        let bytes = slice(self.data, self.pos, len)?;
        self.pos += len;
        Ok(bytes)
    }

    /// Advance past `len` bytes without reading them. Skipping past the end
    /// is allowed; the next read reports it.
    pub fn skip(&mut self, len: usize) {
        self.pos = self.pos.saturating_add(len);
    }
}

// ============================================================================
// Writer
// ============================================================================

/// Growable byte image that encodes fields in sequence.
#[derive(Debug, Clone)]
pub struct Writer {
    buf: Vec<u8>,
    endian: Endian,
}

impl Writer {
    pub fn new(endian: Endian) -> Self {
        Self { buf: Vec::new(), endian }
    }

    pub fn with_capacity(endian: Endian, capacity: usize) -> Self {
        Self { buf: Vec::with_capacity(capacity), endian }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub fn u16(&mut self, value: u16) {
        match self.endian {
            Endian::Little => self.buf.extend_from_slice(&value.to_le_bytes()),
            Endian::Big => self.buf.extend_from_slice(&value.to_be_bytes()),
        }
    }

    pub fn u32(&mut self, value: u32) {
        match self.endian {
            Endian::Little => self.buf.extend_from_slice(&value.to_le_bytes()),
            Endian::Big => self.buf.extend_from_slice(&value.to_be_bytes()),
        }
    }

    pub fn u64(&mut self, value: u64) {
        match self.endian {
            Endian::Little => self.buf.extend_from_slice(&value.to_le_bytes()),
            Endian::Big => self.buf.extend_from_slice(&value.to_be_bytes()),
        }
    }

    pub fn i32(&mut self, value: i32) {
        self.u32(value as u32);
    }

    pub fn i64(&mut self, value: i64) {
        self.u64(value as u64);
    }

    pub fn bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Append zero bytes until the length is a multiple of `align`.
    pub fn pad_to(&mut self, align: u64) {
        let target = self.buf.len() + pad_len(self.buf.len(), align as usize);
        self.buf.resize(target, 0);
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_both_byte_orders() {
        let data = [0x12, 0x34, 0x56, 0x78, 0x9a, 0xbc, 0xde, 0xf0];
        assert_eq!(read_u16(&data, 0, Endian::Big).unwrap(), 0x1234);
        assert_eq!(read_u16(&data, 0, Endian::Little).unwrap(), 0x3412);
        assert_eq!(read_u32(&data, 4, Endian::Big).unwrap(), 0x9abc_def0);
        assert_eq!(read_u32(&data, 4, Endian::Little).unwrap(), 0xf0de_bc9a);
        assert_eq!(read_u64(&data, 0, Endian::Big).unwrap(), 0x1234_5678_9abc_def0);
        assert_eq!(read_u64(&data, 0, Endian::Little).unwrap(), 0xf0de_bc9a_7856_3412);
    }

    #[test]
    fn test_signed_reads() {
        let data = [0xff, 0xff, 0xff, 0xfe];
        assert_eq!(read_i8(&data, 0).unwrap(), -1);
        assert_eq!(read_i16(&data, 2, Endian::Big).unwrap(), -2);
        assert_eq!(read_i32(&data, 0, Endian::Big).unwrap(), -2);
    }

    #[test]
    fn test_out_of_range() {
        let data = [1, 2, 3];
        match read_u32(&data, 0, Endian::Little) {
            Err(ElfError::OutOfRange { offset: 0, len: 4, size: 3 }) => {}
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(read_u8(&data, 3).is_err());
        assert!(read_u16(&data, usize::MAX, Endian::Big).is_err());
        assert!(slice(&data, 2, 2).is_err());
    }

    #[test]
    fn test_writer_matches_reader() {
        for endian in [Endian::Little, Endian::Big] {
            let mut w = Writer::new(endian);
            w.u8(0xab);
            w.u16(0x1234);
            w.u32(0xdead_beef);
            w.u64(0x0102_0304_0506_0708);
            w.i64(-5);
            let bytes = w.into_bytes();
            assert_eq!(bytes.len(), 1 + 2 + 4 + 8 + 8);

            let mut r = Reader::new(&bytes, 0, endian);
            assert_eq!(r.u8().unwrap(), 0xab);
            assert_eq!(r.u16().unwrap(), 0x1234);
            assert_eq!(r.u32().unwrap(), 0xdead_beef);
            assert_eq!(r.u64().unwrap(), 0x0102_0304_0506_0708);
            assert_eq!(r.i64().unwrap(), -5);
            assert_eq!(r.position(), bytes.len());
        }
    }

    #[test]
    fn test_alignment_helpers() {
        assert_eq!(pad_len(0, 4), 0);
        assert_eq!(pad_len(1, 4), 3);
        assert_eq!(pad_len(5, 8), 3);
        assert_eq!(pad_len(7, 1), 0);
        assert_eq!(pad_len(usize::MAX, 4), 1);
        assert_eq!(align_up(0x1001, 0x1000), Some(0x2000));
        assert_eq!(align_up(17, 0), Some(17));
        assert_eq!(align_up(17, 1), Some(17));
        assert_eq!(align_up(16, 8), Some(16));
        assert_eq!(align_up(u64::MAX - 2, 8), None);
    }

    #[test]
    fn test_skip_past_end() {
        let bytes = [0u8; 4];
        let mut r = Reader::new(&bytes, 2, Endian::Little);
        r.skip(usize::MAX);
        assert_eq!(r.position(), usize::MAX);
        assert!(matches!(r.u8(), Err(ElfError::OutOfRange { .. })));
    }

    #[test]
    fn test_pad_to() {
        let mut w = Writer::new(Endian::Little);
        w.bytes(&[1, 2, 3]);
        w.pad_to(8);
        assert_eq!(w.into_bytes(), vec![1, 2, 3, 0, 0, 0, 0, 0]);
    }
}

//! Big-endian cursor over class-file bytes.

use crate::error::{ClassFormatError, Result};

pub(crate) struct ByteReader<'a> {
    data: &'a [u8],
    cursor: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, cursor: 0 }
    }

    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.cursor
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let bytes = self.read_bytes(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        let hi = self.read_u32()? as u64;
        let lo = self.read_u32()? as u64;
        Ok((hi << 32) | lo)
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self.cursor.checked_add(n).filter(|end| *end <= self.data.len());
        let Some(end) = end else {
            return Err(ClassFormatError::Truncated {
                offset: self.cursor,
                needed: n,
                available: self.data.len(),
            });
        };
        let slice = &self.data[self.cursor..end];
        self.cursor = end;
        Ok(slice)
    }

    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.read_bytes(n).map(|_| ())
    }
}

/// Overwrite the big-endian u16 at `offset`.
pub(crate) fn patch_u16(buf: &mut [u8], offset: usize, value: u16) {
    buf[offset..offset + 2].copy_from_slice(&value.to_be_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_big_endian() {
        let data = [0xCA, 0xFE, 0xBA, 0xBE, 0x00, 0x34, 0x07];
        let mut reader = ByteReader::new(&data);
        assert_eq!(reader.read_u32().unwrap(), 0xCAFE_BABE);
        assert_eq!(reader.read_u16().unwrap(), 52);
        assert_eq!(reader.read_u8().unwrap(), 7);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_truncated_read_reports_offset() {
        let data = [0x00, 0x01, 0x02];
        let mut reader = ByteReader::new(&data);
        reader.read_u16().unwrap();
        let err = reader.read_u16().unwrap_err();
        assert_eq!(
            err,
            ClassFormatError::Truncated {
                offset: 2,
                needed: 2,
                available: 3
            }
        );
    }

    #[test]
    fn test_patch_u16() {
        let mut buf = vec![0u8; 4];
        patch_u16(&mut buf, 1, 0xABCD);
        assert_eq!(buf, vec![0x00, 0xAB, 0xCD, 0x00]);
    }
}

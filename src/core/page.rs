// Data page (.exd) decode plus bounds-checked big-endian reads for row factories.
use bytes::Bytes;

use crate::core::error::{Error, ErrorKind};
use crate::core::format::{self, PAGE_FIXED_LEN, PAGE_MAGIC, ROW_POINTER_LEN};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RowPointer {
    pub row_id: u32,
    /// Absolute file offset of the row prefix.
    pub offset: u32,
}

/// One loaded data file. Cloning shares the underlying buffer.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Page {
    data: Bytes,
    data_offset: u16,
}

impl Page {
    pub fn new(data: Bytes, data_offset: u16) -> Self {
        Self { data, data_offset }
    }

    /// Splits a raw page file into its buffer and row-pointer table.
    pub fn decode(data: Bytes, data_offset: u16) -> Result<(Self, Vec<RowPointer>), Error> {
        if data.len() < PAGE_FIXED_LEN {
            return Err(Error::new(ErrorKind::Corrupt).with_message("page too small"));
        }
        if data[0..4] != PAGE_MAGIC {
            return Err(Error::new(ErrorKind::Corrupt).with_message("bad page magic"));
        }
        let index_size = format::read_u32(&data, 8)? as usize;
        if index_size % ROW_POINTER_LEN != 0 {
            return Err(Error::new(ErrorKind::Corrupt)
                .with_message("row index size is not a multiple of pointer size")
                .with_offset(8));
        }
        let index_end = PAGE_FIXED_LEN
            .checked_add(index_size)
            .filter(|end| *end <= data.len())
            .ok_or_else(|| {
                Error::new(ErrorKind::Corrupt)
                    .with_message("row index exceeds page bounds")
                    .with_offset(8)
            })?;

        let pointers = (PAGE_FIXED_LEN..index_end)
            .step_by(ROW_POINTER_LEN)
            .map(|at| {
                Ok(RowPointer {
                    row_id: format::read_u32(&data, at)?,
                    offset: format::read_u32(&data, at + 4)?,
                })
            })
            .collect::<Result<Vec<_>, Error>>()?;

        Ok((Self::new(data, data_offset), pointers))
    }

    pub fn data_offset(&self) -> u16 {
        self.data_offset
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn slice(&self, offset: u32, len: usize) -> Result<&[u8], Error> {
        let start = offset as usize;
        start
            .checked_add(len)
            .and_then(|end| self.data.get(start..end))
            .ok_or_else(|| {
                Error::new(ErrorKind::Corrupt)
                    .with_message(format!("slice of {len} bytes past end of page"))
                    .with_offset(offset as u64)
            })
    }

    pub fn read_u8(&self, offset: u32) -> Result<u8, Error> {
        format::read_u8(&self.data, offset as usize)
    }

    pub fn read_i8(&self, offset: u32) -> Result<i8, Error> {
        Ok(self.read_u8(offset)? as i8)
    }

    pub fn read_bool(&self, offset: u32) -> Result<bool, Error> {
        Ok(self.read_u8(offset)? != 0)
    }

    pub fn read_packed_bool(&self, offset: u32, bit: u8) -> Result<bool, Error> {
        if bit > 7 {
            return Err(Error::new(ErrorKind::Usage)
                .with_message(format!("packed bool bit {bit} out of range")));
        }
        Ok(self.read_u8(offset)? & (1 << bit) != 0)
    }

    pub fn read_u16(&self, offset: u32) -> Result<u16, Error> {
        format::read_u16(&self.data, offset as usize)
    }

    pub fn read_i16(&self, offset: u32) -> Result<i16, Error> {
        Ok(i16::from_be_bytes(format::read_array(&self.data, offset as usize)?))
    }

    pub fn read_u32(&self, offset: u32) -> Result<u32, Error> {
        format::read_u32(&self.data, offset as usize)
    }

    pub fn read_i32(&self, offset: u32) -> Result<i32, Error> {
        Ok(i32::from_be_bytes(format::read_array(&self.data, offset as usize)?))
    }

    pub fn read_u64(&self, offset: u32) -> Result<u64, Error> {
        Ok(u64::from_be_bytes(format::read_array(&self.data, offset as usize)?))
    }

    pub fn read_i64(&self, offset: u32) -> Result<i64, Error> {
        Ok(i64::from_be_bytes(format::read_array(&self.data, offset as usize)?))
    }

    pub fn read_f32(&self, offset: u32) -> Result<f32, Error> {
        Ok(f32::from_be_bytes(format::read_array(&self.data, offset as usize)?))
    }

    /// Raw NUL-terminated string bytes for a string column.
    ///
    /// The column holds a `u32` offset relative to the end of the fixed-size
    /// part of the row starting at `row_offset`.
    pub fn read_string_bytes(&self, offset: u32, row_offset: u32) -> Result<&[u8], Error> {
        let relative = self.read_u32(offset)?;
        let start = (row_offset as usize)
            .checked_add(self.data_offset as usize)
            .and_then(|base| base.checked_add(relative as usize))
            .filter(|start| *start <= self.data.len())
            .ok_or_else(|| {
                Error::new(ErrorKind::Corrupt)
                    .with_message("string offset past end of page")
                    .with_offset(offset as u64)
            })?;
        let tail = &self.data[start..];
        let len = tail.iter().position(|byte| *byte == 0).unwrap_or(tail.len());
        Ok(&tail[..len])
    }
}

#[cfg(test)]
mod tests {
    use super::{Page, RowPointer};
    use crate::core::error::ErrorKind;
    use bytes::Bytes;

    fn page_bytes(pointers: &[(u32, u32)], body: &[u8]) -> Vec<u8> {
        let mut buf = vec![0u8; 32];
        buf[0..4].copy_from_slice(b"EXDF");
        buf[4..6].copy_from_slice(&2u16.to_be_bytes());
        buf[8..12].copy_from_slice(&((pointers.len() * 8) as u32).to_be_bytes());
        buf[12..16].copy_from_slice(&(body.len() as u32).to_be_bytes());
        for (row_id, offset) in pointers {
            buf.extend_from_slice(&row_id.to_be_bytes());
            buf.extend_from_slice(&offset.to_be_bytes());
        }
        buf.extend_from_slice(body);
        buf
    }

    #[test]
    fn decodes_row_pointer_table() {
        let buf = page_bytes(&[(3, 48), (9, 60)], &[0u8; 24]);
        let (page, pointers) = Page::decode(Bytes::from(buf), 4).expect("decode");
        assert_eq!(
            pointers,
            vec![
                RowPointer { row_id: 3, offset: 48 },
                RowPointer { row_id: 9, offset: 60 },
            ]
        );
        assert_eq!(page.data_offset(), 4);
        assert_eq!(page.len(), 32 + 16 + 24);
    }

    #[test]
    fn rejects_bad_pages() {
        let mut buf = page_bytes(&[(1, 40)], &[0u8; 8]);
        buf[0] = b'Z';
        let err = Page::decode(Bytes::from(buf), 0).expect_err("magic");
        assert_eq!(err.kind(), ErrorKind::Corrupt);

        let mut buf = page_bytes(&[(1, 40)], &[]);
        buf[8..12].copy_from_slice(&64u32.to_be_bytes());
        let err = Page::decode(Bytes::from(buf), 0).expect_err("index overflow");
        assert_eq!(err.kind(), ErrorKind::Corrupt);

        let mut buf = page_bytes(&[(1, 40)], &[]);
        buf[8..12].copy_from_slice(&7u32.to_be_bytes());
        let err = Page::decode(Bytes::from(buf), 0).expect_err("misaligned");
        assert_eq!(err.kind(), ErrorKind::Corrupt);
    }

    #[test]
    fn primitive_reads() {
        let body = [
            0xFF, 0xFE, // i16 -2
            0x3F, 0x80, 0x00, 0x00, // f32 1.0
            0b0000_0101, // packed bools
            0x00, 0x00, 0x00, 0x02, // string offset 2
            b'h', b'i', 0x00,
        ];
        let page = Page::new(Bytes::copy_from_slice(&body), 9);
        assert_eq!(page.read_i16(0).expect("i16"), -2);
        assert_eq!(page.read_f32(2).expect("f32"), 1.0);
        assert!(page.read_packed_bool(6, 0).expect("bit0"));
        assert!(!page.read_packed_bool(6, 1).expect("bit1"));
        assert!(page.read_packed_bool(6, 2).expect("bit2"));
        assert_eq!(page.read_string_bytes(7, 0).expect("string"), b"hi");

        let err = page.read_u64(10).expect_err("past end");
        assert_eq!(err.kind(), ErrorKind::Corrupt);
        let err = page.read_packed_bool(6, 8).expect_err("bit");
        assert_eq!(err.kind(), ErrorKind::Usage);
    }
}

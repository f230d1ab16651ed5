// Sheet header (.exh) layout decode: columns, page ranges, languages, and column hash.
use serde::Serialize;

use crate::core::error::{Error, ErrorKind};
use crate::core::format::{
    self, COLUMN_DEF_LEN, HEADER_FIXED_LEN, HEADER_MAGIC, LANGUAGE_DEF_LEN, Language,
    PAGE_DEF_LEN,
};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    Default,
    Subrows,
}

impl Variant {
    fn from_u8(value: u8) -> Result<Self, Error> {
        match value {
            1 => Ok(Variant::Default),
            2 => Ok(Variant::Subrows),
            _ => Err(Error::new(ErrorKind::Corrupt)
                .with_message(format!("unknown sheet variant {value}"))),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    String,
    Bool,
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Float32,
    Int64,
    UInt64,
    PackedBool(u8),
    Unknown(u16),
}

impl ColumnKind {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0x0 => ColumnKind::String,
            0x1 => ColumnKind::Bool,
            0x2 => ColumnKind::Int8,
            0x3 => ColumnKind::UInt8,
            0x4 => ColumnKind::Int16,
            0x5 => ColumnKind::UInt16,
            0x6 => ColumnKind::Int32,
            0x7 => ColumnKind::UInt32,
            0x9 => ColumnKind::Float32,
            0xA => ColumnKind::Int64,
            0xB => ColumnKind::UInt64,
            0x19..=0x20 => ColumnKind::PackedBool((value - 0x19) as u8),
            other => ColumnKind::Unknown(other),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct ColumnDefinition {
    pub kind: ColumnKind,
    pub offset: u16,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct PageDefinition {
    pub start_id: u32,
    pub row_count: u32,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct SheetHeader {
    pub version: u16,
    /// Width of the fixed-size part of each row (or subrow).
    pub data_offset: u16,
    pub variant: Variant,
    pub row_count: u32,
    pub columns: Vec<ColumnDefinition>,
    pub pages: Vec<PageDefinition>,
    pub languages: Vec<Language>,
    pub column_hash: u32,
}

impl SheetHeader {
    pub fn decode(buf: &[u8]) -> Result<Self, Error> {
        if buf.len() < HEADER_FIXED_LEN {
            return Err(Error::new(ErrorKind::Corrupt).with_message("header too small"));
        }
        if buf[0..4] != HEADER_MAGIC {
            return Err(Error::new(ErrorKind::Corrupt).with_message("bad header magic"));
        }
        let version = format::read_u16(buf, 4)?;
        let data_offset = format::read_u16(buf, 6)?;
        let column_count = format::read_u16(buf, 8)? as usize;
        let page_count = format::read_u16(buf, 10)? as usize;
        let language_count = format::read_u16(buf, 12)? as usize;
        let variant = Variant::from_u8(format::read_u8(buf, 17)?)?;
        let row_count = format::read_u32(buf, 20)?;

        let columns_start = HEADER_FIXED_LEN;
        let pages_start = columns_start + column_count * COLUMN_DEF_LEN;
        let languages_start = pages_start + page_count * PAGE_DEF_LEN;
        let end = languages_start + language_count * LANGUAGE_DEF_LEN;
        if buf.len() < end {
            return Err(Error::new(ErrorKind::Corrupt)
                .with_message("header tables truncated")
                .with_offset(buf.len() as u64));
        }

        let columns = (0..column_count)
            .map(|idx| {
                let at = columns_start + idx * COLUMN_DEF_LEN;
                Ok(ColumnDefinition {
                    kind: ColumnKind::from_u16(format::read_u16(buf, at)?),
                    offset: format::read_u16(buf, at + 2)?,
                })
            })
            .collect::<Result<Vec<_>, Error>>()?;

        let pages = (0..page_count)
            .map(|idx| {
                let at = pages_start + idx * PAGE_DEF_LEN;
                Ok(PageDefinition {
                    start_id: format::read_u32(buf, at)?,
                    row_count: format::read_u32(buf, at + 4)?,
                })
            })
            .collect::<Result<Vec<_>, Error>>()?;

        // Language entries are a single byte followed by padding.
        let mut languages = Vec::with_capacity(language_count);
        for idx in 0..language_count {
            let at = languages_start + idx * LANGUAGE_DEF_LEN;
            let raw = format::read_u8(buf, at)?;
            let language = Language::from_u8(raw).ok_or_else(|| {
                Error::new(ErrorKind::Corrupt)
                    .with_message(format!("unknown language id {raw}"))
                    .with_offset(at as u64)
            })?;
            languages.push(language);
        }

        let column_hash = crc32fast::hash(&buf[columns_start..pages_start]);

        Ok(Self {
            version,
            data_offset,
            variant,
            row_count,
            columns,
            pages,
            languages,
            column_hash,
        })
    }

    pub fn has_subrows(&self) -> bool {
        self.variant == Variant::Subrows
    }

    /// Requested language when declared, otherwise the language-neutral pages.
    pub fn resolve_language(&self, requested: Language) -> Language {
        if self.languages.contains(&requested) {
            requested
        } else {
            Language::None
        }
    }
}

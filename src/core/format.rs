//! Purpose: Centralize on-disk constants, file naming, and language codes for sheet data.
//! Exports: magic/size constants, `Language`, path builders, big-endian read helpers.
//! Role: Shared policy for header, page, and list decoders plus the registry.
//! Invariants: All multi-byte integers in `.exh`/`.exd` files are big-endian.
//! Invariants: Language codes and file suffixes are stable across data versions.

use serde::Serialize;

use crate::core::error::{Error, ErrorKind};

pub const HEADER_MAGIC: [u8; 4] = *b"EXHF";
pub const PAGE_MAGIC: [u8; 4] = *b"EXDF";
pub const LIST_MAGIC: &str = "EXLT";

pub const HEADER_FIXED_LEN: usize = 32;
pub const PAGE_FIXED_LEN: usize = 32;
pub const COLUMN_DEF_LEN: usize = 4;
pub const PAGE_DEF_LEN: usize = 8;
pub const LANGUAGE_DEF_LEN: usize = 2;
pub const ROW_POINTER_LEN: usize = 8;

/// Bytes before row data: `u32` data size then `u16` subrow count.
pub const ROW_PREFIX_LEN: u32 = 6;
pub const ROW_SUBROW_COUNT_OFFSET: u32 = 4;
/// Each subrow starts with a `u16` id prefix.
pub const SUBROW_PREFIX_LEN: u32 = 2;

pub const ROOT_LIST_PATH: &str = "exd/root.exl";

#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    #[default]
    None,
    Japanese,
    English,
    German,
    French,
    ChineseSimplified,
    ChineseTraditional,
    Korean,
}

impl Language {
    pub const ALL: [Language; 8] = [
        Language::None,
        Language::Japanese,
        Language::English,
        Language::German,
        Language::French,
        Language::ChineseSimplified,
        Language::ChineseTraditional,
        Language::Korean,
    ];

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Language::None),
            1 => Some(Language::Japanese),
            2 => Some(Language::English),
            3 => Some(Language::German),
            4 => Some(Language::French),
            5 => Some(Language::ChineseSimplified),
            6 => Some(Language::ChineseTraditional),
            7 => Some(Language::Korean),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// File-name suffix; empty for `None`.
    pub fn code(self) -> &'static str {
        match self {
            Language::None => "",
            Language::Japanese => "ja",
            Language::English => "en",
            Language::German => "de",
            Language::French => "fr",
            Language::ChineseSimplified => "chs",
            Language::ChineseTraditional => "cht",
            Language::Korean => "ko",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.trim().to_ascii_lowercase();
        if code.is_empty() || code == "none" {
            return Some(Language::None);
        }
        Language::ALL
            .into_iter()
            .find(|language| language.code() == code)
    }
}

pub fn header_path(sheet: &str) -> String {
    format!("exd/{sheet}.exh")
}

pub fn page_path(sheet: &str, start_id: u32, language: Language) -> String {
    match language {
        Language::None => format!("exd/{sheet}_{start_id}.exd"),
        _ => format!("exd/{sheet}_{start_id}_{}.exd", language.code()),
    }
}

pub(crate) fn read_u8(buf: &[u8], offset: usize) -> Result<u8, Error> {
    buf.get(offset).copied().ok_or_else(|| short_read(offset, 1))
}

pub(crate) fn read_u16(buf: &[u8], offset: usize) -> Result<u16, Error> {
    Ok(u16::from_be_bytes(read_array(buf, offset)?))
}

pub(crate) fn read_u32(buf: &[u8], offset: usize) -> Result<u32, Error> {
    Ok(u32::from_be_bytes(read_array(buf, offset)?))
}

pub(crate) fn read_array<const N: usize>(buf: &[u8], offset: usize) -> Result<[u8; N], Error> {
    let end = offset.checked_add(N).ok_or_else(|| short_read(offset, N))?;
    let slice = buf.get(offset..end).ok_or_else(|| short_read(offset, N))?;
    let mut out = [0u8; N];
    out.copy_from_slice(slice);
    Ok(out)
}

fn short_read(offset: usize, len: usize) -> Error {
    Error::new(ErrorKind::Corrupt)
        .with_message(format!("read of {len} bytes past end of buffer"))
        .with_offset(offset as u64)
}

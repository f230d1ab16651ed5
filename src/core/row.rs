// Row factory traits and the untyped row used by the registry and tools.
use std::any::TypeId;

use crate::core::error::{Error, ErrorKind};
use crate::core::page::Page;

/// Builds a row value from its position in a page.
///
/// Implementations must be cheap and side-effect free: they run on every
/// lookup, from any thread, and the sheet never caches their output.
pub trait Row: Sized + 'static {
    /// `subrow_id` is always 0 for sheets without subrows.
    fn create(page: &Page, offset: u32, row_id: u32, subrow_id: u16) -> Self;
}

/// A row type bound to a named sheet with an expected column layout.
pub trait NamedRow: Row {
    const SHEET: &'static str;
    /// `None` skips the column-hash check.
    const COLUMN_HASH: Option<u32> = None;
}

/// Identity tag for a row type, used by type-erased references.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct RowType {
    id: TypeId,
    sheet: &'static str,
}

impl RowType {
    pub fn of<R: NamedRow>() -> Self {
        Self {
            id: TypeId::of::<R>(),
            sheet: R::SHEET,
        }
    }

    pub fn sheet(&self) -> &'static str {
        self.sheet
    }

    pub fn is<R: 'static>(&self) -> bool {
        self.id == TypeId::of::<R>()
    }
}

/// Positional handle to a row with no schema attached.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RawRow {
    page: Page,
    offset: u32,
    row_id: u32,
    subrow_id: u16,
}

impl Row for RawRow {
    fn create(page: &Page, offset: u32, row_id: u32, subrow_id: u16) -> Self {
        Self {
            page: page.clone(),
            offset,
            row_id,
            subrow_id,
        }
    }
}

impl RawRow {
    pub fn row_id(&self) -> u32 {
        self.row_id
    }

    pub fn subrow_id(&self) -> u16 {
        self.subrow_id
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Fixed-size column block of this row (or subrow).
    pub fn fixed_data(&self) -> Result<&[u8], Error> {
        self.page
            .slice(self.offset, self.page.data_offset() as usize)
            .map_err(|err| err.with_row(self.row_id))
    }

    pub fn read_u8(&self, column_offset: u16) -> Result<u8, Error> {
        self.page.read_u8(self.at(column_offset)?)
    }

    pub fn read_u16(&self, column_offset: u16) -> Result<u16, Error> {
        self.page.read_u16(self.at(column_offset)?)
    }

    pub fn read_u32(&self, column_offset: u16) -> Result<u32, Error> {
        self.page.read_u32(self.at(column_offset)?)
    }

    pub fn read_i32(&self, column_offset: u16) -> Result<i32, Error> {
        self.page.read_i32(self.at(column_offset)?)
    }

    pub fn read_string_bytes(&self, column_offset: u16) -> Result<&[u8], Error> {
        self.page
            .read_string_bytes(self.at(column_offset)?, self.offset)
    }

    fn at(&self, column_offset: u16) -> Result<u32, Error> {
        self.offset.checked_add(column_offset as u32).ok_or_else(|| {
            Error::new(ErrorKind::Corrupt)
                .with_message("column offset overflows")
                .with_row(self.row_id)
        })
    }
}

//! Purpose: Immutable, lazily-materializing view over one sheet in one language.
//! Exports: `Sheet`, `Rows`, `Entries`, `Subrows`, `RowSubrows`.
//! Role: Composes loaded pages, the merged row index, and a `Row` factory.
//! Invariants: Pages and index are built once in `open` and never change afterwards.
//! Invariants: Rows are re-created from page bytes on every access; nothing is cached.
//! Invariants: Subrow operations fail with `Unsupported` on sheets without subrows.
//! Invariants: Positional and id-based access agree for every index in `keys()`.

use std::fmt;
use std::iter::FusedIterator;
use std::marker::PhantomData;

use tracing::debug;

use crate::core::error::{self, Error, ErrorKind};
use crate::core::format::{self, Language, SUBROW_PREFIX_LEN};
use crate::core::header::{ColumnDefinition, SheetHeader};
use crate::core::index::{RowIndex, RowIndexBuilder, RowLookup};
use crate::core::page::Page;
use crate::core::row::Row;
use crate::core::source::FileSource;

pub struct Sheet<R: Row> {
    name: String,
    language: Language,
    has_subrows: bool,
    subrow_data_width: u16,
    header: SheetHeader,
    pages: Vec<Page>,
    index: RowIndex,
    _row: PhantomData<fn() -> R>,
}

impl<R: Row> Sheet<R> {
    /// Loads the header and every available page for `language`.
    ///
    /// Fails with `Config` when the sheet header does not exist or its column
    /// hash differs from `column_hash`. Missing page files are skipped.
    pub fn open(
        source: &dyn FileSource,
        name: &str,
        language: Language,
        column_hash: Option<u32>,
    ) -> Result<Self, Error> {
        let header = load_header(source, name)?;
        if let Some(expected) = column_hash {
            if header.column_hash != expected {
                return Err(Error::new(ErrorKind::Config)
                    .with_message(format!(
                        "column hash mismatch: expected {expected:#010x}, found {:#010x}",
                        header.column_hash
                    ))
                    .with_sheet(name)
                    .with_hint("The row type was generated for a different data version."));
            }
        }
        Self::from_header(source, name, &header, language)
    }

    pub(crate) fn from_header(
        source: &dyn FileSource,
        name: &str,
        header: &SheetHeader,
        requested: Language,
    ) -> Result<Self, Error> {
        let language = header.resolve_language(requested);
        let has_subrows = header.has_subrows();

        let mut pages = Vec::with_capacity(header.pages.len());
        let mut builder = RowIndexBuilder::new(has_subrows);
        for definition in &header.pages {
            let path = format::page_path(name, definition.start_id, language);
            let Some(bytes) = source.read(&path)? else {
                debug!(sheet = name, path = %path, "page file missing; skipping");
                continue;
            };
            let (page, pointers) = Page::decode(bytes, header.data_offset)
                .map_err(|err| err.with_sheet(name).with_path(&path))?;
            builder
                .push_page(pages.len(), &page, &pointers)
                .map_err(|err| err.with_sheet(name).with_path(&path))?;
            pages.push(page);
        }

        let (index, stats) = builder.finish();
        if stats.empty_rows > 0 {
            debug!(sheet = name, dropped = stats.empty_rows, "rows without subrows dropped");
        }
        if stats.duplicates > 0 {
            debug!(sheet = name, duplicates = stats.duplicates, "duplicate row ids merged");
        }
        debug!(
            sheet = name,
            language = ?language,
            rows = index.len(),
            pages = pages.len(),
            "sheet loaded"
        );

        Ok(Self {
            name: name.to_string(),
            language,
            has_subrows,
            subrow_data_width: if has_subrows { header.data_offset } else { 0 },
            header: header.clone(),
            pages,
            index,
            _row: PhantomData,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Effective language; `None` when the requested one was not declared.
    pub fn language(&self) -> Language {
        self.language
    }

    pub fn has_subrows(&self) -> bool {
        self.has_subrows
    }

    pub fn column_hash(&self) -> u32 {
        self.header.column_hash
    }

    /// Header the sheet was opened from.
    pub fn header(&self) -> &SheetHeader {
        &self.header
    }

    pub fn columns(&self) -> &[ColumnDefinition] {
        &self.header.columns
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Number of row ids; subrows are not counted.
    pub fn count(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn keys(&self) -> &[u32] {
        self.index.keys()
    }

    pub fn index_of_row(&self, row_id: u32) -> Option<usize> {
        self.index.index_of(row_id)
    }

    pub fn has_row(&self, row_id: u32) -> bool {
        self.index_of_row(row_id).is_some()
    }

    pub fn lookup(&self, row_id: u32) -> Option<RowLookup> {
        self.index.find(row_id)
    }

    /// The row, or its first subrow on subrow sheets.
    pub fn try_get_row(&self, row_id: u32) -> Option<R> {
        let index = self.index_of_row(row_id)?;
        Some(self.create_at(index, 0))
    }

    pub fn get_row(&self, row_id: u32) -> Result<R, Error> {
        self.try_get_row(row_id)
            .ok_or_else(|| error::row_out_of_range(&self.name, row_id))
    }

    pub fn row_at(&self, index: usize) -> Option<R> {
        (index < self.count()).then(|| self.create_at(index, 0))
    }

    pub fn get_row_at(&self, index: usize) -> Result<R, Error> {
        self.row_at(index).ok_or_else(|| {
            Error::new(ErrorKind::OutOfRange)
                .with_message(format!("index {index} out of range (count {})", self.count()))
                .with_sheet(&self.name)
        })
    }

    pub fn has_subrow(&self, row_id: u32, subrow_id: u16) -> Result<bool, Error> {
        self.require_subrows()?;
        Ok(self
            .lookup(row_id)
            .is_some_and(|lookup| subrow_id < lookup.subrow_count))
    }

    pub fn try_get_subrow_count(&self, row_id: u32) -> Result<Option<u16>, Error> {
        self.require_subrows()?;
        Ok(self.lookup(row_id).map(|lookup| lookup.subrow_count))
    }

    pub fn get_subrow_count(&self, row_id: u32) -> Result<u16, Error> {
        self.try_get_subrow_count(row_id)?
            .ok_or_else(|| error::row_out_of_range(&self.name, row_id))
    }

    pub fn try_get_subrow(&self, row_id: u32, subrow_id: u16) -> Result<Option<R>, Error> {
        self.require_subrows()?;
        let Some(index) = self.index_of_row(row_id) else {
            return Ok(None);
        };
        if subrow_id >= self.index.lookups()[index].subrow_count {
            return Ok(None);
        }
        Ok(Some(self.create_at(index, subrow_id)))
    }

    pub fn get_subrow(&self, row_id: u32, subrow_id: u16) -> Result<R, Error> {
        self.require_subrows()?;
        let index = self
            .index_of_row(row_id)
            .ok_or_else(|| error::row_out_of_range(&self.name, row_id))?;
        let count = self.index.lookups()[index].subrow_count;
        if subrow_id >= count {
            return Err(Error::new(ErrorKind::OutOfRange)
                .with_message(format!("subrow {subrow_id} out of range (count {count})"))
                .with_sheet(&self.name)
                .with_row(row_id));
        }
        Ok(self.create_at(index, subrow_id))
    }

    /// One value per row id in key order (first subrow on subrow sheets).
    pub fn iter(&self) -> Rows<'_, R> {
        Rows {
            sheet: self,
            next: 0,
        }
    }

    pub fn entries(&self) -> Entries<'_, R> {
        Entries {
            sheet: self,
            next: 0,
        }
    }

    /// Every subrow of every row, grouped by row id in key order.
    pub fn subrows(&self) -> Result<Subrows<'_, R>, Error> {
        self.require_subrows()?;
        Ok(Subrows {
            sheet: self,
            index: 0,
            subrow: 0,
        })
    }

    /// The subrows of one row, or `None` if the row does not exist.
    pub fn subrows_of(&self, row_id: u32) -> Result<Option<RowSubrows<'_, R>>, Error> {
        self.require_subrows()?;
        Ok(self.index_of_row(row_id).map(|index| RowSubrows {
            sheet: self,
            index,
            next: 0,
            count: self.index.lookups()[index].subrow_count,
        }))
    }

    fn require_subrows(&self) -> Result<(), Error> {
        if self.has_subrows {
            Ok(())
        } else {
            Err(error::subrows_unsupported(&self.name))
        }
    }

    // `index` must be below `count()`; `subrow_id` below the row's subrow count.
    fn create_at(&self, index: usize, subrow_id: u16) -> R {
        let row_id = self.index.keys()[index];
        let lookup = self.index.lookups()[index];
        let page = &self.pages[lookup.page];
        if self.has_subrows {
            R::create(page, self.subrow_offset(lookup, subrow_id), row_id, subrow_id)
        } else {
            R::create(page, lookup.offset, row_id, 0)
        }
    }

    fn subrow_offset(&self, lookup: RowLookup, subrow_id: u16) -> u32 {
        let stride = self.subrow_data_width as u32 + SUBROW_PREFIX_LEN;
        lookup
            .offset
            .saturating_add(SUBROW_PREFIX_LEN)
            .saturating_add((subrow_id as u32).saturating_mul(stride))
    }
}

impl<R: Row> fmt::Debug for Sheet<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sheet")
            .field("name", &self.name)
            .field("language", &self.language)
            .field("has_subrows", &self.has_subrows)
            .field("rows", &self.index.len())
            .field("pages", &self.pages.len())
            .finish()
    }
}

impl<'a, R: Row> IntoIterator for &'a Sheet<R> {
    type Item = R;
    type IntoIter = Rows<'a, R>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

fn load_header(source: &dyn FileSource, name: &str) -> Result<SheetHeader, Error> {
    let path = format::header_path(name);
    let bytes = source.read(&path)?.ok_or_else(|| {
        Error::new(ErrorKind::Config)
            .with_message("invalid sheet name")
            .with_sheet(name)
            .with_path(&path)
    })?;
    SheetHeader::decode(&bytes).map_err(|err| err.with_sheet(name).with_path(&path))
}

pub(crate) fn read_header(source: &dyn FileSource, name: &str) -> Result<SheetHeader, Error> {
    load_header(source, name)
}

pub struct Rows<'a, R: Row> {
    sheet: &'a Sheet<R>,
    next: usize,
}

impl<R: Row> Clone for Rows<'_, R> {
    fn clone(&self) -> Self {
        Self {
            sheet: self.sheet,
            next: self.next,
        }
    }
}

impl<R: Row> Iterator for Rows<'_, R> {
    type Item = R;

    fn next(&mut self) -> Option<R> {
        let row = self.sheet.row_at(self.next)?;
        self.next += 1;
        Some(row)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.sheet.count().saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl<R: Row> ExactSizeIterator for Rows<'_, R> {}
impl<R: Row> FusedIterator for Rows<'_, R> {}

pub struct Entries<'a, R: Row> {
    sheet: &'a Sheet<R>,
    next: usize,
}

impl<R: Row> Clone for Entries<'_, R> {
    fn clone(&self) -> Self {
        Self {
            sheet: self.sheet,
            next: self.next,
        }
    }
}

impl<R: Row> Iterator for Entries<'_, R> {
    type Item = (u32, R);

    fn next(&mut self) -> Option<(u32, R)> {
        let row = self.sheet.row_at(self.next)?;
        let row_id = self.sheet.keys()[self.next];
        self.next += 1;
        Some((row_id, row))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.sheet.count().saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl<R: Row> ExactSizeIterator for Entries<'_, R> {}
impl<R: Row> FusedIterator for Entries<'_, R> {}

pub struct Subrows<'a, R: Row> {
    sheet: &'a Sheet<R>,
    index: usize,
    subrow: u16,
}

impl<R: Row> Clone for Subrows<'_, R> {
    fn clone(&self) -> Self {
        Self {
            sheet: self.sheet,
            index: self.index,
            subrow: self.subrow,
        }
    }
}

impl<R: Row> Iterator for Subrows<'_, R> {
    type Item = R;

    fn next(&mut self) -> Option<R> {
        loop {
            let lookup = self.sheet.index.lookups().get(self.index)?;
            if self.subrow < lookup.subrow_count {
                let row = self.sheet.create_at(self.index, self.subrow);
                self.subrow += 1;
                return Some(row);
            }
            self.index += 1;
            self.subrow = 0;
        }
    }
}

impl<R: Row> FusedIterator for Subrows<'_, R> {}

pub struct RowSubrows<'a, R: Row> {
    sheet: &'a Sheet<R>,
    index: usize,
    next: u16,
    count: u16,
}

impl<R: Row> RowSubrows<'_, R> {
    pub fn row_id(&self) -> u32 {
        self.sheet.keys()[self.index]
    }

    pub fn subrow_count(&self) -> u16 {
        self.count
    }

    pub fn get(&self, subrow_id: u16) -> Option<R> {
        (subrow_id < self.count).then(|| self.sheet.create_at(self.index, subrow_id))
    }
}

impl<R: Row> Clone for RowSubrows<'_, R> {
    fn clone(&self) -> Self {
        Self {
            sheet: self.sheet,
            index: self.index,
            next: self.next,
            count: self.count,
        }
    }
}

impl<R: Row> Iterator for RowSubrows<'_, R> {
    type Item = R;

    fn next(&mut self) -> Option<R> {
        let row = self.get(self.next)?;
        self.next += 1;
        Some(row)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.count - self.next) as usize;
        (remaining, Some(remaining))
    }
}

impl<R: Row> ExactSizeIterator for RowSubrows<'_, R> {}
impl<R: Row> FusedIterator for RowSubrows<'_, R> {}

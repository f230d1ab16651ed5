//! Purpose: Merge per-page row-pointer tables into one sorted, immutable row index.
//! Exports: `RowLookup`, `RowIndex`, `RowIndexBuilder`.
//! Role: The only lookup structure behind `Sheet`; built once at sheet construction.
//! Invariants: Keys are strictly ascending and `keys.len() == lookups.len()`.
//! Invariants: Non-subrow entries always carry `subrow_count == 1`.
//! Invariants: Subrow entries with a zero subrow count are never indexed.
//! Invariants: For a row id declared by several pages, the first-declared page wins.

use crate::core::error::{Error, ErrorKind};
use crate::core::format::{ROW_PREFIX_LEN, ROW_SUBROW_COUNT_OFFSET};
use crate::core::page::{Page, RowPointer};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RowLookup {
    pub page: usize,
    /// First byte of row data, past the row prefix.
    pub offset: u32,
    pub subrow_count: u16,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RowIndex {
    keys: Box<[u32]>,
    lookups: Box<[RowLookup]>,
}

impl RowIndex {
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> &[u32] {
        &self.keys
    }

    pub fn lookups(&self) -> &[RowLookup] {
        &self.lookups
    }

    pub fn index_of(&self, row_id: u32) -> Option<usize> {
        self.keys.binary_search(&row_id).ok()
    }

    pub fn get(&self, index: usize) -> Option<(u32, RowLookup)> {
        Some((*self.keys.get(index)?, *self.lookups.get(index)?))
    }

    pub fn find(&self, row_id: u32) -> Option<RowLookup> {
        self.index_of(row_id).map(|index| self.lookups[index])
    }
}

#[derive(Debug, Default, Eq, PartialEq)]
pub struct BuildStats {
    pub pointers: usize,
    pub empty_rows: usize,
    pub duplicates: usize,
}

#[derive(Debug)]
pub struct RowIndexBuilder {
    has_subrows: bool,
    entries: Vec<(u32, RowLookup)>,
    stats: BuildStats,
}

impl RowIndexBuilder {
    pub fn new(has_subrows: bool) -> Self {
        Self {
            has_subrows,
            entries: Vec::new(),
            stats: BuildStats::default(),
        }
    }

    /// Adds every row of one loaded page, in table order.
    pub fn push_page(
        &mut self,
        page_index: usize,
        page: &Page,
        pointers: &[RowPointer],
    ) -> Result<(), Error> {
        self.entries.reserve(pointers.len());
        for pointer in pointers {
            self.stats.pointers += 1;
            let count_at = pointer.offset.checked_add(ROW_SUBROW_COUNT_OFFSET);
            let row_offset = pointer.offset.checked_add(ROW_PREFIX_LEN);
            let (Some(count_at), Some(row_offset)) = (count_at, row_offset) else {
                return Err(Error::new(ErrorKind::Corrupt)
                    .with_message("row offset overflows")
                    .with_row(pointer.row_id)
                    .with_offset(pointer.offset as u64));
            };
            let subrow_count = page
                .read_u16(count_at)
                .map_err(|err| err.with_row(pointer.row_id))?;

            let subrow_count = if self.has_subrows {
                if subrow_count == 0 {
                    self.stats.empty_rows += 1;
                    continue;
                }
                subrow_count
            } else {
                1
            };

            self.entries.push((
                pointer.row_id,
                RowLookup {
                    page: page_index,
                    offset: row_offset,
                    subrow_count,
                },
            ));
        }
        Ok(())
    }

    pub fn finish(self) -> (RowIndex, BuildStats) {
        let Self {
            mut entries,
            mut stats,
            ..
        } = self;

        // Reversed then stably sorted: within a run of equal ids the
        // first-declared entry ends up last, and the merge keeps it.
        entries.reverse();
        entries.sort_by_key(|(row_id, _)| *row_id);

        let mut keys = Vec::with_capacity(entries.len());
        let mut lookups: Vec<RowLookup> = Vec::with_capacity(entries.len());
        for (row_id, lookup) in entries {
            if keys.last() == Some(&row_id) {
                stats.duplicates += 1;
                if let Some(last) = lookups.last_mut() {
                    *last = lookup;
                }
                continue;
            }
            keys.push(row_id);
            lookups.push(lookup);
        }

        let index = RowIndex {
            keys: keys.into_boxed_slice(),
            lookups: lookups.into_boxed_slice(),
        };
        (index, stats)
    }
}

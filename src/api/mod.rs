//! Purpose: Define the stable public Rust API boundary for exdview.
//! Exports: Sheet views, the registry, row traits, sources, and errors.
//! Role: Public, additive-only surface; decoder internals stay under `core`.
//! Invariants: Every type a caller needs to open and query sheets is re-exported here.

#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::error::{Error, ErrorKind};
pub use crate::core::format::Language;
pub use crate::core::header::{ColumnDefinition, ColumnKind, PageDefinition, SheetHeader, Variant};
pub use crate::core::index::RowLookup;
pub use crate::core::list::{SheetEntry, SheetList};
pub use crate::core::module::{Module, ModuleOptions};
pub use crate::core::page::Page;
pub use crate::core::row::{NamedRow, RawRow, Row, RowType};
pub use crate::core::row_ref::{RowRef, TypedRowRef};
pub use crate::core::sheet::{Entries, RowSubrows, Rows, Sheet, Subrows};
pub use crate::core::source::{DirectorySource, FileSource, MemorySource};

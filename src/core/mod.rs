// Core modules: on-disk decoding, row index, sheet views, and the registry.
pub mod error;
#[cfg(test)]
pub(crate) mod fixture;
pub mod format;
pub mod header;
pub mod index;
pub mod list;
pub mod module;
pub mod page;
pub mod row;
pub mod row_ref;
pub mod sheet;
pub mod source;

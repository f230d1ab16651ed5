//! Purpose: Read-only access to paginated binary sheet data (`.exh`/`.exd`).
//! Exports: `api` (stable surface) and `core` (decoders, index, sheet views).
//! Role: Library backing the `exdview` CLI and embedding tools.
//! Invariants: Sheets are immutable after construction and safe to share across threads.
//! Invariants: Malformed input surfaces as `Error`, never as a panic.
pub mod api;
pub mod core;

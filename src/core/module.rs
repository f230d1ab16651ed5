//! Purpose: Sheet registry that opens, caches, and hands out shared sheet views.
//! Exports: `Module`, `ModuleOptions`.
//! Role: Owns the file source; resolves row types and sheet names to `Arc<Sheet<_>>`.
//! Invariants: Cached handles are immutable; the cache stores sheets, never rows.
//! Invariants: The cache lock is never held while a sheet is being built.
//! Invariants: Name-based probing is best-effort and never surfaces per-sheet errors.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

use crate::core::error::{Error, ErrorKind};
use crate::core::format::{self, Language};
use crate::core::header::SheetHeader;
use crate::core::list::SheetList;
use crate::core::row::{NamedRow, RawRow, Row};
use crate::core::sheet::{self, Sheet};
use crate::core::source::FileSource;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ModuleOptions {
    pub default_language: Language,
}

impl ModuleOptions {
    pub fn new(default_language: Language) -> Self {
        Self { default_language }
    }
}

type AnySheet = Arc<dyn Any + Send + Sync>;

pub struct Module {
    source: Arc<dyn FileSource>,
    options: ModuleOptions,
    typed: Mutex<HashMap<(TypeId, Language), AnySheet>>,
    raw: Mutex<HashMap<(String, Language), Arc<Sheet<RawRow>>>>,
}

impl Module {
    pub fn new(source: impl FileSource + 'static, options: ModuleOptions) -> Self {
        Self::from_shared(Arc::new(source), options)
    }

    pub fn from_shared(source: Arc<dyn FileSource>, options: ModuleOptions) -> Self {
        Self {
            source,
            options,
            typed: Mutex::new(HashMap::new()),
            raw: Mutex::new(HashMap::new()),
        }
    }

    pub fn options(&self) -> ModuleOptions {
        self.options
    }

    pub fn language(&self) -> Language {
        self.options.default_language
    }

    pub fn source(&self) -> &dyn FileSource {
        self.source.as_ref()
    }

    pub fn header(&self, name: &str) -> Result<SheetHeader, Error> {
        sheet::read_header(self.source(), name)
    }

    pub fn sheet_list(&self) -> Result<SheetList, Error> {
        let bytes = self.source.read(format::ROOT_LIST_PATH)?.ok_or_else(|| {
            Error::new(ErrorKind::NotFound)
                .with_message("sheet list not found")
                .with_path(format::ROOT_LIST_PATH)
                .with_hint("Point --dir at a directory containing exd/root.exl.")
        })?;
        SheetList::decode(&bytes).map_err(|err| err.with_path(format::ROOT_LIST_PATH))
    }

    pub fn sheet_names(&self) -> Result<Vec<String>, Error> {
        Ok(self
            .sheet_list()?
            .entries
            .into_iter()
            .map(|entry| entry.name)
            .collect())
    }

    /// Typed sheet in the default language, column hash checked.
    pub fn sheet<R: NamedRow>(&self) -> Result<Arc<Sheet<R>>, Error> {
        self.sheet_in::<R>(self.options.default_language)
    }

    pub fn sheet_in<R: NamedRow>(&self, language: Language) -> Result<Arc<Sheet<R>>, Error> {
        let key = (TypeId::of::<R>(), language);
        if let Some(cached) = lock(&self.typed).get(&key).cloned() {
            if let Ok(sheet) = cached.downcast::<Sheet<R>>() {
                return Ok(sheet);
            }
        }

        let sheet = Arc::new(self.open_sheet::<R>(R::SHEET, language, R::COLUMN_HASH)?);
        let entry = lock(&self.typed)
            .entry(key)
            .or_insert_with(|| sheet.clone() as AnySheet)
            .clone();
        Ok(entry.downcast::<Sheet<R>>().unwrap_or(sheet))
    }

    /// Untyped sheet by name; no column hash check.
    pub fn raw_sheet(&self, name: &str, language: Language) -> Result<Arc<Sheet<RawRow>>, Error> {
        let key = (name.to_string(), language);
        if let Some(cached) = lock(&self.raw).get(&key) {
            return Ok(cached.clone());
        }

        let sheet = Arc::new(self.open_sheet::<RawRow>(name, language, None)?);
        Ok(lock(&self.raw).entry(key).or_insert(sheet).clone())
    }

    /// Uncached construction with an explicit name and expected column hash.
    pub fn open_sheet<R: Row>(
        &self,
        name: &str,
        language: Language,
        column_hash: Option<u32>,
    ) -> Result<Sheet<R>, Error> {
        Sheet::open(self.source(), name, language, column_hash)
    }

    /// First sheet among `names` that has `row_id`, probing in order.
    ///
    /// Sheets that fail to open are treated as not containing the row.
    pub fn first_sheet_with_row<'n>(
        &self,
        language: Option<Language>,
        row_id: u32,
        names: &[&'n str],
    ) -> Option<&'n str> {
        let language = language.unwrap_or(self.options.default_language);
        names.iter().copied().find(|name| {
            match self.raw_sheet(name, language) {
                Ok(sheet) => sheet.has_row(row_id),
                Err(err) => {
                    debug!(sheet = *name, error = %err, "candidate sheet skipped");
                    false
                }
            }
        })
    }

    pub fn clear_cache(&self) {
        lock(&self.typed).clear();
        lock(&self.raw).clear();
    }
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("options", &self.options)
            .field("typed_sheets", &lock(&self.typed).len())
            .field("raw_sheets", &lock(&self.raw).len())
            .finish()
    }
}

// Poisoning is ignored; map entries are always complete `Arc`s.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

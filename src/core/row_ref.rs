//! Purpose: Type-tagged row references that resolve lazily through a `Module`.
//! Exports: `RowRef`, `TypedRowRef`.
//! Role: Models cross-sheet links whose target sheet is only known at runtime.
//! Invariants: `is` compares type tags only and never touches the source.
//! Invariants: A tag mismatch yields no value, whether or not the row exists.
//! Invariants: Candidate probing swallows per-sheet failures and moves on.

use std::fmt;
use std::marker::PhantomData;

use tracing::debug;

use crate::core::error::Error;
use crate::core::format::Language;
use crate::core::module::Module;
use crate::core::row::{NamedRow, RowType};

/// Reference to `row_id` in a sheet chosen at runtime.
///
/// Untyped references carry no sheet and resolve to nothing.
#[derive(Clone, Copy)]
pub struct RowRef<'m> {
    module: Option<&'m Module>,
    language: Option<Language>,
    row_id: u32,
    row_type: Option<RowType>,
}

impl<'m> RowRef<'m> {
    pub fn new<R: NamedRow>(module: &'m Module, row_id: u32) -> Self {
        Self {
            module: Some(module),
            language: None,
            row_id,
            row_type: Some(RowType::of::<R>()),
        }
    }

    pub fn untyped(row_id: u32) -> Self {
        Self {
            module: None,
            language: None,
            row_id,
            row_type: None,
        }
    }

    /// Pins the language used when the reference is resolved.
    pub fn with_language(mut self, language: Language) -> Self {
        self.language = Some(language);
        self
    }

    /// Binds `row_id` to the first candidate whose sheet contains it.
    ///
    /// Falls back to an untyped reference when no candidate matches.
    pub fn first_valid_row_or_untyped(
        module: &'m Module,
        language: Option<Language>,
        row_id: u32,
        candidates: &[RowType],
    ) -> Self {
        let probe = language.unwrap_or(module.language());
        for candidate in candidates {
            match module.raw_sheet(candidate.sheet(), probe) {
                Ok(sheet) if sheet.has_row(row_id) => {
                    return Self {
                        module: Some(module),
                        language,
                        row_id,
                        row_type: Some(*candidate),
                    };
                }
                Ok(_) => {}
                Err(err) => {
                    debug!(sheet = candidate.sheet(), row_id, error = %err, "row ref probe failed");
                }
            }
        }
        Self::untyped(row_id)
    }

    pub fn row_id(&self) -> u32 {
        self.row_id
    }

    pub fn row_type(&self) -> Option<RowType> {
        self.row_type
    }

    pub fn language(&self) -> Option<Language> {
        self.language
    }

    pub fn is<R: NamedRow>(&self) -> bool {
        self.row_type.is_some_and(|tag| tag.is::<R>())
    }

    pub fn is_untyped(&self) -> bool {
        self.row_type.is_none()
    }

    /// Sheet name of the bound type, if any.
    pub fn sheet(&self) -> Option<&'static str> {
        self.row_type.map(|tag| tag.sheet())
    }

    /// Row value when the tag is `R`; sheet-opening failures propagate.
    pub fn try_value<R: NamedRow>(&self) -> Result<Option<R>, Error> {
        let Some(module) = self.bound::<R>() else {
            return Ok(None);
        };
        let sheet = module.sheet_in::<R>(self.resolve_language(module))?;
        Ok(sheet.try_get_row(self.row_id))
    }

    /// Row value when the tag is `R`; any failure reads as absent.
    pub fn value_or_default<R: NamedRow>(&self) -> Option<R> {
        self.try_value::<R>().unwrap_or_else(|err| {
            debug!(row_id = self.row_id, error = %err, "row ref value unavailable");
            None
        })
    }

    /// All subrows of the referenced row when the tag is `R`.
    ///
    /// Sheet-opening failures and sheets without subrows propagate as errors.
    pub fn try_subrows<R: NamedRow>(&self) -> Result<Option<Vec<R>>, Error> {
        let Some(module) = self.bound::<R>() else {
            return Ok(None);
        };
        let sheet = module.sheet_in::<R>(self.resolve_language(module))?;
        Ok(sheet.subrows_of(self.row_id)?.map(Iterator::collect))
    }

    /// Like `try_subrows`, with every failure read as absent.
    pub fn subrows_or_default<R: NamedRow>(&self) -> Option<Vec<R>> {
        self.try_subrows::<R>().unwrap_or_else(|err| {
            debug!(row_id = self.row_id, error = %err, "row ref subrows unavailable");
            None
        })
    }

    fn bound<R: NamedRow>(&self) -> Option<&'m Module> {
        if self.is::<R>() { self.module } else { None }
    }

    fn resolve_language(&self, module: &Module) -> Language {
        self.language.unwrap_or(module.language())
    }
}

impl fmt::Debug for RowRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowRef")
            .field("sheet", &self.sheet())
            .field("row_id", &self.row_id)
            .field("language", &self.language)
            .finish()
    }
}

impl PartialEq for RowRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        let same_module = match (self.module, other.module) {
            (Some(a), Some(b)) => std::ptr::eq(a, b),
            (None, None) => true,
            _ => false,
        };
        same_module
            && self.language == other.language
            && self.row_id == other.row_id
            && self.row_type == other.row_type
    }
}

impl Eq for RowRef<'_> {}

impl fmt::Display for RowRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.sheet() {
            Some(sheet) => write!(f, "{sheet}#{}", self.row_id),
            None => write!(f, "?#{}", self.row_id),
        }
    }
}

/// Reference whose target sheet is fixed by `R`.
pub struct TypedRowRef<'m, R: NamedRow> {
    module: &'m Module,
    language: Option<Language>,
    row_id: u32,
    _row: PhantomData<fn() -> R>,
}

impl<'m, R: NamedRow> TypedRowRef<'m, R> {
    pub fn new(module: &'m Module, row_id: u32) -> Self {
        Self {
            module,
            language: None,
            row_id,
            _row: PhantomData,
        }
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = Some(language);
        self
    }

    pub fn row_id(&self) -> u32 {
        self.row_id
    }

    /// True when `R`'s sheet opens and contains the row.
    pub fn is_valid(&self) -> bool {
        self.module
            .sheet_in::<R>(self.resolve_language())
            .is_ok_and(|sheet| sheet.has_row(self.row_id))
    }

    pub fn value(&self) -> Result<R, Error> {
        self.module
            .sheet_in::<R>(self.resolve_language())?
            .get_row(self.row_id)
    }

    pub fn value_or_default(&self) -> Option<R> {
        self.value().ok()
    }

    pub fn to_untyped(&self) -> RowRef<'m> {
        RowRef {
            module: Some(self.module),
            language: self.language,
            row_id: self.row_id,
            row_type: Some(RowType::of::<R>()),
        }
    }

    fn resolve_language(&self) -> Language {
        self.language.unwrap_or(self.module.language())
    }
}

impl<R: NamedRow> Clone for TypedRowRef<'_, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R: NamedRow> Copy for TypedRowRef<'_, R> {}

impl<R: NamedRow> fmt::Debug for TypedRowRef<'_, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedRowRef")
            .field("sheet", &R::SHEET)
            .field("row_id", &self.row_id)
            .finish()
    }
}

impl<'m, R: NamedRow> From<TypedRowRef<'m, R>> for RowRef<'m> {
    fn from(value: TypedRowRef<'m, R>) -> Self {
        value.to_untyped()
    }
}

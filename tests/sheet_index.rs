// Library-level behavior over a real data directory on disk.
mod common;

use std::sync::Arc;
use std::thread;

use common::{SheetSpec, standard_data_dir};
use exdview::api::{
    DirectorySource, ErrorKind, Language, Module, ModuleOptions, NamedRow, Page, RawRow, Row,
    RowRef, RowType, Sheet,
};

#[derive(Debug, Clone, PartialEq)]
struct Item {
    id: u32,
    value: u32,
    name: String,
}

impl Row for Item {
    fn create(page: &Page, offset: u32, row_id: u32, _subrow_id: u16) -> Self {
        let name = page
            .read_string_bytes(offset + 4, offset)
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
            .unwrap_or_default();
        Self {
            id: row_id,
            value: page.read_u32(offset).unwrap_or_default(),
            name,
        }
    }
}

impl NamedRow for Item {
    const SHEET: &'static str = "Item";
}

#[derive(Debug, Clone, PartialEq)]
struct Recipe {
    id: u32,
    subrow: u16,
    value: u32,
}

impl Row for Recipe {
    fn create(page: &Page, offset: u32, row_id: u32, subrow_id: u16) -> Self {
        Self {
            id: row_id,
            subrow: subrow_id,
            value: page.read_u32(offset).unwrap_or_default(),
        }
    }
}

impl NamedRow for Recipe {
    const SHEET: &'static str = "Recipe";
}

fn open(dir: &tempfile::TempDir, language: Language) -> Module {
    Module::new(DirectorySource::new(dir.path()), ModuleOptions::new(language))
}

#[test]
fn merges_pages_into_sorted_keys() {
    let dir = standard_data_dir();
    let module = open(&dir, Language::None);
    let items = module.sheet::<Item>().expect("item sheet");

    assert_eq!(items.keys(), &[1, 5, 10, 42]);
    assert_eq!(items.count(), 4);
    assert!(!items.has_subrows());
    for (index, row_id) in items.keys().iter().enumerate() {
        assert_eq!(items.index_of_row(*row_id), Some(index));
        assert_eq!(items.row_at(index).map(|row| row.id), Some(*row_id));
    }

    let elixir = items.get_row(10).expect("row 10");
    assert_eq!(elixir.value, 1000);
    assert_eq!(elixir.name, "Elixir");
}

#[test]
fn duplicate_row_resolves_to_first_declared_page() {
    let dir = standard_data_dir();
    let module = open(&dir, Language::None);
    let items = module.sheet::<Item>().expect("item sheet");
    let row = items.get_row(42).expect("row 42");
    assert_eq!(row.value, 4200);
    assert_eq!(row.name, "first");
}

#[test]
fn missing_rows_and_unsupported_subrows() {
    let dir = standard_data_dir();
    let module = open(&dir, Language::None);
    let items = module.sheet::<Item>().expect("item sheet");

    assert!(items.try_get_row(2).is_none());
    assert_eq!(items.get_row(2).expect_err("missing").kind(), ErrorKind::OutOfRange);
    assert_eq!(items.index_of_row(2), None);
    assert_eq!(
        items.get_subrow(1, 0).expect_err("no subrows").kind(),
        ErrorKind::Unsupported
    );
}

#[test]
fn subrow_sheets_drop_empty_rows_and_group_enumeration() {
    let dir = standard_data_dir();
    let module = open(&dir, Language::None);
    let recipes = module.sheet::<Recipe>().expect("recipe sheet");

    assert!(recipes.has_subrows());
    assert_eq!(recipes.keys(), &[2, 7]);
    assert!(!recipes.has_row(3));
    assert_eq!(recipes.get_subrow_count(2).expect("count"), 3);
    assert_eq!(recipes.get_subrow(2, 2).expect("subrow").value, 22);
    assert!(recipes.try_get_subrow(2, 3).expect("in range check").is_none());

    let all: Vec<(u32, u16, u32)> = recipes
        .subrows()
        .expect("subrows")
        .map(|row| (row.id, row.subrow, row.value))
        .collect();
    assert_eq!(all, vec![(2, 0, 20), (2, 1, 21), (2, 2, 22), (7, 0, 70)]);

    let firsts: Vec<u32> = recipes.iter().map(|row| row.value).collect();
    assert_eq!(firsts, vec![20, 70]);
}

#[test]
fn language_selection_and_fallback() {
    let dir = standard_data_dir();
    let english = open(&dir, Language::English);
    assert_eq!(english.sheet::<Item>().expect("en").language(), Language::English);

    let german = open(&dir, Language::German);
    let items = german.sheet::<Item>().expect("fallback");
    assert_eq!(items.language(), Language::None);
    assert_eq!(items.count(), 4);
}

#[test]
fn missing_page_file_is_skipped() {
    let dir = standard_data_dir();
    std::fs::remove_file(dir.path().join("exd/Item_40.exd")).expect("remove page");
    let module = open(&dir, Language::None);
    let items = module.raw_sheet("Item", Language::None).expect("item sheet");
    assert_eq!(items.keys(), &[1, 5, 42]);
    assert_eq!(items.page_count(), 1);
}

#[test]
fn unknown_sheet_is_config_error() {
    let dir = standard_data_dir();
    let module = open(&dir, Language::None);
    let err = module.raw_sheet("Nope", Language::None).expect_err("unknown");
    assert_eq!(err.kind(), ErrorKind::Config);
    assert_eq!(err.sheet(), Some("Nope"));
}

#[test]
fn empty_sheet_has_no_rows() {
    let dir = tempfile::tempdir().expect("tempdir");
    SheetSpec::new("Empty").write(dir.path());
    let sheet: Sheet<RawRow> =
        Sheet::open(&DirectorySource::new(dir.path()), "Empty", Language::None, None)
            .expect("empty sheet");
    assert!(sheet.is_empty());
    assert!(sheet.keys().is_empty());
    assert_eq!(sheet.iter().count(), 0);
    assert_eq!(sheet.get_row(999).expect_err("empty").kind(), ErrorKind::OutOfRange);
}

#[test]
fn row_refs_probe_candidates_in_order() {
    let dir = standard_data_dir();
    let module = open(&dir, Language::None);
    let candidates = [RowType::of::<Recipe>(), RowType::of::<Item>()];

    let found = RowRef::first_valid_row_or_untyped(&module, None, 5, &candidates);
    assert!(found.is::<Item>());
    assert_eq!(found.value_or_default::<Item>().map(|row| row.value), Some(500));
    assert_eq!(found.value_or_default::<Recipe>(), None);

    let recipe = RowRef::first_valid_row_or_untyped(&module, None, 2, &candidates);
    assert!(recipe.is::<Recipe>());
    assert_eq!(recipe.subrows_or_default::<Recipe>().map(|rows| rows.len()), Some(3));

    assert!(RowRef::first_valid_row_or_untyped(&module, None, 3, &candidates).is_untyped());
}

#[test]
fn shared_sheet_serves_concurrent_readers() {
    let dir = standard_data_dir();
    let module = Arc::new(open(&dir, Language::None));
    let items = module.sheet::<Item>().expect("item sheet");

    thread::scope(|scope| {
        for _ in 0..4 {
            let items = Arc::clone(&items);
            let module = Arc::clone(&module);
            scope.spawn(move || {
                let again = module.sheet::<Item>().expect("cached");
                assert!(Arc::ptr_eq(&items, &again));
                let values: Vec<u32> = items.iter().map(|row| row.value).collect();
                assert_eq!(values, vec![100, 500, 1000, 4200]);
            });
        }
    });
}

// Writes small .exh/.exd/.exl fixtures into a temp data directory.
#![allow(dead_code)]
use std::fs;
use std::path::Path;

use exdview::api::Language;

pub struct PageSpec {
    pub start_id: u32,
    /// Row id and one payload per subrow; plain rows use exactly one payload.
    pub rows: Vec<(u32, Vec<Vec<u8>>)>,
}

pub struct SheetSpec {
    pub name: String,
    pub subrows: bool,
    pub data_width: u16,
    pub columns: Vec<(u16, u16)>,
    pub languages: Vec<Language>,
    pub pages: Vec<PageSpec>,
}

impl SheetSpec {
    /// One `u32` column at offset 0 and a string column at offset 4.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            subrows: false,
            data_width: 8,
            columns: vec![(0x7, 0), (0x0, 4)],
            languages: vec![Language::None],
            pages: Vec::new(),
        }
    }

    pub fn subrows(mut self) -> Self {
        self.subrows = true;
        self
    }

    pub fn languages(mut self, languages: &[Language]) -> Self {
        self.languages = languages.to_vec();
        self
    }

    pub fn page(mut self, start_id: u32, rows: &[(u32, u32, &str)]) -> Self {
        let rows = rows
            .iter()
            .map(|(row_id, value, text)| (*row_id, vec![payload(*value, text)]))
            .collect();
        self.pages.push(PageSpec { start_id, rows });
        self
    }

    /// Subrow payloads carry the value column and an empty string.
    pub fn subrow_page(mut self, start_id: u32, rows: Vec<(u32, Vec<u32>)>) -> Self {
        let rows = rows
            .into_iter()
            .map(|(row_id, values)| {
                (row_id, values.into_iter().map(|value| payload(value, "")).collect())
            })
            .collect();
        self.pages.push(PageSpec { start_id, rows });
        self
    }

    pub fn header_bytes(&self) -> Vec<u8> {
        let mut buf = vec![0u8; 32];
        buf[0..4].copy_from_slice(b"EXHF");
        buf[4..6].copy_from_slice(&3u16.to_be_bytes());
        buf[6..8].copy_from_slice(&self.data_width.to_be_bytes());
        buf[8..10].copy_from_slice(&(self.columns.len() as u16).to_be_bytes());
        buf[10..12].copy_from_slice(&(self.pages.len() as u16).to_be_bytes());
        buf[12..14].copy_from_slice(&(self.languages.len() as u16).to_be_bytes());
        buf[17] = if self.subrows { 2 } else { 1 };
        let total: usize = self.pages.iter().map(|page| page.rows.len()).sum();
        buf[20..24].copy_from_slice(&(total as u32).to_be_bytes());
        for (kind, offset) in &self.columns {
            buf.extend_from_slice(&kind.to_be_bytes());
            buf.extend_from_slice(&offset.to_be_bytes());
        }
        for page in &self.pages {
            buf.extend_from_slice(&page.start_id.to_be_bytes());
            buf.extend_from_slice(&(page.rows.len() as u32).to_be_bytes());
        }
        for language in &self.languages {
            buf.extend_from_slice(&[language.as_u8(), 0]);
        }
        buf
    }

    pub fn page_bytes(&self, page: &PageSpec) -> Vec<u8> {
        let index_len = page.rows.len() * 8;
        let mut body = Vec::new();
        let mut pointers = Vec::new();
        for (row_id, payloads) in &page.rows {
            pointers.push((*row_id, (32 + index_len + body.len()) as u32));
            let mut data = Vec::new();
            if self.subrows {
                for (subrow_id, payload) in payloads.iter().enumerate() {
                    data.extend_from_slice(&(subrow_id as u16).to_be_bytes());
                    data.extend_from_slice(&payload[..self.data_width as usize]);
                }
            } else if let Some(payload) = payloads.first() {
                data.extend_from_slice(payload);
            }
            body.extend_from_slice(&(data.len() as u32).to_be_bytes());
            body.extend_from_slice(&(payloads.len() as u16).to_be_bytes());
            body.extend_from_slice(&data);
        }

        let mut buf = vec![0u8; 32];
        buf[0..4].copy_from_slice(b"EXDF");
        buf[4..6].copy_from_slice(&2u16.to_be_bytes());
        buf[8..12].copy_from_slice(&(index_len as u32).to_be_bytes());
        buf[12..16].copy_from_slice(&(body.len() as u32).to_be_bytes());
        for (row_id, offset) in pointers {
            buf.extend_from_slice(&row_id.to_be_bytes());
            buf.extend_from_slice(&offset.to_be_bytes());
        }
        buf.extend_from_slice(&body);
        buf
    }

    pub fn write(&self, root: &Path) {
        let exd = root.join("exd");
        let sheet_path = exd.join(format!("{}.exh", self.name));
        fs::create_dir_all(sheet_path.parent().expect("parent")).expect("mkdir");
        fs::write(&sheet_path, self.header_bytes()).expect("write header");
        for language in &self.languages {
            for page in &self.pages {
                let file = match language {
                    Language::None => format!("{}_{}.exd", self.name, page.start_id),
                    other => format!("{}_{}_{}.exd", self.name, page.start_id, other.code()),
                };
                fs::write(exd.join(file), self.page_bytes(page)).expect("write page");
            }
        }
    }
}

/// Fixed part (`u32` value, `u32` string offset 0) followed by the string.
fn payload(value: u32, text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(9 + text.len());
    out.extend_from_slice(&value.to_be_bytes());
    out.extend_from_slice(&0u32.to_be_bytes());
    out.extend_from_slice(text.as_bytes());
    out.push(0);
    out
}

pub fn write_root_list(root: &Path, names: &[&str]) {
    let mut text = String::from("EXLT,2\n");
    for (idx, name) in names.iter().enumerate() {
        text.push_str(&format!("{name},{idx}\n"));
    }
    fs::create_dir_all(root.join("exd")).expect("mkdir");
    fs::write(root.join("exd/root.exl"), text).expect("write list");
}

/// Item (plain, two pages, one duplicate id), Recipe (subrows), and root.exl.
pub fn standard_data_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    SheetSpec::new("Item")
        .languages(&[Language::None, Language::English])
        .page(0, &[(1, 100, "Potion"), (5, 500, "Ether"), (42, 4200, "first")])
        .page(40, &[(10, 1000, "Elixir"), (42, 9999, "second")])
        .write(dir.path());
    SheetSpec::new("Recipe")
        .subrows()
        .subrow_page(0, vec![(2, vec![20, 21, 22]), (3, vec![]), (7, vec![70])])
        .write(dir.path());
    write_root_list(dir.path(), &["Item", "Recipe"]);
    dir
}

// Test-only encoder for small header/page sets installed into a MemorySource.
use crate::core::format::{self, Language};
use crate::core::page::Page;
use crate::core::row::{NamedRow, Row};
use crate::core::source::MemorySource;

pub(crate) struct FixturePage {
    pub start_id: u32,
    /// Row id and subrow payloads; plain sheets use exactly one payload.
    pub rows: Vec<(u32, Vec<Vec<u8>>)>,
}

pub(crate) struct SheetFixture {
    pub name: String,
    pub subrows: bool,
    pub data_width: u16,
    pub columns: Vec<(u16, u16)>,
    pub languages: Vec<Language>,
    pub pages: Vec<FixturePage>,
}

impl SheetFixture {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            subrows: false,
            data_width: 4,
            columns: vec![(0x7, 0)],
            languages: vec![Language::None],
            pages: Vec::new(),
        }
    }

    pub fn with_subrows(mut self) -> Self {
        self.subrows = true;
        self
    }

    pub fn with_column(mut self, kind: u16, offset: u16) -> Self {
        self.columns.push((kind, offset));
        self
    }

    pub fn with_languages(mut self, languages: &[Language]) -> Self {
        self.languages = languages.to_vec();
        self
    }

    /// Plain page; each row stores `value` as its first column.
    pub fn page(mut self, start_id: u32, rows: &[(u32, u32)]) -> Self {
        let rows = rows
            .iter()
            .map(|(row_id, value)| (*row_id, vec![value.to_be_bytes().to_vec()]))
            .collect();
        self.pages.push(FixturePage { start_id, rows });
        self
    }

    /// Subrow page; each subrow stores its value as its first column.
    pub fn subrow_page(mut self, start_id: u32, rows: Vec<(u32, Vec<u32>)>) -> Self {
        let rows = rows
            .into_iter()
            .map(|(row_id, values)| {
                let payloads = values.iter().map(|value| value.to_be_bytes().to_vec()).collect();
                (row_id, payloads)
            })
            .collect();
        self.pages.push(FixturePage { start_id, rows });
        self
    }

    pub fn header_bytes(&self) -> Vec<u8> {
        let mut buf = vec![0u8; format::HEADER_FIXED_LEN];
        buf[0..4].copy_from_slice(&format::HEADER_MAGIC);
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

    pub fn page_bytes(&self, page: &FixturePage) -> Vec<u8> {
        let index_len = page.rows.len() * format::ROW_POINTER_LEN;
        let mut body = Vec::new();
        let mut pointers = Vec::new();
        for (row_id, payloads) in &page.rows {
            let offset = format::PAGE_FIXED_LEN + index_len + body.len();
            pointers.push((*row_id, offset as u32));
            let mut data = Vec::new();
            if self.subrows {
                for (subrow_id, payload) in payloads.iter().enumerate() {
                    data.extend_from_slice(&(subrow_id as u16).to_be_bytes());
                    data.extend_from_slice(&pad(payload, self.data_width));
                }
            } else if let Some(payload) = payloads.first() {
                data.extend_from_slice(&pad(payload, self.data_width));
            }
            body.extend_from_slice(&(data.len() as u32).to_be_bytes());
            body.extend_from_slice(&(payloads.len() as u16).to_be_bytes());
            body.extend_from_slice(&data);
        }

        let mut buf = vec![0u8; format::PAGE_FIXED_LEN];
        buf[0..4].copy_from_slice(&format::PAGE_MAGIC);
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

    /// Writes the header plus every page for every declared language.
    pub fn install(&self, source: &mut MemorySource) {
        source.insert(format::header_path(&self.name), self.header_bytes());
        for language in &self.languages {
            for page in &self.pages {
                source.insert(
                    format::page_path(&self.name, page.start_id, *language),
                    self.page_bytes(page),
                );
            }
        }
    }
}

fn pad(payload: &[u8], width: u16) -> Vec<u8> {
    let mut out = payload.to_vec();
    out.resize(out.len().max(width as usize), 0);
    out
}

/// Test row: first column as `u32`, plus its position.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Probe {
    pub row_id: u32,
    pub subrow_id: u16,
    pub value: Option<u32>,
}

impl Row for Probe {
    fn create(page: &Page, offset: u32, row_id: u32, subrow_id: u16) -> Self {
        Self {
            row_id,
            subrow_id,
            value: page.read_u32(offset).ok(),
        }
    }
}

macro_rules! probe_sheet {
    ($ty:ident, $sheet:literal) => {
        #[derive(Clone, Debug, Eq, PartialEq)]
        pub(crate) struct $ty(pub Probe);

        impl Row for $ty {
            fn create(page: &Page, offset: u32, row_id: u32, subrow_id: u16) -> Self {
                $ty(Probe::create(page, offset, row_id, subrow_id))
            }
        }

        impl NamedRow for $ty {
            const SHEET: &'static str = $sheet;
        }
    };
}

probe_sheet!(ItemRow, "Item");
probe_sheet!(ActionRow, "Action");
probe_sheet!(QuestRow, "Quest");
probe_sheet!(RecipeRow, "Recipe");

// Root sheet list (root.exl) decode: `EXLT,<version>` then `name,id` lines.
use serde::Serialize;

use crate::core::error::{Error, ErrorKind};
use crate::core::format::LIST_MAGIC;

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct SheetEntry {
    pub name: String,
    /// `None` for sheets listed with id `-1`.
    pub id: Option<u32>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct SheetList {
    pub version: u32,
    pub entries: Vec<SheetEntry>,
}

impl SheetList {
    pub fn decode(buf: &[u8]) -> Result<Self, Error> {
        let text = std::str::from_utf8(buf).map_err(|err| {
            Error::new(ErrorKind::Corrupt)
                .with_message("sheet list is not utf-8")
                .with_source(err)
        })?;
        let mut lines = text.lines().map(str::trim).filter(|line| !line.is_empty());

        let first = lines
            .next()
            .ok_or_else(|| Error::new(ErrorKind::Corrupt).with_message("sheet list is empty"))?;
        let (magic, version) = first.split_once(',').unwrap_or((first, "0"));
        if magic != LIST_MAGIC {
            return Err(Error::new(ErrorKind::Corrupt).with_message("bad sheet list magic"));
        }
        let version = version.trim().parse::<u32>().map_err(|err| {
            Error::new(ErrorKind::Corrupt)
                .with_message("bad sheet list version")
                .with_source(err)
        })?;

        let mut entries = Vec::new();
        for line in lines {
            let Some((name, id)) = line.rsplit_once(',') else {
                return Err(Error::new(ErrorKind::Corrupt)
                    .with_message(format!("malformed sheet list line '{line}'")));
            };
            let id = id.trim().parse::<i64>().map_err(|err| {
                Error::new(ErrorKind::Corrupt)
                    .with_message(format!("bad sheet id in line '{line}'"))
                    .with_source(err)
            })?;
            entries.push(SheetEntry {
                name: name.trim().to_string(),
                id: u32::try_from(id).ok(),
            });
        }

        Ok(Self { version, entries })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.name.as_str())
    }

    pub fn find_by_id(&self, id: u32) -> Option<&SheetEntry> {
        self.entries.iter().find(|entry| entry.id == Some(id))
    }
}

#[cfg(test)]
mod tests {
    use super::SheetList;
    use crate::core::error::ErrorKind;

    #[test]
    fn decodes_entries() {
        let list = SheetList::decode(b"EXLT,2\r\nItem,11\r\ncustom/000/Foo,-1\n\nQuest,5\n")
            .expect("decode");
        assert_eq!(list.version, 2);
        assert_eq!(
            list.names().collect::<Vec<_>>(),
            vec!["Item", "custom/000/Foo", "Quest"]
        );
        assert_eq!(list.entries[1].id, None);
        assert_eq!(list.find_by_id(5).map(|entry| entry.name.as_str()), Some("Quest"));
    }

    #[test]
    fn rejects_malformed_lists() {
        let err = SheetList::decode(b"").expect_err("empty");
        assert_eq!(err.kind(), ErrorKind::Corrupt);
        let err = SheetList::decode(b"EXHF,2\n").expect_err("magic");
        assert_eq!(err.kind(), ErrorKind::Corrupt);
        let err = SheetList::decode(b"EXLT,2\nItem\n").expect_err("line");
        assert_eq!(err.kind(), ErrorKind::Corrupt);
        let err = SheetList::decode(b"EXLT,2\nItem,abc\n").expect_err("id");
        assert_eq!(err.kind(), ErrorKind::Corrupt);
    }
}

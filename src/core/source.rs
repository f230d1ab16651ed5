// File retrieval seam: sheet paths in, immutable byte buffers out.
use std::collections::HashMap;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use memmap2::Mmap;

use crate::core::error::{Error, ErrorKind};

/// Resolves a sheet-relative path (e.g. `exd/Item.exh`) to file bytes.
///
/// `Ok(None)` means the file does not exist; callers decide whether that
/// is tolerated (data pages) or fatal (headers).
pub trait FileSource: Send + Sync {
    fn read(&self, path: &str) -> Result<Option<Bytes>, Error>;
}

/// Files extracted under a root directory, mapped read-only.
#[derive(Clone, Debug)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl FileSource for DirectorySource {
    fn read(&self, path: &str) -> Result<Option<Bytes>, Error> {
        let full = self.root.join(path);
        let file = match File::open(&full) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(Error::new(ErrorKind::Io).with_path(&full).with_source(err));
            }
        };
        let len = file
            .metadata()
            .map(|meta| meta.len())
            .map_err(|err| Error::new(ErrorKind::Io).with_path(&full).with_source(err))?;
        // Zero-length files cannot be mapped on every platform.
        if len == 0 {
            return Ok(Some(Bytes::new()));
        }

        // SAFETY: the mapping is read-only and the data directory is treated as
        // immutable for the lifetime of the process.
        let mmap = unsafe {
            Mmap::map(&file)
                .map_err(|err| Error::new(ErrorKind::Io).with_path(&full).with_source(err))?
        };
        Ok(Some(Bytes::from_owner(mmap)))
    }
}

/// In-memory file table, for tools that already hold extracted bytes.
#[derive(Clone, Debug, Default)]
pub struct MemorySource {
    files: HashMap<String, Bytes>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, data: impl Into<Bytes>) {
        self.files.insert(path.into(), data.into());
    }

    pub fn with_file(mut self, path: impl Into<String>, data: impl Into<Bytes>) -> Self {
        self.insert(path, data);
        self
    }

    pub fn remove(&mut self, path: &str) -> Option<Bytes> {
        self.files.remove(path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl FileSource for MemorySource {
    fn read(&self, path: &str) -> Result<Option<Bytes>, Error> {
        Ok(self.files.get(path).cloned())
    }
}

//! Document store capability and a directory-backed implementation.
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::error::Error;

/// Write side of the document database.
///
/// Each block becomes a named document set.
/// Names are unique per corpus, component and sequence number: reusing one is a caller error.
pub trait DocumentStore {
    /// Errors with [Error::Unavailable] if the store can't be reached.
    fn check(&self) -> Result<(), Error>;
    /// Create a document set from a block, returning its size in storage units.
    fn create_document_set(&mut self, name: &str, block: &str) -> Result<u64, Error>;
    /// Size of a document set, in bytes.
    fn size_of(&self, name: &str) -> Result<u64, Error>;
    fn drop_document_set(&mut self, name: &str) -> Result<(), Error>;
}

/// Stores each document set as `<dst>/<name>.xml`.
pub struct DirectoryStore {
    dst: PathBuf,
}

impl DirectoryStore {
    pub fn new(dst: &Path) -> Self {
        Self {
            dst: dst.to_path_buf(),
        }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dst.join(format!("{}.xml", name))
    }
}

impl DocumentStore for DirectoryStore {
    fn check(&self) -> Result<(), Error> {
        match std::fs::metadata(&self.dst) {
            Ok(m) if m.is_dir() && !m.permissions().readonly() => Ok(()),
            Ok(_) => Err(Error::Unavailable(format!(
                "Store location {:?} is not a writable directory",
                self.dst
            ))),
            Err(e) => Err(Error::Unavailable(format!(
                "Store location {:?} not available: {}",
                self.dst, e
            ))),
        }
    }

    fn create_document_set(&mut self, name: &str, block: &str) -> Result<u64, Error> {
        let path = self.path(name);
        debug!("creating document set {:?}", path);
        let mut f: File = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)?;
        f.write_all(block.as_bytes())?;
        f.flush()?;
        Ok(block.len() as u64)
    }

    fn size_of(&self, name: &str) -> Result<u64, Error> {
        Ok(std::fs::metadata(self.path(name))?.len())
    }

    fn drop_document_set(&mut self, name: &str) -> Result<(), Error> {
        std::fs::remove_file(self.path(name))?;
        info!("Deleted document set {}", name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn create_size_drop() {
        let dst = tempdir().unwrap();
        let mut store = DirectoryStore::new(dst.path());
        store.check().unwrap();

        let block = "<treebank><alpino_ds id=\"main:1:0\"/></treebank>";
        let written = store.create_document_set("TB_MAIN_0", block).unwrap();
        assert_eq!(written, block.len() as u64);
        assert_eq!(store.size_of("TB_MAIN_0").unwrap(), block.len() as u64);

        store.drop_document_set("TB_MAIN_0").unwrap();
        assert!(store.size_of("TB_MAIN_0").is_err());
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let dst = tempdir().unwrap();
        let mut store = DirectoryStore::new(dst.path());
        store.create_document_set("X", "<treebank/>").unwrap();
        assert!(store.create_document_set("X", "<treebank/>").is_err());
    }

    #[test]
    fn missing_location_is_unavailable() {
        let store = DirectoryStore::new(Path::new("this/store/does/not/exist"));
        assert!(matches!(store.check(), Err(Error::Unavailable(_))));
    }
}

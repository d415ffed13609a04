//! JSON file slot (`{data_dir}/{key}.json`).

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::Context;

use super::r#trait::{StorageError, StorageSlot};

/// Slot backed by a single file.
///
/// Writes go to a sibling temp file that is then renamed over the target, so a
/// crash mid-write leaves the previous document intact.
#[derive(Debug, Clone)]
pub struct FileSlot {
    path: PathBuf,
}

impl FileSlot {
    pub fn new(data_dir: impl AsRef<Path>, key: &str) -> Self {
        Self {
            path: data_dir.as_ref().join(format!("{key}.json")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn write(&self, value: &str) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create data directory at {parent:?}"))?;
        }

        let tmp = self.temp_path();
        fs::write(&tmp, value).with_context(|| format!("failed to write {tmp:?}"))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("failed to move {tmp:?} to {:?}", self.path))?;
        Ok(())
    }
}

impl StorageSlot for FileSlot {
    fn load(&self) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(StorageError::io(
                anyhow::Error::new(err).context(format!("failed to read {:?}", self.path)),
            )),
        }
    }

    fn save(&self, value: &str) -> Result<(), StorageError> {
        self.write(value).map_err(StorageError::io)
    }
}

use rummytally_core::{PersistError, SnapshotStore};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Snapshot store keeping one `<key>.json` file per key under a directory.
#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file: String = key
            .chars()
            .map(|ch| {
                if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
                    ch
                } else {
                    '_'
                }
            })
            .collect();
        self.root.join(format!("{file}.json"))
    }
}

impl SnapshotStore for DirStore {
    fn load(&self, key: &str) -> Result<Option<String>, PersistError> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(body) => Ok(Some(body)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(PersistError::Backend(format!("read {}: {err}", path.display()))),
        }
    }

    fn save(&mut self, key: &str, blob: &str) -> Result<(), PersistError> {
        fs::create_dir_all(&self.root).map_err(|err| {
            PersistError::Backend(format!("create {}: {err}", self.root.display()))
        })?;
        let path = self.path_for(key);
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, blob)
            .map_err(|err| PersistError::Backend(format!("write {}: {err}", staging.display())))?;
        fs::rename(&staging, &path)
            .map_err(|err| PersistError::Backend(format!("replace {}: {err}", path.display())))?;
        tracing::debug!(path = %path.display(), bytes = blob.len(), "snapshot saved");
        Ok(())
    }
}

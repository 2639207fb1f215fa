use std::fs;
use std::path::{Path, PathBuf};
use log::info;
use crate::backend::storage::error::BackendInitError;

/// FileConnection owns the directory that holds one file per entity collection
#[derive(Debug, Clone)]
pub struct FileConnection {
    root: PathBuf,
}

impl FileConnection {
    /// Open a file root, creating the directory if it doesn't exist
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self, BackendInitError> {
        let root = root.as_ref().to_path_buf();

        if !root.exists() {
            fs::create_dir_all(&root).map_err(|source| BackendInitError::Io {
                path: root.clone(),
                source,
            })?;
            info!("Created storage directory: {}", root.display());
        } else if !root.is_dir() {
            return Err(BackendInitError::Io {
                path: root.clone(),
                source: std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "storage root exists but is not a directory",
                ),
            });
        }

        Ok(Self { root })
    }

    /// Default root for a file backend: `<data dir>/carpool/<sub_directory>`.
    /// Falls back to `./data/<sub_directory>` when the platform has no data dir.
    pub fn default_root(sub_directory: &str) -> PathBuf {
        match dirs::data_dir() {
            Some(data_dir) => data_dir.join("carpool").join(sub_directory),
            None => PathBuf::from("data").join(sub_directory),
        }
    }

    /// Path of the file holding a whole collection, e.g. `<root>/trips.csv`
    pub fn collection_path(&self, collection: &str, extension: &str) -> PathBuf {
        self.root.join(format!("{}.{}", collection, extension))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_new_creates_missing_root() {
        let temp_dir = tempdir().unwrap();
        let root = temp_dir.path().join("nested").join("csv");
        let connection = FileConnection::new(&root).unwrap();
        assert!(root.is_dir());
        assert_eq!(
            connection.collection_path("trips", "csv"),
            root.join("trips.csv")
        );
    }

    #[test]
    fn test_new_rejects_file_as_root() {
        let temp_dir = tempdir().unwrap();
        let file_path = temp_dir.path().join("not_a_dir");
        fs::write(&file_path, "x").unwrap();
        let result = FileConnection::new(&file_path);
        assert!(matches!(result, Err(BackendInitError::Io { .. })));
    }
}

use crate::core::Storage;
use crate::utils::error::{EtlError, FileOperation, Result};
use std::path::{Path, PathBuf};

/// Local filesystem storage. Relative paths resolve against `base_path`.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        self.base_path.join(path)
    }
}

impl Default for LocalStorage {
    fn default() -> Self {
        Self::new(".")
    }
}

impl Storage for LocalStorage {
    async fn read_file(&self, path: &Path) -> Result<Vec<u8>> {
        let full_path = self.resolve(path);
        tokio::fs::read(&full_path)
            .await
            .map_err(|source| EtlError::FileAccessError {
                operation: FileOperation::Read,
                path: full_path.display().to_string(),
                source,
            })
    }

    // 不建立上層目錄，路徑錯誤應直接回報
    async fn write_file(&self, path: &Path, data: &[u8]) -> Result<()> {
        let full_path = self.resolve(path);
        tokio::fs::write(&full_path, data)
            .await
            .map_err(|source| EtlError::FileAccessError {
                operation: FileOperation::Write,
                path: full_path.display().to_string(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_then_read_overwrites() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path());

        storage.write_file(Path::new("faa.txt"), b"first").await.unwrap();
        storage.write_file(Path::new("faa.txt"), b"second").await.unwrap();

        let data = storage.read_file(Path::new("faa.txt")).await.unwrap();
        assert_eq!(data, b"second");
    }

    #[tokio::test]
    async fn test_missing_file_names_path() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path());

        let err = storage.read_file(Path::new("MASTER.txt")).await.unwrap_err();
        assert!(matches!(err, EtlError::FileAccessError { .. }));
        assert!(err.to_string().contains("MASTER.txt"));
    }

    #[tokio::test]
    async fn test_write_into_missing_directory_fails() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path());

        let result = storage
            .write_file(Path::new("no/such/dir/faa.txt"), b"data")
            .await;
        assert!(matches!(result, Err(EtlError::FileAccessError { .. })));
    }

    #[tokio::test]
    async fn test_absolute_paths_ignore_base() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("out.txt");
        let storage = LocalStorage::default();

        storage.write_file(&target, b"data").await.unwrap();
        assert_eq!(std::fs::read(&target).unwrap(), b"data");
    }
}

use kanban_core::KanbanResult;
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs;

/// Atomic file writer that prevents torn files
/// Uses write-to-temp-file → atomic-rename pattern so readers see either the
/// old content or the new content, never a mix
pub struct AtomicWriter;

impl AtomicWriter {
    /// Write data to a file atomically
    pub async fn write_atomic(path: &Path, data: &[u8]) -> KanbanResult<()> {
        // Create temp file in same directory to ensure same filesystem
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        let temp_file = tempfile::NamedTempFile::new_in(parent)?;
        let temp_path = temp_file.path().to_path_buf();

        fs::write(&temp_path, data).await?;

        // Atomic rename (atomic on POSIX systems)
        fs::rename(&temp_path, path).await?;

        tracing::debug!(
            "Atomically wrote {} bytes to {}",
            data.len(),
            path.display()
        );
        Ok(())
    }

    /// Read all data from a file
    pub async fn read_all(path: &Path) -> KanbanResult<Vec<u8>> {
        let data = fs::read(path).await?;
        tracing::debug!("Read {} bytes from {}", data.len(), path.display());
        Ok(data)
    }

    /// Read a file that may legitimately be absent
    pub async fn read_optional(path: &Path) -> KanbanResult<Option<Vec<u8>>> {
        match fs::read(path).await {
            Ok(data) => {
                tracing::debug!("Read {} bytes from {}", data.len(), path.display());
                Ok(Some(data))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_atomic_write() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("layout.json");
        let data = br#"{"title": "Board"}"#;

        AtomicWriter::write_atomic(&file_path, data).await.unwrap();

        let read_data = AtomicWriter::read_all(&file_path).await.unwrap();
        assert_eq!(read_data, data);
    }

    #[tokio::test]
    async fn test_atomic_write_overwrites_without_leftovers() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("card.md");

        AtomicWriter::write_atomic(&file_path, b"First").await.unwrap();
        AtomicWriter::write_atomic(&file_path, b"Second").await.unwrap();

        let read_data = AtomicWriter::read_all(&file_path).await.unwrap();
        assert_eq!(read_data, b"Second");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_read_optional_missing_file() {
        let dir = tempdir().unwrap();
        let missing = AtomicWriter::read_optional(&dir.path().join("absent.json"))
            .await
            .unwrap();
        assert!(missing.is_none());
    }
}

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// On-disk storage for uploaded spreadsheets and avatars. Files keep their
/// original name behind a millisecond-timestamp prefix so re-uploads by
/// other accounts never clobber each other; avatars live in a subdirectory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

pub const AVATARS_SUBDIR: &str = "avatars";

impl FileStorage {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub async fn ensure_dirs(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .with_context(|| format!("Failed to create uploads dir: {}", self.root.display()))?;
        tokio::fs::create_dir_all(self.root.join(AVATARS_SUBDIR))
            .await
            .context("Failed to create avatars dir")?;
        Ok(())
    }

    /// Persist upload bytes and return the stored (on-disk) name.
    pub async fn save_upload(&self, original_name: &str, bytes: &[u8]) -> Result<String> {
        let name = sanitize_filename(original_name)
            .ok_or_else(|| anyhow::anyhow!("Unsafe filename: {original_name}"))?;

        let stored = format!("{}-{}", chrono::Utc::now().timestamp_millis(), name);
        tokio::fs::write(self.root.join(&stored), bytes)
            .await
            .with_context(|| format!("Failed to write upload: {stored}"))?;

        Ok(stored)
    }

    pub async fn save_avatar(&self, original_name: &str, bytes: &[u8]) -> Result<String> {
        let name = sanitize_filename(original_name)
            .ok_or_else(|| anyhow::anyhow!("Unsafe filename: {original_name}"))?;

        let stored = format!("{}-{}", chrono::Utc::now().timestamp_millis(), name);
        tokio::fs::write(self.root.join(AVATARS_SUBDIR).join(&stored), bytes)
            .await
            .with_context(|| format!("Failed to write avatar: {stored}"))?;

        Ok(stored)
    }

    /// Resolve a stored name back to its path. Returns `None` for names that
    /// would escape the uploads directory.
    #[must_use]
    pub fn resolve(&self, stored_name: &str) -> Option<PathBuf> {
        sanitize_filename(stored_name).map(|name| self.root.join(name))
    }
}

/// Accept only bare filenames: no path separators, no parent-dir components,
/// nothing hidden or empty.
#[must_use]
pub fn sanitize_filename(name: &str) -> Option<&str> {
    if name.is_empty() || name == "." || name == ".." {
        return None;
    }
    if name.contains('/') || name.contains('\\') || name.contains('\0') {
        return None;
    }
    Some(name)
}

/// Lowercased extension including the dot, e.g. `".xlsx"`.
#[must_use]
pub fn extension_of(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("sales.xlsx"), Some("sales.xlsx"));
        assert_eq!(sanitize_filename("1716-sales.xlsx"), Some("1716-sales.xlsx"));
        assert_eq!(sanitize_filename(""), None);
        assert_eq!(sanitize_filename(".."), None);
        assert_eq!(sanitize_filename("../etc/passwd"), None);
        assert_eq!(sanitize_filename("a/b.xlsx"), None);
        assert_eq!(sanitize_filename("a\\b.xlsx"), None);
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("sales.XLSX").as_deref(), Some(".xlsx"));
        assert_eq!(extension_of("report.xls").as_deref(), Some(".xls"));
        assert_eq!(extension_of("noext"), None);
    }

    #[tokio::test]
    async fn test_save_and_resolve() {
        let root = std::env::temp_dir().join(format!("chartarr-storage-{}", uuid::Uuid::new_v4()));
        let storage = FileStorage::new(&root);
        storage.ensure_dirs().await.unwrap();

        let stored = storage.save_upload("sales.xlsx", b"bytes").await.unwrap();
        assert!(stored.ends_with("-sales.xlsx"));

        let path = storage.resolve(&stored).unwrap();
        assert_eq!(tokio::fs::read(path).await.unwrap(), b"bytes");

        tokio::fs::remove_dir_all(root).await.unwrap();
    }
}

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Resolve a user-supplied path against the current directory and make sure
/// it points at a file.
pub fn resolve_document(filepath: &str) -> Result<PathBuf> {
    let path = Path::new(filepath);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    if !absolute.is_file() {
        return Err(anyhow::anyhow!("File not found: {}", absolute.display()));
    }
    Ok(absolute)
}

pub fn read_document(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Directory a document's config search starts from.
pub fn document_dir(path: &Path) -> &Path {
    path.parent().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_document() {
        let temp_dir = TempDir::new().unwrap();
        let doc = temp_dir.path().join("hello.m5r");
        std::fs::write(&doc, "<?css a ?>").unwrap();

        let resolved = resolve_document(doc.to_str().unwrap()).unwrap();
        assert_eq!(resolved, doc);
        assert_eq!(document_dir(&resolved), temp_dir.path());
        assert_eq!(read_document(&resolved).unwrap(), "<?css a ?>");
    }

    #[test]
    fn test_resolve_missing_document() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing.m5r");
        let err = resolve_document(missing.to_str().unwrap()).unwrap_err();
        assert!(err.to_string().contains("File not found"));
    }
}

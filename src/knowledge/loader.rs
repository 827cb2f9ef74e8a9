//! Runbook loader: collects `.md`/`.txt` documents under a directory.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use tokio::fs;

use crate::error::KnowledgeError;

/// Extensions treated as knowledge base documents.
const DOCUMENT_EXTENSIONS: &[&str] = &["md", "txt"];

/// A loaded knowledge base document.
#[derive(Debug, Clone)]
pub struct Document {
    /// Path relative to the knowledge base root.
    pub source: String,
    pub content: String,
}

/// Load every document under `root`, sorted by relative path.
///
/// A missing root yields no documents.
pub async fn load_documents(root: &Path) -> Result<Vec<Document>, KnowledgeError> {
    let mut files = Vec::new();
    if fs::metadata(root).await.is_err() {
        tracing::warn!(path = %root.display(), "Knowledge base directory not found");
        return Ok(Vec::new());
    }
    collect_files(root, &mut files).await?;
    files.sort();

    let mut documents = Vec::with_capacity(files.len());
    for path in files {
        let content = fs::read_to_string(&path)
            .await
            .map_err(|source| KnowledgeError::Read {
                path: path.display().to_string(),
                source,
            })?;
        let source = path
            .strip_prefix(root)
            .unwrap_or(&path)
            .to_string_lossy()
            .to_string();
        documents.push(Document { source, content });
    }
    Ok(documents)
}

fn is_document(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let e = e.to_lowercase();
            DOCUMENT_EXTENSIONS.contains(&e.as_str())
        })
        .unwrap_or(false)
}

/// Recursively collect document paths.
fn collect_files<'a>(
    dir: &'a Path,
    out: &'a mut Vec<PathBuf>,
) -> Pin<Box<dyn Future<Output = Result<(), KnowledgeError>> + Send + 'a>> {
    Box::pin(async move {
        let read_err = |source| KnowledgeError::Read {
            path: dir.display().to_string(),
            source,
        };

        let mut entries = fs::read_dir(dir).await.map_err(read_err)?;
        while let Some(entry) = entries.next_entry().await.map_err(read_err)? {
            let path = entry.path();
            let metadata = entry.metadata().await.map_err(read_err)?;
            if metadata.is_dir() {
                collect_files(&path, out).await?;
            } else if metadata.is_file() && is_document(&path) {
                out.push(path);
            }
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn loads_markdown_and_text_recursively() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("db")).unwrap();
        std::fs::write(dir.path().join("daily_report.md"), "# Daily report").unwrap();
        std::fs::write(dir.path().join("db").join("latency.TXT"), "check cpu").unwrap();
        std::fs::write(dir.path().join("image.png"), [0u8, 1, 2]).unwrap();

        let docs = load_documents(dir.path()).await.unwrap();
        let sources: Vec<&str> = docs.iter().map(|d| d.source.as_str()).collect();
        assert_eq!(docs.len(), 2);
        assert!(sources.contains(&"daily_report.md"));
        assert!(sources.iter().any(|s| s.ends_with("latency.TXT")));
    }

    #[tokio::test]
    async fn missing_directory_is_empty() {
        let dir = TempDir::new().unwrap();
        let docs = load_documents(&dir.path().join("nope")).await.unwrap();
        assert!(docs.is_empty());
    }
}

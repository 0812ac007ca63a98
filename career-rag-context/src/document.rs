//! Source documents and the folder loader.

use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;

/// A loaded source document. `source` is the file name it was read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub source: String,
    pub content: String,
}

impl Document {
    pub fn new(source: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            content: content.into(),
        }
    }
}

/// Load every regular, non-hidden file directly inside `folder`.
///
/// Subdirectories are not descended into. Documents come back sorted by file
/// name. A folder that does not exist yields an empty list rather than an
/// error. Content that is not valid UTF-8 is decoded lossily.
pub fn load_documents(folder: &Path) -> io::Result<Vec<Document>> {
    if !folder.is_dir() {
        tracing::debug!("Document folder {} does not exist", folder.display());
        return Ok(Vec::new());
    }

    let mut documents = Vec::new();
    for entry in std::fs::read_dir(folder)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(source) = path.file_name().and_then(|n| n.to_str()) else {
            tracing::warn!("Skipping file with non UTF-8 name: {}", path.display());
            continue;
        };
        if source.starts_with('.') {
            continue;
        }

        let bytes = std::fs::read(&path)?;
        let content = match String::from_utf8(bytes) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("{} is not valid UTF-8, decoding lossily", path.display());
                String::from_utf8_lossy(err.as_bytes()).into_owned()
            }
        };
        documents.push(Document::new(source, content));
    }

    documents.sort_by(|a, b| a.source.cmp(&b.source));
    tracing::debug!(
        "Loaded {} documents from {}",
        documents.len(),
        folder.display()
    );
    Ok(documents)
}

use std::path::Path;

use anyhow::Context;
use docreg_http::Document;

/// Read a JSON document from disk
pub fn load_document(path: &Path) -> anyhow::Result<Document> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read document {}", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("Failed to parse document {}", path.display()))
}

/// Read the detached signature stored next to a document (`doc.json` -> `doc.sig`)
///
/// A missing signature file yields an empty signature.
pub fn load_signature(document_path: &Path) -> anyhow::Result<String> {
    let path = document_path.with_extension("sig");

    match std::fs::read_to_string(&path) {
        Ok(signature) => Ok(signature.trim().to_string()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
        Err(err) => Err(err).with_context(|| format!("Failed to read signature {}", path.display())),
    }
}

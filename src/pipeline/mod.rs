//! Pipeline entry points for roster operations.
//!
//! - `run_fetch`: Fetch and normalize a roster page through the store
//! - `run_convert`: Normalize a roster XML file from disk
//! - `run_validate`: Check configuration values

pub mod convert;
pub mod fetch;
pub mod validate;

use std::path::Path;

pub use convert::run_convert;
pub use fetch::run_fetch;
pub use validate::run_validate;

use crate::error::Result;
use crate::models::Document;

/// Write a document as pretty JSON to `output`, or stdout when `None`.
pub async fn write_document(document: &Document, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(document)?;
    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(path, json).await?;
            log::info!("Saved document to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::IndexDocument;
    use tempfile::TempDir;

    #[tokio::test]
    async fn writes_pretty_json_to_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("out/index.json");
        let document = Document::Index(IndexDocument {
            term: "FA14".into(),
            subjects: vec![],
        });

        write_document(&document, Some(&path)).await.unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, serde_json::json!({ "term": "FA14", "subjects": [] }));
    }
}

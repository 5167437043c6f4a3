// src/pipeline/convert.rs

//! Offline normalization of a saved roster page.

use std::path::Path;

use crate::error::Result;
use crate::models::{Config, Document};
use crate::services::Normalizer;
use crate::utils::xml::XmlTreeParser;

use super::write_document;

/// Parse and normalize XML text without touching the network.
pub fn convert_str(config: &Config, xml: &str) -> Result<Document> {
    let raw = XmlTreeParser::new(config.normalize.attribute_key.clone()).parse(xml)?;
    Normalizer::new(config).normalize(raw)
}

/// Normalize the roster XML file at `input` and write it out as JSON.
pub async fn run_convert(config: &Config, input: &Path, output: Option<&Path>) -> Result<()> {
    log::info!("Normalizing {}", input.display());
    let xml = tokio::fs::read_to_string(input).await?;
    let document = convert_str(config, &xml)?;
    log::info!("Normalized {} record(s)", document.len());
    write_document(&document, output).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    #[test]
    fn converts_index_page() {
        let xml = r#"<subjects term="FA14"><subject subject="CS" subject_ldescr="Computer Science" xml="x"/></subjects>"#;
        let Document::Index(index) = convert_str(&Config::default(), xml).unwrap() else {
            panic!("expected index page");
        };
        assert_eq!(index.term, "FA14");
        assert_eq!(index.subjects.len(), 1);
        assert_eq!(
            index.subjects[0].json,
            "http://api-mrkev.rhcloud.com/redapi/roster?CS"
        );
    }

    #[test]
    fn deeply_nested_body_is_rejected() {
        let depth = 200_000;
        let xml = format!("{}{}", "<a>".repeat(depth), "</a>".repeat(depth));
        let err = convert_str(&Config::default(), &xml).unwrap_err();
        assert!(matches!(err, AppError::Parse(_)));
    }

    #[tokio::test]
    async fn missing_input_file_is_io_error() {
        let err = run_convert(&Config::default(), Path::new("/nonexistent/cs.xml"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Io(_)));
    }
}

// src/pipeline/fetch.rs

//! Roster fetch pipeline.

use std::path::Path;

use crate::error::Result;
use crate::storage::RosterStore;

use super::write_document;

/// Fetch one roster page through the store and write it out as JSON.
pub async fn run_fetch(
    store: &RosterStore,
    subject: Option<&str>,
    term: Option<&str>,
    output: Option<&Path>,
) -> Result<()> {
    let key = store.key(subject, term);
    if key.subject.is_empty() {
        log::info!("Fetching subject index for {}", key.term);
    } else {
        log::info!("Fetching {} courses for {}", key.subject, key.term);
    }

    let document = store.get_json(subject, term).await?;
    log::info!("Normalized {} record(s)", document.len());

    write_document(&document, output).await
}

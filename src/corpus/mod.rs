//! Scraped agency records and their conversion into indexable text
//!
//! The scraper writes a JSON array of agencies, each with the services it
//! provides. Records are flattened into short `"name: url"` style strings.

use crate::error::{GovragError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One agency and the services it provides
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgencyRecord {
    pub agency_name: String,
    #[serde(default)]
    pub agency_url: String,
    #[serde(default)]
    pub services: Vec<String>,
}

/// Load the scraper's JSON output
pub fn load(path: &Path) -> Result<Vec<AgencyRecord>> {
    let content = std::fs::read_to_string(path).map_err(|e| GovragError::Io {
        source: e,
        context: format!("Failed to read corpus file: {:?}", path),
    })?;

    let records: Vec<AgencyRecord> =
        serde_json::from_str(&content).map_err(|e| GovragError::Json {
            source: e,
            context: format!("Failed to parse corpus file: {:?}", path),
        })?;

    tracing::info!("Loaded {} agencies from {:?}", records.len(), path);
    Ok(records)
}

/// Flatten agencies into text records, in file order.
///
/// Each agency yields `"{agency_name}: {agency_url}"` followed by one
/// `"{service}: {agency_name} ({agency_url})"` per service. Agencies without a
/// name are skipped.
pub fn to_text_records(records: &[AgencyRecord]) -> Vec<String> {
    let mut texts = Vec::new();

    for record in records {
        let name = record.agency_name.trim();
        if name.is_empty() {
            tracing::debug!("Skipping agency record without a name");
            continue;
        }
        let url = record.agency_url.trim();

        texts.push(format!("{}: {}", name, url));
        for service in &record.services {
            texts.push(format!("{}: {} ({})", service.trim(), name, url));
        }
    }

    texts
}

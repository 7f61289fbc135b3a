//! Parsed `run_results.json` documents and per-document status indexing.
//!
//! Only the fields the gate reads are modeled; dbt writes many more
//! (timings, adapter responses, compiled code) and serde ignores them.
use serde::Deserialize;
use std::collections::HashMap;

/// One run_results shard, i.e. the outcome of one pipeline attempt.
#[derive(Debug, Default, Deserialize)]
pub struct RunReport {
    #[serde(default)]
    pub results: Vec<ResultRecord>,
}

/// One node outcome within a shard. Records missing either field are
/// tolerated and simply contribute nothing to the status index.
#[derive(Debug, Deserialize)]
pub struct ResultRecord {
    #[serde(default)]
    pub unique_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl RunReport {
    /// Status by unique_id for this shard. Duplicate ids within one shard
    /// resolve last-seen-wins, matching the cross-shard folding direction.
    pub fn status_index(&self) -> HashMap<String, String> {
        let mut statuses = HashMap::new();
        for record in &self.results {
            if let (Some(unique_id), Some(status)) = (&record.unique_id, &record.status) {
                statuses.insert(unique_id.clone(), status.clone());
            }
        }
        statuses
    }
}

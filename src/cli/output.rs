//! CLI output: error mapping and presentation of service results.

use crate::error::SyncError;
use crate::ledger::RootRecord;
use crate::pool::PendingLeaf;
use crate::tree::Witness;
use crate::types::hash_to_hex;
use chrono::{TimeZone, Utc};
use comfy_table::{presets::UTF8_FULL, Table};
use serde_json::json;

/// Map domain/service errors to a string for CLI output.
pub fn map_error(e: &SyncError) -> String {
    match e {
        SyncError::RootNotFound(_) => format!("{} (run `merkle-sync roots` to list known roots)", e),
        SyncError::NotCreated(_) => format!("{} (run `merkle-sync create` first)", e),
        _ => e.to_string(),
    }
}

fn format_ms(ms: i64) -> String {
    Utc.timestamp_millis_opt(ms)
        .single()
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| ms.to_string())
}

pub fn format_roots_text(records: &[RootRecord]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Version", "Root", "Height", "Committed"]);
    for record in records {
        table.add_row(vec![
            record.version.to_string(),
            hash_to_hex(&record.root),
            record.height.to_string(),
            format_ms(record.committed_at_ms),
        ]);
    }
    table.to_string()
}

pub fn format_roots_json(records: &[RootRecord]) -> String {
    let rows: Vec<_> = records
        .iter()
        .map(|r| {
            json!({
                "version": r.version,
                "root": hash_to_hex(&r.root),
                "height": r.height,
                "committed_at": format_ms(r.committed_at_ms),
            })
        })
        .collect();
    serde_json::to_string_pretty(&rows).unwrap_or_default()
}

pub fn format_pending_text(leaves: &[PendingLeaf]) -> String {
    if leaves.is_empty() {
        return "No pending leaves".to_string();
    }
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Seq", "Index", "Hash", "Submitted"]);
    for leaf in leaves {
        table.add_row(vec![
            leaf.seq.to_string(),
            leaf.index.to_string(),
            hash_to_hex(&leaf.hash),
            format_ms(leaf.submitted_at_ms),
        ]);
    }
    table.to_string()
}

pub fn format_witness_json(index: u64, witness: &Witness) -> String {
    let path: Vec<_> = witness
        .path
        .iter()
        .map(|step| {
            json!({
                "sibling": hash_to_hex(&step.sibling),
                "sibling_is_left": step.sibling_is_left,
            })
        })
        .collect();
    serde_json::to_string_pretty(&json!({ "index": index, "path": path })).unwrap_or_default()
}

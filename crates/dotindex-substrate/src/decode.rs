//! Extrinsic shape filtering for dot-20 candidates.
//!
//! A candidate is a `utility.batchAll` with exactly two sub-calls: a
//! `balances.transferKeepAlive` followed by a `system.remark` whose text
//! parses as a dot-20 payload. Anything else is ignored, not an error.

use serde_json::Value;

use dotindex_core::instruction::Operation;
use dotindex_core::payload::{normalize_remark, parse_payload};

use crate::client::RawExtrinsic;

/// Minimum length of a plausible SS58 destination address.
const MIN_ADDRESS_LEN: usize = 40;

/// A decoded candidate, pending block-level context (index, timestamp).
#[derive(Debug, Clone)]
pub struct Candidate {
    pub to: String,
    pub transfer: u64,
    pub raw_content: String,
    pub trim_content: String,
    pub operation: Operation,
}

/// Filter one extrinsic down to a dot-20 candidate.
pub fn decode_candidate(extrinsic: &RawExtrinsic) -> Option<Candidate> {
    if extrinsic.section != "utility" || extrinsic.method != "batchAll" {
        return None;
    }
    let calls = extrinsic.args.get("calls")?.as_array()?;
    if calls.len() != 2 {
        return None;
    }

    let transfer = &calls[0];
    if transfer["section"] != "balances" || transfer["method"] != "transferKeepAlive" {
        return None;
    }
    let dest = transfer["args"]["dest"]["Id"].as_str()?;
    if dest.len() < MIN_ADDRESS_LEN {
        return None;
    }
    let value = parse_balance(&transfer["args"]["value"])?;

    let remark = &calls[1];
    if remark["section"] != "system" || remark["method"] != "remark" {
        return None;
    }
    let raw = remark["args"]["remark"].as_str()?;
    let normalized = normalize_remark(raw);
    let operation = parse_payload(&normalized)?;

    Some(Candidate {
        to: dest.to_string(),
        transfer: value,
        raw_content: raw.to_string(),
        trim_content: normalized,
        operation,
    })
}

/// Parse a balance that may be a JSON number or a comma-grouped
/// human-readable string (`"1,000,000"`).
fn parse_balance(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.replace(',', "").parse().ok(),
        _ => None,
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

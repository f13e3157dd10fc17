//! Remark normalization and dot-20 payload parsing.

use serde::Deserialize;

use crate::instruction::Operation;

/// Protocol tag every dot-20 payload must carry.
pub const PROTOCOL_TAG: &str = "dot-20";

/// The raw JSON shape of a remark payload, before operation typing.
#[derive(Debug, Deserialize)]
struct RawPayload {
    p: String,
    op: String,
    tick: String,
    amt: Option<i64>,
    start: Option<u64>,
    end: Option<u64>,
}

/// Normalize remark text before parsing: drop spaces, unify quote style,
/// lower-case.
pub fn normalize_remark(raw: &str) -> String {
    raw.replace(' ', "").replace('\'', "\"").to_lowercase()
}

/// Parse normalized remark text into an [`Operation`].
///
/// Returns `None` for anything that is not a well-formed dot-20 payload:
/// malformed JSON, a foreign protocol tag, an unsupported op, or a missing
/// tick. The caller discards the extrinsic in that case.
pub fn parse_payload(normalized: &str) -> Option<Operation> {
    let raw: RawPayload = serde_json::from_str(normalized).ok()?;
    if raw.p != PROTOCOL_TAG || raw.tick.is_empty() {
        return None;
    }
    match raw.op.as_str() {
        "deploy" => Some(Operation::Deploy {
            tick: raw.tick,
            amount: raw.amt.and_then(|v| u64::try_from(v).ok()).filter(|&v| v > 0),
            start: raw.start,
            end: raw.end,
        }),
        "mint" => Some(Operation::Mint { tick: raw.tick }),
        "transfer" => Some(Operation::Transfer {
            tick: raw.tick,
            amount: raw.amt.unwrap_or(0),
        }),
        _ => None,
    }
}

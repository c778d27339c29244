//! Message classification for ledger server push payloads
//!
//! Server responses are untagged unions distinguished only by which optional
//! keys are present under `result`. Classification therefore tests the known
//! shapes in a fixed precedence order (`account_data`, then `engine_result`,
//! then `state`) and the first match wins. A top-level `error_message` takes
//! precedence over everything, including a usable `result`.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::records::{LedgerRecord, RecordKind};

/// Classification failure taxonomy
///
/// Errors are values, not faults: they flow back to the ingestion
/// coordinator and are broadcast as events without stopping the stream.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message")]
pub enum ClassifyError {
    /// Payload is not valid JSON, or a matched branch is missing a required
    /// field. Not user-actionable; surfaced as a generic error.
    #[error("malformed payload")]
    MalformedPayload,

    /// The server explicitly signaled a failure; surfaced verbatim
    #[error("server reported error: {0}")]
    ServerReported(String),

    /// Well-formed JSON, but none of the known response shapes matched.
    /// Displayed like a malformed payload, kept distinct for diagnostics.
    #[error("unsupported payload shape")]
    UnsupportedShape,
}

/// Classify one raw text frame into a ledger record.
///
/// Exactly one of record or error is produced per call; a failed branch
/// never yields a partial record. `created_at` is stamped with the current
/// time on success, so records classified in receive order carry
/// non-decreasing timestamps.
pub fn classify(text: &str) -> Result<LedgerRecord, ClassifyError> {
    let json: Value =
        serde_json::from_str(text).map_err(|_| ClassifyError::MalformedPayload)?;

    // An explicit server error wins over every shape check below.
    if let Some(message) = json.get("error_message").and_then(Value::as_str) {
        if !message.is_empty() {
            return Err(ClassifyError::ServerReported(message.to_string()));
        }
    }

    // A missing or non-object `result` is tolerated: every lookup below then
    // reads as absent and the payload falls through to UnsupportedShape.
    let kind = match json.get("result").and_then(Value::as_object) {
        Some(result) => {
            if let Some(account_data) = result.get("account_data").and_then(Value::as_object) {
                info_from(account_data)?
            } else if is_present(result.get("engine_result")) {
                // Presence check only; the engine_result value itself is unused.
                transaction_from(result)?
            } else if let Some(state) = result.get("state").and_then(Value::as_object) {
                state_from(state)?
            } else {
                return Err(ClassifyError::UnsupportedShape);
            }
        }
        None => return Err(ClassifyError::UnsupportedShape),
    };

    Ok(LedgerRecord {
        kind,
        created_at: Utc::now(),
    })
}

/// Effective transaction fee in drops under the server's current load.
///
/// Computed in floating point; integer inputs, fractional result allowed.
/// A zero `load_base` is a domain error, never an infinity or NaN.
pub fn derive_fee(base_fee: i64, load_factor: i64, load_base: i64) -> Result<f64, ClassifyError> {
    if load_base == 0 {
        return Err(ClassifyError::MalformedPayload);
    }

    Ok(base_fee as f64 * load_factor as f64 / load_base as f64)
}

fn info_from(account_data: &Map<String, Value>) -> Result<RecordKind, ClassifyError> {
    Ok(RecordKind::Info {
        account: text_field(account_data, "Account")?,
        balance: text_field(account_data, "Balance")?,
        sequence: text_field(account_data, "Sequence")?,
    })
}

fn transaction_from(result: &Map<String, Value>) -> Result<RecordKind, ClassifyError> {
    let result_message = text_field(result, "engine_result_message")?;
    let tx = object_field(result, "tx_json")?;

    Ok(RecordKind::Transaction {
        account: text_field(tx, "Account")?,
        destination: text_field(tx, "Destination")?,
        amount: int_field(tx, "Amount")?,
        fee: int_field(tx, "Fee")?,
        sequence: int_field(tx, "Sequence")?,
        result_message,
    })
}

fn state_from(state: &Map<String, Value>) -> Result<RecordKind, ClassifyError> {
    let load_base = int_field(state, "load_base")?;
    let load_factor = int_field(state, "load_factor")?;
    let peers = int_field(state, "peers")?;

    let validated_ledger = object_field(state, "validated_ledger")?;
    let base_fee = int_field(validated_ledger, "base_fee")?;

    Ok(RecordKind::State {
        peer_count: peers,
        fee: derive_fee(base_fee, load_factor, load_base)?,
    })
}

/// A key counts as present when it exists with any non-null value
fn is_present(value: Option<&Value>) -> bool {
    matches!(value, Some(v) if !v.is_null())
}

/// Read a required textual field. Strings pass through verbatim; numbers are
/// rendered to their textual form (the upstream service emits both).
fn text_field(obj: &Map<String, Value>, key: &str) -> Result<String, ClassifyError> {
    match obj.get(key) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        _ => Err(ClassifyError::MalformedPayload),
    }
}

/// Read a required integer field, accepting integer strings as well
fn int_field(obj: &Map<String, Value>, key: &str) -> Result<i64, ClassifyError> {
    match obj.get(key) {
        Some(Value::Number(n)) => n.as_i64().ok_or(ClassifyError::MalformedPayload),
        Some(Value::String(s)) => s.parse().map_err(|_| ClassifyError::MalformedPayload),
        _ => Err(ClassifyError::MalformedPayload),
    }
}

fn object_field<'a>(
    obj: &'a Map<String, Value>,
    key: &str,
) -> Result<&'a Map<String, Value>, ClassifyError> {
    obj.get(key)
        .and_then(Value::as_object)
        .ok_or(ClassifyError::MalformedPayload)
}

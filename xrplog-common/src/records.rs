//! Record data model for classified ledger messages

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Classified message payloads, one variant per known server response shape
///
/// Server responses are untagged; the variant is decided by the classifier's
/// presence checks, never by a type field inside the payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RecordKind {
    /// Account info response (`result.account_data`)
    Info {
        account: String,
        /// Balance in drops, preserved as the server's textual representation.
        /// The upstream precision characteristics are unspecified, so this is
        /// never coerced to a native numeric type.
        balance: String,
        sequence: String,
    },

    /// Submitted-transaction result (`result.engine_result`)
    Transaction {
        account: String,
        destination: String,
        /// Amount in drops
        amount: i64,
        /// Fee in drops
        fee: i64,
        sequence: i64,
        result_message: String,
    },

    /// Server state snapshot (`result.state`)
    State {
        peer_count: i64,
        /// Effective transaction fee in drops, derived from the server's
        /// load factors. Already minor-unit; never divided further.
        fee: f64,
    },
}

/// A classified ledger message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerRecord {
    pub kind: RecordKind,
    /// Stamped at classification time, never read from the payload
    pub created_at: DateTime<Utc>,
}

/// A record persisted to the log store, with its store-assigned row id
///
/// Ids are unique, monotonically non-decreasing in assignment order, and
/// never reused after deletion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: i64,
    pub record: LedgerRecord,
}

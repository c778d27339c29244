//! Record store queries
//!
//! Append-only from the pipeline's perspective: records are inserted once,
//! listed newest-first, and eventually hard-deleted by id. There is no
//! update path; records are immutable after classification.

use chrono::TimeZone;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::records::{LedgerRecord, RecordKind, StoredRecord};
use crate::{Error, Result};

// Log row type discriminants
const TYPE_INFO: i64 = 0;
const TYPE_TRANSACTION: i64 = 1;
const TYPE_STATE: i64 = 2;

/// SQLite-backed store for classified records
#[derive(Clone)]
pub struct RecordStore {
    pool: SqlitePool,
}

impl RecordStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Append a classified record; returns the store-assigned row id.
    ///
    /// Ids are assigned by SQLite AUTOINCREMENT: unique, monotonically
    /// increasing, never reused after deletion.
    pub async fn append(&self, record: &LedgerRecord) -> Result<i64> {
        let time_created = record.created_at.timestamp_millis();

        let result = match &record.kind {
            RecordKind::Info {
                account,
                balance,
                sequence,
            } => {
                sqlx::query(
                    "INSERT INTO logs (type, account, balance, sequence, time_created) \
                     VALUES (?, ?, ?, ?, ?)",
                )
                .bind(TYPE_INFO)
                .bind(account)
                .bind(balance)
                .bind(sequence)
                .bind(time_created)
                .execute(&self.pool)
                .await?
            }
            RecordKind::Transaction {
                account,
                destination,
                amount,
                fee,
                sequence,
                result_message,
            } => {
                sqlx::query(
                    "INSERT INTO logs \
                     (type, account, destination, amount, fee, sequence, message, time_created) \
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
                )
                .bind(TYPE_TRANSACTION)
                .bind(account)
                .bind(destination)
                .bind(amount)
                .bind(*fee as f64)
                .bind(sequence.to_string())
                .bind(result_message)
                .bind(time_created)
                .execute(&self.pool)
                .await?
            }
            RecordKind::State { peer_count, fee } => {
                sqlx::query(
                    "INSERT INTO logs (type, peers, fee, time_created) VALUES (?, ?, ?, ?)",
                )
                .bind(TYPE_STATE)
                .bind(peer_count)
                .bind(fee)
                .bind(time_created)
                .execute(&self.pool)
                .await?
            }
        };

        Ok(result.last_insert_rowid())
    }

    /// Hard-delete records by id; returns the number of rows removed.
    /// Deletion is final; unknown ids are ignored.
    pub async fn delete_by_ids(&self, ids: &[i64]) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!("DELETE FROM logs WHERE id IN ({placeholders})");

        let mut query = sqlx::query(&sql);
        for id in ids {
            query = query.bind(id);
        }

        Ok(query.execute(&self.pool).await?.rows_affected())
    }

    /// All stored records, newest first. Ties on `time_created` (records
    /// classified within the same millisecond) break on id, so the order
    /// always reflects insertion order reversed.
    pub async fn list_ordered_by_created_at_desc(&self) -> Result<Vec<StoredRecord>> {
        let rows = sqlx::query(
            "SELECT id, type, account, destination, balance, amount, peers, fee, \
                    sequence, message, time_created \
             FROM logs ORDER BY time_created DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_record).collect()
    }
}

fn row_to_record(row: &SqliteRow) -> Result<StoredRecord> {
    let id: i64 = row.try_get("id")?;
    let row_type: i64 = row.try_get("type")?;

    let time_created: i64 = row.try_get("time_created")?;
    let created_at = chrono::Utc
        .timestamp_millis_opt(time_created)
        .single()
        .ok_or_else(|| Error::Internal(format!("invalid time_created in log row {id}")))?;

    let kind = match row_type {
        TYPE_INFO => RecordKind::Info {
            account: row.try_get("account")?,
            balance: row.try_get("balance")?,
            sequence: row.try_get("sequence")?,
        },
        TYPE_TRANSACTION => {
            // The fee column is REAL to accommodate state rows; transaction
            // fees are integral drops.
            let fee: f64 = row.try_get("fee")?;
            let sequence: String = row.try_get("sequence")?;

            RecordKind::Transaction {
                account: row.try_get("account")?,
                destination: row.try_get("destination")?,
                amount: row.try_get("amount")?,
                fee: fee as i64,
                sequence: sequence
                    .parse()
                    .map_err(|_| Error::Internal(format!("invalid sequence in log row {id}")))?,
                result_message: row.try_get("message")?,
            }
        }
        TYPE_STATE => RecordKind::State {
            peer_count: row.try_get("peers")?,
            fee: row.try_get("fee")?,
        },
        other => {
            return Err(Error::Internal(format!(
                "unknown log row type {other} in row {id}"
            )))
        }
    };

    Ok(StoredRecord {
        id,
        record: LedgerRecord { kind, created_at },
    })
}

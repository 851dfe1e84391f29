//! Ledger store: append, status transitions, filtered listing

use super::models::{NewTransaction, TransactionRecord, TxnStatus, TxnType};
use super::query::{Bind, ListMeta, ListQuery, build_where, normalize_page, order_clause};
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{PgConnection, PgPool, Postgres, Row};
use thiserror::Error;
use tracing::{error, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Transaction not found")]
    NotFound,
}

const TXN_COLUMNS: &str =
    "txn_id, wallet_id, sender_id, receiver_id, amount, txn_type, status, note, \
     created_at, updated_at";

fn row_to_record(row: &PgRow) -> Result<TransactionRecord, sqlx::Error> {
    // the column carries no CHECK constraint, so an unknown type means the
    // row was written outside this crate; surface it, never relabel it
    let txn_type = row
        .get::<&str, _>("txn_type")
        .parse::<TxnType>()
        .map_err(|e| sqlx::Error::ColumnDecode {
            index: "txn_type".into(),
            source: e.into(),
        })?;

    Ok(TransactionRecord {
        txn_id: row.get("txn_id"),
        wallet_id: row.get("wallet_id"),
        sender_id: row.get("sender_id"),
        receiver_id: row.get("receiver_id"),
        amount: row.get("amount"),
        txn_type,
        status: TxnStatus::from(row.get::<&str, _>("status")),
        note: row.get("note"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn apply_binds<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    binds: &[Bind],
) -> Query<'q, Postgres, PgArguments> {
    for bind in binds {
        query = match bind {
            Bind::Uuid(v) => query.bind(*v),
            Bind::Text(v) => query.bind(v.clone()),
            Bind::Amount(v) => query.bind(*v),
            Bind::Ts(v) => query.bind(*v),
        };
    }
    query
}

/// Append-only transaction log. Rows are born PENDING inside the operation's
/// database transaction and flipped to COMPLETED before commit; rows stranded
/// by an abort are swept to FAILED from outside the transaction.
pub struct TransactionLedger;

impl TransactionLedger {
    /// Insert one PENDING row inside the caller's transaction.
    pub async fn append(
        conn: &mut PgConnection,
        txn: &NewTransaction,
    ) -> Result<TransactionRecord, LedgerError> {
        let row = sqlx::query(&format!(
            "INSERT INTO wallet_txns_tb
               (wallet_id, sender_id, receiver_id, amount, txn_type, status, note)
             VALUES ($1, $2, $3, $4, $5, 'PENDING', $6)
             RETURNING {TXN_COLUMNS}"
        ))
        .bind(txn.wallet_id)
        .bind(txn.sender_id)
        .bind(txn.receiver_id)
        .bind(txn.amount)
        .bind(txn.txn_type.as_str())
        .bind(&txn.note)
        .fetch_one(&mut *conn)
        .await?;

        Ok(row_to_record(&row)?)
    }

    /// Insert a matched pair (or more) of PENDING rows in order, in one
    /// transaction. Consecutive txn_ids make the pair adjacent in history.
    pub async fn append_batch(
        conn: &mut PgConnection,
        txns: &[NewTransaction],
    ) -> Result<Vec<TransactionRecord>, LedgerError> {
        let mut records = Vec::with_capacity(txns.len());
        for txn in txns {
            records.push(Self::append(&mut *conn, txn).await?);
        }
        Ok(records)
    }

    /// Transition a row's status inside the caller's transaction.
    pub async fn set_status(
        conn: &mut PgConnection,
        txn_id: i64,
        status: TxnStatus,
    ) -> Result<TransactionRecord, LedgerError> {
        let row = sqlx::query(&format!(
            "UPDATE wallet_txns_tb SET status = $1, updated_at = NOW()
             WHERE txn_id = $2
             RETURNING {TXN_COLUMNS}"
        ))
        .bind(status.as_str())
        .bind(txn_id)
        .fetch_optional(&mut *conn)
        .await?;

        match row {
            Some(r) => Ok(row_to_record(&r)?),
            None => Err(LedgerError::NotFound),
        }
    }

    /// Best-effort sweep of rows stranded PENDING by an aborted operation.
    ///
    /// Runs on the pool, outside any transaction, after the abort. The guard
    /// on status keeps this from touching rows another retry already settled.
    /// Failures are logged and swallowed; the original operation error is
    /// what the caller reports.
    pub async fn mark_failed(pool: &PgPool, txn_ids: &[i64]) {
        if txn_ids.is_empty() {
            return;
        }
        let result = sqlx::query(
            "UPDATE wallet_txns_tb SET status = 'FAILED', updated_at = NOW()
             WHERE txn_id = ANY($1) AND status = 'PENDING'",
        )
        .bind(txn_ids)
        .execute(pool)
        .await;

        match result {
            Ok(done) => {
                if done.rows_affected() as usize != txn_ids.len() {
                    warn!(
                        expected = txn_ids.len(),
                        updated = done.rows_affected(),
                        "some pending rows were already settled during failure sweep"
                    );
                }
            }
            Err(e) => {
                error!(?txn_ids, error = %e, "failed to mark stranded transactions FAILED");
            }
        }
    }

    /// Filtered, sorted, paginated listing.
    ///
    /// `user_filter` is the effective party scope decided by policy; the
    /// query's own `user_id` must be resolved into it by the caller before
    /// this runs.
    pub async fn list(
        pool: &PgPool,
        user_filter: Option<Uuid>,
        q: &ListQuery,
    ) -> Result<(Vec<TransactionRecord>, ListMeta), LedgerError> {
        let (page, limit, offset) = normalize_page(q.page, q.limit);
        let w = build_where(user_filter, q);

        let count_sql = format!("SELECT COUNT(*) FROM wallet_txns_tb{}", w.sql());
        let total: i64 = apply_binds(sqlx::query(&count_sql), &w.binds)
            .fetch_one(pool)
            .await?
            .get(0);

        let limit_ph = w.next_placeholder();
        let offset_ph = limit_ph + 1;
        let page_sql = format!(
            "SELECT {TXN_COLUMNS} FROM wallet_txns_tb{}{} LIMIT ${limit_ph} OFFSET ${offset_ph}",
            w.sql(),
            order_clause(q.sort.as_deref()),
        );
        let rows = apply_binds(sqlx::query(&page_sql), &w.binds)
            .bind(limit as i64)
            .bind(offset)
            .fetch_all(pool)
            .await?;

        let records = rows
            .iter()
            .map(row_to_record)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((records, ListMeta::new(page, limit, total)))
    }
}

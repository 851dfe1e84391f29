//! The transfer engine: every money-movement operation as one atomic unit.
//!
//! Each operation follows the same template: validate without I/O, open one
//! database transaction, row-lock the wallet(s), insert PENDING ledger rows,
//! apply balance deltas through the guarded update, promote the rows to
//! COMPLETED, commit. Any failure after rows were inserted drops the
//! transaction and sweeps the stranded PENDING rows to FAILED from outside
//! the aborted scope.

use super::error::EngineError;
use super::types::{CashOutcome, ListPage, SendOutcome, SingleOutcome};
use crate::config::WalletConfig;
use crate::db::Database;
use crate::ledger::query::project_fields;
use crate::ledger::{ListMeta, ListQuery, NewTransaction, TransactionLedger, TxnStatus, TxnType};
use crate::money::Amount;
use crate::policy::{AuthorizationPolicy, Role};
use crate::wallet::{Wallet, WalletError, WalletStatus, WalletStore};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

fn parse_amount(input: &str) -> Result<Amount, EngineError> {
    Amount::parse(input).map_err(|e| EngineError::InvalidAmount(e.to_string()))
}

#[derive(Clone)]
pub struct TransferEngine {
    db: Arc<Database>,
    initial_balance: Decimal,
}

impl TransferEngine {
    pub fn new(db: Arc<Database>, config: &WalletConfig) -> Self {
        Self {
            db,
            initial_balance: config.initial_balance,
        }
    }

    fn pool(&self) -> &PgPool {
        self.db.pool()
    }

    /// Create the wallet for a newly provisioned user with the configured
    /// opening balance.
    pub async fn provision_wallet(&self, user_id: Uuid) -> Result<Wallet, EngineError> {
        let wallet = WalletStore::create(self.pool(), user_id, self.initial_balance).await?;
        info!(%user_id, wallet_id = %wallet.wallet_id, balance = %wallet.balance, "wallet provisioned");
        Ok(wallet)
    }

    /// Top up the caller's own wallet. Open to every role.
    pub async fn deposit(
        &self,
        caller_id: Uuid,
        amount: &str,
    ) -> Result<SingleOutcome, EngineError> {
        let amount = parse_amount(amount)?;

        let mut pending = Vec::new();
        let result = self.deposit_tx(caller_id, amount, &mut pending).await;
        if result.is_err() {
            TransactionLedger::mark_failed(self.pool(), &pending).await;
        }
        result
    }

    async fn deposit_tx(
        &self,
        caller_id: Uuid,
        amount: Amount,
        pending: &mut Vec<i64>,
    ) -> Result<SingleOutcome, EngineError> {
        let mut tx = self.pool().begin().await?;

        let wallet = lock_wallet(
            &mut tx,
            caller_id,
            "Wallet not found",
            "Wallet is blocked",
        )
        .await?;

        let record = TransactionLedger::append(
            &mut tx,
            &NewTransaction {
                wallet_id: wallet.wallet_id,
                sender_id: caller_id,
                receiver_id: caller_id,
                amount: amount.value(),
                txn_type: TxnType::Deposit,
                note: "Wallet top-up".to_string(),
            },
        )
        .await?;
        pending.push(record.txn_id);

        let wallet = WalletStore::adjust_balance(&mut tx, wallet.wallet_id, amount.value()).await?;
        let record = TransactionLedger::set_status(&mut tx, record.txn_id, TxnStatus::Completed).await?;

        tx.commit().await?;

        info!(%caller_id, txn_id = record.txn_id, amount = %amount, "deposit completed");
        Ok(SingleOutcome {
            wallet,
            transaction: record,
        })
    }

    /// Withdraw from the caller's own wallet. Agents are not permitted.
    pub async fn withdraw(
        &self,
        caller_id: Uuid,
        amount: &str,
        role: Role,
    ) -> Result<SingleOutcome, EngineError> {
        let amount = parse_amount(amount)?;
        if !AuthorizationPolicy::can_withdraw(role) {
            return Err(EngineError::RoleNotPermitted(
                "Agents are not allowed to withdraw money",
            ));
        }

        let mut pending = Vec::new();
        let result = self.withdraw_tx(caller_id, amount, &mut pending).await;
        if result.is_err() {
            TransactionLedger::mark_failed(self.pool(), &pending).await;
        }
        result
    }

    async fn withdraw_tx(
        &self,
        caller_id: Uuid,
        amount: Amount,
        pending: &mut Vec<i64>,
    ) -> Result<SingleOutcome, EngineError> {
        let mut tx = self.pool().begin().await?;

        let wallet = lock_wallet(
            &mut tx,
            caller_id,
            "Wallet not found",
            "Wallet is blocked",
        )
        .await?;

        let record = TransactionLedger::append(
            &mut tx,
            &NewTransaction {
                wallet_id: wallet.wallet_id,
                sender_id: caller_id,
                receiver_id: caller_id,
                amount: amount.value(),
                txn_type: TxnType::Withdraw,
                note: "Wallet withdrawal".to_string(),
            },
        )
        .await?;
        pending.push(record.txn_id);

        let wallet =
            WalletStore::adjust_balance(&mut tx, wallet.wallet_id, -amount.value()).await?;
        let record = TransactionLedger::set_status(&mut tx, record.txn_id, TxnStatus::Completed).await?;

        tx.commit().await?;

        info!(%caller_id, txn_id = record.txn_id, amount = %amount, "withdrawal completed");
        Ok(SingleOutcome {
            wallet,
            transaction: record,
        })
    }

    /// Peer transfer. Agents are not permitted; self-send is rejected.
    pub async fn send_money(
        &self,
        sender_id: Uuid,
        receiver_id: Uuid,
        amount: &str,
        role: Role,
    ) -> Result<SendOutcome, EngineError> {
        let amount = parse_amount(amount)?;
        if !AuthorizationPolicy::can_send(role) {
            return Err(EngineError::RoleNotPermitted(
                "Agents are not allowed to send money",
            ));
        }
        if receiver_id.is_nil() {
            return Err(EngineError::InvalidTargetId);
        }
        if sender_id == receiver_id {
            return Err(EngineError::SelfTransferNotAllowed);
        }

        let mut pending = Vec::new();
        let result = self
            .send_money_tx(sender_id, receiver_id, amount, &mut pending)
            .await;
        if result.is_err() {
            TransactionLedger::mark_failed(self.pool(), &pending).await;
        }
        result
    }

    async fn send_money_tx(
        &self,
        sender_id: Uuid,
        receiver_id: Uuid,
        amount: Amount,
        pending: &mut Vec<i64>,
    ) -> Result<SendOutcome, EngineError> {
        let mut tx = self.pool().begin().await?;

        let (sender_wallet, receiver_wallet) = lock_wallet_pair(
            &mut tx,
            (sender_id, "Sender wallet not found", "Sender wallet is blocked"),
            (
                receiver_id,
                "Receiver wallet not found",
                "Receiver wallet is blocked",
            ),
        )
        .await?;

        let records = TransactionLedger::append_batch(
            &mut tx,
            &[
                NewTransaction {
                    wallet_id: sender_wallet.wallet_id,
                    sender_id,
                    receiver_id,
                    amount: amount.value(),
                    txn_type: TxnType::Send,
                    note: format!("Money sent to user ID: {receiver_id}"),
                },
                NewTransaction {
                    wallet_id: receiver_wallet.wallet_id,
                    sender_id,
                    receiver_id,
                    amount: amount.value(),
                    txn_type: TxnType::Receive,
                    note: format!("Money received from user ID: {sender_id}"),
                },
            ],
        )
        .await?;
        pending.extend(records.iter().map(|r| r.txn_id));

        let sender_wallet =
            WalletStore::adjust_balance(&mut tx, sender_wallet.wallet_id, -amount.value()).await?;
        let receiver_wallet =
            WalletStore::adjust_balance(&mut tx, receiver_wallet.wallet_id, amount.value()).await?;

        let send_record =
            TransactionLedger::set_status(&mut tx, records[0].txn_id, TxnStatus::Completed).await?;
        TransactionLedger::set_status(&mut tx, records[1].txn_id, TxnStatus::Completed).await?;

        tx.commit().await?;

        info!(
            %sender_id, %receiver_id,
            txn_id = send_record.txn_id, amount = %amount,
            "peer transfer completed"
        );
        Ok(SendOutcome {
            sender_wallet,
            receiver_wallet,
            transaction: send_record,
        })
    }

    /// Agent moves money from their float into a user's wallet.
    pub async fn cash_in(
        &self,
        agent_id: Uuid,
        target_user_id: Uuid,
        amount: &str,
        role: Role,
    ) -> Result<CashOutcome, EngineError> {
        let amount = parse_amount(amount)?;
        if !AuthorizationPolicy::can_cash_in(role) {
            return Err(EngineError::RoleNotPermitted("Only agents can cash-in money"));
        }
        if target_user_id.is_nil() {
            return Err(EngineError::InvalidTargetId);
        }
        if agent_id == target_user_id {
            return Err(EngineError::SelfTransferNotAllowed);
        }

        let mut pending = Vec::new();
        let result = self
            .cash_in_tx(agent_id, target_user_id, amount, &mut pending)
            .await;
        if result.is_err() {
            TransactionLedger::mark_failed(self.pool(), &pending).await;
        }
        result
    }

    async fn cash_in_tx(
        &self,
        agent_id: Uuid,
        target_user_id: Uuid,
        amount: Amount,
        pending: &mut Vec<i64>,
    ) -> Result<CashOutcome, EngineError> {
        let mut tx = self.pool().begin().await?;

        let (agent_wallet, target_wallet) = lock_wallet_pair(
            &mut tx,
            (agent_id, "Agent wallet not found", "Agent wallet is blocked"),
            (
                target_user_id,
                "Target wallet not found",
                "Target wallet is blocked",
            ),
        )
        .await?;

        let records = TransactionLedger::append_batch(
            &mut tx,
            &[
                NewTransaction {
                    wallet_id: target_wallet.wallet_id,
                    sender_id: agent_id,
                    receiver_id: target_user_id,
                    amount: amount.value(),
                    txn_type: TxnType::CashIn,
                    note: format!(
                        "Cash-in of {amount} by agent {agent_id} to user {target_user_id}"
                    ),
                },
                NewTransaction {
                    wallet_id: agent_wallet.wallet_id,
                    sender_id: agent_id,
                    receiver_id: target_user_id,
                    amount: amount.value(),
                    txn_type: TxnType::Withdraw,
                    note: format!("Money cashed out for user {target_user_id} by agent"),
                },
            ],
        )
        .await?;
        pending.extend(records.iter().map(|r| r.txn_id));

        let agent_wallet =
            WalletStore::adjust_balance(&mut tx, agent_wallet.wallet_id, -amount.value())
                .await
                .map_err(|e| match e {
                    WalletError::InsufficientFunds => {
                        EngineError::InsufficientFunds("Agent has insufficient balance")
                    }
                    other => other.into(),
                })?;
        let target_wallet =
            WalletStore::adjust_balance(&mut tx, target_wallet.wallet_id, amount.value()).await?;

        let cash_in_record =
            TransactionLedger::set_status(&mut tx, records[0].txn_id, TxnStatus::Completed).await?;
        TransactionLedger::set_status(&mut tx, records[1].txn_id, TxnStatus::Completed).await?;

        tx.commit().await?;

        info!(
            %agent_id, %target_user_id,
            txn_id = cash_in_record.txn_id, amount = %amount,
            "cash-in completed"
        );
        Ok(CashOutcome {
            agent_wallet,
            target_wallet,
            transaction: cash_in_record,
        })
    }

    /// Agent moves money out of a user's wallet into their float.
    pub async fn cash_out(
        &self,
        agent_id: Uuid,
        target_user_id: Uuid,
        amount: &str,
        role: Role,
    ) -> Result<CashOutcome, EngineError> {
        let amount = parse_amount(amount)?;
        if !AuthorizationPolicy::can_cash_out(role) {
            return Err(EngineError::RoleNotPermitted(
                "Only agents can cash-out money",
            ));
        }
        if target_user_id.is_nil() {
            return Err(EngineError::InvalidTargetId);
        }
        if agent_id == target_user_id {
            return Err(EngineError::SelfTransferNotAllowed);
        }

        let mut pending = Vec::new();
        let result = self
            .cash_out_tx(agent_id, target_user_id, amount, &mut pending)
            .await;
        if result.is_err() {
            TransactionLedger::mark_failed(self.pool(), &pending).await;
        }
        result
    }

    async fn cash_out_tx(
        &self,
        agent_id: Uuid,
        target_user_id: Uuid,
        amount: Amount,
        pending: &mut Vec<i64>,
    ) -> Result<CashOutcome, EngineError> {
        let mut tx = self.pool().begin().await?;

        let (agent_wallet, target_wallet) = lock_wallet_pair(
            &mut tx,
            (agent_id, "Agent wallet not found", "Agent wallet is blocked"),
            (
                target_user_id,
                "Target wallet not found",
                "Target wallet is blocked",
            ),
        )
        .await?;

        let records = TransactionLedger::append_batch(
            &mut tx,
            &[
                NewTransaction {
                    wallet_id: target_wallet.wallet_id,
                    sender_id: target_user_id,
                    receiver_id: agent_id,
                    amount: amount.value(),
                    txn_type: TxnType::CashOut,
                    note: format!(
                        "Cash-out of {amount} by agent {agent_id} from user {target_user_id}"
                    ),
                },
                NewTransaction {
                    wallet_id: agent_wallet.wallet_id,
                    sender_id: target_user_id,
                    receiver_id: agent_id,
                    amount: amount.value(),
                    txn_type: TxnType::Deposit,
                    note: format!("Money cashed in from user {target_user_id} by agent"),
                },
            ],
        )
        .await?;
        pending.extend(records.iter().map(|r| r.txn_id));

        let target_wallet =
            WalletStore::adjust_balance(&mut tx, target_wallet.wallet_id, -amount.value()).await?;
        let agent_wallet =
            WalletStore::adjust_balance(&mut tx, agent_wallet.wallet_id, amount.value()).await?;

        let cash_out_record =
            TransactionLedger::set_status(&mut tx, records[0].txn_id, TxnStatus::Completed).await?;
        TransactionLedger::set_status(&mut tx, records[1].txn_id, TxnStatus::Completed).await?;

        tx.commit().await?;

        info!(
            %agent_id, %target_user_id,
            txn_id = cash_out_record.txn_id, amount = %amount,
            "cash-out completed"
        );
        Ok(CashOutcome {
            agent_wallet,
            target_wallet,
            transaction: cash_out_record,
        })
    }

    /// List ledger rows visible to the caller, filtered/sorted/paginated.
    pub async fn list_transactions(
        &self,
        caller_id: Uuid,
        role: Role,
        query: &ListQuery,
    ) -> Result<ListPage, EngineError> {
        let scope = AuthorizationPolicy::scope_history(caller_id, role, query.user_id)
            .map_err(|_| EngineError::Forbidden)?;

        let (records, meta) = TransactionLedger::list(self.pool(), scope, query).await?;

        let data = records
            .into_iter()
            .map(|r| {
                let row = serde_json::to_value(&r).unwrap_or_default();
                match query.fields.as_deref() {
                    Some(fields) => project_fields(row, fields),
                    None => row,
                }
            })
            .collect();

        Ok(ListPage { data, meta })
    }

    /// Administrative: block or unblock a wallet.
    pub async fn set_wallet_status(
        &self,
        wallet_id: Uuid,
        status: WalletStatus,
    ) -> Result<Wallet, EngineError> {
        let wallet = WalletStore::set_status(self.pool(), wallet_id, status).await?;
        info!(%wallet_id, status = %wallet.status, "wallet status updated");
        Ok(wallet)
    }

    /// Administrative: paginated wallet listing.
    pub async fn list_wallets(
        &self,
        page: Option<u32>,
        limit: Option<u32>,
    ) -> Result<(Vec<Wallet>, ListMeta), EngineError> {
        Ok(WalletStore::list(self.pool(), page, limit).await?)
    }
}

/// Row-lock one wallet, mapping missing and blocked to contextual errors.
async fn lock_wallet(
    conn: &mut PgConnection,
    user_id: Uuid,
    missing: &'static str,
    blocked: &'static str,
) -> Result<Wallet, EngineError> {
    let wallet = WalletStore::get_for_update(conn, user_id)
        .await?
        .ok_or(EngineError::WalletNotFound(missing))?;
    if wallet.is_blocked() {
        return Err(EngineError::WalletBlocked(blocked));
    }
    Ok(wallet)
}

/// Row-lock two wallets in sorted user-id order so concurrent dual-wallet
/// operations touching the same pair cannot deadlock.
async fn lock_wallet_pair(
    conn: &mut PgConnection,
    first: (Uuid, &'static str, &'static str),
    second: (Uuid, &'static str, &'static str),
) -> Result<(Wallet, Wallet), EngineError> {
    if first.0 <= second.0 {
        let a = lock_wallet(&mut *conn, first.0, first.1, first.2).await?;
        let b = lock_wallet(&mut *conn, second.0, second.1, second.2).await?;
        Ok((a, b))
    } else {
        let b = lock_wallet(&mut *conn, second.0, second.1, second.2).await?;
        let a = lock_wallet(&mut *conn, first.0, first.1, first.2).await?;
        Ok((a, b))
    }
}

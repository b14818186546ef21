//! Points ledger. Balances are always derived from the transaction log.

use chrono::Utc;
use diesel::dsl::sum;
use diesel::prelude::*;
use famdash_shared::domain::TransactionType;

use super::models::{NewPointTransaction, PointTransaction};
use super::schema::point_transactions::dsl as pt;
use super::{StorageError, Store};

/// Pages past this read as empty; keeps the offset inside `i64`.
const MAX_PAGE: usize = 1_000_000;

/// Result of a write that takes points from a member.
#[derive(Debug)]
pub enum Debit<T> {
    Applied(T),
    Insufficient { balance: i64, required: i64 },
}

/// Result of reversing a chore completion or habit log.
#[derive(Debug)]
pub enum UndoOutcome {
    Reverted { points: i32, balance: i64 },
    NothingToUndo,
    Insufficient { balance: i64, required: i64 },
}

pub(crate) fn balance_of(conn: &mut SqliteConnection, member: i32) -> QueryResult<i64> {
    let total: Option<i64> = pt::point_transactions
        .filter(pt::member_id.eq(member))
        .select(sum(pt::amount))
        .first(conn)?;
    Ok(total.unwrap_or(0))
}

/// Append one ledger row. Debit types are stored negative regardless of the
/// sign of `magnitude`; callers perform the balance check in the same transaction.
pub(crate) fn append(
    conn: &mut SqliteConnection,
    member: i32,
    magnitude: i32,
    kind: TransactionType,
    description: &str,
) -> QueryResult<PointTransaction> {
    let row = NewPointTransaction {
        member_id: member,
        amount: kind.signed(magnitude),
        kind: kind.as_str(),
        description,
        created_at: Utc::now().naive_utc(),
    };
    diesel::insert_into(pt::point_transactions)
        .values(&row)
        .returning(PointTransaction::as_returning())
        .get_result(conn)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LedgerSummary {
    pub balance: i64,
    pub lifetime_earned: i64,
    pub lifetime_spent: i64,
}

fn summary_of(conn: &mut SqliteConnection, member: i32) -> QueryResult<LedgerSummary> {
    let earned: Option<i64> = pt::point_transactions
        .filter(pt::member_id.eq(member))
        .filter(pt::amount.gt(0))
        .select(sum(pt::amount))
        .first(conn)?;
    let spent: Option<i64> = pt::point_transactions
        .filter(pt::member_id.eq(member))
        .filter(pt::amount.lt(0))
        .select(sum(pt::amount))
        .first(conn)?;
    let earned = earned.unwrap_or(0);
    let spent = spent.unwrap_or(0).abs();
    Ok(LedgerSummary {
        balance: earned - spent,
        lifetime_earned: earned,
        lifetime_spent: spent,
    })
}

impl Store {
    pub async fn balance(&self, member: i32) -> Result<i64, StorageError> {
        self.run(move |conn| Ok(balance_of(conn, member)?)).await
    }

    pub async fn ledger_summary(&self, member: i32) -> Result<LedgerSummary, StorageError> {
        self.run(move |conn| Ok(summary_of(conn, member)?)).await
    }

    pub async fn ledger_summaries(
        &self,
        members: Vec<i32>,
    ) -> Result<Vec<(i32, LedgerSummary)>, StorageError> {
        self.run(move |conn| {
            let mut out = Vec::with_capacity(members.len());
            for m in members {
                out.push((m, summary_of(conn, m)?));
            }
            Ok(out)
        })
        .await
    }

    pub async fn list_transactions(
        &self,
        member: i32,
        page: usize,
        per_page: usize,
    ) -> Result<Vec<PointTransaction>, StorageError> {
        let page = page.clamp(1, MAX_PAGE) as i64;
        let per_page = per_page.clamp(1, 500) as i64;
        let offset = (page - 1) * per_page;
        self.run(move |conn| {
            Ok(pt::point_transactions
                .filter(pt::member_id.eq(member))
                .order(pt::id.desc())
                .offset(offset)
                .limit(per_page)
                .select(PointTransaction::as_select())
                .load(conn)?)
        })
        .await
    }

    /// Credit points unconditionally.
    pub async fn credit(
        &self,
        member: i32,
        amount: i32,
        kind: TransactionType,
        description: &str,
    ) -> Result<PointTransaction, StorageError> {
        if kind.is_debit() || amount <= 0 {
            return Err(StorageError::InvalidInput(format!(
                "credit requires a positive amount and a credit type, got {amount} {kind}"
            )));
        }
        let description = description.to_string();
        self.run(move |conn| Ok(append(conn, member, amount, kind, &description)?))
            .await
    }

    /// Take points, refusing when the balance would go negative. The balance
    /// read and the insert share one write-locked transaction.
    pub async fn debit(
        &self,
        member: i32,
        amount: i32,
        kind: TransactionType,
        description: &str,
    ) -> Result<Debit<PointTransaction>, StorageError> {
        if !kind.is_debit() || amount <= 0 {
            return Err(StorageError::InvalidInput(format!(
                "debit requires a positive amount and a debit type, got {amount} {kind}"
            )));
        }
        let description = description.to_string();
        self.run(move |conn| {
            conn.immediate_transaction(|conn| -> Result<_, StorageError> {
                let balance = balance_of(conn, member)?;
                let required = i64::from(amount);
                if balance < required {
                    return Ok(Debit::Insufficient { balance, required });
                }
                let row = append(conn, member, amount, kind, &description)?;
                Ok(Debit::Applied(row))
            })
        })
        .await
    }
}

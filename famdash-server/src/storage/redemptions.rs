use chrono::Utc;
use diesel::dsl::sum;
use diesel::prelude::*;
use famdash_shared::domain::{RedemptionStatus, TransactionType};

use super::ledger::{append, balance_of};
use super::models::{NewRedemption, Redemption};
use super::schema::reward_redemptions::dsl as rr;
use super::{StorageError, Store};

/// Result of deciding a redemption.
#[derive(Debug)]
pub enum Decision {
    Decided(Redemption),
    NotFound,
    AlreadyProcessed(RedemptionStatus),
    Insufficient { balance: i64, required: i64 },
}

/// Result of asking for a reward.
#[derive(Debug)]
pub enum RequestOutcome {
    Created(Redemption),
    /// `available` is the balance less points held by pending requests.
    Insufficient {
        balance: i64,
        available: i64,
        required: i64,
    },
}

/// Points held by the member's PENDING requests.
fn pending_hold(conn: &mut SqliteConnection, member: i32) -> QueryResult<i64> {
    let held: Option<i64> = rr::reward_redemptions
        .filter(rr::requester_id.eq(member))
        .filter(rr::status.eq(RedemptionStatus::Pending.as_str()))
        .select(sum(rr::points_spent))
        .first(conn)?;
    Ok(held.unwrap_or(0))
}

impl Store {
    /// Create a PENDING redemption when the member can cover `cost`.
    ///
    /// Points already held by other pending requests are not available, so two
    /// requests that together exceed the balance cannot both be created. The
    /// balance read and the insert run under one `BEGIN IMMEDIATE`.
    pub async fn request_redemption(
        &self,
        reward: i32,
        requester: i32,
        cost: i32,
    ) -> Result<RequestOutcome, StorageError> {
        self.run(move |conn| {
            conn.immediate_transaction(|conn| -> Result<_, StorageError> {
                let balance = balance_of(conn, requester)?;
                let available = balance - pending_hold(conn, requester)?;
                let required = i64::from(cost);
                if available < required {
                    return Ok(RequestOutcome::Insufficient {
                        balance,
                        available,
                        required,
                    });
                }
                let row = diesel::insert_into(rr::reward_redemptions)
                    .values(&NewRedemption {
                        reward_id: reward,
                        requester_id: requester,
                        points_spent: cost,
                        status: RedemptionStatus::Pending.as_str(),
                        requested_at: Utc::now().naive_utc(),
                    })
                    .returning(Redemption::as_returning())
                    .get_result(conn)?;
                Ok(RequestOutcome::Created(row))
            })
        })
        .await
    }

    /// Move a PENDING redemption to APPROVED or DENIED.
    ///
    /// Approval re-checks the balance at decision time and appends the
    /// REDEMPTION debit in the same transaction as the status flip.
    pub async fn decide_redemption(
        &self,
        id: i32,
        decision: RedemptionStatus,
        approver: Option<i32>,
        denial_reason: Option<String>,
    ) -> Result<Decision, StorageError> {
        if !decision.is_terminal() {
            return Err(StorageError::InvalidInput(
                "decision must be APPROVED or DENIED".into(),
            ));
        }
        self.run(move |conn| {
            conn.immediate_transaction(|conn| -> Result<_, StorageError> {
                let Some(current) = rr::reward_redemptions
                    .find(id)
                    .select(Redemption::as_select())
                    .first(conn)
                    .optional()?
                else {
                    return Ok(Decision::NotFound);
                };
                let status = current
                    .status
                    .parse::<RedemptionStatus>()
                    .map_err(|e| StorageError::InvalidInput(e.to_string()))?;
                if status.is_terminal() {
                    return Ok(Decision::AlreadyProcessed(status));
                }

                let now = Utc::now().naive_utc();
                let mut transaction_id = None;
                if decision == RedemptionStatus::Approved {
                    let balance = balance_of(conn, current.requester_id)?;
                    let required = i64::from(current.points_spent);
                    if balance < required {
                        return Ok(Decision::Insufficient { balance, required });
                    }
                    let reward_name: String = {
                        use super::schema::rewards::dsl as r;
                        r::rewards.find(current.reward_id).select(r::name).first(conn)?
                    };
                    let tx = append(
                        conn,
                        current.requester_id,
                        current.points_spent,
                        TransactionType::Redemption,
                        &format!("Redeemed: {reward_name}"),
                    )?;
                    transaction_id = Some(tx.id);
                }

                let reason = match decision {
                    RedemptionStatus::Denied => denial_reason,
                    _ => None,
                };
                let updated = diesel::update(
                    rr::reward_redemptions
                        .filter(rr::id.eq(id))
                        .filter(rr::status.eq(RedemptionStatus::Pending.as_str())),
                )
                .set((
                    rr::status.eq(decision.as_str()),
                    rr::approver_id.eq(approver),
                    rr::denial_reason.eq(reason),
                    rr::transaction_id.eq(transaction_id),
                    rr::decided_at.eq(Some(now)),
                ))
                .returning(Redemption::as_returning())
                .get_result(conn)?;
                Ok(Decision::Decided(updated))
            })
        })
        .await
    }

    pub async fn get_redemption(&self, id: i32) -> Result<Option<Redemption>, StorageError> {
        self.run(move |conn| {
            Ok(rr::reward_redemptions
                .find(id)
                .select(Redemption::as_select())
                .first(conn)
                .optional()?)
        })
        .await
    }

    pub async fn list_redemptions(
        &self,
        status: Option<RedemptionStatus>,
        member: Option<i32>,
    ) -> Result<Vec<Redemption>, StorageError> {
        self.run(move |conn| {
            let mut q = rr::reward_redemptions
                .select(Redemption::as_select())
                .order(rr::id.desc())
                .into_boxed();
            if let Some(s) = status {
                q = q.filter(rr::status.eq(s.as_str()));
            }
            if let Some(m) = member {
                q = q.filter(rr::requester_id.eq(m));
            }
            Ok(q.load(conn)?)
        })
        .await
    }
}

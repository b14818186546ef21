use diesel::prelude::*;

use super::models::{Member, NewMember, NewReward, Reward};
use super::schema::{members, rewards};
use super::{StorageError, Store};

/// Owned member fields for inserts and updates.
#[derive(Debug, Clone)]
pub struct MemberFields {
    pub name: String,
    pub role: String,
    pub avatar: Option<String>,
    pub color: Option<String>,
    pub nfc_card_id: Option<String>,
}

impl MemberFields {
    fn as_new(&self) -> NewMember<'_> {
        NewMember {
            name: &self.name,
            role: &self.role,
            avatar: self.avatar.as_deref(),
            color: self.color.as_deref(),
            nfc_card_id: self.nfc_card_id.as_deref(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RewardFields {
    pub name: String,
    pub description: Option<String>,
    pub points_cost: i32,
    pub active: bool,
    pub is_cash_reward: bool,
    pub cash_value: Option<i32>,
}

impl RewardFields {
    fn as_new(&self) -> NewReward<'_> {
        NewReward {
            name: &self.name,
            description: self.description.as_deref(),
            points_cost: self.points_cost,
            active: self.active,
            is_cash_reward: self.is_cash_reward,
            cash_value: self.cash_value,
        }
    }
}

impl Store {
    // Members

    pub async fn list_members(&self) -> Result<Vec<Member>, StorageError> {
        self.run(|conn| {
            Ok(members::table
                .order(members::id.asc())
                .select(Member::as_select())
                .load(conn)?)
        })
        .await
    }

    pub async fn get_member(&self, id: i32) -> Result<Option<Member>, StorageError> {
        self.run(move |conn| {
            Ok(members::table
                .find(id)
                .select(Member::as_select())
                .first(conn)
                .optional()?)
        })
        .await
    }

    pub async fn get_member_by_card(&self, card: &str) -> Result<Option<Member>, StorageError> {
        let card = card.to_string();
        self.run(move |conn| {
            Ok(members::table
                .filter(members::nfc_card_id.eq(&card))
                .select(Member::as_select())
                .first(conn)
                .optional()?)
        })
        .await
    }

    pub async fn create_member(&self, fields: MemberFields) -> Result<Member, StorageError> {
        self.run(move |conn| {
            Ok(diesel::insert_into(members::table)
                .values(&fields.as_new())
                .returning(Member::as_returning())
                .get_result(conn)?)
        })
        .await
    }

    pub async fn update_member(
        &self,
        id: i32,
        fields: MemberFields,
    ) -> Result<Option<Member>, StorageError> {
        self.run(move |conn| {
            Ok(diesel::update(members::table.find(id))
                .set(&fields.as_new())
                .returning(Member::as_returning())
                .get_result(conn)
                .optional()?)
        })
        .await
    }

    /// Delete a member; dependent rows go with it via `ON DELETE CASCADE`.
    pub async fn delete_member(&self, id: i32) -> Result<bool, StorageError> {
        self.run(move |conn| Ok(diesel::delete(members::table.find(id)).execute(conn)? > 0))
            .await
    }

    // Rewards

    pub async fn list_rewards(&self, include_inactive: bool) -> Result<Vec<Reward>, StorageError> {
        self.run(move |conn| {
            let mut q = rewards::table
                .order((rewards::points_cost.asc(), rewards::id.asc()))
                .select(Reward::as_select())
                .into_boxed();
            if !include_inactive {
                q = q.filter(rewards::active.eq(true));
            }
            Ok(q.load(conn)?)
        })
        .await
    }

    pub async fn get_reward(&self, id: i32) -> Result<Option<Reward>, StorageError> {
        self.run(move |conn| {
            Ok(rewards::table
                .find(id)
                .select(Reward::as_select())
                .first(conn)
                .optional()?)
        })
        .await
    }

    pub async fn create_reward(&self, fields: RewardFields) -> Result<Reward, StorageError> {
        self.run(move |conn| {
            Ok(diesel::insert_into(rewards::table)
                .values(&fields.as_new())
                .returning(Reward::as_returning())
                .get_result(conn)?)
        })
        .await
    }

    pub async fn update_reward(
        &self,
        id: i32,
        fields: RewardFields,
    ) -> Result<Option<Reward>, StorageError> {
        self.run(move |conn| {
            Ok(diesel::update(rewards::table.find(id))
                .set(&fields.as_new())
                .returning(Reward::as_returning())
                .get_result(conn)
                .optional()?)
        })
        .await
    }

    /// Rewards are archived rather than deleted so redemptions keep their reference.
    pub async fn archive_reward(&self, id: i32) -> Result<bool, StorageError> {
        self.run(move |conn| {
            Ok(diesel::update(rewards::table.find(id))
                .set(rewards::active.eq(false))
                .execute(conn)?
                > 0)
        })
        .await
    }
}

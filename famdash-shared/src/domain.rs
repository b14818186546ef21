use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Household role of a family member. Children spend points, parents approve.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum MemberRole {
    Parent,
    Child,
}

impl MemberRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberRole::Parent => "PARENT",
            MemberRole::Child => "CHILD",
        }
    }
}

impl FromStr for MemberRole {
    type Err = UnknownVariant;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PARENT" => Ok(MemberRole::Parent),
            "CHILD" => Ok(MemberRole::Child),
            other => Err(UnknownVariant::new("member role", other)),
        }
    }
}

impl fmt::Display for MemberRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tag carried by every ledger entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    ChoreCompletion,
    HabitCompletion,
    Bonus,
    Deduction,
    Redemption,
    HabitUndo,
    ChoreUndo,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::ChoreCompletion => "CHORE_COMPLETION",
            TransactionType::HabitCompletion => "HABIT_COMPLETION",
            TransactionType::Bonus => "BONUS",
            TransactionType::Deduction => "DEDUCTION",
            TransactionType::Redemption => "REDEMPTION",
            TransactionType::HabitUndo => "HABIT_UNDO",
            TransactionType::ChoreUndo => "CHORE_UNDO",
        }
    }

    /// Debit types are written as negative amounts and must pass a balance check.
    pub fn is_debit(&self) -> bool {
        matches!(
            self,
            TransactionType::Deduction
                | TransactionType::Redemption
                | TransactionType::HabitUndo
                | TransactionType::ChoreUndo
        )
    }

    /// Signed ledger amount for a positive magnitude.
    pub fn signed(&self, magnitude: i32) -> i32 {
        if self.is_debit() {
            -magnitude.abs()
        } else {
            magnitude.abs()
        }
    }
}

impl FromStr for TransactionType {
    type Err = UnknownVariant;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CHORE_COMPLETION" => Ok(TransactionType::ChoreCompletion),
            "HABIT_COMPLETION" => Ok(TransactionType::HabitCompletion),
            "BONUS" => Ok(TransactionType::Bonus),
            "DEDUCTION" => Ok(TransactionType::Deduction),
            "REDEMPTION" => Ok(TransactionType::Redemption),
            "HABIT_UNDO" => Ok(TransactionType::HabitUndo),
            "CHORE_UNDO" => Ok(TransactionType::ChoreUndo),
            other => Err(UnknownVariant::new("transaction type", other)),
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// PENDING is the only non-terminal state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum RedemptionStatus {
    Pending,
    Approved,
    Denied,
}

impl RedemptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RedemptionStatus::Pending => "PENDING",
            RedemptionStatus::Approved => "APPROVED",
            RedemptionStatus::Denied => "DENIED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, RedemptionStatus::Pending)
    }
}

impl FromStr for RedemptionStatus {
    type Err = UnknownVariant;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(RedemptionStatus::Pending),
            "APPROVED" => Ok(RedemptionStatus::Approved),
            "DENIED" => Ok(RedemptionStatus::Denied),
            other => Err(UnknownVariant::new("redemption status", other)),
        }
    }
}

impl fmt::Display for RedemptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MealType::Breakfast => "BREAKFAST",
            MealType::Lunch => "LUNCH",
            MealType::Dinner => "DINNER",
            MealType::Snack => "SNACK",
        }
    }
}

impl FromStr for MealType {
    type Err = UnknownVariant;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BREAKFAST" => Ok(MealType::Breakfast),
            "LUNCH" => Ok(MealType::Lunch),
            "DINNER" => Ok(MealType::Dinner),
            "SNACK" => Ok(MealType::Snack),
            other => Err(UnknownVariant::new("meal type", other)),
        }
    }
}

/// One line of a recipe's ingredient list. Quantities are free text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debit_types_are_signed_negative() {
        assert_eq!(TransactionType::Redemption.signed(10), -10);
        assert_eq!(TransactionType::HabitUndo.signed(-3), -3);
        assert_eq!(TransactionType::Bonus.signed(7), 7);
        assert_eq!(TransactionType::ChoreCompletion.signed(-7), 7);
    }

    #[test]
    fn tags_survive_storage_text() {
        for t in [
            TransactionType::ChoreCompletion,
            TransactionType::HabitCompletion,
            TransactionType::Bonus,
            TransactionType::Deduction,
            TransactionType::Redemption,
            TransactionType::HabitUndo,
            TransactionType::ChoreUndo,
        ] {
            assert_eq!(t.as_str().parse::<TransactionType>().unwrap(), t);
        }
        assert!("REFUND".parse::<TransactionType>().is_err());
    }

    #[test]
    fn json_uses_screaming_case() {
        let v = serde_json::to_value(TransactionType::HabitUndo).unwrap();
        assert_eq!(v, serde_json::json!("HABIT_UNDO"));
        let r: MemberRole = serde_json::from_str("\"CHILD\"").unwrap();
        assert_eq!(r, MemberRole::Child);
    }

    #[test]
    fn only_pending_is_open() {
        assert!(!RedemptionStatus::Pending.is_terminal());
        assert!(RedemptionStatus::Approved.is_terminal());
        assert!(RedemptionStatus::Denied.is_terminal());
    }
}

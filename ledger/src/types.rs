use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

pub type UserId = u64;
pub type TransactionId = u64;
pub type QuestId = u64;
pub type GameId = u64;

/// Amounts are whole currency units
pub type Amount = u64;

/// The three balances every user holds
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pool {
    /// Withdrawable funds
    Wallet,
    /// Capital that sizes the daily quests
    Investment,
    /// Locked bonus, only released by the roulette
    Bonus,
}

impl fmt::Display for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pool::Wallet => write!(f, "wallet"),
            Pool::Investment => write!(f, "investment"),
            Pool::Bonus => write!(f, "bonus"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub full_name: Option<String>,
    pub wallet_balance: Amount,
    pub investment_balance: Amount,
    pub bonus_balance: Amount,
    pub is_bonus_unlocked: bool,
    pub level: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub(crate) fn balance_mut(&mut self, pool: Pool) -> &mut Amount {
        match pool {
            Pool::Wallet => &mut self.wallet_balance,
            Pool::Investment => &mut self.investment_balance,
            Pool::Bonus => &mut self.bonus_balance,
        }
    }

    /// Wallet plus investment; the locked bonus is not spendable
    pub fn total_balance(&self) -> Amount {
        self.wallet_balance.saturating_add(self.investment_balance)
    }
}

/// Input for account creation
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub email: String,
    pub full_name: Option<String>,
    pub is_admin: bool,
    /// Locked bonus the account starts with
    pub bonus: Amount,
}

pub const DEFAULT_LEVEL: &str = "Bronze";

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
    QuestReward,
    BonusUnlock,
    ChestStake,
    ChestWin,
}

impl TransactionKind {
    /// Deposits and withdrawals wait for an admin, everything else is
    /// recorded as already approved
    pub fn requires_approval(&self) -> bool {
        matches!(self, TransactionKind::Deposit | TransactionKind::Withdrawal)
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransactionKind::Deposit => "deposit",
            TransactionKind::Withdrawal => "withdrawal",
            TransactionKind::QuestReward => "quest_reward",
            TransactionKind::BonusUnlock => "bonus_unlock",
            TransactionKind::ChestStake => "chest_stake",
            TransactionKind::ChestWin => "chest_win",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Pending,
    Approved,
    Rejected,
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionStatus::Pending => write!(f, "pending"),
            TransactionStatus::Approved => write!(f, "approved"),
            TransactionStatus::Rejected => write!(f, "rejected"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: TransactionId,
    pub user_id: UserId,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub amount: Amount,
    pub description: String,
    pub status: TransactionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deposit_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wallet_address: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestKind {
    Video,
    Quiz,
    Link,
    Referral,
    Checkin,
    Review,
}

impl QuestKind {
    /// Templates in the order daily quests cycle through them
    pub const ROTATION: [QuestKind; 6] = [
        QuestKind::Video,
        QuestKind::Quiz,
        QuestKind::Link,
        QuestKind::Referral,
        QuestKind::Checkin,
        QuestKind::Review,
    ];

    pub fn description(&self) -> &'static str {
        match self {
            QuestKind::Video => "Watch a sponsored video",
            QuestKind::Quiz => "Answer the quiz of the day",
            QuestKind::Link => "Visit the partner link",
            QuestKind::Referral => "Share your referral link",
            QuestKind::Checkin => "Daily check-in bonus",
            QuestKind::Review => "Leave a review",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quest {
    pub id: QuestId,
    pub user_id: UserId,
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub kind: QuestKind,
    pub description: String,
    pub reward_amount: Amount,
    pub completed: bool,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChestStatus {
    Playing,
    Lost,
    CashedOut,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChestOutcome {
    Gain,
    Loss,
    Trap,
}

/// Payout multiplier held in tenths, so 1.2 is `Multiplier(12)`
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Multiplier(pub u32);

impl Multiplier {
    pub const ONE: Multiplier = Multiplier(10);
    pub const FLOOR: Multiplier = Multiplier(5);

    pub fn tenths(&self) -> u32 {
        self.0
    }

    pub fn as_f64(&self) -> f64 {
        f64::from(self.0) / 10.0
    }

    /// `floor(amount * multiplier)`, `None` on overflow
    pub fn apply(&self, amount: Amount) -> Option<Amount> {
        amount.checked_mul(u64::from(self.0)).map(|scaled| scaled / 10)
    }
}

impl fmt::Display for Multiplier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.0 / 10, self.0 % 10)
    }
}

impl Serialize for Multiplier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChestGame {
    pub id: GameId,
    pub user_id: UserId,
    pub status: ChestStatus,
    pub difficulty: Difficulty,
    pub stake: Amount,
    pub current_multiplier: Multiplier,
    pub secured_gains: Amount,
    pub chests_opened: u32,
}

/// One row of the leaderboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub id: UserId,
    pub full_name: Option<String>,
    pub level: String,
    pub investment_balance: Amount,
    pub wallet_balance: Amount,
    pub referral_earnings: Amount,
    pub total_earnings: Amount,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_multiplier_formatting() {
        assert_eq!(Multiplier(16).to_string(), "1.6");
        assert_eq!(Multiplier(5).to_string(), "0.5");
        assert_eq!(Multiplier(26).as_f64(), 2.6);
        assert_eq!(Multiplier(16).apply(100), Some(160));
        assert_eq!(Multiplier(8).apply(15), Some(12));
        assert_eq!(Multiplier(10).apply(u64::MAX), None);
    }

    #[test]
    fn test_chest_game_json_shape() {
        let game = ChestGame {
            id: 3,
            user_id: 9,
            status: ChestStatus::CashedOut,
            difficulty: Difficulty::Hard,
            stake: 100,
            current_multiplier: Multiplier(18),
            secured_gains: 180,
            chests_opened: 1,
        };
        assert_eq!(
            serde_json::to_value(&game).unwrap(),
            json!({
                "id": 3,
                "userId": 9,
                "status": "cashed_out",
                "difficulty": "hard",
                "stake": 100,
                "currentMultiplier": 1.8,
                "securedGains": 180,
                "chestsOpened": 1
            })
        );
    }

    #[test]
    fn test_transaction_kind_is_serialized_as_type() {
        let tx = Transaction {
            id: 1,
            user_id: 2,
            kind: TransactionKind::BonusUnlock,
            amount: 50,
            description: "unlock".to_string(),
            status: TransactionStatus::Approved,
            admin_note: None,
            deposit_address: None,
            wallet_address: None,
            created_at: Utc::now(),
        };
        let value = serde_json::to_value(&tx).unwrap();
        assert_eq!(value["type"], "bonus_unlock");
        assert_eq!(value["status"], "approved");
        assert!(value.get("adminNote").is_none());
        assert_eq!(TransactionKind::Deposit.to_string(), "deposit");
        assert!(TransactionKind::Withdrawal.requires_approval());
        assert!(!TransactionKind::ChestWin.requires_approval());
    }
}

use chrono::NaiveDate;

use crate::error::{LedgerError, Result};
use crate::store::{Entry, Ledger, Movement};
use crate::types::{Amount, Pool, Quest, QuestId, QuestKind, TransactionKind, User, UserId};

/// Every user gets at least this many quests once they have invested
pub const BASE_QUEST_COUNT: u64 = 4;
/// One extra quest per this much investment
pub const INVESTMENT_PER_EXTRA_QUEST: Amount = 50_000;
/// Reward per quest, as a percentage of the investment balance
pub const QUEST_REWARD_PERCENT: Amount = 35;

/// Number of quests generated for an investment balance
pub fn quest_count(investment: Amount) -> u64 {
    if investment == 0 {
        return 0;
    }
    BASE_QUEST_COUNT + investment / INVESTMENT_PER_EXTRA_QUEST
}

/// Reward paid by each quest; all quests of a day share it
pub fn quest_reward(investment: Amount) -> Amount {
    // u128 keeps the multiplication exact for any u64 balance
    (u128::from(investment) * u128::from(QUEST_REWARD_PERCENT) / 100) as Amount
}

impl Ledger {
    /// Returns the user's quests for `today`, generating them on first call.
    ///
    /// Generation happens at most once per user and day: a later call the
    /// same day returns the stored set even if the investment changed. With
    /// no investment nothing is generated, so a later call that day may still
    /// generate once capital arrives.
    pub fn daily_quests(&mut self, user_id: UserId, today: NaiveDate) -> Result<Vec<Quest>> {
        let investment = self.user(user_id)?.investment_balance;

        if !self.daily_quests.contains_key(&(user_id, today)) {
            let count = quest_count(investment);
            if count == 0 {
                return Ok(Vec::new());
            }

            let reward = quest_reward(investment);
            let mut ids = Vec::new();
            for kind in QuestKind::ROTATION.iter().cycle().take(count as usize) {
                let id = self.next_quest_id();
                self.quests.insert(
                    id,
                    Quest {
                        id,
                        user_id,
                        date: today,
                        kind: *kind,
                        description: kind.description().to_string(),
                        reward_amount: reward,
                        completed: false,
                    },
                );
                ids.push(id);
            }
            self.daily_quests.insert((user_id, today), ids);
        }

        let quests = self
            .daily_quests
            .get(&(user_id, today))
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| self.quests.get(id))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(quests)
    }

    /// Marks a quest complete and credits its reward to the wallet.
    pub fn complete_quest(&mut self, user_id: UserId, quest_id: QuestId) -> Result<(Quest, User)> {
        let quest = match self.quests.get(&quest_id) {
            Some(quest) if quest.user_id == user_id => quest.clone(),
            _ => return Err(LedgerError::QuestNotFound(quest_id)),
        };
        if quest.completed {
            return Err(LedgerError::QuestAlreadyCompleted(quest_id));
        }

        let reward = quest.reward_amount;
        let entry = (reward > 0).then(|| {
            Entry::new(
                TransactionKind::QuestReward,
                reward,
                format!("Quest reward: {}", quest.description),
            )
        });
        let (user, _) = self.post(user_id, &[Movement::Credit(Pool::Wallet, reward)], entry)?;

        let quest = match self.quests.get_mut(&quest_id) {
            Some(stored) => {
                stored.completed = true;
                stored.clone()
            }
            None => return Err(LedgerError::QuestNotFound(quest_id)),
        };
        Ok((quest, user))
    }
}

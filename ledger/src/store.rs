use chrono::{NaiveDate, Utc};
use std::collections::{BTreeMap, HashMap};

use crate::error::{LedgerError, Result};
use crate::types::{
    Amount, ChestGame, DEFAULT_LEVEL, GameId, NewUser, Pool, Quest, QuestId, Transaction,
    TransactionId, TransactionKind, TransactionStatus, User, UserId,
};

/// A single balance change inside a transfer
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Movement {
    Credit(Pool, Amount),
    Debit(Pool, Amount),
}

/// Transaction record to append alongside a transfer
#[derive(Debug, Clone)]
pub struct Entry {
    pub kind: TransactionKind,
    pub amount: Amount,
    pub description: String,
    pub deposit_address: Option<String>,
    pub wallet_address: Option<String>,
}

impl Entry {
    pub fn new(kind: TransactionKind, amount: Amount, description: impl Into<String>) -> Self {
        Self {
            kind,
            amount,
            description: description.into(),
            deposit_address: None,
            wallet_address: None,
        }
    }
}

/// In-memory balance store and transaction log.
///
/// Every operation checks all of its preconditions and computes every
/// resulting balance before it writes anything, so a failed call leaves the
/// ledger untouched. Callers that share a `Ledger` across threads must
/// serialize access (the server keeps it behind a mutex).
#[derive(Debug, Default)]
pub struct Ledger {
    pub(crate) users: BTreeMap<UserId, User>,
    emails: HashMap<String, UserId>,
    pub(crate) transactions: BTreeMap<TransactionId, Transaction>,
    pub(crate) quests: BTreeMap<QuestId, Quest>,
    pub(crate) daily_quests: HashMap<(UserId, NaiveDate), Vec<QuestId>>,
    pub(crate) games: BTreeMap<GameId, ChestGame>,
    pub(crate) active_games: HashMap<UserId, GameId>,

    next_user_id: u64,
    next_transaction_id: u64,
    next_quest_id: u64,
    next_game_id: u64,
}

fn bump(counter: &mut u64) -> u64 {
    *counter += 1;
    *counter
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_user(&mut self, new_user: NewUser) -> Result<User> {
        let email = normalize_email(&new_user.email);
        if self.emails.contains_key(&email) {
            return Err(LedgerError::EmailTaken(email));
        }

        let id = bump(&mut self.next_user_id);
        let user = User {
            id,
            email: email.clone(),
            full_name: new_user.full_name,
            wallet_balance: 0,
            investment_balance: 0,
            bonus_balance: new_user.bonus,
            is_bonus_unlocked: false,
            level: DEFAULT_LEVEL.to_string(),
            is_admin: new_user.is_admin,
            created_at: Utc::now(),
        };

        self.emails.insert(email, id);
        self.users.insert(id, user.clone());
        Ok(user)
    }

    pub fn user(&self, user_id: UserId) -> Result<&User> {
        self.users
            .get(&user_id)
            .ok_or(LedgerError::UserNotFound(user_id))
    }

    pub fn transaction(&self, transaction_id: TransactionId) -> Result<&Transaction> {
        self.transactions
            .get(&transaction_id)
            .ok_or(LedgerError::TransactionNotFound(transaction_id))
    }

    /// A user's transactions, newest first
    pub fn transactions_for(&self, user_id: UserId) -> Vec<Transaction> {
        self.transactions
            .values()
            .rev()
            .filter(|tx| tx.user_id == user_id)
            .cloned()
            .collect()
    }

    /// Raw balance adjustment without a transaction record.
    ///
    /// Fails with `InsufficientFunds` rather than letting a balance go
    /// negative. Money-moving operations go through [`Ledger::post`] instead
    /// so the change and its log entry land together.
    pub fn adjust_balance(&mut self, user_id: UserId, pool: Pool, delta: i64) -> Result<User> {
        let movement = if delta >= 0 {
            Movement::Credit(pool, delta.unsigned_abs())
        } else {
            Movement::Debit(pool, delta.unsigned_abs())
        };
        let (user, _) = self.post(user_id, &[movement], None)?;
        Ok(user)
    }

    /// Applies `movements` to a user and appends `entry`, all or nothing.
    pub fn post(
        &mut self,
        user_id: UserId,
        movements: &[Movement],
        entry: Option<Entry>,
    ) -> Result<(User, Option<Transaction>)> {
        let mut updated = self.user(user_id)?.clone();
        for movement in movements {
            apply_movement(&mut updated, *movement)?;
        }

        self.users.insert(user_id, updated.clone());
        let transaction = entry.map(|entry| self.append(user_id, entry));
        Ok((updated, transaction))
    }

    fn append(&mut self, user_id: UserId, entry: Entry) -> Transaction {
        let status = if entry.kind.requires_approval() {
            TransactionStatus::Pending
        } else {
            TransactionStatus::Approved
        };
        let transaction = Transaction {
            id: bump(&mut self.next_transaction_id),
            user_id,
            kind: entry.kind,
            amount: entry.amount,
            description: entry.description,
            status,
            admin_note: None,
            deposit_address: entry.deposit_address,
            wallet_address: entry.wallet_address,
            created_at: Utc::now(),
        };
        self.transactions.insert(transaction.id, transaction.clone());
        transaction
    }

    pub(crate) fn next_quest_id(&mut self) -> QuestId {
        bump(&mut self.next_quest_id)
    }

    pub(crate) fn next_game_id(&mut self) -> GameId {
        bump(&mut self.next_game_id)
    }
}

fn apply_movement(user: &mut User, movement: Movement) -> Result<()> {
    match movement {
        Movement::Credit(pool, amount) => {
            let balance = user.balance_mut(pool);
            *balance = balance
                .checked_add(amount)
                .ok_or(LedgerError::Overflow(pool))?;
        }
        Movement::Debit(pool, amount) => {
            let balance = user.balance_mut(pool);
            if *balance < amount {
                return Err(LedgerError::InsufficientFunds {
                    pool,
                    needed: amount,
                    available: *balance,
                });
            }
            *balance -= amount;
        }
    }
    Ok(())
}

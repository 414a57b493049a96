use crate::error::{LedgerError, Result};
use crate::store::{Entry, Ledger, Movement};
use crate::types::{
    Amount, Pool, Transaction, TransactionId, TransactionKind, TransactionStatus, User, UserId,
};

pub const MIN_DEPOSIT: Amount = 20;
pub const MIN_WITHDRAWAL: Amount = 50;

/// Result of an admin decision: the updated transaction and, when a balance
/// moved, the owner's new state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub transaction: Transaction,
    pub owner: Option<User>,
}

impl Ledger {
    /// Records a deposit for admin review. Balances only move on approval.
    pub fn request_deposit(
        &mut self,
        user_id: UserId,
        amount: Amount,
        deposit_address: Option<String>,
    ) -> Result<Transaction> {
        if amount < MIN_DEPOSIT {
            return Err(LedgerError::AmountTooSmall {
                minimum: MIN_DEPOSIT,
                amount,
            });
        }

        let mut entry = Entry::new(
            TransactionKind::Deposit,
            amount,
            format!("Deposit of {amount}"),
        );
        entry.deposit_address = deposit_address;
        let (_, transaction) = self.post(user_id, &[], Some(entry))?;
        transaction.ok_or(LedgerError::UserNotFound(user_id))
    }

    /// Debits the wallet immediately and records the withdrawal for review.
    /// This is the only debit of the withdrawal lifecycle; rejection refunds
    /// it.
    pub fn request_withdrawal(
        &mut self,
        user_id: UserId,
        amount: Amount,
        wallet_address: Option<String>,
    ) -> Result<(Transaction, User)> {
        if amount < MIN_WITHDRAWAL {
            return Err(LedgerError::AmountTooSmall {
                minimum: MIN_WITHDRAWAL,
                amount,
            });
        }

        let mut entry = Entry::new(
            TransactionKind::Withdrawal,
            amount,
            "Withdrawal to mobile money",
        );
        entry.wallet_address = wallet_address;
        let (user, transaction) =
            self.post(user_id, &[Movement::Debit(Pool::Wallet, amount)], Some(entry))?;
        let transaction = transaction.ok_or(LedgerError::UserNotFound(user_id))?;
        Ok((transaction, user))
    }

    /// Re-reads the caller's admin flag on every privileged call.
    fn ensure_admin(&self, admin_id: UserId) -> Result<()> {
        match self.users.get(&admin_id) {
            Some(user) if user.is_admin => Ok(()),
            _ => Err(LedgerError::Forbidden),
        }
    }

    /// Transactions awaiting review across all users, oldest first
    pub fn pending_transactions(&self, admin_id: UserId) -> Result<Vec<Transaction>> {
        self.ensure_admin(admin_id)?;
        Ok(self
            .transactions
            .values()
            .filter(|tx| tx.status == TransactionStatus::Pending)
            .cloned()
            .collect())
    }

    pub fn approve_transaction(
        &mut self,
        admin_id: UserId,
        transaction_id: TransactionId,
        admin_note: Option<String>,
    ) -> Result<Decision> {
        self.decide(admin_id, transaction_id, TransactionStatus::Approved, admin_note)
    }

    pub fn reject_transaction(
        &mut self,
        admin_id: UserId,
        transaction_id: TransactionId,
        admin_note: Option<String>,
    ) -> Result<Decision> {
        self.decide(admin_id, transaction_id, TransactionStatus::Rejected, admin_note)
    }

    /// Moves a pending transaction to its terminal status exactly once and
    /// applies the balance effect for that transition:
    ///
    /// | kind | approved | rejected |
    /// |---|---|---|
    /// | deposit | investment += amount | nothing |
    /// | withdrawal | nothing (debited at request) | wallet += amount |
    fn decide(
        &mut self,
        admin_id: UserId,
        transaction_id: TransactionId,
        status: TransactionStatus,
        admin_note: Option<String>,
    ) -> Result<Decision> {
        self.ensure_admin(admin_id)?;

        let transaction = self.transaction(transaction_id)?;
        if !transaction.kind.requires_approval() {
            return Err(LedgerError::NotApprovable(transaction.kind));
        }
        if transaction.status != TransactionStatus::Pending {
            return Err(LedgerError::AlreadyProcessed {
                id: transaction_id,
                status: transaction.status,
            });
        }

        let owner_id = transaction.user_id;
        let amount = transaction.amount;
        let movement = match (transaction.kind, status) {
            (TransactionKind::Deposit, TransactionStatus::Approved) => {
                Some(Movement::Credit(Pool::Investment, amount))
            }
            (TransactionKind::Withdrawal, TransactionStatus::Rejected) => {
                Some(Movement::Credit(Pool::Wallet, amount))
            }
            _ => None,
        };

        let owner = match movement {
            Some(movement) => Some(self.post(owner_id, &[movement], None)?.0),
            None => None,
        };

        let transaction = self
            .transactions
            .get_mut(&transaction_id)
            .ok_or(LedgerError::TransactionNotFound(transaction_id))?;
        transaction.status = status;
        if admin_note.is_some() {
            transaction.admin_note = admin_note;
        }

        Ok(Decision {
            transaction: transaction.clone(),
            owner,
        })
    }
}

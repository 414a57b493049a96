use thiserror::Error;

use crate::types::{Amount, Pool, QuestId, TransactionId, TransactionKind, TransactionStatus, UserId};

/// Coarse classification used by callers to pick a response status
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidState,
    InsufficientFunds,
    Forbidden,
    Invalid,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("user {0} not found")]
    UserNotFound(UserId),
    #[error("quest {0} not found")]
    QuestNotFound(QuestId),
    #[error("transaction {0} not found")]
    TransactionNotFound(TransactionId),
    #[error("no active chest game")]
    NoActiveGame,
    #[error("email {0} is already registered")]
    EmailTaken(String),
    #[error("quest {0} already completed")]
    QuestAlreadyCompleted(QuestId),
    #[error("no bonus to unlock")]
    NoBonusAvailable,
    #[error("a chest game is already in progress")]
    GameInProgress,
    #[error("transaction {id} is already {status}")]
    AlreadyProcessed {
        id: TransactionId,
        status: TransactionStatus,
    },
    #[error("{0} transactions are not subject to approval")]
    NotApprovable(TransactionKind),
    #[error("insufficient {pool} balance: need {needed}, have {available}")]
    InsufficientFunds {
        pool: Pool,
        needed: Amount,
        available: Amount,
    },
    #[error("amount must be at least {minimum}, got {amount}")]
    AmountTooSmall { minimum: Amount, amount: Amount },
    #[error("{0} balance overflow")]
    Overflow(Pool),
    #[error("admin privileges required")]
    Forbidden,
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::UserNotFound(_)
            | LedgerError::QuestNotFound(_)
            | LedgerError::TransactionNotFound(_)
            | LedgerError::NoActiveGame => ErrorKind::NotFound,
            LedgerError::QuestAlreadyCompleted(_)
            | LedgerError::NoBonusAvailable
            | LedgerError::GameInProgress
            | LedgerError::AlreadyProcessed { .. }
            | LedgerError::NotApprovable(_) => ErrorKind::InvalidState,
            LedgerError::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            LedgerError::Forbidden => ErrorKind::Forbidden,
            LedgerError::EmailTaken(_)
            | LedgerError::AmountTooSmall { .. }
            | LedgerError::Overflow(_) => ErrorKind::Invalid,
        }
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;

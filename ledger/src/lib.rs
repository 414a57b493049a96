//! Balance-transfer and game-resolution engine.
//!
//! A [`Ledger`] holds three balances per user (wallet, investment, locked
//! bonus) and an append-only transaction log. Value moves between the pools
//! through daily quests, the bonus roulette, the chest game and the
//! admin-gated deposit/withdrawal workflow. Every transfer is applied
//! atomically together with its log entry.

pub mod approvals;
pub mod chest;
pub mod error;
pub mod leaderboard;
pub mod quests;
pub mod roulette;
pub mod store;
pub mod types;

pub use approvals::Decision;
pub use error::{ErrorKind, LedgerError, Result};
pub use roulette::SpinResult;
pub use store::{Entry, Ledger, Movement};

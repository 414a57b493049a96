use rand::Rng;

use crate::error::{LedgerError, Result};
use crate::store::{Entry, Ledger, Movement};
use crate::types::{Amount, Pool, TransactionKind, User, UserId};

/// A draw strictly above this wins, giving a 40% win chance
pub const WIN_THRESHOLD: f64 = 0.6;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpinResult {
    pub won: bool,
    /// Bonus moved to the wallet, zero on a loss
    pub unlocked: Amount,
    pub user: User,
}

impl Ledger {
    pub fn spin_roulette<R: Rng>(&mut self, user_id: UserId, rng: &mut R) -> Result<SpinResult> {
        self.spin_roulette_with_draw(user_id, rng.r#gen::<f64>())
    }

    /// Resolves a spin from a uniform draw in `[0, 1)`.
    pub fn spin_roulette_with_draw(&mut self, user_id: UserId, draw: f64) -> Result<SpinResult> {
        let user = self.user(user_id)?;
        let bonus = user.bonus_balance;
        if bonus == 0 {
            return Err(LedgerError::NoBonusAvailable);
        }

        if draw <= WIN_THRESHOLD {
            return Ok(SpinResult {
                won: false,
                unlocked: 0,
                user: user.clone(),
            });
        }

        self.post(
            user_id,
            &[
                Movement::Debit(Pool::Bonus, bonus),
                Movement::Credit(Pool::Wallet, bonus),
            ],
            Some(Entry::new(
                TransactionKind::BonusUnlock,
                bonus,
                "Bonus unlocked at the roulette",
            )),
        )?;

        let user = self
            .users
            .get_mut(&user_id)
            .ok_or(LedgerError::UserNotFound(user_id))?;
        user.is_bonus_unlocked = true;

        Ok(SpinResult {
            won: true,
            unlocked: bonus,
            user: user.clone(),
        })
    }
}

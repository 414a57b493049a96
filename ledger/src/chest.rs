use rand::Rng;

use crate::error::{LedgerError, Result};
use crate::store::{Entry, Ledger, Movement};
use crate::types::{
    Amount, ChestGame, ChestOutcome, ChestStatus, Difficulty, Multiplier, Pool, TransactionKind,
    User, UserId,
};

pub const MIN_STAKE: Amount = 1;

/// Multiplier lost on a `Loss` outcome, in tenths
const LOSS_STEP: u32 = 2;

impl Difficulty {
    /// Upper bounds of the gain and loss bands on the `[0, 1)` draw; draws
    /// at or above the second bound are traps.
    ///
    /// | difficulty | gain | loss | trap |
    /// |---|---|---|---|
    /// | easy | 66% | 0% | 34% |
    /// | medium | 50% | 30% | 20% |
    /// | hard | 33% | 27% | 40% |
    pub fn bands(&self) -> (f64, f64) {
        match self {
            Difficulty::Easy => (0.66, 0.66),
            Difficulty::Medium => (0.50, 0.80),
            Difficulty::Hard => (0.33, 0.60),
        }
    }

    /// Multiplier added on a `Gain` outcome, in tenths
    pub fn gain_step(&self) -> u32 {
        match self {
            Difficulty::Easy => 2,
            Difficulty::Medium => 4,
            Difficulty::Hard => 8,
        }
    }

    /// Maps a uniform draw in `[0, 1)` to an outcome: gains occupy the
    /// bottom of the range, losses the middle, traps the top.
    pub fn resolve(&self, draw: f64) -> ChestOutcome {
        let (gain_below, loss_below) = self.bands();
        if draw < gain_below {
            ChestOutcome::Gain
        } else if draw < loss_below {
            ChestOutcome::Loss
        } else {
            ChestOutcome::Trap
        }
    }
}

impl ChestGame {
    /// What cashing out right now would pay
    pub fn potential_win(&self) -> Option<Amount> {
        self.current_multiplier.apply(self.stake)
    }

    fn apply(&mut self, outcome: ChestOutcome) {
        let tenths = self.current_multiplier.tenths();
        match outcome {
            ChestOutcome::Trap => {
                self.status = ChestStatus::Lost;
                return;
            }
            ChestOutcome::Loss => {
                let lowered = tenths.saturating_sub(LOSS_STEP);
                self.current_multiplier = Multiplier(lowered).max(Multiplier::FLOOR);
            }
            ChestOutcome::Gain => {
                let raised = tenths.saturating_add(self.difficulty.gain_step());
                self.current_multiplier = Multiplier(raised);
            }
        }
        self.chests_opened += 1;
    }
}

impl Ledger {
    /// The user's game in progress, if any
    pub fn active_chest_game(&self, user_id: UserId) -> Option<&ChestGame> {
        self.active_games
            .get(&user_id)
            .and_then(|game_id| self.games.get(game_id))
    }

    /// Starts a game, taking the stake from the wallet first and the
    /// remainder from the investment.
    pub fn start_chest_game(
        &mut self,
        user_id: UserId,
        stake: Amount,
        difficulty: Difficulty,
    ) -> Result<(ChestGame, User)> {
        if stake < MIN_STAKE {
            return Err(LedgerError::AmountTooSmall {
                minimum: MIN_STAKE,
                amount: stake,
            });
        }
        if self.active_games.contains_key(&user_id) {
            return Err(LedgerError::GameInProgress);
        }

        let user = self.user(user_id)?;
        let wallet = user.wallet_balance;
        let available = user.total_balance();
        if available < stake {
            return Err(LedgerError::InsufficientFunds {
                pool: Pool::Wallet,
                needed: stake,
                available,
            });
        }

        let from_wallet = stake.min(wallet);
        let from_investment = stake - from_wallet;
        let mut movements = Vec::with_capacity(2);
        if from_wallet > 0 {
            movements.push(Movement::Debit(Pool::Wallet, from_wallet));
        }
        if from_investment > 0 {
            movements.push(Movement::Debit(Pool::Investment, from_investment));
        }

        let game_id = self.next_game_id();
        let (user, _) = self.post(
            user_id,
            &movements,
            Some(Entry::new(
                TransactionKind::ChestStake,
                stake,
                format!("Chest game #{game_id} stake ({difficulty:?})"),
            )),
        )?;

        let game = ChestGame {
            id: game_id,
            user_id,
            status: ChestStatus::Playing,
            difficulty,
            stake,
            current_multiplier: Multiplier::ONE,
            secured_gains: 0,
            chests_opened: 0,
        };
        self.games.insert(game_id, game.clone());
        self.active_games.insert(user_id, game_id);
        Ok((game, user))
    }

    pub fn open_chest<R: Rng>(
        &mut self,
        user_id: UserId,
        rng: &mut R,
    ) -> Result<(ChestOutcome, ChestGame)> {
        self.open_chest_with_draw(user_id, rng.r#gen::<f64>())
    }

    /// Opens one chest of the active game using a uniform draw in `[0, 1)`.
    pub fn open_chest_with_draw(
        &mut self,
        user_id: UserId,
        draw: f64,
    ) -> Result<(ChestOutcome, ChestGame)> {
        let game_id = *self
            .active_games
            .get(&user_id)
            .ok_or(LedgerError::NoActiveGame)?;
        let game = self
            .games
            .get_mut(&game_id)
            .ok_or(LedgerError::NoActiveGame)?;

        let outcome = game.difficulty.resolve(draw);
        game.apply(outcome);
        let game = game.clone();

        if game.status != ChestStatus::Playing {
            self.active_games.remove(&user_id);
        }
        Ok((outcome, game))
    }

    /// Ends the active game and credits `floor(stake * multiplier)` to the
    /// wallet.
    pub fn cash_out_chest_game(&mut self, user_id: UserId) -> Result<(ChestGame, User)> {
        let game_id = *self
            .active_games
            .get(&user_id)
            .ok_or(LedgerError::NoActiveGame)?;
        let game = self.games.get(&game_id).ok_or(LedgerError::NoActiveGame)?;
        let win = game
            .potential_win()
            .ok_or(LedgerError::Overflow(Pool::Wallet))?;

        let entry = (win > 0).then(|| {
            Entry::new(
                TransactionKind::ChestWin,
                win,
                format!(
                    "Chest game #{game_id} cashed out at x{}",
                    game.current_multiplier
                ),
            )
        });
        // Credits whatever the stored balance is now, not a snapshot taken
        // when the game started
        let (user, _) = self.post(user_id, &[Movement::Credit(Pool::Wallet, win)], entry)?;

        let game = self
            .games
            .get_mut(&game_id)
            .ok_or(LedgerError::NoActiveGame)?;
        game.status = ChestStatus::CashedOut;
        game.secured_gains = win;
        let game = game.clone();
        self.active_games.remove(&user_id);
        Ok((game, user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NewUser, TransactionStatus};
    use rand::{SeedableRng, rngs::StdRng};

    fn setup_ledger(wallet: i64, investment: i64) -> (Ledger, UserId) {
        let mut ledger = Ledger::new();
        let user = ledger
            .create_user(NewUser {
                email: "gambler@example.com".to_string(),
                ..Default::default()
            })
            .unwrap();
        ledger.adjust_balance(user.id, Pool::Wallet, wallet).unwrap();
        ledger
            .adjust_balance(user.id, Pool::Investment, investment)
            .unwrap();
        (ledger, user.id)
    }

    #[test]
    fn test_resolve_thresholds() {
        assert_eq!(Difficulty::Easy.resolve(0.0), ChestOutcome::Gain);
        assert_eq!(Difficulty::Easy.resolve(0.659), ChestOutcome::Gain);
        assert_eq!(Difficulty::Easy.resolve(0.66), ChestOutcome::Trap);

        assert_eq!(Difficulty::Medium.resolve(0.49), ChestOutcome::Gain);
        assert_eq!(Difficulty::Medium.resolve(0.5), ChestOutcome::Loss);
        assert_eq!(Difficulty::Medium.resolve(0.79), ChestOutcome::Loss);
        assert_eq!(Difficulty::Medium.resolve(0.8), ChestOutcome::Trap);

        assert_eq!(Difficulty::Hard.resolve(0.32), ChestOutcome::Gain);
        assert_eq!(Difficulty::Hard.resolve(0.33), ChestOutcome::Loss);
        assert_eq!(Difficulty::Hard.resolve(0.59), ChestOutcome::Loss);
        assert_eq!(Difficulty::Hard.resolve(0.6), ChestOutcome::Trap);
    }

    #[test]
    fn test_outcome_frequencies() {
        let mut rng = StdRng::seed_from_u64(7);
        let trials: u32 = 20_000;
        for difficulty in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
            let (gain_below, loss_below) = difficulty.bands();
            let (gain, loss) = (gain_below, loss_below - gain_below);
            let mut counts = [0u32; 3];
            for _ in 0..trials {
                let index = match difficulty.resolve(rng.r#gen::<f64>()) {
                    ChestOutcome::Gain => 0,
                    ChestOutcome::Loss => 1,
                    ChestOutcome::Trap => 2,
                };
                counts[index] += 1;
            }
            let rate = |count: u32| f64::from(count) / f64::from(trials);
            assert!((rate(counts[0]) - gain).abs() < 0.02, "{difficulty:?} gain");
            assert!((rate(counts[1]) - loss).abs() < 0.02, "{difficulty:?} loss");
            assert!(
                (rate(counts[2]) - (1.0 - gain - loss)).abs() < 0.02,
                "{difficulty:?} trap"
            );
        }
    }

    #[test]
    fn test_start_drains_wallet_first() {
        let (mut ledger, user_id) = setup_ledger(50, 200);

        let (game, user) = ledger
            .start_chest_game(user_id, 100, Difficulty::Easy)
            .unwrap();
        assert_eq!(user.wallet_balance, 0);
        assert_eq!(user.investment_balance, 150);

        assert_eq!(game.status, ChestStatus::Playing);
        assert_eq!(game.stake, 100);
        assert_eq!(game.current_multiplier, Multiplier::ONE);
        assert_eq!(game.chests_opened, 0);
        assert_eq!(game.secured_gains, 0);

        let history = ledger.transactions_for(user_id);
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].kind, TransactionKind::ChestStake);
        assert_eq!(history[0].amount, 100);
    }

    #[test]
    fn test_start_from_wallet_only() {
        let (mut ledger, user_id) = setup_ledger(500, 200);
        let (_, user) = ledger
            .start_chest_game(user_id, 100, Difficulty::Hard)
            .unwrap();
        assert_eq!(user.wallet_balance, 400);
        assert_eq!(user.investment_balance, 200);
    }

    #[test]
    fn test_start_insufficient_funds() {
        let (mut ledger, user_id) = setup_ledger(50, 49);
        let result = ledger.start_chest_game(user_id, 100, Difficulty::Easy);
        assert_eq!(
            result.unwrap_err().kind(),
            crate::ErrorKind::InsufficientFunds
        );

        let user = ledger.user(user_id).unwrap();
        assert_eq!(user.wallet_balance, 50);
        assert_eq!(user.investment_balance, 49);
        assert!(ledger.active_chest_game(user_id).is_none());
    }

    #[test]
    fn test_start_rejects_zero_stake() {
        let (mut ledger, user_id) = setup_ledger(50, 0);
        assert_eq!(
            ledger.start_chest_game(user_id, 0, Difficulty::Easy),
            Err(LedgerError::AmountTooSmall {
                minimum: 1,
                amount: 0
            })
        );
    }

    #[test]
    fn test_one_active_game_per_user() {
        let (mut ledger, user_id) = setup_ledger(1000, 0);
        ledger
            .start_chest_game(user_id, 100, Difficulty::Easy)
            .unwrap();

        let result = ledger.start_chest_game(user_id, 100, Difficulty::Medium);
        assert_eq!(result, Err(LedgerError::GameInProgress));
        assert_eq!(ledger.user(user_id).unwrap().wallet_balance, 900);
    }

    #[test]
    fn test_easy_gain_and_loss_steps() {
        let (mut ledger, user_id) = setup_ledger(1000, 0);
        ledger
            .start_chest_game(user_id, 100, Difficulty::Easy)
            .unwrap();

        let (outcome, game) = ledger.open_chest_with_draw(user_id, 0.1).unwrap();
        assert_eq!(outcome, ChestOutcome::Gain);
        assert_eq!(game.current_multiplier, Multiplier(12));
        assert_eq!(game.chests_opened, 1);

        // Losses never occur on easy, so apply one directly
        let mut game = ledger.active_chest_game(user_id).unwrap().clone();
        game.current_multiplier = Multiplier::ONE;
        game.apply(ChestOutcome::Loss);
        assert_eq!(game.current_multiplier, Multiplier(8));
        assert_eq!(game.status, ChestStatus::Playing);
    }

    #[test]
    fn test_medium_and_hard_gain_steps() {
        let (mut ledger, user_id) = setup_ledger(1000, 0);

        ledger
            .start_chest_game(user_id, 10, Difficulty::Medium)
            .unwrap();
        let (_, game) = ledger.open_chest_with_draw(user_id, 0.0).unwrap();
        assert_eq!(game.current_multiplier, Multiplier(14));
        ledger.cash_out_chest_game(user_id).unwrap();

        ledger
            .start_chest_game(user_id, 10, Difficulty::Hard)
            .unwrap();
        let (_, game) = ledger.open_chest_with_draw(user_id, 0.0).unwrap();
        let (_, game2) = ledger.open_chest_with_draw(user_id, 0.0).unwrap();
        assert_eq!(game.current_multiplier, Multiplier(18));
        assert_eq!(game2.current_multiplier, Multiplier(26));
        assert_eq!(game2.chests_opened, 2);
    }

    #[test]
    fn test_loss_floor() {
        let (mut ledger, user_id) = setup_ledger(1000, 0);
        ledger
            .start_chest_game(user_id, 100, Difficulty::Medium)
            .unwrap();

        let multipliers: Vec<Multiplier> = (0..4)
            .map(|_| ledger.open_chest_with_draw(user_id, 0.6).unwrap().1)
            .map(|game| game.current_multiplier)
            .collect();
        assert_eq!(
            multipliers,
            vec![Multiplier(8), Multiplier(6), Multiplier(5), Multiplier(5)]
        );
        assert_eq!(
            ledger.active_chest_game(user_id).unwrap().chests_opened,
            4
        );
    }

    #[test]
    fn test_trap_loses_stake() {
        let (mut ledger, user_id) = setup_ledger(1000, 0);
        ledger
            .start_chest_game(user_id, 100, Difficulty::Hard)
            .unwrap();
        ledger.open_chest_with_draw(user_id, 0.1).unwrap();

        let (outcome, game) = ledger.open_chest_with_draw(user_id, 0.99).unwrap();
        assert_eq!(outcome, ChestOutcome::Trap);
        assert_eq!(game.status, ChestStatus::Lost);
        assert_eq!(game.secured_gains, 0);
        assert!(ledger.active_chest_game(user_id).is_none());
        assert_eq!(ledger.user(user_id).unwrap().wallet_balance, 900);

        assert_eq!(
            ledger.open_chest_with_draw(user_id, 0.1),
            Err(LedgerError::NoActiveGame)
        );
        assert_eq!(
            ledger.cash_out_chest_game(user_id),
            Err(LedgerError::NoActiveGame)
        );

        // A new game can start once the last one is over
        assert!(
            ledger
                .start_chest_game(user_id, 100, Difficulty::Easy)
                .is_ok()
        );
    }

    #[test]
    fn test_cash_out_pays_floor_of_stake_times_multiplier() {
        let (mut ledger, user_id) = setup_ledger(100, 0);
        ledger
            .start_chest_game(user_id, 100, Difficulty::Easy)
            .unwrap();
        for _ in 0..3 {
            ledger.open_chest_with_draw(user_id, 0.2).unwrap();
        }
        assert_eq!(
            ledger.active_chest_game(user_id).unwrap().current_multiplier,
            Multiplier(16)
        );

        let (game, user) = ledger.cash_out_chest_game(user_id).unwrap();
        assert_eq!(game.status, ChestStatus::CashedOut);
        assert_eq!(game.secured_gains, 160);
        assert_eq!(user.wallet_balance, 160);
        assert!(ledger.active_chest_game(user_id).is_none());

        let history = ledger.transactions_for(user_id);
        assert_eq!(history[0].kind, TransactionKind::ChestWin);
        assert_eq!(history[0].amount, 160);
        assert_eq!(history[0].status, TransactionStatus::Approved);
        assert!(history[0].description.contains("x1.6"));
    }

    #[test]
    fn test_cash_out_rounds_down() {
        let (mut ledger, user_id) = setup_ledger(15, 0);
        ledger
            .start_chest_game(user_id, 15, Difficulty::Medium)
            .unwrap();
        ledger.open_chest_with_draw(user_id, 0.7).unwrap();

        // 15 * 0.8 = 12
        let (game, user) = ledger.cash_out_chest_game(user_id).unwrap();
        assert_eq!(game.secured_gains, 12);
        assert_eq!(user.wallet_balance, 12);
    }

    #[test]
    fn test_cash_out_credits_latest_balance() {
        let (mut ledger, user_id) = setup_ledger(100, 0);
        ledger
            .start_chest_game(user_id, 100, Difficulty::Easy)
            .unwrap();

        // Balance moves while the game is running
        ledger.adjust_balance(user_id, Pool::Wallet, 40).unwrap();

        let (_, user) = ledger.cash_out_chest_game(user_id).unwrap();
        assert_eq!(user.wallet_balance, 140);
    }

    #[test]
    fn test_seeded_session_keeps_balances_consistent() {
        let (mut ledger, user_id) = setup_ledger(10_000, 0);
        let mut rng = StdRng::seed_from_u64(1234);

        for round in 0..200 {
            let difficulty = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard][round % 3];
            if ledger
                .start_chest_game(user_id, 10, difficulty)
                .is_err()
            {
                break;
            }
            loop {
                let (outcome, game) = ledger.open_chest(user_id, &mut rng).unwrap();
                if outcome == ChestOutcome::Trap {
                    break;
                }
                if game.chests_opened >= 3 {
                    ledger.cash_out_chest_game(user_id).unwrap();
                    break;
                }
            }
        }

        // Wallet equals the starting funds minus every stake plus every win
        let user = ledger.user(user_id).unwrap();
        let net: i64 = ledger
            .transactions_for(user_id)
            .iter()
            .map(|tx| match tx.kind {
                TransactionKind::ChestStake => -(tx.amount as i64),
                TransactionKind::ChestWin => tx.amount as i64,
                _ => 0,
            })
            .sum();
        assert_eq!(user.wallet_balance as i64, 10_000 + net);
    }
}

use std::cmp::Reverse;

use crate::store::Ledger;
use crate::types::LeaderboardEntry;

impl Ledger {
    /// Every user ranked by investment balance, highest first. Ties keep
    /// the older account ahead.
    pub fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        let mut entries: Vec<LeaderboardEntry> = self
            .users
            .values()
            .map(|user| LeaderboardEntry {
                id: user.id,
                full_name: user.full_name.clone(),
                level: user.level.clone(),
                investment_balance: user.investment_balance,
                wallet_balance: user.wallet_balance,
                referral_earnings: 0,
                total_earnings: user.investment_balance,
            })
            .collect();
        // Stable sort over id-ordered users
        entries.sort_by_key(|entry| Reverse(entry.investment_balance));
        entries
    }
}

#[cfg(test)]
mod tests {
    use crate::store::Ledger;
    use crate::types::{NewUser, Pool, UserId};

    fn add_user(ledger: &mut Ledger, email: &str, investment: i64, wallet: i64) -> UserId {
        let id = ledger
            .create_user(NewUser {
                email: email.to_string(),
                full_name: Some(email.split('@').next().unwrap().to_string()),
                ..Default::default()
            })
            .unwrap()
            .id;
        ledger.adjust_balance(id, Pool::Investment, investment).unwrap();
        ledger.adjust_balance(id, Pool::Wallet, wallet).unwrap();
        id
    }

    #[test]
    fn test_sorted_by_investment_desc() {
        let mut ledger = Ledger::new();
        let small = add_user(&mut ledger, "small@example.com", 100, 9_999);
        let big = add_user(&mut ledger, "big@example.com", 50_000, 0);
        let tied_old = add_user(&mut ledger, "old@example.com", 1_000, 0);
        let tied_new = add_user(&mut ledger, "new@example.com", 1_000, 5);

        let board = ledger.leaderboard();
        let ids: Vec<UserId> = board.iter().map(|entry| entry.id).collect();
        assert_eq!(ids, vec![big, tied_old, tied_new, small]);

        assert_eq!(board[0].full_name.as_deref(), Some("big"));
        assert_eq!(board[0].total_earnings, 50_000);
        assert_eq!(board[0].referral_earnings, 0);
        assert_eq!(board[3].wallet_balance, 9_999);
        assert_eq!(board[3].level, "Bronze");
    }

    #[test]
    fn test_empty_ledger() {
        assert!(Ledger::new().leaderboard().is_empty());
    }
}

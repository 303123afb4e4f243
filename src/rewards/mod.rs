//! Reward allocation and single-claim payout
//!
//! Claims are pre-allocated entitlements paid out of treasury funds. The
//! claimed flag transitions false to true exactly once and flips before the
//! payout moves, which is the system's canonical at-most-once-payment
//! guarantee. Payouts run through the fee-exempt treasury leg, so the player
//! receives exactly the allocated amount.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::access::{AccessRegistry, Role};
use crate::config::RewardConfig;
use crate::error::{Error, Result};
use crate::protocol::{timestamp_ms, ClaimId, GameId, PlayerId, Tokens, TREASURY_ADDRESS};
use crate::token::TokenLedger;

/// A pre-allocated, single-use entitlement to a reward payout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardClaim {
    pub id: ClaimId,
    pub player: PlayerId,
    pub amount: Tokens,
    pub game_id: GameId,
    pub expiry: u64,
    pub claimed: bool,
}

/// Allocates and pays out treasury-funded rewards
pub struct RewardDistributor {
    config: RewardConfig,
    access: Arc<AccessRegistry>,
    ledger: Arc<TokenLedger>,
    claims: RwLock<HashMap<ClaimId, RewardClaim>>,
    next_id: AtomicU64,
}

impl RewardDistributor {
    pub fn new(
        config: RewardConfig,
        access: Arc<AccessRegistry>,
        ledger: Arc<TokenLedger>,
    ) -> Self {
        Self {
            config,
            access,
            ledger,
            claims: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Allocate an unclaimed reward for `player`. Requires the treasury
    /// role; the claim expires after the configured window.
    pub fn allocate_reward(
        &self,
        caller: PlayerId,
        player: PlayerId,
        amount: Tokens,
        game_id: GameId,
    ) -> Result<ClaimId> {
        self.access.require_role(Role::TreasuryRole, &caller)?;

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let claim = RewardClaim {
            id,
            player,
            amount,
            game_id,
            expiry: timestamp_ms().saturating_add(self.config.claim_window_ms),
            claimed: false,
        };
        self.claims.write().insert(id, claim);
        info!(
            claim = id,
            player = %hex::encode(player),
            %amount,
            game_id,
            "reward allocated"
        );
        Ok(id)
    }

    /// Pay out a claim to its player. Succeeds at most once per claim id.
    pub fn claim_reward(&self, caller: PlayerId, claim_id: ClaimId) -> Result<()> {
        let now = timestamp_ms();

        let (player, amount) = {
            let mut claims = self.claims.write();
            let claim = claims.get_mut(&claim_id).ok_or(Error::ClaimNotFound)?;
            if claim.player != caller {
                return Err(Error::Unauthorized);
            }
            if claim.claimed {
                return Err(Error::AlreadyClaimed);
            }
            if now > claim.expiry {
                return Err(Error::Expired);
            }
            if self.ledger.balance_of(&TREASURY_ADDRESS) < claim.amount {
                return Err(Error::InsufficientBalance);
            }
            // finalized before the payout moves
            claim.claimed = true;
            (claim.player, claim.amount)
        };

        self.ledger.transfer(TREASURY_ADDRESS, player, amount)?;
        info!(claim = claim_id, %amount, "reward claimed");
        Ok(())
    }

    /// Read-only claim lookup.
    pub fn get_claim(&self, claim_id: ClaimId) -> Result<RewardClaim> {
        self.claims
            .read()
            .get(&claim_id)
            .cloned()
            .ok_or(Error::ClaimNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::random_player_id;

    struct Fixture {
        rewards: RewardDistributor,
        ledger: Arc<TokenLedger>,
        allocator: PlayerId,
    }

    fn fixture(claim_window_ms: u64) -> Fixture {
        let (owner_a, owner_b) = (random_player_id(), random_player_id());
        let access = Arc::new(AccessRegistry::new(owner_a, owner_b));
        let allocator = random_player_id();
        access
            .grant_role(owner_a, Role::TreasuryRole, allocator)
            .unwrap();
        access
            .grant_role(owner_a, Role::FeeExempt, TREASURY_ADDRESS)
            .unwrap();
        let ledger = Arc::new(TokenLedger::new(access.clone(), 200));
        ledger.mint(TREASURY_ADDRESS, Tokens::new(10_000)).unwrap();
        let rewards =
            RewardDistributor::new(RewardConfig { claim_window_ms }, access, ledger.clone());
        Fixture {
            rewards,
            ledger,
            allocator,
        }
    }

    #[test]
    fn test_claim_pays_exactly_once() {
        let fx = fixture(60_000);
        let player = random_player_id();
        let id = fx
            .rewards
            .allocate_reward(fx.allocator, player, Tokens::new(500), 0)
            .unwrap();

        fx.rewards.claim_reward(player, id).unwrap();
        assert_eq!(fx.ledger.balance_of(&player), Tokens::new(500));

        // second claim on the same id always fails
        assert_eq!(
            fx.rewards.claim_reward(player, id),
            Err(Error::AlreadyClaimed)
        );
        assert_eq!(fx.ledger.balance_of(&player), Tokens::new(500));
    }

    #[test]
    fn test_only_claim_owner_may_claim() {
        let fx = fixture(60_000);
        let player = random_player_id();
        let id = fx
            .rewards
            .allocate_reward(fx.allocator, player, Tokens::new(500), 0)
            .unwrap();
        assert_eq!(
            fx.rewards.claim_reward(random_player_id(), id),
            Err(Error::Unauthorized)
        );
    }

    #[test]
    fn test_expired_claim_rejected() {
        let fx = fixture(0);
        let player = random_player_id();
        let id = fx
            .rewards
            .allocate_reward(fx.allocator, player, Tokens::new(500), 0)
            .unwrap();

        std::thread::sleep(std::time::Duration::from_millis(5));
        assert_eq!(fx.rewards.claim_reward(player, id), Err(Error::Expired));
        assert!(!fx.rewards.get_claim(id).unwrap().claimed);
    }

    #[test]
    fn test_allocation_requires_treasury_role() {
        let fx = fixture(60_000);
        assert_eq!(
            fx.rewards.allocate_reward(
                random_player_id(),
                random_player_id(),
                Tokens::new(1),
                0
            ),
            Err(Error::Unauthorized)
        );
    }
}

//! One-call wiring for the whole economy layer
//!
//! Builds the component graph bottom-up on the shared access registry and
//! token ledger, performs genesis setup (owner pair, escrow fee exemptions,
//! initial treasury supply) and hands back the wired components. Cross-
//! component references are read-only lookups; each component exclusively
//! owns and mutates its own tables.

use std::sync::Arc;

use tracing::info;

use crate::access::{AccessRegistry, Role};
use crate::assets::AssetRegistry;
use crate::auction::AuctionHouse;
use crate::config::EconomyConfig;
use crate::error::{Error, Result};
use crate::leaderboard::LeaderboardManager;
use crate::marketplace::Marketplace;
use crate::mirror::MirrorLog;
use crate::protocol::{
    PlayerId, AUCTION_HOUSE_ADDRESS, MARKETPLACE_ADDRESS, TREASURY_ADDRESS,
};
use crate::rewards::RewardDistributor;
use crate::session::SessionRegistry;
use crate::token::TokenLedger;
use crate::treasury::Treasury;

/// The wired economy layer
pub struct Economy {
    pub config: EconomyConfig,
    pub access: Arc<AccessRegistry>,
    pub ledger: Arc<TokenLedger>,
    pub assets: Arc<AssetRegistry>,
    pub mirror: Arc<MirrorLog>,
    pub sessions: Arc<SessionRegistry>,
    pub marketplace: Arc<Marketplace>,
    pub auctions: Arc<AuctionHouse>,
    pub treasury: Arc<Treasury>,
    pub rewards: Arc<RewardDistributor>,
    pub leaderboard: Arc<LeaderboardManager>,
}

impl Economy {
    /// Wire all components with the given genesis owner pair.
    pub fn new(config: EconomyConfig, owner_a: PlayerId, owner_b: PlayerId) -> Result<Self> {
        if owner_a == owner_b {
            return Err(Error::InvalidData(
                "genesis owners must be distinct".to_string(),
            ));
        }

        let access = Arc::new(AccessRegistry::new(owner_a, owner_b));
        // escrow principals release funds without the universal transfer fee
        access.grant_role(owner_a, Role::FeeExempt, TREASURY_ADDRESS)?;
        access.grant_role(owner_a, Role::FeeExempt, MARKETPLACE_ADDRESS)?;
        access.grant_role(owner_a, Role::FeeExempt, AUCTION_HOUSE_ADDRESS)?;

        let ledger = Arc::new(TokenLedger::new(
            access.clone(),
            config.token.transfer_fee_bps,
        ));
        ledger.mint(TREASURY_ADDRESS, config.token.initial_treasury_supply)?;

        let assets = Arc::new(AssetRegistry::new());
        let mirror = Arc::new(MirrorLog::new(config.mirror.clone()));
        let sessions = Arc::new(SessionRegistry::new(
            config.session.clone(),
            access.clone(),
            mirror.clone(),
        ));
        let marketplace = Arc::new(Marketplace::new(
            config.marketplace.clone(),
            ledger.clone(),
            assets.clone(),
        ));
        let auctions = Arc::new(AuctionHouse::new(
            config.auction.clone(),
            ledger.clone(),
            assets.clone(),
        ));
        let treasury = Arc::new(Treasury::new(
            config.treasury.clone(),
            access.clone(),
            ledger.clone(),
        ));
        let rewards = Arc::new(RewardDistributor::new(
            config.rewards.clone(),
            access.clone(),
            ledger.clone(),
        ));
        let leaderboard = Arc::new(LeaderboardManager::new(
            config.leaderboard.clone(),
            sessions.clone(),
            ledger.clone(),
            mirror.clone(),
        ));

        info!("economy layer wired");
        Ok(Self {
            config,
            access,
            ledger,
            assets,
            mirror,
            sessions,
            marketplace,
            auctions,
            treasury,
            rewards,
            leaderboard,
        })
    }
}

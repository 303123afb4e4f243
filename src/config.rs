//! Configuration for the economy layer
//!
//! Each component carries its own config struct with production defaults;
//! `EconomyConfig` aggregates them for one-call wiring. Tests shrink the
//! timing windows to keep scenarios fast.

use serde::{Deserialize, Serialize};

use crate::protocol::Tokens;

/// Token ledger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    /// Universal transfer fee in basis points, credited to the treasury
    pub transfer_fee_bps: u16,
    /// Supply minted to the treasury account at genesis
    pub initial_treasury_supply: Tokens,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            transfer_fee_bps: 200, // 2%
            initial_treasury_supply: Tokens::new(1_000_000_000),
        }
    }
}

/// Session registry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Window after a session ends during which the player cannot start another
    pub cooldown_ms: u64,
    /// Minimum play time before a session may be ended with a score
    pub min_duration_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cooldown_ms: 60_000,
            min_duration_ms: 5_000,
        }
    }
}

/// Marketplace configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketplaceConfig {
    /// Platform fee in basis points, taken out of every sale price
    pub fee_bps: u16,
    /// Upper bound on listing duration
    pub max_listing_duration_ms: u64,
}

impl Default for MarketplaceConfig {
    fn default() -> Self {
        Self {
            fee_bps: 500, // 5%
            max_listing_duration_ms: 30 * 24 * 60 * 60 * 1000,
        }
    }
}

/// Auction house configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuctionConfig {
    /// Minimum amount a new bid must exceed the standing bid by
    pub min_increment: Tokens,
    /// Upper bound on auction duration
    pub max_auction_duration_ms: u64,
}

impl Default for AuctionConfig {
    fn default() -> Self {
        Self {
            min_increment: Tokens::new(100),
            max_auction_duration_ms: 30 * 24 * 60 * 60 * 1000,
        }
    }
}

/// Treasury governance configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreasuryConfig {
    /// Distinct owner approvals required before a withdrawal executes
    pub approval_threshold: usize,
}

impl Default for TreasuryConfig {
    fn default() -> Self {
        Self {
            approval_threshold: 2, // 2-of-2 governance pair
        }
    }
}

/// Reward distributor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardConfig {
    /// How long an allocated claim stays payable
    pub claim_window_ms: u64,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            claim_window_ms: 7 * 24 * 60 * 60 * 1000, // 7 days
        }
    }
}

/// Leaderboard configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardConfig {
    /// Entries retained per game
    pub max_entries: usize,
    /// Fee charged per score submission, forwarded to the treasury
    pub submission_fee: Tokens,
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        Self {
            max_entries: 10,
            submission_fee: Tokens::new(50),
        }
    }
}

/// Mirror log configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorConfig {
    /// Events retained per topic for audit export
    pub retained_events: usize,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            retained_events: 1024,
        }
    }
}

/// Aggregated configuration for the whole economy layer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EconomyConfig {
    pub token: TokenConfig,
    pub session: SessionConfig,
    pub marketplace: MarketplaceConfig,
    pub auction: AuctionConfig,
    pub treasury: TreasuryConfig,
    pub rewards: RewardConfig,
    pub leaderboard: LeaderboardConfig,
    pub mirror: MirrorConfig,
}

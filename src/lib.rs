//! GameVault - game-economy and trust layer for a play-to-earn arcade platform
//!
//! Eight components built bottom-up on a shared permission registry and a
//! shared fungible-token ledger:
//! - access: role-based authorization source of truth
//! - token: balance ledger with a universal transfer fee and exemption list
//! - assets: non-fungible ownership and escrow approvals
//! - session: play-session lifecycle and anti-cheat verification
//! - marketplace: fixed-price listing, escrow and sale of game NFTs
//! - auction: time-boxed English auctions with bid escrow
//! - treasury: multi-signature custody and withdrawal workflow
//! - rewards: allocation and single-claim payout of token rewards
//! - leaderboard: fee-gated, verified-session top-N rankings
//!
//! Every state transition is an atomic, serially-ordered operation: a failed
//! precondition aborts the whole call with no partial state change, and state
//! flags flip before value moves so retried or reentrant calls observe the
//! finalized state.

pub mod access;
pub mod assets;
pub mod auction;
pub mod config;
pub mod economy;
pub mod error;
pub mod leaderboard;
pub mod logging;
pub mod marketplace;
pub mod mirror;
pub mod protocol;
pub mod rewards;
pub mod session;
pub mod token;
pub mod treasury;

// Re-export commonly used types for easy access
pub use access::{AccessRegistry, Role, RoleEvent};
pub use assets::AssetRegistry;
pub use auction::{Auction, AuctionHouse};
pub use config::EconomyConfig;
pub use economy::Economy;
pub use error::{Error, Result};
pub use leaderboard::{LeaderboardEntry, LeaderboardManager};
pub use marketplace::{Listing, Marketplace};
pub use mirror::{MirrorEvent, MirrorLog};
pub use protocol::{
    random_player_id, AssetId, AuctionId, ClaimId, GameId, ListingId, PlayerId, RequestId,
    SessionId, Tokens, AUCTION_HOUSE_ADDRESS, MARKETPLACE_ADDRESS, TREASURY_ADDRESS,
};
pub use rewards::{RewardClaim, RewardDistributor};
pub use session::{Session, SessionRegistry, SessionState};
pub use token::{Account, TokenLedger};
pub use treasury::{Treasury, WithdrawalRequest};

//! Core protocol types shared across the economy layer
//!
//! Identifiers, token amounts with checked arithmetic, basis-point fee math
//! and millisecond timestamps. Every component speaks these types; none of
//! them redefines its own notion of money or identity.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Player identifier - 32 bytes for public-key compatibility
pub type PlayerId = [u8; 32];

/// Game identifier - index into the platform's game catalogue
pub type GameId = u64;

/// Non-fungible asset identifier
pub type AssetId = u64;

/// Session identifier - derived from player, game and a monotonic nonce
pub type SessionId = [u8; 32];

/// Marketplace listing identifier
pub type ListingId = u64;

/// Auction identifier
pub type AuctionId = u64;

/// Treasury withdrawal request identifier
pub type RequestId = u64;

/// Reward claim identifier
pub type ClaimId = u64;

/// Basis-point denominator for all fee math
pub const BPS_DENOM: u64 = 10_000;

/// Well-known treasury account holding platform funds
pub const TREASURY_ADDRESS: PlayerId = [0xFF; 32];

/// Marketplace escrow principal - holds listed assets and routes platform fees
pub const MARKETPLACE_ADDRESS: PlayerId = [0xFE; 32];

/// Auction-house escrow principal - holds custody of auctioned assets and bids
pub const AUCTION_HOUSE_ADDRESS: PlayerId = [0xFD; 32];

/// Token amount in smallest units (like satoshis)
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Tokens(u64);

impl Tokens {
    pub const ZERO: Tokens = Tokens(0);

    pub const fn new(amount: u64) -> Self {
        Self(amount)
    }

    pub const fn amount(&self) -> u64 {
        self.0
    }

    /// Add with overflow checking
    pub fn checked_add(self, other: Tokens) -> Result<Tokens> {
        self.0
            .checked_add(other.0)
            .map(Tokens)
            .ok_or_else(|| Error::ArithmeticOverflow("token addition overflow".to_string()))
    }

    /// Subtract with underflow checking
    pub fn checked_sub(self, other: Tokens) -> Result<Tokens> {
        self.0
            .checked_sub(other.0)
            .map(Tokens)
            .ok_or(Error::InsufficientBalance)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for Tokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Basis-point share of an amount, e.g. `fee_of(price, 500)` is 5% of price.
///
/// Widened to u128 internally so the multiplication cannot overflow.
pub fn fee_of(amount: Tokens, bps: u16) -> Tokens {
    let fee = (amount.amount() as u128 * bps as u128) / BPS_DENOM as u128;
    Tokens::new(fee as u64)
}

/// Current unix timestamp in milliseconds
pub fn timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Create a random player id using cryptographic randomness
pub fn random_player_id() -> PlayerId {
    use rand::RngCore;
    let mut id = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut id);
    id
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_token_math() {
        let a = Tokens::new(100);
        let b = Tokens::new(40);
        assert_eq!(a.checked_add(b).unwrap(), Tokens::new(140));
        assert_eq!(a.checked_sub(b).unwrap(), Tokens::new(60));
        assert_eq!(b.checked_sub(a), Err(Error::InsufficientBalance));
        assert!(Tokens::new(u64::MAX).checked_add(Tokens::new(1)).is_err());
    }

    #[test]
    fn test_fee_basis_points() {
        assert_eq!(fee_of(Tokens::new(10_000), 500), Tokens::new(500));
        assert_eq!(fee_of(Tokens::new(10_000), 200), Tokens::new(200));
        assert_eq!(fee_of(Tokens::new(3), 500), Tokens::ZERO); // rounds down
        // widening keeps huge amounts from overflowing
        assert_eq!(
            fee_of(Tokens::new(u64::MAX), 10_000),
            Tokens::new(u64::MAX)
        );
    }

    #[test]
    fn test_escrow_addresses_are_distinct() {
        assert_ne!(TREASURY_ADDRESS, MARKETPLACE_ADDRESS);
        assert_ne!(MARKETPLACE_ADDRESS, AUCTION_HOUSE_ADDRESS);
    }
}

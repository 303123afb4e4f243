//! Time-boxed English auctions with bid escrow
//!
//! Bids are escrowed in the auction-house principal; the outbid party is
//! refunded in full before the new bid is recorded, so funds can never be
//! trapped between two standing bids. Settlement flips the active flag
//! exactly once, then hands the asset to the highest bidder and the final
//! bid to the seller, or returns the asset when nobody bid. Escrow legs run
//! fee-exempt, so the seller's gain equals the final bid exactly.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::assets::AssetRegistry;
use crate::config::AuctionConfig;
use crate::error::{Error, Result};
use crate::protocol::{
    timestamp_ms, AssetId, AuctionId, PlayerId, Tokens, AUCTION_HOUSE_ADDRESS,
};
use crate::token::TokenLedger;

/// English auction with escrowed standing bid
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Auction {
    pub id: AuctionId,
    pub seller: PlayerId,
    pub asset_id: AssetId,
    pub start_price: Tokens,
    pub current_bid: Option<Tokens>,
    pub current_bidder: Option<PlayerId>,
    pub end_time: u64,
    pub is_active: bool,
}

/// Auction lifecycle and bid escrow manager
pub struct AuctionHouse {
    config: AuctionConfig,
    ledger: Arc<TokenLedger>,
    assets: Arc<AssetRegistry>,
    auctions: RwLock<HashMap<AuctionId, Auction>>,
    next_id: AtomicU64,
}

impl AuctionHouse {
    pub fn new(
        config: AuctionConfig,
        ledger: Arc<TokenLedger>,
        assets: Arc<AssetRegistry>,
    ) -> Self {
        Self {
            config,
            ledger,
            assets,
            auctions: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Open an auction over an owned, escrow-approved asset.
    pub fn create_auction(
        &self,
        seller: PlayerId,
        asset_id: AssetId,
        start_price: Tokens,
        duration_ms: u64,
    ) -> Result<AuctionId> {
        if duration_ms > self.config.max_auction_duration_ms {
            return Err(Error::InvalidData("auction duration too long".to_string()));
        }
        if self.assets.owner_of(asset_id)? != seller {
            return Err(Error::NotOwner);
        }
        if !self.assets.is_approved(&AUCTION_HOUSE_ADDRESS, asset_id) {
            return Err(Error::NotApproved);
        }

        let now = timestamp_ms();
        self.assets.transfer_asset(
            AUCTION_HOUSE_ADDRESS,
            seller,
            AUCTION_HOUSE_ADDRESS,
            asset_id,
        )?;

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let auction = Auction {
            id,
            seller,
            asset_id,
            start_price,
            current_bid: None,
            current_bidder: None,
            end_time: now.saturating_add(duration_ms),
            is_active: true,
        };
        self.auctions.write().insert(id, auction);

        info!(
            auction = id,
            asset = asset_id,
            seller = %hex::encode(seller),
            %start_price,
            "auction created"
        );
        Ok(id)
    }

    /// Place a bid. Must reach the start price, or exceed the standing bid
    /// by at least the minimum increment. The outbid party is refunded in
    /// full before the new bid is escrowed and recorded.
    pub fn place_bid(&self, bidder: PlayerId, auction_id: AuctionId, amount: Tokens) -> Result<()> {
        let now = timestamp_ms();
        let mut auctions = self.auctions.write();
        let auction = auctions.get_mut(&auction_id).ok_or(Error::AuctionNotFound)?;

        if !auction.is_active {
            return Err(Error::AlreadySettled);
        }
        if now >= auction.end_time {
            return Err(Error::Expired);
        }
        let minimum = match auction.current_bid {
            Some(standing) => standing.checked_add(self.config.min_increment)?,
            None => auction.start_price,
        };
        if amount < minimum {
            return Err(Error::BidTooLow);
        }
        if self.ledger.balance_of(&bidder) < amount {
            return Err(Error::InsufficientPayment);
        }

        // refund-then-accept: no window where two bids are escrowed
        if let (Some(previous_bidder), Some(previous_bid)) =
            (auction.current_bidder, auction.current_bid)
        {
            self.ledger
                .transfer(AUCTION_HOUSE_ADDRESS, previous_bidder, previous_bid)?;
        }
        self.ledger.transfer(bidder, AUCTION_HOUSE_ADDRESS, amount)?;
        auction.current_bid = Some(amount);
        auction.current_bidder = Some(bidder);

        info!(
            auction = auction_id,
            bidder = %hex::encode(bidder),
            %amount,
            "bid accepted"
        );
        Ok(())
    }

    /// Settle a finished auction. Callable by anyone once the end time has
    /// passed; repeat calls fail with `AlreadySettled`.
    pub fn settle_auction(&self, auction_id: AuctionId) -> Result<()> {
        let now = timestamp_ms();

        let (seller, asset_id, outcome) = {
            let mut auctions = self.auctions.write();
            let auction = auctions.get_mut(&auction_id).ok_or(Error::AuctionNotFound)?;
            if !auction.is_active {
                return Err(Error::AlreadySettled);
            }
            if now < auction.end_time {
                return Err(Error::StillActive);
            }
            // finalized before any value moves
            auction.is_active = false;
            (
                auction.seller,
                auction.asset_id,
                auction.current_bidder.zip(auction.current_bid),
            )
        };

        match outcome {
            Some((winner, final_bid)) => {
                self.ledger
                    .transfer(AUCTION_HOUSE_ADDRESS, seller, final_bid)?;
                self.assets.transfer_asset(
                    AUCTION_HOUSE_ADDRESS,
                    AUCTION_HOUSE_ADDRESS,
                    winner,
                    asset_id,
                )?;
                info!(
                    auction = auction_id,
                    winner = %hex::encode(winner),
                    %final_bid,
                    "auction settled"
                );
            }
            None => {
                self.assets.transfer_asset(
                    AUCTION_HOUSE_ADDRESS,
                    AUCTION_HOUSE_ADDRESS,
                    seller,
                    asset_id,
                )?;
                info!(auction = auction_id, "auction settled with no bids");
            }
        }
        Ok(())
    }

    /// Read-only auction lookup.
    pub fn get_auction(&self, auction_id: AuctionId) -> Result<Auction> {
        self.auctions
            .read()
            .get(&auction_id)
            .cloned()
            .ok_or(Error::AuctionNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::{AccessRegistry, Role};
    use crate::protocol::random_player_id;

    struct Fixture {
        house: AuctionHouse,
        ledger: Arc<TokenLedger>,
        assets: Arc<AssetRegistry>,
    }

    fn fixture() -> Fixture {
        let owner = random_player_id();
        let access = Arc::new(AccessRegistry::new(owner, random_player_id()));
        access
            .grant_role(owner, Role::FeeExempt, AUCTION_HOUSE_ADDRESS)
            .unwrap();
        let ledger = Arc::new(TokenLedger::new(access, 200));
        let assets = Arc::new(AssetRegistry::new());
        let house = AuctionHouse::new(
            AuctionConfig {
                min_increment: Tokens::new(10),
                ..AuctionConfig::default()
            },
            ledger.clone(),
            assets.clone(),
        );
        Fixture {
            house,
            ledger,
            assets,
        }
    }

    fn open_auction(fx: &Fixture, seller: PlayerId, start: u64, duration: u64) -> (AssetId, AuctionId) {
        let asset = fx.assets.mint_asset(seller);
        fx.assets
            .approve(seller, AUCTION_HOUSE_ADDRESS, asset)
            .unwrap();
        let auction = fx
            .house
            .create_auction(seller, asset, Tokens::new(start), duration)
            .unwrap();
        (asset, auction)
    }

    #[test]
    fn test_bid_escrow_and_refund() {
        let fx = fixture();
        let seller = random_player_id();
        let (alice, bob) = (random_player_id(), random_player_id());
        fx.ledger.mint(alice, Tokens::new(1_000)).unwrap();
        fx.ledger.mint(bob, Tokens::new(1_000)).unwrap();
        let (_, auction) = open_auction(&fx, seller, 100, 60_000);

        fx.house.place_bid(alice, auction, Tokens::new(100)).unwrap();
        assert_eq!(fx.ledger.balance_of(&alice), Tokens::new(900));
        assert_eq!(
            fx.ledger.balance_of(&AUCTION_HOUSE_ADDRESS),
            Tokens::new(100)
        );

        // bob outbids; alice refunded in full
        fx.house.place_bid(bob, auction, Tokens::new(150)).unwrap();
        assert_eq!(fx.ledger.balance_of(&alice), Tokens::new(1_000));
        assert_eq!(fx.ledger.balance_of(&bob), Tokens::new(850));
        assert_eq!(
            fx.ledger.balance_of(&AUCTION_HOUSE_ADDRESS),
            Tokens::new(150)
        );

        let state = fx.house.get_auction(auction).unwrap();
        assert_eq!(state.current_bid, Some(Tokens::new(150)));
        assert_eq!(state.current_bidder, Some(bob));
    }

    #[test]
    fn test_bid_minimums_enforced() {
        let fx = fixture();
        let seller = random_player_id();
        let alice = random_player_id();
        fx.ledger.mint(alice, Tokens::new(10_000)).unwrap();
        let (_, auction) = open_auction(&fx, seller, 100, 60_000);

        // below start price
        assert_eq!(
            fx.house.place_bid(alice, auction, Tokens::new(99)),
            Err(Error::BidTooLow)
        );
        fx.house.place_bid(alice, auction, Tokens::new(100)).unwrap();
        // below standing bid + increment
        assert_eq!(
            fx.house.place_bid(alice, auction, Tokens::new(109)),
            Err(Error::BidTooLow)
        );
        fx.house.place_bid(alice, auction, Tokens::new(110)).unwrap();
    }

    #[test]
    fn test_settlement_conserves_value() {
        let fx = fixture();
        let seller = random_player_id();
        let alice = random_player_id();
        fx.ledger.mint(alice, Tokens::new(500)).unwrap();
        let (asset, auction) = open_auction(&fx, seller, 100, 100);

        fx.house.place_bid(alice, auction, Tokens::new(200)).unwrap();
        assert_eq!(fx.house.settle_auction(auction), Err(Error::StillActive));

        std::thread::sleep(std::time::Duration::from_millis(150));
        fx.house.settle_auction(auction).unwrap();

        // seller's gain equals the final bid exactly; no value created or lost
        assert_eq!(fx.ledger.balance_of(&seller), Tokens::new(200));
        assert_eq!(fx.ledger.balance_of(&alice), Tokens::new(300));
        assert_eq!(fx.ledger.balance_of(&AUCTION_HOUSE_ADDRESS), Tokens::ZERO);
        assert_eq!(fx.assets.owner_of(asset).unwrap(), alice);

        assert_eq!(fx.house.settle_auction(auction), Err(Error::AlreadySettled));
    }

    #[test]
    fn test_no_bid_auction_returns_asset() {
        let fx = fixture();
        let seller = random_player_id();
        let (asset, auction) = open_auction(&fx, seller, 100, 0);

        std::thread::sleep(std::time::Duration::from_millis(5));
        fx.house.settle_auction(auction).unwrap();
        assert_eq!(fx.assets.owner_of(asset).unwrap(), seller);
        assert!(!fx.house.get_auction(auction).unwrap().is_active);
    }

    #[test]
    fn test_expired_auction_rejects_bids() {
        let fx = fixture();
        let seller = random_player_id();
        let alice = random_player_id();
        fx.ledger.mint(alice, Tokens::new(500)).unwrap();
        let (_, auction) = open_auction(&fx, seller, 100, 0);

        std::thread::sleep(std::time::Duration::from_millis(5));
        assert_eq!(
            fx.house.place_bid(alice, auction, Tokens::new(100)),
            Err(Error::Expired)
        );
    }
}

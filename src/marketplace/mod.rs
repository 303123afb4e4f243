//! Fixed-price NFT marketplace
//!
//! Listings pull the asset into marketplace custody and release it exactly
//! once, on cancel or on sale. On a sale the platform fee routes through the
//! fee-exempt marketplace principal to the treasury while the seller-payout
//! leg is a plain buyer-to-seller transfer that still incurs the token
//! transfer fee; the resulting fee compounding is intended product behavior.
//! The active flag flips before any value moves so a reentrant call observes
//! the finalized state.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::assets::AssetRegistry;
use crate::config::MarketplaceConfig;
use crate::error::{Error, Result};
use crate::protocol::{
    fee_of, timestamp_ms, AssetId, ListingId, PlayerId, Tokens, MARKETPLACE_ADDRESS,
    TREASURY_ADDRESS,
};
use crate::token::TokenLedger;

/// Fixed-price listing with escrowed asset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    pub id: ListingId,
    pub seller: PlayerId,
    pub asset_id: AssetId,
    pub price: Tokens,
    pub expiry: u64,
    pub is_active: bool,
}

/// Fixed-price listing, escrow and sale of non-fungible assets
pub struct Marketplace {
    config: MarketplaceConfig,
    ledger: Arc<TokenLedger>,
    assets: Arc<AssetRegistry>,
    listings: RwLock<HashMap<ListingId, Listing>>,
    next_id: AtomicU64,
}

impl Marketplace {
    pub fn new(
        config: MarketplaceConfig,
        ledger: Arc<TokenLedger>,
        assets: Arc<AssetRegistry>,
    ) -> Self {
        Self {
            config,
            ledger,
            assets,
            listings: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// List an owned, escrow-approved asset at a fixed price. Pulls the
    /// asset into marketplace custody.
    pub fn list_item(
        &self,
        seller: PlayerId,
        asset_id: AssetId,
        price: Tokens,
        duration_ms: u64,
    ) -> Result<ListingId> {
        if duration_ms > self.config.max_listing_duration_ms {
            return Err(Error::InvalidData("listing duration too long".to_string()));
        }
        if self.assets.owner_of(asset_id)? != seller {
            return Err(Error::NotOwner);
        }
        if !self.assets.is_approved(&MARKETPLACE_ADDRESS, asset_id) {
            return Err(Error::NotApproved);
        }

        let now = timestamp_ms();
        self.assets
            .transfer_asset(MARKETPLACE_ADDRESS, seller, MARKETPLACE_ADDRESS, asset_id)?;

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let listing = Listing {
            id,
            seller,
            asset_id,
            price,
            expiry: now.saturating_add(duration_ms),
            is_active: true,
        };
        self.listings.write().insert(id, listing);

        info!(
            listing = id,
            asset = asset_id,
            seller = %hex::encode(seller),
            %price,
            "item listed"
        );
        Ok(id)
    }

    /// Buy an active, unexpired listing. The platform fee goes to the
    /// treasury via the exempt marketplace leg; the seller payout carries
    /// the standard token fee; the asset goes to the buyer.
    pub fn buy_item(&self, buyer: PlayerId, listing_id: ListingId) -> Result<()> {
        let now = timestamp_ms();

        let (seller, asset_id, price) = {
            let mut listings = self.listings.write();
            let listing = listings.get_mut(&listing_id).ok_or(Error::ListingNotFound)?;
            if !listing.is_active {
                return Err(Error::ListingInactive);
            }
            if now > listing.expiry {
                return Err(Error::Expired);
            }
            if self.ledger.balance_of(&buyer) < listing.price {
                return Err(Error::InsufficientPayment);
            }
            // finalized before any value moves
            listing.is_active = false;
            (listing.seller, listing.asset_id, listing.price)
        };

        let platform_fee = fee_of(price, self.config.fee_bps);
        let seller_cut = price.checked_sub(platform_fee)?;

        // platform-fee leg routes through the exempt marketplace principal
        self.ledger.transfer(buyer, MARKETPLACE_ADDRESS, platform_fee)?;
        self.ledger
            .transfer(MARKETPLACE_ADDRESS, TREASURY_ADDRESS, platform_fee)?;
        // seller payout leg pays the universal token fee
        self.ledger.transfer(buyer, seller, seller_cut)?;
        self.assets
            .transfer_asset(MARKETPLACE_ADDRESS, MARKETPLACE_ADDRESS, buyer, asset_id)?;

        info!(
            listing = listing_id,
            buyer = %hex::encode(buyer),
            %price,
            %platform_fee,
            "item sold"
        );
        Ok(())
    }

    /// Cancel an active listing and return the escrowed asset to the seller.
    pub fn cancel_listing(&self, caller: PlayerId, listing_id: ListingId) -> Result<()> {
        let (seller, asset_id) = {
            let mut listings = self.listings.write();
            let listing = listings.get_mut(&listing_id).ok_or(Error::ListingNotFound)?;
            if listing.seller != caller {
                return Err(Error::Unauthorized);
            }
            if !listing.is_active {
                return Err(Error::ListingInactive);
            }
            listing.is_active = false;
            (listing.seller, listing.asset_id)
        };

        self.assets
            .transfer_asset(MARKETPLACE_ADDRESS, MARKETPLACE_ADDRESS, seller, asset_id)?;
        info!(listing = listing_id, "listing cancelled");
        Ok(())
    }

    /// Change the price of an active listing. Seller only.
    pub fn update_listing_price(
        &self,
        caller: PlayerId,
        listing_id: ListingId,
        new_price: Tokens,
    ) -> Result<()> {
        let mut listings = self.listings.write();
        let listing = listings.get_mut(&listing_id).ok_or(Error::ListingNotFound)?;
        if listing.seller != caller {
            return Err(Error::Unauthorized);
        }
        if !listing.is_active {
            return Err(Error::ListingInactive);
        }
        listing.price = new_price;
        Ok(())
    }

    /// Read-only listing lookup.
    pub fn get_listing(&self, listing_id: ListingId) -> Result<Listing> {
        self.listings
            .read()
            .get(&listing_id)
            .cloned()
            .ok_or(Error::ListingNotFound)
    }
}

//! Non-fungible asset registry
//!
//! Ownership and escrow-approval tracking for game NFTs. The marketplace and
//! auction house pull assets into custody through here; approval is cleared
//! on every transfer so a stale operator can never move an asset twice.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::protocol::{AssetId, PlayerId};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct AssetRecord {
    owner: PlayerId,
    approved: Option<PlayerId>,
}

/// Registry of non-fungible assets and their escrow approvals
pub struct AssetRegistry {
    assets: RwLock<HashMap<AssetId, AssetRecord>>,
    next_id: AtomicU64,
}

impl AssetRegistry {
    pub fn new() -> Self {
        Self {
            assets: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Mint a fresh asset to `owner` and return its id.
    pub fn mint_asset(&self, owner: PlayerId) -> AssetId {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.assets.write().insert(
            id,
            AssetRecord {
                owner,
                approved: None,
            },
        );
        debug!(asset = id, owner = %hex::encode(owner), "asset minted");
        id
    }

    pub fn owner_of(&self, asset: AssetId) -> Result<PlayerId> {
        self.assets
            .read()
            .get(&asset)
            .map(|record| record.owner)
            .ok_or(Error::AssetNotFound)
    }

    /// Approve `operator` to move `asset` once. Caller must be the owner.
    pub fn approve(&self, caller: PlayerId, operator: PlayerId, asset: AssetId) -> Result<()> {
        let mut assets = self.assets.write();
        let record = assets.get_mut(&asset).ok_or(Error::AssetNotFound)?;
        if record.owner != caller {
            return Err(Error::NotOwner);
        }
        record.approved = Some(operator);
        Ok(())
    }

    pub fn is_approved(&self, operator: &PlayerId, asset: AssetId) -> bool {
        self.assets
            .read()
            .get(&asset)
            .map(|record| record.approved.as_ref() == Some(operator))
            .unwrap_or(false)
    }

    /// Move `asset` from `from` to `to`. The operator must be the current
    /// owner or the approved party; the approval is consumed by the move.
    pub fn transfer_asset(
        &self,
        operator: PlayerId,
        from: PlayerId,
        to: PlayerId,
        asset: AssetId,
    ) -> Result<()> {
        let mut assets = self.assets.write();
        let record = assets.get_mut(&asset).ok_or(Error::AssetNotFound)?;
        if record.owner != from {
            return Err(Error::NotOwner);
        }
        if operator != record.owner && record.approved.as_ref() != Some(&operator) {
            return Err(Error::NotApproved);
        }
        record.owner = to;
        record.approved = None;
        debug!(
            asset,
            from = %hex::encode(from),
            to = %hex::encode(to),
            "asset transferred"
        );
        Ok(())
    }
}

impl Default for AssetRegistry {
    fn default() -> Self {
        Self::new()
    }
}

//! Fungible token ledger
//!
//! In-memory balance ledger with the platform's universal transfer-fee rule.
//! Every non-exempt transfer sheds a basis-point fee into the treasury
//! account; a leg is exempt when either party holds [`Role::FeeExempt`],
//! which is how escrow principals release funds without double taxation.
//! The paying components all move value through here and never persist
//! balances of their own.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::access::{AccessRegistry, Role};
use crate::error::{Error, Result};
use crate::protocol::{fee_of, PlayerId, Tokens, TREASURY_ADDRESS};

/// Account information
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Account {
    pub balance: Tokens,
    pub transaction_count: u64,
}

/// Balance ledger shared by every paying component
pub struct TokenLedger {
    access: Arc<AccessRegistry>,
    accounts: RwLock<HashMap<PlayerId, Account>>,
    transfer_fee_bps: u16,
}

impl TokenLedger {
    pub fn new(access: Arc<AccessRegistry>, transfer_fee_bps: u16) -> Self {
        Self {
            access,
            accounts: RwLock::new(HashMap::new()),
            transfer_fee_bps,
        }
    }

    /// Get account balance. Unknown accounts read as zero.
    pub fn balance_of(&self, who: &PlayerId) -> Tokens {
        self.accounts
            .read()
            .get(who)
            .map(|account| account.balance)
            .unwrap_or(Tokens::ZERO)
    }

    /// Credit newly created supply to `to`.
    pub fn mint(&self, to: PlayerId, amount: Tokens) -> Result<()> {
        let mut accounts = self.accounts.write();
        let account = accounts.entry(to).or_default();
        account.balance = account.balance.checked_add(amount)?;
        debug!(to = %hex::encode(to), %amount, "minted tokens");
        Ok(())
    }

    /// Move `amount` from `from` to `to`, applying the universal transfer fee
    /// unless either party is fee-exempt. Returns the net amount credited to
    /// the recipient. The whole movement happens under one write lock, so a
    /// failure leaves no partial state.
    pub fn transfer(&self, from: PlayerId, to: PlayerId, amount: Tokens) -> Result<Tokens> {
        if amount.is_zero() {
            return Ok(Tokens::ZERO);
        }
        let fee = if self.is_exempt(&from) || self.is_exempt(&to) {
            Tokens::ZERO
        } else {
            fee_of(amount, self.transfer_fee_bps)
        };
        let net = amount.checked_sub(fee)?;

        let mut accounts = self.accounts.write();
        {
            let sender = accounts.get_mut(&from).ok_or(Error::AccountNotFound)?;
            if sender.balance < amount {
                return Err(Error::InsufficientBalance);
            }
            sender.balance = sender.balance.checked_sub(amount)?;
            sender.transaction_count += 1;
        }
        {
            let recipient = accounts.entry(to).or_default();
            recipient.balance = recipient.balance.checked_add(net)?;
        }
        if !fee.is_zero() {
            let treasury = accounts.entry(TREASURY_ADDRESS).or_default();
            treasury.balance = treasury.balance.checked_add(fee)?;
        }

        debug!(
            from = %hex::encode(from),
            to = %hex::encode(to),
            %amount,
            %fee,
            "transfer settled"
        );
        Ok(net)
    }

    /// Fee-exemption lookup, resolved through the access registry.
    pub fn is_exempt(&self, who: &PlayerId) -> bool {
        self.access.has_role(Role::FeeExempt, who)
    }

    pub fn transfer_fee_bps(&self) -> u16 {
        self.transfer_fee_bps
    }
}

//! Multi-signature treasury custody
//!
//! Withdrawals follow a three-call request/approve/execute workflow rather
//! than a single multi-sig submission, so each owner's intent is
//! independently auditable and execution only reads already-finalized
//! approval state. The requester's approval is recorded implicitly; the
//! executed flag flips before the funds move.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::access::{AccessRegistry, Role};
use crate::config::TreasuryConfig;
use crate::error::{Error, Result};
use crate::protocol::{PlayerId, RequestId, Tokens, TREASURY_ADDRESS};
use crate::token::TokenLedger;

/// Pending or executed withdrawal request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawalRequest {
    pub id: RequestId,
    pub to: PlayerId,
    pub amount: Tokens,
    pub approvals: HashSet<PlayerId>,
    pub executed: bool,
}

/// Multi-signature custody over the treasury account
pub struct Treasury {
    config: TreasuryConfig,
    access: Arc<AccessRegistry>,
    ledger: Arc<TokenLedger>,
    requests: RwLock<HashMap<RequestId, WithdrawalRequest>>,
    next_id: AtomicU64,
}

impl Treasury {
    pub fn new(
        config: TreasuryConfig,
        access: Arc<AccessRegistry>,
        ledger: Arc<TokenLedger>,
    ) -> Self {
        Self {
            config,
            access,
            ledger,
            requests: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Open a withdrawal request. Owners only; the requester's approval
    /// counts toward the threshold.
    pub fn request_withdrawal(
        &self,
        caller: PlayerId,
        to: PlayerId,
        amount: Tokens,
    ) -> Result<RequestId> {
        self.access.require_role(Role::Owner, &caller)?;

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let mut approvals = HashSet::new();
        approvals.insert(caller);
        self.requests.write().insert(
            id,
            WithdrawalRequest {
                id,
                to,
                amount,
                approvals,
                executed: false,
            },
        );
        info!(
            request = id,
            to = %hex::encode(to),
            %amount,
            "withdrawal requested"
        );
        Ok(id)
    }

    /// Add an owner's approval to a pending request.
    pub fn approve_withdrawal(&self, caller: PlayerId, request_id: RequestId) -> Result<()> {
        self.access.require_role(Role::Owner, &caller)?;

        let mut requests = self.requests.write();
        let request = requests.get_mut(&request_id).ok_or(Error::RequestNotFound)?;
        if request.executed {
            return Err(Error::AlreadyExecuted);
        }
        if !request.approvals.insert(caller) {
            return Err(Error::AlreadyApproved);
        }
        info!(
            request = request_id,
            approvals = request.approvals.len(),
            "withdrawal approved"
        );
        Ok(())
    }

    /// Execute a request once the approval set reaches the governance
    /// threshold. Debits exactly `amount` from treasury funds.
    pub fn execute_withdrawal(&self, request_id: RequestId) -> Result<()> {
        let (to, amount) = {
            let mut requests = self.requests.write();
            let request = requests.get_mut(&request_id).ok_or(Error::RequestNotFound)?;
            if request.executed {
                return Err(Error::AlreadyExecuted);
            }
            if request.approvals.len() < self.config.approval_threshold {
                return Err(Error::InsufficientApprovals);
            }
            if self.ledger.balance_of(&TREASURY_ADDRESS) < request.amount {
                return Err(Error::InsufficientBalance);
            }
            // finalized before the funds move
            request.executed = true;
            (request.to, request.amount)
        };

        self.ledger.transfer(TREASURY_ADDRESS, to, amount)?;
        info!(request = request_id, %amount, "withdrawal executed");
        Ok(())
    }

    /// Read-only request lookup.
    pub fn get_request(&self, request_id: RequestId) -> Result<WithdrawalRequest> {
        self.requests
            .read()
            .get(&request_id)
            .cloned()
            .ok_or(Error::RequestNotFound)
    }
}

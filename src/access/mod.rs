//! Role-based access registry
//!
//! Leaf dependency for every other component: owners, treasury-role holders,
//! game managers and fee-exempt parties. Built at genesis with a 2-of-2 owner
//! governance pair; roles are additive and revocable only by an owner. Every
//! change is emitted on a broadcast channel for auditors.

use std::collections::{HashMap, HashSet};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::info;

use crate::error::{Error, Result};
use crate::protocol::PlayerId;

/// Enumerated capabilities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Governance pair member; may grant/revoke roles and approve withdrawals
    Owner,
    /// May allocate rewards drawn from treasury funds
    TreasuryRole,
    /// May verify ended play sessions
    GameManager,
    /// Excused from the token ledger's universal transfer fee
    FeeExempt,
}

/// Role-change event consumed by auditors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RoleEvent {
    Granted {
        role: Role,
        principal: PlayerId,
        by: PlayerId,
    },
    Revoked {
        role: Role,
        principal: PlayerId,
        by: PlayerId,
    },
}

/// Authorization source of truth
pub struct AccessRegistry {
    roles: RwLock<HashMap<Role, HashSet<PlayerId>>>,
    events: broadcast::Sender<RoleEvent>,
}

impl AccessRegistry {
    /// Create the registry with its genesis owner pair.
    pub fn new(owner_a: PlayerId, owner_b: PlayerId) -> Self {
        let (events, _) = broadcast::channel(256);
        let mut roles: HashMap<Role, HashSet<PlayerId>> = HashMap::new();
        roles
            .entry(Role::Owner)
            .or_default()
            .extend([owner_a, owner_b]);
        Self {
            roles: RwLock::new(roles),
            events,
        }
    }

    /// Grant `role` to `principal`. Caller must hold `Owner`.
    pub fn grant_role(&self, caller: PlayerId, role: Role, principal: PlayerId) -> Result<()> {
        self.require_role(Role::Owner, &caller)?;
        self.roles.write().entry(role).or_default().insert(principal);
        info!(
            role = ?role,
            principal = %hex::encode(principal),
            "role granted"
        );
        let _ = self.events.send(RoleEvent::Granted {
            role,
            principal,
            by: caller,
        });
        Ok(())
    }

    /// Revoke `role` from `principal`. Caller must hold `Owner`.
    pub fn revoke_role(&self, caller: PlayerId, role: Role, principal: PlayerId) -> Result<()> {
        self.require_role(Role::Owner, &caller)?;
        self.roles
            .write()
            .entry(role)
            .or_default()
            .remove(&principal);
        info!(
            role = ?role,
            principal = %hex::encode(principal),
            "role revoked"
        );
        let _ = self.events.send(RoleEvent::Revoked {
            role,
            principal,
            by: caller,
        });
        Ok(())
    }

    pub fn has_role(&self, role: Role, principal: &PlayerId) -> bool {
        self.roles
            .read()
            .get(&role)
            .map(|members| members.contains(principal))
            .unwrap_or(false)
    }

    /// Authorization predicate checked at component entry points.
    pub fn require_role(&self, role: Role, principal: &PlayerId) -> Result<()> {
        if self.has_role(role, principal) {
            Ok(())
        } else {
            Err(Error::Unauthorized)
        }
    }

    pub fn owner_count(&self) -> usize {
        self.roles
            .read()
            .get(&Role::Owner)
            .map(|members| members.len())
            .unwrap_or(0)
    }

    /// Subscribe to the role-change audit stream.
    pub fn subscribe(&self) -> broadcast::Receiver<RoleEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::random_player_id;

    #[test]
    fn test_genesis_owner_pair() {
        let (a, b) = (random_player_id(), random_player_id());
        let registry = AccessRegistry::new(a, b);
        assert_eq!(registry.owner_count(), 2);
        assert!(registry.has_role(Role::Owner, &a));
        assert!(registry.has_role(Role::Owner, &b));
    }

    #[test]
    fn test_grant_requires_owner() {
        let (a, b) = (random_player_id(), random_player_id());
        let registry = AccessRegistry::new(a, b);
        let outsider = random_player_id();
        let manager = random_player_id();

        assert_eq!(
            registry.grant_role(outsider, Role::GameManager, manager),
            Err(Error::Unauthorized)
        );
        registry.grant_role(a, Role::GameManager, manager).unwrap();
        assert!(registry.has_role(Role::GameManager, &manager));
    }

    #[test]
    fn test_revoke_roles() {
        let (a, b) = (random_player_id(), random_player_id());
        let registry = AccessRegistry::new(a, b);
        let manager = random_player_id();

        registry.grant_role(a, Role::GameManager, manager).unwrap();
        registry.revoke_role(b, Role::GameManager, manager).unwrap();
        assert!(!registry.has_role(Role::GameManager, &manager));
    }

    #[tokio::test]
    async fn test_role_events_reach_auditors() {
        let (a, b) = (random_player_id(), random_player_id());
        let registry = AccessRegistry::new(a, b);
        let mut auditor = registry.subscribe();

        let exempt = random_player_id();
        registry.grant_role(a, Role::FeeExempt, exempt).unwrap();

        match auditor.recv().await.unwrap() {
            RoleEvent::Granted { role, principal, by } => {
                assert_eq!(role, Role::FeeExempt);
                assert_eq!(principal, exempt);
                assert_eq!(by, a);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }
}

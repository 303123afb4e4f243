//! Play-session registry and anti-cheat lifecycle
//!
//! Sessions move `Active -> Ended` and may then be reviewed once by a game
//! manager. The two-phase start/end split separates commitment (cooldown,
//! anti-spam) from scoring; the distinct verification phase lets an off-chain
//! anti-cheat oracle gate reward and leaderboard eligibility without blocking
//! session creation throughput.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::info;

use crate::access::{AccessRegistry, Role};
use crate::config::SessionConfig;
use crate::error::{Error, Result};
use crate::mirror::{MirrorEvent, MirrorLog};
use crate::protocol::{timestamp_ms, AssetId, GameId, PlayerId, SessionId};

/// Lifecycle state of a play session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Active,
    Ended,
}

/// One bounded instance of gameplay tracked for scoring and anti-cheat
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub player: PlayerId,
    pub game_id: GameId,
    pub nft_id: AssetId,
    pub start_time: u64,
    pub end_time: Option<u64>,
    pub score: u64,
    /// Opaque blob inspected by the anti-cheat oracle; never interpreted here
    pub proof: Vec<u8>,
    pub state: SessionState,
    /// `None` until a game manager records a verdict; settable exactly once
    pub verified: Option<bool>,
}

impl Session {
    pub fn is_verified(&self) -> bool {
        self.verified == Some(true)
    }
}

/// Per-player, per-game session lifecycle manager
pub struct SessionRegistry {
    config: SessionConfig,
    access: Arc<AccessRegistry>,
    mirror: Arc<MirrorLog>,
    sessions: RwLock<HashMap<SessionId, Session>>,
    latest_by_player: RwLock<HashMap<PlayerId, SessionId>>,
    nonce: AtomicU64,
}

impl SessionRegistry {
    pub fn new(config: SessionConfig, access: Arc<AccessRegistry>, mirror: Arc<MirrorLog>) -> Self {
        Self {
            config,
            access,
            mirror,
            sessions: RwLock::new(HashMap::new()),
            latest_by_player: RwLock::new(HashMap::new()),
            nonce: AtomicU64::new(1),
        }
    }

    /// Start a new session for `player`. Fails with `CooldownActive` while
    /// the player has an active session or one that ended inside the
    /// cooldown window.
    pub fn start_session(
        &self,
        player: PlayerId,
        game_id: GameId,
        nft_id: AssetId,
    ) -> Result<SessionId> {
        let now = timestamp_ms();
        let mut sessions = self.sessions.write();
        let mut latest = self.latest_by_player.write();

        if let Some(previous_id) = latest.get(&player) {
            if let Some(previous) = sessions.get(previous_id) {
                match previous.state {
                    SessionState::Active => return Err(Error::CooldownActive),
                    SessionState::Ended => {
                        let ended_at = previous.end_time.unwrap_or(previous.start_time);
                        if now < ended_at.saturating_add(self.config.cooldown_ms) {
                            return Err(Error::CooldownActive);
                        }
                    }
                }
            }
        }

        let id = self.derive_session_id(&player, game_id);
        let session = Session {
            id,
            player,
            game_id,
            nft_id,
            start_time: now,
            end_time: None,
            score: 0,
            proof: Vec::new(),
            state: SessionState::Active,
            verified: None,
        };
        sessions.insert(id, session);
        latest.insert(player, id);

        info!(
            session = %hex::encode(id),
            player = %hex::encode(player),
            game_id,
            "session started"
        );
        self.mirror.publish(MirrorEvent::SessionStarted {
            session_id: id,
            player,
            game_id,
            start_time: now,
        });
        Ok(id)
    }

    /// End an active session, recording its score and anti-cheat proof.
    /// Only the session's player may end it, and only after the minimum
    /// duration has elapsed.
    pub fn end_session(
        &self,
        caller: PlayerId,
        id: SessionId,
        score: u64,
        proof: Vec<u8>,
    ) -> Result<()> {
        let now = timestamp_ms();
        let mut sessions = self.sessions.write();
        let session = sessions.get_mut(&id).ok_or(Error::SessionNotFound)?;

        if session.player != caller {
            return Err(Error::Unauthorized);
        }
        if session.state != SessionState::Active {
            return Err(Error::NotActive);
        }
        if now < session.start_time.saturating_add(self.config.min_duration_ms) {
            return Err(Error::TooSoon);
        }

        session.state = SessionState::Ended;
        session.end_time = Some(now);
        session.score = score;
        session.proof = proof;

        info!(
            session = %hex::encode(id),
            score,
            "session ended"
        );
        self.mirror.publish(MirrorEvent::SessionEnded {
            session_id: id,
            player: session.player,
            game_id: session.game_id,
            score,
            end_time: now,
        });
        Ok(())
    }

    /// Record the anti-cheat verdict for an ended session. Game managers
    /// only; one verdict per session; never alters the score.
    pub fn verify_session(&self, caller: PlayerId, id: SessionId, verified: bool) -> Result<()> {
        self.access.require_role(Role::GameManager, &caller)?;

        let mut sessions = self.sessions.write();
        let session = sessions.get_mut(&id).ok_or(Error::SessionNotFound)?;

        if session.state != SessionState::Ended {
            return Err(Error::NotEnded);
        }
        if session.verified.is_some() {
            return Err(Error::AlreadyVerified);
        }

        session.verified = Some(verified);
        info!(session = %hex::encode(id), verified, "session verdict recorded");
        Ok(())
    }

    /// Read-only session lookup.
    pub fn get_session(&self, id: &SessionId) -> Result<Session> {
        self.sessions
            .read()
            .get(id)
            .cloned()
            .ok_or(Error::SessionNotFound)
    }

    /// Fresh id derived from player, game and a monotonic nonce so two
    /// starts can never collide.
    fn derive_session_id(&self, player: &PlayerId, game_id: GameId) -> SessionId {
        let nonce = self.nonce.fetch_add(1, Ordering::SeqCst);
        let mut hasher = Sha256::new();
        hasher.update(player);
        hasher.update(game_id.to_be_bytes());
        hasher.update(nonce.to_be_bytes());
        let digest = hasher.finalize();
        let mut id = [0u8; 32];
        id.copy_from_slice(&digest);
        id
    }
}

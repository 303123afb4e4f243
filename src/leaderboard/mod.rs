//! Fee-gated, verified-session leaderboards
//!
//! A score enters the rankings only when its backing session passed
//! anti-cheat verification and the submitted number matches the session
//! record, which blocks replay with an inflated score. Boards are bounded
//! top-N per game, sorted descending; a player's slot is replaced only by a
//! strictly higher score. The submission fee is forwarded to the treasury.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::LeaderboardConfig;
use crate::error::{Error, Result};
use crate::mirror::{MirrorEvent, MirrorLog};
use crate::protocol::{timestamp_ms, AssetId, GameId, PlayerId, SessionId, TREASURY_ADDRESS};
use crate::session::SessionRegistry;
use crate::token::TokenLedger;

/// One top-N slot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub game_id: GameId,
    pub player: PlayerId,
    pub best_score: u64,
    pub session_id: SessionId,
}

/// Bounded top-N rankings per game
pub struct LeaderboardManager {
    config: LeaderboardConfig,
    sessions: Arc<SessionRegistry>,
    ledger: Arc<TokenLedger>,
    mirror: Arc<MirrorLog>,
    boards: RwLock<HashMap<GameId, Vec<LeaderboardEntry>>>,
}

impl LeaderboardManager {
    pub fn new(
        config: LeaderboardConfig,
        sessions: Arc<SessionRegistry>,
        ledger: Arc<TokenLedger>,
        mirror: Arc<MirrorLog>,
    ) -> Self {
        Self {
            config,
            sessions,
            ledger,
            mirror,
            boards: RwLock::new(HashMap::new()),
        }
    }

    /// Submit a verified session's score. Charges the submission fee and
    /// updates the caller's best-score slot for the game.
    pub fn submit_score(
        &self,
        caller: PlayerId,
        session_id: SessionId,
        score: u64,
        nft_id: AssetId,
        game_id: GameId,
    ) -> Result<()> {
        let session = self.sessions.get_session(&session_id)?;
        if session.player != caller {
            return Err(Error::Unauthorized);
        }
        if session.game_id != game_id || session.nft_id != nft_id {
            return Err(Error::InvalidData(
                "session does not match submitted game or nft".to_string(),
            ));
        }
        if !session.is_verified() {
            return Err(Error::NotVerified);
        }
        if session.score != score {
            return Err(Error::ScoreMismatch);
        }
        if self.ledger.balance_of(&caller) < self.config.submission_fee {
            return Err(Error::InsufficientPayment);
        }

        // all guards passed; fee first, board mutation after
        self.ledger
            .transfer(caller, TREASURY_ADDRESS, self.config.submission_fee)?;

        let mut boards = self.boards.write();
        let board = boards.entry(game_id).or_default();
        match board.iter_mut().find(|entry| entry.player == caller) {
            Some(entry) => {
                // only a strictly higher score replaces the slot
                if score > entry.best_score {
                    entry.best_score = score;
                    entry.session_id = session_id;
                }
            }
            None => {
                board.push(LeaderboardEntry {
                    game_id,
                    player: caller,
                    best_score: score,
                    session_id,
                });
            }
        }
        board.sort_by(|a, b| b.best_score.cmp(&a.best_score));
        board.truncate(self.config.max_entries);

        info!(
            game_id,
            player = %hex::encode(caller),
            score,
            "score submitted"
        );
        self.mirror.publish(MirrorEvent::ScoreSubmitted {
            session_id,
            player: caller,
            game_id,
            score,
            timestamp: timestamp_ms(),
        });
        Ok(())
    }

    /// Best retained score for a player on a game's board.
    pub fn get_player_best_score(&self, game_id: GameId, player: &PlayerId) -> Option<u64> {
        self.boards
            .read()
            .get(&game_id)
            .and_then(|board| board.iter().find(|entry| entry.player == *player))
            .map(|entry| entry.best_score)
    }

    /// Top `n` entries for a game, sorted descending by score.
    pub fn get_leaderboard(&self, game_id: GameId, n: usize) -> Vec<LeaderboardEntry> {
        self.boards
            .read()
            .get(&game_id)
            .map(|board| board.iter().take(n).cloned().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::{AccessRegistry, Role};
    use crate::config::{MirrorConfig, SessionConfig};
    use crate::protocol::{random_player_id, Tokens};

    struct Fixture {
        leaderboard: LeaderboardManager,
        sessions: Arc<SessionRegistry>,
        ledger: Arc<TokenLedger>,
        manager: PlayerId,
    }

    fn fixture(max_entries: usize) -> Fixture {
        let owner = random_player_id();
        let access = Arc::new(AccessRegistry::new(owner, random_player_id()));
        let manager = random_player_id();
        access
            .grant_role(owner, Role::GameManager, manager)
            .unwrap();
        let ledger = Arc::new(TokenLedger::new(access.clone(), 200));
        let mirror = Arc::new(MirrorLog::new(MirrorConfig::default()));
        let sessions = Arc::new(SessionRegistry::new(
            SessionConfig {
                cooldown_ms: 0,
                min_duration_ms: 0,
            },
            access,
            mirror.clone(),
        ));
        let leaderboard = LeaderboardManager::new(
            LeaderboardConfig {
                max_entries,
                submission_fee: Tokens::new(50),
            },
            sessions.clone(),
            ledger.clone(),
            mirror,
        );
        Fixture {
            leaderboard,
            sessions,
            ledger,
            manager,
        }
    }

    fn verified_session(fx: &Fixture, player: PlayerId, game: GameId, score: u64) -> SessionId {
        let id = fx.sessions.start_session(player, game, 1).unwrap();
        fx.sessions.end_session(player, id, score, Vec::new()).unwrap();
        fx.sessions.verify_session(fx.manager, id, true).unwrap();
        id
    }

    #[test]
    fn test_unverified_session_rejected() {
        let fx = fixture(10);
        let player = random_player_id();
        fx.ledger.mint(player, Tokens::new(1_000)).unwrap();

        let id = fx.sessions.start_session(player, 0, 1).unwrap();
        fx.sessions.end_session(player, id, 100, Vec::new()).unwrap();

        assert_eq!(
            fx.leaderboard.submit_score(player, id, 100, 1, 0),
            Err(Error::NotVerified)
        );
    }

    #[test]
    fn test_score_must_match_session_record() {
        let fx = fixture(10);
        let player = random_player_id();
        fx.ledger.mint(player, Tokens::new(1_000)).unwrap();
        let id = verified_session(&fx, player, 0, 100);

        assert_eq!(
            fx.leaderboard.submit_score(player, id, 9_999, 1, 0),
            Err(Error::ScoreMismatch)
        );
    }

    #[test]
    fn test_submission_fee_forwarded_to_treasury() {
        let fx = fixture(10);
        let player = random_player_id();
        fx.ledger.mint(player, Tokens::new(1_000)).unwrap();
        let id = verified_session(&fx, player, 0, 100);

        fx.leaderboard.submit_score(player, id, 100, 1, 0).unwrap();
        assert_eq!(fx.ledger.balance_of(&TREASURY_ADDRESS), Tokens::new(50));
        assert_eq!(
            fx.leaderboard.get_player_best_score(0, &player),
            Some(100)
        );
    }

    #[test]
    fn test_only_strictly_higher_score_replaces_slot() {
        let fx = fixture(10);
        let player = random_player_id();
        fx.ledger.mint(player, Tokens::new(10_000)).unwrap();

        let high = verified_session(&fx, player, 0, 500);
        fx.leaderboard.submit_score(player, high, 500, 1, 0).unwrap();

        let low = verified_session(&fx, player, 0, 300);
        fx.leaderboard.submit_score(player, low, 300, 1, 0).unwrap();
        assert_eq!(fx.leaderboard.get_player_best_score(0, &player), Some(500));

        let higher = verified_session(&fx, player, 0, 700);
        fx.leaderboard
            .submit_score(player, higher, 700, 1, 0)
            .unwrap();
        assert_eq!(fx.leaderboard.get_player_best_score(0, &player), Some(700));
    }

    #[test]
    fn test_board_is_bounded_and_sorted() {
        let fx = fixture(3);
        for score in [100u64, 400, 200, 300, 50] {
            let player = random_player_id();
            fx.ledger.mint(player, Tokens::new(1_000)).unwrap();
            let id = verified_session(&fx, player, 7, score);
            fx.leaderboard.submit_score(player, id, score, 1, 7).unwrap();
        }

        let board = fx.leaderboard.get_leaderboard(7, 10);
        let scores: Vec<u64> = board.iter().map(|entry| entry.best_score).collect();
        assert_eq!(scores, vec![400, 300, 200]);
    }

    #[test]
    fn test_submission_requires_fee_balance() {
        let fx = fixture(10);
        let player = random_player_id();
        let id = verified_session(&fx, player, 0, 10);

        assert_eq!(
            fx.leaderboard.submit_score(player, id, 10, 1, 0),
            Err(Error::InsufficientPayment)
        );
        assert!(fx.leaderboard.get_leaderboard(0, 10).is_empty());
    }
}

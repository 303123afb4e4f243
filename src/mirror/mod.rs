//! Off-chain audit mirror
//!
//! Session and score events are mirrored to an append-only, topic-per-game
//! log for public auditability. Publishing is fire-and-forget: correctness of
//! the economy layer never depends on a subscriber being present, so dropped
//! receivers are ignored. Each topic retains a bounded history that can be
//! exported as JSON.

use std::collections::{HashMap, VecDeque};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::config::MirrorConfig;
use crate::error::Result;
use crate::protocol::{GameId, PlayerId, SessionId};

/// Events mirrored for public audit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MirrorEvent {
    SessionStarted {
        session_id: SessionId,
        player: PlayerId,
        game_id: GameId,
        start_time: u64,
    },
    SessionEnded {
        session_id: SessionId,
        player: PlayerId,
        game_id: GameId,
        score: u64,
        end_time: u64,
    },
    ScoreSubmitted {
        session_id: SessionId,
        player: PlayerId,
        game_id: GameId,
        score: u64,
        timestamp: u64,
    },
}

impl MirrorEvent {
    pub fn game_id(&self) -> GameId {
        match self {
            MirrorEvent::SessionStarted { game_id, .. }
            | MirrorEvent::SessionEnded { game_id, .. }
            | MirrorEvent::ScoreSubmitted { game_id, .. } => *game_id,
        }
    }
}

struct Topic {
    sender: broadcast::Sender<MirrorEvent>,
    history: VecDeque<MirrorEvent>,
}

impl Topic {
    fn new() -> Self {
        let (sender, _) = broadcast::channel(1024);
        Self {
            sender,
            history: VecDeque::new(),
        }
    }
}

/// Topic-partitioned append-only mirror, one topic per game
pub struct MirrorLog {
    config: MirrorConfig,
    topics: RwLock<HashMap<GameId, Topic>>,
}

impl MirrorLog {
    pub fn new(config: MirrorConfig) -> Self {
        Self {
            config,
            topics: RwLock::new(HashMap::new()),
        }
    }

    /// Publish an event to its game topic. Never fails; no acknowledgment is
    /// required for correctness.
    pub fn publish(&self, event: MirrorEvent) {
        let mut topics = self.topics.write();
        let topic = topics.entry(event.game_id()).or_insert_with(Topic::new);
        topic.history.push_back(event.clone());
        while topic.history.len() > self.config.retained_events {
            topic.history.pop_front();
        }
        let _ = topic.sender.send(event);
    }

    /// Subscribe to a game's topic.
    pub fn subscribe(&self, game_id: GameId) -> broadcast::Receiver<MirrorEvent> {
        self.topics
            .write()
            .entry(game_id)
            .or_insert_with(Topic::new)
            .sender
            .subscribe()
    }

    /// Export the retained history of a topic as JSON for auditors.
    pub fn export_topic(&self, game_id: GameId) -> Result<String> {
        let topics = self.topics.read();
        let history: Vec<&MirrorEvent> = topics
            .get(&game_id)
            .map(|topic| topic.history.iter().collect())
            .unwrap_or_default();
        Ok(serde_json::to_string_pretty(&history)?)
    }

    pub fn topic_len(&self, game_id: GameId) -> usize {
        self.topics
            .read()
            .get(&game_id)
            .map(|topic| topic.history.len())
            .unwrap_or(0)
    }
}

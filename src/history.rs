use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;

use crate::store::{DataStore, HISTORY_KEY};

/// Most recent turns kept at rest.
pub const MAX_HISTORY_TURNS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Chronological transcript, never longer than [`MAX_HISTORY_TURNS`] after a push.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationHistory(Vec<ChatTurn>);

impl ConversationHistory {
    /// Appends, then drops from the front until the bound holds.
    pub fn push(&mut self, turn: ChatTurn) {
        self.0.push(turn);
        if self.0.len() > MAX_HISTORY_TURNS {
            let overflow = self.0.len() - MAX_HISTORY_TURNS;
            self.0.drain(..overflow);
        }
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Decodes a persisted value. Unreadable turns are skipped one by one;
    /// anything that is not a list yields an empty history. An oversized list
    /// is cut to the most recent turns.
    fn from_persisted(value: Option<Value>) -> Self {
        let entries = match value {
            None => return Self::default(),
            Some(Value::Array(entries)) => entries,
            Some(other) => {
                warn!("[tray:history] Discarding conversation history that is not a list: {other}");
                return Self::default();
            }
        };

        let turns: Vec<ChatTurn> = entries
            .into_iter()
            .filter_map(|entry| match serde_json::from_value::<ChatTurn>(entry.clone()) {
                Ok(turn) => Some(turn),
                Err(err) => {
                    warn!("[tray:history] Skipping unreadable turn {entry} ({err})");
                    None
                }
            })
            .collect();

        let skip = turns.len().saturating_sub(MAX_HISTORY_TURNS);
        Self(turns.into_iter().skip(skip).collect())
    }
}

impl From<Vec<ChatTurn>> for ConversationHistory {
    fn from(turns: Vec<ChatTurn>) -> Self {
        let mut history = Self::default();
        for turn in turns {
            history.push(turn);
        }
        history
    }
}

/// In-memory transcript mirrored to the `conversationHistory` field.
///
/// Each mutation is persisted before the call returns, under the same lock
/// that guards the in-memory copy, so readers never see a state that is not
/// also on disk.
pub struct HistoryStore {
    store: DataStore,
    history: Mutex<ConversationHistory>,
}

impl HistoryStore {
    pub async fn load(store: DataStore) -> Self {
        let persisted = match store.field(HISTORY_KEY).await {
            Ok(value) => value,
            Err(err) => {
                warn!("[tray:history] Failed to read conversation history: {err}");
                None
            }
        };

        Self {
            store,
            history: Mutex::new(ConversationHistory::from_persisted(persisted)),
        }
    }

    pub async fn append(&self, turn: ChatTurn) {
        let mut history = self.history.lock().await;
        history.push(turn);
        self.persist(&history).await;
    }

    pub async fn clear(&self) {
        let mut history = self.history.lock().await;
        history.clear();
        self.persist(&history).await;
    }

    pub async fn snapshot(&self) -> ConversationHistory {
        self.history.lock().await.clone()
    }

    async fn persist(&self, history: &ConversationHistory) {
        let value = match serde_json::to_value(history) {
            Ok(value) => value,
            Err(err) => {
                warn!("[tray:history] Failed to encode conversation history: {err}");
                return;
            }
        };
        if let Err(err) = self.store.put_field(HISTORY_KEY, value).await {
            warn!("[tray:history] Failed to persist conversation history, keeping it in memory: {err}");
        }
    }
}

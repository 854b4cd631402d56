//! Chat requests against the model server's `/api/chat` route.
//!
//! The server streams one JSON object per line, each carrying a content
//! delta. The whole body is read, folded line by line into a single reply,
//! and lines that do not parse are skipped.

use log::{debug, error, info, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::history::{ChatTurn, ConversationHistory, HistoryStore};
use crate::settings::SettingsStore;

/// Returned as ordinary reply text when the server answered with no content.
pub const NO_RESPONSE_RECEIVED: &str = "No response received";
pub const CONNECTION_FAILED_MESSAGE: &str = "Error connecting to Ollama. Make sure it's running.";

#[derive(Debug, Error)]
pub enum ChatError {
    /// The request never produced a readable response body.
    #[error("failed to reach the model server: {0}")]
    ConnectionFailed(#[from] reqwest::Error),
}

impl ChatError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ChatError::ConnectionFailed(_) => CONNECTION_FAILED_MESSAGE,
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatTurn],
}

#[derive(Deserialize)]
struct StreamChunk {
    #[serde(default)]
    message: Option<ChunkMessage>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct ChunkMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Concatenates the `message.content` deltas of every parseable line.
pub fn assemble_reply(body: &str) -> String {
    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(content_delta)
        .fold(String::new(), |mut reply, delta| {
            reply.push_str(&delta);
            reply
        })
}

fn content_delta(line: &str) -> Option<String> {
    let chunk = match serde_json::from_str::<StreamChunk>(line) {
        Ok(chunk) => chunk,
        Err(err) => {
            debug!("[tray:chat] Skipping unparseable stream line ({err}): {line}");
            return None;
        }
    };

    if let Some(message) = chunk.error {
        warn!("[tray:chat] Model server reported an error: {message}");
    }

    chunk
        .message
        .and_then(|message| message.content)
        .filter(|content| !content.is_empty())
}

/// Owns the conversation and performs one request per sent message.
pub struct ChatAdapter {
    client: Client,
    settings: SettingsStore,
    history: HistoryStore,
    send_gate: Mutex<()>,
}

impl ChatAdapter {
    pub fn new(client: Client, settings: SettingsStore, history: HistoryStore) -> Self {
        Self {
            client,
            settings,
            history,
            send_gate: Mutex::new(()),
        }
    }

    /// Sends `text` with the full current history and records the reply.
    ///
    /// Sends are processed one at a time in arrival order. A transport
    /// failure leaves the user turn in history without an assistant turn. An
    /// empty reply yields [`NO_RESPONSE_RECEIVED`] and is not recorded.
    pub async fn send_message(&self, text: &str) -> Result<String, ChatError> {
        let _gate = self.send_gate.lock().await;

        self.history.append(ChatTurn::user(text)).await;

        let settings = self.settings.get().await;
        let history = self.history.snapshot().await;
        let url = format!("{}/api/chat", settings.api_base());

        info!(
            "[tray:chat] Using model {} for chat request",
            settings.selected_model
        );

        let body = self
            .request(&url, &settings.selected_model, &history)
            .await
            .inspect_err(|err| error!("[tray:chat] Chat request to {url} failed: {err}"))?;

        let reply = assemble_reply(&body);
        if reply.is_empty() {
            info!("[tray:chat] Model server returned no content");
            return Ok(NO_RESPONSE_RECEIVED.to_string());
        }

        self.history.append(ChatTurn::assistant(reply.clone())).await;
        Ok(reply)
    }

    pub async fn clear_history(&self) {
        self.history.clear().await;
    }

    pub async fn history(&self) -> ConversationHistory {
        self.history.snapshot().await
    }

    async fn request(
        &self,
        url: &str,
        model: &str,
        history: &ConversationHistory,
    ) -> Result<String, reqwest::Error> {
        let response = self
            .client
            .post(url)
            .json(&ChatRequest {
                model,
                messages: history.turns(),
            })
            .send()
            .await?;

        if !response.status().is_success() {
            warn!(
                "[tray:chat] Model server responded with status {}",
                response.status()
            );
        }

        response.text().await
    }
}

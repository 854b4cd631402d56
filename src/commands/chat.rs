use crate::events::ShellEvent;
use crate::history::ConversationHistory;
use crate::TrayRuntime;

/// Send a chat message and return the reply text or a sentinel.
pub async fn send_message(runtime: &TrayRuntime, message: &str) -> String {
    match runtime.chat().send_message(message).await {
        Ok(reply) => reply,
        Err(err) => err.user_message().to_string(),
    }
}

pub async fn clear_history(runtime: &TrayRuntime) -> bool {
    runtime.chat().clear_history().await;
    runtime.events().emit(&ShellEvent::HistoryCleared);
    true
}

pub async fn get_history(runtime: &TrayRuntime) -> ConversationHistory {
    runtime.chat().history().await
}

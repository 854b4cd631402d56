use parking_lot::RwLock;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

pub const HISTORY_CLEARED_EVENT: &str = "history-cleared";
pub const SETTINGS_CHANGED_EVENT: &str = "settings-changed";

/// Notifications pushed from the core to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellEvent {
    HistoryCleared,
    SettingsChanged { key: String },
}

impl ShellEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ShellEvent::HistoryCleared => HISTORY_CLEARED_EVENT,
            ShellEvent::SettingsChanged { .. } => SETTINGS_CHANGED_EVENT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Arc<dyn Fn(&ShellEvent) + Send + Sync>;

/// Fire-and-forget listener registry.
#[derive(Default)]
pub struct EventHub {
    next_id: AtomicU64,
    listeners: RwLock<Vec<(ListenerId, Listener)>>,
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&ShellEvent) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.write().push((id, Arc::new(listener)));
        id
    }

    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    pub fn emit(&self, event: &ShellEvent) {
        // Listeners run outside the lock so they may subscribe or unsubscribe.
        let listeners: Vec<Listener> = self
            .listeners
            .read()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();

        log::debug!(
            "[tray:events] Emitting {} to {} listener(s)",
            event.name(),
            listeners.len()
        );
        for listener in listeners {
            listener(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn listeners_receive_events_until_unsubscribed() {
        let hub = EventHub::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = seen.clone();
        let id = hub.subscribe(move |event| sink.lock().push(event.clone()));

        hub.emit(&ShellEvent::HistoryCleared);
        assert!(hub.unsubscribe(id));
        assert!(!hub.unsubscribe(id));
        hub.emit(&ShellEvent::HistoryCleared);

        assert_eq!(*seen.lock(), vec![ShellEvent::HistoryCleared]);
    }

    #[test]
    fn listener_may_subscribe_during_emit() {
        let hub = Arc::new(EventHub::new());
        let inner = hub.clone();
        hub.subscribe(move |_| {
            inner.subscribe(|_| {});
        });

        hub.emit(&ShellEvent::SettingsChanged {
            key: "apiUrl".into(),
        });
        assert_eq!(hub.listeners.read().len(), 2);
    }

    #[test]
    fn event_names_match_channels() {
        assert_eq!(ShellEvent::HistoryCleared.name(), "history-cleared");
        assert_eq!(
            ShellEvent::SettingsChanged { key: "x".into() }.name(),
            "settings-changed"
        );
    }
}

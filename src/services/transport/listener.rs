use dashmap::DashMap;
use parking_lot::ReentrantMutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cell::Cell;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

/// Обработчик события: получает сырую полезную нагрузку хоста
pub type EventHandler = Arc<dyn Fn(Value) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListenerId(pub u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

struct Listener {
    id: ListenerId,
    handler: EventHandler,
    // Held for the whole delivery; unlisten flips it under the same lock.
    // Reentrant so a handler can unlisten itself.
    active: ReentrantMutex<Cell<bool>>,
}

/// Named host-to-client event channels with independent multi-subscriber delivery.
///
/// Handlers run without any registry lock held, so they may listen or unlisten freely.
/// Once `unlisten` returns, the handler is never called again.
pub struct EventBus {
    next_id: AtomicU64,
    channels: DashMap<String, Vec<Arc<Listener>>>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            channels: DashMap::new(),
        }
    }

    pub fn listen(&self, event: &str, handler: EventHandler) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let listener = Arc::new(Listener {
            id,
            handler,
            active: ReentrantMutex::new(Cell::new(true)),
        });

        self.channels
            .entry(event.to_string())
            .or_default()
            .push(listener);

        debug!("Подписка {} на событие {}", id, event);
        id
    }

    /// Возвращает false, если подписка уже была снята
    pub fn unlisten(&self, event: &str, id: ListenerId) -> bool {
        let removed = {
            let mut channel = match self.channels.get_mut(event) {
                Some(channel) => channel,
                None => return false,
            };
            match channel.iter().position(|listener| listener.id == id) {
                Some(index) => channel.remove(index),
                None => return false,
            }
        };

        // Ждём завершения текущей доставки в другом потоке
        let active = removed.active.lock();
        active.set(false);

        debug!("Отписка {} от события {}", id, event);
        true
    }

    /// Доставляет событие всем подписчикам, возвращает число вызванных обработчиков
    pub fn emit(&self, event: &str, payload: Value) -> usize {
        let listeners: Vec<Arc<Listener>> = match self.channels.get(event) {
            Some(channel) => channel.clone(),
            None => {
                trace!("Событие {} без подписчиков", event);
                return 0;
            }
        };

        let mut delivered = 0;
        for listener in listeners {
            let active = listener.active.lock();
            if !active.get() {
                continue;
            }
            (listener.handler)(payload.clone());
            delivered += 1;
        }

        trace!("Событие {} доставлено {} подписчикам", event, delivered);
        delivered
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.channels.get(event).map_or(0, |channel| channel.len())
    }
}

use std::sync::{Arc, Mutex, Weak};

use super::MediaEvent;

pub type EventHandler = Box<dyn Fn(MediaEvent) + Send>;

#[derive(Default)]
struct Table {
    next_id: u64,
    handlers: Vec<(u64, EventHandler)>,
}

/// Registry of event handlers held by a media element.
///
/// Cloning shares the registry, so a watcher thread can emit into the same
/// handlers the element hands out subscriptions for.
#[derive(Clone, Default)]
pub struct Listeners {
    table: Arc<Mutex<Table>>,
}

impl Listeners {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler`; it stays registered until the returned
    /// `Subscription` is dropped.
    pub fn subscribe(&self, handler: EventHandler) -> Subscription {
        let id = match self.table.lock() {
            Ok(mut t) => {
                let id = t.next_id;
                t.next_id += 1;
                t.handlers.push((id, handler));
                id
            }
            Err(_) => u64::MAX,
        };

        Subscription {
            id,
            table: Arc::downgrade(&self.table),
        }
    }

    /// Deliver `event` to every registered handler.
    pub fn emit(&self, event: MediaEvent) {
        if let Ok(t) = self.table.lock() {
            for (_, handler) in &t.handlers {
                handler(event);
            }
        }
    }

    /// Number of live subscriptions.
    pub fn len(&self) -> usize {
        self.table.lock().map(|t| t.handlers.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Keeps a handler registered for as long as it is alive.
#[must_use = "dropping a Subscription unregisters its handler immediately"]
pub struct Subscription {
    id: u64,
    table: Weak<Mutex<Table>>,
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(table) = self.table.upgrade() {
            if let Ok(mut t) = table.lock() {
                t.handlers.retain(|(id, _)| *id != self.id);
            }
        }
    }
}

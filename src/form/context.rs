//! Change notifications for views bound to a form.
//!
//! Field views subscribe to the controller instead of reading ambient state.
//! Listeners registered for a field name receive that field's events plus every
//! form-wide event; global listeners receive everything.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, Weak};

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FormEvent {
    FieldRegistered { name: String },
    FieldUnregistered { name: String },
    ValueChanged { name: String },
    /// Errors, touched, validating or rules of a field changed.
    FieldChanged { name: String },
    /// Status, flags, or several fields at once changed.
    FormChanged,
    Reset,
    Submitted { valid: bool },
}

impl FormEvent {
    /// Field the event is about; `None` for form-wide events.
    pub fn field(&self) -> Option<&str> {
        match self {
            FormEvent::FieldRegistered { name }
            | FormEvent::FieldUnregistered { name }
            | FormEvent::ValueChanged { name }
            | FormEvent::FieldChanged { name } => Some(name),
            FormEvent::FormChanged | FormEvent::Reset | FormEvent::Submitted { .. } => None,
        }
    }
}

type Listener = Arc<dyn Fn(&FormEvent) + Send + Sync>;

struct ListenerEntry {
    field: Option<String>,
    listener: Listener,
}

#[derive(Default)]
pub(crate) struct SubscriberRegistry {
    next_id: AtomicU64,
    listeners: RwLock<BTreeMap<u64, ListenerEntry>>,
}

impl SubscriberRegistry {
    pub(crate) fn subscribe(
        self: &Arc<Self>,
        field: Option<String>,
        listener: impl Fn(&FormEvent) + Send + Sync + 'static,
    ) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let entry = ListenerEntry {
            field,
            listener: Arc::new(listener),
        };
        match self.listeners.write() {
            Ok(mut listeners) => {
                listeners.insert(id, entry);
            }
            Err(poisoned) => {
                poisoned.into_inner().insert(id, entry);
            }
        }
        Subscription {
            id,
            registry: Arc::downgrade(self),
        }
    }

    pub(crate) fn publish(&self, event: &FormEvent) {
        let targets = {
            let listeners = match self.listeners.read() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            listeners
                .values()
                .filter(|entry| match (&entry.field, event.field()) {
                    (None, _) | (Some(_), None) => true,
                    (Some(wanted), Some(name)) => wanted == name,
                })
                .map(|entry| entry.listener.clone())
                .collect::<Vec<_>>()
        };
        for listener in targets {
            listener(event);
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.listeners.read().map(|guard| guard.len()).unwrap_or(0)
    }

    fn remove(&self, id: u64) {
        match self.listeners.write() {
            Ok(mut listeners) => {
                listeners.remove(&id);
            }
            Err(poisoned) => {
                poisoned.into_inner().remove(&id);
            }
        }
    }
}

/// Keeps a listener registered; dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    registry: Weak<SubscriberRegistry>,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

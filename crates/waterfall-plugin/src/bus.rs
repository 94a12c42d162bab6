//! Plugin bus: named pub/sub events plus a shared key/value store.
//!
//! The bus is a cheap handle; clones share the same subscribers and data.
//! Emission iterates a snapshot of the subscriber list, so handlers may
//! subscribe or unsubscribe while an event is being delivered.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use rustc_hash::FxHashMap;

use crate::error::PluginError;

type BusHandler = Rc<dyn Fn(&dyn Any) -> Result<(), PluginError>>;

/// Identifier of a single subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Default)]
struct BusInner {
    handlers: FxHashMap<String, Vec<(SubscriptionId, BusHandler)>>,
    data: FxHashMap<String, Rc<dyn Any>>,
    next_id: u64,
}

impl BusInner {
    fn next_id(&mut self) -> SubscriptionId {
        self.next_id += 1;
        SubscriptionId(self.next_id)
    }

    fn remove(&mut self, event: &str, id: SubscriptionId) -> bool {
        let Some(list) = self.handlers.get_mut(event) else {
            return false;
        };
        let before = list.len();
        list.retain(|(existing, _)| *existing != id);
        let removed = list.len() != before;
        if list.is_empty() {
            self.handlers.remove(event);
        }
        removed
    }
}

#[derive(Clone, Default)]
pub struct PluginBus {
    inner: Rc<RefCell<BusInner>>,
}

impl PluginBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivers `payload` to every subscriber of `event`.
    ///
    /// A failing handler is logged and does not stop delivery to the others.
    /// Returns the number of handlers invoked.
    pub fn emit(&self, event: &str, payload: &dyn Any) -> usize {
        let snapshot: Vec<BusHandler> = match self.inner.borrow().handlers.get(event) {
            Some(list) => list.iter().map(|(_, handler)| Rc::clone(handler)).collect(),
            None => return 0,
        };
        for handler in &snapshot {
            if let Err(err) = handler(payload) {
                log::warn!("[waterfall] bus handler for `{event}` failed: {err}");
            }
        }
        snapshot.len()
    }

    /// Subscribes `handler` to `event`.
    pub fn on<F>(&self, event: impl Into<String>, handler: F) -> Subscription
    where
        F: Fn(&dyn Any) -> Result<(), PluginError> + 'static,
    {
        let event = event.into();
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id();
        inner
            .handlers
            .entry(event.clone())
            .or_default()
            .push((id, Rc::new(handler)));
        Subscription {
            bus: Rc::downgrade(&self.inner),
            event,
            id,
        }
    }

    /// Subscribes `handler` for a single delivery.
    pub fn once<F>(&self, event: impl Into<String>, handler: F) -> Subscription
    where
        F: Fn(&dyn Any) -> Result<(), PluginError> + 'static,
    {
        let event = event.into();
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id();
        let weak = Rc::downgrade(&self.inner);
        let name = event.clone();
        let wrapper = move |payload: &dyn Any| {
            if let Some(inner) = weak.upgrade() {
                if !inner.borrow_mut().remove(&name, id) {
                    // Already delivered through an earlier snapshot.
                    return Ok(());
                }
            }
            handler(payload)
        };
        inner
            .handlers
            .entry(event.clone())
            .or_default()
            .push((id, Rc::new(wrapper)));
        Subscription {
            bus: Rc::downgrade(&self.inner),
            event,
            id,
        }
    }

    /// Removes one subscription, or every subscription of `event` when `id` is `None`.
    pub fn off(&self, event: &str, id: Option<SubscriptionId>) {
        let mut inner = self.inner.borrow_mut();
        match id {
            Some(id) => {
                inner.remove(event, id);
            }
            None => {
                inner.handlers.remove(event);
            }
        }
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.inner
            .borrow()
            .handlers
            .get(event)
            .map_or(0, |list| list.len())
    }

    /// Stores `value` under `key`, replacing any previous value.
    pub fn set_data<V: Any>(&self, key: impl Into<String>, value: V) {
        self.inner
            .borrow_mut()
            .data
            .insert(key.into(), Rc::new(value));
    }

    /// Clone of the value under `key`, if present and of type `V`.
    pub fn get_data<V: Any + Clone>(&self, key: &str) -> Option<V> {
        self.inner
            .borrow()
            .data
            .get(key)
            .and_then(|value| value.downcast_ref::<V>())
            .cloned()
    }

    /// Shared handle to the raw value under `key`.
    pub fn get_raw(&self, key: &str) -> Option<Rc<dyn Any>> {
        self.inner.borrow().data.get(key).cloned()
    }

    /// Applies `update` to the value under `key` (starting from `V::default()`).
    pub fn update_data<V, F>(&self, key: &str, update: F)
    where
        V: Any + Clone + Default,
        F: FnOnce(&mut V),
    {
        let mut value: V = self.get_data(key).unwrap_or_default();
        update(&mut value);
        self.set_data(key, value);
    }

    pub fn delete_data(&self, key: &str) -> bool {
        self.inner.borrow_mut().data.remove(key).is_some()
    }

    pub fn has_data(&self, key: &str) -> bool {
        self.inner.borrow().data.contains_key(key)
    }

    /// Keys currently in the store, sorted.
    pub fn data_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.inner.borrow().data.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Drops every subscriber and every stored value.
    pub fn clear(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.handlers.clear();
        inner.data.clear();
    }
}

impl fmt::Debug for PluginBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("PluginBus")
            .field("events", &inner.handlers.len())
            .field("data", &inner.data.len())
            .finish()
    }
}

/// Handle returned by [`PluginBus::on`]. Dropping it keeps the subscription.
#[derive(Debug)]
pub struct Subscription {
    bus: Weak<RefCell<BusInner>>,
    event: String,
    id: SubscriptionId,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn event(&self) -> &str {
        &self.event
    }

    /// Removes the subscription. Returns false if it was already gone.
    pub fn unsubscribe(self) -> bool {
        match self.bus.upgrade() {
            Some(inner) => inner.borrow_mut().remove(&self.event, self.id),
            None => false,
        }
    }
}

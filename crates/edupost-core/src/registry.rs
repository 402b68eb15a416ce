//! Event subscriptions for bridge consumers.
//!
//! Listeners are stored per event name in an unordered map, so delivery order
//! between listeners of the same event is unspecified. Every registration hands
//! back a [`Subscription`] that can remove exactly that listener.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use serde_json::Value;
use smol_str::SmolStr;

use crate::message::{PreferenceUpdate, Snapshot, User};

/// Name of an event listeners can subscribe to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventName {
    /// Full `INIT_DATA` payload.
    InitData,
    /// The user sub-object of the latest snapshot.
    UserData,
    /// `PREFERENCE_UPDATE` payload.
    Preferences,
    /// Inbound `CONTENT_UPDATE` payload.
    ContentUpdate,
    /// Anything else, e.g. the height reporter's notifications.
    Custom(SmolStr),
}

impl EventName {
    pub fn as_str(&self) -> &str {
        match self {
            EventName::InitData => "initData",
            EventName::UserData => "userData",
            EventName::Preferences => "preferences",
            EventName::ContentUpdate => "contentUpdate",
            EventName::Custom(name) => name.as_str(),
        }
    }
}

impl From<&str> for EventName {
    fn from(s: &str) -> Self {
        match s {
            "initData" => EventName::InitData,
            "userData" => EventName::UserData,
            "preferences" => EventName::Preferences,
            "contentUpdate" => EventName::ContentUpdate,
            other => EventName::Custom(SmolStr::new(other)),
        }
    }
}

impl std::fmt::Display for EventName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Data delivered to listeners.
#[derive(Debug, Clone, PartialEq)]
pub enum BridgeEvent {
    InitData(Snapshot),
    /// The snapshot whose user changed. Its JSON form is just the `user` member.
    UserData(Snapshot),
    Preferences(PreferenceUpdate),
    ContentUpdate(Value),
    Custom(Value),
}

impl BridgeEvent {
    /// JSON form of the event data, as a JavaScript listener would see it.
    pub fn to_json(&self) -> Value {
        match self {
            BridgeEvent::InitData(snapshot) => snapshot.raw().clone(),
            BridgeEvent::UserData(snapshot) => snapshot.user_json(),
            BridgeEvent::Preferences(update) => {
                serde_json::to_value(update).unwrap_or(Value::Null)
            }
            BridgeEvent::ContentUpdate(value) | BridgeEvent::Custom(value) => value.clone(),
        }
    }

    /// The user carried by a `userData` event, if any.
    pub fn user(&self) -> Option<&User> {
        match self {
            BridgeEvent::UserData(snapshot) => snapshot.user.as_ref(),
            _ => None,
        }
    }
}

pub type ListenerError = Box<dyn std::error::Error>;
pub type ListenerResult = Result<(), ListenerError>;

/// A subscribed callback. A returned error is logged and doesn't affect other listeners.
pub type Listener = Rc<dyn Fn(&BridgeEvent) -> ListenerResult>;

/// Wrap a closure as a [`Listener`].
pub fn listener<F>(f: F) -> Listener
where
    F: Fn(&BridgeEvent) -> ListenerResult + 'static,
{
    Rc::new(f)
}

type ListenerId = u64;

#[derive(Default)]
struct Slots {
    next_id: ListenerId,
    listeners: HashMap<EventName, HashMap<ListenerId, Listener>>,
}

/// Shared listener store. Clones refer to the same store.
#[derive(Clone, Default)]
pub struct CallbackRegistry {
    slots: Rc<RefCell<Slots>>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, event: EventName, callback: Listener) -> Subscription {
        tracing::debug!(%event, "registering listener");
        let mut slots = self.slots.borrow_mut();
        let id = slots.next_id;
        slots.next_id += 1;
        slots
            .listeners
            .entry(event.clone())
            .or_default()
            .insert(id, callback);

        Subscription {
            slots: Rc::downgrade(&self.slots),
            event,
            id,
        }
    }

    /// Call every listener for `event`. Returns how many were invoked.
    ///
    /// The listener set is snapshotted first, so listeners may subscribe or
    /// unsubscribe while being notified.
    pub fn notify(&self, event: &EventName, data: &BridgeEvent) -> usize {
        let listeners: Vec<Listener> = match self.slots.borrow().listeners.get(event) {
            Some(set) => set.values().cloned().collect(),
            None => return 0,
        };

        for callback in &listeners {
            invoke(event, callback, data);
        }
        listeners.len()
    }

    pub fn listener_count(&self, event: &EventName) -> usize {
        self.slots
            .borrow()
            .listeners
            .get(event)
            .map_or(0, HashMap::len)
    }

    /// Drop every listener. Outstanding subscriptions become no-ops.
    pub fn clear(&self) {
        self.slots.borrow_mut().listeners.clear();
    }
}

impl std::fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let slots = self.slots.borrow();
        let counts: HashMap<&str, usize> = slots
            .listeners
            .iter()
            .map(|(event, set)| (event.as_str(), set.len()))
            .collect();
        f.debug_struct("CallbackRegistry")
            .field("listeners", &counts)
            .finish()
    }
}

/// Run one listener, logging instead of propagating its failure.
pub(crate) fn invoke(event: &EventName, callback: &Listener, data: &BridgeEvent) {
    if let Err(e) = callback(data) {
        tracing::error!(%event, "error in listener: {e}");
    }
}

/// Capability to remove one listener.
///
/// Dropping a subscription does *not* unsubscribe; call [`Subscription::unsubscribe`].
#[derive(Debug, Clone)]
pub struct Subscription {
    slots: Weak<RefCell<Slots>>,
    event: EventName,
    id: ListenerId,
}

impl Subscription {
    /// A subscription not attached to any registry.
    pub fn detached(event: EventName) -> Self {
        Self {
            slots: Weak::new(),
            event,
            id: 0,
        }
    }

    pub fn event(&self) -> &EventName {
        &self.event
    }

    /// Remove the listener. Safe to call repeatedly.
    pub fn unsubscribe(&self) {
        let Some(slots) = self.slots.upgrade() else {
            return;
        };
        let mut slots = slots.borrow_mut();
        if let Some(set) = slots.listeners.get_mut(&self.event) {
            set.remove(&self.id);
            if set.is_empty() {
                slots.listeners.remove(&self.event);
            }
        }
    }

    pub fn is_active(&self) -> bool {
        let Some(slots) = self.slots.upgrade() else {
            return false;
        };
        let active = slots
            .borrow()
            .listeners
            .get(&self.event)
            .is_some_and(|set| set.contains_key(&self.id));
        active
    }
}

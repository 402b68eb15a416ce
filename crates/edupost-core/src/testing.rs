//! In-memory `ParentHost` for unit tests.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use std::time::Duration;

use serde_json::Value;

use crate::message::OutboundMessage;
use crate::origin::OriginAllowlist;
use crate::platform::{
    HostCallback, MessageHandler, PageLocation, ParentHost, PlatformError, ResizeCallback,
    TaskGuard,
};

type Id = u64;

/// Marks its id cancelled when dropped.
struct CancelOnDrop {
    id: Id,
    cancelled: Rc<RefCell<HashSet<Id>>>,
}

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.cancelled.borrow_mut().insert(self.id);
    }
}

#[derive(Default)]
pub struct FakeHost {
    embedded: bool,
    href: String,
    loaded: Cell<bool>,
    fail_posts: Cell<bool>,
    sent: RefCell<Vec<OutboundMessage>>,

    next_id: Cell<Id>,
    cancelled: Rc<RefCell<HashSet<Id>>>,
    now: Cell<Duration>,
    handlers: RefCell<Vec<(Id, OriginAllowlist, Rc<dyn Fn(&str, Value)>)>>,
    load_callbacks: RefCell<Vec<(Id, HostCallback)>>,
    timers: RefCell<Vec<(Id, Duration, HostCallback)>>,
    observers: RefCell<Vec<(Id, String, Rc<dyn Fn()>)>>,

    element_heights: RefCell<HashMap<String, u32>>,
    document_height: Cell<u32>,
}

impl FakeHost {
    pub fn embedded(href: &str) -> Self {
        Self {
            embedded: true,
            href: href.to_owned(),
            ..Self::default()
        }
    }

    pub fn top_level(href: &str) -> Self {
        Self {
            embedded: false,
            href: href.to_owned(),
            ..Self::default()
        }
    }

    fn guard(&self) -> (Id, TaskGuard) {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        let guard = TaskGuard::new(CancelOnDrop {
            id,
            cancelled: self.cancelled.clone(),
        });
        (id, guard)
    }

    fn is_cancelled(&self, id: Id) -> bool {
        self.cancelled.borrow().contains(&id)
    }

    pub fn sent(&self) -> Vec<OutboundMessage> {
        self.sent.borrow().clone()
    }

    pub fn sent_of(&self, kind: &str) -> Vec<OutboundMessage> {
        self.sent
            .borrow()
            .iter()
            .filter(|m| m.kind == kind)
            .cloned()
            .collect()
    }

    pub fn clear_sent(&self) {
        self.sent.borrow_mut().clear();
    }

    pub fn fail_posts(&self, fail: bool) {
        self.fail_posts.set(fail);
    }

    pub fn set_loaded(&self, loaded: bool) {
        self.loaded.set(loaded);
    }

    /// Mark the document loaded and run pending load callbacks.
    pub fn fire_load(&self) {
        self.loaded.set(true);
        let callbacks = std::mem::take(&mut *self.load_callbacks.borrow_mut());
        for (id, callback) in callbacks {
            if !self.is_cancelled(id) {
                callback();
            }
        }
    }

    /// Move the clock forward and run timers that came due.
    pub fn advance(&self, by: Duration) {
        let now = self.now.get() + by;
        self.now.set(now);
        let due: Vec<(Id, Duration, HostCallback)> = {
            let mut timers = self.timers.borrow_mut();
            let (due, pending) = std::mem::take(&mut *timers)
                .into_iter()
                .partition(|(_, at, _)| *at <= now);
            *timers = pending;
            due
        };
        for (id, _, callback) in due {
            if !self.is_cancelled(id) {
                callback();
            }
        }
    }

    pub fn pending_timers(&self) -> usize {
        self.timers
            .borrow()
            .iter()
            .filter(|(id, _, _)| !self.is_cancelled(*id))
            .count()
    }

    pub fn pending_load_callbacks(&self) -> usize {
        self.load_callbacks
            .borrow()
            .iter()
            .filter(|(id, _)| !self.is_cancelled(*id))
            .count()
    }

    /// Deliver a cross-document message to the live handlers that allow
    /// `origin`. Returns how many received it.
    pub fn deliver(&self, origin: &str, data: Value) -> usize {
        let handlers: Vec<_> = self
            .handlers
            .borrow()
            .iter()
            .filter(|(id, allowlist, _)| !self.is_cancelled(*id) && allowlist.contains(origin))
            .map(|(_, _, handler)| handler.clone())
            .collect();
        for handler in &handlers {
            handler(origin, data.clone());
        }
        handlers.len()
    }

    pub fn listening(&self) -> bool {
        self.handlers
            .borrow()
            .iter()
            .any(|(id, _, _)| !self.is_cancelled(*id))
    }

    pub fn set_element_height(&self, selector: &str, height: u32) {
        self.element_heights
            .borrow_mut()
            .insert(selector.to_owned(), height);
    }

    pub fn set_document_height(&self, height: u32) {
        self.document_height.set(height);
    }

    /// Fire the resize callbacks observing `selector`.
    pub fn trigger_resize(&self, selector: &str) {
        let callbacks: Vec<_> = self
            .observers
            .borrow()
            .iter()
            .filter(|(id, s, _)| s == selector && !self.is_cancelled(*id))
            .map(|(_, _, callback)| callback.clone())
            .collect();
        for callback in callbacks {
            callback();
        }
    }

    pub fn active_observers(&self) -> usize {
        self.observers
            .borrow()
            .iter()
            .filter(|(id, _, _)| !self.is_cancelled(*id))
            .count()
    }
}

impl ParentHost for FakeHost {
    fn is_embedded(&self) -> bool {
        self.embedded
    }

    fn location(&self) -> PageLocation {
        PageLocation::new(self.href.clone())
    }

    fn post_to_parent(&self, message: &OutboundMessage) -> Result<(), PlatformError> {
        if self.fail_posts.get() {
            return Err("parent window unavailable".into());
        }
        self.sent.borrow_mut().push(message.clone());
        Ok(())
    }

    fn listen_messages(
        &self,
        allowlist: &OriginAllowlist,
        handler: MessageHandler,
    ) -> Result<TaskGuard, PlatformError> {
        let (id, guard) = self.guard();
        self.handlers
            .borrow_mut()
            .push((id, allowlist.clone(), Rc::from(handler)));
        Ok(guard)
    }

    fn is_loaded(&self) -> bool {
        self.loaded.get()
    }

    fn on_load(&self, callback: HostCallback) -> TaskGuard {
        let (id, guard) = self.guard();
        self.load_callbacks.borrow_mut().push((id, callback));
        guard
    }

    fn set_timeout(&self, delay: Duration, callback: HostCallback) -> TaskGuard {
        let (id, guard) = self.guard();
        let at = self.now.get() + delay;
        self.timers.borrow_mut().push((id, at, callback));
        guard
    }

    fn observe_resize(&self, selector: &str, callback: ResizeCallback) -> Option<TaskGuard> {
        if !self.element_heights.borrow().contains_key(selector) {
            return None;
        }
        let (id, guard) = self.guard();
        self.observers
            .borrow_mut()
            .push((id, selector.to_owned(), Rc::from(callback)));
        Some(guard)
    }

    fn element_scroll_height(&self, selector: &str) -> Option<u32> {
        self.element_heights.borrow().get(selector).copied()
    }

    fn document_height(&self) -> u32 {
        self.document_height.get()
    }
}

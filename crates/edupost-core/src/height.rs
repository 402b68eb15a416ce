//! Content height reporting.
//!
//! The parent sizes the iframe from `RESIZE_IFRAME` messages. Once a content
//! container is observed its scroll height is reported on every resize; before
//! that, the whole document height is used so the parent always gets a value.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Duration;

use serde_json::json;

use crate::message::OutboundMessage;
use crate::platform::{ParentHost, TaskGuard, post_if_embedded};
use crate::registry::{BridgeEvent, CallbackRegistry, EventName};

/// Custom event fired locally after each height report, with `{ height }`.
pub const CONTENT_HEIGHT_EVENT: &str = "contentHeight";

#[derive(Debug, Default)]
struct Observation {
    selector: Option<String>,
    observer: Option<TaskGuard>,
    initial_check: Option<TaskGuard>,
    load: Option<TaskGuard>,
}

struct ReporterInner<H: ParentHost> {
    host: Weak<H>,
    registry: CallbackRegistry,
    check_delay: Duration,
    observation: RefCell<Observation>,
}

/// Reports content height to the parent.
pub struct HeightReporter<H: ParentHost> {
    inner: Rc<ReporterInner<H>>,
}

impl<H: ParentHost> Clone for HeightReporter<H> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<H: ParentHost> HeightReporter<H> {
    pub fn new(host: &Rc<H>, registry: CallbackRegistry, check_delay: Duration) -> Self {
        Self {
            inner: Rc::new(ReporterInner {
                host: Rc::downgrade(host),
                registry,
                check_delay,
                observation: RefCell::new(Observation::default()),
            }),
        }
    }

    /// Start watching the element matching `selector`.
    ///
    /// Replaces any previous observation. A height check is scheduled after the
    /// configured delay, and another on document load if it hasn't happened yet.
    pub fn observe(&self, selector: &str) {
        let Some(host) = self.inner.host.upgrade() else {
            return;
        };
        self.teardown();

        let weak = Rc::downgrade(&self.inner);
        let observer = host.observe_resize(
            selector,
            Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.report();
                }
            }),
        );
        if observer.is_none() {
            tracing::debug!(selector, "no element to observe, reporting document height");
        }

        let weak = Rc::downgrade(&self.inner);
        let initial_check = host.set_timeout(
            self.inner.check_delay,
            Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.report();
                }
            }),
        );

        let load = (!host.is_loaded()).then(|| {
            let weak = Rc::downgrade(&self.inner);
            host.on_load(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.report();
                }
            }))
        });

        let mut observation = self.inner.observation.borrow_mut();
        observation.selector = observer.is_some().then(|| selector.to_owned());
        observation.observer = observer;
        observation.initial_check = Some(initial_check);
        observation.load = load;
    }

    /// Send one `RESIZE_IFRAME` with the current height.
    pub fn report(&self) -> Option<u32> {
        self.inner.report()
    }

    pub fn current_height(&self) -> u32 {
        self.inner.current_height()
    }

    pub fn observed_selector(&self) -> Option<String> {
        self.inner.observation.borrow().selector.clone()
    }

    /// Detach the observer and cancel pending checks. Safe to call repeatedly.
    pub fn teardown(&self) {
        let previous = std::mem::take(&mut *self.inner.observation.borrow_mut());
        drop(previous);
    }
}

impl<H: ParentHost> ReporterInner<H> {
    fn current_height(&self) -> u32 {
        let Some(host) = self.host.upgrade() else {
            return 0;
        };
        let selector = self.observation.borrow().selector.clone();
        selector
            .and_then(|selector| host.element_scroll_height(&selector))
            .unwrap_or_else(|| host.document_height())
    }

    /// Returns the height sent, or `None` if nothing went out.
    fn report(&self) -> Option<u32> {
        let host = self.host.upgrade()?;
        let height = self.current_height();
        if !post_if_embedded(host.as_ref(), &OutboundMessage::resize(height)) {
            return None;
        }
        tracing::trace!(height, "reported content height");
        self.registry.notify(
            &EventName::Custom(CONTENT_HEIGHT_EVENT.into()),
            &BridgeEvent::Custom(json!({ "height": height })),
        );
        Some(height)
    }
}

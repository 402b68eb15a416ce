//! The parent bridge.
//!
//! [`ParentBridge`] wires the pieces together over a [`ParentHost`]: it listens
//! for cross-document messages, keeps the latest user snapshot, dispatches to
//! subscribers, runs the readiness handshake and owns the height reporter.
//!
//! Consumers normally hold an `Rc<dyn Bridge>` so they work the same whether
//! they got a live bridge or the [`NullBridge`] handed out when there is no
//! browser window.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use serde_json::Value;

use crate::config::BridgeConfig;
use crate::handshake::{Handshake, ReadyMessage};
use crate::height::HeightReporter;
use crate::message::{InboundMessage, OutboundMessage, Snapshot, accept};
use crate::platform::{ParentHost, TaskGuard, post_if_embedded};
use crate::registry::{
    BridgeEvent, CallbackRegistry, EventName, Listener, ListenerResult, Subscription, invoke,
};

/// What the editor and viewer need from the parent integration.
pub trait Bridge {
    /// Subscribe to an event. Subscribing to `userData` replays the cached
    /// user immediately when a snapshot exists.
    fn on(&self, event: EventName, callback: Listener) -> Subscription;

    /// Post `{ type, payload }` to the parent. No-op outside an iframe.
    fn send_to_parent(&self, kind: &str, payload: Value);

    /// The latest `INIT_DATA`/`USER_DATA` snapshot. It serializes to exactly
    /// the payload that carried it.
    fn user_data(&self) -> Option<Snapshot>;

    /// Whether a ready message has been sent. A liveness hint, not an acknowledgement.
    fn is_connected(&self) -> bool;

    /// Report the height of the element matching `selector` from now on.
    fn observe_height(&self, selector: &str);

    /// Send one height report right away.
    fn report_height(&self);

    /// Stop listening, cancel pending work and drop all subscriptions.
    fn cleanup(&self);
}

impl dyn Bridge {
    /// [`Bridge::on`] taking a plain closure.
    pub fn subscribe<F>(&self, event: EventName, f: F) -> Subscription
    where
        F: Fn(&BridgeEvent) -> ListenerResult + 'static,
    {
        self.on(event, Rc::new(f))
    }
}

struct BridgeInner<H: ParentHost> {
    host: Rc<H>,
    config: BridgeConfig,
    registry: CallbackRegistry,
    user_data: RefCell<Option<Snapshot>>,
    ready: Rc<Cell<bool>>,
    height: HeightReporter<H>,
    listener: RefCell<Option<TaskGuard>>,
    handshake: RefCell<Option<Handshake>>,
}

/// Live bridge over a platform host.
pub struct ParentBridge<H: ParentHost> {
    inner: Rc<BridgeInner<H>>,
}

impl<H: ParentHost> Clone for ParentBridge<H> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<H: ParentHost> ParentBridge<H> {
    /// Attach to `host`: start listening for messages and, when embedded, begin
    /// the readiness handshake.
    pub fn new(host: H, config: BridgeConfig) -> Self {
        let host = Rc::new(host);
        let registry = CallbackRegistry::new();
        let height = HeightReporter::new(&host, registry.clone(), config.height_check_delay);

        let bridge = Self {
            inner: Rc::new(BridgeInner {
                host,
                config,
                registry,
                user_data: RefCell::new(None),
                ready: Rc::new(Cell::new(false)),
                height,
                listener: RefCell::new(None),
                handshake: RefCell::new(None),
            }),
        };
        bridge.attach();
        bridge
    }

    fn attach(&self) {
        let inner = &self.inner;
        let weak: Weak<BridgeInner<H>> = Rc::downgrade(inner);
        let handler = Box::new(move |origin: &str, data: Value| {
            if let Some(inner) = weak.upgrade() {
                inner.handle_message(origin, &data);
            }
        });
        match inner.host.listen_messages(&inner.config.allowlist, handler) {
            Ok(guard) => *inner.listener.borrow_mut() = Some(guard),
            Err(e) => tracing::warn!("could not listen for parent messages: {e}"),
        }

        let ready = ReadyMessage::for_location(
            &inner.host.location(),
            &inner.config.viewer_path_marker,
        );
        let handshake =
            Handshake::start(&inner.host, &ready, inner.config.resend, inner.ready.clone());
        *inner.handshake.borrow_mut() = Some(handshake);
    }

    /// Process one raw message as if it had arrived from `origin`.
    pub fn handle_message(&self, origin: &str, data: &Value) {
        self.inner.handle_message(origin, data);
    }

    pub fn host(&self) -> &H {
        &self.inner.host
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.inner.config
    }

    pub fn registry(&self) -> &CallbackRegistry {
        &self.inner.registry
    }

    pub fn height_reporter(&self) -> &HeightReporter<H> {
        &self.inner.height
    }

    /// Ready message sent by the handshake.
    pub fn ready_message(&self) -> Option<OutboundMessage> {
        self.inner
            .handshake
            .borrow()
            .as_ref()
            .map(|handshake| handshake.message().clone())
    }

    /// Erase the host type.
    pub fn into_dyn(self) -> Rc<dyn Bridge> {
        Rc::new(self)
    }
}

impl<H: ParentHost> BridgeInner<H> {
    fn handle_message(&self, origin: &str, data: &Value) {
        let Some(message) = accept(&self.config.allowlist, origin, data) else {
            return;
        };

        match message {
            InboundMessage::InitData(snapshot) => {
                *self.user_data.borrow_mut() = Some(snapshot.clone());
                self.registry.notify(
                    &EventName::InitData,
                    &BridgeEvent::InitData(snapshot.clone()),
                );
                self.registry
                    .notify(&EventName::UserData, &BridgeEvent::UserData(snapshot));
            }
            InboundMessage::UserData(snapshot) => {
                *self.user_data.borrow_mut() = Some(snapshot.clone());
                self.registry
                    .notify(&EventName::UserData, &BridgeEvent::UserData(snapshot));
            }
            InboundMessage::PreferenceUpdate(update) => {
                self.registry
                    .notify(&EventName::Preferences, &BridgeEvent::Preferences(update));
            }
            InboundMessage::ContentUpdate(payload) => {
                self.registry.notify(
                    &EventName::ContentUpdate,
                    &BridgeEvent::ContentUpdate(payload),
                );
            }
            InboundMessage::RequestContentHeight => {
                self.height.report();
            }
        }
    }
}

impl<H: ParentHost> Bridge for ParentBridge<H> {
    fn on(&self, event: EventName, callback: Listener) -> Subscription {
        let replay = event == EventName::UserData;
        let subscription = self.inner.registry.subscribe(event.clone(), callback.clone());

        if replay {
            let cached = self.inner.user_data.borrow().clone();
            if let Some(snapshot) = cached {
                invoke(&event, &callback, &BridgeEvent::UserData(snapshot));
            }
        }
        subscription
    }

    fn send_to_parent(&self, kind: &str, payload: Value) {
        post_if_embedded(self.inner.host.as_ref(), &OutboundMessage::new(kind, payload));
    }

    fn user_data(&self) -> Option<Snapshot> {
        self.inner.user_data.borrow().clone()
    }

    fn is_connected(&self) -> bool {
        self.inner.ready.get()
    }

    fn observe_height(&self, selector: &str) {
        self.inner.height.observe(selector);
    }

    fn report_height(&self) {
        self.inner.height.report();
    }

    fn cleanup(&self) {
        tracing::debug!("tearing down parent bridge");
        self.inner.listener.borrow_mut().take();
        if let Some(handshake) = self.inner.handshake.borrow_mut().as_mut() {
            handshake.cancel();
        }
        self.inner.height.teardown();
        self.inner.registry.clear();
    }
}

/// Bridge used where no browser window exists. Every operation is a no-op.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullBridge;

impl Bridge for NullBridge {
    fn on(&self, event: EventName, _callback: Listener) -> Subscription {
        Subscription::detached(event)
    }

    fn send_to_parent(&self, _kind: &str, _payload: Value) {}

    fn user_data(&self) -> Option<Snapshot> {
        None
    }

    fn is_connected(&self) -> bool {
        false
    }

    fn observe_height(&self, _selector: &str) {}

    fn report_height(&self) {}

    fn cleanup(&self) {}
}

/// A live bridge over `host` when there is one, otherwise a [`NullBridge`].
pub fn connect<H: ParentHost>(host: Option<H>, config: BridgeConfig) -> Rc<dyn Bridge> {
    match host {
        Some(host) => ParentBridge::new(host, config).into_dyn(),
        None => {
            tracing::debug!("no browser window, using null bridge");
            Rc::new(NullBridge)
        }
    }
}

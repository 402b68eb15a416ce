//! Readiness handshake.
//!
//! The parent may attach its `message` listener after the iframe has already
//! started, so the ready signal is sent redundantly: once immediately, once on
//! document load, and once after a fixed delay. The parent ignores duplicates.
//! The number of attempts is bounded; nothing here retries indefinitely.

use std::cell::Cell;
use std::rc::{Rc, Weak};
use std::time::Duration;

use serde::Serialize;

use crate::message::{OutboundKind, OutboundMessage};
use crate::platform::{PageLocation, ParentHost, TaskGuard, post_if_embedded};

/// Which surface the embed is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyKind {
    Editor,
    Viewer,
}

impl ReadyKind {
    pub fn outbound_kind(&self) -> OutboundKind {
        match self {
            ReadyKind::Editor => OutboundKind::EditorReady,
            ReadyKind::Viewer => OutboundKind::ViewerReady,
        }
    }
}

/// Payload of `EDITOR_READY` / `VIEWER_READY`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReadyMessage {
    #[serde(skip)]
    pub kind: ReadyKind,
    pub url: String,
    pub mode: String,
}

impl ReadyMessage {
    /// Work out the ready message for the page at `location`.
    ///
    /// Paths containing `viewer_marker` are the viewer and always report mode
    /// `view`. Otherwise the `mode` query parameter is used, defaulting to `new`.
    pub fn for_location(location: &PageLocation, viewer_marker: &str) -> Self {
        let is_viewer = location.pathname().contains(viewer_marker);
        let (kind, mode) = if is_viewer {
            (ReadyKind::Viewer, "view".to_owned())
        } else {
            let mode = location
                .query_param("mode")
                .filter(|mode| !mode.is_empty())
                .unwrap_or_else(|| "new".to_owned());
            (ReadyKind::Editor, mode)
        };
        Self {
            kind,
            url: location.href().to_owned(),
            mode,
        }
    }

    pub fn to_outbound(&self) -> OutboundMessage {
        let payload = serde_json::to_value(self).unwrap_or_default();
        OutboundMessage::new(self.kind.outbound_kind().as_str(), payload)
    }
}

/// When to send the ready message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResendPolicy {
    /// Send at construction.
    pub immediate: bool,
    /// Send on document load, or right away if already loaded.
    pub on_load: bool,
    /// Send once more after this delay.
    pub delayed: Option<Duration>,
}

impl ResendPolicy {
    /// Total number of sends this policy performs.
    pub fn attempts(&self) -> usize {
        usize::from(self.immediate) + usize::from(self.on_load) + usize::from(self.delayed.is_some())
    }
}

impl Default for ResendPolicy {
    fn default() -> Self {
        Self {
            immediate: true,
            on_load: true,
            delayed: Some(Duration::from_millis(1000)),
        }
    }
}

/// A running handshake. Dropping it (or calling [`Handshake::cancel`]) cancels
/// any sends still pending.
#[derive(Debug)]
pub struct Handshake {
    message: OutboundMessage,
    guards: Vec<TaskGuard>,
}

impl Handshake {
    /// Start the handshake. Does nothing outside an iframe.
    ///
    /// `ready` is set after every successful send.
    pub fn start<H: ParentHost>(
        host: &Rc<H>,
        message: &ReadyMessage,
        policy: ResendPolicy,
        ready: Rc<Cell<bool>>,
    ) -> Self {
        let outbound = message.to_outbound();
        let mut handshake = Self {
            message: outbound,
            guards: Vec::new(),
        };
        if !host.is_embedded() {
            tracing::debug!("not embedded, skipping ready handshake");
            return handshake;
        }

        tracing::info!(
            kind = %handshake.message.kind,
            mode = %message.mode,
            attempts = policy.attempts(),
            "sending ready message to parent"
        );

        if policy.immediate {
            send(host.as_ref(), &handshake.message, &ready);
        }

        if policy.on_load {
            if host.is_loaded() {
                send(host.as_ref(), &handshake.message, &ready);
            } else {
                let callback = resend_callback(Rc::downgrade(host), &handshake.message, &ready);
                handshake.guards.push(host.on_load(callback));
            }
        }

        if let Some(delay) = policy.delayed {
            let callback = resend_callback(Rc::downgrade(host), &handshake.message, &ready);
            handshake.guards.push(host.set_timeout(delay, callback));
        }

        handshake
    }

    pub fn message(&self) -> &OutboundMessage {
        &self.message
    }

    /// Cancel pending resends.
    pub fn cancel(&mut self) {
        self.guards.clear();
    }
}

fn send<H: ParentHost>(host: &H, message: &OutboundMessage, ready: &Cell<bool>) {
    if post_if_embedded(host, message) {
        ready.set(true);
    }
}

fn resend_callback<H: ParentHost>(
    host: Weak<H>,
    message: &OutboundMessage,
    ready: &Rc<Cell<bool>>,
) -> Box<dyn FnOnce()> {
    let message = message.clone();
    let ready = ready.clone();
    Box::new(move || {
        if let Some(host) = host.upgrade() {
            send(host.as_ref(), &message, &ready);
        }
    })
}

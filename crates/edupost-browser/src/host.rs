//! `ParentHost` over the real browser window.

use std::time::Duration;

use edupost_core::{
    HostCallback, MessageHandler, OriginAllowlist, OutboundMessage, PageLocation, ParentHost,
    PlatformError, ResizeCallback, TaskGuard,
};
use gloo_events::EventListener;
use gloo_timers::callback::Timeout;
use serde::Serialize;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Element, HtmlElement, MessageEvent, ResizeObserver, Window};

/// Any origin may receive what we post; the parent filters on its side.
const TARGET_ORIGIN: &str = "*";

fn js_error(e: JsValue) -> PlatformError {
    PlatformError(e.as_string().unwrap_or_else(|| format!("{e:?}")))
}

/// The current window, seen as the embed side of the bridge.
pub struct BrowserHost {
    window: Window,
}

impl BrowserHost {
    /// `None` outside a browser (no `window`).
    pub fn new() -> Option<Self> {
        web_sys::window().map(|window| Self { window })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    fn parent(&self) -> Option<Window> {
        self.window.parent().ok().flatten()
    }

    fn query(&self, selector: &str) -> Option<Element> {
        let document = self.window.document()?;
        match document.query_selector(selector) {
            Ok(element) => element,
            Err(e) => {
                tracing::debug!(selector, "invalid selector: {:?}", e);
                None
            }
        }
    }
}

/// Disconnects the observer when dropped.
struct ObserverGuard {
    observer: ResizeObserver,
    _callback: Closure<dyn FnMut()>,
}

impl Drop for ObserverGuard {
    fn drop(&mut self) {
        self.observer.disconnect();
    }
}

impl ParentHost for BrowserHost {
    fn is_embedded(&self) -> bool {
        self.parent()
            .is_some_and(|parent| !js_sys::Object::is(&parent, &self.window))
    }

    fn location(&self) -> PageLocation {
        let href = self.window.location().href().unwrap_or_default();
        PageLocation::new(href)
    }

    fn post_to_parent(&self, message: &OutboundMessage) -> Result<(), PlatformError> {
        let parent = self.parent().ok_or("no parent window")?;
        let value = message
            .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
            .map_err(|e| PlatformError(e.to_string()))?;
        parent
            .post_message(&value, TARGET_ORIGIN)
            .map_err(js_error)
    }

    fn listen_messages(
        &self,
        allowlist: &OriginAllowlist,
        handler: MessageHandler,
    ) -> Result<TaskGuard, PlatformError> {
        let allowlist = allowlist.clone();
        let listener = EventListener::new(&self.window, "message", move |event| {
            let Some(event) = event.dyn_ref::<MessageEvent>() else {
                return;
            };
            let origin = event.origin();
            // untrusted data is never read
            if !allowlist.contains(&origin) {
                tracing::warn!(origin, "origin not allowed, ignoring message");
                return;
            }
            match serde_wasm_bindgen::from_value::<serde_json::Value>(event.data()) {
                Ok(data) => handler(&origin, data),
                Err(e) => tracing::debug!(origin, "message data is not JSON: {e}"),
            }
        });
        Ok(TaskGuard::new(listener))
    }

    fn is_loaded(&self) -> bool {
        self.window
            .document()
            .is_some_and(|document| document.ready_state() == "complete")
    }

    fn on_load(&self, callback: HostCallback) -> TaskGuard {
        TaskGuard::new(EventListener::once(&self.window, "load", move |_| callback()))
    }

    fn set_timeout(&self, delay: Duration, callback: HostCallback) -> TaskGuard {
        let millis = u32::try_from(delay.as_millis()).unwrap_or(u32::MAX);
        TaskGuard::new(Timeout::new(millis, callback))
    }

    fn observe_resize(&self, selector: &str, callback: ResizeCallback) -> Option<TaskGuard> {
        let element = self.query(selector)?;
        let closure = Closure::<dyn FnMut()>::new(move || callback());
        let observer = match ResizeObserver::new(closure.as_ref().unchecked_ref()) {
            Ok(observer) => observer,
            Err(e) => {
                tracing::warn!("ResizeObserver unavailable: {:?}", e);
                return None;
            }
        };
        observer.observe(&element);
        Some(TaskGuard::new(ObserverGuard {
            observer,
            _callback: closure,
        }))
    }

    fn element_scroll_height(&self, selector: &str) -> Option<u32> {
        let element = self.query(selector)?;
        Some(element.scroll_height().max(0) as u32)
    }

    fn document_height(&self) -> u32 {
        let Some(document) = self.window.document() else {
            return 0;
        };
        let body = document.body();
        let html = document
            .document_element()
            .and_then(|element| element.dyn_into::<HtmlElement>().ok());

        [
            body.as_ref().map(|b| b.scroll_height()),
            body.as_ref().map(|b| b.offset_height()),
            html.as_ref().map(|h| h.scroll_height()),
            html.as_ref().map(|h| h.offset_height()),
        ]
        .into_iter()
        .flatten()
        .max()
        .unwrap_or(0)
        .max(0) as u32
    }
}

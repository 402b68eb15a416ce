//! JsParentBridge - the page's parent bridge for JavaScript.

use std::rc::Rc;

use edupost_browser::{Bridge, EventName, Subscription, parent_bridge};
use wasm_bindgen::prelude::*;

use crate::types::to_js;

/// Handle on the page's bridge. Every instance shares the same bridge.
#[wasm_bindgen]
pub struct JsParentBridge {
    inner: Rc<dyn Bridge>,
}

#[wasm_bindgen]
impl JsParentBridge {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            inner: parent_bridge(),
        }
    }

    /// Subscribe `callback` to `event` (`initData`, `userData`, `preferences`,
    /// `contentUpdate` or a custom name such as `contentHeight`).
    #[wasm_bindgen]
    pub fn on(&self, event: &str, callback: js_sys::Function) -> JsSubscription {
        let subscription = self.inner.subscribe(EventName::from(event), move |data| {
            let value = to_js(&data.to_json()).map_err(|e| format!("{e:?}"))?;
            callback
                .call1(&JsValue::NULL, &value)
                .map_err(|e| format!("listener threw: {e:?}"))?;
            Ok(())
        });
        JsSubscription {
            inner: subscription,
        }
    }

    #[wasm_bindgen(js_name = sendToParent)]
    pub fn send_to_parent(&self, kind: &str, payload: JsValue) -> Result<(), JsError> {
        let payload: serde_json::Value = serde_wasm_bindgen::from_value(payload)
            .map_err(|e| JsError::new(&format!("Invalid payload: {}", e)))?;
        self.inner.send_to_parent(kind, payload);
        Ok(())
    }

    /// The latest snapshot from the parent, or `null`.
    #[wasm_bindgen(js_name = getUserData)]
    pub fn user_data(&self) -> Result<JsValue, JsError> {
        to_js(&self.inner.user_data())
            .map_err(|e| JsError::new(&format!("Serialization error: {:?}", e)))
    }

    #[wasm_bindgen(js_name = isConnected)]
    pub fn is_connected(&self) -> bool {
        self.inner.is_connected()
    }

    #[wasm_bindgen(js_name = observeHeight)]
    pub fn observe_height(&self, selector: &str) {
        self.inner.observe_height(selector);
    }

    #[wasm_bindgen(js_name = reportHeight)]
    pub fn report_height(&self) {
        self.inner.report_height();
    }

    #[wasm_bindgen]
    pub fn cleanup(&self) {
        self.inner.cleanup();
    }
}

impl Default for JsParentBridge {
    fn default() -> Self {
        Self::new()
    }
}

/// Returned by `JsParentBridge.on`.
#[wasm_bindgen]
pub struct JsSubscription {
    inner: Subscription,
}

#[wasm_bindgen]
impl JsSubscription {
    #[wasm_bindgen(getter)]
    pub fn event(&self) -> String {
        self.inner.event().to_string()
    }

    #[wasm_bindgen(js_name = isActive)]
    pub fn is_active(&self) -> bool {
        self.inner.is_active()
    }

    /// Stop receiving events. Calling it again does nothing.
    #[wasm_bindgen]
    pub fn unsubscribe(&self) {
        self.inner.unsubscribe();
    }
}

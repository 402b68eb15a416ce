//! WASM browser tests for edupost-browser.
//!
//! Run with: `wasm-pack test --headless --firefox` or `--chrome`

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use edupost_browser::{
    Bridge, BridgeConfig, BrowserHost, ClientConfig, EventName, LocalStorageTokenStore,
    OriginAllowlist, OutboundMessage, ParentBridge, ParentHost, TokenStore, parent_bridge,
    post_client,
};
use gloo_timers::future::TimeoutFuture;
use gloo_utils::format::JsValueSerdeExt;
use serde_json::json;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_test::*;
use web_sys::{HtmlElement, MessageEvent, MessageEventInit};

wasm_bindgen_test_configure!(run_in_browser);

const PARENT: &str = "http://localhost:5173";

fn host() -> BrowserHost {
    BrowserHost::new().expect("test runs in a browser window")
}

fn dispatch(origin: &str, data: serde_json::Value) {
    dispatch_raw(origin, &JsValue::from_serde(&data).unwrap());
}

fn dispatch_raw(origin: &str, data: &JsValue) {
    let init = MessageEventInit::new();
    init.set_origin(origin);
    init.set_data(data);
    let event = MessageEvent::new_with_event_init_dict("message", &init).unwrap();
    host().window().dispatch_event(&event).unwrap();
}

/// An object that refers to itself, which `JSON.stringify` rejects.
fn cyclic_object() -> JsValue {
    let object = js_sys::Object::new();
    js_sys::Reflect::set(&object, &"self".into(), &object).unwrap();
    object.into()
}

fn add_block(id: &str, height_px: u32) -> HtmlElement {
    let document = host().window().document().unwrap();
    let element: HtmlElement = document.create_element("div").unwrap().unchecked_into();
    element.set_id(id);
    element
        .style()
        .set_property("height", &format!("{height_px}px"))
        .unwrap();
    document.body().unwrap().append_child(&element).unwrap();
    element
}

// === Host ===

#[wasm_bindgen_test]
fn test_test_page_is_top_level() {
    let host = host();
    assert!(!host.is_embedded());
    assert!(host.location().href().starts_with("http"));
}

#[wasm_bindgen_test]
fn test_post_without_parent_frame() {
    // window.parent is the window itself here, so posting just targets us
    let result = host().post_to_parent(&OutboundMessage::resize(10));
    assert!(result.is_ok());
}

#[wasm_bindgen_test]
fn test_element_scroll_height() {
    let element = add_block("edupost-height-block", 321);
    let host = host();
    assert_eq!(host.element_scroll_height("#edupost-height-block"), Some(321));
    assert_eq!(host.element_scroll_height("#edupost-missing"), None);
    assert_eq!(host.element_scroll_height("::not a selector"), None);
    assert!(host.document_height() >= 321);
    element.remove();
}

#[wasm_bindgen_test]
fn test_observe_missing_element() {
    assert!(host().observe_resize("#edupost-nothing", Box::new(|| {})).is_none());
}

#[wasm_bindgen_test]
async fn test_resize_observer_fires() {
    let element = add_block("edupost-resize-block", 100);
    let fired = Rc::new(Cell::new(0));
    let sink = fired.clone();
    let host = host();
    let guard = host.observe_resize(
        "#edupost-resize-block",
        Box::new(move || sink.set(sink.get() + 1)),
    );
    assert!(guard.is_some());

    // observers report the initial size once observation starts
    TimeoutFuture::new(50).await;
    assert!(fired.get() >= 1);

    drop(guard);
    let before = fired.get();
    element.style().set_property("height", "200px").unwrap();
    TimeoutFuture::new(50).await;
    assert_eq!(fired.get(), before);
    element.remove();
}

#[wasm_bindgen_test]
async fn test_timeout_guard_cancels() {
    let host = host();
    let fired = Rc::new(Cell::new(false));

    let sink = fired.clone();
    let guard = host.set_timeout(Duration::from_millis(10), Box::new(move || sink.set(true)));
    drop(guard);
    TimeoutFuture::new(30).await;
    assert!(!fired.get());

    let sink = fired.clone();
    let _guard = host.set_timeout(Duration::from_millis(10), Box::new(move || sink.set(true)));
    TimeoutFuture::new(30).await;
    assert!(fired.get());
}

#[wasm_bindgen_test]
fn test_host_filters_origin_before_reading_data() {
    let host = host();
    let received = Rc::new(RefCell::new(Vec::new()));
    let sink = received.clone();
    let _guard = host
        .listen_messages(
            &OriginAllowlist::default(),
            Box::new(move |origin, data| sink.borrow_mut().push((origin.to_owned(), data))),
        )
        .unwrap();

    dispatch_raw("https://evil.example", &cyclic_object());
    assert!(received.borrow().is_empty());

    // not representable as JSON, dropped without tearing down the listener
    dispatch_raw(PARENT, &js_sys::Symbol::for_("edupost").into());
    assert!(received.borrow().is_empty());

    dispatch(PARENT, json!({ "type": "REQUEST_CONTENT_HEIGHT" }));
    let received = received.borrow();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].0, PARENT);
    assert_eq!(received[0].1, json!({ "type": "REQUEST_CONTENT_HEIGHT" }));
}

// === Bridge over the real window ===

#[wasm_bindgen_test]
fn test_allowed_message_reaches_bridge() {
    let bridge = ParentBridge::new(host(), BridgeConfig::default());
    let users = Rc::new(RefCell::new(Vec::new()));
    let sink = users.clone();
    bridge.registry().subscribe(
        EventName::UserData,
        edupost_browser::listener(move |event| {
            sink.borrow_mut().push(event.to_json());
            Ok(())
        }),
    );

    dispatch(
        PARENT,
        json!({ "type": "INIT_DATA", "payload": { "user": { "name": "A" }, "token": "t1" } }),
    );
    assert_eq!(*users.borrow(), vec![json!({ "name": "A" })]);

    assert_eq!(bridge.user_data().unwrap().token.as_deref(), Some("t1"));
    bridge.cleanup();
}

#[wasm_bindgen_test]
fn test_null_fields_survive_the_window() {
    let bridge = ParentBridge::new(host(), BridgeConfig::default());
    let payload = json!({ "user": { "name": "A", "email": null }, "token": null, "post": null });
    dispatch(PARENT, json!({ "type": "INIT_DATA", "payload": payload.clone() }));
    assert_eq!(serde_json::to_value(bridge.user_data().unwrap()).unwrap(), payload);
    bridge.cleanup();
}

#[wasm_bindgen_test]
fn test_untrusted_message_is_ignored() {
    let bridge = ParentBridge::new(host(), BridgeConfig::default());
    dispatch(
        "https://evil.example",
        json!({ "type": "INIT_DATA", "payload": { "user": {}, "token": "stolen" } }),
    );
    dispatch_raw("https://evil.example", &cyclic_object());
    assert!(bridge.user_data().is_none());

    // the listener survived the hostile data
    dispatch(
        PARENT,
        json!({ "type": "INIT_DATA", "payload": { "user": {}, "token": "t1" } }),
    );
    assert_eq!(bridge.user_data().unwrap().token.as_deref(), Some("t1"));
    bridge.cleanup();
}

#[wasm_bindgen_test]
fn test_cleanup_stops_listening() {
    let bridge = ParentBridge::new(host(), BridgeConfig::default());
    bridge.cleanup();
    dispatch(
        PARENT,
        json!({ "type": "INIT_DATA", "payload": { "user": {}, "token": "late" } }),
    );
    assert!(bridge.user_data().is_none());
}

#[wasm_bindgen_test]
fn test_top_level_bridge_never_connects() {
    let bridge = parent_bridge();
    assert!(!bridge.is_connected());
    assert!(Rc::ptr_eq(&bridge, &parent_bridge()));
}

// === Post client ===

#[wasm_bindgen_test]
async fn test_credentialed_fetch_failure_maps_to_500() {
    // nothing listens on the discard port; fetch rejects and the error is mapped
    let client = post_client(ClientConfig::with_api_url("http://127.0.0.1:9"));
    let err = client.load_post_by_slug("missing").await.unwrap_err();
    assert_eq!(err.status(), 500);
    assert_eq!(err.body().status, 500);
}

// === Storage ===

#[wasm_bindgen_test]
fn test_local_storage_token() {
    let storage = host().window().local_storage().unwrap().unwrap();
    let store = LocalStorageTokenStore::new("edupost_test_token");

    storage.remove_item(store.key()).unwrap();
    assert_eq!(store.load_token(), None);

    storage.set_item(store.key(), "stored-token").unwrap();
    assert_eq!(store.load_token().as_deref(), Some("stored-token"));
    storage.remove_item(store.key()).unwrap();
}

//! The page's one bridge.

use std::cell::OnceCell;
use std::rc::Rc;

use edupost_core::{Bridge, BridgeConfig, ClientConfig, PostClient, connect};

use crate::host::BrowserHost;
use crate::storage::LocalStorageTokenStore;

thread_local! {
    static BRIDGE: OnceCell<Rc<dyn Bridge>> = const { OnceCell::new() };
}

/// The bridge for this page, created with the default config on first use.
///
/// Without a browser window this is a [`edupost_core::NullBridge`].
pub fn parent_bridge() -> Rc<dyn Bridge> {
    parent_bridge_with(BridgeConfig::default)
}

/// Like [`parent_bridge`], using `config` if the bridge doesn't exist yet.
pub fn parent_bridge_with(config: impl FnOnce() -> BridgeConfig) -> Rc<dyn Bridge> {
    BRIDGE.with(|cell| {
        cell.get_or_init(|| connect(BrowserHost::new(), config()))
            .clone()
    })
}

/// A post client on the page's bridge, with the `localStorage` token fallback.
pub fn post_client(config: ClientConfig) -> PostClient {
    let store = LocalStorageTokenStore::for_config(&config);
    PostClient::new(parent_bridge(), config).with_token_store(store)
}

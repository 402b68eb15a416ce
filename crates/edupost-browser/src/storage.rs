//! Bearer token fallback from `localStorage`.

use edupost_core::{ClientConfig, TokenStore};

/// Reads the token the parent app left in `localStorage`.
///
/// Storage can be blocked for third-party iframes, in which case there is
/// simply no token.
#[derive(Debug, Clone)]
pub struct LocalStorageTokenStore {
    key: String,
}

impl LocalStorageTokenStore {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    pub fn for_config(config: &ClientConfig) -> Self {
        Self::new(config.token_storage_key.clone())
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl TokenStore for LocalStorageTokenStore {
    fn load_token(&self) -> Option<String> {
        let storage = match web_sys::window()?.local_storage() {
            Ok(storage) => storage?,
            Err(e) => {
                tracing::debug!("localStorage unavailable: {:?}", e);
                return None;
            }
        };
        storage
            .get_item(&self.key)
            .ok()
            .flatten()
            .filter(|token| !token.is_empty())
    }
}

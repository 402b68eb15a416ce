//! Bridge and client configuration.

use std::time::Duration;

use crate::handshake::ResendPolicy;
use crate::origin::OriginAllowlist;

/// Default REST base URL when `EDUPOST_API_URL` isn't set at compile time.
pub const DEFAULT_API_URL: &str = "https://api.ieduguide.com/api";

/// `localStorage` key holding a fallback bearer token.
pub const DEFAULT_TOKEN_STORAGE_KEY: &str = "auth_token";

#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Origins allowed to send messages to the embed.
    pub allowlist: OriginAllowlist,
    /// Path fragment marking the read-only viewer route.
    pub viewer_path_marker: String,
    /// When the ready message is (re)sent.
    pub resend: ResendPolicy,
    /// Delay before the first height report after `observe`.
    pub height_check_delay: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            allowlist: OriginAllowlist::default(),
            viewer_path_marker: "post-csr".to_owned(),
            resend: ResendPolicy::default(),
            height_check_delay: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the posts API, without trailing slash.
    pub api_url: String,
    /// Storage key consulted when the parent hasn't provided a token.
    pub token_storage_key: String,
}

impl ClientConfig {
    pub fn with_api_url(api_url: impl Into<String>) -> Self {
        let api_url = api_url.into();
        Self {
            api_url: api_url.trim_end_matches('/').to_owned(),
            ..Self::default()
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: option_env!("EDUPOST_API_URL")
                .unwrap_or(DEFAULT_API_URL)
                .trim_end_matches('/')
                .to_owned(),
            token_storage_key: DEFAULT_TOKEN_STORAGE_KEY.to_owned(),
        }
    }
}

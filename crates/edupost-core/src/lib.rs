//! edupost-core: the parent-window protocol for the embeddable blog editor and
//! viewer, without DOM dependencies.
//!
//! This crate provides:
//! - `ParentHost` trait for the browser facilities the bridge needs
//! - `ParentBridge<H>` - origin-checked message dispatch, user snapshot,
//!   readiness handshake and height reporting over any host
//! - `PostClient` - REST calls for posts, authenticated with the parent's token
//! - Viewer helpers (reading time, accent colours, progress)

pub mod bridge;
pub mod client;
pub mod config;
pub mod error;
pub mod handshake;
pub mod height;
pub mod message;
pub mod origin;
pub mod platform;
pub mod registry;
pub mod viewer;

#[cfg(test)]
mod testing;

pub use bridge::{Bridge, NullBridge, ParentBridge, connect};
pub use client::{PostClient, PostDraft, SavePayload, TokenStore, UpdatePayload, slugify};
pub use config::{BridgeConfig, ClientConfig, DEFAULT_API_URL, DEFAULT_TOKEN_STORAGE_KEY};
pub use error::{ApiError, ErrorBody};
pub use handshake::{Handshake, ReadyKind, ReadyMessage, ResendPolicy};
pub use height::{CONTENT_HEIGHT_EVENT, HeightReporter};
pub use message::{
    CodecError, InboundMessage, MessageKind, OutboundKind, OutboundMessage, Post, PostId,
    PreferenceUpdate, Snapshot, User, UserData, accept, decode,
};
pub use origin::{DEFAULT_ALLOWED_ORIGINS, OriginAllowlist};
pub use platform::{
    HostCallback, MessageHandler, PageLocation, ParentHost, PlatformError, ResizeCallback,
    TaskGuard,
};
pub use registry::{
    BridgeEvent, CallbackRegistry, EventName, Listener, ListenerError, ListenerResult,
    Subscription, listener,
};
pub use smol_str::SmolStr;
pub use viewer::{PageColor, ViewerTheme, hex_for_page_color, reading_progress, reading_time};

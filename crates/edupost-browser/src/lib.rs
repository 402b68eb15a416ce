//! Browser host for the EduPost parent bridge.
//!
//! Implements `ParentHost` on `web-sys` and owns the page-wide bridge. It
//! assumes a `wasm32-unknown-unknown` target environment.
//!
//! - `host`: window messaging, load/timer scheduling, `ResizeObserver`, heights
//! - `singleton`: lazily created bridge shared by the editor and viewer
//! - `storage`: `localStorage` token fallback for the post client
//!
//! This crate re-exports `edupost-core`, so consumers only need to depend on
//! `edupost-browser`.

pub use edupost_core;
pub use edupost_core::*;

pub mod host;
pub mod singleton;
pub mod storage;

pub use host::BrowserHost;
pub use singleton::{parent_bridge, parent_bridge_with, post_client};
pub use storage::LocalStorageTokenStore;

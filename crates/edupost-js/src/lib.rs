//! WASM bindings for the EduPost embed.
//!
//! Exposes the page's parent bridge, the post client and the viewer helpers
//! to the JavaScript UI layer.

mod bridge;
mod client;
mod types;
mod viewer;

pub use bridge::*;
pub use client::*;
pub use types::*;
pub use viewer::*;

use wasm_bindgen::prelude::*;

/// Install the panic hook and the console tracing subscriber.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();

    use tracing::Level;
    use tracing::subscriber::set_global_default;
    use tracing_subscriber::Registry;
    use tracing_subscriber::layer::SubscriberExt;

    let console_level = if cfg!(debug_assertions) {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let wasm_layer = tracing_wasm::WASMLayer::new(
        tracing_wasm::WASMLayerConfigBuilder::new()
            .set_max_level(console_level)
            .build(),
    );

    let _ = set_global_default(Registry::default().with(wasm_layer));
}

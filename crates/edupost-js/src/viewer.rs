//! Viewer helpers for JavaScript.

use edupost_browser::{ViewerTheme, parent_bridge};
use wasm_bindgen::prelude::*;

#[wasm_bindgen(js_name = readingTime)]
pub fn reading_time(html: &str) -> u32 {
    edupost_browser::reading_time(html) as u32
}

#[wasm_bindgen(js_name = hexForPageColor)]
pub fn hex_for_page_color(name: &str) -> String {
    edupost_browser::hex_for_page_color(name).to_owned()
}

/// Percentage of the article read, or `undefined` when it fits on screen.
#[wasm_bindgen(js_name = readingProgress)]
pub fn reading_progress(
    scroll_top: f64,
    content_top: f64,
    content_height: f64,
    viewport_height: f64,
) -> Option<f64> {
    edupost_browser::reading_progress(scroll_top, content_top, content_height, viewport_height)
}

/// Accent colour that follows the parent's user preferences.
#[wasm_bindgen]
pub struct JsViewerTheme {
    inner: ViewerTheme,
}

#[wasm_bindgen]
impl JsViewerTheme {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        let inner = ViewerTheme::new();
        inner.attach(&*parent_bridge());
        Self { inner }
    }

    /// Colour name, e.g. `CORAL`.
    #[wasm_bindgen(getter)]
    pub fn color(&self) -> String {
        self.inner.color().name().to_owned()
    }

    #[wasm_bindgen(getter, js_name = accentHex)]
    pub fn accent_hex(&self) -> String {
        self.inner.accent_hex().to_owned()
    }

    #[wasm_bindgen]
    pub fn detach(&self) {
        self.inner.detach();
    }
}

impl Default for JsViewerTheme {
    fn default() -> Self {
        Self::new()
    }
}

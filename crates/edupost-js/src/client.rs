//! JsPostClient - REST access to posts for JavaScript.

use std::future::Future;
use std::rc::Rc;

use edupost_browser::{ApiError, ClientConfig, Post, PostClient, PostDraft, post_client};
use js_sys::Promise;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;

use crate::types::{JsApiError, to_js};

/// Post client bound to the page's bridge.
///
/// Every method returns a promise resolving to the post, or rejecting with
/// `{ message, status }`.
#[wasm_bindgen]
pub struct JsPostClient {
    inner: Rc<PostClient>,
}

#[wasm_bindgen]
impl JsPostClient {
    /// Create a client. Without `apiUrl` the build-time default is used.
    #[wasm_bindgen(constructor)]
    pub fn new(api_url: Option<String>) -> Self {
        let config = api_url
            .map(ClientConfig::with_api_url)
            .unwrap_or_default();
        Self {
            inner: Rc::new(post_client(config)),
        }
    }

    #[wasm_bindgen(getter, js_name = apiUrl)]
    pub fn api_url(&self) -> String {
        self.inner.config().api_url.clone()
    }

    #[wasm_bindgen(js_name = loadPostBySlug)]
    pub fn load_post_by_slug(&self, slug: String) -> Promise {
        let client = self.inner.clone();
        settle(async move { client.load_post_by_slug(&slug).await })
    }

    /// Create or update a post from the editor form.
    #[wasm_bindgen(js_name = savePost)]
    pub fn save_post(&self, draft: JsValue) -> Result<Promise, JsError> {
        let draft = parse_draft(draft)?;
        let client = self.inner.clone();
        Ok(settle(async move { client.save_post(&draft).await }))
    }

    #[wasm_bindgen(js_name = updatePost)]
    pub fn update_post(&self, slug: String, draft: JsValue) -> Result<Promise, JsError> {
        let draft = parse_draft(draft)?;
        let client = self.inner.clone();
        Ok(settle(async move { client.update_post(&slug, &draft).await }))
    }
}

fn parse_draft(draft: JsValue) -> Result<PostDraft, JsError> {
    serde_wasm_bindgen::from_value(draft)
        .map_err(|e| JsError::new(&format!("Invalid post data: {}", e)))
}

fn settle<F>(request: F) -> Promise
where
    F: Future<Output = Result<Post, ApiError>> + 'static,
{
    future_to_promise(async move {
        match request.await {
            Ok(post) => to_js(&post),
            Err(e) => Err(to_js(&JsApiError::from(&e))?),
        }
    })
}

//! REST client for posts.
//!
//! The bearer token comes from the parent: it is read from the cached snapshot
//! at construction and kept current from `userData`/`initData` events. When
//! the parent hasn't sent one, an optional [`TokenStore`] is consulted.
//! Saves and updates are also announced to the parent window.

use std::cell::RefCell;
use std::rc::Rc;

use reqwest::{Method, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::bridge::Bridge;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::message::{OutboundKind, Post, PostId};
use crate::registry::{BridgeEvent, EventName, Subscription};

/// Longest summary derived from a title.
const SUMMARY_CHARS: usize = 120;

/// Fallback token source, e.g. `localStorage` in the browser.
pub trait TokenStore {
    fn load_token(&self) -> Option<String>;
}

/// Editor form state submitted for saving.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PostDraft {
    pub id: Option<PostId>,
    pub title: String,
    pub content: String,
    pub summary: Option<String>,
    pub cover_image: Option<String>,
    pub published: bool,
    pub featured: bool,
    pub author_email: Option<String>,
}

impl PostDraft {
    /// The draft's summary, or the start of its title.
    pub fn summary_or_title(&self) -> String {
        match self.summary.as_deref() {
            Some(summary) if !summary.is_empty() => summary.to_owned(),
            _ => self.title.chars().take(SUMMARY_CHARS).collect(),
        }
    }

    fn cover_image(&self) -> Option<String> {
        self.cover_image.clone().filter(|url| !url.is_empty())
    }
}

/// Body of `POST /posts` and `PUT /posts/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavePayload {
    pub title: String,
    pub slug: String,
    pub summary: String,
    pub content: String,
    pub cover_image: Option<String>,
    pub featured: bool,
    pub published: bool,
    pub author_email: String,
}

impl SavePayload {
    pub fn new(draft: &PostDraft, author_email: String) -> Self {
        Self {
            title: draft.title.clone(),
            slug: slugify(&draft.title),
            summary: draft.summary_or_title(),
            content: draft.content.clone(),
            cover_image: draft.cover_image(),
            featured: draft.featured,
            published: draft.published,
            author_email,
        }
    }
}

/// Body of `PUT /posts/{slug}`. The slug itself isn't sent; the backend finds
/// the post by the URL.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePayload {
    pub title: String,
    pub summary: String,
    pub content: String,
    pub cover_image: Option<String>,
    pub published: bool,
    pub featured: bool,
}

impl From<&PostDraft> for UpdatePayload {
    fn from(draft: &PostDraft) -> Self {
        Self {
            title: draft.title.clone(),
            summary: draft.summary_or_title(),
            content: draft.content.clone(),
            cover_image: draft.cover_image(),
            published: draft.published,
            featured: draft.featured,
        }
    }
}

/// URL slug for a title.
///
/// Lowercases, drops everything but ASCII word characters, whitespace and
/// hyphens, turns whitespace runs into single hyphens and collapses repeated
/// hyphens. Leading and trailing hyphens are removed.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.to_lowercase().chars() {
        let c = if c.is_whitespace() { '-' } else { c };
        if c == '-' {
            if !slug.ends_with('-') {
                slug.push('-');
            }
        } else if c.is_ascii_alphanumeric() || c == '_' {
            slug.push(c);
        }
    }
    slug.trim_matches('-').to_owned()
}

pub struct PostClient {
    http: reqwest::Client,
    config: ClientConfig,
    bridge: Rc<dyn Bridge>,
    token: Rc<RefCell<Option<String>>>,
    store: Option<Box<dyn TokenStore>>,
    subscriptions: Vec<Subscription>,
}

impl PostClient {
    pub fn new(bridge: Rc<dyn Bridge>, config: ClientConfig) -> Self {
        let token = Rc::new(RefCell::new(
            bridge.user_data().and_then(|snapshot| snapshot.token.clone()),
        ));

        let sink = token.clone();
        let on_user = bridge.subscribe(EventName::UserData, move |event| {
            if let Some(token) = event.user().and_then(|user| user.token.as_ref()) {
                *sink.borrow_mut() = Some(token.clone());
            }
            Ok(())
        });

        let sink = token.clone();
        let on_init = bridge.subscribe(EventName::InitData, move |event| {
            if let BridgeEvent::InitData(snapshot) = event {
                if let Some(token) = &snapshot.token {
                    *sink.borrow_mut() = Some(token.clone());
                }
            }
            Ok(())
        });

        Self {
            http: reqwest::Client::new(),
            config,
            bridge,
            token,
            store: None,
            subscriptions: vec![on_user, on_init],
        }
    }

    pub fn with_token_store(mut self, store: impl TokenStore + 'static) -> Self {
        self.store = Some(Box::new(store));
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Token sent as `Authorization: Bearer`, if any.
    pub fn token(&self) -> Option<String> {
        let token = self.token.borrow().clone();
        token.or_else(|| self.store.as_ref().and_then(|store| store.load_token()))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.config.api_url, path);
        let request = self
            .http
            .request(method, url)
            .header(reqwest::header::CONTENT_TYPE, "application/json");
        // send the platform's cookies along with fetch
        #[cfg(all(target_family = "wasm", target_os = "unknown"))]
        let request = request.fetch_credentials_include();
        match self.token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Load a post. A post embedded in the parent's snapshot with the same slug
    /// is returned without a request.
    #[tracing::instrument(skip(self))]
    pub async fn load_post_by_slug(&self, slug: &str) -> Result<Post, ApiError> {
        let cached = self
            .bridge
            .user_data()
            .and_then(|snapshot| snapshot.post.clone())
            .filter(|post| post.slug.as_deref() == Some(slug));
        if let Some(post) = cached {
            tracing::debug!("using post from parent snapshot");
            return Ok(post);
        }

        let path = format!("/posts/slug/{}", urlencoding::encode(slug));
        let response = self.request(Method::GET, &path).send().await?;
        read_post(response).await
    }

    /// Create a post, or update it when the draft or the parent's post has an id.
    ///
    /// The author is the parent's user; an empty or missing email there falls
    /// back to the draft's.
    pub async fn save_post(&self, draft: &PostDraft) -> Result<Post, ApiError> {
        let snapshot = self.bridge.user_data();
        let non_empty = |email: &String| !email.is_empty();
        let author_email = snapshot
            .as_ref()
            .and_then(|snapshot| snapshot.user.as_ref())
            .and_then(|user| user.email.clone())
            .filter(non_empty)
            .or_else(|| draft.author_email.clone().filter(non_empty))
            .ok_or_else(|| {
                tracing::error!("user email not available");
                ApiError::Unauthenticated
            })?;

        let payload = SavePayload::new(draft, author_email);
        tracing::info!(title = %payload.title, slug = %payload.slug, "saving post");
        self.bridge.send_to_parent(
            OutboundKind::SaveContent.as_str(),
            serde_json::to_value(&payload).unwrap_or_default(),
        );

        let existing = draft
            .id
            .clone()
            .or_else(|| snapshot.as_ref().and_then(|s| s.post.as_ref()).and_then(|post| post.id.clone()));
        let request = match existing {
            Some(id) => {
                let path = format!("/posts/{}", urlencoding::encode(&id.to_string()));
                self.request(Method::PUT, &path)
            }
            None => self.request(Method::POST, "/posts"),
        };
        let response = request.json(&payload).send().await?;
        read_post(response).await
    }

    /// Update the post at `slug`.
    pub async fn update_post(&self, slug: &str, draft: &PostDraft) -> Result<Post, ApiError> {
        if slug.is_empty() {
            return Err(ApiError::MissingSlug);
        }

        let payload = UpdatePayload::from(draft);
        tracing::info!(slug, new_slug = %slugify(&draft.title), "updating post");
        self.bridge.send_to_parent(
            OutboundKind::ContentUpdate.as_str(),
            serde_json::to_value(&payload).unwrap_or_default(),
        );

        let path = format!("/posts/{}", urlencoding::encode(slug));
        let response = self
            .request(Method::PUT, &path)
            .json(&payload)
            .send()
            .await?;
        read_post(response).await
    }
}

impl Drop for PostClient {
    fn drop(&mut self) {
        for subscription in &self.subscriptions {
            subscription.unsubscribe();
        }
    }
}

/// Unwrap `{ data }` (or a bare object) from a response, or build the error.
async fn read_post(response: Response) -> Result<Post, ApiError> {
    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        let message = serde_json::from_str::<Value>(&text)
            .ok()
            .and_then(|body| body.get("message").and_then(Value::as_str).map(str::to_owned))
            .unwrap_or_else(|| format!("HTTP error {}", status.as_u16()));
        tracing::error!(status = status.as_u16(), "post request failed: {message}");
        return Err(ApiError::Status {
            status: status.as_u16(),
            message,
        });
    }

    let body: Value = serde_json::from_str(&text).map_err(ApiError::Decode)?;
    let data = match body {
        Value::Object(mut map) => match map.remove("data") {
            Some(data) if !data.is_null() => data,
            _ => Value::Object(map),
        },
        other => other,
    };
    serde_json::from_value(data).map_err(ApiError::Decode)
}

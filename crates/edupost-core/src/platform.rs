//! Platform abstraction for the parent bridge.
//!
//! `ParentHost` is the seam between the protocol logic in this crate and the
//! environment it runs in. The browser implementation lives in `edupost-browser`
//! and talks to `window`, `window.parent` and the DOM; tests use an in-memory
//! host that records outbound messages and fires timers on demand.

use std::any::Any;
use std::time::Duration;

use url::Url;

use crate::message::OutboundMessage;
use crate::origin::OriginAllowlist;

/// Error type for platform operations.
#[derive(Debug, Clone)]
pub struct PlatformError(pub String);

impl std::fmt::Display for PlatformError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for PlatformError {}

impl From<&str> for PlatformError {
    fn from(s: &str) -> Self {
        PlatformError(s.to_string())
    }
}

impl From<String> for PlatformError {
    fn from(s: String) -> Self {
        PlatformError(s)
    }
}

/// Handler for raw inbound messages: `(origin, data)`.
pub type MessageHandler = Box<dyn Fn(&str, serde_json::Value)>;

/// One-shot callback for timers and load events.
pub type HostCallback = Box<dyn FnOnce()>;

/// Callback invoked whenever an observed element changes size.
pub type ResizeCallback = Box<dyn Fn()>;

/// Keeps a host registration alive. Dropping the guard cancels it.
///
/// Whatever the host puts in here (an event listener, a timeout handle, a
/// resize observer) is expected to unregister itself on drop.
pub struct TaskGuard {
    _inner: Box<dyn Any>,
}

impl TaskGuard {
    pub fn new<T: 'static>(inner: T) -> Self {
        Self {
            _inner: Box::new(inner),
        }
    }

    /// A guard with nothing to cancel.
    pub fn noop() -> Self {
        Self::new(())
    }
}

impl std::fmt::Debug for TaskGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskGuard").finish_non_exhaustive()
    }
}

/// The page location the bridge was created at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLocation {
    href: String,
    url: Option<Url>,
}

impl PageLocation {
    pub fn new(href: impl Into<String>) -> Self {
        let href = href.into();
        let url = Url::parse(&href).ok();
        Self { href, url }
    }

    pub fn href(&self) -> &str {
        &self.href
    }

    /// Path component, or the raw href when it can't be parsed as a URL.
    pub fn pathname(&self) -> &str {
        match &self.url {
            Some(url) => url.path(),
            None => &self.href,
        }
    }

    /// First value of the named query parameter.
    pub fn query_param(&self, name: &str) -> Option<String> {
        self.url
            .as_ref()?
            .query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }
}

/// Everything the bridge needs from its environment.
///
/// All methods are called from the single UI thread. Callbacks handed to the
/// host must not be invoked re-entrantly from inside the registering call.
pub trait ParentHost: 'static {
    /// Whether the document runs inside a frame (`window.parent !== window`).
    fn is_embedded(&self) -> bool;

    /// Current document location.
    fn location(&self) -> PageLocation;

    /// Post a message to the parent window.
    fn post_to_parent(&self, message: &OutboundMessage) -> Result<(), PlatformError>;

    /// Start delivering cross-document messages to `handler`.
    ///
    /// Messages from origins outside `allowlist` are dropped before their data
    /// is converted, and data that can't be represented as JSON is dropped
    /// too. Neither may raise an error out of the host's event callback.
    fn listen_messages(
        &self,
        allowlist: &OriginAllowlist,
        handler: MessageHandler,
    ) -> Result<TaskGuard, PlatformError>;

    /// Whether the document `load` event has already fired.
    fn is_loaded(&self) -> bool;

    /// Run `callback` once when the document finishes loading.
    fn on_load(&self, callback: HostCallback) -> TaskGuard;

    /// Run `callback` once after `delay`.
    fn set_timeout(&self, delay: Duration, callback: HostCallback) -> TaskGuard;

    /// Observe size changes of the first element matching `selector`.
    ///
    /// Returns `None` when nothing matches.
    fn observe_resize(&self, selector: &str, callback: ResizeCallback) -> Option<TaskGuard>;

    /// Scroll height of the first element matching `selector`.
    fn element_scroll_height(&self, selector: &str) -> Option<u32>;

    /// Max of scroll/offset height across `<body>` and the root element.
    fn document_height(&self) -> u32;
}

/// Post to the parent if embedded. Returns whether the host accepted the message.
pub(crate) fn post_if_embedded<H: ParentHost + ?Sized>(host: &H, message: &OutboundMessage) -> bool {
    if !host.is_embedded() {
        tracing::trace!(kind = %message.kind, "not embedded, dropping outbound message");
        return false;
    }
    match host.post_to_parent(message) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(kind = %message.kind, "failed to post message to parent: {e}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_parts() {
        let location = PageLocation::new("https://embed.example/post-csr?slug=hello&mode=view");
        assert_eq!(location.pathname(), "/post-csr");
        assert_eq!(location.query_param("mode").as_deref(), Some("view"));
        assert_eq!(location.query_param("slug").as_deref(), Some("hello"));
        assert_eq!(location.query_param("missing"), None);
    }

    #[test]
    fn test_unparseable_location() {
        let location = PageLocation::new("not a url");
        assert_eq!(location.pathname(), "not a url");
        assert_eq!(location.query_param("mode"), None);
    }

    #[test]
    fn test_query_param_is_decoded() {
        let location = PageLocation::new("http://localhost:3000/?mode=edit&slug=a%20b");
        assert_eq!(location.query_param("slug").as_deref(), Some("a b"));
    }
}

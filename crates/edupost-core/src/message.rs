//! Wire records exchanged with the parent window.
//!
//! Inbound messages arrive as `{ type, payload }` objects. [`decode`] turns
//! them into the closed [`InboundMessage`] set, and [`accept`] adds the origin
//! check and logging the bridge wants in front of it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use smol_str::SmolStr;
use thiserror::Error;

use crate::origin::OriginAllowlist;

/// Inbound message kinds understood by the embed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    InitData,
    UserData,
    PreferenceUpdate,
    ContentUpdate,
    RequestContentHeight,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::InitData => "INIT_DATA",
            MessageKind::UserData => "USER_DATA",
            MessageKind::PreferenceUpdate => "PREFERENCE_UPDATE",
            MessageKind::ContentUpdate => "CONTENT_UPDATE",
            MessageKind::RequestContentHeight => "REQUEST_CONTENT_HEIGHT",
        }
    }

    /// Parse a wire `type`. Unknown kinds return `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "INIT_DATA" => Some(MessageKind::InitData),
            "USER_DATA" => Some(MessageKind::UserData),
            "PREFERENCE_UPDATE" => Some(MessageKind::PreferenceUpdate),
            "CONTENT_UPDATE" => Some(MessageKind::ContentUpdate),
            "REQUEST_CONTENT_HEIGHT" => Some(MessageKind::RequestContentHeight),
            _ => None,
        }
    }
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outbound message types sent to the parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutboundKind {
    EditorReady,
    ViewerReady,
    ResizeIframe,
    SaveContent,
    ContentUpdate,
}

impl OutboundKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutboundKind::EditorReady => "EDITOR_READY",
            OutboundKind::ViewerReady => "VIEWER_READY",
            OutboundKind::ResizeIframe => "RESIZE_IFRAME",
            OutboundKind::SaveContent => "SAVE_CONTENT",
            OutboundKind::ContentUpdate => "CONTENT_UPDATE",
        }
    }
}

impl std::fmt::Display for OutboundKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Signed-in user as described by the parent platform.
///
/// Fields the embed doesn't interpret are kept in `extra` so the snapshot
/// serializes back to what the parent sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_authenticated: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Post identifier. The backend hands out numeric ids, older records use strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PostId {
    Number(i64),
    Text(String),
}

impl std::fmt::Display for PostId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PostId::Number(n) => write!(f, "{n}"),
            PostId::Text(s) => f.write_str(s),
        }
    }
}

/// A blog post. `content` is opaque HTML.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<PostId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Snapshot carried by `INIT_DATA` and `USER_DATA`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<Post>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An `INIT_DATA`/`USER_DATA` payload as the parent sent it.
///
/// The typed [`UserData`] view is reachable through `Deref`, but serializing
/// a snapshot writes the raw payload back out, so a `null` stays a `null`
/// instead of disappearing with the `None` it parses to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    raw: Value,
    data: UserData,
}

impl Snapshot {
    pub fn from_value(raw: Value) -> Result<Self, serde_json::Error> {
        let data = UserData::deserialize(&raw)?;
        Ok(Self { raw, data })
    }

    /// The payload exactly as received.
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    pub fn data(&self) -> &UserData {
        &self.data
    }

    /// The `user` member as received, `null` when absent.
    pub fn user_json(&self) -> Value {
        self.raw.get("user").cloned().unwrap_or(Value::Null)
    }
}

impl std::ops::Deref for Snapshot {
    type Target = UserData;

    fn deref(&self) -> &UserData {
        &self.data
    }
}

impl Serialize for Snapshot {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.raw.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Snapshot {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        Snapshot::from_value(raw).map_err(serde::de::Error::custom)
    }
}

/// Payload of `PREFERENCE_UPDATE`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_color: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A validated inbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    InitData(Snapshot),
    UserData(Snapshot),
    PreferenceUpdate(PreferenceUpdate),
    ContentUpdate(Value),
    RequestContentHeight,
}

impl InboundMessage {
    pub fn kind(&self) -> MessageKind {
        match self {
            InboundMessage::InitData(_) => MessageKind::InitData,
            InboundMessage::UserData(_) => MessageKind::UserData,
            InboundMessage::PreferenceUpdate(_) => MessageKind::PreferenceUpdate,
            InboundMessage::ContentUpdate(_) => MessageKind::ContentUpdate,
            InboundMessage::RequestContentHeight => MessageKind::RequestContentHeight,
        }
    }
}

/// Message sent to the parent window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundMessage {
    #[serde(rename = "type")]
    pub kind: SmolStr,
    pub payload: Value,
}

impl OutboundMessage {
    pub fn new(kind: impl Into<SmolStr>, payload: Value) -> Self {
        Self {
            kind: kind.into(),
            payload,
        }
    }

    /// `RESIZE_IFRAME { height }`
    pub fn resize(height: u32) -> Self {
        Self::new(
            OutboundKind::ResizeIframe.as_str(),
            serde_json::json!({ "height": height }),
        )
    }
}

/// Reasons an inbound message is considered malformed.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum CodecError {
    /// The message data wasn't a JSON object.
    #[error("message is not an object")]
    NotAnObject,

    /// No string `type` field.
    #[error("message has no type")]
    MissingType,

    /// `INIT_DATA` without a `user`.
    #[error("INIT_DATA payload has no user")]
    MissingUser,

    /// The payload doesn't match the record for its kind.
    #[error("invalid {kind} payload: {source}")]
    InvalidPayload {
        kind: MessageKind,
        #[source]
        source: serde_json::Error,
    },
}

/// Decode raw message data.
///
/// Returns `Ok(None)` for well-formed messages of a kind this embed doesn't
/// know, so newer parents can't break older children.
pub fn decode(raw: &Value) -> Result<Option<InboundMessage>, CodecError> {
    let object = raw.as_object().ok_or(CodecError::NotAnObject)?;
    let kind = object
        .get("type")
        .and_then(Value::as_str)
        .filter(|kind| !kind.is_empty())
        .ok_or(CodecError::MissingType)?;

    let Some(kind) = MessageKind::parse(kind) else {
        return Ok(None);
    };
    let payload = object.get("payload").cloned().unwrap_or(Value::Null);

    let message = match kind {
        MessageKind::InitData => {
            if !payload.as_object().is_some_and(|p| p.contains_key("user")) {
                return Err(CodecError::MissingUser);
            }
            InboundMessage::InitData(parse_payload(kind, payload)?)
        }
        MessageKind::UserData => InboundMessage::UserData(parse_payload(kind, payload)?),
        MessageKind::PreferenceUpdate => {
            InboundMessage::PreferenceUpdate(parse_payload(kind, payload)?)
        }
        MessageKind::ContentUpdate => InboundMessage::ContentUpdate(payload),
        MessageKind::RequestContentHeight => InboundMessage::RequestContentHeight,
    };
    Ok(Some(message))
}

fn parse_payload<T: serde::de::DeserializeOwned>(
    kind: MessageKind,
    payload: Value,
) -> Result<T, CodecError> {
    serde_json::from_value(payload).map_err(|source| CodecError::InvalidPayload { kind, source })
}

/// Origin check plus decode. Anything rejected is logged and dropped.
pub fn accept(allowlist: &OriginAllowlist, origin: &str, raw: &Value) -> Option<InboundMessage> {
    if !allowlist.contains(origin) {
        tracing::warn!(origin, "origin not allowed, ignoring message");
        return None;
    }

    match decode(raw) {
        Ok(Some(message)) => {
            tracing::debug!(origin, kind = %message.kind(), "accepted message from parent");
            Some(message)
        }
        Ok(None) => {
            tracing::trace!(origin, "ignoring unknown message kind");
            None
        }
        Err(e) => {
            tracing::debug!(origin, "dropping malformed message: {e}");
            None
        }
    }
}

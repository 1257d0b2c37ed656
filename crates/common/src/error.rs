use std::error::Error as StdError;

use {serde::Serialize, thiserror::Error};

use crate::model::ChatId;

/// Coarse category callers use to decide how to present a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The request itself is wrong (duplicate registration, malformed URL).
    BadRequest,
    /// The addressed chat, link, or row does not exist.
    NotFound,
    /// A remote source or the notification transport failed.
    Upstream,
    Internal,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::BadRequest => "bad request",
            Self::NotFound => "not found",
            Self::Upstream => "upstream failure",
            Self::Internal => "internal error",
        })
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("chat {chat_id} is already registered")]
    DuplicateChat { chat_id: ChatId },

    #[error("chat {chat_id} is not registered")]
    ChatNotRegistered { chat_id: ChatId },

    #[error("chat {chat_id} already tracks a link with path {path}")]
    DuplicateLink { chat_id: ChatId, path: String },

    #[error("chat {chat_id} does not track a link with path {path}")]
    LinkNotFound { chat_id: ChatId, path: String },

    #[error("cannot parse {url}: {reason}")]
    Parse { url: String, reason: String },

    #[error("no {entity} matches {key}")]
    EntityNotFound { entity: &'static str, key: String },

    #[error("domain {domain} is claimed by more than one updater")]
    DuplicateDomain { domain: String },

    #[error("upstream fetch failed: {context}: {source}")]
    UpstreamFetch {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    #[error("notification delivery failed: {context}: {source}")]
    NotificationDelivery {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    #[error("persistence failed: {context}: {source}")]
    Persistence {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    #[error("{0}")]
    Message(String),
}

impl Error {
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }

    #[must_use]
    pub fn parse(url: impl std::fmt::Display, reason: impl Into<String>) -> Self {
        Self::Parse {
            url: url.to_string(),
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn entity_not_found(entity: &'static str, key: impl std::fmt::Display) -> Self {
        Self::EntityNotFound {
            entity,
            key: key.to_string(),
        }
    }

    #[must_use]
    pub fn upstream(
        context: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::UpstreamFetch {
            context: context.into(),
            source: Box::new(source),
        }
    }

    #[must_use]
    pub fn delivery(
        context: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::NotificationDelivery {
            context: context.into(),
            source: Box::new(source),
        }
    }

    #[must_use]
    pub fn persistence(
        context: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::Persistence {
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// Category used to map the failure onto a caller-facing response.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DuplicateChat { .. } | Self::DuplicateLink { .. } | Self::Parse { .. } => {
                ErrorKind::BadRequest
            },
            Self::ChatNotRegistered { .. }
            | Self::LinkNotFound { .. }
            | Self::EntityNotFound { .. } => ErrorKind::NotFound,
            Self::UpstreamFetch { .. } | Self::NotificationDelivery { .. } => ErrorKind::Upstream,
            Self::DuplicateDomain { .. } | Self::Persistence { .. } | Self::Message(_) => {
                ErrorKind::Internal
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

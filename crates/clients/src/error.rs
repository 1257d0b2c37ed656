use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("invalid endpoint {url}: {source}")]
    Endpoint {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("{what} not found upstream")]
    Missing { what: String },
}

impl Error {
    #[must_use]
    pub fn missing(what: impl std::fmt::Display) -> Self {
        Self::Missing {
            what: what.to_string(),
        }
    }

    /// HTTP status of a failed request, if the server answered at all.
    pub fn status(&self) -> Option<reqwest::StatusCode> {
        match self {
            Self::Request(e) => e.status(),
            _ => None,
        }
    }

    pub(crate) fn into_fetch(self, context: impl Into<String>) -> linktrack_common::Error {
        linktrack_common::Error::upstream(context, self)
    }

    pub(crate) fn into_delivery(self, context: impl Into<String>) -> linktrack_common::Error {
        linktrack_common::Error::delivery(context, self)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

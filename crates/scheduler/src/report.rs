use {
    chrono::{DateTime, Utc},
    linktrack_common::{Error, LinkId},
    serde::Serialize,
    url::Url,
};

/// Where one link ended up in a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LinkOutcome {
    Unchanged,
    /// Remote moved past the checkpoint; chats were notified (best-effort)
    /// and the checkpoint was persisted.
    Changed,
    /// Checkpoint overwritten by a forced resync.
    Resynced { checkpoint: DateTime<Utc> },
    /// No updater owns the link's domain.
    RouteNotFound,
    ParseFailed { error: String },
    FetchFailed { error: String },
    PersistFailed { error: String },
    /// The batch was cancelled before this link was started.
    Cancelled,
}

impl LinkOutcome {
    /// Sort a per-link error into its terminal state.
    pub fn from_error(err: &Error) -> Self {
        let error = err.to_string();
        match err {
            Error::Parse { .. } => Self::ParseFailed { error },
            Error::UpstreamFetch { .. } => Self::FetchFailed { error },
            _ => Self::PersistFailed { error },
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::ParseFailed { .. } | Self::FetchFailed { .. } | Self::PersistFailed { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkReport {
    pub link_id: LinkId,
    pub url: Url,
    pub outcome: LinkOutcome,
}

/// Every selected link with its terminal state, in selection order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub links: Vec<LinkReport>,
}

impl BatchReport {
    pub fn selected(&self) -> usize {
        self.links.len()
    }

    pub fn changed(&self) -> usize {
        self.count(|o| matches!(o, LinkOutcome::Changed))
    }

    pub fn unchanged(&self) -> usize {
        self.count(|o| matches!(o, LinkOutcome::Unchanged))
    }

    pub fn resynced(&self) -> usize {
        self.count(|o| matches!(o, LinkOutcome::Resynced { .. }))
    }

    pub fn route_not_found(&self) -> usize {
        self.count(|o| matches!(o, LinkOutcome::RouteNotFound))
    }

    pub fn failed(&self) -> usize {
        self.count(LinkOutcome::is_failure)
    }

    pub fn cancelled(&self) -> usize {
        self.count(|o| matches!(o, LinkOutcome::Cancelled))
    }

    fn count(&self, pred: impl Fn(&LinkOutcome) -> bool) -> usize {
        self.links.iter().filter(|l| pred(&l.outcome)).count()
    }
}

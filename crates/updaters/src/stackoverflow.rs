//! `stackoverflow.com/questions/{id}` links.

use std::sync::Arc;

use {
    linktrack_common::{Error, Result, address},
    url::Url,
};

use crate::{
    context::UpdateContext,
    fetch::{RemoteState, StackOverflowFetch},
};

pub const DOMAIN: &str = "stackoverflow.com";

/// Extract the numeric question id from
/// `https://stackoverflow.com/questions/{id}[/{slug}]`.
pub fn parse_question_id(url: &Url) -> Result<u64> {
    if address::domain_of(url).as_deref() != Some(DOMAIN) {
        return Err(Error::parse(url, "not a stackoverflow.com link"));
    }
    let segments = address::path_segments(url);
    let id = match segments.as_slice() {
        ["questions", id] | ["questions", id, _] => *id,
        _ => {
            return Err(Error::parse(
                url,
                "expected /questions/{id} with an optional slug",
            ));
        },
    };
    if !id.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::parse(url, format!("question id {id:?} is not numeric")));
    }
    id.parse()
        .map_err(|e| Error::parse(url, format!("question id {id:?}: {e}")))
}

pub struct StackOverflowUpdater {
    client: Arc<dyn StackOverflowFetch>,
    context: Arc<UpdateContext>,
}

impl StackOverflowUpdater {
    pub fn new(client: Arc<dyn StackOverflowFetch>, context: Arc<UpdateContext>) -> Self {
        Self { client, context }
    }

    pub(crate) fn context(&self) -> &UpdateContext {
        &self.context
    }

    pub(crate) async fn fetch(&self, url: &Url) -> Result<(RemoteState, String)> {
        let id = parse_question_id(url)?;
        let state = self.client.fetch_question(id).await?;
        let description = describe(id, &state);
        Ok((state, description))
    }
}

fn describe(id: u64, state: &RemoteState) -> String {
    let author = state.author.as_deref().unwrap_or("unknown");
    format!("Question #{id} has new activity: {}\nby {author}", state.title)
}

//! StackExchange API client: question activity.

use {
    async_trait::async_trait,
    chrono::{DateTime, Utc},
    linktrack_updaters::{RemoteState, StackOverflowFetch},
    serde::Deserialize,
    tracing::debug,
};

use crate::{Error, Result, endpoint};

#[derive(Debug, Deserialize)]
struct QuestionsResponse {
    #[serde(default)]
    items: Vec<Question>,
}

#[derive(Debug, Deserialize)]
struct Question {
    title: String,
    #[serde(with = "chrono::serde::ts_seconds")]
    last_activity_date: DateTime<Utc>,
    #[serde(default)]
    owner: Option<QuestionOwner>,
}

#[derive(Debug, Deserialize)]
struct QuestionOwner {
    display_name: Option<String>,
}

pub struct StackOverflowClient {
    http: reqwest::Client,
    base_url: String,
}

impl StackOverflowClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    async fn question(&self, question_id: u64) -> Result<Question> {
        let mut url = endpoint(&self.base_url, &format!("questions/{question_id}"))?;
        url.query_pairs_mut().append_pair("site", "stackoverflow");
        debug!(%url, "fetching stackoverflow question");

        let response = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json::<QuestionsResponse>()
            .await?;
        response
            .items
            .into_iter()
            .next()
            .ok_or_else(|| Error::missing(format!("question {question_id}")))
    }
}

#[async_trait]
impl StackOverflowFetch for StackOverflowClient {
    async fn fetch_question(&self, question_id: u64) -> linktrack_common::Result<RemoteState> {
        let question = self
            .question(question_id)
            .await
            .map_err(|e| e.into_fetch(format!("stackoverflow question {question_id}")))?;
        Ok(RemoteState {
            last_activity: question.last_activity_date,
            title: question.title,
            author: question.owner.and_then(|o| o.display_name),
        })
    }
}

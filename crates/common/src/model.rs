//! Records shared by the registry, the stores, and the updaters.

use {
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
    url::Url,
};

/// Chat ids are assigned by the messaging surface, never by us.
pub type ChatId = i64;

/// Link ids are assigned once by the store and never reused.
pub type LinkId = i64;

/// A registered subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    pub id: ChatId,
    pub registered_at: DateTime<Utc>,
}

/// One tracked URL, shared by every chat that tracks it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    pub id: LinkId,
    pub url: Url,
    /// Last confirmed remote modification time (the checkpoint).
    pub last_update: DateTime<Utc>,
}

impl Link {
    /// Path component used as the per-chat dedup key.
    pub fn path(&self) -> &str {
        self.url.path()
    }
}

/// "Resource changed" message fanned out to every chat tracking a link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkUpdate {
    pub id: LinkId,
    pub url: Url,
    pub description: String,
    #[serde(rename = "tgChatIds")]
    pub chat_ids: Vec<ChatId>,
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_update_uses_wire_field_names() {
        let update = LinkUpdate {
            id: 7,
            url: Url::parse("https://github.com/alice/repo").unwrap(),
            description: "new push".into(),
            chat_ids: vec![100, 200],
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["url"], "https://github.com/alice/repo");
        assert_eq!(json["tgChatIds"], serde_json::json!([100, 200]));
    }

    #[test]
    fn link_path_ignores_query_and_host() {
        let a = Link {
            id: 1,
            url: Url::parse("https://a.com/x?q=1").unwrap(),
            last_update: DateTime::<Utc>::default(),
        };
        let b = Link {
            id: 2,
            url: Url::parse("https://b.com/x?q=2").unwrap(),
            last_update: DateTime::<Utc>::default(),
        };
        assert_eq!(a.path(), b.path());
    }
}

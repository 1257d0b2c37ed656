use {
    clap::Subcommand,
    linktrack_common::{ChatId, address::parse_tracked_url},
    tracing::warn,
};

use crate::{app::App, registry_error};

#[derive(Subcommand)]
pub enum LinkAction {
    /// Start tracking a URL for a chat.
    Add { chat_id: ChatId, url: String },
    /// Stop tracking a URL for a chat (matched by path).
    Remove { chat_id: ChatId, url: String },
    /// List the links a chat tracks, in the order they were added.
    List { chat_id: ChatId },
}

pub async fn handle_link(app: &App, action: LinkAction) -> anyhow::Result<()> {
    let output = match action {
        LinkAction::Add { chat_id, url } => {
            let url = parse_tracked_url(&url).map_err(registry_error)?;
            if app.orchestrator.table().resolve(&url).is_none() {
                warn!(%url, "no updater handles this host, the link will never be checked");
            }
            let link = app
                .registry
                .add_link(chat_id, &url)
                .await
                .map_err(registry_error)?;
            serde_json::to_string_pretty(&link)?
        },
        LinkAction::Remove { chat_id, url } => {
            let url = parse_tracked_url(&url).map_err(registry_error)?;
            let link = app
                .registry
                .remove_link(chat_id, &url)
                .await
                .map_err(registry_error)?;
            serde_json::to_string_pretty(&link)?
        },
        LinkAction::List { chat_id } => {
            let links = app
                .registry
                .get_links(chat_id)
                .await
                .map_err(registry_error)?;
            serde_json::to_string_pretty(&links)?
        },
    };
    println!("{output}");
    Ok(())
}

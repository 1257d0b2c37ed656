use {clap::Subcommand, linktrack_common::ChatId};

use crate::{app::App, registry_error};

#[derive(Subcommand)]
pub enum ChatAction {
    /// Register a chat so it can track links.
    Register { chat_id: ChatId },
    /// Delete a chat and every link association it holds.
    Delete { chat_id: ChatId },
}

pub async fn handle_chat(app: &App, action: ChatAction) -> anyhow::Result<()> {
    match action {
        ChatAction::Register { chat_id } => {
            let chat = app
                .registry
                .register_chat(chat_id)
                .await
                .map_err(registry_error)?;
            println!("Registered chat {}", chat.id);
        },
        ChatAction::Delete { chat_id } => {
            app.registry
                .delete_chat(chat_id)
                .await
                .map_err(registry_error)?;
            println!("Deleted chat {chat_id}");
        },
    }
    Ok(())
}

//! Wires config into stores, registry, updaters, and the orchestrator.

use std::{sync::Arc, time::Duration};

use {
    linktrack_clients::{BotClient, GitHubClient, StackOverflowClient, build_http_client},
    linktrack_config::LinktrackConfig,
    linktrack_registry::ChatLinkRegistry,
    linktrack_scheduler::{SchedulerConfig, UpdateOrchestrator, UpdateScheduler},
    linktrack_storage::{ChatRepository, LinkRepository, store_sqlite::SqliteStore},
    linktrack_updaters::{
        LinkUpdater, LogOnlyGateway, NotificationGateway, UpdateContext, UpdaterTable,
    },
    tracing::{debug, warn},
};

pub struct App {
    pub config: LinktrackConfig,
    pub links: Arc<dyn LinkRepository>,
    pub registry: ChatLinkRegistry,
    pub orchestrator: Arc<UpdateOrchestrator>,
}

impl App {
    pub async fn build(config: LinktrackConfig) -> anyhow::Result<Self> {
        let store = Arc::new(SqliteStore::new(&config.database.url).await?);
        debug!(url = %config.database.url, "database ready");
        let chats: Arc<dyn ChatRepository> = store.clone();
        let links: Arc<dyn LinkRepository> = store;

        let registry = ChatLinkRegistry::new(Arc::clone(&chats), Arc::clone(&links))
            .with_purge_on_remove(config.registry.purge_on_remove);

        let clients = &config.clients;
        let http = build_http_client(Duration::from_secs(clients.timeout_secs))?;

        let gateway: Arc<dyn NotificationGateway> = match &clients.bot_base_url {
            Some(url) => Arc::new(BotClient::new(http.clone(), url)),
            None => {
                warn!("no bot url configured, link updates will only be logged");
                Arc::new(LogOnlyGateway)
            },
        };
        let context = Arc::new(UpdateContext::new(chats, Arc::clone(&links), gateway));

        let github = GitHubClient::new(http.clone(), &clients.github_base_url)
            .with_token(clients.github_token.clone());
        let stackoverflow = StackOverflowClient::new(http, &clients.stackoverflow_base_url);
        let table = UpdaterTable::new(vec![
            LinkUpdater::github(Arc::new(github), Arc::clone(&context)),
            LinkUpdater::stackoverflow(Arc::new(stackoverflow), context),
        ])?;

        let orchestrator = Arc::new(
            UpdateOrchestrator::new(Arc::clone(&links), table)
                .with_batch_size(config.scheduler.batch_size)
                .with_concurrency(config.scheduler.concurrency),
        );

        Ok(Self {
            config,
            links,
            registry,
            orchestrator,
        })
    }

    pub fn scheduler(&self) -> Arc<UpdateScheduler> {
        UpdateScheduler::new(
            Arc::clone(&self.orchestrator),
            Arc::clone(&self.links),
            SchedulerConfig {
                interval: Duration::from_secs(self.config.scheduler.interval_secs),
                sweep_unused: self.config.scheduler.sweep_unused,
            },
        )
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, linktrack_common::ErrorKind, url::Url};

    async fn app(dir: &tempfile::TempDir) -> App {
        let mut config = LinktrackConfig::default();
        config.database.url = format!("sqlite://{}", dir.path().join("linktrack.db").display());
        App::build(config).await.unwrap()
    }

    #[tokio::test]
    async fn routes_both_supported_sites() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir).await;

        assert_eq!(app.orchestrator.table().domains(), vec![
            "github.com",
            "stackoverflow.com"
        ]);
    }

    #[tokio::test]
    async fn registry_state_survives_a_rebuild() {
        let dir = tempfile::tempdir().unwrap();
        let url = Url::parse("https://github.com/alice/repo").unwrap();
        {
            let app = app(&dir).await;
            app.registry.register_chat(100).await.unwrap();
            app.registry.add_link(100, &url).await.unwrap();
        }

        let app = app(&dir).await;
        let links = app.registry.get_links(100).await.unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].url, url);

        let err = app.registry.register_chat(100).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);
    }
}

//! One-shot batch operations and the long-running `serve` loop.

use {linktrack_scheduler::BatchReport, tokio_util::sync::CancellationToken, tracing::info};

use crate::app::App;

/// Run the scheduler until Ctrl-C.
pub async fn serve(app: &App) -> anyhow::Result<()> {
    let scheduler = app.scheduler();
    scheduler.start().await;
    info!(
        interval_secs = app.config.scheduler.interval_secs,
        batch_size = app.config.scheduler.batch_size,
        domains = ?app.orchestrator.table().domains(),
        "linktrack serving"
    );

    tokio::signal::ctrl_c().await?;
    info!("shutdown requested");
    scheduler.stop().await;
    Ok(())
}

/// Check the oldest batch of links once.
pub async fn check(app: &App) -> anyhow::Result<()> {
    let report = app.orchestrator.run_batch(&cancel_on_ctrl_c()).await?;
    print_report(&report)
}

/// Force-refresh every tracked link's checkpoint without notifying.
pub async fn resync(app: &App) -> anyhow::Result<()> {
    let report = app.orchestrator.resync_all(&cancel_on_ctrl_c()).await?;
    print_report(&report)
}

/// Purge links no chat tracks any more.
pub async fn sweep(app: &App) -> anyhow::Result<()> {
    let purged = app.links.remove_unused_links().await?;
    println!("Purged {purged} unused link(s)");
    Ok(())
}

/// A token cancelled by Ctrl-C, so a long batch stops at the next link.
fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let child = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            child.cancel();
        }
    });
    token
}

fn print_report(report: &BatchReport) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    eprintln!(
        "{} selected, {} changed, {} unchanged, {} resynced, {} unrouted, {} failed, {} cancelled",
        report.selected(),
        report.changed(),
        report.unchanged(),
        report.resynced(),
        report.route_not_found(),
        report.failed(),
        report.cancelled(),
    );
    Ok(())
}

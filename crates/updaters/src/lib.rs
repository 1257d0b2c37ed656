//! Link updaters: one variant per supported site.
//!
//! Each variant knows how to split its site's URLs into addressing tokens,
//! fetch the remote state through an injected client, and decide whether a
//! tracked link moved past its checkpoint. [`UpdaterTable`] routes a link to
//! its variant by domain.

pub mod context;
pub mod fetch;
pub mod gateway;
pub mod github;
pub mod stackoverflow;
pub mod table;
pub mod updater;

#[cfg(test)]
mod testing;

pub use {
    context::UpdateContext,
    fetch::{GitHubFetch, RemoteState, StackOverflowFetch},
    gateway::{LogOnlyGateway, NotificationGateway},
    table::UpdaterTable,
    updater::LinkUpdater,
};

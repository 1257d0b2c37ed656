//! Shared types, error definitions, and utilities used across all linktrack crates.

pub mod address;
pub mod error;
pub mod model;
pub mod sync;
pub mod time;

pub use {
    error::{Error, ErrorKind, Result},
    model::{Chat, ChatId, Link, LinkId, LinkUpdate},
};

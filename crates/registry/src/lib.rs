//! Chat registry: which chats exist and which links each of them tracks.

pub mod registry;

pub use registry::ChatLinkRegistry;

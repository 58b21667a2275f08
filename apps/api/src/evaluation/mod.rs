//! Essay evaluation against one or more school committees.

pub mod aggregator;
pub mod handlers;
pub mod models;
pub mod prompts;
pub mod requester;

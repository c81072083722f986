//! Data models: configuration, invoice drafts, and extracted AI data.

pub mod config;
pub mod extracted;
pub mod invoice;

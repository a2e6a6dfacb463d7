//! `emlvfs`: browse `.eml` email files as read-only virtual directories.
//!
//! This crate provides the core library: the EML parser, the parsed-email
//! cache, and the virtual filesystem adapter that serves an email's rendered
//! index document and attachments as files.

pub mod config;
pub mod error;
pub mod model;
pub mod parser;
pub mod store;
pub mod vfs;

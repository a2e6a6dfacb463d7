//! Core data model types for parsed emails, addresses, and attachments.

pub mod address;
pub mod attachment;
pub mod mail;

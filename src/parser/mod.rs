//! Email parsing: the EML container parser and HTML helpers.

pub mod eml;
pub mod html;

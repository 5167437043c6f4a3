//! Utility functions and helpers.

pub mod http;
pub mod xml;

pub use http::{HttpFetcher, RosterFetcher, roster_url};
pub use xml::XmlTreeParser;

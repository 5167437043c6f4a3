// src/models/mod.rs

//! Domain models for the roster service.
//!
//! This module contains the raw parser tree, the canonical documents the
//! normalizer produces, and the application configuration.

mod config;
mod document;
mod node;

// Re-export all public types
pub use config::{CacheConfig, CachePolicy, CollisionPolicy, Config, NormalizeConfig, RosterConfig};
pub use document::{
    Course, CourseListDocument, CrossListing, Document, IndexDocument, Instructor, Meeting, Note,
    Section, SubjectRef, Topic,
};
pub use node::{Fields, RawNode};

//! Storage for normalized roster documents.
//!
//! Documents live only in memory, keyed by (term, subject), and are shared
//! with callers as `Arc<Document>`. Invalidation is driven by the policy in
//! `[cache]`:
//!
//! ```text
//! whole-store  every period, drop everything
//! per-entry    an entry older than one period is refetched on read
//!              and dropped on the next sweep
//! ```

pub mod cache;

// Re-export for convenience
pub use cache::{CacheKey, RosterStore};

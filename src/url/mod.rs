//! URL handling module
//!
//! This module provides host extraction, allow-list domain matching, and the
//! canonicalization that defines when two URLs are the same frontier entry.

mod canonical;
mod domain;
mod matcher;

pub use canonical::{canonicalize, Canonicalizer, IGNORABLE_QUERY_KEYS};
pub use domain::extract_domain;
pub use matcher::matches_domain;

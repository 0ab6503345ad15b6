//! URL handling module for Sitelens
//!
//! Submitted URLs are normalized once at intake; the normalized form is what
//! gets stored for deduplication and display, while the analyzer fetches the
//! submitted URL as given, with only a missing scheme defaulted to `https`.

mod normalize;

pub use normalize::{normalize_url, with_default_scheme};

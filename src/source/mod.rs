// Platform source layer — typed read access to the content API.
//
// The ContentSource trait is the only thing the rest of the crate sees;
// HttpContentSource is the production implementation.

pub mod client;
pub mod rate_limit;
pub mod traits;

pub use client::HttpContentSource;
pub use traits::{ContentSource, PostMetrics, Profile, RawPost, ReferenceKind};

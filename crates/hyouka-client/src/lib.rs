//! # Hyouka Client
//!
//! HTTP collaborators for the hyouka pipeline: a paginated Jikan
//! (MyAnimeList v4) REST client and an AniList GraphQL client. Both
//! honor HTTP 429 with the server's `Retry-After` hint and surface an
//! exhausted retry budget as a terminal fetch error; the core pipeline
//! only ever sees fully collected record batches.

pub mod anilist;
pub mod error;
pub mod jikan;

// Re-export primary API
pub use anilist::AniListClient;
pub use error::{ClientError, Result};
pub use jikan::{JikanClient, SearchQuery};

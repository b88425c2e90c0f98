use banner_map_shared::BannerId;
use thiserror::Error;

/// Every failure the map engine can hit. None of them is fatal: each one
/// degrades to a visible, recoverable state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapError {
    /// Unusable user input such as a broken deep link. Recovered locally.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// An area query against the banner source failed.
    #[error("banner query failed: {0}")]
    QueryFailure(String),

    #[error("fetching banner {id} failed: {reason}")]
    DetailFetchFailure { id: BannerId, reason: String },

    #[error("HTTP client setup failed: {0}")]
    Client(String),
}

pub type Result<T> = std::result::Result<T, MapError>;

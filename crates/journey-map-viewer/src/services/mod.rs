//! External service clients
//!
//! The geocoding search endpoint and the routing engine are consumed
//! through narrow request/response contracts; only their shapes matter to
//! the orchestration core. Both clients share one `reqwest::Client`.
//! Failures never cross into view state as errors: the frame loop converts
//! them to "no update" outcomes.

mod geocoder;
mod router;

pub use geocoder::GeocodingClient;
pub use router::RoutingClient;

/// Transport-level errors for both clients.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("malformed response: {0}")]
    Decode(String),
}

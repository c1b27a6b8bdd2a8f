use crate::model::{Coordinate, CurrentConditions, Forecast};
use async_trait::async_trait;
use std::fmt::Debug;
use thiserror::Error;

pub mod openweather;

/// Soft failure from a weather query.
///
/// The monitor logs these and carries on with the tick ("no data"); they are
/// never fatal.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("provider returned status {status}: {body}")]
    Status { status: reqwest::StatusCode, body: String },

    #[error("failed to decode provider response: {0}")]
    Decode(#[from] serde_json::Error),
}

pub type FetchResult<T> = Result<T, FetchError>;

/// Read-only weather data source for a fixed coordinate.
///
/// Both queries are stateless and independently bounded by the transport
/// timeout; implementations do not cache or retry.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn current_conditions(&self, at: &Coordinate) -> FetchResult<CurrentConditions>;

    async fn forecast(&self, at: &Coordinate) -> FetchResult<Forecast>;
}

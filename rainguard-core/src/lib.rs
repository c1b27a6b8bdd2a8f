//! Core library for the `rainguard` irrigation monitor.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The OpenWeatherMap provider behind a `WeatherProvider` seam
//! - The rain-decision engine over a forecast look-ahead window
//! - The actuator notifier speaking the controller's serial protocol
//! - The monitor loop driving fetch -> decide -> notify on a cadence
//!
//! It is used by `rainguard-cli`, but can also be reused by other binaries or
//! services.

pub mod config;
pub mod decision;
pub mod model;
pub mod monitor;
pub mod notifier;
pub mod provider;

pub use config::Config;
pub use decision::analyze;
pub use model::{Coordinate, CurrentConditions, Forecast, ForecastPoint, RainDecision, Summary};
pub use monitor::{Monitor, MonitorState, TickOutcome};
pub use notifier::{ControllerLink, Dispatch, Notifier, SerialLink};
pub use provider::{FetchError, FetchResult, WeatherProvider, openweather::OpenWeatherProvider};

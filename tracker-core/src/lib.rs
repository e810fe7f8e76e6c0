//! Core library for the `weather-tracker` daemon.
//!
//! This crate defines:
//! - Configuration (API key, zip code schedule, storage location)
//! - The OpenWeatherMap fetcher behind the [`WeatherFetcher`] trait
//! - Normalization of provider payloads into [`WeatherRecord`]s
//! - File storage behind the [`RecordStore`] trait
//! - The polling [`Scheduler`] tying them together
//!
//! It is used by `weather-tracker`, but can also be embedded in other binaries or services.

pub mod config;
pub mod convert;
pub mod error;
pub mod fetch;
pub mod model;
pub mod normalize;
pub mod scheduler;
pub mod store;

pub use config::Config;
pub use error::{Error, Result};
pub use fetch::{WeatherFetcher, fetcher_from_config, openweather::OpenWeatherFetcher};
pub use model::{PayloadFormat, RawPayload, WeatherRecord};
pub use scheduler::{LocationSchedule, RunReport, Scheduler, TickReport};
pub use store::{FileStore, RecordStore};

use crate::{Config, RawPayload, error::Result, fetch::openweather::OpenWeatherFetcher};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod openweather;

/// Source of raw weather payloads, one request per call.
#[async_trait]
pub trait WeatherFetcher: Send + Sync + Debug {
    /// Fetch current weather for `zip`, returning `<zip>|<body>`.
    async fn fetch(&self, zip: &str) -> Result<RawPayload>;
}

/// Construct the OpenWeatherMap fetcher described by `config`.
pub fn fetcher_from_config(config: &Config) -> Result<OpenWeatherFetcher> {
    OpenWeatherFetcher::builder(config.api_key.clone())
        .endpoint(config.endpoint.clone())
        .country(config.country.clone())
        .timeout(config.request_timeout())
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetcher_from_config_uses_configured_endpoint() {
        let mut cfg = Config::default();
        cfg.set_api_key("KEY".into());
        cfg.endpoint = "http://127.0.0.1:1/weather".into();

        let fetcher = fetcher_from_config(&cfg).expect("client should build");
        assert_eq!(fetcher.endpoint(), "http://127.0.0.1:1/weather");
    }
}

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::{
    config::DEFAULT_ENDPOINT,
    error::{Error, Result},
    model::RawPayload,
};

use super::WeatherFetcher;

/// Length every zip must have before a request is attempted.
const ZIP_LEN: usize = 5;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Current-weather client for the OpenWeatherMap API.
#[derive(Debug, Clone)]
pub struct OpenWeatherFetcher {
    api_key: String,
    endpoint: String,
    country: String,
    http: Client,
}

#[derive(Debug)]
pub struct OpenWeatherFetcherBuilder {
    api_key: String,
    endpoint: String,
    country: String,
    timeout: Duration,
}

impl OpenWeatherFetcherBuilder {
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn country(mut self, country: impl Into<String>) -> Self {
        self.country = country.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<OpenWeatherFetcher> {
        let http = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| Error::NetworkFailure(format!("failed to build HTTP client: {e}")))?;

        Ok(OpenWeatherFetcher {
            api_key: self.api_key,
            endpoint: self.endpoint,
            country: self.country,
            http,
        })
    }
}

impl OpenWeatherFetcher {
    pub fn builder(api_key: String) -> OpenWeatherFetcherBuilder {
        OpenWeatherFetcherBuilder {
            api_key,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            country: "US".to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl WeatherFetcher for OpenWeatherFetcher {
    async fn fetch(&self, zip: &str) -> Result<RawPayload> {
        if zip.chars().count() != ZIP_LEN {
            return Err(Error::NetworkFailure(format!(
                "zip '{zip}' must be exactly {ZIP_LEN} characters"
            )));
        }

        let location = format!("{zip},{}", self.country);

        let res = self
            .http
            .get(&self.endpoint)
            .query(&[("appid", self.api_key.as_str()), ("zip", location.as_str())])
            .send()
            .await
            .map_err(|e| request_failure(zip, "request to OpenWeatherMap failed", e))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| request_failure(zip, "failed to read OpenWeatherMap response body", e))?;

        if !status.is_success() {
            return Err(Error::NetworkFailure(format!(
                "OpenWeatherMap request for {zip} failed with status {}: {}",
                status,
                truncate_body(&body),
            )));
        }

        tracing::debug!(zip, bytes = body.len(), "fetched current weather");

        Ok(RawPayload::compose(zip, &body))
    }
}

fn request_failure(zip: &str, what: &str, err: reqwest::Error) -> Error {
    let kind = if err.is_timeout() { " (timed out)" } else { "" };
    // The URL carries the api key.
    let err = err.without_url();
    Error::NetworkFailure(format!("{what} for {zip}{kind}: {err}"))
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
        sync::oneshot,
    };

    /// Serve one canned HTTP response and hand back the request head.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("accept");
            let mut buf = vec![0u8; 4096];
            let n = socket.read(&mut buf).await.expect("read");
            let _ = tx.send(String::from_utf8_lossy(&buf[..n]).into_owned());

            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.expect("write");
            socket.shutdown().await.ok();
        });

        (format!("http://{addr}/data/2.5/weather"), rx)
    }

    fn fetcher(endpoint: String) -> OpenWeatherFetcher {
        OpenWeatherFetcher::builder("SECRET".into())
            .endpoint(endpoint)
            .timeout(Duration::from_secs(5))
            .build()
            .expect("client")
    }

    #[tokio::test]
    async fn prefixes_body_with_zip() {
        let (endpoint, request) = serve_once("200 OK", r#"{"dt":1}"#).await;

        let raw = fetcher(endpoint).fetch("37931").await.expect("fetch should succeed");
        assert_eq!(raw.as_str(), r#"37931|{"dt":1}"#);

        let head = request.await.expect("request head");
        assert!(head.starts_with("GET /data/2.5/weather?"));
        assert!(head.contains("appid=SECRET"));
        assert!(head.contains("zip=37931%2CUS"));
    }

    #[tokio::test]
    async fn error_status_is_network_failure() {
        let (endpoint, _request) = serve_once("401 Unauthorized", r#"{"cod":401}"#).await;

        let err = fetcher(endpoint).fetch("37931").await.unwrap_err();
        assert!(matches!(err, Error::NetworkFailure(ref m) if m.contains("401")));
    }

    #[tokio::test]
    async fn malformed_zip_fails_without_request() {
        // Nothing listens on port 9; a request would fail with a different message.
        let fetcher = fetcher("http://127.0.0.1:9/weather".into());

        for zip in ["", "3793", "379311"] {
            let err = fetcher.fetch(zip).await.unwrap_err();
            assert!(matches!(err, Error::NetworkFailure(ref m) if m.contains("exactly 5")));
        }
    }

    #[tokio::test]
    async fn slow_upstream_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.expect("accept");
            tokio::time::sleep(Duration::from_secs(10)).await;
        });

        let fetcher = OpenWeatherFetcher::builder("SECRET".into())
            .endpoint(format!("http://{addr}/weather"))
            .timeout(Duration::from_millis(200))
            .build()
            .expect("client");

        let err = fetcher.fetch("37931").await.unwrap_err();
        assert!(matches!(err, Error::NetworkFailure(ref m) if m.contains("timed out")));
    }

    #[test]
    fn truncate_body_caps_long_bodies() {
        let long = "x".repeat(500);
        assert_eq!(truncate_body(&long).len(), 203);
        assert_eq!(truncate_body("short"), "short");
    }
}

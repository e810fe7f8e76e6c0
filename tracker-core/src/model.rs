use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// Separator between fields of a stored record, and between the zip code
/// and the response body of a [`RawPayload`].
pub const FIELD_SEPARATOR: char = '|';

/// Upstream response body prefixed with the zip code it was requested for.
///
/// OpenWeatherMap does not echo the zip code back, so the fetcher glues it
/// on the front: `<zip>|<body>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPayload(String);

impl RawPayload {
    pub fn compose(zip: &str, body: &str) -> Self {
        Self(format!("{zip}{FIELD_SEPARATOR}{body}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split into `(zip, body)` at the first separator.
    pub fn split(&self) -> Option<(&str, &str)> {
        self.0.split_once(FIELD_SEPARATOR)
    }
}

impl From<String> for RawPayload {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for RawPayload {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

/// Wire format of the upstream body. Only JSON is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadFormat {
    #[default]
    Json,
    Xml,
    Csv,
}

impl PayloadFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayloadFormat::Json => "json",
            PayloadFormat::Xml => "xml",
            PayloadFormat::Csv => "csv",
        }
    }
}

impl fmt::Display for PayloadFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One normalized weather observation for a zip code.
///
/// Field order here is the on-disk field order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    pub zip: String,
    /// Free text from the provider, e.g. "clear sky".
    pub conditions: String,
    /// Atmospheric pressure, hPa.
    pub pressure: i64,
    /// Degrees Fahrenheit.
    pub temperature: i64,
    /// One of the 16 compass labels.
    pub wind_direction: String,
    /// As reported by the provider (m/s with the default units).
    pub wind_speed: f64,
    /// Relative humidity, percent.
    pub humidity: i64,
    /// Observation time, Unix seconds UTC.
    pub timestamp: i64,
}

impl WeatherRecord {
    pub const FIELD_COUNT: usize = 8;

    /// Field values as text, in storage order.
    pub fn fields(&self) -> [String; Self::FIELD_COUNT] {
        [
            self.zip.clone(),
            self.conditions.clone(),
            self.pressure.to_string(),
            self.temperature.to_string(),
            self.wind_direction.clone(),
            self.wind_speed.to_string(),
            self.humidity.to_string(),
            self.timestamp.to_string(),
        ]
    }

    /// Pipe-joined, newline-terminated storage line.
    pub fn to_line(&self) -> String {
        let mut line = self.fields().join("|");
        line.push('\n');
        line
    }

    /// Check that [`to_line`](Self::to_line) would split back into exactly
    /// [`FIELD_COUNT`](Self::FIELD_COUNT) populated fields.
    pub fn validate(&self) -> Result<()> {
        if !is_zip(&self.zip) {
            return Err(Error::RecordShapeInvalid(format!(
                "zip '{}' is not 5 digits",
                self.zip
            )));
        }

        for (name, value) in [
            ("conditions", &self.conditions),
            ("wind_direction", &self.wind_direction),
        ] {
            if value.is_empty() {
                return Err(Error::RecordShapeInvalid(format!("{name} is empty")));
            }
            if value.contains([FIELD_SEPARATOR, '\n', '\r']) {
                return Err(Error::RecordShapeInvalid(format!(
                    "{name} '{value}' contains a separator or line break"
                )));
            }
        }

        if !self.wind_speed.is_finite() {
            return Err(Error::RecordShapeInvalid(format!(
                "wind_speed {} is not a finite number",
                self.wind_speed
            )));
        }

        Ok(())
    }

    /// Parse a storage line produced by [`to_line`](Self::to_line).
    pub fn from_line(line: &str) -> Result<Self> {
        let line = line.trim_end_matches(['\n', '\r']);
        let parts: Vec<&str> = line.split(FIELD_SEPARATOR).collect();

        if parts.len() != Self::FIELD_COUNT {
            return Err(Error::RecordShapeInvalid(format!(
                "expected {} fields, found {}: '{line}'",
                Self::FIELD_COUNT,
                parts.len()
            )));
        }

        let record = WeatherRecord {
            zip: parts[0].to_owned(),
            conditions: parts[1].to_owned(),
            pressure: number(parts[2], "pressure")?,
            temperature: number(parts[3], "temperature")?,
            wind_direction: parts[4].to_owned(),
            wind_speed: number(parts[5], "wind_speed")?,
            humidity: number(parts[6], "humidity")?,
            timestamp: number(parts[7], "timestamp")?,
        };
        record.validate()?;

        Ok(record)
    }

    pub fn observed_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.timestamp, 0)
    }
}

fn number<T: std::str::FromStr>(raw: &str, field: &str) -> Result<T> {
    raw.parse()
        .map_err(|_| Error::RecordShapeInvalid(format!("{field} '{raw}' is not a number")))
}

/// Five ASCII digits.
pub fn is_zip(value: &str) -> bool {
    value.len() == 5 && value.bytes().all(|b| b.is_ascii_digit())
}

//! Turns a [`RawPayload`] into a [`WeatherRecord`].

use serde::Deserialize;

use crate::{
    convert::{compass_direction, kelvin_to_fahrenheit},
    error::{Error, Result},
    model::{PayloadFormat, RawPayload, WeatherRecord},
};

/// Subset of the OpenWeatherMap "current weather" response we keep.
#[derive(Debug, Deserialize)]
struct OwCurrent {
    weather: Vec<OwWeather>,
    main: OwMain,
    wind: OwWind,
    dt: i64,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: Option<f64>,
    pressure: f64,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
    deg: Option<f64>,
}

pub fn parse(raw: &RawPayload, format: PayloadFormat) -> Result<WeatherRecord> {
    match format {
        PayloadFormat::Json => parse_json(raw),
        PayloadFormat::Xml | PayloadFormat::Csv => Err(Error::UnsupportedFormat(format!(
            "{format} payloads are not supported, use json"
        ))),
    }
}

fn parse_json(raw: &RawPayload) -> Result<WeatherRecord> {
    if raw.as_str().is_empty() {
        return Err(Error::MalformedResponse("payload is empty".into()));
    }

    let (zip, body) = raw
        .split()
        .ok_or_else(|| Error::MalformedResponse("payload has no zip/body separator".into()))?;

    if zip.is_empty() || body.trim().is_empty() {
        return Err(Error::MalformedResponse(format!(
            "payload for '{zip}' is missing its zip code or body"
        )));
    }

    let parsed: OwCurrent = serde_json::from_str(body)
        .map_err(|e| Error::MalformedResponse(format!("zip {zip}: {e}")))?;

    let conditions = parsed
        .weather
        .into_iter()
        .next()
        .map(|w| w.description)
        .ok_or_else(|| Error::MalformedResponse(format!("zip {zip}: weather list is empty")))?;

    let temperature = parsed
        .main
        .temp
        .and_then(kelvin_to_fahrenheit)
        .ok_or_else(|| missing(zip, "main.temp"))?;

    let wind_direction = parsed
        .wind
        .deg
        .and_then(compass_direction)
        .ok_or_else(|| missing(zip, "wind.deg"))?;

    Ok(WeatherRecord {
        zip: zip.to_owned(),
        conditions,
        pressure: parsed.main.pressure.round() as i64,
        temperature,
        wind_direction: wind_direction.to_owned(),
        wind_speed: parsed.wind.speed,
        humidity: parsed.main.humidity.round() as i64,
        timestamp: parsed.dt,
    })
}

fn missing(zip: &str, field: &str) -> Error {
    Error::MalformedResponse(format!("zip {zip}: missing or invalid field `{field}`"))
}

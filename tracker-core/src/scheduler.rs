//! Bounded tick loop driving fetch -> parse -> save for every due location.

use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, num::NonZeroU32, time::Duration};

use crate::{
    error::Result,
    fetch::WeatherFetcher,
    model::{PayloadFormat, WeatherRecord},
    normalize,
    store::RecordStore,
};

/// A location with interval `every` is due on `tick` when `every` divides it.
/// Tick 0 is due for everyone.
pub fn is_due(tick: u32, every: NonZeroU32) -> bool {
    tick % every.get() == 0
}

/// zip code -> retrieval interval in minutes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationSchedule(BTreeMap<String, NonZeroU32>);

impl LocationSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, zip: &str, every: NonZeroU32) -> Option<NonZeroU32> {
        self.0.insert(zip.to_owned(), every)
    }

    pub fn remove(&mut self, zip: &str) -> Option<NonZeroU32> {
        self.0.remove(zip)
    }

    pub fn interval(&self, zip: &str) -> Option<NonZeroU32> {
        self.0.get(zip).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn zips(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, NonZeroU32)> {
        self.0.iter().map(|(zip, every)| (zip.as_str(), *every))
    }

    /// Locations due on `tick`, in zip order.
    pub fn due_at(&self, tick: u32) -> impl Iterator<Item = &str> {
        self.iter()
            .filter(move |(_, every)| is_due(tick, *every))
            .map(|(zip, _)| zip)
    }
}

impl<S: Into<String>> FromIterator<(S, NonZeroU32)> for LocationSchedule {
    fn from_iter<I: IntoIterator<Item = (S, NonZeroU32)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(zip, every)| (zip.into(), every)).collect())
    }
}

/// Outcome counts for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub due: usize,
    pub saved: usize,
    pub failed: usize,
}

/// Outcome counts for a whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    pub ticks: u32,
    pub due: usize,
    pub saved: usize,
    pub failed: usize,
}

impl RunReport {
    fn add(&mut self, tick: TickReport) {
        self.ticks += 1;
        self.due += tick.due;
        self.saved += tick.saved;
        self.failed += tick.failed;
    }
}

/// Polls every location in a [`LocationSchedule`] on its own interval.
///
/// Locations are processed one at a time; a slow fetch delays the rest of
/// the tick. A failure for one location is logged and skipped, it never
/// ends the tick or the run.
#[derive(Debug)]
pub struct Scheduler<'a, F, S> {
    schedule: &'a LocationSchedule,
    fetcher: &'a F,
    store: &'a S,
    format: PayloadFormat,
    tick_interval: Duration,
}

impl<'a, F, S> Scheduler<'a, F, S>
where
    F: WeatherFetcher,
    S: RecordStore,
{
    pub fn new(schedule: &'a LocationSchedule, fetcher: &'a F, store: &'a S) -> Self {
        Self {
            schedule,
            fetcher,
            store,
            format: PayloadFormat::Json,
            tick_interval: Duration::from_secs(60),
        }
    }

    /// Sleep after each tick. One tick nominally stands for one minute.
    pub fn with_tick_interval(mut self, tick_interval: Duration) -> Self {
        self.tick_interval = tick_interval;
        self
    }

    pub fn with_format(mut self, format: PayloadFormat) -> Self {
        self.format = format;
        self
    }

    /// Run ticks `0..=duration_minutes`, that is `duration_minutes + 1` ticks,
    /// sleeping the tick interval after each one.
    pub async fn run(&self, duration_minutes: u32) -> RunReport {
        tracing::info!(
            locations = self.schedule.len(),
            duration_minutes,
            "starting weather tracker run"
        );

        let mut report = RunReport::default();
        for tick in 0..=duration_minutes {
            report.add(self.run_tick(tick).await);

            if !self.tick_interval.is_zero() {
                tokio::time::sleep(self.tick_interval).await;
            }
        }

        tracing::info!(
            ticks = report.ticks,
            saved = report.saved,
            failed = report.failed,
            "weather tracker run finished"
        );

        report
    }

    /// Process every location due on `tick`.
    pub async fn run_tick(&self, tick: u32) -> TickReport {
        tracing::debug!(tick, "tick");

        let mut report = TickReport::default();
        for zip in self.schedule.due_at(tick) {
            report.due += 1;

            match self.track(zip).await {
                Ok(record) => {
                    report.saved += 1;
                    tracing::info!(
                        tick,
                        zip,
                        conditions = %record.conditions,
                        temperature = record.temperature,
                        "recorded current weather"
                    );
                }
                Err(err) => {
                    report.failed += 1;
                    tracing::warn!(tick, zip, error = %err, "failed to record weather, skipping until next due tick");
                }
            }
        }

        report
    }

    /// Fetch, normalize and save one location.
    pub async fn track(&self, zip: &str) -> Result<WeatherRecord> {
        let raw = self.fetcher.fetch(zip).await?;
        let record = normalize::parse(&raw, self.format)?;
        self.store.save(&record)?;
        Ok(record)
    }
}

use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode, Text};
use std::{num::NonZeroU32, path::PathBuf};
use weather_tracker_core::{
    Config, FileStore, Scheduler, WeatherRecord, fetcher_from_config, model::is_zip,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-tracker", version, about = "Track current weather for a set of zip codes")]
pub struct Cli {
    /// Config file to use instead of the platform default.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Poll every configured zip code on its interval and store the results.
    Run {
        /// Last tick of the run, in minutes; overrides `duration_minutes`.
        #[arg(long)]
        duration: Option<u32>,
    },

    /// Fetch, normalize and store the current weather for one zip code now.
    Fetch {
        zip: String,
    },

    /// Print the latest stored record for a zip code.
    Show {
        zip: String,
    },

    /// Interactively set the API key and data directory.
    Configure,

    /// Add a zip code to the schedule, or change its interval.
    Track {
        zip: String,

        /// Retrieval interval in minutes.
        every: NonZeroU32,
    },

    /// Remove a zip code from the schedule.
    Untrack {
        zip: String,
    },

    /// Validate the config file and print the schedule.
    Check,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let path = match self.config {
            Some(path) => path,
            None => Config::config_file_path()?,
        };

        match self.command {
            Command::Run { duration } => {
                let cfg = Config::load_from(&path)?;
                let fetcher = fetcher_from_config(&cfg)?;
                let store = FileStore::open(&cfg.data_dir)?;
                tracing::info!(
                    config = %path.display(),
                    data_dir = %store.dir().display(),
                    "loaded configuration"
                );

                let report = Scheduler::new(&cfg.locations, &fetcher, &store)
                    .with_tick_interval(cfg.tick_interval())
                    .run(duration.unwrap_or(cfg.duration_minutes))
                    .await;

                println!(
                    "{} ticks, {} saved, {} failed",
                    report.ticks, report.saved, report.failed
                );
            }
            Command::Fetch { zip } => {
                let cfg = Config::load_from(&path)?;
                let fetcher = fetcher_from_config(&cfg)?;
                let store = FileStore::open(&cfg.data_dir)?;

                let record = Scheduler::new(&cfg.locations, &fetcher, &store)
                    .track(&zip)
                    .await
                    .with_context(|| format!("Failed to record current weather for {zip}"))?;

                print_record(&record);
            }
            Command::Show { zip } => {
                let cfg = Config::load_or_default(&path)?;
                let store = FileStore::open(&cfg.data_dir)?;

                let record = store.latest(&zip)?.ok_or_else(|| {
                    anyhow!(
                        "No record stored for {zip} in {}.\n\
                         Hint: run `weather-tracker fetch {zip}` first.",
                        store.dir().display()
                    )
                })?;

                print_record(&record);
            }
            Command::Configure => {
                let mut cfg = Config::load_or_default(&path)?;

                let api_key = Password::new("OpenWeatherMap API key:")
                    .with_display_mode(PasswordDisplayMode::Masked)
                    .without_confirmation()
                    .prompt()
                    .context("Failed to read API key")?;

                let data_dir = Text::new("Data directory:")
                    .with_default(&cfg.data_dir.display().to_string())
                    .prompt()
                    .context("Failed to read data directory")?;

                cfg.set_api_key(api_key.trim().to_string());
                cfg.data_dir = PathBuf::from(data_dir);
                cfg.save_to(&path)?;

                println!("Saved configuration to {}", path.display());
            }
            Command::Track { zip, every } => {
                if !is_zip(&zip) {
                    return Err(anyhow!("'{zip}' is not a 5 digit zip code"));
                }

                let mut cfg = Config::load_or_default(&path)?;
                match cfg.track(&zip, every) {
                    Some(old) => println!("{zip}: every {old} min -> every {every} min"),
                    None => println!("{zip}: every {every} min"),
                }
                cfg.save_to(&path)?;
            }
            Command::Untrack { zip } => {
                let mut cfg = Config::load_or_default(&path)?;
                if !cfg.untrack(&zip) {
                    return Err(anyhow!("{zip} is not being tracked"));
                }
                cfg.save_to(&path)?;
                println!("{zip}: no longer tracked");
            }
            Command::Check => {
                let cfg = Config::load_from(&path)?;

                println!("config:   {}", path.display());
                println!("data dir: {}", cfg.data_dir.display());
                println!("duration: {} min ({} ticks)", cfg.duration_minutes, cfg.duration_minutes + 1);
                for (zip, every) in cfg.locations.iter() {
                    println!("  {zip}  every {every} min");
                }
            }
        }

        Ok(())
    }
}

fn print_record(record: &WeatherRecord) {
    let observed = record
        .observed_at()
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| record.timestamp.to_string());

    println!("{} ({observed})", record.zip);
    println!("  conditions:  {}", record.conditions);
    println!("  temperature: {} °F", record.temperature);
    println!("  pressure:    {} hPa", record.pressure);
    println!("  humidity:    {}%", record.humidity);
    println!("  wind:        {} {}", record.wind_direction, record.wind_speed);
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_track_with_interval() {
        let cli = Cli::try_parse_from(["weather-tracker", "track", "37931", "15"]).expect("parses");
        match cli.command {
            Command::Track { zip, every } => {
                assert_eq!(zip, "37931");
                assert_eq!(every.get(), 15);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn rejects_zero_interval() {
        assert!(Cli::try_parse_from(["weather-tracker", "track", "37931", "0"]).is_err());
    }

    #[test]
    fn global_config_flag_after_subcommand() {
        let cli = Cli::try_parse_from(["weather-tracker", "run", "--duration", "5", "--config", "x.toml"])
            .expect("parses");
        assert_eq!(cli.config, Some(PathBuf::from("x.toml")));
        assert!(matches!(cli.command, Command::Run { duration: Some(5) }));
    }
}

//! Durable storage for weather records.
//!
//! The storage backend can be swapped (files, a database, object storage)
//! behind [`RecordStore`] without touching the scheduler.

use std::{
    fs::{self, File, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
};

use crate::{
    error::{Error, Result},
    model::WeatherRecord,
};

/// Shared append-only log, common to all locations.
pub const LOG_FILE_NAME: &str = "weatherlog.txt";

pub trait RecordStore: Send + Sync {
    /// Persist one record. Rejects records that fail
    /// [`WeatherRecord::validate`] before any write.
    fn save(&self, record: &WeatherRecord) -> Result<()>;
}

/// Plain-text store: `<dir>/<zip>.txt` holds the latest record for a zip,
/// `<dir>/weatherlog.txt` holds every record ever saved.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Use `dir` as the data directory, creating it if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| Error::io(&dir, e))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn location_path(&self, zip: &str) -> PathBuf {
        self.dir.join(format!("{zip}.txt"))
    }

    pub fn log_path(&self) -> PathBuf {
        self.dir.join(LOG_FILE_NAME)
    }

    /// Latest saved record for `zip`, if any.
    pub fn latest(&self, zip: &str) -> Result<Option<WeatherRecord>> {
        let path = self.location_path(zip);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::io(path, e)),
        };

        WeatherRecord::from_line(&contents).map(Some)
    }

    /// Every record in the shared log, oldest first.
    pub fn history(&self) -> Result<Vec<WeatherRecord>> {
        let path = self.log_path();
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::io(path, e)),
        };

        contents
            .lines()
            .filter(|line| !line.is_empty())
            .map(WeatherRecord::from_line)
            .collect()
    }

    fn append_to_log(&self, line: &str) -> Result<()> {
        let path = self.log_path();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| Error::io(&path, e))?;

        file.lock().map_err(|e| Error::io(&path, e))?;
        let written = write_line(&mut file, line);
        let unlocked = file.unlock();

        written.and(unlocked).map_err(|e| Error::io(&path, e))
    }
}

fn write_line(file: &mut File, line: &str) -> io::Result<()> {
    file.write_all(line.as_bytes())?;
    file.flush()
}

impl RecordStore for FileStore {
    fn save(&self, record: &WeatherRecord) -> Result<()> {
        record.validate()?;

        let line = record.to_line();

        let location = self.location_path(&record.zip);
        fs::write(&location, &line).map_err(|e| Error::io(&location, e))?;

        // No rollback: the location file keeps the new record if this fails.
        if let Err(err) = self.append_to_log(&line) {
            tracing::warn!(
                zip = %record.zip,
                error = %err,
                "location file updated but shared log append failed"
            );
            return Err(err);
        }

        tracing::debug!(zip = %record.zip, timestamp = record.timestamp, "saved weather record");

        Ok(())
    }
}

//! Weekly log rotation for the mirror's log file.
//!
//! The live file rolls over at the first write after local midnight on
//! Monday: `sync.log` is renamed to `sync.log.<YYYY-MM-DD>` (the Monday that
//! opened the closed week) and a fresh `sync.log` is started. Rotated files
//! are kept.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Datelike, Local, NaiveDate};
use tracing_subscriber::fmt::MakeWriter;

/// First day (Monday) of the week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let offset = i64::from(date.weekday().num_days_from_monday());
    date - chrono::Duration::days(offset)
}

/// Build the path a log covering the week starting `period_start` is
/// rotated to (e.g. `sync.log.2024-03-04`).
pub fn rotated_path(base: &Path, period_start: NaiveDate) -> PathBuf {
    let name = base
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("replica.log");
    base.with_file_name(format!("{name}.{}", period_start.format("%Y-%m-%d")))
}

fn rotate_file(path: &Path, period_start: NaiveDate) -> io::Result<()> {
    let target = rotated_path(path, period_start);
    match fs::remove_file(&target) {
        Ok(()) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => return Err(err),
    }
    fs::rename(path, target)
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// A log file that rotates itself on week boundaries.
#[derive(Debug)]
pub struct WeeklyRotatingFile {
    path: PathBuf,
    file: Option<File>,
    period_start: NaiveDate,
}

impl WeeklyRotatingFile {
    pub fn open(path: impl Into<PathBuf>) -> io::Result<Self> {
        Self::open_at(path, Local::now())
    }

    /// Open (or create) the log, treating `now` as the current time.
    ///
    /// An existing file last modified in an earlier week is rotated first.
    pub fn open_at(path: impl Into<PathBuf>, now: DateTime<Local>) -> io::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let current = week_start(now.date_naive());
        if let Ok(meta) = fs::metadata(&path) {
            let modified: DateTime<Local> = meta.modified()?.into();
            let written = week_start(modified.date_naive());
            if written < current {
                rotate_file(&path, written)?;
            }
        }

        let file = open_append(&path)?;
        Ok(Self {
            path,
            file: Some(file),
            period_start: current,
        })
    }

    /// Write `buf`, rolling the file over first if `now` falls in a later
    /// week than the one the live file was opened in.
    pub fn write_at(&mut self, now: DateTime<Local>, buf: &[u8]) -> io::Result<usize> {
        let current = week_start(now.date_naive());
        if current > self.period_start {
            self.rotate(current)?;
        }
        if self.file.is_none() {
            self.file = Some(open_append(&self.path)?);
        }
        match self.file.as_mut() {
            Some(file) => file.write(buf),
            None => Err(io::Error::other("log file is not open")),
        }
    }

    fn rotate(&mut self, new_start: NaiveDate) -> io::Result<()> {
        // Close before renaming so the rename also works where open files
        // cannot be moved.
        if let Some(mut file) = self.file.take() {
            file.flush()?;
        }
        rotate_file(&self.path, self.period_start)?;
        self.period_start = new_start;
        self.file = Some(open_append(&self.path)?);
        Ok(())
    }
}

impl Write for WeeklyRotatingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_at(Local::now(), buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

/// Shareable handle to a [`WeeklyRotatingFile`], usable as a
/// `tracing-subscriber` writer.
#[derive(Debug, Clone)]
pub struct LogFile {
    inner: Arc<Mutex<WeeklyRotatingFile>>,
}

impl LogFile {
    pub fn open(path: impl Into<PathBuf>) -> io::Result<Self> {
        Ok(Self {
            inner: Arc::new(Mutex::new(WeeklyRotatingFile::open(path)?)),
        })
    }
}

impl Write for LogFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner
            .lock()
            .map_err(|_| io::Error::other("log file lock poisoned"))?
            .write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner
            .lock()
            .map_err(|_| io::Error::other("log file lock poisoned"))?
            .flush()
    }
}

impl<'a> MakeWriter<'a> for LogFile {
    type Writer = LogFile;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

use chrono::NaiveDate;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;
use tracing_subscriber::{fmt, EnvFilter};

pub const LOG_FILE_PREFIX: &str = "clawx";
pub const LOG_FILTER_ENV: &str = "CLAWX_LOG";

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    #[error("failed to prepare log file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("a global logger is already installed")]
    AlreadyInitialized,
}

pub fn log_file_name(date: NaiveDate) -> String {
    format!("{LOG_FILE_PREFIX}-{}.log", date.format("%Y-%m-%d"))
}

pub fn current_log_file(log_dir: &Path) -> PathBuf {
    log_dir.join(log_file_name(today()))
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// Log file writer that moves on to a new dated file when the local date
/// changes, so a long session never appends to yesterday's log.
pub struct DailyLogFile {
    dir: PathBuf,
    current: Mutex<(NaiveDate, File)>,
}

impl DailyLogFile {
    pub fn open(dir: &Path) -> Result<Self, LoggerError> {
        Self::open_on(dir, today())
    }

    fn open_on(dir: &Path, date: NaiveDate) -> Result<Self, LoggerError> {
        let path = dir.join(log_file_name(date));
        let io_err = |source| LoggerError::Io {
            path: path.clone(),
            source,
        };
        std::fs::create_dir_all(dir).map_err(io_err)?;
        let file = open_append(&path).map_err(io_err)?;
        Ok(Self {
            dir: dir.to_path_buf(),
            current: Mutex::new((date, file)),
        })
    }

    fn lock(&self) -> MutexGuard<'_, (NaiveDate, File)> {
        self.current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn current_path(&self) -> PathBuf {
        self.dir.join(log_file_name(self.lock().0))
    }

    fn write_on(&self, buf: &[u8], date: NaiveDate) -> io::Result<usize> {
        let mut current = self.lock();
        if current.0 != date {
            let file = open_append(&self.dir.join(log_file_name(date)))?;
            *current = (date, file);
        }
        current.1.write(buf)
    }
}

impl Write for &DailyLogFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_on(buf, today())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.lock().1.flush()
    }
}

impl<'a> MakeWriter<'a> for DailyLogFile {
    type Writer = &'a DailyLogFile;

    fn make_writer(&'a self) -> Self::Writer {
        self
    }
}

/// Installs console + daily file logging. Returns today's file.
pub fn init(log_dir: &Path) -> Result<PathBuf, LoggerError> {
    let file = DailyLogFile::open(log_dir)?;
    let path = file.current_path();

    let filter = EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(fmt::layer().with_ansi(false).with_writer(file))
        .try_init()
        .map_err(|_| LoggerError::AlreadyInitialized)?;

    tracing::info!(path = %path.display(), "logging initialized");
    Ok(path)
}

/// Last `max_lines` lines of a log file; a missing file reads as empty.
pub async fn read_recent_lines(path: &Path, max_lines: usize) -> io::Result<Vec<String>> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let lines: Vec<&str> = content.lines().collect();
    let start = lines.len().saturating_sub(max_lines);
    Ok(lines[start..].iter().map(|l| l.to_string()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_file_name_uses_iso_date() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 9).unwrap();
        assert_eq!(log_file_name(date), "clawx-2026-03-09.log");
    }

    #[tokio::test]
    async fn read_recent_lines_returns_tail() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clawx-2026-01-01.log");
        std::fs::write(&path, "one\ntwo\nthree\nfour\n").unwrap();

        assert_eq!(read_recent_lines(&path, 2).await.unwrap(), vec!["three", "four"]);
        assert_eq!(read_recent_lines(&path, 10).await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn read_recent_lines_of_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let lines = read_recent_lines(&dir.path().join("absent.log"), 5).await.unwrap();
        assert!(lines.is_empty());
    }

    #[test]
    fn daily_file_rolls_over_when_the_date_changes() {
        let dir = tempfile::tempdir().unwrap();
        let day1 = NaiveDate::from_ymd_opt(2026, 5, 1).unwrap();
        let day2 = NaiveDate::from_ymd_opt(2026, 5, 2).unwrap();

        let file = DailyLogFile::open_on(dir.path(), day1).unwrap();
        file.write_on(b"first\n", day1).unwrap();
        file.write_on(b"second\n", day2).unwrap();
        file.write_on(b"third\n", day2).unwrap();

        let first = std::fs::read_to_string(dir.path().join("clawx-2026-05-01.log")).unwrap();
        let second = std::fs::read_to_string(dir.path().join("clawx-2026-05-02.log")).unwrap();
        assert_eq!(first, "first\n");
        assert_eq!(second, "second\nthird\n");
        assert_eq!(file.current_path(), dir.path().join("clawx-2026-05-02.log"));
    }

    #[test]
    fn reopening_the_same_day_appends() {
        let dir = tempfile::tempdir().unwrap();
        let day = NaiveDate::from_ymd_opt(2026, 5, 1).unwrap();

        DailyLogFile::open_on(dir.path(), day)
            .unwrap()
            .write_on(b"a\n", day)
            .unwrap();
        DailyLogFile::open_on(dir.path(), day)
            .unwrap()
            .write_on(b"b\n", day)
            .unwrap();

        let content = std::fs::read_to_string(dir.path().join("clawx-2026-05-01.log")).unwrap();
        assert_eq!(content, "a\nb\n");
    }
}

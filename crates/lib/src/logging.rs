//! Logger setup: env_logger on stderr, plus optional daily files.
//!
//! With a log directory, records from this application at debug level and above go to
//! `doctor-agent-YYYY-MM-DD.log`, and errors are also copied to `error-YYYY-MM-DD.log`.
//! Dependencies only reach the files at warn level and above. Files roll over at local midnight.

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

const APP_TARGET_PREFIX: &str = "doctor_";

/// Most verbose level written to the files for `target`.
fn file_level(target: &str) -> LevelFilter {
    if target.starts_with(APP_TARGET_PREFIX) {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    }
}

fn format_line(now: &DateTime<Local>, record: &Record) -> String {
    format!(
        "{} | {:<5} | {} | {}\n",
        now.format("%Y-%m-%d %H:%M:%S"),
        record.level(),
        record.target(),
        record.args()
    )
}

/// Files for one day.
struct DailyFiles {
    date: String,
    all: File,
    errors: File,
}

fn open_append(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// Forwards to env_logger and mirrors records into the daily files.
pub struct DailyFileLogger {
    console: env_logger::Logger,
    dir: PathBuf,
    files: Mutex<Option<DailyFiles>>,
}

impl DailyFileLogger {
    pub fn new(console: env_logger::Logger, dir: PathBuf) -> Self {
        Self {
            console,
            dir,
            files: Mutex::new(None),
        }
    }

    /// Append `record` to the files for the day of `now`, opening them if the day changed.
    fn write_at(&self, now: DateTime<Local>, record: &Record) {
        let date = now.format("%Y-%m-%d").to_string();
        let mut guard = self.files.lock().unwrap_or_else(|e| e.into_inner());
        if guard.as_ref().map(|f| f.date != date).unwrap_or(true) {
            let all = open_append(&self.dir.join(format!("doctor-agent-{}.log", date)));
            let errors = open_append(&self.dir.join(format!("error-{}.log", date)));
            match (all, errors) {
                (Ok(all), Ok(errors)) => *guard = Some(DailyFiles { date, all, errors }),
                (Err(e), _) | (_, Err(e)) => {
                    eprintln!("opening log files in {} failed: {}", self.dir.display(), e);
                    *guard = None;
                    return;
                }
            }
        }
        let Some(files) = guard.as_mut() else {
            return;
        };
        let line = format_line(&now, record);
        let _ = files.all.write_all(line.as_bytes());
        if record.level() == Level::Error {
            let _ = files.errors.write_all(line.as_bytes());
        }
    }
}

impl Log for DailyFileLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.console.enabled(metadata) || metadata.level() <= file_level(metadata.target())
    }

    fn log(&self, record: &Record) {
        if self.console.matches(record) {
            self.console.log(record);
        }
        if record.level() <= file_level(record.target()) {
            self.write_at(Local::now(), record);
        }
    }

    fn flush(&self) {
        self.console.flush();
        let mut guard = self.files.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(files) = guard.as_mut() {
            let _ = files.all.flush();
            let _ = files.errors.flush();
        }
    }
}

/// Install the global logger. The console filter comes from `RUST_LOG` (default `info`).
/// With `log_dir`, the directory is created and daily files are written as well.
pub fn init(log_dir: Option<&Path>) -> Result<()> {
    let console =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).build();
    let console_level = console.filter();
    match log_dir {
        None => {
            log::set_boxed_logger(Box::new(console))
                .map_err(|e| anyhow::anyhow!("installing logger: {}", e))?;
            log::set_max_level(console_level);
        }
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating log directory {}", dir.display()))?;
            let logger = DailyFileLogger::new(console, dir.to_path_buf());
            log::set_boxed_logger(Box::new(logger))
                .map_err(|e| anyhow::anyhow!("installing logger: {}", e))?;
            log::set_max_level(console_level.max(LevelFilter::Debug));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn quiet_logger(dir: &Path) -> DailyFileLogger {
        let console = env_logger::Builder::new().filter_level(LevelFilter::Off).build();
        DailyFileLogger::new(console, dir.to_path_buf())
    }

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("doctor-logs-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn read(dir: &Path, name: &str) -> String {
        std::fs::read_to_string(dir.join(name)).unwrap_or_default()
    }

    #[test]
    fn errors_go_to_both_files_debug_only_to_main() {
        let dir = temp_dir();
        let logger = quiet_logger(&dir);
        let day = Local.with_ymd_and_hms(2026, 3, 14, 9, 30, 0).unwrap();
        logger.write_at(
            day,
            &Record::builder()
                .level(Level::Debug)
                .target("doctor_lib::agent")
                .args(format_args!("thinking"))
                .build(),
        );
        logger.write_at(
            day,
            &Record::builder()
                .level(Level::Error)
                .target("doctor_lib::agent")
                .args(format_args!("provider failed"))
                .build(),
        );
        logger.flush();

        let all = read(&dir, "doctor-agent-2026-03-14.log");
        assert_eq!(all.lines().count(), 2);
        assert!(all.starts_with("2026-03-14 09:30:00 | DEBUG | doctor_lib::agent | thinking"));
        let errors = read(&dir, "error-2026-03-14.log");
        assert_eq!(errors.lines().count(), 1);
        assert!(errors.contains("ERROR | doctor_lib::agent | provider failed"));
        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn files_roll_over_by_day() {
        let dir = temp_dir();
        let logger = quiet_logger(&dir);
        for (day, msg) in [(1, "first"), (2, "second")] {
            logger.write_at(
                Local.with_ymd_and_hms(2026, 5, day, 23, 59, 0).unwrap(),
                &Record::builder()
                    .level(Level::Info)
                    .target("doctor_agent")
                    .args(format_args!("{}", msg))
                    .build(),
            );
        }
        logger.flush();
        assert!(read(&dir, "doctor-agent-2026-05-01.log").contains("first"));
        assert!(read(&dir, "doctor-agent-2026-05-02.log").contains("second"));
        assert!(!read(&dir, "doctor-agent-2026-05-02.log").contains("first"));
        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn dependency_debug_is_not_written() {
        assert_eq!(file_level("doctor_lib::gateway"), LevelFilter::Debug);
        assert_eq!(file_level("hyper::proto"), LevelFilter::Warn);
        let dir = temp_dir();
        let logger = quiet_logger(&dir);
        logger.log(
            &Record::builder()
                .level(Level::Debug)
                .target("hyper::proto")
                .args(format_args!("noise"))
                .build(),
        );
        logger.flush();
        let today = Local::now().format("%Y-%m-%d").to_string();
        assert!(read(&dir, &format!("doctor-agent-{}.log", today)).is_empty());
        std::fs::remove_dir_all(dir).ok();
    }
}

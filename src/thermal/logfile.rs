//! Tab-separated temperature log: one row per sample.

use chrono::{Datelike, NaiveDateTime, Timelike};
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use super::TemperatureReading;

/// Append-only log file. The file is opened per row so it is never held between samples.
pub struct TemperatureLog {
    path: PathBuf,
}

impl TemperatureLog {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, at: NaiveDateTime, readings: &[TemperatureReading]) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(format_row(at, readings).as_bytes())
    }
}

/// `year month day hour minute second t1 t2 ...` tab-separated, temperatures truncated to
/// whole degrees.
pub fn format_row(at: NaiveDateTime, readings: &[TemperatureReading]) -> String {
    let stamp = [
        i64::from(at.year()),
        i64::from(at.month()),
        i64::from(at.day()),
        i64::from(at.hour()),
        i64::from(at.minute()),
        i64::from(at.second()),
    ];
    let fields: Vec<String> = stamp
        .into_iter()
        .chain(readings.iter().map(|r| r.celsius.trunc() as i64))
        .map(|v| v.to_string())
        .collect();
    format!("{}\n", fields.join("\t"))
}

//! Logging configuration
//!
//! The subscriber itself is installed by the binary; this module only holds
//! the settings and the file housekeeping around them.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::OnceLock;
use tracing::level_filters::LevelFilter;

static SESSION_STAMP: OnceLock<String> = OnceLock::new();

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Level name (error, warn, info, debug, trace)
    pub level: String,
    /// Directory for log files
    pub log_dir: PathBuf,
    /// File name prefix
    pub file_prefix: String,
    /// Mirror logs to stderr
    pub console_output: bool,
    /// Write logs to a file
    pub file_output: bool,
    /// Number of log files to keep
    pub max_files: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_dir: PathBuf::from("logs"),
            file_prefix: "muchfun".to_string(),
            console_output: true,
            file_output: true,
            max_files: 10,
        }
    }
}

impl LogConfig {
    /// Parse the configured level, defaulting to INFO
    pub fn parse_level(&self) -> LevelFilter {
        self.level.parse().unwrap_or(LevelFilter::INFO)
    }

    pub fn ensure_log_directory(&self) -> io::Result<()> {
        fs::create_dir_all(&self.log_dir)
    }

    /// Path of this session's log file, e.g. `logs/muchfun_20260101_120000.log`
    pub fn current_log_path(&self) -> PathBuf {
        let stamp =
            SESSION_STAMP.get_or_init(|| chrono::Local::now().format("%Y%m%d_%H%M%S").to_string());
        self.log_dir
            .join(format!("{}_{}.log", self.file_prefix, stamp))
    }

    /// Create this session's log file, then trim the directory so that
    /// `max_files` includes the new file. A failed cleanup does not fail the
    /// file; its result is returned alongside.
    pub fn create_session_log(&self) -> io::Result<(fs::File, io::Result<usize>)> {
        self.ensure_log_directory()?;
        let file = fs::File::create(self.current_log_path())?;
        Ok((file, self.cleanup_old_logs()))
    }

    /// Remove the oldest log files beyond `max_files` (at least one is kept).
    /// Returns how many were removed.
    pub fn cleanup_old_logs(&self) -> io::Result<usize> {
        if !self.log_dir.exists() {
            return Ok(0);
        }

        let prefix = format!("{}_", self.file_prefix);
        let mut logs: Vec<PathBuf> = fs::read_dir(&self.log_dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.extension().is_some_and(|ext| ext == "log")
                    && path
                        .file_name()
                        .and_then(|n| n.to_str())
                        .is_some_and(|n| n.starts_with(&prefix))
            })
            .collect();

        let keep = self.max_files.max(1);
        if logs.len() <= keep {
            return Ok(0);
        }

        // Timestamped names sort chronologically
        logs.sort();
        let excess = logs.len() - keep;
        let mut removed = 0;
        for path in logs.into_iter().take(excess) {
            fs::remove_file(&path)?;
            removed += 1;
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        let mut config = LogConfig::default();
        assert_eq!(config.parse_level(), LevelFilter::INFO);
        config.level = "debug".to_string();
        assert_eq!(config.parse_level(), LevelFilter::DEBUG);
        config.level = "nonsense".to_string();
        assert_eq!(config.parse_level(), LevelFilter::INFO);
    }

    #[test]
    fn test_log_path_is_stable_within_session() {
        let config = LogConfig::default();
        let a = config.current_log_path();
        let b = config.current_log_path();
        assert_eq!(a, b);
        let name = a.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("muchfun_"));
        assert!(name.ends_with(".log"));
    }

    #[test]
    fn test_cleanup_keeps_newest() {
        let dir = tempfile::tempdir().unwrap();
        let config = LogConfig {
            log_dir: dir.path().to_path_buf(),
            max_files: 2,
            ..Default::default()
        };
        for stamp in ["20250101_000000", "20250102_000000", "20250103_000000"] {
            fs::write(dir.path().join(format!("muchfun_{}.log", stamp)), "x").unwrap();
        }
        fs::write(dir.path().join("other.txt"), "keep").unwrap();

        assert_eq!(config.cleanup_old_logs().unwrap(), 1);
        assert!(!dir.path().join("muchfun_20250101_000000.log").exists());
        assert!(dir.path().join("muchfun_20250103_000000.log").exists());
        assert!(dir.path().join("other.txt").exists());
    }

    #[test]
    fn test_session_log_counts_toward_limit() {
        let dir = tempfile::tempdir().unwrap();
        let config = LogConfig {
            log_dir: dir.path().join("logs"),
            max_files: 2,
            ..Default::default()
        };
        fs::create_dir_all(&config.log_dir).unwrap();
        for stamp in ["20250101_000000", "20250102_000000"] {
            fs::write(config.log_dir.join(format!("muchfun_{}.log", stamp)), "x").unwrap();
        }

        let (_file, removed) = config.create_session_log().unwrap();
        assert_eq!(removed.unwrap(), 1);

        let remaining = fs::read_dir(&config.log_dir).unwrap().count();
        assert_eq!(remaining, 2);
        assert!(config.current_log_path().exists());
        assert!(!config.log_dir.join("muchfun_20250101_000000.log").exists());
    }
}

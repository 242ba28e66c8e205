//! Runtime configuration.
//!
//! Everything is read once from the environment at startup and handed to
//! the components that need it; nothing in this crate reaches for a global.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Tunables and filesystem layout for the judge.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root of the on-disk layout (`db/`, `submissions/`, `problems/`).
    pub storage_root: PathBuf,
    /// Path to the isolate binary.
    pub isolate_path: PathBuf,
    /// Memory cap for judged programs, in kilobytes.
    pub box_memory_kb: u64,
    /// Process cap inside the box.
    pub box_processes: u32,
    /// Wall-clock ceiling for native compilation.
    pub compile_timeout: Duration,
    /// How long a scoreboard snapshot stays fresh.
    pub scoreboard_ttl_secs: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_root: PathBuf::from("storage"),
            isolate_path: PathBuf::from("isolate"),
            box_memory_kb: 256_000,
            box_processes: 10,
            compile_timeout: Duration::from_secs(10),
            scoreboard_ttl_secs: 30,
        }
    }
}

impl Config {
    /// Build a config from the environment, falling back to defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(root) = env::var("JUDGE_STORAGE_ROOT") {
            config.storage_root = PathBuf::from(root);
        }
        if let Ok(path) = env::var("JUDGE_ISOLATE_PATH") {
            config.isolate_path = PathBuf::from(path);
        }
        if let Ok(secs) = env::var("JUDGE_COMPILE_TIMEOUT_SECS") {
            if let Ok(secs) = secs.parse() {
                config.compile_timeout = Duration::from_secs(secs);
            }
        }
        if let Ok(secs) = env::var("JUDGE_SCOREBOARD_TTL_SECS") {
            if let Ok(secs) = secs.parse() {
                config.scoreboard_ttl_secs = secs;
            }
        }
        config
    }

    pub fn database_path(&self) -> PathBuf {
        self.storage_root.join("db").join("judge.sqlite")
    }

    pub fn submissions_dir(&self) -> PathBuf {
        self.storage_root.join("submissions")
    }

    pub fn problem_dir(&self, problem_id: i64) -> PathBuf {
        self.storage_root
            .join("problems")
            .join(problem_id.to_string())
    }

    pub fn tests_dir(&self, problem_id: i64) -> PathBuf {
        self.problem_dir(problem_id).join("tests")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout_lives_under_storage() {
        let config = Config::default();
        assert_eq!(
            config.database_path(),
            PathBuf::from("storage/db/judge.sqlite")
        );
        assert_eq!(config.submissions_dir(), PathBuf::from("storage/submissions"));
        assert_eq!(
            config.tests_dir(7),
            PathBuf::from("storage/problems/7/tests")
        );
    }

    #[test]
    fn default_limits_match_the_box_contract() {
        let config = Config::default();
        assert_eq!(config.box_memory_kb, 256_000);
        assert_eq!(config.box_processes, 10);
        assert_eq!(config.compile_timeout, Duration::from_secs(10));
        assert_eq!(config.scoreboard_ttl_secs, 30);
    }
}

//! Core of a competitive-programming judge: sandboxed execution, verdict
//! assignment, and ICPC scoring over an append-only submission log.
//!
//! The crate is organized around two subsystems. The judging side takes a
//! submission id from the [`queue`], compiles the source when its language
//! requires it, runs it in an isolate box per test case and writes exactly
//! one terminal [`verdict::Verdict`]. The scoring side ([`scoreboard`])
//! replays the submission log in id order into a cached ranking. Both share
//! one SQLite database ([`db`]) and one [`config::Config`], threaded
//! through a [`JudgeContext`].

pub mod comparator;
pub mod compiler;
pub mod config;
pub mod db;
pub mod intake;
pub mod languages;
pub mod queue;
pub mod sandbox;
pub mod scoreboard;
pub mod tasks;
pub mod verdict;
pub mod worker;

use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::languages::LanguageTable;

/// Shared handles threaded through the pipeline and tasks.
pub struct JudgeContext {
    pub db: SqlitePool,
    pub config: Config,
    pub languages: LanguageTable,
}

impl JudgeContext {
    /// Open the database and assemble the context. Database or migration
    /// failure here is fatal to the caller.
    pub async fn init(config: Config) -> Result<Self> {
        let db = db::connect(&config).await?;
        let languages = LanguageTable::builtin()?;
        Ok(Self {
            db,
            config,
            languages,
        })
    }

    /// Context over an existing pool; tests use in-memory databases.
    pub fn with_pool(db: SqlitePool, config: Config) -> Result<Self> {
        let languages = LanguageTable::builtin()?;
        Ok(Self {
            db,
            config,
            languages,
        })
    }
}

//! Orphan cleanup.
//!
//! Deletes source files under `storage/submissions/` whose id no longer has
//! a database row. Runs once at startup, before the worker takes jobs.

use anyhow::{Context, Result};
use tokio::fs;
use tracing::{info, warn};

use crate::db::submissions;
use crate::JudgeContext;

/// Scan the submissions directory and remove orphaned sources.
///
/// Returns how many files were deleted. A missing directory is not an
/// error; there is simply nothing to collect.
pub async fn sweep(ctx: &JudgeContext) -> Result<u64> {
    let dir = ctx.config.submissions_dir();
    let mut entries = match fs::read_dir(&dir).await {
        Ok(entries) => entries,
        Err(err) => {
            warn!(?dir, %err, "could not read submissions directory");
            return Ok(0);
        }
    };

    let mut deleted = 0u64;
    while let Some(entry) = entries
        .next_entry()
        .await
        .context("failed to scan submissions directory")?
    {
        if entry
            .file_type()
            .await
            .map(|t| t.is_dir())
            .unwrap_or(false)
        {
            continue;
        }
        let name = entry.file_name();
        if name.to_string_lossy() == ".keep" {
            continue;
        }

        // Files are named <submission id>.<ext>; anything else is left alone.
        let path = entry.path();
        let Some(id) = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .and_then(|stem| stem.parse::<i64>().ok())
        else {
            continue;
        };

        match submissions::exists(&ctx.db, id).await {
            Ok(true) => {}
            Ok(false) => {
                if fs::remove_file(&path).await.is_ok() {
                    info!(?path, "deleted orphaned source");
                    deleted += 1;
                }
            }
            Err(err) => warn!(id, %err, "could not check submission row"),
        }
    }

    info!(deleted, "reaper sweep complete");
    Ok(deleted)
}

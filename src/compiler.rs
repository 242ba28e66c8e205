//! Native compilation.
//!
//! Sources compile on the judge host with the language's fixed compiler
//! invocation, under a wall-clock ceiling so a pathological translation
//! unit cannot stall the queue. Diagnostics, spawn failures and timeouts
//! all read as a compile error for the submission.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::languages::Language;

/// Outcome of a compilation attempt.
#[derive(Debug)]
pub struct CompileResult {
    pub success: bool,
    /// Captured compiler diagnostics, when there were any.
    pub message: Option<String>,
}

/// Host-side build artifact, removed when judging ends.
pub struct CompiledArtifact(pub PathBuf);

impl Drop for CompiledArtifact {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}

/// Compile a native source to `output`.
pub async fn compile_native(
    language: &Language,
    source: &Path,
    output: &Path,
    wall_limit: Duration,
) -> CompileResult {
    let Language::Native { compiler, args, .. } = language else {
        return CompileResult {
            success: true,
            message: None,
        };
    };

    let mut command = Command::new(compiler);
    command
        .args(args)
        .arg(source)
        .arg("-o")
        .arg(output)
        .kill_on_drop(true);
    debug!(?command, "compiling");

    match timeout(wall_limit, command.output()).await {
        Ok(Ok(out)) if out.status.success() => CompileResult {
            success: true,
            message: None,
        },
        Ok(Ok(out)) => {
            let stderr = String::from_utf8_lossy(&out.stderr).into_owned();
            CompileResult {
                success: false,
                message: (!stderr.is_empty()).then_some(stderr),
            }
        }
        Ok(Err(err)) => {
            warn!(%err, "compiler could not be spawned");
            CompileResult {
                success: false,
                message: Some(err.to_string()),
            }
        }
        Err(_) => CompileResult {
            success: false,
            message: Some(format!(
                "compilation exceeded {} seconds",
                wall_limit.as_secs()
            )),
        },
    }
}

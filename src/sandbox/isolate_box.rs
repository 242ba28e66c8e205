//! Isolate box driver.
//!
//! One box per in-flight submission, addressed by `submission_id % 100`.
//! The driver prepares a fresh box, stages the program and its stdin,
//! enforces the resource limits and reports a [`RunOutcome`]. It does not
//! decide correctness.

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::config::Config;
use crate::languages::Language;
use crate::sandbox::meta::{outcome_from_meta, RunOutcome};

/// Boxes cycle within this range. The single-worker pipeline guarantees no
/// two in-flight submissions share an id modulo the range; a multi-worker
/// deployment must serialize per box id.
const BOX_ID_RANGE: i64 = 100;

/// One judged execution inside a box.
#[derive(Debug)]
pub struct RunSpec<'a> {
    /// Host path of the program (compiled binary or script source).
    pub program: &'a Path,
    pub language: &'a Language,
    /// Effective CPU time limit, already adjusted for the language.
    pub time_limit_ms: u64,
    /// Host file copied into the box as `std.in`, if any.
    pub stdin: Option<&'a Path>,
    /// Host path the box's `std.out` is copied back to, if any.
    pub stdout: Option<&'a Path>,
}

/// Allocate the submission's box and run the program in it.
pub async fn run_submission(
    config: &Config,
    submission_id: i64,
    spec: &RunSpec<'_>,
) -> Result<RunOutcome> {
    let isolate_box = IsolateBox::acquire(config, submission_id).await?;
    isolate_box.run(spec).await
}

pub struct IsolateBox<'a> {
    config: &'a Config,
    box_id: i64,
    /// Host directory programs are staged into (`<box root>/box`).
    work_dir: PathBuf,
}

impl<'a> IsolateBox<'a> {
    /// Claim and initialize the box assigned to a submission.
    ///
    /// Any leftover box with the same id is cleaned up first; cleaning a box
    /// that does not exist is a no-op.
    pub async fn acquire(config: &'a Config, submission_id: i64) -> Result<Self> {
        let box_id = submission_id.rem_euclid(BOX_ID_RANGE);

        let _ = Command::new(&config.isolate_path)
            .arg("--cleanup")
            .arg(format!("--box-id={}", box_id))
            .output()
            .await;

        let init = Command::new(&config.isolate_path)
            .arg("--init")
            .arg(format!("--box-id={}", box_id))
            .output()
            .await
            .context("failed to run isolate --init")?;
        if !init.status.success() {
            anyhow::bail!(
                "isolate --init failed for box {}: {}",
                box_id,
                String::from_utf8_lossy(&init.stderr).trim()
            );
        }

        let root = String::from_utf8(init.stdout)
            .context("isolate --init printed a non-UTF-8 box root")?;
        let work_dir = PathBuf::from(root.trim()).join("box");

        Ok(Self {
            config,
            box_id,
            work_dir,
        })
    }

    pub fn box_id(&self) -> i64 {
        self.box_id
    }

    fn meta_path(&self) -> PathBuf {
        PathBuf::from(format!("/tmp/isolate_meta_{}.txt", self.box_id))
    }

    /// Run one program under the box's resource limits.
    ///
    /// Staging failures are host errors and surface as `Err`; everything
    /// that happened to the program itself comes back as a [`RunOutcome`].
    pub async fn run(&self, spec: &RunSpec<'_>) -> Result<RunOutcome> {
        let staged = self.work_dir.join(spec.language.sandbox_filename());
        fs::copy(spec.program, &staged)
            .await
            .with_context(|| format!("failed to stage program into {:?}", staged))?;
        fs::set_permissions(&staged, std::fs::Permissions::from_mode(0o755))
            .await
            .context("failed to mark staged program executable")?;

        let meta_path = self.meta_path();
        let mut args = vec![
            format!("--box-id={}", self.box_id),
            format!("--meta={}", meta_path.display()),
            format!("--time={:.2}", spec.time_limit_ms as f64 / 1000.0),
            format!("--mem={}", self.config.box_memory_kb),
            format!("--processes={}", self.config.box_processes),
        ];
        for dir in spec.language.sandbox_dirs() {
            args.push(format!("--dir={}", dir));
        }
        for pair in spec.language.sandbox_env() {
            args.push(format!("--env={}", pair));
        }

        if let Some(stdin) = spec.stdin {
            fs::copy(stdin, self.work_dir.join("std.in"))
                .await
                .with_context(|| format!("failed to stage input {:?}", stdin))?;
            args.push("--stdin=std.in".to_string());
        }
        if spec.stdout.is_some() {
            args.push("--stdout=std.out".to_string());
        }

        args.push("--run".to_string());
        args.push("--".to_string());

        debug!(box_id = self.box_id, ?args, "invoking isolate");

        // The meta file, not the exit status, says how the program fared.
        let _ = Command::new(&self.config.isolate_path)
            .args(&args)
            .arg("/bin/sh")
            .arg("-c")
            .arg(spec.language.run_command())
            .output()
            .await
            .context("failed to spawn isolate")?;

        if let Some(host_out) = spec.stdout {
            // A program killed before producing output leaves nothing to
            // copy; the comparator then reports the missing file.
            if let Err(err) = fs::copy(self.work_dir.join("std.out"), host_out).await {
                warn!(box_id = self.box_id, %err, "could not copy std.out back to host");
            }
        }

        let outcome = match fs::read_to_string(&meta_path).await {
            Ok(content) => outcome_from_meta(&content),
            Err(err) => {
                warn!(box_id = self.box_id, %err, "meta file unreadable");
                RunOutcome::InternalError
            }
        };
        let _ = fs::remove_file(&meta_path).await;

        Ok(outcome)
    }
}

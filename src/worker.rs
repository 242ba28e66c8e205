//! The judging worker.
//!
//! A single long-lived task consumes submission ids from the queue and
//! drives each through the verdict pipeline: load, compile when the
//! language calls for it, then run and compare test by test, stopping at
//! the first failure. Exactly one terminal status is written per
//! submission, and judging stays strictly sequential so the box-id scheme
//! never collides.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::fs;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::comparator;
use crate::compiler::{self, CompiledArtifact};
use crate::db::submissions::{self, JudgeInfo};
use crate::sandbox::{self, RunOutcome, RunSpec};
use crate::verdict::Verdict;
use crate::JudgeContext;

/// Consume the queue until every sender is gone.
pub async fn run(ctx: Arc<JudgeContext>, mut queue: mpsc::Receiver<i64>) {
    info!("worker started; waiting for submissions");
    while let Some(submission_id) = queue.recv().await {
        info!(submission_id, "judging");
        judge_submission(&ctx, submission_id).await;
    }
    info!("submission queue closed; worker exiting");
}

/// Judge one submission and record its terminal verdict.
async fn judge_submission(ctx: &JudgeContext, submission_id: i64) {
    let info = match submissions::judge_info(&ctx.db, submission_id).await {
        Ok(info) => info,
        Err(err) => {
            // Leave the row PENDING; stragglers belong to the reaper.
            error!(submission_id, %err, "could not load submission");
            return;
        }
    };

    let verdict = evaluate(ctx, submission_id, &info).await;
    info!(submission_id, %verdict, "final verdict");

    match submissions::finalize(&ctx.db, submission_id, &verdict).await {
        Ok(true) => {}
        Ok(false) => error!(submission_id, "terminal verdict write matched no row"),
        Err(err) => error!(submission_id, %err, "failed to record verdict"),
    }
}

/// The pipeline proper: from source file to verdict.
async fn evaluate(ctx: &JudgeContext, submission_id: i64, info: &JudgeInfo) -> Verdict {
    let source = PathBuf::from(&info.file_path);
    let Some(language) = ctx.languages.for_source(&source) else {
        warn!(submission_id, path = %info.file_path, "no language for source");
        return Verdict::InternalError { test: None };
    };

    let time_limit_ms = info.time_limit.max(0) as u64 * language.time_multiplier();

    // Native sources compile to a sibling artifact that is removed on every
    // exit path; interpreted programs run straight from the source.
    let artifact;
    let program: &Path = if language.needs_compile() {
        let output = source.with_extension("bin");
        let compiled =
            compiler::compile_native(language, &source, &output, ctx.config.compile_timeout).await;
        if !compiled.success {
            if let Some(message) = compiled.message {
                debug!(submission_id, %message, "compilation failed");
            }
            return Verdict::CompileError;
        }
        artifact = CompiledArtifact(output);
        &artifact.0
    } else {
        &source
    };

    let tests = match enumerate_tests(&ctx.config.tests_dir(info.problem_id)).await {
        Ok(tests) => tests,
        Err(err) => {
            warn!(submission_id, %err, "could not enumerate tests");
            return Verdict::InternalError { test: None };
        }
    };

    if tests.is_empty() {
        // Blind mode: no reference tests, success is surviving the box.
        info!(submission_id, "no tests found; running blind");
        let spec = RunSpec {
            program,
            language,
            time_limit_ms,
            stdin: None,
            stdout: None,
        };
        return match sandbox::run_submission(&ctx.config, submission_id, &spec).await {
            Ok(RunOutcome::Ok) => Verdict::Accepted,
            Ok(outcome) => failure_verdict(outcome, None),
            Err(err) => {
                warn!(submission_id, %err, "sandbox fault in blind mode");
                Verdict::InternalError { test: None }
            }
        };
    }

    for (index, input) in tests.iter().enumerate() {
        let test_number = (index + 1) as u32;
        let expected = input.with_extension("out");
        let user_output = PathBuf::from(format!(
            "/tmp/sub_{}_test_{}.out",
            submission_id, test_number
        ));

        let spec = RunSpec {
            program,
            language,
            time_limit_ms,
            stdin: Some(input),
            stdout: Some(&user_output),
        };
        match sandbox::run_submission(&ctx.config, submission_id, &spec).await {
            Ok(RunOutcome::Ok) => {}
            Ok(outcome) => return failure_verdict(outcome, Some(test_number)),
            Err(err) => {
                warn!(submission_id, test = test_number, %err, "sandbox fault");
                return Verdict::InternalError { test: None };
            }
        }

        let matched = comparator::files_match(&user_output, &expected);
        let _ = fs::remove_file(&user_output).await;
        match matched {
            Ok(true) => {}
            Ok(false) => return Verdict::WrongAnswer { test: test_number },
            Err(err) => {
                // Usually a missing reference .out for an existing .in.
                warn!(submission_id, test = test_number, %err, "comparator could not read files");
                return Verdict::InternalError { test: None };
            }
        }
    }

    Verdict::Accepted
}

/// Map a failed sandbox outcome onto the user-visible verdict.
fn failure_verdict(outcome: RunOutcome, test: Option<u32>) -> Verdict {
    match outcome {
        RunOutcome::TimeLimitExceeded => Verdict::TimeLimitExceeded { test },
        RunOutcome::RuntimeError => Verdict::RuntimeError { test },
        RunOutcome::Ok | RunOutcome::InternalError => Verdict::InternalError { test },
    }
}

/// Input files for a problem, sorted so test numbering is deterministic.
///
/// A missing directory is an empty test set, which the pipeline judges in
/// blind mode.
async fn enumerate_tests(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err).context("failed to read test directory"),
    };

    let mut tests = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some("in") {
            tests.push(path);
        }
    }
    tests.sort();
    Ok(tests)
}

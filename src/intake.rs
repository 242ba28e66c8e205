//! Submission intake.
//!
//! The front door for new submissions: validate the upload, persist the row
//! and the source file, then hand the id to the judge queue. The order
//! matters. The row is inserted first so its id names the file on disk, and
//! every failure after the insert rolls both back.

use std::path::Path;

use thiserror::Error;
use tokio::fs;
use tracing::{error, warn};

use crate::db::submissions;
use crate::queue::QueueSender;
use crate::JudgeContext;

/// Largest accepted source: 1 MiB of code plus framing slack.
pub const MAX_SOURCE_BYTES: usize = 1024 * 1024 + 4096;

/// Lifetime submission cap per user.
pub const MAX_SUBMISSIONS_PER_USER: i64 = 100;

#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("only .cpp and .py sources are accepted")]
    UnsupportedExtension,
    #[error("source exceeds {MAX_SOURCE_BYTES} bytes")]
    SourceTooLarge,
    #[error("submission limit reached ({MAX_SUBMISSIONS_PER_USER})")]
    SubmissionCapReached,
    /// The judge cannot take more work right now; callers surface this as
    /// service-unavailable.
    #[error("judge queue rejected the submission")]
    QueueFull,
    #[error(transparent)]
    Database(#[from] anyhow::Error),
    #[error("failed to store source: {0}")]
    Storage(#[source] std::io::Error),
}

/// Accept a submission and queue it for judging.
///
/// Returns the assigned submission id. On success the row exists with
/// status `PENDING`, the source sits at `storage/submissions/<id>.<ext>`,
/// and the id is queued for the worker.
pub async fn submit(
    ctx: &JudgeContext,
    queue: &QueueSender,
    user_id: i64,
    problem_id: i64,
    file_name: &str,
    source: &[u8],
) -> Result<i64, IntakeError> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .filter(|ext| ctx.languages.get(ext).is_some())
        .ok_or(IntakeError::UnsupportedExtension)?;

    if source.len() > MAX_SOURCE_BYTES {
        return Err(IntakeError::SourceTooLarge);
    }

    if submissions::count_for_user(&ctx.db, user_id).await? >= MAX_SUBMISSIONS_PER_USER {
        return Err(IntakeError::SubmissionCapReached);
    }

    let submission_id = submissions::insert_pending(&ctx.db, user_id, problem_id).await?;

    let dir = ctx.config.submissions_dir();
    if let Err(err) = fs::create_dir_all(&dir).await {
        roll_back_row(ctx, submission_id).await;
        return Err(IntakeError::Storage(err));
    }
    let path = dir.join(format!("{}.{}", submission_id, extension));
    if let Err(err) = fs::write(&path, source).await {
        roll_back_row(ctx, submission_id).await;
        return Err(IntakeError::Storage(err));
    }

    let path_text = path.to_string_lossy().into_owned();
    if let Err(err) = submissions::set_file_path(&ctx.db, submission_id, &path_text).await {
        error!(submission_id, %err, "failed to link source path; rolling back");
        let _ = fs::remove_file(&path).await;
        roll_back_row(ctx, submission_id).await;
        return Err(IntakeError::Database(err));
    }

    if let Err(err) = queue.enqueue(submission_id) {
        warn!(submission_id, %err, "submission persisted but not queued");
        return Err(IntakeError::QueueFull);
    }

    Ok(submission_id)
}

async fn roll_back_row(ctx: &JudgeContext, submission_id: i64) {
    if let Err(err) = submissions::delete(&ctx.db, submission_id).await {
        error!(submission_id, %err, "rollback failed; the reaper will collect the file");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::db::test_pool;
    use crate::db::{problems, users};
    use crate::queue;

    async fn test_context(root: &Path) -> (JudgeContext, i64, i64) {
        let pool = test_pool().await;
        let user = users::create(&pool, "alice", "h", "Alice").await.unwrap();
        let problem = problems::create(&pool, "A", 1000, "a.pdf").await.unwrap();
        let config = Config {
            storage_root: root.to_path_buf(),
            ..Config::default()
        };
        let ctx = JudgeContext::with_pool(pool, config).unwrap();
        (ctx, user, problem)
    }

    #[tokio::test]
    async fn accepted_submission_is_persisted_and_queued() {
        let dir = tempfile::tempdir().unwrap();
        let (ctx, user, problem) = test_context(dir.path()).await;
        let (tx, mut rx) = queue::with_capacity(4);

        let id = submit(&ctx, &tx, user, problem, "solution.cpp", b"int main() {}\n")
            .await
            .unwrap();

        let stored = dir.path().join("submissions").join(format!("{}.cpp", id));
        assert_eq!(std::fs::read(&stored).unwrap(), b"int main() {}\n");
        assert_eq!(
            submissions::status(&ctx.db, id).await.unwrap(),
            "PENDING"
        );
        let info = submissions::judge_info(&ctx.db, id).await.unwrap();
        assert_eq!(info.file_path, stored.to_string_lossy());
        assert_eq!(rx.recv().await, Some(id));
    }

    #[tokio::test]
    async fn extension_decides_acceptance() {
        let dir = tempfile::tempdir().unwrap();
        let (ctx, user, problem) = test_context(dir.path()).await;
        let (tx, _rx) = queue::with_capacity(4);

        assert!(matches!(
            submit(&ctx, &tx, user, problem, "main.java", b"class M {}").await,
            Err(IntakeError::UnsupportedExtension)
        ));
        assert!(matches!(
            submit(&ctx, &tx, user, problem, "noext", b"x").await,
            Err(IntakeError::UnsupportedExtension)
        ));
        assert!(submit(&ctx, &tx, user, problem, "Main.PY", b"print(1)")
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn oversized_sources_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let (ctx, user, problem) = test_context(dir.path()).await;
        let (tx, _rx) = queue::with_capacity(4);

        let big = vec![b'x'; MAX_SOURCE_BYTES + 1];
        assert!(matches!(
            submit(&ctx, &tx, user, problem, "big.cpp", &big).await,
            Err(IntakeError::SourceTooLarge)
        ));
        assert_eq!(
            submissions::count_for_user(&ctx.db, user).await.unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn lifetime_cap_is_enforced() {
        let dir = tempfile::tempdir().unwrap();
        let (ctx, user, problem) = test_context(dir.path()).await;
        let (tx, _rx) = queue::with_capacity(4);

        for _ in 0..MAX_SUBMISSIONS_PER_USER {
            submissions::insert_pending(&ctx.db, user, problem)
                .await
                .unwrap();
        }
        assert!(matches!(
            submit(&ctx, &tx, user, problem, "late.cpp", b"int main() {}").await,
            Err(IntakeError::SubmissionCapReached)
        ));
    }

    #[tokio::test]
    async fn queue_overflow_leaves_the_row_pending() {
        let dir = tempfile::tempdir().unwrap();
        let (ctx, user, problem) = test_context(dir.path()).await;
        let (tx, _rx) = queue::with_capacity(1);

        let first = submit(&ctx, &tx, user, problem, "a.cpp", b"int main() {}")
            .await
            .unwrap();
        let second = submit(&ctx, &tx, user, problem, "b.cpp", b"int main() {}").await;
        assert!(matches!(second, Err(IntakeError::QueueFull)));

        // Both rows persisted; the second simply never reached the worker.
        assert_eq!(
            submissions::count_for_user(&ctx.db, user).await.unwrap(),
            2
        );
        assert_eq!(
            submissions::status(&ctx.db, first).await.unwrap(),
            "PENDING"
        );
    }
}

//! Submission rows.
//!
//! Intake inserts, the worker terminalizes, the scoreboard replays. Those
//! are the only three writers and readers of this table.

use anyhow::Result;
use sqlx::SqlitePool;

use crate::verdict::Verdict;

/// Everything the worker needs to judge one submission.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct JudgeInfo {
    pub file_path: String,
    /// Reference time limit of the target problem, in milliseconds.
    pub time_limit: i64,
    pub problem_id: i64,
}

/// One event of the scoreboard replay. Ascending id is chronological order.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ScoreEvent {
    pub user_id: i64,
    pub problem_id: i64,
    pub status: String,
    /// Whole minutes since the epoch at submission time.
    pub minutes: i64,
}

/// Insert a fresh `PENDING` row with no source path yet.
pub async fn insert_pending(pool: &SqlitePool, user_id: i64, problem_id: i64) -> Result<i64> {
    let result = sqlx::query(
        "INSERT INTO submissions (user_id, problem_id, status, file_path) \
         VALUES (?, ?, 'PENDING', '')",
    )
    .bind(user_id)
    .bind(problem_id)
    .execute(pool)
    .await?;
    Ok(result.last_insert_rowid())
}

/// Link the persisted source file to its row.
pub async fn set_file_path(pool: &SqlitePool, id: i64, path: &str) -> Result<()> {
    sqlx::query("UPDATE submissions SET file_path = ? WHERE id = ?")
        .bind(path)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Remove a row (intake rollback, nothing else).
pub async fn delete(pool: &SqlitePool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM submissions WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Fetch the judge view of a submission joined with its problem.
pub async fn judge_info(pool: &SqlitePool, id: i64) -> Result<JudgeInfo> {
    Ok(sqlx::query_as::<_, JudgeInfo>(
        "SELECT s.file_path, p.time_limit, p.id AS problem_id \
         FROM submissions s \
         JOIN problems p ON s.problem_id = p.id \
         WHERE s.id = ?",
    )
    .bind(id)
    .fetch_one(pool)
    .await?)
}

/// Write the terminal verdict. Returns whether a row was updated.
pub async fn finalize(pool: &SqlitePool, id: i64, verdict: &Verdict) -> Result<bool> {
    let result = sqlx::query("UPDATE submissions SET status = ? WHERE id = ?")
        .bind(verdict.to_string())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn status(pool: &SqlitePool, id: i64) -> Result<String> {
    Ok(
        sqlx::query_scalar("SELECT status FROM submissions WHERE id = ?")
            .bind(id)
            .fetch_one(pool)
            .await?,
    )
}

/// Lifetime submission count for a user, regardless of status.
pub async fn count_for_user(pool: &SqlitePool, user_id: i64) -> Result<i64> {
    Ok(
        sqlx::query_scalar("SELECT COUNT(*) FROM submissions WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(pool)
            .await?,
    )
}

pub async fn exists(pool: &SqlitePool, id: i64) -> Result<bool> {
    Ok(
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM submissions WHERE id = ?)")
            .bind(id)
            .fetch_one(pool)
            .await?,
    )
}

/// The full submission log in replay order for the scoreboard.
pub async fn score_events(pool: &SqlitePool) -> Result<Vec<ScoreEvent>> {
    Ok(sqlx::query_as::<_, ScoreEvent>(
        "SELECT user_id, problem_id, status, \
         CAST(strftime('%s', created_at) AS INTEGER) / 60 AS minutes \
         FROM submissions ORDER BY id ASC",
    )
    .fetch_all(pool)
    .await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{problems, test_pool, users};

    async fn seeded() -> (SqlitePool, i64, i64) {
        let pool = test_pool().await;
        let user = users::create(&pool, "alice", "h", "Alice").await.unwrap();
        let problem = problems::create(&pool, "A", 1000, "a.pdf").await.unwrap();
        (pool, user, problem)
    }

    #[tokio::test]
    async fn lifecycle_pending_to_terminal() {
        let (pool, user, problem) = seeded().await;
        let id = insert_pending(&pool, user, problem).await.unwrap();
        assert_eq!(status(&pool, id).await.unwrap(), "PENDING");

        set_file_path(&pool, id, "storage/submissions/1.cpp")
            .await
            .unwrap();
        let info = judge_info(&pool, id).await.unwrap();
        assert_eq!(info.file_path, "storage/submissions/1.cpp");
        assert_eq!(info.time_limit, 1000);
        assert_eq!(info.problem_id, problem);

        let updated = finalize(&pool, id, &Verdict::WrongAnswer { test: 2 })
            .await
            .unwrap();
        assert!(updated);
        assert_eq!(status(&pool, id).await.unwrap(), "WA on test 2");
    }

    #[tokio::test]
    async fn finalize_reports_missing_rows() {
        let (pool, _, _) = seeded().await;
        let updated = finalize(&pool, 999, &Verdict::Accepted).await.unwrap();
        assert!(!updated);
    }

    #[tokio::test]
    async fn count_and_exists_track_rows() {
        let (pool, user, problem) = seeded().await;
        assert_eq!(count_for_user(&pool, user).await.unwrap(), 0);
        let id = insert_pending(&pool, user, problem).await.unwrap();
        assert_eq!(count_for_user(&pool, user).await.unwrap(), 1);
        assert!(exists(&pool, id).await.unwrap());

        delete(&pool, id).await.unwrap();
        assert!(!exists(&pool, id).await.unwrap());
        assert_eq!(count_for_user(&pool, user).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn score_events_come_back_in_id_order() {
        let (pool, user, problem) = seeded().await;
        for _ in 0..3 {
            insert_pending(&pool, user, problem).await.unwrap();
        }
        let events = score_events(&pool).await.unwrap();
        assert_eq!(events.len(), 3);
        assert!(events.iter().all(|e| e.user_id == user));
        assert!(events.iter().all(|e| e.status == "PENDING"));
    }
}

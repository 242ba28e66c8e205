//! Problem rows.

use anyhow::Result;
use sqlx::SqlitePool;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Problem {
    pub id: i64,
    pub letter_code: String,
    /// Reference time limit in milliseconds, for native submissions.
    pub time_limit: i64,
    pub pdf_path: String,
}

/// Insert a problem and return the assigned id.
pub async fn create(
    pool: &SqlitePool,
    letter_code: &str,
    time_limit_ms: i64,
    pdf_path: &str,
) -> Result<i64> {
    let result = sqlx::query(
        "INSERT INTO problems (letter_code, time_limit, pdf_path) VALUES (?, ?, ?)",
    )
    .bind(letter_code)
    .bind(time_limit_ms)
    .bind(pdf_path)
    .execute(pool)
    .await?;
    Ok(result.last_insert_rowid())
}

/// Every problem, in scoreboard column order.
pub async fn list_by_letter(pool: &SqlitePool) -> Result<Vec<Problem>> {
    Ok(sqlx::query_as::<_, Problem>(
        "SELECT id, letter_code, time_limit, pdf_path FROM problems ORDER BY letter_code",
    )
    .fetch_all(pool)
    .await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    #[tokio::test]
    async fn problems_list_in_letter_order() {
        let pool = test_pool().await;
        create(&pool, "C", 2000, "c.pdf").await.unwrap();
        create(&pool, "A", 1000, "a.pdf").await.unwrap();
        create(&pool, "B", 1500, "b.pdf").await.unwrap();

        let letters: Vec<String> = list_by_letter(&pool)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.letter_code)
            .collect();
        assert_eq!(letters, ["A", "B", "C"]);
    }
}

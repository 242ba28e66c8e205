//! User rows.

use anyhow::Result;
use sqlx::SqlitePool;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub display_name: String,
}

/// Insert a user and return the assigned id.
pub async fn create(
    pool: &SqlitePool,
    username: &str,
    password_hash: &str,
    display_name: &str,
) -> Result<i64> {
    let result = sqlx::query(
        "INSERT INTO users (username, password_hash, display_name) VALUES (?, ?, ?)",
    )
    .bind(username)
    .bind(password_hash)
    .bind(display_name)
    .execute(pool)
    .await?;
    Ok(result.last_insert_rowid())
}

/// Every user, for scoreboard row allocation.
pub async fn list(pool: &SqlitePool) -> Result<Vec<User>> {
    Ok(
        sqlx::query_as::<_, User>("SELECT id, username, display_name FROM users")
            .fetch_all(pool)
            .await?,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    #[tokio::test]
    async fn usernames_are_unique() {
        let pool = test_pool().await;
        create(&pool, "alice", "h", "Alice").await.unwrap();
        assert!(create(&pool, "alice", "h", "Alice Again").await.is_err());
    }

    #[tokio::test]
    async fn listed_users_carry_display_names() {
        let pool = test_pool().await;
        let id = create(&pool, "bob", "h", "Bob the Builder").await.unwrap();
        let users = list(&pool).await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].id, id);
        assert_eq!(users[0].display_name, "Bob the Builder");
    }
}

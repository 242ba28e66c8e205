//! Operator commands.
//!
//! These run from the CLI against the live database: account creation with
//! generated credentials, session invalidation, and the factory wipe that
//! resets a contest while keeping its problem set.

use anyhow::{Context, Result};
use argon2::password_hash::{rand_core::OsRng, PasswordHasher, SaltString};
use argon2::Argon2;
use rand::Rng;
use tokio::fs;
use tracing::{info, warn};

use crate::db::users;
use crate::JudgeContext;

/// Freshly generated credentials, shown once at creation time. The database
/// only ever sees the hash.
#[derive(Debug)]
pub struct NewAccount {
    pub user_id: i64,
    pub username: String,
    pub password: String,
}

/// Create a user with random credentials.
pub async fn add_user(ctx: &JudgeContext) -> Result<NewAccount> {
    let username = format!("user_{}", random_hex(6));
    let password = random_hex(6);

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| anyhow::anyhow!("password hashing failed: {err}"))?
        .to_string();

    // Display name defaults to the login handle.
    let user_id = users::create(&ctx.db, &username, &password_hash, &username).await?;
    info!(user_id, username, "created user");

    Ok(NewAccount {
        user_id,
        username,
        password,
    })
}

fn random_hex(len: usize) -> String {
    const HEX: &[u8] = b"0123456789abcdef";
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| HEX[rng.gen_range(0..HEX.len())] as char)
        .collect()
}

/// Drop every session token.
pub async fn flush_sessions(ctx: &JudgeContext) -> Result<u64> {
    let result = sqlx::query("DELETE FROM sessions")
        .execute(&ctx.db)
        .await
        .context("failed to flush sessions")?;
    info!(flushed = result.rows_affected(), "sessions flushed");
    Ok(result.rows_affected())
}

/// Factory wipe: submission files first, then submissions, sessions and
/// users. Problems survive, so the contest resets with its problem set.
pub async fn wipe_all(ctx: &JudgeContext) -> Result<()> {
    let dir = ctx.config.submissions_dir();
    let mut entries = fs::read_dir(&dir)
        .await
        .with_context(|| format!("could not read {:?}", dir))?;

    let mut removed = 0u64;
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_name().to_string_lossy() == ".keep" {
            continue;
        }
        match fs::remove_file(entry.path()).await {
            Ok(()) => removed += 1,
            Err(err) => warn!(path = ?entry.path(), %err, "could not delete file"),
        }
    }
    info!(removed, "submission files deleted");

    for statement in [
        "DELETE FROM submissions",
        "DELETE FROM sessions",
        "DELETE FROM users",
        "VACUUM",
    ] {
        sqlx::query(statement)
            .execute(&ctx.db)
            .await
            .with_context(|| format!("wipe failed at {:?}", statement))?;
    }
    info!("factory wipe complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use argon2::password_hash::{PasswordHash, PasswordVerifier};

    use crate::config::Config;
    use crate::db::{problems, submissions, test_pool};

    fn context_with(pool: sqlx::SqlitePool, root: &std::path::Path) -> JudgeContext {
        let config = Config {
            storage_root: root.to_path_buf(),
            ..Config::default()
        };
        JudgeContext::with_pool(pool, config).unwrap()
    }

    #[test]
    fn random_hex_is_lowercase_hex() {
        let value = random_hex(12);
        assert_eq!(value.len(), 12);
        assert!(value.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[tokio::test]
    async fn new_accounts_verify_against_their_hash() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context_with(test_pool().await, dir.path());

        let account = add_user(&ctx).await.unwrap();
        assert!(account.username.starts_with("user_"));

        let stored: String =
            sqlx::query_scalar("SELECT password_hash FROM users WHERE id = ?")
                .bind(account.user_id)
                .fetch_one(&ctx.db)
                .await
                .unwrap();
        let parsed = PasswordHash::new(&stored).unwrap();
        assert!(Argon2::default()
            .verify_password(account.password.as_bytes(), &parsed)
            .is_ok());
    }

    #[tokio::test]
    async fn wipe_clears_state_but_keeps_problems() {
        let dir = tempfile::tempdir().unwrap();
        let pool = test_pool().await;
        let ctx = context_with(pool, dir.path());

        let account = add_user(&ctx).await.unwrap();
        let problem = problems::create(&ctx.db, "A", 1000, "a.pdf").await.unwrap();
        let submission = submissions::insert_pending(&ctx.db, account.user_id, problem)
            .await
            .unwrap();

        let submissions_dir = ctx.config.submissions_dir();
        std::fs::create_dir_all(&submissions_dir).unwrap();
        let source = submissions_dir.join(format!("{}.cpp", submission));
        let keep = submissions_dir.join(".keep");
        std::fs::write(&source, b"x").unwrap();
        std::fs::write(&keep, b"").unwrap();

        wipe_all(&ctx).await.unwrap();

        assert!(!source.exists());
        assert!(keep.exists());
        let users_left: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&ctx.db)
            .await
            .unwrap();
        assert_eq!(users_left, 0);
        let problems_left: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM problems")
            .fetch_one(&ctx.db)
            .await
            .unwrap();
        assert_eq!(problems_left, 1);
        assert!(!submissions::exists(&ctx.db, submission).await.unwrap());
    }
}

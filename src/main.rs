//! Judge daemon and operator CLI.

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use arbiter::config::Config;
use arbiter::scoreboard::ScoreboardCache;
use arbiter::{queue, tasks, worker, JudgeContext};

#[derive(Parser)]
#[command(name = "arbiter")]
#[command(about = "Competitive-programming judge core")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the judge worker (default).
    Serve,
    /// Print the current scoreboard.
    Standings,
    /// Create a user with generated credentials.
    AddUser,
    /// Invalidate every active session.
    FlushSessions,
    /// Delete all users, sessions and submissions. Problems survive.
    Wipe,
    /// Generate reference tests for a problem.
    Bake {
        problem_id: i64,
        seed: i64,
        count: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("arbiter=info".parse()?))
        .init();

    dotenvy::dotenv().ok();

    let config = Config::from_env();
    let ctx = Arc::new(JudgeContext::init(config).await?);

    match Cli::parse().command.unwrap_or(Command::Serve) {
        Command::Serve => serve(ctx).await,
        Command::Standings => standings(&ctx).await,
        Command::AddUser => {
            let account = tasks::admin::add_user(&ctx).await?;
            println!("========================================");
            println!("       NEW USER ACCOUNT CREATED");
            println!("========================================");
            println!(" Username : {}", account.username);
            println!(" Password : {}", account.password);
            println!("========================================");
            Ok(())
        }
        Command::FlushSessions => {
            tasks::admin::flush_sessions(&ctx).await?;
            Ok(())
        }
        Command::Wipe => tasks::admin::wipe_all(&ctx).await,
        Command::Bake {
            problem_id,
            seed,
            count,
        } => tasks::bake::bake_tests(&ctx.config, problem_id, seed, count).await,
    }
}

/// Run the long-lived judging worker.
///
/// The sender half is what an embedding submission front end hands to
/// [`arbiter::intake::submit`]; the daemon itself only consumes.
async fn serve(ctx: Arc<JudgeContext>) -> Result<()> {
    tasks::reaper::sweep(&ctx).await?;

    let (_queue_tx, queue_rx) = queue::submission_queue();
    info!("judge ready");
    worker::run(ctx, queue_rx).await;
    Ok(())
}

/// Print the scoreboard in ICPC notation: `+k` solved after k wrong tries,
/// `-k` unsolved with k tries, `?` pending, `.` untouched.
async fn standings(ctx: &JudgeContext) -> Result<()> {
    let cache = ScoreboardCache::with_ttl(
        ctx.db.clone(),
        chrono::Duration::seconds(ctx.config.scoreboard_ttl_secs),
    );
    let board = cache.get().await?;

    let letters: Vec<&str> = board.problems.iter().map(|p| p.letter.as_str()).collect();
    println!(
        "{:<5} {:<20} {:>6} {:>8}  {}",
        "Rank",
        "User",
        "Solved",
        "Penalty",
        letters.join("  ")
    );
    for row in &board.rows {
        let cells: Vec<String> = board
            .problems
            .iter()
            .map(|p| {
                let cell = &row.cells[&p.letter];
                if cell.solved {
                    if cell.attempts == 0 {
                        "+".to_string()
                    } else {
                        format!("+{}", cell.attempts)
                    }
                } else if cell.pending {
                    "?".to_string()
                } else if cell.attempts > 0 {
                    format!("-{}", cell.attempts)
                } else {
                    ".".to_string()
                }
            })
            .collect();
        println!(
            "{:<5} {:<20} {:>6} {:>8}  {}",
            row.rank,
            row.display_name,
            row.solved,
            row.penalty,
            cells.join("  ")
        );
    }
    Ok(())
}

//! ICPC scoreboard.
//!
//! The scoreboard is derived state: a chronological replay of the
//! submission log into a per-user, per-problem grid. Snapshots are cached
//! for a short TTL behind a read/write lock, and regeneration happens at
//! most once per expiry, under the write lock.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use tokio::sync::RwLock;
use tracing::debug;

use crate::db::{problems, submissions, users};
use crate::verdict::Verdict;

/// Penalty charged per wrong attempt on a solved problem, in minutes.
const WRONG_ATTEMPT_PENALTY: i64 = 20;

/// Default snapshot lifetime.
pub const DEFAULT_TTL_SECS: i64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProblemColumn {
    pub id: i64,
    pub letter: String,
}

/// One user's state on one problem.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Cell {
    pub solved: bool,
    /// Penalty-bearing wrong tries before the first AC.
    pub attempts: i64,
    /// Minute of the accepted submission, empty while unsolved.
    pub time: String,
    pub pending: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankRow {
    pub rank: usize,
    pub display_name: String,
    pub solved: i64,
    pub penalty: i64,
    pub cells: HashMap<String, Cell>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Scoreboard {
    pub problems: Vec<ProblemColumn>,
    pub rows: Vec<RankRow>,
    pub generated_at: DateTime<Utc>,
}

/// TTL-cached scoreboard source. Readers share fresh snapshots; a stale
/// read escalates to the write lock and re-checks before regenerating.
pub struct ScoreboardCache {
    db: SqlitePool,
    ttl: Duration,
    cache: RwLock<Option<Arc<Scoreboard>>>,
}

impl ScoreboardCache {
    pub fn new(db: SqlitePool) -> Self {
        Self::with_ttl(db, Duration::seconds(DEFAULT_TTL_SECS))
    }

    pub fn with_ttl(db: SqlitePool, ttl: Duration) -> Self {
        Self {
            db,
            ttl,
            cache: RwLock::new(None),
        }
    }

    fn is_fresh(&self, board: &Scoreboard) -> bool {
        Utc::now() - board.generated_at < self.ttl
    }

    /// Current ranking, at most one TTL stale.
    ///
    /// A regeneration failure surfaces as an error; the stale snapshot is
    /// not handed out in its place.
    pub async fn get(&self) -> Result<Arc<Scoreboard>> {
        {
            let cache = self.cache.read().await;
            if let Some(board) = cache.as_ref() {
                if self.is_fresh(board) {
                    return Ok(board.clone());
                }
            }
        }

        let mut cache = self.cache.write().await;
        // Another task may have regenerated while we waited for the lock.
        if let Some(board) = cache.as_ref() {
            if self.is_fresh(board) {
                return Ok(board.clone());
            }
        }

        debug!("regenerating scoreboard");
        let board = Arc::new(generate(&self.db).await?);
        *cache = Some(board.clone());
        Ok(board)
    }
}

/// Rebuild the scoreboard from scratch.
async fn generate(db: &SqlitePool) -> Result<Scoreboard> {
    let problems = problems::list_by_letter(db).await?;
    let columns: Vec<ProblemColumn> = problems
        .iter()
        .map(|p| ProblemColumn {
            id: p.id,
            letter: p.letter_code.clone(),
        })
        .collect();
    let letters: HashMap<i64, String> = problems
        .iter()
        .map(|p| (p.id, p.letter_code.clone()))
        .collect();

    let mut rows: Vec<RankRow> = Vec::new();
    let mut row_of_user: HashMap<i64, usize> = HashMap::new();
    for user in users::list(db).await? {
        let cells = columns
            .iter()
            .map(|c| (c.letter.clone(), Cell::default()))
            .collect();
        row_of_user.insert(user.id, rows.len());
        rows.push(RankRow {
            rank: 0,
            display_name: user.display_name,
            solved: 0,
            penalty: 0,
            cells,
        });
    }

    for event in submissions::score_events(db).await? {
        let (Some(&row_index), Some(letter)) = (
            row_of_user.get(&event.user_id),
            letters.get(&event.problem_id),
        ) else {
            continue;
        };
        apply_event(&mut rows[row_index], letter, &event.status, event.minutes);
    }

    rows.sort_by(|a, b| b.solved.cmp(&a.solved).then(a.penalty.cmp(&b.penalty)));
    for (index, row) in rows.iter_mut().enumerate() {
        row.rank = index + 1;
    }

    Ok(Scoreboard {
        problems: columns,
        rows,
        generated_at: Utc::now(),
    })
}

/// Fold one submission into a user's row.
fn apply_event(row: &mut RankRow, letter: &str, status: &str, minutes: i64) {
    let Some(cell) = row.cells.get_mut(letter) else {
        return;
    };
    // A solved cell never changes again.
    if cell.solved {
        return;
    }
    match status.parse::<Verdict>() {
        Ok(Verdict::Accepted) => {
            cell.solved = true;
            cell.time = format_time(minutes);
            row.solved += 1;
            row.penalty += minutes + WRONG_ATTEMPT_PENALTY * cell.attempts;
        }
        Ok(Verdict::Pending) => cell.pending = true,
        Ok(Verdict::CompileError) => {}
        // WA, TLE, RTE, IE and anything unrecognized all cost a retry.
        _ => cell.attempts += 1,
    }
}

/// Minute of acceptance as shown in a cell.
fn format_time(minutes: i64) -> String {
    minutes.to_string()
}

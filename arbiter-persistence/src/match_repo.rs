//! Repository for the `Match` entity (§3, §4.1). SQL is consolidated here,
//! decoupling the scheduler and worker pool from the schema, in the idiom
//! this codebase already uses for its own history/auth repositories.

use arbiter_core::CoreError;
use arbiter_core::ID;
use arbiter_core::MatchStatus;
use arbiter_core::Priority;
use arbiter_core::Winner;
use chrono::DateTime;
use chrono::Utc;
use const_format::concatcp;
use std::sync::Arc;
use tokio_postgres::Client;

use crate::models::Match;
use crate::models::Tournament;
use crate::schema::MATCHES;

#[allow(async_fn_in_trait)]
pub trait MatchRepository {
    async fn create(&self, m: &Match) -> Result<(), CoreError>;
    /// Atomic insertion of a full round: no worker observes a half-populated round.
    async fn create_batch(&self, matches: &[Match]) -> Result<(), CoreError>;
    async fn get(&self, id: ID<Match>) -> Result<Option<Match>, CoreError>;
    /// Compare-and-set claim: transitions `id` pending -> running iff it is
    /// still pending. Returns `None` if another worker already claimed it or
    /// it no longer exists — the caller (scheduler) must move on, never retry
    /// the same id.
    async fn try_claim(&self, id: ID<Match>) -> Result<Option<Match>, CoreError>;
    /// Rows still pending, oldest first, used by a worker to rediscover work
    /// after a tolerable queue-push failure (§4.1 Enqueue).
    async fn list_pending(&self, tournament: ID<Tournament>) -> Result<Vec<ID<Match>>, CoreError>;
    async fn max_round(&self, tournament: ID<Tournament>, game: &str) -> Result<i32, CoreError>;
    /// Bulk transition of a tournament's failed matches back to pending,
    /// clearing result fields. Returns the ids so the caller can re-enqueue them.
    async fn reset_failed(&self, tournament: ID<Tournament>) -> Result<Vec<ID<Match>>, CoreError>;
    /// Forcible transition to `failed` outside of a result-application
    /// transaction: used for timeouts, retry exhaustion, and the stuck-match
    /// reaper. Matches a single row by id; `reap_stuck` batches this by age.
    async fn fail(&self, id: ID<Match>, error_message: &str) -> Result<(), CoreError>;
    /// Matches stuck in `running` past `stuck_threshold`; forcibly failed and returned.
    async fn reap_stuck(&self, stuck_threshold: std::time::Duration) -> Result<Vec<ID<Match>>, CoreError>;
}

fn row_to_match(row: &tokio_postgres::Row) -> Match {
    Match {
        id: ID::from(row.get::<_, uuid::Uuid>("id")),
        tournament: ID::from(row.get::<_, uuid::Uuid>("tournament_id")),
        p1: ID::from(row.get::<_, uuid::Uuid>("p1")),
        p2: ID::from(row.get::<_, uuid::Uuid>("p2")),
        game: row.get::<_, String>("game"),
        status: row
            .get::<_, String>("status")
            .parse()
            .unwrap_or(MatchStatus::Pending),
        priority: match row.get::<_, i16>("priority") {
            0 => Priority::High,
            1 => Priority::Medium,
            _ => Priority::Low,
        },
        round: row.get::<_, i32>("round"),
        score1: row.get::<_, Option<i32>>("score1"),
        score2: row.get::<_, Option<i32>>("score2"),
        winner: row.get::<_, Option<i16>>("winner").map(Winner::from),
        error_message: row.get::<_, Option<String>>("error_message"),
        created_at: row.get::<_, DateTime<Utc>>("created_at"),
        started_at: row.get::<_, Option<DateTime<Utc>>>("started_at"),
        completed_at: row.get::<_, Option<DateTime<Utc>>>("completed_at"),
    }
}

impl MatchRepository for Arc<Client> {
    async fn create(&self, m: &Match) -> Result<(), CoreError> {
        self.execute(
            concatcp!(
                "INSERT INTO ", MATCHES,
                " (id, tournament_id, p1, p2, game, status, priority, round, created_at)",
                " VALUES ($1, $2, $3, $4, $5, 'pending', $6, $7, $8)"
            ),
            &[
                &m.id.inner(),
                &m.tournament.inner(),
                &m.p1.inner(),
                &m.p2.inner(),
                &m.game,
                &(m.priority.rank() as i16),
                &m.round,
                &m.created_at,
            ],
        )
        .await?;
        Ok(())
    }

    async fn create_batch(&self, matches: &[Match]) -> Result<(), CoreError> {
        if matches.is_empty() {
            return Ok(());
        }
        // `Arc<Client>` is shared for concurrent reads, so batch insertion
        // runs as a pipeline of statements guarded by an explicit
        // BEGIN/COMMIT rather than the `Transaction` builder, which needs
        // exclusive `&mut Client`.
        self.execute("BEGIN", &[]).await?;
        for m in matches {
            if let Err(err) = self.create(m).await {
                let _ = self.execute("ROLLBACK", &[]).await;
                return Err(err);
            }
        }
        self.execute("COMMIT", &[]).await?;
        Ok(())
    }

    async fn get(&self, id: ID<Match>) -> Result<Option<Match>, CoreError> {
        let row = self
            .query_opt(
                concatcp!("SELECT * FROM ", MATCHES, " WHERE id = $1"),
                &[&id.inner()],
            )
            .await?;
        Ok(row.as_ref().map(row_to_match))
    }

    async fn try_claim(&self, id: ID<Match>) -> Result<Option<Match>, CoreError> {
        let row = self
            .query_opt(
                concatcp!(
                    "UPDATE ", MATCHES,
                    " SET status = 'running', started_at = now()",
                    " WHERE id = $1 AND status = 'pending'",
                    " RETURNING *"
                ),
                &[&id.inner()],
            )
            .await?;
        Ok(row.as_ref().map(row_to_match))
    }

    async fn list_pending(&self, tournament: ID<Tournament>) -> Result<Vec<ID<Match>>, CoreError> {
        let rows = self
            .query(
                concatcp!(
                    "SELECT id FROM ", MATCHES,
                    " WHERE tournament_id = $1 AND status = 'pending'",
                    " ORDER BY priority ASC, created_at ASC"
                ),
                &[&tournament.inner()],
            )
            .await?;
        Ok(rows.iter().map(|row| ID::from(row.get::<_, uuid::Uuid>(0))).collect())
    }

    async fn max_round(&self, tournament: ID<Tournament>, game: &str) -> Result<i32, CoreError> {
        let row = self
            .query_one(
                concatcp!(
                    "SELECT COALESCE(MAX(round), 0) FROM ", MATCHES,
                    " WHERE tournament_id = $1 AND game = $2"
                ),
                &[&tournament.inner(), &game],
            )
            .await?;
        Ok(row.get::<_, i32>(0))
    }

    async fn reset_failed(&self, tournament: ID<Tournament>) -> Result<Vec<ID<Match>>, CoreError> {
        let rows = self
            .query(
                concatcp!(
                    "UPDATE ", MATCHES,
                    " SET status = 'pending', score1 = NULL, score2 = NULL,",
                    "     winner = NULL, error_message = NULL,",
                    "     started_at = NULL, completed_at = NULL",
                    " WHERE tournament_id = $1 AND status = 'failed'",
                    " RETURNING id"
                ),
                &[&tournament.inner()],
            )
            .await?;
        Ok(rows.iter().map(|row| ID::from(row.get::<_, uuid::Uuid>(0))).collect())
    }

    async fn fail(&self, id: ID<Match>, error_message: &str) -> Result<(), CoreError> {
        self.execute(
            concatcp!(
                "UPDATE ", MATCHES,
                " SET status = 'failed', error_message = $2, completed_at = now()",
                " WHERE id = $1"
            ),
            &[&id.inner(), &error_message],
        )
        .await?;
        Ok(())
    }

    async fn reap_stuck(&self, stuck_threshold: std::time::Duration) -> Result<Vec<ID<Match>>, CoreError> {
        let deadline = Utc::now() - chrono::Duration::from_std(stuck_threshold)
            .unwrap_or_else(|_| chrono::Duration::seconds(0));
        let rows = self
            .query(
                concatcp!(
                    "UPDATE ", MATCHES,
                    " SET status = 'failed', error_message = 'stuck match reaped by supervisor', completed_at = now()",
                    " WHERE status = 'running' AND started_at < $1",
                    " RETURNING id"
                ),
                &[&deadline],
            )
            .await?;
        Ok(rows.iter().map(|row| ID::from(row.get::<_, uuid::Uuid>(0))).collect())
    }
}

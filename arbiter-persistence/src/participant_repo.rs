//! Repository for the `TournamentParticipant` junction (§3). Rating and
//! record mutations happen only through `RatingRepository::apply_result`
//! (rating_repo.rs); this module covers enrollment and plain reads.

use arbiter_core::ConflictKind;
use arbiter_core::CoreError;
use arbiter_core::ID;
use arbiter_core::TournamentStatus;
use const_format::concatcp;
use std::sync::Arc;
use tokio_postgres::Client;

use crate::models::Program;
use crate::models::Tournament;
use crate::models::TournamentParticipant;
use crate::schema::PARTICIPANTS;
use crate::schema::TOURNAMENTS;

#[allow(async_fn_in_trait)]
pub trait ParticipantRepository {
    async fn enroll(&self, p: &TournamentParticipant) -> Result<(), CoreError>;
    async fn get(
        &self,
        tournament: ID<Tournament>,
        program: ID<Program>,
    ) -> Result<Option<TournamentParticipant>, CoreError>;
    async fn list(&self, tournament: ID<Tournament>) -> Result<Vec<TournamentParticipant>, CoreError>;
}

pub(crate) fn row_to_participant(row: &tokio_postgres::Row) -> TournamentParticipant {
    TournamentParticipant {
        tournament: ID::from(row.get::<_, uuid::Uuid>("tournament_id")),
        program: ID::from(row.get::<_, uuid::Uuid>("program_id")),
        rating: row.get::<_, i64>("rating"),
        wins: row.get::<_, i32>("wins"),
        losses: row.get::<_, i32>("losses"),
        draws: row.get::<_, i32>("draws"),
        joined_at: row.get("joined_at"),
    }
}

/// Runs inside the caller's `BEGIN`: locks the tournament row, checks the
/// §3 cap/status invariants, then inserts. A free function since `Arc<Client>`
/// is foreign and can't carry an inherent impl from this crate.
async fn enroll_locked(client: &Client, p: &TournamentParticipant) -> Result<(), CoreError> {
    let row = client
        .query_opt(
            concatcp!(
                "SELECT status, max_participants FROM ", TOURNAMENTS,
                " WHERE id = $1 FOR UPDATE"
            ),
            &[&p.tournament.inner()],
        )
        .await?;
    let Some(row) = row else {
        return Err(CoreError::NotFound(format!("tournament {} not found", p.tournament)));
    };
    let status: TournamentStatus = row
        .get::<_, String>("status")
        .parse()
        .unwrap_or(TournamentStatus::Completed);
    if status != TournamentStatus::Pending {
        return Err(CoreError::Conflict(ConflictKind::TournamentStarted));
    }
    if let Some(max) = row.get::<_, Option<i32>>("max_participants") {
        let count_row = client
            .query_one(
                concatcp!("SELECT COUNT(*) FROM ", PARTICIPANTS, " WHERE tournament_id = $1"),
                &[&p.tournament.inner()],
            )
            .await?;
        let count: i64 = count_row.get(0);
        if count >= max as i64 {
            return Err(CoreError::Conflict(ConflictKind::TournamentFull));
        }
    }

    client
        .execute(
            concatcp!(
                "INSERT INTO ", PARTICIPANTS,
                " (tournament_id, program_id, rating, wins, losses, draws, joined_at)",
                " VALUES ($1, $2, $3, $4, $5, $6, $7)"
            ),
            &[
                &p.tournament.inner(),
                &p.program.inner(),
                &p.rating,
                &p.wins,
                &p.losses,
                &p.draws,
                &p.joined_at,
            ],
        )
        .await?;
    Ok(())
}

impl ParticipantRepository for Arc<Client> {
    /// Enrolls `p`, enforcing the §3 cap/status invariants under a
    /// `SELECT ... FOR UPDATE` lock on the tournament row so a concurrent
    /// enroll can't race the cap check: no joins once the tournament has
    /// left `pending`, and no joins past `max_participants`.
    async fn enroll(&self, p: &TournamentParticipant) -> Result<(), CoreError> {
        self.execute("BEGIN", &[]).await?;
        let result = enroll_locked(self, p).await;
        match result {
            Ok(()) => {
                self.execute("COMMIT", &[]).await?;
                Ok(())
            }
            Err(err) => {
                let _ = self.execute("ROLLBACK", &[]).await;
                Err(err)
            }
        }
    }

    async fn get(
        &self,
        tournament: ID<Tournament>,
        program: ID<Program>,
    ) -> Result<Option<TournamentParticipant>, CoreError> {
        let row = self
            .query_opt(
                concatcp!(
                    "SELECT * FROM ", PARTICIPANTS,
                    " WHERE tournament_id = $1 AND program_id = $2"
                ),
                &[&tournament.inner(), &program.inner()],
            )
            .await?;
        Ok(row.as_ref().map(row_to_participant))
    }

    async fn list(&self, tournament: ID<Tournament>) -> Result<Vec<TournamentParticipant>, CoreError> {
        let rows = self
            .query(
                concatcp!("SELECT * FROM ", PARTICIPANTS, " WHERE tournament_id = $1"),
                &[&tournament.inner()],
            )
            .await?;
        Ok(rows.iter().map(row_to_participant).collect())
    }
}

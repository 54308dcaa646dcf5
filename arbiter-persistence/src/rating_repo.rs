//! Atomic result application (§4.3). A terminal match result touches four
//! rows — the match itself, both participants' counters, and two
//! rating-history entries — and all of it commits or none of it does.
//!
//! Rating semantics as implemented: a participant's rating is the sum of
//! their own score across every completed match in the tournament,
//! regardless of whether that match was won, lost, or drawn.

use arbiter_core::CoreError;
use arbiter_core::ID;
use arbiter_core::Winner;
use chrono::Utc;
use const_format::concatcp;
use std::sync::Arc;
use tokio_postgres::Client;

use crate::models::Match;
use crate::models::RatingHistory;
use crate::models::TournamentParticipant;
use crate::participant_repo::row_to_participant;
use crate::schema::MATCHES;
use crate::schema::PARTICIPANTS;
use crate::schema::RATING_HISTORY;

#[allow(async_fn_in_trait)]
pub trait RatingRepository {
    /// Flips `match_id` to completed and applies its result to both
    /// participants in a single transaction. `match_id` must currently be
    /// `running`; any other status is a validation failure (the caller
    /// raced a retry or double-delivered a runner result).
    async fn apply_result(
        &self,
        match_id: ID<Match>,
        score1: i32,
        score2: i32,
        winner: Winner,
    ) -> Result<(TournamentParticipant, TournamentParticipant), CoreError>;
}

fn record(winner: Winner) -> (i32, i32, i32, i32) {
    // (p1_wins, p1_losses, p2_wins, p2_losses); draws are implied by neither incrementing.
    match winner {
        Winner::P1 => (1, 0, 0, 1),
        Winner::P2 => (0, 1, 1, 0),
        Winner::Draw => (0, 0, 0, 0),
    }
}

impl RatingRepository for Arc<Client> {
    async fn apply_result(
        &self,
        match_id: ID<Match>,
        score1: i32,
        score2: i32,
        winner: Winner,
    ) -> Result<(TournamentParticipant, TournamentParticipant), CoreError> {
        self.execute("BEGIN", &[]).await?;

        let row = match self
            .query_opt(
                concatcp!("SELECT * FROM ", MATCHES, " WHERE id = $1 FOR UPDATE"),
                &[&match_id.inner()],
            )
            .await
        {
            Ok(Some(row)) => row,
            Ok(None) => {
                let _ = self.execute("ROLLBACK", &[]).await;
                return Err(CoreError::NotFound(format!("match {match_id} not found")));
            }
            Err(err) => {
                let _ = self.execute("ROLLBACK", &[]).await;
                return Err(err.into());
            }
        };
        let status: String = row.get("status");
        if status != "running" {
            let _ = self.execute("ROLLBACK", &[]).await;
            return Err(CoreError::ValidationFailure(format!(
                "match {match_id} is not running (status={status})"
            )));
        }
        let tournament: uuid::Uuid = row.get("tournament_id");
        let p1: uuid::Uuid = row.get("p1");
        let p2: uuid::Uuid = row.get("p2");

        if let Err(err) = self
            .execute(
                concatcp!(
                    "UPDATE ", MATCHES,
                    " SET status = 'completed', score1 = $2, score2 = $3, winner = $4, completed_at = now()",
                    " WHERE id = $1"
                ),
                &[&match_id.inner(), &score1, &score2, &(i16::from(winner))],
            )
            .await
        {
            let _ = self.execute("ROLLBACK", &[]).await;
            return Err(err.into());
        }

        let (p1_wins, p1_losses, p2_wins, p2_losses) = record(winner);
        let p1_draws = if matches!(winner, Winner::Draw) { 1 } else { 0 };
        let p2_draws = p1_draws;

        let p1_row = match self
            .query_one(
                concatcp!(
                    "UPDATE ", PARTICIPANTS,
                    " SET rating = rating + $3, wins = wins + $4, losses = losses + $5, draws = draws + $6",
                    " WHERE tournament_id = $1 AND program_id = $2",
                    " RETURNING *"
                ),
                &[&tournament, &p1, &(score1 as i64), &p1_wins, &p1_losses, &p1_draws],
            )
            .await
        {
            Ok(row) => row,
            Err(err) => {
                let _ = self.execute("ROLLBACK", &[]).await;
                return Err(err.into());
            }
        };
        let p2_row = match self
            .query_one(
                concatcp!(
                    "UPDATE ", PARTICIPANTS,
                    " SET rating = rating + $3, wins = wins + $4, losses = losses + $5, draws = draws + $6",
                    " WHERE tournament_id = $1 AND program_id = $2",
                    " RETURNING *"
                ),
                &[&tournament, &p2, &(score2 as i64), &p2_wins, &p2_losses, &p2_draws],
            )
            .await
        {
            Ok(row) => row,
            Err(err) => {
                let _ = self.execute("ROLLBACK", &[]).await;
                return Err(err.into());
            }
        };

        let p1_participant = row_to_participant(&p1_row);
        let p2_participant = row_to_participant(&p2_row);

        for (program, old_rating, new_rating) in [
            (p1, p1_participant.rating - score1 as i64, p1_participant.rating),
            (p2, p2_participant.rating - score2 as i64, p2_participant.rating),
        ] {
            if let Err(err) = self
                .execute(
                    concatcp!(
                        "INSERT INTO ", RATING_HISTORY,
                        " (id, match_id, program_id, tournament_id, old_rating, new_rating, delta, created_at)",
                        " VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"
                    ),
                    &[
                        &ID::<RatingHistory>::default().inner(),
                        &match_id.inner(),
                        &program,
                        &tournament,
                        &old_rating,
                        &new_rating,
                        &(new_rating - old_rating),
                        &Utc::now(),
                    ],
                )
                .await
            {
                let _ = self.execute("ROLLBACK", &[]).await;
                return Err(err.into());
            }
        }

        self.execute("COMMIT", &[]).await?;
        Ok((p1_participant, p2_participant))
    }
}

//! Repository for the `(tournament, game)` round-tracking junction (§3),
//! consulted by round generation to compute the next round number and flag
//! round completion.

use arbiter_core::CoreError;
use arbiter_core::ID;
use const_format::concatcp;
use std::sync::Arc;
use tokio_postgres::Client;

use crate::models::Tournament;
use crate::models::TournamentGame;
use crate::schema::TOURNAMENT_GAMES;

#[allow(async_fn_in_trait)]
pub trait TournamentGameRepository {
    async fn get_or_create(&self, tournament: ID<Tournament>, game: &str) -> Result<TournamentGame, CoreError>;
    async fn advance_round(&self, tournament: ID<Tournament>, game: &str, round: i32) -> Result<(), CoreError>;
    async fn mark_round_completed(&self, tournament: ID<Tournament>, game: &str) -> Result<(), CoreError>;
}

fn row_to_tournament_game(row: &tokio_postgres::Row) -> TournamentGame {
    TournamentGame {
        tournament: ID::from(row.get::<_, uuid::Uuid>("tournament_id")),
        game: row.get::<_, String>("game"),
        current_round: row.get::<_, i32>("current_round"),
        round_completed: row.get::<_, bool>("round_completed"),
    }
}

impl TournamentGameRepository for Arc<Client> {
    async fn get_or_create(&self, tournament: ID<Tournament>, game: &str) -> Result<TournamentGame, CoreError> {
        let row = self
            .query_opt(
                concatcp!(
                    "SELECT * FROM ", TOURNAMENT_GAMES,
                    " WHERE tournament_id = $1 AND game = $2"
                ),
                &[&tournament.inner(), &game],
            )
            .await?;
        if let Some(row) = row {
            return Ok(row_to_tournament_game(&row));
        }
        let row = self
            .query_one(
                concatcp!(
                    "INSERT INTO ", TOURNAMENT_GAMES,
                    " (tournament_id, game, current_round, round_completed)",
                    " VALUES ($1, $2, 0, true)",
                    " ON CONFLICT (tournament_id, game) DO UPDATE SET game = EXCLUDED.game",
                    " RETURNING *"
                ),
                &[&tournament.inner(), &game],
            )
            .await?;
        Ok(row_to_tournament_game(&row))
    }

    async fn advance_round(&self, tournament: ID<Tournament>, game: &str, round: i32) -> Result<(), CoreError> {
        self.execute(
            concatcp!(
                "UPDATE ", TOURNAMENT_GAMES,
                " SET current_round = $3, round_completed = false",
                " WHERE tournament_id = $1 AND game = $2"
            ),
            &[&tournament.inner(), &game, &round],
        )
        .await?;
        Ok(())
    }

    async fn mark_round_completed(&self, tournament: ID<Tournament>, game: &str) -> Result<(), CoreError> {
        self.execute(
            concatcp!(
                "UPDATE ", TOURNAMENT_GAMES,
                " SET round_completed = true",
                " WHERE tournament_id = $1 AND game = $2"
            ),
            &[&tournament.inner(), &game],
        )
        .await?;
        Ok(())
    }
}

//! Repository for the `Program` entity (§3). Only the latest version per
//! `(team_or_owner, game, tournament)` participates in scheduling (§9); older
//! versions remain queryable for audit history but `latest_for` filters them out.

use arbiter_core::CoreError;
use arbiter_core::ID;
use const_format::concatcp;
use std::sync::Arc;
use tokio_postgres::Client;

use crate::models::Program;
use crate::models::Team;
use crate::models::Tournament;
use crate::models::User;
use crate::schema::PROGRAMS;

#[allow(async_fn_in_trait)]
pub trait ProgramRepository {
    async fn create(&self, p: &Program) -> Result<(), CoreError>;
    async fn get(&self, id: ID<Program>) -> Result<Option<Program>, CoreError>;
    /// Latest-version program per owning team (or solo owner) for a
    /// tournament's game: the set that round generation draws pairs from.
    async fn latest_for_tournament(
        &self,
        tournament: ID<Tournament>,
        game: &str,
    ) -> Result<Vec<Program>, CoreError>;
}

fn row_to_program(row: &tokio_postgres::Row) -> Program {
    Program {
        id: ID::from(row.get::<_, uuid::Uuid>("id")),
        owner: ID::<User>::from(row.get::<_, uuid::Uuid>("owner")),
        team: row
            .get::<_, Option<uuid::Uuid>>("team_id")
            .map(ID::<Team>::from),
        tournament: row
            .get::<_, Option<uuid::Uuid>>("tournament_id")
            .map(ID::<Tournament>::from),
        game: row.get::<_, Option<String>>("game"),
        display_name: row.get::<_, String>("display_name"),
        source_path: row.get::<_, String>("source_path"),
        language: row.get::<_, String>("language"),
        version: row.get::<_, i32>("version"),
    }
}

impl ProgramRepository for Arc<Client> {
    async fn create(&self, p: &Program) -> Result<(), CoreError> {
        self.execute(
            concatcp!(
                "INSERT INTO ", PROGRAMS,
                " (id, owner, team_id, tournament_id, game, display_name, source_path, language, version)",
                " VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)"
            ),
            &[
                &p.id.inner(),
                &p.owner.inner(),
                &p.team.map(|t| t.inner()),
                &p.tournament.map(|t| t.inner()),
                &p.game,
                &p.display_name,
                &p.source_path,
                &p.language,
                &p.version,
            ],
        )
        .await?;
        Ok(())
    }

    async fn get(&self, id: ID<Program>) -> Result<Option<Program>, CoreError> {
        let row = self
            .query_opt(
                concatcp!("SELECT * FROM ", PROGRAMS, " WHERE id = $1"),
                &[&id.inner()],
            )
            .await?;
        Ok(row.as_ref().map(row_to_program))
    }

    async fn latest_for_tournament(
        &self,
        tournament: ID<Tournament>,
        game: &str,
    ) -> Result<Vec<Program>, CoreError> {
        let rows = self
            .query(
                concatcp!(
                    "SELECT DISTINCT ON (COALESCE(team_id, owner)) * FROM ", PROGRAMS,
                    " WHERE tournament_id = $1 AND game = $2",
                    " ORDER BY COALESCE(team_id, owner), version DESC"
                ),
                &[&tournament.inner(), &game],
            )
            .await?;
        Ok(rows.iter().map(row_to_program).collect())
    }
}

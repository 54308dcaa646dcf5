//! Repository for the `Tournament` entity (§3). Updates use the `version`
//! column as a CAS token (§5): conflicting updates fail with
//! `Conflict(ConcurrentUpdate)`, surfaced to the caller unchanged (§7).

use arbiter_core::ConflictKind;
use arbiter_core::CoreError;
use arbiter_core::ID;
use arbiter_core::TournamentStatus;
use const_format::concatcp;
use std::sync::Arc;
use tokio_postgres::Client;

use crate::models::Tournament;
use crate::models::User;
use crate::schema::TOURNAMENTS;

#[allow(async_fn_in_trait)]
pub trait TournamentRepository {
    async fn create(&self, t: &Tournament) -> Result<(), CoreError>;
    async fn get(&self, id: ID<Tournament>) -> Result<Option<Tournament>, CoreError>;
    async fn list(&self) -> Result<Vec<Tournament>, CoreError>;
    /// Updates status/metadata only if `expected_version` still matches the
    /// stored version; on success the version is incremented. On mismatch,
    /// returns `Conflict(ConcurrentUpdate)` and leaves the row untouched.
    async fn update_status(
        &self,
        id: ID<Tournament>,
        expected_version: i64,
        status: TournamentStatus,
    ) -> Result<Tournament, CoreError>;
    async fn delete(&self, id: ID<Tournament>) -> Result<(), CoreError>;
}

fn row_to_tournament(row: &tokio_postgres::Row) -> Tournament {
    Tournament {
        id: ID::from(row.get::<_, uuid::Uuid>("id")),
        code: row.get::<_, String>("code"),
        name: row.get::<_, String>("name"),
        game: row.get::<_, String>("game"),
        status: row
            .get::<_, String>("status")
            .parse()
            .unwrap_or(TournamentStatus::Pending),
        max_participants: row.get::<_, Option<i32>>("max_participants"),
        team_size: row.get::<_, Option<i32>>("team_size"),
        creator: ID::<User>::from(row.get::<_, uuid::Uuid>("creator")),
        starts_at: row.get("starts_at"),
        ends_at: row.get("ends_at"),
        metadata: row.get::<_, serde_json::Value>("metadata"),
        version: row.get::<_, i64>("version"),
    }
}

impl TournamentRepository for Arc<Client> {
    async fn create(&self, t: &Tournament) -> Result<(), CoreError> {
        self.execute(
            concatcp!(
                "INSERT INTO ", TOURNAMENTS,
                " (id, code, name, game, status, max_participants, team_size, creator, metadata, version)",
                " VALUES ($1, $2, $3, $4, 'pending', $5, $6, $7, $8, 1)"
            ),
            &[
                &t.id.inner(),
                &t.code,
                &t.name,
                &t.game,
                &t.max_participants,
                &t.team_size,
                &t.creator.inner(),
                &t.metadata,
            ],
        )
        .await?;
        Ok(())
    }

    async fn get(&self, id: ID<Tournament>) -> Result<Option<Tournament>, CoreError> {
        let row = self
            .query_opt(
                concatcp!("SELECT * FROM ", TOURNAMENTS, " WHERE id = $1"),
                &[&id.inner()],
            )
            .await?;
        Ok(row.as_ref().map(row_to_tournament))
    }

    async fn list(&self) -> Result<Vec<Tournament>, CoreError> {
        let rows = self
            .query(concatcp!("SELECT * FROM ", TOURNAMENTS, " ORDER BY code ASC"), &[])
            .await?;
        Ok(rows.iter().map(row_to_tournament).collect())
    }

    async fn update_status(
        &self,
        id: ID<Tournament>,
        expected_version: i64,
        status: TournamentStatus,
    ) -> Result<Tournament, CoreError> {
        let row = self
            .query_opt(
                concatcp!(
                    "UPDATE ", TOURNAMENTS,
                    " SET status = $3, version = version + 1",
                    " WHERE id = $1 AND version = $2",
                    "   AND (CASE status",
                    "         WHEN 'pending' THEN 0 WHEN 'active' THEN 1 WHEN 'completed' THEN 2 END",
                    "       ) <= $4",
                    " RETURNING *"
                ),
                &[&id.inner(), &expected_version, &status.as_str(), &status.rank()],
            )
            .await?;
        if let Some(row) = row {
            return Ok(row_to_tournament(&row));
        }
        // Either the version was stale or the row's status already outranks
        // the target (would regress pending<-active<-completed). Disambiguate
        // so a caller can't mistake a blocked regression for a version race.
        match self.get(id).await? {
            Some(current) if current.status > status => {
                Err(CoreError::Conflict(ConflictKind::TournamentStarted))
            }
            _ => Err(CoreError::Conflict(ConflictKind::ConcurrentUpdate)),
        }
    }

    async fn delete(&self, id: ID<Tournament>) -> Result<(), CoreError> {
        self.execute(
            concatcp!("DELETE FROM ", TOURNAMENTS, " WHERE id = $1"),
            &[&id.inner()],
        )
        .await?;
        Ok(())
    }
}

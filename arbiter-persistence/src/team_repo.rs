//! Repository for the `Team` entity (§3). A team's invite code is unique
//! within its tournament; the leader is always a member; a user joins at
//! most one team per tournament (enforced by a unique constraint on
//! `(tournament_id, member)` in the membership table, not modeled here as a
//! separate struct since `Team::members` already carries the set).

use arbiter_core::ConflictKind;
use arbiter_core::CoreError;
use arbiter_core::ID;
use const_format::concatcp;
use std::sync::Arc;
use tokio_postgres::Client;

use crate::models::Team;
use crate::models::Tournament;
use crate::models::User;
use crate::schema::TEAMS;

#[allow(async_fn_in_trait)]
pub trait TeamRepository {
    async fn create(&self, t: &Team) -> Result<(), CoreError>;
    async fn get(&self, id: ID<Team>) -> Result<Option<Team>, CoreError>;
    async fn get_by_code(&self, tournament: ID<Tournament>, code: &str) -> Result<Option<Team>, CoreError>;
    /// Appends `member` to the team's roster, failing with
    /// `Conflict(ConcurrentUpdate)` if the team changed underneath us
    /// between read and write (members is stored as a single array column).
    async fn add_member(&self, id: ID<Team>, member: ID<User>) -> Result<Team, CoreError>;
}

fn row_to_team(row: &tokio_postgres::Row) -> Team {
    Team {
        id: ID::from(row.get::<_, uuid::Uuid>("id")),
        tournament: ID::from(row.get::<_, uuid::Uuid>("tournament_id")),
        code: row.get::<_, String>("code"),
        leader: ID::<User>::from(row.get::<_, uuid::Uuid>("leader")),
        members: row
            .get::<_, Vec<uuid::Uuid>>("members")
            .into_iter()
            .map(ID::<User>::from)
            .collect(),
    }
}

impl TeamRepository for Arc<Client> {
    async fn create(&self, t: &Team) -> Result<(), CoreError> {
        let members: Vec<uuid::Uuid> = t.members.iter().map(|m| m.inner()).collect();
        self.execute(
            concatcp!(
                "INSERT INTO ", TEAMS,
                " (id, tournament_id, code, leader, members)",
                " VALUES ($1, $2, $3, $4, $5)"
            ),
            &[&t.id.inner(), &t.tournament.inner(), &t.code, &t.leader.inner(), &members],
        )
        .await?;
        Ok(())
    }

    async fn get(&self, id: ID<Team>) -> Result<Option<Team>, CoreError> {
        let row = self
            .query_opt(concatcp!("SELECT * FROM ", TEAMS, " WHERE id = $1"), &[&id.inner()])
            .await?;
        Ok(row.as_ref().map(row_to_team))
    }

    async fn get_by_code(&self, tournament: ID<Tournament>, code: &str) -> Result<Option<Team>, CoreError> {
        let row = self
            .query_opt(
                concatcp!("SELECT * FROM ", TEAMS, " WHERE tournament_id = $1 AND code = $2"),
                &[&tournament.inner(), &code],
            )
            .await?;
        Ok(row.as_ref().map(row_to_team))
    }

    async fn add_member(&self, id: ID<Team>, member: ID<User>) -> Result<Team, CoreError> {
        let row = self
            .query_opt(
                concatcp!(
                    "UPDATE ", TEAMS,
                    " SET members = array_append(members, $2)",
                    " WHERE id = $1 AND NOT ($2 = ANY(members))",
                    " RETURNING *"
                ),
                &[&id.inner(), &member.inner()],
            )
            .await?;
        match row {
            Some(row) => Ok(row_to_team(&row)),
            None => Err(CoreError::Conflict(ConflictKind::ConcurrentUpdate)),
        }
    }
}

//! Database-level leaderboard queries (§4.3). Queried directly when a
//! `leaderboard_tournament` materialized view exists; otherwise falls back
//! to an on-the-fly aggregation over `tournament_participants`. Both paths
//! order `rating DESC, wins DESC, program_id ASC` and produce dense ranks —
//! the cache layer (arbiter-rating) decides when to call through here.

use arbiter_core::CoreError;
use arbiter_core::ID;
use const_format::concatcp;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_postgres::Client;

use crate::models::CrossGameLeaderboardEntry;
use crate::models::LeaderboardEntry;
use crate::models::LeaderboardGroup;
use crate::models::Program;
use crate::models::Team;
use crate::models::Tournament;
use crate::schema::LEADERBOARD_VIEW;
use crate::schema::MATCHES;
use crate::schema::PARTICIPANTS;
use crate::schema::PROGRAMS;

#[allow(async_fn_in_trait)]
pub trait LeaderboardRepository {
    async fn leaderboard(&self, tournament: ID<Tournament>) -> Result<Vec<LeaderboardEntry>, CoreError>;
    async fn leaderboard_by_game(
        &self,
        tournament: ID<Tournament>,
        game: &str,
    ) -> Result<Vec<LeaderboardEntry>, CoreError>;
    /// Cross-game standings (§4.3): grouped by team, falling back to program
    /// for unteamed entries, summed across every game plus a per-game breakdown.
    async fn cross_game_leaderboard(
        &self,
        tournament: ID<Tournament>,
    ) -> Result<Vec<CrossGameLeaderboardEntry>, CoreError>;
    /// Whether the materialized-view fast path is available in this database.
    async fn has_materialized_view(&self) -> Result<bool, CoreError>;
}

fn row_to_entry(row: &tokio_postgres::Row) -> LeaderboardEntry {
    LeaderboardEntry {
        rank: row.get::<_, i64>("rank"),
        program: ID::from(row.get::<_, uuid::Uuid>("program_id")),
        rating: row.get::<_, i64>("rating"),
        wins: row.get::<_, i32>("wins"),
        losses: row.get::<_, i32>("losses"),
        draws: row.get::<_, i32>("draws"),
        total_games: row.get::<_, i32>("total_games"),
    }
}

const AGGREGATE_SELECT: &str = concatcp!(
    "SELECT program_id, rating, wins, losses, draws, (wins + losses + draws) AS total_games,",
    " DENSE_RANK() OVER (ORDER BY rating DESC, wins DESC, program_id ASC) AS rank",
    " FROM ", PARTICIPANTS,
    " WHERE tournament_id = $1",
    " ORDER BY rating DESC, wins DESC, program_id ASC"
);

const VIEW_SELECT: &str = concatcp!(
    "SELECT program_id, rating, wins, losses, draws, total_games,",
    " DENSE_RANK() OVER (ORDER BY rating DESC, wins DESC, program_id ASC) AS rank",
    " FROM ", LEADERBOARD_VIEW,
    " WHERE tournament_id = $1",
    " ORDER BY rating DESC, wins DESC, program_id ASC"
);

const CROSS_GAME_SELECT: &str = concatcp!(
    "SELECT COALESCE(prog.team_id, prog.id) AS group_id,",
    " (prog.team_id IS NOT NULL) AS is_team,",
    " SUM(p.rating) AS rating, SUM(p.wins) AS wins, SUM(p.losses) AS losses, SUM(p.draws) AS draws,",
    " SUM(p.wins + p.losses + p.draws) AS total_games,",
    " DENSE_RANK() OVER (ORDER BY SUM(p.rating) DESC) AS rank",
    " FROM ", PARTICIPANTS, " p",
    " JOIN ", PROGRAMS, " prog ON prog.id = p.program_id",
    " WHERE p.tournament_id = $1",
    " GROUP BY COALESCE(prog.team_id, prog.id), prog.team_id IS NOT NULL",
    " ORDER BY rating DESC"
);

const CROSS_GAME_PER_GAME_SELECT: &str = concatcp!(
    "SELECT COALESCE(prog.team_id, prog.id) AS group_id, m.game AS game,",
    " COALESCE(SUM(CASE WHEN m.p1 = prog.id THEN m.score1 WHEN m.p2 = prog.id THEN m.score2 ELSE 0 END), 0) AS rating",
    " FROM ", MATCHES, " m",
    " JOIN ", PROGRAMS, " prog ON (m.p1 = prog.id OR m.p2 = prog.id)",
    " WHERE m.tournament_id = $1 AND m.status = 'completed'",
    " GROUP BY COALESCE(prog.team_id, prog.id), m.game"
);

impl LeaderboardRepository for Arc<Client> {
    async fn leaderboard(&self, tournament: ID<Tournament>) -> Result<Vec<LeaderboardEntry>, CoreError> {
        if self.has_materialized_view().await? {
            let rows = self.query(VIEW_SELECT, &[&tournament.inner()]).await?;
            return Ok(rows.iter().map(row_to_entry).collect());
        }
        let rows = self.query(AGGREGATE_SELECT, &[&tournament.inner()]).await?;
        Ok(rows.iter().map(row_to_entry).collect())
    }

    async fn leaderboard_by_game(
        &self,
        tournament: ID<Tournament>,
        game: &str,
    ) -> Result<Vec<LeaderboardEntry>, CoreError> {
        // Per-game breakdown always aggregates from matches directly: the
        // materialized view is keyed by tournament only.
        let rows = self
            .query(
                concatcp!(
                    "SELECT p.program_id AS program_id,",
                    "   COALESCE(SUM(CASE WHEN m.p1 = p.program_id THEN m.score1 WHEN m.p2 = p.program_id THEN m.score2 ELSE 0 END), 0) AS rating,",
                    "   COUNT(*) FILTER (WHERE (m.p1 = p.program_id AND m.winner = 1) OR (m.p2 = p.program_id AND m.winner = 2)) AS wins,",
                    "   COUNT(*) FILTER (WHERE (m.p1 = p.program_id AND m.winner = 2) OR (m.p2 = p.program_id AND m.winner = 1)) AS losses,",
                    "   COUNT(*) FILTER (WHERE m.winner = 0) AS draws,",
                    "   COUNT(*) AS total_games,",
                    "   DENSE_RANK() OVER (ORDER BY COALESCE(SUM(CASE WHEN m.p1 = p.program_id THEN m.score1 WHEN m.p2 = p.program_id THEN m.score2 ELSE 0 END), 0) DESC) AS rank",
                    " FROM ", PARTICIPANTS, " p",
                    " JOIN matches m ON (m.p1 = p.program_id OR m.p2 = p.program_id)",
                    "   AND m.tournament_id = p.tournament_id AND m.status = 'completed' AND m.game = $2",
                    " WHERE p.tournament_id = $1",
                    " GROUP BY p.program_id",
                    " ORDER BY rating DESC, wins DESC, program_id ASC"
                ),
                &[&tournament.inner(), &game],
            )
            .await?;
        Ok(rows
            .iter()
            .map(|row| LeaderboardEntry {
                rank: row.get::<_, i64>("rank"),
                program: ID::from(row.get::<_, uuid::Uuid>("program_id")),
                rating: row.get::<_, i64>("rating"),
                wins: row.get::<_, i64>("wins") as i32,
                losses: row.get::<_, i64>("losses") as i32,
                draws: row.get::<_, i64>("draws") as i32,
                total_games: row.get::<_, i64>("total_games") as i32,
            })
            .collect())
    }

    async fn cross_game_leaderboard(
        &self,
        tournament: ID<Tournament>,
    ) -> Result<Vec<CrossGameLeaderboardEntry>, CoreError> {
        let rows = self.query(CROSS_GAME_SELECT, &[&tournament.inner()]).await?;

        let mut entries: Vec<CrossGameLeaderboardEntry> = Vec::with_capacity(rows.len());
        let mut index: HashMap<uuid::Uuid, usize> = HashMap::with_capacity(rows.len());
        for row in &rows {
            let group_id = row.get::<_, uuid::Uuid>("group_id");
            let group = if row.get::<_, bool>("is_team") {
                LeaderboardGroup::Team(ID::<Team>::from(group_id))
            } else {
                LeaderboardGroup::Program(ID::<Program>::from(group_id))
            };
            index.insert(group_id, entries.len());
            entries.push(CrossGameLeaderboardEntry {
                rank: row.get::<_, i64>("rank"),
                group,
                rating: row.get::<_, i64>("rating"),
                wins: row.get::<_, i64>("wins") as i32,
                losses: row.get::<_, i64>("losses") as i32,
                draws: row.get::<_, i64>("draws") as i32,
                total_games: row.get::<_, i64>("total_games") as i32,
                per_game: Vec::new(),
            });
        }

        let breakdown_rows = self.query(CROSS_GAME_PER_GAME_SELECT, &[&tournament.inner()]).await?;
        for row in &breakdown_rows {
            let group_id = row.get::<_, uuid::Uuid>("group_id");
            if let Some(&i) = index.get(&group_id) {
                entries[i].per_game.push((row.get::<_, String>("game"), row.get::<_, i64>("rating")));
            }
        }

        Ok(entries)
    }

    async fn has_materialized_view(&self) -> Result<bool, CoreError> {
        let row = self
            .query_one(
                "SELECT EXISTS (SELECT 1 FROM pg_matviews WHERE matviewname = $1)",
                &[&LEADERBOARD_VIEW],
            )
            .await?;
        Ok(row.get::<_, bool>(0))
    }
}

//! Orchestrates atomic result application (§4.3): the database transaction
//! is the atomicity boundary; the cache bump and event publish happen only
//! after it commits, and their failure never unwinds the result.

use arbiter_core::CoreError;
use arbiter_core::ID;
use arbiter_core::Winner;
use arbiter_coordination::Event;
use arbiter_coordination::EventBus;
use arbiter_coordination::PubSub;
use arbiter_persistence::models::Match;
use arbiter_persistence::models::Tournament;
use arbiter_persistence::models::TournamentParticipant;
use arbiter_persistence::rating_repo::RatingRepository;
use arbiter_persistence::leaderboard_repo::LeaderboardRepository;

use crate::leaderboard::rank_snapshot;
use crate::leaderboard::LeaderboardCache;

#[derive(Clone)]
pub struct RatingEngine<R> {
    repo: R,
    cache: LeaderboardCache,
    bus: std::sync::Arc<EventBus>,
    pubsub: PubSub,
}

impl<R> RatingEngine<R>
where
    R: RatingRepository + LeaderboardRepository + Clone,
{
    pub fn new(repo: R, cache: LeaderboardCache, bus: std::sync::Arc<EventBus>, pubsub: PubSub) -> Self {
        Self { repo, cache, bus, pubsub }
    }

    /// Applies a terminal result: database transaction first, then a
    /// best-effort cache bump and event publish. §4.3's four persisted
    /// effects (match row, two participant rows, two history rows) are all
    /// covered by `RatingRepository::apply_result`'s own transaction.
    pub async fn apply_result(
        &self,
        tournament: ID<Tournament>,
        match_id: ID<Match>,
        score1: i32,
        score2: i32,
        winner: Winner,
    ) -> Result<(TournamentParticipant, TournamentParticipant), CoreError> {
        let (p1, p2) = self.repo.apply_result(match_id, score1, score2, winner).await?;

        if let Err(err) = self.cache.bump(tournament, p1.program, score1 as i64).await {
            log::warn!("leaderboard cache bump failed for {}: {err}", p1.program);
        }
        if let Err(err) = self.cache.bump(tournament, p2.program, score2 as i64).await {
            log::warn!("leaderboard cache bump failed for {}: {err}", p2.program);
        }

        let payload = serde_json::json!({
            "match_id": match_id,
            "tournament_id": tournament,
            "score1": score1,
            "score2": score2,
        });
        self.bus.publish(&tournament.to_string(), Event::match_completed(payload.clone()));
        self.pubsub.publish(&tournament.to_string(), &Event::match_completed(payload)).await;

        let leaderboard_payload = serde_json::json!({
            "tournament_id": tournament,
            "program1": p1.program,
            "rating1": p1.rating,
            "program2": p2.program,
            "rating2": p2.rating,
        });
        self.bus
            .publish(&tournament.to_string(), Event::leaderboard_update(leaderboard_payload.clone()));
        self.pubsub
            .publish(&tournament.to_string(), &Event::leaderboard_update(leaderboard_payload))
            .await;

        Ok((p1, p2))
    }

    /// Cache-preferring leaderboard read (§4.3 cache coherence). A cache
    /// miss triggers a full rebuild from the database.
    pub async fn leaderboard(
        &self,
        tournament: ID<Tournament>,
    ) -> Result<Vec<arbiter_persistence::models::LeaderboardEntry>, CoreError> {
        if let Some(pairs) = self.cache.snapshot(tournament).await? {
            if !pairs.is_empty() {
                return Ok(rank_snapshot(pairs));
            }
        }
        let entries = self.repo.leaderboard(tournament).await?;
        if let Err(err) = self.cache.rebuild(tournament, &entries).await {
            log::warn!("leaderboard cache rebuild failed for {tournament}: {err}");
        }
        Ok(entries)
    }

    /// Per-game leaderboard: always aggregated fresh, the cache only tracks
    /// cross-game totals.
    pub async fn leaderboard_by_game(
        &self,
        tournament: ID<Tournament>,
        game: &str,
    ) -> Result<Vec<arbiter_persistence::models::LeaderboardEntry>, CoreError> {
        self.repo.leaderboard_by_game(tournament, game).await
    }

    /// Cross-game standings (§4.3): grouped by team (falling back to program
    /// for unteamed entries), summed across every game, always read fresh —
    /// the leaderboard cache only tracks per-program cross-game totals, not
    /// team groupings or per-game breakdowns.
    pub async fn cross_game_leaderboard(
        &self,
        tournament: ID<Tournament>,
    ) -> Result<Vec<arbiter_persistence::models::CrossGameLeaderboardEntry>, CoreError> {
        self.repo.cross_game_leaderboard(tournament).await
    }

    /// Invalidate the cache after a tournament reconfiguration or a match retry.
    pub async fn invalidate(&self, tournament: ID<Tournament>) -> Result<(), CoreError> {
        self.cache.invalidate(tournament).await
    }
}

//! Leaderboard cache coherence (§4.3). The cache is a sorted set keyed
//! `leaderboard:<tournament>` mapping program -> rating. Result application
//! issues a commutative `ZINCRBY` for the affected programs so concurrent
//! increments compose correctly without a single-writer-per-key requirement.
//! A cache miss triggers a full rebuild from the database; a hit is trusted
//! until explicitly invalidated (tournament reconfiguration or match retry).

use arbiter_core::CoreError;
use arbiter_core::ID;
use arbiter_coordination::RedisPool;
use arbiter_persistence::models::LeaderboardEntry;
use arbiter_persistence::models::Program;
use arbiter_persistence::models::Tournament;
use redis::AsyncCommands;

fn key(tournament: ID<Tournament>) -> String {
    format!("leaderboard:{tournament}")
}

#[derive(Clone)]
pub struct LeaderboardCache {
    pool: RedisPool,
}

impl LeaderboardCache {
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }

    /// Commutative increment of a single participant's cached rating.
    pub async fn bump(&self, tournament: ID<Tournament>, program: ID<Program>, delta: i64) -> Result<(), CoreError> {
        let mut conn = self.pool.get().await?;
        let _: f64 = conn.zincr(key(tournament), program.inner().to_string(), delta as f64).await?;
        Ok(())
    }

    /// `rank DESC` program/rating pairs currently cached, or `None` on a
    /// cache miss (key absent — never populated, or explicitly invalidated).
    pub async fn snapshot(&self, tournament: ID<Tournament>) -> Result<Option<Vec<(ID<Program>, i64)>>, CoreError> {
        let mut conn = self.pool.get().await?;
        if !conn.exists(key(tournament)).await? {
            return Ok(None);
        }
        let raw: Vec<(String, f64)> = conn.zrevrange_withscores(key(tournament), 0, -1).await?;
        Ok(Some(
            raw.into_iter()
                .filter_map(|(member, score)| {
                    uuid::Uuid::parse_str(&member).ok().map(|id| (ID::from(id), score as i64))
                })
                .collect(),
        ))
    }

    /// Rebuild the cache in full from authoritative entries (cache-miss path).
    pub async fn rebuild(&self, tournament: ID<Tournament>, entries: &[LeaderboardEntry]) -> Result<(), CoreError> {
        let mut conn = self.pool.get().await?;
        let _: () = conn.del(key(tournament)).await?;
        if entries.is_empty() {
            return Ok(());
        }
        let members: Vec<(f64, String)> = entries
            .iter()
            .map(|e| (e.rating as f64, e.program.inner().to_string()))
            .collect();
        let _: () = conn.zadd_multiple(key(tournament), &members).await?;
        Ok(())
    }

    /// Drop the cache for a tournament: called on reconfiguration or match retry.
    pub async fn invalidate(&self, tournament: ID<Tournament>) -> Result<(), CoreError> {
        let mut conn = self.pool.get().await?;
        let _: () = conn.del(key(tournament)).await?;
        Ok(())
    }
}

/// Turn cached `(program, rating)` pairs into dense-ranked entries,
/// sorted `rating DESC, program_id ASC`. Win/loss/draw detail is not part
/// of the fast cache path; callers needing it fall through to the database.
pub fn rank_snapshot(mut pairs: Vec<(ID<Program>, i64)>) -> Vec<LeaderboardEntry> {
    pairs.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    let mut entries = Vec::with_capacity(pairs.len());
    let mut rank = 0i64;
    let mut last_rating = None;
    for (program, rating) in pairs {
        if last_rating != Some(rating) {
            rank += 1;
            last_rating = Some(rating);
        }
        entries.push(LeaderboardEntry {
            rank,
            program,
            rating,
            wins: 0,
            losses: 0,
            draws: 0,
            total_games: 0,
        });
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ties_share_a_dense_rank() {
        let a = ID::default();
        let b = ID::default();
        let c = ID::default();
        let ranked = rank_snapshot(vec![(a, 5), (b, 5), (c, 1)]);
        assert_eq!(ranked[0].rank, 1);
        assert_eq!(ranked[1].rank, 1);
        assert_eq!(ranked[2].rank, 2);
    }
}

//! Round generation (§4.1): when a tournament's game transitions active, the
//! scheduler computes an all-pairs round over the latest program version per
//! team (or per participant in solo mode). Guarded by a distributed lock so
//! concurrent triggers cannot produce duplicate rounds.

use arbiter_core::CoreError;
use arbiter_core::Priority;
use arbiter_core::TournamentStatus;
use arbiter_core::ID;
use arbiter_coordination::DistributedLock;
use arbiter_coordination::Event;
use arbiter_coordination::EventBus;
use arbiter_coordination::PubSub;
use arbiter_persistence::match_repo::MatchRepository;
use arbiter_persistence::models::Match;
use arbiter_persistence::models::Program;
use arbiter_persistence::models::Tournament;
use arbiter_persistence::program_repo::ProgramRepository;
use arbiter_persistence::tournament_game_repo::TournamentGameRepository;
use arbiter_persistence::tournament_repo::TournamentRepository;
use std::sync::Arc;
use std::time::Duration;

use crate::queue::Queue;

pub struct RoundGenerator<R> {
    queue: Queue<R>,
    lock: DistributedLock,
    lock_ttl: Duration,
    bus: Arc<EventBus>,
    pubsub: PubSub,
}

impl<R> RoundGenerator<R>
where
    R: MatchRepository + ProgramRepository + TournamentGameRepository + TournamentRepository + Clone,
{
    pub fn new(
        queue: Queue<R>,
        lock: DistributedLock,
        lock_ttl: Duration,
        bus: Arc<EventBus>,
        pubsub: PubSub,
    ) -> Self {
        Self { queue, lock, lock_ttl, bus, pubsub }
    }

    fn repo(&self) -> &R {
        self.queue.repo()
    }

    /// Transitions a tournament pending -> active and publishes
    /// `tournament_started` (§4.4/§6). Guarded by the same lock keyspace as
    /// round generation so a start can't race a concurrent start.
    pub async fn start(&self, tournament: ID<Tournament>, expected_version: i64) -> Result<(), CoreError> {
        let lock_key = format!("schedule:{tournament}:start");
        let repo = self.repo().clone();
        self.lock
            .with_lock(&lock_key, self.lock_ttl, || async move {
                repo.update_status(tournament, expected_version, TournamentStatus::Active).await
            })
            .await?;

        let payload = serde_json::json!({ "tournament_id": tournament });
        self.bus.publish(&tournament.to_string(), Event::tournament_started(payload.clone()));
        self.pubsub.publish(&tournament.to_string(), &Event::tournament_started(payload)).await;
        Ok(())
    }

    /// Produces the next round's all-pairs matches for `(tournament, game)`
    /// and enqueues them atomically. If the prior round was still open, marks
    /// it completed and publishes `round_completed` before advancing. Returns
    /// the matches created, or an empty vec if fewer than two programs are
    /// registered.
    pub async fn generate_round(
        &self,
        tournament: ID<Tournament>,
        game: &str,
    ) -> Result<Vec<Match>, CoreError> {
        let lock_key = format!("schedule:{tournament}:{game}");
        let repo = self.repo().clone();
        let queue = &self.queue;
        let bus = self.bus.clone();
        let pubsub = self.pubsub.clone();
        self.lock
            .with_lock(&lock_key, self.lock_ttl, || async move {
                let state = repo.get_or_create(tournament, game).await?;
                let programs = repo.latest_for_tournament(tournament, game).await?;
                let next_round = repo.max_round(tournament, game).await? + 1;
                let matches = all_pairs(tournament, game, next_round, &programs);
                if matches.is_empty() {
                    return Ok(Vec::new());
                }
                queue.batch_create(&matches).await?;

                if !state.round_completed {
                    repo.mark_round_completed(tournament, game).await?;
                    let payload = serde_json::json!({
                        "tournament_id": tournament,
                        "game": game,
                        "round": state.current_round,
                    });
                    bus.publish(&tournament.to_string(), Event::round_completed(payload.clone()));
                    pubsub.publish(&tournament.to_string(), &Event::round_completed(payload)).await;
                }

                repo.advance_round(tournament, game, next_round).await?;
                Ok(matches)
            })
            .await
    }
}

fn all_pairs(tournament: ID<Tournament>, game: &str, round: i32, programs: &[Program]) -> Vec<Match> {
    let mut matches = Vec::new();
    for i in 0..programs.len() {
        for j in (i + 1)..programs.len() {
            let a = programs[i].id;
            let b = programs[j].id;
            if a == b {
                continue;
            }
            matches.push(Match::new(tournament, a, b, game, Priority::default(), round));
        }
    }
    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbiter_core::Unique;

    fn program(owner_seed: u8) -> Program {
        Program {
            id: ID::default(),
            owner: ID::from(uuid::Uuid::from_bytes([owner_seed; 16])),
            team: None,
            tournament: None,
            game: Some("rps".into()),
            display_name: format!("p{owner_seed}"),
            source_path: "/tmp/p".into(),
            language: "rust".into(),
            version: 1,
        }
    }

    #[test]
    fn three_programs_produce_three_unordered_pairs() {
        let t = ID::default();
        let programs = vec![program(1), program(2), program(3)];
        let matches = all_pairs(t, "rps", 1, &programs);
        assert_eq!(matches.len(), 3);
        for m in &matches {
            assert_ne!(m.p1, m.p2);
            assert_eq!(m.round, 1);
        }
    }

    #[test]
    fn single_program_produces_no_matches() {
        let t = ID::default();
        let programs = vec![program(1)];
        assert!(all_pairs(t, "rps", 1, &programs).is_empty());
        let _ = programs[0].id();
    }
}

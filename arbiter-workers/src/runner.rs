//! External runner boundary (§6). Treated as a pure, stateless RPC: the
//! core does not audit the runner's sandboxing, only its contract.

use arbiter_core::CoreError;
use arbiter_core::Winner;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub score1: i32,
    pub score2: i32,
    pub winner: Winner,
    pub duration: Duration,
}

#[async_trait::async_trait]
pub trait Runner: Send + Sync {
    async fn run(
        &self,
        game_type: &str,
        program_a: &[u8],
        program_b: &[u8],
        iterations: u32,
    ) -> Result<RunOutcome, CoreError>;
}

/// Deterministic stand-in used by tests: compares blob lengths as a stable,
/// reproducible "score" so a worker loop can be exercised without a real
/// sandboxed runner.
pub struct DeterministicStubRunner;

#[async_trait::async_trait]
impl Runner for DeterministicStubRunner {
    async fn run(
        &self,
        _game_type: &str,
        program_a: &[u8],
        program_b: &[u8],
        _iterations: u32,
    ) -> Result<RunOutcome, CoreError> {
        let score1 = program_a.len() as i32;
        let score2 = program_b.len() as i32;
        let winner = match score1.cmp(&score2) {
            std::cmp::Ordering::Greater => Winner::P1,
            std::cmp::Ordering::Less => Winner::P2,
            std::cmp::Ordering::Equal => Winner::Draw,
        };
        Ok(RunOutcome { score1, score2, winner, duration: Duration::from_millis(1) })
    }
}

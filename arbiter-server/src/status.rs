//! `status` subcommand: a read-only snapshot of a tournament's queue depth
//! and leaderboard, for operators who don't want to open a SQL console.

use arbiter_core::Config;
use arbiter_core::CoreResult;
use arbiter_core::ID;
use arbiter_persistence::match_repo::MatchRepository;

use crate::context::Platform;

pub async fn run(config: Config, tournament: uuid::Uuid) -> CoreResult<()> {
    let platform = Platform::connect(config).await?;
    let tournament_id = ID::from(tournament);

    let pending = platform.repo.list_pending(tournament_id).await?;
    let depth = platform.queue.depth().await?;
    let leaderboard = platform.rating.leaderboard(tournament_id).await?;

    println!("tournament:      {tournament}");
    println!("pending matches: {}", pending.len());
    println!("queue depth:     {depth}");
    println!("leaderboard:");
    for entry in &leaderboard {
        println!(
            "  #{:<3} {:<38} rating={:<6} w/l/d={}/{}/{}",
            entry.rank, entry.program, entry.rating, entry.wins, entry.losses, entry.draws
        );
    }
    Ok(())
}

//! Table name constants, consolidated so every repository builds its SQL
//! from the same single source of truth.

/// Table for scheduled pairwise contests.
#[rustfmt::skip]
pub const MATCHES:      &str = "matches";
/// Table for tournament containers.
#[rustfmt::skip]
pub const TOURNAMENTS:  &str = "tournaments";
/// Table for user-submitted programs.
#[rustfmt::skip]
pub const PROGRAMS:     &str = "programs";
/// Table for the (tournament, program) junction carrying rating and record.
#[rustfmt::skip]
pub const PARTICIPANTS: &str = "tournament_participants";
/// Table for the rating audit log.
#[rustfmt::skip]
pub const RATING_HISTORY: &str = "rating_history";
/// Table for teams of co-participating users.
#[rustfmt::skip]
pub const TEAMS:        &str = "teams";
/// Table for the (tournament, game) junction tracking round progress.
#[rustfmt::skip]
pub const TOURNAMENT_GAMES: &str = "tournament_games";
/// Materialized view used as the leaderboard fast path when present.
#[rustfmt::skip]
pub const LEADERBOARD_VIEW: &str = "leaderboard_tournament";

//! Entities of §3, modeled as plain structs. Relationships are stored as
//! `ID<T>` references, never back-pointers; repositories resolve them at
//! query time and return maps keyed by id to avoid N+1 (§9).

use arbiter_core::ID;
use arbiter_core::MatchStatus;
use arbiter_core::Priority;
use arbiter_core::TournamentStatus;
use arbiter_core::Unique;
use arbiter_core::Winner;
use chrono::DateTime;
use chrono::Utc;

/// Marker type for a platform user. Authentication and profile data live
/// outside the core (§1); only the identifier crosses this boundary.
pub struct User;

#[derive(Debug, Clone)]
pub struct Match {
    pub id: ID<Match>,
    pub tournament: ID<Tournament>,
    pub p1: ID<Program>,
    pub p2: ID<Program>,
    pub game: String,
    pub status: MatchStatus,
    pub priority: Priority,
    pub round: i32,
    pub score1: Option<i32>,
    pub score2: Option<i32>,
    pub winner: Option<Winner>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Unique<Match> for Match {
    fn id(&self) -> ID<Match> {
        self.id
    }
}

impl Match {
    /// A freshly scheduled match: pending, no result, no timestamps but `created_at`.
    pub fn new(
        tournament: ID<Tournament>,
        p1: ID<Program>,
        p2: ID<Program>,
        game: impl Into<String>,
        priority: Priority,
        round: i32,
    ) -> Self {
        assert_ne!(p1, p2, "a match cannot pair a program against itself");
        Self {
            id: ID::default(),
            tournament,
            p1,
            p2,
            game: game.into(),
            status: MatchStatus::Pending,
            priority,
            round,
            score1: None,
            score2: None,
            winner: None,
            error_message: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Tournament {
    pub id: ID<Tournament>,
    pub code: String,
    pub name: String,
    pub game: String,
    pub status: TournamentStatus,
    pub max_participants: Option<i32>,
    pub team_size: Option<i32>,
    pub creator: ID<User>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub metadata: serde_json::Value,
    pub version: i64,
}

impl Unique<Tournament> for Tournament {
    fn id(&self) -> ID<Tournament> {
        self.id
    }
}

#[derive(Debug, Clone)]
pub struct Program {
    pub id: ID<Program>,
    pub owner: ID<User>,
    pub team: Option<ID<Team>>,
    pub tournament: Option<ID<Tournament>>,
    pub game: Option<String>,
    pub display_name: String,
    pub source_path: String,
    pub language: String,
    pub version: i32,
}

impl Unique<Program> for Program {
    fn id(&self) -> ID<Program> {
        self.id
    }
}

/// `(tournament, program)` junction (§3). Rating is the authoritative field
/// the leaderboard reads from — `initial rating` below is advisory metadata
/// only, see DESIGN.md's Open Question decision.
#[derive(Debug, Clone)]
pub struct TournamentParticipant {
    pub tournament: ID<Tournament>,
    pub program: ID<Program>,
    pub rating: i64,
    pub wins: i32,
    pub losses: i32,
    pub draws: i32,
    pub joined_at: DateTime<Utc>,
}

impl TournamentParticipant {
    /// The stored baseline of 1500 per §9's Open Question: historical
    /// metadata only, never consulted by leaderboard queries.
    pub const ADVISORY_BASELINE_RATING: i64 = 1500;

    pub fn new(tournament: ID<Tournament>, program: ID<Program>) -> Self {
        Self {
            tournament,
            program,
            rating: 0,
            wins: 0,
            losses: 0,
            draws: 0,
            joined_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RatingHistory {
    pub id: ID<RatingHistory>,
    pub r#match: ID<Match>,
    pub program: ID<Program>,
    pub tournament: ID<Tournament>,
    pub old_rating: i64,
    pub new_rating: i64,
    pub delta: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Team {
    pub id: ID<Team>,
    pub tournament: ID<Tournament>,
    pub code: String,
    pub leader: ID<User>,
    pub members: Vec<ID<User>>,
}

impl Unique<Team> for Team {
    fn id(&self) -> ID<Team> {
        self.id
    }
}

impl Team {
    pub fn new(tournament: ID<Tournament>, leader: ID<User>, code: impl Into<String>) -> Self {
        Self {
            id: ID::default(),
            tournament,
            code: code.into(),
            leader,
            members: vec![leader],
        }
    }
}

#[derive(Debug, Clone)]
pub struct TournamentGame {
    pub tournament: ID<Tournament>,
    pub game: String,
    pub current_round: i32,
    pub round_completed: bool,
}

/// Derived projection (§3), never persisted on its own.
#[derive(Debug, Clone, serde::Serialize)]
pub struct LeaderboardEntry {
    pub rank: i64,
    pub program: ID<Program>,
    pub rating: i64,
    pub wins: i32,
    pub losses: i32,
    pub draws: i32,
    pub total_games: i32,
}

/// A cross-game leaderboard row's identity: a team if the program belongs to
/// one, otherwise the program itself (§4.3 "groups by team, falling back to
/// program for unteamed entries").
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LeaderboardGroup {
    Team(ID<Team>),
    Program(ID<Program>),
}

/// Derived projection (§4.3), summed across every game a group played.
#[derive(Debug, Clone, serde::Serialize)]
pub struct CrossGameLeaderboardEntry {
    pub rank: i64,
    pub group: LeaderboardGroup,
    pub rating: i64,
    pub wins: i32,
    pub losses: i32,
    pub draws: i32,
    pub total_games: i32,
    /// Per-game rating breakdown, game name to summed score.
    pub per_game: Vec<(String, i64)>,
}

//! Core identifiers, error taxonomy, configuration, and runtime utilities
//! shared by every subsystem of the tournament judging platform.
#![allow(dead_code)]

mod config;
mod error;
#[cfg(feature = "server")]
mod runtime;

pub use config::*;
pub use error::*;
#[cfg(feature = "server")]
pub use runtime::*;

// ============================================================================
// IDENTITY TYPES
// ============================================================================
use std::cmp::Ordering;
use std::fmt::Debug;
use std::fmt::Display;
use std::fmt::Formatter;
use std::hash::Hash;
use std::hash::Hasher;
use std::marker::PhantomData;

/// Generic identifier wrapper providing compile-time type safety over `uuid::Uuid`.
///
/// `ID<Match>` and `ID<Tournament>` are distinct types even though both wrap
/// the same underlying uuid, so a repository can never accidentally accept
/// one where the other is required.
pub struct ID<T> {
    inner: uuid::Uuid,
    marker: PhantomData<T>,
}

impl<T> ID<T> {
    pub fn inner(&self) -> uuid::Uuid {
        self.inner
    }
    /// Cast `ID<T>` to `ID<U>` while preserving the underlying uuid.
    pub fn cast<U>(self) -> ID<U> {
        ID {
            inner: self.inner,
            marker: PhantomData,
        }
    }
}

impl<T> From<ID<T>> for uuid::Uuid {
    fn from(id: ID<T>) -> Self {
        id.inner()
    }
}
impl<T> From<uuid::Uuid> for ID<T> {
    fn from(inner: uuid::Uuid) -> Self {
        Self {
            inner,
            marker: PhantomData,
        }
    }
}

impl<T> Default for ID<T> {
    fn default() -> Self {
        Self {
            inner: uuid::Uuid::now_v7(),
            marker: PhantomData,
        }
    }
}

impl<T> Copy for ID<T> {}
impl<T> Clone for ID<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Eq for ID<T> {}
impl<T> PartialEq for ID<T> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<T> Ord for ID<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.inner.cmp(&other.inner)
    }
}
impl<T> PartialOrd for ID<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Hash for ID<T> {
    fn hash<H>(&self, state: &mut H)
    where
        H: Hasher,
    {
        self.inner.hash(state);
    }
}

impl<T> Debug for ID<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ID").field(&self.inner).finish()
    }
}
impl<T> Display for ID<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.inner, f)
    }
}

impl<T> serde::Serialize for ID<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.inner.serialize(serializer)
    }
}
impl<'de, T> serde::Deserialize<'de> for ID<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Ok(Self::from(uuid::Uuid::deserialize(deserializer)?))
    }
}

/// Entities that can report their own identifier.
pub trait Unique<T = Self> {
    fn id(&self) -> ID<T>;
}

// ============================================================================
// DOMAIN ENUMS SHARED ACROSS CRATES
// ============================================================================

/// Outcome of a terminal match, from the winning side's perspective.
/// `0` is a draw, `1` and `2` identify the winning slot (`p1`/`p2`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Winner {
    Draw,
    P1,
    P2,
}

impl From<i16> for Winner {
    fn from(value: i16) -> Self {
        match value {
            1 => Winner::P1,
            2 => Winner::P2,
            _ => Winner::Draw,
        }
    }
}
impl From<Winner> for i16 {
    fn from(value: Winner) -> Self {
        match value {
            Winner::Draw => 0,
            Winner::P1 => 1,
            Winner::P2 => 2,
        }
    }
}

/// Queue priority. Ordinal order doubles as the queue's sort key: high < medium < low.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    /// Rank used to build the queue's composite sort score: lower is dequeued first.
    pub fn rank(self) -> u64 {
        match self {
            Priority::High => 0,
            Priority::Medium => 1,
            Priority::Low => 2,
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

/// Lifecycle status of a scheduled match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl MatchStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchStatus::Pending => "pending",
            MatchStatus::Running => "running",
            MatchStatus::Completed => "completed",
            MatchStatus::Failed => "failed",
        }
    }
    pub fn is_terminal(self) -> bool {
        matches!(self, MatchStatus::Completed | MatchStatus::Failed)
    }
}

impl std::str::FromStr for MatchStatus {
    type Err = CoreError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(MatchStatus::Pending),
            "running" => Ok(MatchStatus::Running),
            "completed" => Ok(MatchStatus::Completed),
            "failed" => Ok(MatchStatus::Failed),
            other => Err(CoreError::Internal(format!("unrecognized match status: {other}"))),
        }
    }
}

/// Lifecycle status of a tournament. Progression is monotonic: Pending -> Active -> Completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentStatus {
    Pending,
    Active,
    Completed,
}

impl TournamentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TournamentStatus::Pending => "pending",
            TournamentStatus::Active => "active",
            TournamentStatus::Completed => "completed",
        }
    }

    /// Lifecycle rank, used to enforce the no-regression invariant in a
    /// single CAS update rather than a separate read-then-write.
    pub fn rank(self) -> i16 {
        match self {
            TournamentStatus::Pending => 0,
            TournamentStatus::Active => 1,
            TournamentStatus::Completed => 2,
        }
    }
}

impl std::str::FromStr for TournamentStatus {
    type Err = CoreError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TournamentStatus::Pending),
            "active" => Ok(TournamentStatus::Active),
            "completed" => Ok(TournamentStatus::Completed),
            other => Err(CoreError::Internal(format!("unrecognized tournament status: {other}"))),
        }
    }
}

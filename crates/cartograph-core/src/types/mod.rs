//! # Core Type Definitions
//!
//! This module contains the shared vocabulary of the map engine:
//! - Room identifiers (`RoomId`, `Uid`)
//! - Travel costs (`Cost`, `EdgeCost`, `CostFnId`)
//! - Outgoing edges (`Exit`)
//! - Error types (`NavError`)
//!
//! ## Determinism Guarantees
//!
//! All types in this module:
//! - Use integer arithmetic only (costs are fixed-point thousandths of a second)
//! - Implement `Ord` for deterministic ordering in `BTreeMap`/`BTreeSet`
//! - Use saturating arithmetic for accumulated costs

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Dense, game-local primary key of a room.
///
/// Ids are never reused: new rooms take one past the current maximum.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct RoomId(pub u32);

impl RoomId {
    /// The id following this one, saturating at `u32::MAX`.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable external identifier of a room, decoupled from `RoomId`.
///
/// One logical room may carry several uids, and historical duplication can
/// leave several rooms sharing one uid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Uid(pub u64);

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// COSTS
// =============================================================================

/// Travel cost in thousandths of a second.
///
/// Map files store fractional seconds (`0.2`); inside the engine every cost is
/// an integer so that path comparisons are exact.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Cost(pub u64);

impl Cost {
    /// Zero cost.
    pub const ZERO: Self = Self(0);

    /// Create a cost from thousandths of a second.
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// Raw value in thousandths of a second.
    #[must_use]
    pub const fn millis(self) -> u64 {
        self.0
    }

    /// Add two costs, saturating at `u64::MAX`.
    #[must_use]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Convert fractional seconds as found in map files.
    ///
    /// Negative, NaN and infinite values are rejected.
    #[allow(clippy::float_arithmetic)]
    pub fn from_secs_f64(secs: f64) -> Result<Self, NavError> {
        if !secs.is_finite() || secs < 0.0 {
            return Err(NavError::InvalidCost(secs.to_string()));
        }
        let millis = (secs * 1000.0).round();
        if millis >= u64::MAX as f64 {
            return Err(NavError::InvalidCost(secs.to_string()));
        }
        Ok(Self(millis as u64))
    }

    /// Fractional seconds, for writing map files.
    #[allow(clippy::float_arithmetic)]
    #[must_use]
    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / 1000.0
    }
}

impl fmt::Display for Cost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:03}s", self.0 / 1000, self.0 % 1000)
    }
}

/// Name of a registered dynamic cost function.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CostFnId(pub String);

impl CostFnId {
    /// Create a function id from a name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Cost of traversing one edge.
///
/// `Computed` names a function in the `CostRegistry`; it is resolved only when
/// the edge is relaxed during a search, never while loading.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum EdgeCost {
    /// The edge exists but may not be traversed.
    #[default]
    Disabled,
    /// Static cost.
    Fixed(Cost),
    /// Cost decided at traversal time by a registered function.
    Computed(CostFnId),
}

impl EdgeCost {
    /// Static cost from fractional seconds.
    pub fn from_secs_f64(secs: f64) -> Result<Self, NavError> {
        Cost::from_secs_f64(secs).map(Self::Fixed)
    }

    /// Dynamic cost naming a registered function.
    #[must_use]
    pub fn computed(name: impl Into<String>) -> Self {
        Self::Computed(CostFnId::new(name))
    }

    /// Check if this edge can never be traversed.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        matches!(self, Self::Disabled)
    }
}

// =============================================================================
// EXIT
// =============================================================================

/// One outgoing edge: the movement command and its cost.
///
/// Keeping both halves in one value means the `wayto` and `timeto` maps of a
/// room always share the same key set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Exit {
    /// Command issued to traverse the edge (`north`, `go door`, ...).
    pub command: String,
    /// Traversal cost.
    pub cost: EdgeCost,
}

impl Exit {
    /// Create a new exit.
    #[must_use]
    pub fn new(command: impl Into<String>, cost: EdgeCost) -> Self {
        Self {
            command: command.into(),
            cost,
        }
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the map engine.
///
/// - No silent failures
/// - Use `Result<T, NavError>` for fallible operations
/// - The engine never panics; unreachable rooms are not errors
#[derive(Debug, Error)]
pub enum NavError {
    /// The requested room is not in the map.
    #[error("Room not found: {0}")]
    RoomNotFound(RoomId),

    /// No loadable map file was found.
    #[error("No map data found in {}", .0.display())]
    NoMapData(PathBuf),

    /// The store has not been loaded.
    #[error("Map not loaded")]
    NotLoaded,

    /// A computed edge names a function that is not registered.
    #[error("Unknown cost function: {0}")]
    UnknownCostFunction(String),

    /// A cost value could not be represented.
    #[error("Invalid cost: {0}")]
    InvalidCost(String),

    /// Observed room text was rejected before resolution.
    #[error("Invalid observation: {0}")]
    InvalidObservation(String),

    /// The requested format cannot perform this operation.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A serialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A deserialization error occurred.
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(String),

    /// The in-memory map failed its self-check.
    #[error("Integrity violation: {0}")]
    Integrity(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<std::io::Error> for NavError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cost_from_fractional_seconds() {
        assert_eq!(Cost::from_secs_f64(0.2).expect("cost"), Cost(200));
        assert_eq!(Cost::from_secs_f64(15.0).expect("cost"), Cost(15_000));
        assert_eq!(Cost::from_secs_f64(0.0).expect("cost"), Cost::ZERO);
    }

    #[test]
    fn cost_rejects_negative_and_nan() {
        assert!(Cost::from_secs_f64(-1.0).is_err());
        assert!(Cost::from_secs_f64(f64::NAN).is_err());
        assert!(Cost::from_secs_f64(f64::INFINITY).is_err());
    }

    #[test]
    fn cost_saturating_add() {
        let near_max = Cost(u64::MAX - 1);
        assert_eq!(near_max.saturating_add(Cost(5)), Cost(u64::MAX));
        assert_eq!(Cost(200).saturating_add(Cost(300)), Cost(500));
    }

    #[test]
    fn cost_display_is_seconds() {
        assert_eq!(Cost(200).to_string(), "0.200s");
        assert_eq!(Cost(12_005).to_string(), "12.005s");
    }

    #[test]
    fn room_id_next_saturates() {
        assert_eq!(RoomId(4).next(), RoomId(5));
        assert_eq!(RoomId(u32::MAX).next(), RoomId(u32::MAX));
    }

    #[test]
    fn default_edge_cost_is_disabled() {
        assert!(EdgeCost::default().is_disabled());
        assert!(!EdgeCost::computed("closed").is_disabled());
    }
}

//! # cartograph-core
//!
//! The navigation map engine for text-game automation.
//!
//! This crate holds a persistent, weighted, directed graph of game rooms and
//! answers travel questions over it: shortest routes, nearest room among a
//! set, nearest room carrying a tag. It also figures out which mapped room
//! the player is standing in from what the game shows, mapping new rooms as
//! they are discovered.
//!
//! ## Layout
//!
//! - `types`, `primitives`: shared vocabulary and constants
//! - `heap`, `pathfinding`: min-heap and Dijkstra-based queries
//! - `room`, `graph`: the room entity and the shared graph operations
//! - `profile`: per-game identity rules (GemStone IV, DragonRealms)
//! - `cost`: named functions for dynamically priced edges
//! - `formats`, `storage`: map file encodings and the map directory
//! - `observe`, `metrics`: observed room input and summary counts
//! - `store`: the lazily loaded, lock-guarded session map
//!
//! ## Constraints
//!
//! - Deterministic: `BTreeMap` everywhere, integer costs, lowest-id tie-breaks
//! - No async, no network
//! - Nothing read from a map file is ever executed

// =============================================================================
// MODULES
// =============================================================================

pub mod cost;
pub mod formats;
pub mod graph;
pub mod heap;
pub mod metrics;
pub mod observe;
pub mod pathfinding;
pub mod primitives;
pub mod profile;
pub mod room;
pub mod storage;
pub mod store;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{Cost, CostFnId, EdgeCost, Exit, NavError, RoomId, Uid};

// =============================================================================
// RE-EXPORTS: Graph Engine
// =============================================================================

pub use cost::{CostFn, CostRegistry};
pub use graph::{IntegrityViolation, RoomGraph};
pub use heap::MinHeap;
pub use metrics::MapMetrics;
pub use observe::ObservedRoom;
pub use pathfinding::ShortestPaths;
pub use room::{Environment, MergePolicy, PeerRequirement, Room};

// =============================================================================
// RE-EXPORTS: Profiles, Persistence, Store
// =============================================================================

pub use formats::MapFormat;
pub use profile::{
    DragonRealmsProfile, ExtraField, FieldKind, GameProfile, GemstoneProfile, PeerObserver,
};
pub use storage::{MapDirectory, MapFile};
pub use store::{MapStore, SaveOutcome};

//! # Map Store
//!
//! The session-wide owner of the map: directory, game profile, cost
//! functions, and the room graph behind a read-write lock.
//!
//! ## Locking
//!
//! - Queries take the read lock and run concurrently with each other
//! - Load, clear, reload, save and every mutation take the write lock
//! - The first query on an unloaded store upgrades to a write lock, loads,
//!   then downgrades; concurrent first queries wait for that single load
//!
//! `current_or_new` resolves the room under an upgradable read, so queries
//! keep running while a profile issues peer commands; only the merge or
//! insert takes the write lock.
//!
//! Cost functions are evaluated while the read lock is held. They must not
//! call back into the store.

use crate::cost::CostRegistry;
use crate::formats::MapFormat;
use crate::graph::RoomGraph;
use crate::metrics::MapMetrics;
use crate::observe::ObservedRoom;
use crate::pathfinding::ShortestPaths;
use crate::primitives::TAG_MULTI_UID;
use crate::profile::GameProfile;
use crate::room::Room;
use crate::storage::MapDirectory;
use crate::{Cost, NavError, RoomId, Uid};
use parking_lot::{RwLock, RwLockReadGuard, RwLockUpgradableReadGuard, RwLockWriteGuard};
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Result of `MapStore::save`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The map was written to this file.
    Saved(PathBuf),
    /// The in-memory map failed its integrity check and was reloaded from
    /// disk instead of being written.
    Reloaded,
}

#[derive(Debug, Default)]
struct MapState {
    graph: RoomGraph,
    loaded: bool,
    current: Option<RoomId>,
    previous: Option<RoomId>,
}

/// Lazily loaded, lock-guarded navigation map.
pub struct MapStore {
    directory: MapDirectory,
    profile: Arc<dyn GameProfile>,
    costs: CostRegistry,
    save_format: MapFormat,
    keep_files: usize,
    state: RwLock<MapState>,
}

impl fmt::Debug for MapStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapStore")
            .field("directory", &self.directory)
            .field("profile", &self.profile.name())
            .field("save_format", &self.save_format)
            .field("loaded", &self.state.try_read().map(|s| s.loaded))
            .finish_non_exhaustive()
    }
}

impl MapStore {
    /// Create an unloaded store. Built-in cost functions are registered.
    #[must_use]
    pub fn new(directory: MapDirectory, profile: Arc<dyn GameProfile>) -> Self {
        Self {
            directory,
            profile,
            costs: CostRegistry::with_builtins(),
            save_format: MapFormat::Json,
            keep_files: 0,
            state: RwLock::new(MapState::default()),
        }
    }

    /// Replace the cost registry.
    #[must_use]
    pub fn with_costs(mut self, costs: CostRegistry) -> Self {
        self.costs = costs;
        self
    }

    /// Format used by `save`.
    #[must_use]
    pub fn with_save_format(mut self, format: MapFormat) -> Self {
        self.save_format = format;
        self
    }

    /// Prune old map files after each save, keeping this many (0: never prune).
    #[must_use]
    pub fn with_keep_files(mut self, keep: usize) -> Self {
        self.keep_files = keep;
        self
    }

    /// The map directory.
    #[must_use]
    pub fn directory(&self) -> &MapDirectory {
        &self.directory
    }

    /// The game profile.
    #[must_use]
    pub fn profile(&self) -> &dyn GameProfile {
        self.profile.as_ref()
    }

    /// The cost registry used by path queries.
    #[must_use]
    pub fn costs(&self) -> &CostRegistry {
        &self.costs
    }

    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    /// Check if the map is in memory.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.state.read().loaded
    }

    /// Load the map from disk unless already loaded.
    pub fn load(&self) -> Result<(), NavError> {
        let mut state = self.state.write();
        if state.loaded {
            return Ok(());
        }
        self.load_into(&mut state)
    }

    /// Drop the in-memory map. The next query loads it again.
    pub fn clear(&self) {
        let mut state = self.state.write();
        Self::reset(&mut state);
        tracing::debug!("Cleared map");
    }

    /// Clear and load again from disk.
    pub fn reload(&self) -> Result<(), NavError> {
        let mut state = self.state.write();
        Self::reset(&mut state);
        self.load_into(&mut state)
    }

    /// Treat the current in-memory map as loaded without reading disk.
    ///
    /// Used to start a new map in an empty directory.
    pub fn mark_loaded(&self) {
        self.state.write().loaded = true;
    }

    /// Save in the configured format.
    pub fn save(&self) -> Result<SaveOutcome, NavError> {
        self.save_as(self.save_format)
    }

    /// Save in `format`.
    ///
    /// The map is checked first. A map failing the check is not written;
    /// it is reloaded from the last good file instead.
    pub fn save_as(&self, format: MapFormat) -> Result<SaveOutcome, NavError> {
        if !format.is_writable() {
            return Err(NavError::UnsupportedFormat(format!(
                "{} maps are read-only",
                format
            )));
        }

        let mut state = self.state.write();
        if !state.loaded {
            return Err(NavError::NotLoaded);
        }

        if let Err(violation) = state.graph.check_integrity() {
            tracing::warn!(%violation, "Map failed integrity check, reloading instead of saving");
            Self::reset(&mut state);
            self.load_into(&mut state)?;
            return Ok(SaveOutcome::Reloaded);
        }

        let rooms: Vec<Room> = state.graph.rooms().cloned().collect();
        let path = self.directory.save(&rooms, format)?;
        tracing::info!(path = %path.display(), rooms = rooms.len(), %format, "Saved map");

        if self.keep_files > 0 {
            self.directory.prune(self.keep_files)?;
        }
        Ok(SaveOutcome::Saved(path))
    }

    fn reset(state: &mut MapState) {
        state.graph.clear();
        state.loaded = false;
        state.current = None;
        state.previous = None;
    }

    fn load_into(&self, state: &mut MapState) -> Result<(), NavError> {
        let (file, mut rooms) = self.directory.load()?;
        for room in &mut rooms {
            for name in self.profile.sanitize_extras(room) {
                tracing::warn!(room = %room.id, field = %name, profile = self.profile.name(), "Dropping invalid extra field");
            }
        }

        state.graph = RoomGraph::from_rooms(rooms);
        state.loaded = true;
        tracing::info!(
            path = %file.path.display(),
            format = %file.format,
            rooms = state.graph.len(),
            "Loaded map"
        );
        Ok(())
    }

    /// Read guard on a loaded map, loading first if needed.
    fn read_loaded(&self) -> Result<RwLockReadGuard<'_, MapState>, NavError> {
        let state = self.state.read();
        if state.loaded {
            return Ok(state);
        }
        drop(state);

        let mut state = self.state.write();
        // Another thread may have loaded while we waited.
        if !state.loaded {
            self.load_into(&mut state)?;
        }
        Ok(RwLockWriteGuard::downgrade(state))
    }

    /// Upgradable guard on a loaded map: readers proceed, writers wait.
    fn upgradable_loaded(&self) -> Result<RwLockUpgradableReadGuard<'_, MapState>, NavError> {
        let state = self.state.upgradable_read();
        if state.loaded {
            return Ok(state);
        }
        let mut state = RwLockUpgradableReadGuard::upgrade(state);
        self.load_into(&mut state)?;
        Ok(RwLockWriteGuard::downgrade_to_upgradable(state))
    }

    fn write_loaded(&self) -> Result<RwLockWriteGuard<'_, MapState>, NavError> {
        let mut state = self.state.write();
        if !state.loaded {
            self.load_into(&mut state)?;
        }
        Ok(state)
    }

    // =========================================================================
    // GRAPH ACCESS
    // =========================================================================

    /// Run `f` against the loaded graph.
    pub fn with_graph<R>(&self, f: impl FnOnce(&RoomGraph) -> R) -> Result<R, NavError> {
        let state = self.read_loaded()?;
        Ok(f(&state.graph))
    }

    /// Run `f` against the loaded graph with exclusive access.
    ///
    /// The uid index is rebuilt afterwards, so `f` may edit room uids freely.
    pub fn with_graph_mut<R>(&self, f: impl FnOnce(&mut RoomGraph) -> R) -> Result<R, NavError> {
        let mut state = self.write_loaded()?;
        let result = f(&mut state.graph);
        state.graph.rebuild_uid_index();
        Ok(result)
    }

    /// Snapshot of a room.
    pub fn room(&self, id: RoomId) -> Result<Option<Room>, NavError> {
        self.with_graph(|g| g.room(id).cloned())
    }

    /// Rooms carrying `uid`. Uids the profile rejects map to nothing.
    pub fn ids_from_uid(&self, uid: Uid) -> Result<Vec<RoomId>, NavError> {
        if !self.profile.is_valid_uid(uid) {
            return Ok(Vec::new());
        }
        self.with_graph(|g| g.ids_from_uid(uid).to_vec())
    }

    /// Associate `uid` with room `id`.
    ///
    /// Returns `false` without touching the map if the profile rejects `uid`.
    pub fn uids_add(&self, uid: Uid, id: RoomId) -> Result<bool, NavError> {
        if !self.profile.is_valid_uid(uid) {
            tracing::debug!(%uid, room = %id, "Ignoring uid rejected by profile");
            return Ok(false);
        }
        let mut state = self.write_loaded()?;
        state.graph.uids_add(uid, id)?;
        Ok(true)
    }

    /// Rooms carrying `tag`, ascending.
    pub fn ids_with_tag(&self, tag: &str) -> Result<Vec<RoomId>, NavError> {
        self.with_graph(|g| g.ids_with_tag(tag))
    }

    /// Rooms whose title contains `needle`, case-insensitive.
    pub fn find_by_title(&self, needle: &str) -> Result<Vec<RoomId>, NavError> {
        self.with_graph(|g| g.find_by_title(needle))
    }

    /// Every tag in use.
    pub fn tags(&self) -> Result<BTreeSet<String>, NavError> {
        self.with_graph(RoomGraph::tags)
    }

    /// Id the next new room will get.
    pub fn get_free_id(&self) -> Result<RoomId, NavError> {
        self.with_graph(RoomGraph::get_free_id)
    }

    /// Summary counts.
    pub fn metrics(&self) -> Result<MapMetrics, NavError> {
        self.with_graph(MapMetrics::from_graph)
    }

    // =========================================================================
    // PATH QUERIES
    // =========================================================================

    /// Shortest paths from `source`, optionally stopping at `destination`.
    pub fn dijkstra(
        &self,
        source: RoomId,
        destination: Option<RoomId>,
    ) -> Result<ShortestPaths, NavError> {
        let state = self.read_loaded()?;
        state.graph.dijkstra(source, destination, &self.costs)
    }

    /// Hops from `source` to `destination`; see `RoomGraph::path_to`.
    pub fn path_to(
        &self,
        source: RoomId,
        destination: RoomId,
    ) -> Result<Option<Vec<RoomId>>, NavError> {
        let state = self.read_loaded()?;
        state.graph.path_to(source, destination, &self.costs)
    }

    /// Closest reachable room among `targets`.
    pub fn find_nearest(
        &self,
        source: RoomId,
        targets: &[RoomId],
    ) -> Result<Option<RoomId>, NavError> {
        let state = self.read_loaded()?;
        state.graph.find_nearest(source, targets, &self.costs)
    }

    /// Closest reachable room carrying `tag`.
    pub fn find_nearest_by_tag(&self, source: RoomId, tag: &str) -> Result<Option<RoomId>, NavError> {
        let state = self.read_loaded()?;
        state.graph.find_nearest_by_tag(source, tag, &self.costs)
    }

    /// Every reachable room carrying `tag`, nearest first.
    pub fn find_all_nearest_by_tag(&self, source: RoomId, tag: &str) -> Result<Vec<RoomId>, NavError> {
        let state = self.read_loaded()?;
        state.graph.find_all_nearest_by_tag(source, tag, &self.costs)
    }

    /// Expected travel time along `route` (origin first).
    pub fn estimate_time(&self, route: &[RoomId]) -> Result<Cost, NavError> {
        let state = self.read_loaded()?;
        state.graph.estimate_time(route, &self.costs)
    }

    // =========================================================================
    // CURRENT ROOM
    // =========================================================================

    /// Find the room matching `observed`, or map a new one.
    ///
    /// A matched room folds in the observed text (per its merge policy) and
    /// picks up the observed uid when it has none, already has it, or is
    /// tagged multi-uid. Either way the room becomes the current room.
    ///
    /// Fails with `NoMapData` on a store with nothing on disk; call
    /// `mark_loaded` first to start a new map.
    pub fn current_or_new(&self, observed: &ObservedRoom) -> Result<Room, NavError> {
        let observed = observed.validate()?;
        let uid = observed.uid.filter(|uid| self.profile.is_valid_uid(*uid));
        let state = self.upgradable_loaded()?;

        // Writers are excluded until the upgrade, so the match stays valid.
        let resolved = self.profile.resolve_current(&state.graph, &observed);
        let recorded = resolved
            .and_then(|id| state.graph.room(id))
            .map(|room| self.profile.recorded_text(room, &observed));
        let mut state = RwLockUpgradableReadGuard::upgrade(state);

        let id = match resolved {
            Some(id) => {
                let room = state.graph.room_mut(id).ok_or(NavError::RoomNotFound(id))?;
                let policy = room.merge_policy();
                let recorded = recorded.as_ref().unwrap_or(&observed);
                if room.record_variant(recorded, policy) {
                    tracing::debug!(room = %id, ?policy, "Recorded new text variant");
                }
                let attach = uid.filter(|uid| {
                    room.uid.is_empty() || room.uid.contains(uid) || room.has_tag(TAG_MULTI_UID)
                });
                if let Some(uid) = attach {
                    state.graph.uids_add(uid, id)?;
                }
                id
            }
            None => {
                let id = state.graph.get_free_id();
                state.graph.insert(Room::from_observation(id, &observed, uid));
                tracing::info!(room = %id, title = %observed.title, "Mapped new room");
                id
            }
        };

        if state.current != Some(id) {
            state.previous = state.current;
            state.current = Some(id);
        }
        state
            .graph
            .room(id)
            .cloned()
            .ok_or(NavError::RoomNotFound(id))
    }

    /// Snapshot of the room last resolved by `current_or_new`.
    pub fn current_room(&self) -> Result<Option<Room>, NavError> {
        let state = self.read_loaded()?;
        Ok(state.current.and_then(|id| state.graph.room(id).cloned()))
    }

    /// Snapshot of the room before the current one.
    pub fn previous_room(&self) -> Result<Option<Room>, NavError> {
        let state = self.read_loaded()?;
        Ok(state.previous.and_then(|id| state.graph.room(id).cloned()))
    }
}

// =============================================================================
// TESTS
// =============================================================================

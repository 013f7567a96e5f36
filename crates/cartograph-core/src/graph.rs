//! # Room Graph
//!
//! The in-memory room collection shared by every game profile.
//!
//! This module holds identity operations: lookup by id, uid, tag and text,
//! free-id allocation, and maintenance of the uid reverse index. Search
//! algorithms live in `pathfinding`.
//!
//! All data structures use `BTreeMap` for deterministic ordering.

use crate::room::Room;
use crate::{NavError, RoomId, Uid};
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// INTEGRITY
// =============================================================================

/// A broken invariant found by `RoomGraph::check_integrity`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityViolation {
    /// A room is stored under a key that is not its own id.
    MisplacedRoom { key: RoomId, id: RoomId },
    /// A room lists a uid the index does not map back to it.
    UnindexedUid { id: RoomId, uid: Uid },
    /// The index maps a uid to a room that does not list it (or is missing).
    StaleIndexEntry { uid: Uid, id: RoomId },
}

impl std::fmt::Display for IntegrityViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MisplacedRoom { key, id } => {
                write!(f, "room #{} stored under key {}", id, key)
            }
            Self::UnindexedUid { id, uid } => {
                write!(f, "room #{} lists uid {} missing from the index", id, uid)
            }
            Self::StaleIndexEntry { uid, id } => {
                write!(f, "uid {} indexed to room #{} which does not carry it", uid, id)
            }
        }
    }
}

impl From<IntegrityViolation> for NavError {
    fn from(v: IntegrityViolation) -> Self {
        Self::Integrity(v.to_string())
    }
}

// =============================================================================
// GRAPH
// =============================================================================

/// The room collection plus its uid reverse index.
#[derive(Debug, Clone, Default)]
pub struct RoomGraph {
    /// Room storage: RoomId -> Room
    rooms: BTreeMap<RoomId, Room>,

    /// Reverse lookup: Uid -> RoomIds carrying it (ascending)
    uid_index: BTreeMap<Uid, Vec<RoomId>>,
}

impl RoomGraph {
    /// Create an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from loaded rooms and index their uids.
    ///
    /// A later room with a duplicate id replaces the earlier one.
    #[must_use]
    pub fn from_rooms(rooms: impl IntoIterator<Item = Room>) -> Self {
        let mut graph = Self {
            rooms: rooms.into_iter().map(|r| (r.id, r)).collect(),
            uid_index: BTreeMap::new(),
        };
        graph.rebuild_uid_index();
        graph
    }

    /// Number of rooms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    /// Check if the graph has no rooms.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Check if a room exists.
    #[must_use]
    pub fn contains(&self, id: RoomId) -> bool {
        self.rooms.contains_key(&id)
    }

    /// Lookup a room by id.
    #[must_use]
    pub fn room(&self, id: RoomId) -> Option<&Room> {
        self.rooms.get(&id)
    }

    /// Mutable lookup by id.
    ///
    /// Callers changing `uid` must call `rebuild_uid_index` afterwards, or use
    /// `uids_add` instead.
    pub fn room_mut(&mut self, id: RoomId) -> Option<&mut Room> {
        self.rooms.get_mut(&id)
    }

    /// All rooms in ascending id order.
    pub fn rooms(&self) -> impl Iterator<Item = &Room> {
        self.rooms.values()
    }

    /// Insert a room keyed by its own id, indexing its uids.
    ///
    /// Returns the room previously stored under that id.
    pub fn insert(&mut self, room: Room) -> Option<Room> {
        let id = room.id;
        let uids = room.uid.clone();
        let previous = self.rooms.insert(id, room);
        if let Some(old) = &previous {
            for uid in &old.uid {
                self.unindex(*uid, id);
            }
        }
        for uid in uids {
            self.index(uid, id);
        }
        previous
    }

    /// Remove every room.
    pub fn clear(&mut self) {
        self.rooms.clear();
        self.uid_index.clear();
    }

    /// One past the highest assigned id (0 for an empty graph).
    ///
    /// Ids are never reused, so stale references to deleted rooms can not
    /// silently point at new ones.
    #[must_use]
    pub fn get_free_id(&self) -> RoomId {
        self.rooms
            .last_key_value()
            .map_or(RoomId(0), |(id, _)| id.next())
    }

    /// Highest assigned id.
    #[must_use]
    pub fn max_id(&self) -> Option<RoomId> {
        self.rooms.last_key_value().map(|(id, _)| *id)
    }

    // =========================================================================
    // UIDS
    // =========================================================================

    /// Associate `uid` with room `id`, in the index and on the room.
    ///
    /// Idempotent: repeating the call changes nothing.
    pub fn uids_add(&mut self, uid: Uid, id: RoomId) -> Result<(), NavError> {
        let room = self.rooms.get_mut(&id).ok_or(NavError::RoomNotFound(id))?;
        if !room.uid.contains(&uid) {
            room.uid.push(uid);
        }
        self.index(uid, id);
        Ok(())
    }

    /// Rooms carrying `uid`, ascending.
    #[must_use]
    pub fn ids_from_uid(&self, uid: Uid) -> &[RoomId] {
        self.uid_index.get(&uid).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of distinct uids in the index.
    #[must_use]
    pub fn uid_count(&self) -> usize {
        self.uid_index.len()
    }

    /// Recompute the uid index from every room's uid list.
    pub fn rebuild_uid_index(&mut self) {
        let mut index: BTreeMap<Uid, Vec<RoomId>> = BTreeMap::new();
        for room in self.rooms.values() {
            for uid in &room.uid {
                let ids = index.entry(*uid).or_default();
                if !ids.contains(&room.id) {
                    ids.push(room.id);
                }
            }
        }
        // Rooms were visited in id order, so every list is already sorted.
        self.uid_index = index;
    }

    fn index(&mut self, uid: Uid, id: RoomId) {
        let ids = self.uid_index.entry(uid).or_default();
        if let Err(pos) = ids.binary_search(&id) {
            ids.insert(pos, id);
        }
    }

    fn unindex(&mut self, uid: Uid, id: RoomId) {
        if let Some(ids) = self.uid_index.get_mut(&uid) {
            ids.retain(|i| *i != id);
            if ids.is_empty() {
                self.uid_index.remove(&uid);
            }
        }
    }

    // =========================================================================
    // TAGS AND TEXT
    // =========================================================================

    /// Every tag used by any room.
    #[must_use]
    pub fn tags(&self) -> BTreeSet<String> {
        self.rooms
            .values()
            .flat_map(|r| r.tags.iter().cloned())
            .collect()
    }

    /// Rooms carrying `tag`, ascending.
    #[must_use]
    pub fn ids_with_tag(&self, tag: &str) -> Vec<RoomId> {
        self.rooms
            .values()
            .filter(|r| r.has_tag(tag))
            .map(|r| r.id)
            .collect()
    }

    /// Rooms with any title variant containing `needle`, case-insensitive.
    #[must_use]
    pub fn find_by_title(&self, needle: &str) -> Vec<RoomId> {
        let needle = needle.to_lowercase();
        self.rooms
            .values()
            .filter(|r| r.title.iter().any(|t| t.to_lowercase().contains(&needle)))
            .map(|r| r.id)
            .collect()
    }

    /// Rooms with any description variant containing `needle`, case-insensitive.
    #[must_use]
    pub fn find_by_description(&self, needle: &str) -> Vec<RoomId> {
        let needle = needle.to_lowercase();
        self.rooms
            .values()
            .filter(|r| {
                r.description
                    .iter()
                    .any(|d| d.to_lowercase().contains(&needle))
            })
            .map(|r| r.id)
            .collect()
    }

    // =========================================================================
    // INTEGRITY
    // =========================================================================

    /// Verify the id and uid invariants.
    ///
    /// - The last room resolves back to itself through the id lookup
    /// - Every room is stored under its own id
    /// - Every listed uid is indexed to its room and vice versa
    pub fn check_integrity(&self) -> Result<(), IntegrityViolation> {
        if let Some((key, room)) = self.rooms.last_key_value() {
            if self.rooms.get(&room.id).map(|r| r.id) != Some(*key) {
                return Err(IntegrityViolation::MisplacedRoom {
                    key: *key,
                    id: room.id,
                });
            }
        }

        for (key, room) in &self.rooms {
            if *key != room.id {
                return Err(IntegrityViolation::MisplacedRoom {
                    key: *key,
                    id: room.id,
                });
            }
            for uid in &room.uid {
                if !self.ids_from_uid(*uid).contains(&room.id) {
                    return Err(IntegrityViolation::UnindexedUid { id: room.id, uid: *uid });
                }
            }
        }

        for (uid, ids) in &self.uid_index {
            for id in ids {
                let carries = self
                    .rooms
                    .get(id)
                    .is_some_and(|room| room.uid.contains(uid));
                if !carries {
                    return Err(IntegrityViolation::StaleIndexEntry { uid: *uid, id: *id });
                }
            }
        }

        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn room(id: u32, title: &str) -> Room {
        let mut room = Room::new(RoomId(id));
        room.title.push(title.to_string());
        room
    }

    #[test]
    fn insert_and_lookup_room() {
        let mut graph = RoomGraph::new();
        assert!(graph.insert(room(4, "[Gate]")).is_none());

        assert!(graph.contains(RoomId(4)));
        assert_eq!(graph.room(RoomId(4)).map(|r| r.id), Some(RoomId(4)));
        assert_eq!(graph.len(), 1);
        assert!(graph.room(RoomId(5)).is_none());
    }

    #[test]
    fn free_id_is_one_past_maximum() {
        let mut graph = RoomGraph::new();
        assert_eq!(graph.get_free_id(), RoomId(0));

        graph.insert(room(2, "a"));
        graph.insert(room(10, "b"));
        assert_eq!(graph.get_free_id(), RoomId(11));
        assert_eq!(graph.max_id(), Some(RoomId(10)));
    }

    #[test]
    fn uids_add_is_idempotent_and_bidirectional() {
        let mut graph = RoomGraph::from_rooms([room(1, "a")]);

        graph.uids_add(Uid(500), RoomId(1)).expect("add");
        graph.uids_add(Uid(500), RoomId(1)).expect("add again");

        assert_eq!(graph.ids_from_uid(Uid(500)), &[RoomId(1)]);
        assert_eq!(graph.room(RoomId(1)).map(|r| r.uid.clone()), Some(vec![Uid(500)]));
        assert!(graph.check_integrity().is_ok());
    }

    #[test]
    fn uids_add_unknown_room_fails() {
        let mut graph = RoomGraph::new();
        assert!(matches!(
            graph.uids_add(Uid(1), RoomId(9)),
            Err(NavError::RoomNotFound(RoomId(9)))
        ));
    }

    #[test]
    fn shared_uid_maps_to_every_room() {
        let mut a = room(3, "a");
        a.uid.push(Uid(42));
        let mut b = room(1, "b");
        b.uid.push(Uid(42));

        let graph = RoomGraph::from_rooms([a, b]);
        assert_eq!(graph.ids_from_uid(Uid(42)), &[RoomId(1), RoomId(3)]);
        assert!(graph.ids_from_uid(Uid(43)).is_empty());
    }

    #[test]
    fn replacing_room_reindexes_uids() {
        let mut first = room(1, "a");
        first.uid.push(Uid(10));
        let mut graph = RoomGraph::from_rooms([first]);

        let mut second = room(1, "a");
        second.uid.push(Uid(20));
        assert!(graph.insert(second).is_some());

        assert!(graph.ids_from_uid(Uid(10)).is_empty());
        assert_eq!(graph.ids_from_uid(Uid(20)), &[RoomId(1)]);
        assert!(graph.check_integrity().is_ok());
    }

    #[test]
    fn tags_and_text_queries() {
        let mut bank = room(1, "[Bank of Landing]");
        bank.add_tag("bank");
        bank.description.push("Marble pillars rise.".to_string());
        let mut inn = room(2, "[Inn]");
        inn.add_tag("inn");
        inn.add_tag("bank");

        let graph = RoomGraph::from_rooms([bank, inn]);

        assert_eq!(graph.ids_with_tag("bank"), vec![RoomId(1), RoomId(2)]);
        assert_eq!(graph.find_by_title("bank OF"), vec![RoomId(1)]);
        assert_eq!(graph.find_by_description("marble"), vec![RoomId(1)]);
        let tags: Vec<_> = graph.tags().into_iter().collect();
        assert_eq!(tags, vec!["bank", "inn"]);
    }

    #[test]
    fn integrity_detects_misplaced_room() {
        let mut graph = RoomGraph::from_rooms([room(1, "a"), room(2, "b")]);
        if let Some(r) = graph.room_mut(RoomId(2)) {
            r.id = RoomId(7);
        }
        assert!(matches!(
            graph.check_integrity(),
            Err(IntegrityViolation::MisplacedRoom { .. })
        ));
    }

    #[test]
    fn integrity_detects_unindexed_uid() {
        let mut graph = RoomGraph::from_rooms([room(1, "a")]);
        if let Some(r) = graph.room_mut(RoomId(1)) {
            r.uid.push(Uid(99));
        }
        assert_eq!(
            graph.check_integrity(),
            Err(IntegrityViolation::UnindexedUid {
                id: RoomId(1),
                uid: Uid(99)
            })
        );

        graph.rebuild_uid_index();
        assert!(graph.check_integrity().is_ok());
    }

    #[test]
    fn clear_empties_everything() {
        let mut a = room(1, "a");
        a.uid.push(Uid(1));
        let mut graph = RoomGraph::from_rooms([a]);
        graph.clear();
        assert!(graph.is_empty());
        assert_eq!(graph.uid_count(), 0);
    }
}

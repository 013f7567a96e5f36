//! DragonRealms identity rules.
//!
//! DragonRealms rooms often differ only by what lies next door, so a text
//! match on a room tagged `peer <dir>` is confirmed by looking in that
//! direction through a `PeerObserver` before it is accepted.

use super::{ExtraField, FieldKind, GameProfile, PeerObserver, location_agrees, resolve_by_uid};
use crate::graph::RoomGraph;
use crate::observe::ObservedRoom;
use crate::room::Room;
use crate::{RoomId, Uid};
use std::fmt;
use std::sync::Arc;

const EXTRA_FIELDS: &[ExtraField] = &[ExtraField {
    name: "check_location",
    kind: FieldKind::Bool,
}];

/// DragonRealms: every uid is real; peer tags disambiguate look-alike rooms.
#[derive(Clone, Default)]
pub struct DragonRealmsProfile {
    observer: Option<Arc<dyn PeerObserver>>,
}

impl fmt::Debug for DragonRealmsProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DragonRealmsProfile")
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

impl DragonRealmsProfile {
    /// Profile without a peer observer: peer-tagged rooms never match.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Profile confirming peer-tagged rooms through `observer`.
    #[must_use]
    pub fn with_observer(observer: Arc<dyn PeerObserver>) -> Self {
        Self {
            observer: Some(observer),
        }
    }

    /// Stored variant that `observed` extends with trailing dynamic text
    /// (weather, creatures).
    fn prefix_variant<'a>(room: &'a Room, observed: &str) -> Option<&'a str> {
        room.description
            .iter()
            .map(|variant| variant.trim())
            .find(|variant| !variant.is_empty() && observed.trim().starts_with(variant))
    }

    fn description_matches(room: &Room, observed: &str) -> bool {
        room.matches_description(observed) || Self::prefix_variant(room, observed).is_some()
    }

    fn text_matches(room: &Room, observed: &ObservedRoom) -> bool {
        room.matches_title(&observed.title)
            && Self::description_matches(room, &observed.description)
            && room.matches_paths(&observed.paths)
            && location_agrees(room, observed)
    }

    fn peers_confirm(&self, room: &Room) -> bool {
        let requirements = room.peer_requirements();
        if requirements.is_empty() {
            return true;
        }
        let Some(observer) = &self.observer else {
            return false;
        };
        requirements.iter().all(|req| {
            observer
                .peer(&req.direction)
                .is_some_and(|seen| req.is_satisfied_by(&seen))
        })
    }
}

impl GameProfile for DragonRealmsProfile {
    fn name(&self) -> &'static str {
        "dragonrealms"
    }

    fn is_valid_uid(&self, _uid: Uid) -> bool {
        true
    }

    fn extra_fields(&self) -> &'static [ExtraField] {
        EXTRA_FIELDS
    }

    /// A description matched only by prefix records the stored variant, so
    /// the dynamic suffix never enters the history.
    fn recorded_text(&self, room: &Room, observed: &ObservedRoom) -> ObservedRoom {
        let mut recorded = observed.clone();
        if !room.matches_description(&observed.description) {
            if let Some(variant) = Self::prefix_variant(room, &observed.description) {
                recorded.description = variant.to_string();
            }
        }
        recorded
    }

    fn resolve_current(&self, graph: &RoomGraph, observed: &ObservedRoom) -> Option<RoomId> {
        if let Some(id) = resolve_by_uid(self, graph, observed) {
            return Some(id);
        }

        // Plain matches first so no peer command is issued when avoidable.
        let candidates: Vec<&Room> = graph
            .rooms()
            .filter(|room| Self::text_matches(room, observed))
            .collect();
        if let Some(room) = candidates.iter().find(|r| r.peer_requirements().is_empty()) {
            return Some(room.id);
        }
        candidates
            .into_iter()
            .find(|room| self.peers_confirm(room))
            .map(|room| room.id)
    }
}

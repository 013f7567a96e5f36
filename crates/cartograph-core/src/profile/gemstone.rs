//! GemStone IV identity rules.

use super::{ExtraField, FieldKind, GameProfile, location_agrees, resolve_by_uid};
use crate::graph::RoomGraph;
use crate::observe::ObservedRoom;
use crate::primitives::{FAKE_UID_FLOOR, TAG_MULTI_UID};
use crate::room::Room;
use crate::{RoomId, Uid};

const EXTRA_FIELDS: &[ExtraField] = &[
    ExtraField {
        name: "unique_loot",
        kind: FieldKind::TextList,
    },
    ExtraField {
        name: "check_location",
        kind: FieldKind::Bool,
    },
];

/// GemStone IV: uids below 2^32 are real, anything above is a placeholder
/// the game hands out for unmapped locations.
#[derive(Debug, Clone, Copy, Default)]
pub struct GemstoneProfile;

impl GemstoneProfile {
    /// Text-match candidates must not already belong to another uid, unless
    /// they are known to carry several.
    fn accepts_uid(room: &Room, uid: Option<Uid>) -> bool {
        match uid {
            None => true,
            Some(uid) => room.uid.is_empty() || room.uid.contains(&uid) || room.has_tag(TAG_MULTI_UID),
        }
    }
}

impl GameProfile for GemstoneProfile {
    fn name(&self) -> &'static str {
        "gemstone"
    }

    fn is_valid_uid(&self, uid: Uid) -> bool {
        uid < FAKE_UID_FLOOR
    }

    fn extra_fields(&self) -> &'static [ExtraField] {
        EXTRA_FIELDS
    }

    fn resolve_current(&self, graph: &RoomGraph, observed: &ObservedRoom) -> Option<RoomId> {
        if let Some(id) = resolve_by_uid(self, graph, observed) {
            return Some(id);
        }

        let uid = observed.uid.filter(|uid| self.is_valid_uid(*uid));
        graph
            .rooms()
            .find(|room| {
                Self::accepts_uid(room, uid)
                    && room.matches_observation(observed)
                    && location_agrees(room, observed)
            })
            .map(|room| room.id)
    }
}

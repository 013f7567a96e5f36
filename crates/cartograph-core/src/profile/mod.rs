//! # Game Profiles
//!
//! Per-game identity rules layered over the shared `RoomGraph`.
//!
//! A profile decides three things the graph itself can not:
//! - Which uids the game hands out are real room identifiers
//! - Which game-specific fields a room may carry in `Room::extra`
//! - How the room the player is standing in is found from what they see
//!
//! Profiles are stateless strategies. Mutation stays in `MapStore`, which
//! asks the profile to resolve and then applies the result itself.

mod dragonrealms;
mod gemstone;

pub use dragonrealms::DragonRealmsProfile;
pub use gemstone::GemstoneProfile;

use crate::graph::RoomGraph;
use crate::observe::ObservedRoom;
use crate::room::Room;
use crate::{NavError, RoomId, Uid};
use serde_json::Value;
use std::sync::Arc;

// =============================================================================
// EXTRA FIELD SCHEMA
// =============================================================================

/// Value shape of a game-specific room field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// JSON boolean.
    Bool,
    /// JSON string.
    Text,
    /// JSON array of strings.
    TextList,
}

impl FieldKind {
    /// Check if `value` has this shape.
    #[must_use]
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            Self::Bool => value.is_boolean(),
            Self::Text => value.is_string(),
            Self::TextList => value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_string)),
        }
    }
}

/// One declared game-specific room field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtraField {
    /// Key in `Room::extra` and in map files.
    pub name: &'static str,
    /// Expected value shape.
    pub kind: FieldKind,
}

// =============================================================================
// COLLABORATORS
// =============================================================================

/// Looks into an adjacent room on request.
///
/// Implemented outside the core by whatever talks to the game: it issues the
/// peer command and filters the response out of the shared output stream.
pub trait PeerObserver: Send + Sync {
    /// Text seen when peering in `direction`, or `None` if the peer failed.
    fn peer(&self, direction: &str) -> Option<String>;
}

// =============================================================================
// PROFILE TRAIT
// =============================================================================

/// Game-specific identity rules.
pub trait GameProfile: Send + Sync + std::fmt::Debug {
    /// Short lowercase name used in configuration.
    fn name(&self) -> &'static str;

    /// Check if `uid` identifies a real room in this game.
    fn is_valid_uid(&self, uid: Uid) -> bool;

    /// Game-specific fields rooms may carry.
    fn extra_fields(&self) -> &'static [ExtraField];

    /// Find the mapped room matching what the player currently sees.
    fn resolve_current(&self, graph: &RoomGraph, observed: &ObservedRoom) -> Option<RoomId>;

    /// The observation as it should be recorded on the matched `room`.
    ///
    /// Defaults to the observation unchanged.
    fn recorded_text(&self, _room: &Room, observed: &ObservedRoom) -> ObservedRoom {
        observed.clone()
    }

    /// Check an extra field against the declared schema.
    fn accepts_extra(&self, name: &str, value: &Value) -> bool {
        self.extra_fields()
            .iter()
            .any(|field| field.name == name && field.kind.accepts(value))
    }

    /// Drop undeclared or malformed extra fields from `room`.
    ///
    /// Returns the names of the dropped fields.
    fn sanitize_extras(&self, room: &mut Room) -> Vec<String> {
        let mut dropped = Vec::new();
        room.extra.retain(|name, value| {
            let keep = self.accepts_extra(name, value);
            if !keep {
                dropped.push(name.clone());
            }
            keep
        });
        dropped
    }
}

/// Look up a built-in profile by its configuration name.
pub fn by_name(name: &str) -> Result<Arc<dyn GameProfile>, NavError> {
    match name.trim().to_ascii_lowercase().as_str() {
        "gemstone" | "gs" => Ok(Arc::new(GemstoneProfile)),
        "dragonrealms" | "dr" => Ok(Arc::new(DragonRealmsProfile::new())),
        other => Err(NavError::Config(format!("unknown game profile: {}", other))),
    }
}

// =============================================================================
// SHARED MATCHING HELPERS
// =============================================================================

/// Rooms indexed under a valid observed uid, disambiguated by text when the
/// uid is shared.
fn resolve_by_uid(
    profile: &dyn GameProfile,
    graph: &RoomGraph,
    observed: &ObservedRoom,
) -> Option<RoomId> {
    let uid = observed.uid.filter(|uid| profile.is_valid_uid(*uid))?;
    let ids = graph.ids_from_uid(uid);
    match ids {
        [] => None,
        [only] => Some(*only),
        many => many
            .iter()
            .copied()
            .find(|id| {
                graph
                    .room(*id)
                    .is_some_and(|room| room.matches_observation(observed))
            })
            .or_else(|| many.first().copied()),
    }
}

/// Whether a room flagged `check_location` agrees with the observed location.
fn location_agrees(room: &Room, observed: &ObservedRoom) -> bool {
    !room.check_location() || room.location == observed.location
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn field_kinds_check_shape() {
        assert!(FieldKind::Bool.accepts(&json!(true)));
        assert!(!FieldKind::Bool.accepts(&json!("true")));
        assert!(FieldKind::Text.accepts(&json!("x")));
        assert!(FieldKind::TextList.accepts(&json!(["a", "b"])));
        assert!(FieldKind::TextList.accepts(&json!([])));
        assert!(!FieldKind::TextList.accepts(&json!(["a", 1])));
    }

    #[test]
    fn profiles_by_name() {
        assert_eq!(by_name("gemstone").expect("gs").name(), "gemstone");
        assert_eq!(by_name(" DR ").expect("dr").name(), "dragonrealms");
        assert!(matches!(by_name("zork"), Err(NavError::Config(_))));
    }

    #[test]
    fn sanitize_drops_undeclared_and_malformed() {
        let profile = DragonRealmsProfile::new();
        let mut room = Room::new(RoomId(1));
        room.extra.insert("check_location".to_string(), json!(true));
        room.extra.insert("unique_loot".to_string(), json!(["coin"]));
        room.extra.insert("mystery".to_string(), json!(1));

        let dropped = profile.sanitize_extras(&mut room);
        assert_eq!(dropped, vec!["mystery", "unique_loot"]);
        assert_eq!(room.extra.len(), 1);

        let mut room = Room::new(RoomId(2));
        room.extra.insert("check_location".to_string(), json!("yes"));
        assert_eq!(profile.sanitize_extras(&mut room), vec!["check_location"]);
    }

    #[test]
    fn shared_uid_disambiguated_by_text() {
        let a = Room::from_observation(
            RoomId(1),
            &ObservedRoom::new("[Hall]", "Dusty.", "Obvious exits: out."),
            Some(Uid(9)),
        );
        let b = Room::from_observation(
            RoomId(2),
            &ObservedRoom::new("[Hall]", "Clean.", "Obvious exits: out."),
            Some(Uid(9)),
        );
        let graph = RoomGraph::from_rooms([a, b]);

        let seen = ObservedRoom::new("[Hall]", "Clean.", "Obvious exits: out.").with_uid(Uid(9));
        assert_eq!(resolve_by_uid(&GemstoneProfile, &graph, &seen), Some(RoomId(2)));

        let unmatched = ObservedRoom::new("[Hall]", "Odd.", "").with_uid(Uid(9));
        assert_eq!(
            resolve_by_uid(&GemstoneProfile, &graph, &unmatched),
            Some(RoomId(1))
        );
    }
}

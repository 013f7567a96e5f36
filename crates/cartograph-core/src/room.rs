//! # Room Entity
//!
//! A room is one vertex of the navigation graph: identity, the history of
//! texts it has been seen with, its outgoing exits, tags and metadata.
//!
//! Text fields are lists of variants, newest first. A room seen with a
//! slightly different description keeps both so that either matches later.

use crate::observe::ObservedRoom;
use crate::primitives::{
    INDOOR_PATHS_PREFIX, OUTDOOR_PATHS_PREFIX, PEER_DESC_PREFIX, PEER_TAG_PREFIX,
    TAG_LATEST_ONLY, TAG_PLAYERSHOP,
};
use crate::{Cost, EdgeCost, Exit, RoomId, Uid};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

// =============================================================================
// SUPPORTING TYPES
// =============================================================================

/// How a new observation is folded into a room's text history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePolicy {
    /// Put the new variant first, keeping older ones.
    Prepend,
    /// Discard history and keep only the new variant.
    Replace,
}

/// Open sky or enclosed, as told by the exit line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// "Obvious paths:"
    Outdoor,
    /// "Obvious exits:"
    Indoor,
}

/// A `peer <direction>` tag: the room is only confirmed after looking in that
/// direction, optionally requiring the result to contain `fragment`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerRequirement {
    /// Direction to peer in.
    pub direction: String,
    /// Text the peer result must contain, if any.
    pub fragment: Option<String>,
}

impl PeerRequirement {
    /// Parse a tag of the form `peer <dir>` or `peer <dir> =~ /<fragment>/`,
    /// optionally prefixed by `set desc on; `.
    #[must_use]
    pub fn parse(tag: &str) -> Option<Self> {
        let tag = tag.strip_prefix(PEER_DESC_PREFIX).unwrap_or(tag);
        let rest = tag.strip_prefix(PEER_TAG_PREFIX)?.trim();

        let (direction, fragment) = match rest.split_once("=~") {
            Some((dir, pattern)) => {
                let pattern = pattern.trim();
                let inner = pattern
                    .strip_prefix('/')
                    .and_then(|p| p.strip_suffix('/'))
                    .unwrap_or(pattern);
                (dir.trim(), Some(inner.to_string()))
            }
            None => (rest, None),
        };

        if direction.is_empty() || direction.contains(char::is_whitespace) {
            return None;
        }

        Some(Self {
            direction: direction.to_string(),
            fragment: fragment.filter(|f| !f.is_empty()),
        })
    }

    /// Check a peer result against this requirement.
    #[must_use]
    pub fn is_satisfied_by(&self, peered: &str) -> bool {
        self.fragment
            .as_deref()
            .is_none_or(|fragment| peered.contains(fragment))
    }
}

// =============================================================================
// ROOM
// =============================================================================

/// A vertex of the navigation graph.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Room {
    /// Primary key.
    pub id: RoomId,
    /// Stable external identifiers, in insertion order.
    pub uid: Vec<Uid>,
    /// Observed titles, newest first.
    pub title: Vec<String>,
    /// Observed descriptions, newest first.
    pub description: Vec<String>,
    /// Observed exit lines, newest first.
    pub paths: Vec<String>,
    /// Outgoing edges keyed by destination.
    pub exits: BTreeMap<RoomId, Exit>,
    /// Free-text labels, no duplicates.
    pub tags: Vec<String>,
    /// Location (town, region) name.
    pub location: Option<String>,
    /// Climate descriptor.
    pub climate: Option<String>,
    /// Terrain descriptor.
    pub terrain: Option<String>,
    /// Map image file name.
    pub image: Option<String>,
    /// Rectangle of this room on `image`.
    pub image_coords: Option<[i32; 4]>,
    /// Game-specific fields declared by the profile.
    pub extra: BTreeMap<String, Value>,
}

impl Room {
    /// Create an empty room.
    #[must_use]
    pub fn new(id: RoomId) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    /// Create a room from a validated observation.
    ///
    /// The uid is attached only when the caller has decided it is real.
    #[must_use]
    pub fn from_observation(id: RoomId, observed: &ObservedRoom, uid: Option<Uid>) -> Self {
        let mut room = Self::new(id);
        room.title.push(observed.title.clone());
        if !observed.description.is_empty() {
            room.description.push(observed.description.clone());
        }
        if !observed.paths.is_empty() {
            room.paths.push(observed.paths.clone());
        }
        room.location.clone_from(&observed.location);
        room.uid.extend(uid);
        room
    }

    // =========================================================================
    // TAGS
    // =========================================================================

    /// Check if the room carries a tag.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Add a tag. Returns `false` if it was already present.
    pub fn add_tag(&mut self, tag: impl Into<String>) -> bool {
        let tag = tag.into();
        if self.has_tag(&tag) {
            return false;
        }
        self.tags.push(tag);
        true
    }

    /// Remove a tag. Returns `true` if it was present.
    pub fn remove_tag(&mut self, tag: &str) -> bool {
        let before = self.tags.len();
        self.tags.retain(|t| t != tag);
        self.tags.len() != before
    }

    /// Peer checks required to confirm this room.
    #[must_use]
    pub fn peer_requirements(&self) -> Vec<PeerRequirement> {
        self.tags
            .iter()
            .filter_map(|t| PeerRequirement::parse(t))
            .collect()
    }

    /// Policy for folding new observations into this room.
    #[must_use]
    pub fn merge_policy(&self) -> MergePolicy {
        if self.has_tag(TAG_LATEST_ONLY) || self.has_tag(TAG_PLAYERSHOP) {
            MergePolicy::Replace
        } else {
            MergePolicy::Prepend
        }
    }

    // =========================================================================
    // EXITS
    // =========================================================================

    /// Add or replace the exit to `to`.
    pub fn add_exit(&mut self, to: RoomId, command: impl Into<String>, cost: EdgeCost) {
        self.exits.insert(to, Exit::new(command, cost));
    }

    /// Add an exit with a fixed cost.
    pub fn add_fixed_exit(&mut self, to: RoomId, command: impl Into<String>, cost: Cost) {
        self.add_exit(to, command, EdgeCost::Fixed(cost));
    }

    /// Remove the exit to `to`.
    pub fn remove_exit(&mut self, to: RoomId) -> Option<Exit> {
        self.exits.remove(&to)
    }

    /// The exit to `to`, if any.
    #[must_use]
    pub fn exit(&self, to: RoomId) -> Option<&Exit> {
        self.exits.get(&to)
    }

    /// Movement commands keyed by destination (the `wayto` map).
    pub fn wayto(&self) -> impl Iterator<Item = (RoomId, &str)> + '_ {
        self.exits.iter().map(|(id, e)| (*id, e.command.as_str()))
    }

    /// Edge costs keyed by destination (the `timeto` map).
    pub fn timeto(&self) -> impl Iterator<Item = (RoomId, &EdgeCost)> + '_ {
        self.exits.iter().map(|(id, e)| (*id, &e.cost))
    }

    // =========================================================================
    // TEXT
    // =========================================================================

    /// Classify the room from its most recent exit line.
    #[must_use]
    pub fn environment(&self) -> Option<Environment> {
        let latest = self.paths.first()?;
        if latest.starts_with(OUTDOOR_PATHS_PREFIX) {
            Some(Environment::Outdoor)
        } else if latest.starts_with(INDOOR_PATHS_PREFIX) {
            Some(Environment::Indoor)
        } else {
            None
        }
    }

    /// Check if the room is under the open sky.
    #[must_use]
    pub fn is_outdoor(&self) -> bool {
        self.environment() == Some(Environment::Outdoor)
    }

    /// Check if the room is enclosed.
    #[must_use]
    pub fn is_indoor(&self) -> bool {
        self.environment() == Some(Environment::Indoor)
    }

    /// Any title variant equals the trimmed text.
    #[must_use]
    pub fn matches_title(&self, title: &str) -> bool {
        contains_variant(&self.title, title)
    }

    /// Any description variant equals the trimmed text.
    #[must_use]
    pub fn matches_description(&self, description: &str) -> bool {
        contains_variant(&self.description, description)
    }

    /// Any exit-line variant equals the trimmed text.
    #[must_use]
    pub fn matches_paths(&self, paths: &str) -> bool {
        contains_variant(&self.paths, paths)
    }

    /// Title, description and exit line all match known variants.
    #[must_use]
    pub fn matches_observation(&self, observed: &ObservedRoom) -> bool {
        self.matches_title(&observed.title)
            && self.matches_description(&observed.description)
            && self.matches_paths(&observed.paths)
    }

    /// Fold an observation into the text history.
    ///
    /// Returns `true` if anything changed.
    pub fn record_variant(&mut self, observed: &ObservedRoom, policy: MergePolicy) -> bool {
        let mut changed = false;
        for (history, text) in [
            (&mut self.title, &observed.title),
            (&mut self.description, &observed.description),
            (&mut self.paths, &observed.paths),
        ] {
            if text.is_empty() {
                continue;
            }
            changed |= match policy {
                MergePolicy::Prepend => {
                    if contains_variant(history, text) {
                        false
                    } else {
                        history.insert(0, text.clone());
                        true
                    }
                }
                MergePolicy::Replace => {
                    if history.len() == 1 && history[0] == *text {
                        false
                    } else {
                        history.clear();
                        history.push(text.clone());
                        true
                    }
                }
            };
        }
        changed
    }

    // =========================================================================
    // EXTRA FIELDS
    // =========================================================================

    /// Whether matching this room also requires the same location name.
    #[must_use]
    pub fn check_location(&self) -> bool {
        self.extra
            .get("check_location")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Loot names that must be present for this room to match.
    #[must_use]
    pub fn unique_loot(&self) -> Vec<&str> {
        self.extra
            .get("unique_loot")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}

fn contains_variant(history: &[String], text: &str) -> bool {
    let text = text.trim();
    history.iter().any(|v| v.trim() == text)
}

impl fmt::Display for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.id)?;
        if !self.uid.is_empty() {
            let uids: Vec<String> = self.uid.iter().map(|u| format!("u{}", u)).collect();
            write!(f, " ({})", uids.join(", "))?;
        }
        match self.title.first() {
            Some(title) => write!(f, ": {}", title),
            None => Ok(()),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

//! JSON map files.
//!
//! A top-level array with one object per room. Edges are split into two
//! maps keyed by destination id: `wayto` (command) and `timeto` (cost, where
//! a number is seconds, `null` is a disabled edge and a string names a cost
//! function). Fields a room does not have are omitted. Game-specific fields
//! follow the standard ones at the same level.

use super::{decode_error, encode_error};
use crate::room::Room;
use crate::{EdgeCost, NavError, RoomId, Uid};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Cost as written in `timeto`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
enum RawCost {
    Seconds(f64),
    Function(String),
}

#[derive(Debug, Serialize, Deserialize)]
struct RoomRecord {
    id: RoomId,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    title: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    description: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    paths: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    climate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    terrain: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    wayto: BTreeMap<RoomId, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    timeto: BTreeMap<RoomId, Option<RawCost>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image_coords: Option<[i32; 4]>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    uid: Vec<Uid>,
    #[serde(flatten)]
    extra: BTreeMap<String, Value>,
}

impl From<&Room> for RoomRecord {
    fn from(room: &Room) -> Self {
        Self {
            id: room.id,
            title: room.title.clone(),
            description: room.description.clone(),
            paths: room.paths.clone(),
            location: room.location.clone(),
            climate: room.climate.clone(),
            terrain: room.terrain.clone(),
            wayto: room
                .wayto()
                .map(|(id, cmd)| (id, cmd.to_string()))
                .collect(),
            timeto: room
                .timeto()
                .map(|(id, cost)| {
                    let raw = match cost {
                        EdgeCost::Disabled => None,
                        EdgeCost::Fixed(c) => Some(RawCost::Seconds(c.as_secs_f64())),
                        EdgeCost::Computed(name) => Some(RawCost::Function(name.0.clone())),
                    };
                    (id, raw)
                })
                .collect(),
            image: room.image.clone(),
            image_coords: room.image_coords,
            tags: room.tags.clone(),
            uid: room.uid.clone(),
            extra: room.extra.clone(),
        }
    }
}

impl RoomRecord {
    fn into_room(mut self) -> Room {
        let mut room = Room::new(self.id);

        for (to, command) in self.wayto {
            let cost = match self.timeto.remove(&to).flatten() {
                None => EdgeCost::Disabled,
                Some(RawCost::Function(name)) => EdgeCost::computed(name),
                Some(RawCost::Seconds(secs)) => EdgeCost::from_secs_f64(secs).unwrap_or_else(|e| {
                    tracing::warn!(room = %self.id, to = %to, error = %e, "Disabling edge with invalid cost");
                    EdgeCost::Disabled
                }),
            };
            room.add_exit(to, command, cost);
        }
        for orphan in self.timeto.keys() {
            tracing::warn!(room = %self.id, to = %orphan, "Dropping timeto entry without wayto");
        }

        room.title = self.title;
        room.description = self.description;
        room.paths = self.paths;
        room.location = self.location;
        room.climate = self.climate;
        room.terrain = self.terrain;
        room.image = self.image;
        room.image_coords = self.image_coords;
        room.tags = self.tags;
        room.uid = self.uid;
        room.extra = self.extra;
        room
    }
}

pub(super) fn decode(bytes: &[u8]) -> Result<Vec<Room>, NavError> {
    let records: Vec<RoomRecord> = serde_json::from_slice(bytes).map_err(decode_error)?;
    Ok(records.into_iter().map(RoomRecord::into_room).collect())
}

pub(super) fn encode(rooms: &[Room]) -> Result<Vec<u8>, NavError> {
    let records: Vec<RoomRecord> = rooms.iter().map(RoomRecord::from).collect();
    serde_json::to_vec_pretty(&records).map_err(encode_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Cost;
    use serde_json::json;

    const SAMPLE: &str = r#"[
      {
        "id": 0,
        "title": ["[Town Square]"],
        "description": ["A bustling square."],
        "paths": ["Obvious paths: north, east."],
        "location": "Landing",
        "wayto": {"1": "north", "2": "east", "3": "go gate"},
        "timeto": {"1": 0.2, "2": null, "3": "closed", "9": 5},
        "tags": ["town"],
        "uid": [7100],
        "check_location": true
      },
      {"id": 1, "title": ["[North Road]"]}
    ]"#;

    #[test]
    fn decodes_lich_style_rooms() {
        let rooms = decode(SAMPLE.as_bytes()).expect("decode");
        assert_eq!(rooms.len(), 2);

        let square = &rooms[0];
        assert_eq!(square.uid, vec![Uid(7100)]);
        assert_eq!(square.location.as_deref(), Some("Landing"));
        assert_eq!(
            square.exit(RoomId(1)).map(|e| e.cost.clone()),
            Some(EdgeCost::Fixed(Cost(200)))
        );
        assert_eq!(
            square.exit(RoomId(2)).map(|e| e.cost.clone()),
            Some(EdgeCost::Disabled)
        );
        assert_eq!(
            square.exit(RoomId(3)).map(|e| e.cost.clone()),
            Some(EdgeCost::computed("closed"))
        );
        // timeto without wayto is dropped
        assert!(square.exit(RoomId(9)).is_none());
        assert!(square.check_location());

        assert!(rooms[1].exits.is_empty());
        assert!(rooms[1].uid.is_empty());
    }

    #[test]
    fn wayto_without_timeto_is_disabled() {
        let rooms = decode(br#"[{"id": 4, "wayto": {"5": "north"}}]"#).expect("decode");
        assert_eq!(
            rooms[0].exit(RoomId(5)).map(|e| e.cost.clone()),
            Some(EdgeCost::Disabled)
        );
    }

    #[test]
    fn negative_cost_disables_edge() {
        let rooms = decode(br#"[{"id": 4, "wayto": {"5": "north"}, "timeto": {"5": -1}}]"#)
            .expect("decode");
        assert_eq!(
            rooms[0].exit(RoomId(5)).map(|e| e.cost.clone()),
            Some(EdgeCost::Disabled)
        );
    }

    #[test]
    fn encode_omits_empty_fields_and_keeps_extras_last() {
        let mut room = Room::new(RoomId(3));
        room.title.push("[Hall]".to_string());
        room.add_fixed_exit(RoomId(4), "out", Cost(200));
        room.extra
            .insert("unique_loot".to_string(), json!(["a coin"]));

        let bytes = encode(&[room]).expect("encode");
        let value: Value = serde_json::from_slice(&bytes).expect("parse");
        let object = value[0].as_object().expect("object");

        let keys: Vec<&str> = object.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["id", "title", "wayto", "timeto", "unique_loot"]);
        assert_eq!(value[0]["timeto"]["4"], json!(0.2));
    }

    #[test]
    fn round_trip_preserves_edges_and_extras() {
        let original = decode(SAMPLE.as_bytes()).expect("decode");
        let bytes = encode(&original).expect("encode");
        let restored = decode(&bytes).expect("decode again");
        assert_eq!(original, restored);
    }

    #[test]
    fn malformed_input_is_a_deserialization_error() {
        assert!(matches!(
            decode(b"{\"not\": \"an array\"}"),
            Err(NavError::Deserialization(_))
        ));
    }
}

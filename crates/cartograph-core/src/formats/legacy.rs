//! Legacy binary map files (read-only).
//!
//! Format: Header (5 bytes) + postcard-serialized room records.
//! - 4 bytes: Magic ("LMAP")
//! - 1 byte: Version
//!
//! Size and header are validated before the payload is parsed.

use super::decode_error;
use crate::primitives::{LEGACY_MAGIC, LEGACY_VERSION, MAX_MAP_FILE_SIZE};
use crate::room::Room;
use crate::{CostFnId, EdgeCost, NavError, RoomId, Uid};
use serde::{Deserialize, Serialize};

const HEADER_SIZE: usize = 5;

/// Edge cost as stored by the legacy writer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum LegacyCost {
    Disabled,
    Seconds(f64),
    Function(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct LegacyRoom {
    id: u32,
    title: Vec<String>,
    description: Vec<String>,
    paths: Vec<String>,
    location: Option<String>,
    climate: Option<String>,
    terrain: Option<String>,
    exits: Vec<(u32, String, LegacyCost)>,
    image: Option<String>,
    image_coords: Option<[i32; 4]>,
    tags: Vec<String>,
    uid: Vec<u64>,
}

impl LegacyRoom {
    fn into_room(self) -> Room {
        let mut room = Room::new(RoomId(self.id));
        for (to, command, cost) in self.exits {
            let cost = match cost {
                LegacyCost::Disabled => EdgeCost::Disabled,
                LegacyCost::Function(name) => EdgeCost::Computed(CostFnId(name)),
                LegacyCost::Seconds(secs) => EdgeCost::from_secs_f64(secs).unwrap_or_else(|e| {
                    tracing::warn!(room = self.id, to, error = %e, "Disabling edge with invalid cost");
                    EdgeCost::Disabled
                }),
            };
            room.add_exit(RoomId(to), command, cost);
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
        room.uid = self.uid.into_iter().map(Uid).collect();
        room
    }
}

pub(super) fn decode(bytes: &[u8]) -> Result<Vec<Room>, NavError> {
    if bytes.len() < HEADER_SIZE {
        return Err(NavError::Deserialization(
            "Data too short: minimum 5 bytes required".to_string(),
        ));
    }
    if bytes.len() as u64 > MAX_MAP_FILE_SIZE {
        return Err(NavError::Deserialization(format!(
            "Data size {} bytes exceeds maximum allowed {} bytes",
            bytes.len(),
            MAX_MAP_FILE_SIZE
        )));
    }
    if &bytes[0..4] != LEGACY_MAGIC {
        return Err(NavError::Deserialization("Invalid magic bytes".to_string()));
    }
    if bytes[4] != LEGACY_VERSION {
        return Err(NavError::Deserialization(format!(
            "Unsupported version: {} (expected {})",
            bytes[4], LEGACY_VERSION
        )));
    }

    let records: Vec<LegacyRoom> =
        postcard::from_bytes(&bytes[HEADER_SIZE..]).map_err(decode_error)?;
    Ok(records.into_iter().map(LegacyRoom::into_room).collect())
}

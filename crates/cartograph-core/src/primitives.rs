//! # Map Primitives
//!
//! Hardcoded constants shared by the graph, the formats and the profiles.
//!
//! These are compiled into the binary and are immutable at runtime.

use crate::{Cost, Uid};

// =============================================================================
// STRUCTURAL TAGS
// =============================================================================

/// Rooms whose text should be replaced on every visit instead of accumulated.
pub const TAG_LATEST_ONLY: &str = "meta:map:latest-only";

/// Player shops: procedurally varying text, handled like `TAG_LATEST_ONLY`.
pub const TAG_PLAYERSHOP: &str = "meta:playershop";

/// One logical room legitimately holding several simultaneous uids.
pub const TAG_MULTI_UID: &str = "meta:map:multi-uid";

/// Prefix of tags requiring a peer check before a room is considered matched.
pub const PEER_TAG_PREFIX: &str = "peer ";

/// Optional leading command on peer tags (`set desc on; peer north`).
pub const PEER_DESC_PREFIX: &str = "set desc on; ";

// =============================================================================
// EXIT TEXT
// =============================================================================

/// Exit line prefix for rooms under the open sky.
pub const OUTDOOR_PATHS_PREFIX: &str = "Obvious paths:";

/// Exit line prefix for enclosed rooms.
pub const INDOOR_PATHS_PREFIX: &str = "Obvious exits:";

// =============================================================================
// UIDS AND COSTS
// =============================================================================

/// Uids at or above this value are placeholders handed out for unmapped,
/// ephemeral locations and never identify a real room.
pub const FAKE_UID_FLOOR: Uid = Uid(1 << 32);

/// Cost assumed for a hop with no usable edge cost when estimating travel.
pub const DEFAULT_EDGE_COST: Cost = Cost::from_millis(200);

/// Name of the built-in cost function that always reports a closed edge.
pub const COST_FN_CLOSED: &str = "closed";

// =============================================================================
// FILES
// =============================================================================

/// Magic bytes of the legacy binary map format.
pub const LEGACY_MAGIC: &[u8; 4] = b"LMAP";

/// Only legacy format version that can be read.
pub const LEGACY_VERSION: u8 = 1;

/// File name prefix of map files in a map directory.
pub const MAP_FILE_PREFIX: &str = "map-";

/// Maximum size of a single map file (256 MB).
///
/// Checked before any bytes are read or decoded.
pub const MAX_MAP_FILE_SIZE: u64 = 256 * 1024 * 1024;

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum length of a single observed title, description or exit line.
pub const MAX_OBSERVED_TEXT_LENGTH: usize = 8192;

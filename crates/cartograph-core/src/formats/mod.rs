//! # Map Formats
//!
//! Pure byte-level adapters between map files and rooms. File I/O lives in
//! `storage`.
//!
//! Three formats exist, tried in `MapFormat::LOAD_ORDER` when several files
//! share a timestamp:
//! - `json`: the preferred format, human-editable
//! - `xml`: the older interchange format, still written on request
//! - `legacy`: the original binary dump, readable only

mod json;
mod legacy;
mod xml;

use crate::room::Room;
use crate::NavError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A map file encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MapFormat {
    /// Pretty-printed JSON array of rooms.
    Json,
    /// `<map>` document of `<room>` elements.
    Xml,
    /// `LMAP` header plus postcard payload.
    Legacy,
}

impl MapFormat {
    /// Preference order when loading.
    pub const LOAD_ORDER: [Self; 3] = [Self::Json, Self::Xml, Self::Legacy];

    /// File extension, without the dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Xml => "xml",
            Self::Legacy => "dat",
        }
    }

    /// Format stored under a file extension.
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        Self::LOAD_ORDER
            .into_iter()
            .find(|f| f.extension().eq_ignore_ascii_case(ext))
    }

    /// Position in `LOAD_ORDER`.
    #[must_use]
    pub fn preference(self) -> usize {
        Self::LOAD_ORDER
            .iter()
            .position(|f| *f == self)
            .unwrap_or(Self::LOAD_ORDER.len())
    }

    /// Check if rooms can be written in this format.
    #[must_use]
    pub const fn is_writable(self) -> bool {
        !matches!(self, Self::Legacy)
    }

    /// Decode a whole map file.
    pub fn decode(self, bytes: &[u8]) -> Result<Vec<Room>, NavError> {
        match self {
            Self::Json => json::decode(bytes),
            Self::Xml => xml::decode(bytes),
            Self::Legacy => legacy::decode(bytes),
        }
    }

    /// Encode rooms, in ascending id order.
    pub fn encode(self, rooms: &[Room]) -> Result<Vec<u8>, NavError> {
        match self {
            Self::Json => json::encode(rooms),
            Self::Xml => xml::encode(rooms),
            Self::Legacy => Err(NavError::UnsupportedFormat(
                "legacy maps are read-only".to_string(),
            )),
        }
    }
}

impl fmt::Display for MapFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Json => "json",
            Self::Xml => "xml",
            Self::Legacy => "legacy",
        })
    }
}

impl FromStr for MapFormat {
    type Err = NavError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "xml" => Ok(Self::Xml),
            "legacy" | "dat" => Ok(Self::Legacy),
            other => Err(NavError::UnsupportedFormat(other.to_string())),
        }
    }
}

fn decode_error(e: impl fmt::Display) -> NavError {
    NavError::Deserialization(e.to_string())
}

fn encode_error(e: impl fmt::Display) -> NavError {
    NavError::Serialization(e.to_string())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_order_prefers_json() {
        assert_eq!(
            MapFormat::LOAD_ORDER,
            [MapFormat::Json, MapFormat::Xml, MapFormat::Legacy]
        );
        assert!(MapFormat::Json.preference() < MapFormat::Legacy.preference());
    }

    #[test]
    fn extensions_round_trip() {
        for format in MapFormat::LOAD_ORDER {
            assert_eq!(MapFormat::from_extension(format.extension()), Some(format));
        }
        assert_eq!(MapFormat::from_extension("JSON"), Some(MapFormat::Json));
        assert_eq!(MapFormat::from_extension("txt"), None);
    }

    #[test]
    fn legacy_is_read_only() {
        assert!(!MapFormat::Legacy.is_writable());
        assert!(matches!(
            MapFormat::Legacy.encode(&[]),
            Err(NavError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn parses_names() {
        assert_eq!("XML".parse::<MapFormat>().expect("parse"), MapFormat::Xml);
        assert!("yaml".parse::<MapFormat>().is_err());
    }
}

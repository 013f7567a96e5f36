//! # Map Directory
//!
//! A directory of timestamped map files, `map-<unix seconds>.<ext>`.
//!
//! Loading walks the files newest first (same timestamp: `LOAD_ORDER`) and
//! keeps the first one that decodes, so a corrupt latest save falls back to
//! the previous one. Saving never overwrites: each save gets a fresh
//! timestamp, written to a temporary name and renamed into place.

use crate::formats::MapFormat;
use crate::primitives::{MAP_FILE_PREFIX, MAX_MAP_FILE_SIZE};
use crate::room::Room;
use crate::NavError;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// One map file found in a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapFile {
    /// Full path.
    pub path: PathBuf,
    /// Unix seconds from the file name.
    pub timestamp: u64,
    /// Encoding, from the extension.
    pub format: MapFormat,
}

impl MapFile {
    /// Parse `map-<ts>.<ext>`; anything else is not a map file.
    fn from_path(path: PathBuf) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        let (stem, ext) = name.strip_prefix(MAP_FILE_PREFIX)?.split_once('.')?;
        let timestamp = stem.parse().ok()?;
        let format = MapFormat::from_extension(ext)?;
        Some(Self {
            path,
            timestamp,
            format,
        })
    }
}

/// A directory holding map files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapDirectory {
    root: PathBuf,
}

impl MapDirectory {
    /// Use `root` as the map directory. Nothing is touched until load or save.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The directory path.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map files in load order: newest first, then by format preference.
    ///
    /// A missing directory has no map files.
    pub fn list(&self) -> Result<Vec<MapFile>, NavError> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }
        let mut files = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            files.extend(MapFile::from_path(entry.path()));
        }
        files.sort_by(|a, b| {
            b.timestamp
                .cmp(&a.timestamp)
                .then_with(|| a.format.preference().cmp(&b.format.preference()))
        });
        Ok(files)
    }

    /// Newest map file, if any.
    pub fn latest(&self) -> Result<Option<MapFile>, NavError> {
        Ok(self.list()?.into_iter().next())
    }

    /// Decode the newest readable map file.
    ///
    /// - No map file → `NavError::NoMapData`
    /// - Every file failed → the last failure
    pub fn load(&self) -> Result<(MapFile, Vec<Room>), NavError> {
        let candidates = self.list()?;
        let mut last_error = NavError::NoMapData(self.root.clone());

        for file in candidates {
            match read_map_file(&file) {
                Ok(rooms) => {
                    tracing::debug!(path = %file.path.display(), rooms = rooms.len(), "Decoded map file");
                    return Ok((file, rooms));
                }
                Err(e) => {
                    tracing::warn!(path = %file.path.display(), error = %e, "Skipping unreadable map file");
                    last_error = e;
                }
            }
        }
        Err(last_error)
    }

    /// Write `rooms` as a new map file.
    pub fn save(&self, rooms: &[Room], format: MapFormat) -> Result<PathBuf, NavError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        self.save_at(rooms, format, now)
    }

    /// Write `rooms` as a new map file stamped no earlier than `timestamp`.
    ///
    /// The stamp is bumped past the newest existing file so the new file is
    /// always the one loaded next.
    pub fn save_at(
        &self,
        rooms: &[Room],
        format: MapFormat,
        timestamp: u64,
    ) -> Result<PathBuf, NavError> {
        let bytes = format.encode(rooms)?;
        std::fs::create_dir_all(&self.root)?;

        let timestamp = match self.latest()? {
            Some(newest) if newest.timestamp >= timestamp => newest.timestamp.saturating_add(1),
            _ => timestamp,
        };
        let name = format!("{}{}.{}", MAP_FILE_PREFIX, timestamp, format.extension());
        let path = self.root.join(&name);
        let partial = self.root.join(format!(".{}.partial", name));

        std::fs::write(&partial, &bytes)?;
        if let Err(e) = std::fs::rename(&partial, &path) {
            let _ = std::fs::remove_file(&partial);
            return Err(e.into());
        }
        tracing::debug!(path = %path.display(), bytes = bytes.len(), "Wrote map file");
        Ok(path)
    }

    /// Delete all but the newest `keep` map files (at least one is kept).
    ///
    /// Returns the deleted paths.
    pub fn prune(&self, keep: usize) -> Result<Vec<PathBuf>, NavError> {
        let mut removed = Vec::new();
        for file in self.list()?.into_iter().skip(keep.max(1)) {
            std::fs::remove_file(&file.path)?;
            removed.push(file.path);
        }
        if !removed.is_empty() {
            tracing::info!(removed = removed.len(), "Pruned old map files");
        }
        Ok(removed)
    }
}

/// Read and decode one file, refusing oversized files before reading.
fn read_map_file(file: &MapFile) -> Result<Vec<Room>, NavError> {
    let size = std::fs::metadata(&file.path)
        .map_err(|e| NavError::Io(format!("Cannot read file metadata: {}", e)))?
        .len();
    if size > MAX_MAP_FILE_SIZE {
        return Err(NavError::Deserialization(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            size, MAX_MAP_FILE_SIZE
        )));
    }
    let bytes = std::fs::read(&file.path)?;
    file.format.decode(&bytes)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RoomId;

    fn rooms(n: u32) -> Vec<Room> {
        (0..n)
            .map(|i| {
                let mut room = Room::new(RoomId(i));
                room.title.push(format!("[Room {}]", i));
                room
            })
            .collect()
    }

    #[test]
    fn parses_map_file_names() {
        let file = MapFile::from_path(PathBuf::from("/maps/map-1700000000.json")).expect("parse");
        assert_eq!(file.timestamp, 1_700_000_000);
        assert_eq!(file.format, MapFormat::Json);
        assert_eq!(MapFile::from_path(PathBuf::from("map-12.dat")).map(|f| f.format), Some(MapFormat::Legacy));
        assert!(MapFile::from_path(PathBuf::from("notes.json")).is_none());
        assert!(MapFile::from_path(PathBuf::from("map-abc.json")).is_none());
        assert!(MapFile::from_path(PathBuf::from("map-12.yaml")).is_none());
    }

    #[test]
    fn missing_directory_has_no_data() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let dir = MapDirectory::new(tmp.path().join("absent"));
        assert!(dir.list().expect("list").is_empty());
        assert!(matches!(dir.load(), Err(NavError::NoMapData(_))));
    }

    #[test]
    fn newest_file_wins() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let dir = MapDirectory::new(tmp.path());
        dir.save_at(&rooms(1), MapFormat::Json, 100).expect("save");
        let newest = dir.save_at(&rooms(3), MapFormat::Xml, 200).expect("save");

        let (file, loaded) = dir.load().expect("load");
        assert_eq!(file.path, newest);
        assert_eq!(loaded.len(), 3);
    }

    #[test]
    fn same_timestamp_prefers_json() {
        let tmp = tempfile::tempdir().expect("tempdir");
        std::fs::write(tmp.path().join("map-50.xml"), "<map></map>").expect("write");
        std::fs::write(tmp.path().join("map-50.json"), "[]").expect("write");

        let files = MapDirectory::new(tmp.path()).list().expect("list");
        let formats: Vec<_> = files.iter().map(|f| f.format).collect();
        assert_eq!(formats, vec![MapFormat::Json, MapFormat::Xml]);
    }

    #[test]
    fn corrupt_newest_falls_back() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let dir = MapDirectory::new(tmp.path());
        dir.save_at(&rooms(2), MapFormat::Json, 100).expect("save");
        std::fs::write(tmp.path().join("map-300.json"), "{ not json").expect("write");

        let (file, loaded) = dir.load().expect("load");
        assert_eq!(file.timestamp, 100);
        assert_eq!(loaded.len(), 2);
    }

    #[test]
    fn all_corrupt_reports_last_error() {
        let tmp = tempfile::tempdir().expect("tempdir");
        std::fs::write(tmp.path().join("map-1.json"), "garbage").expect("write");
        let result = MapDirectory::new(tmp.path()).load();
        assert!(matches!(result, Err(NavError::Deserialization(_))));
    }

    #[test]
    fn timestamp_collision_is_bumped() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let dir = MapDirectory::new(tmp.path());
        let first = dir.save_at(&rooms(1), MapFormat::Json, 100).expect("save");
        let second = dir.save_at(&rooms(1), MapFormat::Json, 100).expect("save");

        assert_ne!(first, second);
        assert_eq!(dir.latest().expect("latest").map(|f| f.timestamp), Some(101));
    }

    #[test]
    fn legacy_save_is_rejected() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let dir = MapDirectory::new(tmp.path());
        assert!(matches!(
            dir.save(&rooms(1), MapFormat::Legacy),
            Err(NavError::UnsupportedFormat(_))
        ));
        assert!(dir.list().expect("list").is_empty());
    }

    #[test]
    fn prune_keeps_newest() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let dir = MapDirectory::new(tmp.path());
        for ts in [10, 20, 30, 40] {
            dir.save_at(&rooms(1), MapFormat::Json, ts).expect("save");
        }

        let removed = dir.prune(2).expect("prune");
        assert_eq!(removed.len(), 2);
        let left: Vec<u64> = dir.list().expect("list").iter().map(|f| f.timestamp).collect();
        assert_eq!(left, vec![40, 30]);

        dir.prune(0).expect("prune");
        assert_eq!(dir.list().expect("list").len(), 1);
    }
}

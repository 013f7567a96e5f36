//! # Storage Module
//!
//! File-system side of persistence: locating, reading and writing map files.
//! Encoding is delegated to `formats`.

mod map_dir;

pub use map_dir::{MapDirectory, MapFile};

//! # Config - cache directory settings
//!
//! Holds the knobs shared by every crate that touches a cache directory:
//! where the files live, how many offset entries are buffered before a
//! spill to disk, and the file-name conventions other pipeline stages rely
//! on.
//!
//! ## Environment
//!
//! ```text
//! OSMCACHE_DIR            cache directory             (default: "data/cache")
//! OSMCACHE_FLUSH_ENTRIES  offset entries per spill    (default: 1024)
//! ```

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Data file holding serialized way records.
pub const WAYS_FILE: &str = "ways.dat";
/// Data file holding serialized relation records.
pub const RELATIONS_FILE: &str = "relations.dat";
/// Base name for node-keyed side tables (node data itself lives elsewhere).
pub const NODES_FILE: &str = "nodes.dat";
/// Suffix appended to a data file name to name its offset file.
pub const OFFSET_EXT: &str = ".offs";
/// Suffix for member id -> relation id tables.
pub const ID2REL_EXT: &str = ".id2rel";
/// Node id -> packed (way id, way kind) table.
pub const MAPPED_WAYS: &str = "mapped_ways.n2w";

/// Number of buffered offset entries above which the buffer is spilled.
pub const DEFAULT_FLUSH_THRESHOLD: usize = 1024;

/// Default cache directory used when `OSMCACHE_DIR` is unset.
pub const DEFAULT_CACHE_DIR: &str = "data/cache";

/// Settings for one cache directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Directory containing every data and offset file of the cache.
    pub dir: PathBuf,
    /// Write-side offset buffer bound, in entries.
    pub flush_threshold: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_CACHE_DIR),
            flush_threshold: DEFAULT_FLUSH_THRESHOLD,
        }
    }
}

/// Reads a configuration value from the environment, falling back to `default`.
fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

impl CacheConfig {
    /// Creates a config for `dir` with the default flush threshold.
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    /// Builds a config from `OSMCACHE_*` environment variables.
    ///
    /// Unparseable or zero thresholds fall back to the default.
    pub fn from_env() -> Self {
        let dir = env_or("OSMCACHE_DIR", DEFAULT_CACHE_DIR);
        let flush_threshold = env_or("OSMCACHE_FLUSH_ENTRIES", "1024")
            .parse()
            .ok()
            .filter(|n: &usize| *n > 0)
            .unwrap_or(DEFAULT_FLUSH_THRESHOLD);
        Self {
            dir: PathBuf::from(dir),
            flush_threshold,
        }
    }

    /// Overrides the flush threshold.
    #[must_use]
    pub fn with_flush_threshold(mut self, entries: usize) -> Self {
        self.flush_threshold = entries.max(1);
        self
    }

    pub fn ways_path(&self) -> PathBuf {
        self.dir.join(WAYS_FILE)
    }

    pub fn relations_path(&self) -> PathBuf {
        self.dir.join(RELATIONS_FILE)
    }

    /// Node id -> relation id table.
    pub fn nodes_to_relations_path(&self) -> PathBuf {
        with_suffix(&self.dir.join(NODES_FILE), ID2REL_EXT)
    }

    /// Way id -> relation id table.
    pub fn ways_to_relations_path(&self) -> PathBuf {
        with_suffix(&self.ways_path(), ID2REL_EXT)
    }

    pub fn mapped_ways_path(&self) -> PathBuf {
        self.dir.join(MAPPED_WAYS)
    }
}

/// Returns the offset file path paired with the data file at `data_path`.
///
/// The suffix is appended to the full file name (`ways.dat` ->
/// `ways.dat.offs`), it does not replace the extension.
pub fn offsets_path(data_path: &Path) -> PathBuf {
    with_suffix(data_path, OFFSET_EXT)
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_uses_1024_entries() {
        let cfg = CacheConfig::default();
        assert_eq!(cfg.flush_threshold, 1024);
        assert_eq!(cfg.dir, PathBuf::from("data/cache"));
    }

    #[test]
    fn offsets_path_appends_suffix() {
        let p = offsets_path(Path::new("/tmp/x/ways.dat"));
        assert_eq!(p, PathBuf::from("/tmp/x/ways.dat.offs"));
    }

    #[test]
    fn side_table_names() {
        let cfg = CacheConfig::new("/c");
        assert_eq!(cfg.ways_path(), PathBuf::from("/c/ways.dat"));
        assert_eq!(cfg.relations_path(), PathBuf::from("/c/relations.dat"));
        assert_eq!(
            cfg.nodes_to_relations_path(),
            PathBuf::from("/c/nodes.dat.id2rel")
        );
        assert_eq!(
            cfg.ways_to_relations_path(),
            PathBuf::from("/c/ways.dat.id2rel")
        );
        assert_eq!(cfg.mapped_ways_path(), PathBuf::from("/c/mapped_ways.n2w"));
    }

    #[test]
    fn zero_threshold_is_clamped() {
        let cfg = CacheConfig::new("/c").with_flush_threshold(0);
        assert_eq!(cfg.flush_threshold, 1);
    }
}

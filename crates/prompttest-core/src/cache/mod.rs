pub mod key;

pub use key::completion_key;

use std::fs;
use std::path::PathBuf;

pub const CACHE_DIR: &str = ".prompttest_cache";

/// One-file-per-key disk cache for model replies. Read and write failures
/// degrade to a live call instead of failing the test.
#[derive(Debug, Clone)]
pub struct DiskCache {
    dir: PathBuf,
}

impl DiskCache {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        let path = self.dir.join(key);
        match fs::read_to_string(&path) {
            Ok(value) => Some(value),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                tracing::debug!("cache read failed for {}: {}", path.display(), e);
                None
            }
        }
    }

    pub fn put(&self, key: &str, value: &str) {
        if let Err(e) = fs::create_dir_all(&self.dir) {
            tracing::warn!("cache dir {} unavailable: {}", self.dir.display(), e);
            return;
        }
        let path = self.dir.join(key);
        if let Err(e) = fs::write(&path, value) {
            tracing::warn!("cache write failed for {}: {}", path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn round_trips_and_misses() {
        let dir = tempdir().unwrap();
        let cache = DiskCache::new(dir.path().join("cache"));
        assert_eq!(cache.get("k"), None);
        cache.put("k", "value");
        assert_eq!(cache.get("k").as_deref(), Some("value"));
    }

    #[test]
    fn missing_directory_reads_as_miss() {
        let cache = DiskCache::new(PathBuf::from("/nonexistent/prompttest-cache"));
        assert_eq!(cache.get("k"), None);
    }
}

//! TextCache - persistent disk cache for recognition results.
//!
//! Recognition is the slow step of the pipeline and the same photo is often
//! re-submitted, so recognized token text is kept on disk keyed by a hash
//! of the source image bytes.

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Persistent disk cache for recognized token text.
pub struct TextCache {
    cache_dir: PathBuf,
}

impl TextCache {
    /// Create a new TextCache with the given cache directory.
    /// Does not create the directory - call `ensure_dir_exists()` to create it.
    pub fn new(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    /// Create a TextCache with the default cache directory.
    /// Default: ~/.cache/dotlens/recognized/
    pub fn with_default_dir() -> Self {
        let cache_dir = dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from(".cache"))
            .join("dotlens")
            .join("recognized");
        Self::new(cache_dir)
    }

    /// Create a TextCache with the default directory and ensure it exists.
    /// This is the preferred constructor for production use.
    pub fn with_default_dir_initialized() -> Result<Self, std::io::Error> {
        let cache = Self::with_default_dir();
        cache.ensure_dir_exists()?;
        Ok(cache)
    }

    /// Create a TextCache with a custom directory and ensure it exists.
    pub fn new_initialized(cache_dir: PathBuf) -> Result<Self, std::io::Error> {
        let cache = Self::new(cache_dir);
        cache.ensure_dir_exists()?;
        Ok(cache)
    }

    /// Ensure the cache directory exists, creating it if necessary.
    pub fn ensure_dir_exists(&self) -> Result<(), std::io::Error> {
        std::fs::create_dir_all(&self.cache_dir)
    }

    /// Get cached recognized text for an image, if present.
    pub fn get(&self, image: &[u8]) -> Option<String> {
        let hash = Self::hash_image(image);
        let entry_path = self.cache_dir.join(format!("{}.txt", hash));
        std::fs::read_to_string(&entry_path).ok()
    }

    /// Store recognized text under the image's hash.
    pub fn store(&self, image: &[u8], text: &str) -> Result<PathBuf, std::io::Error> {
        std::fs::create_dir_all(&self.cache_dir)?;
        let hash = Self::hash_image(image);
        let entry_path = self.cache_dir.join(format!("{}.txt", hash));
        std::fs::write(&entry_path, text)?;
        Ok(entry_path)
    }

    /// Generate a deterministic SHA256 hash for image bytes.
    /// Returns a 32-character hex string (first 16 bytes of SHA256).
    /// Same bytes always produce the same hash.
    pub fn hash_image(image: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(image);
        let result = hasher.finalize();
        // Use first 16 bytes (32 hex chars) for shorter filenames
        hex::encode(&result[..16])
    }

    /// Get the cache directory path.
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Get total size of all cached entries in bytes.
    pub fn total_size_bytes(&self) -> Result<u64, std::io::Error> {
        let mut total: u64 = 0;

        if !self.cache_dir.exists() {
            return Ok(0);
        }

        for entry in std::fs::read_dir(&self.cache_dir)? {
            let entry = entry?;
            let path = entry.path();

            if path.extension().and_then(|e| e.to_str()) == Some("txt") {
                if let Ok(metadata) = entry.metadata() {
                    if metadata.is_file() {
                        total += metadata.len();
                    }
                }
            }
        }

        Ok(total)
    }

    /// Remove old entries if the cache exceeds max size.
    /// Deletes oldest files first (by modification time) until under limit.
    pub fn cleanup_if_needed(&self, max_size_mb: u64) -> Result<(), std::io::Error> {
        let max_size_bytes = max_size_mb * 1024 * 1024;

        let mut files: Vec<(PathBuf, std::fs::Metadata)> = Vec::new();
        let mut total_size: u64 = 0;

        if !self.cache_dir.exists() {
            return Ok(());
        }

        for entry in std::fs::read_dir(&self.cache_dir)? {
            let entry = entry?;
            let path = entry.path();

            if path.extension().and_then(|e| e.to_str()) == Some("txt") {
                if let Ok(metadata) = entry.metadata() {
                    if metadata.is_file() {
                        total_size += metadata.len();
                        files.push((path, metadata));
                    }
                }
            }
        }

        if total_size <= max_size_bytes {
            return Ok(());
        }

        // Oldest first
        files.sort_by(|a, b| {
            let time_a = a.1.modified().unwrap_or(std::time::SystemTime::UNIX_EPOCH);
            let time_b = b.1.modified().unwrap_or(std::time::SystemTime::UNIX_EPOCH);
            time_a.cmp(&time_b)
        });

        for (path, metadata) in files {
            if total_size <= max_size_bytes {
                break;
            }

            let file_size = metadata.len();
            if std::fs::remove_file(&path).is_ok() {
                total_size = total_size.saturating_sub(file_size);
            }
        }

        Ok(())
    }

    /// Store recognized text and automatically clean up if needed.
    pub fn store_with_cleanup(
        &self,
        image: &[u8],
        text: &str,
        max_size_mb: u64,
    ) -> Result<PathBuf, std::io::Error> {
        let entry_path = self.store(image, text)?;
        self.cleanup_if_needed(max_size_mb)?;
        Ok(entry_path)
    }

    /// List all cached entries with their hashes, sizes, and text.
    pub fn list_entries(&self) -> Result<Vec<CacheEntry>, std::io::Error> {
        let mut entries = Vec::new();

        if !self.cache_dir.exists() {
            return Ok(entries);
        }

        for entry in std::fs::read_dir(&self.cache_dir)? {
            let entry = entry?;
            let path = entry.path();

            if path.extension().and_then(|e| e.to_str()) != Some("txt") {
                continue;
            }

            let metadata = entry.metadata()?;
            if !metadata.is_file() {
                continue;
            }

            let hash = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("")
                .to_string();

            let text = std::fs::read_to_string(&path).ok();

            entries.push(CacheEntry {
                hash,
                text,
                size_bytes: metadata.len(),
                path,
            });
        }

        // Sort by hash for consistent output
        entries.sort_by(|a, b| a.hash.cmp(&b.hash));

        Ok(entries)
    }

    /// Remove a cached entry by its hash.
    /// Returns true if a file was removed, false if it didn't exist.
    pub fn remove(&self, hash: &str) -> Result<bool, std::io::Error> {
        let entry_path = self.cache_dir.join(format!("{}.txt", hash));

        if entry_path.exists() {
            std::fs::remove_file(&entry_path)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Remove all cached entries.
    /// Returns the number of entries removed.
    pub fn clear_all(&self) -> Result<usize, std::io::Error> {
        if !self.cache_dir.exists() {
            return Ok(0);
        }

        let mut count = 0;

        for entry in std::fs::read_dir(&self.cache_dir)? {
            let entry = entry?;
            let path = entry.path();

            if path.extension().and_then(|e| e.to_str()) == Some("txt")
                && std::fs::remove_file(&path).is_ok()
            {
                count += 1;
            }
        }

        Ok(count)
    }
}

/// Information about a cached recognition entry.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// SHA256 hash of the image bytes (first 32 hex chars)
    pub hash: String,
    /// The recognized token text, if readable
    pub text: Option<String>,
    /// Size of the entry file in bytes
    pub size_bytes: u64,
    /// Full path to the cached entry
    pub path: PathBuf,
}

//! Configuration module for a synchronization run
//!
//! This module provides the settings that shape a run: gzip level, worker
//! count, artifact write mode and symlink handling. The defaults reproduce
//! the plain sequential behavior, so `SyncConfig::default()` is what the
//! bare `gzsync <ROOT>` invocation uses.

use serde::{Deserialize, Serialize};

/// Extension appended to a source path to name its derived artifact
pub const ARTIFACT_EXTENSION: &str = "gz";

/// Name prefix of the temp files atomic writes create next to their artifact
pub const TEMP_PREFIX: &str = ".gzsync-";

/// Name suffix of the temp files atomic writes create next to their artifact
pub const TEMP_SUFFIX: &str = ".tmp";

/// Default gzip level, matching `flate2::Compression::default()`
pub const DEFAULT_LEVEL: u32 = 6;

/// How the walker treats symbolic links found in a directory listing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SymlinkPolicy {
    /// Ignore symlink entries entirely
    #[default]
    Skip,
    /// Compress regular files reached through a link; never descend into linked directories
    FollowFiles,
}

/// Configuration structure for a synchronization run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// gzip compression level (0-9)
    pub level: u32,
    /// Worker threads; 1 runs sequentially, 0 uses one per CPU
    pub jobs: usize,
    /// Write artifacts to a temp file in the same directory and rename on success
    pub atomic: bool,
    /// Symlink handling
    pub symlinks: SymlinkPolicy,
}

impl SyncConfig {
    /// Sequential, direct-write configuration at the default level
    pub fn sequential() -> Self {
        SyncConfig {
            level: DEFAULT_LEVEL,
            jobs: 1,
            atomic: false,
            symlinks: SymlinkPolicy::Skip,
        }
    }

    /// Set the gzip level
    pub fn with_level(mut self, level: u32) -> Self {
        self.level = level;
        self
    }

    /// Set the worker count
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs;
        self
    }

    /// Enable or disable temp-file-then-rename writes
    pub fn with_atomic(mut self, atomic: bool) -> Self {
        self.atomic = atomic;
        self
    }

    /// Set the symlink policy
    pub fn with_symlinks(mut self, symlinks: SymlinkPolicy) -> Self {
        self.symlinks = symlinks;
        self
    }

    /// Number of worker threads this configuration resolves to
    pub fn effective_jobs(&self) -> usize {
        match self.jobs {
            0 => num_cpus::get(),
            n => n,
        }
    }

    /// Whether the run uses a worker pool
    pub fn is_parallel(&self) -> bool {
        self.effective_jobs() > 1
    }

    /// Validate the configuration
    pub fn validate(&self) -> crate::Result<()> {
        if self.level > 9 {
            return Err(crate::SyncError::validation(format!(
                "compression level {} is out of range (0-9)",
                self.level
            )));
        }
        Ok(())
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::sequential()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_sequential() {
        let config = SyncConfig::default();
        assert_eq!(config.level, DEFAULT_LEVEL);
        assert_eq!(config.jobs, 1);
        assert!(!config.atomic);
        assert_eq!(config.symlinks, SymlinkPolicy::Skip);
        assert!(!config.is_parallel());
    }

    #[test]
    fn test_builder_methods() {
        let config = SyncConfig::default()
            .with_level(9)
            .with_jobs(4)
            .with_atomic(true)
            .with_symlinks(SymlinkPolicy::FollowFiles);
        assert_eq!(config.level, 9);
        assert_eq!(config.effective_jobs(), 4);
        assert!(config.is_parallel());
        assert!(config.atomic);
        assert_eq!(config.symlinks, SymlinkPolicy::FollowFiles);
    }

    #[test]
    fn test_zero_jobs_means_one_per_cpu() {
        let config = SyncConfig::default().with_jobs(0);
        assert_eq!(config.effective_jobs(), num_cpus::get());
        assert!(config.effective_jobs() >= 1);
    }

    #[test]
    fn test_validate_level() {
        assert!(SyncConfig::default().with_level(0).validate().is_ok());
        assert!(SyncConfig::default().with_level(9).validate().is_ok());

        let result = SyncConfig::default().with_level(10).validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("out of range"));
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let config = SyncConfig::default().with_atomic(true);
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"atomic\":true"));
        assert!(json.contains("\"symlinks\":\"Skip\""));
        let back: SyncConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}

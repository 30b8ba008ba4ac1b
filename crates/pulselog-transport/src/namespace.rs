use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Result, TransportError};
use crate::name::ChannelName;

/// Environment variable overriding the namespace root directory.
pub const RUNTIME_DIR_ENV: &str = "PULSELOG_RUNTIME_DIR";

/// Directory created under the system temp dir when no root is configured.
pub const DEFAULT_DIR_NAME: &str = "pulselog";

/// Maximum socket path length.
/// Unix `sockaddr_un.sun_path` is typically 108 bytes on Linux, 104 on macOS.
#[cfg(target_os = "linux")]
pub const MAX_PATH_LEN: usize = 108;
#[cfg(not(target_os = "linux"))]
pub const MAX_PATH_LEN: usize = 104;

/// The directory in which channel names are registered.
///
/// A channel `logger` lives at `<root>/logger.sock`. Client reply sockets for
/// that channel live next to it as `<root>/logger.<pid>-<seq>.reply`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    root: PathBuf,
}

impl Namespace {
    /// Use an explicit root directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve the root from `PULSELOG_RUNTIME_DIR`, falling back to
    /// `<temp_dir>/pulselog`.
    pub fn from_env() -> Self {
        let root = std::env::var_os(RUNTIME_DIR_ENV)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_DIR_NAME));
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path at which `name` is registered.
    pub fn channel_path(&self, name: &ChannelName) -> PathBuf {
        self.root.join(format!("{name}.sock"))
    }

    pub(crate) fn reply_path(&self, name: &ChannelName, seq: u64) -> PathBuf {
        self.root
            .join(format!("{name}.{}-{seq}.reply", std::process::id()))
    }

    /// Reply socket files for `name` currently in the root, live or not.
    pub(crate) fn reply_paths(&self, name: &ChannelName) -> Vec<PathBuf> {
        let prefix = format!("{name}.");
        let Ok(entries) = std::fs::read_dir(&self.root) else {
            return Vec::new();
        };
        entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .and_then(|file| file.to_str())
                    .is_some_and(|file| file.starts_with(&prefix) && file.ends_with(".reply"))
            })
            .collect()
    }

    /// Create the root directory (and parents) if missing.
    pub fn ensure_root(&self) -> Result<()> {
        if self.root.is_dir() {
            return Ok(());
        }
        std::fs::create_dir_all(&self.root).map_err(|source| TransportError::RuntimeDir {
            path: self.root.clone(),
            source,
        })?;
        debug!(root = ?self.root, "created runtime directory");
        Ok(())
    }
}

impl Default for Namespace {
    fn default() -> Self {
        Self::from_env()
    }
}

pub(crate) fn check_path_len(path: &Path) -> Result<()> {
    let len = path.as_os_str().len();
    if len >= MAX_PATH_LEN {
        return Err(TransportError::PathTooLong {
            path: path.to_path_buf(),
            len,
            max: MAX_PATH_LEN,
        });
    }
    Ok(())
}

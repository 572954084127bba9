//! Report framing and device-node I/O helpers
//!
//! Report nodes (`/dev/hidgN`) follow one framing convention: when a
//! device multiplexes report layouts, the first byte of every frame is
//! the report ID; a device using report ID 0 sends bare payloads.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

use tracing::debug;

/// Build the wire frame for a report: a single report-ID byte prefix
/// when the ID is non-zero, the bare payload otherwise.
pub fn frame_report(report_id: u8, payload: &[u8]) -> Vec<u8> {
    if report_id > 0 {
        let mut frame = Vec::with_capacity(payload.len() + 1);
        frame.push(report_id);
        frame.extend_from_slice(payload);
        frame
    } else {
        payload.to_vec()
    }
}

/// Open a report node in blocking read-write mode
pub fn open_blocking(path: &Path) -> io::Result<File> {
    OpenOptions::new().read(true).write(true).open(path)
}

/// Open a report node in non-blocking read-write mode
pub fn open_nonblocking(path: &Path) -> io::Result<File> {
    OpenOptions::new()
        .read(true)
        .write(true)
        .custom_flags(libc::O_NONBLOCK)
        .open(path)
}

/// Cache of open non-blocking handles, keyed by device-node path.
///
/// A handle is opened on first use of a path and reused until evicted.
/// Would-block results leave the handle cached for retry; any other I/O
/// failure must evict so the next use reopens a fresh handle.
#[derive(Debug, Default)]
pub struct HandleCache {
    handles: HashMap<PathBuf, File>,
}

impl HandleCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the cached handle for a path, opening and caching one if absent
    pub fn get_or_open(&mut self, path: &Path) -> io::Result<&mut File> {
        match self.handles.entry(path.to_path_buf()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let file = open_nonblocking(path)?;
                debug!("opened non-blocking handle for {}", path.display());
                Ok(entry.insert(file))
            }
        }
    }

    /// Close and drop the cached handle for a path, if any
    pub fn evict(&mut self, path: &Path) {
        if self.handles.remove(path).is_some() {
            debug!("evicted handle for {}", path.display());
        }
    }

    /// Number of cached handles for a path (0 or 1)
    pub fn open_handles(&self, path: &Path) -> usize {
        usize::from(self.handles.contains_key(path))
    }

    /// Close every cached handle
    pub fn clear(&mut self) {
        self.handles.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::sys::stat::Mode;
    use nix::unistd::mkfifo;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_frame_prefixes_nonzero_report_id() {
        assert_eq!(frame_report(3, &[0xAA, 0xBB]), vec![0x03, 0xAA, 0xBB]);
    }

    #[test]
    fn test_frame_report_id_zero_is_bare() {
        assert_eq!(frame_report(0, &[0xAA]), vec![0xAA]);
    }

    #[test]
    fn test_cache_open_reuse_evict() {
        let dir = tempdir().unwrap();
        let fifo = dir.path().join("hidg0");
        mkfifo(&fifo, Mode::from_bits_truncate(0o600)).unwrap();

        let mut cache = HandleCache::new();
        assert_eq!(cache.open_handles(&fifo), 0);

        cache.get_or_open(&fifo).unwrap().write_all(&[0x01]).unwrap();
        assert_eq!(cache.open_handles(&fifo), 1);

        // Second use reuses the same handle
        cache.get_or_open(&fifo).unwrap();
        assert_eq!(cache.open_handles(&fifo), 1);

        cache.evict(&fifo);
        assert_eq!(cache.open_handles(&fifo), 0);
    }

    #[test]
    fn test_cache_open_missing_node_fails_without_caching() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("hidg9");

        let mut cache = HandleCache::new();
        assert!(cache.get_or_open(&missing).is_err());
        assert_eq!(cache.open_handles(&missing), 0);
    }
}

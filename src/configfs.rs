//! ConfigFS file primitives for the USB gadget tree

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// ConfigFS base path for USB gadgets
pub const CONFIGFS_PATH: &str = "/sys/kernel/config/usb_gadget";

/// Where the kernel lists USB device controllers
pub const UDC_CLASS_PATH: &str = "/sys/class/udc";

/// Default gadget name
pub const DEFAULT_GADGET_NAME: &str = "usb-hidg";

/// Single supported string locale (US English)
pub const STRINGS_LOCALE: &str = "0x409";

/// Check if ConfigFS is available
pub fn is_configfs_available() -> bool {
    Path::new(CONFIGFS_PATH).exists()
}

/// Find an available UDC under the given class directory.
///
/// With more than one controller present the first directory entry wins;
/// `read_dir` order is the only tie-break.
pub fn find_udc(class_path: &Path) -> Option<String> {
    if !class_path.exists() {
        return None;
    }

    fs::read_dir(class_path)
        .ok()?
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().to_string())
        .next()
}

/// Attach the offending path to an I/O error without losing its kind.
fn io_context(path: &Path, e: io::Error) -> Error {
    Error::Io(io::Error::new(e.kind(), format!("{}: {}", path.display(), e)))
}

/// Write string content to an attribute file.
///
/// sysfs/configfs attributes require a single atomic write() syscall:
/// the kernel processes the value on the first write, so the complete
/// buffer (including the trailing newline) is built before writing.
pub fn write_file(path: &Path, content: &str) -> Result<()> {
    // O_WRONLY without O_TRUNC; truncation may fail on attribute files.
    let mut file = OpenOptions::new()
        .write(true)
        .open(path)
        .or_else(|e| {
            if path.exists() {
                Err(e)
            } else {
                File::create(path)
            }
        })
        .map_err(|e| io_context(path, e))?;

    let data: std::borrow::Cow<[u8]> = if content.ends_with('\n') {
        content.as_bytes().into()
    } else {
        let mut buf = content.as_bytes().to_vec();
        buf.push(b'\n');
        buf.into()
    };

    file.write_all(&data).map_err(|e| io_context(path, e))?;
    file.flush().map_err(|e| io_context(path, e))?;

    Ok(())
}

/// Write binary content to an attribute file (report descriptors)
pub fn write_bytes(path: &Path, data: &[u8]) -> Result<()> {
    let mut file = File::create(path).map_err(|e| io_context(path, e))?;
    file.write_all(data).map_err(|e| io_context(path, e))?;
    Ok(())
}

/// Read and trim string content from an attribute file
pub fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .map(|s| s.trim().to_string())
        .map_err(|e| io_context(path, e))
}

/// Create a directory, parents included
pub fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| io_context(path, e))
}

/// Remove a user-created gadget tree node; already absent is success.
///
/// ConfigFS removes a node with plain rmdir even though the kernel still
/// presents attribute files inside it. On a regular filesystem (scratch
/// trees in tests) those attributes are ordinary files and rmdir reports
/// ENOTEMPTY, so fall back to recursive removal there. Teardown order
/// still matters: a node holding real child nodes fails on ConfigFS.
pub fn remove_node(path: &Path) -> Result<()> {
    match fs::remove_dir(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) if e.raw_os_error() == Some(libc::ENOTEMPTY) => {
            fs::remove_dir_all(path).map_err(|e| io_context(path, e))
        }
        Err(e) => Err(io_context(path, e)),
    }
}

/// Remove a file or symlink; an already-absent entry is success
pub fn remove_file(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(io_context(path, e)),
    }
}

/// Create a symlink
pub fn create_symlink(src: &Path, dest: &Path) -> Result<()> {
    std::os::unix::fs::symlink(src, dest).map_err(|e| io_context(dest, e))
}

/// List entries of a directory; a missing directory yields no entries
pub fn list_dir(path: &Path) -> Result<Vec<PathBuf>> {
    let entries = match fs::read_dir(path) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(io_context(path, e)),
    };

    let mut paths = Vec::new();
    for entry in entries {
        paths.push(entry.map_err(|e| io_context(path, e))?.path());
    }
    paths.sort();
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_write_file_appends_newline() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("idVendor");
        write_file(&path, "0x1d6b").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "0x1d6b\n");
        assert_eq!(read_file(&path).unwrap(), "0x1d6b");
    }

    #[test]
    fn test_remove_missing_is_ok() {
        let dir = tempdir().unwrap();
        assert!(remove_node(&dir.path().join("nope")).is_ok());
        assert!(remove_file(&dir.path().join("nope")).is_ok());
    }

    #[test]
    fn test_remove_node_ignores_attribute_files() {
        let dir = tempdir().unwrap();
        let node = dir.path().join("hid.usb1");
        std::fs::create_dir(&node).unwrap();
        std::fs::write(node.join("protocol"), "1\n").unwrap();
        remove_node(&node).unwrap();
        assert!(!node.exists());
        remove_node(&node).unwrap();
    }

    #[test]
    fn test_list_dir_missing_is_empty() {
        let dir = tempdir().unwrap();
        assert!(list_dir(&dir.path().join("functions")).unwrap().is_empty());
    }

    #[test]
    fn test_find_udc_first_entry() {
        let dir = tempdir().unwrap();
        assert_eq!(find_udc(dir.path()), None);
        std::fs::create_dir(dir.path().join("dummy_udc.0")).unwrap();
        assert_eq!(find_udc(dir.path()).unwrap(), "dummy_udc.0");
    }
}

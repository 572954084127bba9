//! Report ID to device-node path resolution
//!
//! Once a gadget is bound, the kernel assigns each HID function a
//! character device. The function's `dev` attribute holds the node's
//! `major:minor` pair; the minor selects the stable `/dev/hidg<minor>`
//! path.

use std::path::{Path, PathBuf};

use crate::configfs::read_file;
use crate::error::{Error, Result};

/// Resolves report IDs to their transport paths for one gadget.
#[derive(Debug, Clone)]
pub struct PathResolver {
    gadget_path: PathBuf,
    dev_root: PathBuf,
}

impl PathResolver {
    /// Resolver for a gadget, with device nodes under `/dev`
    pub fn new(gadget_path: PathBuf) -> Self {
        Self {
            gadget_path,
            dev_root: PathBuf::from("/dev"),
        }
    }

    /// Resolver with a custom device-node root (scratch trees in tests)
    pub fn with_dev_root(gadget_path: PathBuf, dev_root: PathBuf) -> Self {
        Self {
            gadget_path,
            dev_root,
        }
    }

    /// Resolve the transport path for a report ID.
    ///
    /// Fails with [`Error::NotReady`] when the gadget is not bound or the
    /// report ID belongs to no enabled function.
    pub fn resolve(&self, report_id: u8) -> Result<PathBuf> {
        let dev_attr = self
            .gadget_path
            .join(format!("functions/hid.usb{}", report_id))
            .join("dev");

        let dev = read_file(&dev_attr).map_err(|_| {
            Error::NotReady(format!(
                "no function node for report ID {} (is the gadget enabled?)",
                report_id
            ))
        })?;

        // "major:minor" -> minor
        let minor = dev.split(':').nth(1).ok_or_else(|| {
            Error::NotReady(format!(
                "malformed dev attribute {:?} at {}",
                dev,
                dev_attr.display()
            ))
        })?;

        Ok(self.dev_root.join(format!("hidg{}", minor)))
    }

    pub fn gadget_path(&self) -> &Path {
        &self.gadget_path
    }
}

//! HID function nodes in the gadget tree
//!
//! One function node exists per report ID; its directory name
//! (`hid.usb<id>`) doubles as the stable key linking the configuration
//! symlink, the kernel-assigned device node, and the report ID.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::configfs::{create_dir, create_symlink, write_bytes, write_file};
use crate::error::Result;

/// Fixed HID interface subclass written to every function node
pub const HID_SUBCLASS: u8 = 1;

/// One `hid.usb<N>` function node
#[derive(Debug, Clone)]
pub struct HidFunction {
    report_id: u8,
    report_length: usize,
    descriptor: Vec<u8>,
    name: String,
}

impl HidFunction {
    pub fn new(report_id: u8, report_length: usize, descriptor: &[u8]) -> Self {
        Self {
            report_id,
            report_length,
            descriptor: descriptor.to_vec(),
            name: format!("hid.usb{}", report_id),
        }
    }

    fn function_path(&self, gadget_path: &Path) -> PathBuf {
        gadget_path.join("functions").join(&self.name)
    }

    /// Create the function node and write its attributes.
    ///
    /// An already-existing node (left over from a previous partial build)
    /// is kept as-is, not an error.
    pub fn create(&self, gadget_path: &Path) -> Result<()> {
        let func_path = self.function_path(gadget_path);
        if func_path.exists() {
            debug!("function {} already exists, keeping it", self.name);
            return Ok(());
        }

        create_dir(&func_path)?;
        write_file(&func_path.join("protocol"), &self.report_id.to_string())?;
        write_file(
            &func_path.join("report_length"),
            &self.report_length.to_string(),
        )?;
        write_file(&func_path.join("subclass"), &HID_SUBCLASS.to_string())?;
        write_bytes(&func_path.join("report_desc"), &self.descriptor)?;

        debug!("created function {} at {}", self.name, func_path.display());
        Ok(())
    }

    /// Symlink the function into a configuration; an existing link is kept
    pub fn link(&self, config_path: &Path, gadget_path: &Path) -> Result<()> {
        let link_path = config_path.join(&self.name);
        // symlink_metadata so a dangling link still counts as present
        if link_path.symlink_metadata().is_ok() {
            return Ok(());
        }
        create_symlink(&self.function_path(gadget_path), &link_path)?;
        debug!("linked function {} into {}", self.name, config_path.display());
        Ok(())
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_create_writes_attributes() {
        let dir = tempdir().unwrap();
        let func = HidFunction::new(3, 2, &[0x05, 0x0C, 0xC0]);
        func.create(dir.path()).unwrap();

        let root = dir.path().join("functions/hid.usb3");
        let read = |name: &str| std::fs::read_to_string(root.join(name)).unwrap();
        assert_eq!(read("protocol"), "3\n");
        assert_eq!(read("report_length"), "2\n");
        assert_eq!(read("subclass"), "1\n");
        assert_eq!(
            std::fs::read(root.join("report_desc")).unwrap(),
            vec![0x05, 0x0C, 0xC0]
        );
    }

    #[test]
    fn test_create_skips_existing_node() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("functions/hid.usb1");
        std::fs::create_dir_all(&root).unwrap();
        std::fs::write(root.join("dev"), "239:0").unwrap();

        let func = HidFunction::new(1, 8, &[0xC0]);
        func.create(dir.path()).unwrap();

        // Pre-existing content untouched, no attributes rewritten
        assert_eq!(std::fs::read_to_string(root.join("dev")).unwrap(), "239:0");
        assert!(!root.join("protocol").exists());
    }

    #[test]
    fn test_link_into_configuration() {
        let dir = tempdir().unwrap();
        let config = dir.path().join("configs/c.1");
        std::fs::create_dir_all(&config).unwrap();

        let func = HidFunction::new(2, 4, &[0xC0]);
        func.create(dir.path()).unwrap();
        func.link(&config, dir.path()).unwrap();

        let link = config.join("hid.usb2");
        assert_eq!(
            std::fs::read_link(&link).unwrap(),
            dir.path().join("functions/hid.usb2")
        );

        // Relinking an existing symlink is a no-op
        func.link(&config, dir.path()).unwrap();
    }
}

//! HID device profiles and per-device report exchange
//!
//! A [`Device`] bundles a report descriptor with the metadata the gadget
//! tree needs (report IDs and per-report lengths) and, once enabled,
//! carries the resolved transport path plus the per-device I/O state:
//! the last-received-report cache and the non-blocking handle cache.

use std::borrow::Cow;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use tracing::trace;

use crate::descriptors;
use crate::error::{Error, Result};
use crate::resolver::PathResolver;
use crate::transport::{frame_report, open_blocking, open_nonblocking, HandleCache};

/// One HID device profile within the composite gadget.
#[derive(Debug)]
pub struct Device {
    descriptor: Cow<'static, [u8]>,
    usage_page: u16,
    usage: u16,
    report_ids: Vec<u8>,
    in_report_lengths: Vec<usize>,
    out_report_lengths: Vec<usize>,
    name: String,
    resolver: Option<PathResolver>,
    path: Option<PathBuf>,
    last_received_report: Option<Vec<u8>>,
    handles: HandleCache,
}

impl Device {
    /// Construct a custom profile.
    ///
    /// The length sequences must either align index-for-index with
    /// `report_ids` or be singletons broadcast across all report IDs.
    /// Report ID 0 means no report-ID byte on the wire and excludes any
    /// other report ID on the same device.
    pub fn new(
        descriptor: Vec<u8>,
        usage_page: u16,
        usage: u16,
        report_ids: Vec<u8>,
        in_report_lengths: Vec<usize>,
        out_report_lengths: Vec<usize>,
        name: impl Into<String>,
    ) -> Result<Self> {
        if report_ids.is_empty() {
            return Err(Error::Config("a device needs at least one report ID".into()));
        }
        for (lengths, which) in [
            (&in_report_lengths, "in_report_lengths"),
            (&out_report_lengths, "out_report_lengths"),
        ] {
            if lengths.len() != report_ids.len() && lengths.len() != 1 {
                return Err(Error::Config(format!(
                    "{} has {} entries for {} report IDs (must match or be a singleton)",
                    which,
                    lengths.len(),
                    report_ids.len()
                )));
            }
        }
        if report_ids.contains(&0) && report_ids.len() > 1 {
            return Err(Error::Config(
                "report ID 0 means no report-ID byte and excludes other report IDs".into(),
            ));
        }

        Ok(Self::template(
            Cow::Owned(descriptor),
            usage_page,
            usage,
            report_ids,
            in_report_lengths,
            out_report_lengths,
            name.into(),
        ))
    }

    /// Shared constructor for the predefined profiles, whose metadata is
    /// known valid.
    fn template(
        descriptor: Cow<'static, [u8]>,
        usage_page: u16,
        usage: u16,
        report_ids: Vec<u8>,
        in_report_lengths: Vec<usize>,
        out_report_lengths: Vec<usize>,
        name: String,
    ) -> Self {
        Self {
            descriptor,
            usage_page,
            usage,
            report_ids,
            in_report_lengths,
            out_report_lengths,
            name,
            resolver: None,
            path: None,
            last_received_report: None,
            handles: HandleCache::new(),
        }
    }

    /// Keyboard with LED output (report ID 1)
    pub fn keyboard() -> Self {
        Self::template(
            Cow::Borrowed(descriptors::KEYBOARD),
            0x01,
            0x06,
            vec![descriptors::KEYBOARD_REPORT_ID],
            vec![8],
            vec![1],
            "keyboard gadget".into(),
        )
    }

    /// Boot-protocol keyboard (no report ID on the wire)
    pub fn boot_keyboard() -> Self {
        Self::template(
            Cow::Borrowed(descriptors::BOOT_KEYBOARD),
            0x01,
            0x06,
            vec![0],
            vec![8],
            vec![1],
            "boot keyboard gadget".into(),
        )
    }

    /// Relative mouse with wheel (report ID 2)
    pub fn mouse() -> Self {
        Self::template(
            Cow::Borrowed(descriptors::MOUSE),
            0x01,
            0x02,
            vec![descriptors::MOUSE_REPORT_ID],
            vec![4],
            vec![0],
            "mouse gadget".into(),
        )
    }

    /// Boot-protocol mouse (no report ID on the wire)
    pub fn boot_mouse() -> Self {
        Self::template(
            Cow::Borrowed(descriptors::BOOT_MOUSE),
            0x01,
            0x02,
            vec![0],
            vec![4],
            vec![0],
            "boot mouse gadget".into(),
        )
    }

    /// Consumer control / multimedia keys (report ID 3)
    pub fn consumer_control() -> Self {
        Self::template(
            Cow::Borrowed(descriptors::CONSUMER_CONTROL),
            0x0C,
            0x01,
            vec![descriptors::CONSUMER_CONTROL_REPORT_ID],
            vec![2],
            vec![0],
            "consumer control gadget".into(),
        )
    }

    /// Gamepad with a vendor-defined rumble output report
    /// (input report ID 4, output report ID 5)
    pub fn gamepad() -> Self {
        Self::template(
            Cow::Borrowed(descriptors::GAMEPAD),
            0x01,
            0x05,
            vec![descriptors::GAMEPAD_REPORT_ID, descriptors::RUMBLE_REPORT_ID],
            vec![10],
            vec![2],
            "gamepad gadget".into(),
        )
    }

    /// Digitizer/pen (report ID 6)
    pub fn digitizer() -> Self {
        Self::template(
            Cow::Borrowed(descriptors::DIGITIZER),
            0x0D,
            0x02,
            vec![descriptors::DIGITIZER_REPORT_ID],
            vec![27],
            vec![0],
            "digitizer gadget".into(),
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn descriptor(&self) -> &[u8] {
        &self.descriptor
    }

    pub fn usage_page(&self) -> u16 {
        self.usage_page
    }

    pub fn usage(&self) -> u16 {
        self.usage
    }

    pub fn report_ids(&self) -> &[u8] {
        &self.report_ids
    }

    /// Resolved transport path; `None` until the device is enabled
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub(crate) fn first_report_id(&self) -> u8 {
        self.report_ids[0]
    }

    fn report_index(&self, report_id: u8) -> Option<usize> {
        self.report_ids.iter().position(|&id| id == report_id)
    }

    /// Input-report length for the report at the given index
    /// (singleton-broadcast aware)
    pub(crate) fn in_report_length_at(&self, index: usize) -> usize {
        if self.in_report_lengths.len() == 1 {
            self.in_report_lengths[0]
        } else {
            self.in_report_lengths[index]
        }
    }

    /// Output-report length for a report ID (singleton-broadcast aware)
    fn out_report_length(&self, report_id: u8) -> usize {
        if self.out_report_lengths.len() == 1 {
            self.out_report_lengths[0]
        } else {
            self.out_report_lengths[self.report_index(report_id).unwrap_or(0)]
        }
    }

    /// Resolve the device node for a report ID, defaulting to the first.
    ///
    /// Fails with [`Error::NotReady`] until the gadget has been enabled.
    pub fn device_path(&self, report_id: Option<u8>) -> Result<PathBuf> {
        let resolver = self.resolver.as_ref().ok_or_else(|| {
            Error::NotReady(format!("device {:?} is not enabled", self.name))
        })?;
        resolver.resolve(report_id.unwrap_or_else(|| self.first_report_id()))
    }

    /// Attach a resolver and record the transport path (first report ID).
    /// Called by the lifecycle manager after binding.
    pub(crate) fn attach(&mut self, resolver: PathResolver) -> Result<()> {
        let path = resolver.resolve(self.first_report_id())?;
        self.resolver = Some(resolver);
        self.path = Some(path);
        Ok(())
    }

    /// Drop transport state: resolver, recorded path, cached handles.
    pub(crate) fn detach(&mut self) {
        self.resolver = None;
        self.path = None;
        self.handles.clear();
    }

    /// Send a report over the blocking path.
    ///
    /// Opens the node read-write for the duration of the call. A non-zero
    /// report ID is prefixed as a single byte; report ID 0 sends the bare
    /// payload. A short write is surfaced, never retried.
    pub fn send_report(&self, report: &[u8], report_id: Option<u8>) -> Result<()> {
        let id = report_id.unwrap_or_else(|| self.first_report_id());
        let path = self.device_path(Some(id))?;
        let frame = frame_report(id, report);

        let mut file = open_blocking(&path)?;
        let written = file.write(&frame)?;
        if written != frame.len() {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("short write: {} of {} bytes", written, frame.len()),
            )));
        }
        trace!("sent report {:02X?} to {}", frame, path.display());
        Ok(())
    }

    /// Send a report without blocking, through the cached handle for the
    /// node.
    ///
    /// A would-block condition is returned as [`Error::WouldBlock`] and
    /// leaves the handle cached for retry; any other I/O failure evicts
    /// the handle before propagating so the next call reopens a fresh
    /// one.
    pub fn send_report_nonblocking(&mut self, report: &[u8], report_id: Option<u8>) -> Result<()> {
        let id = report_id.unwrap_or_else(|| self.first_report_id());
        let path = self.device_path(Some(id))?;
        let frame = frame_report(id, report);

        let result = self
            .handles
            .get_or_open(&path)
            .and_then(|file| file.write(&frame));

        match result {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Err(Error::WouldBlock),
            Err(e) => {
                self.handles.evict(&path);
                Err(Error::Io(e))
            }
        }
    }

    /// Return the last HID OUT report received from the host.
    ///
    /// Polls the node without blocking: freshly arrived bytes update the
    /// cache; otherwise the cache is returned unchanged, `None` if
    /// nothing was ever received. Never suspends the caller.
    pub fn get_last_received_report(&mut self, report_id: Option<u8>) -> Result<Option<Vec<u8>>> {
        let id = report_id.unwrap_or_else(|| self.first_report_id());
        let path = self.device_path(Some(id))?;

        let mut file = open_nonblocking(&path)?;
        let mut buf = vec![0u8; self.out_report_length(id)];
        match file.read(&mut buf) {
            Ok(0) => {}
            Ok(n) => {
                buf.truncate(n);
                self.last_received_report = Some(buf);
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {}
            Err(e) => return Err(e.into()),
        }

        Ok(self.last_received_report.clone())
    }

    /// Number of cached non-blocking handles for a node path
    pub fn open_handles(&self, path: &Path) -> usize {
        self.handles.open_handles(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::sys::stat::Mode;
    use nix::unistd::mkfifo;
    use std::fs;
    use std::os::unix::fs::OpenOptionsExt;
    use tempfile::{tempdir, TempDir};

    /// Scratch gadget tree: one function node per report ID, its `dev`
    /// attribute pointing at a node under the same directory.
    fn fake_tree(dir: &TempDir, report_ids: &[u8]) -> PathResolver {
        for (minor, id) in report_ids.iter().enumerate() {
            let func = dir.path().join(format!("functions/hid.usb{}", id));
            fs::create_dir_all(&func).unwrap();
            fs::write(func.join("dev"), format!("239:{}\n", minor)).unwrap();
        }
        PathResolver::with_dev_root(dir.path().to_path_buf(), dir.path().to_path_buf())
    }

    fn custom(report_ids: Vec<u8>, out_len: usize) -> Device {
        Device::new(
            vec![0xC0],
            0x01,
            0x06,
            report_ids,
            vec![8],
            vec![out_len],
            "test gadget",
        )
        .unwrap()
    }

    #[test]
    fn test_new_rejects_mismatched_lengths() {
        let err = Device::new(
            vec![0xC0],
            0x01,
            0x06,
            vec![1, 2, 3],
            vec![8, 4],
            vec![0],
            "bad",
        )
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_new_rejects_report_id_zero_with_siblings() {
        let err = Device::new(
            vec![0xC0],
            0x01,
            0x06,
            vec![0, 1],
            vec![8],
            vec![0],
            "bad",
        )
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_gamepad_broadcast_lengths() {
        let pad = Device::gamepad();
        assert_eq!(pad.report_ids(), &[4, 5]);
        assert_eq!(pad.in_report_length_at(0), 10);
        assert_eq!(pad.in_report_length_at(1), 10);
        assert_eq!(pad.out_report_length(5), 2);
    }

    #[test]
    fn test_transport_requires_enable() {
        let dev = Device::keyboard();
        assert!(matches!(dev.device_path(None), Err(Error::NotReady(_))));
        assert!(matches!(
            dev.send_report(&[0; 8], None),
            Err(Error::NotReady(_))
        ));
    }

    #[test]
    fn test_send_report_prefixes_report_id() {
        let dir = tempdir().unwrap();
        let resolver = fake_tree(&dir, &[3]);
        fs::write(dir.path().join("hidg0"), b"").unwrap();

        let mut dev = custom(vec![3], 0);
        dev.attach(resolver).unwrap();
        assert_eq!(dev.path().unwrap(), dir.path().join("hidg0"));

        dev.send_report(&[0xAA, 0xBB], None).unwrap();
        assert_eq!(fs::read(dir.path().join("hidg0")).unwrap(), vec![0x03, 0xAA, 0xBB]);
    }

    #[test]
    fn test_send_report_id_zero_has_no_prefix() {
        let dir = tempdir().unwrap();
        let resolver = fake_tree(&dir, &[0]);
        fs::write(dir.path().join("hidg0"), b"").unwrap();

        let mut dev = custom(vec![0], 0);
        dev.attach(resolver).unwrap();

        dev.send_report(&[0xAA], None).unwrap();
        assert_eq!(fs::read(dir.path().join("hidg0")).unwrap(), vec![0xAA]);
    }

    #[test]
    fn test_get_last_received_report_cache() {
        let dir = tempdir().unwrap();
        let resolver = fake_tree(&dir, &[0]);
        let node = dir.path().join("hidg0");
        mkfifo(&node, Mode::from_bits_truncate(0o600)).unwrap();

        // The "host" side holds the FIFO open for the whole test
        let mut host = fs::OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_NONBLOCK)
            .open(&node)
            .unwrap();

        let mut dev = custom(vec![0], 1);
        dev.attach(resolver).unwrap();

        // Nothing received yet
        assert_eq!(dev.get_last_received_report(None).unwrap(), None);

        host.write_all(&[0x01]).unwrap();
        assert_eq!(
            dev.get_last_received_report(None).unwrap(),
            Some(vec![0x01])
        );

        // No new data: cache returned unchanged
        assert_eq!(
            dev.get_last_received_report(None).unwrap(),
            Some(vec![0x01])
        );
    }

    #[test]
    fn test_nonblocking_would_block_keeps_handle() {
        let dir = tempdir().unwrap();
        let resolver = fake_tree(&dir, &[0]);
        let node = dir.path().join("hidg0");
        mkfifo(&node, Mode::from_bits_truncate(0o600)).unwrap();

        let mut dev = custom(vec![0], 0);
        dev.attach(resolver).unwrap();

        // Nobody drains the FIFO, so its pipe buffer eventually fills
        let report = vec![0u8; 4096];
        let mut saw_would_block = false;
        for _ in 0..64 {
            match dev.send_report_nonblocking(&report, None) {
                Ok(()) => {}
                Err(Error::WouldBlock) => {
                    saw_would_block = true;
                    break;
                }
                Err(e) => panic!("unexpected error: {}", e),
            }
        }
        assert!(saw_would_block);
        assert_eq!(dev.open_handles(&node), 1);

        // Retry still signals WouldBlock through the same cached handle
        assert!(dev
            .send_report_nonblocking(&report, None)
            .unwrap_err()
            .is_would_block());
        assert_eq!(dev.open_handles(&node), 1);
    }

    #[test]
    fn test_nonblocking_io_failure_evicts_handle() {
        let dir = tempdir().unwrap();
        let resolver = fake_tree(&dir, &[0]);
        let node = dir.path().join("hidg0");
        // /dev/full accepts the open but fails every write with ENOSPC
        std::os::unix::fs::symlink("/dev/full", &node).unwrap();

        let mut dev = custom(vec![0], 0);
        dev.attach(resolver).unwrap();

        let err = dev.send_report_nonblocking(&[0xAA], None).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(dev.open_handles(&node), 0);
    }

    #[test]
    fn test_detach_clears_transport_state() {
        let dir = tempdir().unwrap();
        let resolver = fake_tree(&dir, &[0]);
        let node = dir.path().join("hidg0");
        mkfifo(&node, Mode::from_bits_truncate(0o600)).unwrap();

        let mut dev = custom(vec![0], 0);
        dev.attach(resolver).unwrap();
        dev.send_report_nonblocking(&[0xAA], None).unwrap();
        assert_eq!(dev.open_handles(&node), 1);

        dev.detach();
        assert_eq!(dev.open_handles(&node), 0);
        assert!(dev.path().is_none());
    }
}

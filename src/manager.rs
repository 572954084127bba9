//! Gadget lifecycle: tree construction, UDC binding, teardown
//!
//! The kernel exposes gadget composition as a filesystem: directories
//! for the gadget, its configuration and its functions, attribute files
//! for descriptor fields, and symlinks tying functions into the
//! configuration. Construction is order-sensitive (attributes before
//! binding, links before binding) and teardown must remove children
//! before parents. [`GadgetManager`] owns that state machine.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info};

use crate::configfs::{
    create_dir, find_udc, is_configfs_available, list_dir, remove_file, remove_node, write_file,
    CONFIGFS_PATH, DEFAULT_GADGET_NAME, STRINGS_LOCALE, UDC_CLASS_PATH,
};
use crate::device::Device;
use crate::error::{Error, Result};
use crate::function::HidFunction;
use crate::resolver::PathResolver;

/// Boot-protocol device requested from the host.
///
/// A non-`None` selector replaces the requested device list wholesale
/// with the corresponding boot profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BootDevice {
    #[default]
    None,
    Keyboard,
    Mouse,
}

impl TryFrom<u8> for BootDevice {
    type Error = Error;

    fn try_from(selector: u8) -> Result<Self> {
        match selector {
            0 => Ok(BootDevice::None),
            1 => Ok(BootDevice::Keyboard),
            2 => Ok(BootDevice::Mouse),
            other => Err(Error::Config(format!(
                "invalid boot device selector {} (allowed: 0, 1, 2)",
                other
            ))),
        }
    }
}

/// USB device-descriptor attributes and strings written to the gadget root
#[derive(Debug, Clone)]
pub struct GadgetDescriptor {
    pub vendor_id: u16,
    pub product_id: u16,
    pub device_version: u16,
    pub usb_version: u16,
    pub max_packet_size: u8,
    pub manufacturer: String,
    pub product: String,
    pub serial_number: String,
    pub configuration: String,
    /// Configuration MaxPower in mA
    pub max_power: u16,
    /// Configuration bmAttributes bitmap
    pub attributes: u8,
}

impl Default for GadgetDescriptor {
    fn default() -> Self {
        Self {
            // Linux Foundation / Multifunction Composite Gadget
            vendor_id: 0x1d6b,
            product_id: 0x0104,
            device_version: 0x0100,
            usb_version: 0x0200,
            max_packet_size: 8,
            manufacturer: "usb-hidg".to_string(),
            product: "USB HID Composite Device".to_string(),
            serial_number: "0123456789".to_string(),
            configuration: "Config 1: HID".to_string(),
            max_power: 250,
            attributes: 0x80,
        }
    }
}

/// Lifecycle manager for one composite HID gadget.
///
/// Owns the ConfigFS gadget root, the enabled-device list, and the bound
/// controller. One instance per process; `enable`/`disable` are not
/// reentrant-safe and must be externally serialized.
pub struct GadgetManager {
    gadget_path: PathBuf,
    config_path: PathBuf,
    udc_class_path: PathBuf,
    descriptor: GadgetDescriptor,
    devices: Vec<Device>,
    bound_udc: Option<String>,
    /// Set once this instance has created kernel-side state, so the Drop
    /// guard knows there is something to release
    created: bool,
}

impl GadgetManager {
    /// Manager for the default gadget under the production ConfigFS and
    /// UDC paths
    pub fn new() -> Self {
        Self::with_paths(
            PathBuf::from(CONFIGFS_PATH).join(DEFAULT_GADGET_NAME),
            PathBuf::from(UDC_CLASS_PATH),
        )
    }

    /// Manager rooted at explicit paths (scratch trees in tests)
    pub fn with_paths(gadget_path: PathBuf, udc_class_path: PathBuf) -> Self {
        Self::with_descriptor(gadget_path, udc_class_path, GadgetDescriptor::default())
    }

    pub fn with_descriptor(
        gadget_path: PathBuf,
        udc_class_path: PathBuf,
        descriptor: GadgetDescriptor,
    ) -> Self {
        let config_path = gadget_path.join("configs/c.1");
        Self {
            gadget_path,
            config_path,
            udc_class_path,
            descriptor,
            devices: Vec::new(),
            bound_udc: None,
            created: false,
        }
    }

    /// Check if ConfigFS is mounted on this system
    pub fn is_available() -> bool {
        is_configfs_available()
    }

    pub fn gadget_path(&self) -> &Path {
        &self.gadget_path
    }

    pub fn gadget_exists(&self) -> bool {
        self.gadget_path.exists()
    }

    /// Controller name the gadget was bound to, if any
    pub fn bound_udc(&self) -> Option<&str> {
        self.bound_udc.as_deref()
    }

    /// Whether the gadget is currently bound to a controller
    pub fn is_bound(&self) -> bool {
        fs::read_to_string(self.gadget_path.join("UDC"))
            .map(|s| !s.trim().is_empty())
            .unwrap_or(false)
    }

    /// Devices enabled by the last successful [`enable`](Self::enable)
    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub fn devices_mut(&mut self) -> &mut [Device] {
        &mut self.devices
    }

    /// Present the given devices to the USB host.
    ///
    /// A boot-device selector other than [`BootDevice::None`] discards
    /// `requested` and presents the single matching boot profile. The
    /// previous gadget, if any, is always torn down first, so repeated
    /// calls with the same inputs are idempotent. An empty effective
    /// device list is equivalent to [`disable`](Self::disable).
    ///
    /// Caller-supplied device order determines USB interface numbering;
    /// hosts that care about ordering (pointing device before gamepad or
    /// digitizer) are the caller's responsibility.
    ///
    /// On failure partway through, already-created functions and links
    /// are left in place; `disable` recovers to a clean state.
    pub fn enable(&mut self, requested: Vec<Device>, boot_device: BootDevice) -> Result<()> {
        let mut devices = Self::apply_boot_override(requested, boot_device);

        self.disable()?;

        if devices.is_empty() {
            info!("no devices requested, gadget stays disabled");
            return Ok(());
        }

        info!(
            "enabling gadget with {} device(s): {}",
            devices.len(),
            devices
                .iter()
                .map(Device::name)
                .collect::<Vec<_>>()
                .join(", ")
        );

        self.setup(&devices)?;
        self.bind()?;

        let resolver = PathResolver::new(self.gadget_path.clone());
        for device in &mut devices {
            device.attach(resolver.clone())?;
        }
        self.devices = devices;
        Ok(())
    }

    /// Replace the requested list with a boot profile when one is selected
    pub(crate) fn apply_boot_override(
        requested: Vec<Device>,
        boot_device: BootDevice,
    ) -> Vec<Device> {
        match boot_device {
            BootDevice::None => requested,
            BootDevice::Keyboard => vec![Device::boot_keyboard()],
            BootDevice::Mouse => vec![Device::boot_mouse()],
        }
    }

    /// Build the gadget tree for the given devices: root attributes,
    /// strings, the single configuration, and one linked function node
    /// per report ID, in declared order.
    pub fn setup(&mut self, devices: &[Device]) -> Result<()> {
        create_dir(&self.gadget_path)?;
        self.created = true;

        self.write_device_descriptors()?;
        self.write_strings()?;
        self.create_configuration()?;

        for device in devices {
            for (index, &report_id) in device.report_ids().iter().enumerate() {
                let function = HidFunction::new(
                    report_id,
                    device.in_report_length_at(index),
                    device.descriptor(),
                );
                function.create(&self.gadget_path)?;
                function.link(&self.config_path, &self.gadget_path)?;
            }
        }

        debug!("gadget tree built at {}", self.gadget_path.display());
        Ok(())
    }

    /// Bind the gadget to the first available controller, triggering
    /// host-side enumeration. No controller is a fatal configuration
    /// error.
    pub fn bind(&mut self) -> Result<()> {
        let udc = find_udc(&self.udc_class_path).ok_or_else(|| {
            Error::Config(format!(
                "no USB device controller found under {}",
                self.udc_class_path.display()
            ))
        })?;

        info!("binding gadget to UDC {}", udc);
        write_file(&self.gadget_path.join("UDC"), &udc)?;
        self.bound_udc = Some(udc);
        Ok(())
    }

    /// Unbind from the controller; not being bound is a no-op
    fn unbind(&mut self) -> Result<()> {
        if self.is_bound() {
            write_file(&self.gadget_path.join("UDC"), "")?;
            info!("unbound gadget from UDC");
        }
        self.bound_udc = None;
        Ok(())
    }

    /// Tear down the gadget tree and release all per-device transport
    /// state.
    ///
    /// Removal runs children-before-parents: configuration links, then
    /// per-locale config strings, configurations, functions, gadget
    /// strings, and finally the gadget root. Already-absent nodes are
    /// clean; any other removal failure propagates, since it indicates a
    /// leaked kernel resource. Safe to call when no gadget exists.
    pub fn disable(&mut self) -> Result<()> {
        for device in &mut self.devices {
            device.detach();
        }
        self.devices.clear();

        if !self.gadget_path.exists() {
            self.bound_udc = None;
            self.created = false;
            return Ok(());
        }

        info!("tearing down gadget at {}", self.gadget_path.display());
        self.unbind()?;

        let configs = list_dir(&self.gadget_path.join("configs"))?;
        for config in &configs {
            for entry in list_dir(config)? {
                let is_link = fs::symlink_metadata(&entry)
                    .map(|m| m.file_type().is_symlink())
                    .unwrap_or(false);
                if is_link {
                    remove_file(&entry)?;
                }
            }
        }
        for config in &configs {
            for locale in list_dir(&config.join("strings"))? {
                remove_node(&locale)?;
            }
        }
        for config in &configs {
            remove_node(config)?;
        }
        for function in list_dir(&self.gadget_path.join("functions"))? {
            remove_node(&function)?;
        }
        for locale in list_dir(&self.gadget_path.join("strings"))? {
            remove_node(&locale)?;
        }
        remove_node(&self.gadget_path)?;

        self.created = false;
        info!("gadget teardown complete");
        Ok(())
    }

    fn write_device_descriptors(&self) -> Result<()> {
        let d = &self.descriptor;
        write_file(
            &self.gadget_path.join("idVendor"),
            &format!("0x{:04x}", d.vendor_id),
        )?;
        write_file(
            &self.gadget_path.join("idProduct"),
            &format!("0x{:04x}", d.product_id),
        )?;
        write_file(
            &self.gadget_path.join("bcdDevice"),
            &format!("0x{:04x}", d.device_version),
        )?;
        write_file(
            &self.gadget_path.join("bcdUSB"),
            &format!("0x{:04x}", d.usb_version),
        )?;
        // Composite device: class/subclass/protocol all zero
        write_file(&self.gadget_path.join("bDeviceClass"), "0x00")?;
        write_file(&self.gadget_path.join("bDeviceSubClass"), "0x00")?;
        write_file(&self.gadget_path.join("bDeviceProtocol"), "0x00")?;
        write_file(
            &self.gadget_path.join("bMaxPacketSize0"),
            &d.max_packet_size.to_string(),
        )?;
        Ok(())
    }

    fn write_strings(&self) -> Result<()> {
        let strings = self.gadget_path.join("strings").join(STRINGS_LOCALE);
        create_dir(&strings)?;
        write_file(&strings.join("serialnumber"), &self.descriptor.serial_number)?;
        write_file(&strings.join("manufacturer"), &self.descriptor.manufacturer)?;
        write_file(&strings.join("product"), &self.descriptor.product)?;
        Ok(())
    }

    fn create_configuration(&self) -> Result<()> {
        create_dir(&self.config_path)?;

        let strings = self.config_path.join("strings").join(STRINGS_LOCALE);
        create_dir(&strings)?;
        write_file(&strings.join("configuration"), &self.descriptor.configuration)?;

        write_file(
            &self.config_path.join("MaxPower"),
            &self.descriptor.max_power.to_string(),
        )?;
        write_file(
            &self.config_path.join("bmAttributes"),
            &format!("0x{:02x}", self.descriptor.attributes),
        )?;
        Ok(())
    }
}

impl Default for GadgetManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for GadgetManager {
    fn drop(&mut self) {
        if self.created {
            if let Err(e) = self.disable() {
                error!("failed to release gadget on drop: {}", e);
            }
        }
    }
}

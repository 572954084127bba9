//! Linux USB HID gadget management and report transport.
//!
//! Turns a Linux machine with a USB device controller into a composite
//! HID peripheral (keyboard, mouse, consumer control, gamepad,
//! digitizer, or their boot-protocol variants) using the kernel's
//! ConfigFS gadget API, then moves HID reports through the resulting
//! `/dev/hidgN` character devices.
//!
//! Typical flow:
//!
//! ```no_run
//! use usb_hidg::{BootDevice, Device, GadgetManager};
//!
//! fn main() -> usb_hidg::Result<()> {
//!     let mut manager = GadgetManager::new();
//!     manager.enable(vec![Device::keyboard(), Device::mouse()], BootDevice::None)?;
//!
//!     // Press and release the 'a' key
//!     let keyboard = &manager.devices()[0];
//!     keyboard.send_report(&[0, 0, 0x04, 0, 0, 0, 0, 0], None)?;
//!     keyboard.send_report(&[0; 8], None)?;
//!
//!     manager.disable()
//! }
//! ```
//!
//! Requires root (or equivalent ConfigFS and `/dev/hidg*` permissions)
//! and a UDC-capable port. All operations are synchronous; serialize
//! access externally if multiple threads are involved.

mod configfs;
mod function;
mod resolver;
mod transport;

pub mod descriptors;
pub mod device;
pub mod error;
pub mod manager;

pub use device::Device;
pub use error::{Error, Result};
pub use manager::{BootDevice, GadgetDescriptor, GadgetManager};
pub use resolver::PathResolver;

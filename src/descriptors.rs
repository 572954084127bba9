//! HID report descriptor tables for the predefined device profiles
//!
//! These are opaque data as far as the rest of the crate is concerned;
//! they are written verbatim to the `report_desc` attribute of each
//! function node. The boot profiles carry no Report ID item and follow
//! the fixed USB HID 1.12 Appendix B layouts.

/// Report ID used by the keyboard profile
pub const KEYBOARD_REPORT_ID: u8 = 1;

/// Report ID used by the mouse profile
pub const MOUSE_REPORT_ID: u8 = 2;

/// Report ID used by the consumer control profile
pub const CONSUMER_CONTROL_REPORT_ID: u8 = 3;

/// Gamepad input report ID
pub const GAMEPAD_REPORT_ID: u8 = 4;

/// Gamepad rumble output report ID (vendor-defined page)
pub const RUMBLE_REPORT_ID: u8 = 5;

/// Digitizer/pen report ID
pub const DIGITIZER_REPORT_ID: u8 = 6;

/// Keyboard report descriptor (report ID 1)
/// Input (8 bytes): modifiers, reserved, 6-key rollover array.
/// Output (1 byte): LED bitmap.
pub const KEYBOARD: &[u8] = &[
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x06, // Usage (Keyboard)
    0xA1, 0x01, // Collection (Application)
    0x85, KEYBOARD_REPORT_ID, // Report ID (1)
    // Modifier keys (8 bits)
    0x05, 0x07, //   Usage Page (Keyboard/Keypad)
    0x19, 0xE0, //   Usage Minimum (224) - Left Control
    0x29, 0xE7, //   Usage Maximum (231) - Right GUI
    0x15, 0x00, //   Logical Minimum (0)
    0x25, 0x01, //   Logical Maximum (1)
    0x75, 0x01, //   Report Size (1)
    0x95, 0x08, //   Report Count (8)
    0x81, 0x02, //   Input (Data, Variable, Absolute)
    // Reserved byte
    0x95, 0x01, //   Report Count (1)
    0x75, 0x08, //   Report Size (8)
    0x81, 0x01, //   Input (Constant)
    // LED output (3 bits)
    0x95, 0x03, //   Report Count (3)
    0x75, 0x01, //   Report Size (1)
    0x05, 0x08, //   Usage Page (LEDs)
    0x19, 0x01, //   Usage Minimum (Num Lock)
    0x29, 0x05, //   Usage Maximum (Kana)
    0x91, 0x02, //   Output (Data, Variable, Absolute)
    // LED padding (5 bits)
    0x95, 0x01, //   Report Count (1)
    0x75, 0x05, //   Report Size (5)
    0x91, 0x01, //   Output (Constant)
    // Key array (6 bytes)
    0x95, 0x06, //   Report Count (6)
    0x75, 0x08, //   Report Size (8)
    0x15, 0x00, //   Logical Minimum (0)
    0x26, 0xFF, 0x00, // Logical Maximum (255)
    0x05, 0x07, //   Usage Page (Keyboard/Keypad)
    0x19, 0x00, //   Usage Minimum (0)
    0x2A, 0xFF, 0x00, // Usage Maximum (255)
    0x81, 0x00, //   Input (Data, Array)
    0xC0, // End Collection
];

/// Boot keyboard report descriptor: same layout as [`KEYBOARD`] with the
/// Report ID item removed, per HID 1.12 Appendix B.1.
pub const BOOT_KEYBOARD: &[u8] = &[
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x06, // Usage (Keyboard)
    0xA1, 0x01, // Collection (Application)
    0x05, 0x07, //   Usage Page (Keyboard/Keypad)
    0x19, 0xE0, //   Usage Minimum (224)
    0x29, 0xE7, //   Usage Maximum (231)
    0x15, 0x00, //   Logical Minimum (0)
    0x25, 0x01, //   Logical Maximum (1)
    0x75, 0x01, //   Report Size (1)
    0x95, 0x08, //   Report Count (8)
    0x81, 0x02, //   Input (Data, Variable, Absolute)
    0x95, 0x01, //   Report Count (1)
    0x75, 0x08, //   Report Size (8)
    0x81, 0x01, //   Input (Constant)
    0x95, 0x03, //   Report Count (3)
    0x75, 0x01, //   Report Size (1)
    0x05, 0x08, //   Usage Page (LEDs)
    0x19, 0x01, //   Usage Minimum (Num Lock)
    0x29, 0x05, //   Usage Maximum (Kana)
    0x91, 0x02, //   Output (Data, Variable, Absolute)
    0x95, 0x01, //   Report Count (1)
    0x75, 0x05, //   Report Size (5)
    0x91, 0x01, //   Output (Constant)
    0x95, 0x06, //   Report Count (6)
    0x75, 0x08, //   Report Size (8)
    0x15, 0x00, //   Logical Minimum (0)
    0x26, 0xFF, 0x00, // Logical Maximum (255)
    0x05, 0x07, //   Usage Page (Keyboard/Keypad)
    0x19, 0x00, //   Usage Minimum (0)
    0x2A, 0xFF, 0x00, // Usage Maximum (255)
    0x81, 0x00, //   Input (Data, Array)
    0xC0, // End Collection
];

/// Mouse report descriptor (report ID 2)
/// Input (4 bytes): 5 buttons + padding, dX, dY, wheel.
pub const MOUSE: &[u8] = &[
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x02, // Usage (Mouse)
    0xA1, 0x01, // Collection (Application)
    0x85, MOUSE_REPORT_ID, // Report ID (2)
    0x09, 0x01, //   Usage (Pointer)
    0xA1, 0x00, //   Collection (Physical)
    // Buttons (5 bits)
    0x05, 0x09, //     Usage Page (Button)
    0x19, 0x01, //     Usage Minimum (1)
    0x29, 0x05, //     Usage Maximum (5)
    0x15, 0x00, //     Logical Minimum (0)
    0x25, 0x01, //     Logical Maximum (1)
    0x95, 0x05, //     Report Count (5)
    0x75, 0x01, //     Report Size (1)
    0x81, 0x02, //     Input (Data, Variable, Absolute)
    // Padding (3 bits)
    0x95, 0x01, //     Report Count (1)
    0x75, 0x03, //     Report Size (3)
    0x81, 0x01, //     Input (Constant)
    // X, Y movement
    0x05, 0x01, //     Usage Page (Generic Desktop)
    0x09, 0x30, //     Usage (X)
    0x09, 0x31, //     Usage (Y)
    0x15, 0x81, //     Logical Minimum (-127)
    0x25, 0x7F, //     Logical Maximum (127)
    0x75, 0x08, //     Report Size (8)
    0x95, 0x02, //     Report Count (2)
    0x81, 0x06, //     Input (Data, Variable, Relative)
    // Wheel
    0x09, 0x38, //     Usage (Wheel)
    0x15, 0x81, //     Logical Minimum (-127)
    0x25, 0x7F, //     Logical Maximum (127)
    0x75, 0x08, //     Report Size (8)
    0x95, 0x01, //     Report Count (1)
    0x81, 0x06, //     Input (Data, Variable, Relative)
    0xC0, //   End Collection (Physical)
    0xC0, // End Collection (Application)
];

/// Boot mouse report descriptor: [`MOUSE`] without the Report ID item,
/// per HID 1.12 Appendix B.2.
pub const BOOT_MOUSE: &[u8] = &[
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x02, // Usage (Mouse)
    0xA1, 0x01, // Collection (Application)
    0x09, 0x01, //   Usage (Pointer)
    0xA1, 0x00, //   Collection (Physical)
    0x05, 0x09, //     Usage Page (Button)
    0x19, 0x01, //     Usage Minimum (1)
    0x29, 0x05, //     Usage Maximum (5)
    0x15, 0x00, //     Logical Minimum (0)
    0x25, 0x01, //     Logical Maximum (1)
    0x95, 0x05, //     Report Count (5)
    0x75, 0x01, //     Report Size (1)
    0x81, 0x02, //     Input (Data, Variable, Absolute)
    0x95, 0x01, //     Report Count (1)
    0x75, 0x03, //     Report Size (3)
    0x81, 0x01, //     Input (Constant)
    0x05, 0x01, //     Usage Page (Generic Desktop)
    0x09, 0x30, //     Usage (X)
    0x09, 0x31, //     Usage (Y)
    0x15, 0x81, //     Logical Minimum (-127)
    0x25, 0x7F, //     Logical Maximum (127)
    0x75, 0x08, //     Report Size (8)
    0x95, 0x02, //     Report Count (2)
    0x81, 0x06, //     Input (Data, Variable, Relative)
    0x09, 0x38, //     Usage (Wheel)
    0x15, 0x81, //     Logical Minimum (-127)
    0x25, 0x7F, //     Logical Maximum (127)
    0x75, 0x08, //     Report Size (8)
    0x95, 0x01, //     Report Count (1)
    0x81, 0x06, //     Input (Data, Variable, Relative)
    0xC0, //   End Collection
    0xC0, // End Collection
];

/// Consumer control report descriptor (report ID 3)
/// Input (2 bytes): one 16-bit consumer usage.
pub const CONSUMER_CONTROL: &[u8] = &[
    0x05, 0x0C, // Usage Page (Consumer)
    0x09, 0x01, // Usage (Consumer Control)
    0xA1, 0x01, // Collection (Application)
    0x85, CONSUMER_CONTROL_REPORT_ID, // Report ID (3)
    0x75, 0x10, //   Report Size (16)
    0x95, 0x01, //   Report Count (1)
    0x15, 0x01, //   Logical Minimum (1)
    0x26, 0x8C, 0x02, // Logical Maximum (652)
    0x19, 0x01, //   Usage Minimum (Consumer Control)
    0x2A, 0x8C, 0x02, // Usage Maximum (AC Send)
    0x81, 0x00, //   Input (Data, Array)
    0xC0, // End Collection
];

/// Gamepad report descriptor (input report ID 4, rumble output report ID 5)
/// Input (10 bytes): 16 buttons, hat switch + padding, 6 analog axes.
/// Output (2 bytes): vendor-defined rumble intensity.
pub const GAMEPAD: &[u8] = &[
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x05, // Usage (Gamepad)
    0xA1, 0x01, // Collection (Application)
    0x85, GAMEPAD_REPORT_ID, // Report ID (4)
    // 16 buttons, 1 bit each
    0x05, 0x09, //   Usage Page (Button)
    0x19, 0x01, //   Usage Minimum (Button 1)
    0x29, 0x10, //   Usage Maximum (Button 16)
    0x15, 0x00, //   Logical Minimum (0)
    0x25, 0x01, //   Logical Maximum (1)
    0x75, 0x01, //   Report Size (1)
    0x95, 0x10, //   Report Count (16)
    0x81, 0x02, //   Input (Data, Variable, Absolute)
    // Hat switch: 8 directions + null state
    0x05, 0x01, //   Usage Page (Generic Desktop)
    0x09, 0x39, //   Usage (Hat switch)
    0x15, 0x00, //   Logical Minimum (0)
    0x25, 0x07, //   Logical Maximum (7)
    0x35, 0x00, //   Physical Minimum (0)
    0x46, 0x3B, 0x01, // Physical Maximum (315)
    0x65, 0x14, //   Unit (Degrees)
    0x75, 0x04, //   Report Size (4)
    0x95, 0x01, //   Report Count (1)
    0x81, 0x42, //   Input (Data, Variable, Absolute, Null State)
    // Padding to byte boundary
    0x75, 0x04, //   Report Size (4)
    0x95, 0x01, //   Report Count (1)
    0x81, 0x03, //   Input (Constant, Variable, Absolute)
    // Six 8-bit axes: LX, LY, RX, RY, L2, R2
    0x05, 0x01, //   Usage Page (Generic Desktop)
    0x09, 0x30, //   Usage (X)
    0x09, 0x31, //   Usage (Y)
    0x09, 0x33, //   Usage (Rx)
    0x09, 0x34, //   Usage (Ry)
    0x09, 0x32, //   Usage (Z)
    0x09, 0x35, //   Usage (Rz)
    0x15, 0x00, //   Logical Minimum (0)
    0x26, 0xFF, 0x00, // Logical Maximum (255)
    0x75, 0x08, //   Report Size (8)
    0x95, 0x06, //   Report Count (6)
    0x81, 0x02, //   Input (Data, Variable, Absolute)
    // Rumble output (host -> device), vendor-defined page
    0x06, 0x00, 0xFF, // Usage Page (Vendor Defined Page 1)
    0x85, RUMBLE_REPORT_ID, // Report ID (5)
    0x09, 0x01, //   Usage (Vendor Usage 1) - rumble intensity
    0x15, 0x00, //   Logical Minimum (0)
    0x26, 0xFF, 0x00, // Logical Maximum (255)
    0x75, 0x08, //   Report Size (8)
    0x95, 0x01, //   Report Count (1)
    0x91, 0x02, //   Output (Data, Variable, Absolute)
    0xC0, // End Collection
];

/// Digitizer/pen report descriptor (report ID 6)
/// Input (27 bytes): tool type, switches, tracking, position, pressure,
/// tilt, contact geometry, orientation, scan time.
pub const DIGITIZER: &[u8] = &[
    0x05, 0x0D, // Usage Page (Digitizer)
    0x09, 0x02, // Usage (Pen)
    0xA1, 0x01, // Collection (Application)
    0x85, DIGITIZER_REPORT_ID, // Report ID (6)
    // Tool type (4 bits)
    0x05, 0x0D, //   Usage Page (Digitizer)
    0x09, 0x20, //   Usage (Stylus)
    0x09, 0x22, //   Usage (Finger)
    0x09, 0x23, //   Usage (Touch Screen)
    0x09, 0x24, //   Usage (Touch Pad)
    0x15, 0x00, //   Logical Minimum (0)
    0x25, 0x0F, //   Logical Maximum (15)
    0x75, 0x04, //   Report Size (4)
    0x95, 0x01, //   Report Count (1)
    0x81, 0x02, //   Input (Data, Variable, Absolute)
    // Switch states (5 bits)
    0x09, 0x42, //   Usage (Tip Switch)
    0x09, 0x44, //   Usage (Barrel Switch)
    0x09, 0x45, //   Usage (Second Barrel Switch)
    0x09, 0x46, //   Usage (Eraser)
    0x09, 0x3C, //   Usage (Invert)
    0x15, 0x00, //   Logical Minimum (0)
    0x25, 0x01, //   Logical Maximum (1)
    0x75, 0x01, //   Report Size (1)
    0x95, 0x05, //   Report Count (5)
    0x81, 0x02, //   Input (Data, Variable, Absolute)
    // In-range + contact identifier (7 bits)
    0x09, 0x32, //   Usage (In Range)
    0x09, 0x51, //   Usage (Contact Identifier)
    0x15, 0x00, //   Logical Minimum (0)
    0x25, 0x3F, //   Logical Maximum (63)
    0x75, 0x07, //   Report Size (7)
    0x95, 0x01, //   Report Count (1)
    0x81, 0x02, //   Input (Data, Variable, Absolute)
    // X, Y position (16 bits each)
    0x05, 0x01, //   Usage Page (Generic Desktop)
    0x09, 0x30, //   Usage (X)
    0x09, 0x31, //   Usage (Y)
    0x16, 0x00, 0x00, // Logical Minimum (0)
    0x26, 0xFF, 0x7F, // Logical Maximum (32767)
    0x75, 0x10, //   Report Size (16)
    0x95, 0x02, //   Report Count (2)
    0x81, 0x02, //   Input (Data, Variable, Absolute)
    // Tip pressure (13 bits)
    0x05, 0x0D, //   Usage Page (Digitizer)
    0x09, 0x30, //   Usage (Tip Pressure)
    0x15, 0x00, //   Logical Minimum (0)
    0x26, 0xFF, 0x1F, // Logical Maximum (8191)
    0x75, 0x0D, //   Report Size (13)
    0x95, 0x01, //   Report Count (1)
    0x81, 0x02, //   Input (Data, Variable, Absolute)
    // Distance and tilt
    0x09, 0x32, //   Usage (Distance)
    0x09, 0x3D, //   Usage (X Tilt)
    0x09, 0x3E, //   Usage (Y Tilt)
    0x15, 0x81, //   Logical Minimum (-127)
    0x25, 0x7F, //   Logical Maximum (127)
    0x75, 0x08, //   Report Size (8)
    0x95, 0x03, //   Report Count (3)
    0x81, 0x02, //   Input (Data, Variable, Absolute)
    // Contact geometry
    0x09, 0x48, //   Usage (Width)
    0x09, 0x49, //   Usage (Height)
    0x15, 0x00, //   Logical Minimum (0)
    0x26, 0xFF, 0x00, // Logical Maximum (255)
    0x75, 0x08, //   Report Size (8)
    0x95, 0x04, //   Report Count (4)
    0x81, 0x02, //   Input (Data, Variable, Absolute)
    // Orientation
    0x09, 0x3F, //   Usage (Azimuth)
    0x15, 0x81, //   Logical Minimum (-127)
    0x25, 0x7F, //   Logical Maximum (127)
    0x75, 0x08, //   Report Size (8)
    0x95, 0x01, //   Report Count (1)
    0x81, 0x02, //   Input (Data, Variable, Absolute)
    // Multitouch position
    0x05, 0x0D, //   Usage Page (Digitizer)
    0x09, 0x30, //   Usage (X)
    0x09, 0x31, //   Usage (Y)
    0x16, 0x00, 0x00, // Logical Minimum (0)
    0x26, 0xFF, 0x7F, // Logical Maximum (32767)
    0x75, 0x10, //   Report Size (16)
    0x95, 0x02, //   Report Count (2)
    0x81, 0x02, //   Input (Data, Variable, Absolute)
    // Multitouch pressure and tool type
    0x09, 0x30, //   Usage (Pressure)
    0x09, 0x20, //   Usage (Stylus)
    0x15, 0x00, //   Logical Minimum (0)
    0x26, 0xFF, 0x00, // Logical Maximum (255)
    0x75, 0x08, //   Report Size (8)
    0x95, 0x02, //   Report Count (2)
    0x81, 0x02, //   Input (Data, Variable, Absolute)
    // Scan time and blob id
    0x09, 0x56, //   Usage (Scan Time)
    0x15, 0x00, //   Logical Minimum (0)
    0x26, 0xFF, 0xFF, // Logical Maximum (65535)
    0x75, 0x10, //   Report Size (16)
    0x95, 0x02, //   Report Count (2)
    0x81, 0x02, //   Input (Data, Variable, Absolute)
    0xC0, // End Collection
];

#[cfg(test)]
mod tests {
    use super::*;

    /// Walk HID short items, yielding (prefix, value) pairs.
    ///
    /// Short item encoding: prefix byte carries tag/type in the high six
    /// bits and the data size in the low two (3 encodes four bytes).
    fn items(desc: &[u8]) -> Vec<(u8, u32)> {
        let mut out = Vec::new();
        let mut i = 0;
        while i < desc.len() {
            let prefix = desc[i];
            assert_ne!(prefix, 0xFE, "long items are not used in these tables");
            let size = match prefix & 0x03 {
                3 => 4,
                n => n as usize,
            };
            i += 1;
            assert!(i + size <= desc.len(), "truncated item at offset {}", i);
            let mut value = 0u32;
            for (shift, b) in desc[i..i + size].iter().enumerate() {
                value |= (*b as u32) << (8 * shift);
            }
            out.push((prefix & 0xFC, value));
            i += size;
        }
        out
    }

    const COLLECTION: u8 = 0xA0;
    const END_COLLECTION: u8 = 0xC0;
    const REPORT_ID: u8 = 0x84;

    fn report_ids_in(desc: &[u8]) -> Vec<u8> {
        items(desc)
            .into_iter()
            .filter(|(tag, _)| *tag == REPORT_ID)
            .map(|(_, v)| v as u8)
            .collect()
    }

    fn collections_balance(desc: &[u8]) -> bool {
        let mut depth = 0i32;
        for (tag, _) in items(desc) {
            match tag {
                COLLECTION => depth += 1,
                END_COLLECTION => depth -= 1,
                _ => {}
            }
            if depth < 0 {
                return false;
            }
        }
        depth == 0
    }

    #[test]
    fn test_collections_balance() {
        for desc in [
            KEYBOARD,
            BOOT_KEYBOARD,
            MOUSE,
            BOOT_MOUSE,
            CONSUMER_CONTROL,
            GAMEPAD,
            DIGITIZER,
        ] {
            assert!(collections_balance(desc));
        }
    }

    #[test]
    fn test_declared_report_ids_match() {
        assert_eq!(report_ids_in(KEYBOARD), vec![KEYBOARD_REPORT_ID]);
        assert_eq!(report_ids_in(MOUSE), vec![MOUSE_REPORT_ID]);
        assert_eq!(
            report_ids_in(CONSUMER_CONTROL),
            vec![CONSUMER_CONTROL_REPORT_ID]
        );
        assert_eq!(
            report_ids_in(GAMEPAD),
            vec![GAMEPAD_REPORT_ID, RUMBLE_REPORT_ID]
        );
        assert_eq!(report_ids_in(DIGITIZER), vec![DIGITIZER_REPORT_ID]);
    }

    #[test]
    fn test_boot_profiles_have_no_report_id_items() {
        assert!(report_ids_in(BOOT_KEYBOARD).is_empty());
        assert!(report_ids_in(BOOT_MOUSE).is_empty());
    }
}

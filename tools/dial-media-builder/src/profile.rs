//! Per-device resource files, relative to the resource directory.

use dial_media::MediaKind;

/// Files that make up a device's contribution to a build.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct DeviceProfile {
    /// Handler core dump.
    pub handler: &'static str,
    /// Handler core dump with the reboot-strap patch applied.
    pub patched_handler: &'static str,
    /// Unit spec used when the device sits in the primary handler slot.
    pub units_primary: &'static str,
    /// Unit spec used when the device sits in the secondary handler slot.
    pub units_secondary: &'static str,
}

pub const SYSTEM_UNITS_PRIMARY: &str = "unit-specs/sys-units.pri-std.csv";
pub const SYSTEM_UNITS_SECONDARY: &str = "unit-specs/sys-units.sec-std.csv";

/// Loader tape of the reference build carrying the reboot bootstrap code.
pub const REFERENCE_TAPE: &str = "reference/build-patched.bin";

pub const fn profile(kind: MediaKind) -> DeviceProfile {
    match kind {
        MediaKind::Linc => DeviceProfile {
            handler: "handlers/linctape-handler.bin",
            patched_handler: "handlers/linctape-handler-patched.bin",
            units_primary: "unit-specs/linctape-units.pri-std.csv",
            units_secondary: "unit-specs/linctape-units.sec-std.csv",
        },
        MediaKind::Rk08 | MediaKind::Rk05 => DeviceProfile {
            handler: "handlers/rk08-handler.bin",
            patched_handler: "handlers/rk08-handler-patched.bin",
            units_primary: "unit-specs/rk08-units.pri-std.csv",
            units_secondary: "unit-specs/rk08-units.sec-std.csv",
        },
        // The serial disk handler always carries the reboot-strap patch.
        MediaKind::Sdsk => DeviceProfile {
            handler: "handlers/sdsk-handler.bin",
            patched_handler: "handlers/sdsk-handler.bin",
            units_primary: "unit-specs/rk08-units.pri-std.csv",
            units_secondary: "unit-specs/rk08-units.sec-std.csv",
        },
    }
}

impl DeviceProfile {
    pub const fn handler_for(&self, patched: bool) -> &'static str {
        if patched {
            self.patched_handler
        } else {
            self.handler
        }
    }
}
